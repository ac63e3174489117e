//! Column and table naming
//!
//! Identifiers are the integration surface for downstream tooling, so they are
//! plain concatenations. Overlap-collapsing only applies to the rendered
//! display name of a table, never to its `table_id`.

use super::strategy::BuildStrategy;
use crate::metamodel::EntityProperty;
use crate::models::{ColumnNameComponent, TableNameComponent};

/// Computed column identifier with its ordered name components
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnNaming {
    pub column_id: String,
    pub name_components: Vec<ColumnNameComponent>,
}

impl ColumnNaming {
    /// Append a synthetic suffix such as `Id`
    pub fn with_suffix(mut self, suffix: &str) -> Self {
        if !suffix.is_empty() {
            self.column_id.push_str(suffix);
            self.name_components
                .push(ColumnNameComponent::synthetic(suffix));
        }
        self
    }
}

/// Computed table identifier with its name group
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableNaming {
    pub table_id: String,
    pub name_group: Vec<TableNameComponent>,
}

impl TableNaming {
    /// Main table of an entity
    pub fn main(entity_name: &str) -> Self {
        Self {
            table_id: entity_name.to_string(),
            name_group: vec![TableNameComponent::new(entity_name)],
        }
    }

    /// Join table for a collection or common property
    ///
    /// The id is the raw concatenation of the parent table id, the active
    /// parent context and the property's ods name.
    pub fn join_table(
        parent_table_id: &str,
        parent_name_group: &[TableNameComponent],
        strategy: &BuildStrategy,
        property: &EntityProperty,
    ) -> Self {
        let mut name_group: Vec<TableNameComponent> = parent_name_group
            .iter()
            .map(|c| TableNameComponent::parent(c.name.clone()))
            .collect();
        name_group.extend(
            strategy
                .parent_context_properties()
                .into_iter()
                .filter(|p| !p.context_prefix.is_empty())
                .map(|p| TableNameComponent::new(p.context_prefix)),
        );
        let prefix = property.context_prefix();
        if !prefix.is_empty() {
            name_group.push(TableNameComponent::new(prefix));
        }
        name_group.push(TableNameComponent::new(property.meta_ed_name.clone()));

        Self {
            table_id: format!(
                "{}{}{}",
                parent_table_id,
                strategy.parent_context(),
                property.ods_name()
            ),
            name_group,
        }
    }

    /// Table hanging off `parent` with a synthetic suffix, e.g. `Extension`
    pub fn suffixed(parent_table_id: &str, parent_name_group: &[TableNameComponent], suffix: &str) -> Self {
        let mut name_group: Vec<TableNameComponent> = parent_name_group
            .iter()
            .map(|c| TableNameComponent::parent(c.name.clone()))
            .collect();
        name_group.push(TableNameComponent::synthetic(suffix));
        Self {
            table_id: format!("{}{}", parent_table_id, suffix),
            name_group,
        }
    }

    pub fn display_name(&self) -> String {
        display_name(&self.name_group)
    }
}

/// Append `suffix` unless the name already carries it
fn with_type_suffix(name: &str, suffix: &str) -> String {
    if name.ends_with(suffix) {
        name.to_string()
    } else {
        format!("{}{}", name, suffix)
    }
}

/// `GradeLevel` -> `GradeLevelDescriptor`
pub fn descriptor_table_name(name: &str) -> String {
    with_type_suffix(name, "Descriptor")
}

/// `AddressType` -> `AddressType`, `Term` -> `TermType`
pub fn enumeration_table_name(name: &str) -> String {
    with_type_suffix(name, "Type")
}

pub const SCHOOL_YEAR_TABLE: &str = "SchoolYearType";
pub const SCHOOL_YEAR_COLUMN: &str = "SchoolYear";

/// Render a name group, omitting any segment that prefixes the segment after it
///
/// `[Student, StudentAddress]` renders as `StudentAddress`.
pub fn display_name(name_group: &[TableNameComponent]) -> String {
    let segments: Vec<&str> = name_group.iter().map(|c| c.name.as_str()).collect();
    collapse_overlap(&segments)
}

pub fn collapse_overlap(segments: &[&str]) -> String {
    let mut rendered = String::new();
    for (i, segment) in segments.iter().enumerate() {
        let repeated = segments
            .get(i + 1)
            .is_some_and(|next| !segment.is_empty() && next.starts_with(segment));
        if !repeated {
            rendered.push_str(segment);
        }
    }
    rendered
}
