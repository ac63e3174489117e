//! Column model for generated tables

use serde::{Deserialize, Serialize};

use crate::metamodel::{PropertyId, PropertyKind};

/// Semantic column type
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ColumnDataType {
    Boolean,
    Currency,
    Date,
    Datetime,
    Duration,
    Integer,
    BigInteger,
    Percent,
    Short,
    Time,
    Year,
    #[serde(rename_all = "camelCase")]
    Decimal { precision: u32, scale: u32 },
    #[serde(rename_all = "camelCase")]
    String {
        #[serde(skip_serializing_if = "Option::is_none")]
        min_length: Option<u32>,
        max_length: u32,
    },
}

impl ColumnDataType {
    /// Column type for a simple property kind, `None` for non-scalar kinds
    pub fn from_property_kind(kind: &PropertyKind) -> Option<Self> {
        let data_type = match kind {
            PropertyKind::Boolean => Self::Boolean,
            PropertyKind::Currency => Self::Currency,
            PropertyKind::Date => Self::Date,
            PropertyKind::Datetime => Self::Datetime,
            PropertyKind::Duration => Self::Duration,
            PropertyKind::Integer => Self::Integer,
            PropertyKind::BigInteger => Self::BigInteger,
            PropertyKind::Percent => Self::Percent,
            PropertyKind::Short => Self::Short,
            PropertyKind::Time => Self::Time,
            PropertyKind::Year => Self::Year,
            PropertyKind::Decimal { precision, scale } => Self::Decimal {
                precision: *precision,
                scale: *scale,
            },
            PropertyKind::String {
                min_length,
                max_length,
            } => Self::String {
                min_length: *min_length,
                max_length: *max_length,
            },
            _ => return None,
        };
        Some(data_type)
    }

    pub fn string(max_length: u32) -> Self {
        Self::String {
            min_length: None,
            max_length,
        }
    }
}

/// One segment of a column identifier, kept for later rename tooling
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ColumnNameComponent {
    pub name: String,
    #[serde(default)]
    pub is_parent_property_context: bool,
    #[serde(default)]
    pub is_property_role_name: bool,
    #[serde(default)]
    pub is_synthetic: bool,
}

impl ColumnNameComponent {
    pub fn base(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn parent_context(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            is_parent_property_context: true,
            ..Self::default()
        }
    }

    pub fn role_name(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            is_property_role_name: true,
            ..Self::default()
        }
    }

    pub fn synthetic(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            is_synthetic: true,
            ..Self::default()
        }
    }
}

/// Column of a generated table
///
/// A column id is unique within its table. When two builders produce the same
/// id the constraints are merged, see [`Column::merge_constraints`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Column {
    pub column_id: String,
    #[serde(default)]
    pub name_components: Vec<ColumnNameComponent>,
    pub data_type: ColumnDataType,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub is_nullable: bool,
    #[serde(default)]
    pub is_part_of_primary_key: bool,
    #[serde(default)]
    pub is_identity_database_type: bool,
    /// Concatenated property names of the chain that produced the column
    #[serde(default)]
    pub reference_context: String,
    /// Every reference context folded into this column by merges
    #[serde(default)]
    pub merged_reference_contexts: Vec<String>,
    /// Dotted full property names from the owning table's root
    #[serde(default)]
    pub property_path: String,
    #[serde(default)]
    pub original_context_prefix: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original_entity: Option<String>,
    #[serde(default)]
    pub source_entity_properties: Vec<PropertyId>,
}

impl Column {
    /// Create a non-nullable, non-key column
    pub fn new(column_id: impl Into<String>, data_type: ColumnDataType) -> Self {
        Self {
            column_id: column_id.into(),
            name_components: Vec::new(),
            data_type,
            description: String::new(),
            is_nullable: false,
            is_part_of_primary_key: false,
            is_identity_database_type: false,
            reference_context: String::new(),
            merged_reference_contexts: Vec::new(),
            property_path: String::new(),
            original_context_prefix: String::new(),
            original_entity: None,
            source_entity_properties: Vec::new(),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_name_components(mut self, components: Vec<ColumnNameComponent>) -> Self {
        self.name_components = components;
        self
    }

    pub fn primary_key(mut self) -> Self {
        self.is_part_of_primary_key = true;
        self.is_nullable = false;
        self
    }

    pub fn nullable(mut self) -> Self {
        self.is_nullable = true;
        self.is_part_of_primary_key = false;
        self
    }

    pub fn identity_database_type(mut self) -> Self {
        self.is_identity_database_type = true;
        self
    }

    /// Record the property chain that produced this column
    pub fn with_reference_context(mut self, context: impl Into<String>) -> Self {
        let context = context.into();
        self.merged_reference_contexts = vec![context.clone()];
        self.reference_context = context;
        self
    }

    /// Prefix the reference context, property path and merged contexts with an outer property
    pub fn prefixed_by(mut self, full_property_name: &str) -> Self {
        self.reference_context = format!("{}{}", full_property_name, self.reference_context);
        self.merged_reference_contexts = self
            .merged_reference_contexts
            .iter()
            .map(|context| format!("{}{}", full_property_name, context))
            .collect();
        self.property_path = if self.property_path.is_empty() {
            full_property_name.to_string()
        } else {
            format!("{}.{}", full_property_name, self.property_path)
        };
        self
    }

    /// Whether this column was produced by (or merged from) the given context
    pub fn has_reference_context(&self, context: &str) -> bool {
        self.reference_context == context || self.merged_reference_contexts.iter().any(|c| c == context)
    }

    /// Fold a duplicate column into this one
    ///
    /// A key on either side stays a key. Otherwise the result is nullable only
    /// when both sides are.
    pub fn merge_constraints(&mut self, other: &Column) {
        for context in &other.merged_reference_contexts {
            if !self.merged_reference_contexts.contains(context) {
                self.merged_reference_contexts.push(context.clone());
            }
        }
        for source in &other.source_entity_properties {
            if !self.source_entity_properties.contains(source) {
                self.source_entity_properties.push(*source);
            }
        }

        if self.is_part_of_primary_key || other.is_part_of_primary_key {
            self.is_part_of_primary_key = true;
            self.is_nullable = false;
        } else {
            self.is_nullable = self.is_nullable && other.is_nullable;
        }
    }

    /// Copy of a parent key column used as a key segment in a child table
    pub fn as_parent_key(&self) -> Self {
        let mut column = self.clone();
        column.is_part_of_primary_key = true;
        column.is_nullable = false;
        column.is_identity_database_type = false;
        column
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn integer(id: &str) -> Column {
        Column::new(id, ColumnDataType::Integer)
    }

    #[test]
    fn test_new_column_defaults() {
        let col = integer("SchoolId");
        assert!(!col.is_nullable);
        assert!(!col.is_part_of_primary_key);
        assert!(col.merged_reference_contexts.is_empty());
    }

    #[test]
    fn test_merge_key_wins() {
        let mut existing = integer("SchoolId").nullable();
        let incoming = integer("SchoolId").primary_key();
        existing.merge_constraints(&incoming);
        assert!(existing.is_part_of_primary_key);
        assert!(!existing.is_nullable);
    }

    #[test]
    fn test_merge_not_null_wins() {
        let mut existing = integer("SchoolId").nullable();
        let incoming = integer("SchoolId");
        existing.merge_constraints(&incoming);
        assert!(!existing.is_part_of_primary_key);
        assert!(!existing.is_nullable);

        let mut both_nullable = integer("SchoolId").nullable();
        both_nullable.merge_constraints(&integer("SchoolId").nullable());
        assert!(both_nullable.is_nullable);
    }

    #[test]
    fn test_merge_unions_contexts() {
        let mut existing = integer("SchoolId").with_reference_context("SchoolSchoolId");
        let incoming = integer("SchoolId").with_reference_context("SessionSchoolSchoolId");
        existing.merge_constraints(&incoming);
        existing.merge_constraints(&incoming);
        assert_eq!(
            existing.merged_reference_contexts,
            vec!["SchoolSchoolId", "SessionSchoolSchoolId"]
        );
        assert!(existing.has_reference_context("SessionSchoolSchoolId"));
    }

    #[test]
    fn test_prefixed_by_extends_path_and_context() {
        let mut col = integer("SchoolId").with_reference_context("SchoolId");
        col.property_path = "SchoolId".to_string();
        let col = col.prefixed_by("School");
        assert_eq!(col.reference_context, "SchoolSchoolId");
        assert_eq!(col.property_path, "School.SchoolId");
        assert_eq!(col.merged_reference_contexts, vec!["SchoolSchoolId"]);
    }

    #[test]
    fn test_data_type_from_property_kind() {
        assert_eq!(
            ColumnDataType::from_property_kind(&PropertyKind::Decimal {
                precision: 9,
                scale: 2
            }),
            Some(ColumnDataType::Decimal {
                precision: 9,
                scale: 2
            })
        );
        assert_eq!(
            ColumnDataType::from_property_kind(&PropertyKind::Descriptor),
            None
        );
    }
}
