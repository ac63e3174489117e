//! Column creators, one per property kind
//!
//! A creator is a pure function of a property and the active strategy: it
//! returns fresh [`Column`] values and never touches a table.

use tracing::debug;

use super::naming::{self, ColumnNaming};
use super::primary_key::collect_primary_keys;
use super::strategy::BuildStrategy;
use super::{BuildContext, PropertyRef};
use crate::error::{BuildError, BuildResult};
use crate::metamodel::{EntityProperty, PropertyKind};
use crate::models::{Column, ColumnDataType};

/// Column creator selected by property kind
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnCreator {
    Simple,
    Descriptor,
    Enumeration,
    SchoolYear,
    /// Common, Choice and InlineCommon flatten the composite's columns
    Composite,
    /// Association and DomainEntity pull in the referenced primary key
    Reference,
}

impl ColumnCreator {
    pub fn for_property(property: &EntityProperty) -> Self {
        match property.kind {
            PropertyKind::Boolean
            | PropertyKind::Currency
            | PropertyKind::Date
            | PropertyKind::Datetime
            | PropertyKind::Duration
            | PropertyKind::Integer
            | PropertyKind::BigInteger
            | PropertyKind::Percent
            | PropertyKind::Short
            | PropertyKind::Time
            | PropertyKind::Year
            | PropertyKind::Decimal { .. }
            | PropertyKind::String { .. } => Self::Simple,
            PropertyKind::Descriptor => Self::Descriptor,
            PropertyKind::Enumeration => Self::Enumeration,
            PropertyKind::SchoolYearEnumeration => Self::SchoolYear,
            PropertyKind::Common | PropertyKind::Choice | PropertyKind::InlineCommon => {
                Self::Composite
            }
            PropertyKind::Association | PropertyKind::DomainEntity => Self::Reference,
        }
    }

    pub fn create_columns(
        &self,
        ctx: &BuildContext<'_>,
        prop: PropertyRef<'_>,
        strategy: &BuildStrategy,
    ) -> BuildResult<Vec<Column>> {
        if !strategy.build_columns(prop.property) {
            debug!(
                entity = %prop.owner.meta_ed_name,
                property = %prop.property.meta_ed_name,
                "Property lies on a merge path, no columns"
            );
            return Ok(Vec::new());
        }

        let property = prop.property;
        let columns = match self {
            Self::Simple => {
                let naming = strategy.column_namer(property.context_prefix(), &property.meta_ed_name);
                let data_type = ColumnDataType::from_property_kind(&property.kind).ok_or_else(|| {
                    BuildError::invalid(
                        &prop.owner.namespace,
                        &prop.owner.meta_ed_name,
                        format!("property {} has no scalar column type", property.full_property_name()),
                    )
                })?;
                vec![leaf_column(prop, strategy, naming, data_type)]
            }
            Self::Descriptor => {
                let naming = strategy
                    .column_namer(
                        property.context_prefix(),
                        &naming::descriptor_table_name(&property.meta_ed_name),
                    )
                    .with_suffix("Id");
                vec![leaf_column(prop, strategy, naming, ColumnDataType::Integer)]
            }
            Self::Enumeration => {
                let naming = strategy
                    .column_namer(
                        property.context_prefix(),
                        &naming::enumeration_table_name(&property.meta_ed_name),
                    )
                    .with_suffix("Id");
                vec![leaf_column(prop, strategy, naming, ColumnDataType::Integer)]
            }
            Self::SchoolYear => {
                let naming =
                    strategy.column_namer(property.context_prefix(), naming::SCHOOL_YEAR_COLUMN);
                vec![leaf_column(prop, strategy, naming, ColumnDataType::Short)]
            }
            Self::Composite => composite_columns(ctx, prop, strategy)?,
            Self::Reference => reference_columns(ctx, prop, strategy)?,
        };
        Ok(columns)
    }
}

/// Create the columns of a property under the given strategy
pub fn create_columns(
    ctx: &BuildContext<'_>,
    prop: PropertyRef<'_>,
    strategy: &BuildStrategy,
) -> BuildResult<Vec<Column>> {
    ColumnCreator::for_property(prop.property).create_columns(ctx, prop, strategy)
}

/// The single column produced by a scalar or lookup property
fn leaf_column(
    prop: PropertyRef<'_>,
    strategy: &BuildStrategy,
    naming: ColumnNaming,
    data_type: ColumnDataType,
) -> Column {
    let property = prop.property;
    let full_name = property.full_property_name();
    let mut column = Column::new(naming.column_id, data_type)
        .with_name_components(naming.name_components)
        .with_description(property.documentation.clone())
        .with_reference_context(full_name.clone());
    column.property_path = full_name;
    column.original_context_prefix = property.context_prefix().to_string();
    column.original_entity = Some(prop.owner.meta_ed_name.clone());
    column.source_entity_properties = vec![prop.id];

    if property.is_part_of_identity && !strategy.suppress_primary_key_creation() {
        column = column.primary_key();
    } else if property.is_optional {
        column = column.nullable();
    }
    column
}

/// Merge directive source paths of a property, each starting at the property itself
pub(crate) fn merge_skip_paths(property: &EntityProperty) -> Vec<Vec<String>> {
    property
        .merge_directives
        .iter()
        .map(|directive| directive.source_property_path.clone())
        .collect()
}

fn reference_columns(
    ctx: &BuildContext<'_>,
    prop: PropertyRef<'_>,
    strategy: &BuildStrategy,
) -> BuildResult<Vec<Column>> {
    let property = prop.property;
    if property.is_collection() {
        return Ok(Vec::new());
    }
    let referenced = ctx.env.referenced_entity(prop.owner, property)?;

    let strategy = if property.merge_directives.is_empty() {
        strategy.clone()
    } else {
        strategy.skip_path(merge_skip_paths(property))
    };
    let nested = strategy.append_parent_context_property(property);
    let full_name = property.full_property_name();

    Ok(collect_primary_keys(ctx, referenced, &nested)?
        .into_iter()
        .map(|column| column.prefixed_by(&full_name))
        .collect())
}

fn composite_columns(
    ctx: &BuildContext<'_>,
    prop: PropertyRef<'_>,
    strategy: &BuildStrategy,
) -> BuildResult<Vec<Column>> {
    let property = prop.property;
    if property.is_collection() {
        return Ok(Vec::new());
    }
    let composite = ctx.env.referenced_entity(prop.owner, property)?;

    let mut nested = if property.kind == PropertyKind::InlineCommon {
        strategy.append_parent_context_property(property)
    } else {
        strategy.clone()
    };
    if property.is_optional {
        nested = nested.suppress_primary_key_creation_from_properties();
    }

    let full_name = property.full_property_name();
    let mut columns = Vec::new();
    for inner in PropertyRef::all_of(composite).filter(|p| !p.property.is_collection()) {
        columns.extend(
            create_columns(ctx, inner, &nested)?
                .into_iter()
                .map(|column| column.prefixed_by(&full_name)),
        );
    }
    Ok(columns)
}
