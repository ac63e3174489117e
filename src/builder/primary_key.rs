//! Primary key collection
//!
//! An entity's key is its identity properties in declaration order, followed
//! by the keys of every inline common it embeds. Subclasses inherit the base
//! key, with the identity-rename property standing in for the renamed column.

use super::column_creator::create_columns;
use super::strategy::BuildStrategy;
use super::{BuildContext, PropertyRef};
use crate::error::BuildResult;
use crate::metamodel::{Entity, PropertyKind};
use crate::models::Column;

/// Collect the ordered primary key columns of an entity under a strategy
pub fn collect_primary_keys(
    ctx: &BuildContext<'_>,
    entity: &Entity,
    strategy: &BuildStrategy,
) -> BuildResult<Vec<Column>> {
    let mut columns = Vec::new();

    if entity.kind.is_subclass() {
        columns.extend(inherited_primary_keys(ctx, entity, strategy)?);
    }

    for prop in identity_properties(entity) {
        if prop.property.is_identity_rename && entity.kind.is_subclass() {
            continue;
        }
        columns.extend(create_columns(ctx, prop, strategy)?);
    }

    for prop in PropertyRef::all_of(entity).filter(|p| p.property.kind == PropertyKind::InlineCommon) {
        let property = prop.property;
        let inline = ctx.env.referenced_entity(entity, property)?;
        let nested = strategy.append_parent_context_property(property);
        let full_name = property.full_property_name();
        columns.extend(
            collect_primary_keys(ctx, inline, &nested)?
                .into_iter()
                .map(|column| column.prefixed_by(&full_name)),
        );
    }

    Ok(columns)
}

/// Identity properties, leaving inline commons to the inline recursion
fn identity_properties(entity: &Entity) -> impl Iterator<Item = PropertyRef<'_>> {
    PropertyRef::all_of(entity).filter(|p| {
        p.property.is_part_of_identity && p.property.kind != PropertyKind::InlineCommon
    })
}

/// Base entity key of a subclass, renamed through its identity-rename property
///
/// The base key is produced property by property so the rename replaces the
/// base identity property it names, keeping base key order intact.
pub(crate) fn inherited_primary_keys(
    ctx: &BuildContext<'_>,
    subclass: &Entity,
    strategy: &BuildStrategy,
) -> BuildResult<Vec<Column>> {
    let base = ctx.env.base_entity(subclass)?;
    let rename = identity_properties(subclass).find(|p| p.property.is_identity_rename);

    let mut columns = Vec::new();
    if base.kind.is_subclass() {
        columns.extend(inherited_primary_keys(ctx, base, strategy)?);
    }
    // A subclass base already placed its own rename through the recursion above
    for prop in identity_properties(base)
        .filter(|p| !(base.kind.is_subclass() && p.property.is_identity_rename))
    {
        let renamed = rename.filter(|r| r.property.base_key_name == prop.property.full_property_name());
        columns.extend(create_columns(ctx, renamed.unwrap_or(prop), strategy)?);
    }
    for prop in PropertyRef::all_of(base).filter(|p| p.property.kind == PropertyKind::InlineCommon) {
        let inline = ctx.env.referenced_entity(base, prop.property)?;
        let nested = strategy.append_parent_context_property(prop.property);
        let full_name = prop.property.full_property_name();
        columns.extend(
            collect_primary_keys(ctx, inline, &nested)?
                .into_iter()
                .map(|column| column.prefixed_by(&full_name)),
        );
    }
    Ok(columns)
}
