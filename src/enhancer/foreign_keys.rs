//! Reference foreign keys
//!
//! Every reference property materialised into a table left a
//! [`ReferenceSource`] behind. This pass turns each one into a foreign key to
//! the referenced entity's table, pairing the local columns with the foreign
//! primary key in the foreign table's key order.

use tracing::{debug, warn};

use super::{BuildState, IdentityGraph};
use crate::error::{BuildError, BuildResult};
use crate::metamodel::{EntityId, EntityProperty, MetaEdEnvironment};
use crate::models::{
    Column, ColumnPair, ForeignKey, ForeignKeyReason, ReferenceSource, Table, TableKey,
    TableRepository,
};

pub fn run(state: &mut BuildState<'_>) -> BuildResult<()> {
    if state.identity_graph.is_none() {
        warn!("Update cascade not computed, foreign keys will not cascade updates");
    }

    let mut planned: Vec<(TableKey, ForeignKey)> = Vec::new();
    for table in state.repository.all_tables() {
        for source in &table.reference_sources {
            if let Some(foreign_key) = reference_foreign_key(state, table, source)? {
                planned.push((TableKey::new(table.namespace.clone(), table.table_id.clone()), foreign_key));
            }
        }
    }

    let count = planned.len();
    for (key, foreign_key) in planned {
        if let Some(table) = state.repository.get_mut(&key) {
            table.add_foreign_key(foreign_key);
        }
    }
    debug!(foreign_keys = count, "Reference foreign keys created");
    Ok(())
}

/// Foreign key for one reference source, `None` for weak references
fn reference_foreign_key(
    state: &BuildState<'_>,
    table: &Table,
    source: &ReferenceSource,
) -> BuildResult<Option<ForeignKey>> {
    let env = state.env;
    let property = env.property(source.property).ok_or_else(|| {
        BuildError::invalid(
            &table.namespace,
            &table.table_id,
            format!("reference source names unknown property {:?}", source.property),
        )
    })?;
    if property.is_weak {
        return Ok(None);
    }

    let referenced = env.entity(source.referenced_entity).ok_or_else(|| {
        BuildError::dangling(&table.namespace, &table.table_id, &property.meta_ed_name)
    })?;
    let foreign = foreign_table(&state.repository, table, property, referenced.id, &referenced.meta_ed_name)?;

    let owner_context = source.owner_path.concat();
    let mut pairs = Vec::new();
    for foreign_column in foreign.primary_keys() {
        let local = matching_column(table, property, &owner_context, foreign_column).ok_or_else(|| {
            BuildError::UnmatchedForeignKeyColumns {
                namespace: table.namespace.clone(),
                table_id: table.table_id.clone(),
                property: property.full_property_name(),
                foreign_column: foreign_column.column_id.clone(),
            }
        })?;
        pairs.push(ColumnPair::new(&local.column_id, &foreign_column.column_id));
    }

    let referencing = referencing_entity(env, table, source);
    let update_cascade = state.update_cascading.contains(&referenced.id)
        && !closes_cycle(state.identity_graph.as_ref(), referenced.id, referencing);

    Ok(Some(
        ForeignKey::new(
            table.table_id.clone(),
            foreign.namespace.clone(),
            foreign.table_id.clone(),
            pairs,
            ForeignKeyReason::Reference,
        )
        .with_delete_cascade(property.delete_cascade)
        .with_update_cascade(update_cascade)
        .with_source_property(property.full_property_name()),
    ))
}

fn foreign_table<'r>(
    repository: &'r TableRepository,
    table: &Table,
    property: &EntityProperty,
    referenced: EntityId,
    referenced_name: &str,
) -> BuildResult<&'r Table> {
    repository
        .entity_table(referenced)
        .ok_or_else(|| BuildError::MissingReferencedTable {
            namespace: table.namespace.clone(),
            table_id: table.table_id.clone(),
            property: property.full_property_name(),
            referenced: referenced_name.to_string(),
        })
}

/// Local column standing in for one foreign primary key column
///
/// Tried in order: the column built from the same reference chain, the column
/// a merge directive redirected it to, then the column id the reference would
/// have produced.
fn matching_column<'t>(
    table: &'t Table,
    property: &EntityProperty,
    owner_context: &str,
    foreign: &Column,
) -> Option<&'t Column> {
    let full_name = property.full_property_name();
    let context = format!("{}{}{}", owner_context, full_name, foreign.reference_context);
    if let Some(column) = table.columns.iter().find(|c| c.has_reference_context(&context)) {
        return Some(column);
    }

    if let Some(merged) = merged_context(property, &full_name, foreign) {
        let context = format!("{}{}", owner_context, merged);
        if let Some(column) = table.columns.iter().find(|c| c.has_reference_context(&context)) {
            return Some(column);
        }
    }

    let expected = format!("{}{}", property.context_prefix(), foreign.column_id);
    table.columns.iter().find(|c| c.column_id == expected)
}

/// Reference context of the column a merge directive put in place of `foreign`
fn merged_context(property: &EntityProperty, full_name: &str, foreign: &Column) -> Option<String> {
    let mut segments = vec![full_name.to_string()];
    segments.extend(
        foreign
            .property_path
            .split('.')
            .filter(|s| !s.is_empty())
            .map(str::to_string),
    );

    property.merge_directives.iter().find_map(|directive| {
        let source = &directive.source_property_path;
        if source.is_empty() || !segments.starts_with(source) {
            return None;
        }
        let mut remapped = directive.target_property_path.clone();
        remapped.extend_from_slice(&segments[source.len()..]);
        Some(remapped.concat())
    })
}

/// Entity whose key the table's rows carry; extensions stand for their base
fn referencing_entity(env: &MetaEdEnvironment, table: &Table, source: &ReferenceSource) -> EntityId {
    let owner = table.parent_entity.unwrap_or(source.property.entity);
    match env.entity(owner) {
        Some(entity) if entity.kind.is_extension() => entity.base_entity.unwrap_or(owner),
        _ => owner,
    }
}

/// A cascading update would loop back into the referencing entity
fn closes_cycle(graph: Option<&IdentityGraph>, referenced: EntityId, referencing: EntityId) -> bool {
    graph.is_some_and(|graph| graph.can_reach(referenced, referencing))
}
