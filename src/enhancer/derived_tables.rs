//! Subclass and extension tables
//!
//! Both hang off tables committed by the main tables stage, so they run in
//! the second stage.

use std::collections::HashMap;

use tracing::debug;

use super::{BuildState, build_and_commit};
use crate::builder::primary_key::{collect_primary_keys, inherited_primary_keys};
use crate::builder::table_builder::{build_extension_table, build_main_table, stored_entity_table};
use crate::builder::{BuildContext, BuildStrategy};
use crate::error::{BuildError, BuildResult};
use crate::metamodel::{Entity, EntityKind};
use crate::models::{ColumnPair, ForeignKey, ForeignKeyReason, Table, TableExistenceReason};

/// Subclass tables, each after the table of its base entity
///
/// A subclass of a subclass waits for its base; a base that never gets a
/// table fails the run.
pub fn subclasses(state: &mut BuildState<'_>) -> BuildResult<()> {
    let env = state.env;
    let mut pending: Vec<&Entity> = env.entities().iter().filter(|e| e.kind.is_subclass()).collect();

    while !pending.is_empty() {
        let (ready, waiting): (Vec<&Entity>, Vec<&Entity>) = pending.into_iter().partition(|e| {
            e.base_entity
                .is_some_and(|base| state.repository.entity_table_key(base).is_some())
        });
        if ready.is_empty() {
            let subclass = waiting[0];
            let base = env.base_entity(subclass)?;
            return Err(BuildError::MissingTable {
                namespace: base.namespace.clone(),
                entity: subclass.meta_ed_name.clone(),
                table_id: base.meta_ed_name.clone(),
            });
        }
        for subclass in ready {
            build_subclass(state, subclass)?;
        }
        pending = waiting;
    }
    Ok(())
}

fn build_subclass(state: &mut BuildState<'_>, subclass: &Entity) -> BuildResult<()> {
    let (index, keys) = build_and_commit(state, subclass.id, |ctx, tables| {
        let index = build_main_table(ctx, subclass, TableExistenceReason::Subclass, tables)?;
        let foreign_key = base_foreign_key(ctx, subclass, tables.get(index))?;
        tables.get_mut(index).add_foreign_key(foreign_key);
        Ok(index)
    })?;
    if let Some(Some(key)) = keys.get(index) {
        state.repository.set_entity_table(subclass.id, key.clone());
    }
    Ok(())
}

/// Cascading foreign key from a subclass table to its base table
///
/// The base key is collected twice, once as the base declares it and once as
/// the subclass inherits it; zipping the two maps each base column onto its
/// possibly renamed subclass column. Pairs follow the base table's key order.
fn base_foreign_key(ctx: &BuildContext<'_>, subclass: &Entity, table: &Table) -> BuildResult<ForeignKey> {
    let base = ctx.env.base_entity(subclass)?;
    let (_, base_table) = stored_entity_table(ctx, subclass, base)?;

    let strategy = BuildStrategy::new();
    let base_keys = collect_primary_keys(ctx, base, &strategy)?;
    let inherited = inherited_primary_keys(ctx, subclass, &strategy)?;
    let renamed: HashMap<&str, &str> = base_keys
        .iter()
        .zip(inherited.iter())
        .map(|(b, s)| (b.column_id.as_str(), s.column_id.as_str()))
        .collect();

    let pairs = base_table
        .primary_key_ids()
        .into_iter()
        .map(|id| ColumnPair::new(renamed.get(id).copied().unwrap_or(id), id))
        .collect();

    debug!(
        subclass = %subclass.meta_ed_name,
        base_table = %base_table.table_id,
        "Subclass foreign key to base table"
    );
    Ok(ForeignKey::new(
        table.table_id.clone(),
        base_table.namespace.clone(),
        base_table.table_id.clone(),
        pairs,
        ForeignKeyReason::Subclass,
    )
    .with_delete_cascade(true))
}

/// `<Base>Extension` tables of domain entity and association extensions
pub fn extensions(state: &mut BuildState<'_>) -> BuildResult<()> {
    let env = state.env;
    let extensions = env.entities().iter().filter(|e| {
        matches!(
            e.kind,
            EntityKind::DomainEntityExtension | EntityKind::AssociationExtension
        )
    });

    for extension in extensions {
        let (index, keys) = build_and_commit(state, extension.id, |ctx, tables| {
            build_extension_table(ctx, extension, tables)
        })?;
        debug!(
            extension = %extension.meta_ed_name,
            namespace = %extension.namespace,
            extension_table = index.is_some(),
            tables = keys.iter().flatten().count(),
            "Extension tables committed"
        );
    }
    Ok(())
}
