//! Domain entity and association main tables

use tracing::debug;

use super::{BuildState, build_and_commit};
use crate::builder::table_builder::build_main_table;
use crate::error::BuildResult;
use crate::metamodel::EntityKind;
use crate::models::TableExistenceReason;

/// Build the main table of every domain entity and association
///
/// Abstract entities still get a table. Subclasses wait for the derived
/// tables stage, where their base tables exist.
pub fn run(state: &mut BuildState<'_>) -> BuildResult<()> {
    let env = state.env;
    let entities = env
        .entities()
        .iter()
        .filter(|e| matches!(e.kind, EntityKind::DomainEntity | EntityKind::Association))
        .filter(|e| e.base_entity.is_none());

    for entity in entities {
        let (index, keys) = build_and_commit(state, entity.id, |ctx, tables| {
            build_main_table(ctx, entity, TableExistenceReason::Main, tables)
        })?;
        if let Some(Some(key)) = keys.get(index) {
            state.repository.set_entity_table(entity.id, key.clone());
        }
        debug!(
            entity = %entity.meta_ed_name,
            namespace = %entity.namespace,
            tables = keys.iter().flatten().count(),
            "Entity tables committed"
        );
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::BuildConfig;
    use crate::metamodel::{Entity, EntityProperty, MetaEdEnvironment, PropertyKind};

    #[test]
    fn test_entity_table_registered() {
        let mut env = MetaEdEnvironment::new();
        let school = env.add_entity(
            Entity::new(EntityKind::DomainEntity, "EdFi", "School")
                .with_property(EntityProperty::new("SchoolId", PropertyKind::Integer).identity()),
        );
        let config = BuildConfig::default();
        let mut state = BuildState::new(&env, &config);
        run(&mut state).unwrap();

        let table = state.repository.entity_table(school).unwrap();
        assert_eq!(table.table_id, "School");
        assert_eq!(table.schema, "edfi");
        assert_eq!(table.primary_key_ids(), vec!["SchoolId"]);
    }

    #[test]
    fn test_abstract_entity_gets_table_and_subclass_waits() {
        let mut env = MetaEdEnvironment::new();
        let base = env.add_entity(
            Entity::new(EntityKind::DomainEntity, "EdFi", "EducationOrganization")
                .as_abstract()
                .with_property(
                    EntityProperty::new("EducationOrganizationId", PropertyKind::Integer).identity(),
                ),
        );
        env.add_entity(
            Entity::new(EntityKind::DomainEntitySubclass, "EdFi", "School")
                .with_base_entity(base)
                .with_property(
                    EntityProperty::new("SchoolId", PropertyKind::Integer)
                        .identity_rename("EducationOrganizationId"),
                ),
        );
        let config = BuildConfig::default();
        let mut state = BuildState::new(&env, &config);
        run(&mut state).unwrap();

        assert!(state.repository.table("EdFi", "EducationOrganization").is_some());
        assert!(state.repository.table("EdFi", "School").is_none());
    }
}
