//! The resolved entity graph consumed by the builders

use std::path::Path;

use anyhow::{Context, bail};
use serde::{Deserialize, Serialize};

use super::entity::{Entity, EntityId, EntityKind};
use super::property::{EntityProperty, PropertyId};
use crate::error::{BuildError, BuildResult};

/// A namespace groups entities and maps onto one database schema
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Namespace {
    pub name: String,
    #[serde(default)]
    pub is_extension: bool,
    #[serde(default)]
    pub project_extension: String,
}

impl Namespace {
    pub fn core(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            is_extension: false,
            project_extension: String::new(),
        }
    }

    pub fn extension(name: impl Into<String>, project_extension: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            is_extension: true,
            project_extension: project_extension.into(),
        }
    }

    pub fn schema(&self) -> String {
        self.name.to_lowercase()
    }
}

/// Arena of entities with every reference already resolved to an [`EntityId`]
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetaEdEnvironment {
    #[serde(default)]
    namespaces: Vec<Namespace>,
    #[serde(default)]
    entities: Vec<Entity>,
}

impl MetaEdEnvironment {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a namespace; re-adding an existing name replaces it
    pub fn add_namespace(&mut self, namespace: Namespace) {
        match self.namespaces.iter_mut().find(|n| n.name == namespace.name) {
            Some(existing) => *existing = namespace,
            None => self.namespaces.push(namespace),
        }
    }

    /// Insert an entity, registering its namespace as core if unseen
    pub fn add_entity(&mut self, mut entity: Entity) -> EntityId {
        let id = EntityId(self.entities.len());
        entity.id = id;
        if self.namespace(&entity.namespace).is_none() {
            self.namespaces.push(Namespace::core(entity.namespace.clone()));
        }
        self.entities.push(entity);
        id
    }

    pub fn namespaces(&self) -> &[Namespace] {
        &self.namespaces
    }

    pub fn namespace(&self, name: &str) -> Option<&Namespace> {
        self.namespaces.iter().find(|n| n.name == name)
    }

    pub fn entity(&self, id: EntityId) -> Option<&Entity> {
        self.entities.get(id.0)
    }

    pub fn entities(&self) -> &[Entity] {
        &self.entities
    }

    /// Entities of one kind, in insertion order
    pub fn entities_of_kind(&self, kind: EntityKind) -> impl Iterator<Item = &Entity> {
        self.entities.iter().filter(move |e| e.kind == kind)
    }

    pub fn entity_by_name(&self, namespace: &str, kind: EntityKind, name: &str) -> Option<&Entity> {
        self.entities
            .iter()
            .find(|e| e.kind == kind && e.namespace == namespace && e.meta_ed_name == name)
    }

    pub fn property(&self, id: PropertyId) -> Option<&EntityProperty> {
        self.entity(id.entity)
            .and_then(|entity| entity.properties.get(id.index))
    }

    /// Resolve a property's referenced entity or fail naming the owner
    pub fn referenced_entity(&self, owner: &Entity, property: &EntityProperty) -> BuildResult<&Entity> {
        property
            .referenced_entity
            .and_then(|id| self.entity(id))
            .ok_or_else(|| {
                BuildError::dangling(&owner.namespace, &owner.meta_ed_name, &property.meta_ed_name)
            })
    }

    /// Resolve the base entity of a subclass or extension
    pub fn base_entity(&self, entity: &Entity) -> BuildResult<&Entity> {
        entity
            .base_entity
            .and_then(|id| self.entity(id))
            .ok_or_else(|| BuildError::MissingBaseEntity {
                namespace: entity.namespace.clone(),
                entity: entity.meta_ed_name.clone(),
            })
    }

    /// Load an environment from JSON, assigning ids by position
    pub fn from_json_str(json: &str) -> anyhow::Result<Self> {
        let mut env: Self =
            serde_json::from_str(json).context("Failed to parse entity environment JSON")?;
        env.reindex()?;
        Ok(env)
    }

    /// Load an environment from a JSON file
    pub fn from_json_file(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read environment file {}", path.display()))?;
        Self::from_json_str(&content)
            .with_context(|| format!("Invalid environment file {}", path.display()))
    }

    fn reindex(&mut self) -> anyhow::Result<()> {
        let count = self.entities.len();
        let mut missing_namespaces = Vec::new();
        for (index, entity) in self.entities.iter_mut().enumerate() {
            entity.id = EntityId(index);
            for link in entity
                .properties
                .iter()
                .filter_map(|p| p.referenced_entity)
                .chain(entity.base_entity)
                .chain(entity.map_type)
            {
                if link.0 >= count {
                    bail!(
                        "{}.{} links to entity #{} but only {} entities exist",
                        entity.namespace,
                        entity.meta_ed_name,
                        link.0,
                        count
                    );
                }
            }
            if !self.namespaces.iter().any(|n| n.name == entity.namespace)
                && !missing_namespaces.contains(&entity.namespace)
            {
                missing_namespaces.push(entity.namespace.clone());
            }
        }
        self.namespaces
            .extend(missing_namespaces.into_iter().map(Namespace::core));
        Ok(())
    }
}
