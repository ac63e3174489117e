//! Namespace-scoped table repository
//!
//! The shared output of every enhancer. One table map per namespace, iterated
//! in insertion order so repeated runs serialise identically.

use std::collections::HashMap;

use serde::Serialize;

use super::table::Table;
use crate::error::{BuildError, BuildResult};
use crate::metamodel::EntityId;

/// Address of a table inside the repository
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TableKey {
    pub namespace: String,
    pub table_id: String,
}

impl TableKey {
    pub fn new(namespace: impl Into<String>, table_id: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            table_id: table_id.into(),
        }
    }
}

/// Tables of one namespace
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NamespaceTables {
    pub namespace: String,
    tables: Vec<Table>,
    #[serde(skip)]
    index: HashMap<String, usize>,
}

impl NamespaceTables {
    fn new(namespace: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            tables: Vec::new(),
            index: HashMap::new(),
        }
    }

    pub fn tables(&self) -> &[Table] {
        &self.tables
    }

    pub fn get(&self, table_id: &str) -> Option<&Table> {
        self.index.get(table_id).map(|&i| &self.tables[i])
    }
}

/// Map from namespace to its tables, plus the main table of each entity
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TableRepository {
    namespaces: Vec<NamespaceTables>,
    #[serde(skip)]
    entity_tables: HashMap<EntityId, TableKey>,
}

impl TableRepository {
    pub fn new() -> Self {
        Self::default()
    }

    fn namespace_index(&self, namespace: &str) -> Option<usize> {
        self.namespaces.iter().position(|n| n.namespace == namespace)
    }

    /// Insert a table; a duplicate id within the namespace is an error
    pub fn insert(&mut self, table: Table) -> BuildResult<TableKey> {
        let key = TableKey::new(table.namespace.clone(), table.table_id.clone());
        let ns_index = match self.namespace_index(&table.namespace) {
            Some(i) => i,
            None => {
                self.namespaces.push(NamespaceTables::new(table.namespace.clone()));
                self.namespaces.len() - 1
            }
        };

        let tables = &mut self.namespaces[ns_index];
        if tables.index.contains_key(&table.table_id) {
            return Err(BuildError::DuplicateTable {
                namespace: key.namespace,
                table_id: key.table_id,
            });
        }
        tables.index.insert(table.table_id.clone(), tables.tables.len());
        tables.tables.push(table);
        Ok(key)
    }

    /// Record the main table of an entity
    pub fn set_entity_table(&mut self, entity: EntityId, key: TableKey) {
        self.entity_tables.insert(entity, key);
    }

    pub fn entity_table_key(&self, entity: EntityId) -> Option<&TableKey> {
        self.entity_tables.get(&entity)
    }

    pub fn entity_table(&self, entity: EntityId) -> Option<&Table> {
        self.entity_table_key(entity)
            .and_then(|key| self.get(key))
    }

    pub fn get(&self, key: &TableKey) -> Option<&Table> {
        self.table(&key.namespace, &key.table_id)
    }

    pub fn get_mut(&mut self, key: &TableKey) -> Option<&mut Table> {
        self.table_mut(&key.namespace, &key.table_id)
    }

    pub fn table(&self, namespace: &str, table_id: &str) -> Option<&Table> {
        self.namespace_index(namespace)
            .and_then(|i| self.namespaces[i].get(table_id))
    }

    pub fn table_mut(&mut self, namespace: &str, table_id: &str) -> Option<&mut Table> {
        let ns = self.namespace_index(namespace)?;
        let tables = &mut self.namespaces[ns];
        let index = *tables.index.get(table_id)?;
        tables.tables.get_mut(index)
    }

    /// Tables of one namespace in insertion order
    pub fn tables_in(&self, namespace: &str) -> &[Table] {
        match self.namespace_index(namespace) {
            Some(i) => self.namespaces[i].tables(),
            None => &[],
        }
    }

    pub fn namespaces(&self) -> impl Iterator<Item = &str> {
        self.namespaces.iter().map(|n| n.namespace.as_str())
    }

    pub fn all_tables(&self) -> impl Iterator<Item = &Table> {
        self.namespaces.iter().flat_map(|n| n.tables.iter())
    }

    pub fn all_tables_mut(&mut self) -> impl Iterator<Item = &mut Table> {
        self.namespaces.iter_mut().flat_map(|n| n.tables.iter_mut())
    }

    /// Keys of every table, in iteration order
    pub fn keys(&self) -> Vec<TableKey> {
        self.all_tables()
            .map(|t| TableKey::new(t.namespace.clone(), t.table_id.clone()))
            .collect()
    }

    /// First table with the id in any namespace
    pub fn find_by_table_id(&self, table_id: &str) -> Option<&Table> {
        self.namespaces.iter().find_map(|n| n.get(table_id))
    }

    pub fn table_count(&self) -> usize {
        self.namespaces.iter().map(|n| n.tables.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.table_count() == 0
    }
}
