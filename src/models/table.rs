//! Table model for generated schemas

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::column::Column;
use super::foreign_key::ForeignKey;
use crate::metamodel::{EntityId, PropertyId};
use crate::version::TechnologyVersion;

/// Why a table exists
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TableExistenceReason {
    Main,
    Subclass,
    Extension,
    Collection,
    Common,
    CommonExtension,
    Descriptor,
    Enumeration,
    MapType,
    SchoolYear,
}

impl TableExistenceReason {
    pub fn is_join_table(&self) -> bool {
        matches!(self, Self::Collection | Self::Common)
    }

    pub fn is_extension_table(&self) -> bool {
        matches!(self, Self::Extension | Self::CommonExtension)
    }
}

/// One segment of a table name, kept so renames can pattern-match
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TableNameComponent {
    pub name: String,
    #[serde(default)]
    pub is_parent_table_name: bool,
    #[serde(default)]
    pub is_synthetic: bool,
}

impl TableNameComponent {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn parent(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            is_parent_table_name: true,
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

/// A reference property materialised into a table, resolved later into a foreign key
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReferenceSource {
    /// Full property names leading from the table root to the property's owner
    pub owner_path: Vec<String>,
    pub property: PropertyId,
    pub referenced_entity: EntityId,
}

/// A generated table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Table {
    pub id: Uuid,
    pub table_id: String,
    pub schema: String,
    pub namespace: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub name_group: Vec<TableNameComponent>,
    pub existence_reason: TableExistenceReason,
    #[serde(default)]
    pub is_required_collection_table: bool,
    #[serde(default)]
    pub include_create_date_column: bool,
    #[serde(default)]
    pub include_last_modified_date_and_id_column: bool,
    #[serde(default)]
    pub columns: Vec<Column>,
    #[serde(default)]
    pub foreign_keys: Vec<ForeignKey>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_entity: Option<EntityId>,
    /// Column ids copied from the parent table's primary key, in parent order
    #[serde(default)]
    pub parent_key_column_ids: Vec<String>,
    #[serde(default)]
    pub reference_sources: Vec<ReferenceSource>,
}

impl Table {
    pub fn new(
        namespace: impl Into<String>,
        table_id: impl Into<String>,
        existence_reason: TableExistenceReason,
    ) -> Self {
        let namespace = namespace.into();
        let table_id = table_id.into();
        let schema = namespace.to_lowercase();
        let id = Self::generate_id(&schema, &table_id);
        Self {
            id,
            name_group: vec![TableNameComponent::new(table_id.clone())],
            table_id,
            schema,
            namespace,
            description: String::new(),
            existence_reason,
            is_required_collection_table: false,
            include_create_date_column: false,
            include_last_modified_date_and_id_column: false,
            columns: Vec::new(),
            foreign_keys: Vec::new(),
            parent_entity: None,
            parent_key_column_ids: Vec::new(),
            reference_sources: Vec::new(),
        }
    }

    /// Generate a deterministic UUID v5 for a table from schema and table id
    pub fn generate_id(schema: &str, table_id: &str) -> Uuid {
        let key = format!("{}.{}", schema, table_id);
        Uuid::new_v5(&Uuid::NAMESPACE_DNS, key.as_bytes())
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_name_group(mut self, name_group: Vec<TableNameComponent>) -> Self {
        self.name_group = name_group;
        self
    }

    pub fn with_parent_entity(mut self, entity: EntityId) -> Self {
        self.parent_entity = Some(entity);
        self
    }

    pub fn column(&self, column_id: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.column_id == column_id)
    }

    pub fn column_mut(&mut self, column_id: &str) -> Option<&mut Column> {
        self.columns.iter_mut().find(|c| c.column_id == column_id)
    }

    /// Add a column, merging constraints into an existing column of the same id
    pub fn add_column(&mut self, column: Column, version: TechnologyVersion) {
        let Some(index) = self
            .columns
            .iter()
            .position(|c| c.column_id == column.column_id)
        else {
            self.columns.push(column);
            return;
        };

        let mut merged = self.columns[index].clone();
        merged.merge_constraints(&column);
        if version.replace_merged_column_in_place() {
            self.columns[index] = merged;
        } else {
            self.columns.remove(index);
            self.columns.push(merged);
        }
    }

    pub fn add_columns(&mut self, columns: Vec<Column>, version: TechnologyVersion) {
        for column in columns {
            self.add_column(column, version);
        }
    }

    /// Add the parent table's primary key as this table's leading key segment
    pub fn add_parent_primary_keys(&mut self, parent_keys: &[Column], version: TechnologyVersion) {
        for key in parent_keys {
            if !self.parent_key_column_ids.contains(&key.column_id) {
                self.parent_key_column_ids.push(key.column_id.clone());
            }
            self.add_column(key.as_parent_key(), version);
        }
    }

    /// Primary key columns, in column order
    pub fn primary_keys(&self) -> Vec<&Column> {
        self.columns
            .iter()
            .filter(|c| c.is_part_of_primary_key)
            .collect()
    }

    pub fn primary_key_ids(&self) -> Vec<&str> {
        self.primary_keys()
            .into_iter()
            .map(|c| c.column_id.as_str())
            .collect()
    }

    /// Owned copies of the primary key, used as parent keys for child tables
    pub fn primary_key_columns(&self) -> Vec<Column> {
        self.primary_keys().into_iter().cloned().collect()
    }

    /// Columns beyond the copied parent key
    pub fn has_own_columns(&self) -> bool {
        self.columns
            .iter()
            .any(|c| !self.parent_key_column_ids.contains(&c.column_id))
    }

    /// Add a foreign key unless an identical one is already present
    pub fn add_foreign_key(&mut self, foreign_key: ForeignKey) {
        if !self.foreign_keys.iter().any(|fk| fk.id == foreign_key.id) {
            self.foreign_keys.push(foreign_key);
        }
    }

    pub fn add_reference_source(&mut self, source: ReferenceSource) {
        if !self.reference_sources.contains(&source) {
            self.reference_sources.push(source);
        }
    }

    /// Order columns as parent keys, remaining keys by id, then the rest by id
    pub fn sort_columns(&mut self) {
        let columns = std::mem::take(&mut self.columns);
        let (mut parent_keys, rest): (Vec<_>, Vec<_>) = columns.into_iter().partition(|c| {
            c.is_part_of_primary_key && self.parent_key_column_ids.contains(&c.column_id)
        });
        let (mut keys, mut others): (Vec<_>, Vec<_>) =
            rest.into_iter().partition(|c| c.is_part_of_primary_key);

        parent_keys.sort_by_key(|c| {
            self.parent_key_column_ids
                .iter()
                .position(|id| *id == c.column_id)
        });
        keys.sort_by(|a, b| a.column_id.cmp(&b.column_id));
        others.sort_by(|a, b| a.column_id.cmp(&b.column_id));

        parent_keys.append(&mut keys);
        parent_keys.append(&mut others);
        self.columns = parent_keys;
    }
}
