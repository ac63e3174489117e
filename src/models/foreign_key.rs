//! Foreign key model

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Parent column paired with the foreign table column it references
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ColumnPair {
    pub parent_table_column_id: String,
    pub foreign_table_column_id: String,
}

impl ColumnPair {
    pub fn new(parent: impl Into<String>, foreign: impl Into<String>) -> Self {
        Self {
            parent_table_column_id: parent.into(),
            foreign_table_column_id: foreign.into(),
        }
    }

    /// Pair a column with the same-named column on the foreign table
    pub fn same(column_id: &str) -> Self {
        Self::new(column_id, column_id)
    }
}

/// Why a foreign key exists
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ForeignKeyReason {
    /// Association or domain entity reference
    Reference,
    /// Descriptor, enumeration or school year lookup column
    Lookup,
    /// Join table implementing a collection back to its parent
    Collection,
    /// Common join table back to its parent
    Common,
    /// Common extension table back to the common join table
    CommonExtension,
    /// Subclass table to its base table
    Subclass,
    /// Extension table to its base table
    Extension,
    /// Concrete descriptor table to the abstract descriptor table
    DescriptorBase,
    /// Descriptor table to its map type table
    MapType,
}

/// Foreign key owned by the table whose columns reference the foreign table
///
/// Column pairs are ordered to match the foreign table's primary key order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ForeignKey {
    pub id: Uuid,
    pub parent_table_id: String,
    pub column_pairs: Vec<ColumnPair>,
    pub foreign_table_id: String,
    pub foreign_table_schema: String,
    pub foreign_table_namespace: String,
    #[serde(default)]
    pub with_delete_cascade: bool,
    #[serde(default)]
    pub with_update_cascade: bool,
    pub reason: ForeignKeyReason,
    /// Full property name of the property that produced the key, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_property: Option<String>,
}

impl ForeignKey {
    pub fn new(
        parent_table_id: impl Into<String>,
        foreign_table_namespace: impl Into<String>,
        foreign_table_id: impl Into<String>,
        column_pairs: Vec<ColumnPair>,
        reason: ForeignKeyReason,
    ) -> Self {
        let parent_table_id = parent_table_id.into();
        let foreign_table_namespace = foreign_table_namespace.into();
        let foreign_table_id = foreign_table_id.into();
        let id = Self::generate_id(&parent_table_id, &foreign_table_id, &column_pairs);
        Self {
            id,
            parent_table_id,
            column_pairs,
            foreign_table_id,
            foreign_table_schema: foreign_table_namespace.to_lowercase(),
            foreign_table_namespace,
            with_delete_cascade: false,
            with_update_cascade: false,
            reason,
            source_property: None,
        }
    }

    pub fn with_delete_cascade(mut self, cascade: bool) -> Self {
        self.with_delete_cascade = cascade;
        self
    }

    pub fn with_update_cascade(mut self, cascade: bool) -> Self {
        self.with_update_cascade = cascade;
        self
    }

    pub fn with_source_property(mut self, property: impl Into<String>) -> Self {
        self.source_property = Some(property.into());
        self
    }

    pub fn parent_column_ids(&self) -> Vec<&str> {
        self.column_pairs
            .iter()
            .map(|p| p.parent_table_column_id.as_str())
            .collect()
    }

    pub fn foreign_column_ids(&self) -> Vec<&str> {
        self.column_pairs
            .iter()
            .map(|p| p.foreign_table_column_id.as_str())
            .collect()
    }

    /// Deterministic UUID v5 from both table ids and the column pairs
    pub fn generate_id(parent_table_id: &str, foreign_table_id: &str, pairs: &[ColumnPair]) -> Uuid {
        let columns = pairs
            .iter()
            .map(|p| format!("{}={}", p.parent_table_column_id, p.foreign_table_column_id))
            .collect::<Vec<_>>()
            .join(",");
        let key = format!("fk:{}:{}:{}", parent_table_id, foreign_table_id, columns);
        Uuid::new_v5(&Uuid::NAMESPACE_OID, key.as_bytes())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_foreign_key_ids_are_deterministic() {
        let pairs = vec![ColumnPair::same("SchoolId")];
        let a = ForeignKey::new("Student", "EdFi", "School", pairs.clone(), ForeignKeyReason::Reference);
        let b = ForeignKey::new("Student", "EdFi", "School", pairs, ForeignKeyReason::Reference);
        assert_eq!(a.id, b.id);

        let c = ForeignKey::new(
            "Student",
            "EdFi",
            "School",
            vec![ColumnPair::new("CurrentSchoolId", "SchoolId")],
            ForeignKeyReason::Reference,
        );
        assert_ne!(a.id, c.id);
    }

    #[test]
    fn test_schema_derived_from_namespace() {
        let fk = ForeignKey::new("Widget", "Sample", "Gadget", vec![], ForeignKeyReason::Reference);
        assert_eq!(fk.foreign_table_schema, "sample");
        assert!(!fk.with_delete_cascade);
        assert!(!fk.with_update_cascade);
    }

    #[test]
    fn test_column_id_projections() {
        let fk = ForeignKey::new(
            "StudentSchoolAssociation",
            "EdFi",
            "Student",
            vec![ColumnPair::same("StudentUSI"), ColumnPair::new("EntryDate", "BeginDate")],
            ForeignKeyReason::Reference,
        );
        assert_eq!(fk.parent_column_ids(), vec!["StudentUSI", "EntryDate"]);
        assert_eq!(fk.foreign_column_ids(), vec!["StudentUSI", "BeginDate"]);
    }
}
