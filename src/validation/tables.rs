//! Table validation functionality
//!
//! Structural checks on a finished repository: column ids are unique within a
//! table, and every foreign key points at an existing table, names existing
//! columns on both sides and pairs them in the foreign table's key order.

use std::collections::HashSet;

use uuid::Uuid;

use crate::models::{ForeignKey, Table, TableRepository};

/// Result of table validation
#[derive(Debug, Default)]
pub struct TableValidationResult {
    /// Column ids appearing more than once in a table
    pub duplicate_columns: Vec<DuplicateColumn>,
    /// Foreign keys that do not line up with their foreign table
    pub foreign_key_violations: Vec<ForeignKeyViolation>,
}

impl TableValidationResult {
    pub fn is_valid(&self) -> bool {
        self.duplicate_columns.is_empty() && self.foreign_key_violations.is_empty()
    }

    /// One line per violation
    pub fn messages(&self) -> Vec<String> {
        let duplicates = self.duplicate_columns.iter().map(|d| {
            format!("{}.{}: duplicate column '{}'", d.schema, d.table_name, d.column_id)
        });
        let foreign_keys = self.foreign_key_violations.iter().map(|v| {
            format!(
                "{}.{}: foreign key to {}: {}",
                v.schema, v.table_name, v.foreign_table, v.message
            )
        });
        duplicates.chain(foreign_keys).collect()
    }
}

/// Column id used twice in one table
#[derive(Debug, Clone)]
pub struct DuplicateColumn {
    pub table_id: Uuid,
    pub schema: String,
    pub table_name: String,
    pub column_id: String,
}

/// Foreign key that does not match its foreign table
#[derive(Debug, Clone)]
pub struct ForeignKeyViolation {
    pub table_id: Uuid,
    pub schema: String,
    pub table_name: String,
    pub foreign_table: String,
    pub message: String,
}

/// Table validator
#[derive(Debug, Default)]
pub struct TableValidator;

impl TableValidator {
    /// Create a new table validator
    pub fn new() -> Self {
        Self
    }

    /// Check every table of the repository
    pub fn validate(&self, repository: &TableRepository) -> TableValidationResult {
        let mut result = TableValidationResult::default();
        for table in repository.all_tables() {
            result.duplicate_columns.extend(self.detect_duplicate_columns(table));
            for foreign_key in &table.foreign_keys {
                if let Err(violation) = self.validate_foreign_key(repository, table, foreign_key) {
                    result.foreign_key_violations.push(violation);
                }
            }
        }
        result
    }

    pub fn detect_duplicate_columns(&self, table: &Table) -> Vec<DuplicateColumn> {
        let mut seen = HashSet::new();
        table
            .columns
            .iter()
            .filter(|c| !seen.insert(c.column_id.as_str()))
            .map(|c| DuplicateColumn {
                table_id: table.id,
                schema: table.schema.clone(),
                table_name: table.table_id.clone(),
                column_id: c.column_id.clone(),
            })
            .collect()
    }

    /// Validate one foreign key of `table`
    pub fn validate_foreign_key(
        &self,
        repository: &TableRepository,
        table: &Table,
        foreign_key: &ForeignKey,
    ) -> Result<(), ForeignKeyViolation> {
        let violation = |message: String| ForeignKeyViolation {
            table_id: table.id,
            schema: table.schema.clone(),
            table_name: table.table_id.clone(),
            foreign_table: format!(
                "{}.{}",
                foreign_key.foreign_table_schema, foreign_key.foreign_table_id
            ),
            message,
        };

        let Some(foreign) =
            repository.table(&foreign_key.foreign_table_namespace, &foreign_key.foreign_table_id)
        else {
            return Err(violation("foreign table does not exist".to_string()));
        };

        if let Some(missing) = foreign_key
            .parent_column_ids()
            .into_iter()
            .find(|id| table.column(id).is_none())
        {
            return Err(violation(format!("local column '{}' does not exist", missing)));
        }
        if let Some(missing) = foreign_key
            .foreign_column_ids()
            .into_iter()
            .find(|id| foreign.column(id).is_none())
        {
            return Err(violation(format!("foreign column '{}' does not exist", missing)));
        }

        let expected = foreign.primary_key_ids();
        let actual = foreign_key.foreign_column_ids();
        if actual != expected {
            return Err(violation(format!(
                "columns {:?} do not follow the foreign primary key {:?}",
                actual, expected
            )));
        }
        Ok(())
    }
}
