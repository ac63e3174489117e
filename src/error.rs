//! Error types for table and column derivation
//!
//! The builders assume a well-formed entity graph. Anything that violates that
//! assumption surfaces as a [`BuildError`] naming the offending entity, property
//! and namespace so the failing enhancer can be reported precisely.

use thiserror::Error;

/// Errors raised while deriving tables from the entity model
#[derive(Error, Debug, Clone, PartialEq)]
pub enum BuildError {
    /// A property points at an entity that is not in the environment
    #[error(
        "Property '{property}' on {namespace}.{entity} references an entity that does not exist"
    )]
    DanglingReference {
        namespace: String,
        entity: String,
        property: String,
    },

    /// A subclass or extension has no resolvable base entity
    #[error("{namespace}.{entity} has no base entity")]
    MissingBaseEntity { namespace: String, entity: String },

    /// A table expected to be built by an earlier stage is absent
    #[error("Table '{table_id}' for {namespace}.{entity} has not been built")]
    MissingTable {
        namespace: String,
        entity: String,
        table_id: String,
    },

    /// A reference targets an entity whose table has not been built
    #[error(
        "Property '{property}' on table {namespace}.{table_id} references '{referenced}' which has no table"
    )]
    MissingReferencedTable {
        namespace: String,
        table_id: String,
        property: String,
        referenced: String,
    },

    /// The foreign key pass could not pair a foreign primary key column
    #[error(
        "Could not find matching foreign key columns for parent property '{property}' on table {namespace}.{table_id} (foreign column '{foreign_column}')"
    )]
    UnmatchedForeignKeyColumns {
        namespace: String,
        table_id: String,
        property: String,
        foreign_column: String,
    },

    /// A table id was inserted twice into the same namespace
    #[error("Duplicate table '{table_id}' in namespace {namespace}")]
    DuplicateTable { namespace: String, table_id: String },

    /// Unparsable technology or data standard version
    #[error("Invalid version '{0}'")]
    InvalidVersion(String),

    /// Structurally invalid input not covered above
    #[error("Invalid input for {namespace}.{entity}: {message}")]
    InvalidInput {
        namespace: String,
        entity: String,
        message: String,
    },
}

impl BuildError {
    /// Shorthand for [`BuildError::DanglingReference`]
    pub fn dangling(
        namespace: impl Into<String>,
        entity: impl Into<String>,
        property: impl Into<String>,
    ) -> Self {
        Self::DanglingReference {
            namespace: namespace.into(),
            entity: entity.into(),
            property: property.into(),
        }
    }

    /// Shorthand for [`BuildError::InvalidInput`]
    pub fn invalid(
        namespace: impl Into<String>,
        entity: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self::InvalidInput {
            namespace: namespace.into(),
            entity: entity.into(),
            message: message.into(),
        }
    }
}

/// Result type for builder operations
pub type BuildResult<T> = Result<T, BuildError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dangling_reference_message_names_context() {
        let err = BuildError::dangling("EdFi", "Student", "School");
        let msg = err.to_string();
        assert!(msg.contains("EdFi.Student"));
        assert!(msg.contains("'School'"));
    }

    #[test]
    fn test_unmatched_foreign_key_message() {
        let err = BuildError::UnmatchedForeignKeyColumns {
            namespace: "EdFi".to_string(),
            table_id: "Section".to_string(),
            property: "Session".to_string(),
            foreign_column: "SchoolId".to_string(),
        };
        assert!(
            err.to_string()
                .starts_with("Could not find matching foreign key columns for parent property")
        );
    }
}
