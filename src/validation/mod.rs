//! Validation functionality
//!
//! Provides validation logic for:
//! - Table validation (duplicate columns, foreign key shape)
//! - Relationship validation (cascading foreign key cycles)

pub mod relationships;
pub mod tables;

pub use relationships::{CascadeCycle, CascadeKind, RelationshipValidationResult, RelationshipValidator};
pub use tables::{TableValidationResult, TableValidator};
