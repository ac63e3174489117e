//! Relational output model
//!
//! Tables, columns and foreign keys populated incrementally by the builders,
//! grouped per namespace in a [`TableRepository`].

pub mod column;
pub mod foreign_key;
pub mod repository;
pub mod table;

pub use column::{Column, ColumnDataType, ColumnNameComponent};
pub use foreign_key::{ColumnPair, ForeignKey, ForeignKeyReason};
pub use repository::{TableKey, TableRepository};
pub use table::{ReferenceSource, Table, TableExistenceReason, TableNameComponent};
