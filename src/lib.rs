//! MetaEd ODS relational - table and column derivation engine
//!
//! Turns a MetaEd entity model into a normalized relational schema:
//! - Main, collection, common, subclass and extension tables
//! - Columns named by role name and context with overlap collapse
//! - Primary keys, foreign keys and update cascades
//! - Version-gated behavior for ODS/API technology versions
//!
//! The model goes in as a [`MetaEdEnvironment`]; a [`RelationalPipeline`] run
//! produces a [`TableRepository`] keyed by namespace.

pub mod builder;
pub mod config;
pub mod enhancer;
pub mod error;
pub mod metamodel;
pub mod models;
pub mod pipeline;
pub mod validation;
pub mod version;

pub use config::{BuildConfig, BuildStage};
pub use enhancer::{Enhancer, EnhancerOutcome};
pub use error::{BuildError, BuildResult};
pub use metamodel::{Entity, EntityId, EntityKind, EntityProperty, MetaEdEnvironment, PropertyKind};
pub use models::{Column, ColumnDataType, ColumnPair, ForeignKey, ForeignKeyReason, Table, TableExistenceReason, TableRepository};
pub use pipeline::{PipelineError, PipelineReport, PipelineResult, RelationalPipeline, run_pipeline};
pub use validation::{RelationshipValidator, TableValidator};
pub use version::TechnologyVersion;
