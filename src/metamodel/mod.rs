//! Input entity model
//!
//! A read-only graph produced upstream by the parser and semantic stages:
//! - [`MetaEdEnvironment`]: arena of entities grouped by namespace
//! - [`Entity`]: a named entity with ordered properties
//! - [`EntityProperty`]: a typed property with cardinality flags and resolved links

pub mod entity;
pub mod environment;
pub mod property;

pub use entity::{Entity, EntityId, EntityKind};
pub use environment::{MetaEdEnvironment, Namespace};
pub use property::{EntityProperty, MergeDirective, PropertyId, PropertyKind};
