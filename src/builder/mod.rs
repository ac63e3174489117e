//! Table and column derivation
//!
//! The builders walk an entity's properties recursively, threading a
//! [`BuildStrategy`] through the descent and accumulating tables into a
//! [`TableSet`] owned by the top-level call. Nothing here touches the shared
//! [`TableRepository`] except through [`TableSet::commit`].
//!
//! ```rust,ignore
//! let ctx = BuildContext::new(&env, &config, &repository);
//! let mut tables = TableSet::new(entity.id);
//! let main = build_main_table(&ctx, entity, TableExistenceReason::Main, &mut tables)?;
//! let keys = tables.commit(&mut repository, ctx.version)?;
//! ```

pub mod column_creator;
pub mod naming;
pub mod primary_key;
pub mod strategy;
pub mod table_builder;
pub mod transform;

pub use column_creator::{ColumnCreator, create_columns};
pub use naming::{ColumnNaming, TableNaming};
pub use primary_key::collect_primary_keys;
pub use strategy::{BuildStrategy, ParentContext};
pub use table_builder::{LinkTarget, Scope, TableBuilder, TableSet, build_property_tables};
pub use transform::ColumnTransform;

use crate::config::BuildConfig;
use crate::metamodel::{Entity, EntityProperty, MetaEdEnvironment, PropertyId};
use crate::models::TableRepository;
use crate::version::TechnologyVersion;

/// Read-only inputs shared by every builder call of one enhancer run
#[derive(Debug, Clone, Copy)]
pub struct BuildContext<'a> {
    pub env: &'a MetaEdEnvironment,
    /// Tables committed by earlier entities and stages
    pub tables: &'a TableRepository,
    pub version: TechnologyVersion,
    pub core_namespace: &'a str,
    pub include_create_date_on_extension_tables: bool,
}

impl<'a> BuildContext<'a> {
    pub fn new(
        env: &'a MetaEdEnvironment,
        config: &'a BuildConfig,
        tables: &'a TableRepository,
    ) -> Self {
        Self {
            env,
            tables,
            version: config.target_technology_version,
            core_namespace: &config.core_namespace,
            include_create_date_on_extension_tables: config.include_create_date_on_extension_tables,
        }
    }
}

/// A property together with its owner and stable id
#[derive(Debug, Clone, Copy)]
pub struct PropertyRef<'a> {
    pub id: PropertyId,
    pub owner: &'a Entity,
    pub property: &'a EntityProperty,
}

impl<'a> PropertyRef<'a> {
    /// Every property of an entity, in declaration order
    pub fn all_of(owner: &'a Entity) -> impl Iterator<Item = PropertyRef<'a>> {
        owner
            .properties_with_ids()
            .map(move |(id, property)| PropertyRef { id, owner, property })
    }
}
