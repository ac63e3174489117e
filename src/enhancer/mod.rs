//! Entity-kind enhancers
//!
//! Thin drivers that pick the entities of one kind out of the environment,
//! hand them to the builders and commit the produced tables into the shared
//! repository. Each enhancer reports an [`EnhancerOutcome`]; the pipeline
//! stops at the first error.

pub mod derived_tables;
pub mod foreign_keys;
pub mod lookup_tables;
pub mod main_tables;
pub mod update_cascade;

pub use update_cascade::IdentityGraph;

use std::collections::HashSet;
use std::time::Instant;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::builder::{BuildContext, TableSet};
use crate::config::{BuildConfig, BuildStage};
use crate::error::BuildResult;
use crate::metamodel::{EntityId, MetaEdEnvironment};
use crate::models::{TableKey, TableRepository};

/// Mutable state threaded through every enhancer of one run
#[derive(Debug)]
pub struct BuildState<'a> {
    pub env: &'a MetaEdEnvironment,
    pub config: &'a BuildConfig,
    pub repository: TableRepository,
    /// Entities whose primary key updates cascade to referencing tables
    pub update_cascading: HashSet<EntityId>,
    pub identity_graph: Option<IdentityGraph>,
}

impl<'a> BuildState<'a> {
    pub fn new(env: &'a MetaEdEnvironment, config: &'a BuildConfig) -> Self {
        Self {
            env,
            config,
            repository: TableRepository::new(),
            update_cascading: HashSet::new(),
            identity_graph: None,
        }
    }

    pub fn into_repository(self) -> TableRepository {
        self.repository
    }
}

/// Build the tables of one top-level entity and commit them
///
/// The builder sees the repository as it stood before this entity; the
/// returned keys are in table creation order, `None` for discarded tables.
pub(crate) fn build_and_commit<R>(
    state: &mut BuildState<'_>,
    root: EntityId,
    build: impl FnOnce(&BuildContext<'_>, &mut TableSet) -> BuildResult<R>,
) -> BuildResult<(R, Vec<Option<TableKey>>)> {
    let mut tables = TableSet::new(root);
    let result = {
        let ctx = BuildContext::new(state.env, state.config, &state.repository);
        build(&ctx, &mut tables)?
    };
    let keys = tables.commit(
        &mut state.repository,
        state.config.target_technology_version,
    )?;
    Ok((result, keys))
}

/// Result of running one enhancer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnhancerOutcome {
    pub enhancer: String,
    pub success: bool,
    /// The enhancer does not target the configured versions
    pub skipped: bool,
    pub tables_added: usize,
    pub duration_ms: u64,
}

impl EnhancerOutcome {
    fn skipped(enhancer: &str) -> Self {
        Self {
            enhancer: enhancer.to_string(),
            success: true,
            skipped: true,
            tables_added: 0,
            duration_ms: 0,
        }
    }
}

/// Enhancers in their fixed execution order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Enhancer {
    /// Domain entity and association main tables
    EntityTables,
    DescriptorTables,
    /// Map type enumeration tables of data standards before 3.0
    DescriptorMapTypeTables,
    EnumerationTables,
    SchoolYearTables,
    SubclassTables,
    ExtensionTables,
    UpdateCascade,
    ForeignKeys,
}

impl Enhancer {
    /// Enhancers of a stage, in execution order
    pub fn for_stage(stage: BuildStage) -> Vec<Self> {
        match stage {
            BuildStage::MainTables => vec![
                Self::EntityTables,
                Self::DescriptorTables,
                Self::DescriptorMapTypeTables,
                Self::EnumerationTables,
                Self::SchoolYearTables,
            ],
            BuildStage::DerivedTables => vec![Self::SubclassTables, Self::ExtensionTables],
            BuildStage::CrossCutting => vec![Self::UpdateCascade, Self::ForeignKeys],
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::EntityTables => "entity-tables",
            Self::DescriptorTables => "descriptor-tables",
            Self::DescriptorMapTypeTables => "descriptor-map-type-tables",
            Self::EnumerationTables => "enumeration-tables",
            Self::SchoolYearTables => "school-year-tables",
            Self::SubclassTables => "subclass-tables",
            Self::ExtensionTables => "extension-tables",
            Self::UpdateCascade => "update-cascade",
            Self::ForeignKeys => "foreign-keys",
        }
    }

    /// Whether the enhancer targets the configured versions
    pub fn applies_to(&self, config: &BuildConfig) -> bool {
        match self {
            Self::DescriptorMapTypeTables => config.data_standard_version.has_descriptor_map_types(),
            _ => true,
        }
    }

    pub fn run(&self, state: &mut BuildState<'_>) -> BuildResult<EnhancerOutcome> {
        if !self.applies_to(state.config) {
            debug!(
                enhancer = self.name(),
                data_standard_version = %state.config.data_standard_version,
                "Enhancer does not target this version, skipped"
            );
            return Ok(EnhancerOutcome::skipped(self.name()));
        }

        let start = Instant::now();
        let before = state.repository.table_count();

        match self {
            Self::EntityTables => main_tables::run(state)?,
            Self::DescriptorTables => lookup_tables::descriptors(state)?,
            Self::DescriptorMapTypeTables => lookup_tables::descriptor_map_types(state)?,
            Self::EnumerationTables => lookup_tables::enumerations(state)?,
            Self::SchoolYearTables => lookup_tables::school_years(state)?,
            Self::SubclassTables => derived_tables::subclasses(state)?,
            Self::ExtensionTables => derived_tables::extensions(state)?,
            Self::UpdateCascade => update_cascade::run(state)?,
            Self::ForeignKeys => foreign_keys::run(state)?,
        }

        let outcome = EnhancerOutcome {
            enhancer: self.name().to_string(),
            success: true,
            skipped: false,
            tables_added: state.repository.table_count() - before,
            duration_ms: start.elapsed().as_millis() as u64,
        };
        info!(
            enhancer = %outcome.enhancer,
            tables_added = outcome.tables_added,
            duration_ms = outcome.duration_ms,
            "Enhancer completed"
        );
        Ok(outcome)
    }
}

impl std::fmt::Display for Enhancer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}
