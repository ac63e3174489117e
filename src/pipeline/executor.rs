//! Pipeline executor for running a full relational build

use std::time::Instant;

use serde::Serialize;
use tracing::{debug, error, info, info_span, warn};
use uuid::Uuid;

use super::error::{PipelineError, PipelineResult};
use crate::config::{BuildConfig, BuildStage};
use crate::enhancer::{BuildState, Enhancer, EnhancerOutcome};
use crate::metamodel::MetaEdEnvironment;
use crate::models::TableRepository;
use crate::validation::{RelationshipValidator, TableValidator};

/// Runs every enhancer of the configured stages against one environment
#[derive(Debug, Clone)]
pub struct RelationalPipeline {
    config: BuildConfig,
}

impl RelationalPipeline {
    /// Create a new pipeline, rejecting an invalid config up front
    pub fn new(config: BuildConfig) -> PipelineResult<Self> {
        config.validate().map_err(PipelineError::ConfigError)?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &BuildConfig {
        &self.config
    }

    /// Run the pipeline
    ///
    /// The first failing enhancer aborts the run; no partial repository is
    /// returned.
    pub fn run(&self, env: &MetaEdEnvironment) -> PipelineResult<PipelineReport> {
        let run_id = Uuid::new_v4().to_string();
        let _span = info_span!(
            "relational_build",
            run_id = %run_id,
            target_version = %self.config.target_technology_version
        )
        .entered();

        let start = Instant::now();
        let stages = self.config.effective_stages();

        info!(
            run_id = %run_id,
            stages = ?stages.iter().map(|s| s.name()).collect::<Vec<_>>(),
            entities = env.entities().len(),
            "Starting relational build"
        );

        let mut state = BuildState::new(env, &self.config);
        let mut reports = Vec::with_capacity(stages.len());

        for stage in &stages {
            let _stage_span = info_span!("relational_stage", stage = stage.name()).entered();
            info!(stage = stage.name(), "Starting stage");
            let report = Self::run_stage(*stage, &mut state)?;
            info!(
                stage = stage.name(),
                duration_ms = report.duration_ms,
                tables_added = report.tables_added(),
                "Stage completed"
            );
            reports.push(report);
        }

        let repository = state.into_repository();
        if self.config.validate_output {
            Self::validate(&repository)?;
        }

        let duration_ms = start.elapsed().as_millis() as u64;
        info!(
            run_id = %run_id,
            duration_ms,
            tables = repository.table_count(),
            "Relational build completed"
        );

        Ok(PipelineReport {
            run_id,
            stages: reports,
            repository,
            duration_ms,
        })
    }

    /// Run a single stage
    fn run_stage(stage: BuildStage, state: &mut BuildState<'_>) -> PipelineResult<StageReport> {
        let start = Instant::now();
        let mut enhancers = Vec::new();

        for enhancer in Enhancer::for_stage(stage) {
            match enhancer.run(state) {
                Ok(outcome) => enhancers.push(outcome),
                Err(e) => {
                    error!(
                        stage = stage.name(),
                        enhancer = enhancer.name(),
                        error = %e,
                        "Enhancer failed"
                    );
                    return Err(PipelineError::stage(stage.name(), enhancer.name(), e));
                }
            }
        }

        Ok(StageReport {
            stage,
            enhancers,
            duration_ms: start.elapsed().as_millis() as u64,
        })
    }

    /// Structural checks on the finished repository
    ///
    /// Table violations fail the run; cascade cycles are only reported.
    fn validate(repository: &TableRepository) -> PipelineResult<()> {
        let tables = TableValidator::new().validate(repository);
        if !tables.is_valid() {
            let messages = tables.messages();
            error!(violations = messages.len(), "Repository validation failed");
            return Err(PipelineError::ValidationFailed(messages));
        }

        let relationships = RelationshipValidator::new().validate(repository);
        for cycle in &relationships.cascade_cycles {
            warn!(kind = ?cycle.kind, tables = ?cycle.tables, "Cascading foreign keys form a cycle");
        }
        debug!(tables = repository.table_count(), "Repository validated");
        Ok(())
    }
}

/// Outcome of one stage
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StageReport {
    pub stage: BuildStage,
    pub enhancers: Vec<EnhancerOutcome>,
    pub duration_ms: u64,
}

impl StageReport {
    pub fn tables_added(&self) -> usize {
        self.enhancers.iter().map(|e| e.tables_added).sum()
    }
}

/// Pipeline execution report
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PipelineReport {
    /// Run ID
    pub run_id: String,
    /// Completed stages in execution order
    pub stages: Vec<StageReport>,
    /// Every table produced by the run
    pub repository: TableRepository,
    /// Total duration in milliseconds
    pub duration_ms: u64,
}

impl PipelineReport {
    /// Check if every enhancer succeeded
    pub fn is_success(&self) -> bool {
        self.stages
            .iter()
            .flat_map(|s| &s.enhancers)
            .all(|e| e.success)
    }

    pub fn table_count(&self) -> usize {
        self.repository.table_count()
    }

    /// Names of enhancers skipped for the configured versions
    pub fn skipped_enhancers(&self) -> Vec<&str> {
        self.stages
            .iter()
            .flat_map(|s| &s.enhancers)
            .filter(|e| e.skipped)
            .map(|e| e.enhancer.as_str())
            .collect()
    }

    /// Get duration as human-readable string
    pub fn duration_formatted(&self) -> String {
        let secs = self.duration_ms / 1000;
        let mins = secs / 60;
        let remaining_secs = secs % 60;

        if mins > 0 {
            format!("{}m {}s", mins, remaining_secs)
        } else {
            format!("{}s", secs)
        }
    }
}
