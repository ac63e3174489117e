//! Build configuration types

use serde::{Deserialize, Serialize};

use crate::pipeline::error::{PipelineError, PipelineResult};
use crate::version::TechnologyVersion;

/// Configuration for a relational build run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BuildConfig {
    /// ODS/API technology version the schema is generated for
    pub target_technology_version: TechnologyVersion,
    /// Data standard version of the core namespace
    pub data_standard_version: TechnologyVersion,
    /// Namespace holding the abstract `Descriptor` base table
    pub core_namespace: String,
    /// Stages to run (empty = all)
    pub stages: Vec<BuildStage>,
    /// Validate the repository after the last stage
    pub validate_output: bool,
    /// Extension tables carry a create date audit column
    pub include_create_date_on_extension_tables: bool,
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            target_technology_version: TechnologyVersion::default(),
            data_standard_version: TechnologyVersion::new(5, 0, 0),
            core_namespace: "EdFi".to_string(),
            stages: Vec::new(),
            validate_output: true,
            include_create_date_on_extension_tables: true,
        }
    }
}

impl BuildConfig {
    /// Create a new build config
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a config from YAML
    pub fn from_yaml_str(yaml: &str) -> PipelineResult<Self> {
        let config: Self = serde_yaml::from_str(yaml)
            .map_err(|e| PipelineError::ConfigError(format!("Invalid YAML config: {}", e)))?;
        config.validate().map_err(PipelineError::ConfigError)?;
        Ok(config)
    }

    /// Set the target technology version
    pub fn with_target_technology_version(mut self, version: TechnologyVersion) -> Self {
        self.target_technology_version = version;
        self
    }

    /// Set the data standard version
    pub fn with_data_standard_version(mut self, version: TechnologyVersion) -> Self {
        self.data_standard_version = version;
        self
    }

    /// Set the core namespace name
    pub fn with_core_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.core_namespace = namespace.into();
        self
    }

    /// Set specific stages to run
    pub fn with_stages(mut self, stages: Vec<BuildStage>) -> Self {
        self.stages = stages;
        self
    }

    /// Enable or disable post-build validation
    pub fn with_validate_output(mut self, validate: bool) -> Self {
        self.validate_output = validate;
        self
    }

    /// Toggle the create date column on extension tables
    pub fn with_create_date_on_extension_tables(mut self, include: bool) -> Self {
        self.include_create_date_on_extension_tables = include;
        self
    }

    /// Get stages to run (all if empty), always in execution order
    pub fn effective_stages(&self) -> Vec<BuildStage> {
        if self.stages.is_empty() {
            BuildStage::all()
        } else {
            BuildStage::all()
                .into_iter()
                .filter(|stage| self.stages.contains(stage))
                .collect()
        }
    }

    /// Check if a specific stage should run
    pub fn should_run_stage(&self, stage: BuildStage) -> bool {
        self.stages.is_empty() || self.stages.contains(&stage)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.core_namespace.trim().is_empty() {
            return Err("Core namespace must not be empty".to_string());
        }

        // Derived tables hang off main tables built in the same run
        if self.should_run_stage(BuildStage::DerivedTables)
            && !self.should_run_stage(BuildStage::MainTables)
        {
            return Err("Derived tables stage requires the main tables stage".to_string());
        }

        Ok(())
    }
}

/// Build stages, in their fixed execution order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum BuildStage {
    /// Stage 1: main tables for every entity kind
    MainTables,
    /// Stage 2: subclass and extension tables
    DerivedTables,
    /// Stage 3: repository-wide passes (update cascade, foreign keys)
    CrossCutting,
}

impl BuildStage {
    /// Get all stages in execution order
    pub fn all() -> Vec<Self> {
        vec![Self::MainTables, Self::DerivedTables, Self::CrossCutting]
    }

    /// Get stage name
    pub fn name(&self) -> &'static str {
        match self {
            Self::MainTables => "main-tables",
            Self::DerivedTables => "derived-tables",
            Self::CrossCutting => "cross-cutting",
        }
    }

    /// Get stage description
    pub fn description(&self) -> &'static str {
        match self {
            Self::MainTables => "Build main tables for every entity kind",
            Self::DerivedTables => "Build subclass and extension tables",
            Self::CrossCutting => "Run repository-wide passes",
        }
    }

    /// Get stage index (1-based)
    pub fn index(&self) -> usize {
        match self {
            Self::MainTables => 1,
            Self::DerivedTables => 2,
            Self::CrossCutting => 3,
        }
    }
}

impl std::fmt::Display for BuildStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}
