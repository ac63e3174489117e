//! Relational build pipeline
//!
//! Runs the enhancers in three fixed stages against one loaded
//! [`MetaEdEnvironment`]:
//!
//! 1. **main-tables**: domain entity, association, descriptor, enumeration
//!    and school year tables, with their collection and common tables
//! 2. **derived-tables**: subclass tables and extension tables
//! 3. **cross-cutting**: update cascade propagation, then foreign keys
//!
//! # Example
//!
//! ```rust,ignore
//! use metaed_ods_relational::config::BuildConfig;
//! use metaed_ods_relational::metamodel::MetaEdEnvironment;
//! use metaed_ods_relational::pipeline::RelationalPipeline;
//!
//! let env = MetaEdEnvironment::from_json_file("model.json")?;
//! let config = BuildConfig::from_yaml_str(&std::fs::read_to_string("build.yaml")?)?;
//!
//! let report = RelationalPipeline::new(config)?.run(&env)?;
//! println!("{} tables in {}", report.table_count(), report.duration_formatted());
//! ```
//!
//! A failed enhancer aborts the run with a [`PipelineError::StageFailure`]
//! naming the stage and enhancer; no partial repository is returned.

pub mod error;
pub mod executor;

pub use error::{PipelineError, PipelineResult};
pub use executor::{PipelineReport, RelationalPipeline, StageReport};

use crate::config::BuildConfig;
use crate::metamodel::MetaEdEnvironment;

/// Convenience function to run a build with the given config
pub fn run_pipeline(config: BuildConfig, env: &MetaEdEnvironment) -> PipelineResult<PipelineReport> {
    RelationalPipeline::new(config)?.run(env)
}
