pub mod config;
mod orchestrator;
mod types;

pub use orchestrator::{
    capture_reported, reconstruct, reconstruct_reported, run_pipeline, run_pipeline_reported,
    OutputSettings,
};
pub use types::{PipelineOutput, PipelineStage, ProgressReporter};
