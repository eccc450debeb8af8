use std::path::PathBuf;

use ndarray::Array3;

use crate::capture::CaptureDiagnostics;

/// Pipeline processing stage, used for progress reporting.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PipelineStage {
    Display,
    Capture,
    Loading,
    Preparation,
    Reconstruction,
    Finalizing,
    Writing,
}

impl std::fmt::Display for PipelineStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Display => write!(f, "Displaying target"),
            Self::Capture => write!(f, "Capturing"),
            Self::Loading => write!(f, "Loading frame and PSF"),
            Self::Preparation => write!(f, "Preparing data"),
            Self::Reconstruction => write!(f, "Reconstructing"),
            Self::Finalizing => write!(f, "Finalizing"),
            Self::Writing => write!(f, "Writing output"),
        }
    }
}

/// What a run produced.
#[derive(Clone, Debug)]
pub struct PipelineOutput {
    /// Final `(h, w, c)` reconstruction, after cropping.
    pub image: Array3<f32>,
    /// Camera diagnostics, when the frame came from a capture.
    pub diagnostics: Option<CaptureDiagnostics>,
    /// Files written, in order.
    pub written: Vec<PathBuf>,
}

/// Thread-safe progress reporting for the pipeline.
///
/// Implementors can use this to drive spinners, logging, or any other UI
/// feedback. All methods have default no-op implementations.
pub trait ProgressReporter: Send + Sync {
    /// A new pipeline stage has started.
    fn begin_stage(&self, _stage: PipelineStage) {}

    /// The current stage is finished.
    fn finish_stage(&self) {}
}

/// No-op progress reporter, used when `run_pipeline` delegates.
pub(super) struct NoOpReporter;
impl ProgressReporter for NoOpReporter {}
