//! Sequential per-track processing and the normalisation pass

pub mod normalise;
pub mod orchestrator;
pub mod scratch;

pub use normalise::{normalised_path, process_normalisation};
pub use orchestrator::{run, run_with, PipelineResult, Stage, TrackFailure};
pub use scratch::Scratch;
