//! Stage-major orchestration of a run over every case folder.

pub mod config;
pub mod error;
pub mod progress;
pub mod runner;
pub mod summary;

pub use config::PipelineConfig;
pub use error::{PipelineError, PipelineWarning};
pub use progress::{LogProgress, NoopProgress, PipelineStage, ProgressEvent, ProgressReporter};
pub use runner::Pipeline;
pub use summary::{PipelineRun, RunSummary};
