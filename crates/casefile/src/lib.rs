pub mod archive;
pub mod classify;
pub mod combine;
pub mod config;
pub mod error;
pub mod llm;
pub mod logging;
pub mod notify;
pub mod pipeline;
pub mod record;
pub mod registry;
pub mod report;
pub mod sanitize;
pub mod secrets;
pub mod staging;
pub mod store;

pub use archive::{ArchiveEngine, ArchiveReport, ArchiveScope};
pub use classify::{ContentClassifier, FileVerdict, FilenameClassifier};
pub use combine::{CombinedDocument, DocumentCombiner, DocumentFormat, SourceDocument};
pub use config::{load_config, Config, PromptPack};
pub use error::{CasefileError, ConfigError, ProcessError, Result, StagingError, StoreError};
pub use llm::{ChatService, LlmError, OpenAiChatClient, RetryingChat};
pub use notify::{Notification, Notifier, NotifyError};
pub use pipeline::{
    LogProgress, NoopProgress, Pipeline, PipelineConfig, PipelineError, PipelineRun,
    ProgressReporter, RunSummary,
};
pub use record::CaseRecord;
pub use registry::{CaseFolder, FolderRegistry, FolderStage, RoutingDecision};
pub use report::{AmendmentGenerator, BidRecommendation, ReportGenerator};
pub use secrets::{resolve_secret, resolve_secret_optional, SecretError};
pub use store::{FsObjectStore, MemoryObjectStore, ObjectStore};
