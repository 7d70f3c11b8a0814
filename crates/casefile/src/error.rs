use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CasefileError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Processing error: {0}")]
    Process(#[from] ProcessError),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Staging error: {0}")]
    Staging(#[from] StagingError),

    #[error("Record error: {0}")]
    Record(#[from] crate::record::RecordError),

    #[error("Chat service error: {0}")]
    Llm(#[from] crate::llm::LlmError),

    #[error("Secret error: {0}")]
    Secret(#[from] crate::secrets::SecretError),

    #[error("Report error: {0}")]
    Report(#[from] crate::report::ReportError),

    #[error("Pipeline error: {0}")]
    Pipeline(#[from] crate::pipeline::PipelineError),
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file '{path}': {source}")]
    ReadFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config JSON: {0}")]
    ParseJson(#[from] serde_json::Error),

    #[error("Failed to parse prompt pack YAML: {0}")]
    ParseYaml(#[from] serde_yaml::Error),

    #[error("Config validation failed: {message}")]
    Validation { message: String },
}

#[derive(Error, Debug)]
pub enum ProcessError {
    #[error("Unsupported document format: {0}")]
    UnsupportedFormat(String),

    #[error("No documents to combine")]
    EmptyInput,

    #[error("Failed to read document '{path}': {source}")]
    ReadDocument {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to process PDF: {0}")]
    PdfProcessing(String),

    #[error("Failed to process DOCX: {0}")]
    DocxProcessing(String),
}

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Object not found: {bucket}/{key}")]
    NotFound { bucket: String, key: String },

    #[error("Invalid object key '{key}': {reason}")]
    InvalidKey { key: String, reason: String },

    #[error("Failed to list '{bucket}/{prefix}': {reason}")]
    List {
        bucket: String,
        prefix: String,
        reason: String,
    },

    #[error("Store I/O failed for '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Copy of '{from}' to '{to}' could not be verified")]
    CopyNotVerified { from: String, to: String },

    #[error("No free destination name for '{0}'")]
    NameExhausted(String),
}

/// Local staging of downloaded inputs and generated artifacts.
#[derive(Error, Debug)]
pub enum StagingError {
    #[error("Failed to create directory '{path}': {source}")]
    CreateDirectory {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write file '{path}': {source}")]
    WriteFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("File already exists: {0}")]
    FileExists(PathBuf),
}

pub type Result<T> = std::result::Result<T, CasefileError>;
