use std::path::PathBuf;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub version: String,
    /// Bucket holding one prefix per case folder.
    pub bucket: String,
    #[serde(default)]
    pub store: StoreConfig,
    /// Staging area for downloaded and combined documents.
    #[serde(default = "default_work_directory")]
    pub work_directory: String,
    /// Where generated reports are written before upload.
    #[serde(default = "default_reports_directory")]
    pub reports_directory: String,
    /// Extension (without dot) of the per-folder structured record.
    #[serde(default = "default_record_extension")]
    pub record_extension: String,
    #[serde(default)]
    pub llm: LlmConfig,
    /// Optional YAML prompt pack; built-in prompts are used when absent.
    #[serde(default)]
    pub prompts_file: Option<String>,
    #[serde(default)]
    pub notification: NotificationConfig,
}

fn data_dir() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(std::env::temp_dir)
        .join("casefile")
}

fn default_work_directory() -> String {
    data_dir().join("work").to_string_lossy().into_owned()
}

fn default_reports_directory() -> String {
    data_dir().join("reports").to_string_lossy().into_owned()
}

fn default_record_extension() -> String {
    "json".to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Directory whose subdirectories are buckets.
    #[serde(default = "default_store_root")]
    pub root: String,
}

fn default_store_root() -> String {
    data_dir().join("store").to_string_lossy().into_owned()
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            root: default_store_root(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    #[serde(default = "default_api_base")]
    pub api_base: String,
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default)]
    pub api_key_file: Option<String>,
    #[serde(default = "default_api_key_env_var")]
    pub api_key_env_var: Option<String>,
    /// Per-request timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// 1 disables retries.
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    #[serde(default = "default_retry_backoff_secs")]
    pub retry_backoff_secs: u64,
}

fn default_api_base() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_model() -> String {
    "gpt-4o".to_string()
}

fn default_api_key_env_var() -> Option<String> {
    Some("OPENAI_API_KEY".to_string())
}

fn default_timeout_secs() -> u64 {
    120
}

fn default_max_attempts() -> u32 {
    1
}

fn default_retry_backoff_secs() -> u64 {
    2
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            api_base: default_api_base(),
            model: default_model(),
            api_key: None,
            api_key_file: None,
            api_key_env_var: default_api_key_env_var(),
            timeout_secs: default_timeout_secs(),
            max_attempts: default_max_attempts(),
            retry_backoff_secs: default_retry_backoff_secs(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Messages are written here as `.eml` files for pickup by a mail relay.
    #[serde(default = "default_outbox_directory")]
    pub outbox_directory: String,
    #[serde(default = "default_sender")]
    pub sender: String,
    #[serde(default = "default_recipient")]
    pub recipient: String,
}

fn default_true() -> bool {
    true
}

fn default_outbox_directory() -> String {
    data_dir().join("outbox").to_string_lossy().into_owned()
}

fn default_sender() -> String {
    "casefile@localhost".to_string()
}

fn default_recipient() -> String {
    "proposals@localhost".to_string()
}

impl Default for NotificationConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            outbox_directory: default_outbox_directory(),
            sender: default_sender(),
            recipient: default_recipient(),
        }
    }
}
