pub mod loader;
pub mod prompts;
pub mod schema;

use secrecy::SecretString;

use crate::secrets::{resolve_secret_optional, SecretError};

pub use loader::{load_config, load_config_from_str, validate_config};
pub use prompts::PromptPack;
pub use schema::{Config, LlmConfig, NotificationConfig, StoreConfig};

impl Config {
    /// Resolves the chat API key. `Ok(None)` when no source yields a key.
    pub fn api_key(&self) -> Result<Option<SecretString>, SecretError> {
        resolve_secret_optional(
            self.llm.api_key.as_deref(),
            self.llm.api_key_file.as_deref(),
            self.llm.api_key_env_var.as_deref(),
        )
    }

    /// The configured prompt pack, or the built-in one.
    pub fn prompt_pack(&self) -> Result<PromptPack, crate::error::ConfigError> {
        match &self.prompts_file {
            Some(path) => PromptPack::load(path),
            None => Ok(PromptPack::default()),
        }
    }
}
