use std::path::Path;

use crate::config::schema::Config;
use crate::error::ConfigError;

pub fn load_config<P: AsRef<Path>>(path: P) -> Result<Config, ConfigError> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadFile {
        path: path.to_path_buf(),
        source: e,
    })?;

    load_config_from_str(&content)
}

pub fn load_config_from_str(content: &str) -> Result<Config, ConfigError> {
    let config: Config = serde_json::from_str(content)?;

    validate_config(&config)?;

    Ok(config)
}

fn invalid(message: impl Into<String>) -> ConfigError {
    ConfigError::Validation {
        message: message.into(),
    }
}

pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    if config.version != "1.0" {
        return Err(invalid(format!(
            "Unsupported config version: {}",
            config.version
        )));
    }

    let bucket = config.bucket.trim();
    if bucket.is_empty() {
        return Err(invalid("bucket must not be empty"));
    }
    if bucket.contains('/') || bucket == "." || bucket == ".." {
        return Err(invalid(format!("Invalid bucket name: {}", config.bucket)));
    }

    let ext = &config.record_extension;
    if ext.is_empty() || ext.starts_with('.') || ext.contains('/') {
        return Err(invalid(format!(
            "record_extension must be a bare extension like 'json', got '{}'",
            ext
        )));
    }
    if ext.eq_ignore_ascii_case("pdf") || ext.eq_ignore_ascii_case("docx") {
        return Err(invalid(
            "record_extension must differ from the document extensions",
        ));
    }

    if config.llm.timeout_secs == 0 {
        return Err(invalid("llm.timeout_secs must be greater than 0"));
    }
    if config.llm.max_attempts == 0 {
        return Err(invalid("llm.max_attempts must be at least 1"));
    }
    if config.llm.model.trim().is_empty() {
        return Err(invalid("llm.model must not be empty"));
    }

    if config.notification.enabled
        && (config.notification.sender.trim().is_empty()
            || config.notification.recipient.trim().is_empty())
    {
        return Err(invalid(
            "notification.sender and notification.recipient are required when notifications are enabled",
        ));
    }

    Ok(())
}
