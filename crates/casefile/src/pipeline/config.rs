use std::path::PathBuf;

use crate::config::Config;
use crate::secrets::expand_home;

/// The subset of [`Config`] the pipeline stages read.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub bucket: String,
    pub record_extension: String,
    /// Downloaded inputs, combined documents and staged records.
    pub work_directory: PathBuf,
    pub reports_directory: PathBuf,
    pub notifications_enabled: bool,
}

impl PipelineConfig {
    pub fn from_config(config: &Config) -> Self {
        Self {
            bucket: config.bucket.clone(),
            record_extension: config.record_extension.clone(),
            work_directory: PathBuf::from(expand_home(&config.work_directory)),
            reports_directory: PathBuf::from(expand_home(&config.reports_directory)),
            notifications_enabled: config.notification.enabled,
        }
    }
}
