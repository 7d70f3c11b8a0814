//! Isolated environment for running the pipeline against a directory store.

#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tempfile::TempDir;

use casefile::archive::ArchiveEngine;
use casefile::config::PromptPack;
use casefile::llm::{ChatService, LlmError};
use casefile::notify::{Notification, Notifier, NotifyError};
use casefile::pipeline::{NoopProgress, Pipeline, PipelineConfig, PipelineError, PipelineRun};
use casefile::store::{FsObjectStore, ObjectStore};

use super::builders::FolderBuilder;

pub const BUCKET: &str = "proposals";

/// Chat double answering by instruction set.
///
/// Records whose subject starts with "New RS3" classify as new reports.
/// Everything the report chain asks gets a canned reply.
pub struct ScriptedChat {
    prompts: PromptPack,
    pub amendment_reply: String,
    pub bid_reply: String,
    pub calls: Mutex<Vec<String>>,
}

impl ScriptedChat {
    pub fn new() -> Self {
        Self {
            prompts: PromptPack::default(),
            amendment_reply: "Questions and answers were posted.".to_string(),
            bid_reply: "Strong fit.\nOVERALL_RECOMMENDATION=BID".to_string(),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

#[async_trait]
impl ChatService for ScriptedChat {
    async fn complete(&self, instructions: &str, message: &str) -> Result<String, LlmError> {
        self.calls.lock().unwrap().push(message.to_string());

        let p = &self.prompts;
        let reply = if instructions == p.classifier_instructions {
            if message.contains("New RS3") {
                "new RS3 report".to_string()
            } else {
                "other".to_string()
            }
        } else if instructions == p.amendment_summary {
            self.amendment_reply.clone()
        } else if instructions == p.bid_analysis {
            self.bid_reply.clone()
        } else if instructions == p.case_number {
            "The RS3 number is RS2-24-0099.".to_string()
        } else {
            format!("Section reply ({} chars in)", message.len())
        };
        Ok(reply)
    }
}

#[derive(Default)]
pub struct RecordingNotifier {
    pub sent: Mutex<Vec<Notification>>,
}

impl Notifier for RecordingNotifier {
    fn send(&self, notification: &Notification) -> Result<(), NotifyError> {
        self.sent.lock().unwrap().push(notification.clone());
        Ok(())
    }
}

pub struct TestHarness {
    temp_dir: TempDir,
    pub store: Arc<FsObjectStore>,
    pub chat: Arc<ScriptedChat>,
    pub notifier: Arc<RecordingNotifier>,
    pub reports_dir: PathBuf,
}

impl TestHarness {
    pub fn new() -> Self {
        Self::with_chat(ScriptedChat::new())
    }

    pub fn with_chat(chat: ScriptedChat) -> Self {
        let temp_dir = TempDir::new().unwrap();
        let store = Arc::new(FsObjectStore::new(temp_dir.path().join("store")));
        let reports_dir = temp_dir.path().join("reports");
        Self {
            temp_dir,
            store,
            chat: Arc::new(chat),
            notifier: Arc::new(RecordingNotifier::default()),
            reports_dir,
        }
    }

    pub fn root(&self) -> &Path {
        self.temp_dir.path()
    }

    pub fn seed(&self, folder: &str, builder: FolderBuilder) {
        for (name, bytes) in builder.files {
            self.put(&format!("{}/{}", folder, name), &bytes);
        }
    }

    pub fn put(&self, key: &str, bytes: &[u8]) {
        self.store.put_object(BUCKET, key, bytes).unwrap();
    }

    pub fn keys(&self, prefix: &str) -> Vec<String> {
        self.store.list_objects(BUCKET, prefix, None).unwrap().keys
    }

    pub fn pipeline(&self) -> Pipeline {
        let config = Arc::new(PipelineConfig {
            bucket: BUCKET.to_string(),
            record_extension: "json".to_string(),
            work_directory: self.root().join("work"),
            reports_directory: self.reports_dir.clone(),
            notifications_enabled: true,
        });
        Pipeline::new(
            config,
            self.store.clone(),
            self.chat.clone(),
            &PromptPack::default(),
            self.notifier.clone(),
        )
    }

    pub fn archiver(&self) -> ArchiveEngine {
        ArchiveEngine::new(self.store.clone(), BUCKET)
    }

    pub async fn run(&self) -> Result<PipelineRun, PipelineError> {
        self.pipeline().run(&NoopProgress).await
    }
}
