use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info, info_span, warn, Instrument};
use uuid::Uuid;

use crate::archive::{ArchiveEngine, ArchiveScope};
use crate::classify::filename::is_supported;
use crate::classify::{ContentClassifier, FilenameClassifier};
use crate::combine::{pdf, DocumentCombiner, SourceDocument};
use crate::config::{Config, PromptPack};
use crate::error::{CasefileError, ProcessError};
use crate::llm::{ChatService, OpenAiChatClient, RetryingChat};
use crate::notify::{NoopNotifier, Notification, Notifier, OutboxNotifier};
use crate::record::CaseRecord;
use crate::registry::{CaseFolder, ClassifiedDocument, FolderRegistry, FolderStage, RoutingDecision};
use crate::report::{AmendmentGenerator, GeneratedReport, ReportGenerator};
use crate::sanitize;
use crate::secrets::expand_home;
use crate::staging::{split_extension, LocalStaging};
use crate::store::{self, FsObjectStore, ObjectStore};

use super::config::PipelineConfig;
use super::error::{PipelineError, PipelineWarning};
use super::progress::{PipelineStage, ProgressEvent, ProgressReporter};
use super::summary::PipelineRun;

pub struct Pipeline {
    config: Arc<PipelineConfig>,
    store: Arc<dyn ObjectStore>,
    content_classifier: ContentClassifier,
    filename_classifier: FilenameClassifier,
    combiner: DocumentCombiner,
    reports: ReportGenerator,
    amendments: AmendmentGenerator,
    notifier: Arc<dyn Notifier>,
    work: LocalStaging,
    archiver: ArchiveEngine,
}

impl Pipeline {
    /// Production constructor: filesystem store, HTTP chat client, outbox notifier.
    pub fn from_config(config: &Config) -> Result<Self, CasefileError> {
        let pipeline_config = Arc::new(PipelineConfig::from_config(config));
        let store: Arc<dyn ObjectStore> =
            Arc::new(FsObjectStore::new(expand_home(&config.store.root)));

        let api_key = config.api_key()?;
        if api_key.is_none() {
            warn!("No API key configured; record classification will be indeterminate");
        }
        let client = OpenAiChatClient::new(
            &config.llm.api_base,
            &config.llm.model,
            api_key,
            Duration::from_secs(config.llm.timeout_secs),
        )?;
        debug!(
            "Chat endpoint {} (model {})",
            sanitize::redact_url(&config.llm.api_base),
            config.llm.model
        );
        let chat: Arc<dyn ChatService> = if config.llm.max_attempts > 1 {
            Arc::new(RetryingChat::new(
                client,
                config.llm.max_attempts,
                Duration::from_secs(config.llm.retry_backoff_secs),
            ))
        } else {
            Arc::new(client)
        };

        let prompts = config.prompt_pack()?;

        let notifier: Arc<dyn Notifier> = if config.notification.enabled {
            Arc::new(OutboxNotifier::new(
                expand_home(&config.notification.outbox_directory),
                &config.notification.sender,
                &config.notification.recipient,
            ))
        } else {
            Arc::new(NoopNotifier)
        };

        Ok(Self::new(pipeline_config, store, chat, &prompts, notifier))
    }

    /// Wires the pipeline from explicit collaborators.
    pub fn new(
        config: Arc<PipelineConfig>,
        store: Arc<dyn ObjectStore>,
        chat: Arc<dyn ChatService>,
        prompts: &PromptPack,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        let reports = ReportGenerator::new(
            chat.clone(),
            prompts,
            LocalStaging::new(&config.reports_directory),
        );
        let amendments = AmendmentGenerator::new(
            chat.clone(),
            prompts,
            LocalStaging::new(&config.reports_directory),
        );
        let archiver = ArchiveEngine::new(store.clone(), config.bucket.clone());

        Self {
            content_classifier: ContentClassifier::new(chat, prompts),
            filename_classifier: FilenameClassifier::new(),
            combiner: DocumentCombiner::new(),
            reports,
            amendments,
            notifier,
            work: LocalStaging::new(&config.work_directory),
            archiver,
            store,
            config,
        }
    }

    /// Runs every stage over every folder, one stage at a time.
    ///
    /// Only discovery failure aborts the run; anything else is recorded on
    /// the folder or as a warning.
    pub async fn run(&self, progress: &dyn ProgressReporter) -> Result<PipelineRun, PipelineError> {
        let run_id = Uuid::new_v4();
        let span = info_span!("pipeline", run_id = %run_id, bucket = %self.config.bucket);
        self.run_stages(run_id, progress).instrument(span).await
    }

    async fn run_stages(
        &self,
        run_id: Uuid,
        progress: &dyn ProgressReporter,
    ) -> Result<PipelineRun, PipelineError> {
        // Stage 1: Discover
        let registry = {
            let _step = info_span!("discover").entered();
            progress.report(ProgressEvent::Stage {
                stage: PipelineStage::Discover,
                folders: 0,
            });
            match FolderRegistry::discover(
                self.store.as_ref(),
                &self.config.bucket,
                &self.config.record_extension,
            ) {
                Ok(registry) => registry,
                Err(e) => {
                    let error = PipelineError::Discovery(e);
                    progress.report(ProgressEvent::Failed {
                        error: error.to_string(),
                    });
                    return Err(error);
                }
            }
        };

        let mut run = PipelineRun::new(run_id, registry);
        if run.registry.is_empty() {
            info!("No folders with files in the root");
            progress.report(ProgressEvent::Completed {
                summary: run.summary(),
            });
            return Ok(run);
        }

        // Stage 2: Classify content
        progress.report(ProgressEvent::Stage {
            stage: PipelineStage::ClassifyContent,
            folders: run.registry.len(),
        });
        self.step_classify_content(&mut run.registry)
            .instrument(info_span!("classify_content"))
            .await;

        // Stage 3: Classify files
        {
            let _step = info_span!("classify_files").entered();
            progress.report(ProgressEvent::Stage {
                stage: PipelineStage::ClassifyFiles,
                folders: run.registry.routed(RoutingDecision::ReportNeeded).count(),
            });
            self.step_classify_files(&mut run.registry);
        }

        // Stage 4: Prepare
        {
            let _step = info_span!("prepare").entered();
            progress.report(ProgressEvent::Stage {
                stage: PipelineStage::Prepare,
                folders: run.registry.len(),
            });
            self.step_prepare_reports(&mut run.registry);
            self.step_prepare_amendments(&mut run.registry);
        }

        // Stage 5: Generate
        progress.report(ProgressEvent::Stage {
            stage: PipelineStage::Generate,
            folders: run.registry.len(),
        });
        self.step_generate_reports(&mut run.registry)
            .instrument(info_span!("generate_reports"))
            .await;
        self.step_generate_amendments(&mut run.registry)
            .instrument(info_span!("generate_amendments"))
            .await;

        // Stage 6: Persist
        {
            let _step = info_span!("persist").entered();
            progress.report(ProgressEvent::Stage {
                stage: PipelineStage::Persist,
                folders: run.registry.len(),
            });
            self.step_persist(&mut run);
        }

        // Stage 7: Notify
        {
            let _step = info_span!("notify").entered();
            progress.report(ProgressEvent::Stage {
                stage: PipelineStage::Notify,
                folders: run.registry.routed(RoutingDecision::ReportNeeded).count(),
            });
            self.step_notify(&mut run);
        }

        // Stage 8: Archive
        {
            let _step = info_span!("archive").entered();
            progress.report(ProgressEvent::Stage {
                stage: PipelineStage::Archive,
                folders: run.registry.len(),
            });
            self.step_archive(&mut run);
        }

        let summary = run.summary();
        info!("{}", summary);
        progress.report(ProgressEvent::Completed { summary });
        Ok(run)
    }

    async fn step_classify_content(&self, registry: &mut FolderRegistry) {
        for folder in registry.iter_mut() {
            if folder.record_key.is_none() {
                debug!("{} has no record; leaving it unclassified", folder.folder_key);
                continue;
            }

            let text = match (&folder.record, &folder.record_error) {
                (Some(record), _) => record.combined_text(),
                (None, error) => {
                    let reason = error.as_deref().unwrap_or("record unavailable");
                    warn!("Cannot classify {}: {}", folder.folder_key, reason);
                    folder.classification_error = Some(format!("Error processing record: {}", reason));
                    continue;
                }
            };

            match self.content_classifier.classify(&text).await {
                Ok(is_new_report) => {
                    folder.route(if is_new_report {
                        RoutingDecision::ReportNeeded
                    } else {
                        RoutingDecision::AmendmentOther
                    });
                    folder.advance(FolderStage::ContentClassified);
                    info!("{} routed to {:?}", folder.folder_key, folder.routing);
                }
                Err(e) => {
                    warn!("Classification of {} is indeterminate: {}", folder.folder_key, e);
                    folder.classification_error = Some(format!("Error processing record: {}", e));
                }
            }
        }
    }

    fn step_classify_files(&self, registry: &mut FolderRegistry) {
        for folder in registry.routed_mut(RoutingDecision::ReportNeeded) {
            let mut documents = Vec::new();
            for key in &folder.notable_files {
                let name = store::file_name(key);
                if !is_supported(name) {
                    debug!("Skipping {}: not a PDF or DOCX document", key);
                    continue;
                }
                let verdict = self.filename_classifier.classify(name);
                debug!("{}: {}", key, verdict.reason);
                documents.push(ClassifiedDocument {
                    key: key.clone(),
                    verdict,
                });
            }

            folder.target_count = documents.iter().filter(|d| d.verdict.is_target).count();
            folder.classified_documents = documents;
            folder.advance(FolderStage::FileClassified);
            info!(
                "{}: {} of {} document(s) are targets",
                folder.folder_key,
                folder.target_count,
                folder.classified_documents.len()
            );
        }
    }

    fn step_prepare_reports(&self, registry: &mut FolderRegistry) {
        for folder in registry.routed_mut(RoutingDecision::ReportNeeded) {
            if folder.target_count == 0 {
                info!("No target documents in {}; no report will be generated", folder.folder_key);
                continue;
            }

            match self.prepare_report(folder) {
                Ok(()) => folder.advance(FolderStage::Prepared),
                Err(e) => {
                    warn!("Preparing report inputs for {} failed: {}", folder.folder_key, e);
                    folder.derived_artifact = Some(Err(e.to_string()));
                }
            }
        }
    }

    fn prepare_report(&self, folder: &mut CaseFolder) -> Result<(), CasefileError> {
        let mut sources = Vec::with_capacity(folder.target_count);
        for key in folder.target_keys() {
            let bytes = self.store.get_object(&self.config.bucket, key)?;
            sources.push(SourceDocument::new(store::file_name(key), bytes));
        }

        let combined = self.combiner.combine(&sources)?;
        let dir = sanitize::local_dir_name(&folder.folder_key);
        let path = self
            .work
            .store(&combined.bytes, &dir, &format!("{}-combined", dir), "pdf")?;
        debug!(
            "Combined {} document(s) of {} into {}",
            combined.source_count,
            folder.folder_key,
            sanitize::redact_path(&path)
        );

        folder.combined_artifact = Some(path);
        folder.record_artifact = self.stage_record(folder)?;
        Ok(())
    }

    fn step_prepare_amendments(&self, registry: &mut FolderRegistry) {
        for folder in registry.routed_mut(RoutingDecision::AmendmentOther) {
            match self.stage_record(folder) {
                Ok(path) => {
                    folder.record_artifact = path;
                    folder.advance(FolderStage::AmendmentPrepared);
                }
                Err(e) => {
                    warn!("Staging the record of {} failed: {}", folder.folder_key, e);
                    folder.derived_artifact = Some(Err(e.to_string()));
                }
            }
        }
    }

    /// Writes the parsed record next to the folder's other staged inputs.
    fn stage_record(&self, folder: &CaseFolder) -> Result<Option<PathBuf>, CasefileError> {
        let (Some(record), Some(record_key)) = (&folder.record, &folder.record_key) else {
            return Ok(None);
        };

        let (stem, ext) = split_extension(store::file_name(record_key));
        let ext = ext.map(|e| e.trim_start_matches('.')).unwrap_or("json");
        let dir = sanitize::local_dir_name(&folder.folder_key);
        let path = self.work.store(&record.to_json()?, &dir, stem, ext)?;
        Ok(Some(path))
    }

    async fn step_generate_reports(&self, registry: &mut FolderRegistry) {
        for folder in registry.routed_mut(RoutingDecision::ReportNeeded) {
            if folder.stage != FolderStage::Prepared {
                continue;
            }
            let (Some(combined), Some(record)) = (&folder.combined_artifact, &folder.record) else {
                continue;
            };

            match self.generate_report(combined, record).await {
                Ok(report) => {
                    folder.bid_recommendation = Some(report.recommendation);
                    folder.derived_artifact = Some(Ok(report.path));
                    folder.advance(FolderStage::ReportGenerated);
                }
                Err(e) => {
                    warn!("Report generation for {} failed: {}", folder.folder_key, e);
                    folder.derived_artifact = Some(Err(e.to_string()));
                }
            }
        }
    }

    async fn generate_report(
        &self,
        combined: &Path,
        record: &CaseRecord,
    ) -> Result<GeneratedReport, CasefileError> {
        let bytes = std::fs::read(combined).map_err(|e| ProcessError::ReadDocument {
            path: combined.to_path_buf(),
            source: e,
        })?;
        let text = pdf::extract_text(&bytes)?;
        Ok(self.reports.generate(&text, record).await?)
    }

    async fn step_generate_amendments(&self, registry: &mut FolderRegistry) {
        for folder in registry.routed_mut(RoutingDecision::AmendmentOther) {
            if folder.stage != FolderStage::AmendmentPrepared {
                continue;
            }
            let Some(record) = &folder.record else {
                continue;
            };

            match self.amendments.generate(record).await {
                Ok(amendment) => {
                    folder.derived_artifact = Some(Ok(amendment.path));
                    folder.advance(FolderStage::AmendmentGenerated);
                }
                Err(e) => {
                    warn!("Amendment report for {} failed: {}", folder.folder_key, e);
                    folder.derived_artifact = Some(Err(e.to_string()));
                }
            }
        }
    }

    fn step_persist(&self, run: &mut PipelineRun) {
        for folder in run.registry.iter_mut() {
            let Some(path) = folder.artifact_path().cloned() else {
                continue;
            };
            let Some(file_name) = path.file_name().and_then(|n| n.to_str()) else {
                continue;
            };
            let key = format!("{}{}", folder.folder_key, file_name);

            let uploaded = std::fs::read(&path)
                .map_err(|e| e.to_string())
                .and_then(|bytes| {
                    self.store
                        .put_object(&self.config.bucket, &key, &bytes)
                        .map_err(|e| e.to_string())
                });
            match uploaded {
                Ok(()) => {
                    info!("Uploaded {}", key);
                    folder.persisted_key = Some(key);
                    folder.advance(FolderStage::Persisted);
                }
                Err(error) => {
                    warn!("Uploading {} failed: {}", key, error);
                    run.warnings.push(PipelineWarning::PersistFailed {
                        folder: folder.folder_key.clone(),
                        error,
                    });
                }
            }
        }
    }

    fn step_notify(&self, run: &mut PipelineRun) {
        if !self.config.notifications_enabled {
            debug!("Notifications are disabled");
            return;
        }

        for folder in run.registry.routed(RoutingDecision::ReportNeeded) {
            let Some(path) = folder.artifact_path() else {
                continue;
            };

            let notification = Notification::report_ready(folder.name(), path.clone());
            match self.notifier.send(&notification) {
                Ok(()) => run.notified += 1,
                Err(e) => {
                    warn!("Notification for {} failed: {}", folder.folder_key, e);
                    run.warnings.push(PipelineWarning::NotifyFailed {
                        folder: folder.folder_key.clone(),
                        error: e.to_string(),
                    });
                }
            }
        }
    }

    fn step_archive(&self, run: &mut PipelineRun) {
        for folder in run.registry.iter_mut() {
            match self.archiver.archive(&folder.folder_key, ArchiveScope::RootFiles) {
                Ok(report) => {
                    if report.failures.is_empty() {
                        folder.advance(FolderStage::Archived);
                    } else {
                        run.warnings.push(PipelineWarning::ArchiveFailed {
                            folder: folder.folder_key.clone(),
                            error: format!("{} file(s) could not be archived", report.failures.len()),
                        });
                    }
                    run.archived.merge(report);
                }
                Err(e) => {
                    warn!("Archiving {} failed: {}", folder.folder_key, e);
                    run.warnings.push(PipelineWarning::ArchiveFailed {
                        folder: folder.folder_key.clone(),
                        error: e.to_string(),
                    });
                }
            }
        }
    }
}
