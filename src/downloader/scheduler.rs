//! Download scheduler: plans a job, waits out its jitter and runs it.

use super::config::SchedulerConfig;
use super::job::{DownloadJob, ItemDelayPolicy};
use super::progress::{ProgressEvent, ProgressGate};
use crate::config::ConfigError;
use crate::profile::SessionProfile;
use crate::random::RandomSource;
use crate::resource::ResourceUrl;
use crate::retriever::{FailureKind, FetchError, MediaRetriever};
use crate::StreamFormat;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, warn};

/// Result of running a job. Collaborator failures never escape as errors.
#[derive(Debug, Clone, PartialEq, Eq)]
#[must_use]
pub enum Outcome {
    /// Download finished
    Completed {
        /// Files produced
        files: Vec<PathBuf>,
    },
    /// Download failed after the collaborator exhausted its retries
    Failed {
        /// Human-readable reason
        reason: String,
        /// Classification for remediation hints
        kind: FailureKind,
    },
}

impl Outcome {
    /// Whether the job completed.
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Completed { .. })
    }

    /// Files produced, empty on failure.
    pub fn files(&self) -> &[PathBuf] {
        match self {
            Self::Completed { files } => files,
            Self::Failed { .. } => &[],
        }
    }

    fn failed(reason: impl Into<String>, kind: FailureKind) -> Self {
        Self::Failed {
            reason: reason.into(),
            kind,
        }
    }
}

impl From<FetchError> for Outcome {
    fn from(err: FetchError) -> Self {
        Outcome::failed(err.to_string(), err.kind())
    }
}

/// A job ready to run, with its pre-download delay already drawn.
#[derive(Debug, Clone)]
pub struct JobPlan {
    /// The job
    pub job: DownloadJob,
    /// Pause before calling the collaborator
    pub pre_delay: Duration,
}

/// Sequences downloads one at a time.
#[derive(Clone)]
pub struct DownloadScheduler {
    retriever: Arc<dyn MediaRetriever>,
    config: SchedulerConfig,
    rng: RandomSource,
}

impl DownloadScheduler {
    /// Validate `config` and build a scheduler.
    pub fn new(
        retriever: Arc<dyn MediaRetriever>,
        config: SchedulerConfig,
        rng: RandomSource,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            retriever,
            config,
            rng,
        })
    }

    /// Options in effect.
    pub fn config(&self) -> &SchedulerConfig {
        &self.config
    }

    /// Plan a single-item download.
    pub fn plan_single(
        &self,
        url: &ResourceUrl,
        format: &StreamFormat,
        profile: &SessionProfile,
    ) -> Result<JobPlan, super::JobError> {
        let job = DownloadJob::single(
            url.clone(),
            format.format_id.clone(),
            self.config.single_template(),
            profile.download_ceiling(),
            self.config.single_extraction.clone(),
        )?;
        Ok(self.plan(job))
    }

    /// Plan a playlist download.
    pub fn plan_playlist(
        &self,
        url: &ResourceUrl,
        format: &StreamFormat,
        profile: &SessionProfile,
    ) -> Result<JobPlan, super::JobError> {
        let job = DownloadJob::playlist(
            url.clone(),
            format.format_id.clone(),
            self.config.playlist_template(),
            profile.download_ceiling(),
            self.config.playlist_extraction.clone(),
            ItemDelayPolicy::new(self.config.playlist_item_delay, self.rng.clone()),
        )?;
        Ok(self.plan(job))
    }

    fn plan(&self, job: DownloadJob) -> JobPlan {
        let pre_delay = self.rng.duration_in(&self.config.pre_download_jitter);
        JobPlan { job, pre_delay }
    }

    /// Download one resource.
    pub async fn run_single(
        &self,
        url: &ResourceUrl,
        format: &StreamFormat,
        profile: &SessionProfile,
        on_event: &mut (dyn FnMut(ProgressEvent) + Send),
    ) -> Outcome {
        match self.plan_single(url, format, profile) {
            Ok(plan) => self.execute(plan, profile, on_event).await,
            Err(e) => Outcome::failed(e.to_string(), FailureKind::Generic),
        }
    }

    /// Download every item of a playlist.
    ///
    /// The collaborator enumerates the items; the scheduler only configures
    /// the per-item delay policy.
    pub async fn run_playlist(
        &self,
        url: &ResourceUrl,
        format: &StreamFormat,
        profile: &SessionProfile,
        on_event: &mut (dyn FnMut(ProgressEvent) + Send),
    ) -> Outcome {
        match self.plan_playlist(url, format, profile) {
            Ok(plan) => self.execute(plan, profile, on_event).await,
            Err(e) => Outcome::failed(e.to_string(), FailureKind::Generic),
        }
    }

    /// Run a planned job: ensure the output directory, sleep, fetch, report.
    pub async fn execute(
        &self,
        plan: JobPlan,
        profile: &SessionProfile,
        on_event: &mut (dyn FnMut(ProgressEvent) + Send),
    ) -> Outcome {
        let JobPlan { job, pre_delay } = plan;

        if let Err(e) = tokio::fs::create_dir_all(job.output.dir()).await {
            error!(dir = %job.output.dir().display(), error = %e, "Cannot create output directory");
            return Outcome::failed(
                format!("cannot create {}: {e}", job.output.dir().display()),
                FailureKind::Generic,
            );
        }

        info!(
            url = %job.url,
            format_id = %job.format_id,
            playlist = job.is_playlist(),
            delay_ms = pre_delay.as_millis() as u64,
            "Waiting before download"
        );
        tokio::time::sleep(pre_delay).await;

        if let Some(policy) = job.item_delay() {
            debug!(
                min_ms = policy.range().min().as_millis() as u64,
                max_ms = policy.range().max().as_millis() as u64,
                "Playlist item delay policy"
            );
        }

        let mut gate = ProgressGate::new(on_event);
        let result = {
            let mut forward = |percent: f64| gate.progress(percent);
            self.retriever.fetch(&job, profile, &mut forward).await
        };

        match result {
            Ok(output) => {
                gate.finish();
                info!(files = output.files.len(), progress = %gate.summary(), "Download completed");
                Outcome::Completed {
                    files: output.files,
                }
            }
            Err(e) => {
                warn!(error = %e, progress = %gate.summary(), "Download failed");
                Outcome::from(e)
            }
        }
    }
}
