//! Download scheduling
//!
//! Jobs are built immediately before they run, consumed once and dropped.
//! Every job passes through the same pipeline:
//!
//! 1. **Profile**: the caller supplies a freshly generated
//!    [`crate::profile::SessionProfile`]
//! 2. **Plan**: [`DownloadScheduler`] builds a [`DownloadJob`] and draws the
//!    pre-download jitter, producing a [`JobPlan`]
//! 3. **Delay**: the scheduler sleeps for the drawn jitter
//! 4. **Call**: the retrieval collaborator fetches the job, applying the
//!    rate ceiling and, for playlists, the per-item delay policy
//! 5. **Callback**: progress is forwarded through a [`progress::ProgressGate`],
//!    which guarantees `Finished` is reported exactly once and only on success
//!
//! # Quick Start
//!
//! ```no_run
//! use std::sync::Arc;
//! use audiophile_dl::downloader::{DownloadScheduler, SchedulerConfig};
//! use audiophile_dl::profile::{ProfileConfig, SessionProfileGenerator};
//! use audiophile_dl::random::RandomSource;
//! use audiophile_dl::retriever::ytdlp::YtDlpRetriever;
//! use audiophile_dl::{ResourceUrl, StreamFormat};
//!
//! # async fn example(format: StreamFormat) -> Result<(), Box<dyn std::error::Error>> {
//! let rng = RandomSource::from_entropy();
//! let profiles = SessionProfileGenerator::new(ProfileConfig::default(), rng.clone())?;
//! let scheduler = DownloadScheduler::new(
//!     Arc::new(YtDlpRetriever::new("yt-dlp")),
//!     SchedulerConfig::default(),
//!     rng,
//! )?;
//!
//! let url = ResourceUrl::parse("https://youtu.be/dQw4w9WgXcQ")?;
//! let outcome = scheduler
//!     .run_single(&url, &format, &profiles.generate(), &mut |event| println!("{event:?}"))
//!     .await;
//! # Ok(())
//! # }
//! ```
//!
//! # Components
//!
//! - [`job`] - Job specification and output templates
//! - [`config`] - Scheduler options and timing defaults
//! - [`progress`] - Progress events and gating
//! - [`scheduler`] - Planning and execution

pub mod config;
pub mod job;
pub mod progress;
pub mod scheduler;

pub use config::SchedulerConfig;
pub use job::{AudioExtraction, DownloadJob, ItemDelayPolicy, JobKind, OutputTemplate};
pub use progress::{ProgressEvent, ProgressGate};
pub use scheduler::{DownloadScheduler, JobPlan, Outcome};

/// Job construction errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum JobError {
    /// Playlist template cannot keep item files apart
    #[error("playlist output template {0:?} has no item-index placeholder")]
    MissingItemIndex(String),

    /// No format was chosen
    #[error("format identifier cannot be empty")]
    EmptyFormat,
}
