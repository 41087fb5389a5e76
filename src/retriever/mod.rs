//! Media-retrieval collaborator
//!
//! Network extraction and demuxing live outside this crate. The
//! orchestrator talks to them through [`MediaRetriever`], passing the
//! [`SessionProfile`] that shapes every request, including the retry policy
//! the collaborator must apply. Nothing above this boundary retries.
//!
//! - [`ytdlp`] - implementation backed by the `yt-dlp` executable
//! - [`parser`] - parsing of the collaborator's JSON and progress output
//! - [`diagnostics`] - failure classification and remediation hints

use crate::downloader::DownloadJob;
use crate::profile::SessionProfile;
use crate::resource::ResourceUrl;
use crate::{RawVariant, ResourceMetadata};
use async_trait::async_trait;
use std::path::PathBuf;

pub mod diagnostics;
pub mod parser;
pub mod ytdlp;

pub use diagnostics::{FailureKind, FailureReport};

/// What discovery reports about a resource.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Discovery {
    /// Every variant, in upstream order
    pub variants: Vec<RawVariant>,
    /// Resource metadata
    pub metadata: ResourceMetadata,
}

/// How a resource URL is interpreted.
///
/// A watch URL may carry playlist context (`&list=...`); in single mode only
/// the addressed item is considered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DiscoveryMode {
    /// The addressed item only
    #[default]
    Single,
    /// The whole playlist
    Playlist,
}

impl DiscoveryMode {
    /// Mode for a playlist flag.
    pub fn from_playlist(playlist: bool) -> Self {
        if playlist {
            Self::Playlist
        } else {
            Self::Single
        }
    }
}

/// Files produced by a fetch.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FetchOutput {
    /// Completed files, in the order they finished
    pub files: Vec<PathBuf>,
}

/// Retrieval collaborator.
///
/// Implementations apply the profile's identity, headers, timeouts,
/// throttling and [`crate::profile::RetryPolicy`]; errors are returned only
/// once that policy is exhausted.
#[async_trait]
pub trait MediaRetriever: Send + Sync {
    /// Short name for logs.
    fn name(&self) -> &str;

    /// Enumerate the variants a resource exposes, without downloading.
    ///
    /// In [`DiscoveryMode::Single`] any playlist context in `url` is ignored.
    async fn discover_formats(
        &self,
        url: &ResourceUrl,
        mode: DiscoveryMode,
        profile: &SessionProfile,
    ) -> Result<Discovery, DiscoveryError>;

    /// Download `job` and report progress as a completion percentage.
    ///
    /// For playlist jobs the collaborator enumerates the items itself and
    /// waits between them according to the job's item delay policy.
    async fn fetch(
        &self,
        job: &DownloadJob,
        profile: &SessionProfile,
        on_progress: &mut (dyn FnMut(f64) + Send),
    ) -> Result<FetchOutput, FetchError>;
}

/// Discovery errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DiscoveryError {
    /// Network failure (timeouts, DNS, connection resets)
    #[error("network error: {0}")]
    Network(String),

    /// Service refused the request (bot check, 403, private resource)
    #[error("access denied: {0}")]
    AccessDenied(String),

    /// Collaborator output could not be understood
    #[error("malformed response: {0}")]
    MalformedResponse(String),

    /// Collaborator could not be started
    #[error("retrieval tool unavailable: {0}")]
    ToolUnavailable(String),
}

impl DiscoveryError {
    /// Classification used for operator messaging.
    pub fn kind(&self) -> FailureKind {
        match self {
            Self::Network(message) => match FailureKind::classify(message) {
                FailureKind::Generic => FailureKind::Network,
                kind => kind,
            },
            Self::AccessDenied(message) => match FailureKind::classify(message) {
                FailureKind::Generic => FailureKind::AccessDenied,
                kind => kind,
            },
            Self::MalformedResponse(_) => FailureKind::Generic,
            Self::ToolUnavailable(_) => FailureKind::ToolMissing,
        }
    }

    /// Report with description and remediation.
    pub fn report(&self) -> FailureReport {
        FailureReport::new(self.kind(), self.to_string())
    }
}

/// Fetch errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FetchError {
    /// Collaborator could not be started
    #[error("retrieval tool unavailable: {0}")]
    ToolUnavailable(String),

    /// Collaborator ran and gave up
    #[error("retrieval failed (exit status {status:?}): {message}")]
    Failed {
        /// Process exit status, if it exited normally
        status: Option<i32>,
        /// Last diagnostic line
        message: String,
    },

    /// Local I/O failure while supervising the collaborator
    #[error("I/O error: {0}")]
    Io(String),
}

impl FetchError {
    /// Classification used for operator messaging.
    pub fn kind(&self) -> FailureKind {
        match self {
            Self::ToolUnavailable(_) => FailureKind::ToolMissing,
            Self::Failed { message, .. } => FailureKind::classify(message),
            Self::Io(_) => FailureKind::Generic,
        }
    }
}
