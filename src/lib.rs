//! # Audiophile Downloader Library
//!
//! Acquires the highest-fidelity audio stream a video resource exposes while
//! keeping the request pattern close to that of a person using a browser.
//!
//! Pulling bytes off the network is delegated to a media-retrieval tool and
//! re-encoding is delegated to a transcoder. This crate owns everything
//! around those calls:
//!
//! - **Request identity**: a fresh, internally consistent [`profile::SessionProfile`]
//!   per call (browser identity, header template, timeouts, retry policy,
//!   throttling ceilings)
//! - **Format ranking**: audio-only variants filtered and ranked by bitrate
//!   ([`catalog`])
//! - **Human pacing**: jittered single downloads and randomised inter-item
//!   delays for playlists ([`downloader`])
//! - **Post-processing**: optional codec conversion of finished files
//!   ([`postprocess`])
//!
//! ## Quick Start
//!
//! ```no_run
//! use audiophile_dl::catalog::select_format;
//! use audiophile_dl::config::AppConfig;
//! use audiophile_dl::orchestrator::Orchestrator;
//! use audiophile_dl::postprocess::FfmpegTranscoder;
//! use audiophile_dl::random::RandomSource;
//! use audiophile_dl::resource::ResourceUrl;
//! use audiophile_dl::retriever::ytdlp::YtDlpRetriever;
//! use audiophile_dl::retriever::DiscoveryMode;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = AppConfig::default();
//! let orchestrator = Orchestrator::new(
//!     config,
//!     YtDlpRetriever::new("yt-dlp"),
//!     FfmpegTranscoder::new("ffmpeg"),
//!     RandomSource::from_entropy(),
//! )?;
//!
//! let url = ResourceUrl::parse("https://www.youtube.com/watch?v=dQw4w9WgXcQ")?;
//! let catalog = orchestrator.discover(&url, DiscoveryMode::Single).await?;
//! let best = select_format(&catalog.formats, 1)?;
//! let outcome = orchestrator.download_single(&url, best, &mut |_event| {}).await;
//! println!("{outcome:?}");
//! # Ok(())
//! # }
//! ```
//!
//! ## Architecture
//!
//! - [`random`] - Injectable randomness and delay ranges
//! - [`resource`] - Resource URL validation
//! - [`profile`] - Session profile generation
//! - [`catalog`] - Format filtering, ranking and selection
//! - [`retriever`] - Media-retrieval collaborator interface and yt-dlp backend
//! - [`downloader`] - Job construction and scheduling
//! - [`postprocess`] - Transcoding dispatch
//! - [`orchestrator`] - Per-action wiring of the components above
//! - [`cli`] - Interactive menu

#![warn(missing_docs)]
#![warn(clippy::all)]

use serde::{Deserialize, Serialize};

/// Format ranking and selection
pub mod catalog;

/// Interactive menu and CLI configuration
pub mod cli;

/// Component configuration and validation
pub mod config;

/// Download job construction and scheduling
pub mod downloader;

/// Per-action orchestration
pub mod orchestrator;

/// Post-download transcoding dispatch
pub mod postprocess;

/// Session profile generation
pub mod profile;

/// Injectable randomness
pub mod random;

/// Resource URL validation
pub mod resource;

/// Media-retrieval collaborator
pub mod retriever;

pub use catalog::FormatCatalogResult;
pub use resource::ResourceUrl;

/// Sentinel the retrieval tool uses for "this stream carries no such codec".
pub const NO_CODEC: &str = "none";

/// One encoded rendition of a resource, as reported by the retrieval tool.
///
/// Every field except the identifier is optional upstream; missing values are
/// carried as `None` and defaulted only when a [`StreamFormat`] is built.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawVariant {
    /// Opaque format identifier
    pub format_id: String,
    /// Container extension (e.g. "m4a", "webm")
    #[serde(default)]
    pub ext: Option<String>,
    /// Average audio bitrate in kbit/s
    #[serde(default)]
    pub abr: Option<f64>,
    /// Audio codec, or "none"
    #[serde(default)]
    pub acodec: Option<String>,
    /// Video codec, or "none"
    #[serde(default)]
    pub vcodec: Option<String>,
    /// Human-readable quality note
    #[serde(default)]
    pub format_note: Option<String>,
    /// Exact size in bytes, when known
    #[serde(default)]
    pub filesize: Option<u64>,
}

impl RawVariant {
    /// Whether the variant carries an audio stream.
    pub fn has_audio(&self) -> bool {
        matches!(self.acodec.as_deref(), Some(codec) if codec != NO_CODEC)
    }

    /// Whether the variant carries a video stream.
    ///
    /// An absent codec field counts as "no video", same as the "none" sentinel.
    pub fn has_video(&self) -> bool {
        matches!(self.vcodec.as_deref(), Some(codec) if codec != NO_CODEC)
    }

    /// Audio-only: has an audio codec and no video codec.
    pub fn is_audio_only(&self) -> bool {
        self.has_audio() && !self.has_video()
    }
}

/// An audio-only variant ready for display and selection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StreamFormat {
    /// Opaque format identifier, unique within a catalog
    pub format_id: String,
    /// Container extension
    pub ext: String,
    /// Bitrate in kbit/s (0 = unknown)
    pub bitrate: f64,
    /// Human-readable quality note (empty when unknown)
    pub format_note: String,
    /// Size estimate in bytes (0 = unknown)
    pub filesize: u64,
}

impl From<&RawVariant> for StreamFormat {
    fn from(raw: &RawVariant) -> Self {
        let bitrate = raw
            .abr
            .filter(|abr| abr.is_finite() && *abr > 0.0)
            .unwrap_or(0.0);

        Self {
            format_id: raw.format_id.clone(),
            ext: raw.ext.clone().unwrap_or_default(),
            bitrate,
            format_note: raw.format_note.clone().unwrap_or_default(),
            filesize: raw.filesize.unwrap_or(0),
        }
    }
}

/// Descriptive metadata about a resource.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceMetadata {
    /// Resource or playlist title
    pub title: String,
    /// Whether the resource is a playlist
    pub is_playlist: bool,
    /// Number of items (1 for a single resource)
    pub item_count: usize,
}

impl Default for ResourceMetadata {
    fn default() -> Self {
        Self {
            title: "Unknown".to_string(),
            is_playlist: false,
            item_count: 1,
        }
    }
}
