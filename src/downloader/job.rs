//! Download job specification

use super::JobError;
use crate::profile::RateCeiling;
use crate::random::{DelayRange, RandomSource};
use crate::resource::ResourceUrl;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Placeholder the retrieval tool replaces with an item's playlist position.
pub const ITEM_INDEX_PLACEHOLDER: &str = "%(playlist_index)s";

/// Single-item file name: title truncated to 100 bytes, then extension.
pub const SINGLE_PATTERN: &str = "%(title).100B.%(ext)s";

/// Playlist item file name: position, title, extension.
pub const PLAYLIST_PATTERN: &str = "%(playlist_index)s - %(title)s.%(ext)s";

/// Where the retrieval tool writes files: a directory plus a name pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputTemplate {
    dir: PathBuf,
    pattern: String,
}

impl OutputTemplate {
    /// Template from a directory and pattern.
    pub fn new(dir: impl Into<PathBuf>, pattern: impl Into<String>) -> Self {
        Self {
            dir: dir.into(),
            pattern: pattern.into(),
        }
    }

    /// Default single-item template under `dir`.
    pub fn single(dir: impl Into<PathBuf>) -> Self {
        Self::new(dir, SINGLE_PATTERN)
    }

    /// Default playlist template under `dir`.
    pub fn playlist(dir: impl Into<PathBuf>) -> Self {
        Self::new(dir, PLAYLIST_PATTERN)
    }

    /// Output directory.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// File name pattern.
    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    /// Whether item files get distinct names.
    pub fn has_item_index(&self) -> bool {
        self.pattern.contains(ITEM_INDEX_PLACEHOLDER)
    }

    /// Full template string handed to the retrieval tool.
    pub fn render(&self) -> String {
        self.dir.join(&self.pattern).to_string_lossy().into_owned()
    }
}

/// Audio extraction the retrieval tool performs after download.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioExtraction {
    /// Preferred codec ("best" keeps the source codec)
    pub codec: String,
    /// Encoder quality, 0 = best; `None` leaves the tool's default
    pub quality: Option<u8>,
}

impl AudioExtraction {
    /// Keep the source codec at best quality.
    pub fn best() -> Self {
        Self {
            codec: "best".to_string(),
            quality: Some(0),
        }
    }

    /// Keep the source codec, default quality.
    pub fn best_default_quality() -> Self {
        Self {
            codec: "best".to_string(),
            quality: None,
        }
    }
}

/// Per-item delay drawn fresh for every playlist item.
#[derive(Debug, Clone)]
pub struct ItemDelayPolicy {
    range: DelayRange,
    rng: RandomSource,
}

impl ItemDelayPolicy {
    /// Policy drawing from `range` with `rng`.
    pub fn new(range: DelayRange, rng: RandomSource) -> Self {
        Self { range, rng }
    }

    /// Bounds delays are drawn from.
    pub fn range(&self) -> DelayRange {
        self.range
    }

    /// Draw the delay before the next item.
    pub fn next_delay(&self) -> Duration {
        self.rng.duration_in(&self.range)
    }
}

/// Single item or playlist.
#[derive(Debug, Clone)]
pub enum JobKind {
    /// One resource
    Single,
    /// Every item of a playlist, enumerated by the retrieval tool
    Playlist {
        /// Delay applied between items
        item_delay: ItemDelayPolicy,
    },
}

/// Everything the retrieval tool needs for one download.
#[derive(Debug, Clone)]
pub struct DownloadJob {
    /// Resource URL
    pub url: ResourceUrl,
    /// Selected format identifier
    pub format_id: String,
    /// Output location
    pub output: OutputTemplate,
    /// Maximum sustained transfer rate
    pub rate_ceiling: RateCeiling,
    /// Single item or playlist
    pub kind: JobKind,
    /// Post-download extraction hint
    pub extraction: AudioExtraction,
}

impl DownloadJob {
    /// Job for one resource.
    pub fn single(
        url: ResourceUrl,
        format_id: impl Into<String>,
        output: OutputTemplate,
        rate_ceiling: RateCeiling,
        extraction: AudioExtraction,
    ) -> Result<Self, JobError> {
        let format_id = non_empty(format_id.into())?;
        Ok(Self {
            url,
            format_id,
            output,
            rate_ceiling,
            kind: JobKind::Single,
            extraction,
        })
    }

    /// Job for a whole playlist.
    ///
    /// The template must contain [`ITEM_INDEX_PLACEHOLDER`] so items never
    /// collide on file name.
    pub fn playlist(
        url: ResourceUrl,
        format_id: impl Into<String>,
        output: OutputTemplate,
        rate_ceiling: RateCeiling,
        extraction: AudioExtraction,
        item_delay: ItemDelayPolicy,
    ) -> Result<Self, JobError> {
        if !output.has_item_index() {
            return Err(JobError::MissingItemIndex(output.pattern().to_string()));
        }
        let format_id = non_empty(format_id.into())?;
        Ok(Self {
            url,
            format_id,
            output,
            rate_ceiling,
            kind: JobKind::Playlist { item_delay },
            extraction,
        })
    }

    /// Whether this is a playlist job.
    pub fn is_playlist(&self) -> bool {
        matches!(self.kind, JobKind::Playlist { .. })
    }

    /// Item delay policy, for playlist jobs.
    pub fn item_delay(&self) -> Option<&ItemDelayPolicy> {
        match &self.kind {
            JobKind::Playlist { item_delay } => Some(item_delay),
            JobKind::Single => None,
        }
    }
}

fn non_empty(format_id: String) -> Result<String, JobError> {
    if format_id.trim().is_empty() {
        Err(JobError::EmptyFormat)
    } else {
        Ok(format_id)
    }
}
