//! Format catalog: filtering, ranking and selection of audio-only variants
//!
//! # Ranking
//!
//! Only variants with an audio codec and no video codec are kept. They are
//! ordered by bitrate, highest first; an unknown bitrate counts as 0 and
//! sinks to the end. The sort is stable, so variants of equal bitrate keep
//! the order the retrieval tool reported them in.
//!
//! # Selection
//!
//! Operators pick a format by its 1-based position in the ranking. A
//! [`CatalogView`] decides how many entries are shown, and selection is
//! validated against exactly that slice.

use crate::config::ConfigError;
use crate::profile::SessionProfile;
use crate::random::{DelayRange, RandomSource};
use crate::resource::ResourceUrl;
use crate::retriever::{DiscoveryError, DiscoveryMode, MediaRetriever};
use crate::{RawVariant, ResourceMetadata, StreamFormat};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, info};

/// Entries shown for a playlist before the list is cut off.
pub const PLAYLIST_DISPLAY_LIMIT: usize = 5;

/// Pause before a discovery call.
pub const DISCOVERY_JITTER: DelayRange = DelayRange::from_secs(1, 3);

/// Ranked audio-only formats plus resource metadata.
#[derive(Debug, Clone, PartialEq)]
pub struct FormatCatalogResult {
    /// Formats, bitrate non-increasing
    pub formats: Vec<StreamFormat>,
    /// Resource metadata
    pub metadata: ResourceMetadata,
}

impl FormatCatalogResult {
    /// Number of ranked formats.
    pub fn len(&self) -> usize {
        self.formats.len()
    }

    /// Whether no audio-only format was found.
    pub fn is_empty(&self) -> bool {
        self.formats.is_empty()
    }

    /// Highest-ranked format.
    pub fn best(&self) -> Option<&StreamFormat> {
        self.formats.first()
    }

    /// View sized for how this resource is presented: capped for playlists,
    /// complete for single items.
    pub fn view(&self, config: &CatalogConfig) -> CatalogView<'_> {
        let limit = if self.metadata.is_playlist {
            config.playlist_display_limit
        } else {
            None
        };
        CatalogView::new(self, limit)
    }
}

/// Filter and rank raw variants.
pub fn rank_formats(variants: &[RawVariant]) -> Vec<StreamFormat> {
    let mut seen = HashSet::new();
    let mut formats: Vec<StreamFormat> = variants
        .iter()
        .filter(|v| v.is_audio_only())
        .filter(|v| seen.insert(v.format_id.as_str()))
        .map(StreamFormat::from)
        .collect();

    // slice::sort_by is stable
    formats.sort_by(|a, b| b.bitrate.total_cmp(&a.bitrate));
    formats
}

/// Build a catalog from raw variants and the resource's metadata.
pub fn build_catalog(variants: &[RawVariant], metadata: ResourceMetadata) -> FormatCatalogResult {
    let formats = rank_formats(variants);
    debug!(
        raw = variants.len(),
        audio_only = formats.len(),
        "Built format catalog"
    );
    FormatCatalogResult { formats, metadata }
}

/// Parse an operator-supplied index token.
pub fn parse_selection(token: &str) -> Result<i64, SelectionError> {
    token
        .trim()
        .parse::<i64>()
        .map_err(|_| SelectionError::NotANumber(token.trim().to_string()))
}

/// Entry at 1-based position `index`.
pub fn select_format(formats: &[StreamFormat], index: i64) -> Result<&StreamFormat, SelectionError> {
    usize::try_from(index)
        .ok()
        .and_then(|i| i.checked_sub(1))
        .and_then(|i| formats.get(i))
        .ok_or(SelectionError::OutOfRange {
            index,
            len: formats.len(),
        })
}

/// The slice of a catalog an operator sees and may choose from.
#[derive(Debug, Clone, Copy)]
pub struct CatalogView<'a> {
    catalog: &'a FormatCatalogResult,
    limit: Option<usize>,
}

impl<'a> CatalogView<'a> {
    /// View capped at `limit` entries (`None` = everything).
    pub fn new(catalog: &'a FormatCatalogResult, limit: Option<usize>) -> Self {
        Self { catalog, limit }
    }

    /// Entries presented for selection.
    pub fn visible(&self) -> &'a [StreamFormat] {
        let formats = &self.catalog.formats;
        match self.limit {
            Some(limit) => &formats[..formats.len().min(limit)],
            None => formats,
        }
    }

    /// Whether ranked entries exist beyond the visible slice.
    pub fn is_truncated(&self) -> bool {
        self.visible().len() < self.catalog.formats.len()
    }

    /// Resolve an index against the visible slice.
    pub fn select(&self, index: i64) -> Result<&'a StreamFormat, SelectionError> {
        select_format(self.visible(), index)
    }

    /// Parse a raw token and resolve it against the visible slice.
    pub fn select_token(&self, token: &str) -> Result<&'a StreamFormat, SelectionError> {
        self.select(parse_selection(token)?)
    }
}

/// Options recognised by [`FormatCatalog`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogConfig {
    /// Entries shown (and selectable) for playlists; `None` shows all
    pub playlist_display_limit: Option<usize>,
    /// Pause drawn before each discovery call
    pub discovery_jitter: DelayRange,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            playlist_display_limit: Some(PLAYLIST_DISPLAY_LIMIT),
            discovery_jitter: DISCOVERY_JITTER,
        }
    }
}

impl CatalogConfig {
    /// Check the options.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.playlist_display_limit == Some(0) {
            return Err(ConfigError::InvalidValue {
                field: "playlist_display_limit",
                reason: "must show at least one entry".to_string(),
            });
        }
        Ok(())
    }
}

/// Queries the retrieval tool and ranks what it reports.
#[derive(Clone)]
pub struct FormatCatalog {
    retriever: Arc<dyn MediaRetriever>,
    config: CatalogConfig,
    rng: RandomSource,
}

impl FormatCatalog {
    /// Validate `config` and build a catalog backed by `retriever`.
    pub fn new(
        retriever: Arc<dyn MediaRetriever>,
        config: CatalogConfig,
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
    pub fn config(&self) -> &CatalogConfig {
        &self.config
    }

    /// Discover and rank the audio-only formats of `url`.
    ///
    /// Discovery failures are returned unchanged; retrying is the retrieval
    /// tool's job, governed by the profile's retry policy.
    pub async fn discover(
        &self,
        url: &ResourceUrl,
        mode: DiscoveryMode,
        profile: &SessionProfile,
    ) -> Result<FormatCatalogResult, DiscoveryError> {
        let pause = self.rng.duration_in(&self.config.discovery_jitter);
        debug!(delay_ms = pause.as_millis() as u64, "Pausing before discovery");
        tokio::time::sleep(pause).await;

        info!(url = %url, ?mode, retriever = self.retriever.name(), "Discovering formats");
        let discovery = self.retriever.discover_formats(url, mode, profile).await?;
        let catalog = build_catalog(&discovery.variants, discovery.metadata);

        info!(
            title = %catalog.metadata.title,
            formats = catalog.len(),
            playlist = catalog.metadata.is_playlist,
            "Discovery complete"
        );
        Ok(catalog)
    }
}

/// Invalid operator selection
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SelectionError {
    /// Index outside `1..=len`
    #[error("selection {index} is out of range (1-{len})")]
    OutOfRange {
        /// Index entered
        index: i64,
        /// Number of selectable entries
        len: usize,
    },

    /// Token is not an integer
    #[error("{0:?} is not a number")]
    NotANumber(String),
}
