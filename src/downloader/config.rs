//! Scheduler configuration and timing defaults

use super::job::{AudioExtraction, OutputTemplate, ITEM_INDEX_PLACEHOLDER, PLAYLIST_PATTERN, SINGLE_PATTERN};
use crate::config::ConfigError;
use crate::random::DelayRange;
use std::path::PathBuf;

/// Pause between format selection and download start.
/// Sized like a person reading the format table and clicking.
pub const PRE_DOWNLOAD_JITTER: DelayRange = DelayRange::from_secs(2, 5);

/// Pause between playlist items, drawn per item.
/// Wider than the single-item jitter: many sequential fetches in one
/// session are the stronger automation signal.
pub const PLAYLIST_ITEM_DELAY: DelayRange = DelayRange::from_secs(5, 15);

/// Directory downloads land in, relative to the working directory.
pub const DEFAULT_OUTPUT_DIR: &str = "downloads";

/// Options recognised by [`super::DownloadScheduler`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchedulerConfig {
    /// Jitter before every download
    pub pre_download_jitter: DelayRange,
    /// Delay between playlist items
    pub playlist_item_delay: DelayRange,
    /// Output directory, created on demand
    pub output_dir: PathBuf,
    /// File name pattern for single items
    pub single_pattern: String,
    /// File name pattern for playlist items
    pub playlist_pattern: String,
    /// Extraction hint for single items
    pub single_extraction: AudioExtraction,
    /// Extraction hint for playlist items
    pub playlist_extraction: AudioExtraction,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            pre_download_jitter: PRE_DOWNLOAD_JITTER,
            playlist_item_delay: PLAYLIST_ITEM_DELAY,
            output_dir: PathBuf::from(DEFAULT_OUTPUT_DIR),
            single_pattern: SINGLE_PATTERN.to_string(),
            playlist_pattern: PLAYLIST_PATTERN.to_string(),
            single_extraction: AudioExtraction::best(),
            playlist_extraction: AudioExtraction::best_default_quality(),
        }
    }
}

impl SchedulerConfig {
    /// Check the options.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.playlist_pattern.contains(ITEM_INDEX_PLACEHOLDER) {
            return Err(ConfigError::MissingPlaceholder {
                template: self.playlist_pattern.clone(),
                placeholder: ITEM_INDEX_PLACEHOLDER,
            });
        }
        if self.single_pattern.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "single_pattern",
                reason: "cannot be empty".to_string(),
            });
        }
        if self.output_dir.as_os_str().is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "output_dir",
                reason: "cannot be empty".to_string(),
            });
        }
        for extraction in [&self.single_extraction, &self.playlist_extraction] {
            if extraction.quality.is_some_and(|q| q > 10) {
                return Err(ConfigError::InvalidValue {
                    field: "extraction.quality",
                    reason: "must be between 0 (best) and 10 (worst)".to_string(),
                });
            }
        }
        Ok(())
    }

    /// Template for single-item jobs.
    pub fn single_template(&self) -> OutputTemplate {
        OutputTemplate::new(&self.output_dir, &self.single_pattern)
    }

    /// Template for playlist jobs.
    pub fn playlist_template(&self) -> OutputTemplate {
        OutputTemplate::new(&self.output_dir, &self.playlist_pattern)
    }
}
