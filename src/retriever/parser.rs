//! Parsing of yt-dlp output: the info JSON printed during discovery and the
//! tagged progress/file lines printed while fetching.

use super::{Discovery, DiscoveryError};
use crate::{RawVariant, ResourceMetadata};
use serde::Deserialize;
use std::path::PathBuf;

/// Tag prefixed to every line this crate asks yt-dlp to print.
pub const LINE_TAG: &str = "[audiophile-dl]";

/// Progress template passed to `--progress-template`.
pub const PROGRESS_TEMPLATE: &str = "download:[audiophile-dl] progress %(progress._percent_str)s";

/// Print template passed to `--print` to learn final file paths.
pub const FILE_TEMPLATE: &str = "after_move:[audiophile-dl] file %(filepath)s";

#[derive(Debug, Deserialize)]
struct InfoJson {
    #[serde(rename = "_type", default)]
    kind: Option<String>,
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    formats: Option<Vec<RawVariant>>,
    #[serde(default)]
    entries: Option<Vec<Option<InfoJson>>>,
    #[serde(default)]
    playlist_count: Option<usize>,
}

/// Parse the info JSON printed by `--dump-single-json`.
///
/// For a playlist the variants of the first available entry stand in for
/// the whole list, and the item count comes from `playlist_count` when
/// present.
pub fn parse_discovery(json: &str) -> Result<Discovery, DiscoveryError> {
    let info: InfoJson = serde_json::from_str(json.trim())
        .map_err(|e| DiscoveryError::MalformedResponse(e.to_string()))?;

    let title = info
        .title
        .clone()
        .filter(|t| !t.trim().is_empty())
        .unwrap_or_else(|| ResourceMetadata::default().title);

    let is_playlist = info.kind.as_deref() == Some("playlist") || info.entries.is_some();
    if !is_playlist {
        return Ok(Discovery {
            variants: info.formats.unwrap_or_default(),
            metadata: ResourceMetadata {
                title,
                is_playlist: false,
                item_count: 1,
            },
        });
    }

    let entries: Vec<InfoJson> = info.entries.unwrap_or_default().into_iter().flatten().collect();
    let item_count = info.playlist_count.unwrap_or(entries.len());
    let variants = entries
        .into_iter()
        .find_map(|entry| entry.formats)
        .unwrap_or_default();

    Ok(Discovery {
        variants,
        metadata: ResourceMetadata {
            title,
            is_playlist: true,
            item_count,
        },
    })
}

/// One line of fetch output.
#[derive(Debug, Clone, PartialEq)]
pub enum OutputLine {
    /// Completion percentage of the current item
    Progress(f64),
    /// A file finished post-processing
    File(PathBuf),
    /// Anything untagged
    Other,
}

/// Classify a line of fetch output.
pub fn parse_output_line(line: &str) -> OutputLine {
    let Some(rest) = line.trim().strip_prefix(LINE_TAG) else {
        return OutputLine::Other;
    };
    let rest = rest.trim_start();

    if let Some(percent) = rest.strip_prefix("progress") {
        return parse_percent(percent).map_or(OutputLine::Other, OutputLine::Progress);
    }
    if let Some(path) = rest.strip_prefix("file ") {
        let path = path.trim();
        if !path.is_empty() {
            return OutputLine::File(PathBuf::from(path));
        }
    }
    OutputLine::Other
}

/// Parse `" 45.3%"` into `45.3`, clamped to `0..=100`.
pub fn parse_percent(text: &str) -> Option<f64> {
    let value: f64 = text.trim().trim_end_matches('%').trim().parse().ok()?;
    value.is_finite().then(|| value.clamp(0.0, 100.0))
}

/// Last non-empty line of diagnostic output, without the `ERROR: ` prefix.
pub fn last_error_line(stderr: &str) -> Option<String> {
    stderr
        .lines()
        .map(str::trim)
        .rev()
        .find(|line| !line.is_empty())
        .map(|line| line.strip_prefix("ERROR:").unwrap_or(line).trim().to_string())
}
