//! Post-download conversion
//!
//! Conversions are additive: the dispatcher writes a sibling file with the
//! target extension and never touches the input.

use crate::config::ConfigError;
use async_trait::async_trait;
use std::fmt;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::Arc;
use tracing::{info, warn};

pub mod ffmpeg;

pub use ffmpeg::FfmpegTranscoder;

/// Default output sample rate in Hz.
pub const DEFAULT_SAMPLE_RATE: u32 = 44_100;

/// Default output channel count.
pub const DEFAULT_CHANNELS: u8 = 2;

/// Default output bitrate for lossy codecs.
pub const DEFAULT_BITRATE: &str = "320k";

/// Codecs offered for conversion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TargetCodec {
    /// MPEG-1 Layer III
    Mp3,
    /// Free Lossless Audio Codec
    Flac,
    /// PCM in a RIFF container
    Wav,
    /// Raw ADTS AAC
    Aac,
    /// AAC in an MPEG-4 container
    M4a,
    /// Vorbis in an Ogg container
    Ogg,
}

impl TargetCodec {
    /// Every codec, in menu order.
    pub const ALL: [Self; 6] = [Self::Mp3, Self::Flac, Self::Wav, Self::Aac, Self::M4a, Self::Ogg];

    /// File extension, also the user-facing token.
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Mp3 => "mp3",
            Self::Flac => "flac",
            Self::Wav => "wav",
            Self::Aac => "aac",
            Self::M4a => "m4a",
            Self::Ogg => "ogg",
        }
    }

    /// Whether the codec discards information.
    pub fn is_lossy(&self) -> bool {
        !matches!(self, Self::Flac | Self::Wav)
    }

    /// Codec for a 1-based menu index.
    pub fn from_menu_index(index: i64) -> Option<Self> {
        usize::try_from(index)
            .ok()
            .and_then(|i| i.checked_sub(1))
            .and_then(|i| Self::ALL.get(i).copied())
    }
}

impl fmt::Display for TargetCodec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

impl FromStr for TargetCodec {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let token = s.trim().trim_start_matches('.');
        Self::ALL
            .into_iter()
            .find(|codec| codec.extension().eq_ignore_ascii_case(token))
            .ok_or_else(|| ConversionError::UnsupportedCodec(s.trim().to_string()))
    }
}

/// Encoder options applied to every conversion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatcherConfig {
    /// Output sample rate in Hz
    pub sample_rate: u32,
    /// Output channel count
    pub channels: u8,
    /// Output bitrate, ffmpeg syntax (`320k`)
    pub bitrate: String,
}

impl Default for DispatcherConfig {
    fn default() -> Self {
        Self {
            sample_rate: DEFAULT_SAMPLE_RATE,
            channels: DEFAULT_CHANNELS,
            bitrate: DEFAULT_BITRATE.to_string(),
        }
    }
}

impl DispatcherConfig {
    /// Check the options.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.sample_rate == 0 {
            return Err(ConfigError::InvalidValue {
                field: "sample_rate",
                reason: "must be greater than zero".to_string(),
            });
        }
        if self.channels == 0 {
            return Err(ConfigError::InvalidValue {
                field: "channels",
                reason: "must be greater than zero".to_string(),
            });
        }
        let digits = self.bitrate.trim_end_matches(['k', 'K', 'M']);
        if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return Err(ConfigError::InvalidValue {
                field: "bitrate",
                reason: format!("expected a number with optional k/M suffix, got {:?}", self.bitrate),
            });
        }
        Ok(())
    }
}

/// One conversion handed to a [`Transcoder`].
#[derive(Debug, Clone, Copy)]
pub struct TranscodeRequest<'a> {
    /// Existing input file
    pub input: &'a Path,
    /// File to create (overwritten if present)
    pub output: &'a Path,
    /// Target codec
    pub codec: TargetCodec,
    /// Encoder options
    pub settings: &'a DispatcherConfig,
}

/// Transcoding collaborator errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TranscodeError {
    /// Tool could not be located or started
    #[error("transcoder not found: {0}")]
    NotFound(String),

    /// Tool ran and exited unsuccessfully
    #[error("transcoder exited with status {status:?}")]
    Exited {
        /// Exit code, `None` when killed by a signal
        status: Option<i32>,
    },

    /// Other I/O failure
    #[error("I/O error: {0}")]
    Io(String),
}

/// Transcoding collaborator.
#[async_trait]
pub trait Transcoder: Send + Sync {
    /// Short name for logs.
    fn name(&self) -> &str;

    /// Convert `request.input` into `request.output`.
    async fn transcode(&self, request: TranscodeRequest<'_>) -> Result<(), TranscodeError>;
}

/// Conversion errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConversionError {
    /// Input does not exist
    #[error("file not found: {}", .0.display())]
    FileNotFound(PathBuf),

    /// Input already has the target extension
    #[error("{} is already {codec}", .path.display())]
    SameFormat {
        /// Input file
        path: PathBuf,
        /// Requested codec
        codec: TargetCodec,
    },

    /// Token does not name a supported codec
    #[error("unsupported output format: {0:?}")]
    UnsupportedCodec(String),

    /// Transcoding tool missing
    #[error("transcoding tool unavailable: {0}")]
    ToolUnavailable(String),

    /// Transcoding tool exited unsuccessfully
    #[error("conversion failed (exit status {exit_status:?})")]
    ConversionFailed {
        /// Exit code, `None` when killed by a signal
        exit_status: Option<i32>,
    },

    /// Local I/O failure
    #[error("I/O error: {0}")]
    Io(String),
}

impl From<TranscodeError> for ConversionError {
    fn from(err: TranscodeError) -> Self {
        match err {
            TranscodeError::NotFound(tool) => Self::ToolUnavailable(tool),
            TranscodeError::Exited { status } => Self::ConversionFailed {
                exit_status: status,
            },
            TranscodeError::Io(message) => Self::Io(message),
        }
    }
}

/// Path a conversion of `input` to `codec` writes.
pub fn output_path(input: &Path, codec: TargetCodec) -> PathBuf {
    input.with_extension(codec.extension())
}

/// Hands completed files to the transcoding collaborator.
#[derive(Clone)]
pub struct PostProcessDispatcher {
    transcoder: Arc<dyn Transcoder>,
    config: DispatcherConfig,
}

impl PostProcessDispatcher {
    /// Validate `config` and build a dispatcher.
    pub fn new(transcoder: Arc<dyn Transcoder>, config: DispatcherConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self { transcoder, config })
    }

    /// Encoder options in effect.
    pub fn config(&self) -> &DispatcherConfig {
        &self.config
    }

    /// Convert `file` to `codec` and return the new path.
    ///
    /// The input is checked before the collaborator is involved; a missing
    /// input never starts a process.
    pub async fn dispatch(&self, file: &Path, codec: TargetCodec) -> Result<PathBuf, ConversionError> {
        match tokio::fs::metadata(file).await {
            Ok(meta) if meta.is_file() => {}
            Ok(_) => return Err(ConversionError::FileNotFound(file.to_path_buf())),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(ConversionError::FileNotFound(file.to_path_buf()))
            }
            Err(e) => return Err(ConversionError::Io(e.to_string())),
        }

        let same = file
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case(codec.extension()));
        if same {
            return Err(ConversionError::SameFormat {
                path: file.to_path_buf(),
                codec,
            });
        }

        let output = output_path(file, codec);
        info!(
            input = %file.display(),
            output = %output.display(),
            codec = %codec,
            tool = self.transcoder.name(),
            "Converting"
        );

        let request = TranscodeRequest {
            input: file,
            output: &output,
            codec,
            settings: &self.config,
        };
        match self.transcoder.transcode(request).await {
            Ok(()) => {
                info!(output = %output.display(), "Conversion completed");
                Ok(output)
            }
            Err(e) => {
                warn!(error = %e, "Conversion failed");
                Err(e.into())
            }
        }
    }
}
