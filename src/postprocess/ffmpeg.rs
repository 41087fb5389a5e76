//! [`Transcoder`] backed by the `ffmpeg` executable.

use super::{TranscodeError, TranscodeRequest, Transcoder};
use async_trait::async_trait;
use std::io::ErrorKind;
use std::path::PathBuf;
use std::process::Stdio;
use tokio::process::Command;
use tracing::debug;

/// Conversion through an `ffmpeg` child process.
#[derive(Debug, Clone)]
pub struct FfmpegTranscoder {
    program: PathBuf,
}

impl FfmpegTranscoder {
    /// Use the executable at `program` (a bare name is looked up on PATH).
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }

    /// Argument list for `request`: drop video, resample, overwrite.
    pub fn args(request: &TranscodeRequest<'_>) -> Vec<String> {
        let settings = request.settings;
        vec![
            "-hide_banner".to_string(),
            "-nostdin".to_string(),
            "-i".to_string(),
            request.input.to_string_lossy().into_owned(),
            "-vn".to_string(),
            "-ar".to_string(),
            settings.sample_rate.to_string(),
            "-ac".to_string(),
            settings.channels.to_string(),
            "-b:a".to_string(),
            settings.bitrate.clone(),
            "-y".to_string(),
            request.output.to_string_lossy().into_owned(),
        ]
    }
}

#[async_trait]
impl Transcoder for FfmpegTranscoder {
    fn name(&self) -> &str {
        "ffmpeg"
    }

    async fn transcode(&self, request: TranscodeRequest<'_>) -> Result<(), TranscodeError> {
        let args = Self::args(&request);
        debug!(program = %self.program.display(), ?args, "Running ffmpeg");

        let output = Command::new(&self.program)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| match e.kind() {
                ErrorKind::NotFound | ErrorKind::PermissionDenied => {
                    TranscodeError::NotFound(format!("{}: {e}", self.program.display()))
                }
                _ => TranscodeError::Io(e.to_string()),
            })?;

        if output.status.success() {
            Ok(())
        } else {
            let stderr = String::from_utf8_lossy(&output.stderr);
            if let Some(line) = stderr.lines().rev().find(|l| !l.trim().is_empty()) {
                debug!(line = %line.trim(), "ffmpeg stderr");
            }
            Err(TranscodeError::Exited {
                status: output.status.code(),
            })
        }
    }
}
