//! [`MediaRetriever`] backed by the `yt-dlp` executable.
//!
//! Every session profile field maps onto a command-line option, so the
//! request shaping is visible in the argument list (and in the tests below)
//! rather than hidden inside the tool.

use super::parser::{self, OutputLine, FILE_TEMPLATE, PROGRESS_TEMPLATE};
use super::{
    Discovery, DiscoveryError, DiscoveryMode, FailureKind, FetchError, FetchOutput, MediaRetriever,
};
use crate::downloader::{DownloadJob, JobKind};
use crate::profile::{BackoffStrategy, SessionProfile};
use crate::resource::ResourceUrl;
use async_trait::async_trait;
use std::io::ErrorKind;
use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncReadExt, BufReader};
use tokio::process::Command;
use tracing::{debug, trace};

/// Retrieval through a `yt-dlp` child process.
#[derive(Debug, Clone)]
pub struct YtDlpRetriever {
    program: PathBuf,
}

impl YtDlpRetriever {
    /// Use the executable at `program` (a bare name is looked up on PATH).
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }

    /// Options shared by discovery and fetch.
    pub fn profile_args(profile: &SessionProfile) -> Vec<String> {
        let mut args = vec![
            "--user-agent".to_string(),
            profile.identity().to_string(),
            "--referer".to_string(),
            profile.referer().to_string(),
        ];

        for (name, value) in profile.headers() {
            args.push("--add-header".to_string());
            args.push(format!("{name}:{value}"));
        }

        let retry = profile.retry();
        let sleep_expr = retry_sleep_expr(&retry.backoff);
        args.extend([
            "--socket-timeout".to_string(),
            format_secs(profile.socket_timeout()),
            "--retries".to_string(),
            retry.retries().to_string(),
            "--fragment-retries".to_string(),
            profile.fragment_retries().to_string(),
            "--retry-sleep".to_string(),
            format!("http:{sleep_expr}"),
            "--retry-sleep".to_string(),
            format!("fragment:{sleep_expr}"),
        ]);

        if profile.force_ipv4() {
            args.push("--force-ipv4".to_string());
        }
        // yt-dlp fakes X-Forwarded-For unless told otherwise
        let xff = if profile.geo_bypass() {
            profile.geo_bypass_country().unwrap_or("default")
        } else {
            "never"
        };
        args.push("--xff".to_string());
        args.push(xff.to_string());

        args
    }

    /// Full argument list for discovery.
    ///
    /// Rate limiting uses the profile's discovery ceiling; it is the only
    /// rate option on the command.
    pub fn discovery_args(
        url: &ResourceUrl,
        mode: DiscoveryMode,
        profile: &SessionProfile,
    ) -> Vec<String> {
        let mut args = vec![
            "--dump-single-json".to_string(),
            "--skip-download".to_string(),
            "--no-warnings".to_string(),
        ];
        match mode {
            DiscoveryMode::Single => args.push("--no-playlist".to_string()),
            DiscoveryMode::Playlist => {
                // one entry is enough to learn a playlist's formats
                args.extend([
                    "--yes-playlist".to_string(),
                    "--playlist-items".to_string(),
                    "1".to_string(),
                ]);
            }
        }
        args.extend([
            "--limit-rate".to_string(),
            profile.discovery_ceiling().as_bytes_per_sec().to_string(),
        ]);
        args.extend(Self::profile_args(profile));
        args.push("--".to_string());
        args.push(url.to_string());
        args
    }

    /// Full argument list for a download.
    ///
    /// The job's rate ceiling is the only rate option on the command.
    pub fn fetch_args(job: &DownloadJob, profile: &SessionProfile) -> Vec<String> {
        let mut args = vec![
            "--format".to_string(),
            job.format_id.clone(),
            "--output".to_string(),
            job.output.render(),
            "--limit-rate".to_string(),
            job.rate_ceiling.as_bytes_per_sec().to_string(),
            "--extract-audio".to_string(),
            "--audio-format".to_string(),
            job.extraction.codec.clone(),
        ];
        if let Some(quality) = job.extraction.quality {
            args.push("--audio-quality".to_string());
            args.push(quality.to_string());
        }

        match &job.kind {
            JobKind::Single => args.push("--no-playlist".to_string()),
            JobKind::Playlist { item_delay } => {
                // yt-dlp draws a fresh uniform delay in [min, max] before each item
                let range = item_delay.range();
                args.push("--yes-playlist".to_string());
                args.push("--sleep-interval".to_string());
                args.push(format_secs(range.min()));
                if range.max() > range.min() {
                    args.push("--max-sleep-interval".to_string());
                    args.push(format_secs(range.max()));
                }
            }
        }

        args.extend([
            "--newline".to_string(),
            "--no-simulate".to_string(),
            "--progress".to_string(),
            "--progress-template".to_string(),
            PROGRESS_TEMPLATE.to_string(),
            "--print".to_string(),
            FILE_TEMPLATE.to_string(),
        ]);
        args.extend(Self::profile_args(profile));
        args.push("--".to_string());
        args.push(job.url.to_string());
        args
    }

    fn command(&self, args: &[String]) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        cmd
    }

    fn program_name(&self) -> String {
        self.program.display().to_string()
    }
}

#[async_trait]
impl MediaRetriever for YtDlpRetriever {
    fn name(&self) -> &str {
        "yt-dlp"
    }

    async fn discover_formats(
        &self,
        url: &ResourceUrl,
        mode: DiscoveryMode,
        profile: &SessionProfile,
    ) -> Result<Discovery, DiscoveryError> {
        let args = Self::discovery_args(url, mode, profile);
        debug!(program = %self.program_name(), ?mode, "Running discovery");

        let output = self.command(&args).output().await.map_err(|e| match e.kind() {
            ErrorKind::NotFound | ErrorKind::PermissionDenied => {
                DiscoveryError::ToolUnavailable(format!("{}: {e}", self.program_name()))
            }
            _ => DiscoveryError::Network(e.to_string()),
        })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let message = parser::last_error_line(&stderr)
                .unwrap_or_else(|| format!("exited with {}", output.status));
            return Err(match FailureKind::classify(&message) {
                FailureKind::BotCheck
                | FailureKind::AccessDenied
                | FailureKind::RateLimited
                | FailureKind::Unavailable => DiscoveryError::AccessDenied(message),
                _ => DiscoveryError::Network(message),
            });
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        parser::parse_discovery(&stdout)
    }

    async fn fetch(
        &self,
        job: &DownloadJob,
        profile: &SessionProfile,
        on_progress: &mut (dyn FnMut(f64) + Send),
    ) -> Result<FetchOutput, FetchError> {
        let args = Self::fetch_args(job, profile);
        debug!(program = %self.program_name(), format_id = %job.format_id, "Running fetch");

        let mut child = self.command(&args).spawn().map_err(|e| match e.kind() {
            ErrorKind::NotFound | ErrorKind::PermissionDenied => {
                FetchError::ToolUnavailable(format!("{}: {e}", self.program_name()))
            }
            _ => FetchError::Io(e.to_string()),
        })?;

        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| FetchError::Io("child stdout not captured".to_string()))?;
        let mut stderr = child
            .stderr
            .take()
            .ok_or_else(|| FetchError::Io("child stderr not captured".to_string()))?;

        let mut files = Vec::new();
        let read_stdout = async {
            let mut lines = BufReader::new(stdout).lines();
            while let Some(line) = lines.next_line().await? {
                trace!(line = %line, "yt-dlp");
                match parser::parse_output_line(&line) {
                    OutputLine::Progress(percent) => on_progress(percent),
                    OutputLine::File(path) => files.push(path),
                    OutputLine::Other => {}
                }
            }
            Ok::<_, std::io::Error>(())
        };
        let read_stderr = async {
            let mut buf = String::new();
            stderr.read_to_string(&mut buf).await.map(|_| buf)
        };

        let (stdout_result, stderr_result) = tokio::join!(read_stdout, read_stderr);
        let status = child.wait().await.map_err(|e| FetchError::Io(e.to_string()))?;
        stdout_result.map_err(|e| FetchError::Io(e.to_string()))?;
        let stderr = stderr_result.unwrap_or_default();

        if !status.success() {
            let message = parser::last_error_line(&stderr)
                .unwrap_or_else(|| format!("exited with {status}"));
            return Err(FetchError::Failed {
                status: status.code(),
                message,
            });
        }

        Ok(FetchOutput { files })
    }
}

/// yt-dlp `--retry-sleep` expression for a backoff strategy.
pub fn retry_sleep_expr(backoff: &BackoffStrategy) -> String {
    match backoff {
        BackoffStrategy::Fixed(delay) => format_secs(*delay),
        BackoffStrategy::Exponential { initial, max } => {
            format!("exp={}:{}", format_secs(*initial), format_secs(*max))
        }
    }
}

/// Seconds without a trailing `.0` for whole values.
fn format_secs(duration: Duration) -> String {
    if duration.subsec_nanos() == 0 {
        duration.as_secs().to_string()
    } else {
        format!("{:.3}", duration.as_secs_f64())
    }
}
