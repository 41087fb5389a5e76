//! Command-line configuration and the interactive menu
//!
//! Flags only configure the run; every action is chosen from the menu.

pub mod error;
pub mod menu;
pub mod prompt;
pub mod table;

pub use error::{ActionStatus, CliError};
pub use menu::{Menu, MenuExit};
pub use prompt::{LineSource, ScriptedLines, StdinLines};

use crate::config::AppConfig;
use crate::downloader::config::DEFAULT_OUTPUT_DIR;
use crate::orchestrator::Orchestrator;
use crate::postprocess::FfmpegTranscoder;
use crate::random::RandomSource;
use crate::retriever::ytdlp::YtDlpRetriever;
use clap::Parser;
use std::path::PathBuf;

/// Audiophile Downloader CLI
#[derive(Parser, Debug, Clone)]
#[command(name = "audiophile-dl")]
#[command(about = "Download the highest-fidelity audio stream of a video or playlist", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Directory downloads are written to
    #[arg(long, env = "AUDIOPHILE_DL_OUTPUT_DIR", default_value = DEFAULT_OUTPUT_DIR)]
    pub output_dir: PathBuf,

    /// yt-dlp executable
    #[arg(long, env = "AUDIOPHILE_DL_YTDLP_BIN", default_value = "yt-dlp")]
    pub ytdlp_bin: PathBuf,

    /// ffmpeg executable
    #[arg(long, env = "AUDIOPHILE_DL_FFMPEG_BIN", default_value = "ffmpeg")]
    pub ffmpeg_bin: PathBuf,
}

impl Cli {
    /// Component configuration with the flags applied.
    pub fn app_config(&self) -> AppConfig {
        let mut config = AppConfig::default();
        config.scheduler.output_dir = self.output_dir.clone();
        config
    }

    /// Orchestrator over the external tools named by the flags.
    pub fn orchestrator(&self, rng: RandomSource) -> Result<Orchestrator, CliError> {
        let orchestrator = Orchestrator::new(
            self.app_config(),
            YtDlpRetriever::new(&self.ytdlp_bin),
            FfmpegTranscoder::new(&self.ffmpeg_bin),
            rng,
        )?;
        Ok(orchestrator)
    }
}
