//! Interactive menu
//!
//! The menu is the only action surface. Each action runs to completion
//! before the next prompt; failures are reported with a remediation hint and
//! control returns to the main menu.

use super::error::{ActionStatus, CliError};
use super::prompt::LineSource;
use super::table::{codec_menu, format_table, main_menu, BANNER};
use crate::catalog::{parse_selection, CatalogView};
use crate::downloader::{Outcome, ProgressEvent};
use crate::orchestrator::Orchestrator;
use crate::postprocess::{ConversionError, TargetCodec};
use crate::resource::ResourceUrl;
use crate::retriever::DiscoveryMode;
use crate::StreamFormat;
use indicatif::{ProgressBar, ProgressStyle};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Printed when the operator leaves through the menu.
pub const GOODBYE: &str = "Thank you for using Audiophile Downloader!";

/// Printed when the process is interrupted.
pub const INTERRUPTED: &str = "\n\nInterrupted by user. Goodbye!";

const NO_FORMATS: &str = "No audio formats found or YouTube is blocking the request";

/// Why the menu loop ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuExit {
    /// Operator chose Exit
    Quit,
    /// Input ran out; carries the status of the last completed action
    EndOfInput(ActionStatus),
}

impl MenuExit {
    /// Process exit code.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Quit => 0,
            Self::EndOfInput(status) => status.exit_code(),
        }
    }
}

/// Menu-driven front end over an [`Orchestrator`].
pub struct Menu<L, W> {
    orchestrator: Orchestrator,
    input: L,
    output: W,
    clear_screen: bool,
    last_status: ActionStatus,
}

impl<L, W> Menu<L, W>
where
    L: LineSource,
    W: Write + Send,
{
    /// Menu reading answers from `input` and printing to `output`.
    pub fn new(orchestrator: Orchestrator, input: L, output: W) -> Self {
        Self {
            orchestrator,
            input,
            output,
            clear_screen: false,
            last_status: ActionStatus::Success,
        }
    }

    /// Clear the screen before each menu (only sensible on a terminal).
    pub fn with_clear_screen(mut self, clear: bool) -> Self {
        self.clear_screen = clear;
        self
    }

    /// Status of the last completed action.
    pub fn last_status(&self) -> ActionStatus {
        self.last_status
    }

    /// Give back the output sink.
    pub fn into_output(self) -> W {
        self.output
    }

    /// Run until the operator exits or input ends.
    pub async fn run(&mut self) -> Result<MenuExit, CliError> {
        loop {
            match self.step().await {
                Ok(Some(exit)) => return Ok(exit),
                Ok(None) => {}
                Err(CliError::EndOfInput) => {
                    debug!(status = ?self.last_status, "Input exhausted");
                    return Ok(MenuExit::EndOfInput(self.last_status));
                }
                Err(e) => return Err(e),
            }
        }
    }

    async fn step(&mut self) -> Result<Option<MenuExit>, CliError> {
        if self.clear_screen {
            write!(self.output, "\x1B[2J\x1B[1;1H")?;
        }
        writeln!(self.output, "{BANNER}")?;
        write!(self.output, "{}", main_menu())?;

        let choice = self.ask("\nSelect an option: ").await?;
        let status = match parse_selection(&choice) {
            Ok(1) => self.download(false).await?,
            Ok(2) => self.download(true).await?,
            Ok(3) => self.convert_file().await?,
            Ok(4) => {
                writeln!(self.output, "{GOODBYE}")?;
                return Ok(Some(MenuExit::Quit));
            }
            Ok(_) => {
                writeln!(self.output, "Invalid option. Please try again.")?;
                ActionStatus::SelectionFailed
            }
            Err(_) => {
                writeln!(self.output, "Please enter a valid number")?;
                ActionStatus::SelectionFailed
            }
        };
        self.last_status = status;

        self.ask("\nPress Enter to continue...").await?;
        Ok(None)
    }

    async fn ask(&mut self, prompt: &str) -> Result<String, CliError> {
        write!(self.output, "{prompt}")?;
        self.output.flush()?;
        match self.input.next_line().await? {
            Some(line) => Ok(line.trim().to_string()),
            None => {
                writeln!(self.output)?;
                Err(CliError::EndOfInput)
            }
        }
    }

    async fn download(&mut self, playlist: bool) -> Result<ActionStatus, CliError> {
        let prompt = if playlist {
            "Enter YouTube playlist URL: "
        } else {
            "Enter YouTube URL: "
        };
        let raw = self.ask(prompt).await?;
        let url = match ResourceUrl::parse(&raw) {
            Ok(url) => url,
            Err(e) => {
                writeln!(self.output, "Invalid YouTube URL: {e}")?;
                return Ok(ActionStatus::DiscoveryFailed);
            }
        };

        writeln!(self.output, "Fetching available formats...")?;
        let mode = DiscoveryMode::from_playlist(playlist);
        let catalog = match self.orchestrator.discover(&url, mode).await {
            Ok(catalog) if !catalog.is_empty() => catalog,
            Ok(_) => {
                writeln!(self.output, "{NO_FORMATS}")?;
                writeln!(self.output, "Try again later or use a different network path (e.g. a VPN)")?;
                return Ok(ActionStatus::DiscoveryFailed);
            }
            Err(e) => {
                writeln!(self.output, "{NO_FORMATS}")?;
                writeln!(self.output, "{}", e.report())?;
                return Ok(ActionStatus::DiscoveryFailed);
            }
        };

        let limit = if playlist {
            self.orchestrator.catalog_config().playlist_display_limit
        } else {
            None
        };
        let view = CatalogView::new(&catalog, limit);

        if playlist {
            writeln!(
                self.output,
                "\nPlaylist: {} ({} items)",
                catalog.metadata.title, catalog.metadata.item_count
            )?;
            writeln!(self.output, "Available audio formats:")?;
        } else {
            writeln!(self.output, "\nAvailable audio formats for: {}", catalog.metadata.title)?;
        }
        write!(self.output, "{}", format_table(view.visible()))?;
        if view.is_truncated() {
            writeln!(
                self.output,
                "(top {} of {} formats)",
                view.visible().len(),
                catalog.len()
            )?;
        }

        let token = self.ask("\nSelect format by index: ").await?;
        let format = match view.select_token(&token) {
            Ok(format) => format.clone(),
            Err(e) => {
                writeln!(self.output, "Invalid selection: {e}")?;
                return Ok(ActionStatus::SelectionFailed);
            }
        };

        let start = if playlist {
            "Starting playlist download..."
        } else {
            "Starting download..."
        };
        writeln!(self.output, "{start}")?;

        match self.fetch_with_progress(&url, &format, playlist).await {
            Outcome::Completed { files } => {
                let done = if playlist {
                    "Playlist download completed!"
                } else {
                    "Download completed successfully!"
                };
                writeln!(self.output, "{done}")?;
                for file in &files {
                    writeln!(self.output, "  {}", file.display())?;
                }
                if !playlist && !files.is_empty() {
                    return self.offer_conversion(&files).await;
                }
                Ok(ActionStatus::Success)
            }
            Outcome::Failed { reason, kind } => {
                writeln!(self.output, "Download error: {reason}")?;
                writeln!(self.output, "If this persists: {}", kind.suggestion())?;
                Ok(ActionStatus::DownloadFailed)
            }
        }
    }

    async fn fetch_with_progress(
        &mut self,
        url: &ResourceUrl,
        format: &StreamFormat,
        playlist: bool,
    ) -> Outcome {
        let bar = progress_bar(&format.format_id);
        let Self {
            orchestrator,
            output,
            ..
        } = self;

        let mut on_event = |event: ProgressEvent| match event {
            ProgressEvent::Progress { percent_complete } => {
                bar.set_position(percent_complete.round() as u64);
            }
            ProgressEvent::Finished => {
                bar.finish_and_clear();
                let _ = writeln!(output, "Post-processing...");
            }
        };

        let outcome = if playlist {
            orchestrator.download_playlist(url, format, &mut on_event).await
        } else {
            orchestrator.download_single(url, format, &mut on_event).await
        };
        bar.finish_and_clear();
        outcome
    }

    async fn offer_conversion(&mut self, files: &[PathBuf]) -> Result<ActionStatus, CliError> {
        writeln!(self.output, "\nConvert to another format? (Enter keeps the original)")?;
        write!(self.output, "{}", codec_menu())?;
        let token = self.ask("\nSelect output format: ").await?;
        if token.is_empty() {
            return Ok(ActionStatus::Success);
        }
        let Some(codec) = parse_codec_choice(&token) else {
            writeln!(self.output, "Invalid selection")?;
            return Ok(ActionStatus::SelectionFailed);
        };

        let mut status = ActionStatus::Success;
        for file in files {
            if self.convert_one(file, codec).await? != ActionStatus::Success {
                status = ActionStatus::ConversionFailed;
            }
        }
        Ok(status)
    }

    async fn convert_file(&mut self) -> Result<ActionStatus, CliError> {
        let raw = self.ask("Enter input file path: ").await?;
        let path = PathBuf::from(raw.trim_matches(|c| c == '"' || c == '\''));
        let exists = tokio::fs::metadata(&path)
            .await
            .map(|meta| meta.is_file())
            .unwrap_or(false);
        if !exists {
            writeln!(self.output, "File not found!")?;
            return Ok(ActionStatus::ConversionFailed);
        }

        writeln!(self.output, "\nAvailable output formats:")?;
        write!(self.output, "{}", codec_menu())?;
        let token = self.ask("\nSelect output format: ").await?;
        let Some(codec) = parse_codec_choice(&token) else {
            writeln!(self.output, "Invalid selection")?;
            return Ok(ActionStatus::SelectionFailed);
        };

        self.convert_one(&path, codec).await
    }

    async fn convert_one(&mut self, file: &Path, codec: TargetCodec) -> Result<ActionStatus, CliError> {
        match self.orchestrator.convert(file, codec).await {
            Ok(output) => {
                writeln!(self.output, "Conversion successful: {}", output.display())?;
                Ok(ActionStatus::Success)
            }
            Err(ConversionError::ToolUnavailable(_)) => {
                writeln!(
                    self.output,
                    "FFmpeg not found. Please install FFmpeg to use conversion features."
                )?;
                Ok(ActionStatus::ConversionFailed)
            }
            Err(e) => {
                writeln!(self.output, "Conversion failed: {e}")?;
                Ok(ActionStatus::ConversionFailed)
            }
        }
    }
}

fn parse_codec_choice(token: &str) -> Option<TargetCodec> {
    parse_selection(token)
        .ok()
        .and_then(TargetCodec::from_menu_index)
}

fn progress_bar(label: &str) -> ProgressBar {
    let bar = ProgressBar::new(100);
    let style = ProgressStyle::with_template(
        "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos:>3}% {msg}",
    )
    .map(|style| style.progress_chars("#>-"))
    .unwrap_or_else(|_| ProgressStyle::default_bar());
    bar.set_style(style);
    bar.set_message(format!("format {label}"));
    bar
}
