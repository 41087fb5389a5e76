//! Integration tests for the interactive menu, driven by scripted input

use crate::support::{audio, playlist_discovery, single_discovery, FakeRetriever, FakeTranscoder};
use audiophile_dl::cli::menu::GOODBYE;
use audiophile_dl::cli::{ActionStatus, Menu, MenuExit, ScriptedLines};
use audiophile_dl::config::AppConfig;
use audiophile_dl::orchestrator::Orchestrator;
use audiophile_dl::random::RandomSource;
use audiophile_dl::retriever::{DiscoveryError, DiscoveryMode, FetchError};
use tempfile::TempDir;

struct Run {
    exit: MenuExit,
    output: String,
}

async fn run_menu(
    dir: &TempDir,
    retriever: FakeRetriever,
    transcoder: FakeTranscoder,
    script: &[&str],
) -> Run {
    let mut config = AppConfig::default();
    config.scheduler.output_dir = dir.path().join("downloads");
    let orchestrator =
        Orchestrator::new(config, retriever, transcoder, RandomSource::seeded(11)).unwrap();

    let mut menu = Menu::new(orchestrator, ScriptedLines::new(script.iter().copied()), Vec::new());
    let exit = menu.run().await.unwrap();
    Run {
        exit,
        output: String::from_utf8(menu.into_output()).unwrap(),
    }
}

fn song() -> FakeRetriever {
    FakeRetriever::new(single_discovery(
        "Song",
        vec![audio("250", Some(70.0)), audio("251", Some(160.0))],
    ))
}

#[tokio::test]
async fn test_exit_option() {
    let dir = TempDir::new().unwrap();
    let run = run_menu(&dir, song(), FakeTranscoder::default(), &["4"]).await;

    assert_eq!(run.exit, MenuExit::Quit);
    assert_eq!(run.exit.exit_code(), 0);
    assert!(run.output.contains("Main Menu:"));
    assert!(run.output.contains(GOODBYE));
}

#[tokio::test]
async fn test_end_of_input_without_actions_exits_zero() {
    let dir = TempDir::new().unwrap();
    let run = run_menu(&dir, song(), FakeTranscoder::default(), &[]).await;
    assert_eq!(run.exit, MenuExit::EndOfInput(ActionStatus::Success));
    assert_eq!(run.exit.exit_code(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_single_download_flow() {
    let dir = TempDir::new().unwrap();
    let run = run_menu(
        &dir,
        song(),
        FakeTranscoder::default(),
        &["1", "https://www.youtube.com/watch?v=abc", "1", "", "", "4"],
    )
    .await;

    assert_eq!(run.exit, MenuExit::Quit);
    assert!(run.output.contains("Available audio formats for: Song"));
    assert!(run.output.contains("Index | Format ID | Extension | Bitrate | Quality"));
    // highest bitrate listed first
    let first = run.output.find("    1 | 251").unwrap();
    let second = run.output.find("    2 | 250").unwrap();
    assert!(first < second);
    assert!(run.output.contains("Post-processing..."));
    assert!(run.output.contains("Download completed successfully!"));
    assert!(dir.path().join("downloads").join("01 - track.webm").exists());
}

#[tokio::test(start_paused = true)]
async fn test_single_download_with_conversion() {
    let dir = TempDir::new().unwrap();
    let transcoder = FakeTranscoder::default();
    let calls = transcoder.calls();
    let run = run_menu(
        &dir,
        song(),
        transcoder,
        &["1", "https://youtu.be/abc", "1", "1", ""],
    )
    .await;

    assert_eq!(run.exit, MenuExit::EndOfInput(ActionStatus::Success));
    assert!(run.output.contains("Conversion successful"));
    assert_eq!(calls.lock().unwrap().len(), 1);
    assert!(dir.path().join("downloads").join("01 - track.mp3").exists());
}

#[tokio::test(start_paused = true)]
async fn test_single_action_ignores_playlist_context() {
    let dir = TempDir::new().unwrap();
    let retriever = FakeRetriever::new(playlist_discovery(
        "Some Playlist",
        12,
        vec![audio("999", Some(128.0))],
    ))
    .with_single_item(single_discovery(
        "Requested Video",
        vec![audio("251", Some(160.0))],
    ));
    let log = retriever.log();
    let run = run_menu(
        &dir,
        retriever,
        FakeTranscoder::default(),
        &["1", "https://www.youtube.com/watch?v=abc&list=PL123", "1", "", ""],
    )
    .await;

    assert!(run.output.contains("Available audio formats for: Requested Video"));
    assert!(!run.output.contains("Some Playlist"));
    let log = log.lock().unwrap();
    assert_eq!(log.discoveries[0].mode, DiscoveryMode::Single);
    assert_eq!(log.fetches[0].job.format_id, "251");
    assert!(!log.fetches[0].job.is_playlist());
}

#[tokio::test(start_paused = true)]
async fn test_playlist_action_discovers_in_playlist_mode() {
    let dir = TempDir::new().unwrap();
    let retriever = FakeRetriever::new(playlist_discovery(
        "Mix",
        2,
        vec![audio("140", Some(128.0))],
    ));
    let log = retriever.log();
    run_menu(
        &dir,
        retriever,
        FakeTranscoder::default(),
        &["2", "https://www.youtube.com/playlist?list=PL1", "1", ""],
    )
    .await;

    assert_eq!(log.lock().unwrap().discoveries[0].mode, DiscoveryMode::Playlist);
}

#[tokio::test]
async fn test_invalid_url_sets_discovery_exit_code() {
    let dir = TempDir::new().unwrap();
    let retriever = song();
    let log = retriever.log();
    let run = run_menu(
        &dir,
        retriever,
        FakeTranscoder::default(),
        &["1", "https://vimeo.com/123", ""],
    )
    .await;

    assert!(run.output.contains("Invalid YouTube URL"));
    assert_eq!(run.exit.exit_code(), 2);
    assert!(log.lock().unwrap().discoveries.is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_discovery_failure_prints_remediation() {
    let dir = TempDir::new().unwrap();
    let retriever = FakeRetriever::failing_discovery(DiscoveryError::AccessDenied(
        "HTTP Error 403: Forbidden".to_string(),
    ));
    let run = run_menu(
        &dir,
        retriever,
        FakeTranscoder::default(),
        &["1", "https://youtu.be/abc", ""],
    )
    .await;

    assert!(run.output.contains("No audio formats found"));
    assert!(run.output.contains("Suggestion:"));
    assert_eq!(run.exit.exit_code(), 2);
}

#[tokio::test(start_paused = true)]
async fn test_out_of_range_selection_aborts_action_only() {
    let dir = TempDir::new().unwrap();
    let retriever = song();
    let log = retriever.log();
    let run = run_menu(
        &dir,
        retriever,
        FakeTranscoder::default(),
        &["1", "https://youtu.be/abc", "3", ""],
    )
    .await;

    assert!(run.output.contains("Invalid selection"));
    assert_eq!(run.exit.exit_code(), 3);
    assert!(log.lock().unwrap().fetches.is_empty());
    // back at the main menu afterwards
    assert_eq!(run.output.matches("Main Menu:").count(), 2);
}

#[tokio::test]
async fn test_non_numeric_menu_choice() {
    let dir = TempDir::new().unwrap();
    let run = run_menu(&dir, song(), FakeTranscoder::default(), &["abc", "", "4"]).await;

    assert!(run.output.contains("Please enter a valid number"));
    assert_eq!(run.exit, MenuExit::Quit);
}

#[tokio::test(start_paused = true)]
async fn test_playlist_shows_and_accepts_top_five_only() {
    let dir = TempDir::new().unwrap();
    let variants = (1..=7)
        .map(|i| audio(&format!("f{i}"), Some(f64::from(i) * 32.0)))
        .collect();
    let retriever = FakeRetriever::new(playlist_discovery("Mix", 4, variants));
    let log = retriever.log();
    let run = run_menu(
        &dir,
        retriever,
        FakeTranscoder::default(),
        &["2", "https://www.youtube.com/playlist?list=PL1", "6", ""],
    )
    .await;

    assert!(run.output.contains("Playlist: Mix (4 items)"));
    assert!(run.output.contains("    5 | f3"));
    assert!(!run.output.contains("    6 |"));
    assert!(run.output.contains("(top 5 of 7 formats)"));
    assert_eq!(run.exit.exit_code(), 3);
    assert!(log.lock().unwrap().fetches.is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_playlist_download_flow() {
    let dir = TempDir::new().unwrap();
    let retriever = FakeRetriever::new(playlist_discovery(
        "Mix",
        3,
        vec![audio("140", Some(128.0)), audio("251", Some(160.0))],
    ));
    let log = retriever.log();
    let run = run_menu(
        &dir,
        retriever,
        FakeTranscoder::default(),
        &["2", "https://www.youtube.com/playlist?list=PL1", "1", ""],
    )
    .await;

    assert!(run.output.contains("Playlist download completed!"));
    assert_eq!(run.exit.exit_code(), 0);
    let log = log.lock().unwrap();
    assert_eq!(log.fetches[0].job.format_id, "251");
    assert!(log.fetches[0].job.is_playlist());
}

#[tokio::test(start_paused = true)]
async fn test_download_failure_sets_exit_code() {
    let dir = TempDir::new().unwrap();
    let retriever = song().with_fetch_error(FetchError::Failed {
        status: Some(1),
        message: "Connection reset by peer".to_string(),
    });
    let run = run_menu(
        &dir,
        retriever,
        FakeTranscoder::default(),
        &["1", "https://youtu.be/abc", "1", ""],
    )
    .await;

    assert!(run.output.contains("Download error"));
    assert!(run.output.contains("Check your connection"));
    assert!(!run.output.contains("Post-processing..."));
    assert_eq!(run.exit.exit_code(), 4);
}

#[tokio::test]
async fn test_converter_missing_file() {
    let dir = TempDir::new().unwrap();
    let transcoder = FakeTranscoder::default();
    let calls = transcoder.calls();
    let missing = dir.path().join("missing.webm");
    let run = run_menu(
        &dir,
        song(),
        transcoder,
        &["3", missing.to_str().unwrap(), ""],
    )
    .await;

    assert!(run.output.contains("File not found!"));
    assert_eq!(run.exit.exit_code(), 5);
    assert!(calls.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_converter_success() {
    let dir = TempDir::new().unwrap();
    let input = dir.path().join("Song.webm");
    std::fs::write(&input, b"audio").unwrap();
    let run = run_menu(
        &dir,
        song(),
        FakeTranscoder::default(),
        &["3", input.to_str().unwrap(), "3", "", "4"],
    )
    .await;

    assert!(run.output.contains("1. MP3"));
    assert!(run.output.contains("Conversion successful"));
    assert!(dir.path().join("Song.wav").exists());
    assert!(input.exists());
    assert_eq!(run.exit, MenuExit::Quit);
}

#[tokio::test]
async fn test_converter_tool_missing() {
    let dir = TempDir::new().unwrap();
    let input = dir.path().join("Song.webm");
    std::fs::write(&input, b"audio").unwrap();
    let run = run_menu(
        &dir,
        song(),
        FakeTranscoder::failing(audiophile_dl::postprocess::TranscodeError::NotFound(
            "ffmpeg".to_string(),
        )),
        &["3", input.to_str().unwrap(), "1", ""],
    )
    .await;

    assert!(run.output.contains("FFmpeg not found"));
    assert_eq!(run.exit.exit_code(), 5);
}
