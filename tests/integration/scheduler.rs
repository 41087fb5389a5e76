//! Integration tests for download scheduling: jitter, item delays, progress
//! events and failure conversion

use crate::support::{audio, single_discovery, FakeRetriever};
use audiophile_dl::downloader::{
    DownloadScheduler, JobKind, Outcome, ProgressEvent, SchedulerConfig,
};
use audiophile_dl::profile::{ProfileConfig, RateCeiling, SessionProfile, SessionProfileGenerator};
use audiophile_dl::random::RandomSource;
use audiophile_dl::retriever::{FailureKind, FetchError};
use audiophile_dl::{ResourceUrl, StreamFormat};
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use tokio::time::Instant;

fn profile() -> SessionProfile {
    SessionProfileGenerator::new(ProfileConfig::default(), RandomSource::seeded(5))
        .unwrap()
        .generate()
}

fn format() -> StreamFormat {
    StreamFormat::from(&audio("251", Some(160.0)))
}

fn scheduler(retriever: FakeRetriever, dir: &TempDir, seed: u64) -> DownloadScheduler {
    let config = SchedulerConfig {
        output_dir: dir.path().join("downloads"),
        ..Default::default()
    };
    DownloadScheduler::new(Arc::new(retriever), config, RandomSource::seeded(seed)).unwrap()
}

fn single_url() -> ResourceUrl {
    ResourceUrl::parse("https://www.youtube.com/watch?v=abc").unwrap()
}

fn playlist_url() -> ResourceUrl {
    ResourceUrl::parse("https://www.youtube.com/playlist?list=PL123").unwrap()
}

#[tokio::test(start_paused = true)]
async fn test_single_waits_jitter_then_fetches() {
    let dir = TempDir::new().unwrap();
    let retriever = FakeRetriever::new(single_discovery("Song", vec![]));
    let log = retriever.log();
    let scheduler = scheduler(retriever, &dir, 1);

    let start = Instant::now();
    let outcome = scheduler
        .run_single(&single_url(), &format(), &profile(), &mut |_| {})
        .await;
    assert!(outcome.is_success());

    let log = log.lock().unwrap();
    assert_eq!(log.fetches.len(), 1);
    let waited = log.fetches[0].started - start;
    assert!(waited >= Duration::from_secs(2), "waited {waited:?}");
    assert!(waited <= Duration::from_secs(5), "waited {waited:?}");
}

#[tokio::test(start_paused = true)]
async fn test_single_job_shape() {
    let dir = TempDir::new().unwrap();
    let retriever = FakeRetriever::new(single_discovery("Song", vec![]));
    let log = retriever.log();
    let scheduler = scheduler(retriever, &dir, 2);
    let profile = profile();

    let outcome = scheduler
        .run_single(&single_url(), &format(), &profile, &mut |_| {})
        .await;

    let log = log.lock().unwrap();
    let job = &log.fetches[0].job;
    assert_eq!(job.format_id, "251");
    assert_eq!(job.rate_ceiling, RateCeiling::DOWNLOAD);
    assert!(matches!(job.kind, JobKind::Single));
    assert_eq!(log.fetches[0].identity, profile.identity());

    // output directory created on demand
    assert!(dir.path().join("downloads").is_dir());
    assert_eq!(outcome.files().len(), 1);
    assert!(outcome.files()[0].exists());
}

#[test]
fn test_pre_download_jitter_bounds_over_many_draws() {
    let dir = TempDir::new().unwrap();
    let scheduler = scheduler(FakeRetriever::new(single_discovery("Song", vec![])), &dir, 42);
    let profile = profile();

    let delays: Vec<Duration> = (0..500)
        .map(|_| {
            scheduler
                .plan_single(&single_url(), &format(), &profile)
                .unwrap()
                .pre_delay
        })
        .collect();

    assert!(delays.iter().all(|d| *d >= Duration::from_secs(2) && *d <= Duration::from_secs(5)));
    // spread across the range, not pinned to one value
    assert!(delays.iter().any(|d| *d < Duration::from_millis(2500)));
    assert!(delays.iter().any(|d| *d > Duration::from_millis(4500)));
}

#[tokio::test(start_paused = true)]
async fn test_playlist_item_delays_resampled_per_item() {
    let dir = TempDir::new().unwrap();
    let mut retriever = FakeRetriever::new(single_discovery("List", vec![]));
    retriever.playlist_items = 6;
    let log = retriever.log();
    let scheduler = scheduler(retriever, &dir, 3);

    let outcome = scheduler
        .run_playlist(&playlist_url(), &format(), &profile(), &mut |_| {})
        .await;
    assert!(outcome.is_success());
    assert_eq!(outcome.files().len(), 6);

    let log = log.lock().unwrap();
    let call = &log.fetches[0];
    assert!(call.job.is_playlist());
    assert!(call.job.output.has_item_index());
    assert_eq!(call.item_delays.len(), 5);
    assert!(call
        .item_delays
        .iter()
        .all(|d| *d >= Duration::from_secs(5) && *d <= Duration::from_secs(15)));
    assert!(call.item_delays.windows(2).any(|w| w[0] != w[1]));
}

#[test]
fn test_playlist_delay_bounds_over_many_draws() {
    let dir = TempDir::new().unwrap();
    let scheduler = scheduler(FakeRetriever::new(single_discovery("List", vec![])), &dir, 8);
    let plan = scheduler
        .plan_playlist(&playlist_url(), &format(), &profile())
        .unwrap();
    let policy = plan.job.item_delay().unwrap();

    let delays: Vec<Duration> = (0..500).map(|_| policy.next_delay()).collect();
    assert!(delays.iter().all(|d| policy.range().contains(*d)));
    assert!(delays.iter().any(|d| *d < Duration::from_secs(7)));
    assert!(delays.iter().any(|d| *d > Duration::from_secs(13)));

    // playlists also get the pre-download jitter
    assert!(plan.pre_delay >= Duration::from_secs(2) && plan.pre_delay <= Duration::from_secs(5));
}

#[tokio::test(start_paused = true)]
async fn test_finished_reported_once_after_progress() {
    let dir = TempDir::new().unwrap();
    let mut retriever = FakeRetriever::new(single_discovery("List", vec![]));
    retriever.playlist_items = 3;
    let scheduler = scheduler(retriever, &dir, 4);

    let mut events = Vec::new();
    let outcome = scheduler
        .run_playlist(&playlist_url(), &format(), &profile(), &mut |e: ProgressEvent| events.push(e))
        .await;
    assert!(outcome.is_success());

    let finished = events.iter().filter(|e| **e == ProgressEvent::Finished).count();
    assert_eq!(finished, 1);
    assert_eq!(events.last(), Some(&ProgressEvent::Finished));
    // repeated and backwards percentages are passed through
    assert_eq!(events.len(), 3 * 5 + 1);
}

#[tokio::test(start_paused = true)]
async fn test_failure_becomes_outcome_without_finished() {
    let dir = TempDir::new().unwrap();
    let retriever = FakeRetriever::new(single_discovery("Song", vec![])).with_fetch_error(
        FetchError::Failed {
            status: Some(1),
            message: "HTTP Error 429: Too Many Requests".to_string(),
        },
    );
    let log = retriever.log();
    let scheduler = scheduler(retriever, &dir, 6);

    let mut events = Vec::new();
    let outcome = scheduler
        .run_single(&single_url(), &format(), &profile(), &mut |e: ProgressEvent| events.push(e))
        .await;

    match outcome {
        Outcome::Failed { reason, kind } => {
            assert!(reason.contains("Too Many Requests"));
            assert_eq!(kind, FailureKind::RateLimited);
        }
        other => panic!("expected failure, got {other:?}"),
    }
    assert!(!events.contains(&ProgressEvent::Finished));
    // no local retry
    assert_eq!(log.lock().unwrap().fetches.len(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_missing_tool_is_a_failed_outcome() {
    let dir = TempDir::new().unwrap();
    let retriever = FakeRetriever::new(single_discovery("Song", vec![]))
        .with_fetch_error(FetchError::ToolUnavailable("yt-dlp".to_string()));
    let scheduler = scheduler(retriever, &dir, 7);

    let outcome = scheduler
        .run_single(&single_url(), &format(), &profile(), &mut |_| {})
        .await;
    assert!(matches!(
        outcome,
        Outcome::Failed {
            kind: FailureKind::ToolMissing,
            ..
        }
    ));
}

#[test]
fn test_invalid_playlist_pattern_rejected_at_construction() {
    let config = SchedulerConfig {
        playlist_pattern: "%(title)s.%(ext)s".to_string(),
        ..Default::default()
    };
    let retriever = FakeRetriever::new(single_discovery("Song", vec![]));
    assert!(DownloadScheduler::new(Arc::new(retriever), config, RandomSource::seeded(1)).is_err());
}
