//! In-memory collaborators shared by the integration tests

#![allow(dead_code)]

use async_trait::async_trait;
use audiophile_dl::downloader::DownloadJob;
use audiophile_dl::postprocess::{TargetCodec, TranscodeError, TranscodeRequest, Transcoder};
use audiophile_dl::profile::SessionProfile;
use audiophile_dl::retriever::{
    Discovery, DiscoveryError, DiscoveryMode, FetchError, FetchOutput, MediaRetriever,
};
use audiophile_dl::{RawVariant, ResourceMetadata, ResourceUrl};
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::time::Instant;

/// Audio-only variant.
pub fn audio(id: &str, abr: Option<f64>) -> RawVariant {
    RawVariant {
        format_id: id.to_string(),
        ext: Some("webm".to_string()),
        abr,
        acodec: Some("opus".to_string()),
        vcodec: Some("none".to_string()),
        format_note: Some("medium".to_string()),
        filesize: None,
    }
}

/// Video-only variant.
pub fn video(id: &str) -> RawVariant {
    RawVariant {
        format_id: id.to_string(),
        ext: Some("mp4".to_string()),
        abr: None,
        acodec: Some("none".to_string()),
        vcodec: Some("avc1.4d401f".to_string()),
        format_note: Some("720p".to_string()),
        filesize: None,
    }
}

/// Discovery result for a single resource.
pub fn single_discovery(title: &str, variants: Vec<RawVariant>) -> Discovery {
    Discovery {
        variants,
        metadata: ResourceMetadata {
            title: title.to_string(),
            is_playlist: false,
            item_count: 1,
        },
    }
}

/// Discovery result for a playlist.
pub fn playlist_discovery(title: &str, items: usize, variants: Vec<RawVariant>) -> Discovery {
    Discovery {
        variants,
        metadata: ResourceMetadata {
            title: title.to_string(),
            is_playlist: true,
            item_count: items,
        },
    }
}

/// A recorded discovery call.
#[derive(Debug, Clone)]
pub struct DiscoveryCall {
    pub url: String,
    pub mode: DiscoveryMode,
    pub identity: String,
    pub at: Instant,
}

/// A recorded fetch call.
#[derive(Debug, Clone)]
pub struct FetchCall {
    pub job: DownloadJob,
    pub identity: String,
    pub started: Instant,
    pub item_delays: Vec<Duration>,
}

/// Everything the fake retriever was asked to do.
#[derive(Debug, Default)]
pub struct CallLog {
    pub discoveries: Vec<DiscoveryCall>,
    pub fetches: Vec<FetchCall>,
}

/// Scripted retrieval collaborator.
///
/// Discovery answers with `discovery`, or with `single_item` when one is set
/// and playlist context is to be ignored. Fetches write one small file per item into the job's output directory,
/// waiting out the job's item delay between playlist items.
pub struct FakeRetriever {
    pub discovery: Result<Discovery, DiscoveryError>,
    pub single_item: Option<Discovery>,
    pub progress: Vec<f64>,
    pub fetch_error: Option<FetchError>,
    pub playlist_items: usize,
    pub log: Arc<Mutex<CallLog>>,
}

impl FakeRetriever {
    pub fn new(discovery: Discovery) -> Self {
        Self {
            discovery: Ok(discovery),
            single_item: None,
            progress: vec![0.0, 25.0, 25.0, 80.0, 100.0],
            fetch_error: None,
            playlist_items: 3,
            log: Arc::new(Mutex::new(CallLog::default())),
        }
    }

    pub fn failing_discovery(error: DiscoveryError) -> Self {
        Self {
            discovery: Err(error),
            ..Self::new(Discovery::default())
        }
    }

    /// Answer single-mode discovery with `discovery` instead.
    pub fn with_single_item(mut self, discovery: Discovery) -> Self {
        self.single_item = Some(discovery);
        self
    }

    pub fn with_fetch_error(mut self, error: FetchError) -> Self {
        self.fetch_error = Some(error);
        self
    }

    pub fn log(&self) -> Arc<Mutex<CallLog>> {
        Arc::clone(&self.log)
    }
}

#[async_trait]
impl MediaRetriever for FakeRetriever {
    fn name(&self) -> &str {
        "fake"
    }

    async fn discover_formats(
        &self,
        url: &ResourceUrl,
        mode: DiscoveryMode,
        profile: &SessionProfile,
    ) -> Result<Discovery, DiscoveryError> {
        self.log.lock().unwrap().discoveries.push(DiscoveryCall {
            url: url.to_string(),
            mode,
            identity: profile.identity().to_string(),
            at: Instant::now(),
        });
        match (&self.single_item, mode) {
            (Some(item), DiscoveryMode::Single) => Ok(item.clone()),
            _ => self.discovery.clone(),
        }
    }

    async fn fetch(
        &self,
        job: &DownloadJob,
        profile: &SessionProfile,
        on_progress: &mut (dyn FnMut(f64) + Send),
    ) -> Result<FetchOutput, FetchError> {
        let started = Instant::now();
        let items = if job.is_playlist() { self.playlist_items } else { 1 };
        let mut item_delays = Vec::new();
        let mut files = Vec::new();

        for item in 1..=items {
            if let (Some(policy), true) = (job.item_delay(), item > 1) {
                let delay = policy.next_delay();
                item_delays.push(delay);
                tokio::time::sleep(delay).await;
            }
            for percent in &self.progress {
                on_progress(*percent);
            }
            if self.fetch_error.is_some() {
                break;
            }
            let file = job.output.dir().join(format!("{item:02} - track.webm"));
            tokio::fs::write(&file, b"audio").await.map_err(|e| FetchError::Io(e.to_string()))?;
            files.push(file);
        }

        self.log.lock().unwrap().fetches.push(FetchCall {
            job: job.clone(),
            identity: profile.identity().to_string(),
            started,
            item_delays,
        });

        match &self.fetch_error {
            Some(error) => Err(error.clone()),
            None => Ok(FetchOutput { files }),
        }
    }
}

/// A recorded transcode call.
#[derive(Debug, Clone, PartialEq)]
pub struct TranscodeCall {
    pub input: PathBuf,
    pub output: PathBuf,
    pub codec: TargetCodec,
}

/// Scripted transcoding collaborator; copies the input on success.
#[derive(Default)]
pub struct FakeTranscoder {
    pub error: Option<TranscodeError>,
    pub calls: Arc<Mutex<Vec<TranscodeCall>>>,
}

impl FakeTranscoder {
    pub fn failing(error: TranscodeError) -> Self {
        Self {
            error: Some(error),
            ..Default::default()
        }
    }

    pub fn calls(&self) -> Arc<Mutex<Vec<TranscodeCall>>> {
        Arc::clone(&self.calls)
    }
}

#[async_trait]
impl Transcoder for FakeTranscoder {
    fn name(&self) -> &str {
        "fake"
    }

    async fn transcode(&self, request: TranscodeRequest<'_>) -> Result<(), TranscodeError> {
        self.calls.lock().unwrap().push(TranscodeCall {
            input: request.input.to_path_buf(),
            output: request.output.to_path_buf(),
            codec: request.codec,
        });
        if let Some(error) = &self.error {
            return Err(error.clone());
        }
        tokio::fs::copy(request.input, request.output)
            .await
            .map(|_| ())
            .map_err(|e| TranscodeError::Io(e.to_string()))
    }
}
