//! Wiring of profile generation, discovery, scheduling and conversion.
//!
//! Every call into the retrieval tool gets its own freshly generated
//! [`SessionProfile`]; discovery and the download that follows it never
//! share an identity.

use crate::catalog::{CatalogConfig, FormatCatalog};
use crate::config::{AppConfig, ConfigError};
use crate::downloader::{DownloadScheduler, Outcome, ProgressEvent};
use crate::postprocess::{ConversionError, PostProcessDispatcher, TargetCodec, Transcoder};
use crate::profile::{SessionProfile, SessionProfileGenerator};
use crate::random::RandomSource;
use crate::resource::ResourceUrl;
use crate::retriever::{DiscoveryError, DiscoveryMode, MediaRetriever};
use crate::{FormatCatalogResult, StreamFormat};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;

/// Drives one user action at a time through the acquisition pipeline.
#[derive(Clone)]
pub struct Orchestrator {
    profiles: SessionProfileGenerator,
    catalog: FormatCatalog,
    scheduler: DownloadScheduler,
    dispatcher: PostProcessDispatcher,
}

impl Orchestrator {
    /// Validate `config` and wire the components around the collaborators.
    ///
    /// `rng` is shared by every component that draws identities or delays.
    pub fn new<R, T>(
        config: AppConfig,
        retriever: R,
        transcoder: T,
        rng: RandomSource,
    ) -> Result<Self, ConfigError>
    where
        R: MediaRetriever + 'static,
        T: Transcoder + 'static,
    {
        Self::with_shared(config, Arc::new(retriever), Arc::new(transcoder), rng)
    }

    /// Like [`Orchestrator::new`] for collaborators already behind an `Arc`.
    pub fn with_shared(
        config: AppConfig,
        retriever: Arc<dyn MediaRetriever>,
        transcoder: Arc<dyn Transcoder>,
        rng: RandomSource,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        let AppConfig {
            profile,
            catalog,
            scheduler,
            dispatcher,
        } = config;

        Ok(Self {
            profiles: SessionProfileGenerator::new(profile, rng.clone())?,
            catalog: FormatCatalog::new(Arc::clone(&retriever), catalog, rng.clone())?,
            scheduler: DownloadScheduler::new(retriever, scheduler, rng)?,
            dispatcher: PostProcessDispatcher::new(transcoder, dispatcher)?,
        })
    }

    /// Catalog presentation options.
    pub fn catalog_config(&self) -> &CatalogConfig {
        self.catalog.config()
    }

    /// Directory downloads are written to.
    pub fn output_dir(&self) -> &Path {
        &self.scheduler.config().output_dir
    }

    fn fresh_profile(&self) -> SessionProfile {
        self.profiles.generate()
    }

    /// Discover and rank the audio-only formats of `url`, read as a single
    /// item or as a playlist according to `mode`.
    pub async fn discover(
        &self,
        url: &ResourceUrl,
        mode: DiscoveryMode,
    ) -> Result<FormatCatalogResult, DiscoveryError> {
        let profile = self.fresh_profile();
        self.catalog.discover(url, mode, &profile).await
    }

    /// Download `format` of a single resource.
    pub async fn download_single(
        &self,
        url: &ResourceUrl,
        format: &StreamFormat,
        on_event: &mut (dyn FnMut(ProgressEvent) + Send),
    ) -> Outcome {
        let profile = self.fresh_profile();
        info!(url = %url, format_id = %format.format_id, "Starting single download");
        self.scheduler.run_single(url, format, &profile, on_event).await
    }

    /// Download `format` of every item in a playlist.
    pub async fn download_playlist(
        &self,
        url: &ResourceUrl,
        format: &StreamFormat,
        on_event: &mut (dyn FnMut(ProgressEvent) + Send),
    ) -> Outcome {
        let profile = self.fresh_profile();
        info!(url = %url, format_id = %format.format_id, "Starting playlist download");
        self.scheduler.run_playlist(url, format, &profile, on_event).await
    }

    /// Convert a file; the input is kept.
    pub async fn convert(&self, file: &Path, codec: TargetCodec) -> Result<PathBuf, ConversionError> {
        self.dispatcher.dispatch(file, codec).await
    }
}
