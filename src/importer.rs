//! Turning uploads, search keywords and stickers into collage layers
//!
//! Every import path ends the same way: decode, remove the background, append
//! to the session. A source that fails is recorded in the [`ImportReport`] and
//! the rest of the batch carries on, so the user can retry just the failures.

use crate::{
    config::CollageConfig,
    error::{CollageError, Result},
    fetch::{HttpImageFetcher, ImageFetcher},
    item::{CollageItem, ItemKind},
    manifest::CollageManifest,
    removal::{create_remover, BackgroundRemover},
    search::{DuckDuckGoSearch, ImageSearchProvider},
    services::{ImportStage, NoOpProgressReporter, ProgressReporter, ProgressTracker},
    session::CollageSession,
    sticker::Sticker,
};
use image::DynamicImage;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, instrument, warn};

/// A source that could not be turned into a layer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportFailure {
    /// File name or keyword
    pub source: String,
    pub reason: String,
}

/// Outcome of one import batch
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImportReport {
    /// Layer indices of the items appended by this batch
    pub added: Vec<usize>,
    pub failures: Vec<ImportFailure>,
    /// One entry per requested source in request order: the layer index it
    /// became, or `None` when it failed
    pub layers: Vec<Option<usize>>,
}

impl ImportReport {
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }

    pub fn merge(&mut self, other: ImportReport) {
        self.added.extend(other.added);
        self.failures.extend(other.failures);
        self.layers.extend(other.layers);
    }

    fn succeed(&mut self, index: usize) {
        self.added.push(index);
        self.layers.push(Some(index));
    }

    fn fail(&mut self, tracker: &ProgressTracker<'_>, source: &str, error: &CollageError) {
        let reason = error.to_string();
        tracker.report_error(source, &reason);
        self.failures.push(ImportFailure {
            source: source.to_string(),
            reason,
        });
        self.layers.push(None);
    }
}

/// Adds items to a session from files, bytes, keywords and stickers
pub struct CollageImporter {
    remover: Box<dyn BackgroundRemover>,
    search: Arc<dyn ImageSearchProvider>,
    fetcher: Arc<dyn ImageFetcher>,
    progress: Arc<dyn ProgressReporter>,
    max_results: usize,
}

impl CollageImporter {
    pub fn new(
        remover: Box<dyn BackgroundRemover>,
        search: Arc<dyn ImageSearchProvider>,
        fetcher: Arc<dyn ImageFetcher>,
    ) -> Self {
        Self {
            remover,
            search,
            fetcher,
            progress: Arc::new(NoOpProgressReporter),
            max_results: 1,
        }
    }

    /// Build the importer described by `config`: its remover, `DuckDuckGo`
    /// search and an HTTP fetcher
    ///
    /// # Errors
    /// - Remover creation (model download or load) failures
    /// - HTTP client construction failures
    pub async fn from_config(config: &CollageConfig) -> Result<Self> {
        let remover = create_remover(&config.removal).await?;
        let search = DuckDuckGoSearch::new(&config.search)?;
        let fetcher =
            HttpImageFetcher::new(Duration::from_secs(config.search.fetch_timeout_secs))?;
        info!(
            remover = remover.name(),
            "🧩 Importer ready (search: {})",
            search.name()
        );
        Ok(Self::new(remover, Arc::new(search), Arc::new(fetcher))
            .with_max_results(config.search.max_results))
    }

    #[must_use]
    pub fn with_progress_reporter(mut self, reporter: Arc<dyn ProgressReporter>) -> Self {
        self.progress = reporter;
        self
    }

    /// Number of search hits tried per keyword before giving up
    #[must_use]
    pub fn with_max_results(mut self, max_results: usize) -> Self {
        self.max_results = max_results.max(1);
        self
    }

    #[must_use]
    pub fn remover_name(&self) -> &str {
        self.remover.name()
    }

    /// Decode each file, remove its background and add it as a photo
    #[instrument(level = "debug", skip_all, fields(count = paths.len()))]
    pub fn import_files<P: AsRef<Path>>(
        &mut self,
        session: &mut CollageSession,
        paths: &[P],
    ) -> ImportReport {
        let progress = Arc::clone(&self.progress);
        let tracker = ProgressTracker::new(progress.as_ref(), paths.len());
        let mut report = ImportReport::default();

        for path in paths {
            let path = path.as_ref();
            let name = display_name(path);
            tracker.next_item();
            tracker.report_stage(ImportStage::Decoding, &name);

            let result = image::open(path)
                .map_err(|e| match e {
                    image::ImageError::IoError(io) => {
                        CollageError::file_io_error("read image", path, &io)
                    },
                    other => CollageError::Image(other),
                })
                .and_then(|image| self.cut_out(&tracker, &name, &image));

            match result {
                Ok(cutout) => {
                    let index = session.add(CollageItem::new(&name, ItemKind::Photo, cutout));
                    tracker.report_stage(ImportStage::Added, &name);
                    report.succeed(index);
                },
                Err(e) => report.fail(&tracker, &name, &e),
            }
        }

        tracker.report_completion(report.added.len(), report.failures.len());
        report
    }

    /// Add an in-memory upload as a photo and return its layer index
    ///
    /// # Errors
    /// - Undecodable bytes
    /// - Background removal failures
    pub fn import_bytes(
        &mut self,
        session: &mut CollageSession,
        name: &str,
        bytes: &[u8],
    ) -> Result<usize> {
        let progress = Arc::clone(&self.progress);
        let tracker = ProgressTracker::new(progress.as_ref(), 1);
        tracker.next_item();
        tracker.report_stage(ImportStage::Decoding, name);

        let image = image::load_from_memory(bytes)?;
        let cutout = self.cut_out(&tracker, name, &image)?;
        let index = session.add(CollageItem::new(name, ItemKind::Photo, cutout));
        tracker.report_stage(ImportStage::Added, name);
        Ok(index)
    }

    /// Search each keyword, download the first usable hit and add it
    #[instrument(level = "debug", skip_all, fields(count = keywords.len()))]
    pub async fn import_search<S: AsRef<str>>(
        &mut self,
        session: &mut CollageSession,
        keywords: &[S],
    ) -> ImportReport {
        let progress = Arc::clone(&self.progress);
        let tracker = ProgressTracker::new(progress.as_ref(), keywords.len());
        let mut report = ImportReport::default();

        for keyword in keywords {
            let keyword = keyword.as_ref().trim();
            tracker.next_item();

            match self.import_keyword(&tracker, keyword).await {
                Ok(cutout) => {
                    let index = session.add(CollageItem::new(keyword, ItemKind::Search, cutout));
                    tracker.report_stage(ImportStage::Added, keyword);
                    report.succeed(index);
                },
                Err(e) => report.fail(&tracker, keyword, &e),
            }
        }

        tracker.report_completion(report.added.len(), report.failures.len());
        report
    }

    /// Append a sticker layer and return its index
    pub fn add_sticker(session: &mut CollageSession, sticker: Sticker, size: u32) -> usize {
        let index = session.add(sticker.to_item(size));
        debug!("{} Added sticker at layer {}", sticker.emoji(), index + 1);
        index
    }

    /// Import a manifest's photos, keywords and stickers, then pin its placements
    ///
    /// Manifest layer numbers count the declared sources in that order, so a
    /// placement follows its own source even when earlier imports fail.
    /// Placements whose source failed are skipped with a warning.
    ///
    /// # Errors
    /// - Manifest validation failures
    pub async fn import_manifest(
        &mut self,
        session: &mut CollageSession,
        manifest: &CollageManifest,
        sticker_size: u32,
    ) -> Result<ImportReport> {
        manifest.validate()?;
        let stickers = manifest.sticker_list()?;

        let mut report = self.import_files(session, &manifest.photos);
        report.merge(self.import_search(session, &manifest.keywords.keywords()).await);
        for sticker in stickers {
            report.succeed(Self::add_sticker(session, sticker, sticker_size));
        }

        let skipped = manifest.apply_placements(session, &report.layers);
        if !skipped.is_empty() {
            warn!(?skipped, "⚠️ Skipped placements for layers that failed to import");
        }
        Ok(report)
    }

    async fn import_keyword(
        &mut self,
        tracker: &ProgressTracker<'_>,
        keyword: &str,
    ) -> Result<image::RgbaImage> {
        if keyword.is_empty() {
            return Err(CollageError::invalid_input("empty search keyword"));
        }

        tracker.report_stage(ImportStage::Searching, keyword);
        let hits = self.search.search_images(keyword, self.max_results).await?;
        if hits.is_empty() {
            return Err(CollageError::search(format!("no images found for '{}'", keyword)));
        }

        let mut last_error = None;
        for hit in &hits {
            tracker.report_stage(ImportStage::Downloading, keyword);
            match self.fetcher.fetch(&hit.image_url).await {
                Ok(image) => return self.cut_out(tracker, keyword, &image),
                Err(e) => {
                    warn!(url = %hit.image_url, "⚠️ Skipping search hit: {}", e);
                    last_error = Some(e);
                },
            }
        }

        Err(last_error
            .unwrap_or_else(|| CollageError::search(format!("no usable image for '{}'", keyword))))
    }

    fn cut_out(
        &mut self,
        tracker: &ProgressTracker<'_>,
        source: &str,
        image: &DynamicImage,
    ) -> Result<image::RgbaImage> {
        tracker.report_stage(ImportStage::RemovingBackground, source);
        let cutout = self.remover.remove(image)?;
        if cutout.dimensions() != (image.width(), image.height()) {
            return Err(CollageError::processing(format!(
                "background remover '{}' changed the image size",
                self.remover.name()
            )));
        }
        Ok(cutout)
    }
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map_or_else(|| path.display().to_string(), |name| name.to_string_lossy().into_owned())
}
