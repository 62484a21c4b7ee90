//! Integration tests for keyword search imports
//!
//! Search and download are exercised against mock providers and against a
//! throwaway local HTTP server standing in for the search engine and the
//! image host.

use async_trait::async_trait;
use collage_maker::{
    encode_png, CollageError, CollageImporter, CollageSession, DuckDuckGoSearch, HttpImageFetcher,
    ImageFetcher, ImageSearchProvider, ImportStage, ItemKind, PassthroughRemover,
    ProgressReporter, ProgressUpdate, Result, SearchHit, SearchSettings,
};
use image::{DynamicImage, Rgba, RgbaImage};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

fn hit(url: &str) -> SearchHit {
    SearchHit {
        image_url: url.to_string(),
        thumbnail_url: None,
        title: url.to_string(),
        width: None,
        height: None,
    }
}

/// Returns fixed hits per keyword and records every query
#[derive(Default)]
struct MockSearch {
    hits: HashMap<String, Vec<SearchHit>>,
    queries: Mutex<Vec<(String, usize)>>,
}

#[async_trait]
impl ImageSearchProvider for MockSearch {
    async fn search_images(&self, keyword: &str, max_results: usize) -> Result<Vec<SearchHit>> {
        self.queries
            .lock()
            .unwrap()
            .push((keyword.to_string(), max_results));
        if keyword == "offline" {
            return Err(CollageError::Network("connection reset".to_string()));
        }
        Ok(self
            .hits
            .get(keyword)
            .map(|hits| hits.iter().take(max_results).cloned().collect())
            .unwrap_or_default())
    }

    fn name(&self) -> &str {
        "mock"
    }
}

/// Serves solid images for `good://` URLs and fails everything else
struct MockFetcher;

#[async_trait]
impl ImageFetcher for MockFetcher {
    async fn fetch(&self, url: &str) -> Result<DynamicImage> {
        if url.starts_with("good://") {
            Ok(DynamicImage::ImageRgba8(RgbaImage::from_pixel(
                12,
                8,
                Rgba([10, 20, 30, 255]),
            )))
        } else {
            Err(CollageError::Network(format!("HTTP error 404 for {}", url)))
        }
    }
}

#[derive(Default)]
struct RecordingReporter {
    stages: Mutex<Vec<(ImportStage, String)>>,
    errors: Mutex<Vec<String>>,
    completions: Mutex<Vec<(usize, usize)>>,
}

impl ProgressReporter for RecordingReporter {
    fn report_progress(&self, update: ProgressUpdate) {
        self.stages.lock().unwrap().push((update.stage, update.source));
    }

    fn report_completion(&self, added: usize, failed: usize, _elapsed_ms: u64) {
        self.completions.lock().unwrap().push((added, failed));
    }

    fn report_error(&self, source: &str, _error: &str) {
        self.errors.lock().unwrap().push(source.to_string());
    }
}

fn mock_search() -> Arc<MockSearch> {
    let mut hits = HashMap::new();
    hits.insert("cat".to_string(), vec![hit("good://cat-1"), hit("good://cat-2")]);
    hits.insert("dog".to_string(), vec![hit("bad://dog-1"), hit("good://dog-2")]);
    hits.insert("fish".to_string(), vec![hit("bad://fish-1")]);
    Arc::new(MockSearch {
        hits,
        ..MockSearch::default()
    })
}

#[tokio::test]
async fn test_search_import_adds_first_hit_per_keyword() {
    let search = mock_search();
    let reporter = Arc::new(RecordingReporter::default());
    let mut importer =
        CollageImporter::new(Box::new(PassthroughRemover), search.clone(), Arc::new(MockFetcher))
            .with_progress_reporter(reporter.clone());
    let mut session = CollageSession::new("tester").unwrap();

    let report = importer.import_search(&mut session, &["cat", "unknown"]).await;

    assert_eq!(report.added, vec![0]);
    assert_eq!(report.failures.len(), 1);
    assert_eq!(report.failures[0].source, "unknown");
    assert!(report.failures[0].reason.contains("no images found"));

    let item = session.get(0).unwrap();
    assert_eq!(item.kind, ItemKind::Search);
    assert_eq!(item.name, "cat");
    assert_eq!(item.dimensions(), (12, 8));

    // Default importer asks for a single hit
    assert_eq!(search.queries.lock().unwrap()[0], ("cat".to_string(), 1));

    let stages: Vec<ImportStage> =
        reporter.stages.lock().unwrap().iter().map(|(s, _)| *s).collect();
    assert_eq!(
        &stages[..4],
        [
            ImportStage::Searching,
            ImportStage::Downloading,
            ImportStage::RemovingBackground,
            ImportStage::Added
        ]
    );
    assert_eq!(*reporter.errors.lock().unwrap(), ["unknown"]);
    assert_eq!(*reporter.completions.lock().unwrap(), [(1, 1)]);
}

#[tokio::test]
async fn test_broken_hits_fall_through_when_more_results_allowed() {
    let mut importer =
        CollageImporter::new(Box::new(PassthroughRemover), mock_search(), Arc::new(MockFetcher))
            .with_max_results(3);
    let mut session = CollageSession::new("tester").unwrap();

    let report = importer
        .import_search(&mut session, &["dog", "fish", "offline"])
        .await;

    assert_eq!(report.added, vec![0]);
    assert_eq!(session.get(0).unwrap().name, "dog");
    let failed: Vec<&str> = report.failures.iter().map(|f| f.source.as_str()).collect();
    assert_eq!(failed, ["fish", "offline"]);
    assert!(report.failures[0].reason.contains("404"));
}

#[tokio::test]
async fn test_failed_keyword_can_be_retried() {
    let mut importer =
        CollageImporter::new(Box::new(PassthroughRemover), mock_search(), Arc::new(MockFetcher));
    let mut session = CollageSession::new("tester").unwrap();

    let first = importer.import_search(&mut session, &["dog"]).await;
    assert_eq!(first.failures.len(), 1);

    let mut importer = importer.with_max_results(2);
    let retry = importer.import_search(&mut session, &["dog"]).await;
    assert!(retry.is_complete());
    assert_eq!(session.len(), 1);
}

/// Minimal HTTP/1.1 server answering the token page, the JSON endpoint and one PNG
async fn spawn_fake_search_engine() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let base = format!("http://{}", listener.local_addr().unwrap());
    let image_url = format!("{}/images/heart.png", base);
    let png = encode_png(&RgbaImage::from_pixel(6, 4, Rgba([200, 0, 0, 255]))).unwrap();

    tokio::spawn(async move {
        loop {
            let Ok((mut socket, _)) = listener.accept().await else {
                break;
            };
            let image_url = image_url.clone();
            let png = png.clone();
            tokio::spawn(async move {
                let mut buffer = vec![0u8; 8192];
                let mut read = 0;
                while !buffer[..read].windows(4).any(|w| w == b"\r\n\r\n") {
                    match socket.read(&mut buffer[read..]).await {
                        Ok(0) | Err(_) => return,
                        Ok(n) => read += n,
                    }
                }
                let request = String::from_utf8_lossy(&buffer[..read]).to_string();
                let path = request.split_whitespace().nth(1).unwrap_or("/").to_string();

                let (content_type, body): (&str, Vec<u8>) = if path.starts_with("/i.js") {
                    if path.contains("vqd=4-test-token") {
                        let json = format!(
                            r#"{{"results": [{{"image": "{}", "title": "heart", "width": 6, "height": 4}}]}}"#,
                            image_url
                        );
                        ("application/json", json.into_bytes())
                    } else {
                        ("application/json", br#"{"results": []}"#.to_vec())
                    }
                } else if path.starts_with("/images/") {
                    ("image/png", png)
                } else {
                    (
                        "text/html",
                        br#"<html><script>vqd="4-test-token";</script></html>"#.to_vec(),
                    )
                };

                let header = format!(
                    "HTTP/1.1 200 OK\r\nContent-Type: {}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
                    content_type,
                    body.len()
                );
                let _ = socket.write_all(header.as_bytes()).await;
                let _ = socket.write_all(&body).await;
                let _ = socket.shutdown().await;
            });
        }
    });

    base
}

#[tokio::test]
async fn test_duckduckgo_search_against_local_server() {
    let base = spawn_fake_search_engine().await;
    let search = DuckDuckGoSearch::new(&SearchSettings::default())
        .unwrap()
        .with_base_url(&base);

    let hits = search.search_images("heart", 5).await.unwrap();
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].image_url, format!("{}/images/heart.png", base));
    assert_eq!(hits[0].width, Some(6));

    let mut importer = CollageImporter::new(
        Box::new(PassthroughRemover),
        Arc::new(search),
        Arc::new(HttpImageFetcher::new(Duration::from_secs(5)).unwrap()),
    );
    let mut session = CollageSession::new("tester").unwrap();
    let report = importer.import_search(&mut session, &["heart"]).await;

    assert!(report.is_complete(), "{:?}", report.failures);
    assert_eq!(session.get(0).unwrap().image.get_pixel(0, 0), &Rgba([200, 0, 0, 255]));
}
