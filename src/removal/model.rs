//! Segmentation model resolution, download and caching
//!
//! A model source is either a local `.onnx` file (or a directory containing
//! `onnx/model.onnx`) or a `HuggingFace` repository URL. Repository models are
//! downloaded once into the cache directory:
//! - `$COLLAGE_MAKER_CACHE_DIR/models/` when set
//! - otherwise `<user cache dir>/collage-maker/models/`
//!
//! Each cached model has a `.sha256` sidecar; a model whose digest no longer
//! matches is treated as corrupt and downloaded again.

use crate::error::{CollageError, Result};
use reqwest::Client;
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info, warn};

const HUGGINGFACE_PREFIX: &str = "https://huggingface.co/";

/// ONNX file fetched from a model repository
const REPOSITORY_MODEL_FILE: &str = "onnx/model.onnx";

/// Environment variable overriding the cache location
pub const CACHE_DIR_ENV: &str = "COLLAGE_MAKER_CACHE_DIR";

#[derive(Debug)]
pub struct ModelStore {
    cache_dir: PathBuf,
    client: Client,
}

impl ModelStore {
    /// Create a store rooted at the default cache directory
    ///
    /// # Errors
    /// - Cache directory cannot be determined
    /// - HTTP client construction failure
    pub fn new() -> Result<Self> {
        Self::with_cache_dir(Self::default_cache_dir()?)
    }

    pub fn with_cache_dir<P: Into<PathBuf>>(cache_dir: P) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(300))
            .build()
            .map_err(|e| CollageError::network_error("Failed to create HTTP client", e))?;
        Ok(Self {
            cache_dir: cache_dir.into(),
            client,
        })
    }

    /// Default cache directory for downloaded models
    pub fn default_cache_dir() -> Result<PathBuf> {
        if let Ok(dir) = std::env::var(CACHE_DIR_ENV) {
            return Ok(PathBuf::from(dir).join("models"));
        }
        Ok(dirs::cache_dir()
            .ok_or_else(|| {
                CollageError::invalid_config(format!(
                    "Failed to determine cache directory. Set {} environment variable.",
                    CACHE_DIR_ENV
                ))
            })?
            .join("collage-maker")
            .join("models"))
    }

    #[must_use]
    pub fn cache_dir(&self) -> &Path {
        &self.cache_dir
    }

    /// Turn `https://huggingface.co/org/repo` into `org--repo`
    pub fn url_to_model_id(url: &str) -> Result<String> {
        let repo = url
            .strip_prefix(HUGGINGFACE_PREFIX)
            .map(|rest| rest.trim_end_matches('/'))
            .filter(|rest| rest.split('/').count() == 2 && !rest.contains(".."))
            .ok_or_else(|| {
                CollageError::invalid_config(format!(
                    "Unsupported model URL '{}'. Expected {}<org>/<repo>",
                    url, HUGGINGFACE_PREFIX
                ))
            })?;
        Ok(repo.replace('/', "--"))
    }

    /// Local path of the ONNX file for `source`, downloading it if necessary
    pub async fn resolve(&self, source: &str) -> Result<PathBuf> {
        let local = Path::new(source);
        if local.is_file() {
            return Ok(local.to_path_buf());
        }
        if local.is_dir() {
            for candidate in [local.join(REPOSITORY_MODEL_FILE), local.join("model.onnx")] {
                if candidate.is_file() {
                    return Ok(candidate);
                }
            }
            return Err(CollageError::model(format!(
                "No model.onnx found in directory '{}'",
                local.display()
            )));
        }

        let model_id = Self::url_to_model_id(source)?;
        let target = self.cache_dir.join(format!("{}.onnx", model_id));

        if self.is_cached(&target).await {
            debug!(model_id = %model_id, "💾 Model cache hit");
            return Ok(target);
        }

        let url = format!(
            "{}/resolve/main/{}",
            source.trim_end_matches('/'),
            REPOSITORY_MODEL_FILE
        );
        self.download(&url, &target).await?;
        Ok(target)
    }

    async fn is_cached(&self, path: &Path) -> bool {
        let Ok(expected) = tokio::fs::read_to_string(checksum_path(path)).await else {
            return false;
        };
        match tokio::fs::read(path).await {
            Ok(bytes) => {
                let matches = sha256_hex(&bytes) == expected.trim();
                if !matches {
                    warn!("⚠️ Cached model {} failed checksum, re-downloading", path.display());
                }
                matches
            },
            Err(_) => false,
        }
    }

    /// Stream `url` into `target` through a temporary file, then record its digest
    async fn download(&self, url: &str, target: &Path) -> Result<()> {
        info!("📥 Downloading model from {}", url);
        tokio::fs::create_dir_all(&self.cache_dir)
            .await
            .map_err(|e| {
                CollageError::file_io_error("create cache directory", &self.cache_dir, &e)
            })?;

        let mut response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| CollageError::network_error(format!("Failed to download {}", url), e))?;
        if !response.status().is_success() {
            return Err(CollageError::Network(format!(
                "HTTP error {} for {}",
                response.status(),
                url
            )));
        }

        let partial = target.with_extension("onnx.part");
        let mut file = tokio::fs::File::create(&partial)
            .await
            .map_err(|e| CollageError::file_io_error("create file", &partial, &e))?;
        let mut hasher = Sha256::new();
        let mut downloaded = 0u64;
        let total = response.content_length();

        while let Some(chunk) = response
            .chunk()
            .await
            .map_err(|e| CollageError::network_error("Failed to read download stream", e))?
        {
            hasher.update(&chunk);
            file.write_all(&chunk)
                .await
                .map_err(|e| CollageError::file_io_error("write to file", &partial, &e))?;
            downloaded += chunk.len() as u64;
            debug!(downloaded, total = ?total, "📥 Download progress");
        }
        file.flush()
            .await
            .map_err(|e| CollageError::file_io_error("flush file", &partial, &e))?;
        drop(file);

        tokio::fs::rename(&partial, target)
            .await
            .map_err(|e| CollageError::file_io_error("move downloaded model", target, &e))?;
        let digest = format!("{:x}", hasher.finalize());
        tokio::fs::write(checksum_path(target), &digest)
            .await
            .map_err(|e| CollageError::file_io_error("write checksum", target, &e))?;

        info!("✅ Model cached at {} ({} bytes)", target.display(), downloaded);
        Ok(())
    }
}

fn checksum_path(model: &Path) -> PathBuf {
    let mut name = model.as_os_str().to_owned();
    name.push(".sha256");
    PathBuf::from(name)
}

fn sha256_hex(bytes: &[u8]) -> String {
    format!("{:x}", Sha256::digest(bytes))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_url_to_model_id() {
        assert_eq!(
            ModelStore::url_to_model_id("https://huggingface.co/imgly/isnet-general-onnx").unwrap(),
            "imgly--isnet-general-onnx"
        );
        let trailing_slash = "https://huggingface.co/imgly/isnet-general-onnx/";
        assert_eq!(
            ModelStore::url_to_model_id(trailing_slash).unwrap(),
            "imgly--isnet-general-onnx"
        );
        assert!(ModelStore::url_to_model_id("https://example.com/model").is_err());
        assert!(ModelStore::url_to_model_id("https://huggingface.co/only-org").is_err());
    }

    #[tokio::test]
    async fn test_resolve_local_file_and_directory() {
        let dir = tempfile::tempdir().unwrap();
        let store = ModelStore::with_cache_dir(dir.path().join("cache")).unwrap();

        let file = dir.path().join("custom.onnx");
        std::fs::write(&file, b"onnx").unwrap();
        assert_eq!(store.resolve(file.to_str().unwrap()).await.unwrap(), file);

        let repo = dir.path().join("repo");
        std::fs::create_dir_all(repo.join("onnx")).unwrap();
        std::fs::write(repo.join("onnx/model.onnx"), b"onnx").unwrap();
        assert_eq!(
            store.resolve(repo.to_str().unwrap()).await.unwrap(),
            repo.join("onnx/model.onnx")
        );

        let empty = dir.path().join("empty");
        std::fs::create_dir_all(&empty).unwrap();
        assert!(store.resolve(empty.to_str().unwrap()).await.is_err());
    }

    #[tokio::test]
    async fn test_cached_model_requires_matching_checksum() {
        let dir = tempfile::tempdir().unwrap();
        let store = ModelStore::with_cache_dir(dir.path()).unwrap();
        let model = dir.path().join("imgly--isnet-general-onnx.onnx");
        std::fs::write(&model, b"weights").unwrap();

        assert!(!store.is_cached(&model).await);

        std::fs::write(checksum_path(&model), sha256_hex(b"weights")).unwrap();
        assert!(store.is_cached(&model).await);
        assert_eq!(
            store
                .resolve("https://huggingface.co/imgly/isnet-general-onnx")
                .await
                .unwrap(),
            model
        );

        std::fs::write(checksum_path(&model), sha256_hex(b"other")).unwrap();
        assert!(!store.is_cached(&model).await);
    }
}
