//! JSON description of a whole collage
//!
//! A manifest lists everything the interactive flow would collect: the user
//! name, uploaded photos, search keywords, stickers and optional pinned
//! placements. Relative photo paths are resolved against the manifest's
//! directory.
//!
//! ```json
//! {
//!   "user_name": "minji",
//!   "photos": ["cat.jpg"],
//!   "keywords": "IU, Hanni",
//!   "stickers": ["heart", "🔥"],
//!   "placements": [{ "layer": 1, "x": 40, "y": 60, "width": 420 }],
//!   "config": { "seed": 7 }
//! }
//! ```

use crate::{
    config::CollageConfig,
    error::{CollageError, Result},
    item::Placement,
    search::parse_keywords,
    session::CollageSession,
    sticker::Sticker,
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Keywords as a list or as one comma separated string
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum KeywordList {
    Joined(String),
    List(Vec<String>),
}

impl Default for KeywordList {
    fn default() -> Self {
        Self::List(Vec::new())
    }
}

impl KeywordList {
    /// Trimmed, non-empty keywords in order
    #[must_use]
    pub fn keywords(&self) -> Vec<String> {
        match self {
            Self::Joined(joined) => parse_keywords(joined),
            Self::List(list) => list.iter().flat_map(|k| parse_keywords(k)).collect(),
        }
    }
}

/// Explicit placement for one declared source, numbered from 1
///
/// Sources count photos first, then keywords, then stickers, in the order the
/// manifest lists them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayerPlacement {
    pub layer: usize,
    #[serde(flatten)]
    pub placement: Placement,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CollageManifest {
    pub user_name: String,
    #[serde(default)]
    pub photos: Vec<PathBuf>,
    #[serde(default)]
    pub keywords: KeywordList,
    /// Sticker names or emoji
    #[serde(default)]
    pub stickers: Vec<String>,
    #[serde(default)]
    pub placements: Vec<LayerPlacement>,
    /// Overrides for the collage configuration
    #[serde(default)]
    pub config: Option<CollageConfig>,
}

impl CollageManifest {
    /// Read a manifest and resolve its photo paths
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|e| CollageError::file_io_error("read manifest", path, &e))?;
        let mut manifest = Self::from_json_str(&content)?;

        if let Some(base) = path.parent() {
            for photo in &mut manifest.photos {
                if photo.is_relative() {
                    *photo = base.join(&*photo);
                }
            }
        }
        Ok(manifest)
    }

    /// Parse and validate manifest JSON
    pub fn from_json_str(json: &str) -> Result<Self> {
        let manifest: Self = serde_json::from_str(json)
            .map_err(|e| CollageError::invalid_config(format!("invalid manifest: {}", e)))?;
        manifest.validate()?;
        Ok(manifest)
    }

    pub fn validate(&self) -> Result<()> {
        if self.user_name.trim().is_empty() {
            return Err(CollageError::invalid_input("manifest user_name is empty"));
        }
        self.sticker_list()?;
        let declared = self.declared_layers();
        for entry in &self.placements {
            if entry.layer == 0 || entry.layer > declared {
                return Err(CollageError::config_value_error(
                    "placement layer",
                    entry.layer,
                    &format!("1..={}", declared),
                ));
            }
            entry.placement.validate()?;
        }
        if let Some(config) = &self.config {
            config.validate()?;
        }
        Ok(())
    }

    pub fn sticker_list(&self) -> Result<Vec<Sticker>> {
        self.stickers.iter().map(|s| s.parse()).collect()
    }

    /// Number of layers the manifest asks for: photos, keywords and stickers
    #[must_use]
    pub fn declared_layers(&self) -> usize {
        self.photos.len() + self.keywords.keywords().len() + self.stickers.len()
    }

    /// Pin placements through `layers`, which maps each declared source to the
    /// session index it became (`None` when its import failed)
    ///
    /// Returns the layer numbers that were skipped.
    pub fn apply_placements(
        &self,
        session: &mut CollageSession,
        layers: &[Option<usize>],
    ) -> Vec<usize> {
        let mut skipped = Vec::new();
        for entry in &self.placements {
            let target = entry
                .layer
                .checked_sub(1)
                .and_then(|declared| layers.get(declared).copied().flatten());
            let applied = match target {
                Some(index) => match session.set_placement(index, Some(entry.placement)) {
                    Ok(()) => true,
                    Err(e) => {
                        warn!(layer = entry.layer, "⚠️ Placement not applied: {}", e);
                        false
                    },
                },
                None => {
                    debug!(layer = entry.layer, "No imported layer for placement");
                    false
                },
            };
            if !applied {
                skipped.push(entry.layer);
            }
        }
        skipped
    }
}
