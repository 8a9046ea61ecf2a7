use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::info;

use super::assets::TileSet;
use super::tilemap::{LevelError, TileKind, Tilemap};

#[derive(Debug, Error)]
pub(crate) enum CatalogError {
    #[error("no levels found in {dir}; expected 0.json, 1.json, ...")]
    Empty { dir: PathBuf },
    #[error("level {index} ({path}) failed to load: {source}")]
    Level {
        index: usize,
        path: PathBuf,
        #[source]
        source: LevelError,
    },
    #[error("level {index} uses {kind:?} variant {variant}, which has no sprite")]
    MissingTileSprite {
        index: usize,
        kind: TileKind,
        variant: u32,
    },
}

/// Every level of the game, parsed up front. Level `n` is `<dir>/<n>.json`;
/// numbering stops at the first missing index.
#[derive(Debug, Clone)]
pub(crate) struct LevelCatalog {
    dir: PathBuf,
    levels: Vec<Tilemap>,
}

impl LevelCatalog {
    pub(crate) fn load(dir: &Path) -> Result<Self, CatalogError> {
        let mut levels = Vec::new();
        loop {
            let path = level_path(dir, levels.len());
            if !path.is_file() {
                break;
            }
            let tilemap = Tilemap::read(&path).map_err(|source| CatalogError::Level {
                index: levels.len(),
                path: path.clone(),
                source,
            })?;
            levels.push(tilemap);
        }

        if levels.is_empty() {
            return Err(CatalogError::Empty {
                dir: dir.to_path_buf(),
            });
        }
        info!(dir = %dir.display(), levels = levels.len(), "level_catalog_loaded");
        Ok(Self {
            dir: dir.to_path_buf(),
            levels,
        })
    }

    pub(crate) fn from_levels(dir: PathBuf, levels: Vec<Tilemap>) -> Self {
        Self { dir, levels }
    }

    /// Fails on the first drawn tile whose variant has no sprite.
    pub(crate) fn validate(&self, tiles: &TileSet) -> Result<(), CatalogError> {
        for (index, level) in self.levels.iter().enumerate() {
            for (kind, variant) in level.used_tile_ids() {
                if kind == TileKind::Spawners {
                    continue;
                }
                if tiles.sprite(kind, variant).is_none() {
                    return Err(CatalogError::MissingTileSprite {
                        index,
                        kind,
                        variant,
                    });
                }
            }
        }
        Ok(())
    }

    pub(crate) fn len(&self) -> usize {
        self.levels.len()
    }

    pub(crate) fn last_index(&self) -> usize {
        self.levels.len().saturating_sub(1)
    }

    /// A fresh copy of level `index`, clamped to the last level.
    pub(crate) fn level(&self, index: usize) -> Option<Tilemap> {
        self.levels.get(index.min(self.last_index())).cloned()
    }

    pub(crate) fn path(&self, index: usize) -> PathBuf {
        level_path(&self.dir, index)
    }
}

pub(crate) fn level_path(dir: &Path, index: usize) -> PathBuf {
    dir.join(format!("{index}.json"))
}
