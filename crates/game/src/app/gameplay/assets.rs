use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use engine::{load_image, load_images, validate_asset_key, AssetKeyError, ImageLoadError, Sprite};
use thiserror::Error;
use tracing::info;

use super::animation::{Animation, AnimationLibrary, DEFAULT_IMAGE_DURATION};
use super::tilemap::TileKind;

/// Tile kinds drawn by the game. Spawners are markers and never rendered.
const RENDERED_TILE_KINDS: [TileKind; 4] = [
    TileKind::Decor,
    TileKind::Grass,
    TileKind::LargeDecor,
    TileKind::Stone,
];

struct AnimationAsset {
    key: &'static str,
    dir: &'static str,
    image_duration: u32,
    looping: bool,
}

const ANIMATION_ASSETS: [AnimationAsset; 9] = [
    AnimationAsset {
        key: "enemy/idle",
        dir: "entities/enemy/idle",
        image_duration: 6,
        looping: true,
    },
    AnimationAsset {
        key: "enemy/run",
        dir: "entities/enemy/run",
        image_duration: 4,
        looping: true,
    },
    AnimationAsset {
        key: "player/idle",
        dir: "entities/player/idle",
        image_duration: 6,
        looping: true,
    },
    AnimationAsset {
        key: "player/run",
        dir: "entities/player/run",
        image_duration: 4,
        looping: true,
    },
    AnimationAsset {
        key: "player/jump",
        dir: "entities/player/jump",
        image_duration: DEFAULT_IMAGE_DURATION,
        looping: true,
    },
    AnimationAsset {
        key: "player/slide",
        dir: "entities/player/slide",
        image_duration: DEFAULT_IMAGE_DURATION,
        looping: true,
    },
    AnimationAsset {
        key: "player/wall_slide",
        dir: "entities/player/wall_slide",
        image_duration: DEFAULT_IMAGE_DURATION,
        looping: true,
    },
    AnimationAsset {
        key: "particle/leaf",
        dir: "particles/leaf",
        image_duration: 20,
        looping: false,
    },
    AnimationAsset {
        key: "particle/particle",
        dir: "particles/particle",
        image_duration: 6,
        looping: false,
    },
];

#[derive(Debug, Error)]
pub(crate) enum AssetError {
    #[error("invalid asset key {key:?}: {source}")]
    Key {
        key: String,
        #[source]
        source: AssetKeyError,
    },
    #[error("failed to load asset {key:?}: {source}")]
    Image {
        key: String,
        #[source]
        source: ImageLoadError,
    },
}

/// Variant sprites for each tile kind.
#[derive(Debug, Default)]
pub(crate) struct TileSet {
    variants: HashMap<TileKind, Vec<Sprite>>,
}

impl TileSet {
    pub(crate) fn insert(&mut self, kind: TileKind, variants: Vec<Sprite>) {
        self.variants.insert(kind, variants);
    }

    pub(crate) fn sprite(&self, kind: TileKind, variant: u32) -> Option<&Sprite> {
        self.variants.get(&kind)?.get(variant as usize)
    }

    pub(crate) fn variant_count(&self, kind: TileKind) -> usize {
        self.variants.get(&kind).map_or(0, Vec::len)
    }
}

/// Everything the game draws, decoded once at startup.
#[derive(Debug)]
pub(crate) struct GameAssets {
    pub tiles: TileSet,
    pub background: Sprite,
    pub clouds: Vec<Sprite>,
    pub gun: Sprite,
    pub projectile: Sprite,
    pub animations: AnimationLibrary,
}

impl GameAssets {
    pub(crate) fn load(images_dir: &Path) -> Result<Self, AssetError> {
        let loader = AssetLoader { images_dir };

        let mut tiles = TileSet::default();
        for kind in RENDERED_TILE_KINDS {
            let key = format!("tiles/{}", kind.as_str());
            tiles.insert(kind, loader.images(&key)?);
        }

        let mut animations = AnimationLibrary::default();
        for asset in &ANIMATION_ASSETS {
            let images: Rc<[Sprite]> = loader.images(asset.dir)?.into();
            animations.insert(
                asset.key,
                Animation::new(images, asset.image_duration, asset.looping),
            );
        }

        let assets = Self {
            tiles,
            background: loader.image("background.png")?,
            clouds: loader.images("clouds")?,
            gun: loader.image("gun.png")?,
            projectile: loader.image("projectile.png")?,
            animations,
        };

        info!(
            images_dir = %images_dir.display(),
            stone_variants = assets.tiles.variant_count(TileKind::Stone),
            animations = assets.animations.len(),
            clouds = assets.clouds.len(),
            "assets_loaded"
        );
        Ok(assets)
    }
}

struct AssetLoader<'a> {
    images_dir: &'a Path,
}

impl AssetLoader<'_> {
    fn resolve(&self, key: &str) -> Result<PathBuf, AssetError> {
        validate_asset_key(key).map_err(|source| AssetError::Key {
            key: key.to_string(),
            source,
        })?;
        Ok(self.images_dir.join(key))
    }

    fn image(&self, key: &str) -> Result<Sprite, AssetError> {
        let path = self.resolve(key)?;
        load_image(&path).map_err(|source| AssetError::Image {
            key: key.to_string(),
            source,
        })
    }

    fn images(&self, key: &str) -> Result<Vec<Sprite>, AssetError> {
        let path = self.resolve(key)?;
        load_images(&path).map_err(|source| AssetError::Image {
            key: key.to_string(),
            source,
        })
    }
}

#[cfg(test)]
impl GameAssets {
    /// Small solid-colour stand-ins for every asset the game draws.
    pub(crate) fn placeholder() -> Self {
        let mut tiles = TileSet::default();
        for kind in RENDERED_TILE_KINDS {
            tiles.insert(
                kind,
                (0..9).map(|_| Sprite::solid(16, 16, [90, 120, 60, 255])).collect(),
            );
        }

        let mut animations = AnimationLibrary::default();
        for asset in &ANIMATION_ASSETS {
            let images: Rc<[Sprite]> = (0..4)
                .map(|_| Sprite::solid(14, 18, [200, 200, 220, 255]))
                .collect::<Vec<_>>()
                .into();
            animations.insert(
                asset.key,
                Animation::new(images, asset.image_duration, asset.looping),
            );
        }

        Self {
            tiles,
            background: Sprite::solid(320, 240, [20, 24, 40, 255]),
            clouds: vec![Sprite::solid(40, 12, [230, 230, 240, 255])],
            gun: Sprite::solid(7, 3, [60, 60, 60, 255]),
            projectile: Sprite::solid(4, 2, [255, 255, 0, 255]),
            animations,
        }
    }
}
