mod animation;
mod assets;
mod audio;
mod effects;
mod enemy;
mod entity;
mod levels;
mod player;
mod projectile;
mod scene_impl;
mod tilemap;
mod world;


pub(crate) use assets::{AssetError, GameAssets};
pub(crate) use audio::TracingAudio;
pub(crate) use levels::{level_path, CatalogError, LevelCatalog};
pub(crate) use tilemap::{LevelError, Tilemap};
pub(crate) use world::GameWorld;
