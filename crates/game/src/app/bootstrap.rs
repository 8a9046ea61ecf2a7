use std::path::Path;

use engine::{resolve_app_paths, AppPaths, LoopConfig, Scene, StartupError};
use rand::rngs::StdRng;
use rand::SeedableRng;
use thiserror::Error;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use super::gameplay::{
    level_path, AssetError, CatalogError, GameAssets, GameWorld, LevelCatalog, LevelError,
    Tilemap, TracingAudio,
};

pub(crate) const LEVEL_ENV_VAR: &str = "SHADOW_STRIKE_LEVEL";
pub(crate) const SEED_ENV_VAR: &str = "SHADOW_STRIKE_SEED";
const AUTOTILE_COMMAND: &str = "autotile";

#[derive(Debug, Error)]
pub(crate) enum BootstrapError {
    #[error(transparent)]
    Startup(#[from] StartupError),
    #[error("failed to load game assets: {0}")]
    Assets(#[from] AssetError),
    #[error(transparent)]
    Catalog(#[from] CatalogError),
    #[error(transparent)]
    Level(#[from] LevelError),
    #[error("usage: shadow_strike [autotile <level>] (got: {0})")]
    Usage(String),
}

/// What the binary was asked to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Command {
    Play,
    /// Rewrites one level file with autotiled variants.
    Autotile { level: usize },
}

pub(crate) fn parse_command(args: &[String]) -> Result<Command, BootstrapError> {
    match args {
        [] => Ok(Command::Play),
        [command, level] if command == AUTOTILE_COMMAND => level
            .parse()
            .map(|level| Command::Autotile { level })
            .map_err(|_| BootstrapError::Usage(args.join(" "))),
        _ => Err(BootstrapError::Usage(args.join(" "))),
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct GameConfig {
    pub start_level: usize,
    pub seed: u64,
}

impl GameConfig {
    pub(crate) fn from_env() -> Self {
        let start_level = parse_start_level(std::env::var(LEVEL_ENV_VAR).ok().as_deref());
        let seed = parse_seed(std::env::var(SEED_ENV_VAR).ok().as_deref())
            .unwrap_or_else(rand::random);
        Self { start_level, seed }
    }
}

fn parse_start_level(raw: Option<&str>) -> usize {
    let Some(raw) = raw else {
        return 0;
    };
    match raw.trim().parse::<usize>() {
        Ok(level) => level,
        Err(_) => {
            warn!(
                var = LEVEL_ENV_VAR,
                value = raw,
                "invalid start level; expected a non-negative integer, using 0"
            );
            0
        }
    }
}

fn parse_seed(raw: Option<&str>) -> Option<u64> {
    let raw = raw?;
    match raw.trim().parse::<u64>() {
        Ok(seed) => Some(seed),
        Err(_) => {
            warn!(
                var = SEED_ENV_VAR,
                value = raw,
                "invalid seed; expected an unsigned integer, using a random seed"
            );
            None
        }
    }
}

pub(crate) struct AppWiring {
    pub(crate) config: LoopConfig,
    pub(crate) scene: Box<dyn Scene>,
}

pub(crate) fn build_app() -> Result<AppWiring, BootstrapError> {
    let paths = resolve_app_paths()?;
    let game = GameConfig::from_env();
    info!(
        root = %paths.root.display(),
        data_dir = %paths.data_dir.display(),
        start_level = game.start_level,
        seed = game.seed,
        "startup_paths"
    );

    let config = LoopConfig::default();
    let world = build_world(&paths, &game, (config.canvas_width, config.canvas_height))?;

    Ok(AppWiring {
        config,
        scene: Box::new(world),
    })
}

fn build_world(
    paths: &AppPaths,
    game: &GameConfig,
    view: (u32, u32),
) -> Result<GameWorld, BootstrapError> {
    let assets = GameAssets::load(&paths.images_dir())?;
    let catalog = LevelCatalog::load(&paths.maps_dir())?;
    catalog.validate(&assets.tiles)?;

    Ok(GameWorld::new(
        assets,
        catalog,
        game.start_level,
        StdRng::seed_from_u64(game.seed),
        Box::new(TracingAudio),
        view,
    ))
}

pub(crate) fn run_autotile(level: usize) -> Result<(), BootstrapError> {
    let paths = resolve_app_paths()?;
    autotile_level(&paths.maps_dir(), level)
}

fn autotile_level(maps_dir: &Path, level: usize) -> Result<(), BootstrapError> {
    let path = level_path(maps_dir, level);
    let mut tilemap = Tilemap::default();
    tilemap.load(&path)?;
    tilemap.autotile();
    tilemap.save(&path)?;
    info!(level, path = %path.display(), tiles = tilemap.tile_count(), "level_autotiled");
    Ok(())
}

pub(crate) fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .compact()
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(raw: &[&str]) -> Vec<String> {
        raw.iter().map(ToString::to_string).collect()
    }

    #[test]
    fn no_arguments_means_play() {
        assert_eq!(parse_command(&[]).expect("command"), Command::Play);
    }

    #[test]
    fn autotile_command_takes_a_level_index() {
        assert_eq!(
            parse_command(&args(&["autotile", "3"])).expect("command"),
            Command::Autotile { level: 3 }
        );
        assert!(matches!(
            parse_command(&args(&["autotile", "three"])),
            Err(BootstrapError::Usage(_))
        ));
        assert!(matches!(
            parse_command(&args(&["jump"])),
            Err(BootstrapError::Usage(_))
        ));
    }

    #[test]
    fn env_values_fall_back_when_invalid() {
        assert_eq!(parse_start_level(None), 0);
        assert_eq!(parse_start_level(Some(" 2 ")), 2);
        assert_eq!(parse_start_level(Some("-1")), 0);
        assert_eq!(parse_seed(Some("42")), Some(42));
        assert_eq!(parse_seed(Some("forty-two")), None);
        assert_eq!(parse_seed(None), None);
    }

    #[test]
    fn autotile_rewrites_level_file_in_place() {
        let temp = tempfile::tempdir().expect("tempdir");
        let path = level_path(temp.path(), 0);
        let tiles = (0..3)
            .flat_map(|x| (0..2).map(move |y| (x, y)))
            .map(|(x, y)| format!(r#""{x};{y}": {{"type": "grass", "variant": 5, "pos": [{x}, {y}]}}"#))
            .collect::<Vec<_>>()
            .join(",");
        std::fs::write(
            &path,
            format!(r#"{{"tilemap": {{{tiles}}}, "tile_size": 16, "offgrid": []}}"#),
        )
        .expect("write level");

        autotile_level(temp.path(), 0).expect("autotile");

        let saved = Tilemap::read(&path).expect("read back");
        let variants: Vec<u32> = saved
            .used_tile_ids()
            .into_iter()
            .map(|(_, variant)| variant)
            .collect();
        assert_eq!(variants, vec![0, 1, 2, 4, 5, 6]);
    }

    #[test]
    fn autotile_of_missing_level_is_an_error() {
        let temp = tempfile::tempdir().expect("tempdir");
        assert!(matches!(
            autotile_level(temp.path(), 4),
            Err(BootstrapError::Level(LevelError::Read { .. }))
        ));
    }
}
