use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use engine::{write_text_atomic, Canvas, Vec2};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::assets::TileSet;

pub(crate) const DEFAULT_TILE_SIZE: u32 = 16;

/// Fixed query order for the 3x3 neighbourhood around a cell.
const NEIGHBOR_OFFSETS: [(i32, i32); 9] = [
    (-1, 0),
    (-1, -1),
    (0, -1),
    (1, -1),
    (1, 0),
    (0, 0),
    (-1, 1),
    (0, 1),
    (1, 1),
];

const AUTOTILE_RIGHT: u8 = 1 << 0;
const AUTOTILE_LEFT: u8 = 1 << 1;
const AUTOTILE_UP: u8 = 1 << 2;
const AUTOTILE_DOWN: u8 = 1 << 3;

const AUTOTILE_SHIFTS: [((i32, i32), u8); 4] = [
    ((1, 0), AUTOTILE_RIGHT),
    ((-1, 0), AUTOTILE_LEFT),
    ((0, -1), AUTOTILE_UP),
    ((0, 1), AUTOTILE_DOWN),
];

/// Same-type neighbour set to variant id. Sets not listed leave the variant alone.
const AUTOTILE_MAP: [(u8, u32); 9] = [
    (AUTOTILE_RIGHT | AUTOTILE_DOWN, 0),
    (AUTOTILE_RIGHT | AUTOTILE_DOWN | AUTOTILE_LEFT, 1),
    (AUTOTILE_LEFT | AUTOTILE_DOWN, 2),
    (AUTOTILE_LEFT | AUTOTILE_UP | AUTOTILE_DOWN, 3),
    (AUTOTILE_LEFT | AUTOTILE_UP, 4),
    (AUTOTILE_LEFT | AUTOTILE_UP | AUTOTILE_RIGHT, 5),
    (AUTOTILE_RIGHT | AUTOTILE_UP, 6),
    (AUTOTILE_RIGHT | AUTOTILE_UP | AUTOTILE_DOWN, 7),
    (
        AUTOTILE_RIGHT | AUTOTILE_LEFT | AUTOTILE_UP | AUTOTILE_DOWN,
        8,
    ),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub(crate) enum TileKind {
    Grass,
    Stone,
    Decor,
    LargeDecor,
    Spawners,
}

impl TileKind {
    pub(crate) fn as_str(self) -> &'static str {
        match self {
            TileKind::Grass => "grass",
            TileKind::Stone => "stone",
            TileKind::Decor => "decor",
            TileKind::LargeDecor => "large_decor",
            TileKind::Spawners => "spawners",
        }
    }

    pub(crate) fn is_physics(self) -> bool {
        matches!(self, TileKind::Grass | TileKind::Stone)
    }

    pub(crate) fn is_autotile(self) -> bool {
        matches!(self, TileKind::Grass | TileKind::Stone)
    }
}

/// Integer cell coordinate. Serialized as `"x;y"` in level files.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub(crate) struct GridPos {
    pub x: i32,
    pub y: i32,
}

impl GridPos {
    pub(crate) const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Cell containing the pixel position (floor division).
    pub(crate) fn containing(pos: Vec2, tile_size: u32) -> Self {
        let size = tile_size as f64;
        Self::new((pos.x / size).floor() as i32, (pos.y / size).floor() as i32)
    }

    /// `None` when the neighbour would fall outside the i32 grid.
    pub(crate) fn offset(self, dx: i32, dy: i32) -> Option<Self> {
        Some(Self::new(self.x.checked_add(dx)?, self.y.checked_add(dy)?))
    }

    pub(crate) fn to_key(self) -> String {
        format!("{};{}", self.x, self.y)
    }

    pub(crate) fn parse_key(key: &str) -> Option<Self> {
        let (x, y) = key.split_once(';')?;
        Some(Self::new(parse_key_component(x)?, parse_key_component(y)?))
    }
}

impl fmt::Display for GridPos {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{};{}", self.x, self.y)
    }
}

/// Plain decimal: optional `-`, digits, no leading zeros, no `+`.
fn parse_key_component(raw: &str) -> Option<i32> {
    let digits = raw.strip_prefix('-').unwrap_or(raw);
    if digits.is_empty() || !digits.bytes().all(|byte| byte.is_ascii_digit()) {
        return None;
    }
    if digits.len() > 1 && digits.starts_with('0') {
        return None;
    }
    if raw == "-0" {
        return None;
    }
    raw.parse().ok()
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct Rect {
    pub x: f64,
    pub y: f64,
    pub w: f64,
    pub h: f64,
}

impl Rect {
    pub(crate) const fn new(x: f64, y: f64, w: f64, h: f64) -> Self {
        Self { x, y, w, h }
    }

    pub(crate) fn right(&self) -> f64 {
        self.x + self.w
    }

    pub(crate) fn bottom(&self) -> f64 {
        self.y + self.h
    }

    pub(crate) fn center(&self) -> Vec2 {
        Vec2::new(self.x + self.w / 2.0, self.y + self.h / 2.0)
    }

    pub(crate) fn area(&self) -> f64 {
        self.w * self.h
    }

    /// Strict overlap; rectangles that only share an edge do not collide.
    pub(crate) fn overlaps(&self, other: &Rect) -> bool {
        self.x < other.right()
            && other.x < self.right()
            && self.y < other.bottom()
            && other.y < self.bottom()
    }

    /// Half-open containment: left/top edges inside, right/bottom outside.
    pub(crate) fn contains(&self, point: Vec2) -> bool {
        point.x >= self.x && point.x < self.right() && point.y >= self.y && point.y < self.bottom()
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct Tile {
    pub kind: TileKind,
    pub variant: u32,
    pub pos: GridPos,
}

/// A tile at a pixel position: off-grid decoration, or an extracted marker.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct PlacedTile {
    pub kind: TileKind,
    pub variant: u32,
    pub pos: Vec2,
}

#[derive(Debug, Error)]
pub(crate) enum LevelError {
    #[error("failed to read level file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to write level file {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("invalid level json at {json_path}: {source}")]
    Parse {
        json_path: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("failed to encode level json: {0}")]
    Encode(#[source] serde_json::Error),
    #[error("invalid tile key {key:?}; expected \"<x>;<y>\"")]
    InvalidKey { key: String },
    #[error("tile key {key:?} does not match tile position {pos}")]
    KeyMismatch { key: String, pos: GridPos },
    #[error("tile_size must be positive")]
    InvalidTileSize,
}

#[derive(Debug, Serialize, Deserialize)]
struct LevelFile {
    tilemap: BTreeMap<String, GridTileRecord>,
    tile_size: u32,
    offgrid: Vec<OffgridTileRecord>,
}

#[derive(Debug, Serialize, Deserialize)]
struct GridTileRecord {
    #[serde(rename = "type")]
    kind: TileKind,
    variant: u32,
    pos: [i32; 2],
}

#[derive(Debug, Serialize, Deserialize)]
struct OffgridTileRecord {
    #[serde(rename = "type")]
    kind: TileKind,
    variant: u32,
    pos: [f64; 2],
}

/// Sparse tile grid plus free-standing decorations.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Tilemap {
    tile_size: u32,
    grid: HashMap<GridPos, Tile>,
    offgrid: Vec<PlacedTile>,
}

impl Default for Tilemap {
    fn default() -> Self {
        Self::new(DEFAULT_TILE_SIZE)
    }
}

impl Tilemap {
    pub(crate) fn new(tile_size: u32) -> Self {
        Self {
            tile_size: tile_size.max(1),
            grid: HashMap::new(),
            offgrid: Vec::new(),
        }
    }

    #[cfg(test)]
    pub(crate) fn tile_size(&self) -> u32 {
        self.tile_size
    }

    /// Places `tile` at its own position, replacing any previous occupant.
    pub(crate) fn insert(&mut self, tile: Tile) {
        self.grid.insert(tile.pos, tile);
    }

    pub(crate) fn insert_offgrid(&mut self, tile: PlacedTile) {
        self.offgrid.push(tile);
    }

    pub(crate) fn tile_at(&self, pos: GridPos) -> Option<&Tile> {
        self.grid.get(&pos)
    }

    pub(crate) fn tile_count(&self) -> usize {
        self.grid.len()
    }

    #[cfg(test)]
    pub(crate) fn offgrid(&self) -> &[PlacedTile] {
        &self.offgrid
    }

    /// Tiles in the 3x3 block around the cell containing `pos`.
    pub(crate) fn tiles_around(&self, pos: Vec2) -> Vec<&Tile> {
        let cell = GridPos::containing(pos, self.tile_size);
        NEIGHBOR_OFFSETS
            .iter()
            .filter_map(|&(dx, dy)| self.grid.get(&cell.offset(dx, dy)?))
            .collect()
    }

    pub(crate) fn physics_rects_around(&self, pos: Vec2) -> Vec<Rect> {
        self.tiles_around(pos)
            .into_iter()
            .filter(|tile| tile.kind.is_physics())
            .map(|tile| self.cell_rect(tile.pos))
            .collect()
    }

    /// The tile in the exact cell under `pos`, if it blocks movement.
    pub(crate) fn solid_check(&self, pos: Vec2) -> Option<&Tile> {
        self.tile_at(GridPos::containing(pos, self.tile_size))
            .filter(|tile| tile.kind.is_physics())
    }

    fn cell_rect(&self, pos: GridPos) -> Rect {
        let size = self.tile_size as f64;
        Rect::new(pos.x as f64 * size, pos.y as f64 * size, size, size)
    }

    /// Returns every tile matching one of `id_pairs`, with grid tiles
    /// converted to pixel positions. Matches are removed unless `keep`.
    ///
    /// Off-grid matches come first in list order, then grid matches in
    /// ascending cell order.
    pub(crate) fn extract(&mut self, id_pairs: &[(TileKind, u32)], keep: bool) -> Vec<PlacedTile> {
        let matches_pair =
            |kind: TileKind, variant: u32| id_pairs.iter().any(|&pair| pair == (kind, variant));

        let mut matches: Vec<PlacedTile> = self
            .offgrid
            .iter()
            .filter(|tile| matches_pair(tile.kind, tile.variant))
            .copied()
            .collect();
        if !keep {
            self.offgrid
                .retain(|tile| !matches_pair(tile.kind, tile.variant));
        }

        let mut cells: Vec<GridPos> = self
            .grid
            .values()
            .filter(|tile| matches_pair(tile.kind, tile.variant))
            .map(|tile| tile.pos)
            .collect();
        cells.sort_unstable();

        let size = self.tile_size as f64;
        for cell in cells {
            let tile = if keep {
                self.grid.get(&cell).copied()
            } else {
                self.grid.remove(&cell)
            };
            if let Some(tile) = tile {
                matches.push(PlacedTile {
                    kind: tile.kind,
                    variant: tile.variant,
                    pos: Vec2::new(cell.x as f64 * size, cell.y as f64 * size),
                });
            }
        }

        matches
    }

    /// Recomputes variants of auto-tileable tiles from their same-type
    /// axis neighbours.
    pub(crate) fn autotile(&mut self) {
        let updates: Vec<(GridPos, u32)> = self
            .grid
            .values()
            .filter(|tile| tile.kind.is_autotile())
            .filter_map(|tile| {
                let neighbors = AUTOTILE_SHIFTS
                    .iter()
                    .filter(|((dx, dy), _)| {
                        tile.pos
                            .offset(*dx, *dy)
                            .and_then(|pos| self.grid.get(&pos))
                            .is_some_and(|neighbor| neighbor.kind == tile.kind)
                    })
                    .fold(0u8, |mask, (_, bit)| mask | bit);
                AUTOTILE_MAP
                    .iter()
                    .find(|(mask, _)| *mask == neighbors)
                    .map(|&(_, variant)| (tile.pos, variant))
            })
            .collect();

        for (pos, variant) in updates {
            if let Some(tile) = self.grid.get_mut(&pos) {
                tile.variant = variant;
            }
        }
    }

    /// Draws off-grid tiles, then only the grid cells visible from `offset`.
    pub(crate) fn render(&self, canvas: &mut Canvas, tiles: &TileSet, offset: (i32, i32)) {
        for tile in &self.offgrid {
            if let Some(sprite) = tiles.sprite(tile.kind, tile.variant) {
                canvas.blit(
                    sprite,
                    (tile.pos.x - offset.0 as f64).floor() as i32,
                    (tile.pos.y - offset.1 as f64).floor() as i32,
                    false,
                );
            }
        }

        let size = self.tile_size as i32;
        let x_range = offset.0.div_euclid(size)..=(offset.0 + canvas.width() as i32).div_euclid(size);
        let y_range =
            offset.1.div_euclid(size)..=(offset.1 + canvas.height() as i32).div_euclid(size);
        for x in x_range {
            for y in y_range.clone() {
                let Some(tile) = self.grid.get(&GridPos::new(x, y)) else {
                    continue;
                };
                if let Some(sprite) = tiles.sprite(tile.kind, tile.variant) {
                    canvas.blit(sprite, x * size - offset.0, y * size - offset.1, false);
                }
            }
        }
    }

    /// Every distinct (kind, variant) used by this map.
    pub(crate) fn used_tile_ids(&self) -> Vec<(TileKind, u32)> {
        let mut ids: Vec<(TileKind, u32)> = self
            .grid
            .values()
            .map(|tile| (tile.kind, tile.variant))
            .chain(self.offgrid.iter().map(|tile| (tile.kind, tile.variant)))
            .collect();
        ids.sort_unstable();
        ids.dedup();
        ids
    }

    pub(crate) fn from_json(raw: &str) -> Result<Self, LevelError> {
        let mut deserializer = serde_json::Deserializer::from_str(raw);
        let file: LevelFile = serde_path_to_error::deserialize(&mut deserializer).map_err(|error| {
            let json_path = error.path().to_string();
            LevelError::Parse {
                json_path,
                source: error.into_inner(),
            }
        })?;

        if file.tile_size == 0 {
            return Err(LevelError::InvalidTileSize);
        }

        let mut tilemap = Tilemap::new(file.tile_size);
        for (key, record) in file.tilemap {
            let Some(cell) = GridPos::parse_key(&key) else {
                return Err(LevelError::InvalidKey { key });
            };
            let pos = GridPos::new(record.pos[0], record.pos[1]);
            if pos != cell {
                return Err(LevelError::KeyMismatch { key, pos });
            }
            tilemap.insert(Tile {
                kind: record.kind,
                variant: record.variant,
                pos,
            });
        }
        for record in file.offgrid {
            tilemap.insert_offgrid(PlacedTile {
                kind: record.kind,
                variant: record.variant,
                pos: Vec2::new(record.pos[0], record.pos[1]),
            });
        }

        Ok(tilemap)
    }

    pub(crate) fn to_json(&self) -> Result<String, LevelError> {
        let file = LevelFile {
            tilemap: self
                .grid
                .values()
                .map(|tile| {
                    (
                        tile.pos.to_key(),
                        GridTileRecord {
                            kind: tile.kind,
                            variant: tile.variant,
                            pos: [tile.pos.x, tile.pos.y],
                        },
                    )
                })
                .collect(),
            tile_size: self.tile_size,
            offgrid: self
                .offgrid
                .iter()
                .map(|tile| OffgridTileRecord {
                    kind: tile.kind,
                    variant: tile.variant,
                    pos: [tile.pos.x, tile.pos.y],
                })
                .collect(),
        };
        serde_json::to_string(&file).map_err(LevelError::Encode)
    }

    /// Replaces the whole map with the contents of `path`.
    pub(crate) fn load(&mut self, path: &Path) -> Result<(), LevelError> {
        *self = Self::read(path)?;
        Ok(())
    }

    pub(crate) fn read(path: &Path) -> Result<Self, LevelError> {
        let raw = fs::read_to_string(path).map_err(|source| LevelError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&raw)
    }

    pub(crate) fn save(&self, path: &Path) -> Result<(), LevelError> {
        let json = self.to_json()?;
        write_text_atomic(path, &json).map_err(|source| LevelError::Write {
            path: path.to_path_buf(),
            source,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grass(x: i32, y: i32) -> Tile {
        Tile {
            kind: TileKind::Grass,
            variant: 0,
            pos: GridPos::new(x, y),
        }
    }

    fn tile_of(kind: TileKind, variant: u32, x: i32, y: i32) -> Tile {
        Tile {
            kind,
            variant,
            pos: GridPos::new(x, y),
        }
    }

    #[test]
    fn grid_keys_round_trip_including_negatives() {
        for pos in [GridPos::new(12, -3), GridPos::new(0, 0), GridPos::new(-7, 40)] {
            assert_eq!(GridPos::parse_key(&pos.to_key()), Some(pos));
        }
        assert_eq!(GridPos::new(12, -3).to_key(), "12;-3");
    }

    #[test]
    fn malformed_grid_keys_are_rejected() {
        for key in ["", "1", "1;", ";2", "01;2", "1;+2", "a;b", "1;2;3", "-0;1", "1.5;2"] {
            assert_eq!(GridPos::parse_key(key), None, "key {key:?}");
        }
    }

    #[test]
    fn containing_cell_uses_floor_division() {
        assert_eq!(GridPos::containing(Vec2::new(15.9, 16.0), 16), GridPos::new(0, 1));
        assert_eq!(GridPos::containing(Vec2::new(-0.5, -16.0), 16), GridPos::new(-1, -1));
    }

    #[test]
    fn tiles_around_follows_neighbor_order_and_skips_empty_cells() {
        let mut tilemap = Tilemap::new(16);
        tilemap.insert(grass(1, 1));
        tilemap.insert(grass(0, 1));
        tilemap.insert(grass(2, 2));
        tilemap.insert(grass(5, 5));

        let around: Vec<GridPos> = tilemap
            .tiles_around(Vec2::new(20.0, 20.0))
            .into_iter()
            .map(|tile| tile.pos)
            .collect();

        assert_eq!(
            around,
            vec![GridPos::new(0, 1), GridPos::new(1, 1), GridPos::new(2, 2)]
        );
    }

    #[test]
    fn physics_rects_only_include_solid_tiles() {
        let mut tilemap = Tilemap::new(16);
        tilemap.insert(grass(0, 0));
        tilemap.insert(tile_of(TileKind::Decor, 1, 1, 0));
        tilemap.insert(tile_of(TileKind::Stone, 0, 0, 1));

        let rects = tilemap.physics_rects_around(Vec2::new(8.0, 8.0));

        assert_eq!(
            rects,
            vec![Rect::new(0.0, 0.0, 16.0, 16.0), Rect::new(0.0, 16.0, 16.0, 16.0)]
        );
    }

    #[test]
    fn solid_check_is_exact_cell_and_physics_only() {
        let mut tilemap = Tilemap::new(16);
        tilemap.insert(grass(2, 0));
        tilemap.insert(tile_of(TileKind::Decor, 0, 3, 0));

        assert!(tilemap.solid_check(Vec2::new(40.0, 4.0)).is_some());
        assert!(tilemap.solid_check(Vec2::new(50.0, 4.0)).is_none());
        assert!(tilemap.solid_check(Vec2::new(30.0, 4.0)).is_none());
        assert!(tilemap.solid_check(Vec2::new(-1000.0, -1000.0)).is_none());
    }

    #[test]
    fn extract_converts_grid_positions_and_removes_unless_kept() {
        let mut tilemap = Tilemap::new(16);
        tilemap.insert(tile_of(TileKind::Spawners, 0, 2, 3));
        tilemap.insert(tile_of(TileKind::Spawners, 1, 5, 3));
        tilemap.insert(grass(0, 4));
        tilemap.insert_offgrid(PlacedTile {
            kind: TileKind::LargeDecor,
            variant: 2,
            pos: Vec2::new(10.5, 20.0),
        });

        let trees = tilemap.extract(&[(TileKind::LargeDecor, 2)], true);
        assert_eq!(trees.len(), 1);
        assert_eq!(trees[0].pos, Vec2::new(10.5, 20.0));
        assert_eq!(tilemap.offgrid().len(), 1);

        let spawners = tilemap.extract(&[(TileKind::Spawners, 0), (TileKind::Spawners, 1)], false);
        assert_eq!(
            spawners,
            vec![
                PlacedTile {
                    kind: TileKind::Spawners,
                    variant: 0,
                    pos: Vec2::new(32.0, 48.0),
                },
                PlacedTile {
                    kind: TileKind::Spawners,
                    variant: 1,
                    pos: Vec2::new(80.0, 48.0),
                },
            ]
        );
        assert_eq!(tilemap.tile_count(), 1);
        assert!(tilemap.tile_at(GridPos::new(2, 3)).is_none());
    }

    #[test]
    fn autotile_maps_fully_surrounded_tile_to_center_variant() {
        let mut tilemap = Tilemap::new(16);
        for (x, y) in [(0, 0), (1, 0), (-1, 0), (0, 1), (0, -1)] {
            tilemap.insert(grass(x, y));
        }

        tilemap.autotile();

        assert_eq!(tilemap.tile_at(GridPos::new(0, 0)).map(|tile| tile.variant), Some(8));
    }

    #[test]
    fn autotile_leaves_isolated_and_unmapped_tiles_unchanged() {
        let mut tilemap = Tilemap::new(16);
        tilemap.insert(tile_of(TileKind::Grass, 4, 10, 10));
        // Horizontal pair neighbours: {left} / {right} are not in the table.
        tilemap.insert(tile_of(TileKind::Stone, 6, 20, 0));
        tilemap.insert(tile_of(TileKind::Stone, 7, 21, 0));

        tilemap.autotile();

        assert_eq!(tilemap.tile_at(GridPos::new(10, 10)).map(|tile| tile.variant), Some(4));
        assert_eq!(tilemap.tile_at(GridPos::new(20, 0)).map(|tile| tile.variant), Some(6));
        assert_eq!(tilemap.tile_at(GridPos::new(21, 0)).map(|tile| tile.variant), Some(7));
    }

    #[test]
    fn autotile_ignores_other_kinds_and_non_autotile_tiles() {
        let mut tilemap = Tilemap::new(16);
        // Top-left corner of a grass block: right and down neighbours.
        tilemap.insert(tile_of(TileKind::Grass, 3, 0, 0));
        tilemap.insert(grass(1, 0));
        tilemap.insert(grass(0, 1));
        tilemap.insert(tile_of(TileKind::Stone, 0, -1, 0));
        tilemap.insert(tile_of(TileKind::Decor, 5, 5, 5));
        tilemap.insert(tile_of(TileKind::Decor, 5, 6, 5));
        tilemap.insert(tile_of(TileKind::Decor, 5, 5, 6));

        tilemap.autotile();

        assert_eq!(tilemap.tile_at(GridPos::new(0, 0)).map(|tile| tile.variant), Some(0));
        assert_eq!(tilemap.tile_at(GridPos::new(5, 5)).map(|tile| tile.variant), Some(5));
    }

    #[test]
    fn autotile_reads_neighbors_before_writing() {
        let mut tilemap = Tilemap::new(16);
        // A 2x2 block; every tile is a corner.
        for (x, y) in [(0, 0), (1, 0), (0, 1), (1, 1)] {
            tilemap.insert(grass(x, y));
        }

        tilemap.autotile();

        let variant = |x, y| tilemap.tile_at(GridPos::new(x, y)).map(|tile| tile.variant);
        assert_eq!(variant(0, 0), Some(0));
        assert_eq!(variant(1, 0), Some(2));
        assert_eq!(variant(0, 1), Some(6));
        assert_eq!(variant(1, 1), Some(4));
    }

    #[test]
    fn edge_of_grid_neighbours_count_as_empty() {
        let raw = r#"{"tilemap": {
            "2147483647;0": {"type": "grass", "variant": 3, "pos": [2147483647, 0]},
            "2147483646;0": {"type": "grass", "variant": 3, "pos": [2147483646, 0]},
            "-2147483648;-2147483648": {"type": "stone", "variant": 3, "pos": [-2147483648, -2147483648]}
        }, "tile_size": 16, "offgrid": []}"#;
        let mut tilemap = Tilemap::from_json(raw).expect("extreme keys are valid");

        tilemap.autotile();

        // {left} and {} are not in the table, so nothing changes.
        let variant = |x, y| tilemap.tile_at(GridPos::new(x, y)).map(|tile| tile.variant);
        assert_eq!(variant(i32::MAX, 0), Some(3));
        assert_eq!(variant(i32::MAX - 1, 0), Some(3));
        assert_eq!(variant(i32::MIN, i32::MIN), Some(3));
        assert_eq!(GridPos::new(i32::MAX, 0).offset(1, 0), None);
        assert_eq!(GridPos::new(0, i32::MIN).offset(0, -1), None);
        assert_eq!(
            GridPos::new(i32::MAX, 0).offset(-1, 1),
            Some(GridPos::new(i32::MAX - 1, 1))
        );

        let around = tilemap.tiles_around(Vec2::new(i32::MAX as f64 * 16.0 + 8.0, 8.0));
        assert_eq!(around.len(), 2);
    }

    #[test]
    fn level_json_parses_documented_format() {
        let raw = r#"{
            "tilemap": {
                "0;5": {"type": "grass", "variant": 1, "pos": [0, 5]},
                "-2;-3": {"type": "spawners", "variant": 0, "pos": [-2, -3]}
            },
            "tile_size": 16,
            "offgrid": [{"type": "large_decor", "variant": 2, "pos": [40.5, 12]}]
        }"#;

        let tilemap = Tilemap::from_json(raw).expect("valid level");

        assert_eq!(tilemap.tile_size(), 16);
        assert_eq!(tilemap.tile_count(), 2);
        assert_eq!(
            tilemap.tile_at(GridPos::new(-2, -3)).map(|tile| tile.kind),
            Some(TileKind::Spawners)
        );
        assert_eq!(tilemap.offgrid()[0].pos, Vec2::new(40.5, 12.0));
    }

    #[test]
    fn level_json_errors_carry_json_path() {
        let raw = r#"{"tilemap": {"0;0": {"type": "lava", "variant": 0, "pos": [0, 0]}},
            "tile_size": 16, "offgrid": []}"#;

        let err = Tilemap::from_json(raw).expect_err("unknown tile type");
        match err {
            LevelError::Parse { json_path, .. } => assert_eq!(json_path, "tilemap.0;0.type"),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn level_json_rejects_bad_keys_and_tile_size() {
        let bad_key = r#"{"tilemap": {"0,0": {"type": "grass", "variant": 0, "pos": [0, 0]}},
            "tile_size": 16, "offgrid": []}"#;
        assert!(matches!(
            Tilemap::from_json(bad_key),
            Err(LevelError::InvalidKey { .. })
        ));

        let mismatch = r#"{"tilemap": {"1;0": {"type": "grass", "variant": 0, "pos": [0, 0]}},
            "tile_size": 16, "offgrid": []}"#;
        assert!(matches!(
            Tilemap::from_json(mismatch),
            Err(LevelError::KeyMismatch { .. })
        ));

        let zero = r#"{"tilemap": {}, "tile_size": 0, "offgrid": []}"#;
        assert!(matches!(Tilemap::from_json(zero), Err(LevelError::InvalidTileSize)));
    }

    #[test]
    fn save_then_load_replaces_previous_state() {
        let temp = tempfile::tempdir().expect("tempdir");
        let path = temp.path().join("maps").join("0.json");

        let mut saved = Tilemap::new(16);
        saved.insert(grass(3, -1));
        saved.insert_offgrid(PlacedTile {
            kind: TileKind::Decor,
            variant: 2,
            pos: Vec2::new(1.0, 2.0),
        });
        saved.save(&path).expect("save");

        let mut loaded = Tilemap::new(8);
        loaded.insert(grass(100, 100));
        loaded.load(&path).expect("load");

        assert_eq!(loaded, saved);
        assert!(loaded.tile_at(GridPos::new(100, 100)).is_none());
    }

    #[test]
    fn loading_missing_file_reports_path() {
        let temp = tempfile::tempdir().expect("tempdir");
        let path = temp.path().join("missing.json");

        let err = Tilemap::read(&path).expect_err("missing file");
        assert!(matches!(err, LevelError::Read { path: ref p, .. } if p == &path));
    }

    #[test]
    fn rect_overlap_is_strict_and_containment_half_open() {
        let a = Rect::new(0.0, 0.0, 16.0, 16.0);
        assert!(!a.overlaps(&Rect::new(16.0, 0.0, 8.0, 8.0)));
        assert!(a.overlaps(&Rect::new(15.5, 0.0, 8.0, 8.0)));
        assert!(a.contains(Vec2::new(0.0, 0.0)));
        assert!(!a.contains(Vec2::new(16.0, 8.0)));
        assert_eq!(a.center(), Vec2::new(8.0, 8.0));
    }
}
