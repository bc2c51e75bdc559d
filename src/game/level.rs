//! Level Data
//!
//! Immutable description of a level: tile grid, object layers and
//! patrol paths. Loaded from Tiled JSON or assembled with
//! [`LevelBuilder`]. Either way it is validated once, so rebuilding the
//! level after a death cannot fail.

use std::sync::Arc;
use serde::{Serialize, Deserialize};
use serde_json::Value;

use crate::core::fixed::{Fixed, from_int};
use crate::core::vec2::FixedVec2;
use crate::game::actor::Sprite;
use crate::game::enemy::{PathDefect, PatrolPath};

/// Layer holding the collidable tiles.
pub const PLATFORM_LAYER: &str = "platform";
/// Layer holding decorative sprites.
pub const PROPS_LAYER: &str = "props";
/// Layer holding the player spawn and crates.
pub const CHARACTERS_LAYER: &str = "characters";
/// Layer holding enemy patrol lines.
pub const PATHS_LAYER: &str = "paths";

/// Largest world edge that fits the fixed-point range with margin.
const MAX_WORLD_PIXELS: u32 = 30_000;

/// Tiled stores flip flags in the top bits of a gid.
const GID_MASK: u32 = 0x1FFF_FFFF;

// =============================================================================
// ERRORS
// =============================================================================

/// Fatal level configuration errors, surfaced before gameplay starts.
#[derive(Debug, thiserror::Error)]
pub enum LevelError {
    /// Not valid Tiled JSON
    #[error("Invalid level JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// A required layer is absent
    #[error("Level has no `{0}` layer")]
    MissingLayer(&'static str),

    /// No `player` object in the characters layer
    #[error("Level has no player spawn point")]
    MissingPlayerSpawn,

    /// No `line` objects in the paths layer
    #[error("Level has no enemy patrol paths")]
    NoPatrolPaths,

    /// A patrol line cannot be walked
    #[error("Patrol path {index} is degenerate: {defect:?}")]
    DegeneratePath {
        /// Index of the path in level order
        index: usize,
        /// What is wrong with it
        defect: PathDefect,
    },

    /// World is empty or too large
    #[error("Invalid world dimensions {width}x{height} px")]
    InvalidDimensions {
        /// Width in pixels
        width: u32,
        /// Height in pixels
        height: u32,
    },

    /// Tile layer data does not match the map size
    #[error("Platform layer has {actual} tiles, expected {expected}")]
    TileDataMismatch {
        /// Tiles implied by the map size
        expected: usize,
        /// Tiles present
        actual: usize,
    },
}

// =============================================================================
// TILE GRID
// =============================================================================

/// Collidable tiles of the platform layer.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TileGrid {
    columns: u32,
    rows: u32,
    tile_width: Fixed,
    tile_height: Fixed,
    solid: Vec<bool>,
}

impl TileGrid {
    /// Empty (all passable) grid. A cell count that overflows `u32`
    /// yields a grid with no cells.
    pub fn new(columns: u32, rows: u32, tile_width: u32, tile_height: u32) -> Self {
        let (columns, rows, cells) = match columns.checked_mul(rows) {
            Some(cells) => (columns, rows, cells),
            None => (0, 0, 0),
        };
        Self {
            columns,
            rows,
            tile_width: from_int(tile_width as i32),
            tile_height: from_int(tile_height as i32),
            solid: vec![false; cells as usize],
        }
    }

    /// Number of columns.
    pub fn columns(&self) -> u32 {
        self.columns
    }

    /// Number of rows.
    pub fn rows(&self) -> u32 {
        self.rows
    }

    /// Mark a tile solid. Out-of-range cells are ignored.
    pub fn set_solid(&mut self, column: u32, row: u32, solid: bool) {
        if column < self.columns && row < self.rows {
            self.solid[(row * self.columns + column) as usize] = solid;
        }
    }

    /// Is the tile solid? Cells outside the grid are passable.
    pub fn is_solid(&self, column: i64, row: i64) -> bool {
        if column < 0 || row < 0 || column >= self.columns as i64 || row >= self.rows as i64 {
            return false;
        }
        self.solid[(row as u32 * self.columns + column as u32) as usize]
    }

    /// Does the axis-aligned box `[min, max)` touch any solid tile?
    pub fn overlaps_solid(&self, min: FixedVec2, max: FixedVec2) -> bool {
        let first_col = self.column_of(min.x);
        let last_col = self.column_of(max.x.wrapping_sub(1));
        let first_row = self.row_of(min.y);
        let last_row = self.row_of(max.y.wrapping_sub(1));

        (first_row..=last_row)
            .any(|row| (first_col..=last_col).any(|col| self.is_solid(col, row)))
    }

    /// Y coordinate of the top edge of a row.
    pub fn row_top(&self, row: i64) -> Fixed {
        (row * self.tile_height as i64) as Fixed
    }

    /// X coordinate of the left edge of a column.
    pub fn column_left(&self, column: i64) -> Fixed {
        (column * self.tile_width as i64) as Fixed
    }

    /// Row containing the fixed y coordinate.
    pub fn row_of(&self, y: Fixed) -> i64 {
        (y as i64).div_euclid(self.tile_height as i64)
    }

    /// Column containing the fixed x coordinate.
    pub fn column_of(&self, x: Fixed) -> i64 {
        (x as i64).div_euclid(self.tile_width as i64)
    }

    /// Tile width in fixed pixels.
    pub fn tile_width(&self) -> Fixed {
        self.tile_width
    }

    /// Tile height in fixed pixels.
    pub fn tile_height(&self) -> Fixed {
        self.tile_height
    }

    /// Number of solid tiles.
    pub fn solid_count(&self) -> usize {
        self.solid.iter().filter(|s| **s).count()
    }
}

// =============================================================================
// PLACEMENTS
// =============================================================================

/// A crate from the characters layer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CratePlacement {
    /// Body center
    pub position: FixedVec2,
    /// Body size
    pub size: FixedVec2,
}

/// A decorative sprite from the props layer.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PropPlacement {
    /// Texture key (`tree1`, `barrel`, ...)
    pub name: String,
    /// Sprite center
    pub position: FixedVec2,
}

// =============================================================================
// LEVEL DATA
// =============================================================================

/// Validated, immutable level description.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct LevelData {
    width: Fixed,
    height: Fixed,
    platform: TileGrid,
    player_spawn: FixedVec2,
    crates: Vec<CratePlacement>,
    props: Vec<PropPlacement>,
    paths: Vec<Arc<PatrolPath>>,
}

impl LevelData {
    /// Start assembling a level of `columns x rows` tiles.
    pub fn builder(columns: u32, rows: u32, tile_width: u32, tile_height: u32) -> LevelBuilder {
        // Empty or oversized maps get no grid; `build` rejects them
        let fits = tile_width > 0
            && tile_height > 0
            && columns.saturating_mul(tile_width) <= MAX_WORLD_PIXELS
            && rows.saturating_mul(tile_height) <= MAX_WORLD_PIXELS;
        let platform = if fits {
            TileGrid::new(columns, rows, tile_width, tile_height)
        } else {
            TileGrid::new(0, 0, 1, 1)
        };

        LevelBuilder {
            columns,
            rows,
            tile_width,
            tile_height,
            platform,
            player_spawn: None,
            crates: Vec::new(),
            props: Vec::new(),
            paths: Vec::new(),
        }
    }

    /// Parse a Tiled JSON map.
    ///
    /// Tile layer data must be uncompressed (CSV-style arrays).
    pub fn from_tiled_json(json: &str) -> Result<Self, LevelError> {
        let map: TiledMap = serde_json::from_str(json)?;
        let collides = map.colliding_gids();

        let mut builder = Self::builder(map.width, map.height, map.tilewidth, map.tileheight);
        builder.world_size()?;

        let platform = map.tile_layer(PLATFORM_LAYER)?;
        let expected = map.width as usize * map.height as usize;
        if platform.len() != expected {
            return Err(LevelError::TileDataMismatch {
                expected,
                actual: platform.len(),
            });
        }
        for (i, gid) in platform.iter().enumerate() {
            let gid = gid & GID_MASK;
            if gid != 0 && collides.contains(&gid) {
                builder.platform.set_solid(i as u32 % map.width, i as u32 / map.width, true);
            }
        }

        // Props are optional decoration
        if let Ok(props) = map.object_layer(PROPS_LAYER) {
            for object in props {
                builder = builder.prop(&object.name, object.center());
            }
        }

        let characters = map.object_layer(CHARACTERS_LAYER)?;
        if let Some(spawn) = characters.iter().find(|o| o.name == "player") {
            builder = builder.player_spawn(spawn.center());
        }
        for object in characters.iter().filter(|o| o.name == "crate") {
            let size = object.size().unwrap_or_else(|| Sprite::Crate.body_size());
            builder = builder.crate_sized(object.center(), size);
        }

        // Lines trace the enemy sprite's bottom-left corner
        let paths = map.object_layer(PATHS_LAYER)?;
        let enemy = Sprite::EnemyRun.body_size();
        let to_center = FixedVec2::new(enemy.x / 2, -(enemy.y / 2));
        for object in paths.iter().filter(|o| o.name == "line") {
            let waypoints = object.polyline_points().into_iter().map(|p| p + to_center).collect();
            builder = builder.patrol_path(waypoints);
        }

        builder.build()
    }

    /// World width in fixed pixels.
    pub fn width(&self) -> Fixed {
        self.width
    }

    /// World height in fixed pixels.
    pub fn height(&self) -> Fixed {
        self.height
    }

    /// Collidable tiles.
    pub fn platform(&self) -> &TileGrid {
        &self.platform
    }

    /// Player spawn point.
    pub fn player_spawn(&self) -> FixedVec2 {
        self.player_spawn
    }

    /// Crate placements in level order.
    pub fn crates(&self) -> &[CratePlacement] {
        &self.crates
    }

    /// Decorative props in level order.
    pub fn props(&self) -> &[PropPlacement] {
        &self.props
    }

    /// Patrol paths in level order; one enemy walks each.
    pub fn paths(&self) -> &[Arc<PatrolPath>] {
        &self.paths
    }
}

/// Assembles and validates a [`LevelData`].
#[derive(Clone, Debug)]
pub struct LevelBuilder {
    columns: u32,
    rows: u32,
    tile_width: u32,
    tile_height: u32,
    platform: TileGrid,
    player_spawn: Option<FixedVec2>,
    crates: Vec<CratePlacement>,
    props: Vec<PropPlacement>,
    paths: Vec<Vec<FixedVec2>>,
}

impl LevelBuilder {
    /// Mark tiles `[from, to]` of a row solid.
    pub fn solid_row(mut self, row: u32, from: u32, to: u32) -> Self {
        for column in from..=to {
            self.platform.set_solid(column, row, true);
        }
        self
    }

    /// Set the player spawn point.
    pub fn player_spawn(mut self, position: FixedVec2) -> Self {
        self.player_spawn = Some(position);
        self
    }

    /// Add a default-sized crate.
    pub fn crate_at(self, position: FixedVec2) -> Self {
        self.crate_sized(position, Sprite::Crate.body_size())
    }

    /// Add a crate with an explicit body size.
    pub fn crate_sized(mut self, position: FixedVec2, size: FixedVec2) -> Self {
        self.crates.push(CratePlacement { position, size });
        self
    }

    /// Add a decorative prop.
    pub fn prop(mut self, name: &str, position: FixedVec2) -> Self {
        self.props.push(PropPlacement {
            name: name.to_string(),
            position,
        });
        self
    }

    /// Add a patrol path. Waypoints are enemy body centers.
    pub fn patrol_path(mut self, waypoints: Vec<FixedVec2>) -> Self {
        self.paths.push(waypoints);
        self
    }

    /// World size in pixels, if it is non-empty and within range.
    fn world_size(&self) -> Result<(u32, u32), LevelError> {
        let width = self.columns.saturating_mul(self.tile_width);
        let height = self.rows.saturating_mul(self.tile_height);
        if width == 0 || height == 0 || width > MAX_WORLD_PIXELS || height > MAX_WORLD_PIXELS {
            return Err(LevelError::InvalidDimensions { width, height });
        }
        Ok((width, height))
    }

    /// Validate and freeze.
    pub fn build(self) -> Result<LevelData, LevelError> {
        let (width_px, height_px) = self.world_size()?;

        let player_spawn = self.player_spawn.ok_or(LevelError::MissingPlayerSpawn)?;

        if self.paths.is_empty() {
            return Err(LevelError::NoPatrolPaths);
        }
        let paths = self
            .paths
            .into_iter()
            .enumerate()
            .map(|(index, waypoints)| {
                PatrolPath::new(waypoints)
                    .map(Arc::new)
                    .map_err(|defect| LevelError::DegeneratePath { index, defect })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(LevelData {
            width: from_int(width_px as i32),
            height: from_int(height_px as i32),
            platform: self.platform,
            player_spawn,
            crates: self.crates,
            props: self.props,
            paths,
        })
    }
}

// =============================================================================
// TILED JSON
// =============================================================================

#[derive(Deserialize)]
struct TiledMap {
    width: u32,
    height: u32,
    tilewidth: u32,
    tileheight: u32,
    layers: Vec<TiledLayer>,
    #[serde(default)]
    tilesets: Vec<TiledTileset>,
}

#[derive(Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
enum TiledLayer {
    Tilelayer {
        name: String,
        data: Vec<u32>,
    },
    Objectgroup {
        name: String,
        objects: Vec<TiledObject>,
    },
    #[serde(other)]
    Other,
}

#[derive(Deserialize)]
struct TiledTileset {
    firstgid: u32,
    #[serde(default)]
    tiles: Vec<TiledTile>,
}

#[derive(Deserialize)]
struct TiledTile {
    id: u32,
    #[serde(default)]
    properties: Vec<TiledProperty>,
}

#[derive(Deserialize)]
struct TiledProperty {
    name: String,
    value: Value,
}

#[derive(Deserialize)]
struct TiledObject {
    #[serde(default)]
    name: String,
    x: f64,
    y: f64,
    #[serde(default)]
    width: f64,
    #[serde(default)]
    height: f64,
    #[serde(default)]
    gid: Option<u32>,
    #[serde(default)]
    polyline: Vec<TiledPoint>,
}

#[derive(Deserialize)]
struct TiledPoint {
    x: f64,
    y: f64,
}

impl TiledMap {
    /// Gids whose tileset tile has `collides = true`.
    fn colliding_gids(&self) -> Vec<u32> {
        self.tilesets
            .iter()
            .flat_map(|set| {
                set.tiles
                    .iter()
                    .filter(|tile| {
                        tile.properties
                            .iter()
                            .any(|p| p.name == "collides" && p.value == Value::Bool(true))
                    })
                    .map(move |tile| set.firstgid + tile.id)
            })
            .collect()
    }

    fn tile_layer(&self, wanted: &'static str) -> Result<&[u32], LevelError> {
        self.layers
            .iter()
            .find_map(|layer| match layer {
                TiledLayer::Tilelayer { name, data } if name == wanted => Some(data.as_slice()),
                _ => None,
            })
            .ok_or(LevelError::MissingLayer(wanted))
    }

    fn object_layer(&self, wanted: &'static str) -> Result<&[TiledObject], LevelError> {
        self.layers
            .iter()
            .find_map(|layer| match layer {
                TiledLayer::Objectgroup { name, objects } if name == wanted => Some(objects.as_slice()),
                _ => None,
            })
            .ok_or(LevelError::MissingLayer(wanted))
    }
}

impl TiledObject {
    /// Center of the object. Tile objects (with a gid) are anchored
    /// bottom-left in Tiled, everything else top-left.
    fn center(&self) -> FixedVec2 {
        let x = self.x + self.width / 2.0;
        let y = if self.gid.is_some() {
            self.y - self.height / 2.0
        } else {
            self.y + self.height / 2.0
        };
        FixedVec2::from_floats(x, y)
    }

    fn size(&self) -> Option<FixedVec2> {
        (self.width > 0.0 && self.height > 0.0)
            .then(|| FixedVec2::from_floats(self.width, self.height))
    }

    fn polyline_points(&self) -> Vec<FixedVec2> {
        self.polyline
            .iter()
            .map(|p| FixedVec2::from_floats(self.x + p.x, self.y + p.y))
            .collect()
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// Small level used across the game tests.
    ///
    /// 40x15 tiles of 16 px (640x240). Floor on row 12, player at
    /// (48, 181) standing on it, one crate, one enemy line far right.
    pub(crate) fn sample_level() -> LevelData {
        LevelData::builder(40, 15, 16, 16)
            .solid_row(12, 0, 39)
            .player_spawn(FixedVec2::from_ints(48, 181))
            .crate_at(FixedVec2::from_ints(200, 184))
            .patrol_path(vec![FixedVec2::from_ints(400, 181), FixedVec2::from_ints(500, 181)])
            .prop("tree1", FixedVec2::from_ints(100, 170))
            .build()
            .unwrap()
    }

    const TILED: &str = r#"{
        "width": 4, "height": 3, "tilewidth": 16, "tileheight": 16,
        "tilesets": [
            { "firstgid": 1, "tiles": [
                { "id": 0, "properties": [ { "name": "collides", "type": "bool", "value": true } ] },
                { "id": 1, "properties": [ { "name": "collides", "type": "bool", "value": false } ] }
            ] }
        ],
        "layers": [
            { "type": "imagelayer", "name": "sky", "image": "clouds.png" },
            { "type": "tilelayer", "name": "platform", "width": 4, "height": 3,
              "data": [0,0,0,0, 0,0,0,2, 1,1,1,2147483649] },
            { "type": "objectgroup", "name": "props", "objects": [
                { "id": 1, "name": "tree1", "gid": 5, "x": 0, "y": 32, "width": 16, "height": 32 }
            ] },
            { "type": "objectgroup", "name": "characters", "objects": [
                { "id": 2, "name": "player", "x": 8, "y": 20, "point": true },
                { "id": 3, "name": "crate", "gid": 6, "x": 32, "y": 32, "width": 12, "height": 12 },
                { "id": 4, "name": "crate", "x": 40, "y": 8 }
            ] },
            { "type": "objectgroup", "name": "paths", "objects": [
                { "id": 5, "name": "line", "x": 10, "y": 24, "polyline": [ {"x":0,"y":0}, {"x":40,"y":0} ] },
                { "id": 6, "name": "other", "x": 0, "y": 0, "polyline": [ {"x":0,"y":0}, {"x":5,"y":0} ] }
            ] }
        ]
    }"#;

    #[test]
    fn test_parse_tiled_map() {
        let level = LevelData::from_tiled_json(TILED).unwrap();

        assert_eq!(level.width(), from_int(64));
        assert_eq!(level.height(), from_int(48));
        assert_eq!(level.player_spawn(), FixedVec2::from_ints(8, 20));

        // Row 2 solid (including the flipped gid), gid 2 not collidable
        let grid = level.platform();
        assert!(grid.is_solid(0, 2));
        assert!(grid.is_solid(3, 2));
        assert!(!grid.is_solid(3, 1));
        assert_eq!(grid.solid_count(), 4);

        assert_eq!(level.crates().len(), 2);
        assert_eq!(level.crates()[0].position, FixedVec2::from_ints(38, 26));
        assert_eq!(level.crates()[0].size, FixedVec2::from_ints(12, 12));
        assert_eq!(level.crates()[1].size, Sprite::Crate.body_size());

        assert_eq!(level.props().len(), 1);
        assert_eq!(level.props()[0].name, "tree1");
        assert_eq!(level.props()[0].position, FixedVec2::from_ints(8, 16));

        // Line at (10, 24) marks the enemy's bottom-left; 22 px body
        assert_eq!(level.paths().len(), 1, "only objects named `line` are paths");
        assert_eq!(level.paths()[0].start(), FixedVec2::from_ints(21, 13));
        assert_eq!(level.paths()[0].end(), FixedVec2::from_ints(61, 13));
    }

    #[test]
    fn test_bundled_level_loads() {
        let level = LevelData::from_tiled_json(include_str!("../../assets/levels/jungle.json")).unwrap();

        assert_eq!(level.width(), from_int(800));
        assert_eq!(level.player_spawn(), FixedVec2::from_ints(40, 197));
        assert_eq!(level.paths().len(), 3);
        assert_eq!(level.crates().len(), 3);
        assert_eq!(level.props().len(), 6);
        // First enemy stands on the floor (row 13 top = 208)
        assert_eq!(level.paths()[0].start(), FixedVec2::from_ints(250, 197));
        // Decorative tiles on row 12 do not collide
        assert!(!level.platform().is_solid(4, 12));
        assert!(level.platform().is_solid(4, 13));
    }

    #[test]
    fn test_missing_spawn_is_fatal() {
        let json = TILED.replace("\"player\"", "\"npc\"");
        assert!(matches!(
            LevelData::from_tiled_json(&json),
            Err(LevelError::MissingPlayerSpawn)
        ));
    }

    #[test]
    fn test_missing_paths_is_fatal() {
        let json = TILED.replace("\"line\"", "\"rope\"");
        assert!(matches!(LevelData::from_tiled_json(&json), Err(LevelError::NoPatrolPaths)));

        let json = TILED.replace("\"paths\"", "\"routes\"");
        assert!(matches!(
            LevelData::from_tiled_json(&json),
            Err(LevelError::MissingLayer(PATHS_LAYER))
        ));
    }

    #[test]
    fn test_degenerate_path_is_fatal() {
        let result = LevelData::builder(10, 10, 16, 16)
            .player_spawn(FixedVec2::ZERO)
            .patrol_path(vec![FixedVec2::from_ints(1, 1), FixedVec2::from_ints(9, 1)])
            .patrol_path(vec![FixedVec2::from_ints(5, 5)])
            .build();
        assert!(matches!(
            result,
            Err(LevelError::DegeneratePath { index: 1, defect: PathDefect::TooFewWaypoints })
        ));
    }

    #[test]
    fn test_tile_data_mismatch() {
        let json = TILED.replace("1,1,1,2147483649", "1,1,1");
        assert!(matches!(
            LevelData::from_tiled_json(&json),
            Err(LevelError::TileDataMismatch { expected: 12, actual: 11 })
        ));
    }

    #[test]
    fn test_invalid_dimensions() {
        let result = LevelData::builder(0, 10, 16, 16)
            .player_spawn(FixedVec2::ZERO)
            .patrol_path(vec![FixedVec2::ZERO, FixedVec2::from_ints(5, 0)])
            .build();
        assert!(matches!(result, Err(LevelError::InvalidDimensions { width: 0, .. })));
    }

    #[test]
    fn test_zero_sized_tiles_are_fatal() {
        let json = TILED.replace("\"tilewidth\": 16", "\"tilewidth\": 0");
        assert!(matches!(
            LevelData::from_tiled_json(&json),
            Err(LevelError::InvalidDimensions { width: 0, height: 48 })
        ));

        // Huge map with empty tiles and no layers: rejected before any allocation
        let json = r#"{"width":70000,"height":70000,"tilewidth":0,"tileheight":0,"layers":[]}"#;
        assert!(matches!(
            LevelData::from_tiled_json(json),
            Err(LevelError::InvalidDimensions { width: 0, height: 0 })
        ));

        assert_eq!(TileGrid::new(70_000, 70_000, 0, 0).columns(), 0);
    }

    #[test]
    fn test_bad_json() {
        assert!(matches!(LevelData::from_tiled_json("{"), Err(LevelError::Json(_))));
    }

    #[test]
    fn test_tile_overlap() {
        let level = sample_level();
        let grid = level.platform();

        // Box resting exactly on the floor (row 12 top = 192) does not overlap
        assert!(!grid.overlaps_solid(FixedVec2::from_ints(37, 170), FixedVec2::from_ints(59, 192)));
        // One pixel lower does
        assert!(grid.overlaps_solid(FixedVec2::from_ints(37, 171), FixedVec2::from_ints(59, 193)));
        assert_eq!(grid.row_top(12), from_int(192));
    }
}
