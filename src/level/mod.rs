//! Level geometry: tile classification, coordinates and static layouts

mod tile_map;
mod tiles;

pub use tile_map::TileMap;
pub use tiles::{LevelBounds, Position, Tile};
