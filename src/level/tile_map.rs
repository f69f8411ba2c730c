//! Static ASCII tile layouts
//!
//! A `TileMap` answers raw tile lookups for a fixed level. It is what the
//! replay tooling and the tests use as the tile source of an environment.

use serde::{Deserialize, Serialize};

use super::tiles::{Position, Tile};
use crate::error::SetupError;

/// Rectangular level stored as raw tile identifiers, row-major
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TileMap {
    width: usize,
    height: usize,
    tiles: Vec<i32>,
}

impl TileMap {
    /// Parse a layout where each line is one row, top row first
    ///
    /// Glyphs follow [`Tile::glyph`]. Blank leading/trailing lines are ignored.
    pub fn parse(layout: &str) -> Result<Self, SetupError> {
        let rows: Vec<&str> = layout
            .lines()
            .map(str::trim_end)
            .skip_while(|line| line.is_empty())
            .collect();
        let rows: Vec<&str> = match rows.iter().rposition(|line| !line.is_empty()) {
            Some(last) => rows[..=last].to_vec(),
            None => Vec::new(),
        };

        let width = rows.first().map_or(0, |row| row.chars().count());
        let mut tiles = Vec::with_capacity(width * rows.len());

        for (y, row) in rows.iter().enumerate() {
            let row_width = row.chars().count();
            if row_width != width {
                return Err(SetupError::RaggedLevel {
                    row: y,
                    width: row_width,
                    expected: width,
                });
            }
            for (x, glyph) in row.chars().enumerate() {
                let tile = Tile::from_glyph(glyph).ok_or(SetupError::UnknownGlyph { glyph, x, y })?;
                tiles.push(tile.raw());
            }
        }

        Ok(Self {
            width,
            height: rows.len(),
            tiles,
        })
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    /// Raw identifier at (x, y); anything off the map reads as solid
    pub fn tile_at(&self, x: i32, y: i32) -> i32 {
        self.index(x, y)
            .map_or(Tile::Solid.raw(), |index| self.tiles[index])
    }

    /// First entrance tile in row-major order
    pub fn entrance(&self) -> Option<Position> {
        self.find(Tile::Entrance)
    }

    /// First exit tile in row-major order
    pub fn exit(&self) -> Option<Position> {
        self.find(Tile::Exit)
    }

    fn find(&self, tile: Tile) -> Option<Position> {
        let raw = tile.raw();
        self.tiles
            .iter()
            .position(|&t| t == raw)
            .map(|index| Position::new((index % self.width) as i32, (index / self.width) as i32))
    }

    fn index(&self, x: i32, y: i32) -> Option<usize> {
        let x = usize::try_from(x).ok()?;
        let y = usize::try_from(y).ok()?;
        (x < self.width && y < self.height).then(|| y * self.width + x)
    }
}
