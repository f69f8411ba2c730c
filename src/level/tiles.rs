//! Tile classification and grid coordinates
//!
//! The environment reports raw integer tile identifiers. Sensing only cares
//! about a handful of classes, so every identifier is folded into [`Tile`]
//! and from there into a small numeric sensory alphabet.

use serde::{Deserialize, Serialize};

/// Discretized agent location on the level grid
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Position {
    pub x: i32,
    pub y: i32,
}

impl Position {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Offset this position by (dx, dy)
    pub const fn offset(self, dx: i32, dy: i32) -> Self {
        Self::new(self.x + dx, self.y + dy)
    }
}

impl From<(i32, i32)> for Position {
    fn from((x, y): (i32, i32)) -> Self {
        Self::new(x, y)
    }
}

/// Tile kinds the harness distinguishes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Tile {
    Empty,
    Solid,
    Ladder,
    Exit,
    Entrance,
    Spikes,
}

impl Tile {
    /// Map a raw environment identifier to a tile kind
    pub const fn from_raw(raw: i32) -> Option<Self> {
        match raw {
            0 => Some(Self::Empty),
            1 => Some(Self::Solid),
            2 => Some(Self::Ladder),
            3 => Some(Self::Exit),
            4 => Some(Self::Entrance),
            10 => Some(Self::Spikes),
            _ => None,
        }
    }

    /// Raw environment identifier for this tile kind
    pub const fn raw(self) -> i32 {
        match self {
            Self::Empty => 0,
            Self::Solid => 1,
            Self::Ladder => 2,
            Self::Exit => 3,
            Self::Entrance => 4,
            Self::Spikes => 10,
        }
    }

    /// Classify a raw identifier, treating anything unrecognized as solid
    pub const fn classify(raw: i32) -> Self {
        match Self::from_raw(raw) {
            Some(tile) => tile,
            None => Self::Solid,
        }
    }

    /// Value fed to the decision network for this tile
    ///
    /// Ladders and the entrance read as open space; spikes are the only
    /// negative signal.
    pub const fn sensor_value(self) -> f32 {
        match self {
            Self::Empty | Self::Ladder | Self::Entrance => 0.0,
            Self::Solid => 1.0,
            Self::Exit => 2.0,
            Self::Spikes => -1.0,
        }
    }

    /// ASCII glyph used by [`TileMap`](super::TileMap) layouts
    pub const fn glyph(self) -> char {
        match self {
            Self::Empty => '.',
            Self::Solid => '#',
            Self::Ladder => 'H',
            Self::Exit => 'X',
            Self::Entrance => 'S',
            Self::Spikes => '^',
        }
    }

    pub const fn from_glyph(glyph: char) -> Option<Self> {
        match glyph {
            '.' => Some(Self::Empty),
            '#' => Some(Self::Solid),
            'H' => Some(Self::Ladder),
            'X' => Some(Self::Exit),
            'S' => Some(Self::Entrance),
            '^' => Some(Self::Spikes),
            _ => None,
        }
    }
}

/// Inclusive rectangle of valid level coordinates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LevelBounds {
    pub min_x: i32,
    pub max_x: i32,
    pub min_y: i32,
    pub max_y: i32,
}

impl Default for LevelBounds {
    fn default() -> Self {
        Self {
            min_x: 0,
            max_x: 42,
            min_y: 0,
            max_y: 34,
        }
    }
}

impl LevelBounds {
    pub const fn contains(&self, pos: Position) -> bool {
        pos.x >= self.min_x && pos.x <= self.max_x && pos.y >= self.min_y && pos.y <= self.max_y
    }
}
