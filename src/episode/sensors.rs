//! Grid sensing around the agent
//!
//! Samples a square window of tile classes centered on the agent, row-major,
//! and appends a constant bias input.

use serde::{Deserialize, Serialize};

use crate::error::SetupError;
use crate::level::{LevelBounds, Position, Tile};
use crate::traits::Environment;

/// Bias value appended after the tile window
pub const SENSOR_BIAS: f32 = 1.0;

/// Largest sensor radius accepted; a radius of 16 already feeds 1090 inputs
pub const MAX_SENSOR_RADIUS: u32 = 16;

/// Sensor configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SensorConfig {
    /// Window radius; the window spans `2 * radius + 1` tiles per axis
    pub radius: u32,
    /// Coordinates outside these bounds read as solid
    pub bounds: LevelBounds,
}

impl Default for SensorConfig {
    fn default() -> Self {
        Self {
            radius: 2,
            bounds: LevelBounds::default(),
        }
    }
}

/// Fixed-radius tile window sampler
#[derive(Debug, Clone)]
pub struct GridSensor {
    radius: i32,
    bounds: LevelBounds,
}

impl GridSensor {
    pub fn new(config: &SensorConfig) -> Result<Self, SetupError> {
        if config.radius > MAX_SENSOR_RADIUS {
            return Err(SetupError::InvalidParameter {
                name: "radius",
                reason: format!("must be at most {MAX_SENSOR_RADIUS}, got {}", config.radius),
            });
        }
        Ok(Self {
            radius: config.radius as i32,
            bounds: config.bounds,
        })
    }

    /// Tiles per window side
    pub fn side(&self) -> usize {
        (2 * self.radius + 1) as usize
    }

    /// Number of values produced per sample, bias included
    pub fn input_len(&self) -> usize {
        self.side() * self.side() + 1
    }

    /// Sample the window around `center`
    pub fn sense(&self, env: &impl Environment, center: Position) -> Vec<f32> {
        let mut values = Vec::with_capacity(self.input_len());

        for dy in -self.radius..=self.radius {
            for dx in -self.radius..=self.radius {
                let cell = center.offset(dx, dy);
                let tile = if self.bounds.contains(cell) {
                    Tile::classify(env.tile_at(cell.x, cell.y))
                } else {
                    Tile::Solid
                };
                values.push(tile.sensor_value());
            }
        }

        values.push(SENSOR_BIAS);
        values
    }
}
