//! Error types for experiment setup and generation bookkeeping
//!
//! Per-frame work never fails. Everything here is raised either once at
//! setup or at an episode boundary when a collaborator operation fails.

use std::path::PathBuf;

use thiserror::Error;

/// Misconfiguration detected before the first frame runs
#[derive(Debug, Error)]
pub enum SetupError {
    #[error("population is empty")]
    EmptyPopulation,

    #[error("candidate {index} expects {actual} sensor inputs, sensor window produces {expected}")]
    InputCountMismatch {
        index: usize,
        expected: usize,
        actual: usize,
    },

    #[error("candidate {index} exposes {actual} outputs, decoder needs at least {expected}")]
    OutputCountMismatch {
        index: usize,
        expected: usize,
        actual: usize,
    },

    #[error("activation range `{name}` is inverted: min {min} > max {max}")]
    InvertedRange { name: &'static str, min: f32, max: f32 },

    #[error("move-left and move-right activation ranges overlap")]
    OverlappingMovementRanges,

    #[error("invalid parameter `{name}`: {reason}")]
    InvalidParameter { name: &'static str, reason: String },

    #[error("level row {row} has width {width}, expected {expected}")]
    RaggedLevel {
        row: usize,
        width: usize,
        expected: usize,
    },

    #[error("unknown level glyph {glyph:?} at ({x}, {y})")]
    UnknownGlyph { glyph: char, x: usize, y: usize },
}

/// Failure raised by the experiment controller
#[derive(Debug, Error)]
pub enum ExperimentError {
    #[error(transparent)]
    Setup(#[from] SetupError),

    #[error("failed to persist population snapshot to {}", path.display())]
    Persist {
        path: PathBuf,
        #[source]
        source: anyhow::Error,
    },

    #[error("epoch failed for generation {generation}")]
    Epoch {
        generation: u32,
        #[source]
        source: anyhow::Error,
    },

    #[error("population cursor {cursor} is out of range for {len} candidates")]
    CursorOutOfRange { cursor: usize, len: usize },
}
