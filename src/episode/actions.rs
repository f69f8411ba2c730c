//! Network output decoding into discrete actions

use std::ops::Index;

use serde::{Deserialize, Serialize};

use crate::error::SetupError;

/// Named network output channels, in the fixed order the network emits them
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OutputChannel {
    Movement,
    Jump,
    LookUp,
}

impl OutputChannel {
    /// Every channel, in output order
    pub const ALL: [Self; 3] = [Self::Movement, Self::Jump, Self::LookUp];

    /// Number of outputs the decoder consumes
    pub const COUNT: usize = Self::ALL.len();

    pub const fn index(self) -> usize {
        match self {
            Self::Movement => 0,
            Self::Jump => 1,
            Self::LookUp => 2,
        }
    }
}

/// Activations laid out by channel
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ChannelActivations([f32; OutputChannel::COUNT]);

impl ChannelActivations {
    /// Take the leading channel values from raw network outputs
    ///
    /// Extra outputs are ignored; missing ones read as NaN, which no range matches.
    pub fn from_outputs(outputs: &[f32]) -> Self {
        let mut values = [f32::NAN; OutputChannel::COUNT];
        for (slot, value) in values.iter_mut().zip(outputs) {
            *slot = *value;
        }
        Self(values)
    }
}

impl Index<OutputChannel> for ChannelActivations {
    type Output = f32;

    fn index(&self, channel: OutputChannel) -> &f32 {
        &self.0[channel.index()]
    }
}

/// Closed activation interval `[min, max]`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ActivationRange {
    pub min: f32,
    pub max: f32,
}

impl ActivationRange {
    pub const fn new(min: f32, max: f32) -> Self {
        Self { min, max }
    }

    pub fn contains(&self, activation: f32) -> bool {
        activation >= self.min && activation <= self.max
    }

    pub fn overlaps(&self, other: &Self) -> bool {
        self.min <= other.max && other.min <= self.max
    }

    fn validate(&self, name: &'static str) -> Result<(), SetupError> {
        if self.min > self.max || self.min.is_nan() || self.max.is_nan() {
            return Err(SetupError::InvertedRange {
                name,
                min: self.min,
                max: self.max,
            });
        }
        Ok(())
    }
}

/// Activation ranges per action
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DecoderConfig {
    pub move_left: ActivationRange,
    pub move_right: ActivationRange,
    pub jump: ActivationRange,
    pub look_up: ActivationRange,
}

impl Default for DecoderConfig {
    fn default() -> Self {
        Self {
            move_left: ActivationRange::new(0.0, 0.33),
            move_right: ActivationRange::new(0.67, 1.0),
            jump: ActivationRange::new(0.5, 1.0),
            look_up: ActivationRange::new(0.9, 1.0),
        }
    }
}

impl DecoderConfig {
    /// Ranges must be well-formed and left/right must not overlap
    pub fn validate(&self) -> Result<(), SetupError> {
        self.move_left.validate("move_left")?;
        self.move_right.validate("move_right")?;
        self.jump.validate("jump")?;
        self.look_up.validate("look_up")?;

        if self.move_left.overlaps(&self.move_right) {
            return Err(SetupError::OverlappingMovementRanges);
        }
        Ok(())
    }
}

/// Action flags handed to the driver each frame
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ActionFlags {
    pub move_left: bool,
    pub move_right: bool,
    pub jump: bool,
    pub look_up: bool,
    /// Reserved; no decoder channel drives it
    pub attack: bool,
}

/// Horizontal facing of the agent
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Facing {
    Left,
    #[default]
    Right,
}

impl Facing {
    /// Facing after a frame's decoded movement; unchanged when not moving
    pub fn after(self, actions: &ActionFlags) -> Self {
        if actions.move_left {
            Self::Left
        } else if actions.move_right {
            Self::Right
        } else {
            self
        }
    }
}

/// Threshold decoder from output activations to action flags
#[derive(Debug, Clone)]
pub struct ActionDecoder {
    config: DecoderConfig,
}

impl ActionDecoder {
    pub fn new(config: DecoderConfig) -> Result<Self, SetupError> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &DecoderConfig {
        &self.config
    }

    /// Decode one frame of network outputs
    pub fn decode(&self, outputs: &[f32]) -> ActionFlags {
        let activations = ChannelActivations::from_outputs(outputs);
        let mut actions = ActionFlags::default();

        for channel in OutputChannel::ALL {
            let activation = activations[channel];
            match channel {
                OutputChannel::Movement => {
                    if self.config.move_left.contains(activation) {
                        actions.move_left = true;
                    } else if self.config.move_right.contains(activation) {
                        actions.move_right = true;
                    }
                }
                OutputChannel::Jump => actions.jump = self.config.jump.contains(activation),
                OutputChannel::LookUp => actions.look_up = self.config.look_up.contains(activation),
            }
        }

        actions
    }
}
