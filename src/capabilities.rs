//! The capability families a backend may implement.
//!
//! A backend hands out each family through the optional accessors on [`crate::Backend`]. Every
//! method receives the device's current [`Geometry`]; coordinates arrive in the caller's logical
//! layout and have already been bounds-checked against the visible grid, so the backend only has
//! to rotate them onto the wire.

use crate::rotation::{BitQuad, LevelQuad};
use crate::{Geometry, Result};

/// Number of LEDs on one encoder ring
pub const RING_SIZE: usize = 64;

pub type RingLevels = [u8; RING_SIZE];

#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Capability {
    Led,
    LedLevel,
    LedRing,
    Tilt,
}

impl std::fmt::Display for Capability {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Led => "led",
            Self::LedLevel => "led-level",
            Self::LedRing => "led-ring",
            Self::Tilt => "tilt",
        })
    }
}

/// On/off grid LEDs
pub trait Led {
    fn set(&mut self, geometry: Geometry, x: u32, y: u32, on: bool) -> Result<()>;
    fn all(&mut self, geometry: Geometry, on: bool) -> Result<()>;
    /// Write the 8x8 quad whose top left cell is `(x_off, y_off)`
    fn map(&mut self, geometry: Geometry, x_off: u32, y_off: u32, data: &BitQuad) -> Result<()>;
    /// Write a run of cells starting at `(x_off, y)`, eight cells per byte, least significant bit
    /// first
    fn row(&mut self, geometry: Geometry, x_off: u32, y: u32, data: &[u8]) -> Result<()>;
    /// Write a run of cells starting at `(x, y_off)`, eight cells per byte, least significant bit
    /// first
    fn col(&mut self, geometry: Geometry, x: u32, y_off: u32, data: &[u8]) -> Result<()>;
    fn intensity(&mut self, geometry: Geometry, brightness: u32) -> Result<()>;
}

/// Greyscale grid LEDs, one byte per cell
pub trait LedLevel {
    fn set(&mut self, geometry: Geometry, x: u32, y: u32, level: u8) -> Result<()>;
    fn all(&mut self, geometry: Geometry, level: u8) -> Result<()>;
    fn map(&mut self, geometry: Geometry, x_off: u32, y_off: u32, levels: &LevelQuad) -> Result<()>;
    fn row(&mut self, geometry: Geometry, x_off: u32, y: u32, levels: &[u8]) -> Result<()>;
    fn col(&mut self, geometry: Geometry, x: u32, y_off: u32, levels: &[u8]) -> Result<()>;
    fn intensity(&mut self, geometry: Geometry, brightness: u32) -> Result<()>;
}

/// Encoder rings. Ring and LED indices aren't grid coordinates, so they are passed through
/// unchecked
pub trait LedRing {
    fn set(&mut self, ring: u32, led: u32, level: u8) -> Result<()>;
    fn all(&mut self, ring: u32, level: u8) -> Result<()>;
    fn map(&mut self, ring: u32, levels: &RingLevels) -> Result<()>;
    /// Light LEDs `start` through `end` inclusive, wrapping around the ring
    fn range(&mut self, ring: u32, start: u32, end: u32, level: u8) -> Result<()>;
    fn intensity(&mut self, brightness: u32) -> Result<()>;
}

/// Accelerometers
pub trait Tilt {
    fn enable(&mut self, sensor: u32) -> Result<()>;
    fn disable(&mut self, sensor: u32) -> Result<()>;
}
