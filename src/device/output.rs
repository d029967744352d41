use crate::capabilities::{Capability, RingLevels};
use crate::rotation::{BitQuad, LevelQuad};
use crate::{Device, Error, Result};

/// Presence check for a capability family. Runs before any argument validation
fn require<T: ?Sized>(family: Option<&mut T>, capability: Capability) -> Result<&mut T> {
    family.ok_or(Error::Unsupported(capability))
}

// Every operation below follows the same order: capability present, then bounds against the
// caller-visible grid, then a single backend call whose result is returned as is.
impl Device {
    pub fn led_set(&mut self, x: u32, y: u32, on: bool) -> Result<()> {
        let geometry = self.geometry;
        let led = require(self.backend.led(), Capability::Led)?;
        geometry.check_bounds(x, y)?;

        log::trace!("{}: led ({}, {}) {}", self.id, x, y, if on { "on" } else { "off" });
        led.set(geometry, x, y, on)
    }

    pub fn led_on(&mut self, x: u32, y: u32) -> Result<()> {
        self.led_set(x, y, true)
    }

    pub fn led_off(&mut self, x: u32, y: u32) -> Result<()> {
        self.led_set(x, y, false)
    }

    pub fn led_all(&mut self, on: bool) -> Result<()> {
        let geometry = self.geometry;
        require(self.backend.led(), Capability::Led)?.all(geometry, on)
    }

    /// Write the 8x8 quad whose top left corner is `(x_off, y_off)`
    pub fn led_map(&mut self, x_off: u32, y_off: u32, data: &BitQuad) -> Result<()> {
        let geometry = self.geometry;
        let led = require(self.backend.led(), Capability::Led)?;
        geometry.check_bounds(x_off, y_off)?;

        led.map(geometry, x_off, y_off, data)
    }

    /// Write `data.len() * 8` cells of row `y`, starting at column `x_off`
    pub fn led_row(&mut self, x_off: u32, y: u32, data: &[u8]) -> Result<()> {
        let geometry = self.geometry;
        let led = require(self.backend.led(), Capability::Led)?;
        geometry.check_bounds(x_off, y)?;

        led.row(geometry, x_off, y, data)
    }

    /// Write `data.len() * 8` cells of column `x`, starting at row `y_off`
    pub fn led_col(&mut self, x: u32, y_off: u32, data: &[u8]) -> Result<()> {
        let geometry = self.geometry;
        let led = require(self.backend.led(), Capability::Led)?;
        geometry.check_bounds(x, y_off)?;

        led.col(geometry, x, y_off, data)
    }

    pub fn led_intensity(&mut self, brightness: u32) -> Result<()> {
        let geometry = self.geometry;
        require(self.backend.led(), Capability::Led)?.intensity(geometry, brightness)
    }

    pub fn led_level_set(&mut self, x: u32, y: u32, level: u8) -> Result<()> {
        let geometry = self.geometry;
        let led_level = require(self.backend.led_level(), Capability::LedLevel)?;
        geometry.check_bounds(x, y)?;

        log::trace!("{}: led ({}, {}) level {}", self.id, x, y, level);
        led_level.set(geometry, x, y, level)
    }

    pub fn led_level_all(&mut self, level: u8) -> Result<()> {
        let geometry = self.geometry;
        require(self.backend.led_level(), Capability::LedLevel)?.all(geometry, level)
    }

    pub fn led_level_map(&mut self, x_off: u32, y_off: u32, levels: &LevelQuad) -> Result<()> {
        let geometry = self.geometry;
        let led_level = require(self.backend.led_level(), Capability::LedLevel)?;
        geometry.check_bounds(x_off, y_off)?;

        led_level.map(geometry, x_off, y_off, levels)
    }

    /// Write `levels.len()` cells of row `y`, starting at column `x_off`
    pub fn led_level_row(&mut self, x_off: u32, y: u32, levels: &[u8]) -> Result<()> {
        let geometry = self.geometry;
        let led_level = require(self.backend.led_level(), Capability::LedLevel)?;
        geometry.check_bounds(x_off, y)?;

        led_level.row(geometry, x_off, y, levels)
    }

    /// Write `levels.len()` cells of column `x`, starting at row `y_off`
    pub fn led_level_col(&mut self, x: u32, y_off: u32, levels: &[u8]) -> Result<()> {
        let geometry = self.geometry;
        let led_level = require(self.backend.led_level(), Capability::LedLevel)?;
        geometry.check_bounds(x, y_off)?;

        led_level.col(geometry, x, y_off, levels)
    }

    pub fn led_level_intensity(&mut self, brightness: u32) -> Result<()> {
        let geometry = self.geometry;
        require(self.backend.led_level(), Capability::LedLevel)?.intensity(geometry, brightness)
    }

    pub fn led_ring_set(&mut self, ring: u32, led: u32, level: u8) -> Result<()> {
        require(self.backend.led_ring(), Capability::LedRing)?.set(ring, led, level)
    }

    pub fn led_ring_all(&mut self, ring: u32, level: u8) -> Result<()> {
        require(self.backend.led_ring(), Capability::LedRing)?.all(ring, level)
    }

    pub fn led_ring_map(&mut self, ring: u32, levels: &RingLevels) -> Result<()> {
        require(self.backend.led_ring(), Capability::LedRing)?.map(ring, levels)
    }

    /// Light LEDs `start` through `end` of `ring`, wrapping past the last LED
    pub fn led_ring_range(&mut self, ring: u32, start: u32, end: u32, level: u8) -> Result<()> {
        require(self.backend.led_ring(), Capability::LedRing)?.range(ring, start, end, level)
    }

    pub fn led_ring_intensity(&mut self, brightness: u32) -> Result<()> {
        require(self.backend.led_ring(), Capability::LedRing)?.intensity(brightness)
    }

    pub fn tilt_enable(&mut self, sensor: u32) -> Result<()> {
        require(self.backend.tilt(), Capability::Tilt)?.enable(sensor)
    }

    pub fn tilt_disable(&mut self, sensor: u32) -> Result<()> {
        require(self.backend.tilt(), Capability::Tilt)?.disable(sensor)
    }

    /// Whether the backend binds the given capability family.
    ///
    /// Takes `&mut self` because presence is asked through the same accessors that hand out the
    /// family, and those borrow the backend mutably. Nothing is changed.
    pub fn supports(&mut self, capability: Capability) -> bool {
        match capability {
            Capability::Led => self.backend.led().is_some(),
            Capability::LedLevel => self.backend.led_level().is_some(),
            Capability::LedRing => self.backend.led_ring().is_some(),
            Capability::Tilt => self.backend.tilt().is_some(),
        }
    }
}
