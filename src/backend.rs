use std::os::unix::io::AsFd;

use crate::capabilities::{Led, LedLevel, LedRing, Tilt};
use crate::{EventKind, Geometry, Result};

/// The protocol-specific half of a [`crate::Device`].
///
/// A backend owns the connection to the hardware. The descriptor it exposes through [`AsFd`] is
/// what [`crate::Device::wait_for_input`] and [`crate::PollGroup::wait`] wait on, so it must become
/// readable whenever [`Backend::next_event`] has something to return.
///
/// Capability families are opt-in: a backend overrides the accessor of every family it supports.
/// The defaults return `None`, which makes the corresponding [`crate::Device`] operations fail with
/// [`crate::Error::Unsupported`].
pub trait Backend: AsFd {
    /// Fetch at most one pending event without blocking. Coordinates must be translated into the
    /// logical layout described by `geometry`.
    fn next_event(&mut self, geometry: Geometry) -> Result<Option<EventKind>>;

    /// Release everything the backend holds. Called exactly once
    fn close(&mut self) -> Result<()> {
        Ok(())
    }

    fn led(&mut self) -> Option<&mut dyn Led> {
        None
    }

    fn led_level(&mut self) -> Option<&mut dyn LedLevel> {
        None
    }

    fn led_ring(&mut self) -> Option<&mut dyn LedRing> {
        None
    }

    fn tilt(&mut self) -> Option<&mut dyn Tilt> {
        None
    }
}

/// Everything a backend learns about a device while opening it
pub struct DeviceParts {
    pub serial: Option<String>,
    pub friendly: Option<String>,
    /// Physical rows
    pub rows: u32,
    /// Physical columns
    pub cols: u32,
    pub backend: Box<dyn Backend>,
}

impl std::fmt::Debug for DeviceParts {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DeviceParts")
            .field("serial", &self.serial)
            .field("friendly", &self.friendly)
            .field("rows", &self.rows)
            .field("cols", &self.cols)
            .finish_non_exhaustive()
    }
}
