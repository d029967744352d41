/*!
# Device handles

A [`Device`] is one open grid controller. It pairs the identity and geometry reported at open time
with the [`Backend`] that talks to the hardware.

The capability operations live in the `output` half of this module, event handling and waiting
in the `input` half.
*/

mod input;

mod output;

use std::os::unix::io::{AsFd, BorrowedFd};
use std::sync::atomic::{AtomicU64, Ordering};

use crate::rotation::Orientation;
use crate::{Backend, DeviceParts, Event, EventType, Geometry};

pub(crate) type Handler = Box<dyn FnMut(&Event)>;

/// Process-unique identifier of a [`Device`], carried by every [`Event`] it produces
#[derive(Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct DeviceId(u64);

impl DeviceId {
    fn next() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(0);
        Self(NEXT.fetch_add(1, Ordering::Relaxed))
    }
}

impl std::fmt::Display for DeviceId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

pub struct Device {
    id: DeviceId,
    serial: Option<String>,
    path: String,
    friendly: Option<String>,
    protocol: String,
    geometry: Geometry,
    backend: Box<dyn Backend>,
    handlers: [Option<Handler>; EventType::COUNT],
    closed: bool,
}

impl Device {
    /// Assemble a device from what a backend produced. [`crate::Registry::open`] does this for
    /// you; call it directly when you construct a backend by hand.
    pub fn new(protocol: impl Into<String>, path: impl Into<String>, parts: DeviceParts) -> Self {
        let DeviceParts { serial, friendly, rows, cols, backend } = parts;

        Self {
            id: DeviceId::next(),
            serial,
            path: path.into(),
            friendly,
            protocol: protocol.into(),
            geometry: Geometry::new(rows, cols),
            backend,
            handlers: std::array::from_fn(|_| None),
            closed: false,
        }
    }

    pub fn id(&self) -> DeviceId {
        self.id
    }

    /// The vendor serial. Network transports usually don't have one
    pub fn serial(&self) -> Option<&str> {
        self.serial.as_deref()
    }

    /// The connection path or URL this device was opened with
    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn friendly_name(&self) -> Option<&str> {
        self.friendly.as_deref()
    }

    pub fn protocol(&self) -> &str {
        &self.protocol
    }

    /// Number of rows as seen in the current orientation
    pub fn rows(&self) -> u32 {
        self.geometry.visible_rows()
    }

    /// Number of columns as seen in the current orientation
    pub fn cols(&self) -> u32 {
        self.geometry.visible_cols()
    }

    /// Physical dimensions plus the current orientation
    pub fn geometry(&self) -> Geometry {
        self.geometry
    }

    pub fn orientation(&self) -> Orientation {
        self.geometry.orientation
    }

    /// Accepts an [`Orientation`] or any raw integer, which is reduced to its two lowest bits
    pub fn set_orientation(&mut self, orientation: impl Into<Orientation>) {
        self.geometry.orientation = orientation.into();
    }

    /// Close the backend, reporting any failure. Dropping a device closes it as well, but can
    /// only log errors
    pub fn close(mut self) -> crate::Result<()> {
        self.closed = true;
        log::debug!("closing {} ({})", self.path, self.id);
        self.backend.close()
    }
}

impl AsFd for Device {
    fn as_fd(&self) -> BorrowedFd<'_> {
        self.backend.as_fd()
    }
}

impl Drop for Device {
    fn drop(&mut self) {
        if self.closed {
            return;
        }

        self.closed = true;
        if let Err(e) = self.backend.close() {
            log::warn!("closing {} ({}) failed: {}", self.path, self.id, e);
        }
    }
}

impl std::fmt::Debug for Device {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Device")
            .field("id", &self.id)
            .field("serial", &self.serial)
            .field("path", &self.path)
            .field("friendly", &self.friendly)
            .field("protocol", &self.protocol)
            .field("geometry", &self.geometry)
            .finish_non_exhaustive()
    }
}
