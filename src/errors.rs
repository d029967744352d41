use crate::{Capability, DeviceId};

#[derive(Debug)]
pub enum Error {
    /// A required argument was rejected before anything was touched, e.g. an event type index
    /// outside the enumeration, a duplicate poll group member or a removal of a non-member
    InvalidArgument(&'static str),
    /// The device doesn't bind the requested capability family
    Unsupported(Capability),
    /// A coordinate or offset lies outside the caller-visible grid
    OutOfRange { x: u32, y: u32, cols: u32, rows: u32 },
    /// No entry of the device map matches this serial
    UnknownSerial(String),
    /// No backend factory is registered under this protocol name
    UnknownProtocol(String),
    /// The descriptor of the given device reported an error condition while waiting
    Descriptor(DeviceId),
    AllocError(std::collections::TryReserveError),
    IoError(std::io::Error),
    PollError(nix::errno::Errno),
    BackendError(Box<dyn std::error::Error + Send + Sync>),
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Wrap an arbitrary backend failure. Backends use this for anything that isn't I/O
    pub fn backend(e: impl Into<Box<dyn std::error::Error + Send + Sync>>) -> Self {
        Self::BackendError(e.into())
    }
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidArgument(what) => write!(f, "invalid argument: {}", what),
            Self::Unsupported(capability) => {
                write!(f, "device doesn't support the {} capability", capability)
            }
            Self::OutOfRange { x, y, cols, rows } => write!(
                f,
                "coordinate ({}, {}) is outside the {}x{} grid",
                x, y, cols, rows
            ),
            Self::UnknownSerial(serial) => write!(f, "no known device matches serial {:?}", serial),
            Self::UnknownProtocol(name) => write!(f, "no backend registered for protocol {:?}", name),
            Self::Descriptor(id) => write!(f, "descriptor of device {} reported an error", id),
            Self::AllocError(_) => f.write_str("memory allocation failed"),
            Self::IoError(_) => f.write_str("device I/O failed"),
            Self::PollError(_) => f.write_str("waiting for device input failed"),
            Self::BackendError(_) => f.write_str("device backend failed"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::AllocError(e) => Some(e),
            Self::IoError(e) => Some(e),
            Self::PollError(e) => Some(e),
            Self::BackendError(e) => Some(e.as_ref()),
            Self::InvalidArgument(_)
            | Self::Unsupported(_)
            | Self::OutOfRange { .. }
            | Self::UnknownSerial(_)
            | Self::UnknownProtocol(_)
            | Self::Descriptor(_) => None,
        }
    }
}

impl From<std::collections::TryReserveError> for Error {
    fn from(e: std::collections::TryReserveError) -> Self {
        Self::AllocError(e)
    }
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Self::IoError(e)
    }
}

impl From<nix::errno::Errno> for Error {
    fn from(e: nix::errno::Errno) -> Self {
        Self::PollError(e)
    }
}

impl From<std::convert::Infallible> for Error {
    fn from(e: std::convert::Infallible) -> Self {
        match e {}
    }
}
