#![allow(dead_code)]

use std::cell::RefCell;
use std::collections::VecDeque;
use std::io::{self, Read, Write};
use std::os::unix::io::{AsFd, BorrowedFd, OwnedFd};
use std::os::unix::net::UnixStream;
use std::rc::Rc;

use gridlink::capabilities::{Led, LedLevel, LedRing, RingLevels, Tilt};
use gridlink::rotation::{BitQuad, LevelQuad};
use gridlink::{Backend, Device, DeviceParts, Error, EventKind, Geometry, Result, SharedDevice};

/// A backend call as the mock saw it
#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    LedSet { x: u32, y: u32, on: bool },
    LedAll(bool),
    LedMap { x_off: u32, y_off: u32, data: BitQuad },
    LedRow { x_off: u32, y: u32, data: Vec<u8> },
    LedCol { x: u32, y_off: u32, data: Vec<u8> },
    LedIntensity(u32),
    LevelSet { x: u32, y: u32, level: u8 },
    LevelAll(u8),
    LevelMap { x_off: u32, y_off: u32 },
    LevelRow { x_off: u32, y: u32, levels: Vec<u8> },
    LevelCol { x: u32, y_off: u32, levels: Vec<u8> },
    LevelIntensity(u32),
    RingSet { ring: u32, led: u32, level: u8 },
    RingAll { ring: u32, level: u8 },
    RingMap { ring: u32 },
    RingRange { ring: u32, start: u32, end: u32, level: u8 },
    RingIntensity(u32),
    TiltEnable(u32),
    TiltDisable(u32),
}

/// Which capability families the mock binds
#[derive(Debug, Copy, Clone)]
pub struct Caps {
    pub led: bool,
    pub led_level: bool,
    pub led_ring: bool,
    pub tilt: bool,
}

impl Caps {
    pub const ALL: Self = Self { led: true, led_level: true, led_ring: true, tilt: true };
    pub const NONE: Self = Self { led: false, led_level: false, led_ring: false, tilt: false };
    pub const LED_ONLY: Self = Self { led: true, ..Self::NONE };
}

#[derive(Default)]
struct MockState {
    calls: Vec<Call>,
    geometries: Vec<Geometry>,
    /// `None` entries make the fetch fail
    queue: VecDeque<Option<EventKind>>,
    closes: usize,
}

pub struct MockBackend {
    socket: UnixStream,
    state: Rc<RefCell<MockState>>,
    caps: Caps,
}

/// Test-side handle onto a [`MockBackend`]: queues input and inspects what the device did
pub struct MockHandle {
    socket: UnixStream,
    state: Rc<RefCell<MockState>>,
}

pub fn mock_parts(rows: u32, cols: u32, caps: Caps) -> (DeviceParts, MockHandle) {
    let (socket, handle_socket) = UnixStream::pair().unwrap();
    socket.set_nonblocking(true).unwrap();

    let state = Rc::new(RefCell::new(MockState::default()));
    let backend = MockBackend { socket, state: Rc::clone(&state), caps };
    let parts = DeviceParts {
        serial: Some("m0000001".to_owned()),
        friendly: Some("mock".to_owned()),
        rows,
        cols,
        backend: Box::new(backend),
    };
    (parts, MockHandle { socket: handle_socket, state })
}

pub fn mock_device(rows: u32, cols: u32, caps: Caps) -> (Device, MockHandle) {
    let (parts, handle) = mock_parts(rows, cols, caps);
    (Device::new("mock", "/dev/mock", parts), handle)
}

/// A device whose descriptor is the write end of a pipe nobody reads, so polling it reports an
/// error
pub fn broken_device() -> Device {
    let (read, write) = nix::unistd::pipe().unwrap();
    drop(read);

    let parts = DeviceParts {
        serial: None,
        friendly: None,
        rows: 8,
        cols: 8,
        backend: Box::new(BrokenBackend { fd: write }),
    };
    Device::new("mock", "/dev/broken", parts)
}

pub fn shared(device: Device) -> SharedDevice {
    Rc::new(RefCell::new(device))
}

impl MockHandle {
    fn signal(&mut self) {
        self.socket.write_all(&[0]).unwrap();
    }

    /// Queue an event and make the descriptor readable
    pub fn push(&mut self, kind: EventKind) {
        self.state.borrow_mut().queue.push_back(Some(kind));
        self.signal();
    }

    /// Queue a fetch that fails
    pub fn push_failure(&mut self) {
        self.state.borrow_mut().queue.push_back(None);
        self.signal();
    }

    pub fn calls(&self) -> Vec<Call> {
        self.state.borrow().calls.clone()
    }

    pub fn call_count(&self) -> usize {
        self.state.borrow().calls.len()
    }

    pub fn last_geometry(&self) -> Option<Geometry> {
        self.state.borrow().geometries.last().copied()
    }

    pub fn close_count(&self) -> usize {
        self.state.borrow().closes
    }

    pub fn pending(&self) -> usize {
        self.state.borrow().queue.len()
    }
}

impl MockBackend {
    fn record(&self, geometry: Option<Geometry>, call: Call) -> Result<()> {
        let mut state = self.state.borrow_mut();
        state.geometries.extend(geometry);
        state.calls.push(call);
        Ok(())
    }
}

impl AsFd for MockBackend {
    fn as_fd(&self) -> BorrowedFd<'_> {
        self.socket.as_fd()
    }
}

impl Backend for MockBackend {
    fn next_event(&mut self, _geometry: Geometry) -> Result<Option<EventKind>> {
        let mut byte = [0];
        match self.socket.read(&mut byte) {
            Ok(0) => return Err(io::Error::from(io::ErrorKind::UnexpectedEof).into()),
            Ok(_) => {}
            Err(e) if e.kind() == io::ErrorKind::WouldBlock => return Ok(None),
            Err(e) => return Err(e.into()),
        }

        match self.state.borrow_mut().queue.pop_front() {
            Some(Some(kind)) => Ok(Some(kind)),
            Some(None) => Err(Error::backend("injected failure")),
            None => Ok(None),
        }
    }

    fn close(&mut self) -> Result<()> {
        self.state.borrow_mut().closes += 1;
        Ok(())
    }

    fn led(&mut self) -> Option<&mut dyn Led> {
        if self.caps.led {
            Some(self)
        } else {
            None
        }
    }

    fn led_level(&mut self) -> Option<&mut dyn LedLevel> {
        if self.caps.led_level {
            Some(self)
        } else {
            None
        }
    }

    fn led_ring(&mut self) -> Option<&mut dyn LedRing> {
        if self.caps.led_ring {
            Some(self)
        } else {
            None
        }
    }

    fn tilt(&mut self) -> Option<&mut dyn Tilt> {
        if self.caps.tilt {
            Some(self)
        } else {
            None
        }
    }
}

impl Led for MockBackend {
    fn set(&mut self, geometry: Geometry, x: u32, y: u32, on: bool) -> Result<()> {
        self.record(Some(geometry), Call::LedSet { x, y, on })
    }

    fn all(&mut self, geometry: Geometry, on: bool) -> Result<()> {
        self.record(Some(geometry), Call::LedAll(on))
    }

    fn map(&mut self, geometry: Geometry, x_off: u32, y_off: u32, data: &BitQuad) -> Result<()> {
        self.record(Some(geometry), Call::LedMap { x_off, y_off, data: *data })
    }

    fn row(&mut self, geometry: Geometry, x_off: u32, y: u32, data: &[u8]) -> Result<()> {
        self.record(Some(geometry), Call::LedRow { x_off, y, data: data.to_vec() })
    }

    fn col(&mut self, geometry: Geometry, x: u32, y_off: u32, data: &[u8]) -> Result<()> {
        self.record(Some(geometry), Call::LedCol { x, y_off, data: data.to_vec() })
    }

    fn intensity(&mut self, geometry: Geometry, brightness: u32) -> Result<()> {
        self.record(Some(geometry), Call::LedIntensity(brightness))
    }
}

impl LedLevel for MockBackend {
    fn set(&mut self, geometry: Geometry, x: u32, y: u32, level: u8) -> Result<()> {
        self.record(Some(geometry), Call::LevelSet { x, y, level })
    }

    fn all(&mut self, geometry: Geometry, level: u8) -> Result<()> {
        self.record(Some(geometry), Call::LevelAll(level))
    }

    fn map(&mut self, geometry: Geometry, x_off: u32, y_off: u32, _levels: &LevelQuad) -> Result<()> {
        self.record(Some(geometry), Call::LevelMap { x_off, y_off })
    }

    fn row(&mut self, geometry: Geometry, x_off: u32, y: u32, levels: &[u8]) -> Result<()> {
        self.record(Some(geometry), Call::LevelRow { x_off, y, levels: levels.to_vec() })
    }

    fn col(&mut self, geometry: Geometry, x: u32, y_off: u32, levels: &[u8]) -> Result<()> {
        self.record(Some(geometry), Call::LevelCol { x, y_off, levels: levels.to_vec() })
    }

    fn intensity(&mut self, geometry: Geometry, brightness: u32) -> Result<()> {
        self.record(Some(geometry), Call::LevelIntensity(brightness))
    }
}

impl LedRing for MockBackend {
    fn set(&mut self, ring: u32, led: u32, level: u8) -> Result<()> {
        self.record(None, Call::RingSet { ring, led, level })
    }

    fn all(&mut self, ring: u32, level: u8) -> Result<()> {
        self.record(None, Call::RingAll { ring, level })
    }

    fn map(&mut self, ring: u32, _levels: &RingLevels) -> Result<()> {
        self.record(None, Call::RingMap { ring })
    }

    fn range(&mut self, ring: u32, start: u32, end: u32, level: u8) -> Result<()> {
        self.record(None, Call::RingRange { ring, start, end, level })
    }

    fn intensity(&mut self, brightness: u32) -> Result<()> {
        self.record(None, Call::RingIntensity(brightness))
    }
}

impl Tilt for MockBackend {
    fn enable(&mut self, sensor: u32) -> Result<()> {
        self.record(None, Call::TiltEnable(sensor))
    }

    fn disable(&mut self, sensor: u32) -> Result<()> {
        self.record(None, Call::TiltDisable(sensor))
    }
}

pub struct BrokenBackend {
    fd: OwnedFd,
}

impl AsFd for BrokenBackend {
    fn as_fd(&self) -> BorrowedFd<'_> {
        self.fd.as_fd()
    }
}

impl Backend for BrokenBackend {
    fn next_event(&mut self, _geometry: Geometry) -> Result<Option<EventKind>> {
        Ok(None)
    }
}
