/*!
# A grid that lives in memory

[`VirtualGrid`] is a complete [`Backend`]: it binds every capability family, rotates what it is
given onto a physical LED frame, and reads input from a Unix socket. The other half of the
socket, together with a view of the LED frame, is the [`VirtualPanel`], which plays the role of
the hardware.

```
use gridlink::virtual_grid::{VirtualGrid, VirtualGridConfig};
use gridlink::EventKind;

let (mut device, mut panel) = VirtualGrid::open(VirtualGridConfig::default())?;
device.set_orientation(1u32);

device.led_on(3, 5)?;
assert!(panel.is_lit(5, 4));

panel.press(5, 4)?;
let event = device.next_event()?.map(|event| event.kind);
assert_eq!(event, Some(EventKind::ButtonDown { x: 3, y: 5 }));
# Ok::<(), gridlink::Error>(())
```

Input frames are a type byte followed by a fixed payload:

| type   | payload              | event                         |
|--------|----------------------|-------------------------------|
| `0x20` | `x y`                | key up, physical coordinates  |
| `0x21` | `x y`                | key down, physical coordinates|
| `0x50` | `n d`                | encoder `n` turned by `d` (i8)|
| `0x51` | `n`                  | encoder key up                |
| `0x52` | `n`                  | encoder key down              |
| `0x61` | `n x y z`            | tilt sensor `n`, big-endian i16 axes |

Writes that run past the visible grid are clipped. On a grid that isn't square, turning it by 90
or 270 degrees rotates some visible cells off the panel; writing to one of those fails with
[`Error::BackendError`] and leaves the panel untouched. Likewise a key frame whose cell is not on
the visible grid is reported as an error instead of an event.
*/

use std::cell::RefCell;
use std::io::{self, Read, Write};
use std::os::unix::io::{AsFd, BorrowedFd};
use std::os::unix::net::UnixStream;
use std::rc::Rc;

use crate::capabilities::{Led, LedLevel, LedRing, RingLevels, Tilt, RING_SIZE};
use crate::rotation::{self, BitQuad, LevelQuad, QUAD_SIZE};
use crate::util::Array2d;
use crate::{monobright, Backend, Device, DeviceParts, Error, EventKind, Geometry, Result};

/// Protocol name virtual devices are opened under
pub const PROTOCOL: &str = "virtual";

/// Brightest greyscale level, also what a lit on/off LED is stored as
pub const MAX_LEVEL: u8 = 15;

mod frame {
    pub const KEY_UP: u8 = 0x20;
    pub const KEY_DOWN: u8 = 0x21;
    pub const ENCODER_DELTA: u8 = 0x50;
    pub const ENCODER_KEY_UP: u8 = 0x51;
    pub const ENCODER_KEY_DOWN: u8 = 0x52;
    pub const TILT: u8 = 0x61;

    /// Total frame length including the type byte
    pub fn len(header: u8) -> Option<usize> {
        match header {
            KEY_UP | KEY_DOWN | ENCODER_DELTA => Some(3),
            ENCODER_KEY_UP | ENCODER_KEY_DOWN => Some(2),
            TILT => Some(8),
            _ => None,
        }
    }
}

#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct VirtualGridConfig {
    /// Physical rows
    pub rows: u32,
    /// Physical columns
    pub cols: u32,
    /// Whether LEDs show all 16 levels. Without it levels are reduced to on and off
    pub varibright: bool,
    /// Number of encoder rings. The ring capability is only bound if there is at least one
    pub rings: u32,
    /// Number of tilt sensors. The tilt capability is only bound if there is at least one
    pub tilt_sensors: u32,
}

impl Default for VirtualGridConfig {
    fn default() -> Self {
        Self { rows: 8, cols: 8, varibright: true, rings: 0, tilt_sensors: 0 }
    }
}

#[derive(Debug)]
struct PanelState {
    levels: Array2d<u8>,
    intensity: u32,
    rings: Vec<RingLevels>,
    ring_intensity: u32,
    tilt: Vec<bool>,
    closed: bool,
}

pub struct VirtualGrid {
    socket: UnixStream,
    /// Bytes of a frame that hasn't fully arrived yet
    pending: Vec<u8>,
    state: Rc<RefCell<PanelState>>,
    config: VirtualGridConfig,
}

impl VirtualGrid {
    pub fn new(config: VirtualGridConfig) -> io::Result<(Self, VirtualPanel)> {
        let (socket, panel_socket) = UnixStream::pair()?;
        socket.set_nonblocking(true)?;

        let state = Rc::new(RefCell::new(PanelState {
            levels: Array2d::new(config.cols as usize, config.rows as usize),
            intensity: MAX_LEVEL.into(),
            rings: vec![[0; RING_SIZE]; config.rings as usize],
            ring_intensity: MAX_LEVEL.into(),
            tilt: vec![false; config.tilt_sensors as usize],
            closed: false,
        }));

        let panel = VirtualPanel { socket: panel_socket, state: Rc::clone(&state) };
        Ok((Self { socket, pending: Vec::with_capacity(8), state, config }, panel))
    }

    /// Create a virtual grid and wrap it in a [`Device`] right away
    pub fn open(config: VirtualGridConfig) -> Result<(Device, VirtualPanel)> {
        let (grid, panel) = Self::new(config)?;
        let path = format!("{}://{}x{}", PROTOCOL, config.cols, config.rows);
        Ok((Device::new(PROTOCOL, path, grid.into_parts()), panel))
    }

    pub fn into_parts(self) -> DeviceParts {
        DeviceParts {
            serial: None,
            friendly: Some("virtual grid".to_owned()),
            rows: self.config.rows,
            cols: self.config.cols,
            backend: Box::new(self),
        }
    }

    /// What the panel actually shows for a requested level
    fn displayed(&self, level: u8) -> u8 {
        if self.config.varibright {
            level.min(MAX_LEVEL)
        } else if monobright::reduce_level_to_bit(level) {
            MAX_LEVEL
        } else {
            0
        }
    }

    /// Write one physical cell. Anything outside the panel is clipped
    fn store(&self, x: u32, y: u32, level: u8) {
        let level = self.displayed(level);
        self.state.borrow_mut().levels.set(x as usize, y as usize, level);
    }

    /// Physical cell of a logical one. `None` for cells past the visible grid, an error for
    /// visible cells that rotate off the panel
    fn locate(&self, geometry: Geometry, x: u32, y: u32) -> Result<Option<(u32, u32)>> {
        if !geometry.contains(x, y) {
            return Ok(None);
        }

        let (px, py) = geometry.to_physical(x, y);
        if px < geometry.cols && py < geometry.rows {
            Ok(Some((px, py)))
        } else {
            Err(Error::backend(format!("cell ({}, {}) is off the panel", x, y)))
        }
    }

    /// Write logical cells. Nothing is written unless every visible cell lands on the panel
    fn store_logical(&self, geometry: Geometry, cells: impl IntoIterator<Item = (u32, u32, u8)>) -> Result<()> {
        let mut physical = Vec::new();
        for (x, y, level) in cells {
            if let Some((px, py)) = self.locate(geometry, x, y)? {
                physical.push((px, py, level));
            }
        }

        for (x, y, level) in physical {
            self.store(x, y, level);
        }
        Ok(())
    }

    /// Write a quad that is already in physical order
    fn store_quad(
        &self,
        geometry: Geometry,
        x_off: u32,
        y_off: u32,
        level_at: impl Fn(usize, usize) -> u8,
    ) -> Result<()> {
        let side = QUAD_SIZE as u32;
        for y in 0..side {
            for x in 0..side {
                self.locate(geometry, x_off.wrapping_add(x), y_off.wrapping_add(y))?;
            }
        }

        let (origin_x, origin_y) = quad_origin(geometry, x_off, y_off);
        for y in 0..QUAD_SIZE {
            for x in 0..QUAD_SIZE {
                self.store(origin_x.wrapping_add(x as u32), origin_y.wrapping_add(y as u32), level_at(x, y));
            }
        }
        Ok(())
    }

    fn with_ring(&self, ring: u32, f: impl FnOnce(&mut RingLevels)) {
        if let Some(levels) = self.state.borrow_mut().rings.get_mut(ring as usize) {
            f(levels);
        }
    }
}

/// Physical top left cell of the logical quad at `(x_off, y_off)`
fn quad_origin(geometry: Geometry, x_off: u32, y_off: u32) -> (u32, u32) {
    let side = QUAD_SIZE as u32;
    let (corner_x, corner_y) = rotation::input(geometry.orientation, side, side, 0, 0);
    geometry.to_physical(x_off.wrapping_add(corner_x), y_off.wrapping_add(corner_y))
}

fn bit_level(byte: u8, bit: usize) -> u8 {
    if (byte >> bit) & 1 == 1 {
        MAX_LEVEL
    } else {
        0
    }
}

/// Logical cell of a key frame, which has to be on the visible grid
fn key(geometry: Geometry, x: u8, y: u8) -> Result<(u32, u32)> {
    let (lx, ly) = geometry.to_logical(x.into(), y.into());
    if geometry.contains(lx, ly) {
        Ok((lx, ly))
    } else {
        Err(Error::backend(format!("key ({}, {}) is outside the visible grid", x, y)))
    }
}

fn decode(bytes: &[u8], geometry: Geometry) -> Result<EventKind> {
    let kind = match *bytes {
        [frame::KEY_UP, x, y] => {
            let (x, y) = key(geometry, x, y)?;
            EventKind::ButtonUp { x, y }
        }
        [frame::KEY_DOWN, x, y] => {
            let (x, y) = key(geometry, x, y)?;
            EventKind::ButtonDown { x, y }
        }
        [frame::ENCODER_DELTA, number, delta] => {
            EventKind::EncoderDelta { number: number.into(), delta: (delta as i8).into() }
        }
        [frame::ENCODER_KEY_UP, number] => EventKind::EncoderKeyUp { number: number.into() },
        [frame::ENCODER_KEY_DOWN, number] => EventKind::EncoderKeyDown { number: number.into() },
        [frame::TILT, sensor, x0, x1, y0, y1, z0, z1] => EventKind::Tilt {
            sensor: sensor.into(),
            x: i16::from_be_bytes([x0, x1]).into(),
            y: i16::from_be_bytes([y0, y1]).into(),
            z: i16::from_be_bytes([z0, z1]).into(),
        },
        _ => return Err(Error::backend(format!("malformed frame {:02x?}", bytes))),
    };
    Ok(kind)
}

impl AsFd for VirtualGrid {
    fn as_fd(&self) -> BorrowedFd<'_> {
        self.socket.as_fd()
    }
}

impl Backend for VirtualGrid {
    fn next_event(&mut self, geometry: Geometry) -> Result<Option<EventKind>> {
        loop {
            let wanted = match self.pending.first() {
                None => 1,
                Some(&header) => match frame::len(header) {
                    Some(len) => len,
                    None => {
                        self.pending.clear();
                        return Err(Error::backend(format!("unknown frame type 0x{:02x}", header)));
                    }
                },
            };

            if self.pending.len() == wanted {
                let kind = decode(&self.pending, geometry);
                self.pending.clear();
                return kind.map(Some);
            }

            // Never read past the current frame, so the socket stays readable for the next one
            let start = self.pending.len();
            self.pending.resize(wanted, 0);
            match self.socket.read(&mut self.pending[start..]) {
                Ok(0) => {
                    self.pending.truncate(start);
                    return Err(io::Error::from(io::ErrorKind::UnexpectedEof).into());
                }
                Ok(n) => self.pending.truncate(start + n),
                Err(e) => {
                    self.pending.truncate(start);
                    match e.kind() {
                        io::ErrorKind::WouldBlock => return Ok(None),
                        io::ErrorKind::Interrupted => continue,
                        _ => return Err(e.into()),
                    }
                }
            }
        }
    }

    fn close(&mut self) -> Result<()> {
        self.state.borrow_mut().closed = true;
        Ok(())
    }

    fn led(&mut self) -> Option<&mut dyn Led> {
        Some(self)
    }

    fn led_level(&mut self) -> Option<&mut dyn LedLevel> {
        Some(self)
    }

    fn led_ring(&mut self) -> Option<&mut dyn LedRing> {
        if self.config.rings > 0 {
            Some(self)
        } else {
            None
        }
    }

    fn tilt(&mut self) -> Option<&mut dyn Tilt> {
        if self.config.tilt_sensors > 0 {
            Some(self)
        } else {
            None
        }
    }
}

impl Led for VirtualGrid {
    fn set(&mut self, geometry: Geometry, x: u32, y: u32, on: bool) -> Result<()> {
        self.store_logical(geometry, [(x, y, if on { MAX_LEVEL } else { 0 })])
    }

    fn all(&mut self, _geometry: Geometry, on: bool) -> Result<()> {
        self.state.borrow_mut().levels.fill(if on { MAX_LEVEL } else { 0 });
        Ok(())
    }

    fn map(&mut self, geometry: Geometry, x_off: u32, y_off: u32, data: &BitQuad) -> Result<()> {
        let physical = rotation::map_bits(geometry.orientation, data);
        self.store_quad(geometry, x_off, y_off, |x, y| bit_level(physical[y], x))
    }

    fn row(&mut self, geometry: Geometry, x_off: u32, y: u32, data: &[u8]) -> Result<()> {
        let cells = (0..data.len() * 8).map(|i| (x_off.wrapping_add(i as u32), y, bit_level(data[i / 8], i % 8)));
        self.store_logical(geometry, cells)
    }

    fn col(&mut self, geometry: Geometry, x: u32, y_off: u32, data: &[u8]) -> Result<()> {
        let cells = (0..data.len() * 8).map(|i| (x, y_off.wrapping_add(i as u32), bit_level(data[i / 8], i % 8)));
        self.store_logical(geometry, cells)
    }

    fn intensity(&mut self, _geometry: Geometry, brightness: u32) -> Result<()> {
        self.state.borrow_mut().intensity = brightness.min(MAX_LEVEL.into());
        Ok(())
    }
}

impl LedLevel for VirtualGrid {
    fn set(&mut self, geometry: Geometry, x: u32, y: u32, level: u8) -> Result<()> {
        self.store_logical(geometry, [(x, y, level)])
    }

    fn all(&mut self, _geometry: Geometry, level: u8) -> Result<()> {
        let level = self.displayed(level);
        self.state.borrow_mut().levels.fill(level);
        Ok(())
    }

    fn map(&mut self, geometry: Geometry, x_off: u32, y_off: u32, levels: &LevelQuad) -> Result<()> {
        if !self.config.varibright {
            let bits = monobright::reduce_level_quad(levels);
            return Led::map(self, geometry, x_off, y_off, &bits);
        }

        let physical = rotation::map_levels(geometry.orientation, levels);
        self.store_quad(geometry, x_off, y_off, |x, y| physical[y * QUAD_SIZE + x])
    }

    fn row(&mut self, geometry: Geometry, x_off: u32, y: u32, levels: &[u8]) -> Result<()> {
        let cells = levels.iter().enumerate().map(|(i, &level)| (x_off.wrapping_add(i as u32), y, level));
        self.store_logical(geometry, cells)
    }

    fn col(&mut self, geometry: Geometry, x: u32, y_off: u32, levels: &[u8]) -> Result<()> {
        let cells = levels.iter().enumerate().map(|(i, &level)| (x, y_off.wrapping_add(i as u32), level));
        self.store_logical(geometry, cells)
    }

    fn intensity(&mut self, geometry: Geometry, brightness: u32) -> Result<()> {
        Led::intensity(self, geometry, brightness)
    }
}

// LED indices wrap around the ring; rings that don't exist are ignored
impl LedRing for VirtualGrid {
    fn set(&mut self, ring: u32, led: u32, level: u8) -> Result<()> {
        self.with_ring(ring, |levels| levels[led as usize % RING_SIZE] = level.min(MAX_LEVEL));
        Ok(())
    }

    fn all(&mut self, ring: u32, level: u8) -> Result<()> {
        self.with_ring(ring, |levels| *levels = [level.min(MAX_LEVEL); RING_SIZE]);
        Ok(())
    }

    fn map(&mut self, ring: u32, new_levels: &RingLevels) -> Result<()> {
        self.with_ring(ring, |levels| {
            for (led, &level) in levels.iter_mut().zip(new_levels.iter()) {
                *led = level.min(MAX_LEVEL);
            }
        });
        Ok(())
    }

    fn range(&mut self, ring: u32, start: u32, end: u32, level: u8) -> Result<()> {
        let start = start as usize % RING_SIZE;
        let end = end as usize % RING_SIZE;
        let len = (end + RING_SIZE - start) % RING_SIZE + 1;

        self.with_ring(ring, |levels| {
            for i in 0..len {
                levels[(start + i) % RING_SIZE] = level.min(MAX_LEVEL);
            }
        });
        Ok(())
    }

    fn intensity(&mut self, brightness: u32) -> Result<()> {
        self.state.borrow_mut().ring_intensity = brightness.min(MAX_LEVEL.into());
        Ok(())
    }
}

impl Tilt for VirtualGrid {
    fn enable(&mut self, sensor: u32) -> Result<()> {
        if let Some(enabled) = self.state.borrow_mut().tilt.get_mut(sensor as usize) {
            *enabled = true;
        }
        Ok(())
    }

    fn disable(&mut self, sensor: u32) -> Result<()> {
        if let Some(enabled) = self.state.borrow_mut().tilt.get_mut(sensor as usize) {
            *enabled = false;
        }
        Ok(())
    }
}

/// The hardware side of a [`VirtualGrid`]. Everything here is in physical coordinates.
///
/// Dropping the panel disconnects it; the grid then reports an `UnexpectedEof` I/O error.
pub struct VirtualPanel {
    socket: UnixStream,
    state: Rc<RefCell<PanelState>>,
}

impl VirtualPanel {
    fn send(&mut self, frame: &[u8]) -> io::Result<()> {
        self.socket.write_all(frame)
    }

    pub fn press(&mut self, x: u8, y: u8) -> io::Result<()> {
        self.send(&[frame::KEY_DOWN, x, y])
    }

    pub fn release(&mut self, x: u8, y: u8) -> io::Result<()> {
        self.send(&[frame::KEY_UP, x, y])
    }

    pub fn turn(&mut self, encoder: u8, delta: i8) -> io::Result<()> {
        self.send(&[frame::ENCODER_DELTA, encoder, delta as u8])
    }

    pub fn press_encoder(&mut self, encoder: u8) -> io::Result<()> {
        self.send(&[frame::ENCODER_KEY_DOWN, encoder])
    }

    pub fn release_encoder(&mut self, encoder: u8) -> io::Result<()> {
        self.send(&[frame::ENCODER_KEY_UP, encoder])
    }

    pub fn tilt(&mut self, sensor: u8, x: i16, y: i16, z: i16) -> io::Result<()> {
        let [x0, x1] = x.to_be_bytes();
        let [y0, y1] = y.to_be_bytes();
        let [z0, z1] = z.to_be_bytes();
        self.send(&[frame::TILT, sensor, x0, x1, y0, y1, z0, z1])
    }

    /// Send raw bytes, e.g. to exercise malformed input
    pub fn send_raw(&mut self, bytes: &[u8]) -> io::Result<()> {
        self.send(bytes)
    }

    pub fn rows(&self) -> u32 {
        self.state.borrow().levels.height() as u32
    }

    pub fn cols(&self) -> u32 {
        self.state.borrow().levels.width() as u32
    }

    pub fn level(&self, x: u32, y: u32) -> Option<u8> {
        self.state.borrow().levels.get(x as usize, y as usize)
    }

    pub fn is_lit(&self, x: u32, y: u32) -> bool {
        self.level(x, y).map_or(false, |level| level > 0)
    }

    /// A snapshot of the whole LED frame
    pub fn levels(&self) -> Array2d<u8> {
        self.state.borrow().levels.clone()
    }

    pub fn intensity(&self) -> u32 {
        self.state.borrow().intensity
    }

    pub fn ring(&self, ring: u32) -> Option<RingLevels> {
        self.state.borrow().rings.get(ring as usize).copied()
    }

    pub fn ring_intensity(&self) -> u32 {
        self.state.borrow().ring_intensity
    }

    pub fn tilt_enabled(&self, sensor: u32) -> bool {
        self.state.borrow().tilt.get(sensor as usize).copied().unwrap_or(false)
    }

    /// Whether the device side has been closed
    pub fn is_closed(&self) -> bool {
        self.state.borrow().closed
    }

    /// The LED frame as text, one line per row, levels in hex and `.` for dark
    pub fn render(&self) -> String {
        let state = self.state.borrow();
        let mut out = String::with_capacity((state.levels.width() + 1) * state.levels.height());
        for y in 0..state.levels.height() {
            for &level in state.levels.row(y).unwrap_or_default() {
                out.push(match level {
                    0 => '.',
                    level => std::char::from_digit(level.into(), 16).unwrap_or('#'),
                });
            }
            out.push('\n');
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rotation::Orientation;

    #[test]
    fn frame_lengths() {
        assert_eq!(frame::len(frame::KEY_DOWN), Some(3));
        assert_eq!(frame::len(frame::ENCODER_KEY_UP), Some(2));
        assert_eq!(frame::len(frame::TILT), Some(8));
        assert_eq!(frame::len(0x00), None);
    }

    #[test]
    fn decode_maps_keys_to_logical() {
        let geometry = Geometry::new(8, 8).with_orientation(Orientation::R90);
        let kind = decode(&[frame::KEY_DOWN, 5, 4], geometry).unwrap();
        assert_eq!(kind, EventKind::ButtonDown { x: 3, y: 5 });
    }

    #[test]
    fn decode_signed_payloads() {
        let geometry = Geometry::new(8, 8);
        assert_eq!(
            decode(&[frame::ENCODER_DELTA, 2, 0xFE], geometry).unwrap(),
            EventKind::EncoderDelta { number: 2, delta: -2 },
        );
        assert_eq!(
            decode(&[frame::TILT, 0, 0xFF, 0xFF, 0x01, 0x00, 0x00, 0x07], geometry).unwrap(),
            EventKind::Tilt { sensor: 0, x: -1, y: 256, z: 7 },
        );
    }

    #[test]
    fn decode_rejects_keys_off_the_visible_grid() {
        let geometry = Geometry::new(8, 16).with_orientation(Orientation::R90);
        assert!(matches!(decode(&[frame::KEY_UP, 0, 0], geometry), Err(Error::BackendError(_))));
        assert!(matches!(decode(&[frame::KEY_DOWN, 16, 0], Geometry::new(8, 16)), Err(Error::BackendError(_))));
    }

    #[test]
    fn quad_origin_is_top_left_of_the_physical_block() {
        let geometry = Geometry::new(16, 16);
        let expected = [(8, 0), (0, 0), (0, 8), (8, 8)];
        for (orientation, expected) in Orientation::ALL.iter().zip(expected) {
            // logical quad (8, 0) on a 16x16 grid
            assert_eq!(quad_origin(geometry.with_orientation(*orientation), 8, 0), expected);
        }
    }
}
