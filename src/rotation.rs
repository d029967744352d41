//! Coordinate and buffer transforms between the logical (rotated) layout a caller sees and the
//! physical layout a device is wired in.
//!
//! Every function here is pure. Coordinate transforms take the *physical* row and column count of
//! the device; map transforms work on a single 8x8 [quad](QUAD_SIZE), which is the unit all map
//! operations are expressed in.
//!
//! ```
//! use gridlink::rotation::{self, Orientation};
//!
//! // 8x8 grid, turned by 90 degrees
//! let physical = rotation::output(Orientation::R90, 8, 8, 3, 5);
//! assert_eq!(physical, (5, 4));
//! assert_eq!(rotation::input(Orientation::R90, 8, 8, 5, 4), (3, 5));
//! ```

/// Side length of the square blocks that map operations address
pub const QUAD_SIZE: usize = 8;

/// An 8x8 block of greyscale levels, row-major, one byte per cell
pub type LevelQuad = [u8; QUAD_SIZE * QUAD_SIZE];

/// An 8x8 block of on/off cells. Byte `y` is row `y`; bit `x` (least significant first) is column
/// `x`
pub type BitQuad = [u8; QUAD_SIZE];

#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[repr(u8)]
pub enum Orientation {
    R0 = 0,
    R90 = 1,
    R180 = 2,
    R270 = 3,
}

impl Default for Orientation {
    fn default() -> Self {
        Self::R0
    }
}

/// Any integer maps onto an orientation by keeping its two lowest bits, so 5 is 90 degrees and 4
/// is 0 degrees.
impl From<u32> for Orientation {
    fn from(raw: u32) -> Self {
        match raw & 3 {
            0 => Self::R0,
            1 => Self::R90,
            2 => Self::R180,
            _ => Self::R270,
        }
    }
}

impl From<Orientation> for u32 {
    fn from(orientation: Orientation) -> Self {
        orientation as u32
    }
}

impl std::ops::Neg for Orientation {
    type Output = Self;

    fn neg(self) -> Self {
        self.inverse()
    }
}

impl Orientation {
    pub const ALL: [Self; 4] = [Self::R0, Self::R90, Self::R180, Self::R270];

    pub fn degrees(self) -> u32 {
        self as u32 * 90
    }

    /// The orientation that undoes this one
    pub fn inverse(self) -> Self {
        match self {
            Self::R0 => Self::R0,
            Self::R90 => Self::R270,
            Self::R180 => Self::R180,
            Self::R270 => Self::R90,
        }
    }

    pub fn flags(self) -> RotationFlags {
        match self {
            Self::R0 => RotationFlags::NONE,
            Self::R90 => RotationFlags::ROW_COL_SWAP | RotationFlags::ROW_REVBITS,
            Self::R180 => RotationFlags::ROW_REVBITS | RotationFlags::COL_REVBITS,
            Self::R270 => RotationFlags::ROW_COL_SWAP | RotationFlags::COL_REVBITS,
        }
    }

    /// Whether callers see the physical rows as columns and vice versa
    pub fn swaps_axes(self) -> bool {
        self.flags().contains(RotationFlags::ROW_COL_SWAP)
    }
}

/// Describes how a packed bit quad is rewired for an orientation
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Default)]
pub struct RotationFlags(u8);

impl RotationFlags {
    pub const NONE: Self = Self(0);
    /// Rows become columns
    pub const ROW_COL_SWAP: Self = Self(1 << 0);
    /// Bit order within each row byte is reversed
    pub const ROW_REVBITS: Self = Self(1 << 1);
    /// Order of the row bytes is reversed
    pub const COL_REVBITS: Self = Self(1 << 2);

    pub fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    pub fn bits(self) -> u8 {
        self.0
    }
}

impl std::ops::BitOr for RotationFlags {
    type Output = Self;

    fn bitor(self, other: Self) -> Self {
        Self(self.0 | other.0)
    }
}

/// Logical to physical. `rows` and `cols` are the physical dimensions.
///
/// The arithmetic wraps: on non-square grids the 90 and 270 degree rules can land outside the
/// physical grid, and it is up to the backend to clip or reject those.
pub fn output(orientation: Orientation, rows: u32, cols: u32, x: u32, y: u32) -> (u32, u32) {
    let last_col = cols.wrapping_sub(1);
    let last_row = rows.wrapping_sub(1);

    match orientation {
        Orientation::R0 => (x, y),
        Orientation::R90 => (y, last_col.wrapping_sub(x)),
        Orientation::R180 => (last_col.wrapping_sub(x), last_row.wrapping_sub(y)),
        Orientation::R270 => (last_row.wrapping_sub(y), x),
    }
}

/// Physical to logical, the exact inverse of [`output`]
pub fn input(orientation: Orientation, rows: u32, cols: u32, x: u32, y: u32) -> (u32, u32) {
    let last_col = cols.wrapping_sub(1);
    let last_row = rows.wrapping_sub(1);

    match orientation {
        Orientation::R0 => (x, y),
        Orientation::R90 => (last_col.wrapping_sub(y), x),
        Orientation::R180 => (last_col.wrapping_sub(x), last_row.wrapping_sub(y)),
        Orientation::R270 => (y, last_row.wrapping_sub(x)),
    }
}

/// Rearrange a logical greyscale quad into physical order
pub fn map_levels(orientation: Orientation, src: &LevelQuad) -> LevelQuad {
    if orientation == Orientation::R0 {
        return *src;
    }

    let side = QUAD_SIZE as u32;
    let mut dst = [0; QUAD_SIZE * QUAD_SIZE];
    for (i, &level) in src.iter().enumerate() {
        let (x, y) = (i % QUAD_SIZE, i / QUAD_SIZE);
        let (px, py) = output(orientation, side, side, x as u32, y as u32);
        dst[py as usize * QUAD_SIZE + px as usize] = level;
    }
    dst
}

/// Rearrange a physical greyscale quad back into logical order
pub fn map_levels_input(orientation: Orientation, src: &LevelQuad) -> LevelQuad {
    map_levels(orientation.inverse(), src)
}

/// Rearrange a logical packed bit quad into physical order.
///
/// The reversals happen in logical space and the transpose comes last; in that order the result
/// agrees cell for cell with [`output`].
pub fn map_bits(orientation: Orientation, src: &BitQuad) -> BitQuad {
    let flags = orientation.flags();
    let mut rows = *src;

    if flags.contains(RotationFlags::ROW_REVBITS) {
        for row in rows.iter_mut() {
            *row = row.reverse_bits();
        }
    }
    if flags.contains(RotationFlags::COL_REVBITS) {
        rows.reverse();
    }
    if flags.contains(RotationFlags::ROW_COL_SWAP) {
        rows = transpose(&rows);
    }

    rows
}

/// Rearrange a physical packed bit quad back into logical order
pub fn map_bits_input(orientation: Orientation, src: &BitQuad) -> BitQuad {
    map_bits(orientation.inverse(), src)
}

fn transpose(src: &BitQuad) -> BitQuad {
    let mut dst = [0; QUAD_SIZE];
    for (y, &row) in src.iter().enumerate() {
        for (x, out) in dst.iter_mut().enumerate() {
            *out |= ((row >> x) & 1) << y;
        }
    }
    dst
}
