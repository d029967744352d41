use crate::rotation::{self, Orientation};

/// The physical size of a grid together with the orientation it is currently used in.
///
/// Backends receive a `Geometry` with every capability call, so they can translate the caller's
/// logical coordinates into wire coordinates via [`Geometry::to_physical`].
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Geometry {
    /// Physical row count, as wired
    pub rows: u32,
    /// Physical column count, as wired
    pub cols: u32,
    pub orientation: Orientation,
}

impl Geometry {
    pub fn new(rows: u32, cols: u32) -> Self {
        Self { rows, cols, orientation: Orientation::R0 }
    }

    pub fn with_orientation(self, orientation: Orientation) -> Self {
        Self { orientation, ..self }
    }

    /// Row count as seen by the caller in the current orientation
    pub fn visible_rows(&self) -> u32 {
        if self.orientation.swaps_axes() {
            self.cols
        } else {
            self.rows
        }
    }

    /// Column count as seen by the caller in the current orientation
    pub fn visible_cols(&self) -> u32 {
        if self.orientation.swaps_axes() {
            self.rows
        } else {
            self.cols
        }
    }

    pub fn to_physical(&self, x: u32, y: u32) -> (u32, u32) {
        rotation::output(self.orientation, self.rows, self.cols, x, y)
    }

    pub fn to_logical(&self, x: u32, y: u32) -> (u32, u32) {
        rotation::input(self.orientation, self.rows, self.cols, x, y)
    }

    pub fn contains(&self, x: u32, y: u32) -> bool {
        x < self.visible_cols() && y < self.visible_rows()
    }

    /// Fails with [`crate::Error::OutOfRange`] unless `(x, y)` lies on the caller-visible grid
    pub fn check_bounds(&self, x: u32, y: u32) -> crate::Result<()> {
        if self.contains(x, y) {
            Ok(())
        } else {
            Err(crate::Error::OutOfRange {
                x,
                y,
                cols: self.visible_cols(),
                rows: self.visible_rows(),
            })
        }
    }
}
