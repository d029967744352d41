//! [embedded-graphics](embedded_graphics) draw targets backed by a [`Device`].
//!
//! Both canvases are sized to the grid as the caller sees it in the current orientation and
//! silently clip whatever falls outside it. Every pixel becomes one capability call.
//!
//! ```no_run
//! use embedded_graphics::pixelcolor::BinaryColor;
//! use embedded_graphics::prelude::*;
//! use embedded_graphics::primitives::{Line, PrimitiveStyle};
//! use gridlink::draw::GridCanvas;
//!
//! # let mut device: gridlink::Device = unimplemented!();
//! let mut canvas = GridCanvas::new(&mut device);
//! canvas.clear(BinaryColor::Off)?;
//! Line::new(Point::new(0, 0), Point::new(7, 7))
//!     .into_styled(PrimitiveStyle::with_stroke(BinaryColor::On, 1))
//!     .draw(&mut canvas)?;
//! # Ok::<(), gridlink::Error>(())
//! ```

use embedded_graphics::pixelcolor::{BinaryColor, Gray4, GrayColor};
use embedded_graphics::prelude::{DrawTarget, OriginDimensions, Pixel, Point, Size};

use crate::{Device, Error};

/// The grid cell a point lands on, if any
fn cell(device: &Device, point: Point) -> Option<(u32, u32)> {
    let x = u32::try_from(point.x).ok()?;
    let y = u32::try_from(point.y).ok()?;
    device.geometry().contains(x, y).then(|| (x, y))
}

/// Draws on/off pixels through [`Device::led_set`]
pub struct GridCanvas<'a> {
    device: &'a mut Device,
}

impl<'a> GridCanvas<'a> {
    pub fn new(device: &'a mut Device) -> Self {
        Self { device }
    }
}

impl OriginDimensions for GridCanvas<'_> {
    fn size(&self) -> Size {
        Size::new(self.device.cols(), self.device.rows())
    }
}

impl DrawTarget for GridCanvas<'_> {
    type Color = BinaryColor;
    type Error = Error;

    fn draw_iter<I>(&mut self, pixels: I) -> Result<(), Self::Error>
    where
        I: IntoIterator<Item = Pixel<Self::Color>>,
    {
        for Pixel(point, color) in pixels {
            if let Some((x, y)) = cell(self.device, point) {
                self.device.led_set(x, y, color.is_on())?;
            }
        }
        Ok(())
    }

    fn clear(&mut self, color: Self::Color) -> Result<(), Self::Error> {
        self.device.led_all(color.is_on())
    }
}

/// Draws 16 shades through [`Device::led_level_set`]
pub struct LevelCanvas<'a> {
    device: &'a mut Device,
}

impl<'a> LevelCanvas<'a> {
    pub fn new(device: &'a mut Device) -> Self {
        Self { device }
    }
}

impl OriginDimensions for LevelCanvas<'_> {
    fn size(&self) -> Size {
        Size::new(self.device.cols(), self.device.rows())
    }
}

impl DrawTarget for LevelCanvas<'_> {
    type Color = Gray4;
    type Error = Error;

    fn draw_iter<I>(&mut self, pixels: I) -> Result<(), Self::Error>
    where
        I: IntoIterator<Item = Pixel<Self::Color>>,
    {
        for Pixel(point, color) in pixels {
            if let Some((x, y)) = cell(self.device, point) {
                self.device.led_level_set(x, y, color.luma())?;
            }
        }
        Ok(())
    }

    fn clear(&mut self, color: Self::Color) -> Result<(), Self::Error> {
        self.device.led_level_all(color.luma())
    }
}
