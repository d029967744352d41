/*!
A device layer for grid controllers: LED button grids, encoder rings and tilt sensors, spoken to
through pluggable protocol backends.

# Devices and capabilities

A [`Device`] is one open controller. What it can do depends on the capability families its
[`Backend`] binds: on/off LEDs, greyscale LEDs, encoder rings and tilt sensors. Every capability
operation checks that the family is present, checks coordinates against the grid as the caller
sees it, and hands the call to the backend along with the device's [`Geometry`].

```
use gridlink::prelude::*;
use gridlink::virtual_grid::{VirtualGrid, VirtualGridConfig};

let (mut device, panel) = VirtualGrid::open(VirtualGridConfig { rows: 8, cols: 16, ..Default::default() })?;
assert_eq!((device.cols(), device.rows()), (16, 8));

// Upside down: the caller's top left cell is the panel's bottom right one
device.set_orientation(Orientation::R180);
device.led_level_set(0, 0, 12)?;
assert_eq!(panel.level(15, 7), Some(12));

assert!(device.supports(Capability::LedLevel));
assert!(matches!(device.led_set(16, 0, true), Err(gridlink::Error::OutOfRange { .. })));
assert!(matches!(device.tilt_enable(0), Err(gridlink::Error::Unsupported(Capability::Tilt))));
# Ok::<(), gridlink::Error>(())
```

# Input

Every device has one handler slot per [`EventType`]. [`Device::handle_next_event`] fetches one
pending event and runs the matching handler; [`PollGroup`] waits on many devices at once and
drains one event from each device that has input.

```no_run
use gridlink::prelude::*;
use std::{cell::RefCell, rc::Rc};

# let (a, b): (Device, Device) = unimplemented!();
let (a, b) = (Rc::new(RefCell::new(a)), Rc::new(RefCell::new(b)));

for device in [&a, &b] {
    device.borrow_mut().register_handler(EventType::ButtonDown, |event| {
        if let Some((x, y)) = event.grid() {
            println!("{} pressed ({}, {})", event.device, x, y);
        }
    })?;
}

let mut group = PollGroup::new()?;
group.add(&a)?;
group.add(&b)?;
loop {
    group.wait(-1)?;
}
# Ok::<(), gridlink::Error>(())
```

# Opening hardware

Concrete protocols are registered with a [`Registry`], which picks the protocol for a serial
number or URL and assembles the [`Device`]. See the [`registry`] module.
*/

pub mod rotation;

pub mod capabilities;
pub use capabilities::Capability;

mod geometry;
pub use geometry::*;

mod event;
pub use event::*;

mod backend;
pub use backend::*;

mod device;
pub use device::*;

mod poll_group;
pub use poll_group::*;

pub mod registry;
pub use registry::{OpenConfig, Registry};

pub mod monobright;

pub mod virtual_grid;

#[cfg(feature = "embedded-graphics")]
pub mod draw;

pub mod util;

mod errors;
pub use errors::*;

pub mod prelude {
    pub use crate::capabilities::Capability;
    pub use crate::rotation::Orientation;
    pub use crate::{Device, Event, EventKind, EventType, PollGroup, SharedDevice};
}
