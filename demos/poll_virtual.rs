//! Two virtual grids in one poll group. Random presses are injected on the panels, every press
//! toggles the LED under it, and the panels are printed at the end.
//!
//! Run with `RUST_LOG=trace` to watch the dispatch.

use gridlink::prelude::*;
use gridlink::virtual_grid::{VirtualGrid, VirtualGridConfig, VirtualPanel};
use std::cell::RefCell;
use std::collections::HashSet;
use std::rc::Rc;

const PRESSES: usize = 24;

fn random_press(panel: &mut VirtualPanel) -> std::io::Result<()> {
    use nanorand::Rng as _;
    let mut rng = nanorand::tls_rng();

    let x = rng.generate_range(0..panel.cols()) as u8;
    let y = rng.generate_range(0..panel.rows()) as u8;
    panel.press(x, y)?;
    panel.release(x, y)
}

fn main() -> Result<(), gridlink::Error> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let (square, mut square_panel) = VirtualGrid::open(VirtualGridConfig::default())?;
    let (wide, mut wide_panel) = VirtualGrid::open(VirtualGridConfig { rows: 8, cols: 16, ..Default::default() })?;
    let (square, wide) = (Rc::new(RefCell::new(square)), Rc::new(RefCell::new(wide)));
    square.borrow_mut().set_orientation(Orientation::R90);

    // Handlers run while their device is borrowed, so they only note the press
    let pressed = Rc::new(RefCell::new(Vec::new()));
    for device in [&square, &wide] {
        let pressed = Rc::clone(&pressed);
        device.borrow_mut().register_handler(EventType::ButtonDown, move |event: &Event| {
            if let Some((x, y)) = event.grid() {
                pressed.borrow_mut().push((event.device, x, y));
            }
        })?;
    }

    let mut group = PollGroup::new()?;
    group.add(&square)?;
    group.add(&wide)?;

    let mut lit = HashSet::new();
    for i in 0..PRESSES {
        if i % 2 == 0 {
            random_press(&mut square_panel)?;
        } else {
            random_press(&mut wide_panel)?;
        }

        // a press and a release per injection
        let mut drained = 0;
        while drained < 2 {
            drained += group.wait(1000)?;
        }

        for (id, x, y) in pressed.borrow_mut().drain(..) {
            let device = if square.borrow().id() == id { &square } else { &wide };
            let on = lit.insert((id, x, y)) || !lit.remove(&(id, x, y));
            log::info!("{} ({}, {}) -> {}", id, x, y, if on { "on" } else { "off" });
            device.borrow_mut().led_set(x, y, on)?;
        }
    }

    println!("square grid, rotated by 90 degrees:\n{}", square_panel.render());
    println!("wide grid:\n{}", wide_panel.render());
    Ok(())
}
