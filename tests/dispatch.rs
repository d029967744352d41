mod common;

use std::cell::RefCell;
use std::rc::Rc;

use common::{broken_device, mock_device, Caps};
use gridlink::{Dispatch, Error, Event, EventKind, EventType};

fn recorder() -> (Rc<RefCell<Vec<Event>>>, impl FnMut(&Event) + 'static) {
    let seen = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&seen);
    (seen, move |event: &Event| sink.borrow_mut().push(*event))
}

#[test]
fn event_types_from_raw_indices() {
    assert_eq!(EventType::try_from(0usize).unwrap(), EventType::ButtonUp);
    assert_eq!(EventType::try_from(5u32).unwrap(), EventType::Tilt);
    assert!(matches!(EventType::try_from(6usize), Err(Error::InvalidArgument(_))));
    assert_eq!(EventType::ALL.len(), EventType::COUNT);
}

#[test]
fn button_down_reaches_its_handler_once() {
    let (mut device, mut handle) = mock_device(8, 8, Caps::ALL);
    let (seen, handler) = recorder();
    device.register_handler(EventType::ButtonDown, handler).unwrap();

    handle.push(EventKind::ButtonDown { x: 2, y: 6 });
    assert_eq!(device.handle_next_event().unwrap(), Dispatch::Handled(EventType::ButtonDown));

    let seen = seen.borrow();
    assert_eq!(seen.len(), 1);
    assert_eq!(seen[0].device, device.id());
    assert_eq!(seen[0].grid(), Some((2, 6)));
    assert!(seen[0].is_press());
}

#[test]
fn events_without_handler_are_unhandled() {
    let (mut device, mut handle) = mock_device(8, 8, Caps::ALL);
    let (seen, handler) = recorder();
    device.register_handler(EventType::ButtonDown, handler).unwrap();

    handle.push(EventKind::ButtonUp { x: 2, y: 6 });
    let dispatch = device.handle_next_event().unwrap();
    assert_eq!(dispatch, Dispatch::Unhandled(EventType::ButtonUp));
    assert_eq!(dispatch.handlers_invoked(), 0);
    assert!(dispatch.drained());
    assert!(seen.borrow().is_empty());
}

#[test]
fn nothing_pending_is_idle() {
    let (mut device, _handle) = mock_device(8, 8, Caps::ALL);
    let dispatch = device.handle_next_event().unwrap();
    assert_eq!(dispatch, Dispatch::Idle);
    assert!(!dispatch.drained());
    assert!(device.next_event().unwrap().is_none());
}

#[test]
fn raw_indices_register_and_validate() {
    let (mut device, mut handle) = mock_device(8, 8, Caps::ALL);
    let (seen, handler) = recorder();

    assert!(matches!(device.register_handler(6usize, |_: &Event| {}), Err(Error::InvalidArgument(_))));
    assert!(matches!(device.unregister_handler(17u32), Err(Error::InvalidArgument(_))));
    assert!(EventType::ALL.iter().all(|&event_type| !device.has_handler(event_type)));

    device.register_handler(2usize, handler).unwrap();
    assert!(device.has_handler(EventType::EncoderDelta));

    handle.push(EventKind::EncoderDelta { number: 1, delta: -3 });
    assert_eq!(device.handle_next_event().unwrap().handlers_invoked(), 1);
    assert_eq!(seen.borrow()[0].kind, EventKind::EncoderDelta { number: 1, delta: -3 });
}

#[test]
fn registering_replaces_and_unregistering_removes() {
    let (mut device, mut handle) = mock_device(8, 8, Caps::ALL);
    let (first, first_handler) = recorder();
    let (second, second_handler) = recorder();

    device.register_handler(EventType::Tilt, first_handler).unwrap();
    device.register_handler(EventType::Tilt, second_handler).unwrap();

    handle.push(EventKind::Tilt { sensor: 0, x: 1, y: -1, z: 300 });
    device.handle_next_event().unwrap();
    assert!(first.borrow().is_empty());
    assert_eq!(second.borrow().len(), 1);

    device.unregister_handler(EventType::Tilt).unwrap();
    assert!(!device.has_handler(EventType::Tilt));
    handle.push(EventKind::Tilt { sensor: 0, x: 0, y: 0, z: 0 });
    assert_eq!(device.handle_next_event().unwrap(), Dispatch::Unhandled(EventType::Tilt));
    assert_eq!(second.borrow().len(), 1);
}

#[test]
fn one_event_per_call() {
    let (mut device, mut handle) = mock_device(8, 8, Caps::ALL);
    let (seen, handler) = recorder();
    device.register_handler(EventType::EncoderKeyDown, handler).unwrap();

    handle.push(EventKind::EncoderKeyDown { number: 0 });
    handle.push(EventKind::EncoderKeyDown { number: 1 });

    device.handle_next_event().unwrap();
    assert_eq!(seen.borrow().len(), 1);
    assert_eq!(handle.pending(), 1);

    device.handle_next_event().unwrap();
    let numbers: Vec<_> = seen.borrow().iter().map(|event| event.kind).collect();
    assert_eq!(
        numbers,
        vec![EventKind::EncoderKeyDown { number: 0 }, EventKind::EncoderKeyDown { number: 1 }]
    );
}

#[test]
fn fetch_failures_propagate() {
    let (mut device, mut handle) = mock_device(8, 8, Caps::ALL);
    handle.push_failure();
    assert!(matches!(device.handle_next_event(), Err(Error::BackendError(_))));
}

#[test]
fn wait_for_input_sees_pending_events() {
    let (mut device, mut handle) = mock_device(8, 8, Caps::ALL);
    assert!(!device.wait_for_input(0).unwrap());

    handle.push(EventKind::ButtonUp { x: 0, y: 0 });
    assert!(device.wait_for_input(0).unwrap());
    assert!(device.wait_for_input(-1).unwrap());

    device.handle_next_event().unwrap();
    assert!(!device.wait_for_input(10).unwrap());
}

#[test]
fn wait_for_input_reports_descriptor_errors() {
    let device = broken_device();
    assert!(matches!(device.wait_for_input(0), Err(Error::Descriptor(id)) if id == device.id()));
}
