use crate::DeviceId;

/// Index of a handler slot. There is exactly one slot per event type on each device
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[repr(u8)]
pub enum EventType {
    ButtonUp = 0,
    ButtonDown = 1,
    EncoderDelta = 2,
    EncoderKeyUp = 3,
    EncoderKeyDown = 4,
    Tilt = 5,
}

impl EventType {
    pub const COUNT: usize = 6;

    pub const ALL: [Self; Self::COUNT] = [
        Self::ButtonUp,
        Self::ButtonDown,
        Self::EncoderDelta,
        Self::EncoderKeyUp,
        Self::EncoderKeyDown,
        Self::Tilt,
    ];

    pub fn index(self) -> usize {
        self as usize
    }
}

impl TryFrom<usize> for EventType {
    type Error = crate::Error;

    fn try_from(index: usize) -> Result<Self, Self::Error> {
        Self::ALL
            .get(index)
            .copied()
            .ok_or(crate::Error::InvalidArgument("event type index out of range"))
    }
}

impl TryFrom<u32> for EventType {
    type Error = crate::Error;

    fn try_from(index: u32) -> Result<Self, Self::Error> {
        Self::try_from(index as usize)
    }
}

/// What happened, in the caller's logical coordinates
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum EventKind {
    ButtonUp { x: u32, y: u32 },
    ButtonDown { x: u32, y: u32 },
    EncoderDelta { number: u32, delta: i32 },
    EncoderKeyUp { number: u32 },
    EncoderKeyDown { number: u32 },
    Tilt { sensor: u32, x: i32, y: i32, z: i32 },
}

impl EventKind {
    pub fn event_type(&self) -> EventType {
        match self {
            Self::ButtonUp { .. } => EventType::ButtonUp,
            Self::ButtonDown { .. } => EventType::ButtonDown,
            Self::EncoderDelta { .. } => EventType::EncoderDelta,
            Self::EncoderKeyUp { .. } => EventType::EncoderKeyUp,
            Self::EncoderKeyDown { .. } => EventType::EncoderKeyDown,
            Self::Tilt { .. } => EventType::Tilt,
        }
    }
}

/// A single input event together with the device it came from
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct Event {
    pub device: DeviceId,
    pub kind: EventKind,
}

impl Event {
    pub fn event_type(&self) -> EventType {
        self.kind.event_type()
    }

    /// The grid coordinate of a button event, `None` for every other kind
    pub fn grid(&self) -> Option<(u32, u32)> {
        match self.kind {
            EventKind::ButtonUp { x, y } | EventKind::ButtonDown { x, y } => Some((x, y)),
            _ => None,
        }
    }

    pub fn is_press(&self) -> bool {
        matches!(self.kind, EventKind::ButtonDown { .. })
    }

    pub fn is_release(&self) -> bool {
        matches!(self.kind, EventKind::ButtonUp { .. })
    }
}

/// The outcome of fetching and dispatching a single event
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum Dispatch {
    /// Nothing was pending
    Idle,
    /// An event was fetched but no handler is registered for its type
    Unhandled(EventType),
    /// An event was fetched and its handler ran
    Handled(EventType),
}

impl Dispatch {
    /// 0 or 1
    pub fn handlers_invoked(self) -> usize {
        match self {
            Self::Handled(_) => 1,
            Self::Idle | Self::Unhandled(_) => 0,
        }
    }

    /// Whether an event was consumed from the device, handled or not
    pub fn drained(self) -> bool {
        !matches!(self, Self::Idle)
    }
}
