use std::cell::RefCell;
use std::os::unix::io::AsFd;
use std::rc::Rc;

use nix::poll::{PollFd, PollFlags, PollTimeout};

use crate::{Device, Error, Result};

/// A device handle that can be shared between the caller and any number of [`PollGroup`]s
pub type SharedDevice = Rc<RefCell<Device>>;

/// Number of slots a fresh [`PollGroup`] has room for
pub const INITIAL_CAPACITY: usize = 4;

/// Translate the millisecond convention used throughout this crate: negative blocks, 0 polls
pub(crate) fn poll_timeout(timeout_ms: i32) -> PollTimeout {
    if timeout_ms < 0 {
        PollTimeout::NONE
    } else {
        PollTimeout::try_from(timeout_ms).unwrap_or(PollTimeout::MAX)
    }
}

/// Multiplexes input from many devices through a single wait.
///
/// The group only references its members: removing a device or dropping the group never closes
/// anything. Members are compared by identity, so the same handle can't be added twice.
///
/// ```no_run
/// use gridlink::{EventType, PollGroup, SharedDevice};
///
/// # let (a, b): (SharedDevice, SharedDevice) = unimplemented!();
/// let mut group = PollGroup::new()?;
/// group.add(&a)?;
/// group.add(&b)?;
///
/// a.borrow_mut().register_handler(EventType::ButtonDown, |event| println!("{:?}", event))?;
///
/// loop {
///     let drained = group.wait(100)?;
///     if drained == 0 {
///         // timed out
///     }
/// }
/// # Ok::<(), gridlink::Error>(())
/// ```
pub struct PollGroup {
    devices: Vec<SharedDevice>,
    capacity: usize,
}

impl PollGroup {
    pub fn new() -> Result<Self> {
        let mut devices = Vec::new();
        devices.try_reserve_exact(INITIAL_CAPACITY)?;

        Ok(Self { devices, capacity: INITIAL_CAPACITY })
    }

    pub fn len(&self) -> usize {
        self.devices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.devices.is_empty()
    }

    /// Number of members the group can hold before it has to grow. Doubles on every growth
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn contains(&self, device: &SharedDevice) -> bool {
        self.position(device).is_some()
    }

    /// Members in iteration order. Removals reorder the group
    pub fn iter(&self) -> impl Iterator<Item = &SharedDevice> + '_ {
        self.devices.iter()
    }

    fn position(&self, device: &SharedDevice) -> Option<usize> {
        self.devices.iter().position(|member| Rc::ptr_eq(member, device))
    }

    pub fn add(&mut self, device: &SharedDevice) -> Result<()> {
        if self.contains(device) {
            return Err(Error::InvalidArgument("device is already in the poll group"));
        }

        if self.devices.len() == self.capacity {
            self.devices.try_reserve_exact(self.capacity)?;
            self.capacity *= 2;
            log::trace!("poll group grew to {} slots", self.capacity);
        }

        log::debug!("adding {} to poll group", device.borrow().id());
        self.devices.push(Rc::clone(device));
        Ok(())
    }

    /// Remove a member. The last member takes over its slot
    pub fn remove(&mut self, device: &SharedDevice) -> Result<()> {
        let index = self
            .position(device)
            .ok_or(Error::InvalidArgument("device is not in the poll group"))?;

        let removed = self.devices.swap_remove(index);
        log::debug!("removed {} from poll group", removed.borrow().id());
        Ok(())
    }

    /// Wait until at least one member has input pending, then drain exactly one event from every
    /// member that does.
    ///
    /// `timeout_ms` of 0 only polls, a negative value waits indefinitely. Returns the number of
    /// events drained, whether or not a handler was registered for them; a clean timeout yields
    /// `Ok(0)`. If any member's descriptor reports an error the whole call fails with
    /// [`Error::Descriptor`] before anything is drained. Handlers must not modify this group.
    pub fn wait(&mut self, timeout_ms: i32) -> Result<usize> {
        if self.devices.is_empty() {
            return Err(Error::InvalidArgument("poll group is empty"));
        }

        let revents = {
            let members: Vec<_> = self.devices.iter().map(|device| device.borrow()).collect();
            let mut fds: Vec<PollFd<'_>> = members
                .iter()
                .map(|device| PollFd::new(device.as_fd(), PollFlags::POLLIN))
                .collect();

            let ready = nix::poll::poll(&mut fds, poll_timeout(timeout_ms))?;
            if ready == 0 {
                return Ok(0);
            }

            let revents: Vec<PollFlags> = fds
                .iter()
                .map(|fd| fd.revents().unwrap_or_else(PollFlags::empty))
                .collect();

            if let Some(index) = revents
                .iter()
                .position(|flags| flags.intersects(PollFlags::POLLERR | PollFlags::POLLNVAL))
            {
                return Err(Error::Descriptor(members[index].id()));
            }

            revents
        };

        let mut drained = 0;
        for (device, flags) in self.devices.iter().zip(revents) {
            if !flags.contains(PollFlags::POLLIN) {
                continue;
            }

            let mut device = device.borrow_mut();
            match device.handle_next_event() {
                Ok(dispatch) => drained += dispatch.drained() as usize,
                Err(e) => log::warn!("fetching an event from {} failed: {}", device.id(), e),
            }
        }

        log::trace!("poll group drained {} event(s)", drained);
        Ok(drained)
    }
}
