use std::os::unix::io::AsFd;

use nix::poll::{PollFd, PollFlags};

use crate::{Device, Dispatch, Error, Event, EventType, Result};

impl Device {
    /// Install `handler` for one event type, replacing whatever was registered before.
    ///
    /// The type can be given as an [`EventType`] or as a raw index; an index outside the
    /// enumeration fails with [`Error::InvalidArgument`] and leaves the handlers untouched.
    ///
    /// ```no_run
    /// # let mut device: gridlink::Device = unimplemented!();
    /// use gridlink::EventType;
    ///
    /// device.register_handler(EventType::ButtonDown, |event| {
    ///     println!("pressed {:?}", event.grid());
    /// })?;
    /// # Ok::<(), gridlink::Error>(())
    /// ```
    pub fn register_handler<T>(&mut self, event_type: T, handler: impl FnMut(&Event) + 'static) -> Result<()>
    where
        T: TryInto<EventType>,
        Error: From<T::Error>,
    {
        let event_type = event_type.try_into()?;
        self.handlers[event_type.index()] = Some(Box::new(handler));
        Ok(())
    }

    pub fn unregister_handler<T>(&mut self, event_type: T) -> Result<()>
    where
        T: TryInto<EventType>,
        Error: From<T::Error>,
    {
        let event_type = event_type.try_into()?;
        self.handlers[event_type.index()] = None;
        Ok(())
    }

    pub fn has_handler(&self, event_type: EventType) -> bool {
        self.handlers[event_type.index()].is_some()
    }

    /// Fetch the next pending event without blocking. `Ok(None)` means nothing is pending
    pub fn next_event(&mut self) -> Result<Option<Event>> {
        let kind = self.backend.next_event(self.geometry)?;
        Ok(kind.map(|kind| Event { device: self.id, kind }))
    }

    /// Fetch the next pending event and run the handler registered for its type, if any
    pub fn handle_next_event(&mut self) -> Result<Dispatch> {
        let event = match self.next_event()? {
            Some(event) => event,
            None => return Ok(Dispatch::Idle),
        };

        let event_type = event.event_type();
        match &mut self.handlers[event_type.index()] {
            Some(handler) => {
                log::trace!("{}: dispatching {:?}", self.id, event.kind);
                (handler)(&event);
                Ok(Dispatch::Handled(event_type))
            }
            None => Ok(Dispatch::Unhandled(event_type)),
        }
    }

    /// Block until the device has input pending. `timeout_ms` of 0 only polls, a negative value
    /// waits indefinitely. Returns whether input is pending.
    pub fn wait_for_input(&self, timeout_ms: i32) -> Result<bool> {
        let mut fds = [PollFd::new(self.as_fd(), PollFlags::POLLIN)];
        let ready = nix::poll::poll(&mut fds, crate::poll_group::poll_timeout(timeout_ms))?;
        if ready == 0 {
            return Ok(false);
        }

        let revents = fds[0].revents().unwrap_or_else(PollFlags::empty);
        if revents.intersects(PollFlags::POLLERR | PollFlags::POLLNVAL) {
            return Err(Error::Descriptor(self.id));
        }

        Ok(revents.contains(PollFlags::POLLIN))
    }
}
