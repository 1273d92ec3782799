//! X11 event readiness
//!
//! Waits for the X11 file descriptor on the event loop's own thread with
//! mio, so the loop can sleep until either an event arrives or the next
//! clock tick is due. There is no background polling thread.

use std::io;
use std::os::unix::io::AsRawFd;
use std::time::Duration;

use anyhow::{Context, Result};
use mio::unix::SourceFd;
use mio::{Events, Interest, Poll, Token};
use x11rb::rust_connection::RustConnection;

const X11_TOKEN: Token = Token(0);

pub struct EventSource {
    poll: Poll,
    events: Events,
}

impl EventSource {
    pub fn new(conn: &RustConnection) -> Result<Self> {
        let fd = conn.stream().as_raw_fd();
        let poll = Poll::new().context("Failed to create mio Poll")?;
        poll.registry()
            .register(&mut SourceFd(&fd), X11_TOKEN, Interest::READABLE)
            .context("Failed to register X11 FD with mio")?;

        Ok(Self {
            poll,
            events: Events::with_capacity(1),
        })
    }

    /// Block until the X11 socket is readable or `timeout` elapses.
    /// Returns true when the socket became readable.
    pub fn wait_readable(&mut self, timeout: Duration) -> Result<bool> {
        match self.poll.poll(&mut self.events, Some(timeout)) {
            Ok(()) => Ok(self.events.iter().any(|event| event.token() == X11_TOKEN)),
            Err(err) if err.kind() == io::ErrorKind::Interrupted => Ok(false),
            Err(err) => Err(err).context("X11 socket poll failed"),
        }
    }
}
