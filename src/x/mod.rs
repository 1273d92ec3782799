//! X11 layer
//!
//! `Transport` is the raw request surface the panel needs from the display
//! server. `XContext` (in `props`) layers typed property access, the error
//! trap and message helpers on top of it.

pub mod atoms;
pub mod connection;
pub mod events;
pub mod icon;
pub mod props;
pub mod trap;

use thiserror::Error;
use x11rb::errors::{ConnectionError, ReplyError, ReplyOrIdError};
use x11rb::protocol::ErrorKind;
use x11rb::protocol::xproto::{Atom, EventMask, Window};

pub use atoms::Atoms;
pub use icon::Icon;
pub use props::XContext;

/// Failure of a single request against the display server
#[derive(Debug, Error)]
pub enum RequestError {
    /// The server answered with a protocol error (BadWindow, BadAtom, ...)
    #[error("{request} failed: {kind:?} (resource 0x{resource:x})")]
    Protocol {
        kind: ErrorKind,
        resource: u32,
        request: &'static str,
    },

    /// The connection itself failed
    #[error(transparent)]
    Connection(#[from] ConnectionError),

    /// The client ran out of resource ids
    #[error("X resource ids exhausted")]
    IdsExhausted,
}

impl RequestError {
    pub fn is_bad_window(&self) -> bool {
        matches!(self, RequestError::Protocol { kind: ErrorKind::Window, .. })
    }
}

impl From<x11rb::x11_utils::X11Error> for RequestError {
    fn from(err: x11rb::x11_utils::X11Error) -> Self {
        RequestError::Protocol {
            kind: err.error_kind,
            resource: err.bad_value,
            request: err.request_name.unwrap_or("request"),
        }
    }
}

impl From<ReplyError> for RequestError {
    fn from(err: ReplyError) -> Self {
        match err {
            ReplyError::ConnectionError(e) => RequestError::Connection(e),
            ReplyError::X11Error(e) => e.into(),
        }
    }
}

impl From<ReplyOrIdError> for RequestError {
    fn from(err: ReplyOrIdError) -> Self {
        match err {
            ReplyOrIdError::IdsExhausted => RequestError::IdsExhausted,
            ReplyOrIdError::ConnectionError(e) => RequestError::Connection(e),
            ReplyOrIdError::X11Error(e) => e.into(),
        }
    }
}

/// Raw property value: buffer plus item count, as returned by GetProperty
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawProperty {
    pub type_: Atom,
    pub format: u8,
    pub items: u32,
    pub data: Vec<u8>,
}

impl RawProperty {
    #[cfg(test)]
    pub fn from_u32s(type_: Atom, values: &[u32]) -> Self {
        Self {
            type_,
            format: 32,
            items: values.len() as u32,
            data: values.iter().flat_map(|v| v.to_ne_bytes()).collect(),
        }
    }

    #[cfg(test)]
    pub fn from_bytes(type_: Atom, bytes: &[u8]) -> Self {
        Self {
            type_,
            format: 8,
            items: bytes.len() as u32,
            data: bytes.to_vec(),
        }
    }

    /// Interpret the buffer as 32-bit items
    pub fn value32(&self) -> impl Iterator<Item = u32> + '_ {
        let data: &[u8] = if self.format == 32 { &self.data } else { &[] };
        data.chunks_exact(4).map(|c| u32::from_ne_bytes([c[0], c[1], c[2], c[3]]))
    }

    /// Interpret the buffer as text, dropping a trailing NUL
    pub fn to_text(&self) -> String {
        let bytes = self.data.strip_suffix(&[0]).unwrap_or(&self.data);
        String::from_utf8_lossy(bytes).into_owned()
    }
}

/// Format-32 client message payload
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClientMessage {
    pub window: Window,
    pub message_type: Atom,
    pub data: [u32; 5],
}

/// Raw request surface of the display server
///
/// Property reads and writes and input selection are checked: a protocol
/// error comes back from the call itself, so an error trap around it sees
/// it. The remaining requests are fire-and-forget; their errors arrive later
/// as `Event::Error` and go through `XContext::absorb` untrapped.
pub trait Transport {
    /// Read a whole property. `Ok(None)` when the property is unset or has a
    /// different type than requested.
    fn get_property(
        &self,
        window: Window,
        property: Atom,
        type_: Atom,
    ) -> Result<Option<RawProperty>, RequestError>;

    /// Replace a 32-bit property (checked round trip)
    fn change_property32(
        &self,
        window: Window,
        property: Atom,
        type_: Atom,
        data: &[u32],
    ) -> Result<(), RequestError>;

    /// Subscribe to PropertyNotify on a foreign window (checked round trip)
    fn select_property_changes(&self, window: Window) -> Result<(), RequestError>;

    fn send_client_message(
        &self,
        destination: Window,
        event_mask: EventMask,
        message: &ClientMessage,
    ) -> Result<(), RequestError>;

    fn raise_window(&self, window: Window) -> Result<(), RequestError>;

    /// Override-redirect window showing `icon`, used as drag feedback
    fn create_drag_window(&self, x: i32, y: i32, icon: &Icon) -> Result<Window, RequestError>;

    fn move_window(&self, window: Window, x: i32, y: i32) -> Result<(), RequestError>;

    fn destroy_window(&self, window: Window) -> Result<(), RequestError>;

    /// Switch `window`'s cursor between the drag glyph and the default
    fn set_drag_cursor(&self, window: Window, dragging: bool) -> Result<(), RequestError>;

    fn flush(&self) -> Result<(), RequestError>;
}
