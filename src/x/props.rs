//! Window property service
//!
//! Typed reads and writes of window properties on top of a single generic
//! "read property" primitive, the hidden/iconified queries the taskbar
//! filters with, the window name fallback chain, and the client message
//! helpers.
//!
//! Protocol errors never escape from here: a failed read is "no value", a
//! failed write is dropped, and either is recorded in the active error trap
//! (or logged when there is none). Only connection loss is returned as an
//! error.

use tracing::{debug, warn};
use x11rb::protocol::xproto::{Atom, EventMask, Window};
use x11rb::CURRENT_TIME;

use crate::error::{PanelError, Result};
use crate::x::atoms::NameSource;
use crate::x::trap::{ErrorTrap, TrapStack};
use crate::x::{Atoms, ClientMessage, Icon, RawProperty, RequestError, Transport};

/// Name used when a window publishes none of the name properties
pub const UNKNOWN_NAME: &str = "<unknown>";

/// ICCCM WM_STATE value for an iconified window
pub const ICONIC_STATE: u32 = 3;

/// `_NET_WM_DESKTOP` value meaning "all desktops"
pub const ALL_DESKTOPS: i32 = -1;

/// Display connection plus the state shared by every widget
pub struct XContext {
    transport: Box<dyn Transport>,
    pub atoms: Atoms,
    pub root: Window,
    traps: TrapStack,
}

impl XContext {
    pub fn new(transport: Box<dyn Transport>, atoms: Atoms, root: Window) -> Self {
        Self {
            transport,
            atoms,
            root,
            traps: TrapStack::default(),
        }
    }

    // ------------------------------------------------------------------
    // Error handling
    // ------------------------------------------------------------------

    /// Enter an error trap. Errors from requests issued while the guard is
    /// alive are recorded in it instead of being logged.
    pub fn trap_errors(&self) -> ErrorTrap<'_> {
        self.traps.enter()
    }

    /// Absorb a request failure. Protocol errors are recorded or logged;
    /// connection loss is returned so the caller can propagate it.
    pub fn absorb(&self, err: RequestError) -> Result<()> {
        match err {
            RequestError::Connection(e) => Err(PanelError::ConnectionLost(e)),
            err => {
                if !self.traps.record() {
                    if err.is_bad_window() {
                        debug!("X error ignored: {}", err);
                    } else {
                        warn!("X error: {}", err);
                    }
                }
                Ok(())
            }
        }
    }

    fn request<T>(&self, result: std::result::Result<T, RequestError>) -> Result<Option<T>> {
        match result {
            Ok(value) => Ok(Some(value)),
            Err(err) => self.absorb(err).map(|()| None),
        }
    }

    // ------------------------------------------------------------------
    // Reads
    // ------------------------------------------------------------------

    /// Generic read: raw buffer plus item count, `None` when unavailable
    pub fn get_prop_data(&self, window: Window, property: Atom, type_: Atom) -> Result<Option<RawProperty>> {
        Ok(self.request(self.transport.get_property(window, property, type_))?.flatten())
    }

    /// First CARDINAL item of a property
    pub fn get_prop_cardinal(&self, window: Window, property: Atom) -> Result<Option<u32>> {
        let data = self.get_prop_data(window, property, self.atoms.cardinal)?;
        Ok(data.and_then(|p| p.value32().next()))
    }

    /// CARDINAL read as a signed integer, 0 when unset
    pub fn get_prop_int(&self, window: Window, property: Atom) -> Result<i32> {
        Ok(self.get_prop_cardinal(window, property)?.map(|v| v as i32).unwrap_or(0))
    }

    pub fn get_prop_window(&self, window: Window, property: Atom) -> Result<Option<Window>> {
        let data = self.get_prop_data(window, property, self.atoms.window)?;
        Ok(data.and_then(|p| p.value32().next()).filter(|&w| w != x11rb::NONE))
    }

    pub fn get_prop_pixmap(&self, window: Window, property: Atom) -> Result<Option<u32>> {
        let data = self.get_prop_data(window, property, self.atoms.pixmap)?;
        Ok(data.and_then(|p| p.value32().next()).filter(|&p| p != x11rb::NONE))
    }

    pub fn get_prop_windows(&self, window: Window, property: Atom) -> Result<Vec<Window>> {
        let data = self.get_prop_data(window, property, self.atoms.window)?;
        Ok(data.map(|p| p.value32().collect()).unwrap_or_default())
    }

    pub fn get_prop_atoms(&self, window: Window, property: Atom) -> Result<Vec<Atom>> {
        let data = self.get_prop_data(window, property, self.atoms.atom)?;
        Ok(data.map(|p| p.value32().collect()).unwrap_or_default())
    }

    pub fn get_prop_cardinals(&self, window: Window, property: Atom) -> Result<Vec<u32>> {
        let data = self.get_prop_data(window, property, self.atoms.cardinal)?;
        Ok(data.map(|p| p.value32().collect()).unwrap_or_default())
    }

    /// NUL separated UTF-8 list (e.g. `_NET_DESKTOP_NAMES`)
    pub fn get_prop_utf8_list(&self, window: Window, property: Atom) -> Result<Vec<String>> {
        let data = self.get_prop_data(window, property, self.atoms.utf8_string)?;
        let Some(data) = data else {
            return Ok(Vec::new());
        };
        let bytes = data.data.strip_suffix(&[0]).unwrap_or(&data.data);
        if bytes.is_empty() {
            return Ok(Vec::new());
        }
        Ok(bytes.split(|&b| b == 0).map(|s| String::from_utf8_lossy(s).into_owned()).collect())
    }

    /// `_NET_WM_DESKTOP` of a window; `ALL_DESKTOPS` for sticky windows
    pub fn window_desktop(&self, window: Window) -> Result<i32> {
        self.get_prop_int(window, self.atoms.net_wm_desktop)
    }

    /// Should the window stay off the taskbar? True for dock and desktop
    /// windows, and for windows asking to skip the taskbar.
    pub fn is_window_hidden(&self, window: Window) -> Result<bool> {
        let types = self.get_prop_atoms(window, self.atoms.net_wm_window_type)?;
        if types
            .iter()
            .any(|&t| t == self.atoms.net_wm_window_type_dock || t == self.atoms.net_wm_window_type_desktop)
        {
            return Ok(true);
        }

        let states = self.get_prop_atoms(window, self.atoms.net_wm_state)?;
        Ok(states.contains(&self.atoms.net_wm_state_skip_taskbar))
    }

    /// Iconic WM_STATE, or `_NET_WM_STATE_HIDDEN`
    pub fn is_window_iconified(&self, window: Window) -> Result<bool> {
        let wm_state = self.get_prop_data(window, self.atoms.wm_state, self.atoms.wm_state)?;
        let mut iconic = wm_state.and_then(|p| p.value32().next()) == Some(ICONIC_STATE);

        let states = self.get_prop_atoms(window, self.atoms.net_wm_state)?;
        if states.contains(&self.atoms.net_wm_state_hidden) {
            iconic = true;
        }
        Ok(iconic)
    }

    /// Resolve a window's display name.
    ///
    /// `source` caches the property the name came from last time; it is
    /// tried first, then the full fallback chain. On success the cache points
    /// at the property that answered; when nothing answers the cache is
    /// cleared and the placeholder name is returned.
    pub fn window_name(&self, window: Window, source: &mut Option<NameSource>) -> Result<String> {
        if let Some(cached) = *source {
            if let Some(data) = self.get_prop_data(window, cached.atom, cached.type_)? {
                return Ok(data.to_text());
            }
        }

        for candidate in self.atoms.name_sources() {
            if let Some(data) = self.get_prop_data(window, candidate.atom, candidate.type_)? {
                *source = Some(candidate);
                return Ok(data.to_text());
            }
        }

        *source = None;
        Ok(UNKNOWN_NAME.to_string())
    }

    // ------------------------------------------------------------------
    // Writes and requests
    // ------------------------------------------------------------------

    pub fn set_prop_cardinals(&self, window: Window, property: Atom, values: &[u32]) -> Result<()> {
        let cardinal = self.atoms.cardinal;
        self.request(self.transport.change_property32(window, property, cardinal, values))?;
        Ok(())
    }

    pub fn select_property_changes(&self, window: Window) -> Result<()> {
        self.request(self.transport.select_property_changes(window))?;
        Ok(())
    }

    /// Window-manager directed request, broadcast through the root window
    pub fn send_netwm_message(&self, window: Window, message_type: Atom, data: [u32; 5]) -> Result<()> {
        let message = ClientMessage {
            window,
            message_type,
            data,
        };
        let mask = EventMask::SUBSTRUCTURE_NOTIFY | EventMask::SUBSTRUCTURE_REDIRECT;
        self.request(self.transport.send_client_message(self.root, mask, &message))?;
        Ok(())
    }

    /// Message sent straight to the target window (XDND replies)
    pub fn send_dnd_message(&self, window: Window, message_type: Atom, data: [u32; 5]) -> Result<()> {
        let message = ClientMessage {
            window,
            message_type,
            data,
        };
        self.request(self.transport.send_client_message(window, EventMask::NO_EVENT, &message))?;
        Ok(())
    }

    /// Ask the window manager to focus and raise a window
    pub fn activate_window(&self, window: Window) -> Result<()> {
        // source indication 2 = pager/taskbar
        self.send_netwm_message(window, self.atoms.net_active_window, [2, CURRENT_TIME, 0, 0, 0])?;
        self.request(self.transport.raise_window(window))?;
        Ok(())
    }

    pub fn close_window(&self, window: Window) -> Result<()> {
        self.send_netwm_message(window, self.atoms.net_close_window, [CURRENT_TIME, 2, 0, 0, 0])
    }

    /// ICCCM iconify request (what XIconifyWindow sends)
    pub fn iconify_window(&self, window: Window) -> Result<()> {
        self.send_netwm_message(window, self.atoms.wm_change_state, [ICONIC_STATE, 0, 0, 0, 0])
    }

    pub fn switch_desktop(&self, desktop: u32) -> Result<()> {
        self.send_netwm_message(self.root, self.atoms.net_current_desktop, [desktop, CURRENT_TIME, 0, 0, 0])
    }

    pub fn create_drag_window(&self, x: i32, y: i32, icon: &Icon) -> Result<Option<Window>> {
        self.request(self.transport.create_drag_window(x, y, icon))
    }

    pub fn move_window(&self, window: Window, x: i32, y: i32) -> Result<()> {
        self.request(self.transport.move_window(window, x, y))?;
        Ok(())
    }

    pub fn destroy_window(&self, window: Window) -> Result<()> {
        self.request(self.transport.destroy_window(window))?;
        Ok(())
    }

    pub fn set_drag_cursor(&self, window: Window, dragging: bool) -> Result<()> {
        self.request(self.transport.set_drag_cursor(window, dragging))?;
        Ok(())
    }

    pub fn flush(&self) -> Result<()> {
        self.request(self.transport.flush())?;
        Ok(())
    }
}
