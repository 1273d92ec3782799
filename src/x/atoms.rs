//! Interned atoms used by the panel
//!
//! EWMH root/client hints, the ICCCM legacy properties used as name
//! fallbacks, and the XDND subset the taskbar answers.

use x11rb::connection::Connection;
use x11rb::protocol::xproto::{Atom, AtomEnum, ConnectionExt as _};

use crate::x::RequestError;

/// Holds all atoms the panel reads, writes or matches against
#[derive(Debug, Clone)]
pub struct Atoms {
    // Predefined core atoms
    pub string: Atom,
    pub cardinal: Atom,
    pub window: Atom,
    pub atom: Atom,
    pub pixmap: Atom,
    pub wm_name: Atom,
    pub wm_icon_name: Atom,
    pub wm_hints: Atom,
    // ICCCM
    pub wm_state: Atom,
    pub wm_change_state: Atom,
    pub utf8_string: Atom,
    // Root window hints
    pub net_client_list: Atom,
    pub net_active_window: Atom,
    pub net_current_desktop: Atom,
    pub net_number_of_desktops: Atom,
    pub net_desktop_names: Atom,
    pub net_close_window: Atom,
    // Client hints
    pub net_wm_name: Atom,
    pub net_wm_visible_name: Atom,
    pub net_wm_icon_name: Atom,
    pub net_wm_visible_icon_name: Atom,
    pub net_wm_desktop: Atom,
    pub net_wm_icon: Atom,
    pub net_wm_icon_geometry: Atom,
    pub net_wm_window_type: Atom,
    pub net_wm_window_type_dock: Atom,
    pub net_wm_window_type_desktop: Atom,
    pub net_wm_state: Atom,
    pub net_wm_state_skip_taskbar: Atom,
    pub net_wm_state_hidden: Atom,
    pub net_wm_strut: Atom,
    pub net_wm_strut_partial: Atom,
    // XDND
    pub xdnd_aware: Atom,
    pub xdnd_position: Atom,
    pub xdnd_status: Atom,
}

impl Atoms {
    /// Intern all required atoms on a live connection
    pub fn new<C: Connection>(conn: &C) -> Result<Self, RequestError> {
        Self::from_interner(|name| Ok(conn.intern_atom(false, name.as_bytes())?.reply()?.atom))
    }

    /// Build the table from any name -> atom resolver
    pub fn from_interner<F>(mut intern: F) -> Result<Self, RequestError>
    where
        F: FnMut(&str) -> Result<Atom, RequestError>,
    {
        Ok(Self {
            string: AtomEnum::STRING.into(),
            cardinal: AtomEnum::CARDINAL.into(),
            window: AtomEnum::WINDOW.into(),
            atom: AtomEnum::ATOM.into(),
            pixmap: AtomEnum::PIXMAP.into(),
            wm_name: AtomEnum::WM_NAME.into(),
            wm_icon_name: AtomEnum::WM_ICON_NAME.into(),
            wm_hints: AtomEnum::WM_HINTS.into(),
            wm_state: intern("WM_STATE")?,
            wm_change_state: intern("WM_CHANGE_STATE")?,
            utf8_string: intern("UTF8_STRING")?,
            net_client_list: intern("_NET_CLIENT_LIST")?,
            net_active_window: intern("_NET_ACTIVE_WINDOW")?,
            net_current_desktop: intern("_NET_CURRENT_DESKTOP")?,
            net_number_of_desktops: intern("_NET_NUMBER_OF_DESKTOPS")?,
            net_desktop_names: intern("_NET_DESKTOP_NAMES")?,
            net_close_window: intern("_NET_CLOSE_WINDOW")?,
            net_wm_name: intern("_NET_WM_NAME")?,
            net_wm_visible_name: intern("_NET_WM_VISIBLE_NAME")?,
            net_wm_icon_name: intern("_NET_WM_ICON_NAME")?,
            net_wm_visible_icon_name: intern("_NET_WM_VISIBLE_ICON_NAME")?,
            net_wm_desktop: intern("_NET_WM_DESKTOP")?,
            net_wm_icon: intern("_NET_WM_ICON")?,
            net_wm_icon_geometry: intern("_NET_WM_ICON_GEOMETRY")?,
            net_wm_window_type: intern("_NET_WM_WINDOW_TYPE")?,
            net_wm_window_type_dock: intern("_NET_WM_WINDOW_TYPE_DOCK")?,
            net_wm_window_type_desktop: intern("_NET_WM_WINDOW_TYPE_DESKTOP")?,
            net_wm_state: intern("_NET_WM_STATE")?,
            net_wm_state_skip_taskbar: intern("_NET_WM_STATE_SKIP_TASKBAR")?,
            net_wm_state_hidden: intern("_NET_WM_STATE_HIDDEN")?,
            net_wm_strut: intern("_NET_WM_STRUT")?,
            net_wm_strut_partial: intern("_NET_WM_STRUT_PARTIAL")?,
            xdnd_aware: intern("XdndAware")?,
            xdnd_position: intern("XdndPosition")?,
            xdnd_status: intern("XdndStatus")?,
        })
    }

    /// Atoms that may carry a window's display name, in lookup order
    pub fn name_sources(&self) -> [NameSource; 6] {
        [
            NameSource::new(self.net_wm_visible_icon_name, self.utf8_string),
            NameSource::new(self.net_wm_icon_name, self.utf8_string),
            NameSource::new(self.wm_icon_name, self.string),
            NameSource::new(self.net_wm_visible_name, self.utf8_string),
            NameSource::new(self.net_wm_name, self.utf8_string),
            NameSource::new(self.wm_name, self.string),
        ]
    }
}

/// Property + type pair a window name was read from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NameSource {
    pub atom: Atom,
    pub type_: Atom,
}

impl NameSource {
    pub fn new(atom: Atom, type_: Atom) -> Self {
        Self { atom, type_ }
    }
}
