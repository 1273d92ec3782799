//! Panel window creation
//!
//! A dock-type window along one screen edge, reserving its space with
//! struts and advertising XDND so drag sources send us position messages.

use anyhow::{Context, Result};
use tracing::info;
use x11rb::connection::Connection;
use x11rb::protocol::xproto::*;
use x11rb::rust_connection::RustConnection;
use x11rb::wrapper::ConnectionExt as _;
use x11rb::COPY_FROM_PARENT;

use crate::config::{PanelConfig, PanelPosition};
use crate::panel::PanelFrame;
use crate::x::Atoms;

/// XDND protocol version we speak
const XDND_VERSION: u32 = 5;

/// Where the panel goes on a screen of the given size
pub fn place(config: &PanelConfig, screen_width: i32, screen_height: i32) -> (i32, i32, i32, i32) {
    let t = i32::from(config.thickness);
    match config.position {
        PanelPosition::Top => (0, 0, screen_width, t),
        PanelPosition::Bottom => (0, screen_height - t, screen_width, t),
        PanelPosition::Left => (0, 0, t, screen_height),
        PanelPosition::Right => (screen_width - t, 0, t, screen_height),
    }
}

/// `_NET_WM_STRUT_PARTIAL` for a panel frame: left, right, top, bottom,
/// then the start/end pairs of each edge. `_NET_WM_STRUT` is the first four.
pub fn strut_partial(position: PanelPosition, frame: &PanelFrame) -> [u32; 12] {
    let (x, y) = (frame.x as u32, frame.y as u32);
    let (w, h) = (frame.width as u32, frame.height as u32);
    let mut strut = [0u32; 12];
    match position {
        PanelPosition::Left => {
            strut[0] = w;
            strut[4] = y;
            strut[5] = y + h - 1;
        }
        PanelPosition::Right => {
            strut[1] = w;
            strut[6] = y;
            strut[7] = y + h - 1;
        }
        PanelPosition::Top => {
            strut[2] = h;
            strut[8] = x;
            strut[9] = x + w - 1;
        }
        PanelPosition::Bottom => {
            strut[3] = h;
            strut[10] = x;
            strut[11] = x + w - 1;
        }
    }
    strut
}

/// Create and map the panel window
pub fn create_panel_window(
    conn: &RustConnection,
    screen_num: usize,
    atoms: &Atoms,
    config: &PanelConfig,
) -> Result<PanelFrame> {
    let screen = &conn.setup().roots[screen_num];
    let (x, y, width, height) = place(
        config,
        i32::from(screen.width_in_pixels),
        i32::from(screen.height_in_pixels),
    );

    let window = conn.generate_id().context("Failed to allocate panel window id")?;
    conn.create_window(
        COPY_FROM_PARENT as u8,
        window,
        screen.root,
        x as i16,
        y as i16,
        width as u16,
        height as u16,
        0,
        WindowClass::INPUT_OUTPUT,
        screen.root_visual,
        &CreateWindowAux::new()
            .background_pixel(screen.black_pixel)
            .event_mask(
                EventMask::BUTTON_PRESS
                    | EventMask::BUTTON_RELEASE
                    | EventMask::POINTER_MOTION
                    | EventMask::ENTER_WINDOW
                    | EventMask::LEAVE_WINDOW
                    | EventMask::EXPOSURE
                    | EventMask::STRUCTURE_NOTIFY
                    | EventMask::PROPERTY_CHANGE,
            ),
    )
    .context("Failed to create panel window")?;

    let frame = PanelFrame {
        window,
        x,
        y,
        width,
        height,
        vertical: config.position.is_vertical(),
    };

    // Set window type to DOCK
    conn.change_property32(
        PropMode::REPLACE,
        window,
        atoms.net_wm_window_type,
        AtomEnum::ATOM,
        &[atoms.net_wm_window_type_dock],
    )?;

    // Reserve our edge of the screen
    let strut = strut_partial(config.position, &frame);
    conn.change_property32(PropMode::REPLACE, window, atoms.net_wm_strut, AtomEnum::CARDINAL, &strut[..4])?;
    conn.change_property32(PropMode::REPLACE, window, atoms.net_wm_strut_partial, AtomEnum::CARDINAL, &strut)?;

    conn.change_property32(PropMode::REPLACE, window, atoms.xdnd_aware, AtomEnum::ATOM, &[XDND_VERSION])?;

    conn.change_property8(PropMode::REPLACE, window, AtomEnum::WM_NAME, AtomEnum::STRING, b"taskstrip")?;

    conn.map_window(window)?;
    conn.flush()?;

    info!("Panel window created: {} at {}x{}+{}+{}", window, width, height, x, y);
    Ok(frame)
}
