//! `Transport` over a live x11rb connection

use std::cell::Cell;
use std::rc::Rc;

use x11rb::connection::Connection;
use x11rb::protocol::xproto::*;
use x11rb::rust_connection::RustConnection;
use x11rb::wrapper::ConnectionExt as _;
use x11rb::{COPY_FROM_PARENT, NONE};

use crate::x::{ClientMessage, Icon, RawProperty, RequestError, Transport};

/// Glyph of the fleur cursor in the core "cursor" font
const XC_FLEUR: u16 = 52;

/// Background the drag icon is blended against
const DRAG_BACKGROUND: u32 = 0x000000;

pub struct X11Transport {
    conn: Rc<RustConnection>,
    root: Window,
    root_depth: u8,
    drag_cursor: Cell<Option<Cursor>>,
}

impl X11Transport {
    pub fn new(conn: Rc<RustConnection>, screen_num: usize) -> Self {
        let screen = &conn.setup().roots[screen_num];
        let root = screen.root;
        let root_depth = screen.root_depth;
        Self {
            conn,
            root,
            root_depth,
            drag_cursor: Cell::new(None),
        }
    }

    fn drag_cursor(&self) -> Result<Cursor, RequestError> {
        if let Some(cursor) = self.drag_cursor.get() {
            return Ok(cursor);
        }
        let font = self.conn.generate_id()?;
        self.conn.open_font(font, b"cursor")?;
        let cursor = self.conn.generate_id()?;
        self.conn.create_glyph_cursor(
            cursor,
            font,
            font,
            XC_FLEUR,
            XC_FLEUR + 1,
            0,
            0,
            0,
            0xFFFF,
            0xFFFF,
            0xFFFF,
        )?;
        self.conn.close_font(font)?;
        self.drag_cursor.set(Some(cursor));
        Ok(cursor)
    }
}

impl Transport for X11Transport {
    fn get_property(
        &self,
        window: Window,
        property: Atom,
        type_: Atom,
    ) -> Result<Option<RawProperty>, RequestError> {
        let reply = self
            .conn
            .get_property(false, window, property, type_, 0, u32::MAX / 4)?
            .reply()?;

        let any_type: Atom = AtomEnum::ANY.into();
        if reply.type_ == NONE || reply.format == 0 {
            return Ok(None);
        }
        if type_ != any_type && reply.type_ != type_ {
            return Ok(None);
        }
        Ok(Some(RawProperty {
            type_: reply.type_,
            format: reply.format,
            items: reply.value_len,
            data: reply.value,
        }))
    }

    fn change_property32(
        &self,
        window: Window,
        property: Atom,
        type_: Atom,
        data: &[u32],
    ) -> Result<(), RequestError> {
        self.conn
            .change_property32(PropMode::REPLACE, window, property, type_, data)?
            .check()?;
        Ok(())
    }

    fn select_property_changes(&self, window: Window) -> Result<(), RequestError> {
        self.conn
            .change_window_attributes(
                window,
                &ChangeWindowAttributesAux::new().event_mask(EventMask::PROPERTY_CHANGE),
            )?
            .check()?;
        Ok(())
    }

    fn send_client_message(
        &self,
        destination: Window,
        event_mask: EventMask,
        message: &ClientMessage,
    ) -> Result<(), RequestError> {
        let event = ClientMessageEvent::new(32, message.window, message.message_type, message.data);
        self.conn.send_event(false, destination, event_mask, event)?;
        Ok(())
    }

    fn raise_window(&self, window: Window) -> Result<(), RequestError> {
        self.conn
            .configure_window(window, &ConfigureWindowAux::new().stack_mode(StackMode::ABOVE))?;
        Ok(())
    }

    fn create_drag_window(&self, x: i32, y: i32, icon: &Icon) -> Result<Window, RequestError> {
        let (width, height) = (icon.width as u16, icon.height as u16);

        // Background pixmap carrying the icon
        let pixmap = self.conn.generate_id()?;
        self.conn.create_pixmap(self.root_depth, pixmap, self.root, width, height)?;
        let gc = self.conn.generate_id()?;
        self.conn.create_gc(gc, pixmap, &CreateGCAux::new().graphics_exposures(0))?;
        let data = blend_icon(icon, DRAG_BACKGROUND);
        self.conn.put_image(
            ImageFormat::Z_PIXMAP,
            pixmap,
            gc,
            width,
            height,
            0,
            0,
            0,
            self.root_depth,
            &data,
        )?;
        self.conn.free_gc(gc)?;

        let window = self.conn.generate_id()?;
        self.conn.create_window(
            COPY_FROM_PARENT as u8,
            window,
            self.root,
            x as i16,
            y as i16,
            width,
            height,
            0,
            WindowClass::INPUT_OUTPUT,
            COPY_FROM_PARENT,
            &CreateWindowAux::new().override_redirect(1).background_pixmap(pixmap),
        )?;
        self.conn.free_pixmap(pixmap)?;
        self.conn.map_window(window)?;
        Ok(window)
    }

    fn move_window(&self, window: Window, x: i32, y: i32) -> Result<(), RequestError> {
        self.conn
            .configure_window(window, &ConfigureWindowAux::new().x(x).y(y))?;
        Ok(())
    }

    fn destroy_window(&self, window: Window) -> Result<(), RequestError> {
        self.conn.destroy_window(window)?;
        Ok(())
    }

    fn set_drag_cursor(&self, window: Window, dragging: bool) -> Result<(), RequestError> {
        let cursor = if dragging { self.drag_cursor()? } else { NONE };
        self.conn
            .change_window_attributes(window, &ChangeWindowAttributesAux::new().cursor(cursor))?;
        Ok(())
    }

    fn flush(&self) -> Result<(), RequestError> {
        self.conn.flush()?;
        Ok(())
    }
}

/// Alpha-blend an ARGB icon over a solid colour into 32bpp BGRX bytes
pub fn blend_icon(icon: &Icon, background: u32) -> Vec<u8> {
    let mut data = Vec::with_capacity(icon.pixels.len() * 4);
    for &argb in &icon.pixels {
        let alpha = argb >> 24;
        let mix = |shift: u32| -> u8 {
            let fg = (argb >> shift) & 0xFF;
            let bg = (background >> shift) & 0xFF;
            ((fg * alpha + bg * (255 - alpha)) / 255) as u8
        };
        data.extend_from_slice(&[mix(0), mix(8), mix(16), 0]);
    }
    data
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blend_respects_alpha() {
        let icon = Icon {
            width: 2,
            height: 1,
            pixels: vec![0xFF11_2233, 0x0011_2233],
        };
        let data = blend_icon(&icon, 0x00AA_BBCC);
        assert_eq!(&data[0..4], &[0x33, 0x22, 0x11, 0]);
        assert_eq!(&data[4..8], &[0xCC, 0xBB, 0xAA, 0]);
    }
}
