//! Drawing surface
//!
//! Widgets paint through `Painter` in panel coordinates. `CorePainter` is
//! the core-protocol implementation: everything goes to an off-screen
//! pixmap which `present` copies onto the panel window in one request.

use std::rc::Rc;

use anyhow::{Context, Result as AnyResult};
use x11rb::connection::Connection;
use x11rb::protocol::xproto::*;
use x11rb::rust_connection::RustConnection;

use crate::error::Result;
use crate::geometry::Rect;
use crate::panel::PanelFrame;
use crate::x::connection::blend_icon;
use crate::x::Icon;

/// Cell size of the core "fixed" font
pub const FONT_WIDTH: i32 = 6;
pub const FONT_HEIGHT: i32 = 13;
const FONT_ASCENT: i32 = 10;

/// Horizontal padding inside a text rectangle
const TEXT_PADDING: i32 = 3;

/// 24-bit RGB colour, also the pixel value on TrueColor visuals
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Color(pub u32);

impl Color {
    /// Parse `#rrggbb`
    pub fn parse(s: &str) -> Option<Self> {
        let hex = s.strip_prefix('#')?;
        if hex.len() != 6 || !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
            return None;
        }
        u32::from_str_radix(hex, 16).ok().map(Color)
    }

    pub fn pixel(self) -> u32 {
        self.0
    }
}

pub trait Painter {
    fn fill_rect(&mut self, rect: Rect, color: Color) -> Result<()>;

    /// Single line of text, vertically centred and clipped to `rect`
    fn draw_text(&mut self, rect: Rect, text: &str, color: Color, background: Color) -> Result<()>;

    /// Icon with its top-left corner at (x, y), blended over `background`
    fn draw_icon(&mut self, x: i32, y: i32, icon: &Icon, background: Color) -> Result<()>;
}

/// Cut `text` to what fits in `width` pixels of fixed-font text, marking
/// the cut with `..`. Characters outside Latin-1 become `?`.
pub fn fit_text(text: &str, width: i32) -> Vec<u8> {
    let room = ((width - 2 * TEXT_PADDING) / FONT_WIDTH).max(0) as usize;
    let bytes: Vec<u8> = text
        .chars()
        .map(|c| u8::try_from(u32::from(c)).unwrap_or(b'?'))
        .collect();
    if bytes.len() <= room {
        return bytes;
    }
    if room <= 2 {
        return bytes[..room].to_vec();
    }
    let mut cut = bytes[..room - 2].to_vec();
    cut.extend_from_slice(b"..");
    cut
}

pub struct CorePainter {
    conn: Rc<RustConnection>,
    window: Window,
    pixmap: Pixmap,
    gc: Gcontext,
    depth: u8,
    width: u16,
    height: u16,
}

impl CorePainter {
    pub fn new(conn: Rc<RustConnection>, screen_num: usize, frame: &PanelFrame) -> AnyResult<Self> {
        let screen = &conn.setup().roots[screen_num];
        let depth = screen.root_depth;
        let (width, height) = (frame.width as u16, frame.height as u16);

        let pixmap = conn.generate_id().context("Failed to allocate pixmap id")?;
        conn.create_pixmap(depth, pixmap, frame.window, width, height)
            .context("Failed to create back buffer")?;

        let font = conn.generate_id().context("Failed to allocate font id")?;
        conn.open_font(font, b"fixed").context("Failed to open font")?;

        let gc = conn.generate_id().context("Failed to allocate gc id")?;
        conn.create_gc(gc, pixmap, &CreateGCAux::new().font(font).graphics_exposures(0))
            .context("Failed to create gc")?;
        conn.close_font(font).context("Failed to close font")?;

        Ok(Self {
            conn,
            window: frame.window,
            pixmap,
            gc,
            depth,
            width,
            height,
        })
    }

    /// Copy the back buffer to the panel window
    pub fn present(&self) -> Result<()> {
        self.conn.copy_area(
            self.pixmap,
            self.window,
            self.gc,
            0,
            0,
            0,
            0,
            self.width,
            self.height,
        )?;
        Ok(())
    }

    fn set_colors(&self, foreground: Color, background: Color) -> Result<()> {
        self.conn.change_gc(
            self.gc,
            &ChangeGCAux::new()
                .foreground(foreground.pixel())
                .background(background.pixel()),
        )?;
        Ok(())
    }
}

impl Painter for CorePainter {
    fn fill_rect(&mut self, rect: Rect, color: Color) -> Result<()> {
        if rect.width <= 0 || rect.height <= 0 {
            return Ok(());
        }
        self.set_colors(color, color)?;
        self.conn.poly_fill_rectangle(
            self.pixmap,
            self.gc,
            &[Rectangle {
                x: rect.x as i16,
                y: rect.y as i16,
                width: rect.width as u16,
                height: rect.height as u16,
            }],
        )?;
        Ok(())
    }

    fn draw_text(&mut self, rect: Rect, text: &str, color: Color, background: Color) -> Result<()> {
        let bytes = fit_text(text, rect.width);
        if bytes.is_empty() {
            return Ok(());
        }
        let baseline = rect.y + (rect.height - FONT_HEIGHT) / 2 + FONT_ASCENT;
        self.set_colors(color, background)?;
        self.conn.image_text8(
            self.pixmap,
            self.gc,
            (rect.x + TEXT_PADDING) as i16,
            baseline as i16,
            &bytes,
        )?;
        Ok(())
    }

    fn draw_icon(&mut self, x: i32, y: i32, icon: &Icon, background: Color) -> Result<()> {
        let data = blend_icon(icon, background.pixel());
        self.conn.put_image(
            ImageFormat::Z_PIXMAP,
            self.pixmap,
            self.gc,
            icon.width as u16,
            icon.height as u16,
            x as i16,
            y as i16,
            0,
            self.depth,
            &data,
        )?;
        Ok(())
    }
}

impl Drop for CorePainter {
    fn drop(&mut self) {
        let _ = self.conn.free_gc(self.gc);
        let _ = self.conn.free_pixmap(self.pixmap);
    }
}
