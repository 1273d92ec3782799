//! Desktop switcher
//!
//! One cell per virtual desktop, labelled from `_NET_DESKTOP_NAMES` (or the
//! 1-based number). Clicking a cell asks the window manager to switch.

use tracing::debug;

use crate::config::{DesktopsConfig, ThemeConfig};
use crate::error::Result;
use crate::geometry::Rect;
use crate::panel::render::Painter;
use crate::widgets::{ButtonEvent, ButtonKind, PropertyEvent, Theme, Widget, WidgetCx, WidgetSize};

pub struct DesktopsWidget {
    width: i32,
    theme: Theme,
    count: u32,
    current: u32,
    names: Vec<String>,
}

impl DesktopsWidget {
    pub fn new(config: &DesktopsConfig, theme: &ThemeConfig) -> Result<Self> {
        Ok(Self {
            width: config.width,
            theme: Theme::parse(theme, "desktops")?,
            count: 1,
            current: 0,
            names: Vec::new(),
        })
    }

    fn label(&self, desktop: u32) -> String {
        self.names
            .get(desktop as usize)
            .filter(|name| !name.is_empty())
            .cloned()
            .unwrap_or_else(|| (desktop + 1).to_string())
    }

    fn cell(&self, rect: Rect, vertical: bool, desktop: u32) -> Rect {
        let count = self.count.max(1) as i32;
        let n = desktop as i32;
        if vertical {
            let span = rect.height / count;
            Rect::new(rect.x, rect.y + n * span, rect.width, span)
        } else {
            let span = rect.width / count;
            Rect::new(rect.x + n * span, rect.y, span, rect.height)
        }
    }

    fn desktop_at(&self, rect: Rect, vertical: bool, x: i32, y: i32) -> Option<u32> {
        (0..self.count).find(|&d| self.cell(rect, vertical, d).contains(x, y))
    }

    fn refresh(&mut self, cx: &mut WidgetCx<'_>) -> Result<()> {
        let x = cx.x;
        self.count = x
            .get_prop_cardinal(x.root, x.atoms.net_number_of_desktops)?
            .unwrap_or(1)
            .max(1);
        self.current = x.get_prop_cardinal(x.root, x.atoms.net_current_desktop)?.unwrap_or(0);
        self.names = x.get_prop_utf8_list(x.root, x.atoms.net_desktop_names)?;
        debug!("{} desktops, current {}", self.count, self.current);
        cx.redraw();
        Ok(())
    }
}

impl Widget for DesktopsWidget {
    fn name(&self) -> &'static str {
        "desktops"
    }

    fn size(&self) -> WidgetSize {
        WidgetSize::Fixed(self.width)
    }

    fn attach(&mut self, cx: &mut WidgetCx<'_>) -> Result<()> {
        self.refresh(cx)
    }

    fn draw(&mut self, cx: &mut WidgetCx<'_>, painter: &mut dyn Painter) -> Result<()> {
        painter.fill_rect(cx.rect, self.theme.background)?;
        for desktop in 0..self.count {
            let style = if desktop == self.current {
                self.theme.pressed
            } else {
                self.theme.idle
            };
            let cell = self.cell(cx.rect, cx.frame.vertical, desktop);
            let inner = Rect::new(cell.x + 1, cell.y + 1, cell.width - 2, cell.height - 2);
            painter.fill_rect(inner, style.background)?;
            painter.draw_text(inner, &self.label(desktop), style.text, style.background)?;
        }
        Ok(())
    }

    fn button_click(&mut self, cx: &mut WidgetCx<'_>, event: &ButtonEvent) -> Result<()> {
        if event.kind != ButtonKind::Release || event.button != 1 {
            return Ok(());
        }
        match self.desktop_at(cx.rect, cx.frame.vertical, event.x, event.y) {
            Some(desktop) if desktop != self.current => cx.x.switch_desktop(desktop),
            _ => Ok(()),
        }
    }

    fn prop_change(&mut self, cx: &mut WidgetCx<'_>, event: &PropertyEvent) -> Result<()> {
        let x = cx.x;
        let atoms = &x.atoms;
        if event.window != x.root {
            return Ok(());
        }
        if event.atom == atoms.net_current_desktop
            || event.atom == atoms.net_number_of_desktops
            || event.atom == atoms.net_desktop_names
        {
            self.refresh(cx)?;
        }
        Ok(())
    }
}
