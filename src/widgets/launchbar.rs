//! Launch bar: a row of labelled buttons that each run a shell command

use std::process::Command;

use tracing::{info, warn};

use crate::config::{LaunchItem, LaunchbarConfig, ThemeConfig};
use crate::error::Result;
use crate::geometry::Rect;
use crate::panel::render::Painter;
use crate::widgets::{ButtonEvent, ButtonKind, MotionEvent, Theme, Widget, WidgetCx, WidgetSize};

pub struct LaunchbarWidget {
    item_width: i32,
    items: Vec<LaunchItem>,
    theme: Theme,
    hovered: Option<usize>,
}

impl LaunchbarWidget {
    pub fn new(config: &LaunchbarConfig, theme: &ThemeConfig) -> Result<Self> {
        Ok(Self {
            item_width: config.item_width,
            items: config.items.clone(),
            theme: Theme::parse(theme, "launchbar")?,
            hovered: None,
        })
    }

    fn item_rect(&self, rect: Rect, vertical: bool, index: usize) -> Rect {
        let offset = index as i32 * self.item_width;
        if vertical {
            Rect::new(rect.x, rect.y + offset, rect.width, self.item_width)
        } else {
            Rect::new(rect.x + offset, rect.y, self.item_width, rect.height)
        }
    }

    fn item_at(&self, cx: &WidgetCx<'_>, x: i32, y: i32) -> Option<usize> {
        (0..self.items.len()).find(|&i| self.item_rect(cx.rect, cx.frame.vertical, i).contains(x, y))
    }

    fn set_hovered(&mut self, cx: &mut WidgetCx<'_>, hovered: Option<usize>) {
        if self.hovered != hovered {
            self.hovered = hovered;
            cx.redraw();
        }
    }
}

fn spawn(command: &str) {
    info!("Launching: {}", command);
    if let Err(e) = Command::new("sh").arg("-c").arg(command).spawn() {
        warn!("Failed to launch {:?}: {}", command, e);
    }
}

impl Widget for LaunchbarWidget {
    fn name(&self) -> &'static str {
        "launchbar"
    }

    fn size(&self) -> WidgetSize {
        WidgetSize::Fixed(self.item_width * self.items.len() as i32)
    }

    fn draw(&mut self, cx: &mut WidgetCx<'_>, painter: &mut dyn Painter) -> Result<()> {
        painter.fill_rect(cx.rect, self.theme.background)?;
        for (index, item) in self.items.iter().enumerate() {
            let style = if self.hovered == Some(index) {
                self.theme.pressed
            } else {
                self.theme.idle
            };
            let r = self.item_rect(cx.rect, cx.frame.vertical, index);
            let inner = Rect::new(r.x + 1, r.y + 1, r.width - 2, r.height - 2);
            painter.fill_rect(inner, style.background)?;
            painter.draw_text(inner, &item.label, style.text, style.background)?;
        }
        Ok(())
    }

    fn button_click(&mut self, cx: &mut WidgetCx<'_>, event: &ButtonEvent) -> Result<()> {
        if event.kind == ButtonKind::Release && event.button == 1 {
            if let Some(index) = self.item_at(cx, event.x, event.y) {
                spawn(&self.items[index].command);
            }
        }
        Ok(())
    }

    fn mouse_enter(&mut self, cx: &mut WidgetCx<'_>) -> Result<()> {
        cx.redraw();
        Ok(())
    }

    fn mouse_motion(&mut self, cx: &mut WidgetCx<'_>, event: &MotionEvent) -> Result<()> {
        let hovered = self.item_at(cx, event.x, event.y);
        self.set_hovered(cx, hovered);
        Ok(())
    }

    fn mouse_leave(&mut self, cx: &mut WidgetCx<'_>) -> Result<()> {
        self.set_hovered(cx, None);
        Ok(())
    }
}
