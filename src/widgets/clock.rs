//! Clock widget

use std::fmt::Write as _;

use chrono::format::{Item, StrftimeItems};
use chrono::{DateTime, Local, TimeZone};
use tracing::warn;

use crate::config::{ClockConfig, ThemeConfig};
use crate::error::{PanelError, Result};
use crate::panel::render::Painter;
use crate::widgets::{Theme, Widget, WidgetCx, WidgetSize};

pub struct ClockWidget {
    format: String,
    width: i32,
    theme: Theme,
    text: String,
}

impl ClockWidget {
    pub fn new(config: &ClockConfig, theme: &ThemeConfig) -> Result<Self> {
        if StrftimeItems::new(&config.format).any(|item| matches!(item, Item::Error)) {
            return Err(PanelError::Theme {
                widget: "clock",
                reason: format!("format: invalid strftime string {:?}", config.format),
            });
        }
        Ok(Self {
            format: config.format.clone(),
            width: config.width,
            theme: Theme::parse(theme, "clock")?,
            text: String::new(),
        })
    }

    fn format_time<Tz: TimeZone>(&self, now: &DateTime<Tz>) -> String
    where
        Tz::Offset: std::fmt::Display,
    {
        let mut text = String::new();
        if write!(text, "{}", now.format(&self.format)).is_err() {
            warn!("Clock format {:?} failed to render", self.format);
            text.clear();
        }
        text
    }

    /// Store the new text, returning true when it changed
    fn update<Tz: TimeZone>(&mut self, now: &DateTime<Tz>) -> bool
    where
        Tz::Offset: std::fmt::Display,
    {
        let text = self.format_time(now);
        if text == self.text {
            return false;
        }
        self.text = text;
        true
    }
}

impl Widget for ClockWidget {
    fn name(&self) -> &'static str {
        "clock"
    }

    fn size(&self) -> WidgetSize {
        WidgetSize::Fixed(self.width)
    }

    fn attach(&mut self, cx: &mut WidgetCx<'_>) -> Result<()> {
        self.update(&Local::now());
        cx.redraw();
        Ok(())
    }

    fn draw(&mut self, cx: &mut WidgetCx<'_>, painter: &mut dyn Painter) -> Result<()> {
        painter.fill_rect(cx.rect, self.theme.background)?;
        painter.draw_text(cx.rect, &self.text, self.theme.idle.text, self.theme.background)
    }

    fn tick(&mut self, cx: &mut WidgetCx<'_>) -> Result<()> {
        if self.update(&Local::now()) {
            cx.redraw();
        }
        Ok(())
    }
}
