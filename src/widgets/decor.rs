//! Decorative spacer

use crate::config::{DecorConfig, ThemeConfig};
use crate::error::{PanelError, Result};
use crate::panel::render::{Color, Painter};
use crate::widgets::{Theme, Widget, WidgetCx, WidgetSize};

pub struct DecorWidget {
    width: i32,
    color: Color,
}

impl DecorWidget {
    pub fn new(config: &DecorConfig, theme: &ThemeConfig) -> Result<Self> {
        let theme = Theme::parse(theme, "decor")?;
        let color = match &config.color {
            Some(value) => Color::parse(value).ok_or_else(|| PanelError::Theme {
                widget: "decor",
                reason: format!("color: invalid colour {value:?}"),
            })?,
            None => theme.background,
        };
        Ok(Self {
            width: config.width,
            color,
        })
    }
}

impl Widget for DecorWidget {
    fn name(&self) -> &'static str {
        "decor"
    }

    fn size(&self) -> WidgetSize {
        WidgetSize::Fixed(self.width)
    }

    fn draw(&mut self, cx: &mut WidgetCx<'_>, painter: &mut dyn Painter) -> Result<()> {
        painter.fill_rect(cx.rect, self.color)
    }
}
