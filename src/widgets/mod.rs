//! Panel widgets
//!
//! Every widget implements `Widget`. All callbacks have no-op defaults, so a
//! widget only overrides the capabilities it actually has; the dispatcher
//! calls them unconditionally.

pub mod clock;
pub mod decor;
pub mod desktops;
pub mod launchbar;
pub mod taskbar;

use x11rb::protocol::xproto::{Atom, Window};

use crate::config::{ThemeConfig, WidgetConfig};
use crate::error::{PanelError, Result};
use crate::geometry::Rect;
use crate::panel::render::{Color, Painter};
use crate::panel::PanelFrame;
use crate::x::{ClientMessage, XContext};

/// Index of a widget in the panel's widget list
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct WidgetId(pub usize);

/// How much of the panel's main axis a widget takes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WidgetSize {
    /// Exactly this many pixels
    Fixed(i32),
    /// An equal share of whatever the fixed widgets leave over
    Fill,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ButtonKind {
    Press,
    Release,
}

/// Button press or release, in panel coordinates
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ButtonEvent {
    pub kind: ButtonKind,
    pub button: u8,
    pub x: i32,
    pub y: i32,
    pub root_x: i32,
    pub root_y: i32,
}

/// Pointer motion, in panel coordinates
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MotionEvent {
    pub x: i32,
    pub y: i32,
    pub root_x: i32,
    pub root_y: i32,
}

/// Pointer entering or leaving the panel window itself
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CrossingKind {
    Enter,
    Leave,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PropertyEvent {
    pub window: Window,
    pub atom: Atom,
}

/// State of an in-progress drag, shared with the widgets involved
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DragInfo {
    /// Widget the drag started on
    pub taken_on: WidgetId,
    /// Press position that started the drag
    pub taken_x: i32,
    pub taken_y: i32,
    /// Latest pointer position, panel and root coordinates
    pub cur_x: i32,
    pub cur_y: i32,
    pub cur_root_x: i32,
    pub cur_root_y: i32,
    /// Widget under the release, if any
    pub dropped_on: Option<WidgetId>,
    pub dropped_x: i32,
    pub dropped_y: i32,
}

/// What a widget callback gets to work with
pub struct WidgetCx<'a> {
    pub id: WidgetId,
    pub x: &'a XContext,
    /// The widget's own rectangle, panel coordinates
    pub rect: Rect,
    pub frame: &'a PanelFrame,
    dirty: &'a mut bool,
}

impl<'a> WidgetCx<'a> {
    pub fn new(id: WidgetId, x: &'a XContext, rect: Rect, frame: &'a PanelFrame, dirty: &'a mut bool) -> Self {
        Self {
            id,
            x,
            rect,
            frame,
            dirty,
        }
    }

    /// Schedule a repaint of this widget for the end of the loop iteration
    pub fn redraw(&mut self) {
        *self.dirty = true;
    }
}

pub trait Widget {
    /// Theme/config name of the widget type
    fn name(&self) -> &'static str;

    fn size(&self) -> WidgetSize;

    /// Called once the widget has its rectangle
    fn attach(&mut self, _cx: &mut WidgetCx<'_>) -> Result<()> {
        Ok(())
    }

    fn draw(&mut self, _cx: &mut WidgetCx<'_>, _painter: &mut dyn Painter) -> Result<()> {
        Ok(())
    }

    fn button_click(&mut self, _cx: &mut WidgetCx<'_>, _event: &ButtonEvent) -> Result<()> {
        Ok(())
    }

    fn mouse_enter(&mut self, _cx: &mut WidgetCx<'_>) -> Result<()> {
        Ok(())
    }

    fn mouse_leave(&mut self, _cx: &mut WidgetCx<'_>) -> Result<()> {
        Ok(())
    }

    fn mouse_motion(&mut self, _cx: &mut WidgetCx<'_>, _event: &MotionEvent) -> Result<()> {
        Ok(())
    }

    fn prop_change(&mut self, _cx: &mut WidgetCx<'_>, _event: &PropertyEvent) -> Result<()> {
        Ok(())
    }

    fn client_msg(&mut self, _cx: &mut WidgetCx<'_>, _event: &ClientMessage) -> Result<()> {
        Ok(())
    }

    fn dnd_start(&mut self, _cx: &mut WidgetCx<'_>, _drag: &DragInfo) -> Result<()> {
        Ok(())
    }

    fn dnd_drag(&mut self, _cx: &mut WidgetCx<'_>, _drag: &DragInfo) -> Result<()> {
        Ok(())
    }

    fn dnd_drop(&mut self, _cx: &mut WidgetCx<'_>, _drag: &DragInfo) -> Result<()> {
        Ok(())
    }

    /// Once-per-second timer
    fn tick(&mut self, _cx: &mut WidgetCx<'_>) -> Result<()> {
        Ok(())
    }
}

/// Colours for one visual state (idle / pressed)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StateStyle {
    pub background: Color,
    pub text: Color,
}

/// Parsed theme colours
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Theme {
    pub background: Color,
    pub idle: StateStyle,
    pub pressed: StateStyle,
}

impl Theme {
    /// Parse the colour strings, rejecting the widget on the first bad one
    pub fn parse(config: &ThemeConfig, widget: &'static str) -> Result<Self> {
        let color = |key: &str, value: &str| {
            Color::parse(value).ok_or_else(|| PanelError::Theme {
                widget,
                reason: format!("{key}: invalid colour {value:?}"),
            })
        };
        Ok(Self {
            background: color("background", &config.background)?,
            idle: StateStyle {
                background: color("idle.background", &config.idle.background)?,
                text: color("idle.text", &config.idle.text)?,
            },
            pressed: StateStyle {
                background: color("pressed.background", &config.pressed.background)?,
                text: color("pressed.text", &config.pressed.text)?,
            },
        })
    }
}

/// Build a widget from its config entry
pub fn build(config: &WidgetConfig, theme: &ThemeConfig) -> Result<Box<dyn Widget>> {
    Ok(match config {
        WidgetConfig::Taskbar(c) => Box::new(taskbar::TaskbarWidget::new(c, theme)?),
        WidgetConfig::Clock(c) => Box::new(clock::ClockWidget::new(c, theme)?),
        WidgetConfig::Desktops(c) => Box::new(desktops::DesktopsWidget::new(c, theme)?),
        WidgetConfig::Launchbar(c) => Box::new(launchbar::LaunchbarWidget::new(c, theme)?),
        WidgetConfig::Decor(c) => Box::new(decor::DecorWidget::new(c, theme)?),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_theme_rejects_bad_colour() {
        let mut config = ThemeConfig::default();
        config.pressed.text = "#12345".into();
        match Theme::parse(&config, "clock") {
            Err(PanelError::Theme { widget, reason }) => {
                assert_eq!(widget, "clock");
                assert!(reason.starts_with("pressed.text"));
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn test_default_theme_parses() {
        assert!(Theme::parse(&ThemeConfig::default(), "taskbar").is_ok());
    }
}
