//! The panel: its window, the widgets laid out along it, and the state the
//! dispatcher keeps between events.

pub mod dispatch;
pub mod render;
pub mod window;

use tracing::debug;
use x11rb::protocol::Event;
use x11rb::protocol::xproto::Window;

use crate::error::Result;
use crate::geometry::Rect;
use crate::widgets::{
    ButtonEvent, ButtonKind, CrossingKind, DragInfo, MotionEvent, PropertyEvent, Widget, WidgetCx,
    WidgetId, WidgetSize,
};
use crate::x::{ClientMessage, XContext};

use self::dispatch::PendingClick;
use self::render::{Color, Painter};

/// Panel window placement, root coordinates
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PanelFrame {
    pub window: Window,
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
    /// Widgets stack top to bottom instead of left to right
    pub vertical: bool,
}

impl PanelFrame {
    /// The whole panel in its own coordinates
    pub fn local_rect(&self) -> Rect {
        Rect::new(0, 0, self.width, self.height)
    }

    /// Translate a panel-relative rectangle to root coordinates
    pub fn to_root(&self, rect: Rect) -> Rect {
        Rect::new(self.x + rect.x, self.y + rect.y, rect.width, rect.height)
    }
}

struct WidgetSlot {
    rect: Rect,
    widget: Box<dyn Widget>,
    dirty: bool,
}

pub struct Panel {
    x: XContext,
    frame: PanelFrame,
    background: Color,
    widgets: Vec<WidgetSlot>,
    under_mouse: Option<WidgetId>,
    pending_click: Option<PendingClick>,
    drag: Option<DragInfo>,
    /// Whole window needs repainting (expose)
    damaged: bool,
}

/// Split the panel's main axis between widgets. Fixed widgets get their
/// size, fill widgets share what is left; the last fill widget absorbs the
/// rounding remainder.
pub fn layout(frame: &PanelFrame, sizes: &[WidgetSize]) -> Vec<Rect> {
    let length = if frame.vertical { frame.height } else { frame.width };
    let fixed: i32 = sizes
        .iter()
        .map(|s| match s {
            WidgetSize::Fixed(n) => *n,
            WidgetSize::Fill => 0,
        })
        .sum();
    let fills = sizes.iter().filter(|s| **s == WidgetSize::Fill).count() as i32;
    let spare = (length - fixed).max(0);
    let share = if fills > 0 { spare / fills } else { 0 };
    let mut remainder = if fills > 0 { spare - share * fills } else { 0 };

    let mut offset = 0;
    let mut seen_fills = 0;
    sizes
        .iter()
        .map(|size| {
            let span = match size {
                WidgetSize::Fixed(n) => *n,
                WidgetSize::Fill => {
                    seen_fills += 1;
                    if seen_fills == fills {
                        share + std::mem::take(&mut remainder)
                    } else {
                        share
                    }
                }
            };
            let rect = if frame.vertical {
                Rect::new(0, offset, frame.width, span)
            } else {
                Rect::new(offset, 0, span, frame.height)
            };
            offset += span;
            rect
        })
        .collect()
}

impl Panel {
    /// Lay the widgets out and attach them. A widget failing to attach is
    /// fatal only on connection loss.
    pub fn new(x: XContext, frame: PanelFrame, background: Color, widgets: Vec<Box<dyn Widget>>) -> Result<Self> {
        let sizes: Vec<WidgetSize> = widgets.iter().map(|w| w.size()).collect();
        let rects = layout(&frame, &sizes);
        let widgets = widgets
            .into_iter()
            .zip(rects)
            .map(|(widget, rect)| WidgetSlot {
                rect,
                widget,
                dirty: true,
            })
            .collect();

        let mut panel = Self {
            x,
            frame,
            background,
            widgets,
            under_mouse: None,
            pending_click: None,
            drag: None,
            damaged: true,
        };

        for id in panel.ids() {
            panel.invoke(id, |w, cx| w.attach(cx))?;
            debug!("Attached {} at {:?}", panel.widgets[id.0].widget.name(), panel.widgets[id.0].rect);
        }
        Ok(panel)
    }

    pub fn x(&self) -> &XContext {
        &self.x
    }

    #[cfg(test)]
    pub fn drag(&self) -> Option<&DragInfo> {
        self.drag.as_ref()
    }

    #[cfg(test)]
    pub fn under_mouse(&self) -> Option<WidgetId> {
        self.under_mouse
    }

    fn ids(&self) -> Vec<WidgetId> {
        (0..self.widgets.len()).map(WidgetId).collect()
    }

    /// First widget, in paint order, strictly containing the point
    pub fn widget_at(&self, x: i32, y: i32) -> Option<WidgetId> {
        self.widgets
            .iter()
            .position(|slot| slot.rect.contains_strict(x, y))
            .map(WidgetId)
    }

    /// Run a callback on one widget. Stale ids are ignored.
    fn invoke<F>(&mut self, id: WidgetId, f: F) -> Result<()>
    where
        F: FnOnce(&mut dyn Widget, &mut WidgetCx<'_>) -> Result<()>,
    {
        let Some(slot) = self.widgets.get_mut(id.0) else {
            return Ok(());
        };
        let mut cx = WidgetCx::new(id, &self.x, slot.rect, &self.frame, &mut slot.dirty);
        f(slot.widget.as_mut(), &mut cx)
    }

    /// Translate one X event into dispatcher calls
    pub fn handle_event(&mut self, event: Event) -> Result<()> {
        let panel = self.frame.window;
        match event {
            Event::ButtonPress(e) if e.event == panel => self.button(ButtonEvent {
                kind: ButtonKind::Press,
                button: e.detail,
                x: e.event_x.into(),
                y: e.event_y.into(),
                root_x: e.root_x.into(),
                root_y: e.root_y.into(),
            }),
            Event::ButtonRelease(e) if e.event == panel => self.button(ButtonEvent {
                kind: ButtonKind::Release,
                button: e.detail,
                x: e.event_x.into(),
                y: e.event_y.into(),
                root_x: e.root_x.into(),
                root_y: e.root_y.into(),
            }),
            Event::MotionNotify(e) if e.event == panel => self.motion(MotionEvent {
                x: e.event_x.into(),
                y: e.event_y.into(),
                root_x: e.root_x.into(),
                root_y: e.root_y.into(),
            }),
            Event::EnterNotify(e) if e.event == panel => self.crossing(CrossingKind::Enter),
            Event::LeaveNotify(e) if e.event == panel => self.crossing(CrossingKind::Leave),
            Event::PropertyNotify(e) => self.property(PropertyEvent {
                window: e.window,
                atom: e.atom,
            }),
            Event::ClientMessage(e) if e.format == 32 => self.client_message(ClientMessage {
                window: e.window,
                message_type: e.type_,
                data: e.data.as_data32(),
            }),
            Event::Expose(e) if e.window == panel && e.count == 0 => {
                self.invalidate();
                Ok(())
            }
            Event::Error(e) => self.x.absorb(e.into()),
            _ => Ok(()),
        }
    }

    /// Once-per-second timer for every widget
    pub fn tick(&mut self) -> Result<()> {
        for id in self.ids() {
            self.invoke(id, |w, cx| w.tick(cx))?;
        }
        Ok(())
    }

    /// Repaint everything on the next render pass
    pub fn invalidate(&mut self) {
        self.damaged = true;
        for slot in &mut self.widgets {
            slot.dirty = true;
        }
    }

    /// Repaint dirty widgets. Returns true when anything was drawn.
    pub fn render(&mut self, painter: &mut dyn Painter) -> Result<bool> {
        let mut drawn = false;
        if std::mem::take(&mut self.damaged) {
            painter.fill_rect(self.frame.local_rect(), self.background)?;
            drawn = true;
        }

        for id in self.ids() {
            let slot = &mut self.widgets[id.0];
            if !std::mem::take(&mut slot.dirty) {
                continue;
            }
            painter.fill_rect(slot.rect, self.background)?;
            self.invoke(id, |w, cx| w.draw(cx, &mut *painter))?;
            drawn = true;
        }
        Ok(drawn)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{context, frame, FakeServer, RecordingPainter};

    #[test]
    fn test_layout_shares_spare_space() {
        let frame = frame(300, 20);
        let rects = layout(
            &frame,
            &[WidgetSize::Fixed(50), WidgetSize::Fill, WidgetSize::Fixed(40), WidgetSize::Fill],
        );
        assert_eq!(rects[0], Rect::new(0, 0, 50, 20));
        assert_eq!(rects[1], Rect::new(50, 0, 105, 20));
        assert_eq!(rects[2], Rect::new(155, 0, 40, 20));
        assert_eq!(rects[3], Rect::new(195, 0, 105, 20));
    }

    #[test]
    fn test_layout_vertical_stacks() {
        let mut frame = frame(24, 100);
        frame.vertical = true;
        let rects = layout(&frame, &[WidgetSize::Fixed(30), WidgetSize::Fill]);
        assert_eq!(rects[0], Rect::new(0, 0, 24, 30));
        assert_eq!(rects[1], Rect::new(0, 30, 24, 70));
    }

    #[test]
    fn test_render_only_dirty_widgets() {
        let server = FakeServer::new();
        let mut panel = Panel::new(context(&server), frame(100, 20), Color(0), Vec::new()).unwrap();
        let mut painter = RecordingPainter::default();
        assert!(panel.render(&mut painter).unwrap());
        assert!(!panel.render(&mut painter).unwrap());

        panel.invalidate();
        assert!(panel.render(&mut painter).unwrap());
    }
}
