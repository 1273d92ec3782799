//! Event dispatch
//!
//! Hit-tests pointer events against the widget rectangles and runs the
//! drag-and-drop state machine: idle -> pending click (press recorded) ->
//! dragging (moved past the threshold) -> idle (release).

use tracing::{debug, trace};

use crate::error::Result;
use crate::panel::Panel;
use crate::widgets::{ButtonEvent, ButtonKind, CrossingKind, DragInfo, MotionEvent, PropertyEvent, WidgetId};
use crate::x::ClientMessage;

/// Movement on either axis, in pixels, that turns a press into a drag
pub const DRAG_THRESHOLD: i32 = 5;

/// Press that may still become a drag
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PendingClick {
    pub widget: WidgetId,
    pub x: i32,
    pub y: i32,
}

impl Panel {
    pub fn button(&mut self, event: ButtonEvent) -> Result<()> {
        match (event.kind, self.drag.is_some()) {
            (ButtonKind::Press, false) => {
                let Some(id) = self.widget_at(event.x, event.y) else {
                    return Ok(());
                };
                self.pending_click = Some(PendingClick {
                    widget: id,
                    x: event.x,
                    y: event.y,
                });
                self.invoke(id, |w, cx| w.button_click(cx, &event))
            }
            // Second button pressed mid-drag
            (ButtonKind::Press, true) => Ok(()),
            (ButtonKind::Release, true) => self.finish_drag(&event),
            (ButtonKind::Release, false) => {
                self.pending_click = None;
                match self.widget_at(event.x, event.y) {
                    Some(id) => self.invoke(id, |w, cx| w.button_click(cx, &event)),
                    None => Ok(()),
                }
            }
        }
    }

    /// Release during a drag: notify the drop target, then the source when
    /// it is a different widget (or there is no target), and end the drag.
    fn finish_drag(&mut self, event: &ButtonEvent) -> Result<()> {
        let Some(mut drag) = self.drag.take() else {
            return Ok(());
        };
        drag.cur_x = event.x;
        drag.cur_y = event.y;
        drag.cur_root_x = event.root_x;
        drag.cur_root_y = event.root_y;
        drag.dropped_on = self.widget_at(event.x, event.y);
        drag.dropped_x = event.x;
        drag.dropped_y = event.y;
        debug!("Drop from {:?} on {:?} at {},{}", drag.taken_on, drag.dropped_on, event.x, event.y);

        if let Some(target) = drag.dropped_on {
            self.invoke(target, |w, cx| w.dnd_drop(cx, &drag))?;
        }
        if drag.dropped_on != Some(drag.taken_on) {
            self.invoke(drag.taken_on, |w, cx| w.dnd_drop(cx, &drag))?;
        }
        Ok(())
    }

    pub fn motion(&mut self, event: MotionEvent) -> Result<()> {
        // Hover tracking
        match (self.widget_at(event.x, event.y), self.under_mouse) {
            (Some(id), Some(prev)) if id == prev => {
                self.invoke(id, |w, cx| w.mouse_motion(cx, &event))?;
            }
            (Some(id), prev) => {
                if let Some(prev) = prev {
                    self.invoke(prev, |w, cx| w.mouse_leave(cx))?;
                }
                self.under_mouse = Some(id);
                self.invoke(id, |w, cx| w.mouse_enter(cx))?;
            }
            (None, Some(prev)) => {
                self.under_mouse = None;
                self.invoke(prev, |w, cx| w.mouse_leave(cx))?;
            }
            (None, None) => {}
        }

        // Drag update
        if let Some(drag) = self.drag.as_mut() {
            drag.cur_x = event.x;
            drag.cur_y = event.y;
            drag.cur_root_x = event.root_x;
            drag.cur_root_y = event.root_y;
            let drag = *drag;
            self.invoke(drag.taken_on, |w, cx| w.dnd_drag(cx, &drag))?;
        }

        // Drag start
        if let Some(click) = self.pending_click {
            let (dx, dy) = (event.x - click.x, event.y - click.y);
            if dx.abs() > DRAG_THRESHOLD || dy.abs() > DRAG_THRESHOLD {
                self.pending_click = None;
                let drag = DragInfo {
                    taken_on: click.widget,
                    taken_x: click.x,
                    taken_y: click.y,
                    cur_x: event.x,
                    cur_y: event.y,
                    cur_root_x: event.root_x,
                    cur_root_y: event.root_y,
                    dropped_on: None,
                    dropped_x: 0,
                    dropped_y: 0,
                };
                self.drag = Some(drag);
                debug!("Drag started on {:?} at {},{}", click.widget, click.x, click.y);
                self.invoke(click.widget, |w, cx| w.dnd_start(cx, &drag))?;
            }
        }
        Ok(())
    }

    /// Pointer crossing the panel window itself
    pub fn crossing(&mut self, kind: CrossingKind) -> Result<()> {
        if kind == CrossingKind::Leave {
            if let Some(prev) = self.under_mouse.take() {
                self.invoke(prev, |w, cx| w.mouse_leave(cx))?;
            }
        }
        Ok(())
    }

    pub fn property(&mut self, event: PropertyEvent) -> Result<()> {
        trace!("PropertyNotify window={} atom={}", event.window, event.atom);
        for id in self.ids() {
            self.invoke(id, |w, cx| w.prop_change(cx, &event))?;
        }
        Ok(())
    }

    pub fn client_message(&mut self, event: ClientMessage) -> Result<()> {
        for id in self.ids() {
            self.invoke(id, |w, cx| w.client_msg(cx, &event))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::panel::render::Color;
    use crate::testing::{context, frame, FakeServer, Log, RecordingWidget};

    /// A at x 0..50, B at 50..100, both full height (20)
    fn two_widgets() -> (Panel, Log) {
        let server = FakeServer::new();
        let log = Log::default();
        let widgets: Vec<Box<dyn crate::widgets::Widget>> = vec![
            Box::new(RecordingWidget::new("A", 50, &log)),
            Box::new(RecordingWidget::new("B", 50, &log)),
        ];
        let panel = Panel::new(context(&server), frame(100, 20), Color(0), widgets).unwrap();
        log.clear();
        (panel, log)
    }

    fn press(x: i32, y: i32) -> ButtonEvent {
        ButtonEvent {
            kind: ButtonKind::Press,
            button: 1,
            x,
            y,
            root_x: x,
            root_y: y + 1000,
        }
    }

    fn release(x: i32, y: i32) -> ButtonEvent {
        ButtonEvent {
            kind: ButtonKind::Release,
            ..press(x, y)
        }
    }

    fn moved(x: i32, y: i32) -> MotionEvent {
        MotionEvent {
            x,
            y,
            root_x: x,
            root_y: y + 1000,
        }
    }

    #[test]
    fn test_click_goes_to_first_hit_widget() {
        let (mut panel, log) = two_widgets();
        panel.button(press(60, 10)).unwrap();
        panel.button(release(60, 10)).unwrap();
        assert_eq!(log.take(), vec!["B:click:press", "B:click:release"]);
        assert!(panel.pending_click.is_none());
    }

    #[test]
    fn test_shared_edge_dispatches_to_neither() {
        let (mut panel, log) = two_widgets();
        panel.button(press(50, 10)).unwrap();
        panel.motion(moved(50, 10)).unwrap();
        panel.button(press(10, 0)).unwrap();
        assert!(log.take().is_empty());
        assert!(panel.pending_click.is_none());
        assert_eq!(panel.under_mouse(), None);
    }

    #[test]
    fn test_hover_enter_motion_leave() {
        let (mut panel, log) = two_widgets();
        panel.motion(moved(10, 10)).unwrap();
        panel.motion(moved(12, 10)).unwrap();
        panel.motion(moved(70, 10)).unwrap();
        panel.crossing(CrossingKind::Leave).unwrap();
        panel.crossing(CrossingKind::Leave).unwrap();
        assert_eq!(
            log.take(),
            vec!["A:enter", "A:motion", "A:leave", "B:enter", "B:leave"]
        );
    }

    #[test]
    fn test_drag_lifecycle_across_widgets() {
        let (mut panel, log) = two_widgets();
        panel.button(press(10, 10)).unwrap();
        panel.motion(moved(10, 10)).unwrap();
        assert!(panel.drag().is_none());

        panel.motion(moved(17, 10)).unwrap();
        let drag = *panel.drag().unwrap();
        assert_eq!(drag.taken_on, WidgetId(0));
        assert_eq!((drag.taken_x, drag.taken_y), (10, 10));
        assert_eq!((drag.cur_x, drag.cur_y), (17, 10));

        panel.motion(moved(30, 10)).unwrap();
        panel.button(release(70, 10)).unwrap();
        assert!(panel.drag().is_none());

        let events = log.take();
        let starts = events.iter().filter(|e| e.as_str() == "A:dnd_start").count();
        assert_eq!(starts, 1);
        assert_eq!(
            events,
            vec![
                "A:click:press",
                "A:enter",
                "A:motion",
                "A:dnd_start",
                "A:motion",
                "A:dnd_drag:30,10",
                "B:dnd_drop:Some(1)",
                "A:dnd_drop:Some(1)",
            ]
        );

        // Drag is gone; a stray release is an ordinary (no-op) release
        panel.button(release(200, 10)).unwrap();
        assert!(log.take().is_empty());
    }

    #[test]
    fn test_release_after_drag_over_widget_is_a_click() {
        let (mut panel, log) = two_widgets();
        panel.button(press(10, 10)).unwrap();
        panel.motion(moved(30, 10)).unwrap();
        panel.button(release(70, 10)).unwrap();
        assert!(panel.drag().is_none());
        log.clear();

        // The drag ended with the first release; the next one is an
        // ordinary release on whatever is under the pointer
        panel.button(release(70, 10)).unwrap();
        assert_eq!(log.take(), vec!["B:click:release"]);
        assert!(panel.drag().is_none());
    }

    #[test]
    fn test_drop_on_source_notifies_once() {
        let (mut panel, log) = two_widgets();
        panel.button(press(10, 10)).unwrap();
        panel.motion(moved(10, 17)).unwrap();
        panel.button(release(20, 10)).unwrap();
        let drops: Vec<String> = log.take().into_iter().filter(|e| e.contains("dnd_drop")).collect();
        assert_eq!(drops, vec!["A:dnd_drop:Some(0)"]);
    }

    #[test]
    fn test_drop_off_panel_still_notifies_source() {
        let (mut panel, log) = two_widgets();
        panel.button(press(10, 10)).unwrap();
        panel.motion(moved(10, -40)).unwrap();
        panel.button(release(10, -80)).unwrap();
        let drops: Vec<String> = log.take().into_iter().filter(|e| e.contains("dnd_drop")).collect();
        assert_eq!(drops, vec!["A:dnd_drop:None"]);
        assert!(panel.drag().is_none());
    }

    #[test]
    fn test_press_during_drag_is_ignored() {
        let (mut panel, log) = two_widgets();
        panel.button(press(10, 10)).unwrap();
        panel.motion(moved(20, 10)).unwrap();
        log.clear();
        panel.button(press(60, 10)).unwrap();
        assert!(log.take().is_empty());
        assert!(panel.drag().is_some());
    }

    #[test]
    fn test_property_and_messages_reach_everyone() {
        let (mut panel, log) = two_widgets();
        panel
            .property(PropertyEvent { window: 7, atom: 9 })
            .unwrap();
        panel
            .client_message(ClientMessage {
                window: 7,
                message_type: 9,
                data: [0; 5],
            })
            .unwrap();
        assert_eq!(log.take(), vec!["A:prop", "B:prop", "A:client_msg", "B:client_msg"]);
    }
}
