//! Test doubles: an in-memory X server, a painter that records calls, and a
//! widget that logs every callback it receives.

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::Rc;

use x11rb::errors::ConnectionError;
use x11rb::protocol::ErrorKind;
use x11rb::protocol::xproto::{Atom, AtomEnum, EventMask, Window};

use crate::error::Result;
use crate::geometry::Rect;
use crate::panel::render::{Color, Painter};
use crate::panel::PanelFrame;
use crate::widgets::{
    ButtonEvent, ButtonKind, DragInfo, MotionEvent, PropertyEvent, Widget, WidgetCx, WidgetSize,
};
use crate::x::{Atoms, ClientMessage, Icon, RawProperty, RequestError, Transport, XContext};

pub const ROOT: Window = 0x100;
pub const PANEL_WINDOW: Window = 0x200;

/// Client message as it went out
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentMessage {
    pub destination: Window,
    pub event_mask: EventMask,
    pub message: ClientMessage,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PropertyWrite {
    pub window: Window,
    pub property: Atom,
    pub values: Vec<u32>,
}

/// In-memory display server. Requests against windows it does not know
/// fail with BadWindow, like a real server after the window is destroyed:
/// checked requests return the error, fire-and-forget ones queue it for the
/// event stream (`take_async_errors`).
pub struct FakeServer {
    windows: RefCell<HashMap<Window, HashMap<Atom, RawProperty>>>,
    reads: Cell<usize>,
    messages: RefCell<Vec<SentMessage>>,
    writes: RefCell<Vec<PropertyWrite>>,
    selected: RefCell<Vec<Window>>,
    raised: RefCell<Vec<Window>>,
    created: RefCell<Vec<Window>>,
    cursor: RefCell<Vec<(Window, bool)>>,
    next_id: Cell<Window>,
    disconnected: Cell<bool>,
    async_errors: RefCell<Vec<RequestError>>,
}

impl FakeServer {
    pub fn new() -> Rc<Self> {
        let server = Self {
            windows: RefCell::new(HashMap::new()),
            reads: Cell::new(0),
            messages: RefCell::new(Vec::new()),
            writes: RefCell::new(Vec::new()),
            selected: RefCell::new(Vec::new()),
            raised: RefCell::new(Vec::new()),
            created: RefCell::new(Vec::new()),
            cursor: RefCell::new(Vec::new()),
            next_id: Cell::new(0x0900_0000),
            disconnected: Cell::new(false),
            async_errors: RefCell::new(Vec::new()),
        };
        server.add_window(ROOT);
        server.add_window(PANEL_WINDOW);
        Rc::new(server)
    }

    pub fn add_window(&self, window: Window) {
        self.windows.borrow_mut().entry(window).or_default();
    }

    /// The window is destroyed behind the panel's back
    pub fn remove_window(&self, window: Window) {
        self.windows.borrow_mut().remove(&window);
    }

    pub fn set_u32s(&self, window: Window, property: Atom, type_: Atom, values: &[u32]) {
        self.set(window, property, RawProperty::from_u32s(type_, values));
    }

    pub fn set_text(&self, window: Window, property: Atom, type_: Atom, text: &str) {
        self.set(window, property, RawProperty::from_bytes(type_, text.as_bytes()));
    }

    pub fn remove_property(&self, window: Window, property: Atom) {
        if let Some(props) = self.windows.borrow_mut().get_mut(&window) {
            props.remove(&property);
        }
    }

    fn set(&self, window: Window, property: Atom, value: RawProperty) {
        self.windows
            .borrow_mut()
            .entry(window)
            .or_default()
            .insert(property, value);
    }

    pub fn reads(&self) -> usize {
        self.reads.get()
    }

    pub fn reset_reads(&self) {
        self.reads.set(0);
    }

    pub fn messages(&self) -> Vec<SentMessage> {
        self.messages.borrow().clone()
    }

    pub fn writes(&self) -> Vec<PropertyWrite> {
        self.writes.borrow().clone()
    }

    pub fn selected(&self) -> Vec<Window> {
        self.selected.borrow().clone()
    }

    pub fn raised(&self) -> Vec<Window> {
        self.raised.borrow().clone()
    }

    /// Drag feedback windows created so far
    pub fn created(&self) -> Vec<Window> {
        self.created.borrow().clone()
    }

    pub fn exists(&self, window: Window) -> bool {
        self.windows.borrow().contains_key(&window)
    }

    pub fn cursor_changes(&self) -> Vec<(Window, bool)> {
        self.cursor.borrow().clone()
    }

    pub fn clear_log(&self) {
        self.messages.borrow_mut().clear();
        self.writes.borrow_mut().clear();
        self.selected.borrow_mut().clear();
        self.raised.borrow_mut().clear();
    }

    pub fn disconnect(&self) {
        self.disconnected.set(true);
    }

    /// Errors of unchecked requests, as they would arrive as `Event::Error`
    pub fn take_async_errors(&self) -> Vec<RequestError> {
        std::mem::take(&mut *self.async_errors.borrow_mut())
    }

    /// Unchecked request: true when it reaches a live window. A BadWindow
    /// is queued rather than returned.
    fn deliver(&self, window: Window, request: &'static str) -> std::result::Result<bool, RequestError> {
        match self.check(window, request) {
            Ok(()) => Ok(true),
            Err(RequestError::Connection(e)) => Err(RequestError::Connection(e)),
            Err(err) => {
                self.async_errors.borrow_mut().push(err);
                Ok(false)
            }
        }
    }

    fn check(&self, window: Window, request: &'static str) -> std::result::Result<(), RequestError> {
        if self.disconnected.get() {
            return Err(RequestError::Connection(ConnectionError::UnknownError));
        }
        if !self.exists(window) {
            return Err(RequestError::Protocol {
                kind: ErrorKind::Window,
                resource: window,
                request,
            });
        }
        Ok(())
    }
}

impl Transport for FakeServer {
    fn get_property(
        &self,
        window: Window,
        property: Atom,
        type_: Atom,
    ) -> std::result::Result<Option<RawProperty>, RequestError> {
        self.reads.set(self.reads.get() + 1);
        self.check(window, "GetProperty")?;
        let any: Atom = AtomEnum::ANY.into();
        Ok(self.windows.borrow()[&window]
            .get(&property)
            .filter(|p| type_ == any || p.type_ == type_)
            .cloned())
    }

    fn change_property32(
        &self,
        window: Window,
        property: Atom,
        type_: Atom,
        data: &[u32],
    ) -> std::result::Result<(), RequestError> {
        self.check(window, "ChangeProperty")?;
        self.set_u32s(window, property, type_, data);
        self.writes.borrow_mut().push(PropertyWrite {
            window,
            property,
            values: data.to_vec(),
        });
        Ok(())
    }

    fn select_property_changes(&self, window: Window) -> std::result::Result<(), RequestError> {
        self.check(window, "ChangeWindowAttributes")?;
        self.selected.borrow_mut().push(window);
        Ok(())
    }

    fn send_client_message(
        &self,
        destination: Window,
        event_mask: EventMask,
        message: &ClientMessage,
    ) -> std::result::Result<(), RequestError> {
        if self.deliver(destination, "SendEvent")? {
            self.messages.borrow_mut().push(SentMessage {
                destination,
                event_mask,
                message: *message,
            });
        }
        Ok(())
    }

    fn raise_window(&self, window: Window) -> std::result::Result<(), RequestError> {
        if self.deliver(window, "ConfigureWindow")? {
            self.raised.borrow_mut().push(window);
        }
        Ok(())
    }

    fn create_drag_window(&self, _x: i32, _y: i32, _icon: &Icon) -> std::result::Result<Window, RequestError> {
        self.check(ROOT, "CreateWindow")?;
        let window = self.next_id.get();
        self.next_id.set(window + 1);
        self.add_window(window);
        self.created.borrow_mut().push(window);
        Ok(window)
    }

    fn move_window(&self, window: Window, _x: i32, _y: i32) -> std::result::Result<(), RequestError> {
        self.deliver(window, "ConfigureWindow")?;
        Ok(())
    }

    fn destroy_window(&self, window: Window) -> std::result::Result<(), RequestError> {
        if self.deliver(window, "DestroyWindow")? {
            self.remove_window(window);
        }
        Ok(())
    }

    fn set_drag_cursor(&self, window: Window, dragging: bool) -> std::result::Result<(), RequestError> {
        if self.deliver(window, "ChangeWindowAttributes")? {
            self.cursor.borrow_mut().push((window, dragging));
        }
        Ok(())
    }

    fn flush(&self) -> std::result::Result<(), RequestError> {
        if self.disconnected.get() {
            return Err(RequestError::Connection(ConnectionError::UnknownError));
        }
        Ok(())
    }
}

impl<T: Transport> Transport for Rc<T> {
    fn get_property(
        &self,
        window: Window,
        property: Atom,
        type_: Atom,
    ) -> std::result::Result<Option<RawProperty>, RequestError> {
        (**self).get_property(window, property, type_)
    }

    fn change_property32(
        &self,
        window: Window,
        property: Atom,
        type_: Atom,
        data: &[u32],
    ) -> std::result::Result<(), RequestError> {
        (**self).change_property32(window, property, type_, data)
    }

    fn select_property_changes(&self, window: Window) -> std::result::Result<(), RequestError> {
        (**self).select_property_changes(window)
    }

    fn send_client_message(
        &self,
        destination: Window,
        event_mask: EventMask,
        message: &ClientMessage,
    ) -> std::result::Result<(), RequestError> {
        (**self).send_client_message(destination, event_mask, message)
    }

    fn raise_window(&self, window: Window) -> std::result::Result<(), RequestError> {
        (**self).raise_window(window)
    }

    fn create_drag_window(&self, x: i32, y: i32, icon: &Icon) -> std::result::Result<Window, RequestError> {
        (**self).create_drag_window(x, y, icon)
    }

    fn move_window(&self, window: Window, x: i32, y: i32) -> std::result::Result<(), RequestError> {
        (**self).move_window(window, x, y)
    }

    fn destroy_window(&self, window: Window) -> std::result::Result<(), RequestError> {
        (**self).destroy_window(window)
    }

    fn set_drag_cursor(&self, window: Window, dragging: bool) -> std::result::Result<(), RequestError> {
        (**self).set_drag_cursor(window, dragging)
    }

    fn flush(&self) -> std::result::Result<(), RequestError> {
        (**self).flush()
    }
}

/// Atom table with made-up ids, predefined atoms keep their real values
pub fn atoms() -> Atoms {
    let mut next = 100;
    let result = Atoms::from_interner(|_| {
        next += 1;
        Ok(next)
    });
    match result {
        Ok(atoms) => atoms,
        Err(err) => panic!("interning cannot fail: {err}"),
    }
}

pub fn context(server: &Rc<FakeServer>) -> XContext {
    XContext::new(Box::new(Rc::clone(server)), atoms(), ROOT)
}

/// Horizontal panel frame at the root origin
pub fn frame(width: i32, height: i32) -> PanelFrame {
    PanelFrame {
        window: PANEL_WINDOW,
        x: 0,
        y: 0,
        width,
        height,
        vertical: false,
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum DrawCall {
    Fill(Rect, Color),
    Text(Rect, String, Color),
    Icon(i32, i32, u32),
}

#[derive(Default)]
pub struct RecordingPainter {
    pub calls: Vec<DrawCall>,
}

impl RecordingPainter {
    pub fn texts(&self) -> Vec<String> {
        self.calls
            .iter()
            .filter_map(|c| match c {
                DrawCall::Text(_, text, _) => Some(text.clone()),
                _ => None,
            })
            .collect()
    }
}

impl Painter for RecordingPainter {
    fn fill_rect(&mut self, rect: Rect, color: Color) -> Result<()> {
        self.calls.push(DrawCall::Fill(rect, color));
        Ok(())
    }

    fn draw_text(&mut self, rect: Rect, text: &str, color: Color, _background: Color) -> Result<()> {
        self.calls.push(DrawCall::Text(rect, text.to_string(), color));
        Ok(())
    }

    fn draw_icon(&mut self, x: i32, y: i32, icon: &Icon, _background: Color) -> Result<()> {
        self.calls.push(DrawCall::Icon(x, y, icon.width));
        Ok(())
    }
}

/// Shared callback log
#[derive(Clone, Default)]
pub struct Log(Rc<RefCell<Vec<String>>>);

impl Log {
    pub fn push(&self, entry: String) {
        self.0.borrow_mut().push(entry);
    }

    pub fn take(&self) -> Vec<String> {
        std::mem::take(&mut *self.0.borrow_mut())
    }

    pub fn clear(&self) {
        self.0.borrow_mut().clear();
    }
}

/// Widget implementing every callback by logging `name:callback`
pub struct RecordingWidget {
    name: &'static str,
    width: i32,
    log: Log,
}

impl RecordingWidget {
    pub fn new(name: &'static str, width: i32, log: &Log) -> Self {
        Self {
            name,
            width,
            log: log.clone(),
        }
    }

    fn record(&self, what: impl std::fmt::Display) {
        self.log.push(format!("{}:{}", self.name, what));
    }
}

impl Widget for RecordingWidget {
    fn name(&self) -> &'static str {
        self.name
    }

    fn size(&self) -> WidgetSize {
        WidgetSize::Fixed(self.width)
    }

    fn attach(&mut self, _cx: &mut WidgetCx<'_>) -> Result<()> {
        self.record("attach");
        Ok(())
    }

    fn button_click(&mut self, _cx: &mut WidgetCx<'_>, event: &ButtonEvent) -> Result<()> {
        let kind = match event.kind {
            ButtonKind::Press => "press",
            ButtonKind::Release => "release",
        };
        self.record(format!("click:{kind}"));
        Ok(())
    }

    fn mouse_enter(&mut self, _cx: &mut WidgetCx<'_>) -> Result<()> {
        self.record("enter");
        Ok(())
    }

    fn mouse_leave(&mut self, _cx: &mut WidgetCx<'_>) -> Result<()> {
        self.record("leave");
        Ok(())
    }

    fn mouse_motion(&mut self, _cx: &mut WidgetCx<'_>, _event: &MotionEvent) -> Result<()> {
        self.record("motion");
        Ok(())
    }

    fn prop_change(&mut self, _cx: &mut WidgetCx<'_>, _event: &PropertyEvent) -> Result<()> {
        self.record("prop");
        Ok(())
    }

    fn client_msg(&mut self, _cx: &mut WidgetCx<'_>, _event: &ClientMessage) -> Result<()> {
        self.record("client_msg");
        Ok(())
    }

    fn dnd_start(&mut self, _cx: &mut WidgetCx<'_>, _drag: &DragInfo) -> Result<()> {
        self.record("dnd_start");
        Ok(())
    }

    fn dnd_drag(&mut self, _cx: &mut WidgetCx<'_>, drag: &DragInfo) -> Result<()> {
        self.record(format!("dnd_drag:{},{}", drag.cur_x, drag.cur_y));
        Ok(())
    }

    fn dnd_drop(&mut self, _cx: &mut WidgetCx<'_>, drag: &DragInfo) -> Result<()> {
        self.record(format!("dnd_drop:{:?}", drag.dropped_on.map(|id| id.0)));
        Ok(())
    }
}
