//! Taskbar widget
//!
//! One button per tracked window on the current desktop. Keeps the task
//! registry in sync with `_NET_CLIENT_LIST` and the per-window hints,
//! publishes icon geometry, and implements drag to reorder (within a
//! desktop) or drag off the panel to close.

pub mod tasks;

use std::collections::HashSet;
use std::rc::Rc;

use tracing::{debug, info};
use x11rb::protocol::xproto::Window;

use crate::config::{TaskbarConfig, ThemeConfig};
use crate::error::Result;
use crate::geometry::Rect;
use crate::panel::render::Painter;
use crate::widgets::{
    ButtonEvent, ButtonKind, DragInfo, PropertyEvent, Theme, Widget, WidgetCx, WidgetSize,
};
use crate::x::icon::load_window_icon;
use crate::x::{ClientMessage, Icon};

use self::tasks::{Task, TaskList};

/// XdndStatus flag: send more position messages
const XDND_WANT_POSITION: u32 = 2;

/// Gap between task buttons
const TASK_SPACING: i32 = 2;

/// Padding inside a task button
const TASK_PADDING: i32 = 3;

/// Task picked up by a drag
#[derive(Debug)]
struct Taken {
    window: Window,
    /// Override-redirect window showing the icon under the pointer
    feedback: Option<Window>,
}

pub struct TaskbarWidget {
    config: TaskbarConfig,
    theme: Theme,
    default_icon: Rc<Icon>,
    tasks: TaskList,
    /// Last `_NET_CLIENT_LIST` seen
    client_list: Vec<Window>,
    /// Listed windows found hidden; watched for hint changes, not retried
    /// by reconcile
    hidden: HashSet<Window>,
    active: Option<Window>,
    desktop: i32,
    taken: Option<Taken>,
}

impl TaskbarWidget {
    pub fn new(config: &TaskbarConfig, theme: &ThemeConfig) -> Result<Self> {
        let theme = Theme::parse(theme, "taskbar")?;
        let default_icon = Icon::placeholder(
            config.icon_size,
            theme.idle.background.pixel(),
            theme.idle.text.pixel(),
        );
        Ok(Self {
            config: config.clone(),
            theme,
            default_icon: Rc::new(default_icon),
            tasks: TaskList::default(),
            client_list: Vec::new(),
            hidden: HashSet::new(),
            active: None,
            desktop: 0,
            taken: None,
        })
    }

    pub fn tasks(&self) -> &TaskList {
        &self.tasks
    }

    /// Bring the registry in line with `_NET_CLIENT_LIST`
    fn reconcile(&mut self, cx: &mut WidgetCx<'_>) -> Result<bool> {
        let client_list = cx.x.get_prop_windows(cx.x.root, cx.x.atoms.net_client_list)?;
        let diff = self.tasks.diff(&client_list);
        self.hidden.retain(|w| client_list.contains(w));
        self.client_list = client_list;

        let mut changed = false;
        for window in diff.removed {
            if self.tasks.remove(window).is_some() {
                debug!("Task removed: {}", window);
                changed = true;
            }
        }
        // Hidden windows come back through their hint changes
        for window in diff.added {
            if !self.hidden.contains(&window) {
                changed |= self.add_task(cx, window)?;
            }
        }
        Ok(changed)
    }

    /// Start tracking a window. Hidden windows are only watched (their
    /// hints may change later). A window that vanishes while being read is
    /// skipped and the registry left untouched. Returns true when a task
    /// was added.
    fn add_task(&mut self, cx: &mut WidgetCx<'_>, window: Window) -> Result<bool> {
        let x = cx.x;
        let trap = x.trap_errors();

        if window != cx.frame.window {
            x.select_property_changes(window)?;
        }
        if x.is_window_hidden(window)? {
            if !trap.finish() {
                self.hidden.insert(window);
            }
            return Ok(false);
        }
        self.hidden.remove(&window);

        let mut task = Task::new(window, Rc::clone(&self.default_icon));
        task.name = x.window_name(window, &mut task.name_source)?;
        if let Some(icon) = load_window_icon(x, window, self.config.icon_size)? {
            task.icon = Rc::new(icon);
        }
        task.desktop = x.window_desktop(window)?;
        task.iconified = x.is_window_iconified(window)?;

        if trap.finish() {
            debug!("Window {} vanished while being added", window);
            return Ok(false);
        }
        debug!("Task added: {} {:?} on desktop {}", window, task.name, task.desktop);
        self.tasks.insert(task);
        Ok(true)
    }

    /// Give each visible task its button and publish changed icon geometry
    fn layout(&mut self, cx: &mut WidgetCx<'_>) -> Result<()> {
        let rect = cx.rect;
        let visible = self.tasks.visible(self.desktop);
        let count = visible.len() as i32;

        for task in self.tasks.iter_mut() {
            task.rect = Rect::default();
        }
        if count == 0 {
            return Ok(());
        }

        let length = if cx.frame.vertical { rect.height } else { rect.width };
        let mut span = length / count;
        if self.config.task_max_width > 0 {
            span = span.min(self.config.task_max_width);
        }

        for (n, &index) in visible.iter().enumerate() {
            let offset = n as i32 * span;
            let button = if cx.frame.vertical {
                Rect::new(rect.x, rect.y + offset, rect.width, span)
            } else {
                Rect::new(rect.x + offset, rect.y, span, rect.height)
            };
            self.tasks.set_rect(index, button);
        }

        let icon_geometry = cx.x.atoms.net_wm_icon_geometry;
        for task in self.tasks.iter_mut().filter(|t| t.rect.width > 0) {
            let target = cx.frame.to_root(task.rect);
            if task.published == Some(target) {
                continue;
            }
            let trap = cx.x.trap_errors();
            cx.x.set_prop_cardinals(
                task.window,
                icon_geometry,
                &[target.x as u32, target.y as u32, target.width as u32, target.height as u32],
            )?;
            if !trap.finish() {
                task.published = Some(target);
            }
        }
        Ok(())
    }

    fn relayout(&mut self, cx: &mut WidgetCx<'_>) -> Result<()> {
        self.layout(cx)?;
        cx.redraw();
        Ok(())
    }

    /// Hint change on a window we are not tracking: it may have stopped
    /// being hidden
    fn untracked_change(&mut self, cx: &mut WidgetCx<'_>, event: &PropertyEvent) -> Result<()> {
        let x = cx.x;
        let atoms = &x.atoms;
        if event.atom != atoms.net_wm_window_type && event.atom != atoms.net_wm_state {
            return Ok(());
        }
        if !self.client_list.contains(&event.window) {
            return Ok(());
        }
        if self.add_task(cx, event.window)? {
            self.relayout(cx)?;
        }
        Ok(())
    }

    fn tracked_change(&mut self, cx: &mut WidgetCx<'_>, event: &PropertyEvent) -> Result<()> {
        let x = cx.x;
        let atoms = &x.atoms;
        let window = event.window;
        let trap = x.trap_errors();

        if event.atom == atoms.net_wm_desktop {
            let desktop = x.window_desktop(window)?;
            if !trap.finish() && self.tasks.set_desktop(window, desktop) {
                self.relayout(cx)?;
            }
            return Ok(());
        }

        if event.atom == atoms.net_wm_window_type || event.atom == atoms.net_wm_state {
            if x.is_window_hidden(window)? {
                if !trap.finish() {
                    self.tasks.remove(window);
                    self.hidden.insert(window);
                    debug!("Task {} is now hidden", window);
                    self.relayout(cx)?;
                }
                return Ok(());
            }
        }

        if event.atom == atoms.net_wm_state || event.atom == atoms.wm_state {
            let iconified = x.is_window_iconified(window)?;
            if !trap.finish() {
                if let Some(task) = self.tasks.find_mut(window) {
                    if task.iconified != iconified {
                        task.iconified = iconified;
                        cx.redraw();
                    }
                }
            }
            return Ok(());
        }

        if event.atom == atoms.net_wm_icon || event.atom == atoms.wm_hints {
            let icon = load_window_icon(x, window, self.config.icon_size)?;
            if !trap.finish() {
                if let Some(task) = self.tasks.find_mut(window) {
                    task.icon = icon.map(Rc::new).unwrap_or_else(|| Rc::clone(&self.default_icon));
                    cx.redraw();
                }
            }
            return Ok(());
        }

        let Some(task) = self.tasks.find_mut(window) else {
            return Ok(());
        };
        let refresh = match task.name_source {
            Some(source) => source.atom == event.atom,
            None => atoms.name_sources().iter().any(|s| s.atom == event.atom),
        };
        if refresh {
            let mut source = task.name_source;
            let name = x.window_name(window, &mut source)?;
            if !trap.finish() {
                task.name_source = source;
                if task.name != name {
                    task.name = name;
                    cx.redraw();
                }
            }
        }
        Ok(())
    }

    fn end_drag(&mut self, cx: &mut WidgetCx<'_>) -> Result<()> {
        cx.x.set_drag_cursor(cx.frame.window, false)?;
        if let Some(feedback) = self.taken.take().and_then(|t| t.feedback) {
            cx.x.destroy_window(feedback)?;
        }
        Ok(())
    }

    /// Dropped far enough outside the taskbar to mean "close". The panel
    /// coordinates are compared against the widget's size, not its origin.
    fn beyond_death_threshold(&self, rect: Rect, drag: &DragInfo) -> bool {
        let t = self.config.task_death_threshold;
        let (x, y) = (drag.cur_x, drag.cur_y);
        x < -t || y < -t || x > rect.width + t || y > rect.height + t
    }
}

impl Widget for TaskbarWidget {
    fn name(&self) -> &'static str {
        "taskbar"
    }

    fn size(&self) -> WidgetSize {
        WidgetSize::Fill
    }

    fn attach(&mut self, cx: &mut WidgetCx<'_>) -> Result<()> {
        let x = cx.x;
        self.desktop = x.get_prop_int(x.root, x.atoms.net_current_desktop)?;
        self.active = x.get_prop_window(x.root, x.atoms.net_active_window)?;
        self.reconcile(cx)?;
        info!("Taskbar tracking {} windows", self.tasks.len());
        self.relayout(cx)
    }

    fn draw(&mut self, cx: &mut WidgetCx<'_>, painter: &mut dyn Painter) -> Result<()> {
        painter.fill_rect(cx.rect, self.theme.background)?;

        for index in self.tasks.visible(self.desktop) {
            let Some(task) = self.tasks.get(index) else {
                continue;
            };
            let style = if Some(task.window) == self.active {
                self.theme.pressed
            } else {
                self.theme.idle
            };
            let button = Rect::new(
                task.rect.x + TASK_SPACING / 2,
                task.rect.y + TASK_SPACING / 2,
                task.rect.width - TASK_SPACING,
                task.rect.height - TASK_SPACING,
            );
            painter.fill_rect(button, style.background)?;

            let icon_x = button.x + TASK_PADDING;
            let icon_y = button.y + (button.height - task.icon.height as i32) / 2;
            painter.draw_icon(icon_x, icon_y, &task.icon, style.background)?;

            let text_x = icon_x + task.icon.width as i32;
            let text = Rect::new(text_x, button.y, button.right() - text_x, button.height);
            painter.draw_text(text, &task.label(), style.text, style.background)?;
        }
        Ok(())
    }

    fn button_click(&mut self, cx: &mut WidgetCx<'_>, event: &ButtonEvent) -> Result<()> {
        if event.kind != ButtonKind::Release || event.button != 1 {
            return Ok(());
        }
        let Some(task) = self
            .tasks
            .task_at(self.desktop, event.x, event.y)
            .and_then(|i| self.tasks.get(i))
        else {
            return Ok(());
        };

        if Some(task.window) == self.active {
            cx.x.iconify_window(task.window)
        } else {
            cx.x.activate_window(task.window)
        }
    }

    fn prop_change(&mut self, cx: &mut WidgetCx<'_>, event: &PropertyEvent) -> Result<()> {
        let x = cx.x;
        if event.window == x.root {
            if event.atom == x.atoms.net_client_list {
                if self.reconcile(cx)? {
                    self.relayout(cx)?;
                }
            } else if event.atom == x.atoms.net_current_desktop {
                self.desktop = x.get_prop_int(x.root, x.atoms.net_current_desktop)?;
                self.relayout(cx)?;
            } else if event.atom == x.atoms.net_active_window {
                self.active = x.get_prop_window(x.root, x.atoms.net_active_window)?;
                cx.redraw();
            }
            return Ok(());
        }

        if self.tasks.contains(event.window) {
            self.tracked_change(cx, event)
        } else {
            self.untracked_change(cx, event)
        }
    }

    /// XdndPosition over the taskbar: activate the task being dragged over
    /// and tell the source to keep sending positions
    fn client_msg(&mut self, cx: &mut WidgetCx<'_>, event: &ClientMessage) -> Result<()> {
        if event.message_type != cx.x.atoms.xdnd_position || event.window != cx.frame.window {
            return Ok(());
        }
        let source = event.data[0];
        let root_x = (event.data[2] >> 16) as i32;
        let root_y = (event.data[2] & 0xFFFF) as i32;

        if !cx.frame.to_root(cx.rect).contains(root_x, root_y) {
            return Ok(());
        }
        let (x, y) = (root_x - cx.frame.x, root_y - cx.frame.y);
        if let Some(task) = self.tasks.task_at(self.desktop, x, y).and_then(|i| self.tasks.get(i)) {
            if Some(task.window) != self.active {
                cx.x.activate_window(task.window)?;
            }
        }

        let status = cx.x.atoms.xdnd_status;
        cx.x.send_dnd_message(source, status, [cx.frame.window, XDND_WANT_POSITION, 0, 0, 0])
    }

    fn dnd_start(&mut self, cx: &mut WidgetCx<'_>, drag: &DragInfo) -> Result<()> {
        let Some(task) = self
            .tasks
            .task_at(self.desktop, drag.taken_x, drag.taken_y)
            .and_then(|i| self.tasks.get(i))
        else {
            return Ok(());
        };
        let (window, icon) = (task.window, Rc::clone(&task.icon));
        debug!("Dragging task {}", window);

        cx.x.set_drag_cursor(cx.frame.window, true)?;
        let half = self.config.icon_size as i32 / 2;
        let feedback = cx.x.create_drag_window(drag.cur_root_x - half, drag.cur_root_y - half, &icon)?;
        self.taken = Some(Taken { window, feedback });
        Ok(())
    }

    fn dnd_drag(&mut self, cx: &mut WidgetCx<'_>, drag: &DragInfo) -> Result<()> {
        let Some(feedback) = self.taken.as_ref().and_then(|t| t.feedback) else {
            return Ok(());
        };
        let half = self.config.icon_size as i32 / 2;
        cx.x.move_window(feedback, drag.cur_root_x - half, drag.cur_root_y - half)
    }

    fn dnd_drop(&mut self, cx: &mut WidgetCx<'_>, drag: &DragInfo) -> Result<()> {
        if drag.taken_on != cx.id {
            return Ok(());
        }
        let Some(window) = self.taken.as_ref().map(|t| t.window) else {
            return Ok(());
        };

        match drag.dropped_on {
            Some(target) if target == cx.id => {
                let from = self.tasks.position(window);
                let to = self.tasks.task_at(self.desktop, drag.dropped_x, drag.dropped_y);
                if let (Some(from), Some(to)) = (from, to) {
                    let same_desktop = self.tasks.get(from).map(|t| t.desktop)
                        == self.tasks.get(to).map(|t| t.desktop);
                    if from != to && same_desktop {
                        debug!("Task {} moved from {} to {}", window, from, to);
                        self.tasks.move_task(from, to);
                        self.relayout(cx)?;
                    }
                }
            }
            None if self.beyond_death_threshold(cx.rect, drag) => {
                info!("Task {} dragged off the panel, closing", window);
                cx.x.close_window(window)?;
            }
            _ => {}
        }
        self.end_drag(cx)
    }
}
