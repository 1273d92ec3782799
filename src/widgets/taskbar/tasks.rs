//! Task registry
//!
//! Tracked top-level windows in ascending desktop order. Ties keep their
//! insertion order; sticky windows (desktop -1) sort first and are visible
//! on every desktop.

use std::rc::Rc;

use x11rb::protocol::xproto::Window;

use crate::geometry::Rect;
use crate::x::atoms::NameSource;
use crate::x::props::ALL_DESKTOPS;
use crate::x::Icon;

#[derive(Debug, Clone)]
pub struct Task {
    pub window: Window,
    pub name: String,
    /// Property the name was last read from
    pub name_source: Option<NameSource>,
    pub icon: Rc<Icon>,
    pub desktop: i32,
    pub iconified: bool,
    /// Button rectangle, panel coordinates
    pub rect: Rect,
    /// Last `_NET_WM_ICON_GEOMETRY` written for this window
    pub published: Option<Rect>,
}

impl Task {
    pub fn new(window: Window, icon: Rc<Icon>) -> Self {
        Self {
            window,
            name: String::new(),
            name_source: None,
            icon,
            desktop: 0,
            iconified: false,
            rect: Rect::default(),
            published: None,
        }
    }

    pub fn is_visible_on(&self, desktop: i32) -> bool {
        self.desktop == desktop || self.desktop == ALL_DESKTOPS
    }

    /// Label as drawn: iconified windows get brackets
    pub fn label(&self) -> String {
        if self.iconified {
            format!("[{}]", self.name)
        } else {
            self.name.clone()
        }
    }
}

/// Windows to drop and windows to add to bring the registry in line with
/// a client list
#[derive(Debug, Default, PartialEq, Eq)]
pub struct ClientListDiff {
    pub removed: Vec<Window>,
    pub added: Vec<Window>,
}

impl ClientListDiff {
    pub fn is_empty(&self) -> bool {
        self.removed.is_empty() && self.added.is_empty()
    }
}

#[derive(Debug, Default)]
pub struct TaskList {
    tasks: Vec<Task>,
}

impl TaskList {
    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Task> {
        self.tasks.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Task> {
        self.tasks.iter_mut()
    }

    pub fn get(&self, index: usize) -> Option<&Task> {
        self.tasks.get(index)
    }

    pub fn position(&self, window: Window) -> Option<usize> {
        self.tasks.iter().position(|t| t.window == window)
    }

    pub fn find(&self, window: Window) -> Option<&Task> {
        self.tasks.iter().find(|t| t.window == window)
    }

    pub fn find_mut(&mut self, window: Window) -> Option<&mut Task> {
        self.tasks.iter_mut().find(|t| t.window == window)
    }

    pub fn contains(&self, window: Window) -> bool {
        self.position(window).is_some()
    }

    /// Insert after the last task whose desktop is not greater than the new
    /// one's, or at the head when there is none. Returns the index used.
    pub fn insert(&mut self, task: Task) -> usize {
        let at = self
            .tasks
            .iter()
            .rposition(|t| t.desktop <= task.desktop)
            .map_or(0, |i| i + 1);
        self.tasks.insert(at, task);
        at
    }

    pub fn remove(&mut self, window: Window) -> Option<Task> {
        let index = self.position(window)?;
        Some(self.tasks.remove(index))
    }

    /// Move the task at `from` so it ends up at `to`, everything else keeping
    /// its relative order
    pub fn move_task(&mut self, from: usize, to: usize) {
        if from == to || from >= self.tasks.len() {
            return;
        }
        let task = self.tasks.remove(from);
        let to = to.min(self.tasks.len());
        self.tasks.insert(to, task);
    }

    /// Re-sort one task after a desktop hint change. The task is always
    /// taken out and reinserted, so it ends up last in its desktop group
    /// even when the value did not change. False when it is not tracked.
    pub fn set_desktop(&mut self, window: Window, desktop: i32) -> bool {
        let Some(index) = self.position(window) else {
            return false;
        };
        let mut task = self.tasks.remove(index);
        task.desktop = desktop;
        self.insert(task);
        true
    }

    /// Compare against the window manager's client list. Removals are
    /// tracked windows missing from the list; additions are listed windows
    /// not tracked (the caller may still decide not to track them).
    pub fn diff(&self, client_list: &[Window]) -> ClientListDiff {
        let removed = self
            .tasks
            .iter()
            .map(|t| t.window)
            .filter(|w| !client_list.contains(w))
            .collect();
        let added = client_list
            .iter()
            .copied()
            .filter(|&w| !self.contains(w))
            .collect();
        ClientListDiff { removed, added }
    }

    /// Indices of the tasks shown on `desktop`, in order
    pub fn visible(&self, desktop: i32) -> Vec<usize> {
        self.tasks
            .iter()
            .enumerate()
            .filter(|(_, t)| t.is_visible_on(desktop))
            .map(|(i, _)| i)
            .collect()
    }

    /// Visible task whose button contains the point
    pub fn task_at(&self, desktop: i32, x: i32, y: i32) -> Option<usize> {
        self.tasks
            .iter()
            .position(|t| t.is_visible_on(desktop) && t.rect.contains(x, y))
    }

    pub fn set_rect(&mut self, index: usize, rect: Rect) {
        if let Some(task) = self.tasks.get_mut(index) {
            task.rect = rect;
        }
    }
}
