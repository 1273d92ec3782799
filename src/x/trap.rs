//! Scoped X error trap
//!
//! A window id handed to us by the window manager may be destroyed before we
//! get to use it. Requests against such a window fail with BadWindow; inside
//! a trap these failures are recorded instead of logged, and the caller
//! checks the trap afterwards to decide whether to skip the window.
//!
//! Traps nest: entering pushes a fresh slot, finishing (or dropping) the
//! guard pops it, and errors are recorded in the innermost slot only. The
//! slot stack lives in a `RefCell` and assumes the single-threaded event
//! loop; it must not be shared across threads.

use std::cell::RefCell;

#[derive(Debug, Default)]
pub struct TrapStack {
    slots: RefCell<Vec<bool>>,
}

impl TrapStack {
    pub fn enter(&self) -> ErrorTrap<'_> {
        let depth = {
            let mut slots = self.slots.borrow_mut();
            slots.push(false);
            slots.len()
        };
        ErrorTrap {
            stack: self,
            depth,
            done: false,
        }
    }

    /// Record an error in the innermost trap. Returns false when no trap is
    /// active and the caller should report the error itself.
    pub fn record(&self) -> bool {
        match self.slots.borrow_mut().last_mut() {
            Some(slot) => {
                *slot = true;
                true
            }
            None => false,
        }
    }

    #[cfg(test)]
    pub fn active(&self) -> bool {
        !self.slots.borrow().is_empty()
    }
}

/// Guard for one trap level
#[must_use = "an error trap is useless unless finished"]
pub struct ErrorTrap<'a> {
    stack: &'a TrapStack,
    depth: usize,
    done: bool,
}

impl ErrorTrap<'_> {
    /// Leave the trap, returning true if any error was caught inside it
    pub fn finish(mut self) -> bool {
        self.done = true;
        self.pop()
    }

    fn pop(&self) -> bool {
        let mut slots = self.stack.slots.borrow_mut();
        debug_assert_eq!(slots.len(), self.depth, "error traps released out of order");
        slots.pop().unwrap_or(false)
    }
}

impl Drop for ErrorTrap<'_> {
    fn drop(&mut self) {
        if !self.done {
            self.pop();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_records_only_inside_trap() {
        let stack = TrapStack::default();
        assert!(!stack.record());

        let trap = stack.enter();
        assert!(stack.record());
        assert!(trap.finish());
        assert!(!stack.active());
    }

    #[test]
    fn test_nested_traps_keep_separate_results() {
        let stack = TrapStack::default();
        let outer = stack.enter();
        {
            let inner = stack.enter();
            stack.record();
            assert!(inner.finish());
        }
        assert!(!outer.finish());
    }

    #[test]
    fn test_dropped_trap_is_released() {
        let stack = TrapStack::default();
        {
            let _trap = stack.enter();
            stack.record();
        }
        assert!(!stack.active());
        assert!(!stack.record());
    }
}
