//! Per-document scan context
//!
//! The context carries what a line's state alone cannot: the width of the
//! open code fence, where to return once it closes, and the position in the
//! fenced div color rotation. It is cheap to clone so each tokenized line can
//! keep a snapshot of the context it ended with.

use crate::grammar::StateId;

/// Mutable data that survives from one line to the next
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct Context {
    /// Backtick count of the open fence
    pub fence_width: Option<usize>,
    /// State to resume once the open fence closes
    pub fence_return_state: Option<StateId>,
    /// Next fenced div color, always below the configured color count
    pub color_counter: usize,
}

impl Context {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether a fence is currently open
    pub fn in_fence(&self) -> bool {
        self.fence_width.is_some()
    }

    /// Record an opening fence
    pub fn open_fence(&mut self, width: usize, return_state: StateId) {
        self.fence_width = Some(width);
        self.fence_return_state = Some(return_state);
    }

    /// Forget the open fence, returning the state to resume in
    pub fn close_fence(&mut self) -> Option<StateId> {
        self.fence_width = None;
        self.fence_return_state.take()
    }

    /// Color for the next fenced div line
    pub fn current_color(&self, color_count: usize) -> usize {
        self.color_counter % color_count.max(1)
    }

    /// Move the rotation past `color`
    pub fn advance_color(&mut self, color: usize, color_count: usize) {
        self.color_counter = (color + 1) % color_count.max(1);
    }
}
