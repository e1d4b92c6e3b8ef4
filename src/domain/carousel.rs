//! Cyclic cursor over an immutable snapshot.
//!
//! All index arithmetic for the display lives here so it can be tested
//! without timers. The cursor is wrapped with `% len` on every transition;
//! reads go through `get`, so a stale cursor can never index out of bounds.

/// `{items, cursor}` value object driven by the display timers.
#[derive(Debug, Clone, PartialEq)]
pub struct Carousel<T> {
    items: Vec<T>,
    cursor: usize,
}

impl<T> Default for Carousel<T> {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            cursor: 0,
        }
    }
}

impl<T> Carousel<T> {
    pub fn new(items: Vec<T>) -> Self {
        Self { items, cursor: 0 }
    }

    pub fn items(&self) -> &[T] {
        &self.items
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Item under the cursor. `None` when empty, which callers render as nothing.
    pub fn current(&self) -> Option<&T> {
        self.items.get(self.cursor)
    }

    /// 1-based position and total, for "N of M" counters.
    pub fn position(&self) -> Option<(usize, usize)> {
        self.current().map(|_| (self.cursor + 1, self.items.len()))
    }

    /// Timer tick. Lists of 0 or 1 items do not move (no flicker, no `% 0`).
    pub fn advance(&mut self) {
        if self.items.len() > 1 {
            self.cursor = (self.cursor + 1) % self.items.len();
        } else {
            self.clamp_to_length();
        }
    }

    /// Manual "next": `(cursor + 1) mod len`.
    pub fn next(&mut self) {
        let len = self.items.len();
        if len == 0 {
            self.cursor = 0;
            return;
        }
        self.cursor = (self.cursor % len + 1) % len;
    }

    /// Manual "prev": `(cursor - 1 + len) mod len`.
    pub fn prev(&mut self) {
        let len = self.items.len();
        if len == 0 {
            self.cursor = 0;
            return;
        }
        self.cursor = (self.cursor % len + len - 1) % len;
    }

    /// Wraps a cursor left behind by a shrunken snapshot back into `[0, len)`.
    pub fn clamp_to_length(&mut self) {
        let len = self.items.len();
        self.cursor = if len == 0 { 0 } else { self.cursor % len };
    }

    /// Swap in a new snapshot, keeping the cursor (wrapped). Returns true when
    /// the length changed, which is what invalidates the owning timer.
    pub fn replace(&mut self, items: Vec<T>) -> bool {
        let resized = items.len() != self.items.len();
        self.items = items;
        self.clamp_to_length();
        resized
    }
}
