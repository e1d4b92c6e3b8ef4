//! News interstitial state: which item is next, whether the modal is up, and
//! the cosmetic countdown shown while it is.
//!
//! Timing lives in the scheduler; this type only applies transitions.

use crate::domain::{Carousel, NewsItem};

/// Countdown shown when the modal opens (seconds of `T_visible`).
pub const DEFAULT_COUNTDOWN_SECS: u32 = 10;

#[derive(Debug, Clone, PartialEq)]
pub struct NewsModal {
    items: Carousel<NewsItem>,
    visible: bool,
    countdown: u32,
    countdown_start: u32,
}

impl Default for NewsModal {
    fn default() -> Self {
        Self::new(DEFAULT_COUNTDOWN_SECS)
    }
}

impl NewsModal {
    pub fn new(countdown_start: u32) -> Self {
        Self {
            items: Carousel::default(),
            visible: false,
            countdown: 0,
            countdown_start,
        }
    }

    pub fn items(&self) -> &Carousel<NewsItem> {
        &self.items
    }

    pub fn cursor(&self) -> usize {
        self.items.cursor()
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub fn countdown(&self) -> u32 {
        self.countdown
    }

    /// The item on screen, only while the modal is up.
    pub fn visible_item(&self) -> Option<&NewsItem> {
        if self.visible { self.items.current() } else { None }
    }

    /// Open the modal with a fresh countdown. Inert (returns false) on an empty list.
    pub fn arm(&mut self) -> bool {
        if self.items.is_empty() {
            self.visible = false;
            return false;
        }
        self.visible = true;
        self.countdown = self.countdown_start;
        true
    }

    /// One-second countdown step. Never drives dismissal.
    pub fn tick_countdown(&mut self) {
        if self.visible {
            self.countdown = self.countdown.saturating_sub(1);
        }
    }

    /// Scheduled end of the visible window: hide and move to the next item.
    /// Idempotent on visibility, so it is safe after a manual dismiss.
    pub fn hide_and_advance(&mut self) {
        self.visible = false;
        self.items.advance();
    }

    /// Manual close. Leaves the cursor alone and does not touch the cycle.
    pub fn dismiss(&mut self) {
        self.visible = false;
    }

    /// Swap in a new (already filtered) snapshot. Returns true when the
    /// length changed. An empty snapshot closes the modal.
    pub fn replace(&mut self, items: Vec<NewsItem>) -> bool {
        let resized = self.items.replace(items);
        if self.items.is_empty() {
            self.visible = false;
            self.countdown = 0;
        }
        resized
    }
}
