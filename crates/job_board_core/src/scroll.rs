//! crates/job_board_core/src/scroll.rs
//!
//! Scroll pinning for the message list: follow new messages only while the
//! user sits at the bottom of the list.

use crate::config::SCROLL_PIN_THRESHOLD_PX;

/// The viewport geometry reported by a scroll event.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScrollMetrics {
    pub scroll_top: f64,
    pub scroll_height: f64,
    pub client_height: f64,
}

impl ScrollMetrics {
    pub fn distance_from_bottom(&self) -> f64 {
        self.scroll_height - self.scroll_top - self.client_height
    }
}

#[derive(Debug, Clone)]
pub struct ScrollPin {
    threshold: f64,
    user_scrolled: bool,
    last_len: usize,
}

impl Default for ScrollPin {
    fn default() -> Self {
        Self::with_threshold(SCROLL_PIN_THRESHOLD_PX)
    }
}

impl ScrollPin {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_threshold(threshold: f64) -> Self {
        Self {
            threshold,
            user_scrolled: false,
            last_len: 0,
        }
    }

    /// Recomputes the pin on every manual scroll.
    pub fn on_scroll(&mut self, metrics: ScrollMetrics) {
        self.user_scrolled = metrics.distance_from_bottom() >= self.threshold;
    }

    pub fn user_scrolled(&self) -> bool {
        self.user_scrolled
    }

    /// Records the current message count and returns whether the view should
    /// scroll to the bottom: the list grew and the user is pinned there.
    pub fn on_messages(&mut self, len: usize) -> bool {
        let grew = len > self.last_len;
        self.last_len = len;
        grew && !self.user_scrolled
    }
}
