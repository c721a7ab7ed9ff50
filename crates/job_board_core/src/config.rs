//! crates/job_board_core/src/config.rs
//!
//! Fixed client-side constants and the tunable controller settings.

use std::time::Duration;

/// How long a browse snapshot in the listing cache stays usable.
pub const LISTING_CACHE_TTL: Duration = Duration::from_secs(5 * 60);

/// Interval of the background conversation refresh.
pub const POLLING_INTERVAL: Duration = Duration::from_millis(5000);

pub const LISTING_PAGE_SIZE: usize = 20;
pub const MESSAGE_PAGE_SIZE: usize = 50;

/// Distance from the bottom (in px) past which the user counts as scrolled away.
pub const SCROLL_PIN_THRESHOLD_PX: f64 = 50.0;

// Budget bounds sent when only one side of a range is given.
pub const DEFAULT_MIN_BUDGET: f64 = 1.0;
pub const DEFAULT_MAX_BUDGET: f64 = 90_000_000.0;

// Persisted client state keys.
pub const AUTH_TOKEN_KEY: &str = "authToken";
pub const SCROLL_POSITION_KEY: &str = "postsScrollPosition";
pub const LISTING_CACHE_KEY: &str = "posts-cache";

/// Knobs the controllers accept so a host application can tune them.
#[derive(Debug, Clone, PartialEq)]
pub struct ControllerSettings {
    pub listing_page_size: usize,
    pub message_page_size: usize,
    pub polling_interval: Duration,
    pub listing_cache_ttl: Duration,
}

impl Default for ControllerSettings {
    fn default() -> Self {
        Self {
            listing_page_size: LISTING_PAGE_SIZE,
            message_page_size: MESSAGE_PAGE_SIZE,
            polling_interval: POLLING_INTERVAL,
            listing_cache_ttl: LISTING_CACHE_TTL,
        }
    }
}
