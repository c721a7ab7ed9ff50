//! services/client/src/adapters/navigator.rs
//!
//! A `Navigator` for the terminal: there is no address bar, so the rewritten
//! query string is logged and kept as the last visited location.

use std::sync::Mutex;
use tracing::info;
use url::form_urlencoded;

use job_board_core::ports::Navigator;

#[derive(Debug, Default)]
pub struct LogNavigator {
    location: Mutex<String>,
}

impl LogNavigator {
    pub fn new() -> Self {
        Self::default()
    }

    /// The query string of the last `replace_query`, without the leading `?`.
    pub fn location(&self) -> String {
        self.location
            .lock()
            .map(|l| l.clone())
            .unwrap_or_default()
    }
}

/// Encodes pairs the way a browser's `URLSearchParams` would.
pub fn encode_query(params: &[(String, String)]) -> String {
    form_urlencoded::Serializer::new(String::new())
        .extend_pairs(params)
        .finish()
}

impl Navigator for LogNavigator {
    fn replace_query(&self, params: &[(String, String)]) {
        let query = encode_query(params);
        info!("Location: /posts?{}", query);
        if let Ok(mut location) = self.location.lock() {
            *location = query;
        }
    }
}
