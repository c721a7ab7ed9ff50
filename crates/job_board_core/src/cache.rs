//! crates/job_board_core/src/cache.rs
//!
//! The short-lived snapshot of the last browse result, kept in the client store
//! so a freshly mounted listing view can render without waiting for the network.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

use crate::config::LISTING_CACHE_KEY;
use crate::domain::{Category, Listing};
use crate::error::{ControllerError, ControllerResult};
use crate::ports::{ClientStore, Clock};

/// What gets persisted after a successful browse load.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CachedListings {
    pub posts: Vec<Listing>,
    pub category: Option<Category>,
    pub next_token: Option<String>,
    pub timestamp: DateTime<Utc>,
}

#[derive(Clone)]
pub struct ListingCache {
    store: Arc<dyn ClientStore>,
    clock: Arc<dyn Clock>,
    ttl: Duration,
}

impl ListingCache {
    pub fn new(store: Arc<dyn ClientStore>, clock: Arc<dyn Clock>, ttl: Duration) -> Self {
        Self { store, clock, ttl }
    }

    /// Returns the cached snapshot if one exists and is younger than the TTL.
    /// Expired or unreadable entries are dropped and never surface.
    pub fn read(&self) -> Option<CachedListings> {
        let raw = match self.store.get(LISTING_CACHE_KEY) {
            Ok(Some(raw)) => raw,
            Ok(None) => return None,
            Err(e) => {
                warn!("Failed to read listing cache: {}", e);
                return None;
            }
        };

        let entry = match serde_json::from_str::<CachedListings>(&raw) {
            Ok(entry) => entry,
            Err(e) => {
                warn!("Discarding unreadable listing cache: {}", e);
                self.clear();
                return None;
            }
        };

        // A timestamp in the future (clock skew) counts as expired.
        let fresh = match self.clock.now().signed_duration_since(entry.timestamp).to_std() {
            Ok(age) => age < self.ttl,
            Err(_) => false,
        };
        if !fresh {
            debug!("Listing cache expired; discarding.");
            self.clear();
            return None;
        }

        Some(entry)
    }

    /// Stores a browse result, stamped with the current time.
    pub fn write(
        &self,
        posts: &[Listing],
        category: Option<Category>,
        next_token: Option<&str>,
    ) -> ControllerResult<()> {
        let entry = CachedListings {
            posts: posts.to_vec(),
            category,
            next_token: next_token.map(str::to_string),
            timestamp: self.clock.now(),
        };
        let json = serde_json::to_string(&entry).map_err(|e| ControllerError::Store(e.to_string()))?;
        self.store
            .set(LISTING_CACHE_KEY, &json)
            .map_err(|e| ControllerError::Store(e.to_string()))
    }

    pub fn clear(&self) {
        if let Err(e) = self.store.remove(LISTING_CACHE_KEY) {
            warn!("Failed to clear listing cache: {}", e);
        }
    }
}
