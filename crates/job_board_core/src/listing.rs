//! crates/job_board_core/src/listing.rs
//!
//! The listing controller: browse and search pagination over the backend,
//! the user's own listings, and upkeep of the short-lived listing cache.

use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};

use crate::cache::ListingCache;
use crate::config::ControllerSettings;
use crate::domain::{
    AvailableFilters, Category, FilterSet, Listing, ListingPage, ListingStatus, ListingUpdate,
    NewListing,
};
use crate::error::{ControllerError, ControllerResult};
use crate::ports::{BackendGateway, ClientStore, Clock, PortResult};

//=========================================================================================
// State
//=========================================================================================

/// Whether the listing set currently comes from browsing or from a search.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ListingMode {
    #[default]
    Browse,
    Search { query: String },
}

#[derive(Debug, Default)]
struct ListingState {
    listings: Vec<Listing>,
    my_listings: Vec<Listing>,
    next_token: Option<String>,
    category: Option<Category>,
    mode: ListingMode,
    active_filters: FilterSet,
    available_filters: Option<AvailableFilters>,
    is_loading: bool,
    error: Option<String>,
    /// Bumped by every page request; responses from older generations are discarded.
    generation: u64,
    /// Generation of the page request currently awaiting the gateway.
    in_flight: Option<u64>,
}

impl ListingState {
    /// Clears the in-flight marker if `generation` still owns it.
    fn release(&mut self, generation: u64) {
        if self.in_flight == Some(generation) {
            self.in_flight = None;
            self.is_loading = false;
        }
    }
}

/// Ownership of the in-flight marker for one page request. If the request
/// future is dropped before the response is handled, the marker is released
/// so later loads are not rejected forever.
struct InFlight {
    state: Arc<Mutex<ListingState>>,
    generation: u64,
    settled: bool,
}

impl InFlight {
    fn settle(mut self) {
        self.settled = true;
    }
}

impl Drop for InFlight {
    fn drop(&mut self) {
        if self.settled {
            return;
        }
        let generation = self.generation;
        debug!("Page request {} dropped before completion", generation);
        match self.state.try_lock() {
            Ok(mut state) => state.release(generation),
            Err(_) => {
                let state = self.state.clone();
                if let Ok(runtime) = tokio::runtime::Handle::try_current() {
                    runtime.spawn(async move {
                        state.lock().await.release(generation);
                    });
                }
            }
        }
    }
}

/// A read-only copy of the controller state for rendering.
#[derive(Debug, Clone, PartialEq)]
pub struct ListingSnapshot {
    pub listings: Vec<Listing>,
    pub my_listings: Vec<Listing>,
    pub category: Option<Category>,
    pub mode: ListingMode,
    pub active_filters: FilterSet,
    pub available_filters: Option<AvailableFilters>,
    pub has_more: bool,
    pub is_loading: bool,
    pub error: Option<String>,
}

enum PageRequest {
    Browse {
        category: Option<Category>,
        token: Option<String>,
    },
    Search {
        query: String,
        filters: FilterSet,
        token: Option<String>,
    },
}

impl PageRequest {
    fn appends(&self) -> bool {
        match self {
            PageRequest::Browse { token, .. } | PageRequest::Search { token, .. } => token.is_some(),
        }
    }

    fn failure_message(&self) -> &'static str {
        match self {
            PageRequest::Browse { .. } => "Failed to load posts",
            PageRequest::Search { .. } => "Failed to search posts",
        }
    }
}

//=========================================================================================
// ListingController
//=========================================================================================

pub struct ListingController {
    gateway: Arc<dyn BackendGateway>,
    cache: ListingCache,
    settings: ControllerSettings,
    state: Arc<Mutex<ListingState>>,
}

impl ListingController {
    /// Creates the controller, seeding it from the listing cache when a fresh
    /// entry exists.
    pub fn new(
        gateway: Arc<dyn BackendGateway>,
        store: Arc<dyn ClientStore>,
        clock: Arc<dyn Clock>,
        settings: ControllerSettings,
    ) -> Self {
        let cache = ListingCache::new(store, clock, settings.listing_cache_ttl);
        let mut state = ListingState::default();
        if let Some(cached) = cache.read() {
            info!(
                "Seeding {} listings from cache (category: {:?})",
                cached.posts.len(),
                cached.category
            );
            state.listings = cached.posts;
            state.category = cached.category;
            state.next_token = cached.next_token;
        }

        Self {
            gateway,
            cache,
            settings,
            state: Arc::new(Mutex::new(state)),
        }
    }

    pub async fn snapshot(&self) -> ListingSnapshot {
        let state = self.state.lock().await;
        ListingSnapshot {
            listings: state.listings.clone(),
            my_listings: state.my_listings.clone(),
            category: state.category,
            mode: state.mode.clone(),
            active_filters: state.active_filters.clone(),
            available_filters: state.available_filters.clone(),
            has_more: state.next_token.is_some(),
            is_loading: state.is_loading,
            error: state.error.clone(),
        }
    }

    pub async fn listings(&self) -> Vec<Listing> {
        self.state.lock().await.listings.clone()
    }

    pub async fn has_more(&self) -> bool {
        self.state.lock().await.next_token.is_some()
    }

    pub async fn available_filters(&self) -> Option<AvailableFilters> {
        self.state.lock().await.available_filters.clone()
    }

    pub async fn my_listings(&self) -> Vec<Listing> {
        self.state.lock().await.my_listings.clone()
    }

    pub async fn is_loading(&self) -> bool {
        self.state.lock().await.is_loading
    }

    pub async fn error(&self) -> Option<String> {
        self.state.lock().await.error.clone()
    }

    /// The category of the current browse set.
    pub async fn category(&self) -> Option<Category> {
        self.state.lock().await.category
    }

    //-------------------------------------------------------------------------------------
    // Browse and search
    //-------------------------------------------------------------------------------------

    /// Loads the first page for `category` (replacing the set), or with
    /// `load_more` the next page of whatever the current set is (appending).
    ///
    /// Fails with `Superseded` when a newer load or search replaced this one
    /// while it was waiting on the gateway.
    pub async fn load_posts(
        &self,
        load_more: bool,
        category: Option<Category>,
    ) -> ControllerResult<Vec<Listing>> {
        let (request, pending) = {
            let mut state = self.state.lock().await;
            let request = if load_more {
                let token = Self::continuation(&state)?;
                match &state.mode {
                    ListingMode::Browse => PageRequest::Browse {
                        category: state.category,
                        token: Some(token),
                    },
                    ListingMode::Search { query } => PageRequest::Search {
                        query: query.clone(),
                        filters: state.active_filters.clone(),
                        token: Some(token),
                    },
                }
            } else {
                state.available_filters = None;
                PageRequest::Browse {
                    category,
                    token: None,
                }
            };
            let pending = self.begin(&mut state);
            (request, pending)
        };
        self.run(request, pending).await
    }

    /// Runs a search, always replacing the listing set.
    pub async fn search_posts(
        &self,
        query: &str,
        filters: FilterSet,
    ) -> ControllerResult<Vec<Listing>> {
        let pending = {
            let mut state = self.state.lock().await;
            self.begin(&mut state)
        };
        let request = PageRequest::Search {
            query: query.trim().to_string(),
            filters,
            token: None,
        };
        self.run(request, pending).await
    }

    /// Resets the active filter set without re-fetching.
    pub async fn clear_filters(&self) {
        self.state.lock().await.active_filters = FilterSet::default();
    }

    fn continuation(state: &ListingState) -> ControllerResult<String> {
        if state.in_flight.is_some() {
            return Err(ControllerError::ConcurrentLoad);
        }
        state
            .next_token
            .clone()
            .ok_or(ControllerError::StaleContinuation)
    }

    /// Marks a new page request as in flight, superseding any older one.
    fn begin(&self, state: &mut ListingState) -> InFlight {
        state.generation += 1;
        state.in_flight = Some(state.generation);
        state.is_loading = true;
        state.error = None;
        InFlight {
            state: self.state.clone(),
            generation: state.generation,
            settled: false,
        }
    }

    async fn run(&self, request: PageRequest, pending: InFlight) -> ControllerResult<Vec<Listing>> {
        let generation = pending.generation;
        let limit = self.settings.listing_page_size;
        let result: PortResult<ListingPage> = match &request {
            PageRequest::Browse { category, token } => {
                self.gateway
                    .list_listings(limit, token.as_deref(), *category)
                    .await
            }
            PageRequest::Search {
                query,
                filters,
                token,
            } => {
                self.gateway
                    .search_listings(query, filters, limit, token.as_deref())
                    .await
            }
        };

        let mut state = self.state.lock().await;
        pending.settle();
        if state.generation != generation {
            debug!("Discarding superseded listing response (generation {})", generation);
            return Err(ControllerError::Superseded);
        }
        state.release(generation);

        let page = match result {
            Ok(page) => page,
            Err(e) => {
                error!("{}: {:?}", request.failure_message(), e);
                state.listings.clear();
                state.next_token = None;
                state.available_filters = None;
                state.error = Some(request.failure_message().to_string());
                return Err(e.into());
            }
        };

        if request.appends() {
            let fresh: Vec<Listing> = page
                .listings
                .into_iter()
                .filter(|l| !state.listings.iter().any(|existing| existing.id == l.id))
                .collect();
            state.listings.extend(fresh);
        } else {
            state.listings = page.listings;
        }
        state.next_token = page.next_token;

        match request {
            PageRequest::Browse { category, token } => {
                if token.is_none() {
                    state.category = category;
                    state.mode = ListingMode::Browse;
                }
                if let Err(e) = self.cache.write(
                    &state.listings,
                    state.category,
                    state.next_token.as_deref(),
                ) {
                    warn!("Failed to persist listing cache: {}", e);
                }
            }
            PageRequest::Search {
                query,
                filters,
                token,
            } => {
                if token.is_none() {
                    state.available_filters =
                        page.available_filters.filter(|f| !f.is_empty());
                    state.active_filters = filters;
                    state.mode = ListingMode::Search { query };
                }
            }
        }

        Ok(state.listings.clone())
    }

    //-------------------------------------------------------------------------------------
    // The current user's listings
    //-------------------------------------------------------------------------------------

    pub async fn load_my_posts(&self) -> ControllerResult<Vec<Listing>> {
        self.state.lock().await.error = None;
        match self.gateway.get_my_listings().await {
            Ok(listings) => {
                let mut state = self.state.lock().await;
                state.my_listings = listings;
                Ok(state.my_listings.clone())
            }
            Err(e) => {
                error!("Failed to load my posts: {:?}", e);
                let mut state = self.state.lock().await;
                state.my_listings.clear();
                state.error = Some("Failed to load my posts".to_string());
                Err(e.into())
            }
        }
    }

    pub async fn get_post(&self, listing_id: &str) -> ControllerResult<Listing> {
        Ok(self.gateway.get_listing(listing_id).await?)
    }

    pub async fn create_post(&self, fields: &NewListing) -> ControllerResult<Listing> {
        let listing = self.gateway.create_listing(fields).await?;
        self.cache.clear();
        self.state.lock().await.my_listings.insert(0, listing.clone());
        info!("Created listing {}", listing.id);
        Ok(listing)
    }

    pub async fn update_post(&self, listing_id: &str, fields: &ListingUpdate) -> ControllerResult<()> {
        self.gateway.update_listing(listing_id, fields).await?;
        self.cache.clear();
        let mut state = self.state.lock().await;
        if let Some(listing) = state.my_listings.iter_mut().find(|l| l.id == listing_id) {
            listing.apply_update(fields);
        }
        Ok(())
    }

    pub async fn delete_post(&self, listing_id: &str) -> ControllerResult<()> {
        self.gateway.delete_listing(listing_id).await?;
        self.cache.clear();
        self.state
            .lock()
            .await
            .my_listings
            .retain(|l| l.id != listing_id);
        info!("Deleted listing {}", listing_id);
        Ok(())
    }

    pub async fn update_post_status(
        &self,
        listing_id: &str,
        status: ListingStatus,
    ) -> ControllerResult<()> {
        self.gateway.update_listing_status(listing_id, status).await?;
        self.cache.clear();
        let mut state = self.state.lock().await;
        if let Some(listing) = state.my_listings.iter_mut().find(|l| l.id == listing_id) {
            listing.status = vec![status];
        }
        Ok(())
    }
}
