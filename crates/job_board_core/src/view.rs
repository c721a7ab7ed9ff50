//! crates/job_board_core/src/view.rs
//!
//! Keeps the listing view's URL and the listing controller in agreement.
//! Navigation events drive the controller; user actions rewrite the URL and
//! then drive the controller, so both end at the same values. A navigation
//! that carries the query already applied is ignored, which stops the
//! URL-rewrite from echoing back as a second fetch.

use std::sync::Arc;
use tracing::{debug, warn};

use crate::config::SCROLL_POSITION_KEY;
use crate::domain::{Category, FilterSet, Listing};
use crate::error::ControllerResult;
use crate::listing::ListingController;
use crate::ports::{ClientStore, Navigator};
use crate::query::ListingQuery;

pub struct ListingView {
    controller: ListingController,
    navigator: Arc<dyn Navigator>,
    store: Arc<dyn ClientStore>,
    current: ListingQuery,
    applied: Option<ListingQuery>,
}

impl ListingView {
    pub fn new(
        controller: ListingController,
        navigator: Arc<dyn Navigator>,
        store: Arc<dyn ClientStore>,
    ) -> Self {
        Self {
            controller,
            navigator,
            store,
            current: ListingQuery::default(),
            applied: None,
        }
    }

    pub fn controller(&self) -> &ListingController {
        &self.controller
    }

    /// The intent currently reflected in the URL.
    pub fn query(&self) -> &ListingQuery {
        &self.current
    }

    /// Handles a URL change (including back/forward navigation).
    pub async fn on_navigation<I, K, V>(&mut self, params: I) -> ControllerResult<Vec<Listing>>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        self.apply(ListingQuery::from_pairs(params)).await
    }

    /// Runs a search. An empty query leaves search mode.
    pub async fn search(&mut self, query: &str, filters: FilterSet) -> ControllerResult<Vec<Listing>> {
        let next = ListingQuery {
            query: query.trim().to_string(),
            filters,
            list_category: self.current.list_category,
        };
        self.navigate(next).await
    }

    /// Changes the filters of the running search.
    pub async fn apply_filters(&mut self, filters: FilterSet) -> ControllerResult<Vec<Listing>> {
        let next = ListingQuery {
            filters,
            ..self.current.clone()
        };
        self.navigate(next).await
    }

    /// Switches the browse category, leaving search mode.
    pub async fn select_category(
        &mut self,
        list_category: Option<Category>,
    ) -> ControllerResult<Vec<Listing>> {
        self.navigate(ListingQuery::browse(list_category)).await
    }

    pub async fn clear_search(&mut self) -> ControllerResult<Vec<Listing>> {
        self.navigate(ListingQuery::browse(self.current.list_category))
            .await
    }

    pub async fn load_more(&self) -> ControllerResult<Vec<Listing>> {
        self.controller.load_posts(true, None).await
    }

    async fn navigate(&mut self, next: ListingQuery) -> ControllerResult<Vec<Listing>> {
        let normalized = ListingQuery::from_pairs(next.to_pairs());
        self.navigator.replace_query(&normalized.to_pairs());
        self.apply(normalized).await
    }

    async fn apply(&mut self, next: ListingQuery) -> ControllerResult<Vec<Listing>> {
        self.current = next.clone();
        if self.applied.as_ref() == Some(&next) {
            debug!("Query unchanged; skipping reload");
            return Ok(self.controller.listings().await);
        }

        let result = if next.is_search() {
            self.controller
                .search_posts(&next.query, next.filters.clone())
                .await
        } else {
            self.controller.clear_filters().await;
            self.controller.load_posts(false, next.list_category).await
        };

        self.applied = result.is_ok().then_some(next);
        result
    }

    //-------------------------------------------------------------------------------------
    // Scroll position
    //-------------------------------------------------------------------------------------

    /// Remembers the scroll offset before navigating away from the list.
    pub fn save_scroll(&self, offset: f64) {
        if let Err(e) = self.store.set(SCROLL_POSITION_KEY, &offset.to_string()) {
            warn!("Failed to save scroll position: {}", e);
        }
    }

    /// Takes the saved scroll offset, if any, once the new content rendered.
    pub fn restore_scroll(&self) -> Option<f64> {
        let saved = match self.store.get(SCROLL_POSITION_KEY) {
            Ok(saved) => saved?,
            Err(e) => {
                warn!("Failed to read scroll position: {}", e);
                return None;
            }
        };
        if let Err(e) = self.store.remove(SCROLL_POSITION_KEY) {
            warn!("Failed to clear scroll position: {}", e);
        }
        saved.parse().ok()
    }
}
