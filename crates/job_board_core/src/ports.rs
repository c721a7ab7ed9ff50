//! crates/job_board_core/src/ports.rs
//!
//! Defines the service contracts (traits) the controllers depend on.
//! The backend REST API, the durable client storage and the router are all
//! external collaborators; the core only ever talks to them through these ports.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::{
    Category, Contact, Discussion, FilterSet, Listing, ListingPage, ListingStatus, ListingUpdate,
    Message, MessagePage, NewListing, Proposal, ProposalDetails, ProposalStatus,
};

//=========================================================================================
// Generic Port Error and Result Types
//=========================================================================================

/// A generic error type for all port operations.
/// This abstracts away the specific errors from external services (HTTP, filesystem).
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum PortError {
    #[error("Item not found: {0}")]
    NotFound(String),
    #[error("Request rejected: {0}")]
    Validation(String),
    #[error("An unexpected error occurred: {0}")]
    Unexpected(String),
    #[error("Unauthorized")]
    Unauthorized,
}

/// A convenience type alias for `Result<T, PortError>`.
pub type PortResult<T> = Result<T, PortError>;

//=========================================================================================
// Service Ports (Traits)
//=========================================================================================

/// The REST backend, seen as plain request/response operations.
#[async_trait]
pub trait BackendGateway: Send + Sync {
    // --- Listings ---
    async fn list_listings(
        &self,
        limit: usize,
        next_token: Option<&str>,
        category: Option<Category>,
    ) -> PortResult<ListingPage>;

    async fn search_listings(
        &self,
        query: &str,
        filters: &FilterSet,
        limit: usize,
        next_token: Option<&str>,
    ) -> PortResult<ListingPage>;

    async fn get_listing(&self, listing_id: &str) -> PortResult<Listing>;

    async fn create_listing(&self, fields: &NewListing) -> PortResult<Listing>;

    async fn update_listing(&self, listing_id: &str, fields: &ListingUpdate) -> PortResult<()>;

    async fn delete_listing(&self, listing_id: &str) -> PortResult<()>;

    async fn update_listing_status(&self, listing_id: &str, status: ListingStatus)
        -> PortResult<()>;

    async fn get_my_listings(&self) -> PortResult<Vec<Listing>>;

    // --- Proposals ---
    async fn send_proposal(&self, listing_id: &str, cover_letter: &str) -> PortResult<Proposal>;

    async fn get_proposals_for_listing(
        &self,
        listing_id: &str,
        status: Option<ProposalStatus>,
    ) -> PortResult<Vec<Proposal>>;

    async fn get_my_proposals(&self) -> PortResult<Vec<Proposal>>;

    async fn update_proposal_status(
        &self,
        proposal_id: &str,
        listing_id: &str,
        status: ProposalStatus,
        contacts: Option<&[Contact]>,
    ) -> PortResult<()>;

    async fn get_proposal_details(&self, proposal_id: &str) -> PortResult<ProposalDetails>;

    // --- Chat ---
    async fn send_message(&self, proposal_id: &str, text: &str) -> PortResult<Message>;

    async fn get_messages(
        &self,
        proposal_id: &str,
        limit: usize,
        next_token: Option<&str>,
    ) -> PortResult<MessagePage>;

    async fn get_discussion(&self, proposal_id: &str) -> PortResult<Discussion>;
}

/// Durable key/value storage for small pieces of client state
/// (auth token, locale, scroll position, listing cache).
pub trait ClientStore: Send + Sync {
    fn get(&self, key: &str) -> PortResult<Option<String>>;
    fn set(&self, key: &str, value: &str) -> PortResult<()>;
    fn remove(&self, key: &str) -> PortResult<()>;
}

/// Source of wall-clock time, injectable so cache expiry can be tested.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// The view's router. Rewrites the visible query string in place, keeping
/// history navigable and the scroll position untouched.
pub trait Navigator: Send + Sync {
    fn replace_query(&self, params: &[(String, String)]);
}
