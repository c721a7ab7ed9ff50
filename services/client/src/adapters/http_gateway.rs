//! services/client/src/adapters/http_gateway.rs
//!
//! This module contains the HTTP adapter, the concrete implementation of the
//! `BackendGateway` port from the core crate. It talks to the job board REST
//! API with `reqwest` and translates between the backend's JSON shapes and the
//! core domain types.

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::{Arc, RwLock};
use tracing::{debug, info, warn};
use url::Url;

use job_board_core::config::{AUTH_TOKEN_KEY, DEFAULT_MAX_BUDGET, DEFAULT_MIN_BUDGET};
use job_board_core::ports::{BackendGateway, ClientStore, PortError, PortResult};
use job_board_core::{
    AvailableFilters, BudgetType, Category, Contact, Discussion, FilterSet, Identity,
    JobDuration, Listing, ListingPage, ListingStatus, ListingUpdate, Message, MessagePage,
    NewListing, Proposal, ProposalDetails, ProposalStatus,
};

/// Store key holding the signed-in user as JSON.
pub const AUTH_USER_KEY: &str = "auth-user";

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

pub struct HttpGateway {
    client: Client,
    base: Url,
    store: Arc<dyn ClientStore>,
    token: RwLock<Option<String>>,
}

impl HttpGateway {
    /// Creates the gateway, picking up a previously stored auth token.
    pub fn new(base: Url, store: Arc<dyn ClientStore>) -> Self {
        let token = store.get(AUTH_TOKEN_KEY).unwrap_or_else(|e| {
            warn!("Could not read the stored auth token: {}", e);
            None
        });
        Self {
            client: Client::new(),
            base,
            store,
            token: RwLock::new(token),
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.token.read().map(|t| t.is_some()).unwrap_or(false)
    }

    /// Signs in, remembering the token and the user for later runs.
    pub async fn login(&self, email: &str, password: &str) -> PortResult<Identity> {
        let url = self.endpoint(&["auth", "login"])?;
        let request = self
            .client
            .post(url)
            .json(&json!({ "email": email, "password": password }));
        let response: LoginResponse = decode(self.send(request).await?).await?;

        let token = response.token.ok_or(PortError::Unauthorized)?;
        let user = response
            .user
            .ok_or_else(|| PortError::Unexpected("login response carried no user".to_string()))?;

        self.store.set(AUTH_TOKEN_KEY, &token)?;
        let stored = serde_json::to_string(&user).map_err(|e| PortError::Unexpected(e.to_string()))?;
        self.store.set(AUTH_USER_KEY, &stored)?;
        self.set_token(Some(token));

        info!("Signed in as {}", user.email);
        Ok(user.to_domain())
    }

    /// Forgets the token and the signed-in user.
    pub fn clear_auth(&self) -> PortResult<()> {
        self.set_token(None);
        self.store.remove(AUTH_TOKEN_KEY)?;
        self.store.remove(AUTH_USER_KEY)
    }

    /// The signed-in user saved by the last `login`, if any.
    pub fn identity(&self) -> PortResult<Option<Identity>> {
        let Some(raw) = self.store.get(AUTH_USER_KEY)? else {
            return Ok(None);
        };
        let user: UserRecord =
            serde_json::from_str(&raw).map_err(|e| PortError::Unexpected(e.to_string()))?;
        Ok(Some(user.to_domain()))
    }

    fn set_token(&self, token: Option<String>) {
        match self.token.write() {
            Ok(mut slot) => *slot = token,
            Err(e) => *e.into_inner() = token,
        }
    }

    fn bearer(&self) -> Option<String> {
        self.token.read().ok().and_then(|t| t.clone())
    }

    /// Appends path segments to the API base, escaping each one.
    fn endpoint(&self, segments: &[&str]) -> PortResult<Url> {
        let mut url = self.base.clone();
        url.path_segments_mut()
            .map_err(|_| PortError::Unexpected(format!("{} cannot be a base URL", self.base)))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    async fn send(&self, request: RequestBuilder) -> PortResult<Response> {
        let request = match self.bearer() {
            Some(token) => request.bearer_auth(token),
            None => request,
        };
        let response = request
            .send()
            .await
            .map_err(|e| PortError::Unexpected(format!("request failed: {}", e)))?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        debug!("Request failed with {}: {}", status, body);
        Err(status_error(status, body))
    }
}

async fn decode<T: DeserializeOwned>(response: Response) -> PortResult<T> {
    response
        .json::<T>()
        .await
        .map_err(|e| PortError::Unexpected(format!("malformed response: {}", e)))
}

/// Maps a non-success HTTP status to the port error the controllers understand.
pub(crate) fn status_error(status: StatusCode, body: String) -> PortError {
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => PortError::Unauthorized,
        StatusCode::NOT_FOUND => PortError::NotFound(body),
        s if s.is_client_error() => PortError::Validation(body),
        s => PortError::Unexpected(format!("server responded {}: {}", s, body)),
    }
}

//=========================================================================================
// Wire Records
//=========================================================================================

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ListResponse {
    #[serde(default)]
    posts: Vec<Listing>,
    next_token: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SearchResponse {
    #[serde(default)]
    posts: Vec<Listing>,
    next_token: Option<String>,
    filters: Option<ApiFilters>,
}

/// The facet descriptor as the search endpoint reports it.
#[derive(Debug, Default, Deserialize)]
pub(crate) struct ApiFilters {
    #[serde(default)]
    regions: Vec<String>,
    #[serde(default)]
    durations: Vec<JobDuration>,
    #[serde(default)]
    categories: Vec<Category>,
    budget: Option<ApiBudgetFilters>,
}

#[derive(Debug, Default, Deserialize)]
struct ApiBudgetFilters {
    #[serde(default, rename = "type")]
    types: Vec<BudgetType>,
    value: Option<BudgetRange>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
struct BudgetRange {
    min: f64,
    max: f64,
}

impl ApiFilters {
    /// Flattens the descriptor. Nothing to offer means `None`.
    pub(crate) fn into_available(self) -> Option<AvailableFilters> {
        let mut available = AvailableFilters {
            regions: self.regions,
            durations: self.durations,
            categories: self.categories,
            ..AvailableFilters::default()
        };
        if let Some(budget) = self.budget {
            available.budget_types = budget.types;
            if let Some(range) = budget.value {
                available.min_budget = Some(range.min);
                available.max_budget = Some(range.max);
            }
        }
        (!available.is_empty()).then_some(available)
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct SearchBody<'a> {
    query: &'a str,
    limit: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    next_token: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    filters: Option<SearchFilterBody>,
}

#[derive(Serialize)]
struct SearchFilterBody {
    #[serde(skip_serializing_if = "Option::is_none")]
    region: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    duration: Option<JobDuration>,
    #[serde(skip_serializing_if = "Option::is_none")]
    category: Option<Category>,
    #[serde(skip_serializing_if = "Option::is_none")]
    budget: Option<BudgetFilterBody>,
}

#[derive(Serialize)]
struct BudgetFilterBody {
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    budget_type: Option<BudgetType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    value: Option<BudgetRange>,
}

impl<'a> SearchBody<'a> {
    pub(crate) fn new(
        query: &'a str,
        filters: &FilterSet,
        limit: usize,
        next_token: Option<&'a str>,
    ) -> Self {
        Self {
            query: query.trim(),
            limit,
            next_token,
            filters: search_filters(filters),
        }
    }
}

fn search_filters(filters: &FilterSet) -> Option<SearchFilterBody> {
    let value = match (filters.min_budget, filters.max_budget) {
        (None, None) => None,
        (min, max) => Some(BudgetRange {
            min: min.unwrap_or(DEFAULT_MIN_BUDGET),
            max: max.unwrap_or(DEFAULT_MAX_BUDGET),
        }),
    };
    let budget = (filters.budget_type.is_some() || value.is_some()).then_some(BudgetFilterBody {
        budget_type: filters.budget_type,
        value,
    });

    let body = SearchFilterBody {
        region: filters.region.clone(),
        duration: filters.duration,
        category: filters.category,
        budget,
    };
    let empty = body.region.is_none()
        && body.duration.is_none()
        && body.category.is_none()
        && body.budget.is_none();
    (!empty).then_some(body)
}

#[derive(Deserialize)]
struct PostEnvelope {
    post: Listing,
}

#[derive(Deserialize)]
struct PostsEnvelope {
    #[serde(default)]
    posts: Vec<Listing>,
}

#[derive(Deserialize)]
struct ProposalEnvelope {
    proposal: Proposal,
}

#[derive(Deserialize)]
struct ProposalsEnvelope {
    #[serde(default)]
    proposals: Vec<Proposal>,
}

#[derive(Deserialize)]
struct SentMessageEnvelope {
    data: Message,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct MessagesResponse {
    #[serde(default)]
    messages: Vec<Message>,
    next_token: Option<String>,
}

#[derive(Deserialize)]
struct DiscussionEnvelope {
    discussion: Discussion,
}

#[derive(Deserialize)]
struct LoginResponse {
    token: Option<String>,
    user: Option<UserRecord>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct UserRecord {
    id: String,
    email: String,
    name: String,
    #[serde(default)]
    contacts: Vec<Contact>,
}

impl UserRecord {
    fn to_domain(self) -> Identity {
        Identity {
            user_id: self.id,
            name: self.name,
            contacts: self.contacts,
        }
    }
}

//=========================================================================================
// BackendGateway Trait Implementation
//=========================================================================================

#[async_trait]
impl BackendGateway for HttpGateway {
    async fn list_listings(
        &self,
        limit: usize,
        next_token: Option<&str>,
        category: Option<Category>,
    ) -> PortResult<ListingPage> {
        let mut url = self.endpoint(&["posts", "list"])?;
        {
            let mut query = url.query_pairs_mut();
            query.append_pair("limit", &limit.to_string());
            if let Some(token) = next_token {
                query.append_pair("nextToken", token);
            }
            if let Some(category) = category {
                query.append_pair("category", category.as_str());
            }
        }
        let response: ListResponse = decode(self.send(self.client.get(url)).await?).await?;
        Ok(ListingPage {
            listings: response.posts,
            next_token: response.next_token,
            available_filters: None,
        })
    }

    async fn search_listings(
        &self,
        query: &str,
        filters: &FilterSet,
        limit: usize,
        next_token: Option<&str>,
    ) -> PortResult<ListingPage> {
        let url = self.endpoint(&["posts", "search"])?;
        let body = SearchBody::new(query, filters, limit, next_token);
        let response: SearchResponse =
            decode(self.send(self.client.post(url).json(&body)).await?).await?;
        Ok(ListingPage {
            listings: response.posts,
            next_token: response.next_token,
            available_filters: response.filters.and_then(ApiFilters::into_available),
        })
    }

    async fn get_listing(&self, listing_id: &str) -> PortResult<Listing> {
        let url = self.endpoint(&["posts", listing_id])?;
        let envelope: PostEnvelope = decode(self.send(self.client.get(url)).await?).await?;
        Ok(envelope.post)
    }

    async fn create_listing(&self, fields: &NewListing) -> PortResult<Listing> {
        let url = self.endpoint(&["posts"])?;
        let envelope: PostEnvelope =
            decode(self.send(self.client.post(url).json(fields)).await?).await?;
        info!("Created listing {}", envelope.post.id);
        Ok(envelope.post)
    }

    async fn update_listing(&self, listing_id: &str, fields: &ListingUpdate) -> PortResult<()> {
        let url = self.endpoint(&["posts", listing_id])?;
        self.send(self.client.patch(url).json(fields)).await?;
        Ok(())
    }

    async fn delete_listing(&self, listing_id: &str) -> PortResult<()> {
        let url = self.endpoint(&["posts", listing_id])?;
        self.send(self.client.delete(url)).await?;
        Ok(())
    }

    async fn update_listing_status(
        &self,
        listing_id: &str,
        status: ListingStatus,
    ) -> PortResult<()> {
        let url = self.endpoint(&["posts", listing_id, "status"])?;
        self.send(self.client.patch(url).json(&json!({ "status": status })))
            .await?;
        Ok(())
    }

    async fn get_my_listings(&self) -> PortResult<Vec<Listing>> {
        let url = self.endpoint(&["posts", "my-posts"])?;
        let envelope: PostsEnvelope = decode(self.send(self.client.get(url)).await?).await?;
        Ok(envelope.posts)
    }

    async fn send_proposal(&self, listing_id: &str, cover_letter: &str) -> PortResult<Proposal> {
        let url = self.endpoint(&["proposals"])?;
        let body = json!({ "postId": listing_id, "coverLetter": cover_letter });
        let envelope: ProposalEnvelope =
            decode(self.send(self.client.post(url).json(&body)).await?).await?;
        Ok(envelope.proposal)
    }

    async fn get_proposals_for_listing(
        &self,
        listing_id: &str,
        status: Option<ProposalStatus>,
    ) -> PortResult<Vec<Proposal>> {
        let mut url = self.endpoint(&["proposals", "post", listing_id])?;
        if let Some(status) = status {
            url.query_pairs_mut().append_pair("status", status.as_str());
        }
        let envelope: ProposalsEnvelope = decode(self.send(self.client.get(url)).await?).await?;
        Ok(envelope.proposals)
    }

    async fn get_my_proposals(&self) -> PortResult<Vec<Proposal>> {
        let url = self.endpoint(&["proposals", "my-proposals"])?;
        let envelope: ProposalsEnvelope = decode(self.send(self.client.get(url)).await?).await?;
        Ok(envelope.proposals)
    }

    async fn update_proposal_status(
        &self,
        proposal_id: &str,
        listing_id: &str,
        status: ProposalStatus,
        contacts: Option<&[Contact]>,
    ) -> PortResult<()> {
        let url = self.endpoint(&["proposals", "status"])?;
        let body = json!({
            "proposalId": proposal_id,
            "postId": listing_id,
            "status": status,
            "contacts": contacts,
        });
        self.send(self.client.patch(url).json(&body)).await?;
        Ok(())
    }

    async fn get_proposal_details(&self, proposal_id: &str) -> PortResult<ProposalDetails> {
        let url = self.endpoint(&["proposals", proposal_id, "details"])?;
        decode(self.send(self.client.get(url)).await?).await
    }

    async fn send_message(&self, proposal_id: &str, text: &str) -> PortResult<Message> {
        let url = self.endpoint(&["chat", "message"])?;
        let body = json!({ "proposalId": proposal_id, "message": text });
        let envelope: SentMessageEnvelope =
            decode(self.send(self.client.post(url).json(&body)).await?).await?;
        Ok(envelope.data)
    }

    async fn get_messages(
        &self,
        proposal_id: &str,
        limit: usize,
        next_token: Option<&str>,
    ) -> PortResult<MessagePage> {
        let mut url = self.endpoint(&["chat", "messages", proposal_id])?;
        {
            let mut query = url.query_pairs_mut();
            query.append_pair("limit", &limit.to_string());
            if let Some(token) = next_token {
                query.append_pair("nextToken", token);
            }
        }
        let response: MessagesResponse = decode(self.send(self.client.get(url)).await?).await?;
        Ok(MessagePage {
            messages: response.messages,
            next_token: response.next_token,
        })
    }

    async fn get_discussion(&self, proposal_id: &str) -> PortResult<Discussion> {
        let url = self.endpoint(&["chat", "discussion", proposal_id])?;
        let envelope: DiscussionEnvelope = decode(self.send(self.client.get(url)).await?).await?;
        Ok(envelope.discussion)
    }
}
