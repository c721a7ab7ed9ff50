#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{DateTime, Duration as ChronoDuration, TimeZone, Utc};
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use tokio::sync::Notify;

use job_board_core::domain::MessageAuthor;
use job_board_core::ports::{BackendGateway, Clock, Navigator, PortError, PortResult};
use job_board_core::{
    Category, Contact, Discussion, FilterSet, JobDuration, Listing, ListingPage, ListingStatus,
    ListingUpdate, Message, MessagePage, NewListing, Proposal, ProposalDetails, ProposalStatus,
};

//=========================================================================================
// Fixtures
//=========================================================================================

pub fn epoch() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap()
}

pub fn listing(id: &str, category: Category) -> Listing {
    Listing {
        id: id.to_string(),
        user_id: "owner-1".to_string(),
        title: format!("Job {}", id),
        description: "Some work".to_string(),
        tags: vec!["rust".to_string()],
        status: vec![ListingStatus::Published],
        duration: JobDuration::LessThanMonth,
        category,
        created_at: epoch(),
        publication_date: None,
        region: Some("Yerevan".to_string()),
        budget: None,
    }
}

pub fn listings(prefix: &str, count: usize, category: Category) -> Vec<Listing> {
    (0..count)
        .map(|i| listing(&format!("{}-{}", prefix, i), category))
        .collect()
}

pub fn page(listings: Vec<Listing>, next_token: Option<&str>) -> ListingPage {
    ListingPage {
        listings,
        next_token: next_token.map(str::to_string),
        available_filters: None,
    }
}

pub fn message(id: &str, proposal_id: &str, body: &str) -> Message {
    Message {
        proposal_id: proposal_id.to_string(),
        message_id: id.to_string(),
        user: MessageAuthor {
            id: "user-1".to_string(),
            email: "ann@example.com".to_string(),
            name: "Ann".to_string(),
        },
        date: epoch(),
        body: body.to_string(),
    }
}

pub fn history(proposal_id: &str, count: usize) -> Vec<Message> {
    (0..count)
        .map(|i| message(&format!("m{}", i), proposal_id, &format!("hello {}", i)))
        .collect()
}

//=========================================================================================
// FakeGateway
//=========================================================================================

/// A scripted backend. Queued responses are served first; once a queue is
/// empty the fake falls back to its in-memory server state.
#[derive(Default)]
pub struct FakeGateway {
    pub list_pages: Mutex<VecDeque<PortResult<ListingPage>>>,
    pub search_pages: Mutex<VecDeque<PortResult<ListingPage>>>,
    pub message_pages: Mutex<VecDeque<PortResult<MessagePage>>>,
    pub server_messages: Mutex<HashMap<String, Vec<Message>>>,
    pub my_listings: Mutex<Vec<Listing>>,
    pub proposals: Mutex<Vec<Proposal>>,
    pub fail_sends: Mutex<bool>,
    pub fail_mutations: Mutex<bool>,
    /// When set, listing and search calls wait for a notification first.
    pub listing_gate: Mutex<Option<Arc<Notify>>>,
    /// When set, message fetches wait for a notification first.
    pub message_gate: Mutex<Option<Arc<Notify>>>,
    pub calls: Mutex<Vec<String>>,
    pub shared_contacts: Mutex<Option<Vec<Contact>>>,
    sent: Mutex<usize>,
}

impl FakeGateway {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn queue_list(&self, result: PortResult<ListingPage>) {
        self.list_pages.lock().unwrap().push_back(result);
    }

    pub fn queue_search(&self, result: PortResult<ListingPage>) {
        self.search_pages.lock().unwrap().push_back(result);
    }

    pub fn queue_messages(&self, result: PortResult<MessagePage>) {
        self.message_pages.lock().unwrap().push_back(result);
    }

    pub fn set_server_messages(&self, proposal_id: &str, messages: Vec<Message>) {
        self.server_messages
            .lock()
            .unwrap()
            .insert(proposal_id.to_string(), messages);
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self, prefix: &str) -> usize {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|c| c.starts_with(prefix))
            .count()
    }

    pub fn clear_calls(&self) {
        self.calls.lock().unwrap().clear();
    }

    pub fn hold_listings(&self) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        *self.listing_gate.lock().unwrap() = Some(gate.clone());
        gate
    }

    pub fn hold_messages(&self) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        *self.message_gate.lock().unwrap() = Some(gate.clone());
        gate
    }

    fn record(&self, call: String) {
        self.calls.lock().unwrap().push(call);
    }

    fn mutation(&self) -> PortResult<()> {
        if *self.fail_mutations.lock().unwrap() {
            Err(PortError::Validation("rejected".to_string()))
        } else {
            Ok(())
        }
    }
}

async fn pass(gate: &Mutex<Option<Arc<Notify>>>) {
    let gate = gate.lock().unwrap().clone();
    if let Some(gate) = gate {
        gate.notified().await;
    }
}

#[async_trait]
impl BackendGateway for FakeGateway {
    async fn list_listings(
        &self,
        limit: usize,
        next_token: Option<&str>,
        category: Option<Category>,
    ) -> PortResult<ListingPage> {
        self.record(format!(
            "list_listings limit={} token={:?} category={:?}",
            limit, next_token, category
        ));
        let next = self.list_pages.lock().unwrap().pop_front();
        pass(&self.listing_gate).await;
        next.unwrap_or_else(|| Ok(ListingPage::default()))
    }

    async fn search_listings(
        &self,
        query: &str,
        filters: &FilterSet,
        limit: usize,
        next_token: Option<&str>,
    ) -> PortResult<ListingPage> {
        self.record(format!(
            "search_listings query={} filters={:?} limit={} token={:?}",
            query, filters, limit, next_token
        ));
        let next = self.search_pages.lock().unwrap().pop_front();
        pass(&self.listing_gate).await;
        next.unwrap_or_else(|| Ok(ListingPage::default()))
    }

    async fn get_listing(&self, listing_id: &str) -> PortResult<Listing> {
        self.record(format!("get_listing {}", listing_id));
        self.my_listings
            .lock()
            .unwrap()
            .iter()
            .find(|l| l.id == listing_id)
            .cloned()
            .ok_or_else(|| PortError::NotFound(listing_id.to_string()))
    }

    async fn create_listing(&self, fields: &NewListing) -> PortResult<Listing> {
        self.record(format!("create_listing {}", fields.title));
        self.mutation()?;
        let mut created = listing("new-1", fields.category);
        created.title = fields.title.clone();
        self.my_listings.lock().unwrap().insert(0, created.clone());
        Ok(created)
    }

    async fn update_listing(&self, listing_id: &str, _fields: &ListingUpdate) -> PortResult<()> {
        self.record(format!("update_listing {}", listing_id));
        self.mutation()
    }

    async fn delete_listing(&self, listing_id: &str) -> PortResult<()> {
        self.record(format!("delete_listing {}", listing_id));
        self.mutation()
    }

    async fn update_listing_status(
        &self,
        listing_id: &str,
        status: ListingStatus,
    ) -> PortResult<()> {
        self.record(format!("update_listing_status {} {}", listing_id, status));
        self.mutation()
    }

    async fn get_my_listings(&self) -> PortResult<Vec<Listing>> {
        self.record("get_my_listings".to_string());
        Ok(self.my_listings.lock().unwrap().clone())
    }

    async fn send_proposal(&self, listing_id: &str, cover_letter: &str) -> PortResult<Proposal> {
        self.record(format!("send_proposal {}", listing_id));
        let proposal = proposal("prop-new", listing_id, ProposalStatus::Pending, cover_letter);
        self.proposals.lock().unwrap().push(proposal.clone());
        Ok(proposal)
    }

    async fn get_proposals_for_listing(
        &self,
        listing_id: &str,
        status: Option<ProposalStatus>,
    ) -> PortResult<Vec<Proposal>> {
        self.record(format!("get_proposals_for_listing {} {:?}", listing_id, status));
        Ok(self
            .proposals
            .lock()
            .unwrap()
            .iter()
            .filter(|p| p.listing_id == listing_id)
            .filter(|p| status.map_or(true, |s| p.status == s))
            .cloned()
            .collect())
    }

    async fn get_my_proposals(&self) -> PortResult<Vec<Proposal>> {
        self.record("get_my_proposals".to_string());
        Ok(self.proposals.lock().unwrap().clone())
    }

    async fn update_proposal_status(
        &self,
        proposal_id: &str,
        _listing_id: &str,
        status: ProposalStatus,
        contacts: Option<&[Contact]>,
    ) -> PortResult<()> {
        self.record(format!("update_proposal_status {} {}", proposal_id, status));
        self.mutation()?;
        *self.shared_contacts.lock().unwrap() = contacts.map(<[Contact]>::to_vec);
        for p in self.proposals.lock().unwrap().iter_mut() {
            if p.proposal_id == proposal_id {
                p.status = status;
            }
        }
        Ok(())
    }

    async fn get_proposal_details(&self, proposal_id: &str) -> PortResult<ProposalDetails> {
        self.record(format!("get_proposal_details {}", proposal_id));
        let proposal = self
            .proposals
            .lock()
            .unwrap()
            .iter()
            .find(|p| p.proposal_id == proposal_id)
            .cloned()
            .ok_or_else(|| PortError::NotFound(proposal_id.to_string()))?;
        Ok(ProposalDetails {
            discussion: Some(discussion(proposal_id, &proposal.listing_id)),
            listing: Some(listing(&proposal.listing_id, Category::It)),
            proposal,
        })
    }

    async fn send_message(&self, proposal_id: &str, text: &str) -> PortResult<Message> {
        self.record(format!("send_message {} {}", proposal_id, text));
        if *self.fail_sends.lock().unwrap() {
            return Err(PortError::Unexpected("connection reset".to_string()));
        }
        let mut sent = self.sent.lock().unwrap();
        *sent += 1;
        Ok(message(&format!("sent-{}", *sent), proposal_id, text))
    }

    async fn get_messages(
        &self,
        proposal_id: &str,
        limit: usize,
        next_token: Option<&str>,
    ) -> PortResult<MessagePage> {
        self.record(format!(
            "get_messages {} limit={} token={:?}",
            proposal_id, limit, next_token
        ));
        let scripted = self.message_pages.lock().unwrap().pop_front();
        let result = scripted.unwrap_or_else(|| {
            let messages = self
                .server_messages
                .lock()
                .unwrap()
                .get(proposal_id)
                .cloned()
                .unwrap_or_default();
            Ok(MessagePage {
                messages,
                next_token: None,
            })
        });
        pass(&self.message_gate).await;
        result
    }

    async fn get_discussion(&self, proposal_id: &str) -> PortResult<Discussion> {
        self.record(format!("get_discussion {}", proposal_id));
        Ok(discussion(proposal_id, "post-1"))
    }
}

pub fn proposal(id: &str, listing_id: &str, status: ProposalStatus, cover_letter: &str) -> Proposal {
    use job_board_core::domain::{PartyRole, ProposalParty};
    Proposal {
        proposal_id: id.to_string(),
        user_id: "freelancer-1".to_string(),
        listing_id: listing_id.to_string(),
        user: ProposalParty {
            id: "freelancer-1".to_string(),
            email: "free@example.com".to_string(),
            name: "Free".to_string(),
            role: PartyRole::Sender,
        },
        date: epoch(),
        cover_letter: cover_letter.to_string(),
        status,
    }
}

pub fn discussion(proposal_id: &str, listing_id: &str) -> Discussion {
    Discussion {
        proposal_id: proposal_id.to_string(),
        user_id: "owner-1".to_string(),
        listing_id: listing_id.to_string(),
        date: epoch(),
        shown_contacts: Vec::new(),
    }
}

//=========================================================================================
// Clock and navigator doubles
//=========================================================================================

pub struct ManualClock {
    now: Mutex<DateTime<Utc>>,
}

impl ManualClock {
    pub fn new(start: DateTime<Utc>) -> Arc<Self> {
        Arc::new(Self {
            now: Mutex::new(start),
        })
    }

    pub fn advance(&self, by: ChronoDuration) {
        let mut now = self.now.lock().unwrap();
        *now = *now + by;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock().unwrap()
    }
}

#[derive(Default)]
pub struct RecordingNavigator {
    pub replaced: Mutex<Vec<Vec<(String, String)>>>,
}

impl RecordingNavigator {
    pub fn last(&self) -> Option<Vec<(String, String)>> {
        self.replaced.lock().unwrap().last().cloned()
    }
}

impl Navigator for RecordingNavigator {
    fn replace_query(&self, params: &[(String, String)]) {
        self.replaced.lock().unwrap().push(params.to_vec());
    }
}
