//! crates/job_board_core/src/conversation.rs
//!
//! The conversation controller keeps the message history of one open
//! conversation fresh. While a conversation is active, a background task
//! re-fetches the latest page on a fixed interval; the task is owned by the
//! controller and torn down by `stop_polling` (or on drop).

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{watch, Mutex};
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::config::ControllerSettings;
use crate::domain::{Discussion, Listing, Message, Proposal};
use crate::error::{ControllerError, ControllerResult};
use crate::ports::BackendGateway;

//=========================================================================================
// State
//=========================================================================================

#[derive(Debug, Default)]
struct ConversationState {
    messages: Vec<Message>,
    /// Messages sent from this client that the server history has not yet confirmed.
    unconfirmed: Vec<Message>,
    next_token: Option<String>,
    discussion: Option<Discussion>,
    proposal: Option<Proposal>,
    listing: Option<Listing>,
    is_loading: bool,
    error: Option<String>,
}

impl ConversationState {
    /// Replaces the history with the server's latest page, keeping any locally
    /// sent message the server has not reported yet.
    fn merge_history(&mut self, server: Vec<Message>) {
        self.unconfirmed
            .retain(|sent| !server.iter().any(|m| m.message_id == sent.message_id));
        self.messages = server;
        self.messages.extend(self.unconfirmed.iter().cloned());
    }

    /// Folds a refreshed latest page into the history. Messages already shown,
    /// including older pages loaded by paging, stay where they are; only ids
    /// not seen before are appended.
    fn merge_latest(&mut self, server: Vec<Message>) {
        self.unconfirmed
            .retain(|sent| !server.iter().any(|m| m.message_id == sent.message_id));
        self.append_unseen(server);
    }

    fn append_unseen(&mut self, batch: Vec<Message>) {
        for message in batch {
            if !self.messages.iter().any(|m| m.message_id == message.message_id) {
                self.messages.push(message);
            }
        }
    }

    fn snapshot(&self, proposal_id: Option<String>) -> ConversationSnapshot {
        ConversationSnapshot {
            proposal_id,
            messages: self.messages.clone(),
            has_more: self.next_token.is_some(),
            is_loading: self.is_loading,
            error: self.error.clone(),
            discussion: self.discussion.clone(),
            proposal: self.proposal.clone(),
            listing: self.listing.clone(),
        }
    }
}

/// What the conversation view renders. Published on every change.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConversationSnapshot {
    pub proposal_id: Option<String>,
    pub messages: Vec<Message>,
    pub has_more: bool,
    pub is_loading: bool,
    pub error: Option<String>,
    pub discussion: Option<Discussion>,
    pub proposal: Option<Proposal>,
    pub listing: Option<Listing>,
}

/// Handle to the running refresh task.
struct Poller {
    proposal_id: String,
    token: CancellationToken,
    handle: JoinHandle<()>,
}

impl Poller {
    fn stop(self) {
        self.token.cancel();
        self.handle.abort();
    }
}

//=========================================================================================
// ConversationController
//=========================================================================================

pub struct ConversationController {
    gateway: Arc<dyn BackendGateway>,
    settings: ControllerSettings,
    state: Arc<Mutex<ConversationState>>,
    /// The proposal id of the open conversation, if any. Responses that
    /// arrive for any other id are dropped.
    session: Arc<watch::Sender<Option<String>>>,
    updates: Arc<watch::Sender<ConversationSnapshot>>,
    poller: Option<Poller>,
}

impl ConversationController {
    pub fn new(gateway: Arc<dyn BackendGateway>, settings: ControllerSettings) -> Self {
        let (updates, _) = watch::channel(ConversationSnapshot::default());
        let (session, _) = watch::channel(None);
        Self {
            gateway,
            settings,
            state: Arc::new(Mutex::new(ConversationState::default())),
            session: Arc::new(session),
            updates: Arc::new(updates),
            poller: None,
        }
    }

    /// Subscribes to snapshots; a new value is published whenever state changes.
    pub fn subscribe(&self) -> watch::Receiver<ConversationSnapshot> {
        self.updates.subscribe()
    }

    pub async fn snapshot(&self) -> ConversationSnapshot {
        let state = self.state.lock().await;
        state.snapshot(self.open_conversation())
    }

    /// The proposal id of the open conversation, if any.
    pub fn open_conversation(&self) -> Option<String> {
        self.session.borrow().clone()
    }

    fn is_open(&self, proposal_id: &str) -> bool {
        is_open(&self.session, proposal_id)
    }

    pub async fn messages(&self) -> Vec<Message> {
        self.state.lock().await.messages.clone()
    }

    pub async fn has_more(&self) -> bool {
        self.state.lock().await.next_token.is_some()
    }

    /// The proposal id of the conversation being polled, if any.
    pub fn polling(&self) -> Option<&str> {
        self.poller.as_ref().map(|p| p.proposal_id.as_str())
    }

    fn publish(&self, state: &ConversationState) {
        self.updates.send_replace(state.snapshot(self.open_conversation()));
    }

    /// Opens (or pages through) the conversation for `proposal_id`.
    ///
    /// Without `load_more` the latest page replaces the history; with it the
    /// next page is appended. Either way the refresh loop is armed for this
    /// conversation, replacing any loop running for another one.
    pub async fn load_messages(
        &mut self,
        proposal_id: &str,
        load_more: bool,
    ) -> ControllerResult<Vec<Message>> {
        let token = {
            let mut state = self.state.lock().await;
            let token = if load_more {
                if !self.is_open(proposal_id) {
                    return Err(ControllerError::StaleContinuation);
                }
                Some(
                    state
                        .next_token
                        .clone()
                        .ok_or(ControllerError::StaleContinuation)?,
                )
            } else {
                if !self.is_open(proposal_id) {
                    *state = ConversationState::default();
                    self.session.send_replace(Some(proposal_id.to_string()));
                }
                None
            };
            state.is_loading = true;
            state.error = None;
            self.publish(&state);
            token
        };

        self.ensure_polling(proposal_id);

        let result = self
            .gateway
            .get_messages(proposal_id, self.settings.message_page_size, token.as_deref())
            .await;

        let mut state = self.state.lock().await;
        if !self.is_open(proposal_id) {
            debug!("Dropping messages for {}: conversation no longer open", proposal_id);
            return Ok(state.messages.clone());
        }
        state.is_loading = false;

        match result {
            Ok(page) => {
                if load_more {
                    state.append_unseen(page.messages);
                } else {
                    state.merge_history(page.messages);
                }
                state.next_token = page.next_token;
                self.publish(&state);
                Ok(state.messages.clone())
            }
            Err(e) => {
                error!("Failed to load messages for {}: {:?}", proposal_id, e);
                state.error = Some("Failed to load messages".to_string());
                self.publish(&state);
                Err(e.into())
            }
        }
    }

    /// Sends a message right away. On success it is appended locally so the
    /// sender sees it before the next refresh; on failure nothing changes.
    pub async fn send_message(&self, proposal_id: &str, text: &str) -> ControllerResult<Message> {
        let message = self.gateway.send_message(proposal_id, text).await?;

        let mut state = self.state.lock().await;
        if self.is_open(proposal_id)
            && !state.messages.iter().any(|m| m.message_id == message.message_id)
        {
            state.messages.push(message.clone());
            state.unconfirmed.push(message.clone());
            self.publish(&state);
        }
        Ok(message)
    }

    pub async fn load_discussion(&self, proposal_id: &str) -> ControllerResult<Discussion> {
        match self.gateway.get_discussion(proposal_id).await {
            Ok(discussion) => {
                let mut state = self.state.lock().await;
                state.discussion = Some(discussion.clone());
                self.publish(&state);
                Ok(discussion)
            }
            Err(e) => {
                error!("Failed to load discussion for {}: {:?}", proposal_id, e);
                let mut state = self.state.lock().await;
                state.error = Some("Failed to load discussion".to_string());
                self.publish(&state);
                Err(e.into())
            }
        }
    }

    pub async fn load_proposal_details(&self, proposal_id: &str) -> ControllerResult<()> {
        match self.gateway.get_proposal_details(proposal_id).await {
            Ok(details) => {
                let mut state = self.state.lock().await;
                state.proposal = Some(details.proposal);
                state.listing = details.listing;
                if details.discussion.is_some() {
                    state.discussion = details.discussion;
                }
                self.publish(&state);
                Ok(())
            }
            Err(e) => {
                error!("Failed to load proposal details for {}: {:?}", proposal_id, e);
                let mut state = self.state.lock().await;
                state.error = Some("Failed to load proposal details".to_string());
                self.publish(&state);
                Err(e.into())
            }
        }
    }

    /// Tears down the refresh loop and closes the conversation.
    /// Must be called when the conversation view goes away.
    pub fn stop_polling(&mut self) {
        if let Some(poller) = self.poller.take() {
            info!("Stopped polling conversation {}", poller.proposal_id);
            poller.stop();
        }
        // Responses still in flight compare against the session and get dropped.
        self.session.send_replace(None);
        self.updates.send_modify(|snapshot| snapshot.proposal_id = None);
    }

    fn ensure_polling(&mut self, proposal_id: &str) {
        if self.polling() == Some(proposal_id) {
            return;
        }
        if let Some(previous) = self.poller.take() {
            debug!("Switching polling from {} to {}", previous.proposal_id, proposal_id);
            previous.stop();
        }

        let token = CancellationToken::new();
        let handle = tokio::spawn(refresh_loop(
            self.gateway.clone(),
            self.state.clone(),
            self.session.clone(),
            self.updates.clone(),
            proposal_id.to_string(),
            self.settings.polling_interval,
            self.settings.message_page_size,
            token.clone(),
        ));
        info!("Polling conversation {} every {:?}", proposal_id, self.settings.polling_interval);
        self.poller = Some(Poller {
            proposal_id: proposal_id.to_string(),
            token,
            handle,
        });
    }
}

impl Drop for ConversationController {
    fn drop(&mut self) {
        if let Some(poller) = self.poller.take() {
            poller.stop();
        }
    }
}

fn is_open(session: &watch::Sender<Option<String>>, proposal_id: &str) -> bool {
    session.borrow().as_deref() == Some(proposal_id)
}

/// Background refresh: fetch the latest page every `period` until cancelled.
/// Failures are logged and otherwise ignored; the next tick is the retry.
async fn refresh_loop(
    gateway: Arc<dyn BackendGateway>,
    state: Arc<Mutex<ConversationState>>,
    session: Arc<watch::Sender<Option<String>>>,
    updates: Arc<watch::Sender<ConversationSnapshot>>,
    proposal_id: String,
    period: Duration,
    page_size: usize,
    token: CancellationToken,
) {
    let mut ticker = interval_at(Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = token.cancelled() => break,
            _ = ticker.tick() => {}
        }

        let result = tokio::select! {
            _ = token.cancelled() => break,
            result = gateway.get_messages(&proposal_id, page_size, None) => result,
        };

        match result {
            Ok(page) => {
                let mut state = state.lock().await;
                if token.is_cancelled() || !is_open(&session, &proposal_id) {
                    break;
                }
                let before = state.messages.len();
                state.merge_latest(page.messages);
                if state.messages.len() != before {
                    debug!(
                        "Refreshed {}: {} -> {} messages",
                        proposal_id,
                        before,
                        state.messages.len()
                    );
                }
                updates.send_replace(state.snapshot(Some(proposal_id.clone())));
            }
            Err(e) => {
                warn!("Background refresh of {} failed: {}", proposal_id, e);
            }
        }
    }
    debug!("Refresh loop for {} exited", proposal_id);
}
