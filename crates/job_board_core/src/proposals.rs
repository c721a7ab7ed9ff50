//! crates/job_board_core/src/proposals.rs
//!
//! Proposal lists for a listing owner and for the applicant.

use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{error, info};

use crate::domain::{Identity, Proposal, ProposalDetails, ProposalStatus};
use crate::error::ControllerResult;
use crate::ports::BackendGateway;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProposalSnapshot {
    /// Proposals received for the listing last loaded.
    pub proposals: Vec<Proposal>,
    /// Proposals the current user has sent.
    pub my_proposals: Vec<Proposal>,
    pub is_loading: bool,
    pub error: Option<String>,
}

pub struct ProposalController {
    gateway: Arc<dyn BackendGateway>,
    identity: Arc<Identity>,
    state: Mutex<ProposalSnapshot>,
}

impl ProposalController {
    pub fn new(gateway: Arc<dyn BackendGateway>, identity: Arc<Identity>) -> Self {
        Self {
            gateway,
            identity,
            state: Mutex::new(ProposalSnapshot::default()),
        }
    }

    pub async fn snapshot(&self) -> ProposalSnapshot {
        self.state.lock().await.clone()
    }

    pub async fn load_proposals_for_post(
        &self,
        listing_id: &str,
        status: Option<ProposalStatus>,
    ) -> ControllerResult<Vec<Proposal>> {
        self.begin().await;
        let result = self
            .gateway
            .get_proposals_for_listing(listing_id, status)
            .await;

        let mut state = self.state.lock().await;
        state.is_loading = false;
        match result {
            Ok(proposals) => {
                state.proposals = proposals;
                Ok(state.proposals.clone())
            }
            Err(e) => {
                error!("Failed to load proposals for {}: {:?}", listing_id, e);
                state.proposals.clear();
                state.error = Some("Failed to load proposals".to_string());
                Err(e.into())
            }
        }
    }

    pub async fn load_my_proposals(&self) -> ControllerResult<Vec<Proposal>> {
        self.begin().await;
        let result = self.gateway.get_my_proposals().await;

        let mut state = self.state.lock().await;
        state.is_loading = false;
        match result {
            Ok(proposals) => {
                state.my_proposals = proposals;
                Ok(state.my_proposals.clone())
            }
            Err(e) => {
                error!("Failed to load my proposals: {:?}", e);
                state.my_proposals.clear();
                state.error = Some("Failed to load my proposals".to_string());
                Err(e.into())
            }
        }
    }

    pub async fn send_proposal(&self, listing_id: &str, cover_letter: &str) -> ControllerResult<Proposal> {
        let proposal = self.gateway.send_proposal(listing_id, cover_letter).await?;
        info!("Sent proposal {} for listing {}", proposal.proposal_id, listing_id);
        Ok(proposal)
    }

    /// Decides on a proposal, sharing the current user's contacts, then
    /// reloads the proposals of that listing.
    pub async fn update_proposal_status(
        &self,
        proposal: &Proposal,
        status: ProposalStatus,
    ) -> ControllerResult<Vec<Proposal>> {
        self.gateway
            .update_proposal_status(
                &proposal.proposal_id,
                &proposal.listing_id,
                status,
                Some(&self.identity.contacts),
            )
            .await?;
        info!("Proposal {} is now {}", proposal.proposal_id, status);
        self.load_proposals_for_post(&proposal.listing_id, None).await
    }

    pub async fn get_proposal_details(&self, proposal_id: &str) -> ControllerResult<ProposalDetails> {
        Ok(self.gateway.get_proposal_details(proposal_id).await?)
    }

    async fn begin(&self) {
        let mut state = self.state.lock().await;
        state.is_loading = true;
        state.error = None;
    }
}
