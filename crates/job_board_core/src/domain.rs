//! crates/job_board_core/src/domain.rs
//!
//! Defines the core data structures of the job board client.
//! Records are owned by the backend; the client only holds read-only copies,
//! so every type here derives the serde impls used on the wire and in the
//! persisted listing cache.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

//=========================================================================================
// Enumerations
//=========================================================================================

/// The top-level category a listing is filed under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Category {
    #[serde(rename = "IT")]
    It,
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BudgetType {
    Hourly,
    Fixed,
    Monthly,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Currency {
    Rubl,
    Dollar,
    Dram,
}

/// The expected duration bucket of a job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobDuration {
    LessThanMonth,
    #[serde(rename = "less_than_3_months")]
    LessThan3Months,
    #[serde(rename = "more_than_3_months")]
    MoreThan3Months,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ListingStatus {
    Published,
    Disabled,
    Outdated,
    Blocked,
}

/// Lifecycle of a proposal. `Pending` is the canonical not-yet-decided state;
/// older backends report it as `invited`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProposalStatus {
    #[serde(alias = "invited")]
    Pending,
    Accepted,
    Discussion,
    Rejected,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContactType {
    Phone,
    Whatsapp,
    Viber,
    Web,
    Email,
}

/// Error returned when a wire string does not name a known enum value.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown {kind} value: '{value}'")]
pub struct UnknownValue {
    pub kind: &'static str,
    pub value: String,
}

macro_rules! wire_names {
    ($ty:ident, $kind:literal, { $($variant:ident => $name:literal),+ $(,)? }) => {
        impl $ty {
            /// The name used for this value on the wire and in URLs.
            pub fn as_str(&self) -> &'static str {
                match self {
                    $($ty::$variant => $name,)+
                }
            }
        }

        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.pad(self.as_str())
            }
        }

        impl FromStr for $ty {
            type Err = UnknownValue;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($name => Ok($ty::$variant),)+
                    _ => Err(UnknownValue { kind: $kind, value: s.to_string() }),
                }
            }
        }
    };
}

wire_names!(Category, "category", { It => "IT", Other => "Other" });
wire_names!(BudgetType, "budget type", { Hourly => "hourly", Fixed => "fixed", Monthly => "monthly" });
wire_names!(JobDuration, "duration", {
    LessThanMonth => "less_than_month",
    LessThan3Months => "less_than_3_months",
    MoreThan3Months => "more_than_3_months",
});
wire_names!(ListingStatus, "listing status", {
    Published => "published",
    Disabled => "disabled",
    Outdated => "outdated",
    Blocked => "blocked",
});
wire_names!(ProposalStatus, "proposal status", {
    Pending => "pending",
    Accepted => "accepted",
    Discussion => "discussion",
    Rejected => "rejected",
});

//=========================================================================================
// Listings
//=========================================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Budget {
    #[serde(rename = "type")]
    pub budget_type: BudgetType,
    pub value: f64,
    pub currency: Currency,
}

/// A job post as returned by the backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Listing {
    #[serde(rename = "postId")]
    pub id: String,
    pub user_id: String,
    pub title: String,
    pub description: String,
    #[serde(default, rename = "skills")]
    pub tags: Vec<String>,
    #[serde(default)]
    pub status: Vec<ListingStatus>,
    pub duration: JobDuration,
    pub category: Category,
    #[serde(rename = "date")]
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub publication_date: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub budget: Option<Budget>,
}

/// Fields supplied when creating a new listing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewListing {
    pub title: String,
    pub description: String,
    #[serde(rename = "skills")]
    pub tags: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub budget: Option<Budget>,
    pub duration: JobDuration,
    pub category: Category,
}

/// A partial edit of an existing listing. `None` leaves a field untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ListingUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(rename = "skills", skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub budget: Option<Budget>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration: Option<JobDuration>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<Category>,
}

impl Listing {
    /// Applies a partial edit to the local copy.
    pub fn apply_update(&mut self, update: &ListingUpdate) {
        if let Some(title) = &update.title {
            self.title = title.clone();
        }
        if let Some(description) = &update.description {
            self.description = description.clone();
        }
        if let Some(tags) = &update.tags {
            self.tags = tags.clone();
        }
        if let Some(region) = &update.region {
            self.region = Some(region.clone());
        }
        if let Some(budget) = &update.budget {
            self.budget = Some(budget.clone());
        }
        if let Some(duration) = update.duration {
            self.duration = duration;
        }
        if let Some(category) = update.category {
            self.category = category;
        }
    }
}

/// The user's search refinements. Every field is optional; an all-`None`
/// set means "no filtering".
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterSet {
    pub region: Option<String>,
    pub duration: Option<JobDuration>,
    pub category: Option<Category>,
    pub budget_type: Option<BudgetType>,
    pub min_budget: Option<f64>,
    pub max_budget: Option<f64>,
}

impl FilterSet {
    pub fn is_empty(&self) -> bool {
        *self == FilterSet::default()
    }
}

/// Facet values the backend observed across a whole search result set.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AvailableFilters {
    #[serde(default)]
    pub regions: Vec<String>,
    #[serde(default)]
    pub budget_types: Vec<BudgetType>,
    #[serde(default)]
    pub min_budget: Option<f64>,
    #[serde(default)]
    pub max_budget: Option<f64>,
    #[serde(default)]
    pub durations: Vec<JobDuration>,
    #[serde(default)]
    pub categories: Vec<Category>,
}

impl AvailableFilters {
    pub fn is_empty(&self) -> bool {
        *self == AvailableFilters::default()
    }
}

/// One fetched batch of listings.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ListingPage {
    pub listings: Vec<Listing>,
    /// Present only when more data exists.
    pub next_token: Option<String>,
    /// Only populated for search results.
    pub available_filters: Option<AvailableFilters>,
}

//=========================================================================================
// Proposals, discussions and messages
//=========================================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Contact {
    #[serde(rename = "type")]
    pub contact_type: ContactType,
    pub value: String,
    pub show: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PartyRole {
    Sender,
    PostOwner,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProposalParty {
    pub id: String,
    pub email: String,
    pub name: String,
    #[serde(rename = "type")]
    pub role: PartyRole,
}

/// A freelancer's application to a listing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Proposal {
    pub proposal_id: String,
    pub user_id: String,
    #[serde(rename = "postId")]
    pub listing_id: String,
    pub user: ProposalParty,
    pub date: DateTime<Utc>,
    pub cover_letter: String,
    pub status: ProposalStatus,
}

/// The thread unlocked once a proposal is accepted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Discussion {
    pub proposal_id: String,
    pub user_id: String,
    #[serde(rename = "postId")]
    pub listing_id: String,
    pub date: DateTime<Utc>,
    #[serde(default)]
    pub shown_contacts: Vec<Contact>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProposalDetails {
    pub proposal: Proposal,
    #[serde(default)]
    pub discussion: Option<Discussion>,
    #[serde(default, rename = "post")]
    pub listing: Option<Listing>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MessageAuthor {
    pub id: String,
    pub email: String,
    pub name: String,
}

/// A single chat message. Order is server-assigned.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    pub proposal_id: String,
    pub message_id: String,
    pub user: MessageAuthor,
    pub date: DateTime<Utc>,
    #[serde(rename = "message")]
    pub body: String,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct MessagePage {
    pub messages: Vec<Message>,
    pub next_token: Option<String>,
}

//=========================================================================================
// Session identity
//=========================================================================================

/// The signed-in user, injected into the controllers that need it.
#[derive(Debug, Clone, PartialEq)]
pub struct Identity {
    pub user_id: String,
    pub name: String,
    pub contacts: Vec<Contact>,
}
