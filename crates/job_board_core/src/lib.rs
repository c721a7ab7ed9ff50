pub mod cache;
pub mod config;
pub mod conversation;
pub mod domain;
pub mod error;
pub mod listing;
pub mod memory;
pub mod ports;
pub mod proposals;
pub mod query;
pub mod scroll;
pub mod view;

pub use config::ControllerSettings;
pub use conversation::{ConversationController, ConversationSnapshot};
pub use domain::{
    AvailableFilters, Budget, BudgetType, Category, Contact, Discussion, FilterSet, Identity,
    JobDuration, Listing, ListingPage, ListingStatus, ListingUpdate, Message, MessagePage,
    NewListing, Proposal, ProposalDetails, ProposalStatus,
};
pub use error::{ControllerError, ControllerResult};
pub use listing::{ListingController, ListingMode, ListingSnapshot};
pub use memory::{MemoryStore, SystemClock};
pub use ports::{BackendGateway, ClientStore, Clock, Navigator, PortError, PortResult};
pub use proposals::{ProposalController, ProposalSnapshot};
pub use query::ListingQuery;
pub use scroll::{ScrollMetrics, ScrollPin};
pub use view::ListingView;
