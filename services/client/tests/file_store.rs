use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use client_lib::adapters::FileStore;
use job_board_core::config::AUTH_TOKEN_KEY;
use job_board_core::{ClientStore, ControllerSettings, ListingController, SystemClock};

static NEXT: AtomicUsize = AtomicUsize::new(0);

/// A fresh path under the system temp dir, removed on drop.
struct TempPath(PathBuf);

impl TempPath {
    fn new() -> Self {
        let name = format!(
            "job-board-store-{}-{}.json",
            std::process::id(),
            NEXT.fetch_add(1, Ordering::SeqCst)
        );
        let path = std::env::temp_dir().join(name);
        let _ = std::fs::remove_file(&path);
        Self(path)
    }
}

impl Drop for TempPath {
    fn drop(&mut self) {
        let _ = std::fs::remove_file(&self.0);
    }
}

#[test]
fn values_survive_reopening() {
    let path = TempPath::new();
    {
        let store = FileStore::open(&path.0).unwrap();
        store.set(AUTH_TOKEN_KEY, "abc").unwrap();
        store.set("draft", "hy").unwrap();
        store.remove("draft").unwrap();
    }

    let reopened = FileStore::open(&path.0).unwrap();
    assert_eq!(reopened.get(AUTH_TOKEN_KEY).unwrap().as_deref(), Some("abc"));
    assert_eq!(reopened.get("draft").unwrap(), None);
    assert_eq!(reopened.path(), path.0.as_path());
}

#[test]
fn missing_file_starts_empty() {
    let path = TempPath::new();
    let store = FileStore::open(&path.0).unwrap();
    assert_eq!(store.get(AUTH_TOKEN_KEY).unwrap(), None);
    assert!(!path.0.exists());
}

#[test]
fn malformed_file_is_replaced_on_write() {
    let path = TempPath::new();
    std::fs::write(&path.0, "{ not json").unwrap();

    let store = FileStore::open(&path.0).unwrap();
    assert_eq!(store.get(AUTH_TOKEN_KEY).unwrap(), None);
    store.set(AUTH_TOKEN_KEY, "fresh").unwrap();

    let raw = std::fs::read_to_string(&path.0).unwrap();
    let parsed: serde_json::Value = serde_json::from_str(&raw).unwrap();
    assert_eq!(parsed[AUTH_TOKEN_KEY], "fresh");
}

#[tokio::test]
async fn corrupt_listing_cache_on_disk_is_ignored() {
    let path = TempPath::new();
    {
        let store = FileStore::open(&path.0).unwrap();
        store.set("posts-cache", "{\"posts\": 12}").unwrap();
    }
    let store = Arc::new(FileStore::open(&path.0).unwrap());

    let controller = ListingController::new(
        Arc::new(offline::Unreachable),
        store.clone(),
        Arc::new(SystemClock),
        ControllerSettings::default(),
    );

    assert!(controller.listings().await.is_empty());
    assert_eq!(store.get("posts-cache").unwrap(), None);
}

mod offline {
    use async_trait::async_trait;
    use job_board_core::ports::{BackendGateway, PortError, PortResult};
    use job_board_core::*;

    /// A gateway for tests that must never reach the network.
    pub struct Unreachable;

    fn down<T>() -> PortResult<T> {
        Err(PortError::Unexpected("offline".to_string()))
    }

    #[async_trait]
    impl BackendGateway for Unreachable {
        async fn list_listings(&self, _: usize, _: Option<&str>, _: Option<Category>) -> PortResult<ListingPage> {
            down()
        }
        async fn search_listings(&self, _: &str, _: &FilterSet, _: usize, _: Option<&str>) -> PortResult<ListingPage> {
            down()
        }
        async fn get_listing(&self, _: &str) -> PortResult<Listing> {
            down()
        }
        async fn create_listing(&self, _: &NewListing) -> PortResult<Listing> {
            down()
        }
        async fn update_listing(&self, _: &str, _: &ListingUpdate) -> PortResult<()> {
            down()
        }
        async fn delete_listing(&self, _: &str) -> PortResult<()> {
            down()
        }
        async fn update_listing_status(&self, _: &str, _: ListingStatus) -> PortResult<()> {
            down()
        }
        async fn get_my_listings(&self) -> PortResult<Vec<Listing>> {
            down()
        }
        async fn send_proposal(&self, _: &str, _: &str) -> PortResult<Proposal> {
            down()
        }
        async fn get_proposals_for_listing(&self, _: &str, _: Option<ProposalStatus>) -> PortResult<Vec<Proposal>> {
            down()
        }
        async fn get_my_proposals(&self) -> PortResult<Vec<Proposal>> {
            down()
        }
        async fn update_proposal_status(&self, _: &str, _: &str, _: ProposalStatus, _: Option<&[Contact]>) -> PortResult<()> {
            down()
        }
        async fn get_proposal_details(&self, _: &str) -> PortResult<ProposalDetails> {
            down()
        }
        async fn send_message(&self, _: &str, _: &str) -> PortResult<Message> {
            down()
        }
        async fn get_messages(&self, _: &str, _: usize, _: Option<&str>) -> PortResult<MessagePage> {
            down()
        }
        async fn get_discussion(&self, _: &str) -> PortResult<Discussion> {
            down()
        }
    }
}
