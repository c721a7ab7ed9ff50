//! services/client/src/bin/job_board.rs

use clap::{Parser, Subcommand};
use client_lib::{
    adapters::{FileStore, HttpGateway, LogNavigator},
    config::Config,
    error::ClientError,
};
use job_board_core::{
    BudgetType, Category, ConversationController, FilterSet, Identity, JobDuration, Listing,
    ListingController, ListingView, Message, Proposal, ProposalController, ProposalStatus,
    SystemClock,
};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "job-board")]
#[command(about = "Browse job posts, send proposals and chat from the terminal")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Browse the newest posts
    Browse {
        /// Only posts in this category (IT, Other)
        #[arg(short, long)]
        category: Option<Category>,

        /// Number of pages to fetch
        #[arg(short, long, default_value = "1")]
        pages: usize,
    },

    /// Search posts
    Search {
        query: String,

        #[arg(long)]
        region: Option<String>,

        /// hourly, fixed or monthly
        #[arg(long)]
        budget_type: Option<BudgetType>,

        #[arg(long)]
        min_budget: Option<f64>,

        #[arg(long)]
        max_budget: Option<f64>,

        /// less_than_month, less_than_3_months or more_than_3_months
        #[arg(long)]
        duration: Option<JobDuration>,

        #[arg(long)]
        category: Option<Category>,
    },

    /// Follow a conversation until Ctrl-C
    Chat { proposal_id: String },

    /// Send one message
    Send { proposal_id: String, text: String },

    /// Sign in and remember the session
    Login { email: String, password: String },

    /// Forget the stored session
    Logout,

    /// My posts and my proposals
    Dashboard,

    /// Proposals received for one of my posts
    Proposals {
        post_id: String,

        /// pending, accepted, discussion or rejected
        #[arg(short, long)]
        status: Option<ProposalStatus>,
    },

    /// Accept, reject or open a discussion on a proposal
    Decide {
        proposal_id: String,
        status: ProposalStatus,
    },
}

struct App {
    config: Config,
    store: Arc<FileStore>,
    gateway: Arc<HttpGateway>,
}

impl App {
    fn listing_controller(&self) -> ListingController {
        ListingController::new(
            self.gateway.clone(),
            self.store.clone(),
            Arc::new(SystemClock),
            self.config.controller_settings(),
        )
    }

    fn listing_view(&self) -> ListingView {
        ListingView::new(
            self.listing_controller(),
            Arc::new(LogNavigator::new()),
            self.store.clone(),
        )
    }

    fn identity(&self) -> Result<Arc<Identity>, ClientError> {
        self.gateway
            .identity()?
            .map(Arc::new)
            .ok_or_else(|| ClientError::Internal("not signed in; run `job-board login` first".to_string()))
    }
}

#[tokio::main]
async fn main() -> Result<(), ClientError> {
    // --- 1. Load Configuration & Set Up Logging ---
    let cli = Cli::parse();
    let config = Config::from_env()?;
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(config.log_level.to_string()))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
    info!("Configuration loaded. API at {}", config.api_url);

    // --- 2. Initialize Adapters ---
    let store = Arc::new(FileStore::open(&config.store_path)?);
    let gateway = Arc::new(HttpGateway::new(config.api_url.clone(), store.clone()));
    let app = App {
        config,
        store,
        gateway,
    };

    // --- 3. Run the Command ---
    match cli.command {
        Commands::Browse { category, pages } => {
            let view = browse(&app, category, pages).await?;
            print_listings(&view.controller().listings().await);
            if view.controller().has_more().await {
                println!("(more available: --pages {})", pages + 1);
            }
        }

        Commands::Search {
            query,
            region,
            budget_type,
            min_budget,
            max_budget,
            duration,
            category,
        } => {
            let filters = FilterSet {
                region,
                duration,
                category,
                budget_type,
                min_budget,
                max_budget,
            };
            let mut view = app.listing_view();
            let found = view.search(&query, filters).await?;
            print_listings(&found);
            if let Some(available) = view.controller().available_filters().await {
                println!("\nRefine by:");
                if !available.regions.is_empty() {
                    println!("  regions:      {}", available.regions.join(", "));
                }
                if !available.budget_types.is_empty() {
                    println!("  budget types: {}", join(&available.budget_types));
                }
                if let (Some(min), Some(max)) = (available.min_budget, available.max_budget) {
                    println!("  budget:       {} - {}", min, max);
                }
                if !available.durations.is_empty() {
                    println!("  durations:    {}", join(&available.durations));
                }
                if !available.categories.is_empty() {
                    println!("  categories:   {}", join(&available.categories));
                }
            }
        }

        Commands::Chat { proposal_id } => chat(&app, &proposal_id).await?,

        Commands::Send { proposal_id, text } => {
            let chat = ConversationController::new(app.gateway.clone(), app.config.controller_settings());
            let sent = chat.send_message(&proposal_id, &text).await?;
            println!("Sent {}", sent.message_id);
        }

        Commands::Login { email, password } => {
            let identity = app.gateway.login(&email, &password).await?;
            println!("Signed in as {} ({})", identity.name, identity.user_id);
        }

        Commands::Logout => {
            app.gateway.clear_auth()?;
            println!("Signed out.");
        }

        Commands::Dashboard => {
            let listings = app.listing_controller();
            let proposals = ProposalController::new(app.gateway.clone(), app.identity()?);
            let (posts, sent) =
                futures::future::try_join(listings.load_my_posts(), proposals.load_my_proposals())
                    .await?;
            println!("My posts ({}):", posts.len());
            print_listings(&posts);
            println!("\nMy proposals ({}):", sent.len());
            print_proposals(&sent);
        }

        Commands::Proposals { post_id, status } => {
            let proposals = ProposalController::new(app.gateway.clone(), app.identity()?);
            let received = proposals.load_proposals_for_post(&post_id, status).await?;
            print_proposals(&received);
        }

        Commands::Decide {
            proposal_id,
            status,
        } => {
            let proposals = ProposalController::new(app.gateway.clone(), app.identity()?);
            let details = proposals.get_proposal_details(&proposal_id).await?;
            let reloaded = proposals
                .update_proposal_status(&details.proposal, status)
                .await?;
            println!("Proposal {} is now {}.", proposal_id, status);
            print_proposals(&reloaded);
        }
    }

    Ok(())
}

async fn browse(
    app: &App,
    category: Option<Category>,
    pages: usize,
) -> Result<ListingView, ClientError> {
    let mut view = app.listing_view();
    if let Some(offset) = view.restore_scroll() {
        info!("Previous session stopped at offset {}", offset);
    }
    view.select_category(category).await?;
    for _ in 1..pages {
        if !view.controller().has_more().await {
            break;
        }
        view.load_more().await?;
    }
    let shown = view.controller().listings().await.len();
    view.save_scroll(shown as f64);
    Ok(view)
}

async fn chat(app: &App, proposal_id: &str) -> Result<(), ClientError> {
    let mut chat = ConversationController::new(app.gateway.clone(), app.config.controller_settings());
    let mut updates = chat.subscribe();

    if let Err(e) = chat.load_proposal_details(proposal_id).await {
        warn!("Could not load proposal details: {}", e);
    }
    let snapshot = chat.snapshot().await;
    if let Some(listing) = &snapshot.listing {
        println!("== {} ==", listing.title);
    }
    if let Some(discussion) = &snapshot.discussion {
        for contact in discussion.shown_contacts.iter().filter(|c| c.show) {
            println!("contact: {}", contact.value);
        }
    }

    let mut seen = HashSet::new();
    let history = chat.load_messages(proposal_id, false).await?;
    print_new_messages(&history, &mut seen);
    println!("-- following {}; Ctrl-C to stop --", proposal_id);

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            changed = updates.changed() => {
                if changed.is_err() {
                    break;
                }
                let messages = updates.borrow_and_update().messages.clone();
                print_new_messages(&messages, &mut seen);
            }
        }
    }

    chat.stop_polling();
    Ok(())
}

fn print_new_messages(messages: &[Message], seen: &mut HashSet<String>) {
    for message in messages {
        if seen.insert(message.message_id.clone()) {
            println!(
                "[{}] {}: {}",
                message.date.format("%Y-%m-%d %H:%M"),
                message.user.name,
                message.body
            );
        }
    }
}

fn print_listings(listings: &[Listing]) {
    if listings.is_empty() {
        println!("No posts found.");
        return;
    }
    println!("{:<24} {:<6} {:<40} {:>16}", "ID", "CAT", "TITLE", "BUDGET");
    println!("{}", "-".repeat(89));
    for listing in listings {
        let budget = listing
            .budget
            .as_ref()
            .map(|b| format!("{} {:?} {}", b.value, b.currency, b.budget_type))
            .unwrap_or_else(|| "-".to_string());
        println!(
            "{:<24} {:<6} {:<40} {:>16}",
            listing.id,
            listing.category,
            truncate(&listing.title, 40),
            budget
        );
    }
}

fn print_proposals(proposals: &[Proposal]) {
    if proposals.is_empty() {
        println!("No proposals.");
        return;
    }
    for proposal in proposals {
        println!(
            "{:<24} {:<10} {} <{}>: {}",
            proposal.proposal_id,
            proposal.status,
            proposal.user.name,
            proposal.user.email,
            truncate(&proposal.cover_letter, 60)
        );
    }
}

fn join<T: std::fmt::Display>(values: &[T]) -> String {
    values
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    let cut: String = text.chars().take(max.saturating_sub(1)).collect();
    format!("{}…", cut)
}
