//! HTTP service
//!
//! JSON API under `/api`, a health check, and the static reader UI served
//! from the configured public directory.

pub mod dto;
pub mod error;
pub mod handlers;

pub use error::ApiError;

use crate::config::Config;
use crate::error::{Result, StoryMagicError};
use crate::illustrations::Illustrator;
use crate::providers::Provider;
use crate::storage::StoryStore;
use crate::story::{StoryGenerator, StoryWorkflow};
use crate::subscription::SubscriptionManager;
use axum::routing::{get, post};
use axum::Router;
use std::path::Path;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

/// Shared state handed to every handler
pub struct AppState {
    pub store: Arc<dyn StoryStore>,
    pub workflow: StoryWorkflow,
    pub subscriptions: SubscriptionManager,
}

impl AppState {
    /// Wire the store and text provider into the request services
    ///
    /// # Errors
    ///
    /// Returns error if the illustrator cannot be built
    pub fn new(store: Arc<dyn StoryStore>, provider: Arc<dyn Provider>, config: &Config) -> Result<Self> {
        let generator = StoryGenerator::new(provider.clone(), config.story.clone());
        let illustrator = Illustrator::new(Some(provider), config.illustrations.clone())?;

        Ok(Self {
            workflow: StoryWorkflow::new(store.clone(), generator, illustrator),
            subscriptions: SubscriptionManager::new(store.clone()),
            store,
        })
    }
}

/// Build the application router
pub fn router(state: Arc<AppState>, public_dir: impl AsRef<Path>) -> Router {
    let api = Router::new()
        .route("/register", post(handlers::register))
        .route("/login", post(handlers::login))
        .route("/add-child", post(handlers::add_child))
        .route("/user/:email", get(handlers::get_user))
        .route("/generate-story", post(handlers::generate_story))
        .route("/subscription-plans", get(handlers::subscription_plans))
        .route("/upgrade-subscription", post(handlers::upgrade_subscription))
        .route("/downgrade-subscription", post(handlers::downgrade_subscription))
        .route("/stories/:email", get(handlers::list_stories));

    Router::new()
        .nest("/api", api)
        .route("/health", get(handlers::health))
        .route("/favicon.ico", get(handlers::favicon))
        .fallback_service(ServeDir::new(public_dir))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Bind the configured address and serve until the process is stopped
///
/// # Errors
///
/// Returns error if the listener cannot be bound or the server fails
pub async fn serve(config: &Config, state: Arc<AppState>) -> Result<()> {
    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| StoryMagicError::Config(format!("Failed to bind {}: {}", addr, e)))?;

    tracing::info!(
        store = state.store.name(),
        public_dir = %config.server.public_dir,
        "StoryMagic listening on http://{}",
        addr
    );

    axum::serve(listener, router(state, &config.server.public_dir)).await?;
    Ok(())
}
