mod handlers;
mod models;
mod templates;

use anyhow::Result;
use axum::{
    Router,
    routing::{get, post},
};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use crate::gateway::AgentGateway;

pub use handlers::{favicon, hello, index, not_found};
pub use models::HelloForm;
pub use templates::Pages;

/// Shared by every request: the agent, the compiled pages and the dialect to ask for.
#[derive(Clone)]
pub struct AppState {
    pub gateway: Arc<dyn AgentGateway>,
    pub pages: Arc<Pages>,
    pub dialect: String,
}

impl AppState {
    pub fn new(gateway: Arc<dyn AgentGateway>, dialect: impl Into<String>) -> Result<Self> {
        Ok(Self {
            gateway,
            pages: Arc::new(Pages::new()?),
            dialect: dialect.into(),
        })
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/favicon.ico", get(favicon))
        .route("/hello", post(hello))
        .fallback(not_found)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
