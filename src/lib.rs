//! Ask a SQL database questions in plain language.
//!
//! A small web front-end ([`web`]) hands each question to an
//! [`AgentGateway`](gateway::AgentGateway). The production gateway runs a
//! ReAct loop ([`engine`]) in which a chat model ([`thinker`]) explores the
//! database through SQL tools ([`tools`], [`db`]) until it can answer.

pub mod config;
pub mod consts;
pub mod db;
pub mod engine;
pub mod error;
pub mod gateway;
pub mod memory;
pub mod prompts;
pub mod thinker;
pub mod tools;
pub mod web;

use anyhow::{Context, Result};
use axum::Router;
use tracing::info;

/// Bind `host:port` and serve until Ctrl+C.
pub async fn run_server(app: Router, host: &str, port: u16) -> Result<()> {
    let listener = tokio::net::TcpListener::bind((host, port))
        .await
        .with_context(|| format!("failed to bind {host}:{port}"))?;
    info!(addr = %listener.local_addr()?, "listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("shutting down");
        })
        .await
        .context("server failed")
}
