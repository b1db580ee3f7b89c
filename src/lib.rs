//! Assistant Relay
//!
//! A thin proxy that forwards end-user chat queries to a hosted assistants
//! API, tracks one polling loop per outstanding request, and serves a
//! string-templated browser search widget.
//!
//! # Architecture
//!
//! - **Server**: Axum-based HTTP server (query, stop, script endpoints)
//! - **Gateway**: Protocol driver for the hosted assistants REST API
//! - **Runs**: In-memory run registry and the poll/cancel coordinator
//! - **Widget**: Pure string templating for the embeddable browser widget
//!
//! # Modules
//!
//! - [`assistant`]: Gateway trait and the hosted HTTP implementation
//! - [`directory`]: Client credential directory loaded from CSV
//! - [`runs`]: Run registry and lifecycle coordinator
//! - [`widget`]: Browser widget script generation

// Allow pedantic clippy warnings that don't add value for this codebase
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::match_same_arms)]
#![allow(clippy::multiple_crate_versions)]
#![allow(clippy::unused_async)]

pub mod assistant;
pub mod config;
pub mod directory;
pub mod runs;
pub mod server;
pub mod widget;

use std::sync::Arc;

use crate::assistant::AssistantGateway;
use crate::config::AppConfig;
use crate::directory::CredentialDirectory;
use crate::runs::RunCoordinator;

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    /// Client credential directory, read-only after startup.
    pub directory: Arc<CredentialDirectory>,
    /// Remote assistant gateway.
    pub gateway: Arc<dyn AssistantGateway>,
    /// Run registry and poll-loop coordinator.
    pub coordinator: Arc<RunCoordinator>,
    /// Global configuration.
    pub config: Arc<AppConfig>,
}
