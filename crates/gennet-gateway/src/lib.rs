//! # GenNet Gateway
//!
//! HTTP API for GenNet: chat with knowledge-enhanced prompts, knowledge
//! search, and provider status.
//!
//! The chat pipeline lives in [`assistant`]; [`server`] wires it into an
//! Axum router and [`routes`] holds the handlers.

pub mod assistant;
pub mod error;
pub mod routes;
pub mod server;
pub mod sessions;

pub use assistant::{AskReply, AskRequest, Assistant};
pub use error::ApiError;
pub use server::{AppState, build_router, start};
pub use sessions::SessionStore;
