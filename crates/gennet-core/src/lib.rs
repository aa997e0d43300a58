//! # GenNet Core
//!
//! Shared configuration, error type, message types and the `Provider` trait
//! used by the knowledge matcher, the provider dispatcher and the gateway.

pub mod config;
pub mod error;
pub mod traits;
pub mod types;

pub use config::GenNetConfig;
pub use error::{GenNetError, Result};
