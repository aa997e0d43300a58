//! Trait seams between crates.

pub mod provider;

pub use provider::{GenerateParams, Provider};
