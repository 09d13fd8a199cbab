//! Generation gateway integration
//!
//! The gateway is a single HTTP endpoint that fronts the generative backend. This
//! module provides the [`ContentGenerator`] seam, its HTTP implementation, wire
//! validation and token management.

pub mod auth;
pub mod client;
pub mod error;
pub mod generator;
pub mod models;

// Re-export commonly used types
pub use auth::TokenStore;
pub use client::GatewayClient;
pub use error::GatewayError;
pub use generator::ContentGenerator;
pub use models::Action;
