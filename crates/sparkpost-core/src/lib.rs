//! # sparkpost-core
//!
//! Shared building blocks for SparkPost API clients.
//!
//! ## Modules
//!
//! - [`error`] - Error types and API failure parsing
//! - [`config`] - API key and endpoint configuration
//! - [`client`] - HTTP transport, response envelopes and retry policy

#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod client;
pub mod config;
pub mod error;

// Re-export commonly used types
pub use client::{ApiResponse, ServiceClient, ServiceClientBuilder, Transport};
pub use config::SparkPostConfig;
pub use error::{ApiError, ApiErrorDetail, Error, Result};
