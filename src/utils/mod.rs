//! Utilities Module
//!
//! Ambient concerns shared across the crate: configuration, logging and
//! the HTTP transport.

mod http;
pub mod config;
pub mod logging;

pub use config::{normalize_mint_url, ClientConfig, OperationTimeouts};
pub use http::*;
