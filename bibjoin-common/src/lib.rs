//! # bibjoin Common Library
//!
//! Shared code for the bibjoin crates:
//! - Common error type
//! - TOML bootstrap configuration and its resolution order
//! - Logging initialization

pub mod config;
pub mod error;
pub mod logging;

pub use error::{Error, Result};
