//! # Wellness Common Library
//!
//! Shared code for the wellness dashboard services:
//! - Common error type
//! - TOML configuration loading and config file resolution

pub mod config;
pub mod error;

pub use error::{Error, Result};
