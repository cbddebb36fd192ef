//! # VCD Common Library
//!
//! Shared code for the VCD (vocal classification) services:
//! - Common error type
//! - Root folder resolution
//! - TOML configuration loading with graceful degradation
//! - Logging configuration

pub mod config;
pub mod error;

pub use error::{Error, Result};
