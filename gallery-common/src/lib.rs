//! # Gallery Common Library
//!
//! Shared code for the gallery service and its tools:
//! - Error taxonomy (`Error`, `Result`)
//! - Configuration loading (TOML + environment + defaults)
//! - SQLite pool and schema initialization

pub mod config;
pub mod db;
pub mod error;

pub use error::{Error, Result};
