//! Storage
//!
//! Settings persistence.

pub mod config;

pub use config::ConfigService;
