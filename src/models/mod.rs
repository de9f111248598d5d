//! Models
//!
//! Configuration data structures for the notification pipeline.

pub mod settings;

pub use settings::*;
