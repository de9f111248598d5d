//! Utilities
//!
//! Common utilities used throughout the crate.

pub mod escape;
pub mod paths;

pub use escape::*;
pub use paths::*;
