//! Integration Tests Module
//!
//! End-to-end tests for the notification pipeline: context building,
//! overrides, template rendering and delivery through the real Telegram and
//! mail channels backed by in-memory transports.

// Shared fixtures and mock transports
mod common;

// Full pipeline tests (build -> override -> render -> deliver)
mod pipeline_test;


// Settings loading tests
mod config_test;
