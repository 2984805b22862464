//! Reelgate - rate-limited, cached gateway to a movie metadata API
//!
//! This library crate exposes the core functionality for integration testing.

pub mod catalog;
pub mod config;
pub mod gateway;
pub mod server;
