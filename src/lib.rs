// ABOUTME: Library root for containmint - exposes public types for testing.
// ABOUTME: The main binary is in main.rs.

pub mod commands;
pub mod engine;
pub mod error;
pub mod output;
pub mod registry;
pub mod remote;
pub mod types;
