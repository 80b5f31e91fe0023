//! PR Focus - GitHub webhook ingestion and AI-assisted pull request analysis.
//!
//! This library provides the event pipeline (signature verification,
//! normalization, bounded in-memory storage), the diff and analysis layers,
//! and the HTTP server that ties them together.

pub mod ai;
pub mod analysis;
pub mod config;
pub mod diff;
pub mod github;
pub mod server;
pub mod store;
pub mod types;
pub mod webhooks;

#[cfg(test)]
pub mod test_utils;
