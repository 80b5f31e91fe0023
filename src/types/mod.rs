//! Core domain types for the PR Focus service.
//!
//! This module contains all the fundamental types used throughout the application,
//! designed to encode invariants via the type system.

pub mod ids;

// Re-export commonly used types at the module level
pub use ids::{CommentId, DeliveryId, InstallationId, PrNumber, RepoId, Sha};
