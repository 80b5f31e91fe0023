//! Webhook handling for GitHub events.
//!
//! This module provides:
//! - Signature verification for webhook payloads (HMAC-SHA256)
//! - Normalization of raw payloads into the dashboard's single event shape

pub mod events;
pub mod normalizer;
pub mod signature;

pub use events::{EventData, EventKind, NormalizedEvent};
pub use normalizer::{normalize, NormalizeError};
pub use signature::{
    compute_signature, format_signature_header, is_test_bypass, parse_signature_header,
    verify_signature, TEST_BYPASS_SIGNATURE,
};
