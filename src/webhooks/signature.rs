//! GitHub webhook signature verification using HMAC-SHA256.
//!
//! GitHub signs webhook payloads using HMAC-SHA256 with a shared secret.
//! The signature is provided in the `X-Hub-Signature-256` header as `sha256=<hex>`.
//!
//! This module provides verification against the shared secret. Signature
//! verification is the first step in webhook processing; invalid signatures
//! should be rejected before parsing. Verification always runs against the raw
//! request bytes, never a re-serialized payload.

use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// Sentinel header value that skips verification in test deployments.
///
/// Accepted only when the service runs with the test-mode flag enabled, and
/// the check happens at the transport layer. [`verify_signature`] itself
/// always rejects this value (it is not valid hex).
pub const TEST_BYPASS_SIGNATURE: &str = "sha256=test-signature-ignore-verification";

/// Returns true if the header is exactly the test bypass sentinel.
pub fn is_test_bypass(signature_header: &str) -> bool {
    signature_header == TEST_BYPASS_SIGNATURE
}

/// Parses a GitHub signature header (e.g., "sha256=abc123...") into raw bytes.
///
/// Returns `None` for malformed headers (missing prefix, invalid hex, etc.).
/// Never panics.
///
/// # Examples
///
/// ```
/// use pr_focus::webhooks::parse_signature_header;
///
/// // Valid header
/// let sig = parse_signature_header("sha256=abcd1234");
/// assert!(sig.is_some());
///
/// // Invalid: missing prefix
/// assert!(parse_signature_header("abcd1234").is_none());
///
/// // Invalid: wrong algorithm
/// assert!(parse_signature_header("sha1=abcd1234").is_none());
///
/// // Invalid: bad hex
/// assert!(parse_signature_header("sha256=xyz").is_none());
/// ```
pub fn parse_signature_header(header: &str) -> Option<Vec<u8>> {
    // GitHub uses "sha256=" prefix
    let hex_sig = header.strip_prefix("sha256=")?;

    // Decode hex to bytes
    hex::decode(hex_sig).ok()
}

/// Computes the HMAC-SHA256 signature of a payload using the given secret.
///
/// This is useful for testing purposes (generating expected signatures).
pub fn compute_signature(payload: &[u8], secret: &[u8]) -> Vec<u8> {
    let mut mac = HmacSha256::new_from_slice(secret).expect("HMAC can take key of any size");
    mac.update(payload);
    mac.finalize().into_bytes().to_vec()
}

/// Formats a signature as a GitHub-style header value.
///
/// Returns a string in the format "sha256=<hex>".
pub fn format_signature_header(signature: &[u8]) -> String {
    format!("sha256={}", hex::encode(signature))
}

/// Verifies a GitHub webhook signature against the payload and secret.
///
/// Returns `true` if the signature is valid, `false` otherwise.
/// Uses constant-time comparison to prevent timing attacks.
///
/// An empty secret always fails verification: it means the deployment is
/// misconfigured, and HMAC with an empty key would otherwise happily verify
/// attacker-supplied signatures.
///
/// # Arguments
///
/// * `payload` - The raw webhook payload bytes
/// * `signature_header` - The value of the `X-Hub-Signature-256` header (e.g., "sha256=...")
/// * `secret` - The webhook secret configured in GitHub
///
/// # Examples
///
/// ```
/// use pr_focus::webhooks::{verify_signature, compute_signature, format_signature_header};
///
/// let payload = b"Hello, World!";
/// let secret = b"my-secret-key";
///
/// // Compute and format the expected signature
/// let sig = compute_signature(payload, secret);
/// let header = format_signature_header(&sig);
///
/// // Verification should succeed
/// assert!(verify_signature(payload, &header, secret));
///
/// // Verification should fail with wrong secret
/// assert!(!verify_signature(payload, &header, b"wrong-secret"));
///
/// // Verification should fail with an empty secret
/// assert!(!verify_signature(payload, &header, b""));
/// ```
pub fn verify_signature(payload: &[u8], signature_header: &str, secret: &[u8]) -> bool {
    if secret.is_empty() {
        return false;
    }

    // Parse the signature header
    let expected_signature = match parse_signature_header(signature_header) {
        Some(sig) => sig,
        None => return false,
    };

    // Compute the HMAC-SHA256
    let mut mac = match HmacSha256::new_from_slice(secret) {
        Ok(mac) => mac,
        Err(_) => return false,
    };
    mac.update(payload);

    // Constant-time comparison via the HMAC library
    mac.verify_slice(&expected_signature).is_ok()
}
