//! Content fingerprint for grouping similar error events.
//!
//! The fingerprint is a stable identifier derived solely from an error's
//! message and stack trace: two events with identical message + stack always
//! carry the same fingerprint, so clients can group repeat occurrences.
//! Collisions at 64 bits are treated as negligible at this scale and no
//! collision handling exists downstream.

use sha2::{Digest, Sha256};

/// Length of a fingerprint in hex characters (64 bits of hash output).
pub const FINGERPRINT_LEN: usize = 16;

/// Computes the grouping fingerprint for an error event.
///
/// Hashes the message concatenated with the stack trace (absent stack trace
/// contributes nothing, same as an empty string) with SHA-256 and keeps the
/// first [`FINGERPRINT_LEN`] hex characters. Deterministic and infallible.
#[must_use]
pub fn fingerprint(message: &str, stack_trace: Option<&str>) -> String {
    let mut hasher = Sha256::new();
    hasher.update(message.as_bytes());
    if let Some(stack) = stack_trace {
        hasher.update(stack.as_bytes());
    }
    let digest = hex::encode(hasher.finalize());
    digest.get(..FINGERPRINT_LEN).unwrap_or(&digest).to_string()
}
