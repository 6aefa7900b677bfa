//! Local integrity verification of stored records

use crate::canonical::canonical_bytes;
use crate::hash::digest_bytes;
use edgestamp_types::VerifiedRecord;

/// Verify that a stored record's original payload still matches the digest
/// that was timestamped.
///
/// This performs the following checks:
/// 1. A non-empty proof is attached (without one, no timestamp assertion
///    exists and the record cannot verify)
/// 2. Recomputing canonical bytes + SHA3-256 over `original` yields exactly
///    the stored digest
///
/// This is a pure local check: it detects mutation of the locally-held
/// payload since storage. It does not contact the remote service and does
/// not validate the authenticity of the proof blob itself.
pub fn verify_record(record: &VerifiedRecord) -> bool {
    if !record.has_proof() {
        return false;
    }

    match canonical_bytes(&record.original) {
        Ok(bytes) => digest_bytes(&bytes) == record.digest,
        // A record that can no longer be canonicalized cannot match
        Err(_) => false,
    }
}
