//! Trailing-byte checksum for binary header blobs.
//!
//! The checksum is the XOR of every payload byte (0 for an empty payload).
//! It is appended as the final byte of the blob. XOR is enough to catch any
//! single-byte corruption; it is an integrity check, not tamper-proofing.

/// Compute the checksum byte of `payload`.
pub fn checksum_of(payload: &[u8]) -> u8 {
    payload.iter().fold(0u8, |acc, b| acc ^ b)
}

/// Check a claimed checksum against `payload`.
pub fn verify(payload: &[u8], claimed: u8) -> bool {
    checksum_of(payload) == claimed
}

/// Append the checksum to `payload`, producing a blob the validator accepts.
pub fn seal(payload: &[u8]) -> Vec<u8> {
    let mut blob = Vec::with_capacity(payload.len() + 1);
    blob.extend_from_slice(payload);
    blob.push(checksum_of(payload));
    blob
}

/// Split a sealed blob into payload and embedded checksum.
///
/// Returns `None` for an empty blob.
pub fn split(blob: &[u8]) -> Option<(&[u8], u8)> {
    let (checksum, payload) = blob.split_last()?;
    Some((payload, *checksum))
}
