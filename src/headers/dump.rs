//! Packed config snapshot carried by the Config-Dump header.
//!
//! Layout (13 bytes, big-endian integers):
//! ```text
//! 0      1..5            5..9            9       10     11     12
//! +------+---------------+---------------+-------+------+------+----------+
//! | ver  | registry_hash | feature_flags | mode  | rows | cols | checksum |
//! +------+---------------+---------------+-------+------+------+----------+
//! ```
//! The checksum byte is produced by [`checksum::seal`].

use crate::headers::checksum;

/// Payload length, checksum excluded.
pub const SNAPSHOT_PAYLOAD_LEN: usize = 12;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConfigSnapshot {
    pub version: u8,
    pub registry_hash: u32,
    pub feature_flags: u32,
    pub terminal_mode: u8,
    pub rows: u8,
    pub cols: u8,
}

impl ConfigSnapshot {
    /// Pack into the 12-byte payload.
    pub fn to_payload(&self) -> [u8; SNAPSHOT_PAYLOAD_LEN] {
        let mut out = [0u8; SNAPSHOT_PAYLOAD_LEN];
        out[0] = self.version;
        out[1..5].copy_from_slice(&self.registry_hash.to_be_bytes());
        out[5..9].copy_from_slice(&self.feature_flags.to_be_bytes());
        out[9] = self.terminal_mode;
        out[10] = self.rows;
        out[11] = self.cols;
        out
    }

    /// Unpack a payload; `None` unless it is exactly 12 bytes.
    pub fn from_payload(payload: &[u8]) -> Option<Self> {
        let bytes: &[u8; SNAPSHOT_PAYLOAD_LEN] = payload.try_into().ok()?;
        Some(Self {
            version: bytes[0],
            registry_hash: u32::from_be_bytes([bytes[1], bytes[2], bytes[3], bytes[4]]),
            feature_flags: u32::from_be_bytes([bytes[5], bytes[6], bytes[7], bytes[8]]),
            terminal_mode: bytes[9],
            rows: bytes[10],
            cols: bytes[11],
        })
    }

    /// Sealed `0x…` header value for this snapshot.
    pub fn to_header_value(&self) -> String {
        format!("0x{}", hex::encode(checksum::seal(&self.to_payload())))
    }
}
