//! Warmup set selection.
//!
//! The registry hash a client advertises picks which hostname set is
//! pre-resolved at startup, so the first proxied request is a cache hit.

use crate::dns::error::{DnsError, DnsResult};
use crate::headers::spec::{parse_hex_u32, REGISTRY_HASH};

/// What a warmup pass achieved.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WarmupReport {
    /// Index of the hostname set that was selected.
    pub set_index: usize,
    /// Hosts now cached.
    pub resolved: Vec<String>,
    /// Hosts whose lookup failed; they were not cached.
    pub failed: Vec<String>,
}

impl WarmupReport {
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Parse a registry hash seed (`0x`-prefixed hex u32).
pub fn parse_seed(seed: &str) -> DnsResult<u32> {
    parse_hex_u32(REGISTRY_HASH, seed.trim()).map_err(|_| DnsError::InvalidSeed(seed.to_string()))
}

/// Pick the hostname set for `seed`: `seed % sets.len()`.
pub fn select_warmup_set<'a>(seed: &str, sets: &'a [Vec<String>]) -> DnsResult<(usize, &'a [String])> {
    let value = parse_seed(seed)?;
    if sets.is_empty() {
        return Err(DnsError::NoWarmupSets);
    }
    let index = value as usize % sets.len();
    Ok((index, sets[index].as_slice()))
}
