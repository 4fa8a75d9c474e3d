//! Header specification table.
//!
//! Every recognized control header is one [`HeaderSpec`] row: a name plus a
//! [`HeaderFormat`] that knows how to decode and validate raw values. The
//! validator never branches on header names, so adding a header means adding
//! a row here.

use crate::headers::checksum;
use crate::headers::dump::ConfigSnapshot;
use crate::headers::error::{ErrorCode, ValidationError};

pub const CONFIG_VERSION: &str = "Config-Version";
pub const REGISTRY_HASH: &str = "Registry-Hash";
pub const FEATURE_FLAGS: &str = "Feature-Flags";
pub const TERMINAL_MODE: &str = "Terminal-Mode";
pub const TERMINAL_ROWS: &str = "Terminal-Rows";
pub const TERMINAL_COLS: &str = "Terminal-Cols";
pub const PROXY_TOKEN: &str = "Proxy-Token";
pub const CONFIG_DUMP: &str = "Config-Dump";

/// The only config version this build accepts.
pub const SUPPORTED_CONFIG_VERSION: u64 = 1;

/// Feature-flag bits with an assigned meaning (bits 0..=10).
/// Everything above is reserved and must be zero.
pub const ALLOWED_FEATURE_MASK: u32 = 0x0000_07FF;

/// Upper bound for terminal mode/rows/cols.
pub const MAX_TERMINAL_VALUE: u64 = 10_000;

/// Largest accepted Config-Dump, checksum byte included.
pub const MAX_CONFIG_DUMP_BYTES: usize = 4096;

/// Largest accepted Proxy-Token, in characters.
pub const MAX_TOKEN_LEN: usize = 8192;

/// Wire format of a header value, with its validation parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeaderFormat {
    /// Decimal integer that must equal `expected`.
    ExactVersion { expected: u64 },
    /// `0x`-prefixed hex u32, opaque.
    HexU32,
    /// `0x`-prefixed hex u32 where bits outside `allowed` are reserved.
    HexBitmask { allowed: u32 },
    /// Non-negative decimal integer no larger than `max`.
    BoundedInt { max: u64 },
    /// `0x`-prefixed hex bytes whose last byte checksums the rest.
    ChecksummedBlob { max_bytes: usize },
    /// Three dot-separated base64url segments.
    Token { max_len: usize },
}

/// Decoded form of a header value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecodedValue {
    UInt(u64),
    HexBitmask(u32),
    ChecksummedBytes { payload: Vec<u8>, checksum: u8 },
    TokenSegments {
        header: String,
        payload: String,
        signature: String,
    },
}

impl DecodedValue {
    /// Interpret a checksummed blob as a packed [`ConfigSnapshot`].
    pub fn config_snapshot(&self) -> Option<ConfigSnapshot> {
        match self {
            DecodedValue::ChecksummedBytes { payload, .. } => ConfigSnapshot::from_payload(payload),
            _ => None,
        }
    }
}

impl HeaderFormat {
    /// Parse a raw (already trimmed) value.
    pub fn decode(&self, header: &str, raw: &str) -> Result<DecodedValue, ValidationError> {
        match self {
            HeaderFormat::ExactVersion { .. } | HeaderFormat::BoundedInt { .. } => {
                parse_decimal(header, raw).map(DecodedValue::UInt)
            }
            HeaderFormat::HexU32 | HeaderFormat::HexBitmask { .. } => {
                parse_hex_u32(header, raw).map(DecodedValue::HexBitmask)
            }
            HeaderFormat::ChecksummedBlob { max_bytes } => parse_blob(header, raw, *max_bytes),
            HeaderFormat::Token { max_len } => parse_token(header, raw, *max_len),
        }
    }

    /// Apply the semantic rule to a decoded value.
    pub fn validate(
        &self,
        header: &str,
        raw: &str,
        decoded: &DecodedValue,
    ) -> Result<(), ValidationError> {
        match (self, decoded) {
            (HeaderFormat::ExactVersion { expected }, DecodedValue::UInt(v)) => {
                if v == expected {
                    Ok(())
                } else {
                    Err(ValidationError::new(
                        ErrorCode::OutOfRange,
                        header,
                        raw,
                        format!("unsupported version {}, expected {}", v, expected),
                    ))
                }
            }
            (HeaderFormat::BoundedInt { max }, DecodedValue::UInt(v)) => {
                if v <= max {
                    Ok(())
                } else {
                    Err(ValidationError::new(
                        ErrorCode::OutOfRange,
                        header,
                        raw,
                        format!("value {} exceeds maximum {}", v, max),
                    ))
                }
            }
            (HeaderFormat::HexU32, DecodedValue::HexBitmask(_)) => Ok(()),
            (HeaderFormat::HexBitmask { allowed }, DecodedValue::HexBitmask(bits)) => {
                let reserved = bits & !allowed;
                if reserved == 0 {
                    Ok(())
                } else {
                    Err(ValidationError::new(
                        ErrorCode::ReservedBitsSet,
                        header,
                        raw,
                        format!(
                            "reserved bits {:#010x} set (allowed mask {:#010x})",
                            reserved, allowed
                        ),
                    ))
                }
            }
            (HeaderFormat::ChecksummedBlob { .. }, DecodedValue::ChecksummedBytes { payload, checksum: claimed }) => {
                if checksum::verify(payload, *claimed) {
                    Ok(())
                } else {
                    Err(ValidationError::new(
                        ErrorCode::ChecksumMismatch,
                        header,
                        raw,
                        format!(
                            "checksum {:#04x} does not match computed {:#04x}",
                            claimed,
                            checksum::checksum_of(payload)
                        ),
                    ))
                }
            }
            // Structure was fully checked while decoding.
            (HeaderFormat::Token { .. }, DecodedValue::TokenSegments { .. }) => Ok(()),
            _ => Err(ValidationError::new(
                ErrorCode::InvalidFormat,
                header,
                raw,
                "decoded value does not match header format",
            )),
        }
    }
}

/// One recognized header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HeaderSpec {
    pub name: &'static str,
    pub format: HeaderFormat,
    /// Value must never be echoed back or logged.
    pub sensitive: bool,
}

/// Versioned registry of recognized headers.
#[derive(Debug)]
pub struct HeaderSpecTable {
    pub version: u32,
    specs: &'static [HeaderSpec],
}

static CURRENT: HeaderSpecTable = HeaderSpecTable {
    version: 1,
    specs: &[
        HeaderSpec {
            name: CONFIG_VERSION,
            format: HeaderFormat::ExactVersion {
                expected: SUPPORTED_CONFIG_VERSION,
            },
            sensitive: false,
        },
        HeaderSpec {
            name: REGISTRY_HASH,
            format: HeaderFormat::HexU32,
            sensitive: false,
        },
        HeaderSpec {
            name: FEATURE_FLAGS,
            format: HeaderFormat::HexBitmask {
                allowed: ALLOWED_FEATURE_MASK,
            },
            sensitive: false,
        },
        HeaderSpec {
            name: TERMINAL_MODE,
            format: HeaderFormat::BoundedInt {
                max: MAX_TERMINAL_VALUE,
            },
            sensitive: false,
        },
        HeaderSpec {
            name: TERMINAL_ROWS,
            format: HeaderFormat::BoundedInt {
                max: MAX_TERMINAL_VALUE,
            },
            sensitive: false,
        },
        HeaderSpec {
            name: TERMINAL_COLS,
            format: HeaderFormat::BoundedInt {
                max: MAX_TERMINAL_VALUE,
            },
            sensitive: false,
        },
        HeaderSpec {
            name: PROXY_TOKEN,
            format: HeaderFormat::Token {
                max_len: MAX_TOKEN_LEN,
            },
            sensitive: true,
        },
        HeaderSpec {
            name: CONFIG_DUMP,
            format: HeaderFormat::ChecksummedBlob {
                max_bytes: MAX_CONFIG_DUMP_BYTES,
            },
            sensitive: false,
        },
    ],
};

impl HeaderSpecTable {
    /// The table compiled into this build.
    pub fn current() -> &'static HeaderSpecTable {
        &CURRENT
    }

    /// Find a spec by header name (ASCII case-insensitive).
    pub fn lookup(&self, name: &str) -> Option<&'static HeaderSpec> {
        self.specs.iter().find(|s| s.name.eq_ignore_ascii_case(name))
    }

    pub fn is_recognized(&self, name: &str) -> bool {
        self.lookup(name).is_some()
    }

    pub fn specs(&self) -> &'static [HeaderSpec] {
        self.specs
    }
}

fn parse_decimal(header: &str, raw: &str) -> Result<u64, ValidationError> {
    if let Some(digits) = raw.strip_prefix('-') {
        if !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit()) {
            return Err(ValidationError::new(
                ErrorCode::OutOfRange,
                header,
                raw,
                "value must not be negative",
            ));
        }
    }
    if raw.is_empty() || !raw.bytes().all(|b| b.is_ascii_digit()) {
        return Err(ValidationError::new(
            ErrorCode::InvalidFormat,
            header,
            raw,
            "expected a decimal integer",
        ));
    }
    // Only overflow can fail past the digit check.
    raw.parse::<u64>().map_err(|_| {
        ValidationError::new(ErrorCode::OutOfRange, header, raw, "integer too large")
    })
}

fn strip_hex_prefix(raw: &str) -> Option<&str> {
    raw.strip_prefix("0x").or_else(|| raw.strip_prefix("0X"))
}

pub(crate) fn parse_hex_u32(header: &str, raw: &str) -> Result<u32, ValidationError> {
    let digits = strip_hex_prefix(raw)
        .filter(|d| !d.is_empty() && d.bytes().all(|b| b.is_ascii_hexdigit()))
        .ok_or_else(|| {
            ValidationError::new(
                ErrorCode::InvalidFormat,
                header,
                raw,
                "expected 0x-prefixed hexadecimal",
            )
        })?;

    let significant = digits.trim_start_matches('0');
    if significant.len() > 8 {
        return Err(ValidationError::new(
            ErrorCode::OutOfRange,
            header,
            raw,
            "value does not fit in 32 bits",
        ));
    }
    if significant.is_empty() {
        return Ok(0);
    }
    u32::from_str_radix(significant, 16).map_err(|e| {
        ValidationError::new(ErrorCode::InvalidFormat, header, raw, e.to_string())
    })
}

fn parse_blob(header: &str, raw: &str, max_bytes: usize) -> Result<DecodedValue, ValidationError> {
    let digits = strip_hex_prefix(raw).ok_or_else(|| {
        ValidationError::new(
            ErrorCode::InvalidFormat,
            header,
            raw,
            "expected 0x-prefixed hex blob",
        )
    })?;

    if digits.len() / 2 > max_bytes {
        return Err(ValidationError::new(
            ErrorCode::OutOfRange,
            header,
            raw,
            format!("blob exceeds {} bytes", max_bytes),
        ));
    }

    let bytes = hex::decode(digits).map_err(|e| {
        ValidationError::new(ErrorCode::InvalidFormat, header, raw, e.to_string())
    })?;

    if bytes.len() < 2 {
        return Err(ValidationError::new(
            ErrorCode::InvalidFormat,
            header,
            raw,
            "blob needs at least one payload byte and a checksum byte",
        ));
    }

    match checksum::split(&bytes) {
        Some((payload, checksum)) => Ok(DecodedValue::ChecksummedBytes {
            payload: payload.to_vec(),
            checksum,
        }),
        None => Err(ValidationError::new(
            ErrorCode::InvalidFormat,
            header,
            raw,
            "empty blob",
        )),
    }
}

fn is_base64url_segment(segment: &str) -> bool {
    !segment.is_empty()
        && segment.len() % 4 != 1
        && segment
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_')
}

fn parse_token(header: &str, raw: &str, max_len: usize) -> Result<DecodedValue, ValidationError> {
    let invalid = |message: &str| {
        ValidationError::new(ErrorCode::InvalidToken, header, raw, message).redacted()
    };

    if raw.len() > max_len {
        return Err(invalid("token too long"));
    }

    let segments: Vec<&str> = raw.split('.').collect();
    let [head, payload, signature] = segments.as_slice() else {
        return Err(invalid("token must have exactly three segments"));
    };

    if let Some(pos) = [head, payload, signature]
        .iter()
        .position(|s| !is_base64url_segment(s))
    {
        return Err(invalid(&format!("segment {} is not base64url", pos + 1)));
    }

    Ok(DecodedValue::TokenSegments {
        header: head.to_string(),
        payload: payload.to_string(),
        signature: signature.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn check(name: &str, raw: &str) -> Result<DecodedValue, ValidationError> {
        let spec = HeaderSpecTable::current().lookup(name).unwrap();
        let decoded = spec.format.decode(name, raw)?;
        spec.format.validate(name, raw, &decoded)?;
        Ok(decoded)
    }

    fn code(name: &str, raw: &str) -> ErrorCode {
        check(name, raw).unwrap_err().code
    }

    #[test]
    fn test_lookup_is_case_insensitive() {
        let table = HeaderSpecTable::current();
        assert_eq!(table.lookup("feature-flags").unwrap().name, FEATURE_FLAGS);
        assert_eq!(table.lookup("CONFIG-VERSION").unwrap().name, CONFIG_VERSION);
        assert!(table.lookup("X-Forwarded-For").is_none());
        assert_eq!(table.specs().len(), 8);
    }

    #[test]
    fn test_version_rules() {
        assert_eq!(check(CONFIG_VERSION, "1").unwrap(), DecodedValue::UInt(1));
        assert_eq!(code(CONFIG_VERSION, "2"), ErrorCode::OutOfRange);
        assert_eq!(code(CONFIG_VERSION, "256"), ErrorCode::OutOfRange);
        assert_eq!(code(CONFIG_VERSION, "-1"), ErrorCode::OutOfRange);
        assert_eq!(code(CONFIG_VERSION, "99999999999999999999999"), ErrorCode::OutOfRange);
        assert_eq!(code(CONFIG_VERSION, "one"), ErrorCode::InvalidFormat);
        assert_eq!(code(CONFIG_VERSION, ""), ErrorCode::InvalidFormat);
        assert_eq!(code(CONFIG_VERSION, "1.0"), ErrorCode::InvalidFormat);
    }

    #[test]
    fn test_hex_u32_rules() {
        assert_eq!(
            check(REGISTRY_HASH, "0xa1b2c3d4").unwrap(),
            DecodedValue::HexBitmask(0xa1b2_c3d4)
        );
        assert_eq!(check(REGISTRY_HASH, "0X0").unwrap(), DecodedValue::HexBitmask(0));
        assert_eq!(
            check(REGISTRY_HASH, "0x00000000ff").unwrap(),
            DecodedValue::HexBitmask(0xff)
        );
        assert_eq!(code(REGISTRY_HASH, "a1b2c3d4"), ErrorCode::InvalidFormat);
        assert_eq!(code(REGISTRY_HASH, "0x"), ErrorCode::InvalidFormat);
        assert_eq!(code(REGISTRY_HASH, "0xzz"), ErrorCode::InvalidFormat);
        assert_eq!(code(REGISTRY_HASH, "0x1ffffffff"), ErrorCode::OutOfRange);
    }

    #[test]
    fn test_reserved_bits() {
        assert!(check(FEATURE_FLAGS, "0x00000007").is_ok());
        assert!(check(FEATURE_FLAGS, "0x000007ff").is_ok());

        let err = check(FEATURE_FLAGS, "0x00000800").unwrap_err();
        assert_eq!(err.code, ErrorCode::ReservedBitsSet);
        assert!(err.message.contains("0x00000800"));

        let err = check(FEATURE_FLAGS, "0x80000001").unwrap_err();
        assert!(err.message.contains("0x80000000"));
    }

    #[test]
    fn test_bounded_int() {
        assert!(check(TERMINAL_ROWS, "0").is_ok());
        assert!(check(TERMINAL_COLS, "10000").is_ok());
        assert_eq!(code(TERMINAL_COLS, "10001"), ErrorCode::OutOfRange);
        assert_eq!(code(TERMINAL_MODE, "-3"), ErrorCode::OutOfRange);
        assert_eq!(code(TERMINAL_ROWS, "twenty"), ErrorCode::InvalidFormat);
    }

    #[test]
    fn test_token_structure() {
        match check(PROXY_TOKEN, "aa.bb.cc").unwrap() {
            DecodedValue::TokenSegments { header, payload, signature } => {
                assert_eq!((header.as_str(), payload.as_str(), signature.as_str()), ("aa", "bb", "cc"));
            }
            other => panic!("unexpected decode: {:?}", other),
        }
        assert!(check(PROXY_TOKEN, "eyJhbGciOiJIUzI1NiJ9.eyJzdWIiOiIxIn0.c2ln-_w").is_ok());

        for bad in ["aa.bb", "aa.bb.cc.dd", "aa..cc", "aa.b+b.cc", "aa.bb.c=", "a.bb.cc", ""] {
            let err = check(PROXY_TOKEN, bad).unwrap_err();
            assert_eq!(err.code, ErrorCode::InvalidToken, "token {:?}", bad);
            assert_eq!(err.value, "<redacted>");
        }
    }

    #[test]
    fn test_checksummed_blob() {
        let blob = checksum::seal(&[0x01, 0x02, 0x03]);
        let raw = format!("0x{}", hex::encode(&blob));
        assert!(check(CONFIG_DUMP, &raw).is_ok());

        let mut tampered = blob.clone();
        *tampered.last_mut().unwrap() ^= 0x01;
        let raw = format!("0x{}", hex::encode(&tampered));
        assert_eq!(code(CONFIG_DUMP, &raw), ErrorCode::ChecksumMismatch);

        assert_eq!(code(CONFIG_DUMP, "010203"), ErrorCode::InvalidFormat);
        assert_eq!(code(CONFIG_DUMP, "0x123"), ErrorCode::InvalidFormat);
        assert_eq!(code(CONFIG_DUMP, "0x01"), ErrorCode::InvalidFormat);
        assert_eq!(code(CONFIG_DUMP, "0xgg00"), ErrorCode::InvalidFormat);

        let huge = format!("0x{}", "00".repeat(MAX_CONFIG_DUMP_BYTES + 1));
        assert_eq!(code(CONFIG_DUMP, &huge), ErrorCode::OutOfRange);
    }

    mod props {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn prop_flags_valid_iff_within_mask(bits in any::<u32>()) {
                let raw = format!("{:#010x}", bits);
                let result = check(FEATURE_FLAGS, &raw);
                if bits & !ALLOWED_FEATURE_MASK == 0 {
                    prop_assert!(result.is_ok());
                } else {
                    prop_assert_eq!(result.unwrap_err().code, ErrorCode::ReservedBitsSet);
                }
            }
        }
    }
}
