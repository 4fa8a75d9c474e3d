mod common;

use common::{guard_with, valid_headers, with_header, MockResolver};
use proxy_guard::headers::{ConfigSnapshot, ErrorCode};

#[test]
fn test_valid_request_passes() {
    let guard = guard_with(MockResolver::new());
    let result = guard.validate_request(valid_headers());

    assert!(result.valid, "unexpected errors: {:?}", result.errors);
    assert!(result.errors.is_empty());
    assert!(result.per_header.values().all(|o| o.valid));
    assert!(!result.per_header.contains_key("User-Agent"));
}

#[test]
fn test_all_failures_reported_together() {
    let guard = guard_with(MockResolver::new());
    let headers = with_header(valid_headers(), "Config-Version", "2");
    let headers = with_header(headers, "Feature-Flags", "0x80000000");
    let headers: Vec<_> = headers
        .into_iter()
        .filter(|(n, _)| *n != "Registry-Hash")
        .collect();

    let result = guard.validate_request(headers);
    assert!(!result.valid);

    let codes: Vec<ErrorCode> = result.errors.iter().map(|e| e.code).collect();
    assert_eq!(
        codes,
        vec![
            ErrorCode::MissingHeader,
            ErrorCode::OutOfRange,
            ErrorCode::ReservedBitsSet,
        ]
    );
    assert!(!result.has_auth_failure());
}

#[test]
fn test_header_names_are_case_insensitive() {
    let guard = guard_with(MockResolver::new());
    let lowered: Vec<(&str, &str)> = vec![
        ("config-version", "1"),
        ("REGISTRY-HASH", "0X00000001"),
        ("feature-flags", "0x0"),
        ("proxy-token", "aa.bb.cc"),
    ];
    let result = guard.validate_request(lowered);
    assert!(result.valid, "{:?}", result.errors);
}

#[test]
fn test_token_failures_are_redacted() {
    let guard = guard_with(MockResolver::new());
    let headers = with_header(valid_headers(), "Proxy-Token", "secret-without-dots");

    let result = guard.validate_request(headers);
    assert!(result.has_auth_failure());

    let error = result.errors_with(ErrorCode::InvalidToken).next().unwrap();
    assert_eq!(error.value, "<redacted>");
    assert!(!error.to_string().contains("secret-without-dots"));
}

#[test]
fn test_terminal_bounds() {
    let guard = guard_with(MockResolver::new());

    assert!(guard.validate_header("Terminal-Rows", "10000").valid);
    assert_eq!(
        guard.validate_header("Terminal-Rows", "10001").code(),
        Some(ErrorCode::OutOfRange)
    );
    assert_eq!(
        guard.validate_header("Terminal-Cols", "-3").code(),
        Some(ErrorCode::OutOfRange)
    );
    assert_eq!(
        guard.validate_header("Terminal-Mode", "vt100").code(),
        Some(ErrorCode::InvalidFormat)
    );
}

#[test]
fn test_config_dump_checksum() {
    let guard = guard_with(MockResolver::new());
    let snapshot = ConfigSnapshot {
        version: 1,
        registry_hash: 0xa1b2_c3d4,
        feature_flags: 0x7,
        terminal_mode: 2,
        rows: 40,
        cols: 120,
    };
    let good = snapshot.to_header_value();
    assert!(guard.validate_header("Config-Dump", &good).valid);

    // Flip the last hex digit of the checksum byte.
    let mut bad = good.clone();
    let last = bad.pop().unwrap();
    bad.push(if last == '0' { '1' } else { '0' });
    assert_eq!(
        guard.validate_header("Config-Dump", &bad).code(),
        Some(ErrorCode::ChecksumMismatch)
    );
}

#[test]
fn test_unknown_header_only_when_required() {
    let guard = guard_with(MockResolver::new());
    let headers = with_header(valid_headers(), "X-Custom", "anything");

    assert!(guard.validate_request(headers.clone()).valid);

    let result = guard.validate_all(headers, &["X-Custom"]);
    assert_eq!(
        result.errors.iter().map(|e| e.code).collect::<Vec<_>>(),
        vec![ErrorCode::UnknownHeader]
    );
}

#[test]
fn test_stats_track_validations() {
    let guard = guard_with(MockResolver::new());
    guard.validate_header("Config-Version", "1");
    guard.validate_header("Config-Version", "7");

    let stats = guard.validation_stats();
    assert_eq!(stats.total_validations, 2);
    assert_eq!(stats.total_errors, 1);
    assert!((stats.error_rate - 0.5).abs() < f64::EPSILON);
}
