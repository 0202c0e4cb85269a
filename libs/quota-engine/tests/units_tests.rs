//! Quota magnitude parsing tests

use site_quota_engine::{parse_magnitude, QuotaEngineError, QuotaMagnitude};

fn mb(token: &str) -> u64 {
    parse_magnitude(token)
        .unwrap_or_else(|err| panic!("{token:?} should parse: {err}"))
        .megabytes()
}

#[test]
fn test_plain_integer_is_megabytes() {
    assert_eq!(mb("500"), 500);
    assert_eq!(mb("0"), 0);
}

#[test]
fn test_megabyte_suffix() {
    assert_eq!(mb("500m"), 500);
    assert_eq!(mb("0m"), 0);
}

#[test]
fn test_gigabyte_suffix_scales_by_1024() {
    assert_eq!(mb("3g"), 3072);
    assert_eq!(mb("1g"), 1024);
    assert_eq!(mb("0g"), 0);
}

#[test]
fn test_leading_zeros_are_decimal() {
    assert_eq!(mb("007"), 7);
    assert_eq!(mb("010g"), 10 * 1024);
}

#[test]
fn test_rejects_malformed_tokens() {
    for token in [
        "", "g5", "-5", "5.5", "5G", "5M", "5k", "5gb", "5gm", "g", "m", " 5", "5 ", "+5", "5_000",
    ] {
        let result = parse_magnitude(token);
        assert!(
            matches!(result, Err(QuotaEngineError::ParseError { .. })),
            "{token:?} should be rejected, got {result:?}"
        );
    }
}

#[test]
fn test_rejects_non_ascii_digits() {
    assert!(parse_magnitude("５").is_err());
    assert!(parse_magnitude("٣g").is_err());
}

#[test]
fn test_rejects_values_that_overflow() {
    let too_many_digits = "99999999999999999999999";
    assert!(matches!(
        parse_magnitude(too_many_digits),
        Err(QuotaEngineError::ParseError { .. })
    ));

    let overflowing_gigabytes = format!("{}g", u64::MAX / 1024 + 1);
    assert!(matches!(
        parse_magnitude(&overflowing_gigabytes),
        Err(QuotaEngineError::ParseError { .. })
    ));
}

#[test]
fn test_parse_error_names_token() {
    let err = parse_magnitude("12x").unwrap_err();
    assert!(err.to_string().contains("\"12x\""));
}

#[test]
fn test_from_str_matches_parse() {
    let parsed: QuotaMagnitude = "4g".parse().unwrap();
    assert_eq!(parsed, parse_magnitude("4096").unwrap());
}
