use hestia::error::HestiaError;

#[test]
fn error_constructors() {
    assert!(matches!(
        HestiaError::config("x"),
        HestiaError::Config { .. }
    ));
    assert!(matches!(
        HestiaError::validation("f", "m"),
        HestiaError::Validation { .. }
    ));
    assert!(matches!(HestiaError::io("x"), HestiaError::Io { .. }));
    assert!(matches!(
        HestiaError::not_found("x"),
        HestiaError::NotFound { .. }
    ));
    assert!(matches!(
        HestiaError::storage("x"),
        HestiaError::Storage { .. }
    ));
}

#[test]
fn serde_errors_convert_to_serialization() {
    let err: HestiaError = serde_json::from_str::<serde_json::Value>("{")
        .unwrap_err()
        .into();
    assert!(matches!(err, HestiaError::Serialization { .. }));
}

#[test]
fn display_messages() {
    let e = HestiaError::validation("field", "bad");
    let s = format!("{}", e);
    assert!(s.contains("Validation error"));
}
