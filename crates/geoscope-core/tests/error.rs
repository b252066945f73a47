//! Tests for error handling

use geoscope_core::error::{DefinitionError, LoadError, LoadResult, OrAbsent, SessionError, SessionResult};
use geoscope_core::types::Address;

#[test]
fn test_load_error_unresolvable()
{
    let error = LoadError::Unresolvable("poly.pts".to_string());
    let message = format!("{}", error);
    assert!(message.contains("poly.pts"));
}

#[test]
fn test_load_error_read_failure()
{
    let error = LoadError::ReadFailure {
        address: Address::from(0x1000),
        len: 16,
    };
    let message = format!("{}", error);
    assert!(message.contains("16 bytes"));
    assert!(message.contains("0x0000000000001000"));
}

#[test]
fn test_load_error_converter_mismatch()
{
    let error = LoadError::ConverterMismatch { expected: 2, actual: 3 };
    let message = format!("{}", error);
    assert!(message.contains("3 values"));
    assert!(message.contains("expected 2"));
}

#[test]
fn test_only_mismatch_is_a_contract_violation()
{
    assert!(LoadError::Cancelled.is_recoverable());
    assert!(LoadError::Unresolvable(String::new()).is_recoverable());
    assert!(LoadError::UnsupportedLayout {
        type_name: "Fixed".to_string(),
        size: 2
    }
    .is_recoverable());
    assert!(!LoadError::ConverterMismatch { expected: 2, actual: 1 }.is_recoverable());
}

#[test]
fn test_or_absent()
{
    let ok: LoadResult<u8> = Ok(7);
    assert_eq!(ok.or_absent("x"), Ok(Some(7)));

    let recoverable: LoadResult<u8> = Err(LoadError::Cancelled);
    assert_eq!(recoverable.or_absent("x"), Ok(None));

    let violation: LoadResult<u8> = Err(LoadError::ConverterMismatch { expected: 2, actual: 4 });
    assert!(violation.or_absent("x").is_err());
}

#[test]
fn test_session_error_from_json()
{
    let json_err = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
    let error: SessionError = json_err.into();
    assert!(matches!(error, SessionError::Snapshot(_)));
}

#[test]
fn test_definition_error_from_io()
{
    let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
    let error: DefinitionError = io_err.into();
    assert!(format!("{}", error).contains("gone"));
}

#[test]
fn test_result_type()
{
    // Test that Result type is properly aliased
    let _result: SessionResult<()> = Ok(());
    let _error_result: SessionResult<()> = Err(SessionError::UnreadableMemory {
        address: Address::ZERO,
        len: 1,
    });
}
