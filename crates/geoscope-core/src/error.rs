//! # Error Types
//!
//! Error handling for the loader engine.
//!
//! We use `thiserror` to automatically generate `Error` trait implementations
//! and nice error messages.
//!
//! Almost every way a load can fail is ordinary data unavailability: the
//! target is optimized, the process moved on, the type is unknown. Those
//! errors are *recoverable* and loaders turn them into "no value" one level
//! up (see [`OrAbsent`]). Only a converter contract violation escapes a load.

use thiserror::Error;

use crate::types::Address;

/// Error type for a single load attempt.
///
/// ## Error Categories
///
/// 1. **Resolution errors**: Unresolvable
/// 2. **Layout errors**: UnsupportedLayout, InvalidDescriptor
/// 3. **Memory errors**: ReadFailure
/// 4. **Control errors**: Cancelled
/// 5. **Contract violations**: ConverterMismatch (never recovered)
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LoadError
{
    /// An expression, type or address could not be determined.
    ///
    /// This happens when:
    /// - The variable is out of scope or optimized away
    /// - A member named in a user type definition doesn't exist
    /// - The session cannot compute an address for the value
    #[error("Unresolvable expression: {0}")]
    Unresolvable(String),

    /// No decoder exists for the type/size combination.
    #[error("Unsupported layout: {type_name} ({size} bytes)")]
    UnsupportedLayout
    {
        /// Declared type of the member
        type_name: String,
        /// Byte size reported by the session
        size: usize,
    },

    /// Computed member offsets fall outside the containing value.
    #[error("Invalid byte layout for {name}: {reason}")]
    InvalidDescriptor
    {
        /// Expression the layout was computed for
        name: String,
        /// What was wrong with it
        reason: String,
    },

    /// The memory read did not complete.
    #[error("Failed to read {len} bytes at {address}")]
    ReadFailure
    {
        /// Start of the requested span
        address: Address,
        /// Length of the requested span
        len: usize,
    },

    /// The load callback asked to abandon the load.
    #[error("Load cancelled")]
    Cancelled,

    /// A converter yields a different number of values than the caller expects.
    ///
    /// This is a programming error in a loader, not a property of the
    /// debugged data, so it is never turned into "no value".
    #[error("Converter yields {actual} values per instance, expected {expected}")]
    ConverterMismatch
    {
        /// Values the caller expected
        expected: usize,
        /// Values the converter produces
        actual: usize,
    },
}

impl LoadError
{
    /// Whether this error means "no value" rather than a broken contract.
    #[must_use]
    pub fn is_recoverable(&self) -> bool
    {
        !matches!(self, Self::ConverterMismatch { .. })
    }
}

/// Errors raised by a debug session or snapshot backend.
#[derive(Error, Debug)]
pub enum SessionError
{
    /// No readable memory backs the requested span.
    #[error("Unreadable memory: {len} bytes at {address}")]
    UnreadableMemory
    {
        /// Start of the requested span
        address: Address,
        /// Length of the requested span
        len: usize,
    },

    /// Snapshot document could not be decoded.
    #[error("Invalid snapshot: {0}")]
    Snapshot(#[from] serde_json::Error),

    /// I/O error (reading a snapshot file, etc.)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors raised while reading a user type definition file.
///
/// Malformed declarations inside a well-formed file are not errors; they are
/// skipped and reported through
/// [`SkippedDeclaration`](crate::user_types::SkippedDeclaration).
#[derive(Error, Debug)]
pub enum DefinitionError
{
    /// The file exists but could not be read.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The file is not well-formed XML.
    #[error("Malformed definition file: {0}")]
    Xml(#[from] roxmltree::Error),
}

/// Convenience type alias for `Result<T, LoadError>`
pub type LoadResult<T> = std::result::Result<T, LoadError>;

/// Convenience type alias for `Result<T, SessionError>`
pub type SessionResult<T> = std::result::Result<T, SessionError>;

/// Convenience type alias for `Result<T, DefinitionError>`
pub type DefinitionResult<T> = std::result::Result<T, DefinitionError>;

/// Turns recoverable load errors into an absent value.
pub trait OrAbsent<T>
{
    /// `Ok(Some(value))` on success, `Ok(None)` for recoverable errors and
    /// `Err` for contract violations. `what` names the expression in logs.
    fn or_absent(self, what: &str) -> LoadResult<Option<T>>;
}

impl<T> OrAbsent<T> for LoadResult<T>
{
    fn or_absent(self, what: &str) -> LoadResult<Option<T>>
    {
        match self {
            Ok(value) => Ok(Some(value)),
            Err(err) if err.is_recoverable() => {
                tracing::debug!(expression = what, "no value: {err}");
                Ok(None)
            }
            Err(err) => Err(err),
        }
    }
}
