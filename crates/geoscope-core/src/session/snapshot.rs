//! # Snapshot Sessions
//!
//! A frozen, in-memory stand-in for a live debug session.
//!
//! A snapshot records what a debugger would answer at one stop: the values
//! of named expressions, the sizes of types and the bytes of a few memory
//! regions. It implements both [`DebugSession`] and [`ProcessMemory`], so
//! every loader runs against it unchanged.
//!
//! ## JSON format
//!
//! ```json
//! {
//!   "types": { "Pt": 16 },
//!   "values": {
//!     "p":    { "type": "Pt", "address": 4096 },
//!     "p.mx": { "type": "double", "value": "3.5", "address": 4096 },
//!     "p.my": { "type": "double", "value": "-2", "address": 4104 }
//!   },
//!   "memory": [ { "address": 4096, "bytes": [0, 0, 0, 0, 0, 0, 12, 64, 0, 0, 0, 0, 0, 0, 0, 192] } ]
//! }
//! ```
//!
//! Expressions are looked up verbatim; anything not recorded evaluates as
//! invalid, exactly like an out-of-scope name in a real session.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use super::{DebugSession, Evaluation, ProcessMemory};
use crate::error::{SessionError, SessionResult};
use crate::types::Address;

/// A recorded expression value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnapshotValue
{
    /// Declared type
    #[serde(rename = "type")]
    pub type_name: String,
    /// Printed value
    #[serde(default)]
    pub value: String,
    /// Address of the value, if it lives in memory
    #[serde(default)]
    pub address: Option<Address>,
}

/// A recorded span of process memory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnapshotRegion
{
    /// First byte of the region
    pub address: Address,
    /// Contents of the region
    pub bytes: Vec<u8>,
}

impl SnapshotRegion
{
    fn slice(&self, address: Address, len: usize) -> Option<&[u8]>
    {
        let start = usize::try_from(address.value().checked_sub(self.address.value())?).ok()?;
        let end = start.checked_add(len)?;
        self.bytes.get(start..end)
    }
}

/// Debug session backed by recorded data.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnapshotSession
{
    #[serde(default)]
    types: BTreeMap<String, usize>,
    #[serde(default)]
    values: BTreeMap<String, SnapshotValue>,
    #[serde(default)]
    memory: Vec<SnapshotRegion>,
}

impl SnapshotSession
{
    /// Create an empty snapshot.
    #[must_use]
    pub fn new() -> Self
    {
        Self::default()
    }

    /// Decode a snapshot from JSON text.
    ///
    /// ## Errors
    ///
    /// Returns `SessionError::Snapshot` if the text is not a valid snapshot.
    pub fn from_json(text: &str) -> SessionResult<Self>
    {
        Ok(serde_json::from_str(text)?)
    }

    /// Read and decode a snapshot file.
    ///
    /// ## Errors
    ///
    /// Returns `SessionError::Io` if the file cannot be read and
    /// `SessionError::Snapshot` if it is not a valid snapshot.
    pub fn from_path(path: impl AsRef<Path>) -> SessionResult<Self>
    {
        let text = std::fs::read_to_string(path)?;
        Self::from_json(&text)
    }

    /// Encode the snapshot as pretty JSON.
    ///
    /// ## Errors
    ///
    /// Returns `SessionError::Snapshot` if encoding fails.
    pub fn to_json(&self) -> SessionResult<String>
    {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Record the size of a type.
    #[must_use]
    pub fn with_type(mut self, type_name: impl Into<String>, size: usize) -> Self
    {
        self.types.insert(type_name.into(), size);
        self
    }

    /// Record an expression value.
    #[must_use]
    pub fn with_value(
        mut self,
        expression: impl Into<String>,
        type_name: impl Into<String>,
        value: impl Into<String>,
        address: Option<u64>,
    ) -> Self
    {
        self.insert_value(expression, type_name, value, address);
        self
    }

    /// Record a memory region.
    #[must_use]
    pub fn with_memory(mut self, address: u64, bytes: Vec<u8>) -> Self
    {
        self.insert_memory(address, bytes);
        self
    }

    /// Record an expression value in place.
    pub fn insert_value(
        &mut self,
        expression: impl Into<String>,
        type_name: impl Into<String>,
        value: impl Into<String>,
        address: Option<u64>,
    )
    {
        self.values.insert(
            expression.into(),
            SnapshotValue {
                type_name: type_name.into(),
                value: value.into(),
                address: address.map(Address::new),
            },
        );
    }

    /// Record a memory region in place.
    pub fn insert_memory(&mut self, address: u64, bytes: Vec<u8>)
    {
        self.memory.push(SnapshotRegion {
            address: Address::new(address),
            bytes,
        });
    }

    /// Forget a recorded expression, as if it went out of scope.
    pub fn remove_value(&mut self, expression: &str) -> Option<SnapshotValue>
    {
        self.values.remove(expression)
    }
}

impl DebugSession for SnapshotSession
{
    fn evaluate(&self, expression: &str) -> Evaluation
    {
        match self.values.get(expression.trim()) {
            Some(value) => Evaluation::valid(value.type_name.clone(), value.value.clone(), value.address),
            None => Evaluation::invalid(),
        }
    }

    fn type_size(&self, type_name: &str) -> Option<usize>
    {
        let name = type_name.trim();
        self.types
            .get(name)
            .copied()
            .or_else(|| primitive_size(name))
            .filter(|size| *size > 0)
    }
}

impl ProcessMemory for SnapshotSession
{
    fn read_memory(&self, address: Address, len: usize) -> SessionResult<Vec<u8>>
    {
        self.memory
            .iter()
            .find_map(|region| region.slice(address, len))
            .map(<[u8]>::to_vec)
            .ok_or(SessionError::UnreadableMemory { address, len })
    }
}

/// Sizes of the primitive types every host debugger knows without being told.
fn primitive_size(type_name: &str) -> Option<usize>
{
    let size = match type_name {
        "char" | "signed char" | "unsigned char" | "bool" | "byte" | "sbyte" | "i8" | "u8" => 1,
        "short" | "unsigned short" | "ushort" | "i16" | "u16" => 2,
        "int" | "unsigned int" | "float" | "uint" | "i32" | "u32" | "f32" => 4,
        "long long" | "unsigned long long" | "double" | "__int64" | "long" | "ulong" | "i64" | "u64" | "f64" => 8,
        _ => return None,
    };
    Some(size)
}

#[cfg(test)]
mod tests
{
    use super::*;

    #[test]
    fn test_unknown_expression_is_invalid()
    {
        let session = SnapshotSession::new();
        assert!(!session.evaluate("nothing").valid);
    }

    #[test]
    fn test_type_size_prefers_recorded()
    {
        let session = SnapshotSession::new().with_type("double", 16).with_type("Empty", 0);
        assert_eq!(session.type_size("double"), Some(16));
        assert_eq!(session.type_size("float"), Some(4));
        assert_eq!(session.type_size("Empty"), None);
        assert_eq!(session.type_size("Unknown"), None);
    }

    #[test]
    fn test_read_within_region()
    {
        let session = SnapshotSession::new().with_memory(0x100, vec![1, 2, 3, 4]);
        assert_eq!(session.read_memory(Address::new(0x101), 2).unwrap(), vec![2, 3]);
        assert!(session.read_memory(Address::new(0x103), 2).is_err());
        assert!(session.read_memory(Address::new(0x0ff), 1).is_err());
    }

    #[test]
    fn test_json_round_trip_keeps_values()
    {
        let session = SnapshotSession::new()
            .with_type("Pt", 16)
            .with_value("p", "Pt", "{...}", Some(0x1000))
            .with_memory(0x1000, vec![0; 16]);
        let text = session.to_json().unwrap();
        let decoded = SnapshotSession::from_json(&text).unwrap();
        assert_eq!(decoded, session);
    }

    #[test]
    fn test_from_json_defaults()
    {
        let session = SnapshotSession::from_json(r#"{ "values": { "x": { "type": "int" } } }"#).unwrap();
        let evaluation = session.evaluate("x");
        assert!(evaluation.valid);
        assert_eq!(evaluation.value, "");
        assert_eq!(evaluation.address, None);
    }
}
