//! # Memory Reader
//!
//! Bulk decoding of process memory without per-value expression evaluation.
//!
//! The reader pairs a [`ProcessMemory`] with a [`Converter`]: it fetches the
//! bytes of one or more instances in a single read and demultiplexes them
//! into `f64` values. A failed read fails the whole request; callers never
//! see partially decoded values.
//!
//! ## Example
//!
//! ```rust
//! use geoscope_core::memory::{Member, MemoryReader, StructConverter};
//! use geoscope_core::session::snapshot::SnapshotSession;
//! use geoscope_core::types::Address;
//!
//! let mut bytes = 3.5f64.to_le_bytes().to_vec();
//! bytes.extend_from_slice(&(-2.0f64).to_le_bytes());
//! let session = SnapshotSession::new().with_memory(0x1000, bytes);
//!
//! let reader = MemoryReader::new(&session);
//! let double = reader.numeric_converter("double", 8).unwrap();
//! let point = StructConverter::new(16, [Member::new(double, 0), Member::new(double, 8)]).unwrap();
//!
//! let mut values = [0.0; 2];
//! reader.read(Address::new(0x1000), &mut values, &point).unwrap();
//! assert_eq!(values, [3.5, -2.0]);
//! ```

mod converter;

use std::fmt;

pub use converter::{ArrayConverter, Converter, Member, NumericConverter, NumericKind, StructConverter};
use tracing::trace;

use crate::error::{LoadError, LoadResult};
use crate::session::ProcessMemory;
use crate::types::Address;

/// Reads and decodes instances from process memory.
#[derive(Clone, Copy)]
pub struct MemoryReader<'a>
{
    memory: &'a dyn ProcessMemory,
}

impl fmt::Debug for MemoryReader<'_>
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
    {
        f.debug_struct("MemoryReader").finish_non_exhaustive()
    }
}

impl<'a> MemoryReader<'a>
{
    /// Create a reader over the given process memory.
    pub fn new(memory: &'a dyn ProcessMemory) -> Self
    {
        Self { memory }
    }

    /// Converter for a primitive numeric type, `None` when unsupported.
    #[must_use]
    pub fn numeric_converter(&self, type_name: &str, size: usize) -> Option<NumericConverter>
    {
        NumericConverter::new(type_name, size)
    }

    /// Decode consecutive instances starting at `address` into `out`.
    ///
    /// `out` holds a whole number of instances; instances are `byte_size()`
    /// apart. One memory read covers all of them, ending at the last byte
    /// actually decoded.
    ///
    /// ## Errors
    ///
    /// - `ConverterMismatch`: `out.len()` is not a multiple of the converter's value count
    /// - `ReadFailure`: the memory could not be read
    pub fn read(&self, address: Address, out: &mut [f64], converter: &dyn Converter) -> LoadResult<()>
    {
        let values = converter.value_count();
        if values == 0 || out.len() % values != 0 {
            return Err(LoadError::ConverterMismatch {
                expected: out.len(),
                actual: values,
            });
        }

        let instances = out.len() / values;
        if instances == 0 {
            return Ok(());
        }

        let stride = converter.byte_size();
        let len = (instances - 1) * stride + converter.span();
        let bytes = self.memory.read_memory(address, len).map_err(|err| {
            trace!(%address, len, "memory read failed: {err}");
            LoadError::ReadFailure { address, len }
        })?;
        if bytes.len() < len {
            return Err(LoadError::ReadFailure { address, len });
        }

        for (index, chunk) in out.chunks_mut(values).enumerate() {
            converter.convert(&bytes[index * stride..], chunk);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests
{
    use std::cell::Cell;

    use super::*;
    use crate::error::SessionResult;

    /// Memory that records the spans requested from it.
    struct Recording
    {
        bytes: Vec<u8>,
        last: Cell<Option<(Address, usize)>>,
    }

    impl ProcessMemory for Recording
    {
        fn read_memory(&self, address: Address, len: usize) -> SessionResult<Vec<u8>>
        {
            self.last.set(Some((address, len)));
            let start = usize::try_from(address.value()).unwrap();
            Ok(self.bytes[start..start + len].to_vec())
        }
    }

    fn recording(bytes: Vec<u8>) -> Recording
    {
        Recording {
            bytes,
            last: Cell::new(None),
        }
    }

    #[test]
    fn test_single_read_of_minimal_span()
    {
        let memory = recording((0u8..64).collect());
        let reader = MemoryReader::new(&memory);
        let byte = reader.numeric_converter("unsigned char", 1).unwrap();
        let converter = StructConverter::new(32, [Member::new(byte, 4), Member::new(byte, 9)]).unwrap();

        let mut out = [0.0; 4];
        reader.read(Address::new(8), &mut out, &converter).unwrap();

        assert_eq!(memory.last.get(), Some((Address::new(8), 32 + 10)));
        assert_eq!(out, [12.0, 17.0, 44.0, 49.0]);
    }

    #[test]
    fn test_value_count_mismatch()
    {
        let memory = recording(vec![0; 16]);
        let reader = MemoryReader::new(&memory);
        let double = reader.numeric_converter("double", 8).unwrap();
        let converter = StructConverter::new(16, [Member::new(double, 0), Member::new(double, 8)]).unwrap();

        let mut out = [0.0; 3];
        let err = reader.read(Address::new(0), &mut out, &converter).unwrap_err();
        assert_eq!(err, LoadError::ConverterMismatch { expected: 3, actual: 2 });
        assert_eq!(memory.last.get(), None);
    }

    #[test]
    fn test_empty_output_reads_nothing()
    {
        let memory = recording(Vec::new());
        let reader = MemoryReader::new(&memory);
        let double = reader.numeric_converter("double", 8).unwrap();
        reader.read(Address::new(0x10), &mut [], &double).unwrap();
        assert_eq!(memory.last.get(), None);
    }
}
