//! Built-in container loaders.
//!
//! Both shapes store their elements contiguously, so the memory path reads
//! them in blocks of [`BLOCK_ELEMENTS`] through an [`ArrayConverter`].

use tracing::trace;

use super::{ContainerLoader, LoaderInfo};
use crate::error::{LoadError, LoadResult};
use crate::memory::{ArrayConverter, Converter, MemoryReader};
use crate::session::DebugSession;
use crate::types::{split_array_type, template_arguments, Address};

/// Maximum number of elements decoded by one memory read.
pub const BLOCK_ELEMENTS: usize = 1024;

// 2^53: above this an f64 no longer holds every integer exactly.
const MAX_EXACT_SIZE: f64 = 9_007_199_254_740_992.0;

/// C array `T[N]`.
#[derive(Debug, Clone, Copy, Default)]
pub struct CArray;

impl LoaderInfo for CArray
{
    fn id(&self) -> &str
    {
        "T[N]"
    }

    fn matches(&self, _name: &str, type_name: &str, _id: &str) -> bool
    {
        split_array_type(type_name).is_some()
    }
}

impl ContainerLoader for CArray
{
    fn element_type(&self, _session: &dyn DebugSession, container_type: &str) -> Option<String>
    {
        split_array_type(container_type).map(|(element, _)| element)
    }

    fn element_name(&self, name: &str, _element_type: &str) -> String
    {
        element_at(name, 0)
    }

    fn size(&self, session: &dyn DebugSession, name: &str) -> Option<usize>
    {
        let type_name = session.value_type(name)?;
        split_array_type(&type_name).map(|(_, extent)| extent)
    }

    fn for_each_element(
        &self,
        session: &dyn DebugSession,
        name: &str,
        visit: &mut dyn FnMut(&str) -> LoadResult<()>,
    ) -> LoadResult<()>
    {
        let size = self
            .size(session, name)
            .ok_or_else(|| LoadError::Unresolvable(name.to_string()))?;
        (0..size).try_for_each(|index| visit(&element_at(name, index)))
    }

    fn for_each_memory_block(
        &self,
        reader: &MemoryReader<'_>,
        session: &dyn DebugSession,
        name: &str,
        type_name: &str,
        element: &dyn Converter,
        visit: &mut dyn FnMut(&[f64]) -> LoadResult<()>,
    ) -> LoadResult<()>
    {
        let size = split_array_type(type_name)
            .map(|(_, extent)| extent)
            .ok_or_else(|| LoadError::Unresolvable(name.to_string()))?;
        if size == 0 {
            return Ok(());
        }
        let address = session
            .value_address(name)
            .ok_or_else(|| LoadError::Unresolvable(name.to_string()))?;
        read_contiguous(reader, address, size, element, visit)
    }
}

/// `std::vector<T>` and other dynamic arrays answering `size()` and `[i]`.
#[derive(Debug, Clone, Copy, Default)]
pub struct StdVector;

impl LoaderInfo for StdVector
{
    fn id(&self) -> &str
    {
        "std::vector"
    }
}

impl ContainerLoader for StdVector
{
    fn element_type(&self, _session: &dyn DebugSession, container_type: &str) -> Option<String>
    {
        template_arguments(container_type).into_iter().next()
    }

    fn element_name(&self, name: &str, _element_type: &str) -> String
    {
        element_at(name, 0)
    }

    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    fn size(&self, session: &dyn DebugSession, name: &str) -> Option<usize>
    {
        let size = session.load_f64(&format!("{name}.size()"))?;
        let valid = (0.0..MAX_EXACT_SIZE).contains(&size) && size.fract() == 0.0;
        if !valid {
            trace!(container = name, size, "implausible vector size");
        }
        valid.then_some(size as usize)
    }

    fn for_each_element(
        &self,
        session: &dyn DebugSession,
        name: &str,
        visit: &mut dyn FnMut(&str) -> LoadResult<()>,
    ) -> LoadResult<()>
    {
        let size = self
            .size(session, name)
            .ok_or_else(|| LoadError::Unresolvable(format!("{name}.size()")))?;
        (0..size).try_for_each(|index| visit(&element_at(name, index)))
    }

    fn for_each_memory_block(
        &self,
        reader: &MemoryReader<'_>,
        session: &dyn DebugSession,
        name: &str,
        _type_name: &str,
        element: &dyn Converter,
        visit: &mut dyn FnMut(&[f64]) -> LoadResult<()>,
    ) -> LoadResult<()>
    {
        let size = self
            .size(session, name)
            .ok_or_else(|| LoadError::Unresolvable(format!("{name}.size()")))?;
        if size == 0 {
            return Ok(());
        }
        let first = element_at(name, 0);
        let address = session.value_address(&first).ok_or(LoadError::Unresolvable(first))?;
        read_contiguous(reader, address, size, element, visit)
    }
}

fn element_at(name: &str, index: usize) -> String
{
    format!("{name}[{index}]")
}

/// Decode `count` consecutive elements starting at `address`, block by block.
fn read_contiguous(
    reader: &MemoryReader<'_>,
    address: Address,
    count: usize,
    element: &dyn Converter,
    visit: &mut dyn FnMut(&[f64]) -> LoadResult<()>,
) -> LoadResult<()>
{
    let stride = element.byte_size();
    let values = element.value_count();
    let Some(len) = count.checked_mul(stride) else {
        trace!(%address, count, stride, "container span overflows");
        return Err(LoadError::ReadFailure { address, len: usize::MAX });
    };
    let mut buffer = vec![0.0; count.min(BLOCK_ELEMENTS) * values];

    let mut done: usize = 0;
    while done < count {
        let block = (count - done).min(BLOCK_ELEMENTS);
        // done < count, so done * stride <= len
        let block_address = u64::try_from(done * stride)
            .ok()
            .and_then(|offset| address.checked_add(offset))
            .ok_or_else(|| LoadError::ReadFailure { address, len })?;

        trace!(%block_address, block, "reading block");
        let converter = ArrayConverter::new(element, block);
        let out = &mut buffer[..block * values];
        reader.read(block_address, out, &converter)?;
        visit(out)?;
        done += block;
    }
    Ok(())
}

#[cfg(test)]
mod tests
{
    use super::*;
    use crate::session::snapshot::SnapshotSession;

    #[test]
    fn test_carray_matches_arrays_only()
    {
        assert!(CArray.matches("a", "Pt[3]", "Pt[3]"));
        assert!(!CArray.matches("a", "Pt", "Pt"));
    }

    #[test]
    fn test_carray_enumerates_elements()
    {
        let session = SnapshotSession::new().with_value("a", "int[3]", "{...}", Some(0x10));
        let mut names = Vec::new();
        CArray
            .for_each_element(&session, "a", &mut |element| {
                names.push(element.to_string());
                Ok(())
            })
            .unwrap();
        assert_eq!(names, vec!["a[0]", "a[1]", "a[2]"]);
    }

    #[test]
    fn test_vector_element_type_and_size()
    {
        let session = SnapshotSession::new().with_value("v.size()", "unsigned long long", "4", None);
        let element = StdVector.element_type(&session, "std::vector<Pt,std::allocator<Pt> >");
        assert_eq!(element.as_deref(), Some("Pt"));
        assert_eq!(StdVector.size(&session, "v"), Some(4));
        assert_eq!(StdVector.size(&session, "w"), None);
    }

    #[test]
    fn test_blocks_split_large_containers()
    {
        let count = BLOCK_ELEMENTS + 3;
        let bytes: Vec<u8> = (0..count).map(|index| (index % 251) as u8).collect();
        let session = SnapshotSession::new()
            .with_value("a", format!("unsigned char[{count}]"), "{...}", Some(0x4000))
            .with_memory(0x4000, bytes);
        let reader = MemoryReader::new(&session);
        let element = reader.numeric_converter("unsigned char", 1).unwrap();

        let mut blocks = Vec::new();
        let mut decoded = Vec::new();
        CArray
            .for_each_memory_block(
                &reader,
                &session,
                "a",
                &format!("unsigned char[{count}]"),
                &element,
                &mut |values| {
                    blocks.push(values.len());
                    decoded.extend_from_slice(values);
                    Ok(())
                },
            )
            .unwrap();

        assert_eq!(blocks, vec![BLOCK_ELEMENTS, 3]);
        assert_eq!(decoded.len(), count);
        assert_eq!(decoded[BLOCK_ELEMENTS], (BLOCK_ELEMENTS % 251) as f64);
    }

    #[test]
    fn test_vector_size_rejects_inexact_values()
    {
        let session = SnapshotSession::new()
            .with_value("big.size()", "unsigned long long", "9007199254740992", None)
            .with_value("huge.size()", "unsigned long long", "1152921504606846976", None)
            .with_value("edge.size()", "unsigned long long", "9007199254740991", None)
            .with_value("neg.size()", "long long", "-1", None);
        assert_eq!(StdVector.size(&session, "big"), None);
        assert_eq!(StdVector.size(&session, "huge"), None);
        assert_eq!(StdVector.size(&session, "neg"), None);
        assert_eq!(StdVector.size(&session, "edge"), Some(9_007_199_254_740_991));
    }

    #[test]
    fn test_overflowing_span_is_a_read_failure()
    {
        let count = usize::MAX / 8 + 1;
        let type_name = format!("double[{count}]");
        let session = SnapshotSession::new()
            .with_value("a", type_name.as_str(), "{...}", Some(0x4000))
            .with_memory(0x4000, 1.0f64.to_le_bytes().to_vec());
        let reader = MemoryReader::new(&session);
        let element = reader.numeric_converter("double", 8).unwrap();

        let mut visited = 0;
        let err = CArray
            .for_each_memory_block(&reader, &session, "a", &type_name, &element, &mut |_| {
                visited += 1;
                Ok(())
            })
            .unwrap_err();
        assert!(matches!(err, LoadError::ReadFailure { .. }));
        assert!(err.is_recoverable());
        assert_eq!(visited, 0);
    }
}
