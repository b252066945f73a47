//! Byte-level converters.
//!
//! A converter knows how many `f64` values one instance of a type yields and
//! how to decode them from the instance's bytes. Three shapes cover every
//! loader:
//!
//! - [`NumericConverter`]: one primitive (float or integer of a given width)
//! - [`StructConverter`]: primitives at byte offsets inside an aggregate
//! - [`ArrayConverter`]: consecutive instances of another converter
//!
//! Byte order is little-endian, matching the targets the host debuggers run.

use std::fmt;

use smallvec::SmallVec;

use crate::error::{LoadError, LoadResult};

/// Decoder for a fixed-size instance.
pub trait Converter: fmt::Debug + Send + Sync
{
    /// Values produced per instance.
    fn value_count(&self) -> usize;

    /// Distance in bytes between consecutive instances.
    fn byte_size(&self) -> usize;

    /// Bytes of one instance that are actually decoded.
    ///
    /// Never larger than [`byte_size`](Converter::byte_size). Reads of a
    /// single instance only fetch this many bytes.
    fn span(&self) -> usize
    {
        self.byte_size()
    }

    /// Decode one instance.
    ///
    /// `bytes` holds at least [`span`](Converter::span) bytes and `out`
    /// exactly [`value_count`](Converter::value_count) slots.
    fn convert(&self, bytes: &[u8], out: &mut [f64]);
}

/// Class of a primitive numeric type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NumericKind
{
    /// IEEE 754 float
    Float,
    /// Two's complement signed integer
    Signed,
    /// Unsigned integer
    Unsigned,
}

impl NumericKind
{
    /// Classify a primitive type name.
    ///
    /// Recognizes C/C++, C# / CLR and Rust spellings. Returns `None` for
    /// anything that is not a plain number (pointers, aggregates, `bool`).
    #[must_use]
    pub fn classify(type_name: &str) -> Option<Self>
    {
        let name = strip_qualifiers(type_name);
        let kind = match name.as_str() {
            "float" | "double" | "long double" | "System.Single" | "System.Double" | "f32" | "f64" => Self::Float,
            "char" | "signed char" | "short" | "short int" | "signed short" | "int" | "signed" | "signed int" | "long"
            | "long int" | "signed long" | "long long" | "signed long long" | "__int8" | "__int16" | "__int32"
            | "__int64" | "int8_t" | "int16_t" | "int32_t" | "int64_t" | "std::int8_t" | "std::int16_t"
            | "std::int32_t" | "std::int64_t" | "sbyte" | "System.SByte" | "System.Int16" | "System.Int32"
            | "System.Int64" | "i8" | "i16" | "i32" | "i64" | "isize" | "ptrdiff_t" | "std::ptrdiff_t" => {
                Self::Signed
            }
            "unsigned char" | "unsigned short" | "unsigned short int" | "unsigned" | "unsigned int" | "unsigned long"
            | "unsigned long int" | "unsigned long long" | "unsigned __int8" | "unsigned __int16"
            | "unsigned __int32" | "unsigned __int64" | "uint8_t" | "uint16_t" | "uint32_t" | "uint64_t"
            | "std::uint8_t" | "std::uint16_t" | "std::uint32_t" | "std::uint64_t" | "size_t" | "std::size_t"
            | "byte" | "ushort" | "uint" | "ulong" | "System.Byte" | "System.UInt16" | "System.UInt32"
            | "System.UInt64" | "u8" | "u16" | "u32" | "u64" | "usize" => Self::Unsigned,
            _ => return None,
        };
        Some(kind)
    }
}

fn strip_qualifiers(type_name: &str) -> String
{
    type_name
        .split_whitespace()
        .filter(|word| !matches!(*word, "const" | "volatile"))
        .collect::<Vec<_>>()
        .join(" ")
}

/// Decoder for one primitive number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NumericConverter
{
    kind: NumericKind,
    size: usize,
}

impl NumericConverter
{
    /// Converter for a primitive type name of the given byte size.
    ///
    /// Floats must be 4 or 8 bytes and integers 1, 2, 4 or 8 bytes; any
    /// other combination is unsupported.
    ///
    /// ```rust
    /// use geoscope_core::memory::NumericConverter;
    ///
    /// assert!(NumericConverter::new("double", 8).is_some());
    /// assert!(NumericConverter::new("const unsigned short", 2).is_some());
    /// assert!(NumericConverter::new("double", 10).is_none());
    /// assert!(NumericConverter::new("std::string", 32).is_none());
    /// ```
    #[must_use]
    pub fn new(type_name: &str, size: usize) -> Option<Self>
    {
        let kind = NumericKind::classify(type_name)?;
        Self::with_kind(kind, size)
    }

    /// Converter for a numeric class of the given byte size.
    #[must_use]
    pub fn with_kind(kind: NumericKind, size: usize) -> Option<Self>
    {
        let supported = match kind {
            NumericKind::Float => matches!(size, 4 | 8),
            NumericKind::Signed | NumericKind::Unsigned => matches!(size, 1 | 2 | 4 | 8),
        };
        supported.then_some(Self { kind, size })
    }

    /// Numeric class.
    #[must_use]
    pub fn kind(&self) -> NumericKind
    {
        self.kind
    }

    /// Decode one value from the start of `bytes`.
    #[allow(clippy::cast_precision_loss)]
    #[must_use]
    pub fn decode(&self, bytes: &[u8]) -> f64
    {
        match (self.kind, self.size) {
            (NumericKind::Float, 4) => f64::from(f32::from_le_bytes(le(bytes))),
            (NumericKind::Float, _) => f64::from_le_bytes(le(bytes)),
            (NumericKind::Signed, 1) => f64::from(i8::from_le_bytes(le(bytes))),
            (NumericKind::Signed, 2) => f64::from(i16::from_le_bytes(le(bytes))),
            (NumericKind::Signed, 4) => f64::from(i32::from_le_bytes(le(bytes))),
            (NumericKind::Signed, _) => i64::from_le_bytes(le(bytes)) as f64,
            (NumericKind::Unsigned, 1) => f64::from(u8::from_le_bytes(le(bytes))),
            (NumericKind::Unsigned, 2) => f64::from(u16::from_le_bytes(le(bytes))),
            (NumericKind::Unsigned, 4) => f64::from(u32::from_le_bytes(le(bytes))),
            (NumericKind::Unsigned, _) => u64::from_le_bytes(le(bytes)) as f64,
        }
    }
}

fn le<const N: usize>(bytes: &[u8]) -> [u8; N]
{
    let mut buffer = [0u8; N];
    buffer.copy_from_slice(&bytes[..N]);
    buffer
}

impl Converter for NumericConverter
{
    fn value_count(&self) -> usize
    {
        1
    }

    fn byte_size(&self) -> usize
    {
        self.size
    }

    fn convert(&self, bytes: &[u8], out: &mut [f64])
    {
        out[0] = self.decode(bytes);
    }
}

/// A primitive member of an aggregate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Member
{
    converter: NumericConverter,
    offset: usize,
}

impl Member
{
    /// Member decoded by `converter` at `offset` bytes into the aggregate.
    #[must_use]
    pub fn new(converter: NumericConverter, offset: usize) -> Self
    {
        Self { converter, offset }
    }

    /// Byte offset inside the aggregate.
    #[must_use]
    pub fn offset(&self) -> usize
    {
        self.offset
    }

    fn end(&self) -> usize
    {
        self.offset + self.converter.byte_size()
    }
}

/// Decoder for an aggregate whose values are primitives at known offsets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StructConverter
{
    byte_size: usize,
    members: SmallVec<[Member; 2]>,
}

impl StructConverter
{
    /// Converter for an aggregate of `byte_size` bytes.
    ///
    /// ## Errors
    ///
    /// Returns `LoadError::InvalidDescriptor` if a member does not fit
    /// inside the aggregate or no member is given.
    pub fn new(byte_size: usize, members: impl IntoIterator<Item = Member>) -> LoadResult<Self>
    {
        let members: SmallVec<[Member; 2]> = members.into_iter().collect();
        if members.is_empty() {
            return Err(invalid(byte_size, "aggregate without members".to_string()));
        }
        if let Some(member) = members.iter().find(|member| member.end() > byte_size) {
            return Err(invalid(
                byte_size,
                format!("member at offset {} ends at byte {}", member.offset, member.end()),
            ));
        }
        Ok(Self { byte_size, members })
    }

    /// Members in value order.
    #[must_use]
    pub fn members(&self) -> &[Member]
    {
        &self.members
    }
}

fn invalid(byte_size: usize, reason: String) -> LoadError
{
    LoadError::InvalidDescriptor {
        name: format!("{byte_size}-byte aggregate"),
        reason,
    }
}

impl Converter for StructConverter
{
    fn value_count(&self) -> usize
    {
        self.members.len()
    }

    fn byte_size(&self) -> usize
    {
        self.byte_size
    }

    fn span(&self) -> usize
    {
        self.members.iter().map(Member::end).max().unwrap_or(0)
    }

    fn convert(&self, bytes: &[u8], out: &mut [f64])
    {
        for (slot, member) in out.iter_mut().zip(&self.members) {
            *slot = member.converter.decode(&bytes[member.offset..]);
        }
    }
}

/// Decoder for `count` consecutive instances of another converter.
#[derive(Debug, Clone, Copy)]
pub struct ArrayConverter<'a>
{
    element: &'a dyn Converter,
    count: usize,
}

impl<'a> ArrayConverter<'a>
{
    /// Converter for `count` elements laid out with the element's byte size as stride.
    #[must_use]
    pub fn new(element: &'a dyn Converter, count: usize) -> Self
    {
        Self { element, count }
    }

    /// Number of elements.
    #[must_use]
    pub fn count(&self) -> usize
    {
        self.count
    }
}

impl Converter for ArrayConverter<'_>
{
    fn value_count(&self) -> usize
    {
        self.element.value_count() * self.count
    }

    fn byte_size(&self) -> usize
    {
        self.element.byte_size() * self.count
    }

    fn span(&self) -> usize
    {
        match self.count {
            0 => 0,
            count => (count - 1) * self.element.byte_size() + self.element.span(),
        }
    }

    fn convert(&self, bytes: &[u8], out: &mut [f64])
    {
        let stride = self.element.byte_size();
        let values = self.element.value_count();
        for (index, chunk) in out.chunks_mut(values).take(self.count).enumerate() {
            self.element.convert(&bytes[index * stride..], chunk);
        }
    }
}

#[cfg(test)]
mod tests
{
    use super::*;

    fn double() -> NumericConverter
    {
        NumericConverter::new("double", 8).unwrap()
    }

    #[test]
    fn test_classify_spellings()
    {
        assert_eq!(NumericKind::classify("System.Single"), Some(NumericKind::Float));
        assert_eq!(NumericKind::classify("const   int"), Some(NumericKind::Signed));
        assert_eq!(NumericKind::classify("unsigned __int64"), Some(NumericKind::Unsigned));
        assert_eq!(NumericKind::classify("u16"), Some(NumericKind::Unsigned));
        assert_eq!(NumericKind::classify("bool"), None);
        assert_eq!(NumericKind::classify("double*"), None);
    }

    #[test]
    fn test_decode_widths()
    {
        let i16c = NumericConverter::new("short", 2).unwrap();
        assert_eq!(i16c.decode(&(-300i16).to_le_bytes()), -300.0);

        let u8c = NumericConverter::new("unsigned char", 1).unwrap();
        assert_eq!(u8c.decode(&[250]), 250.0);

        let f32c = NumericConverter::new("float", 4).unwrap();
        assert_eq!(f32c.decode(&1.25f32.to_le_bytes()), 1.25);

        let i64c = NumericConverter::new("long long", 8).unwrap();
        assert_eq!(i64c.decode(&(-7i64).to_le_bytes()), -7.0);
    }

    #[test]
    fn test_unsupported_sizes()
    {
        assert!(NumericConverter::new("float", 2).is_none());
        assert!(NumericConverter::new("int", 3).is_none());
        assert!(NumericConverter::new("int", 16).is_none());
    }

    #[test]
    fn test_struct_member_must_fit()
    {
        let err = StructConverter::new(12, [Member::new(double(), 0), Member::new(double(), 8)]).unwrap_err();
        assert!(matches!(err, LoadError::InvalidDescriptor { .. }));
        assert!(StructConverter::new(16, Vec::<Member>::new()).is_err());
    }

    #[test]
    fn test_struct_span_and_convert()
    {
        let int = NumericConverter::new("int", 4).unwrap();
        let converter = StructConverter::new(24, [Member::new(double(), 8), Member::new(int, 0)]).unwrap();
        assert_eq!(converter.value_count(), 2);
        assert_eq!(converter.byte_size(), 24);
        assert_eq!(converter.span(), 16);

        let mut bytes = Vec::new();
        bytes.extend_from_slice(&9i32.to_le_bytes());
        bytes.extend_from_slice(&[0; 4]);
        bytes.extend_from_slice(&0.5f64.to_le_bytes());
        let mut out = [0.0; 2];
        converter.convert(&bytes, &mut out);
        assert_eq!(out, [0.5, 9.0]);
    }

    #[test]
    fn test_array_span_skips_trailing_padding()
    {
        let element = StructConverter::new(24, [Member::new(double(), 0), Member::new(double(), 8)]).unwrap();
        let array = ArrayConverter::new(&element, 3);
        assert_eq!(array.value_count(), 6);
        assert_eq!(array.byte_size(), 72);
        assert_eq!(array.span(), 64);
        assert_eq!(ArrayConverter::new(&element, 0).span(), 0);
    }
}
