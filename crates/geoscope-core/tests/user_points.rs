//! Tests for user-defined point loaders

mod common;

use common::{p1, point_bytes, record_point, registry, CountingMemory};
use geoscope_core::error::LoadError;
use geoscope_core::geometry::{CoordinateSystem, Drawable, Point, Unit};
use geoscope_core::loader::user::UserPoint;
use geoscope_core::loader::PointLoader;
use geoscope_core::memory::{Converter, MemoryReader};
use geoscope_core::session::snapshot::SnapshotSession;
use geoscope_core::session::DebugSession;

#[test]
fn test_p1_memory_path()
{
    let session = p1();
    let reader = MemoryReader::new(&session);
    let point = UserPoint::new("Pt", "mx", "my");

    let loaded = point.load_point_memory(&reader, &session, "p", "Pt").unwrap();
    assert_eq!(loaded, Point::new(3.5, -2.0));
}

#[test]
fn test_p1_through_registry()
{
    let session = p1();
    let reader = MemoryReader::new(&session);
    let (traits, drawable) = registry()
        .load(Some(&reader), &session, "p", &mut || true)
        .unwrap()
        .unwrap();

    assert_eq!(traits.dimension, 2);
    assert_eq!(traits.coordinate_system, CoordinateSystem::Cartesian);
    assert_eq!(traits.unit, Unit::None);
    assert_eq!(drawable, Drawable::Point(Point::new(3.5, -2.0)));
}

#[test]
fn test_memory_and_parsed_paths_agree()
{
    let mut session = SnapshotSession::new().with_type("Pt", 16);
    let values = [(0.1, 1e-300), (-7.25, 123_456.5), (f64::MAX, -0.0)];
    for (index, value) in values.iter().enumerate() {
        let address = 0x3000 + index as u64 * 16;
        record_point(&mut session, &format!("v{index}"), address, *value);
        session.insert_memory(address, point_bytes(&[*value]));
    }

    let reader = MemoryReader::new(&session);
    let point = UserPoint::new("Pt", "mx", "my");
    for index in 0..values.len() {
        let name = format!("v{index}");
        let memory = point.load_point_memory(&reader, &session, &name, "Pt").unwrap();
        let parsed = point.load_point_parsed(&session, &name, "Pt").unwrap();
        assert_eq!(memory, parsed, "{name}");
    }
}

#[test]
fn test_offset_beyond_value_attempts_no_read()
{
    let mut session = p1();
    session.insert_value("p.my", "double", "-2", Some(0x1000 + 24));
    let memory = CountingMemory::new(&session);
    let reader = MemoryReader::new(&memory);
    let point = UserPoint::new("Pt", "mx", "my");

    let err = point.memory_converter(&reader, &session, "p", "Pt").unwrap_err();
    assert!(matches!(err, LoadError::InvalidDescriptor { .. }));
    assert!(point.load_point_memory(&reader, &session, "p", "Pt").is_err());
    assert_eq!(memory.reads(), 0);
}

#[test]
fn test_negative_offset_is_rejected()
{
    let mut session = p1();
    session.insert_value("p.mx", "double", "3.5", Some(0x0ff8));
    let reader = MemoryReader::new(&session);
    let err = UserPoint::new("Pt", "mx", "my")
        .memory_converter(&reader, &session, "p", "Pt")
        .unwrap_err();
    assert!(matches!(err, LoadError::InvalidDescriptor { .. }));
}

#[test]
fn test_converter_spans_members_only()
{
    let session = p1().with_type("Pt", 32);
    let memory = CountingMemory::new(&session);
    let reader = MemoryReader::new(&memory);
    let converter = UserPoint::new("Pt", "mx", "my")
        .memory_converter(&reader, &session, "p", "Pt")
        .unwrap();

    assert_eq!(converter.value_count(), 2);
    assert_eq!(converter.byte_size(), 32);
    assert_eq!(converter.span(), 16);
}

#[test]
fn test_unreadable_memory_falls_back_to_parsed()
{
    let mut session = SnapshotSession::new().with_type("Pt", 16);
    record_point(&mut session, "p", 0x9000, (5.0, 6.0));
    let reader = MemoryReader::new(&session);
    let point = UserPoint::new("Pt", "mx", "my");

    assert!(matches!(
        point.load_point_memory(&reader, &session, "p", "Pt"),
        Err(LoadError::ReadFailure { .. })
    ));
    assert_eq!(
        point.load_point(Some(&reader), &session, "p", "Pt").unwrap(),
        Some(Point::new(5.0, 6.0))
    );
}

#[test]
fn test_missing_member_is_no_value()
{
    let mut session = p1();
    session.remove_value("p.my");
    let reader = MemoryReader::new(&session);
    let point = UserPoint::new("Pt", "mx", "my");

    assert!(point.initialize(&session, "p").is_none());
    assert_eq!(point.load_point(Some(&reader), &session, "p", "Pt").unwrap(), None);
}

#[test]
fn test_optimized_value_without_address_uses_parsed()
{
    let session = SnapshotSession::new()
        .with_type("Pt", 16)
        .with_value("p", "Pt", "{...}", None)
        .with_value("p.mx", "double", "1", None)
        .with_value("p.my", "double", "2", None);
    let reader = MemoryReader::new(&session);

    assert_eq!(session.value_address("p"), None);
    let (_, drawable) = registry()
        .load(Some(&reader), &session, "p", &mut || true)
        .unwrap()
        .unwrap();
    assert_eq!(drawable, Drawable::Point(Point::new(1.0, 2.0)));
}

#[test]
fn test_qualified_type_resolves_user_point()
{
    let mut session = p1();
    session.insert_value("p", "const Pt", "{...}", Some(0x1000));
    let reader = MemoryReader::new(&session);
    let loaded = registry().load(Some(&reader), &session, "p", &mut || true).unwrap();
    assert!(loaded.is_some());
}
