//! Snapshot fixtures shared by the integration tests

#![allow(dead_code)]

use std::cell::Cell;

use geoscope_core::error::SessionResult;
use geoscope_core::expression::MemberPath;
use geoscope_core::loader::user::{UserLinestring, UserPoint};
use geoscope_core::loader::{Loader, Loaders};
use geoscope_core::session::snapshot::SnapshotSession;
use geoscope_core::session::ProcessMemory;
use geoscope_core::types::Address;

/// Size of the `Pt` fixture type: two doubles.
pub const POINT_SIZE: u64 = 16;

/// Little-endian bytes of consecutive `Pt { mx, my }` values.
pub fn point_bytes(points: &[(f64, f64)]) -> Vec<u8>
{
    points
        .iter()
        .flat_map(|(x, y)| x.to_le_bytes().into_iter().chain(y.to_le_bytes()))
        .collect()
}

/// Record a `Pt` value and both of its members.
pub fn record_point(session: &mut SnapshotSession, name: &str, address: u64, (x, y): (f64, f64))
{
    session.insert_value(name, "Pt", "{...}", Some(address));
    session.insert_value(format!("{name}.mx"), "double", x.to_string(), Some(address));
    session.insert_value(format!("{name}.my"), "double", y.to_string(), Some(address + 8));
}

/// A single `Pt` named `p` at 0x1000 holding (3.5, -2.0).
pub fn p1() -> SnapshotSession
{
    let mut session = SnapshotSession::new().with_type("Pt", 16);
    record_point(&mut session, "p", 0x1000, (3.5, -2.0));
    session.with_memory(0x1000, point_bytes(&[(3.5, -2.0)]))
}

/// A `Line` named `line` whose member `pts` is a `Pt[N]` at `base`.
pub fn line(points: &[(f64, f64)], base: u64) -> SnapshotSession
{
    let mut session = SnapshotSession::new()
        .with_type("Pt", 16)
        .with_value("line", "Line", "{...}", Some(base))
        .with_value("line.pts", format!("Pt[{}]", points.len()), "{...}", Some(base));
    for (index, point) in points.iter().enumerate() {
        record_point(&mut session, &format!("line.pts[{index}]"), base + index as u64 * POINT_SIZE, *point);
    }
    session.with_memory(base, point_bytes(points))
}

/// The three points of scenario L1.
pub const L1: [(f64, f64); 3] = [(0.0, 0.0), (1.0, 1.0), (2.0, 4.0)];

/// Built-ins plus `Pt { mx, my }` and `Line { pts }`.
pub fn registry() -> Loaders
{
    let mut loaders = Loaders::with_builtins();
    loaders.add(Loader::Point(Box::new(UserPoint::new("Pt", "mx", "my"))));
    loaders.add(Loader::Geometry(Box::new(UserLinestring::new("Line", MemberPath::parse("pts")))));
    loaders
}

/// Process memory that counts the reads it serves.
pub struct CountingMemory<'a>
{
    inner: &'a SnapshotSession,
    reads: Cell<usize>,
}

impl<'a> CountingMemory<'a>
{
    pub fn new(inner: &'a SnapshotSession) -> Self
    {
        Self {
            inner,
            reads: Cell::new(0),
        }
    }

    pub fn reads(&self) -> usize
    {
        self.reads.get()
    }
}

impl ProcessMemory for CountingMemory<'_>
{
    fn read_memory(&self, address: Address, len: usize) -> SessionResult<Vec<u8>>
    {
        self.reads.set(self.reads.get() + 1);
        self.inner.read_memory(address, len)
    }
}
