//! # User-Defined Loaders
//!
//! Loaders built from a user type definition file: a point whose
//! coordinates are two named members, and linestrings, rings and
//! multipoints whose points live in a container reached through a
//! [`MemberPath`].
//!
//! User-defined loaders keep no per-value state. Everything derived from a
//! particular value (member types, sizes, offsets, the member scope of a
//! path) is recomputed on every load, so a loader can be shared between
//! threads and reused across stops of the debugged process.

use std::marker::PhantomData;

use tracing::debug;

use super::range::{ElementSource, PointSequence};
use super::{GeometryLoader, Kind, LoadCallback, LoaderInfo, Loaders, PointLoader};
use crate::error::{LoadError, LoadResult, OrAbsent};
use crate::expression::{member_access, MemberPath, MemberScope};
use crate::geometry::{Drawable, Linestring, MultiPoint, Point, Ring, Traits};
use crate::memory::{Converter, Member, MemoryReader, NumericConverter, StructConverter};
use crate::session::DebugSession;

/// Point type whose coordinates are the members `member_x` and `member_y`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserPoint
{
    id: String,
    member_x: String,
    member_y: String,
}

/// What a session reports about one value of a user point type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PointMembers
{
    /// Declared type of the point
    pub type_name: String,
    /// Byte size of the point, `None` when the session does not know it
    pub size: Option<usize>,
    /// Declared type of the x member
    pub type_x: String,
    /// Declared type of the y member
    pub type_y: String,
}

impl UserPoint
{
    /// Create a loader for the type `id`.
    pub fn new(id: impl Into<String>, member_x: impl Into<String>, member_y: impl Into<String>) -> Self
    {
        Self {
            id: id.into(),
            member_x: member_x.into(),
            member_y: member_y.into(),
        }
    }

    /// Name of the x member.
    #[must_use]
    pub fn member_x(&self) -> &str
    {
        &self.member_x
    }

    /// Name of the y member.
    #[must_use]
    pub fn member_y(&self) -> &str
    {
        &self.member_y
    }

    /// Inspect the value `name` and both of its coordinate members.
    ///
    /// Returns `None` unless all three evaluate.
    pub fn initialize(&self, session: &dyn DebugSession, name: &str) -> Option<PointMembers>
    {
        let value = session.evaluate(name);
        let x = session.evaluate(&member_access(name, &self.member_x));
        let y = session.evaluate(&member_access(name, &self.member_y));
        if !(value.valid && x.valid && y.valid) {
            return None;
        }

        Some(PointMembers {
            size: session.type_size(&value.type_name),
            type_name: value.type_name,
            type_x: x.type_name,
            type_y: y.type_name,
        })
    }

    /// Compute the byte layout of the value `name`.
    ///
    /// Offsets are the address differences between each member and the
    /// value itself and must lie within the value.
    ///
    /// ## Errors
    ///
    /// - `Unresolvable`: the value, a member or an address cannot be evaluated
    /// - `UnsupportedLayout`: a size is unknown or a member is not a plain number
    /// - `InvalidDescriptor`: an offset falls outside the value
    pub fn layout(&self, reader: &MemoryReader<'_>, session: &dyn DebugSession, name: &str) -> LoadResult<StructConverter>
    {
        let members = self
            .initialize(session, name)
            .ok_or_else(|| LoadError::Unresolvable(name.to_string()))?;
        let size = members.size.ok_or_else(|| LoadError::UnsupportedLayout {
            type_name: members.type_name.clone(),
            size: 0,
        })?;

        let name_x = member_access(name, &self.member_x);
        let name_y = member_access(name, &self.member_y);
        let offset_x = member_offset(session, name, &name_x, size)?;
        let offset_y = member_offset(session, name, &name_y, size)?;
        let converter_x = member_converter(reader, session, &members.type_x)?;
        let converter_y = member_converter(reader, session, &members.type_y)?;

        StructConverter::new(size, [Member::new(converter_x, offset_x), Member::new(converter_y, offset_y)]).map_err(
            |err| match err {
                LoadError::InvalidDescriptor { reason, .. } => LoadError::InvalidDescriptor {
                    name: name.to_string(),
                    reason,
                },
                other => other,
            },
        )
    }
}

fn member_offset(session: &dyn DebugSession, name: &str, member: &str, size: usize) -> LoadResult<usize>
{
    let offset = session
        .address_difference(name, member)
        .ok_or_else(|| LoadError::Unresolvable(member.to_string()))?;
    usize::try_from(offset)
        .ok()
        .filter(|offset| *offset <= size)
        .ok_or_else(|| LoadError::InvalidDescriptor {
            name: member.to_string(),
            reason: format!("offset {offset} outside a {size}-byte value"),
        })
}

fn member_converter(reader: &MemoryReader<'_>, session: &dyn DebugSession, type_name: &str) -> LoadResult<NumericConverter>
{
    let size = session.type_size(type_name).ok_or_else(|| LoadError::UnsupportedLayout {
        type_name: type_name.to_string(),
        size: 0,
    })?;
    reader
        .numeric_converter(type_name, size)
        .ok_or_else(|| LoadError::UnsupportedLayout {
            type_name: type_name.to_string(),
            size,
        })
}

impl LoaderInfo for UserPoint
{
    fn id(&self) -> &str
    {
        &self.id
    }

    fn is_user_defined(&self) -> bool
    {
        true
    }

    fn describe(&self) -> Option<String>
    {
        Some(format!("x: {}, y: {}", self.member_x(), self.member_y()))
    }
}

impl PointLoader for UserPoint
{
    fn load_traits(&self, _type_name: &str) -> Option<Traits>
    {
        Some(Traits::cartesian_2d())
    }

    fn load_point_parsed(&self, session: &dyn DebugSession, name: &str, _type_name: &str) -> LoadResult<Point>
    {
        let name_x = member_access(name, &self.member_x);
        let name_y = member_access(name, &self.member_y);
        let x = session.load_f64(&name_x).ok_or(LoadError::Unresolvable(name_x))?;
        let y = session.load_f64(&name_y).ok_or(LoadError::Unresolvable(name_y))?;
        Ok(Point::new(x, y))
    }

    fn memory_converter(
        &self,
        reader: &MemoryReader<'_>,
        session: &dyn DebugSession,
        name: &str,
        _type_name: &str,
    ) -> LoadResult<Box<dyn Converter>>
    {
        Ok(Box::new(self.layout(reader, session, name)?))
    }
}

/// Geometry made of the points stored in a container member.
///
/// The container is located by a [`MemberPath`] relative to the drawn
/// variable; the container's own loader and the point loader of its
/// elements are looked up in the registry on every load.
#[derive(Debug)]
pub struct UserRange<R>
{
    id: String,
    path: MemberPath,
    shape: PhantomData<fn() -> R>,
}

/// User-defined linestring.
pub type UserLinestring = UserRange<Linestring>;
/// User-defined ring.
pub type UserRing = UserRange<Ring>;
/// User-defined multipoint.
pub type UserMultiPoint = UserRange<MultiPoint>;

impl<R: PointSequence> UserRange<R>
{
    /// Create a loader for the type `id` whose points live at `path`.
    pub fn new(id: impl Into<String>, path: MemberPath) -> Self
    {
        Self {
            id: id.into(),
            path,
            shape: PhantomData,
        }
    }

    /// Path of the point container relative to the drawn variable.
    #[must_use]
    pub fn path(&self) -> &MemberPath
    {
        &self.path
    }

    /// Determine which identifiers of the path are members of `name`.
    pub fn initialize(&self, session: &dyn DebugSession, name: &str) -> MemberScope
    {
        let type_name = session.value_type(name);
        self.path.initialize(session, name, type_name.as_deref())
    }

    /// Load the range of the variable `name`.
    ///
    /// The memory path is tried first when a reader is given; any
    /// recoverable failure falls back to loading each element by evaluation.
    /// A cancelled load yields no value without falling back.
    ///
    /// ## Errors
    ///
    /// Only contract violations are returned; unavailable data yields `Ok(None)`.
    pub fn load_range(
        &self,
        registry: &Loaders,
        reader: Option<&MemoryReader<'_>>,
        session: &dyn DebugSession,
        name: &str,
        callback: &mut LoadCallback<'_>,
    ) -> LoadResult<Option<(Traits, R)>>
    {
        let scope = self.initialize(session, name);
        let container = self.path.resolve_in(name, &scope);
        let Some(source) = ElementSource::resolve(registry, session, container) else {
            debug!(name, path = self.path.as_str(), "cannot resolve point container");
            return Ok(None);
        };
        let Some(traits) = source.point.load_traits(&source.element_type) else {
            debug!(name, element_type = %source.element_type, "unsupported point type");
            return Ok(None);
        };

        if let Some(reader) = reader {
            match source.load_memory::<R>(reader, session, callback) {
                Ok(sequence) => return Ok(Some((traits, sequence))),
                Err(LoadError::Cancelled) => {
                    debug!(name, "load cancelled");
                    return Ok(None);
                }
                Err(err) if err.is_recoverable() => {
                    debug!(name, "memory path unavailable, evaluating elements: {err}");
                }
                Err(err) => return Err(err),
            }
        }

        Ok(source
            .load_parsed::<R>(reader, session, callback)
            .or_absent(name)?
            .map(|sequence| (traits, sequence)))
    }
}

impl<R: PointSequence> LoaderInfo for UserRange<R>
{
    fn id(&self) -> &str
    {
        &self.id
    }

    fn is_user_defined(&self) -> bool
    {
        true
    }

    fn describe(&self) -> Option<String>
    {
        Some(format!("points: {}", self.path().as_str()))
    }
}

impl<R: PointSequence> GeometryLoader for UserRange<R>
{
    fn kind(&self) -> Kind
    {
        R::KIND
    }

    fn load(
        &self,
        registry: &Loaders,
        reader: Option<&MemoryReader<'_>>,
        session: &dyn DebugSession,
        name: &str,
        _type_name: &str,
        callback: &mut LoadCallback<'_>,
    ) -> LoadResult<Option<(Traits, Drawable)>>
    {
        Ok(self
            .load_range(registry, reader, session, name, callback)?
            .map(|(traits, sequence)| (traits, sequence.into())))
    }
}
