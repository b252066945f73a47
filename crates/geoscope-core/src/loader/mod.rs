//! # Loaders
//!
//! Capability objects that turn a named value of the debugged process into
//! a drawable geometry.
//!
//! Every loader belongs to one [`Kind`] and is found through the
//! [`Loaders`] registry by its kind and the value's type name. The three
//! families compose instead of inheriting from one another:
//!
//! - [`PointLoader`]: one coordinate pair, through memory or evaluation
//! - [`ContainerLoader`]: enumerates the elements of a container shape
//! - [`GeometryLoader`]: whole geometries (linestrings, rings, multipoints)
//!   that resolve a container loader and a point loader from the registry on
//!   every load
//!
//! ## Load paths
//!
//! Each loader first tries the memory path when a [`MemoryReader`] is
//! available: compute a byte layout, read whole blocks, decode. When that
//! is impossible (no reader, unknown layout, optimized value, failed read)
//! it falls back to the parsed path, evaluating every coordinate through
//! the session. Both paths produce the same values in the same order.

pub mod containers;
pub mod range;
mod registry;
pub mod user;

use std::fmt;

pub use registry::Loaders;

use crate::error::{LoadError, LoadResult, OrAbsent};
use crate::geometry::{Drawable, Point, Traits};
use crate::memory::{Converter, MemoryReader};
use crate::session::DebugSession;

/// Coarse category used to classify loaders in the registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Kind
{
    /// Single point
    Point,
    /// Container of elements
    Container,
    /// Ordered, connected points
    Linestring,
    /// Ordered points forming a closed boundary
    Ring,
    /// Unconnected points
    MultiPoint,
}

impl Kind
{
    /// Kinds that produce a drawable value, in lookup order.
    pub const DRAWABLE: [Kind; 4] = [Kind::Point, Kind::Linestring, Kind::Ring, Kind::MultiPoint];
}

impl fmt::Display for Kind
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
    {
        let name = match self {
            Kind::Point => "Point",
            Kind::Container => "Container",
            Kind::Linestring => "Linestring",
            Kind::Ring => "Ring",
            Kind::MultiPoint => "MultiPoint",
        };
        f.write_str(name)
    }
}

/// Progress callback invoked once per loaded element.
///
/// Returning `false` abandons the load, which then yields no value.
pub type LoadCallback<'a> = dyn FnMut() -> bool + 'a;

/// Identity shared by every loader.
pub trait LoaderInfo: fmt::Debug + Send + Sync
{
    /// Identifier, unique within the loader's kind.
    ///
    /// For user-defined loaders this is the type id they handle.
    fn id(&self) -> &str;

    /// Whether the loader came from a user type definition file.
    fn is_user_defined(&self) -> bool
    {
        false
    }

    /// Whether this loader handles a value.
    ///
    /// `id` is [`type_id`](crate::types::type_id) of `type_name`. The
    /// default matches the loader id exactly.
    fn matches(&self, name: &str, type_name: &str, id: &str) -> bool
    {
        let _ = (name, type_name);
        id == self.id()
    }

    /// Short account of what the loader reads, such as member names.
    fn describe(&self) -> Option<String>
    {
        None
    }
}

/// Loads a single point.
pub trait PointLoader: LoaderInfo
{
    /// Traits of points of this type, `None` when the type is unsupported.
    fn load_traits(&self, type_name: &str) -> Option<Traits>;

    /// Load a point by evaluating its coordinates.
    ///
    /// ## Errors
    ///
    /// Returns a recoverable error when a coordinate cannot be evaluated.
    fn load_point_parsed(&self, session: &dyn DebugSession, name: &str, type_name: &str) -> LoadResult<Point>;

    /// Build a converter decoding one point from memory.
    ///
    /// The converter must yield exactly two values per instance.
    ///
    /// ## Errors
    ///
    /// Returns a recoverable error when no valid byte layout can be computed.
    fn memory_converter(
        &self,
        reader: &MemoryReader<'_>,
        session: &dyn DebugSession,
        name: &str,
        type_name: &str,
    ) -> LoadResult<Box<dyn Converter>>;

    /// Load a point with one memory read.
    ///
    /// ## Errors
    ///
    /// - `ConverterMismatch`: the converter does not yield two values
    /// - recoverable errors when the layout, address or read is unavailable
    fn load_point_memory(
        &self,
        reader: &MemoryReader<'_>,
        session: &dyn DebugSession,
        name: &str,
        type_name: &str,
    ) -> LoadResult<Point>
    {
        let converter = self.memory_converter(reader, session, name, type_name)?;
        if converter.value_count() != 2 {
            return Err(LoadError::ConverterMismatch {
                expected: 2,
                actual: converter.value_count(),
            });
        }

        let address = session
            .value_address(name)
            .ok_or_else(|| LoadError::Unresolvable(name.to_string()))?;
        let mut values = [0.0; 2];
        reader.read(address, &mut values, converter.as_ref())?;
        Ok(Point::new(values[0], values[1]))
    }

    /// Load a point, preferring memory and falling back to evaluation.
    ///
    /// ## Errors
    ///
    /// Only contract violations are returned; unavailable data yields `Ok(None)`.
    fn load_point(
        &self,
        reader: Option<&MemoryReader<'_>>,
        session: &dyn DebugSession,
        name: &str,
        type_name: &str,
    ) -> LoadResult<Option<Point>>
    {
        if let Some(reader) = reader {
            if let Some(point) = self.load_point_memory(reader, session, name, type_name).or_absent(name)? {
                return Ok(Some(point));
            }
        }
        self.load_point_parsed(session, name, type_name).or_absent(name)
    }

    /// Load a point together with its traits.
    ///
    /// ## Errors
    ///
    /// Only contract violations are returned; unavailable data yields `Ok(None)`.
    fn load(
        &self,
        reader: Option<&MemoryReader<'_>>,
        session: &dyn DebugSession,
        name: &str,
        type_name: &str,
    ) -> LoadResult<Option<(Traits, Point)>>
    {
        let Some(traits) = self.load_traits(type_name) else {
            return Ok(None);
        };
        Ok(self.load_point(reader, session, name, type_name)?.map(|point| (traits, point)))
    }
}

/// Enumerates the elements of one container shape.
pub trait ContainerLoader: LoaderInfo
{
    /// Element type of a container type.
    fn element_type(&self, session: &dyn DebugSession, container_type: &str) -> Option<String>;

    /// Expression naming a representative element, used to compute element layouts.
    fn element_name(&self, name: &str, element_type: &str) -> String;

    /// Number of elements.
    fn size(&self, session: &dyn DebugSession, name: &str) -> Option<usize>;

    /// Visit the expression of every element, in order.
    ///
    /// ## Errors
    ///
    /// Returns the first error of `visit`, or `Unresolvable` when the
    /// container cannot be enumerated.
    fn for_each_element(
        &self,
        session: &dyn DebugSession,
        name: &str,
        visit: &mut dyn FnMut(&str) -> LoadResult<()>,
    ) -> LoadResult<()>;

    /// Decode the elements block by block, in order.
    ///
    /// Each block passed to `visit` holds the values of whole elements.
    ///
    /// ## Errors
    ///
    /// Returns the first error of `visit` or of a memory read, or
    /// `Unresolvable` when the container cannot be located.
    fn for_each_memory_block(
        &self,
        reader: &MemoryReader<'_>,
        session: &dyn DebugSession,
        name: &str,
        type_name: &str,
        element: &dyn Converter,
        visit: &mut dyn FnMut(&[f64]) -> LoadResult<()>,
    ) -> LoadResult<()>;
}

/// Loads a whole geometry.
pub trait GeometryLoader: LoaderInfo
{
    /// Kind of geometry produced.
    fn kind(&self) -> Kind;

    /// Load the geometry named `name` of type `type_name`.
    ///
    /// Collaborating loaders are looked up in `registry`.
    ///
    /// ## Errors
    ///
    /// Only contract violations are returned; unavailable data yields `Ok(None)`.
    fn load(
        &self,
        registry: &Loaders,
        reader: Option<&MemoryReader<'_>>,
        session: &dyn DebugSession,
        name: &str,
        type_name: &str,
        callback: &mut LoadCallback<'_>,
    ) -> LoadResult<Option<(Traits, Drawable)>>;
}

/// A registry entry.
#[derive(Debug)]
pub enum Loader
{
    /// Point loader
    Point(Box<dyn PointLoader>),
    /// Container loader
    Container(Box<dyn ContainerLoader>),
    /// Geometry loader of a drawable kind other than point
    Geometry(Box<dyn GeometryLoader>),
}

impl Loader
{
    /// Kind the entry is registered under.
    #[must_use]
    pub fn kind(&self) -> Kind
    {
        match self {
            Loader::Point(_) => Kind::Point,
            Loader::Container(_) => Kind::Container,
            Loader::Geometry(loader) => loader.kind(),
        }
    }

    /// Identifier of the loader.
    #[must_use]
    pub fn id(&self) -> &str
    {
        match self {
            Loader::Point(loader) => loader.id(),
            Loader::Container(loader) => loader.id(),
            Loader::Geometry(loader) => loader.id(),
        }
    }

    /// Whether the loader came from a user type definition file.
    #[must_use]
    pub fn is_user_defined(&self) -> bool
    {
        match self {
            Loader::Point(loader) => loader.is_user_defined(),
            Loader::Container(loader) => loader.is_user_defined(),
            Loader::Geometry(loader) => loader.is_user_defined(),
        }
    }

    /// Whether the loader handles a value.
    #[must_use]
    pub fn matches(&self, name: &str, type_name: &str, id: &str) -> bool
    {
        match self {
            Loader::Point(loader) => loader.matches(name, type_name, id),
            Loader::Container(loader) => loader.matches(name, type_name, id),
            Loader::Geometry(loader) => loader.matches(name, type_name, id),
        }
    }

    /// Short account of what the loader reads.
    #[must_use]
    pub fn describe(&self) -> Option<String>
    {
        match self {
            Loader::Point(loader) => loader.describe(),
            Loader::Container(loader) => loader.describe(),
            Loader::Geometry(loader) => loader.describe(),
        }
    }

    /// The point loader, if this is one.
    #[must_use]
    pub fn as_point(&self) -> Option<&dyn PointLoader>
    {
        match self {
            Loader::Point(loader) => Some(loader.as_ref()),
            _ => None,
        }
    }

    /// The container loader, if this is one.
    #[must_use]
    pub fn as_container(&self) -> Option<&dyn ContainerLoader>
    {
        match self {
            Loader::Container(loader) => Some(loader.as_ref()),
            _ => None,
        }
    }

    /// The geometry loader, if this is one.
    #[must_use]
    pub fn as_geometry(&self) -> Option<&dyn GeometryLoader>
    {
        match self {
            Loader::Geometry(loader) => Some(loader.as_ref()),
            _ => None,
        }
    }
}
