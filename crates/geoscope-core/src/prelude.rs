//! Common module for library exports

pub use crate::error::{LoadError, LoadResult, OrAbsent};
pub use crate::expression::MemberPath;
pub use crate::expression_loader::{Dialect, ExpressionLoader, Options};
pub use crate::geometry::{Drawable, Linestring, MultiPoint, Point, Ring, Traits};
pub use crate::loader::{ContainerLoader, GeometryLoader, Kind, Loader, LoaderInfo, Loaders, PointLoader};
pub use crate::memory::{Converter, MemoryReader};
pub use crate::session::snapshot::SnapshotSession;
pub use crate::session::{DebugSession, ProcessMemory};
pub use crate::types::address::Address;
