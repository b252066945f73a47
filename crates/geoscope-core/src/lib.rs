//! # geoscope-core
//!
//! Type-directed geometry loaders for debuggers.
//!
//! Given a variable in a stopped process, this crate finds a loader for the
//! variable's declared type and turns its value into a drawable geometry
//! (point, linestring, ring or multipoint), including:
//! - Loader resolution by kind and type name through a [`Loaders`] registry
//! - User-defined point and range types read from an XML definition file,
//!   with hot reload
//! - Direct decoding of process memory through byte-level converters
//! - Fallback to per-value expression evaluation when memory is unavailable
//!
//! ## Debugger Integration
//!
//! The crate never talks to a debugger directly. Hosts implement
//! [`DebugSession`] (and optionally [`ProcessMemory`]) on top of their own
//! expression evaluator; [`SnapshotSession`](session::snapshot::SnapshotSession)
//! is a recorded implementation used by tests and the CLI.
//!
//! ## Example
//!
//! ```rust
//! use geoscope_core::loader::user::UserPoint;
//! use geoscope_core::loader::{Loader, Loaders};
//! use geoscope_core::memory::MemoryReader;
//! use geoscope_core::session::snapshot::SnapshotSession;
//! use geoscope_core::geometry::{Drawable, Point};
//!
//! let mut bytes = 3.5f64.to_le_bytes().to_vec();
//! bytes.extend_from_slice(&(-2.0f64).to_le_bytes());
//! let session = SnapshotSession::new()
//!     .with_type("Pt", 16)
//!     .with_value("p", "Pt", "{...}", Some(0x1000))
//!     .with_value("p.mx", "double", "3.5", Some(0x1000))
//!     .with_value("p.my", "double", "-2", Some(0x1008))
//!     .with_memory(0x1000, bytes);
//!
//! let mut loaders = Loaders::with_builtins();
//! loaders.add(Loader::Point(Box::new(UserPoint::new("Pt", "mx", "my"))));
//!
//! let reader = MemoryReader::new(&session);
//! let (_, drawable) = loaders.load(Some(&reader), &session, "p", &mut || true).unwrap().unwrap();
//! assert_eq!(drawable, Drawable::Point(Point::new(3.5, -2.0)));
//! ```

pub mod error;
pub mod expression;
pub mod expression_loader;
pub mod geometry;
pub mod loader;
pub mod memory;
pub mod prelude;
pub mod session;
pub mod types;
pub mod user_types;

// Re-export commonly used types
pub use error::{DefinitionError, DefinitionResult, LoadError, LoadResult, SessionError, SessionResult};
pub use expression_loader::{Dialect, ExpressionLoader, Options, ReloadReport};
pub use loader::{Kind, Loader, Loaders};
pub use session::{DebugSession, ProcessMemory};
pub use types::Address;
