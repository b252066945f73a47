//! # Expression Loader
//!
//! Entry point for hosts: "draw the variable `name`".
//!
//! An [`ExpressionLoader`] keeps one loader registry per source language,
//! because the same type name means different things to a C++ and a C#
//! debugger. Each registry starts with the built-in container loaders and
//! gains user-defined loaders from that language's definition file.
//!
//! ## Example
//!
//! ```rust
//! use geoscope_core::session::snapshot::SnapshotSession;
//! use geoscope_core::{Dialect, ExpressionLoader, Options};
//!
//! let loader = ExpressionLoader::new();
//! let mut options = Options::new();
//! let report = loader.reload_user_types(&mut options);
//! assert!(report.cpp.is_ok());
//!
//! let session = SnapshotSession::new();
//! assert!(loader.load(Dialect::Cpp, None, &session, "missing").unwrap().is_none());
//! ```

use std::fmt;
use std::path::PathBuf;
use std::sync::{PoisonError, RwLock};

use once_cell::sync::Lazy;
use tracing::debug;

use crate::error::{DefinitionResult, LoadResult};
use crate::geometry::{Drawable, Traits};
use crate::loader::{LoadCallback, Loaders};
use crate::memory::MemoryReader;
use crate::session::DebugSession;
use crate::user_types::{reload_user_types, ReloadOutcome, ReloadState};

static GLOBAL: Lazy<ExpressionLoader> = Lazy::new(ExpressionLoader::new);

/// Source language of the debugged program.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Dialect
{
    /// C and C++
    Cpp,
    /// C# and other CLR languages
    CSharp,
}

impl fmt::Display for Dialect
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
    {
        match self {
            Dialect::Cpp => write!(f, "C++"),
            Dialect::CSharp => write!(f, "C#"),
        }
    }
}

/// Where the user type definition files live, and how fresh the loaded copies are.
#[derive(Debug, Clone, Default)]
pub struct Options
{
    /// Definition file for C++ types
    pub user_types_path_cpp: Option<PathBuf>,
    /// Definition file for C# types
    pub user_types_path_cs: Option<PathBuf>,
    /// Reload state of the C++ file
    pub cpp_state: ReloadState,
    /// Reload state of the C# file
    pub cs_state: ReloadState,
}

impl Options
{
    /// Options without definition files.
    #[must_use]
    pub fn new() -> Self
    {
        Self::default()
    }

    /// Point the C++ definitions at `path`, forcing a reload.
    pub fn set_user_types_path_cpp(&mut self, path: Option<PathBuf>)
    {
        self.user_types_path_cpp = path;
        self.mark_cpp_changed();
    }

    /// Point the C# definitions at `path`, forcing a reload.
    pub fn set_user_types_path_cs(&mut self, path: Option<PathBuf>)
    {
        self.user_types_path_cs = path;
        self.mark_cs_changed();
    }

    /// Force the next reload of the C++ definitions.
    pub fn mark_cpp_changed(&mut self)
    {
        self.cpp_state.mark_changed();
    }

    /// Force the next reload of the C# definitions.
    pub fn mark_cs_changed(&mut self)
    {
        self.cs_state.mark_changed();
    }
}

/// Outcome of reloading both definition files.
#[derive(Debug)]
pub struct ReloadReport
{
    /// C++ definitions
    pub cpp: DefinitionResult<ReloadOutcome>,
    /// C# definitions
    pub cs: DefinitionResult<ReloadOutcome>,
}

/// Loader registries for every dialect.
///
/// ## Thread Safety
///
/// Lookups take a read lock and reloads a write lock, so a host may keep
/// drawing on one thread while another polls the definition files.
#[derive(Debug)]
pub struct ExpressionLoader
{
    loaders_cpp: RwLock<Loaders>,
    loaders_cs: RwLock<Loaders>,
}

impl Default for ExpressionLoader
{
    fn default() -> Self
    {
        Self::new()
    }
}

impl ExpressionLoader
{
    /// Create registries holding only the built-in loaders.
    #[must_use]
    pub fn new() -> Self
    {
        Self {
            loaders_cpp: RwLock::new(Loaders::with_builtins()),
            loaders_cs: RwLock::new(Loaders::with_builtins()),
        }
    }

    /// The process-wide instance.
    pub fn global() -> &'static ExpressionLoader
    {
        &GLOBAL
    }

    /// Registry of a dialect.
    #[must_use]
    pub fn loaders(&self, dialect: Dialect) -> &RwLock<Loaders>
    {
        match dialect {
            Dialect::Cpp => &self.loaders_cpp,
            Dialect::CSharp => &self.loaders_cs,
        }
    }

    /// Reload both definition files where needed.
    ///
    /// The files are handled independently: a broken C++ file does not
    /// keep the C# definitions from loading.
    pub fn reload_user_types(&self, options: &mut Options) -> ReloadReport
    {
        let cpp = reload_user_types(
            &self.loaders_cpp,
            options.user_types_path_cpp.as_deref(),
            &mut options.cpp_state,
        );
        let cs = reload_user_types(
            &self.loaders_cs,
            options.user_types_path_cs.as_deref(),
            &mut options.cs_state,
        );
        ReloadReport { cpp, cs }
    }

    /// Load the variable `name` as a drawable.
    ///
    /// ## Errors
    ///
    /// Only contract violations are returned; unavailable data yields `Ok(None)`.
    pub fn load(
        &self,
        dialect: Dialect,
        reader: Option<&MemoryReader<'_>>,
        session: &dyn DebugSession,
        name: &str,
    ) -> LoadResult<Option<(Traits, Drawable)>>
    {
        self.load_with(dialect, reader, session, name, &mut || true)
    }

    /// Load the variable `name`, invoking `callback` for every element.
    ///
    /// ## Errors
    ///
    /// Only contract violations are returned; unavailable data yields `Ok(None)`.
    pub fn load_with(
        &self,
        dialect: Dialect,
        reader: Option<&MemoryReader<'_>>,
        session: &dyn DebugSession,
        name: &str,
        callback: &mut LoadCallback<'_>,
    ) -> LoadResult<Option<(Traits, Drawable)>>
    {
        debug!(%dialect, name, memory = reader.is_some(), "load requested");
        self.loaders(dialect)
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .load(reader, session, name, callback)
    }
}
