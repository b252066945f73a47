//! # User Type Definitions
//!
//! Users describe their own geometry types in an XML file:
//!
//! ```xml
//! <GraphicalDebugging>
//!   <Point Id="geo::pt">
//!     <Coordinates><X>x</X><Y>y</Y></Coordinates>
//!   </Point>
//!   <Linestring Id="geo::line">
//!     <PointContainer><Name>m_points</Name></PointContainer>
//!   </Linestring>
//! </GraphicalDebugging>
//! ```
//!
//! Every `Point`, `Linestring`, `Ring` and `MultiPoint` declaration becomes
//! a user-defined loader. A declaration missing its `Id` or a required
//! sub-element is skipped and reported; it never invalidates the rest of
//! the file. Unknown elements are ignored.
//!
//! ## Hot reload
//!
//! [`reload_user_types`] compares the file against a [`ReloadState`] and,
//! when the file changed, swaps the registry's user-defined loaders for the
//! freshly parsed set. The file is parsed before the registry is locked, and
//! the swap is a single write-locked mutation.

use std::fs;
use std::path::Path;
use std::sync::{PoisonError, RwLock};
use std::time::SystemTime;

use roxmltree::{Document, Node};
use tracing::{debug, info, trace, warn};

use crate::error::DefinitionResult;
use crate::expression::MemberPath;
use crate::loader::user::{UserLinestring, UserMultiPoint, UserPoint, UserRing};
use crate::loader::{Loader, Loaders};

/// Root element of a definition file.
pub const ROOT_ELEMENT: &str = "GraphicalDebugging";

/// A declaration that was not turned into a loader.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedDeclaration
{
    /// Element name (`Point`, `Linestring`, ...)
    pub element: String,
    /// `Id` attribute, when present
    pub id: Option<String>,
    /// What was missing
    pub reason: String,
    /// 1-based line of the element in the file
    pub line: u32,
}

/// Loaders declared by one definition file.
#[derive(Debug, Default)]
pub struct Definitions
{
    /// Loaders in declaration order
    pub loaders: Vec<Loader>,
    /// Declarations that were skipped
    pub skipped: Vec<SkippedDeclaration>,
}

/// Parse the text of a definition file.
///
/// A document without a `GraphicalDebugging` element declares nothing.
///
/// ## Errors
///
/// Returns `DefinitionError::Xml` if the text is not well-formed XML.
pub fn parse_definitions(text: &str) -> DefinitionResult<Definitions>
{
    let document = Document::parse(text)?;
    let mut definitions = Definitions::default();

    for root in document.descendants().filter(|node| node.has_tag_name(ROOT_ELEMENT)) {
        for element in root.children().filter(Node::is_element) {
            let tag = element.tag_name().name();
            let declared = match tag {
                "Point" => point_declaration(element),
                "Linestring" | "Ring" | "MultiPoint" => range_declaration(element, tag),
                _ => {
                    trace!(tag, "ignoring unknown element");
                    continue;
                }
            };

            match declared {
                Ok(loader) => {
                    trace!(kind = %loader.kind(), id = loader.id(), "declared");
                    definitions.loaders.push(loader);
                }
                Err(reason) => {
                    let skipped = SkippedDeclaration {
                        element: tag.to_string(),
                        id: element.attribute("Id").map(str::to_string),
                        line: document.text_pos_at(element.range().start).row,
                        reason,
                    };
                    warn!(
                        element = %skipped.element,
                        id = skipped.id.as_deref().unwrap_or(""),
                        line = skipped.line,
                        "skipping declaration: {}",
                        skipped.reason
                    );
                    definitions.skipped.push(skipped);
                }
            }
        }
    }
    Ok(definitions)
}

/// Read and parse a definition file.
///
/// ## Errors
///
/// Returns `DefinitionError::Io` if the file cannot be read and
/// `DefinitionError::Xml` if it is not well-formed XML.
pub fn load_definitions(path: impl AsRef<Path>) -> DefinitionResult<Definitions>
{
    let text = fs::read_to_string(path)?;
    parse_definitions(&text)
}

fn point_declaration(element: Node<'_, '_>) -> Result<Loader, String>
{
    let id = declared_id(element)?;
    let coordinates = descendant(element, "Coordinates").ok_or("missing Coordinates")?;
    let x = descendant(coordinates, "X").map(inner_text).ok_or("missing X")?;
    let y = descendant(coordinates, "Y").map(inner_text).ok_or("missing Y")?;
    if x.is_empty() || y.is_empty() {
        return Err("empty coordinate member".to_string());
    }
    Ok(Loader::Point(Box::new(UserPoint::new(id, x, y))))
}

fn range_declaration(element: Node<'_, '_>, tag: &str) -> Result<Loader, String>
{
    let id = declared_id(element)?;
    let container = descendant(element, "PointContainer").ok_or("missing PointContainer")?;
    let name = descendant(container, "Name").map(inner_text).ok_or("missing Name")?;
    let path = MemberPath::parse(&name);

    let loader = match tag {
        "Linestring" => Loader::Geometry(Box::new(UserLinestring::new(id, path))),
        "Ring" => Loader::Geometry(Box::new(UserRing::new(id, path))),
        _ => Loader::Geometry(Box::new(UserMultiPoint::new(id, path))),
    };
    Ok(loader)
}

fn declared_id(element: Node<'_, '_>) -> Result<String, String>
{
    element
        .attribute("Id")
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .map(str::to_string)
        .ok_or_else(|| "missing Id".to_string())
}

fn descendant<'a, 'input>(node: Node<'a, 'input>, tag: &str) -> Option<Node<'a, 'input>>
{
    node.descendants().skip(1).find(|child| child.has_tag_name(tag))
}

fn inner_text(node: Node<'_, '_>) -> String
{
    let text: String = node.descendants().filter_map(|child| child.text()).collect();
    text.trim().to_string()
}

/// Change tracking for one definition file.
///
/// A fresh state has never loaded anything, so the first reload always
/// reads the file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReloadState
{
    last_write: Option<SystemTime>,
    changed: bool,
}

impl ReloadState
{
    /// Create a state that has not loaded anything yet.
    #[must_use]
    pub fn new() -> Self
    {
        Self::default()
    }

    /// Force the next reload, e.g. because the configured path changed.
    pub fn mark_changed(&mut self)
    {
        self.changed = true;
    }

    /// Whether a reload was forced.
    #[must_use]
    pub fn is_changed(&self) -> bool
    {
        self.changed
    }

    /// Modification time of the file as of the last reload.
    #[must_use]
    pub fn last_write(&self) -> Option<SystemTime>
    {
        self.last_write
    }
}

/// What a reload did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReloadOutcome
{
    /// Nothing triggered a reload; the registry was not touched.
    Unchanged,
    /// The user-defined loaders were replaced.
    Reloaded
    {
        /// User-defined loaders removed
        removed: usize,
        /// User-defined loaders added
        added: usize,
        /// Declarations skipped while parsing
        skipped: Vec<SkippedDeclaration>,
    },
}

/// Reload the user-defined loaders of `registry` from `path` if needed.
///
/// A reload happens when the state was marked changed, when the file is
/// newer than the last reload, or when a previously loaded file is gone. A
/// missing file (or no path at all) clears the user-defined loaders without
/// error. Built-in loaders are never touched.
///
/// ## Errors
///
/// Returns the read or parse error of a broken file. The user-defined
/// loaders are cleared and the state still advances, so the same broken
/// file is reported once.
pub fn reload_user_types(
    registry: &RwLock<Loaders>,
    path: Option<&Path>,
    state: &mut ReloadState,
) -> DefinitionResult<ReloadOutcome>
{
    let metadata = path.and_then(|path| fs::metadata(path).ok());
    let modified = metadata.as_ref().and_then(|metadata| metadata.modified().ok());
    let newer = match (modified, state.last_write) {
        (Some(modified), Some(last)) => modified > last,
        (Some(_), None) => true,
        (None, _) => false,
    };
    let vanished = metadata.is_none() && state.last_write.is_some();

    if !(state.changed || newer || vanished) {
        return Ok(ReloadOutcome::Unchanged);
    }
    debug!(path = ?path, changed = state.changed, newer, vanished, "reloading user types");

    let parsed = match path {
        Some(path) if metadata.is_some() => load_definitions(path),
        _ => Ok(Definitions::default()),
    };
    state.changed = false;
    state.last_write = modified;

    let (definitions, failure) = match parsed {
        Ok(definitions) => (definitions, None),
        Err(err) => (Definitions::default(), Some(err)),
    };
    let added = definitions.loaders.len();
    let removed = registry
        .write()
        .unwrap_or_else(PoisonError::into_inner)
        .replace_user_defined(definitions.loaders);

    if let Some(err) = failure {
        warn!(path = ?path, removed, "failed to load user types: {err}");
        return Err(err);
    }

    info!(
        path = ?path,
        removed,
        added,
        skipped = definitions.skipped.len(),
        "user types reloaded"
    );
    Ok(ReloadOutcome::Reloaded {
        removed,
        added,
        skipped: definitions.skipped,
    })
}
