//! Loader registry.
//!
//! The registry owns every loader and answers "which loader handles a value
//! of this kind and type?". Built-in loaders are registered once; the
//! user-defined subset is replaced wholesale whenever a definition file is
//! reloaded.

use std::collections::HashMap;

use tracing::{debug, trace};

use super::containers::{CArray, StdVector};
use super::{ContainerLoader, GeometryLoader, Kind, LoadCallback, Loader, PointLoader};
use crate::error::LoadResult;
use crate::geometry::{Drawable, Traits};
use crate::memory::MemoryReader;
use crate::session::DebugSession;
use crate::types::type_id;

/// Loaders indexed by kind.
///
/// Within a kind, user-defined loaders are consulted before built-ins, so a
/// definition file can shadow a built-in for the same type.
///
/// ## Thread Safety
///
/// The registry itself is not synchronized. Hosts that look up loaders
/// while another thread reloads definitions keep it behind a lock, as
/// [`ExpressionLoader`](crate::ExpressionLoader) does.
#[derive(Debug, Default)]
pub struct Loaders
{
    by_kind: HashMap<Kind, Vec<Loader>>,
}

impl Loaders
{
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self
    {
        Self::default()
    }

    /// Create a registry holding the built-in container loaders.
    #[must_use]
    pub fn with_builtins() -> Self
    {
        let mut loaders = Self::new();
        loaders.add(Loader::Container(Box::new(CArray)));
        loaders.add(Loader::Container(Box::new(StdVector)));
        loaders
    }

    /// Register a loader.
    ///
    /// A loader with the same kind, id and origin (built-in or
    /// user-defined) is replaced.
    pub fn add(&mut self, loader: Loader)
    {
        let list = self.by_kind.entry(loader.kind()).or_default();
        let user_defined = loader.is_user_defined();

        if let Some(slot) = list
            .iter_mut()
            .find(|existing| existing.id() == loader.id() && existing.is_user_defined() == user_defined)
        {
            trace!(kind = %loader.kind(), id = loader.id(), "replacing loader");
            *slot = loader;
        } else if user_defined {
            let position = list.iter().take_while(|existing| existing.is_user_defined()).count();
            list.insert(position, loader);
        } else {
            list.push(loader);
        }
    }

    /// Find the loader of `kind` handling the value `name` of type `type_name`.
    #[must_use]
    pub fn find_by_type(&self, kind: Kind, name: &str, type_name: &str) -> Option<&Loader>
    {
        let id = type_id(type_name);
        let found = self
            .by_kind
            .get(&kind)?
            .iter()
            .find(|loader| loader.matches(name, type_name, &id));
        if found.is_none() {
            trace!(%kind, name, type_name, "no loader");
        }
        found
    }

    /// Find a point loader.
    #[must_use]
    pub fn find_point(&self, name: &str, type_name: &str) -> Option<&dyn PointLoader>
    {
        self.find_by_type(Kind::Point, name, type_name).and_then(Loader::as_point)
    }

    /// Find a container loader.
    #[must_use]
    pub fn find_container(&self, name: &str, type_name: &str) -> Option<&dyn ContainerLoader>
    {
        self.find_by_type(Kind::Container, name, type_name).and_then(Loader::as_container)
    }

    /// Find a geometry loader of a non-point drawable kind.
    #[must_use]
    pub fn find_geometry(&self, kind: Kind, name: &str, type_name: &str) -> Option<&dyn GeometryLoader>
    {
        self.find_by_type(kind, name, type_name).and_then(Loader::as_geometry)
    }

    /// Remove every user-defined loader, keeping built-ins.
    ///
    /// Returns the number of loaders removed.
    pub fn remove_user_defined(&mut self) -> usize
    {
        let mut removed = 0;
        for list in self.by_kind.values_mut() {
            let before = list.len();
            list.retain(|loader| !loader.is_user_defined());
            removed += before - list.len();
        }
        removed
    }

    /// Swap the user-defined subset for `loaders` in one mutation.
    ///
    /// Returns the number of loaders removed.
    pub fn replace_user_defined(&mut self, loaders: impl IntoIterator<Item = Loader>) -> usize
    {
        let removed = self.remove_user_defined();
        for loader in loaders {
            self.add(loader);
        }
        removed
    }

    /// All loaders, grouped by kind.
    pub fn iter(&self) -> impl Iterator<Item = &Loader>
    {
        let mut kinds: Vec<_> = self.by_kind.keys().copied().collect();
        kinds.sort();
        kinds.into_iter().flat_map(move |kind| self.by_kind[&kind].iter())
    }

    /// Number of registered loaders.
    #[must_use]
    pub fn len(&self) -> usize
    {
        self.by_kind.values().map(Vec::len).sum()
    }

    /// Whether no loader is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool
    {
        self.len() == 0
    }

    /// Number of user-defined loaders.
    #[must_use]
    pub fn user_defined_count(&self) -> usize
    {
        self.iter().filter(|loader| loader.is_user_defined()).count()
    }

    /// Load the variable `name` as whatever drawable its type supports.
    ///
    /// Drawable kinds are tried in [`Kind::DRAWABLE`] order; the first kind
    /// with a matching loader decides the result.
    ///
    /// ## Errors
    ///
    /// Only contract violations are returned; unavailable data yields `Ok(None)`.
    pub fn load(
        &self,
        reader: Option<&MemoryReader<'_>>,
        session: &dyn DebugSession,
        name: &str,
        callback: &mut LoadCallback<'_>,
    ) -> LoadResult<Option<(Traits, Drawable)>>
    {
        let Some(type_name) = session.value_type(name) else {
            debug!(name, "cannot resolve type");
            return Ok(None);
        };

        for kind in Kind::DRAWABLE {
            let Some(loader) = self.find_by_type(kind, name, &type_name) else {
                continue;
            };
            debug!(name, %kind, id = loader.id(), "loading");
            return match loader {
                Loader::Point(point) => Ok(point
                    .load(reader, session, name, &type_name)?
                    .map(|(traits, point)| (traits, Drawable::Point(point)))),
                Loader::Geometry(geometry) => geometry.load(self, reader, session, name, &type_name, callback),
                Loader::Container(_) => Ok(None),
            };
        }

        debug!(name, type_name = %type_name, "no drawable loader");
        Ok(None)
    }
}

#[cfg(test)]
mod tests
{
    use super::*;
    use crate::expression::MemberPath;
    use crate::loader::user::{UserLinestring, UserPoint};

    #[test]
    fn test_builtins_are_not_user_defined()
    {
        let loaders = Loaders::with_builtins();
        assert_eq!(loaders.len(), 2);
        assert_eq!(loaders.user_defined_count(), 0);
        assert!(loaders.find_container("a", "Pt[3]").is_some());
        assert!(loaders.find_container("v", "std::vector<Pt,std::allocator<Pt> >").is_some());
    }

    #[test]
    fn test_find_by_type_strips_templates_and_qualifiers()
    {
        let mut loaders = Loaders::new();
        loaders.add(Loader::Point(Box::new(UserPoint::new("geo::pt", "x", "y"))));
        assert!(loaders.find_point("p", "const geo::pt<float>").is_some());
        assert!(loaders.find_point("p", "geo::point").is_none());
        assert!(loaders.find_by_type(Kind::Linestring, "p", "geo::pt").is_none());
    }

    #[test]
    fn test_add_replaces_same_id()
    {
        let mut loaders = Loaders::new();
        loaders.add(Loader::Point(Box::new(UserPoint::new("Pt", "x", "y"))));
        loaders.add(Loader::Point(Box::new(UserPoint::new("Pt", "a", "b"))));
        assert_eq!(loaders.len(), 1);
    }

    #[test]
    fn test_remove_user_defined_keeps_builtins()
    {
        let mut loaders = Loaders::with_builtins();
        loaders.add(Loader::Point(Box::new(UserPoint::new("Pt", "x", "y"))));
        loaders.add(Loader::Geometry(Box::new(UserLinestring::new("Line", MemberPath::parse("pts")))));
        assert_eq!(loaders.len(), 4);

        assert_eq!(loaders.remove_user_defined(), 2);
        assert_eq!(loaders.len(), 2);
        assert_eq!(loaders.remove_user_defined(), 0);
    }

    #[test]
    fn test_iter_groups_by_kind()
    {
        let mut loaders = Loaders::with_builtins();
        loaders.add(Loader::Geometry(Box::new(UserLinestring::new("Line", MemberPath::parse("pts")))));
        loaders.add(Loader::Point(Box::new(UserPoint::new("Pt", "x", "y"))));
        let kinds: Vec<Kind> = loaders.iter().map(Loader::kind).collect();
        assert_eq!(kinds, vec![Kind::Point, Kind::Container, Kind::Container, Kind::Linestring]);
    }
}
