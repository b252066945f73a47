//! # Point Ranges
//!
//! Shared machinery of the loaders that draw a container of points as one
//! geometry. A range never decodes elements itself: it resolves a
//! [`ContainerLoader`] for the container and a [`PointLoader`] for its
//! elements, then drives one of two paths:
//!
//! - **memory**: the container hands out blocks of element bytes decoded by
//!   the point loader's converter
//! - **parsed**: the container names every element and the point loader
//!   loads each one on its own
//!
//! Both paths visit elements in the container's enumeration order and invoke
//! the load callback once per element.

use std::fmt;

use tracing::trace;

use super::{ContainerLoader, Kind, LoadCallback, Loaders, PointLoader};
use crate::error::{LoadError, LoadResult};
use crate::geometry::{Drawable, Linestring, MultiPoint, Point, Ring};
use crate::memory::MemoryReader;
use crate::session::DebugSession;

/// A drawable built from an ordered sequence of points.
pub trait PointSequence: Default + Into<Drawable> + fmt::Debug + Send + Sync + 'static
{
    /// Registry kind of loaders producing this shape.
    const KIND: Kind;

    /// Append the next point.
    fn push_point(&mut self, point: Point);
}

impl PointSequence for Linestring
{
    const KIND: Kind = Kind::Linestring;

    fn push_point(&mut self, point: Point)
    {
        self.push(point);
    }
}

impl PointSequence for Ring
{
    const KIND: Kind = Kind::Ring;

    fn push_point(&mut self, point: Point)
    {
        self.push(point);
    }
}

impl PointSequence for MultiPoint
{
    const KIND: Kind = Kind::MultiPoint;

    fn push_point(&mut self, point: Point)
    {
        self.push(point);
    }
}

/// A container expression together with the loaders able to enumerate it.
#[derive(Debug)]
pub struct ElementSource<'r>
{
    /// Loader enumerating the container
    pub container: &'r dyn ContainerLoader,
    /// Loader decoding one element
    pub point: &'r dyn PointLoader,
    /// Container expression
    pub name: String,
    /// Declared type of the container
    pub type_name: String,
    /// Representative element expression
    pub element_name: String,
    /// Declared type of the elements
    pub element_type: String,
}

impl<'r> ElementSource<'r>
{
    /// Resolve the collaborators of the container `name`.
    ///
    /// Returns `None` when the container's type, its container loader, its
    /// element type or a point loader for the elements cannot be found.
    pub fn resolve(registry: &'r Loaders, session: &dyn DebugSession, name: String) -> Option<Self>
    {
        let Some(type_name) = session.value_type(&name) else {
            trace!(container = %name, "container type unavailable");
            return None;
        };
        let Some(container) = registry.find_container(&name, &type_name) else {
            trace!(container = %name, type_name = %type_name, "no container loader");
            return None;
        };
        let Some(element_type) = container.element_type(session, &type_name) else {
            trace!(container = %name, type_name = %type_name, "element type unavailable");
            return None;
        };
        let element_name = container.element_name(&name, &element_type);
        let Some(point) = registry.find_point(&element_name, &element_type) else {
            trace!(element = %element_name, element_type = %element_type, "no point loader");
            return None;
        };

        Some(Self {
            container,
            point,
            name,
            type_name,
            element_name,
            element_type,
        })
    }

    /// Decode every element through the container's memory blocks.
    ///
    /// ## Errors
    ///
    /// - `Cancelled`: the callback returned `false`
    /// - `ConverterMismatch`: the point converter does not yield two values
    /// - recoverable errors when the layout or a block is unavailable
    pub fn load_memory<R: PointSequence>(
        &self,
        reader: &MemoryReader<'_>,
        session: &dyn DebugSession,
        callback: &mut LoadCallback<'_>,
    ) -> LoadResult<R>
    {
        let converter = self
            .point
            .memory_converter(reader, session, &self.element_name, &self.element_type)?;
        if converter.value_count() != 2 {
            return Err(LoadError::ConverterMismatch {
                expected: 2,
                actual: converter.value_count(),
            });
        }

        let mut sequence = R::default();
        self.container.for_each_memory_block(
            reader,
            session,
            &self.name,
            &self.type_name,
            converter.as_ref(),
            &mut |values| {
                for pair in values.chunks_exact(2) {
                    if !callback() {
                        return Err(LoadError::Cancelled);
                    }
                    sequence.push_point(Point::new(pair[0], pair[1]));
                }
                Ok(())
            },
        )?;
        Ok(sequence)
    }

    /// Load every element on its own.
    ///
    /// The first element that cannot be loaded abandons the whole range.
    ///
    /// ## Errors
    ///
    /// - `Cancelled`: the callback returned `false`
    /// - `Unresolvable`: an element has no value
    /// - `ConverterMismatch` from a point loader
    pub fn load_parsed<R: PointSequence>(
        &self,
        reader: Option<&MemoryReader<'_>>,
        session: &dyn DebugSession,
        callback: &mut LoadCallback<'_>,
    ) -> LoadResult<R>
    {
        let mut sequence = R::default();
        self.container.for_each_element(session, &self.name, &mut |element| {
            if !callback() {
                return Err(LoadError::Cancelled);
            }
            let point = self
                .point
                .load_point(reader, session, element, &self.element_type)?
                .ok_or_else(|| LoadError::Unresolvable(element.to_string()))?;
            sequence.push_point(point);
            Ok(())
        })?;
        Ok(sequence)
    }
}
