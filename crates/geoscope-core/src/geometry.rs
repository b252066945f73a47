//! # Geometry
//!
//! Drawable values produced by loaders, and the traits describing their
//! coordinate space.
//!
//! Values are plain owned data, created fresh for every load and handed to
//! the caller. They serialize with `serde` so hosts can ship them to a
//! renderer as JSON.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Coordinate system of a point type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CoordinateSystem
{
    /// Flat x/y plane
    Cartesian,
    /// Longitude/latitude on a sphere
    Spherical,
    /// Longitude/latitude on an ellipsoid
    Geographic,
    /// Complex plane (real, imaginary)
    Complex,
}

/// Angular unit of non-Cartesian coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Unit
{
    /// No unit (Cartesian and complex coordinates)
    None,
    /// Degrees
    Degree,
    /// Radians
    Radian,
}

/// Dimension, coordinate system and unit of a loaded geometry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Traits
{
    /// Number of coordinates per point, at least 1
    pub dimension: usize,
    /// Coordinate system
    pub coordinate_system: CoordinateSystem,
    /// Unit of angular coordinates
    pub unit: Unit,
}

impl Traits
{
    /// Create traits; a zero dimension is clamped to 1.
    #[must_use]
    pub fn new(dimension: usize, coordinate_system: CoordinateSystem, unit: Unit) -> Self
    {
        Self {
            dimension: dimension.max(1),
            coordinate_system,
            unit,
        }
    }

    /// 2-D Cartesian coordinates without unit.
    #[must_use]
    pub fn cartesian_2d() -> Self
    {
        Self::new(2, CoordinateSystem::Cartesian, Unit::None)
    }
}

/// A point in the plane.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point
{
    /// First coordinate
    pub x: f64,
    /// Second coordinate
    pub y: f64,
}

impl Point
{
    /// Create a point.
    #[must_use]
    pub const fn new(x: f64, y: f64) -> Self
    {
        Self { x, y }
    }
}

impl fmt::Display for Point
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
    {
        write!(f, "({}, {})", self.x, self.y)
    }
}

macro_rules! point_sequence {
    ($(#[$doc:meta])* $name:ident) => {
        $(#[$doc])*
        #[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
        pub struct $name
        {
            /// Points in container order
            pub points: Vec<Point>,
        }

        impl $name
        {
            /// Create an empty sequence.
            #[must_use]
            pub fn new() -> Self
            {
                Self::default()
            }

            /// Append a point.
            pub fn push(&mut self, point: Point)
            {
                self.points.push(point);
            }

            /// Number of points.
            #[must_use]
            pub fn len(&self) -> usize
            {
                self.points.len()
            }

            /// Whether the sequence holds no points.
            #[must_use]
            pub fn is_empty(&self) -> bool
            {
                self.points.is_empty()
            }
        }

        impl FromIterator<Point> for $name
        {
            fn from_iter<I: IntoIterator<Item = Point>>(iter: I) -> Self
            {
                Self {
                    points: iter.into_iter().collect(),
                }
            }
        }
    };
}

point_sequence!(
    /// Ordered sequence of points drawn as connected segments.
    Linestring
);
point_sequence!(
    /// Ordered sequence of points drawn as a closed polygon boundary.
    ///
    /// The closing segment is implicit; the last point need not repeat the first.
    Ring
);
point_sequence!(
    /// Points drawn individually, kept in container order.
    MultiPoint
);

/// Axis-aligned bounding box.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bounds
{
    /// Lower-left corner
    pub min: Point,
    /// Upper-right corner
    pub max: Point,
}

impl Bounds
{
    fn of(points: &[Point]) -> Option<Self>
    {
        let (first, rest) = points.split_first()?;
        let mut bounds = Bounds { min: *first, max: *first };
        for point in rest {
            bounds.min.x = bounds.min.x.min(point.x);
            bounds.min.y = bounds.min.y.min(point.y);
            bounds.max.x = bounds.max.x.max(point.x);
            bounds.max.y = bounds.max.y.max(point.y);
        }
        Some(bounds)
    }
}

/// Any value a loader can produce.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Drawable
{
    /// Single point
    Point(Point),
    /// Connected points
    Linestring(Linestring),
    /// Closed ring
    Ring(Ring),
    /// Unconnected points
    #[serde(rename = "multipoint")]
    MultiPoint(MultiPoint),
}

impl Drawable
{
    /// Points of the value, in order.
    #[must_use]
    pub fn points(&self) -> &[Point]
    {
        match self {
            Drawable::Point(point) => std::slice::from_ref(point),
            Drawable::Linestring(linestring) => &linestring.points,
            Drawable::Ring(ring) => &ring.points,
            Drawable::MultiPoint(multi_point) => &multi_point.points,
        }
    }

    /// Bounding box, `None` for empty sequences.
    #[must_use]
    pub fn bounds(&self) -> Option<Bounds>
    {
        Bounds::of(self.points())
    }
}

impl From<Point> for Drawable
{
    fn from(point: Point) -> Self
    {
        Drawable::Point(point)
    }
}

impl From<Linestring> for Drawable
{
    fn from(linestring: Linestring) -> Self
    {
        Drawable::Linestring(linestring)
    }
}

impl From<Ring> for Drawable
{
    fn from(ring: Ring) -> Self
    {
        Drawable::Ring(ring)
    }
}

impl From<MultiPoint> for Drawable
{
    fn from(multi_point: MultiPoint) -> Self
    {
        Drawable::MultiPoint(multi_point)
    }
}

#[cfg(test)]
mod tests
{
    use super::*;

    #[test]
    fn test_traits_clamp_dimension()
    {
        let traits = Traits::new(0, CoordinateSystem::Spherical, Unit::Degree);
        assert_eq!(traits.dimension, 1);
    }

    #[test]
    fn test_bounds_of_linestring()
    {
        let line: Linestring = [Point::new(0.0, 0.0), Point::new(2.0, -1.0), Point::new(1.0, 4.0)]
            .into_iter()
            .collect();
        let bounds = Drawable::from(line).bounds().unwrap();
        assert_eq!(bounds.min, Point::new(0.0, -1.0));
        assert_eq!(bounds.max, Point::new(2.0, 4.0));
    }

    #[test]
    fn test_bounds_of_empty_ring()
    {
        assert_eq!(Drawable::from(Ring::new()).bounds(), None);
    }

    #[test]
    fn test_drawable_json_tag()
    {
        let value = Drawable::from(MultiPoint::from_iter([Point::new(1.0, 2.0)]));
        let json = serde_json::to_value(&value).unwrap();
        assert_eq!(json["kind"], "multipoint");
        assert_eq!(json["points"][0]["y"], 2.0);
    }
}
