//! Declared region of interest

use geo::line_intersection::{line_intersection, LineIntersection};
use geo::{coord, Coord, Intersects, Line, Point, Polygon, Rect};

use crate::core::error::{Error, Result};

/// Rectangular region in geographic coordinates
#[derive(Debug, Clone, PartialEq)]
pub struct Region {
    rect: Rect<f64>,
    polygon: Polygon<f64>,
}

impl Region {
    pub fn from_bbox(min_lon: f64, min_lat: f64, max_lon: f64, max_lat: f64) -> Result<Self> {
        let values = [min_lon, min_lat, max_lon, max_lat];
        if values.iter().any(|v| !v.is_finite()) {
            return Err(Error::InvalidInput("bounding box must be finite".to_string()));
        }
        if min_lon > max_lon || min_lat > max_lat {
            return Err(Error::InvalidInput(format!(
                "bounding box is inverted: ({min_lon}, {min_lat}) to ({max_lon}, {max_lat})"
            )));
        }
        if !(-180.0..=180.0).contains(&min_lon)
            || !(-180.0..=180.0).contains(&max_lon)
            || !(-90.0..=90.0).contains(&min_lat)
            || !(-90.0..=90.0).contains(&max_lat)
        {
            return Err(Error::InvalidInput(
                "bounding box outside geographic range".to_string(),
            ));
        }

        let rect = Rect::new(
            coord! { x: min_lon, y: min_lat },
            coord! { x: max_lon, y: max_lat },
        );
        Ok(Self {
            rect,
            polygon: rect.to_polygon(),
        })
    }

    /// Smallest region covering every coordinate
    pub fn from_extent<I>(coords: I) -> Result<Self>
    where
        I: IntoIterator<Item = (f64, f64)>,
    {
        let mut bounds: Option<(f64, f64, f64, f64)> = None;
        for (lon, lat) in coords {
            bounds = Some(match bounds {
                None => (lon, lat, lon, lat),
                Some((a, b, c, d)) => (a.min(lon), b.min(lat), c.max(lon), d.max(lat)),
            });
        }
        let (min_lon, min_lat, max_lon, max_lat) = bounds.ok_or(Error::EmptyExtract)?;
        Self::from_bbox(min_lon, min_lat, max_lon, max_lat)
    }

    pub fn polygon(&self) -> &Polygon<f64> {
        &self.polygon
    }

    /// `(min_lon, min_lat, max_lon, max_lat)`
    pub fn bbox(&self) -> (f64, f64, f64, f64) {
        let (min, max) = (self.rect.min(), self.rect.max());
        (min.x, min.y, max.x, max.y)
    }

    /// Points on the edge count as inside
    pub fn contains(&self, lon: f64, lat: f64) -> bool {
        self.polygon.intersects(&Point::new(lon, lat))
    }

    /// Where the segment from `inside` to `outside` leaves the region
    ///
    /// Returns the intersection with the boundary farthest from `inside`,
    /// which is the exit point on a convex region.
    pub fn boundary_crossing(&self, inside: (f64, f64), outside: (f64, f64)) -> Option<(f64, f64)> {
        let segment = Line::new(
            coord! { x: inside.0, y: inside.1 },
            coord! { x: outside.0, y: outside.1 },
        );
        let start: Coord<f64> = segment.start;

        let mut best: Option<(f64, Coord<f64>)> = None;
        for edge in self.polygon.exterior().lines() {
            let candidates = match line_intersection(segment, edge) {
                Some(LineIntersection::SinglePoint { intersection, .. }) => vec![intersection],
                Some(LineIntersection::Collinear { intersection }) => {
                    vec![intersection.start, intersection.end]
                }
                None => continue,
            };
            for candidate in candidates {
                let delta = candidate - start;
                let dist = delta.x * delta.x + delta.y * delta.y;
                if best.map_or(true, |(d, _)| dist > d) {
                    best = Some((dist, candidate));
                }
            }
        }
        best.map(|(_, c)| (c.x, c.y))
    }
}
