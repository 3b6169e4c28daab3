//! Region geometries and the spatial predicates used for reductions.

use aq_common::{AqError, AqResult, BoundingBox, GridCell};
use geo::{BoundingRect, Coord, Intersects, LineString, Point, Polygon, Rect};

/// Geometry of an area of interest.
///
/// Only the three shapes a boundary file may contain are representable;
/// anything else is rejected while loading.
#[derive(Debug, Clone, PartialEq)]
pub enum RegionGeometry {
    Polygon(Polygon<f64>),
    LineString(LineString<f64>),
    Point(Point<f64>),
}

impl RegionGeometry {
    /// Convert a parsed GeoJSON geometry.
    ///
    /// Multi-part geometries and collections fail with
    /// [`AqError::UnsupportedGeometry`].
    pub fn from_geojson(value: &geojson::Value) -> AqResult<Self> {
        match value {
            geojson::Value::Polygon(rings) => {
                let mut rings = rings.iter();
                let exterior = rings
                    .next()
                    .ok_or_else(|| AqError::RegionLoad("polygon has no exterior ring".into()))?;
                let exterior = line_string(exterior)?;
                let interiors = rings.map(|r| line_string(r)).collect::<AqResult<Vec<_>>>()?;
                Ok(RegionGeometry::Polygon(Polygon::new(exterior, interiors)))
            }
            geojson::Value::LineString(positions) => {
                if positions.len() < 2 {
                    return Err(AqError::RegionLoad(
                        "line string needs at least two positions".into(),
                    ));
                }
                Ok(RegionGeometry::LineString(line_string(positions)?))
            }
            geojson::Value::Point(position) => Ok(RegionGeometry::Point(Point::from(coord(position)?))),
            geojson::Value::MultiPoint(_) => Err(AqError::UnsupportedGeometry("MultiPoint".into())),
            geojson::Value::MultiLineString(_) => {
                Err(AqError::UnsupportedGeometry("MultiLineString".into()))
            }
            geojson::Value::MultiPolygon(_) => {
                Err(AqError::UnsupportedGeometry("MultiPolygon".into()))
            }
            geojson::Value::GeometryCollection(_) => {
                Err(AqError::UnsupportedGeometry("GeometryCollection".into()))
            }
        }
    }

    /// Geometry type name as used by GeoJSON.
    pub fn kind(&self) -> &'static str {
        match self {
            RegionGeometry::Polygon(_) => "Polygon",
            RegionGeometry::LineString(_) => "LineString",
            RegionGeometry::Point(_) => "Point",
        }
    }

    /// Bounding box of the geometry.
    pub fn bounding_box(&self) -> BoundingBox {
        let rect = match self {
            RegionGeometry::Polygon(p) => p.bounding_rect(),
            RegionGeometry::LineString(l) => l.bounding_rect(),
            RegionGeometry::Point(p) => Some(p.bounding_rect()),
        };
        match rect {
            Some(r) => rect_to_bbox(&r),
            None => BoundingBox::new(0.0, 0.0, 0.0, 0.0),
        }
    }

    /// True when the coordinate is inside or on the boundary of the geometry.
    pub fn covers(&self, x: f64, y: f64) -> bool {
        let point = Point::new(x, y);
        match self {
            RegionGeometry::Polygon(p) => p.intersects(&point),
            RegionGeometry::LineString(l) => l.intersects(&point),
            RegionGeometry::Point(p) => *p == point,
        }
    }

    /// Decide whether a pixel takes part in a reduction over this geometry.
    ///
    /// Polygons select pixels whose centre lies inside; lines select every
    /// pixel they cross; a point selects the single pixel that contains it
    /// (north-west edges inclusive).
    pub fn selects(&self, cell: &GridCell) -> bool {
        match self {
            RegionGeometry::Polygon(p) => {
                let (cx, cy) = cell.center();
                p.intersects(&Point::new(cx, cy))
            }
            RegionGeometry::LineString(l) => {
                let b = &cell.bounds;
                let rect = Rect::new(
                    Coord { x: b.min_x, y: b.min_y },
                    Coord { x: b.max_x, y: b.max_y },
                );
                rect.to_polygon().intersects(l)
            }
            RegionGeometry::Point(p) => {
                let b = &cell.bounds;
                p.x() >= b.min_x && p.x() < b.max_x && p.y() > b.min_y && p.y() <= b.max_y
            }
        }
    }
}

fn coord(position: &[f64]) -> AqResult<Coord<f64>> {
    match position {
        [x, y, ..] => Ok(Coord { x: *x, y: *y }),
        _ => Err(AqError::RegionLoad(format!(
            "position needs two coordinates, got {}",
            position.len()
        ))),
    }
}

fn line_string(positions: &[Vec<f64>]) -> AqResult<LineString<f64>> {
    let coords = positions
        .iter()
        .map(|p| coord(p))
        .collect::<AqResult<Vec<_>>>()?;
    Ok(LineString::new(coords))
}

fn rect_to_bbox(rect: &Rect<f64>) -> BoundingBox {
    BoundingBox::new(rect.min().x, rect.min().y, rect.max().x, rect.max().y)
}

#[cfg(test)]
mod tests {
    use super::*;
    use aq_common::GeoGrid;

    fn square() -> RegionGeometry {
        let value = geojson::Value::Polygon(vec![vec![
            vec![0.0, 0.0],
            vec![2.0, 0.0],
            vec![2.0, 2.0],
            vec![0.0, 2.0],
            vec![0.0, 0.0],
        ]]);
        RegionGeometry::from_geojson(&value).unwrap()
    }

    #[test]
    fn test_polygon_covers_interior_and_boundary() {
        let geometry = square();
        assert!(geometry.covers(1.0, 1.0));
        assert!(geometry.covers(2.0, 1.0));
        assert!(!geometry.covers(2.5, 1.0));
    }

    #[test]
    fn test_polygon_selects_pixel_centres() {
        let geometry = square();
        // 1 degree pixels from (-1, 3): centres at -0.5, 0.5, 1.5, 2.5
        let grid = GeoGrid::new(-1.0, 3.0, 1.0, 1.0, 4, 4);
        let selected: Vec<_> = grid
            .cells()
            .filter(|c| geometry.selects(c))
            .map(|c| (c.col, c.row))
            .collect();
        assert_eq!(selected, vec![(1, 1), (2, 1), (1, 2), (2, 2)]);
    }

    #[test]
    fn test_point_selects_one_pixel() {
        let geometry = RegionGeometry::Point(Point::new(1.0, 1.0));
        let grid = GeoGrid::new(0.0, 2.0, 1.0, 1.0, 2, 2);
        let selected: Vec<_> = grid
            .cells()
            .filter(|c| geometry.selects(c))
            .map(|c| (c.col, c.row))
            .collect();
        assert_eq!(selected.len(), 1);
    }

    #[test]
    fn test_line_selects_crossed_pixels() {
        let geometry = RegionGeometry::LineString(LineString::from(vec![(0.5, 0.5), (2.5, 0.5)]));
        let grid = GeoGrid::new(0.0, 2.0, 1.0, 1.0, 3, 2);
        let count = grid.cells().filter(|c| geometry.selects(c)).count();
        assert_eq!(count, 3);
    }

    #[test]
    fn test_unsupported_geometry() {
        let value = geojson::Value::MultiPoint(vec![vec![0.0, 0.0], vec![1.0, 1.0]]);
        match RegionGeometry::from_geojson(&value) {
            Err(AqError::UnsupportedGeometry(kind)) => assert_eq!(kind, "MultiPoint"),
            other => panic!("expected UnsupportedGeometry, got {:?}", other),
        }
    }

    #[test]
    fn test_short_position_rejected() {
        let value = geojson::Value::Point(vec![1.0]);
        assert!(matches!(
            RegionGeometry::from_geojson(&value),
            Err(AqError::RegionLoad(_))
        ));
    }

    #[test]
    fn test_bounding_box() {
        assert_eq!(square().bounding_box(), BoundingBox::new(0.0, 0.0, 2.0, 2.0));
    }
}
