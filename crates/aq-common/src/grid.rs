//! Georeferenced raster grids.

use crate::BoundingBox;
use serde::{Deserialize, Serialize};

/// Tolerance used when comparing grid geometry, in degrees.
const GRID_EPSILON: f64 = 1e-9;

/// Specification of a north-up regular lon/lat grid.
///
/// Row 0 is the northern-most row and values are stored row-major, so the
/// affine transform is `x = origin_x + col * dx`, `y = origin_y - row * dy`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoGrid {
    /// Longitude of the western edge of column 0
    pub origin_x: f64,
    /// Latitude of the northern edge of row 0
    pub origin_y: f64,
    /// Pixel width (degrees, positive)
    pub dx: f64,
    /// Pixel height (degrees, positive)
    pub dy: f64,
    /// Number of columns
    pub nx: usize,
    /// Number of rows
    pub ny: usize,
}

/// One pixel of a grid with its footprint.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GridCell {
    pub col: usize,
    pub row: usize,
    pub bounds: BoundingBox,
}

impl GridCell {
    /// Centre of the pixel.
    pub fn center(&self) -> (f64, f64) {
        (
            (self.bounds.min_x + self.bounds.max_x) / 2.0,
            (self.bounds.min_y + self.bounds.max_y) / 2.0,
        )
    }
}

impl GeoGrid {
    /// Create a new grid specification.
    pub fn new(origin_x: f64, origin_y: f64, dx: f64, dy: f64, nx: usize, ny: usize) -> Self {
        Self {
            origin_x,
            origin_y,
            dx,
            dy,
            nx,
            ny,
        }
    }

    /// A grid with no pixels, used by images that carry no bands.
    pub fn empty() -> Self {
        Self::new(0.0, 0.0, 0.0, 0.0, 0, 0)
    }

    /// Smallest grid at `resolution` whose pixels cover `bbox`, anchored at
    /// the box's north-west corner.
    pub fn covering(bbox: &BoundingBox, resolution: f64) -> Self {
        let nx = ((bbox.width() / resolution) - GRID_EPSILON).ceil().max(1.0) as usize;
        let ny = ((bbox.height() / resolution) - GRID_EPSILON).ceil().max(1.0) as usize;
        Self::new(bbox.min_x, bbox.max_y, resolution, resolution, nx, ny)
    }

    /// Total number of grid points.
    pub fn len(&self) -> usize {
        self.nx * self.ny
    }

    /// Check if grid is empty.
    pub fn is_empty(&self) -> bool {
        self.nx == 0 || self.ny == 0
    }

    /// Calculate the bounding box of this grid.
    pub fn bbox(&self) -> BoundingBox {
        BoundingBox::new(
            self.origin_x,
            self.origin_y - self.ny as f64 * self.dy,
            self.origin_x + self.nx as f64 * self.dx,
            self.origin_y,
        )
    }

    /// Affine transform in `(a, b, c, d, e, f)` order.
    pub fn transform(&self) -> [f64; 6] {
        [self.dx, 0.0, self.origin_x, 0.0, -self.dy, self.origin_y]
    }

    /// Apply the affine transform to (possibly fractional) pixel coordinates.
    pub fn pixel_to_coord(&self, col: f64, row: f64) -> (f64, f64) {
        (self.origin_x + col * self.dx, self.origin_y - row * self.dy)
    }

    /// Footprint of a pixel.
    pub fn cell(&self, col: usize, row: usize) -> GridCell {
        let (min_x, max_y) = self.pixel_to_coord(col as f64, row as f64);
        let (max_x, min_y) = self.pixel_to_coord(col as f64 + 1.0, row as f64 + 1.0);
        GridCell {
            col,
            row,
            bounds: BoundingBox::new(min_x, min_y, max_x, max_y),
        }
    }

    /// Pixel containing the coordinate, if any.
    pub fn cell_of(&self, x: f64, y: f64) -> Option<(usize, usize)> {
        if self.is_empty() {
            return None;
        }
        let col = ((x - self.origin_x) / self.dx).floor();
        let row = ((self.origin_y - y) / self.dy).floor();

        if col < 0.0 || row < 0.0 || col >= self.nx as f64 || row >= self.ny as f64 {
            return None;
        }

        Some((col as usize, row as usize))
    }

    /// Get the 1D array index for a 2D grid position.
    pub fn flat_index(&self, col: usize, row: usize) -> usize {
        row * self.nx + col
    }

    /// Iterate all cells in row-major order.
    pub fn cells(&self) -> impl Iterator<Item = GridCell> + '_ {
        (0..self.ny).flat_map(move |row| (0..self.nx).map(move |col| self.cell(col, row)))
    }

    /// True when both grids describe the same pixels.
    pub fn aligned_with(&self, other: &GeoGrid) -> bool {
        self.nx == other.nx
            && self.ny == other.ny
            && (self.origin_x - other.origin_x).abs() < GRID_EPSILON
            && (self.origin_y - other.origin_y).abs() < GRID_EPSILON
            && (self.dx - other.dx).abs() < GRID_EPSILON
            && (self.dy - other.dy).abs() < GRID_EPSILON
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grid() -> GeoGrid {
        GeoGrid::new(10.0, 54.0, 0.5, 0.25, 4, 2)
    }

    #[test]
    fn test_bbox() {
        let bbox = grid().bbox();
        assert_eq!(bbox, BoundingBox::new(10.0, 53.5, 12.0, 54.0));
    }

    #[test]
    fn test_cell_of_and_back() {
        let g = grid();
        assert_eq!(g.cell_of(10.1, 53.9), Some((0, 0)));
        assert_eq!(g.cell_of(11.9, 53.6), Some((3, 1)));
        assert_eq!(g.cell_of(9.9, 53.9), None);
        assert_eq!(g.cell_of(10.1, 54.1), None);

        let cell = g.cell(3, 1);
        let (cx, cy) = cell.center();
        assert_eq!(g.cell_of(cx, cy), Some((3, 1)));
    }

    #[test]
    fn test_covering_rounds_up() {
        let g = GeoGrid::covering(&BoundingBox::new(0.0, 0.0, 0.25, 0.1), 0.1);
        assert_eq!(g.nx, 3);
        assert_eq!(g.ny, 1);
        assert_eq!(g.origin_y, 0.1);
    }

    #[test]
    fn test_cells_are_row_major() {
        let g = grid();
        let order: Vec<(usize, usize)> = g.cells().map(|c| (c.col, c.row)).take(5).collect();
        assert_eq!(order, vec![(0, 0), (1, 0), (2, 0), (3, 0), (0, 1)]);
        assert_eq!(g.flat_index(0, 1), 4);
    }
}
