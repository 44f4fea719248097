use crate::raster::RasterBounds;

use geo::Rect;

/// Coarse lookup from a grid cell to the triangles whose envelope overlaps it
#[derive(Clone, Debug)]
pub struct TriangleIndexGrid {
    bounds: RasterBounds,
    cells: Vec<Vec<usize>>,
}

impl TriangleIndexGrid {
    pub fn new(bounds: RasterBounds) -> TriangleIndexGrid {
        TriangleIndexGrid {
            cells: vec![Vec::new(); bounds.rows() * bounds.cols()],
            bounds,
        }
    }

    pub fn bounds(&self) -> &RasterBounds {
        &self.bounds
    }

    pub fn clear(&mut self) {
        for cell in &mut self.cells {
            cell.clear();
        }
    }

    /// Stamps `index` into every cell overlapped by `envelope`, the parts of
    /// the envelope outside the grid are dropped
    pub fn add_index(&mut self, envelope: Rect, index: usize) {
        let rows = self.bounds.rows() as i32;
        let cols = self.bounds.cols() as i32;
        let min = self.bounds.unbounded_cell(envelope.min().x, envelope.min().y);
        let max = self.bounds.unbounded_cell(envelope.max().x, envelope.max().y);

        if max.row < 0 || max.col < 0 || min.row >= rows || min.col >= cols {
            return;
        }

        for row in min.row.max(0)..=max.row.min(rows - 1) {
            for col in min.col.max(0)..=max.col.min(cols - 1) {
                let i = self.bounds.index(row as usize, col as usize);
                self.cells[i].push(index);
            }
        }
    }

    /// Triangles that may contain (x, y), empty outside the grid
    pub fn indexes_at(&self, x: f64, y: f64) -> &[usize] {
        let rc = self.bounds.proj_to_cell(x, y);
        if rc.is_empty() {
            return &[];
        }
        &self.cells[self.bounds.index(rc.row as usize, rc.col as usize)]
    }
}
