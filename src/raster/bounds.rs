use crate::{Error, Result, EPSILON};

use geo::{Coord, Rect};
use serde::{Deserialize, Serialize};

/// Row and column of a raster cell, row 0 is the southernmost row
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct RcIndex {
    pub row: i32,
    pub col: i32,
}

impl RcIndex {
    /// a coordinate outside the raster
    pub const EMPTY: RcIndex = RcIndex {
        row: i32::MIN,
        col: i32::MIN,
    };

    pub fn new(row: i32, col: i32) -> RcIndex {
        RcIndex { row, col }
    }

    pub fn is_empty(&self) -> bool {
        *self == RcIndex::EMPTY
    }
}

/// Maps the half-open extent [min_x, max_x) x [min_y, max_y) onto a fixed grid
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct RasterBounds {
    rows: usize,
    cols: usize,
    min_x: f64,
    min_y: f64,
    max_x: f64,
    max_y: f64,
}

impl RasterBounds {
    pub fn new(rows: usize, cols: usize, extent: Rect) -> Result<RasterBounds> {
        if rows == 0 || cols == 0 || extent.width() <= 0. || extent.height() <= 0. {
            return Err(Error::InvalidBounds);
        }
        Ok(RasterBounds {
            rows,
            cols,
            min_x: extent.min().x,
            min_y: extent.min().y,
            max_x: extent.max().x,
            max_y: extent.max().y,
        })
    }

    /// one cell per unit of the extent, partial units are dropped
    pub fn from_extent(extent: Rect) -> Result<RasterBounds> {
        let rows = extent.height().floor().max(0.) as usize;
        let cols = extent.width().floor().max(0.) as usize;
        RasterBounds::new(rows, cols, extent)
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn min_x(&self) -> f64 {
        self.min_x
    }

    pub fn min_y(&self) -> f64 {
        self.min_y
    }

    pub fn max_x(&self) -> f64 {
        self.max_x
    }

    pub fn max_y(&self) -> f64 {
        self.max_y
    }

    pub fn width(&self) -> f64 {
        self.max_x - self.min_x
    }

    pub fn height(&self) -> f64 {
        self.max_y - self.min_y
    }

    pub fn cell_width(&self) -> f64 {
        self.width() / self.cols as f64
    }

    pub fn cell_height(&self) -> f64 {
        self.height() / self.rows as f64
    }

    pub fn extent(&self) -> Rect {
        Rect::new(
            Coord {
                x: self.min_x,
                y: self.min_y,
            },
            Coord {
                x: self.max_x,
                y: self.max_y,
            },
        )
    }

    /// Cell containing (x, y) or `RcIndex::EMPTY` when outside the extent
    pub fn proj_to_cell(&self, x: f64, y: f64) -> RcIndex {
        // written so that NaN also ends up outside
        if !(x >= self.min_x && x < self.max_x && y >= self.min_y && y < self.max_y) {
            return RcIndex::EMPTY;
        }

        let row = ((y - self.min_y) / self.cell_height()) as i32;
        let col = ((x - self.min_x) / self.cell_width()) as i32;

        // rounding can push a coordinate just below max onto the next cell
        RcIndex {
            row: row.min(self.rows as i32 - 1),
            col: col.min(self.cols as i32 - 1),
        }
    }

    /// Cell of a max corner, the corner is pulled back by `EPSILON` so an
    /// inclusive [min, max] query also covers the last row and column
    pub fn max_corner_to_cell(&self, x: f64, y: f64) -> RcIndex {
        self.proj_to_cell(x - EPSILON, y - EPSILON)
    }

    /// Cell indices of (x, y) extended past the raster edges, not range checked
    pub fn unbounded_cell(&self, x: f64, y: f64) -> RcIndex {
        RcIndex {
            row: ((y - self.min_y) / self.cell_height()).floor() as i32,
            col: ((x - self.min_x) / self.cell_width()).floor() as i32,
        }
    }

    pub fn contains_cell(&self, row: i32, col: i32) -> bool {
        row >= 0 && col >= 0 && (row as usize) < self.rows && (col as usize) < self.cols
    }

    pub fn cell_bottom_left_to_proj(&self, row: i32, col: i32) -> Result<Coord> {
        if !self.contains_cell(row, col) {
            return Err(Error::CellOutOfRange {
                row,
                col,
                rows: self.rows,
                cols: self.cols,
            });
        }
        Ok(Coord {
            x: self.min_x + col as f64 * self.cell_width(),
            y: self.min_y + row as f64 * self.cell_height(),
        })
    }

    pub fn cell_top_right_to_proj(&self, row: i32, col: i32) -> Result<Coord> {
        let bl = self.cell_bottom_left_to_proj(row, col)?;
        Ok(Coord {
            x: bl.x + self.cell_width(),
            y: bl.y + self.cell_height(),
        })
    }

    pub fn cell_center_to_proj(&self, row: i32, col: i32) -> Result<Coord> {
        let bl = self.cell_bottom_left_to_proj(row, col)?;
        Ok(Coord {
            x: bl.x + self.cell_width() / 2.,
            y: bl.y + self.cell_height() / 2.,
        })
    }

    #[inline]
    pub(crate) fn index(&self, row: usize, col: usize) -> usize {
        row * self.cols + col
    }
}
