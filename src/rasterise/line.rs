use crate::raster::{ByteRaster, Raster};

use geo::LineString;

/// Cells visited by a Bresenham walk from (ax, ay) to (bx, by), both ends included.
///
/// Consecutive cells share an edge except on perfect diagonals, which step
/// one cell diagonally at a time.
pub struct CellLine {
    x: i32,
    y: i32,
    x_inc: i32,
    y_inc: i32,
    // doubled deltas outside the diagonal case
    dx: i32,
    dy: i32,
    side: i32,
    error: i32,
    remaining: i32,
    diagonal: bool,
    started: bool,
}

impl CellLine {
    pub fn new(ax: i32, ay: i32, bx: i32, by: i32) -> CellLine {
        let x_inc = if bx < ax { -1 } else { 1 };
        let y_inc = if by < ay { -1 } else { 1 };
        let dx = x_inc * (bx - ax);
        let dy = y_inc * (by - ay);

        let diagonal = dx == dy;
        let side = -((if dx == 0 { y_inc } else { x_inc }) - 1);

        let (remaining, error, dx, dy) = if diagonal {
            (dx, 0, dx, dy)
        } else {
            (dx + dy, dx - dy, 2 * dx, 2 * dy)
        };

        CellLine {
            x: ax,
            y: ay,
            x_inc,
            y_inc,
            dx,
            dy,
            side,
            error,
            remaining,
            diagonal,
            started: false,
        }
    }
}

impl Iterator for CellLine {
    type Item = (i32, i32);

    fn next(&mut self) -> Option<(i32, i32)> {
        if !self.started {
            self.started = true;
            return Some((self.x, self.y));
        }
        if self.remaining <= 0 {
            return None;
        }
        self.remaining -= 1;

        if self.diagonal {
            self.x += self.x_inc;
            self.y += self.y_inc;
        } else if self.error > 0 || self.error == self.side {
            self.x += self.x_inc;
            self.error -= self.dy;
        } else {
            self.y += self.y_inc;
            self.error += self.dx;
        }
        Some((self.x, self.y))
    }
}

/// Stamps every cell on the segments of `line`, segments with an end
/// outside the raster are skipped
pub fn draw_line_string(raster: &mut ByteRaster, line: &LineString, value: u8) {
    let bounds = *raster.bounds();
    for segment in line.lines() {
        let a = bounds.proj_to_cell(segment.start.x, segment.start.y);
        let b = bounds.proj_to_cell(segment.end.x, segment.end.y);
        if a.is_empty() || b.is_empty() {
            continue;
        }
        for (col, row) in CellLine::new(a.col, a.row, b.col, b.row) {
            raster[(row as usize, col as usize)] = value;
        }
    }
}
