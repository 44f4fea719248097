use super::ascii::{self, AsciiHeader};
use super::{Raster, RasterBounds, RcIndex};
use crate::{Error, Result, NODATA};

use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::ops::{Index, IndexMut};
use std::path::Path;

use geo::{Coord, Rect};

/// Dense byte grid, 0 is reserved for unset cells
#[derive(Clone, Debug, PartialEq)]
pub struct ByteRaster {
    bounds: RasterBounds,
    // row-major, row 0 is the southernmost row
    cells: Vec<u8>,
}

impl ByteRaster {
    pub fn new(rows: usize, cols: usize, extent: Rect) -> Result<ByteRaster> {
        Ok(ByteRaster::with_bounds(RasterBounds::new(rows, cols, extent)?))
    }

    /// one cell per unit of the extent
    pub fn from_extent(extent: Rect) -> Result<ByteRaster> {
        Ok(ByteRaster::with_bounds(RasterBounds::from_extent(extent)?))
    }

    pub fn with_bounds(bounds: RasterBounds) -> ByteRaster {
        ByteRaster {
            cells: vec![NODATA; bounds.rows() * bounds.cols()],
            bounds,
        }
    }

    pub fn cells(&self) -> &[u8] {
        &self.cells
    }

    pub fn row(&self, row: usize) -> &[u8] {
        let cols = self.bounds.cols();
        &self.cells[row * cols..(row + 1) * cols]
    }

    /// Returns false when (x, y) is outside the raster
    pub fn set_value(&mut self, x: f64, y: f64, value: u8) -> bool {
        let rc = self.bounds.proj_to_cell(x, y);
        if rc.is_empty() {
            return false;
        }
        self[(rc.row as usize, rc.col as usize)] = value;
        true
    }

    pub fn set_value_cell(&mut self, row: i32, col: i32, value: u8) -> Result<()> {
        self.check_cell(row, col)?;
        self[(row as usize, col as usize)] = value;
        Ok(())
    }

    /// Resets every cell to NODATA
    pub fn clear(&mut self) {
        self.cells.fill(NODATA);
    }

    fn check_cell(&self, row: i32, col: i32) -> Result<()> {
        if !self.bounds.contains_cell(row, col) {
            return Err(Error::CellOutOfRange {
                row,
                col,
                rows: self.bounds.rows(),
                cols: self.bounds.cols(),
            });
        }
        Ok(())
    }

    // the cells covering [min, max] with max pulled back by EPSILON
    fn window(&self, min_x: i32, min_y: i32, max_x: i32, max_y: i32) -> Result<(RcIndex, RcIndex)> {
        let start = self.bounds.proj_to_cell(min_x as f64, min_y as f64);
        let end = self.bounds.max_corner_to_cell(max_x as f64, max_y as f64);

        if start.is_empty() || end.is_empty() || end.row < start.row || end.col < start.col {
            return Err(Error::InvalidWindow {
                min_x,
                min_y,
                max_x,
                max_y,
            });
        }
        Ok((start, end))
    }

    /// Copies the cells covering the window into a new raster.
    ///
    /// The new extent is the requested window while the row and column counts
    /// follow the cells of this raster the window snaps to.
    pub fn crop(&self, min_x: i32, min_y: i32, max_x: i32, max_y: i32) -> Result<ByteRaster> {
        let (start, end) = self.window(min_x, min_y, max_x, max_y)?;
        let rows = (end.row - start.row + 1) as usize;
        let cols = (end.col - start.col + 1) as usize;

        let extent = Rect::new(
            Coord {
                x: min_x as f64,
                y: min_y as f64,
            },
            Coord {
                x: max_x as f64,
                y: max_y as f64,
            },
        );
        let mut cropped = ByteRaster::new(rows, cols, extent)?;

        let c0 = start.col as usize;
        for (ri, row) in (start.row as usize..=end.row as usize).enumerate() {
            let src = &self.row(row)[c0..c0 + cols];
            cropped.cells[ri * cols..(ri + 1) * cols].copy_from_slice(src);
        }
        Ok(cropped)
    }

    /// Writes an ascii grid, `.asp` files are run-length encoded
    pub fn write_as_ascii(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let compressed = ascii::is_compressed(path);
        let mut writer = BufWriter::new(File::create(path)?);

        AsciiHeader {
            cols: self.bounds.cols(),
            rows: self.bounds.rows(),
            xll: self.bounds.min_x(),
            yll: self.bounds.min_y(),
            cell_size: self.bounds.cell_width(),
        }
        .write(&mut writer)?;

        for row in (0..self.bounds.rows()).rev() {
            ascii::write_row(&mut writer, self.row(row), compressed)?;
        }
        writer.flush()?;
        Ok(())
    }

    /// Writes the window [min, max] without building the cropped raster
    pub fn write_window_as_ascii(
        &self,
        path: impl AsRef<Path>,
        min_x: i32,
        min_y: i32,
        max_x: i32,
        max_y: i32,
    ) -> Result<()> {
        let path = path.as_ref();
        let (start, end) = self.window(min_x, min_y, max_x, max_y)?;
        let compressed = ascii::is_compressed(path);
        let mut writer = BufWriter::new(File::create(path)?);

        AsciiHeader {
            cols: (end.col - start.col + 1) as usize,
            rows: (end.row - start.row + 1) as usize,
            xll: min_x as f64,
            yll: min_y as f64,
            cell_size: self.bounds.cell_width(),
        }
        .write(&mut writer)?;

        let (c0, c1) = (start.col as usize, end.col as usize);
        for row in (start.row as usize..=end.row as usize).rev() {
            ascii::write_row(&mut writer, &self.row(row)[c0..=c1], compressed)?;
        }
        writer.flush()?;
        Ok(())
    }

    pub fn from_ascii(path: impl AsRef<Path>) -> Result<ByteRaster> {
        let path = path.as_ref();
        let reader = BufReader::new(File::open(path)?);
        let grid = ascii::parse(reader, path, ascii::is_compressed(path))?;

        let h = grid.header;
        let extent = Rect::new(
            Coord { x: h.xll, y: h.yll },
            Coord {
                x: h.xll + (h.cols as f64 * h.cell_size).ceil(),
                y: h.yll + (h.rows as f64 * h.cell_size).ceil(),
            },
        );
        Ok(ByteRaster {
            bounds: RasterBounds::new(h.rows, h.cols, extent)?,
            cells: grid.cells,
        })
    }
}

fn byte_to_value(v: u8) -> f64 {
    if v == NODATA {
        f64::NAN
    } else {
        v as f64
    }
}

impl Raster for ByteRaster {
    fn bounds(&self) -> &RasterBounds {
        &self.bounds
    }

    fn value_at(&self, x: f64, y: f64) -> f64 {
        let rc = self.bounds.proj_to_cell(x, y);
        if rc.is_empty() {
            return f64::NAN;
        }
        byte_to_value(self[(rc.row as usize, rc.col as usize)])
    }

    fn value(&self, row: i32, col: i32) -> Result<f64> {
        self.check_cell(row, col)?;
        Ok(byte_to_value(self[(row as usize, col as usize)]))
    }
}

impl Index<(usize, usize)> for ByteRaster {
    type Output = u8;

    fn index(&self, (row, col): (usize, usize)) -> &u8 {
        &self.cells[self.bounds.index(row, col)]
    }
}

impl IndexMut<(usize, usize)> for ByteRaster {
    fn index_mut(&mut self, (row, col): (usize, usize)) -> &mut u8 {
        let i = self.bounds.index(row, col);
        &mut self.cells[i]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use scopeguard::defer;
    use std::path::PathBuf;

    fn temp_path(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("terrain_raster_{}_{name}", std::process::id()))
    }

    fn sample() -> ByteRaster {
        let extent = Rect::new(Coord { x: 500., y: 7000. }, Coord { x: 520., y: 7010. });
        let mut r = ByteRaster::new(10, 20, extent).unwrap();
        for row in 0..10 {
            for col in 0..20 {
                if (row + col) % 3 == 0 {
                    r[(row, col)] = (row * 20 + col) as u8;
                }
            }
        }
        r[(9, 19)] = 255;
        r
    }

    #[test]
    fn values_and_nodata() -> Result<()> {
        let mut r = sample();
        // cell (0, 0) holds 0
        assert!(r.value_at(500.5, 7000.5).is_nan());
        assert_eq!(r.value_at(519.5, 7009.5), 255.);
        assert!(r.value_at(520., 7005.).is_nan());

        assert!(r.set_value(501.2, 7000.1, 42));
        assert_eq!(r.value(0, 1)?, 42.);
        assert!(!r.set_value(499.9, 7000.1, 42));

        assert!(r.value(10, 0).is_err());
        assert!(r.set_value_cell(0, 20, 1).is_err());
        Ok(())
    }

    #[test]
    fn ascii_round_trip() -> Result<()> {
        let r = sample();
        for name in ["plain.asc", "compressed.asp"] {
            let path = temp_path(name);
            defer! {
                let _ = std::fs::remove_file(&path);
            }
            r.write_as_ascii(&path)?;
            let read = ByteRaster::from_ascii(&path)?;
            assert_eq!(read, r);
        }
        Ok(())
    }

    #[test]
    fn compressed_file_layout() -> Result<()> {
        let extent = Rect::new(Coord { x: 0., y: 0. }, Coord { x: 4., y: 2. });
        let mut r = ByteRaster::new(2, 4, extent)?;
        r[(1, 2)] = 5;
        r[(1, 3)] = 5;

        let path = temp_path("layout.asp");
        defer! {
            let _ = std::fs::remove_file(&path);
        }
        r.write_as_ascii(&path)?;
        let text = std::fs::read_to_string(&path)?;
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "ncols         4");
        assert_eq!(lines[4], "cellsize      1");
        assert_eq!(lines[5], "NODATA_value  0");
        // northernmost row first
        assert_eq!(lines[6], "2x0 2x5");
        assert_eq!(lines[7], "4x0");
        Ok(())
    }

    #[test]
    fn crop_to_full_extent_is_identity() -> Result<()> {
        let r = sample();
        let cropped = r.crop(500, 7000, 520, 7010)?;
        assert_eq!(cropped, r);
        Ok(())
    }

    #[test]
    fn crop_inner_window() -> Result<()> {
        let r = sample();
        let cropped = r.crop(502, 7001, 505, 7003)?;
        assert_eq!(cropped.bounds().rows(), 2);
        assert_eq!(cropped.bounds().cols(), 3);
        assert_eq!(cropped.bounds().min_x(), 502.);
        assert_eq!(cropped.bounds().max_y(), 7003.);
        for row in 0..2 {
            for col in 0..3 {
                assert_eq!(cropped[(row, col)], r[(row + 1, col + 2)]);
            }
        }

        assert!(matches!(
            r.crop(490, 7000, 505, 7003),
            Err(Error::InvalidWindow { .. })
        ));
        Ok(())
    }

    #[test]
    fn window_write_matches_crop() -> Result<()> {
        let r = sample();
        let window = temp_path("window.asc");
        let cropped = temp_path("cropped.asc");
        defer! {
            let _ = std::fs::remove_file(&window);
            let _ = std::fs::remove_file(&cropped);
        }
        r.write_window_as_ascii(&window, 503, 7002, 511, 7009)?;
        r.crop(503, 7002, 511, 7009)?.write_as_ascii(&cropped)?;
        assert_eq!(std::fs::read_to_string(&window)?, std::fs::read_to_string(&cropped)?);
        Ok(())
    }
}
