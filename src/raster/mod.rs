pub mod ascii;
mod bounds;
mod byte_raster;

pub use bounds::{RasterBounds, RcIndex};
pub use byte_raster::ByteRaster;

use crate::Result;

/// Anything that answers a value for a coordinate or a cell.
///
/// Missing values are NaN, never an error. Only cell indices outside the
/// grid are errors.
pub trait Raster {
    fn bounds(&self) -> &RasterBounds;

    fn value_at(&self, x: f64, y: f64) -> f64;

    fn value(&self, row: i32, col: i32) -> Result<f64>;
}
