pub mod dem;
pub mod error;
pub mod lidar;
pub mod parameters;
pub mod raster;
pub mod rasterise;
pub mod steps;
pub mod tile_name;
pub mod voxel;

/// subtracted from max coordinates before converting them to cells,
/// makes the max edge of an inclusive query land in the last row/column
pub const EPSILON: f64 = 1e-4;

/// byte raster value of unset cells
pub const NODATA: u8 = 0;

pub const COMPRESSED_ASCII_EXTENSION: &str = "asp";
pub const GRID_EXTENSION: &str = "obj";

// las classification of ground returns
const LAS_GROUND_CLASS: u8 = 2;

pub use dem::SurfaceTriangulation;
pub use error::{Error, Result};
pub use parameters::{GridParameters, RasteriserParameters, TriangulationParameters};
pub use raster::{ByteRaster, Raster, RasterBounds, RcIndex};
pub use voxel::VoxelGrid;
