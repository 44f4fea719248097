mod bin;
mod grid;

pub use bin::{Bin, BinPoint};
pub use grid::{GapFillReport, VoxelGrid};
