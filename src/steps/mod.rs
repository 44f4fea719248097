pub mod fill_dem;
pub mod intake;
pub mod reclassify;

pub use self::fill_dem::fill_missing_heights;
pub use self::intake::{grid_points, is_ground_return, triangulate_points, IntakeReport};
pub use self::reclassify::{reclassify_file, reclassify_points};
