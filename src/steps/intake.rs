use crate::lidar::{LasPoint, PointSource};
use crate::{Result, SurfaceTriangulation, VoxelGrid, LAS_GROUND_CLASS};

use log::{log, Level};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct IntakeReport {
    pub accepted: u64,
    // outside the target or filtered out
    pub rejected: u64,
}

pub fn is_ground_return(p: &LasPoint) -> bool {
    p.classification == LAS_GROUND_CLASS
}

fn pull_points(
    source: &mut dyn PointSource,
    mut add: impl FnMut(&LasPoint) -> bool,
) -> Result<IntakeReport> {
    let mut report = IntakeReport::default();

    for (i, point) in source.points().enumerate() {
        let point = match point {
            Ok(p) => p,
            Err(e) => {
                log!(Level::Warn, "Point number {i} could not be read: {e}");
                return Err(e);
            }
        };

        if add(&point) {
            report.accepted += 1;
        } else {
            report.rejected += 1;
        }
    }
    Ok(report)
}

/// Buckets every point of `source` into the grid. A failed read aborts the
/// intake and leaves the points read so far in the grid.
pub fn grid_points(
    grid: &mut VoxelGrid,
    source: &mut dyn PointSource,
    is_ground: impl Fn(&LasPoint) -> bool,
) -> Result<IntakeReport> {
    let report = pull_points(source, |p| {
        grid.add_point(p.x, p.y, p.z, p.classification, is_ground(p))
    })?;

    log!(
        Level::Info,
        "{}: {} points gridded, {} outside",
        grid.name(),
        report.accepted,
        report.rejected
    );
    Ok(report)
}

/// Buffers the points passing `filter` as triangulation vertices
pub fn triangulate_points(
    tri: &mut SurfaceTriangulation,
    source: &mut dyn PointSource,
    filter: impl Fn(&LasPoint) -> bool,
) -> Result<IntakeReport> {
    let report = pull_points(source, |p| {
        filter(p) && tri.add_point(p.x, p.y, p.z, p.classification)
    })?;

    log!(
        Level::Info,
        "{} triangulation vertices buffered, {} points skipped",
        report.accepted,
        report.rejected
    );
    Ok(report)
}
