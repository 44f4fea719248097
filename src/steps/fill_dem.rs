use crate::raster::Raster;
use crate::voxel::GapFillReport;
use crate::{Result, SurfaceTriangulation, TriangulationParameters, VoxelGrid, LAS_GROUND_CLASS};

use geo::Rect;
use log::{log, Level};

/// Triangulates the cells of the grid that have a ground height, at their
/// centres, and fills the cells inside `rect` that have none.
///
/// A grid without a single ground height fails with `NoTriangulationPoints`.
pub fn fill_missing_heights(
    grid: &mut VoxelGrid,
    rect: Rect,
    params: TriangulationParameters,
) -> Result<GapFillReport> {
    let mut tri =
        SurfaceTriangulation::new(grid.rows(), grid.cols(), grid.bounds().extent(), params)?;

    for row in 0..grid.rows() as i32 {
        for col in 0..grid.cols() as i32 {
            let z = grid.get_ground_height(row, col)?;
            if !z.is_nan() {
                tri.add_point_cell(row, col, z, LAS_GROUND_CLASS)?;
            }
        }
    }
    log!(
        Level::Debug,
        "{}: triangulating {} known ground heights",
        grid.name(),
        tri.vertex_count()
    );

    tri.create()?;
    grid.set_missing_heights_from_triangulation(&tri, rect)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Error, GridParameters};

    use assert_approx_eq::assert_approx_eq;
    use geo::coord;

    fn extent() -> Rect {
        Rect::new(coord! { x: 0., y: 0. }, coord! { x: 10., y: 10. })
    }

    #[test]
    fn hole_is_filled_from_neighbours() -> Result<()> {
        let mut grid = VoxelGrid::new("hole", 10, 10, extent(), GridParameters::default())?;
        for row in 0..10 {
            for col in 0..10 {
                if (4..7).contains(&row) && (4..7).contains(&col) {
                    continue;
                }
                // ground plane z = y - 0.5
                let (x, y) = (col as f64 + 0.5, row as f64 + 0.5);
                assert!(grid.add_point(x, y, row as f64, LAS_GROUND_CLASS, true));
            }
        }

        let report = fill_missing_heights(&mut grid, extent(), TriangulationParameters::default())?;
        assert_eq!(report.missing_before, 9);
        assert_eq!(report.missing_after, 0);

        assert_approx_eq!(grid.get_ground_height(5, 5)?, 5., 1e-6);
        assert_approx_eq!(grid.get_ground_height(4, 6)?, 4., 1e-6);
        assert_approx_eq!(grid.get_ground_height(6, 4)?, 6., 1e-6);

        grid.sort_and_trim();
        let reference = grid.bin(5, 5)?.ground_reference;
        assert_eq!(reference.map(|p| p.class), Some(LAS_GROUND_CLASS));
        Ok(())
    }

    #[test]
    fn only_cells_inside_rect_are_filled() -> Result<()> {
        let mut grid = VoxelGrid::new("partial", 10, 10, extent(), GridParameters::default())?;
        for (x, y) in [(0.5, 0.5), (9.5, 0.5), (0.5, 9.5), (9.5, 9.5)] {
            grid.add_point(x, y, 2., LAS_GROUND_CLASS, true);
        }

        let rect = Rect::new(coord! { x: 1., y: 1. }, coord! { x: 5., y: 5. });
        let report = fill_missing_heights(&mut grid, rect, TriangulationParameters::default())?;
        assert_eq!(report.missing_before, 16);
        assert_eq!(report.missing_after, 0);
        assert!(grid.get_ground_height(7, 7)?.is_nan());
        assert_approx_eq!(grid.get_ground_height(2, 3)?, 2., 1e-6);
        Ok(())
    }

    #[test]
    fn empty_grid_cannot_be_filled() -> Result<()> {
        let mut grid = VoxelGrid::new("empty", 4, 4, extent(), GridParameters::default())?;
        let result = fill_missing_heights(&mut grid, extent(), TriangulationParameters::default());
        assert!(matches!(result, Err(Error::NoTriangulationPoints)));
        Ok(())
    }
}
