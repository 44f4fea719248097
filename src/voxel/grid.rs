use super::bin::{Bin, BinPoint};
use crate::dem::SurfaceTriangulation;
use crate::raster::{Raster, RasterBounds, RcIndex};
use crate::{Error, GridParameters, Result, GRID_EXTENSION};

use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use geo::{Coord, Rect};
use log::{log, Level};
use serde::{Deserialize, Serialize};

const GRID_MAGIC: [u8; 4] = *b"VXGR";
const GRID_VERSION: u32 = 1;

#[derive(Debug, Serialize, Deserialize)]
struct GridHeader {
    magic: [u8; 4],
    version: u32,
}

/// Cells counted by a gap fill, cells outside the triangulated hull stay missing
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct GapFillReport {
    pub missing_before: usize,
    pub missing_after: usize,
}

/// Point samples bucketed per cell, with a ground height raster on the side
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct VoxelGrid {
    name: String,
    bounds: RasterBounds,
    bins: Vec<Bin>,
    // running max of the ground samples, NaN until set
    dem: Vec<f64>,
    sorted: bool,
    params: GridParameters,
}

impl VoxelGrid {
    pub fn new(
        name: &str,
        rows: usize,
        cols: usize,
        extent: Rect,
        params: GridParameters,
    ) -> Result<VoxelGrid> {
        let bounds = RasterBounds::new(rows, cols, extent)?;
        Ok(VoxelGrid {
            name: name.to_string(),
            bounds,
            bins: vec![Bin::default(); rows * cols],
            dem: vec![f64::NAN; rows * cols],
            sorted: false,
            params,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn rows(&self) -> usize {
        self.bounds.rows()
    }

    pub fn cols(&self) -> usize {
        self.bounds.cols()
    }

    pub fn is_sorted(&self) -> bool {
        self.sorted
    }

    pub fn grid_indexes(&self, x: f64, y: f64) -> RcIndex {
        self.bounds.proj_to_cell(x, y)
    }

    fn cell_index(&self, row: i32, col: i32) -> Result<usize> {
        if !self.bounds.contains_cell(row, col) {
            return Err(Error::CellOutOfRange {
                row,
                col,
                rows: self.rows(),
                cols: self.cols(),
            });
        }
        Ok(self.bounds.index(row as usize, col as usize))
    }

    fn sorted_bin(&self, row: i32, col: i32) -> Result<&Bin> {
        if !self.sorted {
            return Err(Error::NotSorted);
        }
        let i = self.cell_index(row, col)?;
        Ok(&self.bins[i])
    }

    /// Adds a sample, returns false when (x, y) is outside the grid.
    ///
    /// Ground samples raise the cell's ground height to their z when higher.
    pub fn add_point(&mut self, x: f64, y: f64, z: f64, class: u8, is_ground: bool) -> bool {
        let rc = self.bounds.proj_to_cell(x, y);
        if rc.is_empty() {
            return false;
        }
        let i = self.bounds.index(rc.row as usize, rc.col as usize);
        let z = self.params.negative_heights.apply(z);

        if is_ground {
            let dem = &mut self.dem[i];
            if dem.is_nan() || z > *dem {
                *dem = z;
            }
        }
        self.bins[i].add_point(z, class, is_ground);
        self.sorted = false;
        true
    }

    /// Must run after the last `add_point` and before any sorted query
    pub fn sort_and_trim(&mut self) {
        for bin in &mut self.bins {
            bin.sort_and_trim();
        }
        self.sorted = true;
    }

    pub fn bin(&self, row: i32, col: i32) -> Result<&Bin> {
        let i = self.cell_index(row, col)?;
        Ok(&self.bins[i])
    }

    /// Non-ground points from highest to lowest
    pub fn get_points(&self, row: i32, col: i32) -> Result<&[BinPoint]> {
        Ok(self.sorted_bin(row, col)?.other_points())
    }

    pub fn get_ground_points(&self, row: i32, col: i32) -> Result<&[BinPoint]> {
        Ok(self.sorted_bin(row, col)?.ground_points())
    }

    pub fn get_ground_median(&self, row: i32, col: i32) -> Result<f64> {
        Ok(self.sorted_bin(row, col)?.ground_median())
    }

    pub fn get_highest_point_in_class_range(
        &self,
        row: i32,
        col: i32,
        low: u8,
        high: u8,
    ) -> Result<Option<BinPoint>> {
        Ok(self.sorted_bin(row, col)?.highest_in_class_range(low, high))
    }

    /// Ground height of a cell, NaN when unknown
    pub fn get_ground_height(&self, row: i32, col: i32) -> Result<f64> {
        let i = self.cell_index(row, col)?;
        Ok(self.dem[i])
    }

    /// Ground height at (x, y), NaN outside the grid
    pub fn get_height(&self, x: f64, y: f64) -> f64 {
        let rc = self.bounds.proj_to_cell(x, y);
        if rc.is_empty() {
            return f64::NAN;
        }
        self.dem[self.bounds.index(rc.row as usize, rc.col as usize)]
    }

    /// True when the highest point with a class in `low..=high` in the center
    /// cell is strictly higher than every such point in the
    /// (2 * radius + 1)^2 window around it. Equal heights lose.
    pub fn is_highest_bin_in_neighborhood(
        &self,
        center_row: i32,
        center_col: i32,
        radius: i32,
        low: u8,
        high: u8,
    ) -> Result<bool> {
        let Some(center) =
            self.get_highest_point_in_class_range(center_row, center_col, low, high)?
        else {
            return Ok(false);
        };

        let row_start = center_row.saturating_sub(radius).max(0);
        let row_end = center_row.saturating_add(radius).min(self.rows() as i32 - 1);
        let col_start = center_col.saturating_sub(radius).max(0);
        let col_end = center_col.saturating_add(radius).min(self.cols() as i32 - 1);

        for row in row_start..=row_end {
            for col in col_start..=col_end {
                if row == center_row && col == center_col {
                    continue;
                }
                let i = self.bounds.index(row as usize, col as usize);
                if let Some(other) = self.bins[i].highest_in_class_range(low, high) {
                    if other.z_cm >= center.z_cm {
                        return Ok(false);
                    }
                }
            }
        }
        Ok(true)
    }

    // (index, center) of every cell whose center lies in `rect`
    fn cells_in(&self, rect: Rect) -> Result<Vec<(usize, Coord)>> {
        let mut cells = Vec::new();
        for row in 0..self.rows() as i32 {
            for col in 0..self.cols() as i32 {
                let c = self.bounds.cell_center_to_proj(row, col)?;
                if c.x >= rect.min().x && c.x < rect.max().x && c.y >= rect.min().y && c.y < rect.max().y
                {
                    cells.push((self.bounds.index(row as usize, col as usize), c));
                }
            }
        }
        Ok(cells)
    }

    /// Fills the unknown ground heights of the cells inside `rect` from the
    /// triangulated surface and stores them as ground references
    pub fn set_missing_heights_from_triangulation(
        &mut self,
        tri: &SurfaceTriangulation,
        rect: Rect,
    ) -> Result<GapFillReport> {
        let mut report = GapFillReport::default();

        for (i, center) in self.cells_in(rect)? {
            if !self.dem[i].is_nan() {
                continue;
            }
            report.missing_before += 1;

            let (z, class) = tri.get_value(center.x, center.y)?;
            if z.is_nan() {
                report.missing_after += 1;
                continue;
            }
            self.dem[i] = z;
            self.bins[i].ground_reference = Some(BinPoint::new(z, class));
        }

        log!(
            Level::Info,
            "{}: {} cells without ground height, {} after filling from triangulation",
            self.name,
            report.missing_before,
            report.missing_after
        );
        Ok(report)
    }

    /// Sets the surface reference of the cells inside `rect` that have no
    /// other points, returns the number of references set
    pub fn set_surface_references_from_triangulation(
        &mut self,
        tri: &SurfaceTriangulation,
        rect: Rect,
    ) -> Result<usize> {
        let mut set = 0;
        for (i, center) in self.cells_in(rect)? {
            if !self.bins[i].other_points.is_empty() {
                continue;
            }
            let (z, class) = tri.get_value(center.x, center.y)?;
            if !z.is_nan() {
                self.bins[i].surface_reference = Some(BinPoint::new(z, class));
                set += 1;
            }
        }
        Ok(set)
    }

    /// Writes the grid next to `path` first and renames it into place
    pub fn serialize(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let mut tmp = path.as_os_str().to_owned();
        tmp.push(".tmp");
        let tmp = PathBuf::from(tmp);

        if let Err(e) = self.write_to(&tmp) {
            let _ = fs::remove_file(&tmp);
            return Err(e);
        }
        fs::rename(&tmp, path)?;

        log!(Level::Info, "Saved voxel grid {} to {:?}", self.name, path);
        Ok(())
    }

    fn write_to(&self, path: &Path) -> Result<()> {
        let mut writer = BufWriter::new(File::create(path)?);
        let header = GridHeader {
            magic: GRID_MAGIC,
            version: GRID_VERSION,
        };
        bincode::serialize_into(&mut writer, &header)?;
        bincode::serialize_into(&mut writer, self)?;
        writer.flush()?;
        Ok(())
    }

    /// Writes `<dir>/<name>.obj` and returns its path
    pub fn serialize_to_dir(&self, dir: impl AsRef<Path>) -> Result<PathBuf> {
        let dir = dir.as_ref();
        fs::create_dir_all(dir)?;
        let path = dir.join(format!("{}.{GRID_EXTENSION}", self.name));
        self.serialize(&path)?;
        Ok(path)
    }

    pub fn deserialize(path: impl AsRef<Path>) -> Result<VoxelGrid> {
        let path = path.as_ref();
        let mut reader = BufReader::new(File::open(path)?);

        let header: GridHeader =
            bincode::deserialize_from(&mut reader).map_err(|_| Error::InvalidGridFile {
                path: path.to_path_buf(),
            })?;
        if header.magic != GRID_MAGIC {
            return Err(Error::InvalidGridFile {
                path: path.to_path_buf(),
            });
        }
        if header.version != GRID_VERSION {
            return Err(Error::UnsupportedGridVersion(header.version));
        }

        let grid: VoxelGrid = bincode::deserialize_from(&mut reader)?;
        let cells = grid.rows() * grid.cols();
        if grid.bins.len() != cells || grid.dem.len() != cells {
            return Err(Error::InvalidGridFile {
                path: path.to_path_buf(),
            });
        }

        log!(Level::Info, "Loaded voxel grid {} from {:?}", grid.name, path);
        Ok(grid)
    }
}

impl Raster for VoxelGrid {
    fn bounds(&self) -> &RasterBounds {
        &self.bounds
    }

    fn value_at(&self, x: f64, y: f64) -> f64 {
        self.get_height(x, y)
    }

    fn value(&self, row: i32, col: i32) -> Result<f64> {
        self.get_ground_height(row, col)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parameters::NegativeHeightPolicy;
    use crate::TriangulationParameters;
    use assert_approx_eq::assert_approx_eq;
    use geo::coord;
    use scopeguard::defer;

    fn extent(min_x: f64, min_y: f64, max_x: f64, max_y: f64) -> Rect {
        Rect::new(coord! { x: min_x, y: min_y }, coord! { x: max_x, y: max_y })
    }

    #[test]
    fn points_on_the_edges() -> Result<()> {
        let eps = 1e-8;
        let mut grid = VoxelGrid::new("points", 10, 10, extent(0., 10., 10., 20.), GridParameters::default())?;

        let points = [(0., 10., 100.), (10. - eps, 20. - eps, 10.), (5., 20. - eps, 5.)];
        for (x, y, z) in points {
            assert!(grid.add_point(x, y, z, 2, true));
        }
        assert!(!grid.add_point(10., 15., 1., 2, true));
        assert!(!grid.add_point(5., 20., 1., 2, true));

        for (x, y, z) in points {
            let rc = grid.grid_indexes(x, y);
            assert_eq!(grid.get_ground_height(rc.row, rc.col)?, z);
        }
        assert_eq!(grid.grid_indexes(10. - eps, 20. - eps), RcIndex::new(9, 9));
        Ok(())
    }

    #[test]
    fn ground_height_is_the_highest_ground_sample() -> Result<()> {
        let mut grid = VoxelGrid::new("g", 2, 2, extent(0., 0., 2., 2.), GridParameters::default())?;
        grid.add_point(0.5, 0.5, 3., 2, true);
        grid.add_point(0.5, 0.5, 7., 2, true);
        grid.add_point(0.5, 0.5, 5., 2, true);
        grid.add_point(0.5, 0.5, 30., 5, false);
        grid.sort_and_trim();

        assert_eq!(grid.get_height(0.5, 0.5), 7.);
        assert_eq!(grid.get_ground_median(0, 0)?, 5.);
        assert!(grid.get_height(1.5, 1.5).is_nan());
        assert!(grid.get_height(-1., 0.5).is_nan());
        Ok(())
    }

    #[test]
    fn negative_height_policy() -> Result<()> {
        let params = GridParameters {
            negative_heights: NegativeHeightPolicy::ClampToZero,
        };
        let mut clamped = VoxelGrid::new("c", 1, 1, extent(0., 0., 1., 1.), params)?;
        clamped.add_point(0.5, 0.5, -2., 2, true);
        assert_eq!(clamped.get_ground_height(0, 0)?, 0.);

        let mut kept = VoxelGrid::new("k", 1, 1, extent(0., 0., 1., 1.), GridParameters::default())?;
        kept.add_point(0.5, 0.5, -2., 2, true);
        assert_eq!(kept.get_ground_height(0, 0)?, -2.);
        Ok(())
    }

    #[test]
    fn sorted_queries_need_sorting() -> Result<()> {
        let mut grid = VoxelGrid::new("g", 2, 2, extent(0., 0., 2., 2.), GridParameters::default())?;
        grid.add_point(0.5, 0.5, 3., 2, true);
        assert!(matches!(grid.get_ground_median(0, 0), Err(Error::NotSorted)));
        assert!(matches!(grid.get_points(0, 0), Err(Error::NotSorted)));

        grid.sort_and_trim();
        assert_eq!(grid.get_ground_median(0, 0)?, 3.);

        // new points invalidate the order
        grid.add_point(0.5, 0.5, 4., 2, true);
        assert!(matches!(grid.get_ground_points(0, 0), Err(Error::NotSorted)));
        Ok(())
    }

    #[test]
    fn local_maximum_loses_ties() -> Result<()> {
        let mut grid = VoxelGrid::new("trees", 5, 5, extent(0., 0., 5., 5.), GridParameters::default())?;
        grid.add_point(2.5, 2.5, 20., 5, false);
        grid.add_point(1.5, 1.5, 15., 5, false);
        grid.add_point(4.5, 4.5, 25., 5, false);
        // a building next to the tree is outside the class range
        grid.add_point(3.5, 2.5, 40., 6, false);
        grid.sort_and_trim();

        assert!(grid.is_highest_bin_in_neighborhood(2, 2, 1, 3, 5)?);
        assert!(!grid.is_highest_bin_in_neighborhood(2, 2, 2, 3, 5)?);
        assert!(!grid.is_highest_bin_in_neighborhood(2, 2, 1, 3, 6)?);
        // clipped window in the corner
        assert!(grid.is_highest_bin_in_neighborhood(4, 4, 3, 3, 5)?);
        // no points in range
        assert!(!grid.is_highest_bin_in_neighborhood(0, 4, 1, 3, 5)?);
        // a window larger than the grid covers all of it
        assert!(!grid.is_highest_bin_in_neighborhood(2, 2, i32::MAX, 3, 5)?);
        assert!(grid.is_highest_bin_in_neighborhood(4, 4, i32::MAX, 3, 5)?);

        grid.add_point(2.5, 1.5, 20., 4, false);
        grid.sort_and_trim();
        assert!(!grid.is_highest_bin_in_neighborhood(2, 2, 1, 3, 5)?);
        Ok(())
    }

    #[test]
    fn save_and_load() -> Result<()> {
        let eps = 1e-6;
        let mut grid = VoxelGrid::new(
            "points",
            10,
            10,
            extent(0., 100_000., 10., 200_000.),
            GridParameters::default(),
        )?;
        assert!(grid.add_point(0., 100_000., 100., 2, true));
        assert!(grid.add_point(10. - eps, 200_000. - eps, 10., 2, true));
        for z in [2.5, 10., 5.] {
            assert!(grid.add_point(5., 155_000., z, 1, false));
        }
        grid.sort_and_trim();

        let dir = std::env::temp_dir().join(format!("terrain_raster_grid_{}", std::process::id()));
        defer! {
            let _ = std::fs::remove_dir_all(&dir);
        }
        let path = grid.serialize_to_dir(&dir)?;
        assert_eq!(path, dir.join("points.obj"));
        assert!(!dir.join("points.obj.tmp").exists());

        let loaded = VoxelGrid::deserialize(&path)?;
        assert_eq!(loaded.name(), "points");
        assert!(loaded.is_sorted());
        assert_eq!(loaded.get_height(0., 100_000.), 100.);
        assert_eq!(loaded.get_height(10. - eps, 200_000. - eps), 10.);

        let rc = loaded.grid_indexes(5., 155_000.);
        let points = loaded.get_points(rc.row, rc.col)?;
        let heights: Vec<f64> = points.iter().map(|p| p.z()).collect();
        assert_eq!(heights, vec![10., 5., 2.5]);
        assert!(points.iter().all(|p| p.class == 1));
        assert_eq!(
            loaded.get_ground_points(0, 0)?,
            [BinPoint::new(100., 2)].as_slice()
        );
        assert_eq!(
            loaded.get_ground_points(9, 9)?,
            [BinPoint::new(10., 2)].as_slice()
        );
        assert!(loaded.get_ground_points(rc.row, rc.col)?.is_empty());
        assert!(loaded.get_height(5.5, 105_000.).is_nan());
        Ok(())
    }

    #[test]
    fn loading_other_files_fails() -> Result<()> {
        let path = std::env::temp_dir().join(format!("terrain_raster_bad_{}.obj", std::process::id()));
        defer! {
            let _ = std::fs::remove_file(&path);
        }
        std::fs::write(&path, b"ncols 4\nnrows 2\n")?;
        assert!(matches!(
            VoxelGrid::deserialize(&path),
            Err(Error::InvalidGridFile { .. })
        ));
        Ok(())
    }

    #[test]
    fn missing_heights_from_triangulation() -> Result<()> {
        let area = extent(0., 10., 10., 20.);
        let mut grid = VoxelGrid::new("gaps", 10, 10, area, GridParameters::default())?;
        grid.add_point(0.5, 10.5, 1., 2, true);
        grid.add_point(9.5, 19.5, 1., 2, true);
        grid.add_point(4.5, 14.5, 8., 2, true);

        let mut tri = SurfaceTriangulation::new(10, 10, area, TriangulationParameters::default())?;
        for (x, y) in [(0., 10.), (9.99, 10.), (0., 19.99), (9.99, 19.99)] {
            assert!(tri.add_point(x, y, 1., 2));
        }
        tri.create()?;

        let report = grid.set_missing_heights_from_triangulation(&tri, area)?;
        assert_eq!(
            report,
            GapFillReport {
                missing_before: 97,
                missing_after: 0
            }
        );
        assert_approx_eq!(grid.get_ground_height(5, 7)?, 1., 1e-6);
        assert_eq!(grid.get_ground_height(4, 4)?, 8.);
        let reference = grid.bin(5, 7)?.ground_reference;
        assert_eq!(reference, Some(BinPoint::new(1., 2)));
        assert_eq!(grid.bin(4, 4)?.ground_reference, None);

        let set = grid.set_surface_references_from_triangulation(&tri, extent(0., 10., 2., 12.))?;
        assert_eq!(set, 4);
        Ok(())
    }
}
