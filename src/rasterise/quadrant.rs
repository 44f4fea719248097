//! Recursive quadrant fill.
//!
//! A window of cells is tested against the shape as a rectangle. Windows
//! inside the shape, and windows of at most 2x2 cells touching it, are
//! filled whole. Other intersecting windows are split in four.

use super::{CancellationToken, FillStrategy, Shape, ShapeRasteriser};
use crate::raster::{ByteRaster, Raster, RcIndex};
use crate::{RasteriserParameters, Result};

use geo::{Contains, Intersects, Polygon, Rect};

fn intersects(shape: &Shape, rect: &Polygon) -> bool {
    match shape {
        Shape::Polygons(polygons) => polygons.iter().any(|p| p.intersects(rect)),
        Shape::Lines(lines) => lines.iter().any(|l| l.intersects(rect)),
    }
}

// a line never contains an area
fn contains(shape: &Shape, rect: &Polygon) -> bool {
    match shape {
        Shape::Polygons(polygons) => polygons.iter().any(|p| p.contains(rect)),
        Shape::Lines(_) => false,
    }
}

/// Fills every cell of rows `row_min..=row_max` and columns
/// `col_min..=col_max` that the shape touches
#[allow(clippy::too_many_arguments)]
pub fn fill_quadrants(
    raster: &mut ByteRaster,
    shape: &Shape,
    row_min: i32,
    row_max: i32,
    col_min: i32,
    col_max: i32,
    value: u8,
    cancel: &CancellationToken,
) -> Result<()> {
    if cancel.is_cancelled() {
        return Ok(());
    }

    let bounds = raster.bounds();
    let min = bounds.cell_bottom_left_to_proj(row_min, col_min)?;
    let max = bounds.cell_top_right_to_proj(row_max, col_max)?;
    let rect = Rect::new(min, max).to_polygon();

    if !intersects(shape, &rect) {
        return Ok(());
    }

    if (row_max - row_min < 2 && col_max - col_min < 2) || contains(shape, &rect) {
        for row in row_min..=row_max {
            for col in col_min..=col_max {
                raster[(row as usize, col as usize)] = value;
            }
        }
        return Ok(());
    }

    let row_center = if row_max - row_min > 1 {
        (row_max + row_min + 1) / 2
    } else {
        row_max
    };
    let col_center = if col_max - col_min > 1 {
        (col_max + col_min + 1) / 2
    } else {
        col_max
    };

    fill_quadrants(raster, shape, row_min, row_center, col_min, col_center, value, cancel)?;
    if col_center != col_max {
        fill_quadrants(raster, shape, row_min, row_center, col_center, col_max, value, cancel)?;
    }
    if row_center != row_max {
        fill_quadrants(raster, shape, row_center, row_max, col_min, col_center, value, cancel)?;
    }
    if row_center != row_max && col_center != col_max {
        fill_quadrants(raster, shape, row_center, row_max, col_center, col_max, value, cancel)?;
    }
    Ok(())
}

pub struct Quadrant;

impl FillStrategy for Quadrant {
    fn fill(
        &mut self,
        raster: &mut ByteRaster,
        shape: &Shape,
        value: u8,
        min: RcIndex,
        max: RcIndex,
        cancel: &CancellationToken,
    ) -> Result<()> {
        fill_quadrants(
            raster, shape, min.row, max.row, min.col, max.col, value, cancel,
        )
    }
}

pub type QuadrantRasteriser = ShapeRasteriser<Quadrant>;

impl ShapeRasteriser<Quadrant> {
    pub fn new(raster: ByteRaster) -> QuadrantRasteriser {
        let params = RasteriserParameters::default();
        ShapeRasteriser::with_strategy(raster, &params.class_attribute, Quadrant)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rasterise::{ClassTable, MemoryShapeSource, ShapeFeature};
    use crate::NODATA;
    use geo::{coord, line_string, polygon, MultiLineString, MultiPolygon};

    fn raster() -> ByteRaster {
        ByteRaster::from_extent(Rect::new(coord! { x: 0., y: 0. }, coord! { x: 10., y: 10. }))
            .unwrap()
    }

    fn polygons(p: Polygon) -> Shape {
        Shape::Polygons(MultiPolygon::new(vec![p]))
    }

    #[test]
    fn square_on_cell_edges() -> Result<()> {
        let mut r = raster();
        let square = polygons(polygon![(x: 2., y: 2.), (x: 6., y: 2.), (x: 6., y: 6.), (x: 2., y: 6.)]);
        fill_quadrants(&mut r, &square, 2, 5, 2, 5, 3, &CancellationToken::new())?;

        for row in 0..10 {
            for col in 0..10 {
                let inside = (2..=5).contains(&row) && (2..=5).contains(&col);
                assert_eq!(r[(row, col)] == 3, inside, "({row}, {col})");
            }
        }
        Ok(())
    }

    #[test]
    fn triangle_fills_touched_cells_only() -> Result<()> {
        let mut r = raster();
        let triangle = polygons(polygon![(x: 1., y: 1.), (x: 9., y: 1.), (x: 9., y: 9.)]);
        fill_quadrants(&mut r, &triangle, 1, 8, 1, 8, 5, &CancellationToken::new())?;

        assert_eq!(r[(1, 8)], 5);
        assert_eq!(r[(2, 7)], 5);
        assert_eq!(r[(4, 5)], 5);
        assert_eq!(r[(7, 2)], NODATA);
        assert_eq!(r[(8, 1)], NODATA);
        assert_eq!(r[(0, 0)], NODATA);
        Ok(())
    }

    #[test]
    fn cancelled_fill_draws_nothing() -> Result<()> {
        let mut r = raster();
        let square = polygons(polygon![(x: 0., y: 0.), (x: 10., y: 0.), (x: 10., y: 10.), (x: 0., y: 10.)]);
        let cancel = CancellationToken::new();
        cancel.cancel();
        fill_quadrants(&mut r, &square, 0, 9, 0, 9, 3, &cancel)?;
        assert!(r.cells().iter().all(|&v| v == NODATA));
        Ok(())
    }

    #[test]
    fn lines_fill_the_row_they_cross() -> Result<()> {
        let mut rasteriser = QuadrantRasteriser::new(raster());
        rasteriser.add_classes(&ClassTable::new(&[(36311, 50)]));

        let stream = MultiLineString::new(vec![line_string![(x: 0.5, y: 4.5), (x: 9.5, y: 4.5)]]);
        let mut source = MemoryShapeSource::new(
            "streams",
            vec![ShapeFeature::new(stream).with_attribute("LUOKKA", 36311)],
        );
        let report = rasteriser.rasterise(&mut source)?;
        assert_eq!(report.added, 1);

        let r = rasteriser.raster();
        assert!(r.row(4).iter().all(|&v| v == 50));
        assert!(r.row(0).iter().all(|&v| v == NODATA));
        assert!(r.row(9).iter().all(|&v| v == NODATA));
        Ok(())
    }
}
