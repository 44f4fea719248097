//! Even-odd scanline polygon fill.
//!
//! Vertices are snapped to cell indices first. Every row from the top of the
//! ring's envelope up to, but not including, the row of its max corner
//! collects the x crossings of the ring edges and fills between pairs of
//! crossings. Crossing x values are floored so neighbouring polygons meet
//! without gaps or overlap.

use super::line::draw_line_string;
use super::{CancellationToken, FillStrategy, Shape, ShapeRasteriser};
use crate::raster::{ByteRaster, Raster, RcIndex};
use crate::{Error, RasteriserParameters, Result, NODATA};

use geo::{BoundingRect, LineString, Polygon};

/// Working raster for polygons with holes, owned by the caller and reused
/// between polygons. Every fill leaves it cleared.
pub struct ScratchRaster(ByteRaster);

impl ScratchRaster {
    pub fn for_raster(raster: &ByteRaster) -> ScratchRaster {
        ScratchRaster(ByteRaster::with_bounds(*raster.bounds()))
    }

    pub fn is_clear(&self) -> bool {
        self.0.cells().iter().all(|&v| v == NODATA)
    }
}

// the cells a ring fill may touch, end exclusive and clipped to the raster
struct FillWindow {
    row_start: i32,
    row_end: i32,
    col_start: i32,
    col_end: i32,
}

/// Fills the inside of `ring` with `value`, the ring does not need to be closed.
///
/// Returns the window of rows and columns the fill covered, `None` for an
/// empty ring.
fn fill_ring_window(
    raster: &mut ByteRaster,
    ring: &LineString,
    value: u8,
    nodes: &mut Vec<i32>,
    max_nodes: usize,
) -> Result<Option<FillWindow>> {
    let bounds = *raster.bounds();
    let Some(envelope) = ring.bounding_rect() else {
        return Ok(None);
    };
    let top = bounds.unbounded_cell(envelope.min().x, envelope.min().y);
    let bottom = bounds.unbounded_cell(envelope.max().x, envelope.max().y);

    let window = FillWindow {
        row_start: top.row.max(0),
        row_end: bottom.row.min(bounds.rows() as i32),
        col_start: top.col.max(0),
        col_end: bottom.col.min(bounds.cols() as i32),
    };

    // (col, row) of every vertex
    let corners: Vec<(f64, f64)> = ring
        .coords()
        .map(|c| {
            let RcIndex { row, col } = bounds.unbounded_cell(c.x, c.y);
            (col as f64, row as f64)
        })
        .collect();

    for y in window.row_start..window.row_end {
        let yf = y as f64;
        nodes.clear();

        let mut j = corners.len() - 1;
        for (i, &(xi, yi)) in corners.iter().enumerate() {
            let (xj, yj) = corners[j];
            if (yi < yf && yj >= yf) || (yj < yf && yi >= yf) {
                if nodes.len() >= max_nodes {
                    return Err(Error::TooManyNodes {
                        row: y,
                        limit: max_nodes,
                    });
                }
                nodes.push((xi + (yf - yi) / (yj - yi) * (xj - xi)).floor() as i32);
            }
            j = i;
        }
        nodes.sort_unstable();

        for pair in nodes.chunks_exact(2) {
            if pair[0] >= window.col_end {
                break;
            }
            if pair[1] > window.col_start {
                let start = pair[0].max(window.col_start);
                let end = pair[1].min(window.col_end);
                for x in start..end {
                    raster[(y as usize, x as usize)] = value;
                }
            }
        }
    }
    Ok(Some(window))
}

/// Fills the inside of `ring` with `value`
pub fn fill_ring(
    raster: &mut ByteRaster,
    ring: &LineString,
    value: u8,
    nodes: &mut Vec<i32>,
    max_nodes: usize,
) -> Result<()> {
    fill_ring_window(raster, ring, value, nodes, max_nodes).map(|_| ())
}

/// Fills a polygon, cells inside its holes keep their previous values.
///
/// Polygons with holes are drawn into `scratch` first and merged into
/// `raster` where the scratch cells are set.
pub fn fill_polygon(
    raster: &mut ByteRaster,
    scratch: &mut ScratchRaster,
    polygon: &Polygon,
    value: u8,
    nodes: &mut Vec<i32>,
    max_nodes: usize,
) -> Result<()> {
    if polygon.interiors().is_empty() {
        return fill_ring(raster, polygon.exterior(), value, nodes, max_nodes);
    }

    if scratch.0.bounds() != raster.bounds() {
        *scratch = ScratchRaster::for_raster(raster);
    }

    let filled = fill_with_holes(&mut scratch.0, polygon, value, nodes, max_nodes);
    let window = match filled {
        Ok(Some(window)) => window,
        Ok(None) => return Ok(()),
        Err(e) => {
            scratch.0.clear();
            return Err(e);
        }
    };

    for row in window.row_start..window.row_end {
        for col in window.col_start..window.col_end {
            let rc = (row as usize, col as usize);
            let v = scratch.0[rc];
            if v != NODATA {
                raster[rc] = v;
                scratch.0[rc] = NODATA;
            }
        }
    }
    Ok(())
}

fn fill_with_holes(
    scratch: &mut ByteRaster,
    polygon: &Polygon,
    value: u8,
    nodes: &mut Vec<i32>,
    max_nodes: usize,
) -> Result<Option<FillWindow>> {
    let window = fill_ring_window(scratch, polygon.exterior(), value, nodes, max_nodes)?;
    for hole in polygon.interiors() {
        fill_ring(scratch, hole, NODATA, nodes, max_nodes)?;
    }
    Ok(window)
}

/// Scanline fill for polygons and Bresenham lines for line features
pub struct EvenOdd {
    scratch: ScratchRaster,
    nodes: Vec<i32>,
    max_nodes: usize,
}

impl FillStrategy for EvenOdd {
    fn fill(
        &mut self,
        raster: &mut ByteRaster,
        shape: &Shape,
        value: u8,
        _min: RcIndex,
        _max: RcIndex,
        _cancel: &CancellationToken,
    ) -> Result<()> {
        match shape {
            Shape::Polygons(polygons) => {
                for polygon in polygons.iter() {
                    fill_polygon(
                        raster,
                        &mut self.scratch,
                        polygon,
                        value,
                        &mut self.nodes,
                        self.max_nodes,
                    )?;
                }
            }
            Shape::Lines(lines) => {
                for line in lines.iter() {
                    draw_line_string(raster, line, value);
                }
            }
        }
        Ok(())
    }
}

pub type EvenOddRasteriser = ShapeRasteriser<EvenOdd>;

impl ShapeRasteriser<EvenOdd> {
    pub fn new(raster: ByteRaster, params: &RasteriserParameters) -> EvenOddRasteriser {
        let strategy = EvenOdd {
            scratch: ScratchRaster::for_raster(&raster),
            nodes: Vec::with_capacity(16),
            max_nodes: params.max_nodes_per_row,
        };
        ShapeRasteriser::with_strategy(raster, &params.class_attribute, strategy)
    }
}
