//! Burning vector features into a `ByteRaster`.
//!
//! Features are filtered by their class attribute through a `ClassTable`
//! and drawn by one of two fill strategies: the even-odd scanline fill in
//! `scanline` or the recursive quadrant fill in `quadrant`.

pub mod class_table;
pub mod line;
pub mod quadrant;
pub mod scanline;

pub use class_table::{topographic, ClassTable};
pub use line::CellLine;
pub use quadrant::{Quadrant, QuadrantRasteriser};
pub use scanline::{EvenOdd, EvenOddRasteriser, ScratchRaster};

use crate::raster::{ByteRaster, Raster, RcIndex};
use crate::{Error, Result};

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use geo::{BoundingRect, Coord, Geometry, LineString, MultiLineString, MultiPolygon, Rect};
use log::{log, Level};

/// Cooperative cancellation shared with whoever drives the rasterisation
#[derive(Clone, Debug, Default)]
pub struct CancellationToken(Arc<AtomicBool>);

impl CancellationToken {
    pub fn new() -> CancellationToken {
        CancellationToken::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct ShapeFeature {
    pub geometry: Geometry,
    pub attributes: BTreeMap<String, i64>,
}

impl ShapeFeature {
    pub fn new(geometry: impl Into<Geometry>) -> ShapeFeature {
        ShapeFeature {
            geometry: geometry.into(),
            attributes: BTreeMap::new(),
        }
    }

    pub fn with_attribute(mut self, name: &str, value: i64) -> ShapeFeature {
        self.attributes.insert(name.to_string(), value);
        self
    }

    pub fn attribute(&self, name: &str) -> Option<i64> {
        self.attributes.get(name).copied()
    }
}

/// A vector data set, read once
pub trait ShapeSource {
    fn name(&self) -> &str;

    fn envelope(&self) -> Option<Rect>;

    fn features(&mut self) -> Box<dyn Iterator<Item = Result<ShapeFeature>> + '_>;
}

pub struct MemoryShapeSource {
    name: String,
    features: Vec<ShapeFeature>,
}

impl MemoryShapeSource {
    pub fn new(name: &str, features: Vec<ShapeFeature>) -> MemoryShapeSource {
        MemoryShapeSource {
            name: name.to_string(),
            features,
        }
    }
}

impl ShapeSource for MemoryShapeSource {
    fn name(&self) -> &str {
        &self.name
    }

    fn envelope(&self) -> Option<Rect> {
        self.features
            .iter()
            .filter_map(|f| f.geometry.bounding_rect())
            .reduce(union_rect)
    }

    fn features(&mut self) -> Box<dyn Iterator<Item = Result<ShapeFeature>> + '_> {
        Box::new(self.features.drain(..).map(Ok))
    }
}

fn union_rect(a: Rect, b: Rect) -> Rect {
    Rect::new(
        Coord {
            x: a.min().x.min(b.min().x),
            y: a.min().y.min(b.min().y),
        },
        Coord {
            x: a.max().x.max(b.max().x),
            y: a.max().y.max(b.max().y),
        },
    )
}

/// Empty raster with unit cells covering every source, the union of the
/// envelopes is expanded outwards to whole units
pub fn raster_for_sources(sources: &[&dyn ShapeSource]) -> Result<ByteRaster> {
    let extent = sources
        .iter()
        .filter_map(|s| s.envelope())
        .reduce(union_rect)
        .ok_or(Error::InvalidBounds)?;

    ByteRaster::from_extent(Rect::new(
        Coord {
            x: extent.min().x.floor(),
            y: extent.min().y.floor(),
        },
        Coord {
            x: extent.max().x.ceil(),
            y: extent.max().y.ceil(),
        },
    ))
}

/// The geometry kinds that can be rasterised
#[derive(Clone, Debug, PartialEq)]
pub enum Shape {
    Polygons(MultiPolygon),
    Lines(MultiLineString),
}

impl TryFrom<&Geometry> for Shape {
    type Error = Error;

    fn try_from(geometry: &Geometry) -> Result<Shape> {
        match geometry {
            Geometry::Polygon(p) => Ok(Shape::Polygons(MultiPolygon::new(vec![p.clone()]))),
            Geometry::MultiPolygon(mp) => Ok(Shape::Polygons(mp.clone())),
            Geometry::Rect(r) => Ok(Shape::Polygons(MultiPolygon::new(vec![r.to_polygon()]))),
            Geometry::Triangle(t) => Ok(Shape::Polygons(MultiPolygon::new(vec![t.to_polygon()]))),
            Geometry::LineString(l) => Ok(Shape::Lines(MultiLineString::new(vec![l.clone()]))),
            Geometry::MultiLineString(ml) => Ok(Shape::Lines(ml.clone())),
            Geometry::Line(l) => Ok(Shape::Lines(MultiLineString::new(vec![LineString::new(
                vec![l.start, l.end],
            )]))),
            Geometry::Point(_) => Err(Error::UnsupportedGeometry("Point")),
            Geometry::MultiPoint(_) => Err(Error::UnsupportedGeometry("MultiPoint")),
            Geometry::GeometryCollection(_) => Err(Error::UnsupportedGeometry("GeometryCollection")),
        }
    }
}

/// How a single shape is burnt into the raster.
///
/// `min` and `max` are the cells of the shape's envelope corners, both
/// inside the raster.
pub trait FillStrategy {
    fn fill(
        &mut self,
        raster: &mut ByteRaster,
        shape: &Shape,
        value: u8,
        min: RcIndex,
        max: RcIndex,
        cancel: &CancellationToken,
    ) -> Result<()>;
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RasteriseReport {
    pub features: usize,
    pub added: usize,
    pub cancelled: bool,
}

pub struct ShapeRasteriser<F: FillStrategy> {
    raster: ByteRaster,
    classes: ClassTable,
    class_attribute: String,
    cancel: CancellationToken,
    strategy: F,
}

impl<F: FillStrategy> ShapeRasteriser<F> {
    pub(crate) fn with_strategy(raster: ByteRaster, class_attribute: &str, strategy: F) -> Self {
        ShapeRasteriser {
            raster,
            classes: ClassTable::default(),
            class_attribute: class_attribute.to_string(),
            cancel: CancellationToken::new(),
            strategy,
        }
    }

    pub fn add_classes(&mut self, table: &ClassTable) {
        self.classes = self.classes.union(table);
    }

    pub fn remove_classes(&mut self, table: &ClassTable) {
        self.classes = self.classes.without(table);
    }

    pub fn classes(&self) -> &ClassTable {
        &self.classes
    }

    pub fn set_cancellation(&mut self, token: CancellationToken) {
        self.cancel = token;
    }

    pub fn raster(&self) -> &ByteRaster {
        &self.raster
    }

    pub fn into_raster(self) -> ByteRaster {
        self.raster
    }

    pub fn write_as_ascii(&self, path: impl AsRef<Path>) -> Result<()> {
        self.raster.write_as_ascii(path)
    }

    /// Burns every feature with a mapped class into the raster.
    ///
    /// Features reaching outside the raster are skipped. On cancellation the
    /// features drawn so far stay in the raster.
    pub fn rasterise(&mut self, source: &mut dyn ShapeSource) -> Result<RasteriseReport> {
        let name = source.name().to_string();
        let bounds = *self.raster.bounds();
        let mut report = RasteriseReport::default();

        for feature in source.features() {
            if self.cancel.is_cancelled() {
                log!(Level::Warn, "Rasterisation of {name} was cancelled");
                report.cancelled = true;
                break;
            }
            let feature = feature?;
            report.features += 1;

            let code = feature
                .attribute(&self.class_attribute)
                .ok_or_else(|| Error::MissingAttribute(self.class_attribute.clone()))?;
            let Some(value) = i32::try_from(code).ok().and_then(|c| self.classes.get(c)) else {
                log!(Level::Debug, "Skipping feature of unmapped class {code}");
                continue;
            };

            let Some(envelope) = feature.geometry.bounding_rect() else {
                continue;
            };
            let min = bounds.proj_to_cell(envelope.min().x, envelope.min().y);
            let max = bounds.max_corner_to_cell(envelope.max().x, envelope.max().y);
            if min.is_empty() || max.is_empty() {
                log!(Level::Debug, "Skipping feature of class {code} outside the raster");
                continue;
            }
            // a degenerate envelope on a cell edge can end before it starts
            let max = RcIndex::new(max.row.max(min.row), max.col.max(min.col));

            let shape = Shape::try_from(&feature.geometry)?;
            self.strategy
                .fill(&mut self.raster, &shape, value, min, max, &self.cancel)?;
            report.added += 1;
        }

        if report.added > 0 {
            log!(
                Level::Info,
                "{name} contained {} features of which {} were added",
                report.features,
                report.added
            );
        }
        Ok(report)
    }
}
