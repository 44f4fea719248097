use crate::{Error, Result};

use std::path::Path;

use geo::{Coord, Rect};
use las::Reader;

/// The fields of a lidar return used by the gridding steps
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LasPoint {
    pub x: f64,
    pub y: f64,
    pub z: f64,
    pub classification: u8,
    pub return_number: u8,
    pub number_of_returns: u8,
}

impl LasPoint {
    pub fn new(x: f64, y: f64, z: f64, classification: u8) -> LasPoint {
        LasPoint {
            x,
            y,
            z,
            classification,
            return_number: 1,
            number_of_returns: 1,
        }
    }

    pub fn is_last_return(&self) -> bool {
        self.return_number == self.number_of_returns
    }
}

impl From<las::Point> for LasPoint {
    fn from(p: las::Point) -> LasPoint {
        LasPoint {
            x: p.x,
            y: p.y,
            z: p.z,
            classification: u8::from(p.classification),
            return_number: p.return_number,
            number_of_returns: p.number_of_returns,
        }
    }
}

/// A point cloud read once from start to end
pub trait PointSource {
    fn bounds(&self) -> Rect;

    /// The remaining points, a second call continues where the first stopped
    fn points(&mut self) -> Box<dyn Iterator<Item = Result<LasPoint>> + '_>;
}

/// LAS or LAZ file, closed when dropped
pub struct LasFileSource {
    reader: Reader,
}

impl LasFileSource {
    pub fn from_path(path: impl AsRef<Path>) -> Result<LasFileSource> {
        Ok(LasFileSource {
            reader: Reader::from_path(path)?,
        })
    }

    pub fn new(reader: Reader) -> LasFileSource {
        LasFileSource { reader }
    }

    pub fn point_count(&self) -> u64 {
        self.reader.header().number_of_points()
    }
}

impl PointSource for LasFileSource {
    fn bounds(&self) -> Rect {
        let b = self.reader.header().bounds();
        Rect::new(
            Coord {
                x: b.min.x,
                y: b.min.y,
            },
            Coord {
                x: b.max.x,
                y: b.max.y,
            },
        )
    }

    fn points(&mut self) -> Box<dyn Iterator<Item = Result<LasPoint>> + '_> {
        Box::new(
            self.reader
                .points()
                .map(|p| p.map(LasPoint::from).map_err(Error::from)),
        )
    }
}

pub struct MemoryPointSource {
    bounds: Rect,
    points: Vec<LasPoint>,
}

impl MemoryPointSource {
    pub fn new(bounds: Rect, points: Vec<LasPoint>) -> MemoryPointSource {
        MemoryPointSource { bounds, points }
    }
}

impl PointSource for MemoryPointSource {
    fn bounds(&self) -> Rect {
        self.bounds
    }

    fn points(&mut self) -> Box<dyn Iterator<Item = Result<LasPoint>> + '_> {
        Box::new(self.points.drain(..).map(Ok))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use las::{point::Classification, Builder, Writer};
    use std::io::Cursor;

    fn las_bytes(points: &[(f64, f64, f64, u8)]) -> Cursor<Vec<u8>> {
        let header = Builder::from((1, 4)).into_header().unwrap();
        let mut writer = Writer::new(Cursor::new(Vec::new()), header).unwrap();
        for &(x, y, z, class) in points {
            let point = las::Point {
                x,
                y,
                z,
                classification: Classification::new(class).unwrap(),
                return_number: 1,
                number_of_returns: 2,
                ..Default::default()
            };
            writer.write_point(point).unwrap();
        }
        let mut cursor = writer.into_inner().unwrap();
        cursor.set_position(0);
        cursor
    }

    #[test]
    fn reads_las_points_once() -> Result<()> {
        let bytes = las_bytes(&[(10., 20., 1.5, 2), (12., 25., 7.25, 5)]);
        let mut source = LasFileSource::new(Reader::new(bytes)?);
        assert_eq!(source.point_count(), 2);

        let bounds = source.bounds();
        assert_eq!(bounds.min(), Coord { x: 10., y: 20. });
        assert_eq!(bounds.max(), Coord { x: 12., y: 25. });

        let points = source.points().collect::<Result<Vec<_>>>()?;
        assert_eq!(points.len(), 2);
        assert_eq!(points[1].classification, 5);
        assert_eq!(points[1].z, 7.25);
        assert!(!points[0].is_last_return());

        assert_eq!(source.points().count(), 0);
        Ok(())
    }

    #[test]
    fn memory_source_is_one_shot() {
        let bounds = Rect::new(Coord { x: 0., y: 0. }, Coord { x: 1., y: 1. });
        let mut source = MemoryPointSource::new(bounds, vec![LasPoint::new(0.5, 0.5, 1., 2)]);
        assert_eq!(source.points().count(), 1);
        assert_eq!(source.points().count(), 0);
        assert_eq!(source.bounds(), bounds);
    }
}
