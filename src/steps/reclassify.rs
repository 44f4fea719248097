use crate::raster::Raster;
use crate::Result;

use std::fmt::Debug;
use std::io::{Seek, Write};
use std::path::Path;

use las::{point::Classification, Reader, Writer};
use log::{log, Level};

// raster values of the road classes, only ground returns take them
const ROAD_VALUES: std::ops::Range<f64> = 70.0..100.0;

/// Copies every point of `reader` to `writer`, taking the class from the
/// raster value under the point where one is set. Road values go to ground
/// returns only, any other value to last returns only.
///
/// Returns the number of points given a new class.
pub fn reclassify_points<W>(
    raster: &dyn Raster,
    reader: &mut Reader,
    writer: &mut Writer<W>,
) -> Result<u64>
where
    W: 'static + Write + Seek + Debug + Send + Sync,
{
    let mut changed = 0;

    for point in reader.points() {
        let mut point = point?;
        let v = raster.value_at(point.x, point.y);

        if !v.is_nan() {
            let take = if ROAD_VALUES.contains(&v) {
                point.classification == Classification::Ground
            } else {
                point.return_number == point.number_of_returns
            };
            if take {
                point.classification = Classification::new(v as u8)?;
                changed += 1;
            }
        }
        writer.write_point(point)?;
    }

    Ok(changed)
}

/// Reclassifies `input` into a new file at `output` with the same header
pub fn reclassify_file(
    raster: &dyn Raster,
    input: impl AsRef<Path>,
    output: impl AsRef<Path>,
) -> Result<u64> {
    let mut reader = Reader::from_path(&input)?;
    let mut writer = Writer::from_path(&output, reader.header().clone())?;

    let changed = reclassify_points(raster, &mut reader, &mut writer)?;
    writer.close()?;

    log!(
        Level::Info,
        "Reclassified {changed} points of {} into {}",
        input.as_ref().to_string_lossy(),
        output.as_ref().to_string_lossy()
    );
    Ok(changed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ByteRaster;

    use geo::{coord, Rect};
    use las::{point::Format, Builder};
    use std::io::Cursor;

    fn raster() -> Result<ByteRaster> {
        let mut r = ByteRaster::new(
            10,
            10,
            Rect::new(coord! { x: 0., y: 0. }, coord! { x: 10., y: 10. }),
        )?;
        r.set_value_cell(1, 1, 80)?;
        r.set_value_cell(5, 5, 40)?;
        Ok(r)
    }

    fn header() -> Result<las::Header> {
        let mut builder = Builder::from((1, 4));
        builder.point_format = Format::new(6)?;
        Ok(builder.into_header()?)
    }

    // (x, y, class, return number, number of returns)
    fn las_bytes(points: &[(f64, f64, u8, u8, u8)]) -> Result<Cursor<Vec<u8>>> {
        let mut writer = Writer::new(Cursor::new(Vec::new()), header()?)?;
        for &(x, y, class, return_number, number_of_returns) in points {
            writer.write_point(las::Point {
                x,
                y,
                z: 10.,
                classification: Classification::new(class)?,
                return_number,
                number_of_returns,
                gps_time: Some(0.),
                ..Default::default()
            })?;
        }
        let mut cursor = writer.into_inner()?;
        cursor.set_position(0);
        Ok(cursor)
    }

    #[test]
    fn classes_follow_raster_values() -> Result<()> {
        let input = las_bytes(&[
            (1.5, 1.5, 2, 1, 1),
            (1.5, 1.5, 5, 1, 1),
            (5.5, 5.5, 5, 2, 2),
            (5.5, 5.5, 2, 1, 2),
            (8.5, 8.5, 5, 1, 1),
            (20., 20., 3, 1, 1),
        ])?;

        let mut reader = Reader::new(input)?;
        let mut writer = Writer::new(Cursor::new(Vec::new()), header()?)?;
        let changed = reclassify_points(&raster()?, &mut reader, &mut writer)?;
        assert_eq!(changed, 2);

        let mut output = writer.into_inner()?;
        output.set_position(0);
        let classes = Reader::new(output)?
            .points()
            .map(|p| -> Result<u8> { Ok(u8::from(p?.classification)) })
            .collect::<Result<Vec<_>>>()?;
        assert_eq!(classes, vec![80, 5, 40, 2, 5, 3]);
        Ok(())
    }
}
