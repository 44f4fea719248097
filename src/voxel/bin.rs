use std::cmp::Reverse;

use serde::{Deserialize, Serialize};

/// A height sample stored at centimetre precision
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BinPoint {
    pub z_cm: i32,
    pub class: u8,
}

impl BinPoint {
    pub fn new(z: f64, class: u8) -> BinPoint {
        BinPoint {
            // halfway values go to the even centimetre
            z_cm: (z * 100.).round_ties_even() as i32,
            class,
        }
    }

    pub fn z(&self) -> f64 {
        self.z_cm as f64 / 100.
    }
}

/// Samples of one voxel grid cell
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Bin {
    pub(super) ground_points: Vec<BinPoint>,
    pub(super) other_points: Vec<BinPoint>,
    pub ground_reference: Option<BinPoint>,
    pub surface_reference: Option<BinPoint>,
}

impl Bin {
    pub fn add_point(&mut self, z: f64, class: u8, is_ground: bool) {
        let point = BinPoint::new(z, class);
        if is_ground {
            self.ground_points.push(point);
        } else {
            self.other_points.push(point);
        }
    }

    pub fn ground_points(&self) -> &[BinPoint] {
        &self.ground_points
    }

    pub fn other_points(&self) -> &[BinPoint] {
        &self.other_points
    }

    /// Sorts both lists from highest to lowest and releases unused capacity
    pub fn sort_and_trim(&mut self) {
        self.ground_points.sort_by_key(|p| Reverse(p.z_cm));
        self.other_points.sort_by_key(|p| Reverse(p.z_cm));
        self.ground_points.shrink_to_fit();
        self.other_points.shrink_to_fit();
    }

    /// Middle element of the sorted ground points, the lower one of the two
    /// middle elements for even counts. NaN without ground points.
    pub fn ground_median(&self) -> f64 {
        self.ground_median_point().map_or(f64::NAN, |p| p.z())
    }

    pub fn ground_median_point(&self) -> Option<BinPoint> {
        self.ground_points.get(self.ground_points.len() / 2).copied()
    }

    /// Highest other point with a class in `low..=high`, expects sorted points
    pub fn highest_in_class_range(&self, low: u8, high: u8) -> Option<BinPoint> {
        self.other_points
            .iter()
            .find(|p| (low..=high).contains(&p.class))
            .copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn centimetre_rounding() {
        assert_eq!(BinPoint::new(2.5, 0).z_cm, 250);
        assert_eq!(BinPoint::new(10.004, 0).z_cm, 1000);
        assert_eq!(BinPoint::new(-3.216, 0).z_cm, -322);
        assert_eq!(BinPoint::new(0.125, 0).z_cm, 12);
        assert_eq!(BinPoint::new(0.375, 0).z_cm, 38);
        assert_eq!(BinPoint::new(5., 1).z(), 5.);
    }

    #[test]
    fn median_of_sorted_points() {
        let mut bin = Bin::default();
        assert!(bin.ground_median().is_nan());

        for z in [5., 10., 2.] {
            bin.add_point(z, 2, true);
        }
        bin.sort_and_trim();
        assert_eq!(bin.ground_median(), 5.);

        bin.add_point(1., 2, true);
        bin.sort_and_trim();
        // 10, 5, 2, 1
        assert_eq!(bin.ground_median(), 2.);
    }

    #[test]
    fn highest_point_in_class_range() {
        let mut bin = Bin::default();
        bin.add_point(12., 5, false);
        bin.add_point(20., 6, false);
        bin.add_point(8., 4, false);
        bin.sort_and_trim();

        assert_eq!(bin.highest_in_class_range(3, 5), Some(BinPoint::new(12., 5)));
        assert_eq!(bin.highest_in_class_range(6, 6), Some(BinPoint::new(20., 6)));
        assert_eq!(bin.highest_in_class_range(9, 9), None);
    }
}
