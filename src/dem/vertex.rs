use spade::{HasPosition, Point2};

/// A ground sample of the triangulated surface
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Vertex {
    pub x: f64,
    pub y: f64,
    pub z: f64,
    pub class: u8,
}

impl Vertex {
    pub fn new(x: f64, y: f64, z: f64, class: u8) -> Vertex {
        Vertex { x, y, z, class }
    }

    pub fn squared_distance(&self, x: f64, y: f64) -> f64 {
        (self.x - x).powi(2) + (self.y - y).powi(2)
    }
}

impl HasPosition for Vertex {
    type Scalar = f64;

    fn position(&self) -> Point2<Self::Scalar> {
        Point2::new(self.x, self.y)
    }
}
