mod triangle_grid;
mod triangulation;
mod vertex;

pub use triangle_grid::TriangleIndexGrid;
pub use triangulation::SurfaceTriangulation;
pub use vertex::Vertex;
