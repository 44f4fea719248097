use super::triangle_grid::TriangleIndexGrid;
use super::vertex::Vertex;
use crate::raster::{Raster, RasterBounds};
use crate::{Error, Result, TriangulationParameters};

use fastrand::f64 as random;
use geo::{Coord, LineString, Polygon, Rect};
use log::{log, Level};
use spade::{DelaunayTriangulation, Triangulation};

/// Height surface interpolated over a Delaunay triangulation of ground samples
pub struct SurfaceTriangulation {
    vertices: Vec<Vertex>,
    mesh: Option<DelaunayTriangulation<Vertex>>,
    triangles: Vec<[Vertex; 3]>,
    grid: TriangleIndexGrid,
    params: TriangulationParameters,
}

impl SurfaceTriangulation {
    /// `rows` and `cols` set the resolution of the triangle lookup grid over `extent`
    pub fn new(
        rows: usize,
        cols: usize,
        extent: Rect,
        params: TriangulationParameters,
    ) -> Result<SurfaceTriangulation> {
        params.validate()?;
        Ok(SurfaceTriangulation {
            vertices: Vec::new(),
            mesh: None,
            triangles: Vec::new(),
            grid: TriangleIndexGrid::new(RasterBounds::new(rows, cols, extent)?),
            params,
        })
    }

    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    pub fn triangle_count(&self) -> usize {
        self.triangles.len()
    }

    pub fn is_created(&self) -> bool {
        self.mesh.is_some()
    }

    /// Buffers a vertex, returns false when (x, y) is outside the extent
    pub fn add_point(&mut self, x: f64, y: f64, z: f64, class: u8) -> bool {
        if self.grid.bounds().proj_to_cell(x, y).is_empty() {
            return false;
        }
        self.vertices.push(Vertex::new(x, y, z, class));
        true
    }

    /// Buffers a vertex at the center of a lookup grid cell
    pub fn add_point_cell(&mut self, row: i32, col: i32, z: f64, class: u8) -> Result<()> {
        let c = self.grid.bounds().cell_center_to_proj(row, col)?;
        self.vertices.push(Vertex::new(c.x, c.y, z, class));
        Ok(())
    }

    /// Triangulates the buffered vertices and rebuilds the lookup grid
    pub fn create(&mut self) -> Result<()> {
        if self.vertices.is_empty() {
            return Err(Error::NoTriangulationPoints);
        }
        self.grid.clear();
        self.triangles.clear();

        let radius = self.params.jitter_radius;
        let points: Vec<Vertex> = self
            .vertices
            .iter()
            .map(|v| {
                // shift along both axes stays below the radius
                let mut v = *v;
                v.x += (random() - 0.5) * radius;
                v.y += (random() - 0.5) * radius;
                v
            })
            .collect();

        let mesh = DelaunayTriangulation::<Vertex>::bulk_load_stable(points)?;

        for face in mesh.inner_faces() {
            let triangle = face.vertices().map(|v| *v.data());
            self.grid.add_index(envelope(&triangle), self.triangles.len());
            self.triangles.push(triangle);
        }
        self.mesh = Some(mesh);

        log!(
            Level::Info,
            "Triangulated {} vertices into {} triangles",
            self.vertices.len(),
            self.triangles.len()
        );
        Ok(())
    }

    /// Drops the vertices and the mesh
    pub fn clear(&mut self) {
        self.vertices.clear();
        self.triangles.clear();
        self.mesh = None;
        self.grid.clear();
    }

    /// Height and class at (x, y).
    ///
    /// The height is interpolated inside the containing triangle and the
    /// class is taken from its nearest vertex. Outside the mesh the height
    /// is NaN and the class 0.
    pub fn get_value(&self, x: f64, y: f64) -> Result<(f64, u8)> {
        if self.mesh.is_none() {
            return Err(Error::TriangulationNotCreated);
        }

        for &i in self.grid.indexes_at(x, y) {
            let triangle = &self.triangles[i];
            if !contains(triangle, x, y) {
                continue;
            }
            match interpolate(triangle, x, y) {
                Some(z) => return Ok((z, nearest_class(triangle, x, y))),
                None => log!(Level::Warn, "Degenerate triangle {i} at ({x}, {y})"),
            }
        }
        Ok((f64::NAN, 0))
    }

    pub fn get_height(&self, x: f64, y: f64) -> Result<f64> {
        Ok(self.get_value(x, y)?.0)
    }

    /// One polygon per triangle with a sequential id
    pub fn export_triangles(&self) -> Result<Vec<(usize, Polygon)>> {
        if self.mesh.is_none() {
            return Err(Error::TriangulationNotCreated);
        }
        Ok(self
            .triangles
            .iter()
            .enumerate()
            .map(|(i, t)| {
                let ring: Vec<Coord> = t.iter().map(|v| Coord { x: v.x, y: v.y }).collect();
                (i, Polygon::new(LineString::new(ring), vec![]))
            })
            .collect())
    }

    /// The bounded cells of the Voronoi dual with a sequential id, cells on
    /// the hull reach to infinity and are left out
    pub fn export_voronoi_cells(&self) -> Result<Vec<(usize, Polygon)>> {
        let mesh = self.mesh.as_ref().ok_or(Error::TriangulationNotCreated)?;

        let mut cells = Vec::new();
        for face in mesh.voronoi_faces() {
            let ring: Option<Vec<Coord>> = face
                .adjacent_edges()
                .map(|edge| {
                    edge.from()
                        .position()
                        .map(|p| Coord { x: p.x, y: p.y })
                })
                .collect();
            if let Some(ring) = ring {
                cells.push((cells.len(), Polygon::new(LineString::new(ring), vec![])));
            }
        }
        Ok(cells)
    }
}

fn envelope(t: &[Vertex; 3]) -> Rect {
    let min = Coord {
        x: t[0].x.min(t[1].x).min(t[2].x),
        y: t[0].y.min(t[1].y).min(t[2].y),
    };
    let max = Coord {
        x: t[0].x.max(t[1].x).max(t[2].x),
        y: t[0].y.max(t[1].y).max(t[2].y),
    };
    Rect::new(min, max)
}

fn edge_sign(x: f64, y: f64, a: &Vertex, b: &Vertex) -> f64 {
    (x - b.x) * (a.y - b.y) - (a.x - b.x) * (y - b.y)
}

// points on an edge are inside
fn contains(t: &[Vertex; 3], x: f64, y: f64) -> bool {
    let d1 = edge_sign(x, y, &t[0], &t[1]);
    let d2 = edge_sign(x, y, &t[1], &t[2]);
    let d3 = edge_sign(x, y, &t[2], &t[0]);

    let has_neg = d1 < 0. || d2 < 0. || d3 < 0.;
    let has_pos = d1 > 0. || d2 > 0. || d3 > 0.;
    !(has_neg && has_pos)
}

// barycentric interpolation, None for a zero area triangle
fn interpolate(t: &[Vertex; 3], x: f64, y: f64) -> Option<f64> {
    let [a, b, c] = t;
    let det = (b.y - c.y) * (a.x - c.x) + (c.x - b.x) * (a.y - c.y);
    if det == 0. {
        return None;
    }
    let l1 = ((b.y - c.y) * (x - c.x) + (c.x - b.x) * (y - c.y)) / det;
    let l2 = ((c.y - a.y) * (x - c.x) + (a.x - c.x) * (y - c.y)) / det;
    let l3 = 1. - l1 - l2;
    Some(l1 * a.z + l2 * b.z + l3 * c.z)
}

fn nearest_class(t: &[Vertex; 3], x: f64, y: f64) -> u8 {
    t.iter()
        .min_by(|a, b| a.squared_distance(x, y).total_cmp(&b.squared_distance(x, y)))
        .map_or(0, |v| v.class)
}

impl Raster for SurfaceTriangulation {
    fn bounds(&self) -> &RasterBounds {
        self.grid.bounds()
    }

    /// NaN outside the mesh and before `create`
    fn value_at(&self, x: f64, y: f64) -> f64 {
        self.get_height(x, y).unwrap_or(f64::NAN)
    }

    /// Height at the center of a lookup grid cell
    fn value(&self, row: i32, col: i32) -> Result<f64> {
        let c = self.grid.bounds().cell_center_to_proj(row, col)?;
        self.get_height(c.x, c.y)
    }
}
