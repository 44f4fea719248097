use std::path::PathBuf;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

/// crate specific Error enum
#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    IoError(#[from] std::io::Error),
    #[error(transparent)]
    LasError(#[from] las::Error),
    #[error(transparent)]
    BincodeError(#[from] bincode::Error),
    #[error(transparent)]
    TriangulationError(#[from] spade::InsertionError),

    // ascii grids
    #[error("{path:?}: invalid ascii grid header on line {line}")]
    InvalidHeader { path: PathBuf, line: usize },
    #[error("{path:?}: more data rows than the declared {expected}")]
    TooManyRows { path: PathBuf, expected: usize },
    #[error("{path:?}: found {found} data rows, expected {expected}")]
    TooFewRows {
        path: PathBuf,
        expected: usize,
        found: usize,
    },
    #[error("{path:?}: invalid column count on line {line}, expected {expected} but found {found}")]
    InvalidColumnCount {
        path: PathBuf,
        line: usize,
        expected: usize,
        found: usize,
    },
    #[error("{path:?}: invalid value '{token}' on line {line}, expected a byte or [count]x[value]")]
    InvalidToken {
        path: PathBuf,
        line: usize,
        token: String,
    },

    // bounds
    #[error("Cell ({row}, {col}) is outside a {rows}x{cols} raster")]
    CellOutOfRange {
        row: i32,
        col: i32,
        rows: usize,
        cols: usize,
    },
    #[error("A raster needs positive row and column counts and a non-empty extent")]
    InvalidBounds,
    #[error("The window ({min_x}, {min_y}) - ({max_x}, {max_y}) is not inside the raster")]
    InvalidWindow {
        min_x: i32,
        min_y: i32,
        max_x: i32,
        max_y: i32,
    },

    // rasterisation
    #[error("Feature has no class attribute {0}")]
    MissingAttribute(String),
    #[error("Unsupported geometry: {0}")]
    UnsupportedGeometry(&'static str),
    #[error("Cannot process polygons with more than {limit} edge crossings per row (row {row})")]
    TooManyNodes { row: i32, limit: usize },

    // voxel grid
    #[error("The voxel grid must be sorted before querying sorted points")]
    NotSorted,
    #[error("{path:?} is not a voxel grid file")]
    InvalidGridFile { path: PathBuf },
    #[error("Unsupported voxel grid file version {0}")]
    UnsupportedGridVersion(u32),

    // triangulation
    #[error("The triangulation is not created")]
    TriangulationNotCreated,
    #[error("Add triangulation points before creating the triangulation")]
    NoTriangulationPoints,
    #[error("The jitter radius {radius} must be below half of the plane distance tolerance {tolerance}")]
    InvalidJitter { radius: f64, tolerance: f64 },

    // tile names
    #[error("Invalid map tile name {0}")]
    InvalidTileName(String),
    #[error("Coordinates ({east}, {north}) are outside the map sheet system")]
    TileOutOfRange { east: i32, north: i32 },
    #[error("Invalid map tile size {0}")]
    InvalidTileSize(i32),
}
