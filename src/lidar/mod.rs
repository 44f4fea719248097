mod source;

pub use source::{LasFileSource, LasPoint, MemoryPointSource, PointSource};
