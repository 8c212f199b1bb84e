//! Pair detection and sphere-sphere contact geometry.

pub mod broadphase;
pub mod geometry;

pub use broadphase::{BroadPhase, CandidatePair, SpatialGrid};
pub use geometry::ContactGeometry;
