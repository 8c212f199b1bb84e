//! Core data: bodies, materials, periodic cell, and per-pair lubrication records.

pub mod body;
pub mod interaction;
pub mod types;

pub use body::{Body, BodyShape};
pub use interaction::{Interaction, LubricationState};
pub use types::{Material, PairConstants, PairPhysicsBuilder, PeriodicCell, Velocity};
