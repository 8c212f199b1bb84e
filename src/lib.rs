//! Squeeze Film – implicit lubrication and contact law for Rust.
//!
//! This crate computes the forces between near-touching spheres immersed in a
//! viscous fluid: an implicit integrator for the fluid-film gap, the switch
//! between lubricated and asperity-contact regimes, normal and shear force
//! models, film torques, and the reduction of pair forces into per-body and
//! bulk stresses. Positions are integrated by the surrounding simulation.

pub mod collision;
pub mod config;
pub mod core;
pub mod dynamics;
pub mod error;
pub mod utils;
pub mod world;

pub use glam::{DMat3, DVec3, IVec3};

pub use collision::{broadphase::BroadPhase, geometry::ContactGeometry};
pub use config::{Accumulation, LubricationConfig};
pub use core::{
    body::{Body, BodyShape},
    interaction::{Interaction, LubricationState},
    types::{Material, PairConstants, PairPhysicsBuilder, PeriodicCell, Velocity},
};
pub use dynamics::{
    forces::{ForceBuffer, ForceSink, LockedForceBuffer},
    gap::{GapIntegrator, GapProblem, GapSolution},
    law::{LubricationLaw, PairOutcome},
    regime::{ContactRegime, ContactStateMachine},
    stress::{StressAggregator, StressSet},
};
pub use error::{LubricationError, Result};
pub use utils::allocator::{Arena, BodyId, EntityId, InteractionId};
pub use world::{LubricationWorld, StepReport};
