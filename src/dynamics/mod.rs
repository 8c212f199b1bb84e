//! Lubrication dynamics: gap integration, regime switching, force and torque
//! models, force accumulation, and stress reduction.

pub mod forces;
pub mod gap;
pub mod law;
pub mod normal;
pub mod parallel;
pub mod regime;
pub mod shear;
pub mod stress;
pub mod torque;

pub use forces::{ForceBuffer, ForceSink, LockedForceBuffer};
pub use gap::{select_root, GapIntegrator, GapProblem, GapSolution};
pub use law::{LubricationLaw, PairOutcome};
pub use normal::{floored_deflection, normal_forces, normal_stiffness, NormalForces};
pub use parallel::{PairPass, PairRecord};
pub use regime::{Admission, ContactRegime, ContactStateMachine};
pub use shear::{co_rotate, shear_forces, shear_viscosity, ShearForces, ShearInput};
pub use stress::{StressAggregator, StressSet};
pub use torque::{body_torques, lubrication_torques, LubricationTorques, TorqueChannels};
