use glam::{DVec3, IVec3};
use serde::{Deserialize, Serialize};

use super::types::PairConstants;
use crate::{collision::geometry::ContactGeometry, utils::allocator::BodyId};

/// Numeric state of one lubricated pair, persisted across steps while the
/// interaction stays real.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LubricationState {
    /// Film gap resolved at the previous step [m].
    pub u: f64,
    /// Surface separation at the previous step [m].
    pub un_prev: f64,
    /// Smoothed `u·(un - u)` used by the theta scheme.
    pub prev_dot_u: f64,
    /// Surface deflection `u - un` [m].
    pub ue: f64,
    pub contact: bool,
    pub slip: bool,

    pub normal_force: DVec3,
    pub normal_contact_force: DVec3,
    pub normal_lubrication_force: DVec3,
    pub shear_force: DVec3,
    pub shear_contact_force: DVec3,
    pub shear_lubrication_force: DVec3,

    /// Normal stiffness of the current step.
    pub kn: f64,
    /// Shear stiffness of the current step.
    pub ks: f64,
    /// Shear viscous coefficient of the current step.
    pub cs: f64,
    /// Normal viscous damping `nun / u` of the current step.
    pub cn: f64,

    /// Contact normal of the previous evaluation, for co-rotating the shear force.
    pub prev_normal: DVec3,
    /// Consecutive steps whose regime guess had to be retried.
    pub regime_flips: u32,
    pub oscillating: bool,
}

impl LubricationState {
    /// Fresh state for a pair first seen at surface separation `approach`.
    ///
    /// The gap of a fresh pair is the separation itself; an overlapping pair
    /// starts at half the roughness threshold instead, since `u = 0` is a fixed
    /// point of the film equation.
    pub fn new(approach: f64, threshold: f64, normal: DVec3) -> Self {
        let u = if approach > 0.0 {
            approach
        } else {
            0.5 * threshold
        };
        Self {
            u,
            un_prev: approach,
            prev_dot_u: 0.0,
            ue: 0.0,
            contact: u < threshold,
            slip: false,
            normal_force: DVec3::ZERO,
            normal_contact_force: DVec3::ZERO,
            normal_lubrication_force: DVec3::ZERO,
            shear_force: DVec3::ZERO,
            shear_contact_force: DVec3::ZERO,
            shear_lubrication_force: DVec3::ZERO,
            kn: 0.0,
            ks: 0.0,
            cs: 0.0,
            cn: 0.0,
            prev_normal: normal,
            regime_flips: 0,
            oscillating: false,
        }
    }

    /// Total force this pair applies to its first body.
    pub fn total_force(&self) -> DVec3 {
        self.normal_force + self.shear_force
    }
}

/// A lubricated pair: who interacts, with which constants, and its state.
#[derive(Debug, Clone)]
pub struct Interaction {
    pub body1: BodyId,
    pub body2: BodyId,
    /// Periodic image of body 2 that body 1 interacts with.
    pub cell_dist: IVec3,
    pub constants: PairConstants,
    pub state: LubricationState,
    /// Geometry of the latest evaluation, read back by the stress reduction.
    pub geometry: Option<ContactGeometry>,
}

impl Interaction {
    pub fn new(
        body1: BodyId,
        body2: BodyId,
        cell_dist: IVec3,
        constants: PairConstants,
        geometry: &ContactGeometry,
    ) -> Self {
        let threshold = constants.eps * geometry.mean_radius();
        Self {
            body1,
            body2,
            cell_dist,
            constants,
            state: LubricationState::new(geometry.approach, threshold, geometry.normal),
            geometry: None,
        }
    }

    pub fn involves(&self, body: BodyId) -> bool {
        self.body1 == body || self.body2 == body
    }
}
