use glam::{DMat3, DVec3, IVec3};
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

use crate::config::{DEFAULT_ROUGHNESS, DEFAULT_VISCOSITY};
use crate::error::{LubricationError, Result};

/// Linear and angular velocity of a body.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Velocity {
    pub linear: DVec3,
    pub angular: DVec3,
}

impl Default for Velocity {
    fn default() -> Self {
        Self {
            linear: DVec3::ZERO,
            angular: DVec3::ZERO,
        }
    }
}

impl Velocity {
    pub fn new(linear: DVec3, angular: DVec3) -> Self {
        Self { linear, angular }
    }
}

/// Elastic and frictional properties of a solid phase.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Material {
    /// Young's modulus [Pa].
    pub young: f64,
    /// Poisson ratio [-].
    pub poisson: f64,
    /// Interparticle friction angle [rad].
    pub friction_angle: f64,
    /// Density [kg/m³]; carried for the surrounding simulation.
    pub density: f64,
}

impl Default for Material {
    fn default() -> Self {
        Self {
            young: 1e7,
            poisson: 0.3,
            friction_angle: 0.5,
            density: 2600.0,
        }
    }
}

impl Material {
    pub fn new(young: f64, poisson: f64, friction_angle: f64) -> Self {
        Self {
            young,
            poisson,
            friction_angle,
            ..Self::default()
        }
    }

    pub fn glass() -> Self {
        Self {
            young: 6.3e10,
            poisson: 0.23,
            friction_angle: 0.2,
            density: 2500.0,
        }
    }

    pub fn pmma() -> Self {
        Self {
            young: 3.0e9,
            poisson: 0.37,
            friction_angle: 0.35,
            density: 1180.0,
        }
    }

    pub fn shear_modulus(&self) -> f64 {
        self.young / (2.0 * (1.0 + self.poisson))
    }

    fn validate(&self) -> Result<()> {
        if !(self.young > 0.0 && self.young.is_finite()) {
            return Err(LubricationError::invalid_parameter(format!(
                "Young's modulus must be positive, got {}",
                self.young
            )));
        }
        if !(self.poisson > -1.0 && self.poisson < 0.5 + f64::EPSILON) {
            return Err(LubricationError::invalid_parameter(format!(
                "Poisson ratio must lie in (-1, 0.5], got {}",
                self.poisson
            )));
        }
        Ok(())
    }
}

/// Material-derived constants of one lubricated pair.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PairConstants {
    /// Coefficient of the deflection-dependent normal stiffness.
    pub kno: f64,
    /// Coefficient of the deflection-dependent shear stiffness.
    pub kso: f64,
    /// Friction coefficient.
    pub mum: f64,
    /// Fluid viscosity [Pa·s].
    pub eta: f64,
    /// Roughness as a fraction of the mean radius.
    pub eps: f64,
    /// Normal viscous coefficient, `3/2·π·η·a²`.
    pub nun: f64,
}

/// Builds [`PairConstants`] from the materials and radii of two spheres.
///
/// Stiffness coefficients follow the Hertz-Mindlin pairing: effective modulus
/// `E* = Ea·Eb / ((1-νa²)·Eb + (1-νb²)·Ea)`, equivalent radius
/// `R = Da·Db / (Da+Db)`, `kno = 4/3·E*·√R` and `kso = 2·√(4R)·G / (2-ν)`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PairPhysicsBuilder {
    pub eta: f64,
    pub eps: f64,
}

impl Default for PairPhysicsBuilder {
    fn default() -> Self {
        Self {
            eta: DEFAULT_VISCOSITY,
            eps: DEFAULT_ROUGHNESS,
        }
    }
}

impl PairPhysicsBuilder {
    pub fn new(eta: f64, eps: f64) -> Self {
        Self { eta, eps }
    }

    /// A non-positive `radius_a` is replaced by `radius_b`, so a pair whose
    /// first member has no meaningful radius still gets sphere constants.
    pub fn build(
        &self,
        material_a: &Material,
        material_b: &Material,
        radius_a: f64,
        radius_b: f64,
    ) -> Result<PairConstants> {
        material_a.validate()?;
        material_b.validate()?;
        if self.eta < 0.0 || !self.eta.is_finite() {
            return Err(LubricationError::invalid_parameter(format!(
                "viscosity must be non-negative, got {}",
                self.eta
            )));
        }
        if !(self.eps > 0.0 && self.eps < 1.0) {
            return Err(LubricationError::invalid_parameter(format!(
                "roughness fraction must lie in (0, 1), got {}",
                self.eps
            )));
        }

        let da = if radius_a > 0.0 { radius_a } else { radius_b };
        let db = radius_b;
        if !(da > 0.0 && db > 0.0) {
            return Err(LubricationError::invalid_parameter(format!(
                "pair radii must be positive, got {radius_a} and {radius_b}"
            )));
        }

        let (ea, eb) = (material_a.young, material_b.young);
        let (va, vb) = (material_a.poisson, material_b.poisson);

        let g = 0.5 * (material_a.shear_modulus() + material_b.shear_modulus());
        let v = 0.5 * (va + vb);
        let e = ea * eb / ((1.0 - va * va) * eb + (1.0 - vb * vb) * ea);
        let r = da * db / (da + db);
        let a = 0.5 * (da + db);

        let friction_angle = material_a.friction_angle.min(material_b.friction_angle);

        Ok(PairConstants {
            kno: 4.0 / 3.0 * e * r.sqrt(),
            kso: 2.0 * (4.0 * r).sqrt() * g / (2.0 - v),
            mum: friction_angle.tan(),
            eta: self.eta,
            eps: self.eps,
            nun: PI * self.eta * 1.5 * a * a,
        })
    }
}

/// Periodic simulation cell.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PeriodicCell {
    /// Cell base vectors as columns.
    pub h_size: DMat3,
    /// Homogeneous velocity gradient imposed on the cell.
    pub vel_grad: DMat3,
}

impl PeriodicCell {
    pub fn new(h_size: DMat3) -> Self {
        Self {
            h_size,
            vel_grad: DMat3::ZERO,
        }
    }

    pub fn cube(edge: f64) -> Self {
        Self::new(DMat3::from_diagonal(DVec3::splat(edge)))
    }

    pub fn with_velocity_gradient(mut self, vel_grad: DMat3) -> Self {
        self.vel_grad = vel_grad;
        self
    }

    pub fn volume(&self) -> f64 {
        self.h_size.determinant().abs()
    }

    /// Position offset of the periodic image `cell_dist`.
    pub fn shift(&self, cell_dist: IVec3) -> DVec3 {
        self.h_size * cell_dist.as_dvec3()
    }

    /// Velocity offset of the periodic image `cell_dist` under the imposed gradient.
    pub fn shift_velocity(&self, cell_dist: IVec3) -> DVec3 {
        self.vel_grad * (self.h_size * cell_dist.as_dvec3())
    }

    /// Image index that brings a point at `branch` from the origin closest to it.
    pub fn nearest_image(&self, branch: DVec3) -> IVec3 {
        let fractional = self.h_size.inverse() * branch;
        (-fractional.round()).as_ivec3()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn equal_spheres_get_hertz_mindlin_constants() {
        let material = Material::new(1e7, 0.3, 0.4);
        let constants = PairPhysicsBuilder::new(1e-3, 1e-3)
            .build(&material, &material, 1e-3, 1e-3)
            .expect("valid pair");

        let e_star = 1e7 / (2.0 * (1.0 - 0.09));
        let r: f64 = 5e-4;
        assert_relative_eq!(constants.kno, 4.0 / 3.0 * e_star * r.sqrt(), max_relative = 1e-12);

        let g = 1e7 / 2.6;
        assert_relative_eq!(
            constants.kso,
            2.0 * (4.0 * r).sqrt() * g / 1.7,
            max_relative = 1e-12
        );
        assert_relative_eq!(constants.mum, 0.4_f64.tan(), max_relative = 1e-12);
        assert_relative_eq!(constants.nun, PI * 1e-3 * 1.5 * 1e-6, max_relative = 1e-12);
    }

    #[test]
    fn smaller_friction_angle_wins() {
        let a = Material::new(1e7, 0.3, 0.6);
        let b = Material::new(1e7, 0.3, 0.1);
        let constants = PairPhysicsBuilder::default()
            .build(&a, &b, 1.0, 2.0)
            .expect("valid pair");
        assert_relative_eq!(constants.mum, 0.1_f64.tan(), max_relative = 1e-12);
    }

    #[test]
    fn non_positive_first_radius_borrows_the_second() {
        let m = Material::default();
        let builder = PairPhysicsBuilder::default();
        let borrowed = builder.build(&m, &m, -1.0, 2.0).expect("valid pair");
        let explicit = builder.build(&m, &m, 2.0, 2.0).expect("valid pair");
        assert_eq!(borrowed, explicit);
    }

    #[test]
    fn invalid_inputs_are_rejected() {
        let m = Material::default();
        let builder = PairPhysicsBuilder::default();
        assert!(builder.build(&m, &m, 1.0, 0.0).is_err());
        assert!(builder
            .build(&Material::new(-1.0, 0.3, 0.5), &m, 1.0, 1.0)
            .is_err());
        assert!(PairPhysicsBuilder::new(1.0, 0.0)
            .build(&m, &m, 1.0, 1.0)
            .is_err());
    }

    #[test]
    fn nearest_image_wraps_across_the_cell() {
        let cell = PeriodicCell::cube(10.0);
        let image = cell.nearest_image(DVec3::new(9.0, -1.0, 6.0));
        assert_eq!(image, IVec3::new(-1, 0, -1));
        let wrapped = DVec3::new(9.0, -1.0, 6.0) + cell.shift(image);
        assert_relative_eq!(wrapped.x, -1.0);
        assert_relative_eq!(wrapped.z, -4.0);
        assert_relative_eq!(cell.volume(), 1000.0);
    }

    #[test]
    fn shift_velocity_follows_the_gradient() {
        let mut grad = DMat3::ZERO;
        grad.y_axis.x = 2.0; // v_x = 2 * y
        let cell = PeriodicCell::cube(1.0).with_velocity_gradient(grad);
        let v = cell.shift_velocity(IVec3::new(0, 1, 0));
        assert_relative_eq!(v.x, 2.0);
        assert_relative_eq!(v.y, 0.0);
    }
}
