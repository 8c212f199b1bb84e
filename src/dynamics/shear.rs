use glam::DVec3;
use std::f64::consts::PI;

use crate::utils::math::split_along;

/// Carries a tangential force from the previous contact frame into the
/// current one.
///
/// Applies the small rotation taking `prev_normal` onto `normal`, then the
/// twist about the normal, and finally drops whatever normal component the
/// linearised rotations leave behind.
pub fn co_rotate(force: DVec3, prev_normal: DVec3, normal: DVec3, twist: DVec3) -> DVec3 {
    let tilt = prev_normal.cross(normal);
    let mut rotated = force - force.cross(tilt);
    rotated -= rotated.cross(twist);
    split_along(rotated, normal).1
}

/// Shear stiffness, sharing the deflection floor of the normal stiffness.
pub fn shear_stiffness(kso: f64, floored_deflection: f64) -> f64 {
    kso * floored_deflection.sqrt()
}

/// Viscous resistance to tangential sliding across a film of thickness `u`.
///
/// Zero without fluid. Diverges logarithmically as `u → 0`; callers keep
/// `u > 0` whenever `eta > 0`.
pub fn shear_viscosity(eta: f64, mean_radius: f64, u: f64) -> f64 {
    if eta <= 0.0 {
        return 0.0;
    }
    let a = mean_radius;
    PI * eta / 2.0 * (-2.0 * a + (2.0 * a + u) * ((2.0 * a + u) / u).ln())
}

/// Everything the shear model needs for one step.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShearInput {
    /// Previous total shear force, already co-rotated into the current frame.
    pub previous: DVec3,
    /// Tangential displacement over the step.
    pub increment: DVec3,
    pub stiffness: f64,
    pub viscosity: f64,
    pub dt: f64,
    pub contact: bool,
    /// Magnitude of the asperity part of the normal force.
    pub normal_contact: f64,
    pub friction: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ShearForces {
    pub total: DVec3,
    pub contact: DVec3,
    pub lubrication: DVec3,
    pub slip: bool,
}

/// Elastic-viscous shear force on body 1.
///
/// In contact the elastic trial force is capped by Coulomb friction; a
/// slipping contact then relaxes towards the damper-limited force. Without
/// contact the spring and the film act in series.
pub fn shear_forces(input: &ShearInput) -> ShearForces {
    let ShearInput {
        previous,
        increment,
        stiffness: ks,
        viscosity: cs,
        dt,
        ..
    } = *input;

    if !input.contact {
        let compliance = cs + ks * dt;
        let total = if compliance > 0.0 {
            (previous + increment * ks) * (cs / compliance)
        } else {
            DVec3::ZERO
        };
        return ShearForces {
            total,
            contact: DVec3::ZERO,
            lubrication: total,
            slip: false,
        };
    }

    let trial = previous + increment * ks;
    let bound = input.normal_contact * input.friction.max(0.0);
    let trial_norm = trial.length();
    if trial_norm <= bound {
        return ShearForces {
            total: trial,
            contact: trial,
            lubrication: DVec3::ZERO,
            slip: false,
        };
    }

    let clipped = trial * (bound / trial_norm);
    let relaxation = ks * dt + cs;
    let total = if relaxation > 0.0 {
        (clipped * (ks * dt) + previous * cs + increment * (ks * cs)) / relaxation
    } else {
        clipped
    };
    ShearForces {
        total,
        contact: clipped,
        lubrication: increment * (cs / dt),
        slip: true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn input(contact: bool) -> ShearInput {
        ShearInput {
            previous: DVec3::ZERO,
            increment: DVec3::new(0.0, 1e-6, 0.0),
            stiffness: 1e3,
            viscosity: 0.0,
            dt: 1e-3,
            contact,
            normal_contact: 1.0,
            friction: 0.5,
        }
    }

    #[test]
    fn co_rotation_follows_a_rotating_normal() {
        let angle: f64 = 1e-3;
        let normal = DVec3::new(angle.cos(), angle.sin(), 0.0);
        let rotated = co_rotate(DVec3::Y, DVec3::X, normal, DVec3::ZERO);
        assert!(rotated.dot(normal).abs() < 1e-15);
        assert_relative_eq!(rotated.x, -angle, max_relative = 1e-3);
        assert_relative_eq!(rotated.y, 1.0, max_relative = 1e-5);
    }

    #[test]
    fn co_rotation_applies_the_twist() {
        let twist = DVec3::new(1e-3, 0.0, 0.0);
        let rotated = co_rotate(DVec3::Y, DVec3::X, DVec3::X, twist);
        // a twist about +x turns +y towards +z
        assert_relative_eq!(rotated.z, 1e-3, max_relative = 1e-12);
    }

    #[test]
    fn viscosity_vanishes_without_fluid_and_grows_as_the_gap_closes() {
        assert_eq!(shear_viscosity(0.0, 1e-3, 1e-6), 0.0);
        let wide = shear_viscosity(1e-3, 1e-3, 1e-4);
        let narrow = shear_viscosity(1e-3, 1e-3, 1e-6);
        assert!(wide > 0.0);
        assert!(narrow > wide);
    }

    #[test]
    fn sticking_contact_is_purely_elastic() {
        let forces = shear_forces(&input(true));
        assert!(!forces.slip);
        assert_relative_eq!(forces.total.y, 1e-3, max_relative = 1e-12);
        assert_eq!(forces.contact, forces.total);
        assert_eq!(forces.lubrication, DVec3::ZERO);
    }

    #[test]
    fn slipping_contact_is_capped_by_friction() {
        let mut slipping = input(true);
        slipping.increment = DVec3::new(0.0, 1e-2, 1e-2);
        slipping.viscosity = 0.3;
        let forces = shear_forces(&slipping);
        assert!(forces.slip);
        assert!(forces.contact.length() <= 0.5 * (1.0 + 1e-12));
        assert_relative_eq!(forces.contact.length(), 0.5, max_relative = 1e-12);
    }

    #[test]
    fn dry_slip_reduces_to_the_clipped_force() {
        let mut slipping = input(true);
        slipping.increment = DVec3::new(0.0, 1e-2, 0.0);
        let forces = shear_forces(&slipping);
        assert!(forces.slip);
        assert_relative_eq!(forces.total.y, 0.5, max_relative = 1e-12);
    }

    #[test]
    fn lubricated_shear_acts_in_series() {
        let mut film = input(false);
        film.viscosity = 1.0;
        let forces = shear_forces(&film);
        let expected = 1e3 * 1e-6 * 1.0 / (1.0 + 1e3 * 1e-3);
        assert_relative_eq!(forces.lubrication.y, expected, max_relative = 1e-12);
        assert_eq!(forces.contact, DVec3::ZERO);
        assert!(!forces.slip);

        // no fluid, no contact: nothing transmits shear
        let dry = shear_forces(&input(false));
        assert_eq!(dry.total, DVec3::ZERO);
    }
}
