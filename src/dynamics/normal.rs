use glam::DVec3;

use crate::config::MIN_DEFLECTION_FRACTION;

/// Deflection `max(ue, a/100)` fed to both stiffnesses.
///
/// The floor keeps the stiffness finite when the surfaces first meet.
pub fn floored_deflection(deflection: f64, mean_radius: f64) -> f64 {
    deflection.max(MIN_DEFLECTION_FRACTION * mean_radius)
}

/// Deflection-dependent normal stiffness `kno · √δ`, `δ` from [`floored_deflection`].
pub fn normal_stiffness(kno: f64, floored_deflection: f64) -> f64 {
    kno * floored_deflection.sqrt()
}

/// Normal force on body 1 and its split into asperity contact and film parts.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct NormalForces {
    pub total: DVec3,
    pub contact: DVec3,
    pub lubrication: DVec3,
}

/// Splits the normal force for a resolved gap `u` at separation `un`.
///
/// The total `k·(un - u)` is what the film transmits; once asperities touch,
/// the part `k·(u - threshold)` is carried by the contact and the rest stays
/// with the film.
pub fn normal_forces(
    stiffness: f64,
    un: f64,
    u: f64,
    contact: bool,
    threshold: f64,
    normal: DVec3,
) -> NormalForces {
    let total = normal * (stiffness * (un - u));
    let contact = if contact {
        normal * (stiffness * (u - threshold))
    } else {
        DVec3::ZERO
    };
    NormalForces {
        total,
        contact,
        lubrication: total - contact,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn stiffness_has_a_floor() {
        let a = 1e-3;
        let floor = 4.0 * 1e-5_f64.sqrt();
        let stiffness = |ue: f64| normal_stiffness(4.0, floored_deflection(ue, a));
        assert_relative_eq!(stiffness(0.0), floor, max_relative = 1e-12);
        assert_relative_eq!(stiffness(-1.0), floor, max_relative = 1e-12);
        assert_relative_eq!(stiffness(4e-4), 0.08, max_relative = 1e-12);
        assert_eq!(floored_deflection(4e-4, a), 4e-4);
    }

    #[test]
    fn film_only_forces_carry_no_contact_part() {
        let forces = normal_forces(10.0, 1e-4, 2e-4, false, 1e-6, DVec3::Y);
        assert_eq!(forces.contact, DVec3::ZERO);
        assert_eq!(forces.lubrication, forces.total);
        // gap lagging behind the approach: body 1 is pushed away from body 2
        assert!(forces.total.y < 0.0);
    }

    #[test]
    fn contact_and_film_parts_sum_to_the_total() {
        let forces = normal_forces(10.0, -1e-6, 5e-7, true, 1e-6, DVec3::X);
        assert_relative_eq!(forces.contact.x, 10.0 * (5e-7 - 1e-6), max_relative = 1e-12);
        assert_relative_eq!(
            (forces.contact + forces.lubrication).x,
            forces.total.x,
            max_relative = 1e-12
        );
    }
}
