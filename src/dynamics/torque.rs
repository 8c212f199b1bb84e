use glam::DVec3;
use std::f64::consts::PI;

use crate::{
    error::{LubricationError, Result},
    utils::math::split_along,
};

/// Which torque channels are active.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TorqueChannels {
    pub roll: bool,
    pub twist: bool,
}

impl TorqueChannels {
    pub fn any(self) -> bool {
        self.roll || self.twist
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct LubricationTorques {
    pub roll: DVec3,
    pub twist: DVec3,
}

/// Film resistance to relative rolling and twisting of the two spheres.
///
/// `relative_angular_velocity` is body 2 minus body 1; the part along the
/// normal drives the twist torque and the rest the roll torque. Both carry a
/// `ln(a/u)` term, so a closed film with a viscous fluid is rejected.
pub fn lubrication_torques(
    eta: f64,
    mean_radius: f64,
    un: f64,
    u: f64,
    relative_angular_velocity: DVec3,
    normal: DVec3,
    channels: TorqueChannels,
) -> Result<LubricationTorques> {
    if eta <= 0.0 || !channels.any() {
        return Ok(LubricationTorques::default());
    }
    if !(u > 0.0) {
        return Err(LubricationError::InvalidGap(u));
    }

    let a = mean_radius;
    let log_ratio = (a / u).ln();
    let (twist_velocity, roll_velocity) = split_along(relative_angular_velocity, normal);

    let roll = if channels.roll {
        roll_velocity * (PI * eta * a.powi(3) * (1.5 * log_ratio + 63.0 / 500.0 * (u / a) * log_ratio))
    } else {
        DVec3::ZERO
    };
    let twist = if channels.twist {
        twist_velocity * (PI * eta * a * un * log_ratio)
    } else {
        DVec3::ZERO
    };
    Ok(LubricationTorques { roll, twist })
}

/// Total torques on the two bodies from the shear force acting at the contact
/// point and the film torques.
pub fn body_torques(
    shear_force: DVec3,
    normal: DVec3,
    radius1: f64,
    radius2: f64,
    un: f64,
    film: &LubricationTorques,
) -> (DVec3, DVec3) {
    let moment = shear_force.cross(normal);
    let film_total = film.roll + film.twist;
    (
        -(radius1 + 0.5 * un) * moment + film_total,
        -(radius2 + 0.5 * un) * moment - film_total,
    )
}
