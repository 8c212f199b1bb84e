use glam::{DVec3, IVec3};

use crate::{
    core::{body::Body, types::PeriodicCell},
    utils::math::split_along,
};

/// Sphere-sphere geometry and incident kinematics of one pair for one step.
///
/// `normal` points from body 1 to body 2 (or to the periodic image of body 2
/// selected by `cell_dist`). Relative quantities are body 2 minus body 1.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ContactGeometry {
    pub normal: DVec3,
    pub contact_point: DVec3,
    pub radius1: f64,
    pub radius2: f64,
    /// Surface separation of the two spheres, negative when they overlap.
    pub approach: f64,
    /// Position offset applied to body 2 to reach the interacting image.
    pub shift2: DVec3,
    /// Relative velocity of the surfaces at the contact point.
    pub relative_velocity: DVec3,
    /// Tangential relative displacement over the step.
    pub shear_increment: DVec3,
    /// Rotation vector of the mean spin about the normal over the step.
    pub twist_increment: DVec3,
    pub relative_angular_velocity: DVec3,
}

impl ContactGeometry {
    /// Returns `None` when either body is not a sphere or the centres coincide.
    pub fn between(
        body1: &Body,
        body2: &Body,
        cell: Option<&PeriodicCell>,
        cell_dist: IVec3,
        dt: f64,
    ) -> Option<Self> {
        let radius1 = body1.radius()?;
        let radius2 = body2.radius()?;

        let (shift2, shift_velocity) = match cell {
            Some(cell) => (cell.shift(cell_dist), cell.shift_velocity(cell_dist)),
            None => (DVec3::ZERO, DVec3::ZERO),
        };

        let branch = body2.position + shift2 - body1.position;
        let distance = branch.length();
        if distance <= f64::EPSILON * (radius1 + radius2) {
            return None;
        }
        let normal = branch / distance;
        let approach = distance - radius1 - radius2;
        let contact_point = body1.position + normal * (radius1 + 0.5 * approach);

        let arm1 = contact_point - body1.position;
        let arm2 = contact_point - (body2.position + shift2);
        let velocity1 = body1.velocity.linear + body1.velocity.angular.cross(arm1);
        let velocity2 =
            body2.velocity.linear + shift_velocity + body2.velocity.angular.cross(arm2);
        let relative_velocity = velocity2 - velocity1;
        let (_, tangential) = split_along(relative_velocity, normal);

        let mean_spin = 0.5 * (body1.velocity.angular + body2.velocity.angular);

        Some(Self {
            normal,
            contact_point,
            radius1,
            radius2,
            approach,
            shift2,
            relative_velocity,
            shear_increment: tangential * dt,
            twist_increment: normal * (dt * mean_spin.dot(normal)),
            relative_angular_velocity: body2.velocity.angular - body1.velocity.angular,
        })
    }

    /// Mean radius `a` of the pair.
    pub fn mean_radius(&self) -> f64 {
        0.5 * (self.radius1 + self.radius2)
    }

    /// Rate of change of the surface separation; negative while approaching.
    pub fn normal_velocity(&self) -> f64 {
        self.relative_velocity.dot(self.normal)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use glam::DMat3;

    #[test]
    fn approaching_spheres_report_gap_and_normal_velocity() {
        let b1 = Body::sphere(1e-3, DVec3::ZERO);
        let b2 = Body::sphere(1e-3, DVec3::new(2.5e-3, 0.0, 0.0))
            .with_velocity(DVec3::new(-1e-4, 0.0, 0.0), DVec3::ZERO);

        let geom = ContactGeometry::between(&b1, &b2, None, IVec3::ZERO, 1e-3)
            .expect("two spheres");
        assert_relative_eq!(geom.approach, 0.5e-3, max_relative = 1e-12);
        assert_relative_eq!(geom.normal.x, 1.0);
        assert_relative_eq!(geom.contact_point.x, 1.25e-3, max_relative = 1e-12);
        assert!(geom.normal_velocity() < 0.0);
        assert_eq!(geom.shear_increment, DVec3::ZERO);
    }

    #[test]
    fn sliding_and_spinning_show_up_as_shear_increment() {
        let b1 = Body::sphere(1.0, DVec3::ZERO);
        let b2 = Body::sphere(1.0, DVec3::new(2.0, 0.0, 0.0))
            .with_velocity(DVec3::new(0.0, 3.0, 0.0), DVec3::new(0.0, 0.0, 1.0));

        let geom = ContactGeometry::between(&b1, &b2, None, IVec3::ZERO, 0.1)
            .expect("two spheres");
        // contact at x = 1, arm2 = (-1, 0, 0), spin z: w x arm2 = (0, -1, 0)
        assert_relative_eq!(geom.shear_increment.y, 0.2, max_relative = 1e-12);
        assert_relative_eq!(geom.twist_increment.length(), 0.0);
        assert_relative_eq!(geom.relative_angular_velocity.z, 1.0);
    }

    #[test]
    fn periodic_image_carries_shear_velocity() {
        let mut grad = DMat3::ZERO;
        grad.y_axis.x = 1.0;
        let cell = PeriodicCell::cube(10.0).with_velocity_gradient(grad);
        let b1 = Body::sphere(1.0, DVec3::new(0.0, 0.5, 0.0));
        let b2 = Body::sphere(1.0, DVec3::new(0.0, 8.6, 0.0));

        let image = cell.nearest_image(b2.position - b1.position);
        assert_eq!(image, IVec3::new(0, -1, 0));
        let geom = ContactGeometry::between(&b1, &b2, Some(&cell), image, 1.0)
            .expect("two spheres");
        assert_relative_eq!(geom.approach, -0.1, max_relative = 1e-9);
        assert_relative_eq!(geom.normal.y, -1.0);
        // the lower image moves at -10 * 1 in x
        assert_relative_eq!(geom.shear_increment.x, -10.0, max_relative = 1e-12);
    }

    #[test]
    fn boundaries_never_form_sphere_geometry() {
        let wall = Body::boundary(DVec3::ZERO);
        let sphere = Body::sphere(1.0, DVec3::X * 3.0);
        assert!(ContactGeometry::between(&wall, &sphere, None, IVec3::ZERO, 1.0).is_none());
    }
}
