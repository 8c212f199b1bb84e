use glam::DVec3;
use serde::{Deserialize, Serialize};

use super::types::{Material, Velocity};
use crate::utils::{allocator::BodyId, math::sphere_volume};

/// Shape of a body as far as the lubrication law is concerned.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum BodyShape {
    Sphere { radius: f64 },
    /// Walls and other boundaries: they own force accumulators but never form
    /// lubricated pairs and carry no volume.
    Boundary,
}

/// Kinematic state of one body, owned by the surrounding simulation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Body {
    pub id: BodyId,
    pub position: DVec3,
    pub velocity: Velocity,
    pub shape: BodyShape,
    pub material: Material,
}

impl Body {
    pub fn sphere(radius: f64, position: DVec3) -> Self {
        Self {
            id: BodyId::default(),
            position,
            velocity: Velocity::default(),
            shape: BodyShape::Sphere { radius },
            material: Material::default(),
        }
    }

    pub fn boundary(position: DVec3) -> Self {
        Self {
            id: BodyId::default(),
            position,
            velocity: Velocity::default(),
            shape: BodyShape::Boundary,
            material: Material::default(),
        }
    }

    pub fn with_velocity(mut self, linear: DVec3, angular: DVec3) -> Self {
        self.velocity = Velocity::new(linear, angular);
        self
    }

    pub fn with_material(mut self, material: Material) -> Self {
        self.material = material;
        self
    }

    pub fn radius(&self) -> Option<f64> {
        match self.shape {
            BodyShape::Sphere { radius } => Some(radius),
            BodyShape::Boundary => None,
        }
    }

    pub fn volume(&self) -> Option<f64> {
        self.radius().map(sphere_volume)
    }

    pub fn is_sphere(&self) -> bool {
        matches!(self.shape, BodyShape::Sphere { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn only_spheres_carry_volume() {
        let sphere = Body::sphere(2.0, DVec3::ZERO);
        assert_relative_eq!(
            sphere.volume().expect("sphere volume"),
            32.0 / 3.0 * std::f64::consts::PI
        );
        assert!(Body::boundary(DVec3::ZERO).volume().is_none());
        assert!(!Body::boundary(DVec3::ZERO).is_sphere());
    }
}
