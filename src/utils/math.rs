//! Small `glam` helpers shared by the force models and the stress reduction.

use glam::{DMat3, DVec3};
use std::f64::consts::PI;

/// Outer product `a ⊗ b`, i.e. the matrix with entries `a_i * b_j`.
pub fn outer(a: DVec3, b: DVec3) -> DMat3 {
    DMat3::from_cols(a * b.x, a * b.y, a * b.z)
}

pub fn sphere_volume(radius: f64) -> f64 {
    4.0 / 3.0 * PI * radius.powi(3)
}

/// Splits `v` into the part along `normal` and the remainder.
pub fn split_along(v: DVec3, normal: DVec3) -> (DVec3, DVec3) {
    let along = normal * v.dot(normal);
    (along, v - along)
}

pub fn approx_zero(m: &DMat3, tolerance: f64) -> bool {
    m.to_cols_array().iter().all(|entry| entry.abs() <= tolerance)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn outer_product_places_rows_and_columns() {
        let m = outer(DVec3::new(1.0, 2.0, 3.0), DVec3::new(0.0, 10.0, 0.0));
        // column j is a * b_j
        assert_eq!(m.x_axis, DVec3::ZERO);
        assert_eq!(m.y_axis, DVec3::new(10.0, 20.0, 30.0));
        assert_eq!(m.z_axis, DVec3::ZERO);
        assert_eq!(m.row(2), DVec3::new(0.0, 30.0, 0.0));
    }

    #[test]
    fn split_along_parts_sum_back_to_the_vector() {
        let n = DVec3::new(0.0, 0.0, 1.0);
        let (along, across) = split_along(DVec3::new(1.0, -2.0, 5.0), n);
        assert_eq!(along, DVec3::new(0.0, 0.0, 5.0));
        assert_eq!(across, DVec3::new(1.0, -2.0, 0.0));
    }
}
