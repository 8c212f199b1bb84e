use glam::DMat3;
use serde::{Deserialize, Serialize};

use crate::{
    core::{body::Body, interaction::Interaction, types::PeriodicCell},
    error::{LubricationError, Result},
    utils::{allocator::Arena, math::outer},
};

/// Stress split by origin: asperity contact or film, normal or shear.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StressSet {
    pub normal_contact: DMat3,
    pub shear_contact: DMat3,
    pub normal_lubrication: DMat3,
    pub shear_lubrication: DMat3,
}

impl Default for StressSet {
    fn default() -> Self {
        Self::ZERO
    }
}

impl StressSet {
    pub const ZERO: Self = Self {
        normal_contact: DMat3::ZERO,
        shear_contact: DMat3::ZERO,
        normal_lubrication: DMat3::ZERO,
        shear_lubrication: DMat3::ZERO,
    };

    fn add_scaled(&mut self, other: &StressSet, factor: f64) {
        self.normal_contact += other.normal_contact * factor;
        self.shear_contact += other.shear_contact * factor;
        self.normal_lubrication += other.normal_lubrication * factor;
        self.shear_lubrication += other.shear_lubrication * factor;
    }

    /// Sum of the four parts.
    pub fn total(&self) -> DMat3 {
        self.normal_contact + self.shear_contact + self.normal_lubrication + self.shear_lubrication
    }
}

/// Reduces the forces of all evaluated pairs into per-body and bulk stresses.
///
/// Reads only; call it after the step has committed every pair.
pub struct StressAggregator;

impl StressAggregator {
    /// One [`StressSet`] per body arena slot; free slots and bodies without
    /// lubricated pairs stay zero.
    ///
    /// Each pair adds `F ⊗ l₁ / V₁` to body 1 and subtracts `F ⊗ l₂ / V₂` from
    /// body 2, `lᵢ` running from the centre (of the interacting periodic image
    /// for body 2) to the contact point.
    pub fn per_body(bodies: &Arena<Body>, interactions: &Arena<Interaction>) -> Vec<StressSet> {
        let mut stresses = vec![StressSet::ZERO; bodies.capacity()];

        for interaction in interactions.values() {
            let Some(geometry) = interaction.geometry.as_ref() else {
                continue;
            };
            let (Some(body1), Some(body2)) = (
                bodies.get(interaction.body1),
                bodies.get(interaction.body2),
            ) else {
                continue;
            };
            let (Some(volume1), Some(volume2)) = (body1.volume(), body2.volume()) else {
                continue;
            };

            let lever1 = (geometry.contact_point - body1.position) / volume1;
            let lever2 = (geometry.contact_point - (body2.position + geometry.shift2)) / volume2;
            let state = &interaction.state;
            let forces = [
                state.normal_contact_force,
                state.shear_contact_force,
                state.normal_lubrication_force,
                state.shear_lubrication_force,
            ];

            let first = &mut stresses[interaction.body1.index()];
            first.normal_contact += outer(forces[0], lever1);
            first.shear_contact += outer(forces[1], lever1);
            first.normal_lubrication += outer(forces[2], lever1);
            first.shear_lubrication += outer(forces[3], lever1);

            let second = &mut stresses[interaction.body2.index()];
            second.normal_contact -= outer(forces[0], lever2);
            second.shear_contact -= outer(forces[1], lever2);
            second.normal_lubrication -= outer(forces[2], lever2);
            second.shear_lubrication -= outer(forces[3], lever2);
        }

        stresses
    }

    /// Volume-weighted average of the per-body stresses over the periodic cell.
    pub fn bulk(
        bodies: &Arena<Body>,
        interactions: &Arena<Interaction>,
        cell: Option<&PeriodicCell>,
    ) -> Result<StressSet> {
        let cell = cell.ok_or(LubricationError::NonPeriodicDomain)?;
        let per_body = Self::per_body(bodies, interactions);
        Self::bulk_from(&per_body, bodies, cell)
    }

    /// Bulk stress from per-body stresses already computed for this step.
    pub fn bulk_from(
        per_body: &[StressSet],
        bodies: &Arena<Body>,
        cell: &PeriodicCell,
    ) -> Result<StressSet> {
        let cell_volume = cell.volume();
        if !(cell_volume > 0.0) {
            return Err(LubricationError::invalid_parameter(
                "periodic cell has no volume",
            ));
        }

        let mut bulk = StressSet::ZERO;
        for (id, body) in bodies.iter() {
            let (Some(volume), Some(stress)) = (body.volume(), per_body.get(id.index())) else {
                continue;
            };
            bulk.add_scaled(stress, volume);
        }

        let mut averaged = StressSet::ZERO;
        averaged.add_scaled(&bulk, 1.0 / cell_volume);
        Ok(averaged)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::math::approx_zero;

    #[test]
    fn stress_set_totals_its_parts() {
        let mut set = StressSet::ZERO;
        set.normal_contact = DMat3::IDENTITY;
        set.shear_lubrication = DMat3::IDENTITY * 2.0;
        assert_eq!(set.total(), DMat3::IDENTITY * 3.0);
        assert!(approx_zero(&StressSet::default().total(), 0.0));
    }

    #[test]
    fn bulk_needs_a_periodic_cell() {
        let bodies = Arena::new();
        let interactions = Arena::new();
        assert_eq!(
            StressAggregator::bulk(&bodies, &interactions, None),
            Err(LubricationError::NonPeriodicDomain)
        );
    }
}
