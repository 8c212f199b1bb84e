#[cfg(feature = "parallel")]
use rayon::prelude::*;

use super::{
    forces::{ForceBuffer, ForceSink},
    law::{LubricationLaw, PairOutcome},
};
#[cfg(feature = "parallel")]
use super::forces::LockedForceBuffer;
#[cfg(feature = "parallel")]
use crate::config::Accumulation;
use crate::{
    collision::geometry::ContactGeometry,
    core::{body::Body, interaction::Interaction, types::PeriodicCell},
    utils::allocator::{Arena, InteractionId},
};

/// Outcome of one interaction in a pass.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PairRecord {
    pub id: InteractionId,
    pub outcome: PairOutcome,
}

/// One sweep of the law over every interaction, with body data read-only.
///
/// Pairs never read each other's state, so the only shared writes are the
/// force accumulators. The sequential sweep writes into one buffer; the
/// parallel sweep either folds per-worker buffers or locks per body.
pub struct PairPass<'a> {
    law: &'a LubricationLaw,
    bodies: &'a Arena<Body>,
    cell: Option<&'a PeriodicCell>,
    dt: f64,
}

impl<'a> PairPass<'a> {
    pub fn new(
        law: &'a LubricationLaw,
        bodies: &'a Arena<Body>,
        cell: Option<&'a PeriodicCell>,
        dt: f64,
    ) -> Self {
        Self {
            law,
            bodies,
            cell,
            dt,
        }
    }

    /// Evaluates one interaction. Pairs whose bodies vanished or are not both
    /// spheres are reported for dropping.
    pub fn run_one<S: ForceSink>(
        &self,
        id: InteractionId,
        interaction: &mut Interaction,
        sink: &mut S,
    ) -> PairRecord {
        let geometry = match (
            self.bodies.get(interaction.body1),
            self.bodies.get(interaction.body2),
        ) {
            (Some(body1), Some(body2)) => {
                ContactGeometry::between(body1, body2, self.cell, interaction.cell_dist, self.dt)
            }
            _ => None,
        };

        let outcome = match geometry {
            Some(geometry) => self.law.evaluate(interaction, geometry, self.dt, sink),
            None => {
                interaction.geometry = None;
                PairOutcome {
                    keep: false,
                    evaluated: false,
                    gap: None,
                }
            }
        };
        PairRecord { id, outcome }
    }

    pub fn run_sequential(
        &self,
        interactions: &mut Arena<Interaction>,
        sink: &mut ForceBuffer,
    ) -> Vec<PairRecord> {
        interactions
            .iter_mut()
            .map(|(id, interaction)| self.run_one(id, interaction, sink))
            .collect()
    }

    /// Parallel sweep returning the merged forces and the records in id order.
    #[cfg(feature = "parallel")]
    pub fn run_parallel(
        &self,
        interactions: &mut Arena<Interaction>,
        accumulation: Accumulation,
        slots: usize,
    ) -> (ForceBuffer, Vec<PairRecord>) {
        let (buffer, mut records) = match accumulation {
            Accumulation::ThreadLocal => interactions
                .par_iter_mut()
                .fold(
                    || (ForceBuffer::new(slots), Vec::new()),
                    |(mut buffer, mut records), (id, interaction)| {
                        records.push(self.run_one(id, interaction, &mut buffer));
                        (buffer, records)
                    },
                )
                .reduce(
                    || (ForceBuffer::new(slots), Vec::new()),
                    |(mut merged, mut records), (buffer, more)| {
                        merged.merge(&buffer);
                        records.extend(more);
                        (merged, records)
                    },
                ),
            Accumulation::PerBodyLock => {
                let locked = LockedForceBuffer::new(slots);
                let records: Vec<PairRecord> = interactions
                    .par_iter_mut()
                    .map(|(id, interaction)| {
                        let mut sink = &locked;
                        self.run_one(id, interaction, &mut sink)
                    })
                    .collect();
                (locked.into_buffer(), records)
            }
        };
        records.sort_by_key(|record| record.id);
        (buffer, records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::{Material, PairPhysicsBuilder};
    use glam::{DVec3, IVec3};

    #[test]
    fn pairs_with_missing_bodies_are_dropped() {
        let law = LubricationLaw::default();
        let mut bodies = Arena::new();
        let a = bodies.insert(Body::sphere(1.0, DVec3::ZERO));
        let b = bodies.insert(Body::sphere(1.0, DVec3::new(2.1, 0.0, 0.0)));

        let constants = PairPhysicsBuilder::default()
            .build(&Material::default(), &Material::default(), 1.0, 1.0)
            .expect("valid pair");
        let geometry = ContactGeometry::between(
            bodies.get(a).expect("a"),
            bodies.get(b).expect("b"),
            None,
            IVec3::ZERO,
            1e-3,
        )
        .expect("two spheres");
        let mut interactions = Arena::new();
        interactions.insert(Interaction::new(a, b, IVec3::ZERO, constants, &geometry));

        bodies.remove(b);
        let pass = PairPass::new(&law, &bodies, None, 1e-3);
        let mut sink = ForceBuffer::new(bodies.capacity());
        let records = pass.run_sequential(&mut interactions, &mut sink);
        assert_eq!(records.len(), 1);
        assert!(!records[0].outcome.keep);
        assert_eq!(sink.net_force(), DVec3::ZERO);
    }
}
