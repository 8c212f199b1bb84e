use std::collections::HashMap;

use glam::DVec3;
use log::debug;

use crate::{
    collision::{broadphase::BroadPhase, geometry::ContactGeometry},
    config::{Accumulation, LubricationConfig, DEFAULT_BROADPHASE_CELL_SIZE, DEFAULT_TIME_STEP},
    core::{
        body::Body,
        interaction::Interaction,
        types::{PairPhysicsBuilder, PeriodicCell},
    },
    dynamics::{
        forces::ForceBuffer,
        law::LubricationLaw,
        parallel::{PairPass, PairRecord},
        stress::{StressAggregator, StressSet},
    },
    error::{LubricationError, Result},
    utils::{
        allocator::{Arena, BodyId, InteractionId},
        logging::ScopedTimer,
    },
};

/// Counters of one [`LubricationWorld::step`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StepReport {
    pub pairs_created: usize,
    pub pairs_evaluated: usize,
    /// Pairs beyond the cutoff that stayed real without being evaluated.
    pub pairs_skipped: usize,
    pub pairs_dropped: usize,
    pub regime_flips: usize,
    pub sub_steps: usize,
    pub fallbacks: usize,
    /// Live pairs currently flagged as switching regime every step.
    pub oscillating: usize,
}

/// Hosts bodies and their lubricated pairs and runs the law once per step.
///
/// Positions and velocities belong to the caller, who moves the bodies
/// between steps; the world detects pairs, keeps their state, and collects
/// the resulting forces, torques, and stresses.
pub struct LubricationWorld {
    pub bodies: Arena<Body>,
    pub time_step: f64,
    interactions: Arena<Interaction>,
    pair_index: HashMap<(BodyId, BodyId), InteractionId>,
    law: LubricationLaw,
    builder: PairPhysicsBuilder,
    broadphase: BroadPhase,
    cell: Option<PeriodicCell>,
    forces: ForceBuffer,
    parallel_enabled: bool,
    last_report: StepReport,
}

impl LubricationWorld {
    pub fn new(time_step: f64) -> Self {
        let ts = if time_step <= 0.0 {
            DEFAULT_TIME_STEP
        } else {
            time_step
        };

        Self {
            bodies: Arena::new(),
            time_step: ts,
            interactions: Arena::new(),
            pair_index: HashMap::new(),
            law: LubricationLaw::default(),
            builder: PairPhysicsBuilder::default(),
            broadphase: BroadPhase::new(DEFAULT_BROADPHASE_CELL_SIZE),
            cell: None,
            forces: ForceBuffer::default(),
            parallel_enabled: false,
            last_report: StepReport::default(),
        }
    }

    pub fn with_config(time_step: f64, config: LubricationConfig) -> Result<Self> {
        let mut world = Self::new(time_step);
        world.law = LubricationLaw::new(config)?;
        Ok(world)
    }

    pub fn with_pair_builder(mut self, builder: PairPhysicsBuilder) -> Self {
        self.builder = builder;
        self
    }

    pub fn with_periodic_cell(mut self, cell: PeriodicCell) -> Self {
        self.cell = Some(cell);
        self
    }

    pub fn with_broadphase_cell_size(mut self, cell_size: f64) -> Self {
        self.broadphase = BroadPhase::new(cell_size);
        self
    }

    pub fn set_periodic_cell(&mut self, cell: Option<PeriodicCell>) {
        self.cell = cell;
    }

    pub fn cell(&self) -> Option<&PeriodicCell> {
        self.cell.as_ref()
    }

    pub fn law(&self) -> &LubricationLaw {
        &self.law
    }

    pub fn pair_builder(&self) -> &PairPhysicsBuilder {
        &self.builder
    }

    /// Parallel evaluation only takes effect with the `parallel` feature.
    pub fn set_parallel_enabled(&mut self, enabled: bool) {
        self.parallel_enabled = enabled;
    }

    pub fn parallel_enabled(&self) -> bool {
        self.parallel_enabled
    }

    pub fn add_body(&mut self, body: Body) -> BodyId {
        let id = self.bodies.insert(body);
        if let Some(stored) = self.bodies.get_mut(id) {
            stored.id = id;
        }
        id
    }

    /// Removes a body together with every pair it belongs to.
    pub fn remove_body(&mut self, id: BodyId) -> Result<Body> {
        let body = self
            .bodies
            .remove(id)
            .ok_or(LubricationError::UnknownBody(id))?;
        self.interactions.retain(|_, interaction| !interaction.involves(id));
        self.pair_index.retain(|&(a, b), _| a != id && b != id);
        Ok(body)
    }

    pub fn body(&self, id: BodyId) -> Option<&Body> {
        self.bodies.get(id)
    }

    pub fn body_mut(&mut self, id: BodyId) -> Option<&mut Body> {
        self.bodies.get_mut(id)
    }

    pub fn interactions(&self) -> &Arena<Interaction> {
        &self.interactions
    }

    pub fn interaction(&self, id: InteractionId) -> Option<&Interaction> {
        self.interactions.get(id)
    }

    pub fn interaction_between(&self, a: BodyId, b: BodyId) -> Option<&Interaction> {
        let key = if a < b { (a, b) } else { (b, a) };
        self.pair_index
            .get(&key)
            .and_then(|&id| self.interactions.get(id))
    }

    pub fn force(&self, id: BodyId) -> DVec3 {
        self.forces.force(id)
    }

    pub fn torque(&self, id: BodyId) -> DVec3 {
        self.forces.torque(id)
    }

    pub fn forces(&self) -> &ForceBuffer {
        &self.forces
    }

    pub fn last_report(&self) -> &StepReport {
        &self.last_report
    }

    /// Advances the lubricated pairs by one timestep.
    ///
    /// Detects new pairs, evaluates every pair against the current body
    /// kinematics, drops the pairs the law releases, and leaves this step's
    /// forces in [`LubricationWorld::forces`].
    pub fn step(&mut self) -> Result<StepReport> {
        let _timer = ScopedTimer::new("lubrication::step");
        let dt = self.time_step;
        let mut report = StepReport::default();

        {
            let _timer = ScopedTimer::new("pairs::detect");
            report.pairs_created = self.detect_pairs()?;
        }

        let records = {
            let _timer = ScopedTimer::new("pairs::evaluate");
            let pass = PairPass::new(&self.law, &self.bodies, self.cell.as_ref(), dt);
            run_pass(
                &pass,
                &mut self.interactions,
                &mut self.forces,
                self.parallel_enabled,
                self.law.config().accumulation,
                self.bodies.capacity(),
            )
        };

        for record in &records {
            let outcome = &record.outcome;
            if outcome.evaluated {
                report.pairs_evaluated += 1;
            } else if outcome.keep {
                report.pairs_skipped += 1;
            }
            if let Some(gap) = &outcome.gap {
                report.regime_flips += usize::from(gap.regime_flipped);
                report.sub_steps += gap.sub_steps as usize;
                report.fallbacks += gap.fallbacks as usize;
            }
            if !outcome.keep {
                self.drop_interaction(record.id);
                report.pairs_dropped += 1;
            }
        }
        report.oscillating = self
            .interactions
            .values()
            .filter(|interaction| interaction.state.oscillating)
            .count();

        if self.law.config().debug {
            debug!("lubrication step: {report:?}");
        }
        self.last_report = report;
        Ok(report)
    }

    /// Creates pairs for spheres that came within the cutoff and returns how
    /// many were created.
    fn detect_pairs(&mut self) -> Result<usize> {
        let cutoff_factor = self.law.config().cutoff_factor;
        let candidates =
            self.broadphase
                .candidate_pairs(&self.bodies, self.cell.as_ref(), cutoff_factor);

        let mut created = 0;
        for candidate in candidates {
            let key = (candidate.body1, candidate.body2);
            if let Some(&id) = self.pair_index.get(&key) {
                if let Some(existing) = self.interactions.get_mut(id) {
                    existing.cell_dist = candidate.cell_dist;
                }
                continue;
            }

            let (Some(body1), Some(body2)) =
                (self.bodies.get(candidate.body1), self.bodies.get(candidate.body2))
            else {
                continue;
            };
            let Some(geometry) = ContactGeometry::between(
                body1,
                body2,
                self.cell.as_ref(),
                candidate.cell_dist,
                self.time_step,
            ) else {
                continue;
            };
            if geometry.approach >= cutoff_factor * geometry.mean_radius() {
                continue;
            }

            let constants = self.builder.build(
                &body1.material,
                &body2.material,
                geometry.radius1,
                geometry.radius2,
            )?;
            let id = self.interactions.insert(Interaction::new(
                candidate.body1,
                candidate.body2,
                candidate.cell_dist,
                constants,
                &geometry,
            ));
            self.pair_index.insert(key, id);
            created += 1;
        }
        Ok(created)
    }

    fn drop_interaction(&mut self, id: InteractionId) {
        if let Some(interaction) = self.interactions.remove(id) {
            self.pair_index
                .remove(&(interaction.body1, interaction.body2));
        }
    }

    /// Per-body stresses from the pairs evaluated in the last step, one entry
    /// per body arena slot.
    pub fn stress_for_each_body(&self) -> Vec<StressSet> {
        StressAggregator::per_body(&self.bodies, &self.interactions)
    }

    /// Bulk stresses over the periodic cell; an error without one.
    pub fn total_stresses(&self) -> Result<StressSet> {
        StressAggregator::bulk(&self.bodies, &self.interactions, self.cell.as_ref())
    }
}

#[cfg(feature = "parallel")]
fn run_pass(
    pass: &PairPass<'_>,
    interactions: &mut Arena<Interaction>,
    forces: &mut ForceBuffer,
    parallel: bool,
    accumulation: Accumulation,
    slots: usize,
) -> Vec<PairRecord> {
    if parallel {
        let (buffer, records) = pass.run_parallel(interactions, accumulation, slots);
        *forces = buffer;
        return records;
    }
    forces.reset(slots);
    pass.run_sequential(interactions, forces)
}

#[cfg(not(feature = "parallel"))]
fn run_pass(
    pass: &PairPass<'_>,
    interactions: &mut Arena<Interaction>,
    forces: &mut ForceBuffer,
    _parallel: bool,
    _accumulation: Accumulation,
    slots: usize,
) -> Vec<PairRecord> {
    forces.reset(slots);
    pass.run_sequential(interactions, forces)
}
