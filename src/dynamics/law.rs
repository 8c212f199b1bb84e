//! Per-pair lubrication and contact law.

use glam::DVec3;
use log::{debug, error, warn};

use super::{
    forces::ForceSink,
    gap::{GapProblem, GapSolution},
    normal::{floored_deflection, normal_forces, normal_stiffness, NormalForces},
    regime::{Admission, ContactStateMachine},
    shear::{co_rotate, shear_forces, shear_stiffness, shear_viscosity, ShearForces, ShearInput},
    torque::{body_torques, lubrication_torques, LubricationTorques, TorqueChannels},
};
use crate::{
    collision::geometry::ContactGeometry,
    config::LubricationConfig,
    core::interaction::{Interaction, LubricationState},
    error::Result,
    utils::{allocator::BodyId, logging::LogOnce},
};

/// What one evaluation tells the caller about its pair.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PairOutcome {
    /// `false` once the interaction should be dropped.
    pub keep: bool,
    /// Forces were computed and applied this step.
    pub evaluated: bool,
    /// Gap resolution, when the normal channel ran.
    pub gap: Option<GapSolution>,
}

impl PairOutcome {
    fn skipped(keep: bool) -> Self {
        Self {
            keep,
            evaluated: false,
            gap: None,
        }
    }
}

impl LubricationState {
    fn clear_forces(&mut self) {
        self.normal_force = DVec3::ZERO;
        self.normal_contact_force = DVec3::ZERO;
        self.normal_lubrication_force = DVec3::ZERO;
        self.clear_shear();
    }

    fn clear_shear(&mut self) {
        self.shear_force = DVec3::ZERO;
        self.shear_contact_force = DVec3::ZERO;
        self.shear_lubrication_force = DVec3::ZERO;
        self.slip = false;
    }

    fn store_normal(&mut self, forces: NormalForces) {
        self.normal_force = forces.total;
        self.normal_contact_force = forces.contact;
        self.normal_lubrication_force = forces.lubrication;
    }

    fn store_shear(&mut self, forces: ShearForces) {
        self.shear_force = forces.total;
        self.shear_contact_force = forces.contact;
        self.shear_lubrication_force = forces.lubrication;
        self.slip = forces.slip;
    }
}

/// Implicit lubrication law: resolves the film gap of a pair, derives normal
/// and shear forces plus film torques, and hands them to a [`ForceSink`].
///
/// The law holds no per-pair data and is `Sync`; every pair carries its own
/// [`LubricationState`], so pairs can be evaluated from any number of workers.
#[derive(Debug)]
pub struct LubricationLaw {
    config: LubricationConfig,
    machine: ContactStateMachine,
    closed_film_reported: LogOnce,
    oscillation_reported: LogOnce,
    fallback_reported: LogOnce,
}

impl Default for LubricationLaw {
    fn default() -> Self {
        let config = LubricationConfig::default();
        Self {
            machine: ContactStateMachine::from_config(&config),
            config,
            closed_film_reported: LogOnce::new(),
            oscillation_reported: LogOnce::new(),
            fallback_reported: LogOnce::new(),
        }
    }
}

impl LubricationLaw {
    pub fn new(config: LubricationConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            machine: ContactStateMachine::from_config(&config),
            config,
            ..Self::default()
        })
    }

    pub fn config(&self) -> &LubricationConfig {
        &self.config
    }

    pub fn state_machine(&self) -> &ContactStateMachine {
        &self.machine
    }

    /// Lets every warn-once message through again.
    pub fn rearm_warnings(&self) {
        self.closed_film_reported.rearm();
        self.oscillation_reported.rearm();
        self.fallback_reported.rearm();
    }

    fn torque_channels(&self) -> TorqueChannels {
        TorqueChannels {
            roll: self.config.activate_roll_lubrication,
            twist: self.config.activate_twist_lubrication,
        }
    }

    /// Evaluates one pair for one step.
    ///
    /// Pairs beyond the cutoff apply nothing and only report whether they
    /// stay real. Otherwise the gap is resolved, the state updated, and the
    /// pair's force and torques applied through `sink`.
    pub fn evaluate<S: ForceSink>(
        &self,
        interaction: &mut Interaction,
        geometry: ContactGeometry,
        dt: f64,
        sink: &mut S,
    ) -> PairOutcome {
        if let Admission::Skip { keep } = self.machine.admit(&geometry) {
            interaction.state.clear_forces();
            interaction.geometry = None;
            return PairOutcome::skipped(keep);
        }

        let constants = interaction.constants;
        let state = &mut interaction.state;
        let a = geometry.mean_radius();
        let un = geometry.approach;
        let threshold = constants.eps * a;
        let deflection = floored_deflection(state.ue, a);

        state.kn = normal_stiffness(constants.kno, deflection);

        let (u, gap) = if self.config.activate_normal_lubrication {
            let problem = GapProblem {
                un_prev: state.un_prev,
                un,
                u_prev: state.u,
                nu: constants.nun,
                k: state.kn,
                keps: state.kn,
                threshold,
                dt,
            };
            let solution = self.machine.resolve(state, &problem);
            state.store_normal(normal_forces(
                state.kn,
                un,
                solution.u,
                solution.contact,
                threshold,
                geometry.normal,
            ));
            self.report(&solution, state, interaction.body1, interaction.body2);
            (solution.u, Some(solution))
        } else {
            // The film is ignored: the gap is the separation and only the
            // separation history moves on.
            state.un_prev = un;
            state.contact = un < threshold;
            state.store_normal(NormalForces::default());
            (un, None)
        };

        let mut film = LubricationTorques::default();
        if constants.eta > 0.0 && !(u > 0.0) {
            if self.closed_film_reported.first() {
                error!(
                    "film gap u = {u:e} between {:?} and {:?} with a viscous fluid; \
                     shear and torques skipped for this step",
                    interaction.body1, interaction.body2
                );
            }
            state.clear_shear();
        } else {
            state.ks = shear_stiffness(constants.kso, deflection);
            state.cs = shear_viscosity(constants.eta, a, u);
            state.cn = if u > 0.0 { constants.nun / u } else { 0.0 };

            if self.config.activate_tangential_lubrication {
                let previous = co_rotate(
                    state.shear_force,
                    state.prev_normal,
                    geometry.normal,
                    geometry.twist_increment,
                );
                state.store_shear(shear_forces(&ShearInput {
                    previous,
                    increment: geometry.shear_increment,
                    stiffness: state.ks,
                    viscosity: state.cs,
                    dt,
                    contact: state.contact,
                    normal_contact: state.normal_contact_force.length(),
                    friction: constants.mum,
                }));
            } else {
                state.clear_shear();
            }

            film = match lubrication_torques(
                constants.eta,
                a,
                un,
                u,
                geometry.relative_angular_velocity,
                geometry.normal,
                self.torque_channels(),
            ) {
                Ok(torques) => torques,
                Err(err) => {
                    if self.closed_film_reported.first() {
                        error!("{err}; torques skipped for this step");
                    }
                    LubricationTorques::default()
                }
            };
        }
        state.prev_normal = geometry.normal;

        let (torque1, torque2) = body_torques(
            state.shear_force,
            geometry.normal,
            geometry.radius1,
            geometry.radius2,
            un,
            &film,
        );
        sink.apply_pair(
            interaction.body1,
            interaction.body2,
            state.total_force(),
            torque1,
            torque2,
        );
        interaction.geometry = Some(geometry);

        PairOutcome {
            keep: true,
            evaluated: true,
            gap,
        }
    }

    fn report(
        &self,
        solution: &GapSolution,
        state: &LubricationState,
        body1: BodyId,
        body2: BodyId,
    ) {
        if solution.fallbacks > 0 && self.fallback_reported.first() {
            warn!(
                "gap between {body1:?} and {body2:?} had no admissible root after {} bisections; \
                 finished first-order",
                solution.max_depth
            );
        }
        if state.oscillating && self.oscillation_reported.first() {
            warn!(
                "pair {body1:?}-{body2:?} switched regime on {} consecutive steps",
                state.regime_flips
            );
        }
        if self.config.debug && solution.regime_flipped {
            debug!(
                "pair {body1:?}-{body2:?} retried as {} (u = {:e})",
                if solution.contact { "contact" } else { "film" },
                solution.u
            );
        }
    }
}
