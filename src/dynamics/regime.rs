use serde::{Deserialize, Serialize};

use super::gap::{GapIntegrator, GapProblem, GapSolution};
use crate::{
    collision::geometry::ContactGeometry,
    config::{LubricationConfig, DEFAULT_OSCILLATION_WARN_THRESHOLD},
    core::interaction::LubricationState,
};

/// Lubricated film or asperity contact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum ContactRegime {
    #[default]
    NoContact,
    Contact,
}

impl ContactRegime {
    pub fn from_gap(u: f64, threshold: f64) -> Self {
        if u < threshold {
            Self::Contact
        } else {
            Self::NoContact
        }
    }

    pub fn is_contact(self) -> bool {
        self == Self::Contact
    }

    pub fn opposite(self) -> Self {
        match self {
            Self::Contact => Self::NoContact,
            Self::NoContact => Self::Contact,
        }
    }
}

/// Whether a pair gets evaluated this step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    Evaluate,
    /// Beyond the cutoff: no forces this step. `keep` tells whether the
    /// interaction stays real.
    Skip { keep: bool },
}

/// Decides the regime a pair is in and drives the gap integrator for it.
///
/// The regime guessed for a step is the one the previous gap satisfied; the
/// integrator's single retry settles the step. Repeated retries on
/// consecutive steps are counted and the pair is flagged as oscillating, but
/// nothing is done to damp it.
#[derive(Debug, Clone, PartialEq)]
pub struct ContactStateMachine {
    integrator: GapIntegrator,
    cutoff_factor: f64,
    oscillation_threshold: u32,
}

impl Default for ContactStateMachine {
    fn default() -> Self {
        Self::from_config(&LubricationConfig::default())
    }
}

impl ContactStateMachine {
    pub fn new(integrator: GapIntegrator, cutoff_factor: f64) -> Self {
        Self {
            integrator,
            cutoff_factor,
            oscillation_threshold: DEFAULT_OSCILLATION_WARN_THRESHOLD,
        }
    }

    pub fn from_config(config: &LubricationConfig) -> Self {
        Self {
            integrator: GapIntegrator::from_config(config),
            cutoff_factor: config.cutoff_factor,
            oscillation_threshold: config.oscillation_warn_threshold,
        }
    }

    pub fn integrator(&self) -> &GapIntegrator {
        &self.integrator
    }

    /// Guard run before any evaluation. A pair whose surfaces are farther apart
    /// than `cutoff_factor · a` is skipped; it stays real only while the
    /// surfaces still approach each other.
    pub fn admit(&self, geometry: &ContactGeometry) -> Admission {
        if geometry.approach > self.cutoff_factor * geometry.mean_radius() {
            Admission::Skip {
                keep: geometry.normal_velocity() < 0.0,
            }
        } else {
            Admission::Evaluate
        }
    }

    /// Resolves this step's gap and regime into `state`.
    ///
    /// Updates `u`, `ue`, `un_prev`, `prev_dot_u`, `contact`, and the
    /// oscillation bookkeeping. Forces are left to the force models.
    pub fn resolve(&self, state: &mut LubricationState, problem: &GapProblem) -> GapSolution {
        let assumed = ContactRegime::from_gap(state.u, problem.threshold);
        let solution =
            self.integrator
                .integrate(&mut state.prev_dot_u, problem, assumed.is_contact());

        if solution.regime_flipped {
            state.regime_flips = state.regime_flips.saturating_add(1);
        } else {
            state.regime_flips = 0;
        }
        state.oscillating = state.regime_flips >= self.oscillation_threshold;

        state.un_prev = problem.un;
        state.u = solution.u;
        state.ue = solution.u - problem.un;
        state.contact = solution.contact;
        solution
    }
}
