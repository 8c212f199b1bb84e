//! Default constants and the runtime configuration of the lubrication law.

use serde::{Deserialize, Serialize};

use crate::error::{LubricationError, Result};

/// Default fluid viscosity handed to the pair builder [Pa·s].
pub const DEFAULT_VISCOSITY: f64 = 1.0;

/// Default roughness, as a fraction of the mean radius of a pair.
pub const DEFAULT_ROUGHNESS: f64 = 1e-3;

/// Default theta of the implicit gap scheme (1: backward Euler, 0.5: trapezoidal).
pub const DEFAULT_THETA: f64 = 0.55;

/// Default bound on the bisection depth of the gap integrator.
pub const DEFAULT_MAX_SUB_STEPS: u32 = 4;

/// Hard ceiling on `max_sub_steps`; beyond this the sub-step would underflow `dt`.
pub const MAX_SUB_STEP_CEILING: u32 = 40;

/// Default weight of the newest sample in the smoothed rate estimate.
pub const DEFAULT_RATE_BLEND_WEIGHT: f64 = 1.0;

/// Default interaction cutoff, as a multiple of the mean radius of a pair.
pub const DEFAULT_CUTOFF_FACTOR: f64 = 1.0;

/// Consecutive regime flips after which a pair is reported as oscillating.
pub const DEFAULT_OSCILLATION_WARN_THRESHOLD: u32 = 8;

/// Lower bound on the deflection used for the stiffness, as a fraction of `a`.
pub const MIN_DEFLECTION_FRACTION: f64 = 0.01;

/// Default timestep [s].
pub const DEFAULT_TIME_STEP: f64 = 1e-5;

/// Default cell size of the pair-detection grid [m].
pub const DEFAULT_BROADPHASE_CELL_SIZE: f64 = 4e-3;

/// How per-pair forces reach the per-body accumulators during a parallel pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum Accumulation {
    /// Each worker folds into its own buffer; buffers are summed after the pass.
    #[default]
    ThreadLocal,
    /// Workers write into one shared buffer guarded by a lock per body.
    PerBodyLock,
}

/// Runtime switches and numerical parameters of the law.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LubricationConfig {
    pub activate_normal_lubrication: bool,
    pub activate_tangential_lubrication: bool,
    pub activate_twist_lubrication: bool,
    pub activate_roll_lubrication: bool,
    /// Parameter of the theta-method; 0.55 is a good compromise between
    /// accuracy and damping of the trapezoidal oscillations.
    pub theta: f64,
    /// Max bisection depth; the smallest sub-step is `dt / 2^max_sub_steps`.
    pub max_sub_steps: u32,
    pub rate_blend_weight: f64,
    /// Pairs whose approach exceeds `cutoff_factor * a` are not evaluated.
    pub cutoff_factor: f64,
    pub oscillation_warn_threshold: u32,
    pub accumulation: Accumulation,
    /// Extra diagnostics through `log::debug!`/`log::warn!`.
    pub debug: bool,
}

impl Default for LubricationConfig {
    fn default() -> Self {
        Self {
            activate_normal_lubrication: true,
            activate_tangential_lubrication: true,
            activate_twist_lubrication: true,
            activate_roll_lubrication: true,
            theta: DEFAULT_THETA,
            max_sub_steps: DEFAULT_MAX_SUB_STEPS,
            rate_blend_weight: DEFAULT_RATE_BLEND_WEIGHT,
            cutoff_factor: DEFAULT_CUTOFF_FACTOR,
            oscillation_warn_threshold: DEFAULT_OSCILLATION_WARN_THRESHOLD,
            accumulation: Accumulation::default(),
            debug: false,
        }
    }
}

impl LubricationConfig {
    pub fn with_theta(mut self, theta: f64) -> Self {
        self.theta = theta;
        self
    }

    pub fn with_max_sub_steps(mut self, depth: u32) -> Self {
        self.max_sub_steps = depth;
        self
    }

    pub fn with_rate_blend_weight(mut self, weight: f64) -> Self {
        self.rate_blend_weight = weight;
        self
    }

    pub fn with_cutoff_factor(mut self, factor: f64) -> Self {
        self.cutoff_factor = factor;
        self
    }

    pub fn with_accumulation(mut self, accumulation: Accumulation) -> Self {
        self.accumulation = accumulation;
        self
    }

    pub fn with_debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    /// Turns every lubrication channel on or off at once.
    pub fn with_all_channels(mut self, enabled: bool) -> Self {
        self.activate_normal_lubrication = enabled;
        self.activate_tangential_lubrication = enabled;
        self.activate_twist_lubrication = enabled;
        self.activate_roll_lubrication = enabled;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if !(self.theta > 0.0 && self.theta <= 1.0) {
            return Err(LubricationError::invalid_config(format!(
                "theta must lie in (0, 1], got {}",
                self.theta
            )));
        }
        if !(self.rate_blend_weight > 0.0 && self.rate_blend_weight <= 1.0) {
            return Err(LubricationError::invalid_config(format!(
                "rate_blend_weight must lie in (0, 1], got {}",
                self.rate_blend_weight
            )));
        }
        if !(self.cutoff_factor > 0.0 && self.cutoff_factor.is_finite()) {
            return Err(LubricationError::invalid_config(format!(
                "cutoff_factor must be positive, got {}",
                self.cutoff_factor
            )));
        }
        if self.max_sub_steps > MAX_SUB_STEP_CEILING {
            return Err(LubricationError::invalid_config(format!(
                "max_sub_steps must not exceed {MAX_SUB_STEP_CEILING}, got {}",
                self.max_sub_steps
            )));
        }
        Ok(())
    }
}
