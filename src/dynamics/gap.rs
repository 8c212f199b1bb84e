//! Implicit integration of the fluid-film gap of one pair.
//!
//! The film obeys `nu · du/dt = k · u · (un - u)`. A theta-method step turns it
//! into the monic quadratic `u² + b·u + c = 0`, whose positive root closest to
//! the previous gap is the new gap. When no such root exists the step is
//! bisected; segments are kept on an explicit work list so pathological inputs
//! cannot grow the call stack.

use crate::config::LubricationConfig;

/// Inputs of one gap resolution.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GapProblem {
    /// Surface separation at the start of the step.
    pub un_prev: f64,
    /// Surface separation at the end of the step.
    pub un: f64,
    /// Film gap at the start of the step.
    pub u_prev: f64,
    /// Normal viscous coefficient.
    pub nu: f64,
    /// Normal stiffness.
    pub k: f64,
    /// Extra stiffness of the asperity contact branch.
    pub keps: f64,
    /// Absolute roughness threshold below which asperities touch.
    pub threshold: f64,
    pub dt: f64,
}

/// Resolved gap and how hard the integrator had to work for it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GapSolution {
    pub u: f64,
    /// `u < threshold`.
    pub contact: bool,
    /// Segments resolved, including those of a discarded regime attempt.
    pub sub_steps: u32,
    /// Deepest bisection level reached.
    pub max_depth: u32,
    /// Segments that hit the depth cap and were integrated first-order.
    pub fallbacks: u32,
    /// The regime assumed on entry disagreed with the resolved gap and the
    /// step was re-run under the opposite assumption.
    pub regime_flipped: bool,
}

impl GapSolution {
    fn unchanged(u: f64, threshold: f64) -> Self {
        Self {
            u,
            contact: u < threshold,
            sub_steps: 0,
            max_depth: 0,
            fallbacks: 0,
            regime_flipped: false,
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct Segment {
    un_start: f64,
    un_end: f64,
    dt: f64,
    depth: u32,
}

/// Monic quadratic `u² + b·u + c`, plus the target separation it was built for.
#[derive(Debug, Clone, Copy)]
struct Quadratic {
    b: f64,
    c: f64,
    un: f64,
}

/// Picks the root of `u² + b·u + c = 0` that continues from `u_prev`.
///
/// Root 0 (`(-b + √Δ)/2`) wins when it is positive and closer to `u_prev`
/// than root 1, or when root 1 is negative; otherwise root 1 wins. Returns
/// `None` when the discriminant is negative or no root is positive.
pub fn select_root(b: f64, c: f64, u_prev: f64) -> Option<f64> {
    let delta = b * b - 4.0 * c;
    if !(delta >= 0.0) {
        return None;
    }
    let sqrt_delta = delta.sqrt();
    let r0 = 0.5 * (-b + sqrt_delta);
    let r1 = 0.5 * (-b - sqrt_delta);
    if r0 <= 0.0 && r1 <= 0.0 {
        return None;
    }
    if ((r0 - u_prev).abs() < (r1 - u_prev).abs() && r0 > 0.0) || r1 < 0.0 {
        Some(r0)
    } else {
        Some(r1)
    }
}

/// Theta-method integrator for the film gap.
#[derive(Debug, Clone, PartialEq)]
pub struct GapIntegrator {
    theta: f64,
    first_order: bool,
    max_sub_steps: u32,
    rate_blend_weight: f64,
}

impl Default for GapIntegrator {
    fn default() -> Self {
        Self::from_config(&LubricationConfig::default())
    }
}

impl GapIntegrator {
    pub fn new(theta: f64, max_sub_steps: u32, rate_blend_weight: f64) -> Self {
        Self {
            theta,
            first_order: theta == 1.0,
            max_sub_steps,
            rate_blend_weight,
        }
    }

    pub fn from_config(config: &LubricationConfig) -> Self {
        Self::new(
            config.theta,
            config.max_sub_steps,
            config.rate_blend_weight,
        )
    }

    pub fn theta(&self) -> f64 {
        self.theta
    }

    pub fn max_sub_steps(&self) -> u32 {
        self.max_sub_steps
    }

    /// Resolves the gap at the end of the step.
    ///
    /// `with_contact` is the regime assumed on entry. If the resolved gap
    /// lands in the other regime, `prev_dot_u` is restored and the step is
    /// re-run once under the opposite assumption; whatever that second attempt
    /// yields is final. `prev_dot_u` carries the smoothed rate estimate between
    /// calls and is updated after every resolved segment.
    pub fn integrate(
        &self,
        prev_dot_u: &mut f64,
        problem: &GapProblem,
        with_contact: bool,
    ) -> GapSolution {
        if !(problem.k > 0.0 && problem.dt > 0.0) {
            return GapSolution::unchanged(problem.u_prev.max(0.0), problem.threshold);
        }

        let initial_rate = *prev_dot_u;
        let first = self.resolve(prev_dot_u, problem, with_contact);
        if first.contact == with_contact {
            return first;
        }

        *prev_dot_u = initial_rate;
        let retry = self.resolve(prev_dot_u, problem, !with_contact);
        GapSolution {
            sub_steps: first.sub_steps + retry.sub_steps,
            max_depth: first.max_depth.max(retry.max_depth),
            fallbacks: first.fallbacks + retry.fallbacks,
            regime_flipped: true,
            ..retry
        }
    }

    /// Resolves the whole step under one regime assumption.
    fn resolve(&self, prev_dot_u: &mut f64, problem: &GapProblem, with_contact: bool) -> GapSolution {
        let mut u = problem.u_prev.max(0.0);
        let mut sub_steps = 0;
        let mut max_depth = 0;
        let mut fallbacks = 0;

        let mut work = vec![Segment {
            un_start: problem.un_prev,
            un_end: problem.un,
            dt: problem.dt,
            depth: 0,
        }];

        while let Some(segment) = work.pop() {
            let quadratic = self.quadratic(*prev_dot_u, u, segment, problem, with_contact, self.first_order);

            let root = match select_root(quadratic.b, quadratic.c, u) {
                Some(root) => root,
                None if segment.depth < self.max_sub_steps => {
                    let un_mid = segment.un_start + 0.5 * (segment.un_end - segment.un_start);
                    let half = 0.5 * segment.dt;
                    let depth = segment.depth + 1;
                    max_depth = max_depth.max(depth);
                    // Popped in reverse: first half, then second half from its end state.
                    work.push(Segment {
                        un_start: un_mid,
                        un_end: segment.un_end,
                        dt: half,
                        depth,
                    });
                    work.push(Segment {
                        un_start: segment.un_start,
                        un_end: un_mid,
                        dt: half,
                        depth,
                    });
                    continue;
                }
                None => {
                    fallbacks += 1;
                    let euler = self.quadratic(*prev_dot_u, u, segment, problem, with_contact, true);
                    // c = -w·u ≤ 0, so the discriminant is never negative here.
                    let delta = (euler.b * euler.b - 4.0 * euler.c).max(0.0);
                    (0.5 * (-euler.b + delta.sqrt())).max(0.0)
                }
            };

            u = root;
            sub_steps += 1;
            let weight = self.rate_blend_weight;
            *prev_dot_u = weight * u * (quadratic.un - u) + (1.0 - weight) * *prev_dot_u;
        }

        GapSolution {
            u,
            contact: u < problem.threshold,
            sub_steps,
            max_depth,
            fallbacks,
            regime_flipped: false,
        }
    }

    fn quadratic(
        &self,
        prev_dot_u: f64,
        u_prev: f64,
        segment: Segment,
        problem: &GapProblem,
        with_contact: bool,
        first_order: bool,
    ) -> Quadratic {
        let (k, un) = if with_contact {
            let k = problem.k + problem.keps;
            let un = (problem.k * segment.un_end + problem.keps * problem.threshold) / k;
            (k, un)
        } else {
            (problem.k, segment.un_end)
        };

        let w = problem.nu / (segment.dt * k);
        if first_order {
            Quadratic {
                b: w - un,
                c: -w * u_prev,
                un,
            }
        } else {
            let theta = self.theta;
            Quadratic {
                b: w / theta - un,
                c: (-prev_dot_u * (1.0 - theta) - w * u_prev) / theta,
                un,
            }
        }
    }
}
