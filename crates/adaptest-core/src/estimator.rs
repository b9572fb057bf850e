//! Maximum-a-posteriori ability estimation.
//!
//! Combines a normal prior with the response log-likelihood and solves for
//! the posterior mode by Newton-Raphson. The estimator only ever reads the
//! calibration snapshots a session captured at selection time, so
//! re-estimation is reproducible even if the live bank is reloaded between
//! calls.

use crate::irt::{
    category_mean_variance, category_probabilities, dichotomous_curve, fisher_information,
    standard_error_from_information, P_EPS,
};
use crate::model::IrtModel;

/// Newton-Raphson iteration cap. The loop is bounded; estimation always
/// terminates.
pub const MAX_NEWTON_STEPS: usize = 25;

/// Stop once the Newton step shrinks below this.
pub const STEP_TOLERANCE: f64 = 1e-4;

/// Curvature magnitudes below this are treated as converged rather than
/// divided by.
const CURVATURE_FLOOR: f64 = 1e-6;

/// A refined ability estimate with its standard error.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AbilityEstimate {
    pub ability: f64,
    /// `1/√(total information)` at the converged ability, or infinity when
    /// no response carried information.
    pub standard_error: f64,
}

/// First and second log-likelihood derivatives contributed by a single
/// scored response at θ.
fn response_derivatives(model: &IrtModel, score: f64, theta: f64) -> (f64, f64) {
    match model {
        IrtModel::TwoPl { a, b } => dichotomous_derivatives(theta, *a, *b, 0.0, score),
        IrtModel::ThreePl { a, b, c } => dichotomous_derivatives(theta, *a, *b, *c, score),
        IrtModel::Gpcm { a, steps } => {
            let probs = category_probabilities(theta, *a, steps);
            let (expected, variance) = category_mean_variance(&probs);
            (a * (score - expected), -(a * a) * variance)
        }
    }
}

/// Binomial-likelihood score and curvature for a dichotomous response,
/// built from the analytic probability curve:
/// `l' = (u - P)·P'/(P·Q)` and the full second derivative of
/// `u·ln P + (1-u)·ln Q`.
fn dichotomous_derivatives(theta: f64, a: f64, b: f64, c: f64, score: f64) -> (f64, f64) {
    let curve = dichotomous_curve(theta, a, b, c);
    let p = curve.p.clamp(P_EPS, 1.0 - P_EPS);
    let q = 1.0 - p;
    let pq = p * q;
    let residual = score - p;

    let d1 = residual * curve.dp / pq;
    let d2 = residual * curve.d2p / pq
        - curve.dp * curve.dp * (pq + residual * (1.0 - 2.0 * p)) / (pq * pq);
    (d1, d2)
}

/// Accumulated log-likelihood derivatives across a response history.
pub fn log_likelihood_derivatives(theta: f64, responses: &[(&IrtModel, f64)]) -> (f64, f64) {
    let mut first = 0.0;
    let mut second = 0.0;
    for (model, score) in responses {
        let (d1, d2) = response_derivatives(model, *score, theta);
        first += d1;
        second += d2;
    }
    (first, second)
}

/// MAP estimate of ability given a response history and a normal prior.
///
/// Iteration starts at `start_theta` (the session's current ability) and
/// runs at most [`MAX_NEWTON_STEPS`] Newton updates, stopping early on a
/// sub-tolerance step or near-zero curvature.
pub fn estimate_ability(
    responses: &[(&IrtModel, f64)],
    prior_mu: f64,
    prior_sigma: f64,
    start_theta: f64,
) -> AbilityEstimate {
    let prior_variance = prior_sigma * prior_sigma;
    let mut theta = start_theta;

    for step in 0..MAX_NEWTON_STEPS {
        let (ll1, ll2) = log_likelihood_derivatives(theta, responses);
        let numerator = ll1 + (prior_mu - theta) / prior_variance;
        let denominator = ll2 - 1.0 / prior_variance;

        if denominator.abs() < CURVATURE_FLOOR {
            tracing::debug!(step, theta, "curvature below floor, treating as converged");
            break;
        }

        let next = theta - numerator / denominator;
        let delta = (next - theta).abs();
        theta = next;
        if delta < STEP_TOLERANCE {
            break;
        }
    }

    let total_information: f64 = responses
        .iter()
        .map(|(model, _)| fisher_information(model, theta))
        .sum();

    AbilityEstimate {
        ability: theta,
        standard_error: standard_error_from_information(total_information),
    }
}
