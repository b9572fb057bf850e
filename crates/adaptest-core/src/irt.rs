//! IRT probability models and the Fisher information function.
//!
//! Pure functions over [`IrtModel`] calibration and an ability value θ.
//! Every formula here is overflow-safe: the logistic branches on the sign
//! of its exponent, and the GPCM normalization subtracts the running
//! maximum before exponentiating.

use crate::model::IrtModel;

/// Floor used to keep probabilities away from 0 and 1 before dividing.
pub const P_EPS: f64 = 1e-6;

/// Success probability under the two-parameter logistic model.
pub fn two_pl(theta: f64, a: f64, b: f64) -> f64 {
    let z = a * (theta - b);
    if z >= 0.0 {
        1.0 / (1.0 + (-z).exp())
    } else {
        let e = z.exp();
        e / (1.0 + e)
    }
}

/// Success probability under the three-parameter logistic model: a 2PL
/// curve lifted by the pseudo-guessing floor `c`.
pub fn three_pl(theta: f64, a: f64, b: f64, c: f64) -> f64 {
    c + (1.0 - c) * two_pl(theta, a, b)
}

/// GPCM category probabilities for an item with the given discrimination
/// and step difficulties. Returns `steps.len() + 1` probabilities, one per
/// score category, summing to 1.
pub fn category_probabilities(theta: f64, a: f64, steps: &[f64]) -> Vec<f64> {
    let mut eta = Vec::with_capacity(steps.len() + 1);
    eta.push(0.0);
    let mut cumulative = 0.0;
    for step in steps {
        cumulative += a * (theta - step);
        eta.push(cumulative);
    }

    let max = eta.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let exps: Vec<f64> = eta.iter().map(|e| (e - max).exp()).collect();
    let denom: f64 = exps.iter().sum();
    if !denom.is_finite() || denom <= 0.0 {
        return vec![1.0 / exps.len() as f64; exps.len()];
    }
    exps.iter().map(|e| e / denom).collect()
}

/// Mean and variance of the score category under a GPCM category
/// distribution.
pub fn category_mean_variance(probs: &[f64]) -> (f64, f64) {
    let mean = probs
        .iter()
        .enumerate()
        .map(|(k, p)| k as f64 * p)
        .sum::<f64>();
    let variance = probs
        .iter()
        .enumerate()
        .map(|(k, p)| (k as f64 - mean).powi(2) * p)
        .sum::<f64>();
    (mean, variance)
}

/// Probability curve of a dichotomous item at θ: the value `p` together
/// with its first and second derivatives with respect to θ. 2PL is the
/// `c = 0` case.
#[derive(Debug, Clone, Copy)]
pub struct DichotomousCurve {
    pub p: f64,
    pub dp: f64,
    pub d2p: f64,
}

/// Evaluate the dichotomous probability curve `P = c + (1-c)·S(θ)` and its
/// θ-derivatives analytically.
pub fn dichotomous_curve(theta: f64, a: f64, b: f64, c: f64) -> DichotomousCurve {
    let s = two_pl(theta, a, b);
    let sq = s * (1.0 - s);
    DichotomousCurve {
        p: c + (1.0 - c) * s,
        dp: (1.0 - c) * a * sq,
        d2p: (1.0 - c) * a * a * sq * (1.0 - 2.0 * s),
    }
}

/// Fisher information of one item at ability θ. Non-negative for all
/// finite θ.
///
/// The GPCM branch uses `a² · Var(category)` — the variance of the score
/// category under the model's distribution. This is an approximation of
/// the exact polytomous information, kept deliberately: item selection
/// ranks candidates by this exact formula.
pub fn fisher_information(model: &IrtModel, theta: f64) -> f64 {
    match model {
        IrtModel::TwoPl { a, b } => {
            let p = two_pl(theta, *a, *b);
            a * a * p * (1.0 - p)
        }
        IrtModel::ThreePl { a, b, c } => {
            let p = three_pl(theta, *a, *b, *c).clamp(P_EPS, 1.0 - P_EPS);
            let one_minus_c = (1.0 - c).max(P_EPS);
            let ratio = (p - c) / one_minus_c;
            a * a * ratio * ratio * (1.0 - p) / p
        }
        IrtModel::Gpcm { a, steps } => {
            let probs = category_probabilities(theta, *a, steps);
            let (_, variance) = category_mean_variance(&probs);
            a * a * variance
        }
    }
}

/// Standard error implied by a total amount of Fisher information:
/// `1/√info`, or infinity when no information has been accumulated.
pub fn standard_error_from_information(total_information: f64) -> f64 {
    if total_information > 0.0 {
        1.0 / total_information.sqrt()
    } else {
        f64::INFINITY
    }
}
