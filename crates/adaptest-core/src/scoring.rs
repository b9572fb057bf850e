//! Response scoring.
//!
//! Maps a raw answer payload plus an item definition to a numeric score.
//! The answer arity must match the item's model: dichotomous items take a
//! single option index, partial-credit items take a collection.

use std::collections::HashSet;

use crate::error::CatError;
use crate::model::{Answer, IrtModel, Item};

/// Score an answer against an item.
///
/// Dichotomous (2PL/3PL): 1.0 when the submitted index is in the item's
/// correct-key set, else 0.0. GPCM: the number of distinct submitted
/// indices that are correct — duplicates in the submission never
/// double-count, so the score is capped at the key-set size.
pub fn score_answer(item: &Item, answer: &Answer) -> Result<f64, CatError> {
    match (&item.model, answer) {
        (IrtModel::TwoPl { .. } | IrtModel::ThreePl { .. }, Answer::Single(index)) => {
            Ok(if item.correct.contains(index) { 1.0 } else { 0.0 })
        }
        (IrtModel::TwoPl { .. } | IrtModel::ThreePl { .. }, Answer::Multiple(_)) => {
            Err(CatError::InvalidResponse(format!(
                "item '{}' takes a single option index",
                item.id
            )))
        }
        (IrtModel::Gpcm { .. }, Answer::Multiple(indices)) => {
            let correct: HashSet<u32> = item.correct.iter().copied().collect();
            let mut counted = HashSet::new();
            let awarded = indices
                .iter()
                .filter(|index| correct.contains(index) && counted.insert(**index))
                .count();
            Ok(awarded as f64)
        }
        (IrtModel::Gpcm { .. }, Answer::Single(_)) => Err(CatError::InvalidResponse(format!(
            "item '{}' takes a collection of option indices",
            item.id
        ))),
    }
}
