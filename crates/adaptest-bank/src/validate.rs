//! Item-bank validation.
//!
//! The parser rejects structurally invalid items outright; this pass
//! surfaces advisory problems a bank author should fix before the bank is
//! put in front of test-takers.

use std::collections::HashSet;

use adaptest_core::model::{Domain, IrtModel};

use crate::parser::ItemBank;

/// A warning from bank validation.
#[derive(Debug, Clone)]
pub struct ValidationWarning {
    /// The item ID (if applicable).
    pub item_id: Option<String>,
    /// Warning message.
    pub message: String,
}

/// Validate a bank for common authoring issues.
pub fn validate_bank(bank: &ItemBank) -> Vec<ValidationWarning> {
    let mut warnings = Vec::new();

    // Duplicate item IDs
    let mut seen_ids = HashSet::new();
    for item in &bank.items {
        if !seen_ids.insert(&item.id) {
            warnings.push(ValidationWarning {
                item_id: Some(item.id.clone()),
                message: format!("duplicate item ID: {}", item.id),
            });
        }
    }

    for item in &bank.items {
        // Correct keys must name real options
        for &index in &item.correct {
            if index as usize >= item.options.len() {
                warnings.push(ValidationWarning {
                    item_id: Some(item.id.clone()),
                    message: format!(
                        "correct index {index} is out of range for {} options",
                        item.options.len()
                    ),
                });
            }
        }

        // GPCM step count should match the credit points available
        if let IrtModel::Gpcm { steps, .. } = &item.model {
            if steps.len() != item.correct.len() {
                warnings.push(ValidationWarning {
                    item_id: Some(item.id.clone()),
                    message: format!(
                        "gpcm has {} steps but {} correct keys",
                        steps.len(),
                        item.correct.len()
                    ),
                });
            }
        }

        // Replay caps only mean something in replayable sections
        if item.max_plays > 0 && !item.domain.replayable() {
            warnings.push(ValidationWarning {
                item_id: Some(item.id.clone()),
                message: format!("max_plays set on non-replayable domain {}", item.domain),
            });
        }

        // Extreme difficulty never gets selected in practice
        let b = match item.model {
            IrtModel::TwoPl { b, .. } | IrtModel::ThreePl { b, .. } => Some(b),
            IrtModel::Gpcm { .. } => None,
        };
        if let Some(b) = b {
            if !(-4.0..=4.0).contains(&b) {
                warnings.push(ValidationWarning {
                    item_id: Some(item.id.clone()),
                    message: format!("difficulty {b} is outside the usable range [-4, 4]"),
                });
            }
        }
    }

    // Every section needs items, or the selector will skip straight past it
    for &domain in &Domain::ALL {
        if !bank.items.iter().any(|item| item.domain == domain) {
            warnings.push(ValidationWarning {
                item_id: None,
                message: format!("no items for domain {domain}"),
            });
        }
    }

    warnings
}
