//! Final score transformation, CEFR banding, and report types with JSON
//! persistence.

use std::path::Path;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::model::{Domain, StartLevel};
use crate::session::Session;

/// CEFR-equivalent proficiency band, lowest to highest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum CefrLevel {
    A1,
    A2,
    B1,
    B2,
    C1,
    C2,
}

impl std::fmt::Display for CefrLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            CefrLevel::A1 => "A1",
            CefrLevel::A2 => "A2",
            CefrLevel::B1 => "B1",
            CefrLevel::B2 => "B2",
            CefrLevel::C1 => "C1",
            CefrLevel::C2 => "C2",
        };
        write!(f, "{name}")
    }
}

/// T-score transform of an ability estimate.
pub fn t_score(ability: f64) -> f64 {
    50.0 + 10.0 * ability
}

/// Map an ability estimate to its proficiency band. Cut-points sit at
/// uniform unit steps in θ, aligned with the start-level priors.
pub fn band_for_ability(ability: f64) -> CefrLevel {
    if ability < -1.5 {
        CefrLevel::A1
    } else if ability < -0.5 {
        CefrLevel::A2
    } else if ability < 0.5 {
        CefrLevel::B1
    } else if ability < 1.5 {
        CefrLevel::B2
    } else if ability < 2.5 {
        CefrLevel::C1
    } else {
        CefrLevel::C2
    }
}

/// Per-section result summary.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DomainBreakdown {
    pub domain: Domain,
    /// Mean of the section's normalized scores, in [0, 1].
    pub average_score: f64,
    pub cefr: CefrLevel,
}

/// The final report for a finished session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FinalReport {
    pub session_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub start_level: StartLevel,
    pub ability: f64,
    /// `None` when the session finished with no information-bearing
    /// responses.
    pub standard_error: Option<f64>,
    pub t_score: f64,
    pub cefr: CefrLevel,
    pub items_answered: usize,
    /// Section breakdowns in canonical section order, one per section
    /// that received at least one response.
    pub domains: Vec<DomainBreakdown>,
}

impl FinalReport {
    /// Build the report from a session's final state.
    pub fn from_session(session: &Session) -> Self {
        let domains = Domain::ALL
            .iter()
            .filter_map(|&domain| {
                let scores: Vec<f64> = session
                    .responses
                    .iter()
                    .filter(|r| r.domain == domain && r.max_score > 0.0)
                    .map(|r| r.score / r.max_score)
                    .collect();
                if scores.is_empty() {
                    return None;
                }
                let average_score = scores.iter().sum::<f64>() / scores.len() as f64;
                // Shift the session ability by the section's deviation
                // from a 50% average, then band it with the same function.
                let adjusted = session.ability + (average_score - 0.5);
                Some(DomainBreakdown {
                    domain,
                    average_score,
                    cefr: band_for_ability(adjusted),
                })
            })
            .collect();

        FinalReport {
            session_id: session.id,
            created_at: Utc::now(),
            start_level: session.start_level,
            ability: session.ability,
            standard_error: session
                .standard_error
                .is_finite()
                .then_some(session.standard_error),
            t_score: t_score(session.ability),
            cefr: band_for_ability(session.ability),
            items_answered: session.total_answered(),
            domains,
        }
    }

    /// Save the report as pretty-printed JSON.
    pub fn save_json(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self).context("failed to serialize report")?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, json)
            .with_context(|| format!("failed to write report to {}", path.display()))?;
        Ok(())
    }

    /// Load a report from a JSON file.
    pub fn load_json(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read report from {}", path.display()))?;
        let report: FinalReport =
            serde_json::from_str(&content).context("failed to parse report JSON")?;
        Ok(report)
    }
}
