//! Core data model types for adaptest.
//!
//! These are the fundamental types the entire adaptest system uses to
//! represent calibrated items, response payloads, and session starting
//! conditions. Items are immutable once loaded; the engine never mutates
//! calibration data.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A test section. Sections are administered in the fixed order of
/// [`Domain::ALL`]; a session's section index only ever moves forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Domain {
    Vocabulary,
    Grammar,
    Listening,
    EnglishInUse,
}

impl Domain {
    /// The canonical section order of the test.
    pub const ALL: [Domain; 4] = [
        Domain::Vocabulary,
        Domain::Grammar,
        Domain::Listening,
        Domain::EnglishInUse,
    ];

    /// Whether items in this section may be replayed (audio sections only).
    pub fn replayable(self) -> bool {
        matches!(self, Domain::Listening)
    }
}

impl fmt::Display for Domain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Domain::Vocabulary => write!(f, "vocabulary"),
            Domain::Grammar => write!(f, "grammar"),
            Domain::Listening => write!(f, "listening"),
            Domain::EnglishInUse => write!(f, "english_in_use"),
        }
    }
}

impl FromStr for Domain {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "vocabulary" => Ok(Domain::Vocabulary),
            "grammar" => Ok(Domain::Grammar),
            "listening" => Ok(Domain::Listening),
            "english_in_use" | "english-in-use" => Ok(Domain::EnglishInUse),
            other => Err(format!("unknown domain: {other}")),
        }
    }
}

/// The declared starting level of a test-taker, which selects the normal
/// prior the MAP estimator starts from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StartLevel {
    Easy,
    Middle,
    Hard,
}

impl StartLevel {
    /// Prior mean and standard deviation for this level. All levels share
    /// the same prior variance; only the mean shifts.
    pub fn prior(self) -> (f64, f64) {
        match self {
            StartLevel::Easy => (-1.5, 1.0),
            StartLevel::Middle => (0.0, 1.0),
            StartLevel::Hard => (1.5, 1.0),
        }
    }
}

impl fmt::Display for StartLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StartLevel::Easy => write!(f, "easy"),
            StartLevel::Middle => write!(f, "middle"),
            StartLevel::Hard => write!(f, "hard"),
        }
    }
}

impl FromStr for StartLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "easy" => Ok(StartLevel::Easy),
            "middle" | "medium" => Ok(StartLevel::Middle),
            "hard" => Ok(StartLevel::Hard),
            other => Err(format!("start level must be easy/middle/hard, got: {other}")),
        }
    }
}

/// Item response model with its calibration parameters.
///
/// A closed enum so every dispatch over the model is an exhaustive match;
/// an unknown model tag can only appear at bank-parse time, where it is
/// rejected as `UnsupportedModel` before an `Item` ever exists.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum IrtModel {
    /// Two-parameter logistic: discrimination `a` (> 0) and difficulty `b`.
    #[serde(rename = "2pl")]
    TwoPl { a: f64, b: f64 },
    /// Three-parameter logistic: adds a pseudo-guessing floor `c` in [0, 1).
    #[serde(rename = "3pl")]
    ThreePl { a: f64, b: f64, c: f64 },
    /// Generalized partial credit: discrimination `a` and ordered step
    /// difficulties, one per response category minus one.
    Gpcm { a: f64, steps: Vec<f64> },
}

impl IrtModel {
    /// Discrimination parameter, common to all models.
    pub fn discrimination(&self) -> f64 {
        match self {
            IrtModel::TwoPl { a, .. } | IrtModel::ThreePl { a, .. } | IrtModel::Gpcm { a, .. } => {
                *a
            }
        }
    }

    /// Whether this model is scored right/wrong (as opposed to partial
    /// credit).
    pub fn is_dichotomous(&self) -> bool {
        matches!(self, IrtModel::TwoPl { .. } | IrtModel::ThreePl { .. })
    }
}

impl fmt::Display for IrtModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IrtModel::TwoPl { .. } => write!(f, "2pl"),
            IrtModel::ThreePl { .. } => write!(f, "3pl"),
            IrtModel::Gpcm { .. } => write!(f, "gpcm"),
        }
    }
}

/// A single calibrated test item from the bank.
///
/// The stem and options are presentation payload the engine passes through
/// untouched; only `domain`, `model`, `correct`, and `max_plays` influence
/// engine behavior.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Item {
    /// Unique identifier within the bank.
    pub id: String,
    /// Section this item belongs to.
    pub domain: Domain,
    /// Response model and calibration.
    pub model: IrtModel,
    /// Question text.
    pub stem: String,
    /// Answer options, in presentation order.
    pub options: Vec<String>,
    /// Indices into `options` that carry credit. Dichotomous items have a
    /// single entry; GPCM items have one entry per credit point.
    pub correct: Vec<u32>,
    /// Replay cap for audio items; 0 means unlimited within the engine.
    #[serde(default)]
    pub max_plays: u32,
}

impl Item {
    /// Maximum achievable score: 1.0 for dichotomous items, the key-set
    /// size for partial-credit items.
    pub fn max_score(&self) -> f64 {
        match self.model {
            IrtModel::TwoPl { .. } | IrtModel::ThreePl { .. } => 1.0,
            IrtModel::Gpcm { .. } => self.correct.len() as f64,
        }
    }
}

/// A submitted answer payload.
///
/// Dichotomous items require `Single`; partial-credit items require
/// `Multiple`. The scoring function rejects a mismatch as an invalid
/// response rather than coercing it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Answer {
    /// One selected option index.
    Single(u32),
    /// A collection of selected option indices (multi-select items).
    Multiple(Vec<u32>),
}
