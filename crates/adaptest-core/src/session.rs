//! Session state for one test-taker's attempt.
//!
//! A [`Session`] is created at test start and mutated only through the
//! engine's estimation/selection/scoring calls until it finishes. The
//! surrounding orchestrator owns storage and the single-writer-per-session
//! discipline; the core never deletes a session.

use std::collections::{HashMap, HashSet};

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::model::{Answer, Domain, Item, StartLevel};

/// One entry in the append-only response log. Carries enough to
/// reconstruct the likelihood (via the session's item snapshots) and to
/// build per-section report breakdowns.
#[derive(Debug, Clone, PartialEq)]
pub struct ResponseRecord {
    pub item_id: String,
    pub domain: Domain,
    /// Awarded score: 0/1 for dichotomous items, a partial-credit count
    /// for GPCM items.
    pub score: f64,
    /// Maximum achievable score for the item, for normalization.
    pub max_score: f64,
    pub ability_before: f64,
    pub ability_after: f64,
    pub standard_error_after: f64,
    /// The raw submitted payload, kept for audit.
    pub answer: Answer,
}

/// In-progress or completed test attempt.
///
/// Invariants maintained by the engine:
/// - `ability` is always finite; `standard_error` is infinite until at
///   least one information-bearing response exists.
/// - `seen_item_ids` only grows; a seen item is never re-selected.
/// - `current_section` never decreases.
/// - `pending_item_id`, once set, is returned unchanged by "next item"
///   calls until a response for it is recorded.
#[derive(Debug, Clone)]
pub struct Session {
    pub id: Uuid,
    pub started_at: DateTime<Utc>,
    pub start_level: StartLevel,
    pub ability: f64,
    pub standard_error: f64,
    pub prior_mu: f64,
    pub prior_sigma: f64,
    /// Index into [`Domain::ALL`].
    pub current_section: usize,
    pub finished: bool,
    /// The session pauses at every section boundary (including before the
    /// first item); `resume_section` clears this before items are served.
    pub awaiting_resume: bool,
    pub seen_item_ids: HashSet<String>,
    pub pending_item_id: Option<String>,
    pub responses: Vec<ResponseRecord>,
    pub section_counts: HashMap<Domain, u32>,
    pub play_counts: HashMap<String, u32>,
    /// Calibration snapshots of every item administered to this session,
    /// captured at selection time. Estimation reads these, never the live
    /// bank, so re-scoring is reproducible across bank reloads.
    administered: HashMap<String, Item>,
}

impl Session {
    /// Create a session with ability and prior initialized from the
    /// declared starting level.
    pub fn new(start_level: StartLevel) -> Self {
        let (prior_mu, prior_sigma) = start_level.prior();
        Session {
            id: Uuid::new_v4(),
            started_at: Utc::now(),
            start_level,
            ability: prior_mu,
            standard_error: f64::INFINITY,
            prior_mu,
            prior_sigma,
            current_section: 0,
            finished: false,
            awaiting_resume: true,
            seen_item_ids: HashSet::new(),
            pending_item_id: None,
            responses: Vec::new(),
            section_counts: HashMap::new(),
            play_counts: HashMap::new(),
            administered: HashMap::new(),
        }
    }

    /// The section currently being administered.
    pub fn current_domain(&self) -> Domain {
        Domain::ALL[self.current_section]
    }

    /// Move to the next section, pausing at the boundary, or finish the
    /// session when the last section is done. The section index never
    /// decreases.
    pub fn advance_section(&mut self) {
        self.pending_item_id = None;
        if self.current_section + 1 < Domain::ALL.len() {
            self.current_section += 1;
            self.awaiting_resume = true;
        } else {
            self.finished = true;
            self.awaiting_resume = false;
        }
    }

    /// Force the session into its terminal state.
    pub fn mark_finished(&mut self) {
        self.finished = true;
        self.pending_item_id = None;
        self.awaiting_resume = false;
    }

    pub fn total_answered(&self) -> usize {
        self.responses.len()
    }

    /// Answered-item count for the section currently in progress.
    pub fn answered_in_current_section(&self) -> u32 {
        self.section_counts
            .get(&self.current_domain())
            .copied()
            .unwrap_or(0)
    }

    /// Capture an item's calibration for this session. Called by the
    /// selector the moment an item is chosen.
    pub fn snapshot_item(&mut self, item: &Item) {
        self.administered.insert(item.id.clone(), item.clone());
    }

    /// Look up an item this session was administered.
    pub fn administered_item(&self, item_id: &str) -> Option<&Item> {
        self.administered.get(item_id)
    }

    /// Append a response to the log and update section pacing counts.
    pub fn log_response(&mut self, record: ResponseRecord) {
        *self.section_counts.entry(record.domain).or_insert(0) += 1;
        self.responses.push(record);
    }

    pub fn plays(&self, item_id: &str) -> u32 {
        self.play_counts.get(item_id).copied().unwrap_or(0)
    }

    /// Increment and return the exposure count for an item.
    pub fn increment_plays(&mut self, item_id: &str) -> u32 {
        let count = self.play_counts.entry(item_id.to_string()).or_insert(0);
        *count += 1;
        *count
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::IrtModel;

    fn item(id: &str, domain: Domain) -> Item {
        Item {
            id: id.into(),
            domain,
            model: IrtModel::TwoPl { a: 1.0, b: 0.0 },
            stem: String::new(),
            options: vec!["a".into(), "b".into()],
            correct: vec![0],
            max_plays: 0,
        }
    }

    #[test]
    fn new_session_starts_from_level_prior() {
        let session = Session::new(StartLevel::Easy);
        assert_eq!(session.ability, -1.5);
        assert_eq!(session.prior_mu, -1.5);
        assert!(session.standard_error.is_infinite());
        assert_eq!(session.current_domain(), Domain::Vocabulary);
        assert!(session.awaiting_resume);
        assert!(!session.finished);
    }

    #[test]
    fn advance_walks_sections_then_finishes() {
        let mut session = Session::new(StartLevel::Middle);
        session.awaiting_resume = false;

        session.advance_section();
        assert_eq!(session.current_domain(), Domain::Grammar);
        assert!(session.awaiting_resume);

        session.advance_section();
        session.advance_section();
        assert_eq!(session.current_domain(), Domain::EnglishInUse);
        assert!(!session.finished);

        session.advance_section();
        assert!(session.finished);
        assert!(!session.awaiting_resume);
        // Index stays on the last section; it never decreases or runs past
        // the end.
        assert_eq!(session.current_domain(), Domain::EnglishInUse);
    }

    #[test]
    fn advance_clears_pending() {
        let mut session = Session::new(StartLevel::Middle);
        session.pending_item_id = Some("vocab_001".into());
        session.advance_section();
        assert_eq!(session.pending_item_id, None);
    }

    #[test]
    fn snapshots_survive_independent_of_the_caller_items() {
        let mut session = Session::new(StartLevel::Middle);
        let it = item("vocab_001", Domain::Vocabulary);
        session.snapshot_item(&it);
        drop(it);
        assert!(session.administered_item("vocab_001").is_some());
        assert!(session.administered_item("vocab_999").is_none());
    }

    #[test]
    fn log_response_updates_section_counts() {
        let mut session = Session::new(StartLevel::Middle);
        session.log_response(ResponseRecord {
            item_id: "vocab_001".into(),
            domain: Domain::Vocabulary,
            score: 1.0,
            max_score: 1.0,
            ability_before: 0.0,
            ability_after: 0.4,
            standard_error_after: 1.8,
            answer: Answer::Single(0),
        });
        assert_eq!(session.total_answered(), 1);
        assert_eq!(session.answered_in_current_section(), 1);
    }

    #[test]
    fn play_counts_accumulate_per_item() {
        let mut session = Session::new(StartLevel::Middle);
        assert_eq!(session.plays("listening_001"), 0);
        assert_eq!(session.increment_plays("listening_001"), 1);
        assert_eq!(session.increment_plays("listening_001"), 2);
        assert_eq!(session.increment_plays("listening_002"), 1);
        assert_eq!(session.plays("listening_001"), 2);
    }
}
