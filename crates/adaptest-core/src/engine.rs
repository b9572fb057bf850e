//! Central CAT engine orchestrator.
//!
//! Composes selection, scoring, estimation, and the session state machine
//! behind a small façade. Every operation is synchronous, CPU-bound, and
//! all-or-nothing: on error the session is left untouched.

use crate::error::CatError;
use crate::estimator::estimate_ability;
use crate::model::{Answer, Domain, IrtModel, Item, StartLevel};
use crate::report::FinalReport;
use crate::scoring::score_answer;
use crate::selector::{select_next_item, NextItem};
use crate::session::{ResponseRecord, Session};

/// Pacing and termination configuration.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Hard cap on answered items per session.
    pub max_items: u32,
    /// The session finishes once the standard error drops to or below
    /// this.
    pub se_threshold: f64,
    /// A section ends after this many answered items even if unseen
    /// candidates remain.
    pub section_target: u32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_items: 40,
            se_threshold: 0.32,
            section_target: 10,
        }
    }
}

/// Notification hooks for the persistence collaborator.
///
/// The engine reports lifecycle events and never depends on the observer
/// for correctness; a failed or absent sink cannot block a session.
pub trait SessionObserver: Send + Sync {
    fn on_session_start(&self, session: &Session);
    fn on_response(&self, session: &Session, record: &ResponseRecord);
    fn on_session_finish(&self, session: &Session);
}

/// No-op observer.
pub struct NoopObserver;

impl SessionObserver for NoopObserver {
    fn on_session_start(&self, _: &Session) {}
    fn on_response(&self, _: &Session, _: &ResponseRecord) {}
    fn on_session_finish(&self, _: &Session) {}
}

/// Result of scoring one answer.
#[derive(Debug, Clone, PartialEq)]
pub struct AnswerOutcome {
    pub score: f64,
    /// Whether the answer earned full credit.
    pub correct: bool,
    pub ability: f64,
    pub standard_error: f64,
    /// The section the next item will come from, or `None` when the
    /// session finished with this answer.
    pub next_domain: Option<Domain>,
}

/// The central adaptive-testing engine.
pub struct CatEngine {
    config: EngineConfig,
}

impl CatEngine {
    pub fn new(config: EngineConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Create a session with its prior selected by the declared starting
    /// level.
    pub fn create_session(
        &self,
        start_level: StartLevel,
        observer: &dyn SessionObserver,
    ) -> Session {
        let session = Session::new(start_level);
        tracing::info!(session_id = %session.id, %start_level, "session created");
        observer.on_session_start(&session);
        session
    }

    /// Pick the next item to administer, pause at a section boundary, or
    /// signal exhaustion. Idempotent while an item is pending.
    pub fn next_item(&self, session: &mut Session, pool: &[Item]) -> Result<NextItem, CatError> {
        select_next_item(session, pool)
    }

    /// Continue past a section boundary. Returns the section now in
    /// progress.
    pub fn resume_section(&self, session: &mut Session) -> Result<Domain, CatError> {
        if session.finished {
            return Err(CatError::TestAlreadyFinished);
        }
        session.awaiting_resume = false;
        Ok(session.current_domain())
    }

    /// Score a raw answer for the pending item, refine the ability
    /// estimate over the full response history, update pacing state, and
    /// re-evaluate termination.
    pub fn submit_answer(
        &self,
        session: &mut Session,
        item_id: &str,
        answer: Answer,
        observer: &dyn SessionObserver,
    ) -> Result<AnswerOutcome, CatError> {
        if session.finished {
            return Err(CatError::TestAlreadyFinished);
        }
        if session.pending_item_id.as_deref() != Some(item_id) {
            return Err(CatError::InvalidResponse(format!(
                "item '{item_id}' is not the pending item"
            )));
        }
        let item = session
            .administered_item(item_id)
            .cloned()
            .ok_or_else(|| {
                CatError::InvalidResponse(format!("item '{item_id}' has no snapshot"))
            })?;

        let score = score_answer(&item, &answer)?;

        // Likelihood over the session's own administered snapshots plus
        // the in-flight response.
        let mut history: Vec<(&IrtModel, f64)> = Vec::with_capacity(session.responses.len() + 1);
        for response in &session.responses {
            let snapshot = session.administered_item(&response.item_id).ok_or_else(|| {
                CatError::InvalidResponse(format!(
                    "response for '{}' has no item snapshot",
                    response.item_id
                ))
            })?;
            history.push((&snapshot.model, response.score));
        }
        history.push((&item.model, score));

        let estimate = estimate_ability(
            &history,
            session.prior_mu,
            session.prior_sigma,
            session.ability,
        );
        drop(history);

        let ability_before = session.ability;
        session.ability = estimate.ability;
        session.standard_error = estimate.standard_error;
        session.pending_item_id = None;

        let record = ResponseRecord {
            item_id: item.id.clone(),
            domain: item.domain,
            score,
            max_score: item.max_score(),
            ability_before,
            ability_after: estimate.ability,
            standard_error_after: estimate.standard_error,
            answer,
        };
        session.log_response(record.clone());

        // Termination precedence: the item cap, then measurement
        // precision, then the per-section quota. Candidate exhaustion is
        // checked separately during selection.
        if session.total_answered() as u32 >= self.config.max_items {
            tracing::info!(session_id = %session.id, "item cap reached, session finished");
            session.mark_finished();
        } else if session.standard_error <= self.config.se_threshold {
            tracing::info!(
                session_id = %session.id,
                se = session.standard_error,
                "precision threshold reached, session finished"
            );
            session.mark_finished();
        } else if session.answered_in_current_section() >= self.config.section_target {
            session.advance_section();
        }

        observer.on_response(session, &record);
        if session.finished {
            observer.on_session_finish(session);
        }

        Ok(AnswerOutcome {
            score,
            correct: score >= item.max_score(),
            ability: session.ability,
            standard_error: session.standard_error,
            next_domain: (!session.finished).then(|| session.current_domain()),
        })
    }

    /// Record one exposure of a replayable item.
    pub fn record_play(&self, session: &mut Session, item_id: &str) -> Result<u32, CatError> {
        if session.finished {
            return Err(CatError::TestAlreadyFinished);
        }
        let item = session.administered_item(item_id).ok_or_else(|| {
            CatError::InvalidResponse(format!("item '{item_id}' was not administered"))
        })?;
        if !item.domain.replayable() {
            return Err(CatError::ReplayNotSupported(item_id.to_string()));
        }
        let max_plays = item.max_plays;
        if max_plays > 0 && session.plays(item_id) >= max_plays {
            return Err(CatError::PlayLimitExceeded {
                item_id: item_id.to_string(),
                max_plays,
            });
        }
        Ok(session.increment_plays(item_id))
    }

    /// Force termination and return the final report. Idempotent on an
    /// already-finished session.
    pub fn finish(&self, session: &mut Session, observer: &dyn SessionObserver) -> FinalReport {
        if !session.finished {
            session.mark_finished();
            tracing::info!(session_id = %session.id, "session finished on request");
            observer.on_session_finish(session);
        }
        FinalReport::from_session(session)
    }

    /// The final report for a finished session.
    pub fn report(&self, session: &Session) -> Result<FinalReport, CatError> {
        if !session.finished {
            return Err(CatError::ReportNotReady);
        }
        Ok(FinalReport::from_session(session))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Observer that counts notifications.
    #[derive(Default)]
    struct CountingObserver {
        starts: AtomicUsize,
        responses: AtomicUsize,
        finishes: AtomicUsize,
    }

    impl SessionObserver for CountingObserver {
        fn on_session_start(&self, _: &Session) {
            self.starts.fetch_add(1, Ordering::Relaxed);
        }
        fn on_response(&self, _: &Session, _: &ResponseRecord) {
            self.responses.fetch_add(1, Ordering::Relaxed);
        }
        fn on_session_finish(&self, _: &Session) {
            self.finishes.fetch_add(1, Ordering::Relaxed);
        }
    }

    fn item(id: &str, domain: Domain, b: f64) -> Item {
        Item {
            id: id.into(),
            domain,
            model: IrtModel::TwoPl { a: 1.2, b },
            stem: String::new(),
            options: vec!["a".into(), "b".into(), "c".into(), "d".into()],
            correct: vec![1],
            max_plays: 0,
        }
    }

    /// A pool with several dichotomous items in each section.
    fn pool() -> Vec<Item> {
        let mut items = Vec::new();
        for &domain in &Domain::ALL {
            for i in 0..6 {
                let b = i as f64 * 0.5 - 1.5;
                let mut it = item(&format!("{domain}_{i}"), domain, b);
                if domain == Domain::Listening {
                    it.max_plays = 2;
                }
                items.push(it);
            }
        }
        items
    }

    /// Serve the next actual item, resuming through section breaks.
    fn fetch_item(engine: &CatEngine, session: &mut Session, pool: &[Item]) -> Option<Item> {
        loop {
            match engine.next_item(session, pool).unwrap() {
                NextItem::Item(item) => return Some(item),
                NextItem::SectionBreak(_) => {
                    engine.resume_section(session).unwrap();
                }
                NextItem::Exhausted => return None,
            }
        }
    }

    #[test]
    fn easy_start_all_correct_drives_ability_upward() {
        let engine = CatEngine::new(EngineConfig {
            section_target: 5,
            ..Default::default()
        });
        let observer = NoopObserver;
        let mut session = engine.create_session(StartLevel::Easy, &observer);
        let pool = pool();

        let mut previous = session.ability;
        while session.current_domain() == Domain::Vocabulary && !session.finished {
            let Some(item) = fetch_item(&engine, &mut session, &pool) else {
                break;
            };
            if item.domain != Domain::Vocabulary {
                break;
            }
            let outcome = engine
                .submit_answer(&mut session, &item.id, Answer::Single(1), &observer)
                .unwrap();
            assert!(outcome.correct);
            assert!(
                outcome.ability >= previous - 1e-9,
                "ability regressed: {previous} -> {}",
                outcome.ability
            );
            previous = outcome.ability;
        }
        assert!(session.ability > -1.5);
    }

    #[test]
    fn item_cap_finishes_the_session_exactly_once() {
        let engine = CatEngine::new(EngineConfig {
            max_items: 4,
            se_threshold: 0.0,
            section_target: 100,
        });
        let observer = CountingObserver::default();
        let mut session = engine.create_session(StartLevel::Middle, &observer);
        let pool = pool();

        let mut answered = 0;
        while let Some(item) = fetch_item(&engine, &mut session, &pool) {
            engine
                .submit_answer(&mut session, &item.id, Answer::Single(0), &observer)
                .unwrap();
            answered += 1;
            if session.finished {
                break;
            }
        }
        assert_eq!(answered, 4);
        assert!(session.finished);
        assert_eq!(observer.finishes.load(Ordering::Relaxed), 1);

        let err = engine.next_item(&mut session, &pool).unwrap_err();
        assert!(matches!(err, CatError::TestAlreadyFinished));
        let err = engine
            .submit_answer(&mut session, "vocabulary_0", Answer::Single(0), &observer)
            .unwrap_err();
        assert!(matches!(err, CatError::TestAlreadyFinished));
    }

    #[test]
    fn precision_threshold_finishes_early() {
        // A generous threshold ends the test after a couple of responses,
        // well before the item cap.
        let engine = CatEngine::new(EngineConfig {
            max_items: 40,
            se_threshold: 0.9,
            section_target: 100,
        });
        let observer = NoopObserver;
        let mut session = engine.create_session(StartLevel::Middle, &observer);
        let pool = pool();

        let mut answered = 0;
        while let Some(item) = fetch_item(&engine, &mut session, &pool) {
            engine
                .submit_answer(&mut session, &item.id, Answer::Single(1), &observer)
                .unwrap();
            answered += 1;
            if session.finished {
                break;
            }
        }
        assert!(session.finished);
        assert!(answered < 40);
        assert!(session.standard_error <= 0.9);
    }

    #[test]
    fn section_quota_advances_with_a_break() {
        let engine = CatEngine::new(EngineConfig {
            max_items: 40,
            se_threshold: 0.0,
            section_target: 2,
        });
        let observer = NoopObserver;
        let mut session = engine.create_session(StartLevel::Middle, &observer);
        let pool = pool();

        for _ in 0..2 {
            let item = fetch_item(&engine, &mut session, &pool).unwrap();
            assert_eq!(item.domain, Domain::Vocabulary);
            let outcome = engine
                .submit_answer(&mut session, &item.id, Answer::Single(1), &observer)
                .unwrap();
            if session.current_domain() == Domain::Grammar {
                assert_eq!(outcome.next_domain, Some(Domain::Grammar));
            }
        }
        // Quota fired on the second answer; the session pauses before
        // grammar even though unseen vocabulary items remain.
        assert_eq!(session.current_domain(), Domain::Grammar);
        match engine.next_item(&mut session, &pool).unwrap() {
            NextItem::SectionBreak(domain) => assert_eq!(domain, Domain::Grammar),
            other => panic!("expected a section break, got {other:?}"),
        }
    }

    #[test]
    fn submit_for_non_pending_item_leaves_state_unchanged() {
        let engine = CatEngine::new(EngineConfig::default());
        let observer = NoopObserver;
        let mut session = engine.create_session(StartLevel::Middle, &observer);
        let pool = pool();

        let item = fetch_item(&engine, &mut session, &pool).unwrap();
        let before = session.clone();

        let err = engine
            .submit_answer(&mut session, "grammar_0", Answer::Single(1), &observer)
            .unwrap_err();
        assert!(matches!(err, CatError::InvalidResponse(_)));
        assert_eq!(session.responses.len(), before.responses.len());
        assert_eq!(session.pending_item_id.as_deref(), Some(item.id.as_str()));
        assert_eq!(session.ability, before.ability);
    }

    #[test]
    fn mismatched_answer_shape_is_rejected_without_mutation() {
        let engine = CatEngine::new(EngineConfig::default());
        let observer = NoopObserver;
        let mut session = engine.create_session(StartLevel::Middle, &observer);
        let pool = pool();

        let item = fetch_item(&engine, &mut session, &pool).unwrap();
        let err = engine
            .submit_answer(&mut session, &item.id, Answer::Multiple(vec![1]), &observer)
            .unwrap_err();
        assert!(matches!(err, CatError::InvalidResponse(_)));
        assert!(session.responses.is_empty());
        assert_eq!(session.pending_item_id.as_deref(), Some(item.id.as_str()));
    }

    #[test]
    fn replay_cap_allows_exactly_max_plays() {
        let engine = CatEngine::new(EngineConfig {
            section_target: 1,
            ..Default::default()
        });
        let observer = NoopObserver;
        let mut session = engine.create_session(StartLevel::Middle, &observer);
        let pool = pool();

        // Walk to the listening section.
        let listening_item = loop {
            let item = fetch_item(&engine, &mut session, &pool).unwrap();
            if item.domain == Domain::Listening {
                break item;
            }
            engine
                .submit_answer(&mut session, &item.id, Answer::Single(1), &observer)
                .unwrap();
        };

        assert_eq!(engine.record_play(&mut session, &listening_item.id).unwrap(), 1);
        assert_eq!(engine.record_play(&mut session, &listening_item.id).unwrap(), 2);
        let err = engine
            .record_play(&mut session, &listening_item.id)
            .unwrap_err();
        assert!(matches!(
            err,
            CatError::PlayLimitExceeded { max_plays: 2, .. }
        ));
    }

    #[test]
    fn replays_rejected_outside_listening() {
        let engine = CatEngine::new(EngineConfig::default());
        let observer = NoopObserver;
        let mut session = engine.create_session(StartLevel::Middle, &observer);
        let pool = pool();

        let item = fetch_item(&engine, &mut session, &pool).unwrap();
        assert_eq!(item.domain, Domain::Vocabulary);
        let err = engine.record_play(&mut session, &item.id).unwrap_err();
        assert!(matches!(err, CatError::ReplayNotSupported(_)));

        let err = engine.record_play(&mut session, "never_seen").unwrap_err();
        assert!(matches!(err, CatError::InvalidResponse(_)));
    }

    #[test]
    fn finish_forces_termination_and_report_becomes_available() {
        let engine = CatEngine::new(EngineConfig::default());
        let observer = CountingObserver::default();
        let mut session = engine.create_session(StartLevel::Middle, &observer);
        let pool = pool();

        assert!(matches!(
            engine.report(&session),
            Err(CatError::ReportNotReady)
        ));

        let item = fetch_item(&engine, &mut session, &pool).unwrap();
        engine
            .submit_answer(&mut session, &item.id, Answer::Single(1), &observer)
            .unwrap();

        let report = engine.finish(&mut session, &observer);
        assert!(session.finished);
        assert_eq!(report.items_answered, 1);
        assert_eq!(observer.finishes.load(Ordering::Relaxed), 1);

        // Idempotent: a second finish does not re-notify.
        engine.finish(&mut session, &observer);
        assert_eq!(observer.finishes.load(Ordering::Relaxed), 1);

        let report = engine.report(&session).unwrap();
        assert_eq!(report.session_id, session.id);
    }

    #[test]
    fn observer_sees_the_whole_lifecycle() {
        let engine = CatEngine::new(EngineConfig {
            max_items: 2,
            se_threshold: 0.0,
            section_target: 100,
        });
        let observer = CountingObserver::default();
        let mut session = engine.create_session(StartLevel::Middle, &observer);
        let pool = pool();

        while let Some(item) = fetch_item(&engine, &mut session, &pool) {
            engine
                .submit_answer(&mut session, &item.id, Answer::Single(1), &observer)
                .unwrap();
            if session.finished {
                break;
            }
        }

        assert_eq!(observer.starts.load(Ordering::Relaxed), 1);
        assert_eq!(observer.responses.load(Ordering::Relaxed), 2);
        assert_eq!(observer.finishes.load(Ordering::Relaxed), 1);
    }
}
