//! End-to-end adaptive flow tests driving the engine against the built-in
//! demo bank, the way the simulate command does.

use adaptest_bank::demo_bank;
use adaptest_core::engine::{CatEngine, EngineConfig, NoopObserver};
use adaptest_core::error::CatError;
use adaptest_core::model::{Answer, Domain, Item, StartLevel};
use adaptest_core::selector::NextItem;

fn correct_answer(item: &Item) -> Answer {
    if item.model.is_dichotomous() {
        Answer::Single(item.correct[0])
    } else {
        Answer::Multiple(item.correct.clone())
    }
}

#[test]
fn full_adaptive_flow_with_all_correct_answers() {
    let bank = demo_bank();
    let engine = CatEngine::new(EngineConfig::default());
    let observer = NoopObserver;
    let mut session = engine.create_session(StartLevel::Easy, &observer);

    let mut answered = 0;
    loop {
        match engine.next_item(&mut session, &bank.items).unwrap() {
            NextItem::SectionBreak(domain) => {
                let resumed = engine.resume_section(&mut session).unwrap();
                assert_eq!(resumed, domain);
            }
            NextItem::Exhausted => break,
            NextItem::Item(item) => {
                // A duplicate fetch must return the same pending item.
                match engine.next_item(&mut session, &bank.items).unwrap() {
                    NextItem::Item(duplicate) => assert_eq!(duplicate.id, item.id),
                    other => panic!("expected the pending item again, got {other:?}"),
                }

                let outcome = engine
                    .submit_answer(&mut session, &item.id, correct_answer(&item), &observer)
                    .unwrap();
                assert!(outcome.correct);
                answered += 1;
                if outcome.next_domain.is_none() {
                    break;
                }
            }
        }
    }

    assert!(answered > 0);
    let report = engine.finish(&mut session, &observer);
    assert_eq!(report.items_answered, answered);

    // All-correct from an easy start must land above the prior mean.
    assert!(report.ability > -1.5);
    for breakdown in &report.domains {
        assert!((0.0..=1.0).contains(&breakdown.average_score));
    }
    // Breakdowns come back in canonical section order.
    let order: Vec<Domain> = report.domains.iter().map(|d| d.domain).collect();
    let mut sorted = order.clone();
    sorted.sort();
    assert_eq!(order, sorted);
}

#[test]
fn listening_items_enforce_the_play_limit() {
    let bank = demo_bank();
    // SE stopping disabled so the walk reliably reaches listening.
    let engine = CatEngine::new(EngineConfig {
        max_items: 40,
        se_threshold: 0.0,
        section_target: 10,
    });
    let observer = NoopObserver;
    let mut session = engine.create_session(StartLevel::Middle, &observer);

    let listening_item = loop {
        match engine.next_item(&mut session, &bank.items).unwrap() {
            NextItem::SectionBreak(_) => {
                engine.resume_section(&mut session).unwrap();
            }
            NextItem::Exhausted => panic!("ran out of items before listening"),
            NextItem::Item(item) => {
                if item.domain == Domain::Listening {
                    break item;
                }
                engine
                    .submit_answer(&mut session, &item.id, correct_answer(&item), &observer)
                    .unwrap();
            }
        }
    };

    assert_eq!(
        engine.record_play(&mut session, &listening_item.id).unwrap(),
        1
    );
    assert_eq!(
        engine.record_play(&mut session, &listening_item.id).unwrap(),
        2
    );
    match engine.record_play(&mut session, &listening_item.id) {
        Err(CatError::PlayLimitExceeded { max_plays: 2, .. }) => {}
        other => panic!("expected PlayLimitExceeded, got {other:?}"),
    }
}

#[test]
fn finished_sessions_serve_no_further_items() {
    let bank = demo_bank();
    let engine = CatEngine::new(EngineConfig {
        max_items: 3,
        se_threshold: 0.0,
        section_target: 10,
    });
    let observer = NoopObserver;
    let mut session = engine.create_session(StartLevel::Hard, &observer);

    assert!(matches!(
        engine.report(&session),
        Err(CatError::ReportNotReady)
    ));

    let mut answered = 0;
    loop {
        match engine.next_item(&mut session, &bank.items).unwrap() {
            NextItem::SectionBreak(_) => {
                engine.resume_section(&mut session).unwrap();
            }
            NextItem::Exhausted => break,
            NextItem::Item(item) => {
                let outcome = engine
                    .submit_answer(&mut session, &item.id, correct_answer(&item), &observer)
                    .unwrap();
                answered += 1;
                if outcome.next_domain.is_none() {
                    break;
                }
            }
        }
    }

    assert_eq!(answered, 3);
    assert!(session.finished);
    assert!(matches!(
        engine.next_item(&mut session, &bank.items),
        Err(CatError::TestAlreadyFinished)
    ));

    let report = engine.report(&session).unwrap();
    assert_eq!(report.items_answered, 3);
}
