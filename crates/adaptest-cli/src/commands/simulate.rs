//! The `adaptest simulate` command.
//!
//! Drives one full adaptive session against a bank, answering as a
//! simulated test-taker whose responses are sampled from the IRT models at
//! a chosen latent ability.

use std::path::{Path, PathBuf};

use anyhow::Result;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use adaptest_bank::{demo_bank, parse_bank, validate_bank, ItemBank};
use adaptest_core::engine::{CatEngine, EngineConfig, SessionObserver};
use adaptest_core::irt::{category_probabilities, three_pl, two_pl};
use adaptest_core::model::{Answer, IrtModel, Item, StartLevel};
use adaptest_core::report::FinalReport;
use adaptest_core::selector::NextItem;
use adaptest_core::session::{ResponseRecord, Session};

use crate::store::SessionStore;

/// Console progress observer.
struct ConsoleObserver;

impl SessionObserver for ConsoleObserver {
    fn on_session_start(&self, session: &Session) {
        eprintln!(
            "  Session {} started (level {}, prior θ {:.2})",
            session.id, session.start_level, session.prior_mu
        );
    }

    fn on_response(&self, _session: &Session, record: &ResponseRecord) {
        let se = if record.standard_error_after.is_finite() {
            format!("{:.3}", record.standard_error_after)
        } else {
            "inf".to_string()
        };
        eprintln!(
            "  {}: score {:.1}/{:.0}, θ {:.3} -> {:.3} (SE {se})",
            record.item_id,
            record.score,
            record.max_score,
            record.ability_before,
            record.ability_after,
        );
    }

    fn on_session_finish(&self, session: &Session) {
        eprintln!(
            "  Session finished after {} items (θ {:.3})",
            session.total_answered(),
            session.ability
        );
    }
}

pub fn load_bank(spec: &str) -> Result<ItemBank> {
    if spec == "builtin" {
        Ok(demo_bank())
    } else {
        parse_bank(Path::new(spec))
    }
}

/// Sample an answer the way a test-taker at `true_theta` would respond.
fn simulated_answer(item: &Item, true_theta: f64, rng: &mut ChaCha8Rng) -> Answer {
    match &item.model {
        IrtModel::TwoPl { a, b } => {
            dichotomous_answer(item, two_pl(true_theta, *a, *b), rng)
        }
        IrtModel::ThreePl { a, b, c } => {
            dichotomous_answer(item, three_pl(true_theta, *a, *b, *c), rng)
        }
        IrtModel::Gpcm { a, steps } => {
            // Draw a score category, then submit that many correct keys.
            let probs = category_probabilities(true_theta, *a, steps);
            let mut draw: f64 = rng.gen();
            let mut category = 0usize;
            for (k, p) in probs.iter().enumerate() {
                if draw < *p {
                    category = k;
                    break;
                }
                draw -= p;
                category = k;
            }
            Answer::Multiple(item.correct.iter().take(category).copied().collect())
        }
    }
}

fn dichotomous_answer(item: &Item, p_correct: f64, rng: &mut ChaCha8Rng) -> Answer {
    if rng.gen_bool(p_correct.clamp(0.0, 1.0)) {
        Answer::Single(item.correct[0])
    } else {
        let wrong: Vec<u32> = (0..item.options.len() as u32)
            .filter(|index| !item.correct.contains(index))
            .collect();
        if wrong.is_empty() {
            Answer::Single(item.correct[0])
        } else {
            Answer::Single(wrong[rng.gen_range(0..wrong.len())])
        }
    }
}

#[allow(clippy::too_many_arguments)]
pub fn execute(
    bank_spec: String,
    start_level: String,
    true_theta: f64,
    seed: u64,
    max_items: u32,
    se_threshold: f64,
    section_target: u32,
    output: Option<PathBuf>,
) -> Result<()> {
    anyhow::ensure!(max_items >= 1, "max-items must be at least 1");
    anyhow::ensure!(section_target >= 1, "section-target must be at least 1");
    anyhow::ensure!(
        (-4.0..=4.0).contains(&true_theta),
        "true-theta must be within [-4, 4]"
    );

    let level: StartLevel = start_level
        .parse()
        .map_err(|e: String| anyhow::anyhow!("{}", e))?;

    let bank = load_bank(&bank_spec)?;
    let warnings = validate_bank(&bank);
    if !warnings.is_empty() {
        eprintln!("Warning: bank has {} validation warning(s)", warnings.len());
    }

    let engine = CatEngine::new(EngineConfig {
        max_items,
        se_threshold,
        section_target,
    });
    let observer = ConsoleObserver;
    let mut store = SessionStore::new();
    let mut rng = ChaCha8Rng::seed_from_u64(seed);

    eprintln!(
        "adaptest v0.1.0 — simulating '{}' ({} items) at true θ {:.2}",
        bank.name,
        bank.items.len(),
        true_theta
    );

    let session_id = store.insert(engine.create_session(level, &observer));

    loop {
        let session = store.get_mut(session_id)?;
        match engine.next_item(session, &bank.items)? {
            NextItem::SectionBreak(domain) => {
                eprintln!("  -- section break: {domain} --");
                engine.resume_section(session)?;
            }
            NextItem::Exhausted => break,
            NextItem::Item(item) => {
                // Replayable items get played once before answering.
                if item.domain.replayable() {
                    let plays = engine.record_play(session, &item.id)?;
                    tracing::debug!(item_id = %item.id, plays, "played audio");
                }
                let answer = simulated_answer(&item, true_theta, &mut rng);
                let outcome = engine.submit_answer(session, &item.id, answer, &observer)?;
                if outcome.next_domain.is_none() {
                    break;
                }
            }
        }
    }

    let session = store.get_mut(session_id)?;
    let report = engine.finish(session, &observer);
    print_summary(&report);

    if let Some(path) = &output {
        report.save_json(path)?;
        eprintln!("Report saved to: {}", path.display());
    }

    Ok(())
}

fn print_summary(report: &FinalReport) {
    use comfy_table::{Cell, Table};

    let mut table = Table::new();
    table.set_header(vec!["Domain", "Average", "CEFR"]);
    for breakdown in &report.domains {
        table.add_row(vec![
            Cell::new(breakdown.domain),
            Cell::new(format!("{:.0}%", breakdown.average_score * 100.0)),
            Cell::new(breakdown.cefr),
        ]);
    }
    println!("{table}");

    let se = report
        .standard_error
        .map(|se| format!("{se:.3}"))
        .unwrap_or_else(|| "n/a".to_string());
    println!(
        "Result: θ = {:.3}, SE = {}, T-score = {:.1}, CEFR = {} ({} items)",
        report.ability, se, report.t_score, report.cefr, report.items_answered
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use adaptest_core::model::Domain;

    fn dichotomous_item() -> Item {
        Item {
            id: "vocab_001".into(),
            domain: Domain::Vocabulary,
            model: IrtModel::TwoPl { a: 1.2, b: 0.0 },
            stem: String::new(),
            options: vec!["a".into(), "b".into(), "c".into(), "d".into()],
            correct: vec![2],
            max_plays: 0,
        }
    }

    #[test]
    fn high_ability_examinee_mostly_answers_correctly() {
        let item = dichotomous_item();
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        let correct = (0..200)
            .filter(|_| simulated_answer(&item, 3.0, &mut rng) == Answer::Single(2))
            .count();
        assert!(correct > 180, "expected mostly correct, got {correct}/200");
    }

    #[test]
    fn low_ability_examinee_mostly_answers_wrong() {
        let item = dichotomous_item();
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        let correct = (0..200)
            .filter(|_| simulated_answer(&item, -3.0, &mut rng) == Answer::Single(2))
            .count();
        assert!(correct < 20, "expected mostly wrong, got {correct}/200");
    }

    #[test]
    fn gpcm_answer_submits_at_most_the_key_set() {
        let item = Item {
            id: "use_001".into(),
            domain: Domain::EnglishInUse,
            model: IrtModel::Gpcm {
                a: 1.0,
                steps: vec![-0.2, 0.2],
            },
            stem: String::new(),
            options: vec!["a".into(), "b".into(), "c".into(), "d".into()],
            correct: vec![1, 3],
            max_plays: 0,
        };
        let mut rng = ChaCha8Rng::seed_from_u64(11);
        for _ in 0..50 {
            match simulated_answer(&item, 0.0, &mut rng) {
                Answer::Multiple(indices) => assert!(indices.len() <= 2),
                other => panic!("expected a multiple answer, got {other:?}"),
            }
        }
    }

    #[test]
    fn sampling_is_deterministic_per_seed() {
        let item = dichotomous_item();
        let mut a = ChaCha8Rng::seed_from_u64(42);
        let mut b = ChaCha8Rng::seed_from_u64(42);
        for _ in 0..20 {
            assert_eq!(
                simulated_answer(&item, 0.5, &mut a),
                simulated_answer(&item, 0.5, &mut b)
            );
        }
    }
}
