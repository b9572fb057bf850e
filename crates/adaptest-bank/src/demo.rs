//! Built-in demo bank.
//!
//! A deterministic, fixture-scale catalog covering every section and every
//! item model. It backs the CLI's built-in simulation target and the
//! integration tests; a production deployment loads its own TOML banks
//! instead.

use adaptest_core::model::{Domain, IrtModel, Item};

use crate::parser::ItemBank;

/// Rotate an option list and return the rotated list together with the new
/// index of the original first element.
fn rotate_options(options: &[&str], shift: usize) -> (Vec<String>, u32) {
    let len = options.len();
    let shift = shift % len;
    let rotated: Vec<String> = (0..len)
        .map(|i| options[(i + shift) % len].to_string())
        .collect();
    // Element 0 lands at index (len - shift) % len after rotation.
    let correct = ((len - shift) % len) as u32;
    (rotated, correct)
}

/// (word, synonym, difficulty, discrimination)
const VOCABULARY: [(&str, &str, f64, f64); 12] = [
    ("serene", "calm", -1.8, 1.15),
    ("robust", "strong", -0.9, 1.05),
    ("elated", "joyful", -0.6, 1.1),
    ("candid", "honest", -1.0, 1.05),
    ("tedious", "boring", -0.3, 1.15),
    ("frugal", "thrifty", -1.1, 1.05),
    ("meticulous", "careful", 0.2, 1.25),
    ("perplexed", "confused", 0.4, 1.2),
    ("obsolete", "outdated", 0.5, 1.1),
    ("ambiguous", "unclear", 0.6, 1.2),
    ("scrutinize", "examine", 0.8, 1.25),
    ("inevitable", "unavoidable", 0.9, 1.3),
];

fn vocabulary_items() -> Vec<Item> {
    VOCABULARY
        .iter()
        .enumerate()
        .map(|(index, &(word, synonym, b, a))| {
            // Distractors are the next three synonyms in the table.
            let pool: Vec<&str> = (0..4)
                .map(|k| VOCABULARY[(index + k * 3 + (k > 0) as usize) % VOCABULARY.len()].1)
                .collect();
            let mut ordered = vec![synonym];
            for candidate in pool {
                if ordered.len() == 4 {
                    break;
                }
                if !ordered.contains(&candidate) {
                    ordered.push(candidate);
                }
            }
            while ordered.len() < 4 {
                ordered.push(VOCABULARY[(index + ordered.len()) % VOCABULARY.len()].0);
            }
            let (options, correct) = rotate_options(&ordered, index);
            Item {
                id: format!("vocabulary_{:03}", index + 1),
                domain: Domain::Vocabulary,
                model: IrtModel::TwoPl { a, b },
                stem: format!("Choose the closest synonym for '{word}'."),
                options,
                correct: vec![correct],
                max_plays: 0,
            }
        })
        .collect()
}

/// (stem, options, difficulty, discrimination)
const GRAMMAR: [(&str, [&str; 4], f64, f64); 10] = [
    (
        "She ___ to the office every morning.",
        ["walks", "walk", "walking", "walked always"],
        -1.6,
        1.1,
    ),
    (
        "They ___ dinner when the phone rang.",
        ["were having", "have", "has had", "are having"],
        -0.8,
        1.15,
    ),
    (
        "I have lived here ___ 2019.",
        ["since", "for", "from", "during"],
        -0.5,
        1.05,
    ),
    (
        "If it rains tomorrow, we ___ the picnic.",
        ["will cancel", "cancel", "would cancel", "cancelled"],
        -0.2,
        1.2,
    ),
    (
        "The report ___ by the committee last week.",
        ["was approved", "approved", "has approved", "is approving"],
        0.1,
        1.25,
    ),
    (
        "Hardly ___ the station when the train left.",
        ["had we reached", "we had reached", "we reached", "did we reach"],
        0.9,
        1.3,
    ),
    (
        "She suggested that he ___ earlier.",
        ["arrive", "arrives", "arrived", "would arrive"],
        1.1,
        1.25,
    ),
    (
        "___ the bad weather, the match went ahead.",
        ["Despite", "Although", "However", "Because"],
        0.3,
        1.15,
    ),
    (
        "By next June, I ___ my degree.",
        ["will have finished", "will finish", "have finished", "finish"],
        0.6,
        1.2,
    ),
    (
        "The house ___ roof was damaged has been sold.",
        ["whose", "which", "that", "what"],
        0.8,
        1.2,
    ),
];

fn grammar_items() -> Vec<Item> {
    GRAMMAR
        .iter()
        .enumerate()
        .map(|(index, &(stem, options, b, a))| {
            let (options, correct) = rotate_options(&options, index);
            Item {
                id: format!("grammar_{:03}", index + 1),
                domain: Domain::Grammar,
                model: IrtModel::ThreePl { a, b, c: 0.25 },
                stem: format!("[Grammar] {stem}"),
                options,
                correct: vec![correct],
                max_plays: 0,
            }
        })
        .collect()
}

/// (stem, options, difficulty, discrimination)
const LISTENING: [(&str, [&str; 4], f64, f64); 8] = [
    (
        "What does the speaker plan to do on Saturday?",
        ["visit her sister", "work overtime", "see a film", "go hiking"],
        -1.4,
        1.1,
    ),
    (
        "Why was the flight delayed?",
        ["a technical fault", "bad weather", "a strike", "late crew"],
        -0.7,
        1.15,
    ),
    (
        "Where did the conversation most likely take place?",
        ["a pharmacy", "a bakery", "a bank", "a library"],
        -0.3,
        1.2,
    ),
    (
        "What does the professor say about the deadline?",
        ["it was extended", "it passed", "it is unchanged", "it moved earlier"],
        0.2,
        1.25,
    ),
    (
        "What is the main topic of the announcement?",
        ["platform changes", "ticket prices", "lost property", "new routes"],
        0.5,
        1.2,
    ),
    (
        "What does the woman imply about the project?",
        ["it is behind schedule", "it is finished", "it was cancelled", "it is under budget"],
        0.9,
        1.3,
    ),
    (
        "How does the speaker feel about the decision?",
        ["cautiously optimistic", "indifferent", "angry", "relieved"],
        1.2,
        1.25,
    ),
    (
        "What can be inferred about the new policy?",
        ["it applies from next month", "it is optional", "it was repealed", "it is unpopular"],
        1.5,
        1.3,
    ),
];

fn listening_items() -> Vec<Item> {
    LISTENING
        .iter()
        .enumerate()
        .map(|(index, &(stem, options, b, a))| {
            let (options, correct) = rotate_options(&options, index);
            Item {
                id: format!("listening_{:03}", index + 1),
                domain: Domain::Listening,
                model: IrtModel::ThreePl { a, b, c: 0.2 },
                stem: format!("[Listening] {stem}"),
                options,
                correct: vec![correct],
                max_plays: 2,
            }
        })
        .collect()
}

/// (stem, options, difficulty, discrimination)
const ENGLISH_IN_USE: [(&str, [&str; 4], f64, f64); 6] = [
    (
        "Pick the word that completes: 'She took ___ her coat.'",
        ["off", "out of", "away from", "up on"],
        -1.2,
        1.1,
    ),
    (
        "Which phrase best completes: 'The meeting was called ___.'",
        ["off", "down", "over", "out"],
        -0.4,
        1.15,
    ),
    (
        "Choose the best register for a formal complaint opening.",
        [
            "I am writing to express my concern",
            "Hey, quick thing",
            "So here's the deal",
            "Listen up",
        ],
        0.0,
        1.2,
    ),
    (
        "Which sentence uses 'moreover' correctly?",
        [
            "The plan is costly; moreover, it is risky.",
            "Moreover the plan, it is risky.",
            "The plan is moreover costly.",
            "It is risky, the plan moreover.",
        ],
        0.4,
        1.25,
    ),
    (
        "Pick the idiom meaning 'rarely'.",
        ["once in a blue moon", "under the weather", "on the ball", "in hot water"],
        0.7,
        1.2,
    ),
    (
        "Which collocation is correct?",
        ["make a decision", "do a decision", "take a conclusion", "have a decide"],
        -0.9,
        1.05,
    ),
];

/// (stem, options, correct keys, difficulty, discrimination)
#[allow(clippy::type_complexity)]
const ENGLISH_IN_USE_MULTI: [(&str, [&str; 4], [u32; 2], f64, f64); 4] = [
    (
        "Select every sentence that is grammatically correct.",
        [
            "He don't like tea.",
            "She has been working here for years.",
            "Them are ready.",
            "The results were published yesterday.",
        ],
        [1, 3],
        0.1,
        0.95,
    ),
    (
        "Select every word that can follow 'heavy'.",
        ["rain", "traffic", "decision", "arrival"],
        [0, 1],
        0.4,
        1.0,
    ),
    (
        "Select every formal expression.",
        [
            "in accordance with",
            "gonna",
            "notwithstanding",
            "kinda",
        ],
        [0, 2],
        0.8,
        1.05,
    ),
    (
        "Select every sentence with correct punctuation.",
        [
            "However, the plan failed.",
            "However the plan, failed.",
            "The plan, however, failed.",
            "The plan however failed,",
        ],
        [0, 2],
        1.1,
        1.1,
    ),
];

fn english_in_use_items() -> Vec<Item> {
    let mut items: Vec<Item> = ENGLISH_IN_USE
        .iter()
        .enumerate()
        .map(|(index, &(stem, options, b, a))| {
            let (options, correct) = rotate_options(&options, index);
            Item {
                id: format!("use_{:03}", index + 1),
                domain: Domain::EnglishInUse,
                model: IrtModel::TwoPl { a, b },
                stem: format!("[English in use] {stem}"),
                options,
                correct: vec![correct],
                max_plays: 0,
            }
        })
        .collect();

    items.extend(ENGLISH_IN_USE_MULTI.iter().enumerate().map(
        |(index, &(stem, options, correct, b, a))| Item {
            id: format!("use_{:03}", ENGLISH_IN_USE.len() + index + 1),
            domain: Domain::EnglishInUse,
            model: IrtModel::Gpcm {
                a,
                steps: vec![b - 0.1, b + 0.1],
            },
            stem: format!("[English in use] {stem}"),
            options: options.iter().map(|o| o.to_string()).collect(),
            correct: correct.to_vec(),
            max_plays: 0,
        },
    ));

    items
}

/// The built-in demo bank: deterministic, every section covered, every
/// model represented, listening items replayable.
pub fn demo_bank() -> ItemBank {
    let mut items = vocabulary_items();
    items.extend(grammar_items());
    items.extend(listening_items());
    items.extend(english_in_use_items());

    ItemBank {
        id: "demo-v1".into(),
        name: "Demo Placement Bank".into(),
        description: "Built-in fixture bank for simulation and tests".into(),
        items,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validate::validate_bank;

    #[test]
    fn demo_bank_is_deterministic() {
        let first = demo_bank();
        let second = demo_bank();
        assert_eq!(first.items, second.items);
    }

    #[test]
    fn demo_bank_covers_every_domain_and_model() {
        let bank = demo_bank();
        for &domain in &Domain::ALL {
            assert!(bank.items.iter().any(|i| i.domain == domain));
        }
        assert!(bank
            .items
            .iter()
            .any(|i| matches!(i.model, IrtModel::TwoPl { .. })));
        assert!(bank
            .items
            .iter()
            .any(|i| matches!(i.model, IrtModel::ThreePl { .. })));
        assert!(bank
            .items
            .iter()
            .any(|i| matches!(i.model, IrtModel::Gpcm { .. })));
    }

    #[test]
    fn demo_bank_passes_validation() {
        let bank = demo_bank();
        let warnings = validate_bank(&bank);
        assert!(
            warnings.is_empty(),
            "demo bank should validate cleanly: {:?}",
            warnings
                .iter()
                .map(|w| w.message.as_str())
                .collect::<Vec<_>>()
        );
    }

    #[test]
    fn listening_items_are_replayable() {
        let bank = demo_bank();
        assert!(bank
            .items
            .iter()
            .filter(|i| i.domain == Domain::Listening)
            .all(|i| i.max_plays == 2));
    }

    #[test]
    fn correct_keys_point_at_real_options() {
        let bank = demo_bank();
        for item in &bank.items {
            for &index in &item.correct {
                assert!(
                    (index as usize) < item.options.len(),
                    "item {} has out-of-range key {index}",
                    item.id
                );
            }
        }
    }

    #[test]
    fn rotation_preserves_the_correct_option() {
        let (options, correct) = rotate_options(&["right", "w1", "w2", "w3"], 3);
        assert_eq!(options[correct as usize], "right");
        assert_eq!(options.len(), 4);
    }
}
