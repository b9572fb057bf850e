//! The `adaptest init` command.

use anyhow::Result;

pub fn execute() -> Result<()> {
    std::fs::create_dir_all("banks")?;
    let starter_path = std::path::Path::new("banks/starter.toml");
    if starter_path.exists() {
        println!("banks/starter.toml already exists, skipping.");
    } else {
        std::fs::write(starter_path, STARTER_BANK)?;
        println!("Created banks/starter.toml");
    }

    println!("\nNext steps:");
    println!("  1. Add calibrated items to banks/starter.toml");
    println!("  2. Run: adaptest validate --bank banks/starter.toml");
    println!("  3. Run: adaptest simulate --bank banks/starter.toml --true-theta 0.5");

    Ok(())
}

const STARTER_BANK: &str = r#"[bank]
id = "starter"
name = "Starter Bank"
description = "A minimal bank to copy item definitions from"

[[items]]
id = "vocabulary_001"
domain = "vocabulary"
model = "2pl"
a = 1.15
b = -0.8
stem = "Choose the closest synonym for 'robust'."
options = ["strong", "fragile", "slow", "narrow"]
correct = 0

[[items]]
id = "grammar_001"
domain = "grammar"
model = "3pl"
a = 1.2
b = 0.0
c = 0.25
stem = "She ___ to the office every morning."
options = ["walks", "walk", "walking", "is walk"]
correct = 0

[[items]]
id = "listening_001"
domain = "listening"
model = "3pl"
a = 1.3
b = 0.3
c = 0.2
stem = "What does the speaker plan to do on Saturday?"
options = ["visit her sister", "work overtime", "see a film", "go hiking"]
correct = 2
max_plays = 2

[[items]]
id = "use_001"
domain = "english_in_use"
model = "gpcm"
a = 0.9
b = 0.2
steps = [0.1, 0.3]
stem = "Select every sentence that is grammatically correct."
options = [
    "He don't like tea.",
    "She has been working here for years.",
    "Them are ready.",
    "The results were published yesterday.",
]
correct = [1, 3]
"#;
