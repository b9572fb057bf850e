//! TOML item-bank parser.
//!
//! Loads calibrated item banks from TOML files and directories. The parser
//! is the single point where untyped model tags and calibration values
//! enter the system, so structural validity (known model, positive
//! discrimination, guessing floor in range) is enforced here; the core
//! only ever sees well-formed [`Item`]s.

use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;

use adaptest_core::error::CatError;
use adaptest_core::model::{Domain, IrtModel, Item};

/// A loaded, immutable item bank.
#[derive(Debug, Clone)]
pub struct ItemBank {
    pub id: String,
    pub name: String,
    pub description: String,
    pub items: Vec<Item>,
}

/// Intermediate TOML structure for parsing bank files.
#[derive(Debug, Deserialize)]
struct TomlBankFile {
    bank: TomlBankHeader,
    #[serde(default)]
    items: Vec<TomlItem>,
}

#[derive(Debug, Deserialize)]
struct TomlBankHeader {
    id: String,
    name: String,
    #[serde(default)]
    description: String,
}

#[derive(Debug, Deserialize)]
struct TomlItem {
    id: String,
    domain: String,
    model: String,
    a: f64,
    b: f64,
    #[serde(default)]
    c: Option<f64>,
    #[serde(default)]
    steps: Option<Vec<f64>>,
    stem: String,
    options: Vec<String>,
    correct: TomlCorrect,
    #[serde(default)]
    max_plays: u32,
}

/// `correct = 2` or `correct = [1, 3]`.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum TomlCorrect {
    Single(u32),
    Multiple(Vec<u32>),
}

impl TomlCorrect {
    fn into_keys(self) -> Vec<u32> {
        match self {
            TomlCorrect::Single(index) => vec![index],
            TomlCorrect::Multiple(indices) => indices,
        }
    }
}

/// Parse a single TOML file into an `ItemBank`.
pub fn parse_bank(path: &Path) -> Result<ItemBank> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read bank file: {}", path.display()))?;

    parse_bank_str(&content, path)
}

/// Parse a TOML string into an `ItemBank` (useful for testing).
pub fn parse_bank_str(content: &str, source_path: &Path) -> Result<ItemBank> {
    let parsed: TomlBankFile = toml::from_str(content)
        .with_context(|| format!("failed to parse TOML: {}", source_path.display()))?;

    let items = parsed
        .items
        .into_iter()
        .map(|raw| {
            let id = raw.id.clone();
            build_item(raw).with_context(|| format!("invalid item '{id}'"))
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(ItemBank {
        id: parsed.bank.id,
        name: parsed.bank.name,
        description: parsed.bank.description,
        items,
    })
}

fn build_item(raw: TomlItem) -> Result<Item> {
    let domain: Domain = raw
        .domain
        .parse()
        .map_err(|e: String| anyhow::anyhow!("{}", e))?;
    let correct = raw.correct.into_keys();
    anyhow::ensure!(!correct.is_empty(), "correct key set is empty");
    anyhow::ensure!(!raw.options.is_empty(), "options must not be empty");
    anyhow::ensure!(raw.a > 0.0, "discrimination must be positive, got {}", raw.a);

    let model = match raw.model.to_lowercase().as_str() {
        "2pl" => IrtModel::TwoPl { a: raw.a, b: raw.b },
        "3pl" => {
            let c = raw.c.unwrap_or(0.0);
            anyhow::ensure!(
                (0.0..1.0).contains(&c),
                "guessing parameter must be in [0, 1), got {c}"
            );
            IrtModel::ThreePl { a: raw.a, b: raw.b, c }
        }
        "gpcm" => {
            // Files may omit explicit steps; synthesize a narrow spread
            // around the difficulty, one step per correct key, so the core
            // always sees explicit steps.
            let steps = match raw.steps {
                Some(steps) if !steps.is_empty() => steps,
                _ => (0..correct.len())
                    .map(|k| raw.b + (k as f64 - 0.5) * 0.2)
                    .collect(),
            };
            IrtModel::Gpcm { a: raw.a, steps }
        }
        other => return Err(CatError::UnsupportedModel(other.to_string()).into()),
    };

    Ok(Item {
        id: raw.id,
        domain,
        model,
        stem: raw.stem,
        options: raw.options,
        correct,
        max_plays: raw.max_plays,
    })
}

/// Recursively load all `.toml` bank files from a directory.
pub fn load_bank_directory(dir: &Path) -> Result<Vec<ItemBank>> {
    let mut banks = Vec::new();

    if !dir.is_dir() {
        anyhow::bail!("not a directory: {}", dir.display());
    }

    for entry in
        std::fs::read_dir(dir).with_context(|| format!("failed to read directory: {}", dir.display()))?
    {
        let entry = entry?;
        let path = entry.path();

        if path.is_dir() {
            banks.extend(load_bank_directory(&path)?);
        } else if path.extension().is_some_and(|ext| ext == "toml") {
            match parse_bank(&path) {
                Ok(bank) => banks.push(bank),
                Err(e) => {
                    tracing::warn!("skipping {}: {}", path.display(), e);
                }
            }
        }
    }

    Ok(banks)
}
