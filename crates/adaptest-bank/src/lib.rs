//! adaptest-bank — Item-bank loading and validation.
//!
//! The item bank is the engine's read-only collaborator: this crate parses
//! calibrated banks from TOML, validates them for authoring mistakes, and
//! ships a deterministic demo bank for simulation and tests.

pub mod demo;
pub mod parser;
pub mod validate;

pub use demo::demo_bank;
pub use parser::{load_bank_directory, parse_bank, parse_bank_str, ItemBank};
pub use validate::{validate_bank, ValidationWarning};
