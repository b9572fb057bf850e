//! The `adaptest info` command.

use anyhow::Result;
use comfy_table::{Cell, Table};

use adaptest_core::model::{Domain, IrtModel};

use super::simulate::load_bank;

pub fn execute(bank_spec: String) -> Result<()> {
    let bank = load_bank(&bank_spec)?;

    println!("Bank: {} ({})", bank.name, bank.id);
    if !bank.description.is_empty() {
        println!("{}", bank.description);
    }

    let mut table = Table::new();
    table.set_header(vec!["Domain", "Items", "2PL", "3PL", "GPCM", "Replayable"]);

    for &domain in &Domain::ALL {
        let items: Vec<_> = bank.items.iter().filter(|i| i.domain == domain).collect();
        let count_model = |matches: &dyn Fn(&IrtModel) -> bool| {
            items.iter().filter(|i| matches(&i.model)).count()
        };
        table.add_row(vec![
            Cell::new(domain),
            Cell::new(items.len()),
            Cell::new(count_model(&|m| matches!(m, IrtModel::TwoPl { .. }))),
            Cell::new(count_model(&|m| matches!(m, IrtModel::ThreePl { .. }))),
            Cell::new(count_model(&|m| matches!(m, IrtModel::Gpcm { .. }))),
            Cell::new(items.iter().filter(|i| i.max_plays > 0).count()),
        ]);
    }

    println!("{table}");
    println!("Total: {} items", bank.items.len());

    Ok(())
}
