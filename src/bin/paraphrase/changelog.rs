use std::path::Path;

use comfy_table::{presets, Table};
use miette::IntoDiagnostic as _;

#[derive(Debug, clap::Args)]
pub struct Args {}

pub fn run(db_path: &Path, _args: &Args) -> miette::Result<()> {
    let db = super::common::open_db(db_path)?;

    let entries = db.changelog().into_diagnostic()?;

    let mut table = Table::new();
    table.load_preset(presets::NOTHING);
    table.set_header(["ID", "USER", "DATE", "LOG"]);

    for entry in &entries {
        table.add_row([
            entry.id.to_string(),
            entry.user.clone(),
            entry.date.to_rfc3339(),
            entry.change.clone(),
        ]);
    }

    println!("{table}");

    Ok(())
}
