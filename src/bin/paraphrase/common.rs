use std::path::Path;

use miette::{Context as _, IntoDiagnostic as _};
use paraphrase::prelude::*;
use tracing::Level;
use tracing_subscriber::{filter::Targets, prelude::*};

pub fn setup_tracing(verbose: u8) -> miette::Result<()> {
    let level = match verbose {
        0 => Level::INFO,
        1 => Level::DEBUG,
        _ => Level::TRACE,
    };

    let filter = Targets::new()
        .with_target("paraphrase", level)
        .with_target("paraphrase_redb", level);

    tracing_subscriber::FmtSubscriber::builder()
        .with_max_level(level)
        .finish()
        .with(filter)
        .init();

    Ok(())
}

pub fn open_db(path: &Path) -> miette::Result<ParaphraseDb> {
    ParaphraseDb::open(path)
        .into_diagnostic()
        .context("opening database")
}
