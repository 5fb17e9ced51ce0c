use std::path::Path;

use miette::IntoDiagnostic as _;
use paraphrase::prelude::*;

#[derive(Debug, clap::Args)]
pub struct Args {
    /// winnowing window size
    #[arg(short, long, default_value_t = 10)]
    window_size: usize,

    /// k-gram length in normalized bytes
    #[arg(short = 'k', long, default_value_t = 10)]
    fingerprint_size: usize,

    /// suppress repeated fingerprints from runs of identical content
    #[arg(long, default_value_t = true, action = clap::ArgAction::Set)]
    robust_hash: bool,
}

pub fn run(db_path: &Path, args: &Args) -> miette::Result<()> {
    if args.window_size < 1 || args.fingerprint_size < 1 {
        miette::bail!("window size and fingerprint size must be at least 1");
    }

    let settings = Settings {
        window_size: args.window_size,
        fingerprint_size: args.fingerprint_size,
        robust_hash: args.robust_hash,
        ..Settings::default()
    };

    let db = ParaphraseDb::create(db_path, settings).into_diagnostic()?;

    println!("created {}", db.path().unwrap().display());
    println!(
        "shared runs of {} or more normalized bytes are guaranteed to match",
        db.settings().guarantee_threshold()
    );

    Ok(())
}
