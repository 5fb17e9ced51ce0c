use std::path::Path;

use miette::IntoDiagnostic as _;

#[derive(Debug, clap::Args)]
pub struct Args {
    /// print the stats as JSON
    #[arg(long)]
    json: bool,
}

pub fn run(db_path: &Path, args: &Args) -> miette::Result<()> {
    let db = super::common::open_db(db_path)?;

    let stats = db.stats().into_diagnostic()?;

    if args.json {
        let out = serde_json::to_string_pretty(&stats).into_diagnostic()?;
        println!("{out}");
        return Ok(());
    }

    println!("documents: {}", stats.documents);
    println!("distinct fingerprints: {}", stats.distinct_fingerprints);
    println!("postings: {}", stats.postings);
    println!("changelog entries: {}", stats.changelog_entries);

    if let Some(size) = stats.file_size {
        println!("file size: {size} bytes");
    }

    println!("---");
    println!("settings version: {}", stats.settings.version);
    println!("window size: {}", stats.settings.window_size);
    println!("fingerprint size: {}", stats.settings.fingerprint_size);
    println!("robust hashing: {}", stats.settings.robust_hash);
    println!("created: {}", stats.settings.created_at.to_rfc3339());

    Ok(())
}
