use std::path::Path;

use miette::{Context as _, IntoDiagnostic as _};
use paraphrase::store::database_file;
use tracing::info;

#[derive(Debug, clap::Args)]
pub struct Args {}

pub fn run(
    db_path: &Path,
    _args: &Args,
    feedback: &super::feedback::Feedback,
) -> miette::Result<()> {
    let file = database_file(db_path);

    if !file.is_file() {
        miette::bail!("no database at {}", file.display());
    }

    let backup = file.with_extension("ppdb.orig");

    info!(backup = %backup.display(), "keeping original database");
    std::fs::copy(&file, &backup)
        .into_diagnostic()
        .context("backing up database")?;

    let before = std::fs::metadata(&file).into_diagnostic()?.len();

    let pb = feedback.indeterminate_progress_bar();
    pb.set_message("compacting database");

    let mut db = super::common::open_db(&file)?;
    let compacted = db.compact().into_diagnostic()?;
    drop(db);

    pb.finish_and_clear();

    let after = std::fs::metadata(&file).into_diagnostic()?.len();

    if compacted {
        println!("compacted {} -> {} bytes", before, after);
    } else {
        println!("nothing to compact");
    }

    println!("original kept at {}", backup.display());

    Ok(())
}
