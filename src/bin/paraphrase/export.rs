use std::path::{Path, PathBuf};

use miette::IntoDiagnostic as _;
use paraphrase::prelude::*;

use super::find::QueryArgs;

#[derive(Debug, clap::Args)]
pub struct Args {
    #[command(flatten)]
    query: QueryArgs,

    /// path of the database to create
    output: PathBuf,
}

pub fn run(
    db_path: &Path,
    args: &Args,
    feedback: &super::feedback::Feedback,
) -> miette::Result<()> {
    let db = super::common::open_db(db_path)?;

    let target =
        ParaphraseDb::create(&args.output, db.settings().clone()).into_diagnostic()?;

    let pb = feedback.indeterminate_progress_bar();
    pb.set_message("exporting documents");

    let exported = target
        .import_documents_matching(&db, &args.query.to_query())
        .into_diagnostic()?;

    pb.finish_and_clear();

    println!(
        "exported {} documents to {}",
        exported.len(),
        args.output.display()
    );

    Ok(())
}
