use std::path::{Path, PathBuf};

use miette::IntoDiagnostic as _;
use paraphrase::prelude::*;

use super::find::QueryArgs;

#[derive(Debug, clap::Args)]
pub struct Args {
    #[command(flatten)]
    query: QueryArgs,

    /// database to copy documents from
    source: PathBuf,
}

pub fn run(
    db_path: &Path,
    args: &Args,
    feedback: &super::feedback::Feedback,
) -> miette::Result<()> {
    let db = super::common::open_db(db_path)?;
    let source = ParaphraseDb::open(&args.source).into_diagnostic()?;

    let pb = feedback.indeterminate_progress_bar();
    pb.set_message("importing documents");

    let imported = db
        .import_documents_matching(&source, &args.query.to_query())
        .into_diagnostic()?;

    pb.finish_and_clear();

    println!(
        "imported {} documents from {}",
        imported.len(),
        args.source.display()
    );

    Ok(())
}
