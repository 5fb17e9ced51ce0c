use std::path::Path;

use miette::IntoDiagnostic as _;
use paraphrase::template::{Template, CAT_FORMAT};

use super::find::QueryArgs;

#[derive(Debug, clap::Args)]
pub struct Args {
    #[command(flatten)]
    query: QueryArgs,
}

pub fn run(db_path: &Path, args: &Args) -> miette::Result<()> {
    let db = super::common::open_db(db_path)?;

    let docs = db
        .find_documents_like(&args.query.to_query())
        .into_diagnostic()?;

    let template = Template::parse(CAT_FORMAT).into_diagnostic()?;
    let mut stdout = std::io::stdout();

    for doc in &docs {
        template
            .render(&db, doc, None, &mut stdout)
            .into_diagnostic()?;
    }

    Ok(())
}
