use std::path::Path;

use miette::IntoDiagnostic as _;
use paraphrase::prelude::*;
use paraphrase::source::git_clone;

#[derive(Debug, clap::Args)]
pub struct Args {
    /// repository URL to clone and index
    url: String,

    /// namespace for the loaded files; defaults to url plus HEAD commit
    #[arg(long)]
    namespace: Option<String>,

    /// only add items whose path matches the given glob
    #[arg(short = 'm', long = "match", default_value = "*")]
    match_glob: String,

    /// list the files that would be added without adding them
    #[arg(long)]
    dry: bool,
}

#[tokio::main]
pub async fn run(db_path: &Path, args: &Args) -> miette::Result<()> {
    let db = super::common::open_db(db_path)?;

    let mut producer =
        git_clone(&args.url, args.namespace.clone()).into_diagnostic()?;

    if args.match_glob != "*" {
        producer = producer.filter(&args.match_glob).into_diagnostic()?;
    }

    if args.dry {
        producer = producer.dummy(std::io::stdout());
    }

    let outcome = db.add_documents(producer).await.into_diagnostic()?;

    println!("added {} documents from {}", outcome.added.len(), args.url);

    if !outcome.ok() {
        return Err(Error::PartialIngest {
            failures: outcome.failures,
            total: outcome.total(),
        })
        .into_diagnostic();
    }

    Ok(())
}
