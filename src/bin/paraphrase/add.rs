use std::path::Path;

use chrono::{SecondsFormat, Utc};
use miette::IntoDiagnostic as _;
use paraphrase::prelude::*;
use paraphrase::source::tree_walker;
use tracing::info;

#[derive(Debug, clap::Args)]
pub struct Args {
    /// files or directories to add, or - to read a file list from stdin
    paths: Vec<String>,

    /// namespace for the loaded files; defaults to a timestamp
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
    if args.paths.is_empty() {
        miette::bail!("specify at least one file or directory, or - to read from stdin");
    }

    let db = super::common::open_db(db_path)?;

    let namespace = args
        .namespace
        .clone()
        .unwrap_or_else(|| Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true));

    info!(%namespace, "adding documents");

    let mut producer = if args.paths == ["-"] {
        DocumentProducer::file_list(namespace, tokio::io::stdin())
    } else {
        build_walkers(&args.paths, &namespace)?
    };

    if args.match_glob != "*" {
        producer = producer.filter(&args.match_glob).into_diagnostic()?;
    }

    if args.dry {
        producer = producer.dummy(std::io::stdout());
    }

    let outcome = db.add_documents(producer).await.into_diagnostic()?;

    println!("added {} documents", outcome.added.len());

    if !outcome.ok() {
        return Err(Error::PartialIngest {
            failures: outcome.failures,
            total: outcome.total(),
        })
        .into_diagnostic();
    }

    Ok(())
}

fn build_walkers(paths: &[String], namespace: &str) -> miette::Result<DocumentProducer> {
    let mut joined: Option<DocumentProducer> = None;

    for path in paths {
        let abs = std::fs::canonicalize(path).into_diagnostic()?;

        // Strip the directory part so stored paths stay relative to the
        // argument the user gave.
        let prefix_len = if abs.is_dir() {
            abs.to_string_lossy().len()
        } else {
            abs.parent()
                .map(|p| p.to_string_lossy().len())
                .unwrap_or_default()
        };

        let walker = tree_walker(abs, namespace.to_string(), true, prefix_len);

        joined = Some(match joined {
            None => walker,
            Some(previous) => DocumentProducer::join(previous, walker),
        });
    }

    joined.ok_or_else(|| miette::miette!("no inputs given"))
}
