use std::path::{Path, PathBuf};

use comfy_table::{presets, Table};
use miette::IntoDiagnostic as _;
use paraphrase::prelude::*;
use paraphrase::template::Template;

#[derive(Debug, clap::Args)]
pub struct Args {
    /// text to search for
    text: Option<String>,

    /// search for documents similar to the stored document with this id
    #[arg(long, conflicts_with = "text")]
    id: Option<u64>,

    /// search for documents similar to the contents of this file
    #[arg(long, conflicts_with_all = ["text", "id"])]
    file: Option<PathBuf>,

    /// number of search results
    #[arg(short = 'n', long, default_value_t = 100)]
    num: usize,

    /// rank with cosine tf-idf weighting instead of plain overlap
    #[arg(long)]
    tfidf: bool,

    /// render each result through a template instead of the table
    #[arg(long)]
    fmt: Option<String>,
}

pub fn run(db_path: &Path, args: &Args) -> miette::Result<()> {
    let mut db = super::common::open_db(db_path)?;

    if args.tfidf {
        db.set_similarity(Similarity::CosineTfIdf);
    }

    let mut results = match (&args.text, args.id, &args.file) {
        (Some(text), None, None) => db.query_by_string(text).into_diagnostic()?,
        (None, Some(id), None) => db.query_by_id(id).into_diagnostic()?,
        (None, None, Some(file)) => {
            let body = std::fs::read_to_string(file).into_diagnostic()?;
            db.query_by_string(&body).into_diagnostic()?
        }
        _ => miette::bail!("give exactly one of a search text, --id or --file"),
    };

    results.truncate(args.num);

    match &args.fmt {
        Some(fmt) => {
            let template = Template::parse(fmt).into_diagnostic()?;
            let mut stdout = std::io::stdout();

            for result in &results {
                template
                    .render(&db, &result.doc, Some(result.similarity), &mut stdout)
                    .into_diagnostic()?;
            }
        }
        None => print_results(&results),
    }

    Ok(())
}

fn print_results(results: &[SearchResult]) {
    let mut table = Table::new();
    table.load_preset(presets::NOTHING);
    table.set_header(["SIMILARITY", "ID", "SHA1", "NAMESPACE", "PATH"]);

    for result in results {
        table.add_row([
            format!("{:.3}", result.similarity),
            result.doc.id.to_string(),
            result.doc.short_sha().to_string(),
            result.doc.namespace.clone(),
            result.doc.path.clone(),
        ]);
    }

    println!("{table}");
}
