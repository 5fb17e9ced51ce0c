use std::path::Path;

use comfy_table::{presets, Table};
use miette::IntoDiagnostic as _;
use paraphrase::prelude::*;
use paraphrase::template::Template;

/// The shared find/cat/dump predicate flags. Non-empty predicates combine
/// with AND.
#[derive(Debug, clap::Args)]
pub struct QueryArgs {
    /// find by sha1 or sha1 prefix
    #[arg(short, long)]
    pub sha: Option<String>,

    /// find by document id
    #[arg(short, long)]
    pub id: Option<u64>,

    /// find by path glob; * matches any characters including /
    #[arg(short, long)]
    pub path: Option<String>,

    /// find by namespace glob
    #[arg(short, long)]
    pub namespace: Option<String>,
}

impl QueryArgs {
    pub fn to_query(&self) -> DocumentQuery {
        DocumentQuery {
            id: self.id,
            sha1: self.sha.clone(),
            namespace: self.namespace.clone(),
            path: self.path.clone(),
        }
    }
}

#[derive(Debug, clap::Args)]
pub struct Args {
    #[command(flatten)]
    query: QueryArgs,

    /// show the full sha1 hash instead of the first 8 characters
    #[arg(long)]
    full_sha: bool,

    /// render each result through a template instead of the table
    #[arg(long)]
    fmt: Option<String>,
}

pub fn run(db_path: &Path, args: &Args) -> miette::Result<()> {
    let db = super::common::open_db(db_path)?;

    let docs = db
        .find_documents_like(&args.query.to_query())
        .into_diagnostic()?;

    match &args.fmt {
        Some(fmt) => {
            let template = Template::parse(fmt).into_diagnostic()?;
            let mut stdout = std::io::stdout();

            for doc in &docs {
                template
                    .render(&db, doc, None, &mut stdout)
                    .into_diagnostic()?;
            }
        }
        None => print_documents(&docs, args.full_sha),
    }

    Ok(())
}

pub fn print_documents(docs: &[Document], full_sha: bool) {
    let mut table = Table::new();
    table.load_preset(presets::NOTHING);
    table.set_header(["ID", "SHA1", "NAMESPACE", "PATH"]);

    for doc in docs {
        let sha = if full_sha {
            doc.sha1.as_str()
        } else {
            doc.short_sha()
        };

        table.add_row([
            doc.id.to_string(),
            sha.to_string(),
            doc.namespace.clone(),
            doc.path.clone(),
        ]);
    }

    println!("{table}");
}
