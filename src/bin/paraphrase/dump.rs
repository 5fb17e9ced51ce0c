use std::path::{Path, PathBuf};

use miette::IntoDiagnostic as _;
use tracing::{info, warn};

use super::find::QueryArgs;

#[derive(Debug, clap::Args)]
pub struct Args {
    #[command(flatten)]
    query: QueryArgs,

    /// directory to write bodies into, as {namespace}/{path}
    output: PathBuf,

    /// log what would be written without creating anything
    #[arg(long)]
    dry: bool,
}

pub fn run(db_path: &Path, args: &Args) -> miette::Result<()> {
    let db = super::common::open_db(db_path)?;

    let docs = db
        .find_documents_like(&args.query.to_query())
        .into_diagnostic()?;

    for doc in &docs {
        let out_path = args
            .output
            .join(sanitize_component(&doc.namespace))
            .join(doc.path.trim_start_matches('/'));

        info!(id = doc.id, path = %out_path.display(), "writing document");

        if args.dry {
            continue;
        }

        let data = match db.find_document_data_by_id(doc.id) {
            Ok(data) => data,
            Err(error) => {
                warn!(id = doc.id, %error, "could not load body");
                continue;
            }
        };

        if let Some(parent) = out_path.parent() {
            std::fs::create_dir_all(parent).into_diagnostic()?;
        }

        if let Err(error) = std::fs::write(&out_path, &data.body) {
            warn!(path = %out_path.display(), %error, "could not write file");
        }
    }

    Ok(())
}

/// Namespaces are free text; squash anything path-hostile before using one
/// as a directory name.
fn sanitize_component(name: &str) -> String {
    let cleaned: String = name
        .chars()
        .map(|c| {
            if c.is_alphanumeric() || matches!(c, '.' | '_' | '-') {
                c
            } else {
                '_'
            }
        })
        .collect();

    if cleaned.is_empty() {
        "_".to_string()
    } else {
        cleaned
    }
}

#[cfg(test)]
mod tests {
    use super::sanitize_component;

    #[test]
    fn separators_and_specials_become_underscores() {
        assert_eq!(
            sanitize_component("github.com/foo/bar rev: abc"),
            "github.com_foo_bar_rev__abc"
        );
        assert_eq!(sanitize_component(""), "_");
        assert_eq!(sanitize_component("plain-ns_1.2"), "plain-ns_1.2");
    }
}
