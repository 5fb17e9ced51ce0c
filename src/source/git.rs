//! Git repository producer: shallow-clones into a scratch directory and
//! hands the checkout to the tree walker.

use tracing::info;

use super::{tree_walker, DocumentProducer};
use crate::prelude::Error;

/// Clones `url` at depth 1 and produces every file of the checkout. When no
/// namespace is supplied one is derived from the URL and the HEAD commit,
/// e.g. `github.com/foo/bar rev: abc123...`.
pub fn git_clone(url: &str, namespace: Option<String>) -> Result<DocumentProducer, Error> {
    let scratch = tempfile::Builder::new()
        .prefix("paraphrase-git")
        .tempdir()?
        .keep();

    info!(url, path = %scratch.display(), "cloning repository");

    let mut fetch = git2::FetchOptions::new();
    fetch.depth(1);

    let repo = git2::build::RepoBuilder::new()
        .fetch_options(fetch)
        .clone(url, &scratch)?;

    let head = repo
        .head()
        .ok()
        .and_then(|reference| reference.target())
        .map(|oid| oid.to_string())
        .unwrap_or_else(|| "UNKNOWNHASH".to_string());

    let namespace = namespace.unwrap_or_else(|| {
        let trimmed = url.splitn(2, "//").nth(1).unwrap_or(url);
        format!("{trimmed} rev: {head}")
    });

    info!(%namespace, "clone finished");

    let prefix_len = scratch.to_string_lossy().len();

    Ok(tree_walker(scratch, namespace, true, prefix_len))
}

#[cfg(test)]
mod tests {
    #[test]
    fn namespace_derivation_strips_the_scheme() {
        let url = "https://github.com/foo/bar";
        let trimmed = url.splitn(2, "//").nth(1).unwrap_or(url);

        assert_eq!(trimmed, "github.com/foo/bar");
        assert_eq!(
            format!("{trimmed} rev: abc123"),
            "github.com/foo/bar rev: abc123"
        );
    }
}
