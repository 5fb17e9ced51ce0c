//! Filesystem tree producer. The walk runs on a blocking task and pushes
//! into the bounded channel, so a slow consumer throttles directory
//! traversal instead of buffering the whole tree.

use std::path::{Path, PathBuf};

use tokio::sync::mpsc;
use tracing::warn;

use super::{BodySource, DocumentProducer, SourceDocument};

/// Walks `root`, emitting one item per regular file. Entries whose name
/// starts with `.` are skipped (directories with their whole subtree) when
/// `ignore_hidden` is set. `prefix_len` bytes are stripped from the front
/// of each absolute path so stored paths are relative to the original
/// root. A non-directory root emits a single item.
pub fn tree_walker(
    root: PathBuf,
    namespace: String,
    ignore_hidden: bool,
    prefix_len: usize,
) -> DocumentProducer {
    let (tx, rx) = mpsc::channel(5);

    tokio::task::spawn_blocking(move || {
        let walker = Walker {
            tx,
            namespace,
            ignore_hidden,
            prefix_len,
        };

        if root.is_dir() {
            walker.walk(&root);
        } else {
            walker.emit(&root);
        }
    });

    DocumentProducer::new(rx)
}

struct Walker {
    tx: mpsc::Sender<SourceDocument>,
    namespace: String,
    ignore_hidden: bool,
    prefix_len: usize,
}

impl Walker {
    /// Returns false once the consumer is gone.
    fn walk(&self, dir: &Path) -> bool {
        let entries = match std::fs::read_dir(dir) {
            Ok(entries) => entries,
            Err(error) => {
                warn!(path = %dir.display(), %error, "could not read directory");
                return true;
            }
        };

        let mut entries: Vec<_> = entries.filter_map(|e| e.ok()).collect();
        entries.sort_by_key(|e| e.file_name());

        for entry in entries {
            let path = entry.path();
            let name = entry.file_name();

            if self.ignore_hidden && name.to_string_lossy().starts_with('.') {
                continue;
            }

            let file_type = match entry.file_type() {
                Ok(file_type) => file_type,
                Err(error) => {
                    warn!(path = %path.display(), %error, "could not stat entry");
                    continue;
                }
            };

            if file_type.is_dir() {
                if !self.walk(&path) {
                    return false;
                }
            } else if file_type.is_file() && !self.emit(&path) {
                return false;
            }
        }

        true
    }

    fn emit(&self, path: &Path) -> bool {
        let full = path.to_string_lossy();
        let stored = full.get(self.prefix_len..).unwrap_or_default().to_string();

        let item = SourceDocument {
            path: stored,
            namespace: self.namespace.clone(),
            body: BodySource::File(path.to_path_buf()),
        };

        self.tx.blocking_send(item).is_ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn collect(mut producer: DocumentProducer) -> Vec<String> {
        let mut paths = Vec::new();

        while let Some(item) = producer.next().await {
            paths.push(item.path);
        }

        paths.sort();
        paths
    }

    fn write(dir: &Path, rel: &str, contents: &str) {
        let path = dir.join(rel);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, contents).unwrap();
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn walks_regular_files_with_relative_paths() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "a.txt", "alpha");
        write(dir.path(), "sub/b.txt", "beta");

        let root = dir.path().to_path_buf();
        let prefix_len = root.to_string_lossy().len();

        let producer = tree_walker(root, "ns".into(), true, prefix_len);
        let paths = collect(producer).await;

        assert_eq!(paths, vec!["/a.txt", "/sub/b.txt"]);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn hidden_entries_are_skipped() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "seen.txt", "yes");
        write(dir.path(), ".hidden.txt", "no");
        write(dir.path(), ".git/config", "no");

        let root = dir.path().to_path_buf();
        let prefix_len = root.to_string_lossy().len();

        let producer = tree_walker(root.clone(), "ns".into(), true, prefix_len);
        assert_eq!(collect(producer).await, vec!["/seen.txt"]);

        let producer = tree_walker(root, "ns".into(), false, prefix_len);
        let all = collect(producer).await;
        assert_eq!(all, vec!["/.git/config", "/.hidden.txt", "/seen.txt"]);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn single_file_root_emits_one_item() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "only.txt", "solo");

        let file = dir.path().join("only.txt");
        let prefix_len = dir.path().to_string_lossy().len();

        let mut producer = tree_walker(file.clone(), "ns".into(), true, prefix_len);

        let item = producer.next().await.unwrap();
        assert_eq!(item.path, "/only.txt");
        assert_eq!(item.body.read().await.unwrap(), b"solo");
        assert!(producer.next().await.is_none());
    }
}
