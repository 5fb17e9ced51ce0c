//! Lazy document sources. Every producer is a task feeding a small bounded
//! channel, so upstream work blocks while the consumer is busy and closing
//! the channel signals end-of-stream. Items defer their body I/O until the
//! consumer actually asks for it, which keeps filters and dry runs free.

use std::path::PathBuf;

use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::sync::mpsc;
use tracing::warn;

use crate::prelude::Error;

mod git;
mod tree;

pub use git::git_clone;
pub use tree::tree_walker;

/// Bounded capacity shared by the channel-backed producers.
pub(crate) const CHANNEL_CAPACITY: usize = 10;

/// Deferred body fetch. Reading happens on the consumer side, once, and
/// only for items that survive filtering.
#[derive(Debug, Clone)]
pub enum BodySource {
    File(PathBuf),
    Inline(Vec<u8>),
}

impl BodySource {
    pub async fn read(&self) -> std::io::Result<Vec<u8>> {
        match self {
            BodySource::File(path) => tokio::fs::read(path).await,
            BodySource::Inline(bytes) => Ok(bytes.clone()),
        }
    }
}

#[derive(Debug, Clone)]
pub struct SourceDocument {
    pub path: String,
    pub namespace: String,
    pub body: BodySource,
}

/// A finite stream of documents to ingest. Receiving `None` means the
/// source is exhausted.
pub struct DocumentProducer {
    rx: mpsc::Receiver<SourceDocument>,
}

impl DocumentProducer {
    pub(crate) fn new(rx: mpsc::Receiver<SourceDocument>) -> Self {
        Self { rx }
    }

    pub async fn next(&mut self) -> Option<SourceDocument> {
        self.rx.recv().await
    }

    /// A fixed in-memory batch; useful for tests and programmatic ingest.
    pub fn from_items(items: Vec<SourceDocument>) -> Self {
        let (tx, rx) = mpsc::channel(items.len().max(1));

        for item in items {
            // Capacity covers every item, so this cannot fail.
            let _ = tx.try_send(item);
        }

        Self::new(rx)
    }

    /// Reads newline-separated file paths, one item per non-empty line, all
    /// under the same namespace.
    pub fn file_list<R>(namespace: String, reader: R) -> Self
    where
        R: AsyncRead + Send + Unpin + 'static,
    {
        let (tx, rx) = mpsc::channel(CHANNEL_CAPACITY);

        tokio::spawn(async move {
            let mut lines = BufReader::new(reader).lines();

            loop {
                match lines.next_line().await {
                    Ok(Some(line)) => {
                        let path = line.trim();

                        if path.is_empty() {
                            continue;
                        }

                        let item = SourceDocument {
                            path: path.to_string(),
                            namespace: namespace.clone(),
                            body: BodySource::File(PathBuf::from(path)),
                        };

                        if tx.send(item).await.is_err() {
                            break;
                        }
                    }
                    Ok(None) => break,
                    Err(error) => {
                        warn!(%error, "could not read file list");
                        break;
                    }
                }
            }
        });

        Self::new(rx)
    }

    /// Interleaves two producers until both are exhausted. No ordering is
    /// guaranteed across the two sides.
    pub fn join(a: DocumentProducer, b: DocumentProducer) -> Self {
        let (tx, rx) = mpsc::channel(CHANNEL_CAPACITY);

        tokio::spawn(async move {
            let mut a = Some(a);
            let mut b = Some(b);

            loop {
                let item = tokio::select! {
                    item = recv_side(&mut a), if a.is_some() => match item {
                        Some(item) => item,
                        None => {
                            a = None;
                            continue;
                        }
                    },
                    item = recv_side(&mut b), if b.is_some() => match item {
                        Some(item) => item,
                        None => {
                            b = None;
                            continue;
                        }
                    },
                    else => break,
                };

                if tx.send(item).await.is_err() {
                    break;
                }
            }
        });

        Self::new(rx)
    }

    /// Forwards only items whose path matches the glob.
    pub fn filter(mut self, glob: &str) -> Result<Self, Error> {
        let regex = paraphrase_core::glob_to_regex(glob)?;

        let (tx, rx) = mpsc::channel(CHANNEL_CAPACITY);

        tokio::spawn(async move {
            while let Some(item) = self.next().await {
                if !regex.is_match(&item.path) {
                    continue;
                }

                if tx.send(item).await.is_err() {
                    break;
                }
            }
        });

        Ok(Self::new(rx))
    }

    /// Dry-run sink: consumes the upstream producer, writes
    /// `namespace\tpath` per item and yields nothing.
    pub fn dummy<W>(mut self, mut writer: W) -> Self
    where
        W: std::io::Write + Send + 'static,
    {
        let (tx, rx) = mpsc::channel(1);

        tokio::spawn(async move {
            while let Some(item) = self.next().await {
                if let Err(error) = writeln!(writer, "{}\t{}", item.namespace, item.path) {
                    warn!(%error, "could not write dry-run output");
                    break;
                }
            }
        });

        drop(tx);

        Self::new(rx)
    }
}

async fn recv_side(side: &mut Option<DocumentProducer>) -> Option<SourceDocument> {
    match side {
        Some(producer) => producer.next().await,
        None => None,
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write as _;
    use std::sync::{Arc, Mutex};

    use super::*;

    fn item(path: &str) -> SourceDocument {
        SourceDocument {
            path: path.to_string(),
            namespace: "test".to_string(),
            body: BodySource::Inline(path.as_bytes().to_vec()),
        }
    }

    async fn drain(mut producer: DocumentProducer) -> Vec<String> {
        let mut paths = Vec::new();

        while let Some(item) = producer.next().await {
            paths.push(item.path);
        }

        paths
    }

    #[tokio::test]
    async fn from_items_preserves_order() {
        let producer = DocumentProducer::from_items(vec![item("a"), item("b"), item("c")]);

        assert_eq!(drain(producer).await, vec!["a", "b", "c"]);
    }

    #[tokio::test]
    async fn file_list_skips_blank_lines() {
        let input = std::io::Cursor::new("one.txt\n\n  \ntwo.txt\n".to_string());

        let producer = DocumentProducer::file_list("ns".to_string(), input);
        let paths = drain(producer).await;

        assert_eq!(paths, vec!["one.txt", "two.txt"]);
    }

    #[tokio::test]
    async fn join_yields_both_sides() {
        let a = DocumentProducer::from_items(vec![item("a1"), item("a2")]);
        let b = DocumentProducer::from_items(vec![item("b1")]);

        let mut paths = drain(DocumentProducer::join(a, b)).await;
        paths.sort();

        assert_eq!(paths, vec!["a1", "a2", "b1"]);
    }

    #[tokio::test]
    async fn filter_keeps_matching_paths_only() {
        let producer = DocumentProducer::from_items(vec![
            item("src/a.java"),
            item("src/b.go"),
            item("test/c.java"),
        ]);

        let paths = drain(producer.filter("*.java").unwrap()).await;

        assert_eq!(paths, vec!["src/a.java", "test/c.java"]);
    }

    #[tokio::test]
    async fn filter_rejects_bad_globs_upfront() {
        // A glob can only fail to compile through pathological regex sizes;
        // emulate with a literal past the default regex size limit.
        let glob = "x".repeat(20_000_000);
        let producer = DocumentProducer::from_items(vec![]);

        assert!(producer.filter(&glob).is_err());
    }

    #[tokio::test]
    async fn dummy_writes_lines_and_yields_nothing() {
        let producer = DocumentProducer::from_items(vec![item("a.txt"), item("b.txt")]);

        let sink = Arc::new(Mutex::new(Vec::new()));
        let writer = SharedWriter(sink.clone());

        let paths = drain(producer.dummy(writer)).await;
        assert!(paths.is_empty());

        // The sink task runs concurrently; wait for it to finish writing.
        let expected = "test\ta.txt\ntest\tb.txt\n";
        for _ in 0..100 {
            if sink.lock().unwrap().len() >= expected.len() {
                break;
            }
            tokio::time::sleep(std::time::Duration::from_millis(10)).await;
        }

        let written = String::from_utf8(sink.lock().unwrap().clone()).unwrap();
        assert_eq!(written, expected);
    }

    #[tokio::test]
    async fn inline_bodies_read_back() {
        let body = BodySource::Inline(b"hello".to_vec());

        assert_eq!(body.read().await.unwrap(), b"hello");
    }

    struct SharedWriter(Arc<Mutex<Vec<u8>>>);

    impl std::io::Write for SharedWriter {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().write(buf)
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }
}
