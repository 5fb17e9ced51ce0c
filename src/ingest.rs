//! The ingest coordinator: drains a producer and persists each document,
//! tolerating per-item failures so one unreadable file never aborts a bulk
//! add.

use std::time::{Duration, Instant};

use tracing::{info, warn};

use crate::prelude::*;
use crate::store::ParaphraseDb;

const PROGRESS_TICK: Duration = Duration::from_secs(1);

#[derive(Debug, Default)]
pub struct IngestOutcome {
    pub added: Vec<Document>,
    pub failures: usize,
}

impl IngestOutcome {
    pub fn ok(&self) -> bool {
        self.failures == 0
    }

    pub fn total(&self) -> usize {
        self.added.len() + self.failures
    }
}

impl ParaphraseDb {
    /// Consumes the producer to exhaustion. Body-fetch and persistence
    /// errors are logged and counted, then the pipeline continues; the
    /// outcome's `ok()` is false when anything failed. A changelog entry
    /// summarizes the run.
    pub async fn add_documents(
        &self,
        mut producer: DocumentProducer,
    ) -> Result<IngestOutcome, Error> {
        let started = Instant::now();
        let mut outcome = IngestOutcome::default();

        loop {
            let item = match tokio::time::timeout(PROGRESS_TICK, producer.next()).await {
                // Nothing arrived for a while; show signs of life during
                // long tree walks.
                Err(_) => {
                    info!(
                        added = outcome.added.len(),
                        failures = outcome.failures,
                        "waiting for documents"
                    );
                    continue;
                }
                Ok(None) => break,
                Ok(Some(item)) => item,
            };

            info!(namespace = %item.namespace, path = %item.path, "adding document");

            let body = match item.body.read().await {
                Ok(body) => body,
                Err(error) => {
                    warn!(path = %item.path, %error, "could not fetch body");
                    outcome.failures += 1;
                    continue;
                }
            };

            match self.create_document(&item.path, &item.namespace, &body) {
                Ok(doc) => outcome.added.push(doc),
                Err(error) => {
                    warn!(path = %item.path, %error, "could not save document");
                    outcome.failures += 1;
                }
            }
        }

        let elapsed = started.elapsed();

        info!(
            added = outcome.added.len(),
            failures = outcome.failures,
            ?elapsed,
            "ingest finished"
        );

        self.log_change(format!(
            "added {} documents ({} failed) in {:.1?}",
            outcome.added.len(),
            outcome.failures,
            elapsed
        ));

        Ok(outcome)
    }
}
