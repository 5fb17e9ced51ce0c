//! The database facade: opening and creating corpus files, the document
//! store operations and the export/import path.

use std::path::{Path, PathBuf};

use paraphrase_redb::CorpusStore;
use sha1::{Digest, Sha1};
use tracing::{debug, info, warn};

use crate::prelude::*;

pub const DB_FILE_NAME: &str = "paraphrasedb.ppdb";

/// Resolves a user-supplied location to the database file: directories mean
/// "the default file name inside".
pub fn database_file(path: &Path) -> PathBuf {
    if path.is_dir() {
        path.join(DB_FILE_NAME)
    } else {
        path.to_path_buf()
    }
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct DbStats {
    pub documents: u64,
    pub distinct_fingerprints: u64,
    pub postings: u64,
    pub changelog_entries: u64,
    pub settings: Settings,
    pub file_size: Option<u64>,
}

#[derive(Debug)]
pub struct ParaphraseDb {
    store: CorpusStore,
    settings: Settings,
    path: Option<PathBuf>,
    similarity: Similarity,
}

impl ParaphraseDb {
    /// Opens an existing database, failing when the file is missing or its
    /// settings record is absent or from a different version.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, Error> {
        let file = database_file(path.as_ref());

        if !file.is_file() {
            return Err(Error::NotInitialized(file.display().to_string()));
        }

        let store = CorpusStore::open(&file)?;

        let settings = store
            .settings()?
            .ok_or_else(|| Error::NotInitialized(file.display().to_string()))?;

        if settings.version != CURRENT_SETTINGS_VERSION {
            return Err(Error::SettingsMismatch {
                found: settings.version,
                expected: CURRENT_SETTINGS_VERSION,
            });
        }

        debug!(path = %file.display(), "database opened");

        Ok(Self {
            store,
            settings,
            path: Some(file),
            similarity: Similarity::default(),
        })
    }

    /// Creates a new database with the given settings. Fails when a file is
    /// already present at the resolved location.
    pub fn create(path: impl AsRef<Path>, settings: Settings) -> Result<Self, Error> {
        let file = database_file(path.as_ref());

        if file.exists() {
            return Err(Error::AlreadyInitialized(file.display().to_string()));
        }

        let store = CorpusStore::create(&file, &settings)?;

        info!(path = %file.display(), "database created");

        let db = Self {
            store,
            settings,
            path: Some(file),
            similarity: Similarity::default(),
        };

        db.log_change("created database".to_string());

        Ok(db)
    }

    /// An in-memory database, used by tests and dry runs.
    pub fn memory(settings: Settings) -> Result<Self, Error> {
        let store = CorpusStore::memory(&settings)?;

        Ok(Self {
            store,
            settings,
            path: None,
            similarity: Similarity::default(),
        })
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn set_similarity(&mut self, similarity: Similarity) {
        self.similarity = similarity;
    }

    pub(crate) fn similarity(&self) -> Similarity {
        self.similarity
    }

    /// Runs the fingerprint pipeline over raw bytes under this database's
    /// settings.
    pub fn winnow_data(&self, body: &[u8]) -> TermCountVector {
        winnow_data(body, &self.settings)
    }

    /// Fingerprints and persists one document. The document record, its
    /// body and all inverted-index postings commit atomically; on any error
    /// nothing is stored.
    pub fn create_document(
        &self,
        path: &str,
        namespace: &str,
        body: &[u8],
    ) -> Result<Document, Error> {
        let hashes = self.winnow_data(body);

        if hashes.is_empty() {
            return Err(Error::DocumentTooShort {
                path: path.to_string(),
            });
        }

        let sha1 = hex::encode(Sha1::digest(body));
        let id = self.unused_doc_id()?;
        let now = chrono::Utc::now();

        let doc = Document {
            id,
            path: path.to_string(),
            namespace: namespace.to_string(),
            index_date: now,
            sha1,
            hashes,
        };

        let data = DocumentData {
            id,
            path: path.to_string(),
            namespace: namespace.to_string(),
            index_date: now,
            body: body.to_vec(),
        };

        self.store.insert_document(&doc, &data)?;

        debug!(id, path, fingerprints = doc.hashes.len(), "document created");

        Ok(doc)
    }

    /// Random 63-bit ids keep exported documents collision-free across
    /// databases. Regenerate on the (negligible) chance of a local clash.
    fn unused_doc_id(&self) -> Result<DocId, Error> {
        loop {
            let id = rand::random::<u64>() >> 1;

            if self.store.document(id)?.is_none() {
                return Ok(id);
            }
        }
    }

    pub fn count_documents(&self) -> Result<u64, Error> {
        Ok(self.store.count_documents()?)
    }

    pub fn find_document_by_id(&self, id: DocId) -> Result<Document, Error> {
        self.store
            .document(id)?
            .ok_or_else(|| Error::not_found("document", id))
    }

    pub fn find_document_data_by_id(&self, id: DocId) -> Result<DocumentData, Error> {
        self.store
            .document_data(id)?
            .ok_or_else(|| Error::not_found("document data", id))
    }

    /// Documents matching every non-empty predicate: id exactly, sha1 as a
    /// prefix, namespace and path as globs. No match is an empty result,
    /// not an error.
    pub fn find_documents_like(&self, query: &DocumentQuery) -> Result<Vec<Document>, Error> {
        let compiled = query.compile()?;

        Ok(self.store.select_documents(&compiled)?)
    }

    /// Full-length hex matches exactly, anything shorter as a prefix.
    pub fn find_documents_by_sha1(&self, sha1: &str) -> Result<Vec<Document>, Error> {
        let query = DocumentQuery {
            sha1: Some(sha1.to_string()),
            ..Default::default()
        };

        self.find_documents_like(&query)
    }

    /// All inverted-index postings for one fingerprint.
    pub fn lookup(&self, fingerprint: u64) -> Result<Vec<IndexEntry>, Error> {
        Ok(self.store.posting(fingerprint)?)
    }

    /// Copies every document of `source` matching the query into this
    /// database, preserving ids, hash vectors, sha1s and bodies. Both
    /// databases must use the same fingerprint settings.
    pub fn import_documents_matching(
        &self,
        source: &ParaphraseDb,
        query: &DocumentQuery,
    ) -> Result<Vec<Document>, Error> {
        if !self.settings.compatible_with(source.settings()) {
            return Err(Error::invalid_input(
                "cannot exchange documents between databases with different fingerprint settings",
            ));
        }

        let matching = source.find_documents_like(query)?;
        let mut imported = Vec::with_capacity(matching.len());

        for doc in matching {
            let data = source.find_document_data_by_id(doc.id)?;
            self.store.insert_document(&doc, &data)?;

            debug!(id = doc.id, path = %doc.path, "document imported");

            imported.push(doc);
        }

        self.log_change(format!("imported {} documents", imported.len()));

        Ok(imported)
    }

    pub fn changelog(&self) -> Result<Vec<ChangeLogEntry>, Error> {
        Ok(self.store.changelog()?)
    }

    /// Appends an audit row for a schema-modifying operation. Changelog
    /// failures are logged, never propagated.
    pub(crate) fn log_change(&self, change: String) {
        let user = std::env::var("USER")
            .or_else(|_| std::env::var("USERNAME"))
            .unwrap_or_else(|_| "unknown".to_string());

        if let Err(error) = self.store.append_changelog(&user, &change) {
            warn!(%error, "could not write changelog entry");
        }
    }

    pub fn stats(&self) -> Result<DbStats, Error> {
        let stats = self.store.stats()?;

        let file_size = self
            .path
            .as_deref()
            .and_then(|p| std::fs::metadata(p).ok())
            .map(|m| m.len());

        Ok(DbStats {
            documents: stats.documents,
            distinct_fingerprints: stats.distinct_fingerprints,
            postings: stats.postings,
            changelog_entries: stats.changelog_entries,
            settings: self.settings.clone(),
            file_size,
        })
    }

    /// Reclaims free pages in place. The caller owns the only handle.
    pub fn compact(&mut self) -> Result<bool, Error> {
        Ok(self.store.compact()?)
    }
}
