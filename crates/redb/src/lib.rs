//! Storage substrate for paraphrase databases: one `redb` file holding the
//! document corpus, the inverted fingerprint index, settings and the
//! changelog. All writes for one logical operation happen inside a single
//! write transaction; dropping an uncommitted transaction rolls it back.

use std::collections::BTreeSet;
use std::path::Path;
use std::sync::Arc;

use redb::{
    Database, Durability, ReadableDatabase, ReadableMultimapTable, ReadableTable,
    ReadableTableMetadata,
};
use tracing::{debug, trace, warn};

use paraphrase_core::{
    ChangeLogEntry, CompiledQuery, DocId, Document, DocumentData, IndexEntry, Settings, Sha1Match,
};

mod codec;
mod tables;

pub use codec::{decode_value, encode_value};

use tables::{
    ChangeLogTable, DocumentDataTable, DocumentsTable, NamespaceIndex, PathIndex, PostingsTable,
    SettingsTable, Sha1Index,
};

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    DatabaseError(#[from] redb::DatabaseError),

    #[error(transparent)]
    TransactionError(Box<redb::TransactionError>),

    #[error("internal error")]
    SetDurabilityError(Box<redb::SetDurabilityError>),

    #[error(transparent)]
    CommitError(#[from] redb::CommitError),

    #[error(transparent)]
    TableError(#[from] redb::TableError),

    #[error(transparent)]
    StorageError(#[from] redb::StorageError),

    #[error(transparent)]
    CompactionError(#[from] redb::CompactionError),

    #[error("encode error: {0}")]
    EncodeError(#[from] rmp_serde::encode::Error),

    #[error("decode error: {0}")]
    DecodeError(#[from] rmp_serde::decode::Error),

    #[error("compression error: {0}")]
    CompressionError(#[from] snap::Error),

    #[error("operation requires exclusive access to the database")]
    ExclusiveAccessRequired,
}

impl From<redb::SetDurabilityError> for Error {
    fn from(error: redb::SetDurabilityError) -> Self {
        Error::SetDurabilityError(Box::new(error))
    }
}

impl From<redb::TransactionError> for Error {
    fn from(error: redb::TransactionError) -> Self {
        Error::TransactionError(Box::new(error))
    }
}

const DEFAULT_CACHE_SIZE_MB: usize = 50;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreStats {
    pub documents: u64,
    pub postings: u64,
    pub distinct_fingerprints: u64,
    pub changelog_entries: u64,
}

#[derive(Clone, Debug)]
pub struct CorpusStore {
    db: Arc<Database>,
}

impl CorpusStore {
    /// Creates the database file, initializes every table and writes the
    /// settings row.
    pub fn create(path: impl AsRef<Path>, settings: &Settings) -> Result<Self, Error> {
        let db = Database::builder()
            .set_repair_callback(|x| {
                warn!(progress = x.progress() * 100f64, "database is repairing")
            })
            .set_cache_size(1024 * 1024 * DEFAULT_CACHE_SIZE_MB)
            .create(path)?;

        let store = Self { db: Arc::new(db) };

        store.initialize()?;
        store.write_settings(settings)?;

        Ok(store)
    }

    /// Opens an existing database file. Settings presence and version are
    /// for the caller to check via [`CorpusStore::settings`].
    pub fn open(path: impl AsRef<Path>) -> Result<Self, Error> {
        let db = Database::builder()
            .set_repair_callback(|x| {
                warn!(progress = x.progress() * 100f64, "database is repairing")
            })
            .set_cache_size(1024 * 1024 * DEFAULT_CACHE_SIZE_MB)
            .open(path)?;

        Ok(Self { db: Arc::new(db) })
    }

    pub fn memory(settings: &Settings) -> Result<Self, Error> {
        let db =
            Database::builder().create_with_backend(redb::backends::InMemoryBackend::new())?;

        let store = Self { db: Arc::new(db) };

        store.initialize()?;
        store.write_settings(settings)?;

        Ok(store)
    }

    fn initialize(&self) -> Result<(), Error> {
        let mut wx = self.db.begin_write()?;
        wx.set_durability(Durability::Immediate)?;

        wx.open_table(DocumentsTable::DEF)?;
        wx.open_table(DocumentDataTable::DEF)?;
        wx.open_table(PostingsTable::DEF)?;
        wx.open_table(SettingsTable::DEF)?;
        wx.open_table(ChangeLogTable::DEF)?;
        wx.open_multimap_table(PathIndex::DEF)?;
        wx.open_multimap_table(NamespaceIndex::DEF)?;
        wx.open_multimap_table(Sha1Index::DEF)?;

        wx.commit()?;

        Ok(())
    }

    pub fn db(&self) -> &Database {
        &self.db
    }

    fn write_settings(&self, settings: &Settings) -> Result<(), Error> {
        let wx = self.db.begin_write()?;

        {
            let mut table = wx.open_table(SettingsTable::DEF)?;
            table.insert(SettingsTable::ROW, encode_value(settings)?.as_slice())?;
        }

        wx.commit()?;

        Ok(())
    }

    pub fn settings(&self) -> Result<Option<Settings>, Error> {
        let rx = self.db.begin_read()?;
        let table = rx.open_table(SettingsTable::DEF)?;

        match table.get(SettingsTable::ROW)? {
            Some(value) => Ok(Some(decode_value(value.value())?)),
            None => Ok(None),
        }
    }

    /// Persists a document, its body and every posting derived from its
    /// hash vector, plus the path/namespace/sha1 secondary indexes, in one
    /// transaction. Any failure rolls the whole document back.
    pub fn insert_document(&self, doc: &Document, data: &DocumentData) -> Result<(), Error> {
        let wx = self.db.begin_write()?;

        {
            let mut documents = wx.open_table(DocumentsTable::DEF)?;
            documents.insert(doc.id, encode_value(doc)?.as_slice())?;

            let mut bodies = wx.open_table(DocumentDataTable::DEF)?;
            bodies.insert(data.id, encode_value(data)?.as_slice())?;

            let mut postings = wx.open_table(PostingsTable::DEF)?;
            for (&fingerprint, &count) in &doc.hashes {
                postings.insert((fingerprint, doc.id), count)?;
            }

            let mut by_path = wx.open_multimap_table(PathIndex::DEF)?;
            by_path.insert(doc.path.as_str(), doc.id)?;

            let mut by_namespace = wx.open_multimap_table(NamespaceIndex::DEF)?;
            by_namespace.insert(doc.namespace.as_str(), doc.id)?;

            let mut by_sha1 = wx.open_multimap_table(Sha1Index::DEF)?;
            by_sha1.insert(doc.sha1.as_str(), doc.id)?;
        }

        wx.commit()?;

        trace!(id = doc.id, postings = doc.hashes.len(), "document stored");

        Ok(())
    }

    pub fn count_documents(&self) -> Result<u64, Error> {
        let rx = self.db.begin_read()?;
        let table = rx.open_table(DocumentsTable::DEF)?;

        Ok(table.len()?)
    }

    pub fn document(&self, id: DocId) -> Result<Option<Document>, Error> {
        let rx = self.db.begin_read()?;
        let table = rx.open_table(DocumentsTable::DEF)?;

        match table.get(id)? {
            Some(value) => Ok(Some(decode_value(value.value())?)),
            None => Ok(None),
        }
    }

    pub fn document_data(&self, id: DocId) -> Result<Option<DocumentData>, Error> {
        let rx = self.db.begin_read()?;
        let table = rx.open_table(DocumentDataTable::DEF)?;

        match table.get(id)? {
            Some(value) => Ok(Some(decode_value(value.value())?)),
            None => Ok(None),
        }
    }

    /// All postings for one fingerprint, in doc-id order. Possibly empty.
    pub fn posting(&self, fingerprint: u64) -> Result<Vec<IndexEntry>, Error> {
        let rx = self.db.begin_read()?;
        let table = rx.open_table(PostingsTable::DEF)?;

        let mut entries = Vec::new();

        for row in table.range((fingerprint, u64::MIN)..=(fingerprint, u64::MAX))? {
            let (key, count) = row?;
            let (fingerprint, doc_id) = key.value();

            entries.push(IndexEntry {
                fingerprint,
                doc_id,
                count: count.value(),
            });
        }

        Ok(entries)
    }

    /// Documents matching every predicate of the query, resolved through
    /// the secondary indexes and returned in id order. An empty query
    /// returns the whole corpus.
    pub fn select_documents(&self, query: &CompiledQuery) -> Result<Vec<Document>, Error> {
        let rx = self.db.begin_read()?;

        let mut candidates: Option<BTreeSet<DocId>> = None;

        if let Some(id) = query.id {
            narrow(&mut candidates, BTreeSet::from([id]));
        }

        if let Some(sha1) = &query.sha1 {
            let table = rx.open_multimap_table(Sha1Index::DEF)?;

            let ids = match sha1 {
                Sha1Match::Exact(full) => collect_ids(table.get(full.as_str())?)?,
                Sha1Match::Prefix(regex) => {
                    let mut ids = BTreeSet::new();
                    for row in table.range::<&str>(..)? {
                        let (key, values) = row?;
                        if regex.is_match(key.value()) {
                            ids.extend(collect_ids(values)?);
                        }
                    }
                    ids
                }
            };

            narrow(&mut candidates, ids);
        }

        if let Some(regex) = &query.namespace {
            let table = rx.open_multimap_table(NamespaceIndex::DEF)?;

            let mut ids = BTreeSet::new();
            for row in table.range::<&str>(..)? {
                let (key, values) = row?;
                if regex.is_match(key.value()) {
                    ids.extend(collect_ids(values)?);
                }
            }

            narrow(&mut candidates, ids);
        }

        if let Some(regex) = &query.path {
            let table = rx.open_multimap_table(PathIndex::DEF)?;

            let mut ids = BTreeSet::new();
            for row in table.range::<&str>(..)? {
                let (key, values) = row?;
                if regex.is_match(key.value()) {
                    ids.extend(collect_ids(values)?);
                }
            }

            narrow(&mut candidates, ids);
        }

        let documents = rx.open_table(DocumentsTable::DEF)?;

        let mut results = Vec::new();

        match candidates {
            Some(ids) => {
                for id in ids {
                    if let Some(value) = documents.get(id)? {
                        results.push(decode_value(value.value())?);
                    }
                }
            }
            None => {
                for row in documents.iter()? {
                    let (_, value) = row?;
                    results.push(decode_value(value.value())?);
                }
            }
        }

        Ok(results)
    }

    /// Appends one changelog row with the next auto-incremented id.
    pub fn append_changelog(&self, user: &str, change: &str) -> Result<ChangeLogEntry, Error> {
        let wx = self.db.begin_write()?;

        let entry = {
            let mut table = wx.open_table(ChangeLogTable::DEF)?;

            let next_id = table.last()?.map(|(id, _)| id.value() + 1).unwrap_or(1);

            let entry = ChangeLogEntry {
                id: next_id,
                user: user.to_string(),
                date: chrono::Utc::now(),
                change: change.to_string(),
            };

            table.insert(entry.id, encode_value(&entry)?.as_slice())?;

            entry
        };

        wx.commit()?;

        debug!(id = entry.id, change = %entry.change, "changelog entry written");

        Ok(entry)
    }

    pub fn changelog(&self) -> Result<Vec<ChangeLogEntry>, Error> {
        let rx = self.db.begin_read()?;
        let table = rx.open_table(ChangeLogTable::DEF)?;

        let mut entries = Vec::new();

        for row in table.iter()? {
            let (_, value) = row?;
            entries.push(decode_value(value.value())?);
        }

        Ok(entries)
    }

    pub fn stats(&self) -> Result<StoreStats, Error> {
        let rx = self.db.begin_read()?;

        let documents = rx.open_table(DocumentsTable::DEF)?.len()?;
        let changelog_entries = rx.open_table(ChangeLogTable::DEF)?.len()?;

        let postings_table = rx.open_table(PostingsTable::DEF)?;
        let postings = postings_table.len()?;

        let mut distinct_fingerprints = 0;
        let mut previous: Option<u64> = None;

        for row in postings_table.iter()? {
            let (key, _) = row?;
            let (fingerprint, _) = key.value();

            if previous != Some(fingerprint) {
                distinct_fingerprints += 1;
                previous = Some(fingerprint);
            }
        }

        Ok(StoreStats {
            documents,
            postings,
            distinct_fingerprints,
            changelog_entries,
        })
    }

    /// Reclaims free space in place. Requires that no clones of this store
    /// are alive.
    pub fn compact(&mut self) -> Result<bool, Error> {
        let Some(db) = Arc::get_mut(&mut self.db) else {
            return Err(Error::ExclusiveAccessRequired);
        };

        Ok(db.compact()?)
    }
}

fn narrow(candidates: &mut Option<BTreeSet<DocId>>, ids: BTreeSet<DocId>) {
    match candidates {
        None => *candidates = Some(ids),
        Some(existing) => existing.retain(|id| ids.contains(id)),
    }
}

fn collect_ids(values: redb::MultimapValue<'_, u64>) -> Result<BTreeSet<DocId>, Error> {
    let mut ids = BTreeSet::new();

    for value in values {
        ids.insert(value?.value());
    }

    Ok(ids)
}
