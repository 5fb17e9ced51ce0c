//! Table definitions for the single-file database.
//!
//! Entity payloads are codec-encoded blobs keyed by their primary key.
//! Postings live in a dedicated table keyed by the `(fingerprint, doc_id)`
//! pair so one fingerprint's posting list is a contiguous key range.
//! Path, namespace and sha1 lookups go through multimap secondary indexes
//! that are maintained in the same write transaction as the entity rows.

use redb::{MultimapTableDefinition, TableDefinition};

pub struct DocumentsTable;

impl DocumentsTable {
    pub const DEF: TableDefinition<'static, u64, &'static [u8]> =
        TableDefinition::new("documents");
}

pub struct DocumentDataTable;

impl DocumentDataTable {
    pub const DEF: TableDefinition<'static, u64, &'static [u8]> =
        TableDefinition::new("document_data");
}

pub struct PostingsTable;

impl PostingsTable {
    pub const DEF: TableDefinition<'static, (u64, u64), i16> = TableDefinition::new("index");
}

pub struct SettingsTable;

impl SettingsTable {
    pub const DEF: TableDefinition<'static, &'static str, &'static [u8]> =
        TableDefinition::new("settings");

    pub const ROW: &'static str = "settings";
}

pub struct ChangeLogTable;

impl ChangeLogTable {
    pub const DEF: TableDefinition<'static, u64, &'static [u8]> =
        TableDefinition::new("changelog");
}

pub struct PathIndex;

impl PathIndex {
    pub const DEF: MultimapTableDefinition<'static, &'static str, u64> =
        MultimapTableDefinition::new("idx_path");
}

pub struct NamespaceIndex;

impl NamespaceIndex {
    pub const DEF: MultimapTableDefinition<'static, &'static str, u64> =
        MultimapTableDefinition::new("idx_namespace");
}

pub struct Sha1Index;

impl Sha1Index {
    pub const DEF: MultimapTableDefinition<'static, &'static str, u64> =
        MultimapTableDefinition::new("idx_sha1");
}
