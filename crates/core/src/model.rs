use std::collections::HashMap;

use chrono::{DateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::glob::{glob_to_regex, sha1_prefix_regex, SHA1_HEX_LEN};

/// The version of the settings record, not the version of the tool. Bumped
/// only when the fingerprint pipeline changes in a hash-incompatible way.
pub const CURRENT_SETTINGS_VERSION: u32 = 1;

pub type DocId = u64;

/// Sparse fingerprint -> occurrence-count mapping. Counts saturate at the
/// declared width on ingest.
pub type TermCountVector = HashMap<u64, i16>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    pub version: u32,
    pub window_size: usize,
    pub fingerprint_size: usize,
    pub robust_hash: bool,
    pub created_at: DateTime<Utc>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            version: CURRENT_SETTINGS_VERSION,
            window_size: 10,
            fingerprint_size: 10,
            robust_hash: true,
            created_at: Utc::now(),
        }
    }
}

impl Settings {
    /// Two databases can exchange documents only when the fingerprint
    /// pipeline parameters match; otherwise stored hash vectors are
    /// incomparable.
    pub fn compatible_with(&self, other: &Settings) -> bool {
        self.window_size == other.window_size
            && self.fingerprint_size == other.fingerprint_size
            && self.robust_hash == other.robust_hash
    }

    /// Any shared run of at least this many normalized bytes is guaranteed
    /// to produce a common fingerprint between two documents.
    pub fn guarantee_threshold(&self) -> usize {
        self.window_size + self.fingerprint_size - 1
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
    pub id: DocId,
    pub path: String,
    pub namespace: String,
    pub index_date: DateTime<Utc>,
    pub sha1: String,
    pub hashes: TermCountVector,
}

impl Document {
    pub fn short_sha(&self) -> &str {
        let end = self.sha1.len().min(8);
        &self.sha1[..end]
    }
}

/// Raw body counterpart of a [`Document`], stored separately so that finds
/// and queries never have to page bodies in. Lifecycle is tied one-to-one to
/// the owning document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentData {
    pub id: DocId,
    pub path: String,
    pub namespace: String,
    pub index_date: DateTime<Utc>,
    #[serde(with = "serde_bytes")]
    pub body: Vec<u8>,
}

/// One posting row of the inverted index: the key is the
/// `(fingerprint, doc_id)` pair, the payload is how often winnowing emitted
/// the fingerprint for that document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IndexEntry {
    pub fingerprint: u64,
    pub doc_id: DocId,
    pub count: i16,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChangeLogEntry {
    pub id: u64,
    pub user: String,
    pub date: DateTime<Utc>,
    pub change: String,
}

/// Multi-predicate document search. Non-empty predicates are combined with
/// AND: id matches exactly, sha1 as a hex prefix, namespace and path as
/// globs.
#[derive(Debug, Clone, Default)]
pub struct DocumentQuery {
    pub id: Option<DocId>,
    pub sha1: Option<String>,
    pub namespace: Option<String>,
    pub path: Option<String>,
}

impl DocumentQuery {
    pub fn by_id(id: DocId) -> Self {
        Self {
            id: Some(id),
            ..Default::default()
        }
    }

    pub fn by_namespace(namespace: impl Into<String>) -> Self {
        Self {
            namespace: Some(namespace.into()),
            ..Default::default()
        }
    }

    pub fn by_path(path: impl Into<String>) -> Self {
        Self {
            path: Some(path.into()),
            ..Default::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.id.is_none() && self.sha1.is_none() && self.namespace.is_none() && self.path.is_none()
    }

    pub fn compile(&self) -> Result<CompiledQuery, regex::Error> {
        let sha1 = match &self.sha1 {
            Some(sha) if sha.len() == SHA1_HEX_LEN => Some(Sha1Match::Exact(sha.clone())),
            Some(sha) => Some(Sha1Match::Prefix(sha1_prefix_regex(sha)?)),
            None => None,
        };

        let namespace = self
            .namespace
            .as_deref()
            .map(glob_to_regex)
            .transpose()?;

        let path = self.path.as_deref().map(glob_to_regex).transpose()?;

        Ok(CompiledQuery {
            id: self.id,
            sha1,
            namespace,
            path,
        })
    }
}

#[derive(Debug, Clone)]
pub enum Sha1Match {
    Exact(String),
    Prefix(Regex),
}

impl Sha1Match {
    pub fn matches(&self, sha1: &str) -> bool {
        match self {
            Sha1Match::Exact(full) => full == sha1,
            Sha1Match::Prefix(regex) => regex.is_match(sha1),
        }
    }
}

#[derive(Debug, Clone)]
pub struct CompiledQuery {
    pub id: Option<DocId>,
    pub sha1: Option<Sha1Match>,
    pub namespace: Option<Regex>,
    pub path: Option<Regex>,
}

impl CompiledQuery {
    pub fn matches(&self, doc: &Document) -> bool {
        if let Some(id) = self.id {
            if doc.id != id {
                return false;
            }
        }

        if let Some(sha1) = &self.sha1 {
            if !sha1.matches(&doc.sha1) {
                return false;
            }
        }

        if let Some(namespace) = &self.namespace {
            if !namespace.is_match(&doc.namespace) {
                return false;
            }
        }

        if let Some(path) = &self.path {
            if !path.is_match(&doc.path) {
                return false;
            }
        }

        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_doc() -> Document {
        Document {
            id: 42,
            path: "src/main/App.java".into(),
            namespace: "assignment1".into(),
            index_date: Utc::now(),
            sha1: "2fd4e1c67a2d28fced849ee1bb76e7391b93eb12".into(),
            hashes: TermCountVector::new(),
        }
    }

    #[test]
    fn default_settings_match_current_version() {
        let settings = Settings::default();

        assert_eq!(settings.version, CURRENT_SETTINGS_VERSION);
        assert_eq!(settings.window_size, 10);
        assert_eq!(settings.fingerprint_size, 10);
        assert!(settings.robust_hash);
        assert_eq!(settings.guarantee_threshold(), 19);
    }

    #[test]
    fn query_predicates_combine_with_and() {
        let doc = test_doc();

        let query = DocumentQuery {
            id: Some(42),
            sha1: Some("2fd4e1c6".into()),
            namespace: Some("assignment*".into()),
            path: Some("*.java".into()),
        };

        assert!(query.compile().unwrap().matches(&doc));

        let mismatch = DocumentQuery {
            namespace: Some("assignment2*".into()),
            ..query
        };

        assert!(!mismatch.compile().unwrap().matches(&doc));
    }

    #[test]
    fn full_length_sha1_matches_exactly() {
        let doc = test_doc();

        let exact = DocumentQuery {
            sha1: Some(doc.sha1.clone()),
            ..Default::default()
        };
        assert!(exact.compile().unwrap().matches(&doc));

        let wrong_tail = DocumentQuery {
            sha1: Some(format!("{}00", &doc.sha1[..38])),
            ..Default::default()
        };
        assert!(!wrong_tail.compile().unwrap().matches(&doc));
    }

    #[test]
    fn empty_query_matches_everything() {
        let query = DocumentQuery::default();

        assert!(query.is_empty());
        assert!(query.compile().unwrap().matches(&test_doc()));
    }

    #[test]
    fn short_sha_is_eight_chars() {
        assert_eq!(test_doc().short_sha(), "2fd4e1c6");
    }
}
