pub mod fingerprint;
pub mod glob;
pub mod model;
pub mod vector;

pub use fingerprint::{
    aggregate, fingerprints, fnv1a_64, normalize, winnow, winnow_data, Fingerprint,
};
pub use glob::{glob_to_regex, glob_to_regex_str, sha1_prefix_regex, SHA1_HEX_LEN};
pub use model::{
    ChangeLogEntry, CompiledQuery, DocId, Document, DocumentData, DocumentQuery, IndexEntry,
    Settings, Sha1Match, TermCountVector, CURRENT_SETTINGS_VERSION,
};
pub use vector::SparseVector;
