//! Similarity queries: resolve text, a stored document or a raw term-count
//! vector against the inverted index and rank the candidates.

use std::collections::{BTreeSet, HashMap};

use itertools::Itertools;
use tracing::debug;

use crate::prelude::*;
use crate::store::ParaphraseDb;

/// How candidate documents are scored. The IDF vector is computed either
/// way so both strategies can consume it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Similarity {
    /// `|K_doc ∩ K_query| / |K_doc|` over fingerprint key sets.
    #[default]
    Overlap,
    /// Cosine between tf-idf weighted vectors, using the query-side IDF
    /// weights.
    CosineTfIdf,
}

#[derive(Debug, Clone)]
pub struct SearchResult {
    pub similarity: f64,
    pub doc: Document,
}

impl ParaphraseDb {
    /// Fingerprints the text under the database settings and queries with
    /// the resulting vector. Text shorter than one k-gram after
    /// normalization cannot match anything and is rejected.
    pub fn query_by_string(&self, text: &str) -> Result<Vec<SearchResult>, Error> {
        let vector = self.winnow_data(text.as_bytes());

        if vector.is_empty() {
            return Err(Error::QueryTooShort {
                size: normalize(text.as_bytes()).len(),
                minimum: self.settings().fingerprint_size,
            });
        }

        self.query_by_vector(&vector)
    }

    /// Queries with the stored hash vector of an existing document.
    pub fn query_by_id(&self, id: DocId) -> Result<Vec<SearchResult>, Error> {
        let doc = self.find_document_by_id(id)?;

        self.query_by_vector(&doc.hashes)
    }

    /// The ranking path: gather candidates through posting lookups, weigh
    /// document frequencies, score every candidate and sort best-first.
    pub fn query_by_vector(&self, query: &TermCountVector) -> Result<Vec<SearchResult>, Error> {
        let total_docs = self.count_documents()? as f64;

        let mut idf: HashMap<u64, f64> = HashMap::new();
        let mut candidates: BTreeSet<DocId> = BTreeSet::new();

        for (&fingerprint, &count) in query {
            if count <= 0 {
                continue;
            }

            let posting = self.lookup(fingerprint)?;

            // Fingerprints unknown to the index simply cannot contribute.
            if posting.is_empty() {
                continue;
            }

            let df = posting.len() as f64;
            idf.insert(fingerprint, 1.0 + (total_docs / (1.0 + df)).ln());

            candidates.extend(posting.iter().map(|entry| entry.doc_id));
        }

        debug!(
            query_terms = query.len(),
            candidates = candidates.len(),
            "ranking candidates"
        );

        let strategy = self.similarity();

        let results = candidates
            .into_iter()
            .map(|id| {
                let doc = self.find_document_by_id(id)?;

                let similarity = match strategy {
                    Similarity::Overlap => overlap_score(query, &doc.hashes),
                    Similarity::CosineTfIdf => cosine_tfidf_score(query, &doc.hashes, &idf),
                };

                Ok(SearchResult { similarity, doc })
            })
            .collect::<Result<Vec<_>, Error>>()?
            .into_iter()
            .sorted_by(|a, b| {
                b.similarity
                    .total_cmp(&a.similarity)
                    .then(a.doc.id.cmp(&b.doc.id))
            })
            .collect();

        Ok(results)
    }
}

/// The fraction of the candidate's fingerprints that also occur in the
/// query.
fn overlap_score(query: &TermCountVector, doc: &TermCountVector) -> f64 {
    if doc.is_empty() {
        return 0.0;
    }

    let intersection = doc.keys().filter(|key| query.contains_key(key)).count();

    intersection as f64 / doc.len() as f64
}

fn cosine_tfidf_score(
    query: &TermCountVector,
    doc: &TermCountVector,
    idf: &HashMap<u64, f64>,
) -> f64 {
    let query_vector = SparseVector::weighted(query, idf);
    let doc_vector = SparseVector::weighted(doc, idf);

    query_vector.cosine_similarity(&doc_vector)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn counts(entries: &[(u64, i16)]) -> TermCountVector {
        entries.iter().copied().collect()
    }

    #[test]
    fn overlap_is_intersection_over_doc_size() {
        let query = counts(&[(1, 1), (2, 1), (3, 1)]);
        let doc = counts(&[(2, 5), (3, 1), (4, 2), (5, 1)]);

        assert_eq!(overlap_score(&query, &doc), 0.5);
    }

    #[test]
    fn overlap_of_identical_vectors_is_one() {
        let vector = counts(&[(10, 2), (20, 1)]);

        assert_eq!(overlap_score(&vector, &vector), 1.0);
    }

    #[test]
    fn overlap_with_disjoint_doc_is_zero() {
        let query = counts(&[(1, 1)]);
        let doc = counts(&[(2, 1)]);

        assert_eq!(overlap_score(&query, &doc), 0.0);
    }

    #[test]
    fn cosine_tfidf_of_identical_vectors_is_one() {
        let vector = counts(&[(1, 1), (2, 3)]);
        let idf = HashMap::from([(1, 1.3), (2, 0.7)]);

        let score = cosine_tfidf_score(&vector, &vector, &idf);

        assert!((score - 1.0).abs() < 1e-12);
    }
}
