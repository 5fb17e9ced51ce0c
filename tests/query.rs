//! Similarity query behavior: self-match, ranking, boundary cases.

use paraphrase::prelude::*;

fn memory_db() -> ParaphraseDb {
    ParaphraseDb::memory(Settings::default()).unwrap()
}

/// 1,000 deterministic alphabetic bytes; no whitespace, so normalization is
/// the identity.
fn deterministic_body() -> Vec<u8> {
    let mut state = 0x853c49e6748fea9b_u64;

    (0..1000)
        .map(|_| {
            state = state
                .wrapping_mul(6364136223846793005)
                .wrapping_add(1442695040888963407);
            b'a' + (state % 26) as u8
        })
        .collect()
}

#[test]
fn querying_a_document_by_its_own_body_scores_one() {
    let db = memory_db();
    let body = deterministic_body();

    let doc = db.create_document("big.txt", "ns", &body).unwrap();

    let results = db
        .query_by_string(std::str::from_utf8(&body).unwrap())
        .unwrap();

    assert_eq!(results.len(), 1);
    assert_eq!(results[0].doc.id, doc.id);
    assert_eq!(results[0].similarity, 1.0);
}

#[test]
fn query_by_id_matches_itself_first() {
    let db = memory_db();
    let body = deterministic_body();

    let doc = db.create_document("big.txt", "ns", &body).unwrap();
    db.create_document(
        "other.txt",
        "ns",
        b"Pack my box with five dozen liquor jugs",
    )
    .unwrap();

    let results = db.query_by_id(doc.id).unwrap();

    assert_eq!(results[0].doc.id, doc.id);
    assert_eq!(results[0].similarity, 1.0);
}

#[test]
fn overlapping_documents_rank_by_shared_content() {
    let db = memory_db();

    let body = deterministic_body();

    // Half the query body followed by unrelated filler of the same length.
    let mut mixed = body[..500].to_vec();
    let mut state = 0x9e3779b97f4a7c15_u64;
    mixed.extend((0..500).map(|_| {
        state = state
            .wrapping_mul(6364136223846793005)
            .wrapping_add(1442695040888963407);
        b'A' + (state % 26) as u8
    }));

    let full = db.create_document("full.txt", "ns", &body).unwrap();
    let partial = db.create_document("mixed.txt", "ns", &mixed).unwrap();
    db.create_document(
        "unrelated.txt",
        "ns",
        b"The quick brown fox jumps over the lazy dog",
    )
    .unwrap();

    let results = db
        .query_by_string(std::str::from_utf8(&body).unwrap())
        .unwrap();

    assert_eq!(results.len(), 2);
    assert_eq!(results[0].doc.id, full.id);
    assert_eq!(results[0].similarity, 1.0);
    assert_eq!(results[1].doc.id, partial.id);
    assert!(results[1].similarity > 0.25);
    assert!(results[1].similarity < 1.0);
}

#[test]
fn query_shorter_than_k_is_rejected() {
    let db = memory_db();

    let err = db.query_by_string("tiny").unwrap_err();

    assert!(matches!(err, Error::QueryTooShort { .. }));
}

#[test]
fn query_against_empty_database_returns_nothing() {
    let db = memory_db();
    let body = deterministic_body();

    let results = db
        .query_by_string(std::str::from_utf8(&body).unwrap())
        .unwrap();

    assert!(results.is_empty());
}

#[test]
fn single_document_posting_does_not_divide_by_zero() {
    // N=1 and df=1 exercise the idf denominator guard: 1 + ln(1/2).
    let db = memory_db();
    let body = deterministic_body();

    db.create_document("only.txt", "ns", &body).unwrap();

    let results = db
        .query_by_string(std::str::from_utf8(&body).unwrap())
        .unwrap();

    assert_eq!(results.len(), 1);
    assert!(results[0].similarity.is_finite());
}

#[test]
fn cosine_strategy_still_ranks_self_first() {
    let mut db = memory_db();
    db.set_similarity(Similarity::CosineTfIdf);

    let body = deterministic_body();
    let doc = db.create_document("big.txt", "ns", &body).unwrap();
    db.create_document("half.txt", "ns", &body[..500]).unwrap();

    let results = db
        .query_by_string(std::str::from_utf8(&body).unwrap())
        .unwrap();

    assert_eq!(results[0].doc.id, doc.id);
    assert!((results[0].similarity - 1.0).abs() < 1e-9);
}

#[test]
fn query_by_missing_id_is_not_found() {
    let db = memory_db();

    assert!(matches!(
        db.query_by_id(12345),
        Err(Error::NotFound { .. })
    ));
}
