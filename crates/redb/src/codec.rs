//! The at-rest value codec: MessagePack with named fields (so decoders
//! tolerate added optional fields) compressed with Snappy.

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::Error;

pub fn encode_value<T: Serialize>(value: &T) -> Result<Vec<u8>, Error> {
    let raw = rmp_serde::to_vec_named(value)?;
    let compressed = snap::raw::Encoder::new().compress_vec(&raw)?;

    Ok(compressed)
}

pub fn decode_value<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, Error> {
    let raw = snap::raw::Decoder::new().decompress_vec(bytes)?;
    let value = rmp_serde::from_slice(&raw)?;

    Ok(value)
}

#[cfg(test)]
mod tests {
    use paraphrase_core::{Document, DocumentData, Settings, TermCountVector};

    use super::*;

    #[test]
    fn document_roundtrip_is_identity() {
        let doc = Document {
            id: 0x7abc_def0_1234_5678,
            path: "/src/lib.rs".into(),
            namespace: "demo".into(),
            index_date: chrono::Utc::now(),
            sha1: "2fd4e1c67a2d28fced849ee1bb76e7391b93eb12".into(),
            hashes: TermCountVector::from([(1, 2), (u64::MAX, i16::MAX)]),
        };

        let encoded = encode_value(&doc).unwrap();
        let decoded: Document = decode_value(&encoded).unwrap();

        assert_eq!(decoded.id, doc.id);
        assert_eq!(decoded.path, doc.path);
        assert_eq!(decoded.namespace, doc.namespace);
        assert_eq!(decoded.index_date, doc.index_date);
        assert_eq!(decoded.sha1, doc.sha1);
        assert_eq!(decoded.hashes, doc.hashes);
    }

    #[test]
    fn document_data_roundtrip_preserves_raw_bytes() {
        let data = DocumentData {
            id: 17,
            path: "bin.dat".into(),
            namespace: "blobs".into(),
            index_date: chrono::Utc::now(),
            body: (0u16..=255).map(|b| b as u8).collect(),
        };

        let decoded: DocumentData = decode_value(&encode_value(&data).unwrap()).unwrap();

        assert_eq!(decoded.body, data.body);
    }

    #[test]
    fn settings_roundtrip_is_identity() {
        let settings = Settings::default();

        let decoded: Settings = decode_value(&encode_value(&settings).unwrap()).unwrap();

        assert_eq!(decoded, settings);
    }

    #[test]
    fn repetitive_values_compress() {
        let data = DocumentData {
            id: 1,
            path: "big.txt".into(),
            namespace: "ns".into(),
            index_date: chrono::Utc::now(),
            body: vec![b'x'; 64 * 1024],
        };

        let encoded = encode_value(&data).unwrap();

        assert!(encoded.len() < data.body.len() / 4);
    }
}
