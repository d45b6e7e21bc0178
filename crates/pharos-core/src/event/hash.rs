//! Record id computation.
//!
//! The compiler only fixes *when* the id is computed (last, after every
//! field and every child id is final). *How* it is computed belongs to the
//! publishing layer, so it sits behind [`RecordHasher`].
//!
//! [`Nip01Hasher`] is the default: SHA-256 over the compact JSON array
//!
//! ```text
//! [0, <issuer>, <created_at>, <kind>, <tags>, <content>]
//! ```
//!
//! rendered as 64 lowercase hex characters.

use serde_json::json;
use sha2::{Digest, Sha256};

use super::Record;

/// Computes a record's id from every field except `id`.
pub trait RecordHasher: std::fmt::Debug {
    fn record_id(&self, record: &Record) -> String;
}

/// SHA-256 over the NIP-01 event serialization.
#[derive(Debug, Clone, Copy, Default)]
pub struct Nip01Hasher;

impl Nip01Hasher {
    /// The exact string that is hashed.
    #[must_use]
    pub fn serialize(record: &Record) -> String {
        json!([
            0,
            record.issuer.as_str(),
            record.created_at,
            record.kind.number(),
            record.tags,
            record.content,
        ])
        .to_string()
    }
}

impl RecordHasher for Nip01Hasher {
    fn record_id(&self, record: &Record) -> String {
        let digest = Sha256::digest(Self::serialize(record).as_bytes());
        format!("{digest:x}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::{Issuer, Kind, TAG_D, Tag};

    fn zettel(content: &str, created_at: i64) -> Record {
        Record::unsealed(
            Kind::Zettel,
            content.to_owned(),
            vec![Tag::pair(TAG_D, "book_paragraph_0")],
            created_at,
            Issuer::new("pk"),
        )
    }

    #[test]
    fn serialization_is_compact_array() {
        let record = zettel("Hello world", 7);
        assert_eq!(
            Nip01Hasher::serialize(&record),
            r#"[0,"pk",7,30041,[["d","book_paragraph_0"]],"Hello world"]"#
        );
    }

    #[test]
    fn id_is_lowercase_hex_sha256() {
        let id = Nip01Hasher.record_id(&zettel("Hello world", 7));
        assert_eq!(id.len(), 64);
        assert!(id.chars().all(|c| c.is_ascii_digit() || ('a'..='f').contains(&c)));
    }

    #[test]
    fn every_field_feeds_the_id() {
        let base = Nip01Hasher.record_id(&zettel("Hello world", 7));
        assert_ne!(base, Nip01Hasher.record_id(&zettel("Hello world!", 7)));
        assert_ne!(base, Nip01Hasher.record_id(&zettel("Hello world", 8)));

        let mut other_issuer = zettel("Hello world", 7);
        other_issuer.issuer = Issuer::new("pk2");
        assert_ne!(base, Nip01Hasher.record_id(&other_issuer));

        let mut extra_tag = zettel("Hello world", 7);
        extra_tag.tags.push(Tag::pair("wikilink", "other"));
        assert_ne!(base, Nip01Hasher.record_id(&extra_tag));
    }

    #[test]
    fn id_field_is_not_part_of_the_input() {
        let mut a = zettel("x", 1);
        let mut b = zettel("x", 1);
        a.id = "stale".into();
        b.id = String::new();
        assert_eq!(Nip01Hasher.record_id(&a), Nip01Hasher.record_id(&b));
    }

    #[test]
    fn seal_stamps_matching_id() {
        let mut record = zettel("x", 1);
        assert!(!record.is_sealed_with(&Nip01Hasher));
        record.seal(&Nip01Hasher);
        assert!(record.is_sealed_with(&Nip01Hasher));
        record.content.push('!');
        assert!(!record.is_sealed_with(&Nip01Hasher));
    }
}
