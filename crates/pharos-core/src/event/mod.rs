//! Record model for compiled document events.
//!
//! A [`Record`] is the unsigned event handed to the publishing layer. Its
//! `id` is the content hash of every other field (see [`hash`]), so a record
//! is only complete once [`Record::seal`] has run as the very last step of
//! building it.
//!
//! # Wire shape
//!
//! ```text
//! {"id": .., "pubkey": .., "created_at": .., "kind": 30040|30041, "tags": [[..]], "content": ..}
//! ```

pub mod hash;

pub use hash::{Nip01Hasher, RecordHasher};

use serde::{Deserialize, Serialize};
use std::fmt;

/// Tag key carrying the record title.
pub const TAG_TITLE: &str = "title";
/// Tag key carrying the node id (the record's stable address).
pub const TAG_D: &str = "d";
/// Tag key referencing a child record by id (Index only).
pub const TAG_E: &str = "e";
/// Tag key carrying a normalized cross-reference (Zettel only).
pub const TAG_WIKILINK: &str = "wikilink";
/// Root Index author list.
pub const TAG_AUTHOR: &str = "author";
/// Root Index version / edition.
pub const TAG_VERSION: &str = "version";
/// Root Index publication date.
pub const TAG_PUBLISHED_ON: &str = "published_on";

/// Record classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "u16", try_from = "u16")]
pub enum Kind {
    /// Container record referencing its children by id.
    Index,
    /// Leaf content record.
    Zettel,
}

/// Error returned when a numeric kind is neither 30040 nor 30041.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("unknown record kind {0}: expected 30040 or 30041")]
pub struct UnknownKind(pub u16);

impl Kind {
    /// Numeric wire kind.
    #[must_use]
    pub const fn number(self) -> u16 {
        match self {
            Self::Index => 30040,
            Self::Zettel => 30041,
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Index => "index",
            Self::Zettel => "zettel",
        }
    }
}

impl From<Kind> for u16 {
    fn from(kind: Kind) -> Self {
        kind.number()
    }
}

impl TryFrom<u16> for Kind {
    type Error = UnknownKind;

    fn try_from(value: u16) -> Result<Self, Self::Error> {
        match value {
            30040 => Ok(Self::Index),
            30041 => Ok(Self::Zettel),
            other => Err(UnknownKind(other)),
        }
    }
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A tag: a key followed by one or more values.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Tag(Vec<String>);

impl Tag {
    /// Build a tag from a key and its values.
    pub fn new<I, S>(key: &str, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut parts = vec![key.to_owned()];
        parts.extend(values.into_iter().map(Into::into));
        Self(parts)
    }

    /// Build a single-valued tag.
    pub fn pair(key: &str, value: impl Into<String>) -> Self {
        Self(vec![key.to_owned(), value.into()])
    }

    #[must_use]
    pub fn key(&self) -> &str {
        self.0.first().map_or("", String::as_str)
    }

    /// First value, if any.
    #[must_use]
    pub fn value(&self) -> Option<&str> {
        self.0.get(1).map(String::as_str)
    }

    /// All values after the key.
    #[must_use]
    pub fn values(&self) -> &[String] {
        self.0.get(1..).unwrap_or_default()
    }

    #[must_use]
    pub fn as_slice(&self) -> &[String] {
        &self.0
    }
}

/// Opaque identity of whoever will sign and publish the records.
///
/// Usually a hex public key. This crate never generates or checks it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Issuer(String);

impl Issuer {
    pub fn new(identity: impl Into<String>) -> Self {
        Self(identity.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Issuer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A compiled, content-addressed event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    /// Content hash of all other fields. Empty until sealed.
    pub id: String,
    /// Identity of the publisher.
    #[serde(rename = "pubkey", alias = "issuer")]
    pub issuer: Issuer,
    /// Seconds since the Unix epoch.
    pub created_at: i64,
    pub kind: Kind,
    pub tags: Vec<Tag>,
    /// Raw source for Zettels; always empty for Indexes.
    pub content: String,
}

impl Record {
    /// Start an unsealed record.
    #[must_use]
    pub const fn unsealed(
        kind: Kind,
        content: String,
        tags: Vec<Tag>,
        created_at: i64,
        issuer: Issuer,
    ) -> Self {
        Self {
            id: String::new(),
            issuer,
            created_at,
            kind,
            tags,
            content,
        }
    }

    /// Compute and stamp the id. Must run after every other field is final;
    /// touching any field afterwards invalidates the id.
    pub fn seal(&mut self, hasher: &dyn RecordHasher) -> &str {
        self.id = hasher.record_id(self);
        &self.id
    }

    /// Returns `true` when the stored id matches the record's content.
    #[must_use]
    pub fn is_sealed_with(&self, hasher: &dyn RecordHasher) -> bool {
        !self.id.is_empty() && self.id == hasher.record_id(self)
    }

    /// First tag with the given key.
    #[must_use]
    pub fn tag(&self, key: &str) -> Option<&Tag> {
        self.tags.iter().find(|tag| tag.key() == key)
    }

    /// First value of the first tag with the given key.
    #[must_use]
    pub fn tag_value(&self, key: &str) -> Option<&str> {
        self.tag(key).and_then(Tag::value)
    }

    /// Every first value of tags with the given key, in tag order.
    pub fn tag_values<'a>(&'a self, key: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.tags
            .iter()
            .filter(move |tag| tag.key() == key)
            .filter_map(Tag::value)
    }

    /// The node id this record was compiled from (`d` tag).
    #[must_use]
    pub fn node_id(&self) -> Option<&str> {
        self.tag_value(TAG_D)
    }

    /// Child record ids referenced by this record (`e` tags).
    pub fn child_ids(&self) -> impl Iterator<Item = &str> {
        self.tag_values(TAG_E)
    }
}

impl fmt::Display for Record {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let short = self.id.get(..12).unwrap_or(&self.id);
        write!(
            f,
            "{}\t{}\t{}\t{}",
            self.kind.number(),
            self.node_id().unwrap_or("-"),
            short,
            self.tag_value(TAG_TITLE).unwrap_or(""),
        )
    }
}
