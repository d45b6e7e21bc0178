//! Structural and hash checks over compiled record batches.
//!
//! [`verify_batch`] is the executable form of the ordering law: every record
//! hashes to its stored id, and every `e` tag resolves to a record that came
//! earlier in the batch. A consumer that publishes records in batch order
//! therefore never publishes a reference before its target.

use std::collections::HashSet;

use tracing::debug;

use crate::error::ErrorCode;
use crate::event::{Kind, Record, RecordHasher, TAG_D, TAG_E, TAG_TITLE};

/// Errors from batch verification.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum VerifyError {
    /// The stored record id does not match the recomputed hash.
    #[error("record id mismatch: stored={stored} expected={expected}")]
    HashMismatch {
        /// The id stored on the record.
        stored: String,
        /// The id computed from the record's fields.
        expected: String,
    },

    /// An Index references an id not seen earlier in the batch.
    #[error("index {record_id} references unknown child {child_id}")]
    UnknownChild {
        /// Id of the Index record carrying the bad reference.
        record_id: String,
        /// The referenced id.
        child_id: String,
    },
}

impl VerifyError {
    /// Return the machine-readable error code for this error.
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        match self {
            Self::HashMismatch { .. } => ErrorCode::HashMismatch,
            Self::UnknownChild { .. } => ErrorCode::UnknownChild,
        }
    }
}

/// Whether `record` is a well-formed, non-empty Index: kind 30040, no
/// content, a `title`, a `d` and at least one `e` tag.
#[must_use]
pub fn is_valid_index(record: &Record) -> bool {
    record.kind == Kind::Index
        && record.content.is_empty()
        && record.tag_value(TAG_TITLE).is_some()
        && record.tag_value(TAG_D).is_some()
        && record.tag_value(TAG_E).is_some()
}

/// Keep only the records that pass [`is_valid_index`].
pub fn filter_valid_index_events<'a, I>(records: I) -> Vec<&'a Record>
where
    I: IntoIterator<Item = &'a Record>,
{
    let mut total = 0_usize;
    let valid: Vec<&Record> = records
        .into_iter()
        .inspect(|_| total += 1)
        .filter(|record| is_valid_index(record))
        .collect();
    debug!(total, valid = valid.len(), "filtered index records");
    valid
}

/// Verify hashes and child references across a batch, in order.
///
/// # Errors
///
/// Returns the first [`VerifyError`] encountered, in batch order.
pub fn verify_batch<'a, I>(records: I, hasher: &dyn RecordHasher) -> Result<(), VerifyError>
where
    I: IntoIterator<Item = &'a Record>,
{
    let mut seen: HashSet<&str> = HashSet::new();

    for record in records {
        let expected = hasher.record_id(record);
        if record.id != expected {
            return Err(VerifyError::HashMismatch {
                stored: record.id.clone(),
                expected,
            });
        }

        if record.kind == Kind::Index
            && let Some(child) = record.child_ids().find(|child| !seen.contains(child))
        {
            return Err(VerifyError::UnknownChild {
                record_id: record.id.clone(),
                child_id: child.to_owned(),
            });
        }

        seen.insert(record.id.as_str());
    }

    Ok(())
}
