use std::fmt;
use std::io;
use std::path::PathBuf;

/// Machine-readable error codes for tooling that reacts to failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    ConfigParseError,
    NodeNotFound,
    InvalidParent,
    NotAChild,
    IndexContent,
    MissingChildId,
    MissingNode,
    HashMismatch,
    UnknownChild,
    DocumentReadFailed,
}

impl ErrorCode {
    /// Stable code identifier (`E####`) for machine parsing.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::ConfigParseError => "E1002",
            Self::NodeNotFound => "E2001",
            Self::InvalidParent => "E2002",
            Self::NotAChild => "E2003",
            Self::IndexContent => "E2004",
            Self::MissingChildId => "E3001",
            Self::MissingNode => "E3002",
            Self::HashMismatch => "E4001",
            Self::UnknownChild => "E4002",
            Self::DocumentReadFailed => "E5001",
        }
    }

    /// Short human-facing summary for logs and terminal output.
    #[must_use]
    pub const fn message(self) -> &'static str {
        match self {
            Self::ConfigParseError => "Config file parse error",
            Self::NodeNotFound => "Node not found",
            Self::InvalidParent => "Parent is not an index",
            Self::NotAChild => "Node is not a child of the given parent",
            Self::IndexContent => "Index records cannot carry content",
            Self::MissingChildId => "Child compiled out of order",
            Self::MissingNode => "Scheduled node is not registered",
            Self::HashMismatch => "Record id does not match its content",
            Self::UnknownChild => "Index references an unknown record",
            Self::DocumentReadFailed => "Document read failed",
        }
    }

    /// Optional remediation hint that can be surfaced to operators.
    #[must_use]
    pub const fn hint(self) -> Option<&'static str> {
        match self {
            Self::ConfigParseError => Some("Fix syntax in .pharos/config.toml and retry."),
            Self::NodeNotFound => Some("Compile the document first, then use a `d` tag value."),
            Self::InvalidParent => Some("Only the document root and sections may hold children."),
            Self::NotAChild => Some("Pass the node's current parent as the old parent."),
            Self::IndexContent => Some("Edit one of the section's zettels instead."),
            Self::MissingChildId | Self::MissingNode => {
                Some("Retry once. If persistent, report a bug with the input document.")
            }
            Self::HashMismatch => Some("The record was modified after its id was computed."),
            Self::UnknownChild => Some("Publish the batch in compile order, children first."),
            Self::DocumentReadFailed => Some("Check the path and file permissions."),
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Errors raised by [`crate::session::Session`] mutations.
///
/// A mutation that fails leaves the adjacency table, the record cache and the
/// stale flag exactly as they were.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MutationError {
    /// No compiled record exists for the node id.
    #[error("no compiled record for node '{node_id}'")]
    NotFound { node_id: String },

    /// The old or new parent is not Index-classified.
    #[error("'{parent_id}' is not an index and cannot hold children")]
    InvalidParent { parent_id: String },

    /// The old parent's adjacency set does not contain the node.
    #[error("'{node_id}' is not a child of '{parent_id}'")]
    NotAChild { node_id: String, parent_id: String },

    /// Content updates are only valid on Zettel records.
    #[error("'{node_id}' is an index; index records carry no content")]
    IndexContent { node_id: String },
}

impl MutationError {
    /// Return the machine-readable error code for this error.
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        match self {
            Self::NotFound { .. } => ErrorCode::NodeNotFound,
            Self::InvalidParent { .. } => ErrorCode::InvalidParent,
            Self::NotAChild { .. } => ErrorCode::NotAChild,
            Self::IndexContent { .. } => ErrorCode::IndexContent,
        }
    }
}

/// Errors raised while compiling a scheduled id list into records.
///
/// Both variants mean the schedule and the walk tables disagree. They are
/// never skipped over: a silently dropped `e` tag would publish a broken
/// index.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CompileError {
    /// An index was reached before one of its children had an id.
    #[error("index '{index_id}' reached before child '{child_id}' was compiled")]
    MissingChildId { index_id: String, child_id: String },

    /// A scheduled id has no entry in the node or kind table.
    #[error("scheduled node '{node_id}' is not registered")]
    MissingNode { node_id: String },
}

impl CompileError {
    /// Return the machine-readable error code for this error.
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        match self {
            Self::MissingChildId { .. } => ErrorCode::MissingChildId,
            Self::MissingNode { .. } => ErrorCode::MissingNode,
        }
    }
}

/// An input document or record batch could not be read from disk.
#[derive(Debug, thiserror::Error)]
#[error("Failed to read {}", path.display())]
pub struct DocumentReadError {
    pub path: PathBuf,
    #[source]
    pub source: io::Error,
}

/// Read a whole input file, tagging failures with [`ErrorCode::DocumentReadFailed`].
///
/// # Errors
///
/// Returns a [`DocumentReadError`] carrying the path and the I/O cause.
pub fn read_document(path: impl Into<PathBuf>) -> Result<String, DocumentReadError> {
    let path = path.into();
    std::fs::read_to_string(&path).map_err(|source| DocumentReadError { path, source })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn all_codes_are_unique() {
        let all = [
            ErrorCode::ConfigParseError,
            ErrorCode::NodeNotFound,
            ErrorCode::InvalidParent,
            ErrorCode::NotAChild,
            ErrorCode::IndexContent,
            ErrorCode::MissingChildId,
            ErrorCode::MissingNode,
            ErrorCode::HashMismatch,
            ErrorCode::UnknownChild,
            ErrorCode::DocumentReadFailed,
        ];

        let mut seen = HashSet::new();
        for code in all {
            assert!(seen.insert(code.code()), "duplicate code {}", code.code());
        }
    }

    #[test]
    fn code_format_is_machine_friendly() {
        let code = ErrorCode::NotAChild.code();
        assert_eq!(code.len(), 5);
        assert!(code.starts_with('E'));
        assert!(code.chars().skip(1).all(|c| c.is_ascii_digit()));
    }

    #[test]
    fn mutation_errors_map_to_codes() {
        let err = MutationError::NotAChild {
            node_id: "p".into(),
            parent_id: "chapter-1".into(),
        };
        assert_eq!(err.code(), ErrorCode::NotAChild);
        assert_eq!(err.to_string(), "'p' is not a child of 'chapter-1'");

        let err = MutationError::NotFound {
            node_id: "ghost".into(),
        };
        assert_eq!(err.code().code(), "E2001");
    }

    #[test]
    fn missing_document_keeps_path_and_cause() {
        let dir = tempfile::TempDir::new().expect("tempdir");
        let err = read_document(dir.path().join("absent.md")).expect_err("missing file");
        assert!(err.to_string().starts_with("Failed to read "));
        assert_eq!(err.source.kind(), io::ErrorKind::NotFound);
    }
}
