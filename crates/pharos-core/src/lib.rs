//! pharos-core library.
//!
//! Compiles a parsed document tree into a batch of content-addressed
//! records. Sections and the document root become Index records (kind
//! 30040) that reference their children by id; every other block becomes a
//! Zettel record (kind 30041) carrying its raw source.
//!
//! ```text
//! Document ──walk──▶ node/kind/adjacency tables ──schedule──▶ ordered ids
//!                                                         │
//!                     Session (cache + stale flag) ◀──compile
//! ```

pub mod ast;
pub mod clock;
pub mod compiler;
pub mod config;
pub mod error;
pub mod event;
pub mod normalize;
pub mod schedule;
pub mod session;
pub mod validate;
pub mod walker;
pub mod wikilink;

pub use ast::{Document, DocumentMeta, LeafKind, NodeContext, NodeRef};
pub use event::{Issuer, Kind, Record, Tag};
pub use session::Session;

/// # Conventions
///
/// - **Errors**: `thiserror` enums at module seams, `anyhow::Result` at the edges.
/// - **Logging**: Use `tracing` macros (`info!`, `warn!`, `error!`, `debug!`, `trace!`).
pub fn init() {
    tracing::info!("pharos-core initialized");
}
