pub mod compile;
pub mod completions;
pub mod inspect;
pub mod verify;

use std::path::Path;

use anyhow::{Context, Result};
use pharos_core::config::{CompilerConfig, UserConfig, user_config_path};
use pharos_core::error::read_document;
use pharos_core::{Issuer, Session};
use tracing::debug;

use crate::markdown;

/// Read and parse a Markdown file, then walk it into a session.
///
/// `depth_ceiling` overrides the configured ceiling for this run.
pub fn open_session(
    file: &Path,
    config: &CompilerConfig,
    depth_ceiling: Option<u8>,
) -> Result<Session> {
    let source = read_document(file)?;
    let doc = markdown::parse(&source)
        .with_context(|| format!("Failed to parse {}", file.display()))?;

    let mut config = *config;
    if let Some(ceiling) = depth_ceiling {
        config.depth_ceiling = ceiling;
    }
    debug!(file = %file.display(), nodes = doc.len(), depth_ceiling = config.depth_ceiling, "document parsed");
    Ok(Session::open(doc, config))
}

/// Pick the issuer: explicit flag first, then the user config.
pub fn resolve_issuer(flag: Option<&str>, user: &UserConfig) -> Result<Issuer> {
    if let Some(issuer) = flag.or(user.issuer.as_deref()) {
        let issuer = issuer.trim();
        if !issuer.is_empty() {
            return Ok(Issuer::new(issuer));
        }
    }
    let location = user_config_path().map_or_else(
        || "the user config".to_string(),
        |path| path.display().to_string(),
    );
    anyhow::bail!("No issuer configured: pass --issuer or set `issuer` in {location}")
}
