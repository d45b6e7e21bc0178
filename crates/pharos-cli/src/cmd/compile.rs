use std::io::Write;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use pharos_core::Record;
use pharos_core::config::EffectiveConfig;
use tracing::info;

use crate::cmd::{open_session, resolve_issuer};
use crate::output::{OutputMode, pretty_kv, pretty_section, render_mode, write_records_json};

/// Arguments for `pharos compile`.
#[derive(Args, Debug)]
pub struct CompileArgs {
    /// Markdown file to compile.
    pub file: PathBuf,

    /// Issuer identity stamped on every record (overrides the user config).
    #[arg(long)]
    pub issuer: Option<String>,

    /// Sections at or beyond this nesting level are not descended into.
    #[arg(long, value_name = "LEVEL")]
    pub depth_ceiling: Option<u8>,

    /// Also write the record batch as a JSON array to this file.
    #[arg(long, short, value_name = "PATH")]
    pub out: Option<PathBuf>,
}

/// Compile a Markdown file and print the record batch, children first.
///
/// # Errors
///
/// Returns an error if the file cannot be read or parsed, no issuer is
/// configured, compilation fails, or the output cannot be written.
pub fn run_compile(
    args: &CompileArgs,
    config: &EffectiveConfig,
    mode: OutputMode,
    quiet: bool,
) -> Result<()> {
    let issuer = resolve_issuer(args.issuer.as_deref(), &config.user)?;
    let mut session = open_session(&args.file, &config.project.compiler, args.depth_ceiling)?;
    let warnings: Vec<String> = session.warnings().iter().map(ToString::to_string).collect();
    let root_id = session.root_id().to_owned();

    let records = session.get_events(&issuer)?;
    info!(records = records.len(), root = %root_id, "compiled");

    if let Some(path) = &args.out {
        let mut file = std::fs::File::create(path)
            .with_context(|| format!("Failed to create {}", path.display()))?;
        write_records_json(&mut file, records)?;
        file.flush()?;
        info!(path = %path.display(), "record batch written");
    }

    let batch: Vec<&Record> = records.values().collect();
    render_mode(
        mode,
        &batch,
        |batch, w| {
            for record in batch {
                writeln!(w, "{record}")?;
            }
            Ok(())
        },
        |batch, w| {
            pretty_section(w, &format!("Compiled {} records", batch.len()))?;
            pretty_kv(w, "root", &root_id)?;
            pretty_kv(w, "issuer", issuer.as_str())?;
            writeln!(w)?;
            for record in batch {
                let title = record.tag_value("title").unwrap_or("");
                writeln!(
                    w,
                    "{:<7} {:<32} {}  {}",
                    record.kind.as_str(),
                    record.node_id().unwrap_or("-"),
                    record.id.get(..12).unwrap_or(&record.id),
                    title,
                )?;
            }
            if !quiet && !warnings.is_empty() {
                writeln!(w)?;
                pretty_section(w, "Warnings")?;
                for warning in &warnings {
                    writeln!(w, "  {warning}")?;
                }
            }
            Ok(())
        },
    )
}
