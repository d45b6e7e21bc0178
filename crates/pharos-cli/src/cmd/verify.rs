use std::io::Write;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use pharos_core::Record;
use pharos_core::error::read_document;
use pharos_core::event::Nip01Hasher;
use pharos_core::validate::{filter_valid_index_events, verify_batch};
use serde::Serialize;

use crate::output::{OutputMode, pretty_kv, pretty_section, render_mode};

/// Arguments for `pharos verify`.
#[derive(Args, Debug)]
pub struct VerifyArgs {
    /// JSON array of records, as written by `pharos compile --out`.
    pub file: PathBuf,
}

#[derive(Debug, Serialize)]
struct VerifyReport {
    ok: bool,
    records: usize,
    valid_indices: usize,
}

/// Check record ids and child ordering of a compiled batch.
///
/// # Errors
///
/// Returns an error if the file cannot be read or decoded, or if any record
/// fails verification.
pub fn run_verify(args: &VerifyArgs, mode: OutputMode) -> Result<()> {
    let raw = read_document(&args.file)?;
    let records: Vec<Record> = serde_json::from_str(&raw)
        .with_context(|| format!("Failed to decode records from {}", args.file.display()))?;

    verify_batch(&records, &Nip01Hasher).context("verify: failed")?;

    let report = VerifyReport {
        ok: true,
        records: records.len(),
        valid_indices: filter_valid_index_events(&records).len(),
    };
    render_mode(
        mode,
        &report,
        |report, w| writeln!(w, "ok\t{}\t{}", report.records, report.valid_indices),
        |report, w| {
            pretty_section(w, "verify: success")?;
            pretty_kv(w, "records", report.records.to_string())?;
            pretty_kv(w, "indices", report.valid_indices.to_string())
        },
    )
}
