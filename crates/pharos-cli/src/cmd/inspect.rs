use std::io::Write;
use std::path::PathBuf;

use anyhow::Result;
use clap::Args;
use pharos_core::config::EffectiveConfig;
use pharos_core::{Kind, Session};
use serde::Serialize;

use crate::cmd::open_session;
use crate::output::{OutputMode, pretty_kv, pretty_section, render_mode};

/// Arguments for `pharos inspect`.
#[derive(Args, Debug)]
pub struct InspectArgs {
    /// Markdown file to walk.
    pub file: PathBuf,

    /// Sections at or beyond this nesting level are not descended into.
    #[arg(long, value_name = "LEVEL")]
    pub depth_ceiling: Option<u8>,
}

/// Walk result without compiling: ids, kinds and tree shape.
#[derive(Debug, Serialize)]
pub struct InspectReport {
    pub root: String,
    pub depth_ceiling: u8,
    pub nodes: Vec<NodeRow>,
    pub truncated: Vec<String>,
    pub warnings: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct NodeRow {
    pub id: String,
    pub kind: &'static str,
    pub depth: usize,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<String>,
}

impl InspectReport {
    /// Depth-first listing of every node reachable from the root.
    pub fn from_session(session: &Session) -> Self {
        let mut nodes = Vec::new();
        let mut stack = vec![(session.root_id().to_owned(), 0_usize)];

        while let Some((id, depth)) = stack.pop() {
            let children: Vec<String> = session
                .children_of(&id)
                .map(|set| set.iter().cloned().collect())
                .unwrap_or_default();
            stack.extend(children.iter().rev().map(|child| (child.clone(), depth + 1)));
            let kind = session.kind_of(&id).map_or("unknown", Kind::as_str);
            nodes.push(NodeRow {
                id,
                kind,
                depth,
                children,
            });
        }

        Self {
            root: session.root_id().to_owned(),
            depth_ceiling: session.config().depth_ceiling,
            nodes,
            truncated: session.truncated().to_vec(),
            warnings: session.warnings().iter().map(ToString::to_string).collect(),
        }
    }
}

/// Walk a Markdown file and print its node tree.
///
/// # Errors
///
/// Returns an error if the file cannot be read or parsed, or output fails.
pub fn run_inspect(args: &InspectArgs, config: &EffectiveConfig, mode: OutputMode) -> Result<()> {
    let session = open_session(&args.file, &config.project.compiler, args.depth_ceiling)?;
    let report = InspectReport::from_session(&session);

    render_mode(
        mode,
        &report,
        |report, w| {
            for node in &report.nodes {
                writeln!(w, "{}\t{}\t{}", node.depth, node.kind, node.id)?;
            }
            Ok(())
        },
        |report, w| {
            pretty_section(w, "Document graph")?;
            pretty_kv(w, "root", &report.root)?;
            pretty_kv(w, "nodes", report.nodes.len().to_string())?;
            pretty_kv(w, "ceiling", report.depth_ceiling.to_string())?;
            writeln!(w)?;
            for node in &report.nodes {
                let marker = if report.truncated.contains(&node.id) {
                    " (truncated)"
                } else {
                    ""
                };
                writeln!(
                    w,
                    "{:indent$}{} [{}]{marker}",
                    "",
                    node.id,
                    node.kind,
                    indent = node.depth * 2
                )?;
            }
            if !report.warnings.is_empty() {
                writeln!(w)?;
                pretty_section(w, "Warnings")?;
                for warning in &report.warnings {
                    writeln!(w, "  {warning}")?;
                }
            }
            Ok(())
        },
    )
}
