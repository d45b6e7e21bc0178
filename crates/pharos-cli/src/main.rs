#![forbid(unsafe_code)]

mod cmd;
mod markdown;
mod output;

use clap::{CommandFactory, Parser, Subcommand};
use output::{CliError, OutputMode};
use pharos_core::config::resolve_config;
use std::env;
use std::path::PathBuf;
use tracing::{debug, info};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "pharos: compile documents into content-addressed index/zettel records",
    long_about = None
)]
struct Cli {
    /// Enable verbose logging.
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit JSON output instead of human-readable text.
    #[arg(long, global = true)]
    json: bool,

    /// Suppress non-essential output.
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Project config file to use instead of `.pharos/config.toml`.
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    #[command(
        next_help_heading = "Build",
        about = "Compile a Markdown document into records",
        long_about = "Walk a Markdown document, compile one record per node and print the batch children first.",
        after_help = "EXAMPLES:\n    # Compile and print records\n    pharos compile book.md --issuer npub1...\n\n    # Save the batch for publishing\n    pharos compile book.md --out book.json\n\n    # Emit machine-readable output\n    pharos compile book.md --json"
    )]
    Compile(cmd::compile::CompileArgs),

    #[command(
        next_help_heading = "Read",
        about = "Show the node tree of a document",
        long_about = "Walk a Markdown document and show node ids, kinds and nesting without compiling.",
        after_help = "EXAMPLES:\n    # Show the tree\n    pharos inspect book.md\n\n    # Try a shallower ceiling\n    pharos inspect book.md --depth-ceiling 2"
    )]
    Inspect(cmd::inspect::InspectArgs),

    #[command(
        next_help_heading = "Build",
        about = "Verify a compiled record batch",
        long_about = "Recompute every record id and check that each index only references records listed before it.",
        after_help = "EXAMPLES:\n    # Verify a saved batch\n    pharos verify book.json"
    )]
    Verify(cmd::verify::VerifyArgs),

    #[command(
        next_help_heading = "Project Maintenance",
        about = "Generate shell completion scripts",
        long_about = "Generate shell completion scripts for supported shells.",
        after_help = "EXAMPLES:\n    # Generate bash completions\n    pharos completions bash\n\n    # Generate zsh completions\n    pharos completions zsh"
    )]
    Completions(cmd::completions::CompletionsArgs),
}

fn init_tracing(verbose: bool) {
    let filter = EnvFilter::try_from_env("PHAROS_LOG").unwrap_or_else(|_| {
        EnvFilter::new(if verbose || env::var("DEBUG").is_ok() {
            "pharos=debug,info"
        } else {
            "pharos=info,warn"
        })
    });

    let format = env::var("PHAROS_LOG_FORMAT").unwrap_or_else(|_| "compact".to_string());
    let registry = tracing_subscriber::registry().with(filter);
    match format.as_str() {
        "json" => {
            registry
                .with(fmt::layer().json().with_ansi(false).with_writer(std::io::stderr))
                .init();
        }
        _ => {
            registry
                .with(fmt::layer().compact().with_writer(std::io::stderr))
                .init();
        }
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    pharos_core::init();

    if let Commands::Completions(args) = &cli.command {
        let mut command = Cli::command();
        return cmd::completions::run_completions(args.shell, &mut command, &mut std::io::stdout());
    }

    let project_root = env::current_dir()?;
    let config = match resolve_config(&project_root, cli.config.as_deref(), cli.json) {
        Ok(config) => config,
        Err(err) => {
            let mode = if cli.json { OutputMode::Json } else { OutputMode::Text };
            let error = CliError::from_anyhow(&err)
                .with_code(pharos_core::error::ErrorCode::ConfigParseError);
            output::render_error(mode, &error)?;
            std::process::exit(1);
        }
    };
    let output = OutputMode::from_resolved(&config.resolved_output);
    debug!(output = ?output, "config resolved");
    if cli.verbose {
        info!("Verbose mode enabled");
    }

    let command_result = match &cli.command {
        Commands::Compile(args) => cmd::compile::run_compile(args, &config, output, cli.quiet),
        Commands::Inspect(args) => cmd::inspect::run_inspect(args, &config, output),
        Commands::Verify(args) => cmd::verify::run_verify(args, output),
        Commands::Completions(_) => Ok(()),
    };

    if let Err(err) = command_result {
        output::render_error(output, &CliError::from_anyhow(&err))?;
        std::process::exit(1);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn json_flag_parses_before_subcommand() {
        let cli = Cli::parse_from(["pharos", "--json", "compile", "book.md"]);
        assert!(cli.json);
        assert!(matches!(cli.command, Commands::Compile(_)));
    }

    #[test]
    fn json_flag_parses_after_subcommand() {
        let cli = Cli::parse_from(["pharos", "inspect", "book.md", "--json"]);
        assert!(cli.json);
        assert!(matches!(cli.command, Commands::Inspect(_)));
    }

    #[test]
    fn compile_flags_parse() {
        let cli = Cli::parse_from([
            "pharos",
            "compile",
            "book.md",
            "--issuer",
            "pk",
            "--depth-ceiling",
            "3",
            "--out",
            "out.json",
        ]);
        let Commands::Compile(args) = cli.command else {
            panic!("expected compile");
        };
        assert_eq!(args.file, PathBuf::from("book.md"));
        assert_eq!(args.issuer.as_deref(), Some("pk"));
        assert_eq!(args.depth_ceiling, Some(3));
        assert_eq!(args.out, Some(PathBuf::from("out.json")));
    }

    #[test]
    fn config_override_is_global() {
        let cli = Cli::parse_from(["pharos", "verify", "batch.json", "--config", "alt.toml"]);
        assert_eq!(cli.config, Some(PathBuf::from("alt.toml")));
    }

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }
}
