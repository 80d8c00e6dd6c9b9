//! contractgen
//!
//! Command-line front end for the contract generator: create documents
//! from templates, preview, check, and export them.

mod commands;
mod config;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use commands::{
    CheckArgs, ClausesArgs, ComposeArgs, CsvArgs, DraftArgs, ExportArgs, NewArgs, PreviewArgs,
    PrintArgs, TemplatesArgs,
};
use config::Config;

#[derive(Parser, Debug)]
#[command(name = "contractgen")]
#[command(version, about = "Compose contracts from typed blocks and export them")]
struct Cli {
    /// TOML configuration file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Create a document, optionally from a template
    New(NewArgs),

    /// List the built-in templates
    Templates(TemplatesArgs),

    /// Search the clause library or insert a clause into a document
    Clauses(ClausesArgs),

    /// Print the preview markup
    Preview(PreviewArgs),

    /// Export to PDF, HTML, DOCX or PNG
    Export(ExportArgs),

    /// Open the print view in the system viewer
    Print(PrintArgs),

    /// Run the completeness checks
    Check(CheckArgs),

    /// Print the contract-record payload
    Draft(DraftArgs),

    /// Write tabular JSON data as CSV
    Csv(CsvArgs),

    /// Place PNG snapshots on PDF pages
    Compose(ComposeArgs),
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();
    let config = Config::load(cli.config.as_deref())?;

    // stdout carries command output, logs go to stderr
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&config.logging.level)),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    tracing::debug!("contractgen v{}", env!("CARGO_PKG_VERSION"));

    match cli.command {
        Command::New(args) => commands::new(args)?,
        Command::Templates(args) => commands::templates(args)?,
        Command::Clauses(args) => commands::clauses(args)?,
        Command::Preview(args) => commands::preview(args)?,
        Command::Export(args) => commands::export(args, &config).await?,
        Command::Print(args) => commands::print(args)?,
        Command::Check(args) => {
            if !commands::check(args)? {
                return Ok(ExitCode::FAILURE);
            }
        }
        Command::Draft(args) => commands::draft(args)?,
        Command::Csv(args) => commands::csv(args, &config)?,
        Command::Compose(args) => commands::compose(args, &config)?,
    }

    Ok(ExitCode::SUCCESS)
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;
    use contract_export::ExportFormat;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_export_flags() {
        let cli = Cli::try_parse_from([
            "contractgen",
            "--config",
            "contractgen.toml",
            "export",
            "nda.json",
            "--format",
            "docx",
            "--ppi",
            "72",
        ])
        .unwrap();

        assert_eq!(cli.config, Some(PathBuf::from("contractgen.toml")));
        match cli.command {
            Command::Export(args) => {
                assert_eq!(args.format, ExportFormat::Docx);
                assert_eq!(args.ppi, Some(72));
                assert!(!args.all);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_export_all_conflicts_with_name() {
        let result = Cli::try_parse_from([
            "contractgen",
            "export",
            "nda.json",
            "--all",
            "--name",
            "x.pdf",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_unknown_format_rejected() {
        let result = Cli::try_parse_from(["contractgen", "export", "nda.json", "--format", "rtf"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_insert_requires_target() {
        let result = Cli::try_parse_from(["contractgen", "clauses", "--insert", "1"]);
        assert!(result.is_err());
    }
}
