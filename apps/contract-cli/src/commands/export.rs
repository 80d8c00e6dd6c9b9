use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::Args;
use contract_export::{export_raster_pdf, export_tree_async, ExportFormat, ExportSink};
use contract_generator::{check_compliance, is_exportable};
use contract_model::IssueSeverity;

use super::{build_tree, load_context, load_document};
use crate::config::Config;

#[derive(Args, Debug)]
pub struct ExportArgs {
    /// Contract document JSON
    pub document: PathBuf,

    /// Output format (pdf, html, docx, png)
    #[arg(short, long, default_value = "pdf", conflicts_with = "all")]
    pub format: ExportFormat,

    /// Write every format
    #[arg(long)]
    pub all: bool,

    /// Output directory, overrides `[output] dir`
    #[arg(short, long)]
    pub output_dir: Option<PathBuf>,

    /// File name, overrides the configured name for the format
    #[arg(short, long, conflicts_with = "all")]
    pub name: Option<String>,

    /// JSON object of merge-field values for conditional blocks
    #[arg(long)]
    pub context: Option<PathBuf>,

    /// PDF pages as images instead of selectable text
    #[arg(long)]
    pub raster: bool,

    /// Refuse to export when the compliance check reports errors
    #[arg(long)]
    pub strict: bool,

    /// PNG density, overrides `[render] ppi`
    #[arg(long)]
    pub ppi: Option<u32>,

    /// Compilation bound, overrides `[render] timeout_ms`
    #[arg(long)]
    pub timeout_ms: Option<u64>,
}

pub async fn export(args: ExportArgs, config: &Config) -> Result<()> {
    let document = load_document(&args.document)?;
    let context = load_context(args.context.as_deref())?;

    let issues = check_compliance(&document.blocks, &document.metadata);
    for issue in issues.iter().filter(|i| i.severity == IssueSeverity::Error) {
        tracing::warn!("Compliance: {}", issue.message);
    }
    if args.strict && !is_exportable(&issues) {
        bail!("Document has compliance errors; run `contractgen check` for details");
    }

    let mut render = config.render.clone();
    if let Some(ppi) = args.ppi {
        render.ppi = ppi;
    }
    if let Some(timeout_ms) = args.timeout_ms {
        render.timeout_ms = timeout_ms;
    }
    let options = render.render_options();

    let sink = ExportSink::new(args.output_dir.unwrap_or_else(|| config.output.dir.clone()));
    let tree = build_tree(&document, &context);
    let formats: Vec<ExportFormat> = if args.all {
        ExportFormat::ALL.to_vec()
    } else {
        vec![args.format]
    };

    for format in formats {
        let bytes = if args.raster && format == ExportFormat::Pdf {
            let tree = tree.clone();
            tokio::task::spawn_blocking(move || export_raster_pdf(&tree, &options))
                .await
                .context("Raster export task failed")??
        } else {
            export_tree_async(&tree, format, &options).await?
        };

        let name = args
            .name
            .as_deref()
            .unwrap_or_else(|| config.output.file_name(format));
        let path = sink
            .write(name, &bytes)
            .with_context(|| format!("Failed to write {} export", format))?;
        println!("{}", path.display());
    }

    Ok(())
}
