use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Args, ValueEnum};
use contract_export::{compose_pdf_from_pngs, ExportSink, FitMode};

use crate::config::Config;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Fit {
    /// Whole image on one page, 10 mm from the top
    Page,
    /// Page width; tall images continue on following pages
    Width,
}

impl From<Fit> for FitMode {
    fn from(fit: Fit) -> Self {
        match fit {
            Fit::Page => FitMode::FitPage,
            Fit::Width => FitMode::FitWidth,
        }
    }
}

#[derive(Args, Debug)]
pub struct ComposeArgs {
    /// PNG images, each starting on a new page
    #[arg(required = true)]
    pub images: Vec<PathBuf>,

    #[arg(long, value_enum, default_value = "page")]
    pub fit: Fit,

    /// Output file name
    #[arg(short, long, default_value = "snapshot.pdf")]
    pub name: String,

    /// Output directory, overrides `[output] dir`
    #[arg(short, long)]
    pub output_dir: Option<PathBuf>,

    /// `A4` or `Letter`, overrides `[render] page_size`
    #[arg(long)]
    pub page_size: Option<String>,

    /// Landscape pages, overrides `[render] orientation`
    #[arg(long)]
    pub landscape: bool,
}

/// Place PNG snapshots on PDF pages
pub fn compose(args: ComposeArgs, config: &Config) -> Result<()> {
    let images = args
        .images
        .iter()
        .map(|path| fs::read(path).with_context(|| format!("Failed to read {}", path.display())))
        .collect::<Result<Vec<_>>>()?;

    let mut render = config.render.clone();
    if let Some(page_size) = args.page_size {
        render.page_size = page_size;
    }
    if args.landscape {
        render.orientation = "landscape".to_string();
    }

    let pdf = compose_pdf_from_pngs(&images, &render.compose_options(args.fit.into()))?;
    let dir = args.output_dir.unwrap_or_else(|| config.output.dir.clone());
    let path = ExportSink::new(dir).write(&args.name, &pdf)?;
    println!("{}", path.display());
    Ok(())
}
