//! TOML configuration for `contractgen`
//!
//! Every field has a default, so a missing file, an empty file and a file
//! with only some sections are all valid. Command-line flags are applied on
//! top of the loaded values by the individual commands.

use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use anyhow::Context;
use contract_export::{ComposeOptions, ExportFormat, FitMode, RenderOptions};
use contract_generator::render::PageSize;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub output: OutputConfig,
    pub render: RenderConfig,
    pub logging: LoggingConfig,
}

/// Where exported files land and what they are called
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub dir: PathBuf,
    pub pdf_name: String,
    pub html_name: String,
    pub docx_name: String,
    pub png_name: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("."),
            pdf_name: ExportFormat::Pdf.default_file_name().to_string(),
            html_name: ExportFormat::Html.default_file_name().to_string(),
            docx_name: ExportFormat::Docx.default_file_name().to_string(),
            png_name: ExportFormat::Png.default_file_name().to_string(),
        }
    }
}

impl OutputConfig {
    pub fn file_name(&self, format: ExportFormat) -> &str {
        match format {
            ExportFormat::Pdf => &self.pdf_name,
            ExportFormat::Html => &self.html_name,
            ExportFormat::Docx => &self.docx_name,
            ExportFormat::Png => &self.png_name,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    /// PNG raster density
    pub ppi: u32,
    /// Bound on one Typst compilation
    pub timeout_ms: u64,
    /// Page size for image to PDF composition (`A4` or `Letter`)
    pub page_size: String,
    /// `portrait` or `landscape`
    pub orientation: String,
}

impl Default for RenderConfig {
    fn default() -> Self {
        let defaults = RenderOptions::default();
        Self {
            ppi: defaults.ppi,
            timeout_ms: defaults.timeout_ms,
            page_size: "A4".to_string(),
            orientation: "portrait".to_string(),
        }
    }
}

impl RenderConfig {
    pub fn render_options(&self) -> RenderOptions {
        RenderOptions {
            ppi: self.ppi.max(1),
            timeout_ms: self.timeout_ms,
        }
    }

    pub fn compose_options(&self, mode: FitMode) -> ComposeOptions {
        ComposeOptions {
            page_size: PageSize::from_name(&self.page_size),
            landscape: self.orientation.eq_ignore_ascii_case("landscape"),
            mode,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default filter directive when `RUST_LOG` is unset
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

impl Config {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        content
            .parse()
            .with_context(|| format!("Invalid config file: {}", path.display()))
    }

    /// The file at `path` when given, defaults otherwise
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        match path {
            Some(path) => Self::from_file(path),
            None => Ok(Self::default()),
        }
    }
}

impl FromStr for Config {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        toml::from_str(s).context("Failed to parse TOML configuration")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_empty_file_is_defaults() {
        let config: Config = "".parse().unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.render.ppi, 144);
        assert_eq!(config.render.timeout_ms, 10_000);
        assert_eq!(config.output.pdf_name, "contract.pdf");
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_partial_sections() {
        let config: Config = r#"
            [output]
            dir = "out"
            pdf_name = "nda.pdf"

            [render]
            ppi = 72
            orientation = "landscape"
        "#
        .parse()
        .unwrap();

        assert_eq!(config.output.dir, PathBuf::from("out"));
        assert_eq!(config.output.file_name(ExportFormat::Pdf), "nda.pdf");
        assert_eq!(config.output.file_name(ExportFormat::Html), "contract.html");
        assert_eq!(config.render.ppi, 72);
        assert_eq!(config.render.timeout_ms, 10_000);

        let compose = config.render.compose_options(FitMode::FitPage);
        assert!(compose.landscape);
        assert_eq!(compose.page_size, PageSize::A4);
    }

    #[test]
    fn test_zero_ppi_is_clamped() {
        let config: Config = "[render]\nppi = 0".parse().unwrap();
        assert_eq!(config.render.render_options().ppi, 1);
    }

    #[test]
    fn test_malformed_toml_is_an_error() {
        assert!("[render\nppi = 1".parse::<Config>().is_err());
        assert!("[render]\nppi = \"many\"".parse::<Config>().is_err());
    }

    #[test]
    fn test_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("contractgen.toml");
        fs::write(&path, "[logging]\nlevel = \"debug\"").unwrap();

        let config = Config::load(Some(&path)).unwrap();
        assert_eq!(config.logging.level, "debug");

        let missing = Config::from_file(dir.path().join("missing.toml"));
        assert!(missing.is_err());
    }
}
