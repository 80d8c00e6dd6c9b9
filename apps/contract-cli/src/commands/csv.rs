use std::fs;
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::Args;
use contract_export::{records_to_csv, table_to_csv, ExportSink};
use serde_json::Value;

use crate::config::Config;

#[derive(Args, Debug)]
pub struct CsvArgs {
    /// JSON input: an array of objects, or `{"headers": [..], "rows": [[..]]}`
    pub input: PathBuf,

    /// Write to this file in the output directory instead of stdout
    #[arg(short, long)]
    pub name: Option<String>,

    /// Output directory, overrides `[output] dir`
    #[arg(short, long)]
    pub output_dir: Option<PathBuf>,
}

pub fn csv(args: CsvArgs, config: &Config) -> Result<()> {
    let json = fs::read_to_string(&args.input)
        .with_context(|| format!("Failed to read {}", args.input.display()))?;
    let value: Value = serde_json::from_str(&json)
        .with_context(|| format!("Invalid JSON in {}", args.input.display()))?;
    let csv = to_csv(value)?;

    match &args.name {
        Some(name) => {
            let dir = args.output_dir.clone().unwrap_or_else(|| config.output.dir.clone());
            let path = ExportSink::new(dir).write(name, csv.as_bytes())?;
            println!("{}", path.display());
        }
        None => println!("{}", csv),
    }
    Ok(())
}

#[derive(serde::Deserialize)]
struct Table {
    #[serde(default)]
    headers: Vec<String>,
    #[serde(default)]
    rows: Vec<Vec<Value>>,
}

fn to_csv(value: Value) -> Result<String> {
    match value {
        Value::Array(items) => {
            let records = items
                .into_iter()
                .map(|item| match item {
                    Value::Object(map) => Ok(map),
                    other => bail!("Expected an object per record, found {}", other),
                })
                .collect::<Result<Vec<_>>>()?;
            Ok(records_to_csv(&records))
        }
        Value::Object(_) => {
            let table: Table = serde_json::from_value(value).context("Invalid table shape")?;
            Ok(table_to_csv(&table.headers, &table.rows))
        }
        other => bail!("Expected an array or a table object, found {}", other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_records() {
        let csv = to_csv(json!([
            {"vendor": "Acme", "value": 10},
            {"vendor": "Globex", "risk": "High"}
        ]))
        .unwrap();
        assert_eq!(csv, "vendor,value,risk\nAcme,10,\nGlobex,,High");
    }

    #[test]
    fn test_table() {
        let csv = to_csv(json!({"headers": ["Name", "Note"], "rows": [["A", "x, y"]]})).unwrap();
        assert_eq!(csv, "Name,Note\nA,\"x, y\"");
    }

    #[test]
    fn test_rejected_shapes() {
        assert!(to_csv(json!([1, 2])).is_err());
        assert!(to_csv(json!("text")).is_err());
        assert!(to_csv(json!({"headers": "Name"})).is_err());
    }
}
