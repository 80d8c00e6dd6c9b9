//! End-to-end: edit a document in the store, then run every exporter

use contract_export::{
    compose_pdf_from_png, export, export_async, records_to_csv, table_to_csv, ComposeOptions,
    ExportFormat, ExportSink, FitMode, RenderOptions,
};
use contract_generator::{find_template, ClauseLibrary, DocumentStore};
use contract_model::{
    BlockType, BrandingPatch, ContractDocument, CustomizationPatch, FeaturesPatch, MetadataPatch,
};
use lopdf::Document;
use pretty_assertions::assert_eq;
use serde_json::{json, Map, Value};

const PIXEL_PNG: &str = "iVBORw0KGgoAAAANSUhEUgAAAAEAAAABCAYAAAAfFcSJAAAADUlEQVR42mNkYPhfDwAChwGA60e6kgAAAABJRU5ErkJggg==";

fn edited_document() -> ContractDocument {
    let mut store = DocumentStore::new();
    let template = find_template("nda").expect("nda template");
    store.apply_template(&template);

    let library = ClauseLibrary::new();
    let clause = library.get("2").expect("seeded clause");
    store.insert_clause(clause);

    let list = store.add_block(BlockType::List);
    store.add_list_item(&list, "Source code");
    store.add_list_item(&list, "Customer data, including \"PII\"");
    store.add_block(BlockType::Signature);
    store.add_block(BlockType::Divider);

    store.update_metadata(MetadataPatch {
        party_a: Some("Acme Corp".into()),
        party_b: Some("Globex <LLC>".into()),
        effective_date: Some("2024-01-05".into()),
        contract_value: Some(12500.0),
        ..MetadataPatch::default()
    });
    store.update_customization(CustomizationPatch {
        branding: Some(BrandingPatch {
            company_name: Some("Acme Corp".into()),
            logo: Some(format!("data:image/png;base64,{}", PIXEL_PNG)),
            phone: Some("555-0100".into()),
            ..BrandingPatch::default()
        }),
        features: Some(FeaturesPatch {
            show_watermark: Some(true),
            show_line_numbers: Some(true),
            ..FeaturesPatch::default()
        }),
        ..CustomizationPatch::default()
    });

    store.to_document()
}

fn fast_options() -> RenderOptions {
    RenderOptions {
        ppi: 36,
        ..RenderOptions::default()
    }
}

#[test]
fn test_pdf_export_parses() {
    let pdf = export(&edited_document(), ExportFormat::Pdf, &fast_options()).unwrap();

    let doc = Document::load_mem(&pdf).unwrap();
    assert!(!doc.get_pages().is_empty());
}

#[test]
fn test_html_export_is_standalone() {
    let bytes = export(&edited_document(), ExportFormat::Html, &fast_options()).unwrap();
    let html = String::from_utf8(bytes).unwrap();

    assert!(html.starts_with("<!DOCTYPE html>"));
    assert!(html.contains("Acme Corp and Globex &lt;LLC&gt;"));
    assert!(html.contains("January 5, 2024"));
    assert!(html.contains("$12,500.00"));
    assert!(html.contains("Customer data, including \"PII\""));
    assert!(html.contains("data:image/png;base64,"));
    assert!(html.contains("DRAFT"));
}

#[test]
fn test_docx_export_is_word_package() {
    let bytes = export(&edited_document(), ExportFormat::Docx, &fast_options()).unwrap();

    assert!(bytes.starts_with(b"PK"));
    assert!(bytes
        .windows("word/document.xml".len())
        .any(|w| w == b"word/document.xml"));
}

#[test]
fn test_png_export() {
    let bytes = export(&edited_document(), ExportFormat::Png, &fast_options()).unwrap();
    assert!(bytes.starts_with(&[0x89, b'P', b'N', b'G']));
}

#[tokio::test]
async fn test_async_pdf_export() {
    let pdf = export_async(&edited_document(), ExportFormat::Pdf, &fast_options())
        .await
        .unwrap();
    assert!(Document::load_mem(&pdf).is_ok());
}

#[test]
fn test_round_tripped_json_exports_identically() {
    let document = edited_document();
    let json = document.to_json_pretty().unwrap();
    let restored = ContractDocument::from_json(&json).unwrap();

    let a = export(&document, ExportFormat::Html, &fast_options()).unwrap();
    let b = export(&restored, ExportFormat::Html, &fast_options()).unwrap();
    assert_eq!(a, b);
}

#[test]
fn test_snapshot_png_to_pdf() {
    let png = export(&edited_document(), ExportFormat::Png, &fast_options()).unwrap();
    let pdf = compose_pdf_from_png(
        &png,
        &ComposeOptions {
            mode: FitMode::FitPage,
            ..ComposeOptions::default()
        },
    )
    .unwrap();

    assert_eq!(Document::load_mem(&pdf).unwrap().get_pages().len(), 1);
}

#[test]
fn test_csv_helpers() {
    let records: Vec<Map<String, Value>> = vec![json!({"metric": "Total", "value": 12})
        .as_object()
        .cloned()
        .unwrap()];
    assert_eq!(records_to_csv(&records), "metric,value\nTotal,12");

    let table = table_to_csv(&["a".into()], &[vec![json!("a,b")]]);
    assert_eq!(table, "a\n\"a,b\"");
}

#[test]
fn test_sink_writes_every_format() {
    let dir = tempfile::tempdir().unwrap();
    let sink = ExportSink::new(dir.path());
    let document = edited_document();

    for format in [ExportFormat::Html, ExportFormat::Docx] {
        let path = sink
            .write_with(format.default_file_name(), || {
                export(&document, format, &fast_options())
            })
            .unwrap();
        assert!(path.exists());
    }

    let mut names: Vec<String> = std::fs::read_dir(dir.path())
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    assert_eq!(names, vec!["contract.docx", "contract.html"]);
}
