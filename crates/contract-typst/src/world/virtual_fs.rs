//! In-memory file tree for one compilation
//!
//! Holds `main.typ` plus any mounted assets (logos). Nothing here touches
//! the real filesystem.

use std::collections::HashMap;

use typst::foundations::Bytes;
use typst::syntax::{FileId, Source, VirtualPath};

use crate::compiler::errors::EngineError;

pub const MAIN_PATH: &str = "/main.typ";

#[derive(Debug, Default)]
pub struct VirtualFilesystem {
    files: HashMap<FileId, Bytes>,
    paths: HashMap<String, FileId>,
}

impl VirtualFilesystem {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mount the entry point and return its id
    pub fn mount_main(&mut self, source: String) -> FileId {
        self.insert(MAIN_PATH.to_string(), Bytes::from(source.into_bytes()))
    }

    /// Mount an asset under a relative or rooted virtual path
    pub fn mount_file(&mut self, path: &str, content: Bytes) -> Result<FileId, EngineError> {
        validate_path(path)?;
        Ok(self.insert(normalize_path(path), content))
    }

    fn insert(&mut self, path: String, content: Bytes) -> FileId {
        let id = FileId::new(None, VirtualPath::new(&path));
        self.files.insert(id, content);
        self.paths.insert(path, id);
        id
    }

    /// Source text of a mounted `.typ` file
    pub fn source(&self, id: FileId) -> Option<Source> {
        let bytes = self.files.get(&id)?;
        let text = std::str::from_utf8(bytes).ok()?;
        Some(Source::new(id, text.to_string()))
    }

    pub fn file(&self, id: FileId) -> Option<&Bytes> {
        self.files.get(&id)
    }

    pub fn lookup(&self, path: &str) -> Option<FileId> {
        self.paths.get(&normalize_path(path)).copied()
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}

fn validate_path(path: &str) -> Result<(), EngineError> {
    if path.split(['/', '\\']).any(|segment| segment == "..") {
        return Err(EngineError::PathSecurity(format!(
            "path traversal in '{}'",
            path
        )));
    }
    // Windows drive letters and UNC paths
    if path.contains(':') || path.starts_with("\\\\") {
        return Err(EngineError::PathSecurity(format!(
            "host path '{}' is not a virtual path",
            path
        )));
    }
    if path.trim_matches('/').is_empty() {
        return Err(EngineError::PathSecurity("empty asset path".to_string()));
    }
    Ok(())
}

fn normalize_path(path: &str) -> String {
    let segments: Vec<&str> = path
        .split(['/', '\\'])
        .filter(|s| !s.is_empty() && *s != ".")
        .collect();
    format!("/{}", segments.join("/"))
}
