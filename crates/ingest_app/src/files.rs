use std::fs;
use std::path::Path;

use anyhow::{bail, Context};
use ingest_core::FileDescriptor;

/// Builds a submission from a file on disk. Only metadata is read.
pub fn describe(path: &Path) -> anyhow::Result<FileDescriptor> {
    let meta = fs::metadata(path).with_context(|| format!("cannot stat {}", path.display()))?;
    if !meta.is_file() {
        bail!("{} is not a regular file", path.display());
    }
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .with_context(|| format!("{} has no file name", path.display()))?;
    let mime = mime_hint(&name);
    Ok(FileDescriptor::new(name, meta.len(), mime))
}

pub fn mime_hint(name: &str) -> &'static str {
    let ext = name
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .unwrap_or_default();
    match ext.as_str() {
        "csv" => "text/csv",
        "tsv" => "text/tab-separated-values",
        "xlsx" => "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
        "xls" => "application/vnd.ms-excel",
        "json" => "application/json",
        _ => "application/octet-stream",
    }
}
