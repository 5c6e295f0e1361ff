use std::fs;
use std::path::Path;

use anyhow::{bail, Context, Result};

use crate::tree::TaxonomyRecord;

/// Load and parse a taxonomy document. Optional fields may be absent; an
/// empty file is an error rather than an empty tree.
pub fn load_document(path: &Path) -> Result<TaxonomyRecord> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("failed to read taxonomy document: {}", path.display()))?;

    if raw.trim().is_empty() {
        bail!("taxonomy document is empty: {}", path.display());
    }

    let record: TaxonomyRecord = serde_json::from_str(&raw)
        .with_context(|| format!("failed to parse taxonomy document: {}", path.display()))?;

    Ok(record)
}
