//! Read a series catalog from JSON.
//!
//! The file is an array of `{display_name, provider_id, unit_label}` objects.

use std::collections::HashSet;
use std::fs::File;
use std::path::Path;

use crate::domain::SeriesCatalog;
use crate::error::AppError;

pub fn read_catalog_json(path: &Path) -> Result<SeriesCatalog, AppError> {
    let file = File::open(path)
        .map_err(|e| AppError::config(format!("Failed to open catalog JSON '{}': {e}", path.display())))?;
    let catalog: SeriesCatalog =
        serde_json::from_reader(file).map_err(|e| AppError::config(format!("Invalid catalog JSON: {e}")))?;
    validate_catalog(&catalog)?;
    Ok(catalog)
}

/// Non-empty, with unique display names and provider ids.
pub fn validate_catalog(catalog: &SeriesCatalog) -> Result<(), AppError> {
    if catalog.is_empty() {
        return Err(AppError::config("Catalog has no series."));
    }
    let mut names = HashSet::new();
    let mut ids = HashSet::new();
    for spec in catalog.entries() {
        if spec.display_name.trim().is_empty() || spec.provider_id.trim().is_empty() {
            return Err(AppError::config("Catalog entries need a display_name and provider_id."));
        }
        if !names.insert(spec.display_name.as_str()) {
            return Err(AppError::config(format!("Duplicate catalog series name: {}", spec.display_name)));
        }
        if !ids.insert(spec.provider_id.as_str()) {
            return Err(AppError::config(format!("Duplicate catalog provider id: {}", spec.provider_id)));
        }
    }
    Ok(())
}
