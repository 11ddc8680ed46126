//! Answer sheet loading.
//!
//! A sheet is a JSON document with respondent metadata and raw answers:
//!
//! ```json
//! {
//!   "respondent": { "name": "Ana", "grade_label": "7th Grade", "age": 12 },
//!   "answers": [{ "question": 1, "value": 4 }]
//! }
//! ```

use crate::models::AnswerSheet;
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use walkdir::WalkDir;

/// File extension of answer sheets.
pub const SHEET_EXTENSION: &str = "json";

/// A sheet together with the file it came from.
#[derive(Debug, Clone)]
pub struct LoadedSheet {
    pub path: PathBuf,
    pub sheet: AnswerSheet,
}

/// Load a single answer sheet.
pub fn load_sheet(path: &Path) -> Result<AnswerSheet> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read answer sheet: {}", path.display()))?;

    let sheet: AnswerSheet = serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse answer sheet: {}", path.display()))?;

    debug!(
        "Loaded sheet for {} with {} answers",
        sheet.respondent.name,
        sheet.answers.len()
    );

    Ok(sheet)
}

/// Load every `*.json` sheet below `dir`, in file-name order.
///
/// Unreadable entries and invalid sheets are skipped with a warning.
pub fn load_sheets(dir: &Path) -> Result<Vec<LoadedSheet>> {
    if !dir.is_dir() {
        anyhow::bail!("Expected a directory of answer sheets: {}", dir.display());
    }

    let mut sheets = Vec::new();

    for entry in WalkDir::new(dir)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|entry| match entry {
            Ok(v) => Some(v),
            Err(e) => {
                warn!("Skipping unreadable path entry: {}", e);
                None
            }
        })
    {
        let path = entry.path();
        if !entry.file_type().is_file()
            || path.extension().map_or(true, |ext| ext != SHEET_EXTENSION)
        {
            continue;
        }

        match load_sheet(path) {
            Ok(sheet) => sheets.push(LoadedSheet {
                path: path.to_path_buf(),
                sheet,
            }),
            Err(e) => warn!("Skipping invalid answer sheet: {:#}", e),
        }
    }

    debug!("Loaded {} sheets from {}", sheets.len(), dir.display());
    Ok(sheets)
}
