// Bank statement import placeholder
//
// The picker only records which file was chosen; parsing statements is not
// available yet.

use std::path::Path;
use tracing::info;

pub const UNAVAILABLE_MESSAGE: &str = "CSV import is not available yet";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatementSelection {
    pub file_name: String,
    pub message: &'static str,
}

/// Record the chosen statement file; nothing is read or stored
pub fn select_statement(path: &Path) -> StatementSelection {
    let file_name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());

    info!(file = %file_name, "statement selected for import");

    StatementSelection {
        file_name,
        message: UNAVAILABLE_MESSAGE,
    }
}
