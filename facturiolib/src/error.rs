//! Единый тип ошибок публичного API.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum FacturioError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Data load error: {0}")]
    DataLoad(String),

    #[error("Missing field `{field}` in row {row}")]
    MissingField { field: String, row: usize },

    #[error("Message template error: {0}")]
    TemplateFormat(String),

    #[error("Document template error: {0}")]
    TemplateRender(String),

    #[error("Export of {} failed: {reason}", .path.display())]
    DocumentExport { path: PathBuf, reason: String },

    #[error("Config error: {0}")]
    Config(String),

    #[error("Duplicate output file {0} (rows {1} and {2})")]
    DuplicateFilename(String, usize, usize),
}

impl FacturioError {
    pub(crate) fn export(path: impl Into<PathBuf>, reason: impl ToString) -> Self {
        FacturioError::DocumentExport {
            path: path.into(),
            reason: reason.to_string(),
        }
    }
}

/// Ошибки разбора таблицы — это ошибки загрузки данных.
impl From<csv::Error> for FacturioError {
    fn from(e: csv::Error) -> Self {
        FacturioError::DataLoad(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, FacturioError>;
