use std::{error, fmt};

pub mod database;
pub mod document;
pub mod job;
pub mod storage;

pub use job::{ArchiveExporter, ExportJob, ExportReport, DEFAULT_RETENTION_DAYS};

#[derive(Debug)]
pub enum ExportError {
    InvalidRetention(i64),
    Database(database::DatabaseError),
    Storage(storage::StorageError),
    Document(printpdf::Error),
}

impl error::Error for ExportError {}

impl fmt::Display for ExportError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ExportError::InvalidRetention(days) => {
                write!(f, "Invalid retention period: {} days", days)
            }
            ExportError::Database(e) => write!(f, "Database error: {}", e),
            ExportError::Storage(e) => write!(f, "Storage error: {}", e),
            ExportError::Document(e) => write!(f, "Document error: {}", e),
        }
    }
}

impl From<database::DatabaseError> for ExportError {
    fn from(e: database::DatabaseError) -> Self {
        ExportError::Database(e)
    }
}

impl From<storage::StorageError> for ExportError {
    fn from(e: storage::StorageError) -> Self {
        ExportError::Storage(e)
    }
}

impl From<printpdf::Error> for ExportError {
    fn from(e: printpdf::Error) -> Self {
        ExportError::Document(e)
    }
}
