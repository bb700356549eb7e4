use std::{error, fmt, result};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use model::archive::BookingArchive;
use utility::id::Id;

#[derive(Debug)]
pub enum DatabaseError {
    NotFound,
    Other(Box<dyn error::Error + Send + Sync>),
}

impl error::Error for DatabaseError {}

impl fmt::Display for DatabaseError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            DatabaseError::NotFound => write!(f, "The requested row does not exist."),
            DatabaseError::Other(why) => write!(f, "{}", why),
        }
    }
}

pub type Result<T> = result::Result<T, DatabaseError>;

/// Access to the `booking_archives` table.
#[async_trait]
pub trait ArchiveRepo {
    /// Rows archived before `cutoff` which have not been exported yet,
    /// at most `limit` of them.
    async fn pending_archives(
        &mut self,
        cutoff: DateTime<Utc>,
        limit: usize,
    ) -> Result<Vec<BookingArchive>>;

    async fn mark_exported(
        &mut self,
        id: Id<BookingArchive>,
        pdf_path: &str,
        exported_at: DateTime<Utc>,
    ) -> Result<()>;
}

pub trait Database: Clone + Send + Sync + 'static {
    type Autocommit: ArchiveRepo + Send;

    /// The maximum number of rows fetched by a single query.
    const FETCH_MAX: usize;

    fn auto(&self) -> Self::Autocommit;
}
