use async_trait::async_trait;
use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};

use crate::{
    database::{ArchiveRepo as _, Database},
    document::{self, archive_path, render_pdf},
    storage::ObjectStorage,
    ExportError,
};

pub const DEFAULT_RETENTION_DAYS: i64 = 365;
pub const BATCH_SIZE: usize = 500;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportReport {
    pub processed: usize,
}

/// Moves old booking archives out of the database into object storage as
/// one pdf document per row.
pub struct ExportJob<D, S> {
    database: D,
    storage: S,
    batch_size: usize,
}

impl<D, S> ExportJob<D, S>
where
    D: Database,
    S: ObjectStorage,
{
    pub fn new(database: D, storage: S) -> Self {
        Self {
            database,
            storage,
            batch_size: BATCH_SIZE.min(D::FETCH_MAX),
        }
    }

    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.min(D::FETCH_MAX);
        self
    }

    pub async fn run(&self, retention_days: i64) -> Result<ExportReport, ExportError> {
        self.run_at(Utc::now(), retention_days).await
    }

    /// Exports a single batch of rows archived more than `retention_days`
    /// before `now`. Stops at the first failing row; rows exported before
    /// the failure stay marked as exported.
    pub async fn run_at(
        &self,
        now: DateTime<Utc>,
        retention_days: i64,
    ) -> Result<ExportReport, ExportError> {
        let cutoff = cutoff(now, retention_days)?;
        let mut database = self.database.auto();

        let archives = database
            .pending_archives(cutoff, self.batch_size)
            .await?;
        log::info!(
            "Exporting {} booking archives older than {}.",
            archives.len(),
            cutoff
        );

        let mut processed = 0;
        for archive in archives {
            let bytes = render_pdf(&archive)?;
            let path = archive_path(&archive);

            self.storage
                .upload(&path, bytes, document::CONTENT_TYPE)
                .await?;
            database
                .mark_exported(archive.id.clone(), &path, Utc::now())
                .await?;

            log::debug!("Exported booking archive {} to '{path}'.", archive.id);
            processed += 1;
        }

        Ok(ExportReport { processed })
    }
}

/// Runs an export on request, hiding the storage and database in use.
#[async_trait]
pub trait ArchiveExporter: Send + Sync {
    async fn export(&self, retention_days: i64) -> Result<ExportReport, ExportError>;
}

#[async_trait]
impl<D, S> ArchiveExporter for ExportJob<D, S>
where
    D: Database,
    S: ObjectStorage,
{
    async fn export(&self, retention_days: i64) -> Result<ExportReport, ExportError> {
        self.run(retention_days).await
    }
}

fn cutoff(now: DateTime<Utc>, retention_days: i64) -> Result<DateTime<Utc>, ExportError> {
    if retention_days < 0 {
        return Err(ExportError::InvalidRetention(retention_days));
    }
    TimeDelta::try_days(retention_days)
        .and_then(|retention| now.checked_sub_signed(retention))
        .ok_or(ExportError::InvalidRetention(retention_days))
}
