use archive_export::database::{DatabaseError, Result};
use chrono::{DateTime, Utc};
use model::archive::BookingArchive;
use sqlx::{Executor, Postgres};
use utility::id::Id;

use crate::data_model::booking_archive::BookingArchiveRow;

use super::convert_error;

// The table is owned by the admin app, so every column is cast to the type
// the row struct expects.
pub async fn get_pending<'c, E>(
    executor: E,
    cutoff: DateTime<Utc>,
    limit: usize,
) -> Result<Vec<BookingArchive>>
where
    E: Executor<'c, Database = Postgres>,
{
    let limit = i64::try_from(limit).map_err(|why| DatabaseError::Other(Box::new(why)))?;
    let rows: Vec<BookingArchiveRow> = sqlx::query_as(
        "
        SELECT
            booking_archives_id::int8 AS booking_archives_id,
            booking_id::int8 AS booking_id,
            driver_id::int8 AS driver_id,
            passenger_id::text AS passenger_id,
            route_id::int8 AS route_id,
            payment_method::text AS payment_method,
            fare::float8 AS fare,
            seat_type::text AS seat_type,
            ride_status::text AS ride_status,
            pickup_address::text AS pickup_address,
            pickup_lat::float8 AS pickup_lat,
            pickup_lang::float8 AS pickup_lang,
            dropoff_address::text AS dropoff_address,
            dropoff_lat::float8 AS dropoff_lat,
            dropoff_lang::float8 AS dropoff_lang,
            start_time::timestamptz AS start_time,
            end_time::timestamptz AS end_time,
            assigned_at::timestamptz AS assigned_at,
            archived_at::timestamptz AS archived_at,
            pdf_path::text AS pdf_path,
            exported_at::timestamptz AS exported_at
        FROM
            booking_archives
        WHERE
            archived_at < $1 AND exported_at IS NULL
        ORDER BY
            archived_at ASC
        LIMIT $2;
        ",
    )
    .bind(cutoff)
    .bind(limit)
    .fetch_all(executor)
    .await
    .map_err(convert_error)?;

    Ok(rows.into_iter().map(BookingArchiveRow::to_model).collect())
}

pub async fn mark_exported<'c, E>(
    executor: E,
    id: Id<BookingArchive>,
    pdf_path: &str,
    exported_at: DateTime<Utc>,
) -> Result<()>
where
    E: Executor<'c, Database = Postgres>,
{
    let result = sqlx::query(
        "
        UPDATE
            booking_archives
        SET
            pdf_path = $2,
            exported_at = $3
        WHERE
            booking_archives_id = $1;
        ",
    )
    .bind(id.raw())
    .bind(pdf_path)
    .bind(exported_at)
    .execute(executor)
    .await
    .map_err(convert_error)?;

    if result.rows_affected() == 0 {
        return Err(DatabaseError::NotFound);
    }
    Ok(())
}
