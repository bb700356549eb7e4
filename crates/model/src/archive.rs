use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utility::id::{HasId, Id};

/// The booking an archive row was created from.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Booking;

impl HasId for Booking {
    type IdType = i64;
}

/// A completed booking moved into the archive table.
#[serde_with::skip_serializing_none]
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingArchive {
    pub id: Id<BookingArchive>,
    pub booking_id: Id<Booking>,
    pub driver_id: Option<i64>,
    pub passenger_id: Option<String>,
    pub route_id: i64,
    pub payment_method: Option<String>,
    pub fare: Option<f64>,
    pub seat_type: Option<String>,
    pub ride_status: Option<String>,
    pub pickup: Place,
    pub dropoff: Place,
    pub start_time: Option<DateTime<Utc>>,
    pub end_time: Option<DateTime<Utc>>,
    pub assigned_at: Option<DateTime<Utc>>,
    pub archived_at: DateTime<Utc>,
    pub pdf_path: Option<String>,
    pub exported_at: Option<DateTime<Utc>>,
}

impl HasId for BookingArchive {
    type IdType = i64;
}

impl BookingArchive {
    pub fn is_exported(&self) -> bool {
        self.exported_at.is_some()
    }
}

/// A pickup or dropoff location. Every part may be missing in old rows.
#[serde_with::skip_serializing_none]
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Place {
    pub address: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}
