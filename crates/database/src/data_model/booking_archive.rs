use chrono::{DateTime, Utc};
use model::archive::{BookingArchive, Place};
use sqlx::prelude::FromRow;
use utility::id::Id;

/// The columns of `booking_archives`. Longitudes are stored in the
/// `*_lang` columns.
#[derive(Debug, Clone, FromRow)]
pub struct BookingArchiveRow {
    pub booking_archives_id: i64,
    pub booking_id: i64,
    pub driver_id: Option<i64>,
    pub passenger_id: Option<String>,
    pub route_id: i64,
    pub payment_method: Option<String>,
    pub fare: Option<f64>,
    pub seat_type: Option<String>,
    pub ride_status: Option<String>,
    pub pickup_address: Option<String>,
    pub pickup_lat: Option<f64>,
    pub pickup_lang: Option<f64>,
    pub dropoff_address: Option<String>,
    pub dropoff_lat: Option<f64>,
    pub dropoff_lang: Option<f64>,
    pub start_time: Option<DateTime<Utc>>,
    pub end_time: Option<DateTime<Utc>>,
    pub assigned_at: Option<DateTime<Utc>>,
    pub archived_at: DateTime<Utc>,
    pub pdf_path: Option<String>,
    pub exported_at: Option<DateTime<Utc>>,
}

impl BookingArchiveRow {
    pub fn to_model(self) -> BookingArchive {
        BookingArchive {
            id: Id::new(self.booking_archives_id),
            booking_id: Id::new(self.booking_id),
            driver_id: self.driver_id,
            passenger_id: self.passenger_id,
            route_id: self.route_id,
            payment_method: self.payment_method,
            fare: self.fare,
            seat_type: self.seat_type,
            ride_status: self.ride_status,
            pickup: Place {
                address: self.pickup_address,
                latitude: self.pickup_lat,
                longitude: self.pickup_lang,
            },
            dropoff: Place {
                address: self.dropoff_address,
                latitude: self.dropoff_lat,
                longitude: self.dropoff_lang,
            },
            start_time: self.start_time,
            end_time: self.end_time,
            assigned_at: self.assigned_at,
            archived_at: self.archived_at,
            pdf_path: self.pdf_path,
            exported_at: self.exported_at,
        }
    }
}
