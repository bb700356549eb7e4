use std::fmt::Display;

use chrono::{DateTime, Datelike, SecondsFormat, Utc};
use model::archive::{BookingArchive, Place};
use printpdf::{BuiltinFont, Mm, PdfDocument, Pt};

pub const CONTENT_TYPE: &str = "application/pdf";

// A4 in points.
const PAGE_WIDTH: f32 = 595.28;
const PAGE_HEIGHT: f32 = 841.89;

const LEFT_MARGIN: f32 = 50.0;
const FIRST_LINE: f32 = 800.0;
const LINE_HEIGHT: f32 = 18.0;
const FONT_SIZE: f32 = 12.0;

const MISSING: &str = "-";

/// Object path of the document for an archive row: `YYYY/MM/booking_<id>.pdf`,
/// using the UTC date the row was archived at.
pub fn archive_path(archive: &BookingArchive) -> String {
    format!(
        "{}/{:02}/booking_{}.pdf",
        archive.archived_at.year(),
        archive.archived_at.month(),
        archive.booking_id
    )
}

fn or_missing<T: Display>(value: &Option<T>) -> String {
    value
        .as_ref()
        .map(|v| v.to_string())
        .unwrap_or_else(|| MISSING.to_owned())
}

fn timestamp(value: &DateTime<Utc>) -> String {
    value.to_rfc3339_opts(SecondsFormat::Millis, true)
}

fn optional_timestamp(value: &Option<DateTime<Utc>>) -> String {
    value
        .as_ref()
        .map(timestamp)
        .unwrap_or_else(|| MISSING.to_owned())
}

fn place(place: &Place) -> String {
    format!(
        "{} ({}, {})",
        or_missing(&place.address),
        or_missing(&place.latitude),
        or_missing(&place.longitude)
    )
}

/// The text lines of the document, top to bottom.
pub fn document_lines(archive: &BookingArchive) -> Vec<String> {
    vec![
        format!("Booking Archive ID: {}", archive.id),
        format!("Original Booking ID: {}", archive.booking_id),
        format!("Archived At: {}", timestamp(&archive.archived_at)),
        format!("Driver ID: {}", or_missing(&archive.driver_id)),
        format!("Passenger ID: {}", or_missing(&archive.passenger_id)),
        format!("Route ID: {}", archive.route_id),
        format!("Ride Status: {}", or_missing(&archive.ride_status)),
        format!("Fare: {}", or_missing(&archive.fare)),
        format!("Payment Method: {}", or_missing(&archive.payment_method)),
        format!("Seat Type: {}", or_missing(&archive.seat_type)),
        format!("Pickup: {}", place(&archive.pickup)),
        format!("Dropoff: {}", place(&archive.dropoff)),
        format!("Start Time: {}", optional_timestamp(&archive.start_time)),
        format!("End Time: {}", optional_timestamp(&archive.end_time)),
        format!("Assigned At: {}", optional_timestamp(&archive.assigned_at)),
    ]
}

/// Renders a single A4 page listing the archived booking.
pub fn render_pdf(archive: &BookingArchive) -> Result<Vec<u8>, printpdf::Error> {
    let title = format!("Booking Archive {}", archive.id);
    let (document, page, layer) = PdfDocument::new(
        title.as_str(),
        Mm::from(Pt(PAGE_WIDTH)),
        Mm::from(Pt(PAGE_HEIGHT)),
        "Archive",
    );
    let font = document.add_builtin_font(BuiltinFont::Helvetica)?;
    let layer = document.get_page(page).get_layer(layer);

    let mut y = FIRST_LINE;
    for line in document_lines(archive) {
        layer.use_text(
            line,
            FONT_SIZE,
            Mm::from(Pt(LEFT_MARGIN)),
            Mm::from(Pt(y)),
            &font,
        );
        y -= LINE_HEIGHT;
    }

    document.save_to_bytes()
}
