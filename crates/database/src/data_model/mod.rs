pub mod booking_archive;
