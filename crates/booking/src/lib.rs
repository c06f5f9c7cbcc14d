//! `innkeep-booking` — hotel catalogue and reservation rules.

pub mod booking;
pub mod hotel;

pub use booking::{Booking, BookingRequest, BookingStatus, MAX_GUESTS, MAX_NIGHTS, peak_occupancy};
pub use hotel::{Hotel, HotelDraft, HotelPatch, HotelQuery, SeoMeta};
