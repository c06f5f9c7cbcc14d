//! Reservations.
//!
//! # Invariants
//! - `check_in < check_out`, at most [`MAX_NIGHTS`] nights, check-in not in the past.
//! - `1 ..= MAX_GUESTS` guests.
//! - For every night, confirmed bookings of a hotel never exceed its room count.
//! - Status only moves `Confirmed -> Cancelled`.

use std::collections::BTreeMap;

use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use innkeep_core::{BookingId, DomainError, DomainResult, HotelId, UserId};

use crate::Hotel;

pub const MAX_NIGHTS: i64 = 30;
pub const MAX_GUESTS: u32 = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BookingStatus {
    Confirmed,
    Cancelled,
}

/// Guest-submitted reservation request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookingRequest {
    pub hotel_id: HotelId,
    pub check_in: NaiveDate,
    pub check_out: NaiveDate,
    pub guests: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Booking {
    pub id: BookingId,
    pub hotel_id: HotelId,
    pub guest_id: UserId,
    pub check_in: NaiveDate,
    pub check_out: NaiveDate,
    pub guests: u32,
    pub total_cents: u64,
    pub status: BookingStatus,
    pub created_at: DateTime<Utc>,
    pub cancelled_at: Option<DateTime<Utc>>,
}

impl Booking {
    /// Validate `request` against `hotel` and the hotel's `existing` bookings,
    /// producing a confirmed booking.
    pub fn reserve(
        id: BookingId,
        guest_id: UserId,
        hotel: &Hotel,
        request: &BookingRequest,
        existing: &[Booking],
        now: DateTime<Utc>,
    ) -> DomainResult<Self> {
        if request.hotel_id != hotel.id {
            return Err(DomainError::invariant("booking request is for a different hotel"));
        }
        if request.check_in < now.date_naive() {
            return Err(DomainError::validation("check-in date is in the past"));
        }
        if request.check_out <= request.check_in {
            return Err(DomainError::validation("check-out must be after check-in"));
        }
        let nights = (request.check_out - request.check_in).num_days();
        if nights > MAX_NIGHTS {
            return Err(DomainError::validation(format!(
                "stays are limited to {MAX_NIGHTS} nights"
            )));
        }
        if request.guests == 0 || request.guests > MAX_GUESTS {
            return Err(DomainError::validation(format!(
                "guests must be between 1 and {MAX_GUESTS}"
            )));
        }

        let mut night = request.check_in;
        while night < request.check_out {
            let occupied = existing
                .iter()
                .filter(|b| b.hotel_id == hotel.id && b.occupies(night))
                .count();
            if occupied >= hotel.rooms as usize {
                return Err(DomainError::conflict(format!("no rooms available on {night}")));
            }
            night += Duration::days(1);
        }

        let total_cents = (nights as u64)
            .checked_mul(hotel.nightly_rate_cents)
            .ok_or_else(|| DomainError::validation("booking total overflows"))?;

        Ok(Self {
            id,
            hotel_id: hotel.id,
            guest_id,
            check_in: request.check_in,
            check_out: request.check_out,
            guests: request.guests,
            total_cents,
            status: BookingStatus::Confirmed,
            created_at: now,
            cancelled_at: None,
        })
    }

    pub fn nights(&self) -> i64 {
        (self.check_out - self.check_in).num_days()
    }

    pub fn is_confirmed(&self) -> bool {
        self.status == BookingStatus::Confirmed
    }

    /// Whether this booking holds a room for the night starting on `night`.
    pub fn occupies(&self, night: NaiveDate) -> bool {
        self.is_confirmed() && self.check_in <= night && night < self.check_out
    }

    pub fn cancel(&mut self, now: DateTime<Utc>) -> DomainResult<()> {
        if !self.is_confirmed() {
            return Err(DomainError::conflict("booking is already cancelled"));
        }
        self.status = BookingStatus::Cancelled;
        self.cancelled_at = Some(now);
        Ok(())
    }
}

/// Highest number of rooms held on any single night by confirmed `bookings`.
///
/// Callers pass one hotel's bookings; a hotel cannot shrink below this.
pub fn peak_occupancy(bookings: &[Booking]) -> usize {
    let mut per_night: BTreeMap<NaiveDate, usize> = BTreeMap::new();
    for booking in bookings.iter().filter(|b| b.is_confirmed()) {
        let mut night = booking.check_in;
        while night < booking.check_out {
            *per_night.entry(night).or_default() += 1;
            night += Duration::days(1);
        }
    }
    per_night.into_values().max().unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{HotelDraft, SeoMeta};
    use proptest::prelude::*;

    fn hotel(rooms: u32) -> Hotel {
        Hotel::create(
            HotelId::new(),
            HotelDraft {
                name: "Canal House".into(),
                city: "Amsterdam".into(),
                address: "2 Canal Road".into(),
                description: String::new(),
                nightly_rate_cents: 10_000,
                rooms,
                amenities: vec![],
                image_urls: vec![],
                seo: SeoMeta::default(),
            },
            Utc::now(),
        )
        .unwrap()
    }

    fn request(hotel: &Hotel, from_today: i64, nights: i64) -> BookingRequest {
        let check_in = Utc::now().date_naive() + Duration::days(from_today);
        BookingRequest {
            hotel_id: hotel.id,
            check_in,
            check_out: check_in + Duration::days(nights),
            guests: 2,
        }
    }

    fn reserve(hotel: &Hotel, req: &BookingRequest, existing: &[Booking]) -> DomainResult<Booking> {
        Booking::reserve(BookingId::new(), UserId::new(), hotel, req, existing, Utc::now())
    }

    #[test]
    fn reserve_prices_by_night() {
        let h = hotel(1);
        let b = reserve(&h, &request(&h, 3, 4), &[]).unwrap();
        assert_eq!(b.nights(), 4);
        assert_eq!(b.total_cents, 40_000);
        assert_eq!(b.status, BookingStatus::Confirmed);
    }

    #[test]
    fn reserve_validates_dates_and_guests() {
        let h = hotel(1);
        assert!(matches!(reserve(&h, &request(&h, -1, 2), &[]), Err(DomainError::Validation(_))));
        assert!(matches!(reserve(&h, &request(&h, 1, 0), &[]), Err(DomainError::Validation(_))));
        assert!(matches!(
            reserve(&h, &request(&h, 1, MAX_NIGHTS + 1), &[]),
            Err(DomainError::Validation(_))
        ));

        let mut crowd = request(&h, 1, 1);
        crowd.guests = MAX_GUESTS + 1;
        assert!(matches!(reserve(&h, &crowd, &[]), Err(DomainError::Validation(_))));
        crowd.guests = 0;
        assert!(matches!(reserve(&h, &crowd, &[]), Err(DomainError::Validation(_))));
    }

    #[test]
    fn reserve_rejects_request_for_other_hotel() {
        let h = hotel(1);
        let other = hotel(1);
        assert!(matches!(
            reserve(&h, &request(&other, 1, 1), &[]),
            Err(DomainError::InvariantViolation(_))
        ));
    }

    #[test]
    fn full_nights_conflict_and_cancellation_frees_them() {
        let h = hotel(1);
        let mut first = reserve(&h, &request(&h, 5, 3), &[]).unwrap();

        // overlaps the last night of `first`
        let overlapping = request(&h, 7, 2);
        assert!(matches!(
            reserve(&h, &overlapping, std::slice::from_ref(&first)),
            Err(DomainError::Conflict(_))
        ));

        // back-to-back is fine: check-out day is not an occupied night
        assert!(reserve(&h, &request(&h, 8, 2), std::slice::from_ref(&first)).is_ok());

        first.cancel(Utc::now()).unwrap();
        assert!(reserve(&h, &overlapping, std::slice::from_ref(&first)).is_ok());
    }

    #[test]
    fn peak_occupancy_counts_overlapping_confirmed_nights() {
        let h = hotel(3);
        assert_eq!(peak_occupancy(&[]), 0);

        let a = reserve(&h, &request(&h, 1, 3), &[]).unwrap();
        let b = reserve(&h, &request(&h, 3, 2), &[]).unwrap();
        // shares no night with `a`: check-out day is free
        let c = reserve(&h, &request(&h, 4, 1), &[]).unwrap();
        assert_eq!(peak_occupancy(&[a.clone(), b.clone(), c.clone()]), 2);

        let mut cancelled = b;
        cancelled.cancel(Utc::now()).unwrap();
        assert_eq!(peak_occupancy(&[a, cancelled, c]), 1);
    }

    #[test]
    fn cancel_twice_is_a_conflict() {
        let h = hotel(1);
        let mut b = reserve(&h, &request(&h, 1, 1), &[]).unwrap();
        b.cancel(Utc::now()).unwrap();
        assert!(b.cancelled_at.is_some());
        assert!(matches!(b.cancel(Utc::now()), Err(DomainError::Conflict(_))));
    }

    proptest! {
        #[test]
        fn confirmed_bookings_never_exceed_rooms(
            rooms in 1u32..4,
            stays in proptest::collection::vec((0i64..20, 1i64..6), 1..25),
        ) {
            let h = hotel(rooms);
            let mut accepted: Vec<Booking> = Vec::new();
            for (offset, nights) in stays {
                if let Ok(b) = reserve(&h, &request(&h, offset, nights), &accepted) {
                    accepted.push(b);
                }
            }

            let start = Utc::now().date_naive();
            for day in 0..30 {
                let night = start + Duration::days(day);
                let occupied = accepted.iter().filter(|b| b.occupies(night)).count();
                prop_assert!(occupied <= rooms as usize);
            }
        }
    }
}
