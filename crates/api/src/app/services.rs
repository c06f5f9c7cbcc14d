//! Application services: the single owner of stores and the authenticator.
//!
//! Built once in `build_app` and handed to handlers as `Arc<AppServices>`.

use std::sync::{Arc, Mutex};

use chrono::Utc;
use thiserror::Error;

use innkeep_auth::{
    AuthError, Authenticator, Credential, CredentialStore, IssuedToken, PasswordHash, Role,
    normalize_identifier, validate_identifier, validate_secret,
};
use innkeep_booking::{
    Booking, BookingRequest, Hotel, HotelDraft, HotelPatch, HotelQuery, peak_occupancy,
};
use innkeep_core::{BookingId, DomainError, HotelId, UserId};
use innkeep_infra::{InMemoryCredentialStore, InMemoryStore, RecordStore};

use crate::config::ApiConfig;

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error("{0}")]
    Internal(String),
}

pub type ServiceResult<T> = Result<T, ServiceError>;

pub struct AppServices {
    authenticator: Authenticator<Arc<InMemoryCredentialStore>>,
    hotels: InMemoryStore<HotelId, Hotel>,
    bookings: InMemoryStore<BookingId, Booking>,
    // serializes booking check-and-write so capacity cannot be oversold
    booking_writes: Mutex<()>,
    bcrypt_cost: u32,
}

impl AppServices {
    pub fn new(config: &ApiConfig) -> anyhow::Result<Self> {
        let store = Arc::new(InMemoryCredentialStore::new());
        let issuer = config.jwt_secret.issuer(config.token_ttl);
        let authenticator = Authenticator::new(store, issuer, config.bcrypt_cost)?;

        let services = Self {
            authenticator,
            hotels: InMemoryStore::new(),
            bookings: InMemoryStore::new(),
            booking_writes: Mutex::new(()),
            bcrypt_cost: config.bcrypt_cost,
        };

        if let Some(admin) = &config.bootstrap_admin {
            let credential = services
                .provision_account(&admin.identifier, &admin.password, "Administrator", Role::ADMIN)
                .map_err(|e| anyhow::anyhow!("bootstrap admin: {e}"))?;
            tracing::info!(subject = %credential.subject, "bootstrap admin provisioned");
        }

        Ok(services)
    }

    fn credentials(&self) -> &InMemoryCredentialStore {
        self.authenticator.store().as_ref()
    }

    // ── accounts ────────────────────────────────────────────────────────────

    pub fn login(&self, identifier: &str, password: &str) -> ServiceResult<IssuedToken> {
        Ok(self.authenticator.authenticate(identifier, password, Utc::now())?)
    }

    /// Self-service sign-up; always the ordinary `user` role.
    pub fn register(&self, email: &str, password: &str, display_name: &str) -> ServiceResult<Credential> {
        self.provision_account(email, password, display_name, Role::USER)
    }

    pub fn provision_account(
        &self,
        identifier: &str,
        password: &str,
        display_name: &str,
        role: Role,
    ) -> ServiceResult<Credential> {
        validate_identifier(identifier)?;
        validate_secret(password)?;
        validate_role(&role)?;

        let display_name = match display_name.trim() {
            "" => normalize_identifier(identifier),
            name => name.to_string(),
        };
        let hash = PasswordHash::hash(password, self.bcrypt_cost)?;
        let credential = Credential::new(UserId::new(), identifier, display_name, hash, role, Utc::now());

        self.credentials().insert(credential.clone())?;
        tracing::info!(subject = %credential.subject, role = %credential.role, "account provisioned");
        Ok(credential)
    }

    pub fn account(&self, subject: &UserId) -> ServiceResult<Credential> {
        self.credentials().get(subject).ok_or(ServiceError::Domain(DomainError::NotFound))
    }

    pub fn change_password(&self, subject: &UserId, current: &str, new: &str) -> ServiceResult<()> {
        let credential = self.account(subject)?;
        // 400, not 401: the caller's token is still good
        if !credential.password_hash.verify(current) {
            return Err(DomainError::validation("current password is incorrect").into());
        }
        validate_secret(new)?;

        let hash = PasswordHash::hash(new, self.bcrypt_cost)?;
        self.credentials().update_password(subject, hash)?;
        tracing::info!(subject = %subject, "password changed");
        Ok(())
    }

    pub fn users(&self) -> Vec<Credential> {
        let mut users = self.credentials().list();
        users.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.identifier.cmp(&b.identifier)));
        users
    }

    /// Remove an account and release the rooms its confirmed bookings held.
    pub fn delete_user(&self, subject: &UserId) -> ServiceResult<Credential> {
        let _guard = self.lock_bookings()?;
        let removed = self.credentials().remove(subject)?;

        let now = Utc::now();
        for mut booking in self
            .bookings
            .filter(&|b: &Booking| b.guest_id == *subject && b.is_confirmed())
        {
            booking.cancel(now)?;
            self.bookings.upsert(booking.id, booking)?;
        }

        tracing::info!(subject = %subject, "account removed");
        Ok(removed)
    }

    // ── hotels ──────────────────────────────────────────────────────────────

    pub fn hotels_search(&self, query: &HotelQuery) -> Vec<Hotel> {
        let mut hotels = self.hotels.filter(&|h: &Hotel| h.matches(query));
        hotels.sort_by(|a, b| a.name.cmp(&b.name).then_with(|| a.created_at.cmp(&b.created_at)));
        hotels
    }

    pub fn hotel(&self, id: &HotelId) -> ServiceResult<Hotel> {
        self.hotels.get(id).ok_or(ServiceError::Domain(DomainError::NotFound))
    }

    pub fn hotel_create(&self, draft: HotelDraft) -> ServiceResult<Hotel> {
        let hotel = Hotel::create(HotelId::new(), draft, Utc::now())?;
        self.hotels.upsert(hotel.id, hotel.clone())?;
        tracing::info!(hotel_id = %hotel.id, "hotel created");
        Ok(hotel)
    }

    pub fn hotel_update(&self, id: &HotelId, patch: HotelPatch) -> ServiceResult<Hotel> {
        // room count feeds the capacity check, so updates share the booking lock
        let _guard = self.lock_bookings()?;
        let mut hotel = self.hotel(id)?;

        if let Some(rooms) = patch.rooms.filter(|rooms| *rooms < hotel.rooms) {
            let peak = peak_occupancy(&self.confirmed_at(id));
            if peak > rooms as usize {
                return Err(DomainError::conflict(format!(
                    "{peak} rooms are booked on the busiest night; cannot reduce to {rooms}"
                ))
                .into());
            }
        }

        hotel.apply(patch, Utc::now())?;
        self.hotels.upsert(hotel.id, hotel.clone())?;
        Ok(hotel)
    }

    /// Hotels with confirmed bookings cannot be removed.
    pub fn hotel_delete(&self, id: &HotelId) -> ServiceResult<Hotel> {
        let _guard = self.lock_bookings()?;
        self.hotel(id)?;

        let live = self.confirmed_at(id);
        if !live.is_empty() {
            return Err(DomainError::conflict(format!(
                "hotel has {} confirmed booking(s)",
                live.len()
            ))
            .into());
        }

        let removed = self.hotels.remove(id)?.ok_or(ServiceError::Domain(DomainError::NotFound))?;
        tracing::info!(hotel_id = %id, "hotel deleted");
        Ok(removed)
    }

    // ── bookings ────────────────────────────────────────────────────────────

    pub fn reserve(&self, guest: UserId, request: &BookingRequest) -> ServiceResult<Booking> {
        let _guard = self.lock_bookings()?;
        // A token outlives its account; checked under the lock so a
        // concurrent delete_user cannot leave a booking behind.
        if self.credentials().get(&guest).is_none() {
            return Err(AuthError::Unauthenticated.into());
        }
        let hotel = self.hotel(&request.hotel_id)?;
        let existing = self.confirmed_at(&hotel.id);

        let booking = Booking::reserve(BookingId::new(), guest, &hotel, request, &existing, Utc::now())?;
        self.bookings.upsert(booking.id, booking.clone())?;
        tracing::info!(booking_id = %booking.id, hotel_id = %hotel.id, "booking confirmed");
        Ok(booking)
    }

    pub fn bookings_for(&self, guest: &UserId) -> Vec<Booking> {
        sorted(self.bookings.filter(&|b: &Booking| b.guest_id == *guest))
    }

    pub fn bookings_all(&self) -> Vec<Booking> {
        sorted(self.bookings.list())
    }

    /// Cancel a booking. With `owner` set, only that guest's booking is
    /// visible; anyone else's reads as not found.
    pub fn cancel_booking(&self, id: &BookingId, owner: Option<&UserId>) -> ServiceResult<Booking> {
        let _guard = self.lock_bookings()?;
        let mut booking = self
            .bookings
            .get(id)
            .filter(|b| owner.is_none_or(|o| b.guest_id == *o))
            .ok_or(ServiceError::Domain(DomainError::NotFound))?;

        booking.cancel(Utc::now())?;
        self.bookings.upsert(booking.id, booking.clone())?;
        tracing::info!(booking_id = %booking.id, "booking cancelled");
        Ok(booking)
    }

    fn confirmed_at(&self, hotel: &HotelId) -> Vec<Booking> {
        self.bookings
            .filter(&|b: &Booking| b.hotel_id == *hotel && b.is_confirmed())
    }

    fn lock_bookings(&self) -> ServiceResult<std::sync::MutexGuard<'_, ()>> {
        self.booking_writes
            .lock()
            .map_err(|_| ServiceError::Internal("booking lock poisoned".into()))
    }
}

fn sorted(mut bookings: Vec<Booking>) -> Vec<Booking> {
    bookings.sort_by(|a, b| a.check_in.cmp(&b.check_in).then_with(|| a.created_at.cmp(&b.created_at)));
    bookings
}

/// Role names end up in request headers, so keep them to a safe alphabet.
fn validate_role(role: &Role) -> Result<(), DomainError> {
    let name = role.as_str();
    let ok = !name.is_empty()
        && name.len() <= 32
        && name
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_' || c == '-');
    if ok {
        Ok(())
    } else {
        Err(DomainError::validation(
            "role must be 1-32 characters of a-z, 0-9, '_' or '-'",
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn services() -> AppServices {
        AppServices::new(&ApiConfig::local("services-test-secret")).unwrap()
    }

    fn draft(rooms: u32) -> HotelDraft {
        HotelDraft {
            name: "Old Mill".into(),
            city: "Bruges".into(),
            address: "3 Mill Lane".into(),
            description: "Quiet rooms by the water".into(),
            nightly_rate_cents: 8_000,
            rooms,
            amenities: vec![],
            image_urls: vec![],
            seo: Default::default(),
        }
    }

    fn stay(hotel: &Hotel, from_today: i64, nights: i64) -> BookingRequest {
        let check_in = Utc::now().date_naive() + Duration::days(from_today);
        BookingRequest {
            hotel_id: hotel.id,
            check_in,
            check_out: check_in + Duration::days(nights),
            guests: 1,
        }
    }

    fn guest(s: &AppServices, name: &str) -> UserId {
        s.register(&format!("{name}@innkeep.test"), "guest secret", name)
            .unwrap()
            .subject
    }

    #[test]
    fn register_then_login() {
        let s = services();
        let c = s.register("Guest@Innkeep.test", "correct horse", "").unwrap();
        assert_eq!(c.role, Role::USER);
        assert_eq!(c.display_name, "guest@innkeep.test");

        let issued = s.login("guest@innkeep.test", "correct horse").unwrap();
        assert_eq!(issued.claims.sub, c.subject);
        assert!(matches!(
            s.register("guest@innkeep.test", "another secret", "Dup"),
            Err(ServiceError::Domain(DomainError::Conflict(_)))
        ));
    }

    #[test]
    fn bootstrap_admin_can_log_in() {
        let mut cfg = ApiConfig::local("services-test-secret");
        cfg.bootstrap_admin = Some(crate::config::BootstrapAdmin {
            identifier: "root@innkeep.test".into(),
            password: "admin password".into(),
        });
        let s = AppServices::new(&cfg).unwrap();
        assert_eq!(s.login("root@innkeep.test", "admin password").unwrap().claims.role, Role::ADMIN);
    }

    #[test]
    fn provisioning_rejects_unsafe_role_names() {
        let s = services();
        assert!(s.provision_account("a@innkeep.test", "long enough", "A", Role::new("Ad Min")).is_err());
        assert!(s.provision_account("a@innkeep.test", "long enough", "A", Role::new("")).is_err());
        assert!(s.provision_account("a@innkeep.test", "long enough", "A", Role::new("auditor")).is_ok());
    }

    #[test]
    fn change_password_requires_current() {
        let s = services();
        let c = s.register("g@innkeep.test", "first secret", "G").unwrap();

        assert!(matches!(
            s.change_password(&c.subject, "wrong secret", "second secret"),
            Err(ServiceError::Domain(DomainError::Validation(_)))
        ));
        s.change_password(&c.subject, "first secret", "second secret").unwrap();
        assert!(s.login("g@innkeep.test", "first secret").is_err());
        assert!(s.login("g@innkeep.test", "second secret").is_ok());
    }

    #[test]
    fn hotel_with_confirmed_booking_cannot_be_deleted() {
        let s = services();
        let hotel = s.hotel_create(draft(1)).unwrap();
        let guest = guest(&s, "g");
        let booking = s.reserve(guest, &stay(&hotel, 1, 2)).unwrap();

        assert!(matches!(s.hotel_delete(&hotel.id), Err(ServiceError::Domain(DomainError::Conflict(_)))));

        s.cancel_booking(&booking.id, Some(&guest)).unwrap();
        s.hotel_delete(&hotel.id).unwrap();
        assert!(s.hotel(&hotel.id).is_err());
    }

    #[test]
    fn guests_only_see_and_cancel_their_own_bookings() {
        let s = services();
        let hotel = s.hotel_create(draft(3)).unwrap();
        let alice = guest(&s, "alice");
        let bob = guest(&s, "bob");
        let a = s.reserve(alice, &stay(&hotel, 1, 1)).unwrap();
        s.reserve(bob, &stay(&hotel, 1, 1)).unwrap();

        assert_eq!(s.bookings_for(&alice).len(), 1);
        assert_eq!(s.bookings_all().len(), 2);
        assert!(matches!(
            s.cancel_booking(&a.id, Some(&bob)),
            Err(ServiceError::Domain(DomainError::NotFound))
        ));
        assert!(s.cancel_booking(&a.id, None).is_ok());
    }

    #[test]
    fn deleting_a_user_releases_their_rooms() {
        let s = services();
        let hotel = s.hotel_create(draft(1)).unwrap();
        let leaving = guest(&s, "leaving");
        let waiting = guest(&s, "waiting");
        s.reserve(leaving, &stay(&hotel, 2, 2)).unwrap();

        assert!(s.reserve(waiting, &stay(&hotel, 2, 2)).is_err());
        s.delete_user(&leaving).unwrap();
        assert!(s.reserve(waiting, &stay(&hotel, 2, 2)).is_ok());
    }

    #[test]
    fn deleted_account_cannot_book_with_an_old_token() {
        let s = services();
        let hotel = s.hotel_create(draft(2)).unwrap();
        let gone = guest(&s, "gone");
        s.delete_user(&gone).unwrap();

        assert!(matches!(
            s.reserve(gone, &stay(&hotel, 1, 1)),
            Err(ServiceError::Auth(AuthError::Unauthenticated))
        ));
        assert!(s.bookings_all().is_empty());
    }

    #[test]
    fn rooms_cannot_shrink_below_booked_nights() {
        let s = services();
        let hotel = s.hotel_create(draft(2)).unwrap();
        s.reserve(guest(&s, "a"), &stay(&hotel, 1, 1)).unwrap();
        let b = s.reserve(guest(&s, "b"), &stay(&hotel, 1, 1)).unwrap();

        let shrink = || HotelPatch {
            rooms: Some(1),
            ..Default::default()
        };
        assert!(matches!(
            s.hotel_update(&hotel.id, shrink()),
            Err(ServiceError::Domain(DomainError::Conflict(_)))
        ));
        assert_eq!(s.hotel(&hotel.id).unwrap().rooms, 2);

        s.cancel_booking(&b.id, None).unwrap();
        assert_eq!(s.hotel_update(&hotel.id, shrink()).unwrap().rooms, 1);

        let grow = HotelPatch {
            rooms: Some(5),
            ..Default::default()
        };
        assert_eq!(s.hotel_update(&hotel.id, grow).unwrap().rooms, 5);
    }

    #[test]
    fn search_is_sorted_by_name() {
        let s = services();
        let mut b = draft(1);
        b.name = "Zephyr".into();
        s.hotel_create(b).unwrap();
        s.hotel_create(draft(1)).unwrap();

        let names: Vec<String> = s.hotels_search(&HotelQuery::default()).into_iter().map(|h| h.name).collect();
        assert_eq!(names, vec!["Old Mill".to_string(), "Zephyr".to_string()]);
    }
}
