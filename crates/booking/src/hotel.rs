use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use innkeep_core::{DomainError, DomainResult, HotelId};

/// Search-engine metadata shown on the public hotel page.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeoMeta {
    pub title: Option<String>,
    pub description: Option<String>,
}

/// Admin-submitted hotel fields (create, or the merged result of an update).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HotelDraft {
    pub name: String,
    pub city: String,
    pub address: String,
    #[serde(default)]
    pub description: String,
    pub nightly_rate_cents: u64,
    pub rooms: u32,
    #[serde(default)]
    pub amenities: Vec<String>,
    /// Already-hosted image locations; uploading is handled elsewhere.
    #[serde(default)]
    pub image_urls: Vec<String>,
    #[serde(default)]
    pub seo: SeoMeta,
}

impl HotelDraft {
    pub fn validate(&self) -> DomainResult<()> {
        if self.name.trim().is_empty() {
            return Err(DomainError::validation("name must not be empty"));
        }
        if self.city.trim().is_empty() {
            return Err(DomainError::validation("city must not be empty"));
        }
        if self.address.trim().is_empty() {
            return Err(DomainError::validation("address must not be empty"));
        }
        if self.nightly_rate_cents == 0 {
            return Err(DomainError::validation("nightly rate must be positive"));
        }
        if self.rooms == 0 {
            return Err(DomainError::validation("a hotel needs at least one room"));
        }
        if let Some(url) = self
            .image_urls
            .iter()
            .find(|u| !(u.starts_with("https://") || u.starts_with("http://")))
        {
            return Err(DomainError::validation(format!("image url '{url}' must be http(s)")));
        }
        Ok(())
    }
}

/// Partial update; absent fields keep their current value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct HotelPatch {
    pub name: Option<String>,
    pub city: Option<String>,
    pub address: Option<String>,
    pub description: Option<String>,
    pub nightly_rate_cents: Option<u64>,
    pub rooms: Option<u32>,
    pub amenities: Option<Vec<String>>,
    pub image_urls: Option<Vec<String>>,
    pub seo: Option<SeoMeta>,
}

/// Public listing filter. All criteria are optional and combined with AND.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct HotelQuery {
    /// Exact city, case-insensitive.
    pub city: Option<String>,
    /// Free text matched against name and description, case-insensitive.
    pub q: Option<String>,
    pub max_rate: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Hotel {
    pub id: HotelId,
    pub name: String,
    pub city: String,
    pub address: String,
    pub description: String,
    pub nightly_rate_cents: u64,
    pub rooms: u32,
    pub amenities: Vec<String>,
    pub image_urls: Vec<String>,
    pub seo: SeoMeta,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Hotel {
    pub fn create(id: HotelId, draft: HotelDraft, now: DateTime<Utc>) -> DomainResult<Self> {
        draft.validate()?;
        Ok(Self {
            id,
            name: draft.name.trim().to_string(),
            city: draft.city.trim().to_string(),
            address: draft.address.trim().to_string(),
            description: draft.description,
            nightly_rate_cents: draft.nightly_rate_cents,
            rooms: draft.rooms,
            amenities: draft.amenities,
            image_urls: draft.image_urls,
            seo: draft.seo,
            created_at: now,
            updated_at: now,
        })
    }

    pub fn draft(&self) -> HotelDraft {
        HotelDraft {
            name: self.name.clone(),
            city: self.city.clone(),
            address: self.address.clone(),
            description: self.description.clone(),
            nightly_rate_cents: self.nightly_rate_cents,
            rooms: self.rooms,
            amenities: self.amenities.clone(),
            image_urls: self.image_urls.clone(),
            seo: self.seo.clone(),
        }
    }

    /// Apply a partial update. On error the hotel is left untouched.
    pub fn apply(&mut self, patch: HotelPatch, now: DateTime<Utc>) -> DomainResult<()> {
        let current = self.draft();
        let merged = HotelDraft {
            name: patch.name.unwrap_or(current.name),
            city: patch.city.unwrap_or(current.city),
            address: patch.address.unwrap_or(current.address),
            description: patch.description.unwrap_or(current.description),
            nightly_rate_cents: patch.nightly_rate_cents.unwrap_or(current.nightly_rate_cents),
            rooms: patch.rooms.unwrap_or(current.rooms),
            amenities: patch.amenities.unwrap_or(current.amenities),
            image_urls: patch.image_urls.unwrap_or(current.image_urls),
            seo: patch.seo.unwrap_or(current.seo),
        };

        let updated = Hotel::create(self.id, merged, self.created_at)?;
        *self = Hotel {
            updated_at: now,
            ..updated
        };
        Ok(())
    }

    pub fn matches(&self, query: &HotelQuery) -> bool {
        if let Some(city) = query.city.as_deref().map(str::trim).filter(|c| !c.is_empty()) {
            if !self.city.eq_ignore_ascii_case(city) {
                return false;
            }
        }
        if let Some(text) = query.q.as_deref().map(str::trim).filter(|t| !t.is_empty()) {
            let needle = text.to_lowercase();
            if !self.name.to_lowercase().contains(&needle)
                && !self.description.to_lowercase().contains(&needle)
            {
                return false;
            }
        }
        if let Some(max) = query.max_rate {
            if self.nightly_rate_cents > max {
                return false;
            }
        }
        true
    }
}
