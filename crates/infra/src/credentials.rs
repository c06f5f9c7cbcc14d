use std::collections::HashMap;
use std::sync::RwLock;

use innkeep_auth::{Credential, CredentialStore, PasswordHash};
use innkeep_core::{DomainError, DomainResult, UserId};

/// In-memory credential store keyed by subject, with an identifier index.
#[derive(Debug, Default)]
pub struct InMemoryCredentialStore {
    inner: RwLock<Inner>,
}

#[derive(Debug, Default)]
struct Inner {
    by_subject: HashMap<UserId, Credential>,
    by_identifier: HashMap<String, UserId>,
}

impl InMemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn poisoned() -> DomainError {
    DomainError::invariant("credential store lock poisoned")
}

impl CredentialStore for InMemoryCredentialStore {
    fn find_by_identifier(&self, identifier: &str) -> Option<Credential> {
        let inner = self.inner.read().ok()?;
        let subject = inner.by_identifier.get(identifier)?;
        inner.by_subject.get(subject).cloned()
    }

    fn get(&self, subject: &UserId) -> Option<Credential> {
        let inner = self.inner.read().ok()?;
        inner.by_subject.get(subject).cloned()
    }

    fn insert(&self, credential: Credential) -> DomainResult<()> {
        let mut inner = self.inner.write().map_err(|_| poisoned())?;
        if inner.by_identifier.contains_key(&credential.identifier) {
            return Err(DomainError::conflict("identifier is already registered"));
        }
        if inner.by_subject.contains_key(&credential.subject) {
            return Err(DomainError::conflict("subject already has a credential"));
        }
        inner
            .by_identifier
            .insert(credential.identifier.clone(), credential.subject);
        inner.by_subject.insert(credential.subject, credential);
        Ok(())
    }

    fn update_password(&self, subject: &UserId, password_hash: PasswordHash) -> DomainResult<()> {
        let mut inner = self.inner.write().map_err(|_| poisoned())?;
        let credential = inner.by_subject.get_mut(subject).ok_or(DomainError::NotFound)?;
        credential.password_hash = password_hash;
        Ok(())
    }

    fn remove(&self, subject: &UserId) -> DomainResult<Credential> {
        let mut inner = self.inner.write().map_err(|_| poisoned())?;
        let credential = inner.by_subject.remove(subject).ok_or(DomainError::NotFound)?;
        inner.by_identifier.remove(&credential.identifier);
        Ok(credential)
    }

    fn list(&self) -> Vec<Credential> {
        match self.inner.read() {
            Ok(inner) => inner.by_subject.values().cloned().collect(),
            Err(_) => vec![],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use innkeep_auth::Role;

    fn credential(identifier: &str) -> Credential {
        Credential::new(
            UserId::new(),
            identifier,
            "Someone",
            PasswordHash::from_encoded("$2b$04$not-a-real-hash"),
            Role::USER,
            Utc::now(),
        )
    }

    #[test]
    fn duplicate_identifiers_conflict() {
        let store = InMemoryCredentialStore::new();
        store.insert(credential("a@innkeep.test")).unwrap();
        assert!(matches!(
            store.insert(credential("A@innkeep.test")),
            Err(DomainError::Conflict(_))
        ));
        assert_eq!(store.list().len(), 1);
    }

    #[test]
    fn remove_frees_identifier() {
        let store = InMemoryCredentialStore::new();
        let c = credential("a@innkeep.test");
        let subject = c.subject;
        store.insert(c).unwrap();

        store.remove(&subject).unwrap();
        assert!(store.find_by_identifier("a@innkeep.test").is_none());
        assert!(store.insert(credential("a@innkeep.test")).is_ok());
        assert_eq!(store.remove(&subject).unwrap_err(), DomainError::NotFound);
    }

    #[test]
    fn update_password_replaces_hash_only() {
        let store = InMemoryCredentialStore::new();
        let c = credential("a@innkeep.test");
        let subject = c.subject;
        store.insert(c).unwrap();

        store
            .update_password(&subject, PasswordHash::from_encoded("$2b$04$other"))
            .unwrap();

        let stored = store.get(&subject).unwrap();
        assert_eq!(stored.password_hash.as_str(), "$2b$04$other");
        assert_eq!(stored.identifier, "a@innkeep.test");
    }
}
