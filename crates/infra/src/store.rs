use std::collections::HashMap;
use std::hash::Hash;
use std::sync::{Arc, RwLock};

use innkeep_core::{DomainError, DomainResult};

/// Key/value store abstraction for catalogue and booking records.
pub trait RecordStore<K, V>: Send + Sync {
    fn get(&self, key: &K) -> Option<V>;
    fn upsert(&self, key: K, value: V) -> DomainResult<()>;
    fn remove(&self, key: &K) -> DomainResult<Option<V>>;
    fn list(&self) -> Vec<V>;
    /// Records matching `pred`, without cloning the rest.
    fn filter(&self, pred: &dyn Fn(&V) -> bool) -> Vec<V>;
}

impl<K, V, S> RecordStore<K, V> for Arc<S>
where
    S: RecordStore<K, V> + ?Sized,
{
    fn get(&self, key: &K) -> Option<V> {
        (**self).get(key)
    }

    fn upsert(&self, key: K, value: V) -> DomainResult<()> {
        (**self).upsert(key, value)
    }

    fn remove(&self, key: &K) -> DomainResult<Option<V>> {
        (**self).remove(key)
    }

    fn list(&self) -> Vec<V> {
        (**self).list()
    }

    fn filter(&self, pred: &dyn Fn(&V) -> bool) -> Vec<V> {
        (**self).filter(pred)
    }
}

/// In-memory store for dev/tests.
///
/// A poisoned lock reads as empty; writes against it fail instead of being
/// silently lost.
#[derive(Debug)]
pub struct InMemoryStore<K, V> {
    inner: RwLock<HashMap<K, V>>,
}

impl<K, V> InMemoryStore<K, V> {
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(HashMap::new()),
        }
    }
}

impl<K, V> Default for InMemoryStore<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

fn poisoned() -> DomainError {
    tracing::error!("record store lock poisoned");
    DomainError::invariant("record store lock poisoned")
}

impl<K, V> RecordStore<K, V> for InMemoryStore<K, V>
where
    K: Eq + Hash + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
{
    fn get(&self, key: &K) -> Option<V> {
        let map = self.inner.read().ok()?;
        map.get(key).cloned()
    }

    fn upsert(&self, key: K, value: V) -> DomainResult<()> {
        let mut map = self.inner.write().map_err(|_| poisoned())?;
        map.insert(key, value);
        Ok(())
    }

    fn remove(&self, key: &K) -> DomainResult<Option<V>> {
        let mut map = self.inner.write().map_err(|_| poisoned())?;
        Ok(map.remove(key))
    }

    fn list(&self) -> Vec<V> {
        match self.inner.read() {
            Ok(map) => map.values().cloned().collect(),
            Err(_) => vec![],
        }
    }

    fn filter(&self, pred: &dyn Fn(&V) -> bool) -> Vec<V> {
        match self.inner.read() {
            Ok(map) => map.values().filter(|v| pred(v)).cloned().collect(),
            Err(_) => vec![],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn upsert_get_remove() {
        let store: InMemoryStore<u32, String> = InMemoryStore::new();
        store.upsert(1, "one".into()).unwrap();
        store.upsert(1, "uno".into()).unwrap();
        store.upsert(2, "two".into()).unwrap();

        assert_eq!(store.get(&1).as_deref(), Some("uno"));
        assert_eq!(store.list().len(), 2);
        assert_eq!(store.filter(&|v: &String| v.starts_with('t')), vec!["two".to_string()]);
        assert_eq!(store.remove(&1).unwrap().as_deref(), Some("uno"));
        assert_eq!(store.remove(&1).unwrap(), None);
        assert_eq!(store.get(&1), None);
    }

    #[test]
    fn shared_through_arc() {
        let store = Arc::new(InMemoryStore::<u32, u32>::new());
        let alias = Arc::clone(&store);
        alias.upsert(7, 49).unwrap();
        assert_eq!(RecordStore::get(&store, &7), Some(49));
    }

    #[test]
    fn writes_fail_once_the_lock_is_poisoned() {
        let store = Arc::new(InMemoryStore::<u32, u32>::new());
        store.upsert(1, 1).unwrap();

        let poisoner = Arc::clone(&store);
        let _ = std::thread::spawn(move || {
            let _guard = poisoner.inner.write().unwrap();
            panic!("poison the lock");
        })
        .join();

        assert!(matches!(store.upsert(2, 2), Err(DomainError::InvariantViolation(_))));
        assert!(store.remove(&1).is_err());
        assert_eq!(store.get(&2), None);
    }
}
