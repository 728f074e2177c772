//! Provider map and type indices
//!
//! The registry itself is not synchronized; [`Container`](super::Container)
//! keeps it behind a `RwLock` and only holds the lock across these calls.

use std::collections::HashMap;
use std::sync::Arc;

use super::entry::ProviderEntry;
use super::token::TypeToken;
use crate::error::{Error, Result};

/// An entry together with its registration order
#[derive(Clone)]
pub(crate) struct Registration {
    pub(crate) entry: Arc<ProviderEntry>,
    seq: u64,
}

/// Keys for one type, ordered by registration
type Rows = Vec<(u64, String)>;

#[derive(Default)]
pub(crate) struct Registry {
    providers: HashMap<String, Registration>,
    /// capability -> keys binding it; the latest registration wins
    capabilities: HashMap<TypeToken, Rows>,
    /// produced type -> keys producing it
    produced: HashMap<TypeToken, Rows>,
    next_seq: u64,
}

impl Registry {
    pub(crate) fn get(&self, key: &str) -> Option<Arc<ProviderEntry>> {
        self.providers
            .get(key)
            .map(|registration| Arc::clone(&registration.entry))
    }

    pub(crate) fn contains(&self, key: &str) -> bool {
        self.providers.contains_key(key)
    }

    /// All keys, sorted
    pub(crate) fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.providers.keys().cloned().collect();
        keys.sort();
        keys
    }

    pub(crate) fn len(&self) -> usize {
        self.providers.len()
    }

    /// Insert or replace the entry for its key as the newest registration
    pub(crate) fn insert(&mut self, entry: Arc<ProviderEntry>) -> Option<Registration> {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.insert_at(Registration { entry, seq })
    }

    /// Put back a registration taken out earlier, at its original position
    pub(crate) fn restore(&mut self, registration: Registration) -> Option<Registration> {
        self.insert_at(registration)
    }

    fn insert_at(&mut self, registration: Registration) -> Option<Registration> {
        let key = registration.entry.key.to_string();
        let previous = self.remove(&key);

        let entry = &registration.entry;
        if let Some(capability) = &entry.shape.capability {
            add_row(self.capabilities.entry(capability.token).or_default(), registration.seq, &key);
        }
        add_row(self.produced.entry(entry.shape.produced).or_default(), registration.seq, &key);
        self.providers.insert(key, registration);

        previous
    }

    pub(crate) fn remove(&mut self, key: &str) -> Option<Registration> {
        let previous = self.providers.remove(key)?;
        let shape = &previous.entry.shape;
        if let Some(capability) = &shape.capability {
            remove_row(&mut self.capabilities, capability.token, key);
        }
        remove_row(&mut self.produced, shape.produced, key);
        Some(previous)
    }

    /// Find the key that provides `token`
    ///
    /// Capabilities are matched first, then produced types. More than one
    /// producer of the same type is ambiguous.
    pub(crate) fn key_for(&self, token: TypeToken) -> Result<String> {
        if let Some((_, key)) = self.capabilities.get(&token).and_then(|rows| rows.last()) {
            return Ok(key.clone());
        }
        match self.produced.get(&token).map(Vec::as_slice) {
            Some([(_, key)]) => Ok(key.clone()),
            Some(rows) if rows.len() > 1 => Err(Error::ambiguous(
                token,
                rows.iter().map(|(_, key)| key.clone()).collect(),
            )),
            _ => Err(Error::no_provider_for(token)),
        }
    }
}

fn add_row(rows: &mut Rows, seq: u64, key: &str) {
    let position = rows.partition_point(|(existing, _)| *existing < seq);
    rows.insert(position, (seq, key.to_string()));
}

fn remove_row(index: &mut HashMap<TypeToken, Rows>, token: TypeToken, key: &str) {
    if let Some(rows) = index.get_mut(&token) {
        rows.retain(|(_, k)| k != key);
        if rows.is_empty() {
            index.remove(&token);
        }
    }
}
