use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::StoreError;
use crate::model::{Airport, Favorite, RecentSearch};
use crate::storage::KeyValueStore;

pub const RECENT_SEARCHES_KEY: &str = "recentSearches";
pub const FAVORITES_KEY: &str = "favorites";
pub const MAX_RECENT_SEARCHES: usize = 5;
pub const SCHEMA_VERSION: u32 = 1;

#[derive(Deserialize)]
#[serde(untagged)]
enum Stored<T> {
    Versioned { version: u32, entries: Vec<T> },
    // bare arrays, as written before the schema carried a version
    Legacy(Vec<T>),
}

#[derive(Serialize)]
struct StoredRef<'a, T> {
    version: u32,
    entries: &'a [T],
}

fn decode<T: DeserializeOwned>(key: &str, raw: &str) -> Result<Vec<T>, StoreError> {
    let stored: Stored<T> = serde_json::from_str(raw).map_err(|e| StoreError::Malformed {
        key: key.to_string(),
        detail: e.to_string(),
    })?;

    match stored {
        Stored::Versioned { version, entries } if version == SCHEMA_VERSION => Ok(entries),
        Stored::Versioned { version, .. } => Err(StoreError::UnsupportedVersion {
            key: key.to_string(),
            version,
        }),
        Stored::Legacy(entries) => Ok(entries),
    }
}

fn encode<T: Serialize>(key: &str, entries: &[T]) -> Result<String, StoreError> {
    serde_json::to_string(&StoredRef {
        version: SCHEMA_VERSION,
        entries,
    })
    .map_err(|e| StoreError::Encode {
        key: key.to_string(),
        detail: e.to_string(),
    })
}

fn read_collection<T: DeserializeOwned, K: KeyValueStore>(
    storage: &K,
    key: &str,
) -> Result<Vec<T>, StoreError> {
    match storage.get(key)? {
        Some(raw) => decode(key, &raw),
        None => Ok(Vec::new()),
    }
}

fn load_or_empty<T: DeserializeOwned, K: KeyValueStore>(storage: &K, key: &str) -> Vec<T> {
    read_collection(storage, key).unwrap_or_else(|e| {
        warn!(key, error = %e, "discarding unreadable stored preferences");
        Vec::new()
    })
}

/// Recent searches and favorite routes, mirrored to durable storage after
/// every mutation. Routes are keyed by the `(origin, destination)` sky-id pair.
#[derive(Debug)]
pub struct PreferenceStore<K: KeyValueStore> {
    storage: K,
    recent: Vec<RecentSearch>,
    favorites: Vec<Favorite>,
}

impl<K: KeyValueStore> PreferenceStore<K> {
    /// Reads both collections. Absent or unreadable entries start empty.
    pub fn load(storage: K) -> Self {
        let recent = load_or_empty(&storage, RECENT_SEARCHES_KEY);
        let favorites = load_or_empty(&storage, FAVORITES_KEY);
        Self {
            storage,
            recent,
            favorites,
        }
    }

    pub fn recent_searches(&self) -> &[RecentSearch] {
        &self.recent
    }

    pub fn favorites(&self) -> &[Favorite] {
        &self.favorites
    }

    pub fn storage(&self) -> &K {
        &self.storage
    }

    /// Records a search at the front of the list. Any older entry for the same
    /// route is dropped and the list is capped. A search missing either
    /// airport is not recorded.
    pub fn add_recent_search(
        &mut self,
        origin: Option<Airport>,
        destination: Option<Airport>,
        date: Option<String>,
        return_date: Option<String>,
    ) -> Result<(), StoreError> {
        let (Some(origin), Some(destination)) = (origin, destination) else {
            return Ok(());
        };

        self.recent
            .retain(|s| !s.is_route(&origin.sky_id, &destination.sky_id));
        self.recent.insert(
            0,
            RecentSearch {
                origin: Some(origin),
                destination: Some(destination),
                date,
                return_date,
            },
        );
        self.recent.truncate(MAX_RECENT_SEARCHES);

        self.persist_recent()
    }

    /// Flips the route in or out of the favorites. Returns whether it is a
    /// favorite afterwards.
    pub fn toggle_favorite(
        &mut self,
        origin: &Airport,
        destination: &Airport,
    ) -> Result<bool, StoreError> {
        let before = self.favorites.len();
        self.favorites
            .retain(|f| !f.is_route(&origin.sky_id, &destination.sky_id));

        let now_favorite = self.favorites.len() == before;
        if now_favorite {
            self.favorites.push(Favorite {
                origin: origin.clone(),
                destination: destination.clone(),
            });
        }

        self.persist_favorites()?;
        Ok(now_favorite)
    }

    pub fn is_favorite(&self, origin_sky_id: &str, destination_sky_id: &str) -> bool {
        self.favorites
            .iter()
            .any(|f| f.is_route(origin_sky_id, destination_sky_id))
    }

    fn persist_recent(&mut self) -> Result<(), StoreError> {
        let raw = encode(RECENT_SEARCHES_KEY, &self.recent)?;
        self.storage.set(RECENT_SEARCHES_KEY, &raw)?;
        info!(count = self.recent.len(), "saved recent searches");
        Ok(())
    }

    fn persist_favorites(&mut self) -> Result<(), StoreError> {
        let raw = encode(FAVORITES_KEY, &self.favorites)?;
        self.storage.set(FAVORITES_KEY, &raw)?;
        info!(count = self.favorites.len(), "saved favorites");
        Ok(())
    }
}
