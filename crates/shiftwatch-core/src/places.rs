//! Memoized resolution of locations to place identifiers.

use std::collections::BTreeMap;

use shiftwatch_maps::Maps;
use shiftwatch_marketplace::GeoPoint;
use tracing::{debug, info};

use crate::CoreError;

/// Cache key of the account holder's home.
pub const HOME_KEY: &str = "home";

/// Something that can be turned into a place identifier.
#[derive(Debug, Clone, Copy)]
pub enum Location<'a> {
    Home,
    Point(&'a GeoPoint),
}

impl Location<'_> {
    /// Cache key: [`HOME_KEY`] or `"{latitude},{longitude}"`.
    ///
    /// Coordinates are written as the shortest text that reads back as the
    /// same number, so `51.5070` and `51.507` share a key.
    pub fn cache_key(&self) -> String {
        match self {
            Location::Home => HOME_KEY.to_string(),
            Location::Point(p) => format!("{},{}", p.latitude, p.longitude),
        }
    }
}

/// Cache key to place identifier. Entries are never evicted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PlaceCache {
    entries: BTreeMap<String, String>,
}

impl PlaceCache {
    /// A cache seeded with the home place.
    pub fn with_home(home_place_id: impl Into<String>) -> Self {
        let mut entries = BTreeMap::new();
        entries.insert(HOME_KEY.to_string(), home_place_id.into());
        Self { entries }
    }

    pub fn from_entries(entries: BTreeMap<String, String>) -> Self {
        Self { entries }
    }

    pub fn entries(&self) -> &BTreeMap<String, String> {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Seed the home entry if a restored cache lacks one.
    pub fn ensure_home(&mut self, home_place_id: &str) {
        self.entries
            .entry(HOME_KEY.to_string())
            .or_insert_with(|| home_place_id.to_string());
    }

    pub fn get(&self, location: Location<'_>) -> Option<&str> {
        self.entries.get(&location.cache_key()).map(String::as_str)
    }

    /// Place identifier for `location`, reverse geocoding on a miss.
    ///
    /// The first candidate returned by the geocoder is cached. No candidates
    /// is a [`CoreError::PlaceNotFound`].
    pub async fn resolve(
        &mut self,
        location: Location<'_>,
        maps: &dyn Maps,
    ) -> Result<String, CoreError> {
        let key = location.cache_key();
        if let Some(place) = self.entries.get(&key) {
            debug!(key = %key, "place cache hit");
            return Ok(place.clone());
        }

        let Location::Point(point) = location else {
            return Err(CoreError::PlaceNotFound(key));
        };

        let (Some(latitude), Some(longitude)) = (point.latitude.as_f64(), point.longitude.as_f64())
        else {
            return Err(CoreError::PlaceNotFound(key));
        };

        let place = maps
            .reverse_geocode(latitude, longitude)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| CoreError::PlaceNotFound(key.clone()))?;

        info!(key = %key, place = %place, "resolved new place");
        self.entries.insert(key, place.clone());
        Ok(place)
    }
}
