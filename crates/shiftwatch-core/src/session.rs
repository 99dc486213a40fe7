//! The persisted session aggregate.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use shiftwatch_storage::ObjectStore;
use tracing::{debug, info};

use crate::{Auth, AuthState, CoreError, PlaceCache, ShiftLedger, ShiftSummary};

/// Wire form of a [`Session`].
///
/// Maps and sets are ordered so that serializing an unchanged session
/// produces identical bytes.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SessionSnapshot {
    pub logged_in: bool,
    pub login_failed: bool,
    pub access_token: Option<String>,
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub place_cache: BTreeMap<String, String>,
    #[serde(default)]
    pub workable_shifts: BTreeMap<String, ShiftSummary>,
    #[serde(default)]
    pub log: Vec<String>,
    #[serde(default)]
    pub parsed_shift_ids: BTreeSet<String>,
}

/// Everything a run carries over to the next one.
#[derive(Debug, Clone, PartialEq)]
pub struct Session {
    pub auth: Auth,
    pub places: PlaceCache,
    pub ledger: ShiftLedger,
    /// Rejected shifts, oldest first.
    pub log: Vec<String>,
}

impl Session {
    /// A logged-out session with an empty ledger.
    pub fn new(home_place_id: &str) -> Self {
        Self {
            auth: Auth::default(),
            places: PlaceCache::with_home(home_place_id),
            ledger: ShiftLedger::new(),
            log: Vec::new(),
        }
    }

    /// Decode a persisted session, seeding the home place if it is missing.
    pub fn from_bytes(bytes: &[u8], home_place_id: &str) -> Result<Self, CoreError> {
        let mut session = Self::decode(bytes)?;
        session.places.ensure_home(home_place_id);
        Ok(session)
    }

    /// Decode a persisted session as stored.
    pub fn decode(bytes: &[u8]) -> Result<Self, CoreError> {
        let snapshot: SessionSnapshot = serde_json::from_slice(bytes)?;
        Ok(Self::from(snapshot))
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>, CoreError> {
        Ok(serde_json::to_vec_pretty(&self.snapshot())?)
    }

    /// Write the session to `key` unless its bytes equal `loaded`.
    ///
    /// Returns whether a write happened.
    pub async fn save_if_changed(
        &self,
        store: &dyn ObjectStore,
        key: &str,
        loaded: Option<&[u8]>,
    ) -> Result<bool, CoreError> {
        let bytes = self.to_bytes()?;
        if loaded == Some(bytes.as_slice()) {
            debug!(key, "session unchanged");
            return Ok(false);
        }
        store.put(key, &bytes).await?;
        info!(key, bytes = bytes.len(), "session saved");
        Ok(true)
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            logged_in: self.auth.state() == AuthState::LoggedIn,
            login_failed: self.auth.state() == AuthState::LoginFailed,
            access_token: self.auth.access_token().map(str::to_string),
            refresh_token: self.auth.refresh_token().map(str::to_string),
            place_cache: self.places.entries().clone(),
            workable_shifts: self.ledger.workable().clone(),
            log: self.log.clone(),
            parsed_shift_ids: self.ledger.parsed().clone(),
        }
    }
}

impl From<SessionSnapshot> for Session {
    fn from(snapshot: SessionSnapshot) -> Self {
        Self {
            auth: Auth::from_parts(
                snapshot.logged_in,
                snapshot.login_failed,
                snapshot.access_token,
                snapshot.refresh_token,
            ),
            places: PlaceCache::from_entries(snapshot.place_cache),
            ledger: ShiftLedger::from_parts(snapshot.parsed_shift_ids, snapshot.workable_shifts),
            log: snapshot.log,
        }
    }
}
