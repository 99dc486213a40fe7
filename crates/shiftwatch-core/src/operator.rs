//! Operator actions on a stored session, outside of a polling run.
//!
//! These only touch the auth part of the session, so they need the object
//! store (and, for logout, the marketplace) but none of the run settings.

use shiftwatch_marketplace::Marketplace;
use shiftwatch_storage::ObjectStore;
use tracing::info;

use crate::{CoreError, Session};

async fn require_session(
    store: &dyn ObjectStore,
    key: &str,
) -> Result<(Session, Vec<u8>), CoreError> {
    let bytes = store
        .get(key)
        .await?
        .ok_or_else(|| CoreError::NotAuthenticated(format!("no session stored at {}", key)))?;
    let session = Session::decode(&bytes)?;
    Ok((session, bytes))
}

/// Revoke the stored access token and persist the logged-out session.
///
/// The session is saved even when the revoke request fails.
pub async fn logout(
    store: &dyn ObjectStore,
    api: &dyn Marketplace,
    key: &str,
) -> Result<(), CoreError> {
    let (mut session, loaded) = require_session(store, key).await?;
    let result = session.auth.logout(api).await;
    session.save_if_changed(store, key, Some(&loaded)).await?;
    result
}

/// Clear a rejected login so the next run logs in again.
///
/// Returns whether the stored session was in the rejected state.
pub async fn reset_login(store: &dyn ObjectStore, key: &str) -> Result<bool, CoreError> {
    let (mut session, loaded) = require_session(store, key).await?;
    let cleared = session.auth.clear_login_failure();
    if cleared {
        info!(key, "cleared login failure");
    }
    session.save_if_changed(store, key, Some(&loaded)).await?;
    Ok(cleared)
}
