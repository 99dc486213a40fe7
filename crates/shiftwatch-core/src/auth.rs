//! Authentication state machine and the offer-fetch recovery protocol.

use shiftwatch_marketplace::{Credentials, Job, Marketplace, TokenPair};
use tracing::{debug, info, warn};

use crate::CoreError;

/// Where the session stands with the marketplace.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum AuthState {
    #[default]
    LoggedOut,
    LoggedIn,
    /// A login was rejected. No further login is attempted until an
    /// operator clears this state.
    LoginFailed,
}

/// Tokens plus the state they were obtained in.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Auth {
    state: AuthState,
    access_token: Option<String>,
    refresh_token: Option<String>,
}

impl Auth {
    /// Rebuild from the persisted flags. `login_failed` wins over `logged_in`.
    pub fn from_parts(
        logged_in: bool,
        login_failed: bool,
        access_token: Option<String>,
        refresh_token: Option<String>,
    ) -> Self {
        let state = if login_failed {
            AuthState::LoginFailed
        } else if logged_in {
            AuthState::LoggedIn
        } else {
            AuthState::LoggedOut
        };
        Self {
            state,
            access_token,
            refresh_token,
        }
    }

    pub fn state(&self) -> AuthState {
        self.state
    }

    pub fn is_logged_in(&self) -> bool {
        self.state == AuthState::LoggedIn
    }

    pub fn access_token(&self) -> Option<&str> {
        self.access_token.as_deref()
    }

    pub fn refresh_token(&self) -> Option<&str> {
        self.refresh_token.as_deref()
    }

    /// Operator action: forget a rejected login so the next run tries again.
    ///
    /// Returns whether there was anything to clear.
    pub fn clear_login_failure(&mut self) -> bool {
        if self.state != AuthState::LoginFailed {
            return false;
        }
        self.state = AuthState::LoggedOut;
        true
    }

    fn set_tokens(&mut self, tokens: TokenPair) {
        self.access_token = Some(tokens.access_token);
        self.refresh_token = Some(tokens.refresh_token);
    }

    /// Log in with the account credentials.
    ///
    /// Does nothing once a login has been rejected. A non-success answer from
    /// the server moves the session to [`AuthState::LoginFailed`] and is
    /// returned as [`CoreError::LoginRejected`]. A request that never got an
    /// answer leaves the session logged out.
    pub async fn login(
        &mut self,
        api: &dyn Marketplace,
        credentials: &Credentials,
    ) -> Result<(), CoreError> {
        if self.state == AuthState::LoginFailed {
            warn!("login failed previously; not attempting to log in again");
            return Ok(());
        }
        self.state = AuthState::LoggedOut;

        info!("attempting to log in");
        match api.login(credentials).await {
            Ok(tokens) => {
                self.set_tokens(tokens);
                self.state = AuthState::LoggedIn;
                info!("login successful");
                Ok(())
            }
            Err(e) if e.is_rejection() => {
                self.state = AuthState::LoginFailed;
                warn!(error = %e, "login rejected");
                Err(CoreError::LoginRejected(e))
            }
            Err(e) => {
                warn!(error = %e, "login request failed");
                Err(CoreError::Marketplace(e))
            }
        }
    }

    /// Exchange the refresh token for a new token pair.
    ///
    /// Returns `Ok(false)` without a request when not logged in. On failure
    /// the state and tokens are left as they were and the error is returned
    /// for the caller to inspect.
    pub async fn refresh(&mut self, api: &dyn Marketplace) -> Result<bool, CoreError> {
        if self.state != AuthState::LoggedIn {
            warn!("unable to refresh token: not logged in");
            return Ok(false);
        }

        let (Some(access_token), Some(refresh_token)) =
            (self.access_token.clone(), self.refresh_token.clone())
        else {
            return Err(CoreError::NotAuthenticated(
                "session has no tokens to refresh".to_string(),
            ));
        };

        info!("refreshing token");
        let tokens = api
            .refresh(&TokenPair {
                access_token,
                refresh_token,
            })
            .await?;
        self.set_tokens(tokens);
        info!("refresh successful");
        Ok(true)
    }

    /// Revoke the access token.
    ///
    /// The session leaves [`AuthState::LoggedIn`] even if the revoke request
    /// fails; that failure is still returned. A rejected login stays rejected.
    pub async fn logout(&mut self, api: &dyn Marketplace) -> Result<(), CoreError> {
        let token = self
            .access_token
            .clone()
            .ok_or_else(|| CoreError::NotAuthenticated("no access token to revoke".to_string()))?;

        info!("revoking access token");
        let result = api.revoke(&token).await;
        if self.state != AuthState::LoginFailed {
            self.state = AuthState::LoggedOut;
        }
        result.map_err(CoreError::from)
    }

    async fn fetch_once(&self, api: &dyn Marketplace) -> Result<Vec<Job>, CoreError> {
        let token = match (&self.state, &self.access_token) {
            (AuthState::LoggedIn, Some(token)) => token,
            _ => {
                return Err(CoreError::NotAuthenticated(
                    "unable to get jobs: not logged in".to_string(),
                ));
            }
        };
        debug!("getting offered jobs");
        Ok(api.offered_jobs(token).await?)
    }

    /// Fetch the offered jobs, recovering once from an expired token.
    ///
    /// On a 401 the token is refreshed and the fetch retried. If the refresh
    /// itself is unauthorized, a fresh login is attempted before the single
    /// retry. Any other failure is returned immediately.
    pub async fn fetch_offered(
        &mut self,
        api: &dyn Marketplace,
        credentials: &Credentials,
    ) -> Result<Vec<Job>, CoreError> {
        match self.fetch_once(api).await {
            Err(CoreError::Marketplace(e)) if e.is_unauthorized() => {
                warn!("getting jobs returned 401; attempting to refresh token");
            }
            other => return other,
        }

        match self.refresh(api).await {
            Ok(true) => self.fetch_once(api).await,
            Ok(false) => Err(CoreError::NotAuthenticated(
                "token expired and session cannot be refreshed".to_string(),
            )),
            Err(CoreError::Marketplace(e)) if e.is_unauthorized() => {
                warn!("refresh returned 401; attempting to log in again");
                self.login(api, credentials).await?;
                self.fetch_once(api).await
            }
            Err(e) => Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{GARBLED, ScriptedMarketplace, credentials, tokens};
    use shiftwatch_marketplace::MarketplaceError;

    fn logged_in() -> Auth {
        Auth::from_parts(true, false, Some("a0".to_string()), Some("r0".to_string()))
    }

    #[test]
    fn test_from_parts_state_mapping() {
        assert_eq!(
            Auth::from_parts(false, false, None, None).state(),
            AuthState::LoggedOut
        );
        assert_eq!(
            Auth::from_parts(true, false, None, None).state(),
            AuthState::LoggedIn
        );
        assert_eq!(
            Auth::from_parts(true, true, None, None).state(),
            AuthState::LoginFailed
        );
    }

    #[tokio::test]
    async fn test_login_success_sets_tokens() {
        let api = ScriptedMarketplace::new().login(Ok(tokens("a1", "r1")));
        let mut auth = Auth::default();

        auth.login(&api, &credentials()).await.unwrap();

        assert_eq!(auth.state(), AuthState::LoggedIn);
        assert_eq!(auth.access_token(), Some("a1"));
        assert_eq!(auth.refresh_token(), Some("r1"));
    }

    #[tokio::test]
    async fn test_login_failure_is_sticky() {
        let api = ScriptedMarketplace::new().login(Err(403));
        let mut auth = Auth::default();

        let err = auth.login(&api, &credentials()).await.unwrap_err();
        assert!(matches!(err, CoreError::LoginRejected(_)));
        assert_eq!(auth.state(), AuthState::LoginFailed);

        // Second attempt makes no request.
        auth.login(&api, &credentials()).await.unwrap();
        assert_eq!(api.login_calls(), 1);
        assert_eq!(auth.state(), AuthState::LoginFailed);
    }

    #[tokio::test]
    async fn test_unreadable_login_answer_is_not_sticky() {
        let api = ScriptedMarketplace::new()
            .login(Err(GARBLED))
            .login(Ok(tokens("a1", "r1")));
        let mut auth = Auth::default();

        let err = auth.login(&api, &credentials()).await.unwrap_err();
        assert!(matches!(err, CoreError::Marketplace(MarketplaceError::InvalidResponse(_))));
        assert_eq!(auth.state(), AuthState::LoggedOut);

        auth.login(&api, &credentials()).await.unwrap();
        assert_eq!(api.login_calls(), 2);
        assert_eq!(auth.state(), AuthState::LoggedIn);
    }

    #[tokio::test]
    async fn test_clear_login_failure() {
        let mut auth = Auth::from_parts(false, true, None, None);
        assert!(auth.clear_login_failure());
        assert_eq!(auth.state(), AuthState::LoggedOut);
        assert!(!auth.clear_login_failure());
    }

    #[tokio::test]
    async fn test_refresh_skipped_when_logged_out() {
        let api = ScriptedMarketplace::new();
        let mut auth = Auth::default();

        assert!(!auth.refresh(&api).await.unwrap());
        assert_eq!(api.refresh_calls(), 0);
    }

    #[tokio::test]
    async fn test_refresh_failure_leaves_tokens() {
        let api = ScriptedMarketplace::new().refresh(Err(500));
        let mut auth = logged_in();

        let err = auth.refresh(&api).await.unwrap_err();

        assert!(matches!(err, CoreError::Marketplace(ref e) if e.status() == Some(500)));
        assert_eq!(auth, logged_in());
    }

    #[tokio::test]
    async fn test_logout_transitions_even_when_revoke_fails() {
        let api = ScriptedMarketplace::new().revoke(Err(500));
        let mut auth = logged_in();

        assert!(auth.logout(&api).await.is_err());
        assert_eq!(auth.state(), AuthState::LoggedOut);
    }

    #[tokio::test]
    async fn test_logout_success() {
        let api = ScriptedMarketplace::new().revoke(Ok(()));
        let mut auth = logged_in();

        auth.logout(&api).await.unwrap();
        assert_eq!(auth.state(), AuthState::LoggedOut);
        assert_eq!(api.revoked_tokens(), vec!["a0".to_string()]);
    }

    #[tokio::test]
    async fn test_fetch_requires_login() {
        let api = ScriptedMarketplace::new();
        let mut auth = Auth::default();

        let err = auth.fetch_offered(&api, &credentials()).await.unwrap_err();
        assert!(matches!(err, CoreError::NotAuthenticated(_)));
        assert_eq!(api.offered_calls(), 0);
    }

    #[tokio::test]
    async fn test_fetch_refreshes_after_401() {
        let api = ScriptedMarketplace::new()
            .offered(Err(401))
            .refresh(Ok(tokens("a1", "r1")))
            .offered(Ok(vec![]));
        let mut auth = logged_in();

        let jobs = auth.fetch_offered(&api, &credentials()).await.unwrap();

        assert!(jobs.is_empty());
        assert_eq!(auth.state(), AuthState::LoggedIn);
        assert_eq!(auth.access_token(), Some("a1"));
        assert_eq!(api.login_calls(), 0);
        assert_eq!(api.offered_tokens(), vec!["a0".to_string(), "a1".to_string()]);
    }

    #[tokio::test]
    async fn test_fetch_retry_failure_after_refresh_is_fatal() {
        let api = ScriptedMarketplace::new()
            .offered(Err(401))
            .refresh(Ok(tokens("a1", "r1")))
            .offered(Err(401));
        let mut auth = logged_in();

        let err = auth.fetch_offered(&api, &credentials()).await.unwrap_err();

        assert!(matches!(err, CoreError::Marketplace(ref e) if e.is_unauthorized()));
        assert_eq!(api.offered_calls(), 2);
        assert_eq!(api.refresh_calls(), 1);
    }

    #[tokio::test]
    async fn test_fetch_relogs_in_when_refresh_unauthorized() {
        let api = ScriptedMarketplace::new()
            .offered(Err(401))
            .refresh(Err(401))
            .login(Ok(tokens("a2", "r2")))
            .offered(Ok(vec![]));
        let mut auth = logged_in();

        auth.fetch_offered(&api, &credentials()).await.unwrap();

        assert_eq!(api.login_calls(), 1);
        assert_eq!(auth.access_token(), Some("a2"));
        assert_eq!(api.offered_tokens(), vec!["a0".to_string(), "a2".to_string()]);
    }

    #[tokio::test]
    async fn test_fetch_relogin_rejected() {
        let api = ScriptedMarketplace::new()
            .offered(Err(401))
            .refresh(Err(401))
            .login(Err(401));
        let mut auth = logged_in();

        let err = auth.fetch_offered(&api, &credentials()).await.unwrap_err();

        assert!(matches!(err, CoreError::LoginRejected(_)));
        assert_eq!(auth.state(), AuthState::LoginFailed);
        assert_eq!(api.offered_calls(), 1);
    }

    #[tokio::test]
    async fn test_fetch_other_refresh_failure_is_fatal() {
        let api = ScriptedMarketplace::new()
            .offered(Err(401))
            .refresh(Err(503));
        let mut auth = logged_in();

        let err = auth.fetch_offered(&api, &credentials()).await.unwrap_err();

        assert!(matches!(err, CoreError::Marketplace(ref e) if e.status() == Some(503)));
        assert_eq!(api.login_calls(), 0);
        assert_eq!(api.offered_calls(), 1);
    }

    #[tokio::test]
    async fn test_fetch_non_401_failure_is_not_recovered() {
        let api = ScriptedMarketplace::new().offered(Err(500));
        let mut auth = logged_in();

        let err = auth.fetch_offered(&api, &credentials()).await.unwrap_err();

        assert!(matches!(err, CoreError::Marketplace(ref e) if e.status() == Some(500)));
        assert_eq!(api.refresh_calls(), 0);
    }
}
