//! One polling run, from loading the session to saving it back.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{DateTime, FixedOffset, Utc};
use shiftwatch_maps::Maps;
use shiftwatch_marketplace::{Credentials, Marketplace};
use shiftwatch_notify::{Notification, Notifier};
use shiftwatch_storage::ObjectStore;
use tracing::{error, info};

use crate::{AuthState, CoreError, FilterConfig, RunOptions, Session, ShiftSummary};

/// Static configuration of a [`Runner`].
#[derive(Debug, Clone)]
pub struct RunnerConfig {
    pub credentials: Credentials,
    pub filter: FilterConfig,
    /// Place identifier of the account holder's home.
    pub home_place_id: String,
}

/// What a successful run did.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunReport {
    /// Whether a persisted session was found.
    pub restored: bool,
    /// Jobs in the offer listing.
    pub jobs: usize,
    /// Shift ids forgotten because they left the listing.
    pub pruned: usize,
    /// Shifts that became workable in this run.
    pub new_shifts: BTreeMap<String, ShiftSummary>,
    /// Whether the session was written back.
    pub saved: bool,
}

/// Result of [`Runner::run`].
#[derive(Debug)]
pub enum RunOutcome {
    Completed(RunReport),
    /// The run failed and subscribers were told about it.
    Failed(CoreError),
}

/// Runs the polling pipeline against its collaborators.
pub struct Runner {
    config: RunnerConfig,
    marketplace: Arc<dyn Marketplace>,
    maps: Arc<dyn Maps>,
    store: Arc<dyn ObjectStore>,
    notifier: Arc<dyn Notifier>,
}

impl Runner {
    pub fn new(
        config: RunnerConfig,
        marketplace: Arc<dyn Marketplace>,
        maps: Arc<dyn Maps>,
        store: Arc<dyn ObjectStore>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            config,
            marketplace,
            maps,
            store,
            notifier,
        }
    }

    fn local_time(&self, now: DateTime<Utc>) -> DateTime<FixedOffset> {
        now.with_timezone(&self.config.filter.timezone).fixed_offset()
    }

    /// Run the pipeline once.
    ///
    /// Failures are reported to subscribers and returned as
    /// [`RunOutcome::Failed`], unless `options.debug` is set, in which case
    /// they are returned as errors.
    pub async fn run(&self, options: &RunOptions) -> Result<RunOutcome, CoreError> {
        self.run_at(options, Utc::now()).await
    }

    /// [`Runner::run`] with an explicit clock.
    pub async fn run_at(
        &self,
        options: &RunOptions,
        now: DateTime<Utc>,
    ) -> Result<RunOutcome, CoreError> {
        match self.run_pipeline(options, now).await {
            Ok(report) => Ok(RunOutcome::Completed(report)),
            Err(e) if options.debug => Err(e),
            Err(e) => {
                error!(error = %e, "run failed");
                let notification = Notification::failure(self.local_time(now), e.report());
                if let Err(notify_err) = self.notifier.notify(&notification).await {
                    error!(error = %notify_err, "failed to send failure notification");
                }
                Ok(RunOutcome::Failed(e))
            }
        }
    }

    #[tracing::instrument(skip(self, now), fields(session = %options.session_key))]
    async fn run_pipeline(
        &self,
        options: &RunOptions,
        now: DateTime<Utc>,
    ) -> Result<RunReport, CoreError> {
        let key = options.session_key.as_str();
        let loaded = self.store.get(key).await?;
        let mut session = match &loaded {
            Some(bytes) => {
                info!("restored session");
                Session::from_bytes(bytes, &self.config.home_place_id)?
            }
            None => {
                info!("no session found; starting a new one");
                Session::new(&self.config.home_place_id)
            }
        };

        let mut report = RunReport {
            restored: loaded.is_some(),
            ..Default::default()
        };

        match self.advance(&mut session, &mut report, now).await {
            Ok(()) => {
                report.saved = session
                    .save_if_changed(self.store.as_ref(), key, loaded.as_deref())
                    .await?;
                Ok(report)
            }
            Err(e @ CoreError::LoginRejected(_)) => {
                // Keep the rejection so later runs do not retry the login.
                session
                    .save_if_changed(self.store.as_ref(), key, loaded.as_deref())
                    .await?;
                Err(e)
            }
            Err(e) => Err(e),
        }
    }

    async fn advance(
        &self,
        session: &mut Session,
        report: &mut RunReport,
        now: DateTime<Utc>,
    ) -> Result<(), CoreError> {
        let marketplace = self.marketplace.as_ref();
        let credentials = &self.config.credentials;

        if session.auth.state() == AuthState::LoggedOut {
            session.auth.login(marketplace, credentials).await?;
        }

        let listing = session.auth.fetch_offered(marketplace, credentials).await?;
        report.jobs = listing.len();
        report.pruned = session.ledger.prune_expired(&listing);

        let new_shifts = session
            .evaluate(&listing, &self.config.filter, self.maps.as_ref(), now)
            .await?;

        if new_shifts.is_empty() {
            info!("no new workable shifts");
        } else {
            let notification = Notification::shifts(self.local_time(now), &new_shifts)?;
            let delivery = self.notifier.notify(&notification).await?;
            info!(
                shifts = new_shifts.len(),
                delivered = delivery.delivered,
                dropped = delivery.dropped,
                failed = delivery.failed,
                "notified subscribers"
            );
        }
        report.new_shifts = new_shifts;
        Ok(())
    }

    /// The persisted session, if any.
    pub async fn load_session(&self, key: &str) -> Result<Option<Session>, CoreError> {
        match self.store.get(key).await? {
            Some(bytes) => Ok(Some(Session::from_bytes(
                &bytes,
                &self.config.home_place_id,
            )?)),
            None => Ok(None),
        }
    }
}
