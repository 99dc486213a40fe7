//! Session state machine and shift evaluation pipeline.
//!
//! One run of the pipeline:
//! 1. restores the persisted [`Session`] (or logs in from scratch)
//! 2. fetches the offered jobs, recovering from an expired token
//! 3. prunes the [`ShiftLedger`] of shifts no longer offered
//! 4. evaluates new shifts against the [`FilterConfig`]
//! 5. notifies subscribers of newly workable shifts
//! 6. writes the session back if it changed
//!
//! Failures anywhere in the run are turned into a diagnostic notification
//! by [`Runner::run`] unless debug mode asks for them to be returned.
//!
//! [`operator`] holds the logout and login-reset actions on a stored session.

mod auth;
mod config;
mod error;
mod evaluator;
mod ledger;
pub mod operator;
mod places;
mod run;
mod session;

#[cfg(test)]
mod testing;

pub use auth::{Auth, AuthState};
pub use config::{DEBUG_SESSION_KEY, DEFAULT_SESSION_KEY, FilterConfig, RunOptions};
pub use error::CoreError;
pub use evaluator::ShiftSummary;
pub use ledger::ShiftLedger;
pub use places::{HOME_KEY, Location, PlaceCache};
pub use run::{RunOutcome, RunReport, Runner, RunnerConfig};
pub use session::{Session, SessionSnapshot};
