//! Filter bounds and per-run options.

use std::collections::BTreeSet;

use chrono_tz::Tz;

/// Object key of the session used by normal runs.
pub const DEFAULT_SESSION_KEY: &str = "session.json";

/// Object key of the alternate session used when debugging.
pub const DEBUG_SESSION_KEY: &str = "debug.json";

/// Bounds a shift must satisfy to be workable.
#[derive(Debug, Clone, PartialEq)]
pub struct FilterConfig {
    /// Longest acceptable journey to the venue, in hours.
    pub max_outbound_hours: f64,
    /// Longest acceptable journey home, in hours.
    pub max_return_hours: f64,
    /// Shifts starting more than this many whole days ahead are skipped.
    pub max_days_from_now: i64,
    /// Venue names that are never workable.
    pub blacklisted_venues: BTreeSet<String>,
    /// Timezone of log timestamps and notification times.
    pub timezone: Tz,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            max_outbound_hours: 2.0,
            max_return_hours: 2.0,
            max_days_from_now: 12,
            blacklisted_venues: BTreeSet::new(),
            timezone: chrono_tz::Europe::London,
        }
    }
}

impl FilterConfig {
    pub fn is_blacklisted(&self, venue_name: &str) -> bool {
        self.blacklisted_venues.contains(venue_name)
    }
}

/// Options controlling a single run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunOptions {
    /// Return failures to the caller instead of notifying about them.
    pub debug: bool,
    /// Object key of the session to load and save.
    pub session_key: String,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            debug: false,
            session_key: DEFAULT_SESSION_KEY.to_string(),
        }
    }
}
