//! Record of every shift evaluated so far.

use std::collections::{BTreeMap, BTreeSet};

use shiftwatch_marketplace::Job;
use tracing::info;

use crate::ShiftSummary;

/// Shift ids already evaluated, plus the subset found workable.
///
/// Every key of the workable map is also in the parsed set.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ShiftLedger {
    parsed: BTreeSet<String>,
    workable: BTreeMap<String, ShiftSummary>,
}

impl ShiftLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild from persisted parts. Workable ids missing from the parsed set
    /// are added to it.
    pub fn from_parts(
        mut parsed: BTreeSet<String>,
        workable: BTreeMap<String, ShiftSummary>,
    ) -> Self {
        parsed.extend(workable.keys().cloned());
        Self { parsed, workable }
    }

    pub fn parsed(&self) -> &BTreeSet<String> {
        &self.parsed
    }

    pub fn workable(&self) -> &BTreeMap<String, ShiftSummary> {
        &self.workable
    }

    pub fn is_seen(&self, shift_id: &str) -> bool {
        self.parsed.contains(shift_id)
    }

    /// Returns `false` if the id was already seen.
    pub fn mark_seen(&mut self, shift_id: &str) -> bool {
        self.parsed.insert(shift_id.to_string())
    }

    pub fn accept(&mut self, shift_id: &str, summary: ShiftSummary) {
        self.parsed.insert(shift_id.to_string());
        self.workable.insert(shift_id.to_string(), summary);
    }

    /// Forget every shift absent from `listing`. Returns how many ids were removed.
    pub fn prune_expired(&mut self, listing: &[Job]) -> usize {
        let current: BTreeSet<&str> = listing
            .iter()
            .flat_map(|job| job.shifts.iter().map(|shift| shift.id.as_str()))
            .collect();

        let before = self.parsed.len();
        self.parsed.retain(|id| current.contains(id.as_str()));
        self.workable.retain(|id, _| current.contains(id.as_str()));
        let removed = before - self.parsed.len();

        if removed > 0 {
            info!(removed, "removed expired shifts");
        }
        removed
    }
}
