use std::collections::HashSet;

use tracing::debug;

use super::params::recover_request;
use super::transition::{LifecycleRules, ReportAction};
use crate::error::ReportError;
use crate::model::{Report, ReportRequest};

/// A regeneration that passed every local check and is ready to be sent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegenerationPlan {
    pub original_id: String,
    pub request: ReportRequest,
}

/// The client's collection of report jobs, newest first.
///
/// Every mutation here is synchronous and all-or-nothing; the network half
/// of each operation happens in the orchestrator before the matching
/// `apply_*`/`finish_*` call commits the result.
#[derive(Debug, Clone, Default)]
pub struct ReportStore {
    reports: Vec<Report>,
    deleting: HashSet<String>,
    regenerating: HashSet<String>,
}

impl ReportStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reports(&self) -> &[Report] {
        &self.reports
    }

    pub fn len(&self) -> usize {
        self.reports.len()
    }

    pub fn is_empty(&self) -> bool {
        self.reports.is_empty()
    }

    pub fn get(&self, report_id: &str) -> Option<&Report> {
        self.reports.iter().find(|r| r.id == report_id)
    }

    fn position(&self, report_id: &str) -> Option<usize> {
        self.reports.iter().position(|r| r.id == report_id)
    }

    /// Replaces the whole collection with a fresh listing.
    ///
    /// Sorted newest first; ties keep the service's order. Duplicate ids
    /// keep their first occurrence.
    pub fn replace_all(&mut self, mut reports: Vec<Report>) {
        reports.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        let mut seen = HashSet::new();
        reports.retain(|r| seen.insert(r.id.clone()));
        debug!(count = reports.len(), "report collection reloaded");
        self.reports = reports;
    }

    /// Prepends a freshly generated report.
    ///
    /// The service always hands out a new id; should it ever reuse one,
    /// the stale entry is dropped so ids stay unique.
    pub fn insert_generated(&mut self, report: Report) {
        if let Some(index) = self.position(&report.id) {
            self.reports.remove(index);
        }
        self.reports.insert(0, report);
    }

    /// Overwrites the entry with the same id, keeping its position.
    ///
    /// Returns false, without inserting, when the id is no longer tracked
    /// (e.g. it was deleted while the refresh was in flight).
    pub fn apply_refresh(&mut self, report: Report) -> bool {
        match self.position(&report.id) {
            Some(index) => {
                self.reports[index] = report;
                true
            }
            None => false,
        }
    }

    pub fn is_deleting(&self, report_id: &str) -> bool {
        self.deleting.contains(report_id)
    }

    /// Marks `report_id` as being deleted.
    ///
    /// Rejected when a delete of the same id is already outstanding or the
    /// report is IN_PROGRESS. Ids unknown locally are let through; the
    /// service decides.
    pub fn begin_delete(&mut self, report_id: &str) -> Result<(), ReportError> {
        if self.deleting.contains(report_id) {
            return Err(ReportError::DeleteInProgress(report_id.to_string()));
        }
        if let Some(report) = self.get(report_id) {
            LifecycleRules::check(report, ReportAction::Delete)?;
        }
        self.deleting.insert(report_id.to_string());
        Ok(())
    }

    /// Clears the in-flight marker and, when the remote delete succeeded,
    /// removes the entry. Returns the removed report.
    pub fn finish_delete(&mut self, report_id: &str, succeeded: bool) -> Option<Report> {
        self.deleting.remove(report_id);
        if !succeeded {
            return None;
        }
        self.position(report_id).map(|index| self.reports.remove(index))
    }

    /// Releases the marker without touching the collection.
    pub fn abandon_delete(&mut self, report_id: &str) {
        self.deleting.remove(report_id);
    }

    pub fn is_regenerating(&self, report_id: &str) -> bool {
        self.regenerating.contains(report_id)
    }

    /// Checks that `report_id` can be regenerated and rebuilds its request.
    pub fn plan_regeneration(&self, report_id: &str) -> Result<RegenerationPlan, ReportError> {
        let report = self
            .get(report_id)
            .ok_or_else(|| ReportError::NotFound(report_id.to_string()))?;
        LifecycleRules::check(report, ReportAction::Regenerate)?;
        let request = recover_request(report)?;
        Ok(RegenerationPlan {
            original_id: report_id.to_string(),
            request,
        })
    }

    /// Plans a regeneration and marks `report_id` as being regenerated.
    ///
    /// Rejected while a delete or another regeneration of the same id is
    /// outstanding, so one report never turns into two jobs.
    pub fn begin_regeneration(&mut self, report_id: &str) -> Result<RegenerationPlan, ReportError> {
        if self.deleting.contains(report_id) {
            return Err(ReportError::DeleteInProgress(report_id.to_string()));
        }
        if self.regenerating.contains(report_id) {
            return Err(ReportError::RegenerateInProgress(report_id.to_string()));
        }
        let plan = self.plan_regeneration(report_id)?;
        self.regenerating.insert(report_id.to_string());
        Ok(plan)
    }

    /// Clears the marker and swaps in the replacement.
    pub fn finish_regeneration(&mut self, original_id: &str, replacement: Report) {
        self.regenerating.remove(original_id);
        self.apply_regeneration(original_id, replacement);
    }

    /// Releases the marker without touching the collection.
    pub fn abandon_regeneration(&mut self, report_id: &str) {
        self.regenerating.remove(report_id);
    }

    /// Swaps the original report for its replacement in one step.
    pub fn apply_regeneration(&mut self, original_id: &str, replacement: Report) {
        self.reports.retain(|r| r.id != original_id);
        self.insert_generated(replacement);
    }
}
