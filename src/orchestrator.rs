use std::collections::HashSet;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use chrono::Local;
use tokio::time::sleep;
use tracing::{debug, info, warn};

use crate::config::ClientConfig;
use crate::error::ReportError;
use crate::filter::{FilterQuery, filter};
use crate::gateway::{CleanupSummary, ReportArtifact, ReportGateway, ReportStatusSummary};
use crate::lifecycle::{RegenerationPlan, ReportStore};
use crate::model::{
    CertificationDefinition, DateRange, Employee, Report, ReportRequest, ReportType,
};
use crate::pagination::{PageCursor, PageView};
use crate::selection::SelectionSet;

/// The three independently paginated lists the client keeps.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum View {
    Employees,
    Certifications,
    Reports,
}

#[derive(Debug, Default)]
struct SessionState {
    employees: Vec<Employee>,
    departments: Vec<String>,
    /// Certifications eligible for the current employee selection.
    certifications: Vec<CertificationDefinition>,
    store: ReportStore,
    selected_employees: SelectionSet,
    selected_certifications: SelectionSet,
    date_range: DateRange,
    employee_filter: FilterQuery,
    certification_filter: FilterQuery,
    report_filter: FilterQuery,
    employee_cursor: PageCursor,
    certification_cursor: PageCursor,
    report_cursor: PageCursor,
    /// Bumped per eligibility request so late responses can be discarded.
    eligibility_generation: u64,
    loading: usize,
    error: Option<String>,
}

impl SessionState {
    fn with_page_size(page_size: usize) -> Self {
        Self {
            employee_cursor: PageCursor::new(page_size),
            certification_cursor: PageCursor::new(page_size),
            report_cursor: PageCursor::new(page_size),
            ..Self::default()
        }
    }

    fn cursor_mut(&mut self, view: View) -> &mut PageCursor {
        match view {
            View::Employees => &mut self.employee_cursor,
            View::Certifications => &mut self.certification_cursor,
            View::Reports => &mut self.report_cursor,
        }
    }

    fn filter_mut(&mut self, view: View) -> &mut FilterQuery {
        match view {
            View::Employees => &mut self.employee_filter,
            View::Certifications => &mut self.certification_filter,
            View::Reports => &mut self.report_filter,
        }
    }

    fn select_eligible_certification(&mut self, certification_id: &str) -> bool {
        if !self.certifications.iter().any(|c| c.id == certification_id) {
            debug!(certification_id, "ignoring selection of ineligible certification");
            return false;
        }
        self.selected_certifications.select(certification_id);
        true
    }

    fn filtered_len(&self, view: View) -> usize {
        match view {
            View::Employees => filter(&self.employees, &self.employee_filter).len(),
            View::Certifications => {
                filter(&self.certifications, &self.certification_filter).len()
            }
            View::Reports => filter(self.store.reports(), &self.report_filter).len(),
        }
    }
}

/// Read-only copy of the session handed to presentation code.
#[derive(Debug, Clone)]
pub struct SessionSnapshot {
    pub employees: Vec<Employee>,
    pub departments: Vec<String>,
    pub available_certifications: Vec<CertificationDefinition>,
    pub reports: Vec<Report>,
    pub selected_employee_ids: Vec<String>,
    pub selected_certification_ids: Vec<String>,
    pub date_range: DateRange,
    pub loading: bool,
    pub error: Option<String>,
}

fn lock(state: &Mutex<SessionState>) -> MutexGuard<'_, SessionState> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Counts an action as in flight for as long as it lives.
struct LoadingGuard<'a> {
    state: &'a Mutex<SessionState>,
}

impl<'a> LoadingGuard<'a> {
    fn start(state: &'a Mutex<SessionState>, clear_error: bool) -> Self {
        let mut guard = lock(state);
        guard.loading += 1;
        if clear_error {
            guard.error = None;
        }
        Self { state }
    }
}

impl Drop for LoadingGuard<'_> {
    fn drop(&mut self) {
        let mut guard = lock(self.state);
        guard.loading = guard.loading.saturating_sub(1);
    }
}

/// Holds the in-flight delete marker for one report id. The marker is
/// released on drop, so a failed or cancelled delete never leaves it set.
struct DeleteGuard<'a> {
    state: &'a Mutex<SessionState>,
    report_id: String,
}

impl<'a> DeleteGuard<'a> {
    fn acquire(state: &'a Mutex<SessionState>, report_id: &str) -> Result<Self, ReportError> {
        lock(state).store.begin_delete(report_id)?;
        Ok(Self {
            state,
            report_id: report_id.to_string(),
        })
    }

    fn commit(self) -> Option<Report> {
        let mut guard = lock(self.state);
        let removed = guard.store.finish_delete(&self.report_id, true);
        guard.report_cursor.reset();
        removed
    }
}

impl Drop for DeleteGuard<'_> {
    fn drop(&mut self) {
        lock(self.state).store.abandon_delete(&self.report_id);
    }
}

/// Holds the in-flight regeneration marker for one report id, released on
/// drop like [`DeleteGuard`].
struct RegenerateGuard<'a> {
    state: &'a Mutex<SessionState>,
    plan: RegenerationPlan,
}

impl<'a> RegenerateGuard<'a> {
    fn acquire(state: &'a Mutex<SessionState>, report_id: &str) -> Result<Self, ReportError> {
        let plan = lock(state).store.begin_regeneration(report_id)?;
        Ok(Self { state, plan })
    }

    fn commit(self, replacement: Report) {
        let mut guard = lock(self.state);
        guard
            .store
            .finish_regeneration(&self.plan.original_id, replacement);
        guard.report_cursor.reset();
    }
}

impl Drop for RegenerateGuard<'_> {
    fn drop(&mut self) {
        lock(self.state)
            .store
            .abandon_regeneration(&self.plan.original_id);
    }
}

/// Root state container for a report session.
///
/// Owns employees, certifications, reports, selections, filters and
/// pagination, and is the only place that talks to the gateway. Actions
/// take `&self`: state sits behind a mutex that is never held across an
/// `.await`, so other actions may run while a request is in flight.
pub struct ReportOrchestrator<G> {
    gateway: G,
    config: ClientConfig,
    state: Mutex<SessionState>,
}

impl<G: ReportGateway> ReportOrchestrator<G> {
    pub fn new(gateway: G, config: ClientConfig) -> Self {
        let state = SessionState::with_page_size(config.page_size);
        Self {
            gateway,
            config,
            state: Mutex::new(state),
        }
    }

    pub fn gateway(&self) -> &G {
        &self.gateway
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    fn state(&self) -> MutexGuard<'_, SessionState> {
        lock(&self.state)
    }

    // Every action funnels its result through here so the error slot
    // always holds the most recent failure.
    fn record<T>(&self, result: Result<T, ReportError>) -> Result<T, ReportError> {
        if let Err(err) = &result {
            warn!(error = %err, "action failed");
            self.state().error = Some(err.to_string());
        }
        result
    }

    // --- Snapshot accessors ---

    pub fn snapshot(&self) -> SessionSnapshot {
        let state = self.state();
        SessionSnapshot {
            employees: state.employees.clone(),
            departments: state.departments.clone(),
            available_certifications: state.certifications.clone(),
            reports: state.store.reports().to_vec(),
            selected_employee_ids: state.selected_employees.to_vec(),
            selected_certification_ids: state.selected_certifications.to_vec(),
            date_range: state.date_range,
            loading: state.loading > 0,
            error: state.error.clone(),
        }
    }

    pub fn reports(&self) -> Vec<Report> {
        self.state().store.reports().to_vec()
    }

    pub fn report(&self, report_id: &str) -> Option<Report> {
        self.state().store.get(report_id).cloned()
    }

    pub fn employees(&self) -> Vec<Employee> {
        self.state().employees.clone()
    }

    pub fn departments(&self) -> Vec<String> {
        self.state().departments.clone()
    }

    pub fn available_certifications(&self) -> Vec<CertificationDefinition> {
        self.state().certifications.clone()
    }

    pub fn selected_employee_ids(&self) -> Vec<String> {
        self.state().selected_employees.to_vec()
    }

    pub fn selected_certification_ids(&self) -> Vec<String> {
        self.state().selected_certifications.to_vec()
    }

    pub fn is_employee_selected(&self, employee_id: &str) -> bool {
        self.state().selected_employees.contains(employee_id)
    }

    pub fn is_deleting(&self, report_id: &str) -> bool {
        self.state().store.is_deleting(report_id)
    }

    pub fn is_regenerating(&self, report_id: &str) -> bool {
        self.state().store.is_regenerating(report_id)
    }

    pub fn is_loading(&self) -> bool {
        self.state().loading > 0
    }

    pub fn error(&self) -> Option<String> {
        self.state().error.clone()
    }

    pub fn clear_error(&self) {
        self.state().error = None;
    }

    // --- Loading ---

    /// Loads employees, departments, reports and eligible certifications
    /// side by side.
    pub async fn initialize(&self) -> Result<(), ReportError> {
        let (employees, departments, reports, certifications) = tokio::join!(
            self.load_employees(),
            self.load_departments(),
            self.load_reports(),
            self.refresh_available_certifications()
        );
        employees?;
        departments?;
        reports?;
        certifications
    }

    pub async fn load_employees(&self) -> Result<(), ReportError> {
        let _loading = LoadingGuard::start(&self.state, true);
        let result = self.gateway.list_employees().await.map(|employees| {
            info!(count = employees.len(), "employees loaded");
            let mut state = self.state();
            state.employees = employees;
            state.employee_cursor.reset();
        });
        self.record(result.map_err(ReportError::from))
    }

    pub async fn load_departments(&self) -> Result<(), ReportError> {
        let _loading = LoadingGuard::start(&self.state, true);
        let result = self.gateway.list_departments().await.map(|departments| {
            self.state().departments = departments;
        });
        self.record(result.map_err(ReportError::from))
    }

    pub async fn load_reports(&self) -> Result<(), ReportError> {
        let _loading = LoadingGuard::start(&self.state, true);
        let result = self.reload_reports().await;
        self.record(result)
    }

    async fn reload_reports(&self) -> Result<(), ReportError> {
        let reports = self.gateway.list_reports().await?;
        let mut state = self.state();
        state.store.replace_all(reports);
        state.report_cursor.reset();
        Ok(())
    }

    /// Recomputes which certifications the current employee selection
    /// makes eligible and drops selected certifications that no longer are.
    ///
    /// With no employee selected the full definition list is loaded and
    /// the certification selection is cleared. Only the response to the
    /// latest request is applied.
    pub async fn refresh_available_certifications(&self) -> Result<(), ReportError> {
        let (generation, employee_ids) = {
            let mut state = self.state();
            state.eligibility_generation += 1;
            (state.eligibility_generation, state.selected_employees.to_vec())
        };

        let result = if employee_ids.is_empty() {
            self.gateway.list_certification_definitions().await
        } else {
            self.gateway
                .available_certifications_for_employees(&employee_ids)
                .await
        };

        let is_current = || self.state().eligibility_generation == generation;
        let certifications = match result {
            Ok(certifications) => certifications,
            Err(err) if is_current() => return self.record(Err(err.into())),
            Err(err) => {
                debug!(error = %err, "ignoring failure of superseded eligibility request");
                return Ok(());
            }
        };

        let mut state = self.state();
        if state.eligibility_generation != generation {
            debug!(generation, "discarding superseded eligibility response");
            return Ok(());
        }
        if employee_ids.is_empty() {
            state.selected_certifications.clear();
        } else {
            let eligible: HashSet<&str> = certifications.iter().map(|c| c.id.as_str()).collect();
            let dropped = state
                .selected_certifications
                .retain(|id| eligible.contains(id));
            if !dropped.is_empty() {
                debug!(?dropped, "dropped certifications no longer eligible");
            }
        }
        state.certifications = certifications;
        state.certification_cursor.reset();
        Ok(())
    }

    // --- Employee selection ---

    async fn update_employee_selection<F>(&self, change: F) -> Result<(), ReportError>
    where
        F: FnOnce(&mut SelectionSet, &[Employee]) -> bool,
    {
        let changed = {
            let mut guard = self.state();
            let state = &mut *guard;
            change(&mut state.selected_employees, &state.employees)
        };
        if changed {
            self.refresh_available_certifications().await
        } else {
            Ok(())
        }
    }

    pub async fn select_employee(&self, employee_id: &str) -> Result<(), ReportError> {
        self.update_employee_selection(|selection, _| selection.select(employee_id))
            .await
    }

    pub async fn deselect_employee(&self, employee_id: &str) -> Result<(), ReportError> {
        self.update_employee_selection(|selection, _| selection.deselect(employee_id))
            .await
    }

    pub async fn toggle_employee(&self, employee_id: &str) -> Result<(), ReportError> {
        self.update_employee_selection(|selection, _| {
            selection.toggle(employee_id);
            true
        })
        .await
    }

    pub async fn select_all_employees(&self) -> Result<(), ReportError> {
        self.update_employee_selection(|selection, employees| {
            selection.select_all(employees.iter().map(|e| e.id.as_str()));
            true
        })
        .await
    }

    /// "Select all" checkbox: clears when everything is selected already.
    pub async fn toggle_all_employees(&self) -> Result<(), ReportError> {
        self.update_employee_selection(|selection, employees| {
            selection.toggle_all(employees.iter().map(|e| e.id.as_str()));
            true
        })
        .await
    }

    pub async fn clear_employee_selection(&self) -> Result<(), ReportError> {
        self.update_employee_selection(|selection, _| {
            let had_any = !selection.is_empty();
            selection.clear();
            had_any
        })
        .await
    }

    // --- Certification selection ---

    /// Selects a certification if it is eligible for the current employee
    /// selection. Returns whether it is selected afterwards.
    pub fn select_certification(&self, certification_id: &str) -> bool {
        self.state().select_eligible_certification(certification_id)
    }

    pub fn deselect_certification(&self, certification_id: &str) {
        self.state().selected_certifications.deselect(certification_id);
    }

    /// Check and mutation happen under one lock, so overlapping toggles of
    /// the same id cannot both select it.
    pub fn toggle_certification(&self, certification_id: &str) -> bool {
        let mut state = self.state();
        if state.selected_certifications.deselect(certification_id) {
            return false;
        }
        state.select_eligible_certification(certification_id)
    }

    pub fn select_all_certifications(&self) {
        let mut guard = self.state();
        let state = &mut *guard;
        state
            .selected_certifications
            .select_all(state.certifications.iter().map(|c| c.id.as_str()));
    }

    pub fn toggle_all_certifications(&self) {
        let mut guard = self.state();
        let state = &mut *guard;
        state
            .selected_certifications
            .toggle_all(state.certifications.iter().map(|c| c.id.as_str()));
    }

    pub fn clear_certification_selection(&self) {
        self.state().selected_certifications.clear();
    }

    // --- Date range ---

    pub fn date_range(&self) -> DateRange {
        self.state().date_range
    }

    pub fn set_date_range(&self, range: DateRange) -> Result<(), ReportError> {
        if !range.is_valid() {
            return self.record(Err(ReportError::Validation(
                "Start date must not be after end date".into(),
            )));
        }
        self.state().date_range = range;
        Ok(())
    }

    /// Sets the range to the last `days` days, ending today.
    pub fn set_last_days(&self, days: u32) -> Result<(), ReportError> {
        let Some(range) = DateRange::last_days(days, Local::now().date_naive()) else {
            return self.record(Err(ReportError::Validation(format!(
                "Cannot go back {days} days from today"
            ))));
        };
        self.state().date_range = range;
        Ok(())
    }

    pub fn clear_date_range(&self) {
        self.state().date_range = DateRange::default();
    }

    // --- Filtering and pagination ---

    /// Replaces the filter of `view`; the view goes back to page 1.
    pub fn set_filter(&self, view: View, query: FilterQuery) {
        let mut state = self.state();
        *state.filter_mut(view) = query;
        state.cursor_mut(view).reset();
    }

    pub fn set_search(&self, view: View, term: &str) {
        let mut state = self.state();
        state.filter_mut(view).search = term.to_string();
        state.cursor_mut(view).reset();
    }

    pub fn set_category(&self, view: View, category: Option<String>) {
        let mut state = self.state();
        state.filter_mut(view).category = category;
        state.cursor_mut(view).reset();
    }

    pub fn page(&self, view: View) -> usize {
        self.state().cursor_mut(view).page()
    }

    pub fn set_page(&self, view: View, page: usize) {
        let mut state = self.state();
        let total = state.filtered_len(view);
        state.cursor_mut(view).set_page(page, total);
    }

    pub fn next_page(&self, view: View) {
        let mut state = self.state();
        let total = state.filtered_len(view);
        state.cursor_mut(view).next(total);
    }

    pub fn previous_page(&self, view: View) {
        let mut state = self.state();
        let total = state.filtered_len(view);
        state.cursor_mut(view).previous(total);
    }

    pub fn set_page_size(&self, view: View, page_size: usize) {
        self.state().cursor_mut(view).set_page_size(page_size);
    }

    pub fn employee_page(&self) -> PageView<Employee> {
        let state = self.state();
        let filtered = filter(&state.employees, &state.employee_filter);
        state.employee_cursor.apply(&filtered).cloned_view()
    }

    pub fn certification_page(&self) -> PageView<CertificationDefinition> {
        let state = self.state();
        let filtered = filter(&state.certifications, &state.certification_filter);
        state.certification_cursor.apply(&filtered).cloned_view()
    }

    pub fn report_page(&self) -> PageView<Report> {
        let state = self.state();
        let filtered = filter(state.store.reports(), &state.report_filter);
        state.report_cursor.apply(&filtered).cloned_view()
    }

    // --- Report lifecycle ---

    /// Submits `request` and prepends the new report.
    ///
    /// An empty employee list fails locally without reaching the service.
    pub async fn generate_report(&self, request: ReportRequest) -> Result<Report, ReportError> {
        let _loading = LoadingGuard::start(&self.state, true);
        let result = self.submit(request).await;
        self.record(result)
    }

    /// Builds a request from the current selections and date range.
    pub async fn generate_from_selection(
        &self,
        report_type: Option<ReportType>,
    ) -> Result<Report, ReportError> {
        let request = {
            let state = self.state();
            let mut request = ReportRequest::new(
                state.selected_employees.to_vec(),
                report_type.unwrap_or_else(|| self.config.default_report_type.clone()),
            );
            if !state.selected_certifications.is_empty() {
                request.certification_ids = Some(state.selected_certifications.to_vec());
            }
            request.start_date = state.date_range.start;
            request.end_date = state.date_range.end;
            request
        };
        self.generate_report(request).await
    }

    async fn submit(&self, request: ReportRequest) -> Result<Report, ReportError> {
        if request.employee_ids.is_empty() {
            return Err(ReportError::Validation(
                "Please select at least one employee".into(),
            ));
        }
        let range = DateRange {
            start: request.start_date,
            end: request.end_date,
        };
        if !range.is_valid() {
            return Err(ReportError::Validation(
                "Start date must not be after end date".into(),
            ));
        }

        let report = self.gateway.generate_report(&request).await?;
        info!(
            report_id = %report.id,
            status = %report.status,
            employees = request.employee_ids.len(),
            "report submitted"
        );
        let mut state = self.state();
        state.store.insert_generated(report.clone());
        state.report_cursor.reset();
        Ok(report)
    }

    /// Pulls the current state of one report and replaces it in place.
    ///
    /// A report the service no longer knows is reported as
    /// [`ReportError::NotFound`] but stays in the local list.
    pub async fn refresh_status(&self, report_id: &str) -> Result<Report, ReportError> {
        let result = self.reconcile(report_id).await;
        self.record(result)
    }

    async fn reconcile(&self, report_id: &str) -> Result<Report, ReportError> {
        let report = self
            .gateway
            .get_report(report_id)
            .await
            .map_err(|err| ReportError::for_report(report_id, err))?;
        let tracked = {
            let mut state = self.state();
            let tracked = state.store.apply_refresh(report.clone());
            if tracked {
                // A status change can move the report out of a status filter.
                let total = state.filtered_len(View::Reports);
                state.report_cursor.clamp(total);
            }
            tracked
        };
        debug!(report_id, status = %report.status, tracked, "report status refreshed");
        Ok(report)
    }

    /// Lightweight status check; does not touch the local collection.
    pub async fn status_summary(&self, report_id: &str) -> Result<ReportStatusSummary, ReportError> {
        let result = self
            .gateway
            .get_report_status(report_id)
            .await
            .map_err(|err| ReportError::for_report(report_id, err));
        self.record(result)
    }

    /// Fetches the artifact of a report.
    ///
    /// The local status is not checked; the service rejects reports that
    /// are not ready. On failure the report is refreshed, since the service
    /// may have marked it FAILED, and the download error is returned.
    pub async fn download(&self, report_id: &str) -> Result<ReportArtifact, ReportError> {
        let _loading = LoadingGuard::start(&self.state, false);
        let err = match self.gateway.download_report(report_id).await {
            Ok(artifact) => {
                info!(report_id, bytes = artifact.bytes.len(), "report downloaded");
                return Ok(artifact);
            }
            Err(err) => ReportError::for_report(report_id, err),
        };

        if let Err(refresh_err) = self.reconcile(report_id).await {
            debug!(report_id, error = %refresh_err, "status refresh after failed download also failed");
        }
        self.record(Err(err))
    }

    /// Deletes a report on the service, then locally.
    ///
    /// IN_PROGRESS reports are refused, and so is a second delete of an id
    /// whose first delete has not resolved yet.
    pub async fn delete_report(&self, report_id: &str) -> Result<(), ReportError> {
        let _loading = LoadingGuard::start(&self.state, false);
        let result = self.delete_confirmed(report_id).await;
        self.record(result)
    }

    async fn delete_confirmed(&self, report_id: &str) -> Result<(), ReportError> {
        let marker = DeleteGuard::acquire(&self.state, report_id)?;
        self.gateway
            .delete_report(report_id)
            .await
            .map_err(|err| ReportError::for_report(report_id, err))?;
        let removed = marker.commit();
        info!(report_id, removed = removed.is_some(), "report deleted");
        Ok(())
    }

    /// Resubmits the request a report was created from and swaps the
    /// original for the new report. Nothing changes locally on failure.
    ///
    /// A second regeneration of an id whose first one has not resolved yet
    /// is refused.
    pub async fn regenerate_report(&self, report_id: &str) -> Result<Report, ReportError> {
        let _loading = LoadingGuard::start(&self.state, true);
        let result = self.regenerate(report_id).await;
        self.record(result)
    }

    async fn regenerate(&self, report_id: &str) -> Result<Report, ReportError> {
        let marker = RegenerateGuard::acquire(&self.state, report_id)?;
        let report = self.gateway.generate_report(&marker.plan.request).await?;
        info!(
            original_id = %marker.plan.original_id,
            report_id = %report.id,
            "report regenerated"
        );
        marker.commit(report.clone());
        Ok(report)
    }

    /// Asks the service to sweep reports stuck in QUEUED/IN_PROGRESS, then
    /// reloads the whole report list.
    pub async fn cleanup_stuck_reports(&self) -> Result<CleanupSummary, ReportError> {
        let _loading = LoadingGuard::start(&self.state, true);
        let result = self.cleanup_and_reload().await;
        self.record(result)
    }

    async fn cleanup_and_reload(&self) -> Result<CleanupSummary, ReportError> {
        let summary = self.gateway.cleanup_stuck_reports().await?;
        info!(cleaned = summary.cleaned_count, "stuck reports cleaned up");
        self.reload_reports().await?;
        Ok(summary)
    }

    /// Refreshes a report every `poll_interval_ms` until it settles or
    /// `max_poll_attempts` refreshes were made, returning the last state
    /// seen. Stopping the poll does not cancel the job on the service.
    pub async fn watch_report<F>(
        &self,
        report_id: &str,
        mut on_update: F,
    ) -> Result<Report, ReportError>
    where
        F: FnMut(&Report),
    {
        let interval = Duration::from_millis(self.config.poll_interval_ms);
        let max_attempts = self.config.max_poll_attempts.max(1);
        let mut attempt = 1;
        loop {
            let report = self.refresh_status(report_id).await?;
            on_update(&report);
            if report.status.is_settled() || attempt >= max_attempts {
                return Ok(report);
            }
            attempt += 1;
            sleep(interval).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateway::GatewayError;
    use crate::model::ReportStatus;
    use chrono::{NaiveDate, NaiveDateTime};
    use std::collections::HashMap;
    use std::sync::Arc;
    use tokio::sync::Notify;

    // --- Mock gateway ---

    #[derive(Default)]
    struct MockGateway {
        employees: Vec<Employee>,
        certifications: Vec<CertificationDefinition>,
        /// employee id -> eligible certification ids
        eligibility: HashMap<String, Vec<String>>,
        server_reports: Mutex<Vec<Report>>,
        calls: Mutex<Vec<String>>,
        /// Every request that reached `generate_report`, in order.
        requests: Mutex<Vec<ReportRequest>>,
        cleanup_removes_active: bool,
        fail_download: bool,
        fail_generate: bool,
        delete_gate: Option<Arc<Notify>>,
        generate_gate: Option<Arc<Notify>>,
        departments_gate: Option<Arc<Notify>>,
    }

    impl MockGateway {
        fn log(&self, call: impl Into<String>) {
            self.calls.lock().unwrap().push(call.into());
        }

        fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }

        fn count(&self, prefix: &str) -> usize {
            self.calls().iter().filter(|c| c.starts_with(prefix)).count()
        }

        fn set_server_status(&self, report_id: &str, status: ReportStatus) {
            let mut reports = self.server_reports.lock().unwrap();
            if let Some(report) = reports.iter_mut().find(|r| r.id == report_id) {
                report.status = status;
            }
        }

        fn forget(&self, report_id: &str) {
            self.server_reports
                .lock()
                .unwrap()
                .retain(|r| r.id != report_id);
        }

        fn find(&self, report_id: &str) -> Result<Report, GatewayError> {
            self.server_reports
                .lock()
                .unwrap()
                .iter()
                .find(|r| r.id == report_id)
                .cloned()
                .ok_or(GatewayError::Api {
                    status: 404,
                    message: "not found".into(),
                })
        }
    }

    impl ReportGateway for MockGateway {
        async fn list_employees(&self) -> Result<Vec<Employee>, GatewayError> {
            self.log("list_employees");
            Ok(self.employees.clone())
        }

        async fn list_departments(&self) -> Result<Vec<String>, GatewayError> {
            self.log("list_departments");
            if let Some(gate) = &self.departments_gate {
                gate.notified().await;
            }
            let mut departments: Vec<String> =
                self.employees.iter().map(|e| e.department.clone()).collect();
            departments.sort();
            departments.dedup();
            Ok(departments)
        }

        async fn list_reports(&self) -> Result<Vec<Report>, GatewayError> {
            self.log("list_reports");
            Ok(self.server_reports.lock().unwrap().clone())
        }

        async fn generate_report(&self, request: &ReportRequest) -> Result<Report, GatewayError> {
            self.log(format!("generate:{}", request.employee_ids.join(",")));
            self.requests.lock().unwrap().push(request.clone());
            if let Some(gate) = &self.generate_gate {
                gate.notified().await;
            }
            if self.fail_generate {
                return Err(GatewayError::Api {
                    status: 500,
                    message: "generation backend offline".into(),
                });
            }
            let mut reports = self.server_reports.lock().unwrap();
            let n = reports.len() as u32 + 100;
            let report = test_report(
                &format!("r{n}"),
                ReportStatus::Queued,
                n,
                Some(format!(
                    "ReportRequestDto{{reportType='{}', employeeIds=[{}]}}",
                    request.report_type,
                    request.employee_ids.join(", ")
                )),
            );
            reports.push(report.clone());
            Ok(report)
        }

        async fn get_report(&self, report_id: &str) -> Result<Report, GatewayError> {
            self.log(format!("get_report:{report_id}"));
            self.find(report_id)
        }

        async fn get_report_status(
            &self,
            report_id: &str,
        ) -> Result<ReportStatusSummary, GatewayError> {
            let report = self.find(report_id)?;
            Ok(ReportStatusSummary {
                report_id: report.id.clone(),
                status: report.status,
                progress: report.status.progress(),
                completed_at: report.completed_at,
                message: report.status_message(),
            })
        }

        async fn download_report(&self, report_id: &str) -> Result<ReportArtifact, GatewayError> {
            self.log(format!("download:{report_id}"));
            if self.fail_download {
                // The service marks the report FAILED when its file is gone.
                self.set_server_status(report_id, ReportStatus::Failed);
                return Err(GatewayError::Api {
                    status: 400,
                    message: "Report file not found".into(),
                });
            }
            Ok(ReportArtifact {
                file_name: ReportArtifact::default_file_name(report_id),
                content_type: Some("application/pdf".into()),
                bytes: b"%PDF".to_vec(),
            })
        }

        async fn delete_report(&self, report_id: &str) -> Result<(), GatewayError> {
            self.log(format!("delete:{report_id}"));
            if let Some(gate) = &self.delete_gate {
                gate.notified().await;
            }
            self.find(report_id)?;
            self.forget(report_id);
            Ok(())
        }

        async fn cleanup_stuck_reports(&self) -> Result<CleanupSummary, GatewayError> {
            self.log("cleanup");
            let mut reports = self.server_reports.lock().unwrap();
            let before = reports.len();
            if self.cleanup_removes_active {
                reports.retain(|r| r.status.is_settled());
            }
            Ok(CleanupSummary {
                cleaned_count: (before - reports.len()) as u32,
            })
        }

        async fn list_certification_definitions(
            &self,
        ) -> Result<Vec<CertificationDefinition>, GatewayError> {
            self.log("list_certifications");
            Ok(self.certifications.clone())
        }

        async fn available_certifications_for_employees(
            &self,
            employee_ids: &[String],
        ) -> Result<Vec<CertificationDefinition>, GatewayError> {
            self.log(format!("available:{}", employee_ids.join(",")));
            let eligible: HashSet<&String> = employee_ids
                .iter()
                .filter_map(|id| self.eligibility.get(id))
                .flatten()
                .collect();
            Ok(self
                .certifications
                .iter()
                .filter(|c| eligible.contains(&c.id))
                .cloned()
                .collect())
        }
    }

    // --- Fixtures ---

    fn at(minute: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 6, 1)
            .unwrap()
            .and_hms_opt(8, 0, 0)
            .unwrap()
            + chrono::Duration::minutes(i64::from(minute))
    }

    fn test_report(
        id: &str,
        status: ReportStatus,
        minute: u32,
        parameters: Option<String>,
    ) -> Report {
        Report {
            id: id.into(),
            name: format!("Report {id}"),
            report_type: ReportType::Certification,
            status,
            error_message: None,
            parameters,
            file_path: None,
            page_count: None,
            created_at: at(minute),
            started_at: None,
            completed_at: None,
        }
    }

    fn employee(id: &str, first: &str, department: &str) -> Employee {
        Employee {
            id: id.into(),
            first_name: first.into(),
            last_name: "Tester".into(),
            email: format!("{}@example.com", first.to_lowercase()),
            department: department.into(),
            position: "Technician".into(),
            hire_date: None,
        }
    }

    fn certification(id: &str) -> CertificationDefinition {
        CertificationDefinition {
            id: id.into(),
            name: format!("Cert {id}"),
            description: None,
            category: "Safety".into(),
            is_active: true,
            total_duration_hours: None,
            validity_period_months: None,
        }
    }

    fn gateway() -> MockGateway {
        MockGateway {
            employees: vec![
                employee("e1", "Ada", "Engineering"),
                employee("e2", "Grace", "Engineering"),
                employee("e3", "Mary", "Operations"),
            ],
            certifications: vec![certification("c1"), certification("c2"), certification("c3")],
            eligibility: HashMap::from([
                ("e1".to_string(), vec!["c1".to_string(), "c2".to_string()]),
                ("e2".to_string(), vec!["c2".to_string()]),
                ("e3".to_string(), vec!["c3".to_string()]),
            ]),
            ..MockGateway::default()
        }
    }

    fn orchestrator(gateway: MockGateway) -> ReportOrchestrator<MockGateway> {
        let config = ClientConfig {
            poll_interval_ms: 1,
            max_poll_attempts: 3,
            ..ClientConfig::default()
        };
        ReportOrchestrator::new(gateway, config)
    }

    fn ids(reports: &[Report]) -> Vec<&str> {
        reports.iter().map(|r| r.id.as_str()).collect()
    }

    // --- Generation ---

    #[tokio::test]
    async fn generate_without_employees_is_local_validation_error() {
        let orch = orchestrator(gateway());

        let err = orch
            .generate_report(ReportRequest::new(vec![], ReportType::Certification))
            .await
            .unwrap_err();

        assert!(matches!(err, ReportError::Validation(_)));
        assert!(orch.reports().is_empty());
        assert!(orch.gateway().calls().is_empty());
        assert_eq!(orch.error().as_deref(), Some("Please select at least one employee"));
    }

    #[tokio::test]
    async fn generate_prepends_and_refresh_replaces_in_place() {
        let gw = gateway();
        gw.server_reports
            .lock()
            .unwrap()
            .push(test_report("old", ReportStatus::Completed, 0, None));
        let orch = orchestrator(gw);
        orch.load_reports().await.unwrap();

        let report = orch
            .generate_report(ReportRequest::new(vec!["e1".into()], ReportType::Certification))
            .await
            .unwrap();
        assert_eq!(report.status, ReportStatus::Queued);
        assert_eq!(ids(&orch.reports()), [report.id.as_str(), "old"]);

        orch.gateway().set_server_status(&report.id, ReportStatus::Completed);
        let refreshed = orch.refresh_status(&report.id).await.unwrap();
        assert_eq!(refreshed.status, ReportStatus::Completed);

        let reports = orch.reports();
        assert_eq!(ids(&reports), [report.id.as_str(), "old"]);
        assert_eq!(reports[0].status, ReportStatus::Completed);
    }

    #[tokio::test]
    async fn identical_requests_create_separate_jobs() {
        let orch = orchestrator(gateway());
        let request = ReportRequest::new(vec!["e1".into()], ReportType::Certification);

        let first = orch.generate_report(request.clone()).await.unwrap();
        let second = orch.generate_report(request).await.unwrap();

        assert_ne!(first.id, second.id);
        assert_eq!(ids(&orch.reports()), [second.id.as_str(), first.id.as_str()]);
    }

    #[tokio::test]
    async fn generate_from_selection_uses_selections_and_dates() {
        let orch = orchestrator(gateway());
        orch.initialize().await.unwrap();
        orch.select_employee("e1").await.unwrap();
        assert!(orch.select_certification("c2"));
        let range = DateRange {
            start: NaiveDate::from_ymd_opt(2024, 1, 1),
            end: NaiveDate::from_ymd_opt(2024, 3, 31),
        };
        orch.set_date_range(range).unwrap();

        orch.generate_from_selection(None).await.unwrap();

        let sent = orch.gateway().requests.lock().unwrap().clone();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].employee_ids, ["e1"]);
        assert_eq!(sent[0].report_type, ReportType::Certification);
        assert_eq!(sent[0].certification_ids, Some(vec!["c2".to_string()]));
        assert_eq!(sent[0].start_date, NaiveDate::from_ymd_opt(2024, 1, 1));
        assert_eq!(sent[0].end_date, NaiveDate::from_ymd_opt(2024, 3, 31));
        assert_eq!(orch.reports().len(), 1);
    }

    #[tokio::test]
    async fn generate_from_selection_omits_unselected_certifications() {
        let orch = orchestrator(gateway());
        orch.select_employee("e2").await.unwrap();

        orch.generate_from_selection(Some(ReportType::EmployeeDemographics))
            .await
            .unwrap();

        let sent = orch.gateway().requests.lock().unwrap().clone();
        assert_eq!(sent[0].report_type, ReportType::EmployeeDemographics);
        assert!(sent[0].certification_ids.is_none());
        assert!(sent[0].start_date.is_none());
        assert!(sent[0].end_date.is_none());
    }

    #[tokio::test]
    async fn failed_generation_surfaces_error_without_mutation() {
        let orch = orchestrator(MockGateway {
            fail_generate: true,
            ..gateway()
        });

        let err = orch
            .generate_report(ReportRequest::new(vec!["e1".into()], ReportType::Certification))
            .await
            .unwrap_err();

        assert!(matches!(err, ReportError::Transport(_)));
        assert!(orch.reports().is_empty());
        assert_eq!(
            orch.error().as_deref(),
            Some("HTTP 500: generation backend offline")
        );
        assert!(!orch.is_loading());
    }

    // --- Refresh / download ---

    #[tokio::test]
    async fn refresh_of_unknown_report_keeps_local_entry() {
        let gw = gateway();
        gw.server_reports
            .lock()
            .unwrap()
            .push(test_report("r1", ReportStatus::Queued, 0, None));
        let orch = orchestrator(gw);
        orch.load_reports().await.unwrap();
        orch.gateway().forget("r1");

        let err = orch.refresh_status("r1").await.unwrap_err();

        assert!(matches!(err, ReportError::NotFound(ref id) if id == "r1"));
        assert_eq!(ids(&orch.reports()), ["r1"]);
        assert_eq!(orch.error().as_deref(), Some("Report not found: r1"));
    }

    #[tokio::test]
    async fn failed_download_reconciles_status_and_returns_original_error() {
        let gw = MockGateway {
            fail_download: true,
            ..gateway()
        };
        gw.server_reports
            .lock()
            .unwrap()
            .push(test_report("r1", ReportStatus::Completed, 0, None));
        let orch = orchestrator(gw);
        orch.load_reports().await.unwrap();

        let err = orch.download("r1").await.unwrap_err();

        assert_eq!(err.to_string(), "HTTP 400: Report file not found");
        assert_eq!(orch.report("r1").unwrap().status, ReportStatus::Failed);
        assert_eq!(orch.gateway().count("get_report:r1"), 1);
        assert_eq!(orch.error().as_deref(), Some("HTTP 400: Report file not found"));
    }

    #[tokio::test]
    async fn status_summary_reports_progress() {
        let gw = gateway();
        gw.server_reports
            .lock()
            .unwrap()
            .push(test_report("r1", ReportStatus::InProgress, 0, None));
        let orch = orchestrator(gw);

        let summary = orch.status_summary("r1").await.unwrap();
        assert_eq!(summary.progress, 50);
        assert!(matches!(
            orch.status_summary("nope").await,
            Err(ReportError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn download_returns_artifact() {
        let gw = gateway();
        gw.server_reports
            .lock()
            .unwrap()
            .push(test_report("r1", ReportStatus::Completed, 0, None));
        let orch = orchestrator(gw);

        let artifact = orch.download("r1").await.unwrap();
        assert_eq!(artifact.file_name, "report-r1.pdf");
        assert!(orch.error().is_none());
    }

    // --- Delete ---

    #[tokio::test]
    async fn delete_removes_one_entry_preserving_order() {
        let gw = gateway();
        {
            let mut reports = gw.server_reports.lock().unwrap();
            reports.push(test_report("a", ReportStatus::Completed, 1, None));
            reports.push(test_report("b", ReportStatus::Failed, 2, None));
            reports.push(test_report("c", ReportStatus::Queued, 3, None));
        }
        let orch = orchestrator(gw);
        orch.load_reports().await.unwrap();

        orch.delete_report("b").await.unwrap();

        assert_eq!(ids(&orch.reports()), ["c", "a"]);
        assert!(!orch.is_deleting("b"));
    }

    #[tokio::test]
    async fn delete_of_in_progress_report_is_refused_locally() {
        let gw = gateway();
        gw.server_reports
            .lock()
            .unwrap()
            .push(test_report("busy", ReportStatus::InProgress, 0, None));
        let orch = orchestrator(gw);
        orch.load_reports().await.unwrap();

        let err = orch.delete_report("busy").await.unwrap_err();

        assert!(matches!(err, ReportError::InvalidState { .. }));
        assert_eq!(orch.gateway().count("delete:"), 0);
        assert_eq!(orch.reports().len(), 1);
    }

    #[tokio::test]
    async fn failed_delete_releases_marker_and_keeps_report() {
        let gw = gateway();
        gw.server_reports
            .lock()
            .unwrap()
            .push(test_report("r1", ReportStatus::Failed, 0, None));
        let orch = orchestrator(gw);
        orch.load_reports().await.unwrap();
        orch.gateway().forget("r1");

        let err = orch.delete_report("r1").await.unwrap_err();

        assert!(matches!(err, ReportError::NotFound(_)));
        assert_eq!(ids(&orch.reports()), ["r1"]);
        assert!(!orch.is_deleting("r1"));
    }

    #[tokio::test]
    async fn overlapping_deletes_of_same_report_hit_the_service_once() {
        let gate = Arc::new(Notify::new());
        let gw = MockGateway {
            delete_gate: Some(gate.clone()),
            ..gateway()
        };
        gw.server_reports
            .lock()
            .unwrap()
            .push(test_report("r1", ReportStatus::Failed, 0, None));
        let orch = orchestrator(gw);
        orch.load_reports().await.unwrap();

        let (first, second) = tokio::join!(orch.delete_report("r1"), async {
            let second = orch.delete_report("r1").await;
            gate.notify_one();
            second
        });

        assert!(first.is_ok());
        assert!(matches!(second, Err(ReportError::DeleteInProgress(_))));
        assert_eq!(orch.gateway().count("delete:r1"), 1);
        assert!(orch.reports().is_empty());
    }

    // --- Regenerate ---

    #[tokio::test]
    async fn regenerate_replaces_original_with_recovered_request() {
        let gw = gateway();
        {
            let mut reports = gw.server_reports.lock().unwrap();
            reports.push(test_report("keep", ReportStatus::Completed, 1, None));
            reports.push(test_report(
                "failed",
                ReportStatus::Failed,
                2,
                Some("ReportRequestDto{reportType='employee_demographics', employeeIds=[2, 5]}".into()),
            ));
        }
        let orch = orchestrator(gw);
        orch.load_reports().await.unwrap();

        let replacement = orch.regenerate_report("failed").await.unwrap();

        assert_eq!(orch.gateway().count("generate:2,5"), 1);
        assert_eq!(ids(&orch.reports()), [replacement.id.as_str(), "keep"]);
    }

    #[tokio::test]
    async fn regenerate_with_malformed_parameters_changes_nothing() {
        let gw = gateway();
        gw.server_reports.lock().unwrap().push(test_report(
            "failed",
            ReportStatus::Failed,
            0,
            Some("ReportRequestDto{reportType='x'}".into()),
        ));
        let orch = orchestrator(gw);
        orch.load_reports().await.unwrap();

        let err = orch.regenerate_report("failed").await.unwrap_err();

        assert!(matches!(err, ReportError::MalformedParameters { .. }));
        assert_eq!(ids(&orch.reports()), ["failed"]);
        assert_eq!(orch.gateway().count("generate:"), 0);
    }

    #[tokio::test]
    async fn regenerate_failure_on_service_keeps_original() {
        let gw = MockGateway {
            fail_generate: true,
            ..gateway()
        };
        gw.server_reports.lock().unwrap().push(test_report(
            "failed",
            ReportStatus::Failed,
            0,
            Some("employeeIds=[e1]".into()),
        ));
        let orch = orchestrator(gw);
        orch.load_reports().await.unwrap();

        assert!(orch.regenerate_report("failed").await.is_err());
        assert_eq!(ids(&orch.reports()), ["failed"]);
    }

    // --- Cleanup ---

    #[tokio::test]
    async fn cleanup_reports_count_and_reloads_without_missing_reports() {
        let gw = MockGateway {
            cleanup_removes_active: true,
            ..gateway()
        };
        {
            let mut reports = gw.server_reports.lock().unwrap();
            reports.push(test_report("done", ReportStatus::Completed, 1, None));
            reports.push(test_report("stuck1", ReportStatus::Queued, 2, None));
            reports.push(test_report("stuck2", ReportStatus::InProgress, 3, None));
        }
        let orch = orchestrator(gw);
        orch.load_reports().await.unwrap();
        assert_eq!(orch.reports().len(), 3);

        let summary = orch.cleanup_stuck_reports().await.unwrap();

        assert_eq!(summary.cleaned_count, 2);
        assert_eq!(ids(&orch.reports()), ["done"]);
        assert!(orch.error().is_none());
    }

    // --- Selection side effects ---

    #[tokio::test]
    async fn employee_selection_drives_certification_eligibility() {
        let orch = orchestrator(gateway());
        orch.initialize().await.unwrap();
        assert_eq!(orch.available_certifications().len(), 3);

        orch.select_employee("e1").await.unwrap();
        orch.select_certification("c1");
        orch.select_certification("c2");
        assert_eq!(orch.selected_certification_ids(), ["c1", "c2"]);

        // e2 only holds c2; c1 stops being eligible once e1 is dropped.
        orch.select_employee("e2").await.unwrap();
        orch.deselect_employee("e1").await.unwrap();
        assert_eq!(orch.selected_certification_ids(), ["c2"]);

        orch.clear_employee_selection().await.unwrap();
        assert!(orch.selected_certification_ids().is_empty());
        assert_eq!(orch.available_certifications().len(), 3);
    }

    #[tokio::test]
    async fn ineligible_certification_is_not_selected() {
        let orch = orchestrator(gateway());
        orch.select_employee("e3").await.unwrap();

        assert!(!orch.select_certification("c1"));
        assert!(orch.select_certification("c3"));
        assert_eq!(orch.selected_certification_ids(), ["c3"]);
    }

    #[tokio::test]
    async fn redundant_selection_does_not_refetch() {
        let orch = orchestrator(gateway());
        orch.select_employee("e1").await.unwrap();
        orch.select_employee("e1").await.unwrap();
        orch.deselect_employee("e9").await.unwrap();

        assert_eq!(orch.gateway().count("available:"), 1);
    }

    #[tokio::test]
    async fn toggle_all_employees_flips_selection() {
        let orch = orchestrator(gateway());
        orch.load_employees().await.unwrap();

        orch.toggle_all_employees().await.unwrap();
        assert_eq!(orch.selected_employee_ids(), ["e1", "e2", "e3"]);
        orch.toggle_all_employees().await.unwrap();
        assert!(orch.selected_employee_ids().is_empty());

        orch.toggle_employee("e2").await.unwrap();
        orch.select_all_employees().await.unwrap();
        orch.clear_employee_selection().await.unwrap();
        assert!(orch.selected_employee_ids().is_empty());
    }

    #[tokio::test]
    async fn selection_stays_writable_while_generation_is_in_flight() {
        let gate = Arc::new(Notify::new());
        let orch = orchestrator(MockGateway {
            generate_gate: Some(gate.clone()),
            ..gateway()
        });

        let (report, toggled) = tokio::join!(
            orch.generate_report(ReportRequest::new(vec!["e1".into()], ReportType::Certification)),
            async {
                assert!(orch.is_loading());
                let toggled = orch.toggle_employee("e3").await;
                gate.notify_one();
                toggled
            }
        );

        assert!(report.is_ok());
        assert!(toggled.is_ok());
        assert!(orch.is_employee_selected("e3"));
        assert_eq!(orch.reports().len(), 1);
        assert!(!orch.is_loading());
    }

    // --- Filtering and pagination ---

    #[tokio::test]
    async fn changing_filter_resets_page() {
        let mut gw = gateway();
        gw.employees = (0..75)
            .map(|i| employee(&format!("e{i}"), &format!("Name{i}"), "Engineering"))
            .collect();
        let orch = ReportOrchestrator::new(gw, ClientConfig::default());
        orch.load_employees().await.unwrap();

        orch.set_page(View::Employees, 3);
        assert_eq!(orch.page(View::Employees), 3);
        assert_eq!(orch.employee_page().items.len(), 15);

        orch.set_search(View::Employees, "name1");
        assert_eq!(orch.page(View::Employees), 1);
        // Name1 and Name10..Name19
        assert_eq!(orch.employee_page().total_items, 11);

        orch.set_page(View::Employees, 5);
        assert_eq!(orch.page(View::Employees), 1);
    }

    #[tokio::test]
    async fn department_filter_and_page_size() {
        let orch = orchestrator(gateway());
        orch.load_employees().await.unwrap();
        orch.load_departments().await.unwrap();
        assert_eq!(orch.departments(), ["Engineering", "Operations"]);

        orch.set_category(View::Employees, Some("Operations".into()));
        let page = orch.employee_page();
        assert_eq!(page.total_items, 1);
        assert_eq!(page.items[0].id, "e3");

        orch.set_page_size(View::Employees, 1);
        orch.set_category(View::Employees, None);
        orch.next_page(View::Employees);
        orch.next_page(View::Employees);
        assert_eq!(orch.employee_page().items[0].id, "e3");
        orch.previous_page(View::Employees);
        assert_eq!(orch.page(View::Employees), 2);
    }

    #[tokio::test]
    async fn report_view_filters_by_status() {
        let gw = gateway();
        {
            let mut reports = gw.server_reports.lock().unwrap();
            reports.push(test_report("a", ReportStatus::Completed, 1, None));
            reports.push(test_report("b", ReportStatus::Failed, 2, None));
            reports.push(test_report("c", ReportStatus::Completed, 3, None));
        }
        let orch = orchestrator(gw);
        orch.load_reports().await.unwrap();

        orch.set_filter(View::Reports, FilterQuery::default().with_category("COMPLETED"));
        assert_eq!(ids(&orch.report_page().items), ["c", "a"]);
    }

    // --- Error slot / misc ---

    #[tokio::test]
    async fn date_preset_past_the_calendar_is_rejected() {
        let orch = orchestrator(gateway());
        orch.set_last_days(7).unwrap();
        let before = orch.date_range();

        let err = orch.set_last_days(u32::MAX).unwrap_err();

        assert!(matches!(err, ReportError::Validation(_)));
        assert_eq!(orch.date_range(), before);
        assert!(orch.error().is_some());
    }

    #[tokio::test]
    async fn inverted_date_range_is_rejected() {
        let orch = orchestrator(gateway());
        let err = orch
            .set_date_range(DateRange {
                start: NaiveDate::from_ymd_opt(2024, 5, 1),
                end: NaiveDate::from_ymd_opt(2024, 4, 1),
            })
            .unwrap_err();
        assert!(matches!(err, ReportError::Validation(_)));
        assert!(orch.date_range().is_empty());

        orch.set_last_days(30).unwrap();
        assert_eq!(orch.date_range().days(), Some(31));
        orch.clear_date_range();
        assert!(orch.date_range().is_empty());
    }

    #[tokio::test]
    async fn new_error_replaces_previous_and_can_be_cleared() {
        let orch = orchestrator(gateway());
        let _ = orch.refresh_status("missing").await;
        assert_eq!(orch.error().as_deref(), Some("Report not found: missing"));

        let _ = orch
            .generate_report(ReportRequest::new(vec![], ReportType::Certification))
            .await;
        assert_eq!(orch.error().as_deref(), Some("Please select at least one employee"));

        orch.clear_error();
        assert!(orch.snapshot().error.is_none());
    }

    #[tokio::test]
    async fn watch_stops_once_report_settles() {
        let gw = gateway();
        gw.server_reports
            .lock()
            .unwrap()
            .push(test_report("r1", ReportStatus::InProgress, 0, None));
        let orch = orchestrator(gw);
        orch.load_reports().await.unwrap();

        let mut seen = Vec::new();
        let report = orch
            .watch_report("r1", |r| {
                seen.push(r.status);
                if seen.len() == 2 {
                    orch.gateway().set_server_status("r1", ReportStatus::Completed);
                }
            })
            .await
            .unwrap();

        assert_eq!(report.status, ReportStatus::Completed);
        assert_eq!(
            seen,
            vec![ReportStatus::InProgress, ReportStatus::InProgress, ReportStatus::Completed]
        );
    }

    #[tokio::test]
    async fn watch_gives_up_after_max_attempts() {
        let gw = gateway();
        gw.server_reports
            .lock()
            .unwrap()
            .push(test_report("r1", ReportStatus::Queued, 0, None));
        let orch = orchestrator(gw);

        let report = orch.watch_report("r1", |_| {}).await.unwrap();

        assert_eq!(report.status, ReportStatus::Queued);
        assert_eq!(orch.gateway().count("get_report:r1"), 3);
    }

    #[tokio::test]
    async fn status_change_under_filter_keeps_page_in_range() {
        let gw = gateway();
        {
            let mut reports = gw.server_reports.lock().unwrap();
            reports.push(test_report("a", ReportStatus::Queued, 1, None));
            reports.push(test_report("b", ReportStatus::Queued, 2, None));
            reports.push(test_report("c", ReportStatus::Queued, 3, None));
        }
        let orch = orchestrator(gw);
        orch.load_reports().await.unwrap();
        orch.set_page_size(View::Reports, 1);
        orch.set_category(View::Reports, Some("QUEUED".into()));
        orch.set_page(View::Reports, 3);
        assert_eq!(ids(&orch.report_page().items), ["a"]);

        orch.gateway().set_server_status("c", ReportStatus::Completed);
        orch.refresh_status("c").await.unwrap();

        let page = orch.report_page();
        assert_eq!(page.total_pages, 2);
        assert_eq!(orch.page(View::Reports), 2);
        assert_eq!(ids(&page.items), ["a"]);
    }

    #[tokio::test]
    async fn overlapping_regenerations_of_same_report_submit_once() {
        let gate = Arc::new(Notify::new());
        let gw = MockGateway {
            generate_gate: Some(gate.clone()),
            ..gateway()
        };
        gw.server_reports.lock().unwrap().push(test_report(
            "f",
            ReportStatus::Failed,
            0,
            Some("ReportRequestDto{reportType='CERTIFICATION', employeeIds=[e1]}".into()),
        ));
        let orch = orchestrator(gw);
        orch.load_reports().await.unwrap();

        let (first, second) = tokio::join!(orch.regenerate_report("f"), async {
            let second = orch.regenerate_report("f").await;
            gate.notify_one();
            second
        });

        let replacement = first.unwrap();
        assert!(matches!(second, Err(ReportError::RegenerateInProgress(ref id)) if id == "f"));
        assert_eq!(orch.gateway().count("generate:"), 1);
        assert_eq!(ids(&orch.reports()), [replacement.id.as_str()]);
        assert!(!orch.is_regenerating("f"));
    }

    #[tokio::test]
    async fn failed_regeneration_releases_marker() {
        let gw = MockGateway {
            fail_generate: true,
            ..gateway()
        };
        gw.server_reports.lock().unwrap().push(test_report(
            "f",
            ReportStatus::Failed,
            0,
            Some("employeeIds=[e1]".into()),
        ));
        let orch = orchestrator(gw);
        orch.load_reports().await.unwrap();

        assert!(orch.regenerate_report("f").await.is_err());
        assert!(!orch.is_regenerating("f"));
        assert!(orch.regenerate_report("f").await.is_err());
        assert_eq!(orch.gateway().count("generate:"), 2);
    }

    #[tokio::test]
    async fn certification_toggle_respects_eligibility() {
        let orch = orchestrator(gateway());
        orch.select_employee("e1").await.unwrap();

        assert!(orch.toggle_certification("c1"));
        assert_eq!(orch.selected_certification_ids(), ["c1"]);
        assert!(!orch.toggle_certification("c1"));
        assert!(orch.selected_certification_ids().is_empty());
        assert!(!orch.toggle_certification("c3"));
        assert!(orch.selected_certification_ids().is_empty());
    }

    #[tokio::test]
    async fn bulk_certification_selection_covers_eligible_list() {
        let orch = orchestrator(gateway());
        orch.select_employee("e1").await.unwrap();

        orch.select_all_certifications();
        assert_eq!(orch.selected_certification_ids(), ["c1", "c2"]);
        orch.toggle_all_certifications();
        assert!(orch.selected_certification_ids().is_empty());

        orch.select_certification("c2");
        orch.toggle_all_certifications();
        assert_eq!(orch.selected_certification_ids(), ["c1", "c2"]);
        orch.clear_certification_selection();
        assert!(orch.selected_certification_ids().is_empty());
    }

    #[tokio::test]
    async fn initialize_loads_departments() {
        let orch = orchestrator(gateway());
        orch.initialize().await.unwrap();

        assert_eq!(orch.departments(), ["Engineering", "Operations"]);
        assert_eq!(orch.gateway().count("list_departments"), 1);
        assert_eq!(orch.reports().len(), 0);
        assert_eq!(orch.employees().len(), 3);
    }

    #[tokio::test]
    async fn department_load_counts_as_loading() {
        let gate = Arc::new(Notify::new());
        let orch = orchestrator(MockGateway {
            departments_gate: Some(gate.clone()),
            ..gateway()
        });

        let (loaded, _) = tokio::join!(orch.load_departments(), async {
            assert!(orch.is_loading());
            gate.notify_one();
        });

        assert!(loaded.is_ok());
        assert!(!orch.is_loading());
    }
}
