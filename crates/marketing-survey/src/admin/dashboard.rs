use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

use super::auth::{AdminGate, AdminSession, AuthError};
use super::export::{CsvExport, ExportError};
use crate::survey::domain::SurveyResult;
use crate::survey::report::detail_rows;
use crate::survey::scoring::marketing_score;
use crate::survey::storage::{StoreError, SurveyId, SurveyStore};

pub const DEFAULT_REFRESH_PERIOD: Duration = Duration::from_secs(30);

/// Aggregate figures shown above the result table.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DashboardStats {
    pub count: usize,
    pub average: u8,
    pub max: u8,
    pub min: u8,
}

impl DashboardStats {
    /// Zero for an empty set; the mean is rounded half up.
    pub fn from_scores(scores: &[u8]) -> Self {
        let (Some(max), Some(min)) = (scores.iter().max(), scores.iter().min()) else {
            return Self::default();
        };
        let count = scores.len();
        let sum: usize = scores.iter().map(|score| usize::from(*score)).sum();
        let average = (sum + count / 2) / count;

        Self {
            count,
            average: u8::try_from(average).unwrap_or(u8::MAX),
            max: *max,
            min: *min,
        }
    }
}

/// Which records an export covers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ExportScope {
    #[default]
    All,
    Filtered,
}

/// Case-insensitive match of `term` against store name, owner name, store
/// type, or business area. An empty term matches everything.
pub fn filter_results<'a>(results: &'a [SurveyResult], term: &str) -> Vec<&'a SurveyResult> {
    let needle = term.to_lowercase();
    results
        .iter()
        .filter(|result| {
            let record = &result.record;
            [
                &record.store_name,
                &record.owner_name,
                &record.store_type,
                &record.business_area,
            ]
            .iter()
            .any(|value| value.to_lowercase().contains(&needle))
        })
        .collect()
}

pub fn summarize(results: &[SurveyResult]) -> DashboardStats {
    let scores: Vec<u8> = results
        .iter()
        .map(|result| marketing_score(&result.record))
        .collect();
    DashboardStats::from_scores(&scores)
}

#[derive(Debug, thiserror::Error)]
pub enum DashboardError {
    #[error(transparent)]
    Auth(#[from] AuthError),
    #[error("admin login required")]
    NotAuthenticated,
    #[error("no survey with id '{0}' in the current list")]
    UnknownSurvey(String),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Export(#[from] ExportError),
    #[error("auto-refresh needs a running tokio runtime")]
    NoRuntime,
}

#[derive(Debug, Default)]
struct DashboardState {
    session: Option<AdminSession>,
    results: Vec<SurveyResult>,
    selected: Option<String>,
    search: String,
    refreshed_at: Option<DateTime<Utc>>,
}

impl DashboardState {
    fn replace_results(&mut self, results: Vec<SurveyResult>) {
        if let Some(selected) = &self.selected {
            if !results.iter().any(|result| &result.id == selected) {
                self.selected = None;
            }
        }
        self.results = results;
        self.refreshed_at = Some(Utc::now());
    }

    /// Loaded results, or nothing once the session is closed.
    fn visible_results(&self) -> &[SurveyResult] {
        if self.session.is_some() {
            &self.results
        } else {
            &[]
        }
    }
}

/// Operator view over the survey store.
///
/// Holds the fetched list, the search term, and the single selected record.
/// An optional background task re-fetches the list on a fixed period while an
/// admin session is open.
pub struct AdminDashboard {
    store: Arc<dyn SurveyStore>,
    gate: AdminGate,
    refresh_period: Duration,
    state: Arc<Mutex<DashboardState>>,
    refresher: Mutex<Option<JoinHandle<()>>>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

// The store is read without holding the state lock, so the session is
// checked again before the list is installed.
fn fetch_into(
    store: &dyn SurveyStore,
    state: &Mutex<DashboardState>,
) -> Result<usize, DashboardError> {
    let results = store.list().map_err(|err| {
        warn!(error = %err, "survey list refresh failed; keeping previous list");
        err
    })?;

    let mut state = lock(state);
    if state.session.is_none() {
        debug!("admin session closed during refresh; list discarded");
        return Err(DashboardError::NotAuthenticated);
    }
    let count = results.len();
    state.replace_results(results);
    debug!(count, "survey list refreshed");
    Ok(count)
}

impl AdminDashboard {
    pub fn new(store: Arc<dyn SurveyStore>, gate: AdminGate) -> Self {
        Self::with_refresh_period(store, gate, DEFAULT_REFRESH_PERIOD)
    }

    pub fn with_refresh_period(
        store: Arc<dyn SurveyStore>,
        gate: AdminGate,
        refresh_period: Duration,
    ) -> Self {
        Self {
            store,
            gate,
            refresh_period,
            state: Arc::new(Mutex::new(DashboardState::default())),
            refresher: Mutex::new(None),
        }
    }

    /// Open a session and load the list. A failed load still leaves the
    /// session open with an empty list.
    pub fn login(&self, password: &str) -> Result<(), DashboardError> {
        let session = self.gate.login(password)?;
        lock(&self.state).session = Some(session);
        info!("admin session opened");
        let _ = fetch_into(self.store.as_ref(), &self.state);
        Ok(())
    }

    /// Close the session, stop auto-refresh, and forget the loaded list.
    pub fn logout(&self) {
        self.disable_auto_refresh();
        *lock(&self.state) = DashboardState::default();
        info!("admin session closed");
    }

    pub fn is_authenticated(&self) -> bool {
        lock(&self.state).session.is_some()
    }

    fn require_session(&self) -> Result<(), DashboardError> {
        if self.is_authenticated() {
            Ok(())
        } else {
            Err(DashboardError::NotAuthenticated)
        }
    }

    /// Re-fetch the full list. On failure the previous list is kept.
    pub fn refresh(&self) -> Result<usize, DashboardError> {
        self.require_session()?;
        fetch_into(self.store.as_ref(), &self.state)
    }

    pub fn refreshed_at(&self) -> Option<DateTime<Utc>> {
        lock(&self.state).refreshed_at
    }

    pub fn results(&self) -> Vec<SurveyResult> {
        lock(&self.state).visible_results().to_vec()
    }

    pub fn set_search(&self, term: impl Into<String>) {
        lock(&self.state).search = term.into();
    }

    pub fn search(&self) -> String {
        lock(&self.state).search.clone()
    }

    /// Results matching the current search term.
    pub fn filtered(&self) -> Vec<SurveyResult> {
        let state = lock(&self.state);
        filter_results(state.visible_results(), &state.search)
            .into_iter()
            .cloned()
            .collect()
    }

    /// Aggregates over the full list, regardless of the search term.
    pub fn stats(&self) -> DashboardStats {
        summarize(lock(&self.state).visible_results())
    }

    /// Select a record for the detail view. Selecting the current record again
    /// is a no-op.
    pub fn select(&self, id: &str) -> Result<(), DashboardError> {
        self.require_session()?;
        let mut state = lock(&self.state);
        if !state.results.iter().any(|result| result.id == id) {
            return Err(DashboardError::UnknownSurvey(id.to_string()));
        }
        state.selected = Some(id.to_string());
        Ok(())
    }

    pub fn clear_selection(&self) {
        lock(&self.state).selected = None;
    }

    pub fn selected(&self) -> Option<SurveyResult> {
        let state = lock(&self.state);
        let id = state.selected.as_ref()?;
        state
            .visible_results()
            .iter()
            .find(|result| &result.id == id)
            .cloned()
    }

    /// Label/value rows of the selected record.
    pub fn selected_detail(&self) -> Option<Vec<(&'static str, String)>> {
        self.selected().map(|result| detail_rows(&result.record))
    }

    /// Delete a record from the store and drop it from the loaded list.
    pub fn delete(&self, id: &str) -> Result<(), DashboardError> {
        self.require_session()?;
        self.store.delete(&SurveyId::from(id))?;

        let mut state = lock(&self.state);
        state.results.retain(|result| result.id != id);
        if state.selected.as_deref() == Some(id) {
            state.selected = None;
        }
        info!(id, "survey deleted from dashboard");
        Ok(())
    }

    pub fn export_csv(
        &self,
        scope: ExportScope,
        today: NaiveDate,
    ) -> Result<CsvExport, DashboardError> {
        self.require_session()?;
        let state = lock(&self.state);
        let export = match scope {
            ExportScope::All => CsvExport::build(&state.results, today)?,
            ExportScope::Filtered => {
                CsvExport::build(filter_results(&state.results, &state.search), today)?
            }
        };
        Ok(export)
    }

    /// Start re-fetching the list every refresh period. The first fetch
    /// happens one period from now; the task ends on its own once the session
    /// is closed.
    pub fn enable_auto_refresh(&self) -> Result<(), DashboardError> {
        self.require_session()?;
        let runtime =
            tokio::runtime::Handle::try_current().map_err(|_| DashboardError::NoRuntime)?;

        let mut refresher = lock(&self.refresher);
        if refresher.as_ref().is_some_and(|task| !task.is_finished()) {
            return Ok(());
        }

        let store = Arc::clone(&self.store);
        let state = Arc::clone(&self.state);
        let period = self.refresh_period;
        *refresher = Some(runtime.spawn(async move {
            let mut ticker = interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                if lock(&state).session.is_none() {
                    debug!("admin session gone; auto-refresh stopped");
                    break;
                }
                let _ = fetch_into(store.as_ref(), &state);
            }
        }));
        info!(period_secs = period.as_secs(), "auto-refresh enabled");
        Ok(())
    }

    pub fn disable_auto_refresh(&self) {
        if let Some(task) = lock(&self.refresher).take() {
            task.abort();
            info!("auto-refresh disabled");
        }
    }

    pub fn is_auto_refreshing(&self) -> bool {
        lock(&self.refresher)
            .as_ref()
            .is_some_and(|task| !task.is_finished())
    }
}

impl Drop for AdminDashboard {
    fn drop(&mut self) {
        if let Some(task) = lock(&self.refresher).take() {
            task.abort();
        }
    }
}
