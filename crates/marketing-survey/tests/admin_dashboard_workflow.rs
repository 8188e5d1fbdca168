//! Operator scenarios for the admin dashboard: the password gate, periodic
//! refresh under a paused clock, search, statistics, selection, deletion, and
//! CSV export against a shared in-memory store.

mod common {
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::sync::mpsc::{Receiver, Sender};
    use std::sync::Mutex;

    use chrono::{TimeZone, Utc};
    use marketing_survey::survey::{
        SurveyField, SurveyId, SurveyRecord, SurveyResult, SurveyStore, StoreError,
    };

    pub(super) const PASSWORD: &str = "admin2024";

    /// Store that counts list calls and can be switched offline.
    #[derive(Default)]
    pub(super) struct CountingStore {
        results: Mutex<Vec<SurveyResult>>,
        lists: AtomicUsize,
        offline: AtomicBool,
    }

    impl CountingStore {
        pub(super) fn with_results(results: Vec<SurveyResult>) -> Self {
            Self {
                results: Mutex::new(results),
                ..Self::default()
            }
        }

        pub(super) fn list_calls(&self) -> usize {
            self.lists.load(Ordering::SeqCst)
        }

        pub(super) fn set_offline(&self, offline: bool) {
            self.offline.store(offline, Ordering::SeqCst);
        }

        pub(super) fn push(&self, result: SurveyResult) {
            self.results
                .lock()
                .expect("store mutex poisoned")
                .insert(0, result);
        }
    }

    impl SurveyStore for CountingStore {
        fn put(&self, id: &SurveyId, record: &SurveyRecord) -> Result<SurveyResult, StoreError> {
            let result = SurveyResult {
                id: id.to_string(),
                submitted_at: Utc::now(),
                record: record.clone(),
            };
            self.push(result.clone());
            Ok(result)
        }

        fn list(&self) -> Result<Vec<SurveyResult>, StoreError> {
            self.lists.fetch_add(1, Ordering::SeqCst);
            if self.offline.load(Ordering::SeqCst) {
                return Err(StoreError::Unavailable("offline".to_string()));
            }
            Ok(self.results.lock().expect("store mutex poisoned").clone())
        }

        fn delete(&self, id: &SurveyId) -> Result<(), StoreError> {
            let mut results = self.results.lock().expect("store mutex poisoned");
            let before = results.len();
            results.retain(|result| result.id != id.as_str());
            if results.len() == before {
                return Err(StoreError::NotFound(id.to_string()));
            }
            Ok(())
        }
    }

    /// Store whose every list call after the first reports that it started
    /// and then waits for a release signal.
    pub(super) struct GatedStore {
        results: Vec<SurveyResult>,
        calls: AtomicUsize,
        entered: Mutex<Sender<()>>,
        release: Mutex<Receiver<()>>,
    }

    impl GatedStore {
        pub(super) fn new(
            results: Vec<SurveyResult>,
            entered: Sender<()>,
            release: Receiver<()>,
        ) -> Self {
            Self {
                results,
                calls: AtomicUsize::new(0),
                entered: Mutex::new(entered),
                release: Mutex::new(release),
            }
        }
    }

    impl SurveyStore for GatedStore {
        fn put(&self, _id: &SurveyId, _record: &SurveyRecord) -> Result<SurveyResult, StoreError> {
            Err(StoreError::Unavailable("read only".to_string()))
        }

        fn list(&self) -> Result<Vec<SurveyResult>, StoreError> {
            if self.calls.fetch_add(1, Ordering::SeqCst) > 0 {
                self.entered
                    .lock()
                    .expect("gate mutex poisoned")
                    .send(())
                    .expect("test is listening");
                self.release
                    .lock()
                    .expect("gate mutex poisoned")
                    .recv()
                    .expect("test releases the list");
            }
            Ok(self.results.clone())
        }

        fn delete(&self, id: &SurveyId) -> Result<(), StoreError> {
            Err(StoreError::NotFound(id.to_string()))
        }
    }

    pub(super) fn result(
        id: &str,
        store_name: &str,
        owner_name: &str,
        photos: &str,
        day: u32,
    ) -> SurveyResult {
        let mut record = SurveyRecord::default();
        record.store_name = store_name.to_string();
        record.owner_name = owner_name.to_string();
        record.phone_number = "010-1111-2222".to_string();
        record.set_answer(SurveyField::AttractivePhotos, photos);
        SurveyResult {
            id: id.to_string(),
            submitted_at: Utc
                .with_ymd_and_hms(2025, 3, day, 1, 0, 0)
                .single()
                .expect("valid timestamp"),
            record,
        }
    }

    pub(super) fn seeded() -> Vec<SurveyResult> {
        vec![
            result("survey_c", "Blue Bottle", "Kim", "매우 잘 되어있음", 3),
            result("survey_b", "Green Table", "Lee", "보통", 2),
            result("survey_a", "blue moon", "Park", "전혀 안됨", 1),
        ]
    }
}

use std::sync::{mpsc, Arc};
use std::thread;
use std::time::Duration;

use chrono::NaiveDate;
use marketing_survey::admin::{
    AdminDashboard, AdminGate, AuthError, DashboardError, DashboardStats, ExportScope,
};

use common::*;

fn dashboard(store: &Arc<CountingStore>) -> AdminDashboard {
    AdminDashboard::new(store.clone(), AdminGate::new(PASSWORD))
}

#[test]
fn wrong_password_keeps_the_dashboard_locked() {
    let store = Arc::new(CountingStore::with_results(seeded()));
    let dashboard = dashboard(&store);

    let err = dashboard.login("guess").expect_err("wrong password");
    assert!(matches!(
        err,
        DashboardError::Auth(AuthError::InvalidPassword)
    ));
    assert!(!dashboard.is_authenticated());
    assert_eq!(store.list_calls(), 0);
    assert!(matches!(
        dashboard.refresh(),
        Err(DashboardError::NotAuthenticated)
    ));
    assert!(matches!(
        dashboard.delete("survey_a"),
        Err(DashboardError::NotAuthenticated)
    ));
}

#[test]
fn search_statistics_and_selection_follow_the_loaded_list() {
    let store = Arc::new(CountingStore::with_results(seeded()));
    let dashboard = dashboard(&store);
    dashboard.login(PASSWORD).expect("login succeeds");
    assert_eq!(store.list_calls(), 1);

    dashboard.set_search("BLUE");
    let ids: Vec<String> = dashboard
        .filtered()
        .into_iter()
        .map(|result| result.id)
        .collect();
    assert_eq!(ids, vec!["survey_c", "survey_a"]);

    dashboard.set_search("lee");
    assert_eq!(dashboard.filtered().len(), 1);

    // 2/28 -> 7, 1/28 -> 4, 0 -> 0
    assert_eq!(
        dashboard.stats(),
        DashboardStats {
            count: 3,
            average: 4,
            max: 7,
            min: 0,
        }
    );

    dashboard.select("survey_b").expect("known survey");
    let detail = dashboard.selected_detail().expect("selection open");
    assert!(detail.contains(&("매장명", "Green Table".to_string())));
    assert!(matches!(
        dashboard.select("survey_zzz"),
        Err(DashboardError::UnknownSurvey(_))
    ));
    assert_eq!(
        dashboard.selected().map(|result| result.id),
        Some("survey_b".to_string())
    );

    dashboard.clear_selection();
    assert!(dashboard.selected().is_none());
    assert!(dashboard.selected_detail().is_none());
}

#[test]
fn refresh_finishing_after_logout_does_not_restore_the_list() {
    let (entered_tx, entered_rx) = mpsc::channel();
    let (release_tx, release_rx) = mpsc::channel();
    let store = Arc::new(GatedStore::new(
        vec![result("survey_s", "Secret Cafe", "Han", "보통", 5)],
        entered_tx,
        release_rx,
    ));
    let dashboard = Arc::new(AdminDashboard::new(store, AdminGate::new(PASSWORD)));
    dashboard.login(PASSWORD).expect("login succeeds");
    dashboard.select("survey_s").expect("known survey");

    let refreshing = {
        let dashboard = Arc::clone(&dashboard);
        thread::spawn(move || dashboard.refresh())
    };
    entered_rx.recv().expect("refresh reached the store");
    dashboard.logout();
    release_tx.send(()).expect("refresh is waiting");
    let outcome = refreshing.join().expect("refresh thread finishes");

    assert!(matches!(outcome, Err(DashboardError::NotAuthenticated)));
    assert!(!dashboard.is_authenticated());
    assert!(dashboard.results().is_empty());
    assert!(dashboard.filtered().is_empty());
    assert!(dashboard.selected().is_none());
    assert_eq!(dashboard.stats(), DashboardStats::default());
}

#[test]
fn deleting_the_selected_record_closes_the_detail_view() {
    let store = Arc::new(CountingStore::with_results(seeded()));
    let dashboard = dashboard(&store);
    dashboard.login(PASSWORD).expect("login succeeds");
    dashboard.select("survey_b").expect("known survey");

    dashboard.delete("survey_b").expect("delete succeeds");

    assert!(dashboard.selected().is_none());
    assert_eq!(dashboard.results().len(), 2);
    assert!(matches!(
        dashboard.delete("survey_b"),
        Err(DashboardError::Store(_))
    ));
}

#[test]
fn failed_refresh_keeps_the_previous_list() {
    let store = Arc::new(CountingStore::with_results(seeded()));
    let dashboard = dashboard(&store);
    dashboard.login(PASSWORD).expect("login succeeds");

    store.set_offline(true);
    assert!(dashboard.refresh().is_err());
    assert_eq!(dashboard.results().len(), 3);

    store.set_offline(false);
    store.push(result("survey_d", "Night Owl", "Choi", "보통", 4));
    assert_eq!(dashboard.refresh().expect("refresh succeeds"), 4);
}

#[test]
fn export_covers_all_or_filtered_rows() {
    let store = Arc::new(CountingStore::with_results(seeded()));
    let dashboard = dashboard(&store);
    dashboard.login(PASSWORD).expect("login succeeds");
    dashboard.set_search("blue");
    let today = NaiveDate::from_ymd_opt(2025, 3, 14).expect("valid date");

    let all = dashboard
        .export_csv(ExportScope::All, today)
        .expect("export succeeds");
    let filtered = dashboard
        .export_csv(ExportScope::Filtered, today)
        .expect("export succeeds");

    assert_eq!(all.file_name, "survey_results_2025-03-14.csv");
    assert_eq!(all.row_count(), 3);
    assert_eq!(filtered.row_count(), 2);
    assert!(!filtered.body.contains("Green Table"));
}

#[tokio::test(start_paused = true)]
async fn auto_refresh_fetches_once_per_period_until_disabled() {
    let store = Arc::new(CountingStore::with_results(seeded()));
    let dashboard = dashboard(&store);
    dashboard.login(PASSWORD).expect("login succeeds");
    dashboard.enable_auto_refresh().expect("runtime available");
    assert!(dashboard.is_auto_refreshing());
    assert_eq!(store.list_calls(), 1);

    store.push(result("survey_d", "Night Owl", "Choi", "보통", 4));
    tokio::time::sleep(Duration::from_secs(31)).await;
    assert_eq!(store.list_calls(), 2);
    assert_eq!(dashboard.results().len(), 4);

    tokio::time::sleep(Duration::from_secs(30)).await;
    assert_eq!(store.list_calls(), 3);

    dashboard.disable_auto_refresh();
    assert!(!dashboard.is_auto_refreshing());
    tokio::time::sleep(Duration::from_secs(90)).await;
    assert_eq!(store.list_calls(), 3);
}

#[tokio::test(start_paused = true)]
async fn logout_stops_the_refresh_timer() {
    let store = Arc::new(CountingStore::with_results(seeded()));
    let dashboard = dashboard(&store);
    dashboard.login(PASSWORD).expect("login succeeds");
    dashboard.enable_auto_refresh().expect("runtime available");

    dashboard.logout();
    tokio::time::sleep(Duration::from_secs(120)).await;

    assert_eq!(store.list_calls(), 1);
    assert!(!dashboard.is_authenticated());
    assert!(dashboard.results().is_empty());
    assert!(matches!(
        dashboard.enable_auto_refresh(),
        Err(DashboardError::NotAuthenticated)
    ));
}

#[test]
fn auto_refresh_needs_a_runtime() {
    let store = Arc::new(CountingStore::with_results(seeded()));
    let dashboard = dashboard(&store);
    dashboard.login(PASSWORD).expect("login succeeds");

    assert!(matches!(
        dashboard.enable_auto_refresh(),
        Err(DashboardError::NoRuntime)
    ));
}
