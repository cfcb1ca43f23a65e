// src/pipeline/check.rs

//! One storefront check: load, fetch, extract, diff, notify, save.
//!
//! ```text
//! LOAD_PREVIOUS → FETCH_MERCH → FETCH_TOUR → BUILD_CURRENT
//!     → FIRST_RUN | DIFF_AND_NOTIFY → SAVE → DONE
//! ```
//!
//! Each page is isolated: if one cannot be fetched, its previous hash and
//! records are carried into the new snapshot and the other page proceeds.
//! Only a failure to save the new snapshot aborts the run.

use crate::error::Result;
use crate::models::{Config, SiteConfig, Snapshot};
use crate::notify::{Delivery, Notifier};
use crate::services::{MerchExtractor, TourExtractor};
use crate::storage::StateStore;
use crate::utils::fingerprint;
use crate::utils::http::PageFetcher;

use super::diff::{ChangeReport, DiffCalculator};

/// What a single page contributed to this run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageOutcome<T> {
    /// Fetched and extracted this run
    Fresh { hash: String, items: Vec<T> },
    /// Fetch failed; the previous values stand
    CarriedForward { reason: String },
}

impl<T> PageOutcome<T> {
    pub fn status(&self) -> PageStatus {
        match self {
            Self::Fresh { items, .. } => PageStatus::Success {
                records: items.len(),
            },
            Self::CarriedForward { reason } => PageStatus::Failed {
                reason: reason.clone(),
            },
        }
    }

    /// Hash and records for the new snapshot.
    fn resolve(self, previous_hash: &Option<String>, previous: &[T]) -> (Option<String>, Vec<T>)
    where
        T: Clone,
    {
        match self {
            Self::Fresh { hash, items } => (Some(hash), items),
            Self::CarriedForward { .. } => (previous_hash.clone(), previous.to_vec()),
        }
    }
}

/// Summary of how a page fared.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageStatus {
    /// Fetched; `records` may be zero when no strategy matched
    Success { records: usize },
    /// Nothing fetched; previous state carried forward
    Failed { reason: String },
}

/// How the run ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    /// No previous state; the snapshot was saved as the baseline
    FirstRun,
    Unchanged,
    /// `delivery` is `None` when sending failed
    Changed {
        message: String,
        delivery: Option<Delivery>,
    },
}

/// Everything a caller may want to know about a run.
#[derive(Debug, Clone)]
pub struct RunReport {
    pub merch: PageStatus,
    pub tour: PageStatus,
    pub changes: ChangeReport,
    pub outcome: RunOutcome,
    /// The snapshot that was saved
    pub snapshot: Snapshot,
}

impl RunReport {
    pub fn changes_detected(&self) -> bool {
        matches!(self.outcome, RunOutcome::Changed { .. })
    }
}

/// Runs storefront checks against the configured site.
pub struct Tracker<'a> {
    site: &'a SiteConfig,
    fetcher: &'a dyn PageFetcher,
    notifier: &'a dyn Notifier,
    store: &'a dyn StateStore,
    merch: MerchExtractor,
    tour: TourExtractor,
    diff: DiffCalculator,
}

impl<'a> Tracker<'a> {
    pub fn new(
        config: &'a Config,
        fetcher: &'a dyn PageFetcher,
        notifier: &'a dyn Notifier,
        store: &'a dyn StateStore,
    ) -> Result<Self> {
        Ok(Self {
            site: &config.site,
            fetcher,
            notifier,
            store,
            merch: MerchExtractor::new(&config.extraction, &config.site.base_url)?,
            tour: TourExtractor::new(&config.extraction)?,
            diff: DiffCalculator::new(&config.notify.artist),
        })
    }

    /// Perform one check.
    pub fn run(&self) -> Result<RunReport> {
        let previous = self.load_previous();

        let merch = self.check_page("merch", &self.site.merch_url, |html| {
            self.merch.extract(html)
        });
        let tour = self.check_page("tour", &self.site.tour_url, |html| self.tour.extract(html));
        let (merch_status, tour_status) = (merch.status(), tour.status());

        let (merch_hash, merch_items) = merch.resolve(&previous.merch_hash, &previous.merch_items);
        let (tour_hash, tour_dates) = tour.resolve(&previous.tour_hash, &previous.tour_dates);
        let current = Snapshot {
            merch_hash,
            tour_hash,
            merch_items,
            tour_dates,
        };

        let (changes, outcome) = if previous.is_first_run() {
            log::info!("First run - saving initial state without sending notifications");
            (ChangeReport::default(), RunOutcome::FirstRun)
        } else {
            let changes = self.diff.calculate(&previous, &current);
            let outcome = match self.diff.compose(&changes) {
                Some(message) => {
                    let delivery = self.deliver(&message);
                    log::info!("Changes detected: {}", changes.notifications.join(" | "));
                    RunOutcome::Changed { message, delivery }
                }
                None => {
                    log::info!("No changes detected.");
                    RunOutcome::Unchanged
                }
            };
            (changes, outcome)
        };

        self.store.save(&current)?;

        Ok(RunReport {
            merch: merch_status,
            tour: tour_status,
            changes,
            outcome,
            snapshot: current,
        })
    }

    /// An unreadable state file is treated like a missing one.
    fn load_previous(&self) -> Snapshot {
        self.store.load().unwrap_or_else(|e| {
            log::error!(
                "Could not load previous state from {}: {}. Treating this as a first run: \
                 no notifications will be sent and the file will be overwritten.",
                self.store.location(),
                e
            );
            Snapshot::default()
        })
    }

    fn check_page<T>(
        &self,
        label: &str,
        url: &str,
        extract: impl FnOnce(&str) -> Vec<T>,
    ) -> PageOutcome<T> {
        match self.fetcher.fetch(url) {
            Ok(html) => {
                let hash = fingerprint(&html);
                let items = extract(&html);
                log::info!("Checked {} page: {} record(s)", label, items.len());
                PageOutcome::Fresh { hash, items }
            }
            Err(e) => {
                log::error!("Error checking {} page: {}", label, e);
                PageOutcome::CarriedForward {
                    reason: e.to_string(),
                }
            }
        }
    }

    fn deliver(&self, message: &str) -> Option<Delivery> {
        match self.notifier.send(message) {
            Ok(delivery) => Some(delivery),
            Err(e) => {
                log::error!("Error sending notification: {}", e);
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AppError;
    use crate::models::{MerchItem, TourEntry};
    use std::cell::RefCell;
    use std::collections::HashMap;

    const MERCH_URL: &str = "https://quadeca.com/collections/all";
    const TOUR_URL: &str = "https://quadeca.com/pages/tour";

    const MERCH_ONE: &str = r#"
        <div class="product-card"><a href="/products/tee">x</a><h3>IDMTHY Tee</h3><span>$30.00</span></div>
    "#;
    const MERCH_TWO: &str = r#"
        <div class="product-card"><a href="/products/tee">x</a><h3>IDMTHY Tee</h3><span>$30.00</span></div>
        <div class="product-card"><a href="/products/hoodie">x</a><h3>IDMTHY Hoodie</h3><span>$65.00</span></div>
    "#;

    fn tour_page(n: usize) -> String {
        (1..=n)
            .map(|i| {
                format!(
                    r#"<div class="show"><div class="tour-date">Apr {i}</div><div>City {i}</div><div>Venue {i}</div></div>"#
                )
            })
            .collect()
    }

    #[derive(Default)]
    struct FakeFetcher {
        pages: RefCell<HashMap<String, String>>,
    }

    impl FakeFetcher {
        fn with(merch: Option<&str>, tour: Option<&str>) -> Self {
            let fetcher = Self::default();
            fetcher.set(merch, tour);
            fetcher
        }

        fn set(&self, merch: Option<&str>, tour: Option<&str>) {
            let mut pages = self.pages.borrow_mut();
            pages.clear();
            if let Some(m) = merch {
                pages.insert(MERCH_URL.to_string(), m.to_string());
            }
            if let Some(t) = tour {
                pages.insert(TOUR_URL.to_string(), t.to_string());
            }
        }
    }

    impl PageFetcher for FakeFetcher {
        fn fetch(&self, url: &str) -> Result<String> {
            self.pages
                .borrow()
                .get(url)
                .cloned()
                .ok_or_else(|| {
                    AppError::Io(std::io::Error::new(
                        std::io::ErrorKind::ConnectionRefused,
                        format!("connection refused: {url}"),
                    ))
                })
        }
    }

    #[derive(Default)]
    struct RecordingNotifier {
        sent: RefCell<Vec<String>>,
        fail: bool,
    }

    impl Notifier for RecordingNotifier {
        fn send(&self, message: &str) -> Result<Delivery> {
            if self.fail {
                return Err(AppError::notify("provider returned 500"));
            }
            self.sent.borrow_mut().push(message.to_string());
            Ok(Delivery::Sent { id: None })
        }
    }

    #[derive(Default)]
    struct MemoryStore {
        state: RefCell<Option<Snapshot>>,
        fail_load: bool,
        fail_save: bool,
    }

    impl StateStore for MemoryStore {
        fn load(&self) -> Result<Snapshot> {
            if self.fail_load {
                return Err(AppError::state("corrupt state file"));
            }
            Ok(self.state.borrow().clone().unwrap_or_default())
        }

        fn save(&self, snapshot: &Snapshot) -> Result<()> {
            if self.fail_save {
                return Err(AppError::state("read-only filesystem"));
            }
            *self.state.borrow_mut() = Some(snapshot.clone());
            Ok(())
        }

        fn location(&self) -> String {
            "memory".to_string()
        }
    }

    fn saved(store: &MemoryStore) -> Snapshot {
        store.state.borrow().clone().unwrap()
    }

    #[test]
    fn test_first_run_then_unchanged() {
        let config = Config::default();
        let fetcher = FakeFetcher::with(Some(MERCH_ONE), Some(tour_page(2).as_str()));
        let notifier = RecordingNotifier::default();
        let store = MemoryStore::default();
        let tracker = Tracker::new(&config, &fetcher, &notifier, &store).unwrap();

        let first = tracker.run().unwrap();
        assert_eq!(first.outcome, RunOutcome::FirstRun);
        assert!(notifier.sent.borrow().is_empty());
        let baseline = saved(&store);
        assert!(baseline.merch_hash.is_some());
        assert_eq!(baseline.merch_items.len(), 1);
        assert_eq!(baseline.tour_dates.len(), 2);

        let second = tracker.run().unwrap();
        assert_eq!(second.outcome, RunOutcome::Unchanged);
        assert!(!second.changes_detected());
        assert!(notifier.sent.borrow().is_empty());
        assert_eq!(saved(&store), baseline);
    }

    #[test]
    fn test_new_item_is_notified() {
        let config = Config::default();
        let fetcher = FakeFetcher::with(Some(MERCH_ONE), Some(tour_page(1).as_str()));
        let notifier = RecordingNotifier::default();
        let store = MemoryStore::default();
        let tracker = Tracker::new(&config, &fetcher, &notifier, &store).unwrap();
        tracker.run().unwrap();

        fetcher.set(Some(MERCH_TWO), Some(tour_page(1).as_str()));
        let report = tracker.run().unwrap();

        assert!(report.changes_detected());
        let sent = notifier.sent.borrow();
        assert_eq!(sent.len(), 1);
        assert!(sent[0].contains("IDMTHY Hoodie"));
        assert!(!sent[0].contains("IDMTHY Tee"));
        assert_eq!(saved(&store).merch_items.len(), 2);
    }

    #[test]
    fn test_merch_failure_is_isolated() {
        let config = Config::default();
        let previous = Snapshot {
            merch_hash: Some("old-merch".into()),
            tour_hash: Some("old-tour".into()),
            merch_items: vec![MerchItem {
                title: "IDMTHY Tee".into(),
                price: "$30.00".into(),
                url: String::new(),
                sold_out: true,
            }],
            tour_dates: vec![TourEntry {
                date: "Apr 1".into(),
                location: "City 1".into(),
                venue: "Venue 1".into(),
            }],
        };
        let store = MemoryStore {
            state: RefCell::new(Some(previous.clone())),
            ..MemoryStore::default()
        };
        let fetcher = FakeFetcher::with(None, Some(tour_page(3).as_str()));
        let notifier = RecordingNotifier::default();
        let tracker = Tracker::new(&config, &fetcher, &notifier, &store).unwrap();

        let report = tracker.run().unwrap();

        assert!(matches!(report.merch, PageStatus::Failed { .. }));
        assert_eq!(report.tour, PageStatus::Success { records: 3 });
        let after = saved(&store);
        assert_eq!(after.merch_hash, previous.merch_hash);
        assert_eq!(after.merch_items, previous.merch_items);
        assert_eq!(after.tour_dates.len(), 3);

        let sent = notifier.sent.borrow();
        assert_eq!(sent.len(), 1);
        assert!(sent[0].contains("2 new Quadeca tour dates added!"));
        assert!(!sent[0].contains("merch"));
    }

    #[test]
    fn test_notification_failure_still_reports_changes() {
        let config = Config::default();
        let fetcher = FakeFetcher::with(Some(MERCH_ONE), Some(""));
        let notifier = RecordingNotifier {
            fail: true,
            ..RecordingNotifier::default()
        };
        let store = MemoryStore::default();
        let tracker = Tracker::new(&config, &fetcher, &notifier, &store).unwrap();
        tracker.run().unwrap();

        fetcher.set(Some(MERCH_TWO), Some(""));
        let report = tracker.run().unwrap();

        assert!(report.changes_detected());
        assert!(matches!(
            report.outcome,
            RunOutcome::Changed { delivery: None, .. }
        ));
        assert_eq!(saved(&store).merch_items.len(), 2);
    }

    #[test]
    fn test_save_failure_propagates() {
        let config = Config::default();
        let fetcher = FakeFetcher::with(Some(MERCH_ONE), Some(""));
        let notifier = RecordingNotifier::default();
        let store = MemoryStore {
            fail_save: true,
            ..MemoryStore::default()
        };
        let tracker = Tracker::new(&config, &fetcher, &notifier, &store).unwrap();

        assert!(matches!(tracker.run(), Err(AppError::State(_))));
    }

    #[test]
    fn test_both_fetches_fail_on_first_run() {
        let config = Config::default();
        let fetcher = FakeFetcher::default();
        let notifier = RecordingNotifier::default();
        let store = MemoryStore::default();
        let tracker = Tracker::new(&config, &fetcher, &notifier, &store).unwrap();

        let report = tracker.run().unwrap();
        assert_eq!(report.outcome, RunOutcome::FirstRun);
        assert_eq!(saved(&store), Snapshot::default());
    }

    #[test]
    fn test_page_status_counts_records() {
        let outcome: PageOutcome<u8> = PageOutcome::Fresh {
            hash: "h".into(),
            items: vec![1, 2],
        };
        assert_eq!(outcome.status(), PageStatus::Success { records: 2 });
    }

    #[test]
    fn test_unreadable_state_is_a_silent_first_run() {
        let config = Config::default();
        let fetcher = FakeFetcher::with(Some(MERCH_TWO), Some(tour_page(1).as_str()));
        let notifier = RecordingNotifier::default();
        let store = MemoryStore {
            fail_load: true,
            ..MemoryStore::default()
        };
        let tracker = Tracker::new(&config, &fetcher, &notifier, &store).unwrap();

        let report = tracker.run().unwrap();
        assert_eq!(report.outcome, RunOutcome::FirstRun);
        assert!(notifier.sent.borrow().is_empty());
        assert_eq!(saved(&store).merch_items.len(), 2);
    }

    #[test]
    fn test_empty_tour_date_counts_toward_added() {
        let config = Config::default();
        let fetcher = FakeFetcher::with(Some(MERCH_ONE), Some(tour_page(1).as_str()));
        let notifier = RecordingNotifier::default();
        let store = MemoryStore::default();
        let tracker = Tracker::new(&config, &fetcher, &notifier, &store).unwrap();
        tracker.run().unwrap();

        let tour = format!(r#"{}<div class="show"><div class="tour-date"></div></div>"#, tour_page(1));
        fetcher.set(Some(MERCH_ONE), Some(tour.as_str()));
        tracker.run().unwrap();

        let sent = notifier.sent.borrow();
        assert_eq!(sent.len(), 1);
        assert!(sent[0].contains("1 new Quadeca tour dates added!"));
    }
}
