//! Diff calculation between the previous and current snapshot.
//!
//! Page fingerprints gate the work: a page whose hash did not change is not
//! compared at all. When a hash did change, the structural diff supplies the
//! message. If nothing structural changed, a generic message is still sent
//! for that page, so a tripped gate always produces a notification.

use std::collections::HashSet;

use crate::models::{MerchItem, Snapshot};

/// Structural changes on the merch page.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MerchDiff {
    /// Titles not present before, in page order
    pub new_titles: Vec<String>,
    /// Titles that went from sold out to available
    pub back_in_stock: Vec<String>,
}

impl MerchDiff {
    pub fn is_empty(&self) -> bool {
        self.new_titles.is_empty() && self.back_in_stock.is_empty()
    }
}

/// How the tour page changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TourChange {
    /// There were no dates before, now there are this many
    Announced(usize),
    /// This many more dates than before
    Added(usize),
    /// Hash changed without a count increase
    Other,
}

/// Result of comparing two snapshots.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChangeReport {
    /// `Some` when the merch hash changed
    pub merch: Option<MerchDiff>,
    /// `Some` when the tour hash changed
    pub tour: Option<TourChange>,
    /// Human-readable lines, in merch-then-tour order
    pub notifications: Vec<String>,
}

impl ChangeReport {
    /// Check if there are any changes.
    pub fn has_changes(&self) -> bool {
        !self.notifications.is_empty()
    }
}

/// Calculator for computing diffs between snapshots.
#[derive(Debug, Clone)]
pub struct DiffCalculator {
    /// Name used in notification text
    artist: String,
}

impl DiffCalculator {
    /// Create a new diff calculator.
    pub fn new(artist: impl Into<String>) -> Self {
        Self {
            artist: artist.into(),
        }
    }

    /// Calculate the diff between previous and current snapshots.
    pub fn calculate(&self, previous: &Snapshot, current: &Snapshot) -> ChangeReport {
        let mut report = ChangeReport::default();

        if current.merch_hash != previous.merch_hash {
            let diff = merch_diff(&previous.merch_items, &current.merch_items);
            if !diff.new_titles.is_empty() {
                report.notifications.push(format!(
                    "New {} merch found: {}",
                    self.artist,
                    diff.new_titles.join(", ")
                ));
            }
            if !diff.back_in_stock.is_empty() {
                report.notifications.push(format!(
                    "Items back in stock: {}",
                    diff.back_in_stock.join(", ")
                ));
            }
            if diff.is_empty() {
                report
                    .notifications
                    .push(format!("Changes detected on {}'s merch page!", self.artist));
            }
            report.merch = Some(diff);
        }

        if current.tour_hash != previous.tour_hash {
            let change = tour_change(previous.tour_dates.len(), current.tour_dates.len());
            report.notifications.push(match change {
                TourChange::Announced(n) => {
                    format!("{} tour dates found! {} dates available.", self.artist, n)
                }
                TourChange::Added(n) => format!("{} new {} tour dates added!", n, self.artist),
                TourChange::Other => format!("Changes detected on {}'s tour page!", self.artist),
            });
            report.tour = Some(change);
        }

        report
    }

    /// Single outgoing message for a report, `None` when nothing changed.
    pub fn compose(&self, report: &ChangeReport) -> Option<String> {
        if !report.has_changes() {
            return None;
        }
        Some(format!(
            "{} UPDATE: {} Check the website for details!",
            self.artist.to_uppercase(),
            report.notifications.join(" ")
        ))
    }
}

/// New titles and restocks between two item lists.
///
/// Restocks are matched pairwise on title; duplicated titles on either side
/// produce repeated entries.
pub fn merch_diff(previous: &[MerchItem], current: &[MerchItem]) -> MerchDiff {
    let previous_titles: HashSet<&str> = previous.iter().map(|i| i.title.as_str()).collect();

    let mut seen = HashSet::new();
    let new_titles = current
        .iter()
        .map(|i| i.title.as_str())
        .filter(|t| !previous_titles.contains(t) && seen.insert(*t))
        .map(str::to_string)
        .collect();

    let mut back_in_stock = Vec::new();
    for curr in current {
        for prev in previous {
            if curr.title == prev.title && prev.sold_out && !curr.sold_out {
                back_in_stock.push(curr.title.clone());
            }
        }
    }

    MerchDiff {
        new_titles,
        back_in_stock,
    }
}

/// Classify a tour page change by entry counts alone.
pub fn tour_change(previous_count: usize, current_count: usize) -> TourChange {
    if previous_count == 0 && current_count > 0 {
        TourChange::Announced(current_count)
    } else if current_count > previous_count {
        TourChange::Added(current_count - previous_count)
    } else {
        TourChange::Other
    }
}
