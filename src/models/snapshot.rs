//! Snapshot data structures.
//!
//! A [`Snapshot`] is what one run learned about the storefront. It is the
//! exact shape of the state file, so field names must stay stable.

use serde::{Deserialize, Serialize};

/// Placeholder title when no element carries the product marker.
pub const UNKNOWN_TITLE: &str = "Unknown Title";
/// Placeholder price when no element carries the currency symbol.
pub const UNKNOWN_PRICE: &str = "Unknown Price";
/// Placeholder when the node after a tour date is missing.
pub const UNKNOWN_LOCATION: &str = "Unknown Location";
/// Placeholder when the second node after a tour date is missing.
pub const UNKNOWN_VENUE: &str = "Unknown Venue";

/// A product listed on the merch page.
///
/// Identity is the `title`, compared case-sensitively.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct MerchItem {
    pub title: String,
    pub price: String,
    pub url: String,

    /// Older state files may lack this flag; treat those items as sold out.
    #[serde(default = "sold_out_by_default")]
    pub sold_out: bool,
}

fn sold_out_by_default() -> bool {
    true
}

/// A single tour date. Entries have no identity and are only counted.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TourEntry {
    pub date: String,
    pub location: String,
    pub venue: String,
}

/// Last known (or freshly built) state of both pages.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Snapshot {
    /// Fingerprint of the raw merch page, `None` before the first run
    pub merch_hash: Option<String>,

    /// Fingerprint of the raw tour page
    pub tour_hash: Option<String>,

    #[serde(default)]
    pub merch_items: Vec<MerchItem>,

    #[serde(default)]
    pub tour_dates: Vec<TourEntry>,
}

impl Snapshot {
    /// The stored state has never been written by a run.
    pub fn is_first_run(&self) -> bool {
        self.merch_hash.is_none()
    }

    /// Number of merch items currently flagged sold out.
    pub fn sold_out_count(&self) -> usize {
        self.merch_items.iter().filter(|item| item.sold_out).count()
    }
}
