//! Pipeline entry points for tracker operations.
//!
//! - `Tracker::run`: one full check of both storefront pages
//! - `DiffCalculator`: turns two snapshots into notification text

pub mod check;
pub mod diff;

pub use check::{PageOutcome, PageStatus, RunOutcome, RunReport, Tracker};
pub use diff::{ChangeReport, DiffCalculator, MerchDiff, TourChange};
