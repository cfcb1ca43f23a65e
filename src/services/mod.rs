//! Extraction layer for the tracker.
//!
//! This module turns raw storefront markup into snapshot records:
//! - Merch products (`MerchExtractor`)
//! - Tour dates (`TourExtractor`)
//! - Shared strategy helpers (`first_match`, `text_containing_or`)

mod merch;
pub mod strategy;
mod tour;

pub use merch::MerchExtractor;
pub use tour::TourExtractor;
