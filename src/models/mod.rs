// src/models/mod.rs

//! Domain models for the tracker.
//!
//! This module contains the snapshot types persisted between runs and the
//! configuration that drives fetching, extraction and notification.

mod config;
mod snapshot;

// Re-export all public types
pub use config::{
    Config, ExtractionConfig, HttpConfig, NotifyConfig, SiteConfig, StorageConfig,
    TwilioCredentials, WORKSPACE_ENV, parse_selector,
};
pub use snapshot::{
    MerchItem, Snapshot, TourEntry, UNKNOWN_LOCATION, UNKNOWN_PRICE, UNKNOWN_TITLE,
    UNKNOWN_VENUE,
};
