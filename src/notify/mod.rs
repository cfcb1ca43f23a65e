//! Outbound notifications.
//!
//! Delivery is best-effort: a missing configuration downgrades to a logged
//! no-op and a failed send is reported to the caller, never retried.

mod sms;

use crate::error::Result;

pub use sms::{SmsNotifier, SmsResponse};

/// What happened to a notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Delivery {
    /// Accepted by the provider
    Sent { id: Option<String> },
    /// Not configured; the message was only logged
    Skipped,
}

/// Sink for change notifications.
pub trait Notifier {
    fn send(&self, message: &str) -> Result<Delivery>;
}
