//! Notification reconciliation between the live socket and the snapshot
//! fetch.

pub mod record;
pub mod store;

pub use record::{sanitize_markdown, NotificationRecord, Provenance};
pub use store::{ReconciliationStore, StoreConfig, StoreStats};
