pub mod book;
pub mod dedup;
pub mod error;
pub mod monitor;
pub mod notify;
pub mod price;
pub mod tolerance;

pub mod test_support;

pub use book::{SignalBook, Supersession};
pub use dedup::AlertDeduplicator;
pub use error::{NotifyError, PriceError};
pub use monitor::{PollReport, PriceMonitor, SharedBook};
pub use notify::{DeliveryReport, Notification, NotificationKind, NotificationSink, Notifier, Priority};
pub use price::PriceSource;
pub use tolerance::Tolerance;
