pub mod email;
pub mod pushover;

pub use email::EmailSink;
pub use pushover::PushoverSink;
