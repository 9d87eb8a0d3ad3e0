//! Domain models for the nutriapp system.

mod consultation;
pub mod fingerprint;
mod module;
mod patient;
mod report;

pub use consultation::*;
pub use module::*;
pub use patient::*;
pub use report::*;

/// Current UTC time, second precision, RFC 3339.
pub fn timestamp_now() -> String {
    chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Secs, true)
}
