//! Geteilte Typen für layer-übergreifende Verträge.
//!
//! Enthält die Laufzeit-Optionen, die sowohl `core` als auch `app`
//! lesen, ohne dass `core` von `app` abhängt.

pub mod options;

pub use options::ContourOptions;
pub use options::{ENDPOINT_TOLERANCE, HISTORY_DEPTH, MIN_REGION_AREA};
