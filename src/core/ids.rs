//! Identitäten für Kurven, Ebenen und Szenen-Items.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

/// Prozessweiter Zähler für Kurven-Handles. Startet bei 1, 0 bleibt frei.
static NEXT_CURVE_ID: AtomicU64 = AtomicU64::new(1);

/// Prozess-eindeutiges Handle einer Kurve.
///
/// Wird beim Eintritt einer Kurve ins System vergeben und nie wiederverwendet.
/// Aus Rohwerten erzeugte Handles (Dateien, Tests) schieben den Zähler hinter
/// den Rohwert, damit `allocate` keine Kollision liefern kann.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "u64", into = "u64")]
pub struct CurveId(u64);

impl CurveId {
    /// Vergibt ein neues, noch nie benutztes Handle.
    pub fn allocate() -> Self {
        Self(NEXT_CURVE_ID.fetch_add(1, Ordering::Relaxed))
    }

    /// Übernimmt einen Rohwert (z.B. aus einer Szenendatei).
    pub fn from_raw(raw: u64) -> Self {
        NEXT_CURVE_ID.fetch_max(raw.saturating_add(1), Ordering::Relaxed);
        Self(raw)
    }

    /// Rohwert des Handles.
    pub fn raw(self) -> u64 {
        self.0
    }
}

impl From<u64> for CurveId {
    fn from(raw: u64) -> Self {
        Self::from_raw(raw)
    }
}

impl From<CurveId> for u64 {
    fn from(id: CurveId) -> Self {
        id.0
    }
}

impl fmt::Display for CurveId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Kurve#{}", self.0)
    }
}

/// Identität einer geometrischen Ebene (vergeben von der `PlaneRegistry`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlaneId(pub(crate) u32);

impl PlaneId {
    /// Rohwert des Handles.
    pub fn raw(self) -> u32 {
        self.0
    }
}

impl fmt::Display for PlaneId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Ebene#{}", self.0)
    }
}

/// Identität eines Szenen-Items (vergeben vom `ItemStore`).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ItemId(pub(crate) u64);

impl ItemId {
    /// Rohwert des Handles.
    pub fn raw(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Item#{}", self.0)
    }
}
