//! Fehlerarten der Trimm-/Regions-Koordination.
//!
//! Alle Varianten sind Verletzungen von Vorbedingungen, keine erwartbaren
//! Laufzeitfehler: sie brechen die umgebende Transaktion ab und werden nicht
//! wiederholt.

use super::ids::{CurveId, ItemId};
use thiserror::Error;

/// Strukturierter Fehler aller Engine-Operationen.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ContourError {
    /// Transaktion im falschen Zustand betreten oder beendet.
    #[error("Ungültiger Zustand: {0}")]
    InvalidState(String),

    /// Kurve ist im Index nicht registriert.
    #[error("{0} ist nicht registriert")]
    NotFound(CurveId),

    /// Kurve ist bereits registriert (oder bereits zum Hinzufügen vorgemerkt).
    #[error("{0} ist bereits registriert")]
    AlreadyRegistered(CurveId),

    /// Szenen-Item existiert nicht.
    #[error("{0} existiert nicht")]
    ItemNotFound(ItemId),

    /// Kurve hat weniger als zwei Punkte.
    #[error("{0} ist degeneriert (weniger als zwei Punkte)")]
    DegenerateCurve(CurveId),
}

impl ContourError {
    /// Kurzform für `InvalidState` mit formatierbarer Nachricht.
    pub fn invalid_state(message: impl Into<String>) -> Self {
        Self::InvalidState(message.into())
    }
}
