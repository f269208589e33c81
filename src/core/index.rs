//! Vertrag des Kurven-Index (Schnittsuche + Trimmen) und Commit-Typen.

use super::curve::Curve;
use super::error::ContourError;
use super::ids::{CurveId, PlaneId};
use super::record::{CurveRecord, FragmentPath};
use indexmap::IndexSet;

/// Strukturelle Änderungen einer Transaktion, wie sie der Index anwendet.
#[derive(Debug, Clone, Default)]
pub struct CommitBatch {
    /// Neu hinzuzufügende Kurven
    pub added: Vec<Curve>,
    /// Zu entfernende Kurven
    pub deleted: Vec<CurveId>,
    /// Kurven, deren Joints/Fragmente neu berechnet werden müssen
    pub dirty: Vec<CurveId>,
}

impl CommitBatch {
    /// Gibt `true` zurück, wenn der Batch nichts ändert.
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.deleted.is_empty() && self.dirty.is_empty()
    }
}

/// Ergebnis eines strukturellen Commits.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CommitReport {
    /// Registrierte Kurven
    pub added: Vec<CurveId>,
    /// Entfernte Kurven
    pub removed: Vec<CurveId>,
    /// Kurven, deren Fragmente neu erzeugt wurden
    pub regenerated: IndexSet<CurveId>,
    /// Ebenen, deren Kurvenmenge oder Joints angefasst wurden
    pub planes: IndexSet<PlaneId>,
}

/// Besitzt die `CurveRecord`-Tabelle und berechnet Joints und Fragmente.
///
/// `commit` muss atomar sein: entweder wird der ganze Batch angewendet oder
/// nichts. Das Ergebnis darf nicht von der Reihenfolge der hinzugefügten
/// Kurven abhängen.
pub trait PlaneCurveIndex {
    /// Record einer registrierten Kurve.
    fn lookup(&self, id: CurveId) -> Result<&CurveRecord, ContourError>;

    /// Prüft ob eine Kurve registriert ist.
    fn contains(&self, id: CurveId) -> bool {
        self.lookup(id).is_ok()
    }

    /// Entfernt eine Kurve sofort (außerhalb einer Transaktion).
    fn remove(&mut self, id: CurveId) -> Result<CurveRecord, ContourError>;

    /// Partnerkurven über die Joints der Kurve (ein Kaskaden-Schritt).
    fn cascade(&self, id: CurveId) -> Result<Vec<CurveId>, ContourError> {
        Ok(self.lookup(id)?.joints.partners())
    }

    /// Wendet einen Batch atomar an.
    fn commit(&mut self, batch: &CommitBatch) -> Result<CommitReport, ContourError>;

    /// Getrimmte Geometrie aller Kurven einer Ebene.
    fn fragments_on_plane(&self, plane: PlaneId) -> Vec<FragmentPath>;

    /// Alle registrierten Kurven (nach ID sortiert).
    fn curves(&self) -> Vec<Curve>;

    /// Entfernt alle Records; liefert die Ebenen, die Kurven hatten.
    fn clear(&mut self) -> Vec<PlaneId>;
}
