//! Angesammelte Änderungen einer offenen Transaktion.
//!
//! Drei disjunkte Mengen: `added`, `deleted`, `dirty`. Die Mengen behalten
//! die Einfügereihenfolge, damit Commits deterministisch ablaufen.

use super::curve::Curve;
use super::ids::CurveId;
use super::index::CommitBatch;
use indexmap::{IndexMap, IndexSet};

/// Buchführung einer Transaktion (flüchtig, nie persistiert).
#[derive(Debug, Clone, Default)]
pub struct Transaction {
    added: IndexMap<CurveId, Curve>,
    deleted: IndexSet<CurveId>,
    dirty: IndexSet<CurveId>,
}

impl Transaction {
    /// Leere Transaktion.
    pub fn new() -> Self {
        Self::default()
    }

    /// Zum Hinzufügen vorgemerkte Kurven.
    pub fn added(&self) -> impl Iterator<Item = CurveId> + '_ {
        self.added.keys().copied()
    }

    /// Zum Löschen vorgemerkte Kurven.
    pub fn deleted(&self) -> &IndexSet<CurveId> {
        &self.deleted
    }

    /// Als veraltet markierte Kurven.
    pub fn dirty(&self) -> &IndexSet<CurveId> {
        &self.dirty
    }

    /// Ist die Kurve zum Hinzufügen vorgemerkt?
    pub fn is_added(&self, id: CurveId) -> bool {
        self.added.contains_key(&id)
    }

    /// Ist die Kurve zum Löschen vorgemerkt?
    pub fn is_deleted(&self, id: CurveId) -> bool {
        self.deleted.contains(&id)
    }

    /// Ist die Kurve als veraltet markiert?
    pub fn is_dirty(&self, id: CurveId) -> bool {
        self.dirty.contains(&id)
    }

    /// Gibt `true` zurück, wenn die Transaktion nichts ändert.
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.deleted.is_empty() && self.dirty.is_empty()
    }

    /// Merkt eine neue Kurve vor.
    pub(crate) fn record_added(&mut self, curve: Curve) {
        self.added.insert(curve.id, curve);
    }

    /// Nimmt ein vorgemerktes Hinzufügen zurück.
    pub(crate) fn withdraw_added(&mut self, id: CurveId) -> Option<Curve> {
        self.added.shift_remove(&id)
    }

    /// Nimmt ein vorgemerktes Löschen zurück; die Kurve bleibt als veraltet markiert.
    pub(crate) fn restore_deleted(&mut self, id: CurveId) -> bool {
        if self.deleted.shift_remove(&id) {
            self.dirty.insert(id);
            true
        } else {
            false
        }
    }

    /// Ein Kaskaden-Schritt: `id` wird gelöscht, Joint-Partner werden veraltet.
    ///
    /// Partner, die bereits gelöscht sind, bleiben gelöscht. Der Schritt geht
    /// nicht rekursiv über die Joints der Partner hinaus.
    pub(crate) fn cascade_delete(&mut self, id: CurveId, partners: impl IntoIterator<Item = CurveId>) {
        self.dirty.shift_remove(&id);
        self.deleted.insert(id);
        for partner in partners {
            if partner != id && !self.deleted.contains(&partner) {
                self.dirty.insert(partner);
            }
        }
    }

    /// Erzwingt den Fixpunkt über alle Löschungen: Löschen hat Vorrang.
    pub(crate) fn resolve(&mut self, partners_of_deleted: impl IntoIterator<Item = CurveId>) {
        for partner in partners_of_deleted {
            if !self.deleted.contains(&partner) {
                self.dirty.insert(partner);
            }
        }
        let deleted = &self.deleted;
        self.dirty.retain(|id| !deleted.contains(id));
    }

    /// Überführt die Buchführung in einen Index-Batch.
    pub(crate) fn into_batch(self) -> CommitBatch {
        CommitBatch {
            added: self.added.into_values().collect(),
            deleted: self.deleted.into_iter().collect(),
            dirty: self.dirty.into_iter().collect(),
        }
    }
}
