//! Transaktions-Koordinator zwischen Kurven-Mutationen, Index und Regions-Aufbau.
//!
//! Zustandsmaschine mit `Idle` und `InTransaction`. Außerhalb einer
//! Transaktion wirken `add_curve`/`remove_curve` sofort; innerhalb werden sie
//! gesammelt und beim Commit als ein atomarer Batch angewendet. Danach wird
//! jede betroffene Ebene genau einmal neu in Regionen zerlegt.

use super::curve::Curve;
use super::error::ContourError;
use super::ids::{CurveId, PlaneId};
use super::index::{CommitBatch, PlaneCurveIndex};
use super::region::RegionRebuilder;
use super::transaction::Transaction;
use indexmap::{IndexMap, IndexSet};

/// Zustand des Koordinators.
#[derive(Debug, Clone, Default)]
pub enum CoordinatorState {
    /// Keine Transaktion offen
    #[default]
    Idle,
    /// Transaktion offen, Änderungen werden gesammelt
    InTransaction(Transaction),
}

/// Ergebnis eines Koordinator-Commits.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CommitSummary {
    /// Hinzugefügte Kurven
    pub added: Vec<CurveId>,
    /// Entfernte Kurven
    pub deleted: Vec<CurveId>,
    /// Veraltete (nicht entfernte) Kurven nach Auflösung der Kaskade
    pub dirty: Vec<CurveId>,
    /// Kurven mit neu erzeugten Fragmenten
    pub regenerated: IndexSet<CurveId>,
    /// Ebenen, deren Regionen neu aufgebaut wurden (jede genau einmal)
    pub planes: IndexSet<PlaneId>,
}

/// Koordiniert Kurven-Änderungen, Kaskaden-Invalidierung und Regions-Neuaufbau.
///
/// Jede Instanz besitzt genau einen Zustandsslot; Transaktionen werden nicht
/// verschachtelt und nicht parallel geöffnet.
#[derive(Debug)]
pub struct TransactionCoordinator<I, R> {
    index: I,
    rebuilder: R,
    state: CoordinatorState,
}

impl<I: PlaneCurveIndex, R: RegionRebuilder> TransactionCoordinator<I, R> {
    /// Erstellt einen Koordinator im Zustand `Idle`.
    pub fn new(index: I, rebuilder: R) -> Self {
        Self {
            index,
            rebuilder,
            state: CoordinatorState::Idle,
        }
    }

    /// Aktueller Zustand.
    pub fn state(&self) -> &CoordinatorState {
        &self.state
    }

    /// Gibt `true` zurück, wenn eine Transaktion offen ist.
    pub fn is_in_transaction(&self) -> bool {
        matches!(self.state, CoordinatorState::InTransaction(_))
    }

    /// Read-only Sicht auf die offene Transaktion.
    pub fn pending(&self) -> Option<&Transaction> {
        match &self.state {
            CoordinatorState::InTransaction(tx) => Some(tx),
            CoordinatorState::Idle => None,
        }
    }

    /// Kurven-Index (nur lesend).
    pub fn index(&self) -> &I {
        &self.index
    }

    /// Regions-Aufbau (nur lesend).
    pub fn rebuilder(&self) -> &R {
        &self.rebuilder
    }

    /// Zerlegt den Koordinator in Index und Regions-Aufbau.
    pub fn into_parts(self) -> (I, R) {
        (self.index, self.rebuilder)
    }

    /// Öffnet eine Transaktion.
    pub fn begin(&mut self) -> Result<(), ContourError> {
        if self.is_in_transaction() {
            return Err(ContourError::invalid_state(
                "Transaktion bereits aktiv (keine Verschachtelung)",
            ));
        }
        self.state = CoordinatorState::InTransaction(Transaction::new());
        log::debug!("Transaktion geöffnet");
        Ok(())
    }

    /// Verwirft die offene Transaktion ohne Commit und ohne Regions-Aufbau.
    pub fn abort(&mut self) -> Option<Transaction> {
        match std::mem::take(&mut self.state) {
            CoordinatorState::InTransaction(tx) => {
                log::debug!("Transaktion verworfen");
                Some(tx)
            }
            CoordinatorState::Idle => None,
        }
    }

    /// Wendet die offene Transaktion an.
    ///
    /// Der Zustand ist ab Beginn des Commits wieder `Idle`, auch wenn der
    /// Index den Batch ablehnt.
    pub fn commit(&mut self) -> Result<CommitSummary, ContourError> {
        let CoordinatorState::InTransaction(mut tx) = std::mem::take(&mut self.state) else {
            return Err(ContourError::invalid_state("Commit ohne aktive Transaktion"));
        };
        if tx.is_empty() {
            return Ok(CommitSummary::default());
        }

        // Fixpunkt über alle Löschungen der Transaktion
        let mut partners = Vec::new();
        for &id in tx.deleted() {
            partners.extend(self.index.cascade(id)?);
        }
        tx.resolve(partners);

        // Ebenen der veralteten und gelöschten Kurven (vor dem Commit)
        let mut planes: IndexSet<PlaneId> = IndexSet::new();
        for &id in tx.dirty().iter().chain(tx.deleted()) {
            planes.insert(self.index.lookup(id)?.plane);
        }

        let batch = tx.into_batch();
        let report = self.index.commit(&batch)?;

        // Ebenen neuer Kurven stehen erst nach dem Commit fest
        for curve in &batch.added {
            planes.insert(self.index.lookup(curve.id)?.plane);
        }

        self.rebuild_planes(planes.iter().copied());

        log::info!(
            "Transaktion angewendet: +{} -{} veraltet {} | {} Fragment-Neuberechnung(en), {} Ebene(n)",
            batch.added.len(),
            batch.deleted.len(),
            batch.dirty.len(),
            report.regenerated.len(),
            planes.len()
        );

        Ok(CommitSummary {
            added: report.added,
            deleted: batch.deleted,
            dirty: batch.dirty,
            regenerated: report.regenerated,
            planes,
        })
    }

    /// Führt `body` als eine Transaktion aus.
    ///
    /// Erfolg → Commit und Regions-Aufbau; Fehler → alle gesammelten
    /// Änderungen werden verworfen und der Fehler weitergereicht. Ein
    /// verschachtelter Aufruf aus `body` heraus scheitert mit `InvalidState`.
    pub async fn transaction<T, F>(&mut self, body: F) -> anyhow::Result<T>
    where
        F: AsyncFnOnce(&mut Self) -> anyhow::Result<T>,
    {
        self.begin()?;
        match body(&mut *self).await {
            Ok(value) => {
                self.commit()?;
                Ok(value)
            }
            Err(err) => {
                self.abort();
                log::warn!("Transaktion abgebrochen: {err:#}");
                Err(err)
            }
        }
    }

    /// Fügt eine Kurve hinzu (sofort oder vorgemerkt).
    pub fn add_curve(&mut self, curve: Curve) -> Result<(), ContourError> {
        if let CoordinatorState::InTransaction(tx) = &mut self.state {
            if tx.restore_deleted(curve.id) {
                log::debug!("{}: Löschung zurückgenommen, bleibt veraltet", curve.id);
                return Ok(());
            }
            if tx.is_added(curve.id) || self.index.contains(curve.id) {
                return Err(ContourError::AlreadyRegistered(curve.id));
            }
            curve.validate()?;
            log::debug!("{}: zum Hinzufügen vorgemerkt", curve.id);
            tx.record_added(curve);
            return Ok(());
        }

        let id = curve.id;
        self.index.commit(&CommitBatch {
            added: vec![curve],
            ..CommitBatch::default()
        })?;
        let plane = self.index.lookup(id)?.plane;
        self.rebuild_planes([plane]);
        Ok(())
    }

    /// Entfernt eine Kurve (sofort oder per Kaskade vorgemerkt).
    pub fn remove_curve(&mut self, id: CurveId) -> Result<(), ContourError> {
        if let CoordinatorState::InTransaction(tx) = &mut self.state {
            if tx.withdraw_added(id).is_some() {
                log::debug!("{}: vorgemerktes Hinzufügen zurückgenommen", id);
                return Ok(());
            }
            let partners = self.index.cascade(id)?;
            log::debug!("{}: Kaskade markiert {:?} als veraltet", id, partners);
            tx.cascade_delete(id, partners);
            return Ok(());
        }

        let plane = self.index.lookup(id)?.plane;
        self.index.remove(id)?;
        self.rebuild_planes([plane]);
        Ok(())
    }

    /// Vollständige Neusynchronisation mit den aktuell bekannten Kurven.
    pub fn rebuild(&mut self) -> Result<CommitSummary, ContourError> {
        let curves = self.index.curves();
        self.rebuild_from(curves)
    }

    /// Vollständige Neusynchronisation mit einer extern wiederhergestellten Kurvenmenge.
    ///
    /// Alle Kurven werden in einer Transaktion neu hinzugefügt; Ebenen, die
    /// vorher Kurven hatten und jetzt keine mehr, werden ebenfalls geleert.
    pub fn rebuild_from(&mut self, curves: impl IntoIterator<Item = Curve>) -> Result<CommitSummary, ContourError> {
        if self.is_in_transaction() {
            return Err(ContourError::invalid_state(
                "Neuaufbau während einer offenen Transaktion",
            ));
        }

        let mut unique: IndexMap<CurveId, Curve> = IndexMap::new();
        for curve in curves {
            curve.validate()?;
            let id = curve.id;
            if unique.insert(id, curve).is_some() {
                return Err(ContourError::AlreadyRegistered(id));
            }
        }

        let previous = self.index.curves();
        let stale_planes = self.index.clear();
        let mut summary = match self.readd_all(unique.into_values()) {
            Ok(summary) => summary,
            Err(err) => {
                // Index auf den alten Stand zurücksetzen; Regionen sind unverändert
                self.index.clear();
                if let Err(restore_err) = self.index.commit(&CommitBatch {
                    added: previous,
                    ..CommitBatch::default()
                }) {
                    log::error!("Index nach gescheitertem Neuaufbau nicht wiederherstellbar: {restore_err}");
                }
                return Err(err);
            }
        };

        let emptied: Vec<PlaneId> = stale_planes
            .into_iter()
            .filter(|plane| !summary.planes.contains(plane))
            .collect();
        self.rebuild_planes(emptied.iter().copied());
        summary.planes.extend(emptied);

        log::info!(
            "Neuaufbau: {} Kurve(n) auf {} Ebene(n)",
            summary.added.len(),
            summary.planes.len()
        );
        Ok(summary)
    }

    fn readd_all(&mut self, curves: impl IntoIterator<Item = Curve>) -> Result<CommitSummary, ContourError> {
        self.begin()?;
        if let Err(err) = curves.into_iter().try_for_each(|curve| self.add_curve(curve)) {
            self.abort();
            return Err(err);
        }
        self.commit()
    }

    fn rebuild_planes(&mut self, planes: impl IntoIterator<Item = PlaneId>) {
        for plane in planes {
            let fragments = self.index.fragments_on_plane(plane);
            self.rebuilder.rebuild_for_plane(plane, &fragments);
        }
    }
}
