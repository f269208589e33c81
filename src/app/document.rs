//! Dokument: Item-Bestand, Transaktions-Koordinator und Undo/Redo.
//!
//! Alle Item-Operationen funktionieren innerhalb und außerhalb einer
//! Transaktion. Nur Kurven-Items werden an den Koordinator weitergeleitet;
//! Volumenkörper und fixierte Regionen sind reine Daten im `ItemStore`.

use super::command_log::CommandLog;
use super::history::{EditHistory, Snapshot};
use crate::core::{
    CommitSummary, ContourError, Curve, ItemId, ItemKind, ItemStore, PlanarRegionBuilder,
    PlaneId, PlaneIndex, Region, RegionItem, SceneItem, TransactionCoordinator,
};
use crate::shared::ContourOptions;
use anyhow::bail;
use std::sync::Arc;

/// Koordinator mit den konkreten Index- und Regions-Implementierungen.
pub type ContourCoordinator = TransactionCoordinator<PlaneIndex, PlanarRegionBuilder>;

/// Bearbeitbares Dokument.
pub struct Document {
    /// Item-Bestand (Arc für O(1)-Snapshots)
    items: Arc<ItemStore>,
    coordinator: ContourCoordinator,
    history: EditHistory,
    /// Log der ausgeführten Commands
    pub command_log: CommandLog,
    options: ContourOptions,
    last_commit: Option<CommitSummary>,
}

impl Document {
    /// Erstellt ein leeres Dokument.
    pub fn new(options: ContourOptions) -> Self {
        let coordinator = TransactionCoordinator::new(
            PlaneIndex::new(&options),
            PlanarRegionBuilder::new(options.endpoint_tolerance, options.min_region_area),
        );
        Self {
            items: Arc::new(ItemStore::new()),
            coordinator,
            history: EditHistory::new_with_capacity(options.history_depth),
            command_log: CommandLog::new(),
            options,
            last_commit: None,
        }
    }

    /// Aktueller Item-Bestand.
    pub fn items(&self) -> &ItemStore {
        &self.items
    }

    /// Item nach ID.
    pub fn item(&self, id: ItemId) -> Option<&SceneItem> {
        self.items.get(id)
    }

    /// Koordinator (nur lesend).
    pub fn coordinator(&self) -> &ContourCoordinator {
        &self.coordinator
    }

    /// Aktive Optionen.
    pub fn options(&self) -> &ContourOptions {
        &self.options
    }

    /// Ergebnis des letzten Koordinator-Commits.
    pub fn last_commit(&self) -> Option<&CommitSummary> {
        self.last_commit.as_ref()
    }

    /// Regionen einer Ebene.
    pub fn regions(&self, plane: PlaneId) -> &[Region] {
        self.coordinator.rebuilder().regions(plane)
    }

    /// Alle Regionen aller Ebenen.
    pub fn all_regions(&self) -> impl Iterator<Item = &Region> {
        self.coordinator.rebuilder().all_regions()
    }

    /// Gibt `true` zurück, wenn eine Transaktion offen ist.
    pub fn is_in_transaction(&self) -> bool {
        self.coordinator.is_in_transaction()
    }

    /// Prüft ob Undo möglich ist.
    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    /// Prüft ob Redo möglich ist.
    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    // ── Item-Operationen ────────────────────────────────────────────

    /// Fügt ein Item hinzu; sichtbare Kurven werden registriert.
    pub fn add_item(&mut self, item: SceneItem) -> anyhow::Result<ItemId> {
        let before = self.snapshot_outside_transaction();
        self.swap_curves(None, item.active_curve().cloned())?;
        let id = Arc::make_mut(&mut self.items).insert(item);
        self.finish_edit(before);
        log::debug!("{id} hinzugefügt");
        Ok(id)
    }

    /// Entfernt ein Item; eine sichtbare Kurve wird abgemeldet.
    pub fn remove_item(&mut self, id: ItemId) -> anyhow::Result<SceneItem> {
        let old = self.require(id)?.active_curve().cloned();
        let before = self.snapshot_outside_transaction();
        self.swap_curves(old, None)?;
        let removed = Arc::make_mut(&mut self.items)
            .remove(id)
            .ok_or(ContourError::ItemNotFound(id))?;
        self.finish_edit(before);
        log::debug!("{id} entfernt");
        Ok(removed)
    }

    /// Ersetzt den Inhalt eines Items.
    ///
    /// Wiederverwendet die neue Kurve das Handle der alten, bekommt sie ein
    /// frisches Handle: geänderte Geometrie ist eine neue Kurve.
    pub fn replace_item(&mut self, id: ItemId, mut with: SceneItem) -> anyhow::Result<()> {
        let current = self.require(id)?;
        if let (Some(old), ItemKind::Curve(new)) = (current.kind.as_curve(), &mut with.kind) {
            if old.id == new.id {
                *new = new.with_fresh_id();
            }
        }
        let old = current.active_curve().cloned();

        let before = self.snapshot_outside_transaction();
        self.swap_curves(old, with.active_curve().cloned())?;
        if let Some(slot) = Arc::make_mut(&mut self.items).get_mut(id) {
            with.id = id;
            *slot = with;
        }
        self.finish_edit(before);
        log::debug!("{id} ersetzt");
        Ok(())
    }

    /// Blendet ein Item aus; eine Kurve wird abgemeldet.
    pub fn hide(&mut self, id: ItemId) -> anyhow::Result<()> {
        self.set_visible(id, false)
    }

    /// Blendet ein Item ein; eine Kurve wird registriert.
    pub fn unhide(&mut self, id: ItemId) -> anyhow::Result<()> {
        self.set_visible(id, true)
    }

    /// Setzt die Sichtbarkeit. Unveränderte Sichtbarkeit ist ein No-op.
    pub fn set_visible(&mut self, id: ItemId, visible: bool) -> anyhow::Result<()> {
        let item = self.require(id)?;
        if item.visible == visible {
            return Ok(());
        }
        let curve = item.kind.as_curve().cloned();

        let before = self.snapshot_outside_transaction();
        if visible {
            self.swap_curves(None, curve)?;
        } else {
            self.swap_curves(curve, None)?;
        }
        if let Some(item) = Arc::make_mut(&mut self.items).get_mut(id) {
            item.visible = visible;
        }
        self.finish_edit(before);
        log::debug!("{id} sichtbar: {visible}");
        Ok(())
    }

    /// Fixiert eine berechnete Region als eigenes Item.
    ///
    /// Die Kopie folgt späteren Änderungen der Kurven nicht.
    pub fn pin_region(&mut self, plane: PlaneId, key: u64) -> anyhow::Result<ItemId> {
        let Some(region) = self.regions(plane).iter().find(|r| r.key == key) else {
            bail!("Region {key:#018x} auf {plane} nicht gefunden");
        };
        let item = SceneItem::new(
            format!("Region {key:#x}"),
            ItemKind::Region(RegionItem {
                plane,
                boundary: region.boundary.clone(),
            }),
        );
        self.add_item(item)
    }

    // ── Transaktionen ───────────────────────────────────────────────

    /// Führt `body` als eine Transaktion über Items und Kurven aus.
    ///
    /// Erfolg → ein Commit, jede betroffene Ebene wird genau einmal neu
    /// aufgebaut, ein Undo-Schritt. Fehler in `body` oder im Commit → Items,
    /// Index und Regionen bleiben wie vor dem Aufruf.
    pub async fn transaction<T, F>(&mut self, body: F) -> anyhow::Result<T>
    where
        F: AsyncFnOnce(&mut Self) -> anyhow::Result<T>,
    {
        self.coordinator.begin()?;
        let before = Snapshot::of(&self.items);

        let value = match body(&mut *self).await {
            Ok(value) => value,
            Err(err) => {
                self.coordinator.abort();
                self.items = before.items;
                log::warn!("Transaktion abgebrochen: {err:#}");
                return Err(err);
            }
        };

        match self.coordinator.commit() {
            Ok(summary) => {
                if !Arc::ptr_eq(&before.items, &self.items) {
                    self.history.record_snapshot(before);
                }
                self.last_commit = Some(summary);
                Ok(value)
            }
            Err(err) => {
                self.items = before.items;
                log::warn!("Commit fehlgeschlagen, Items zurückgesetzt: {err}");
                Err(err.into())
            }
        }
    }

    // ── Undo / Redo / Neuaufbau ─────────────────────────────────────

    /// Macht den letzten Schritt rückgängig. Gibt `false` zurück, wenn nichts zu tun war.
    ///
    /// Scheitert der Neuaufbau, bleiben Items, Index und History unverändert.
    pub fn undo(&mut self) -> anyhow::Result<bool> {
        self.ensure_idle("Undo")?;
        let Some(prev) = self.history.peek_undo().cloned() else {
            return Ok(false);
        };
        self.resync_to(&prev)?;
        let current = Snapshot::of(&self.items);
        self.history.pop_undo_with_current(current);
        self.restore(prev);
        Ok(true)
    }

    /// Wiederholt den zuletzt rückgängig gemachten Schritt.
    pub fn redo(&mut self) -> anyhow::Result<bool> {
        self.ensure_idle("Redo")?;
        let Some(next) = self.history.peek_redo().cloned() else {
            return Ok(false);
        };
        self.resync_to(&next)?;
        let current = Snapshot::of(&self.items);
        self.history.pop_redo_with_current(current);
        self.restore(next);
        Ok(true)
    }

    /// Baut Index und Regionen aus den sichtbaren Kurven neu auf.
    pub fn rebuild(&mut self) -> anyhow::Result<()> {
        let summary = self.coordinator.rebuild_from(self.items.visible_curves())?;
        self.last_commit = Some(summary);
        Ok(())
    }

    // ── Intern ──────────────────────────────────────────────────────

    fn require(&self, id: ItemId) -> Result<&SceneItem, ContourError> {
        self.items.get(id).ok_or(ContourError::ItemNotFound(id))
    }

    fn ensure_idle(&self, action: &str) -> Result<(), ContourError> {
        if self.coordinator.is_in_transaction() {
            return Err(ContourError::invalid_state(format!(
                "{action} während einer offenen Transaktion"
            )));
        }
        Ok(())
    }

    /// Snapshot für Undo, nur außerhalb einer Transaktion (dort zählt der Transaktions-Snapshot).
    fn snapshot_outside_transaction(&self) -> Option<Snapshot> {
        (!self.coordinator.is_in_transaction()).then(|| Snapshot::of(&self.items))
    }

    fn finish_edit(&mut self, before: Option<Snapshot>) {
        if let Some(snap) = before {
            self.history.record_snapshot(snap);
        }
    }

    /// Synchronisiert Index und Regionen auf die Kurven eines Snapshots.
    fn resync_to(&mut self, snap: &Snapshot) -> anyhow::Result<()> {
        let summary = self.coordinator.rebuild_from(snap.items.visible_curves())?;
        self.last_commit = Some(summary);
        Ok(())
    }

    fn restore(&mut self, snap: Snapshot) {
        self.items = snap.items;
        log::info!("Zustand wiederhergestellt: {} Item(s)", self.items.len());
    }

    /// Tauscht eine Kurve gegen eine andere (jeweils optional).
    ///
    /// Außerhalb einer Transaktion läuft der Tausch als eigener atomarer
    /// Commit. Innerhalb wird eine gescheiterte Registrierung der neuen Kurve
    /// durch erneutes Hinzufügen der alten zurückgenommen.
    fn swap_curves(&mut self, old: Option<Curve>, new: Option<Curve>) -> Result<(), ContourError> {
        if old.is_none() && new.is_none() {
            return Ok(());
        }
        if self.coordinator.is_in_transaction() {
            return self.swap_in_transaction(old, new);
        }

        self.coordinator.begin()?;
        if let Err(err) = self.swap_in_transaction(old, new) {
            self.coordinator.abort();
            return Err(err);
        }
        self.last_commit = Some(self.coordinator.commit()?);
        Ok(())
    }

    fn swap_in_transaction(&mut self, old: Option<Curve>, new: Option<Curve>) -> Result<(), ContourError> {
        if let Some(old) = &old {
            self.coordinator.remove_curve(old.id)?;
        }
        let Some(new) = new else {
            return Ok(());
        };
        if let Err(err) = self.coordinator.add_curve(new) {
            if let Some(old) = old {
                self.coordinator.add_curve(old)?;
            }
            return Err(err);
        }
        Ok(())
    }
}
