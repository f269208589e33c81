//! Skriptbare Edit-Commands.

use crate::core::{ItemId, PlaneId, SceneItem};
use serde::{Deserialize, Serialize};

/// Mutierende Commands auf einem `Document`.
///
/// In Skript-Dateien als JSON-Objekte mit Feld `"op"` kodiert, z.B.
/// `{ "op": "hide", "item": 3 }`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum EditCommand {
    /// Item hinzufügen
    AddItem { item: SceneItem },
    /// Item entfernen
    RemoveItem { item: ItemId },
    /// Item-Inhalt ersetzen (ID bleibt)
    ReplaceItem { item: ItemId, with: SceneItem },
    /// Item ausblenden
    Hide { item: ItemId },
    /// Item einblenden
    Unhide { item: ItemId },
    /// Sichtbarkeit explizit setzen
    SetVisible { item: ItemId, visible: bool },
    /// Berechnete Region als eigenes Item fixieren
    PinRegion { plane: PlaneId, key: u64 },
    /// Mehrere Commands in einer Transaktion
    Batch { commands: Vec<EditCommand> },
    /// Letzten Schritt rückgängig machen
    Undo,
    /// Rückgängig gemachten Schritt wiederholen
    Redo,
    /// Index und Regionen vollständig neu aufbauen
    Rebuild,
}

impl EditCommand {
    /// Löst verschachtelte Batches in eine flache Liste auf.
    pub fn flatten(commands: Vec<EditCommand>) -> Vec<EditCommand> {
        let mut flat = Vec::with_capacity(commands.len());
        for command in commands {
            match command {
                EditCommand::Batch { commands } => flat.extend(Self::flatten(commands)),
                other => flat.push(other),
            }
        }
        flat
    }

    /// Kurzname für Log- und Fehlermeldungen.
    pub fn name(&self) -> &'static str {
        match self {
            EditCommand::AddItem { .. } => "AddItem",
            EditCommand::RemoveItem { .. } => "RemoveItem",
            EditCommand::ReplaceItem { .. } => "ReplaceItem",
            EditCommand::Hide { .. } => "Hide",
            EditCommand::Unhide { .. } => "Unhide",
            EditCommand::SetVisible { .. } => "SetVisible",
            EditCommand::PinRegion { .. } => "PinRegion",
            EditCommand::Batch { .. } => "Batch",
            EditCommand::Undo => "Undo",
            EditCommand::Redo => "Redo",
            EditCommand::Rebuild => "Rebuild",
        }
    }
}
