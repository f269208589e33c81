//! JSON Import/Export für Szenen und Command-Skripte.
//!
//! Szenendatei: `{ "items": [ { "name", "visible", "kind" } ] }`.
//! Skriptdatei: Liste von `EditCommand`s.

use crate::app::EditCommand;
use crate::core::{ItemStore, SceneItem};
use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Inhalt einer Szenendatei.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SceneFile {
    /// Items in Dateireihenfolge (IDs werden beim Laden neu vergeben)
    #[serde(default)]
    pub items: Vec<SceneItem>,
}

impl SceneFile {
    /// Übernimmt alle Items eines Stores.
    pub fn from_store(store: &ItemStore) -> Self {
        Self {
            items: store.iter().cloned().collect(),
        }
    }

    /// Command, der alle Items in einer Transaktion hinzufügt.
    pub fn into_load_command(self) -> EditCommand {
        EditCommand::Batch {
            commands: self
                .items
                .into_iter()
                .map(|item| EditCommand::AddItem { item })
                .collect(),
        }
    }
}

/// Parst eine Szene aus JSON.
pub fn parse_scene(json: &str) -> anyhow::Result<SceneFile> {
    let scene: SceneFile = serde_json::from_str(json).context("Szenendatei ist kein gültiges JSON")?;
    for item in &scene.items {
        if let Some(curve) = item.kind.as_curve() {
            curve
                .validate()
                .with_context(|| format!("Item '{}' enthält eine ungültige Kurve", item.name))?;
        }
    }
    Ok(scene)
}

/// Schreibt einen Item-Bestand als JSON.
pub fn write_scene(store: &ItemStore) -> anyhow::Result<String> {
    Ok(serde_json::to_string_pretty(&SceneFile::from_store(store))?)
}

/// Parst ein Command-Skript aus JSON.
pub fn parse_script(json: &str) -> anyhow::Result<Vec<EditCommand>> {
    serde_json::from_str(json).context("Skriptdatei ist kein gültiges JSON")
}

/// Lädt eine Szenendatei.
pub fn load_scene(path: &Path) -> anyhow::Result<SceneFile> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Szene nicht lesbar: {}", path.display()))?;
    let scene = parse_scene(&content)?;
    log::info!("Szene geladen: {} Item(s) aus {}", scene.items.len(), path.display());
    Ok(scene)
}

/// Lädt eine Skriptdatei.
pub fn load_script(path: &Path) -> anyhow::Result<Vec<EditCommand>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Skript nicht lesbar: {}", path.display()))?;
    let commands = parse_script(&content)?;
    log::info!("Skript geladen: {} Command(s) aus {}", commands.len(), path.display());
    Ok(commands)
}

/// Speichert einen Item-Bestand als Szenendatei.
pub fn save_scene(path: &Path, store: &ItemStore) -> anyhow::Result<()> {
    let content = write_scene(store)?;
    std::fs::write(path, content)
        .with_context(|| format!("Szene nicht schreibbar: {}", path.display()))?;
    log::info!("Szene gespeichert nach: {}", path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::ItemKind;

    #[test]
    fn parses_curves_and_solids() {
        let json = r#"{
            "items": [
                { "name": "unten", "kind": { "curve": { "points": [[0, 0], [4, 0]] } } },
                { "name": "block", "visible": false,
                  "kind": { "solid": { "bounds_min": [0, 0, 0], "bounds_max": [1, 1, 1] } } }
            ]
        }"#;
        let scene = parse_scene(json).expect("Szene erwartet");
        assert_eq!(scene.items.len(), 2);
        assert!(scene.items[0].visible);
        assert!(matches!(scene.items[1].kind, ItemKind::Solid(_)));
        assert!(!scene.items[1].visible);
    }

    #[test]
    fn single_point_curve_is_rejected() {
        let json = r#"{ "items": [ { "name": "punkt", "kind": { "curve": { "points": [[1, 1]] } } } ] }"#;
        let err = parse_scene(json).unwrap_err();
        assert!(format!("{err:#}").contains("punkt"));
    }

    #[test]
    fn load_command_is_single_batch() {
        let json = r#"{ "items": [
            { "kind": { "curve": { "points": [[0, 0], [1, 0]] } } },
            { "kind": { "curve": { "points": [[1, 0], [1, 1]] } } }
        ] }"#;
        let EditCommand::Batch { commands } = parse_scene(json).expect("Szene erwartet").into_load_command() else {
            panic!("Batch erwartet");
        };
        assert_eq!(commands.len(), 2);
    }
}
