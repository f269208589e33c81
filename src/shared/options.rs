//! Zentrale Konfiguration für den Contour-Editor.
//!
//! `ContourOptions` enthält alle zur Laufzeit änderbaren Toleranzen.
//! Die `const`-Werte bleiben als Fallback/Default erhalten.

use serde::{Deserialize, Serialize};

// ── Geometrie ───────────────────────────────────────────────────────

/// Fangradius (Ebenen-Einheiten): Endpunkte näher als dieser Wert bilden einen Joint.
pub const ENDPOINT_TOLERANCE: f32 = 1e-3;
/// Maximaler Abstand zweier Ebenen-Ursprünge entlang der Normalen für dieselbe Ebene.
pub const PLANE_DISTANCE_TOLERANCE: f32 = 1e-4;
/// Maximaler Winkel (Radiant) zwischen zwei Normalen für dieselbe Ebene.
pub const PLANE_ANGLE_TOLERANCE: f32 = 1e-4;

// ── Regionen ────────────────────────────────────────────────────────

/// Regionen mit kleinerer Fläche werden verworfen.
pub const MIN_REGION_AREA: f32 = 1e-6;

// ── Historie ────────────────────────────────────────────────────────

/// Maximale Anzahl Undo-Schritte.
pub const HISTORY_DEPTH: usize = 200;

/// Dateiname der Optionen-Datei neben der Binary.
const OPTIONS_FILE_NAME: &str = "contour_editor.toml";

// ── Laufzeit-Optionen (serialisierbar) ─────────────────────────────

/// Alle zur Laufzeit änderbaren Optionen.
/// Wird als `contour_editor.toml` neben der Binary gespeichert.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContourOptions {
    // ── Geometrie ───────────────────────────────────────────────
    /// Fangradius für Endpunkt-Joints (auch Raster der Regionen-Knoten)
    pub endpoint_tolerance: f32,
    /// Abstandstoleranz für Ebenen-Identität
    pub plane_distance_tolerance: f32,
    /// Winkeltoleranz (Radiant) für Ebenen-Identität
    pub plane_angle_tolerance: f32,

    // ── Regionen ────────────────────────────────────────────────
    /// Mindestfläche einer Region
    pub min_region_area: f32,

    // ── Historie ────────────────────────────────────────────────
    /// Maximale Undo-Tiefe
    pub history_depth: usize,
}

impl Default for ContourOptions {
    fn default() -> Self {
        Self {
            endpoint_tolerance: ENDPOINT_TOLERANCE,
            plane_distance_tolerance: PLANE_DISTANCE_TOLERANCE,
            plane_angle_tolerance: PLANE_ANGLE_TOLERANCE,
            min_region_area: MIN_REGION_AREA,
            history_depth: HISTORY_DEPTH,
        }
    }
}

impl ContourOptions {
    /// Lädt Optionen aus einer TOML-Datei. Bei Fehler: Standardwerte.
    pub fn load_from_file(path: &std::path::Path) -> Self {
        match std::fs::read_to_string(path) {
            Ok(content) => match toml::from_str(&content) {
                Ok(opts) => {
                    log::info!("Optionen geladen aus: {}", path.display());
                    opts
                }
                Err(e) => {
                    log::warn!("Optionen-Datei fehlerhaft, verwende Standardwerte: {}", e);
                    Self::default()
                }
            },
            Err(_) => {
                log::info!("Keine Optionen-Datei gefunden, verwende Standardwerte");
                Self::default()
            }
        }
    }

    /// Speichert Optionen als TOML-Datei.
    pub fn save_to_file(&self, path: &std::path::Path) -> anyhow::Result<()> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        log::info!("Optionen gespeichert nach: {}", path.display());
        Ok(())
    }

    /// Ermittelt den Pfad zur Optionen-Datei neben der Binary.
    pub fn config_path() -> std::path::PathBuf {
        std::env::current_exe()
            .unwrap_or_else(|_| std::path::PathBuf::from("contour-editor"))
            .parent()
            .unwrap_or_else(|| std::path::Path::new("."))
            .join(OPTIONS_FILE_NAME)
    }
}
