//! Konsistenzprüfung des Kurven-Index.
//!
//! Prüft die Invarianten, die nach jedem Commit gelten müssen:
//! - Joints sind symmetrisch (A verweist auf B ⇔ B verweist auf A, gespiegelt)
//! - Fragmente entsprechen der aktuellen Joint-/Schnittkonfiguration
//! - Jeder Record ist unter seiner eigenen Ebene indexiert

use super::curve::CurveEnd;
use super::index::PlaneCurveIndex;
use super::plane_index::PlaneIndex;

/// Ergebnis einer Index-Prüfung.
#[derive(Debug, Clone, Default)]
pub struct ValidationResult {
    /// `true`, wenn keine Verletzung gefunden wurde
    pub valid: bool,
    /// Beschreibung jeder gefundenen Verletzung
    pub errors: Vec<String>,
}

/// Prüft alle Invarianten des Index.
pub fn validate_index(index: &PlaneIndex) -> ValidationResult {
    let mut errors = Vec::new();

    for record in index.records() {
        let id = record.id();

        // 1. Ebenen-Zuordnung
        if !index.curve_ids_on_plane(record.plane).contains(&id) {
            errors.push(format!("{id} fehlt in der Mitgliederliste von {}", record.plane));
        }

        // 2. Joint-Symmetrie
        for end in [CurveEnd::Start, CurveEnd::Stop] {
            let Some(joint) = record.joints.at(end) else {
                continue;
            };
            if joint.own.curve != id || joint.own.end() != Some(end) {
                errors.push(format!("{id}: Joint am {end:?} zeigt nicht auf den eigenen Endpunkt"));
            }
            let Ok(partner) = index.lookup(joint.other.curve) else {
                errors.push(format!("{id}: Joint verweist auf unbekannte {}", joint.other.curve));
                continue;
            };
            let Some(partner_end) = joint.other.end() else {
                errors.push(format!("{id}: Partner-Parameter liegt nicht auf einem Endpunkt"));
                continue;
            };
            if partner.joints.at(partner_end) != Some(&joint.mirrored()) {
                errors.push(format!(
                    "{id}: einseitiger Joint zu {} ({partner_end:?})",
                    partner.id()
                ));
            }
        }

        // 3. Fragmente aktuell
        if record.fragments != index.compute_fragments(id) {
            errors.push(format!("{id}: Fragmente veraltet (Revision {})", record.revision));
        }
    }

    ValidationResult {
        valid: errors.is_empty(),
        errors,
    }
}
