//! Konkreter Kurven-Index: Records pro Ebene, Joint-Paarung, Trimmen.

use super::curve::{Curve, CurveEnd};
use super::error::ContourError;
use super::ids::{CurveId, PlaneId};
use super::index::{CommitBatch, CommitReport, PlaneCurveIndex};
use super::intersect::{crossings, normalize_params, touches};
use super::plane::PlaneRegistry;
use super::record::{CurveRecord, Fragment, FragmentPath, Joint, Joints, PointOnCurve};
use super::spatial::EndpointIndex;
use crate::shared::ContourOptions;
use indexmap::{IndexMap, IndexSet};
use std::collections::{BTreeMap, BTreeSet, HashMap};

/// Minimale Parameterlänge eines Fragments.
const MIN_FRAGMENT_SPAN: f32 = 1e-5;

/// Kurven-Index mit ebenenweiser Gruppierung.
///
/// Records halten ihre Kurve im lokalen System der repräsentativen Ebene
/// ihrer `PlaneId`; `curves()` liefert die Kurven in dieser Form.
#[derive(Debug, Clone)]
pub struct PlaneIndex {
    /// Alle Records, indexiert nach Kurven-ID
    records: IndexMap<CurveId, CurveRecord>,
    /// Kurven pro Ebene (sortiert für deterministische Paarung)
    members: BTreeMap<PlaneId, BTreeSet<CurveId>>,
    /// Vergabe der Ebenen-Identitäten
    planes: PlaneRegistry,
    /// Fangradius für Endpunkt-Berührungen
    endpoint_tolerance: f32,
}

impl PlaneIndex {
    /// Erstellt einen leeren Index mit den Toleranzen aus den Optionen.
    pub fn new(options: &ContourOptions) -> Self {
        Self {
            records: IndexMap::new(),
            members: BTreeMap::new(),
            planes: PlaneRegistry::new(
                options.plane_distance_tolerance,
                options.plane_angle_tolerance,
            ),
            endpoint_tolerance: options.endpoint_tolerance,
        }
    }

    /// Anzahl registrierter Kurven.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Gibt `true` zurück, wenn keine Kurve registriert ist.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Iterator über alle Records (Einfügereihenfolge).
    pub fn records(&self) -> impl Iterator<Item = &CurveRecord> {
        self.records.values()
    }

    /// IDs aller Kurven einer Ebene (aufsteigend).
    pub fn curve_ids_on_plane(&self, plane: PlaneId) -> Vec<CurveId> {
        self.members
            .get(&plane)
            .map(|ids| ids.iter().copied().collect())
            .unwrap_or_default()
    }

    /// Ebenen, auf denen aktuell Kurven liegen.
    pub fn planes(&self) -> Vec<PlaneId> {
        self.members
            .iter()
            .filter(|(_, ids)| !ids.is_empty())
            .map(|(plane, _)| *plane)
            .collect()
    }

    /// Registry der Ebenen-Identitäten.
    pub fn plane_registry(&self) -> &PlaneRegistry {
        &self.planes
    }

    /// Fangradius für Endpunkt-Berührungen.
    pub fn endpoint_tolerance(&self) -> f32 {
        self.endpoint_tolerance
    }

    /// Prüft den gesamten Batch, bevor irgendetwas verändert wird.
    fn validate_batch(&self, batch: &CommitBatch) -> Result<(), ContourError> {
        let mut deleted: IndexSet<CurveId> = IndexSet::with_capacity(batch.deleted.len());
        for &id in &batch.deleted {
            if !self.records.contains_key(&id) {
                return Err(ContourError::NotFound(id));
            }
            deleted.insert(id);
        }
        for &id in &batch.dirty {
            if !deleted.contains(&id) && !self.records.contains_key(&id) {
                return Err(ContourError::NotFound(id));
            }
        }
        let mut seen: IndexSet<CurveId> = IndexSet::with_capacity(batch.added.len());
        for curve in &batch.added {
            curve.validate()?;
            let registered = self.records.contains_key(&curve.id) && !deleted.contains(&curve.id);
            if registered || !seen.insert(curve.id) {
                return Err(ContourError::AlreadyRegistered(curve.id));
            }
        }
        Ok(())
    }

    /// Paart Endpunkte einer Ebene neu und setzt die Joints.
    ///
    /// Endpunkte werden in `(Kurve, Ende)`-Reihenfolge besucht; jeder noch
    /// freie Endpunkt wird mit dem kleinsten freien, deckungsgleichen Endpunkt
    /// einer anderen Kurve gepaart. Liefert die Kurven mit geänderten Joints.
    fn recompute_joints(&mut self, plane: PlaneId) -> Vec<CurveId> {
        let ids = self.curve_ids_on_plane(plane);
        let endpoints =
            EndpointIndex::from_curves(ids.iter().filter_map(|id| self.records.get(id).map(|r| &r.curve)));

        let mut paired: HashMap<(CurveId, CurveEnd), (CurveId, CurveEnd)> = HashMap::new();
        for &(curve, end, position) in endpoints.entries() {
            if paired.contains_key(&(curve, end)) {
                continue;
            }
            let partner = endpoints
                .within_radius(position, self.endpoint_tolerance)
                .into_iter()
                .find(|m| m.curve != curve && !paired.contains_key(&(m.curve, m.end)));
            if let Some(m) = partner {
                paired.insert((curve, end), (m.curve, m.end));
                paired.insert((m.curve, m.end), (curve, end));
            }
        }

        let mut updates: Vec<(CurveId, Joints)> = Vec::with_capacity(ids.len());
        for &id in &ids {
            let Some(record) = self.records.get(&id) else {
                continue;
            };
            let mut joints = Joints::default();
            for end in [CurveEnd::Start, CurveEnd::Stop] {
                let Some(&(other_id, other_end)) = paired.get(&(id, end)) else {
                    continue;
                };
                if let Some(other) = self.records.get(&other_id) {
                    joints.set(
                        end,
                        Some(Joint {
                            own: PointOnCurve::at_end(&record.curve, end),
                            other: PointOnCurve::at_end(&other.curve, other_end),
                        }),
                    );
                }
            }
            updates.push((id, joints));
        }

        let mut changed = Vec::new();
        for (id, joints) in updates {
            if let Some(record) = self.records.get_mut(&id) {
                if record.joints != joints {
                    record.joints = joints;
                    changed.push(id);
                }
            }
        }
        changed
    }

    /// Berechnet die Fragmente einer Kurve aus Joints und Schnitten ihrer Ebene.
    pub(crate) fn compute_fragments(&self, id: CurveId) -> Vec<Fragment> {
        let Some(record) = self.records.get(&id) else {
            return Vec::new();
        };
        let curve = &record.curve;

        let mut params = vec![curve.t_min(), curve.t_max()];
        params.extend(record.joints.iter().map(|j| j.own.t));
        for other_id in self.curve_ids_on_plane(record.plane) {
            if other_id == id {
                continue;
            }
            if let Some(other) = self.records.get(&other_id) {
                params.extend(
                    crossings(curve, &other.curve, self.endpoint_tolerance)
                        .into_iter()
                        .map(|c| c.t_a),
                );
            }
        }

        normalize_params(params)
            .windows(2)
            .filter(|w| w[1] - w[0] > MIN_FRAGMENT_SPAN)
            .map(|w| Fragment {
                start: w[0],
                stop: w[1],
                ancestor: id,
            })
            .collect()
    }

    /// Verwirft die Fragmente einer Kurve und erzeugt sie neu.
    fn regenerate_fragments(&mut self, id: CurveId) {
        let fragments = self.compute_fragments(id);
        if let Some(record) = self.records.get_mut(&id) {
            record.fragments = fragments;
            record.revision += 1;
        }
    }
}

impl PlaneCurveIndex for PlaneIndex {
    fn lookup(&self, id: CurveId) -> Result<&CurveRecord, ContourError> {
        self.records.get(&id).ok_or(ContourError::NotFound(id))
    }

    fn remove(&mut self, id: CurveId) -> Result<CurveRecord, ContourError> {
        let record = self.lookup(id)?.clone();
        self.commit(&CommitBatch {
            deleted: vec![id],
            ..CommitBatch::default()
        })?;
        Ok(record)
    }

    fn commit(&mut self, batch: &CommitBatch) -> Result<CommitReport, ContourError> {
        self.validate_batch(batch)?;

        let mut report = CommitReport::default();
        let mut touched: BTreeSet<PlaneId> = BTreeSet::new();
        // Geometrie, deren Schnitte andere Kurven der Ebene neu trimmen
        let mut changed_geometry: Vec<(PlaneId, Curve)> = Vec::new();

        for &id in &batch.deleted {
            if let Some(record) = self.records.shift_remove(&id) {
                if let Some(ids) = self.members.get_mut(&record.plane) {
                    ids.remove(&id);
                }
                touched.insert(record.plane);
                changed_geometry.push((record.plane, record.curve));
                report.removed.push(id);
            }
        }

        for curve in &batch.added {
            // Geometrie im gemeinsamen System der Ebene ablegen
            let (plane, curve) = self.planes.intern_curve(curve);
            let id = curve.id;
            self.records.insert(id, CurveRecord::new(curve.clone(), plane));
            self.members.entry(plane).or_default().insert(id);
            touched.insert(plane);
            changed_geometry.push((plane, curve));
            report.added.push(id);
        }

        let mut regenerate: BTreeSet<CurveId> = report.added.iter().copied().collect();
        for &id in &batch.dirty {
            if let Some(record) = self.records.get(&id) {
                touched.insert(record.plane);
                regenerate.insert(id);
            }
        }

        for &plane in &touched {
            regenerate.extend(self.recompute_joints(plane));

            for id in self.curve_ids_on_plane(plane) {
                if regenerate.contains(&id) {
                    continue;
                }
                let Some(record) = self.records.get(&id) else {
                    continue;
                };
                let crossed = changed_geometry.iter().any(|(p, geometry)| {
                    *p == plane && geometry.id != id && touches(&record.curve, geometry, self.endpoint_tolerance)
                });
                if crossed {
                    regenerate.insert(id);
                }
            }
        }

        for &id in &regenerate {
            self.regenerate_fragments(id);
        }

        self.members.retain(|_, ids| !ids.is_empty());

        report.regenerated = regenerate.into_iter().collect();
        report.planes = touched.into_iter().collect();
        log::debug!(
            "Index-Commit: +{} -{} Fragmente neu: {} Ebenen: {}",
            report.added.len(),
            report.removed.len(),
            report.regenerated.len(),
            report.planes.len()
        );
        Ok(report)
    }

    fn fragments_on_plane(&self, plane: PlaneId) -> Vec<FragmentPath> {
        self.curve_ids_on_plane(plane)
            .into_iter()
            .filter_map(|id| self.records.get(&id))
            .flat_map(|record| record.fragment_paths())
            .collect()
    }

    fn curves(&self) -> Vec<Curve> {
        let mut curves: Vec<Curve> = self.records.values().map(|r| r.curve.clone()).collect();
        curves.sort_by_key(|c| c.id);
        curves
    }

    fn clear(&mut self) -> Vec<PlaneId> {
        let planes = self.planes();
        self.records.clear();
        self.members.clear();
        planes
    }
}
