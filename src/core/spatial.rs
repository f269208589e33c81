//! Spatial-Index (KD-Tree) über Kurven-Endpunkte einer Ebene.

use std::collections::HashMap;

use glam::Vec2;
use kiddo::{KdTree, SquaredEuclidean};

use crate::core::{Curve, CurveEnd, CurveId};

/// Ein indexierter Endpunkt.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EndpointMatch {
    /// Kurve des Endpunkts
    pub curve: CurveId,
    /// Welcher Endpunkt
    pub end: CurveEnd,
    /// Euklidische Distanz zum Suchpunkt
    pub distance: f32,
}

/// Drehwinkel (cos, sin von 0.5 rad) der Baum-Koordinaten.
///
/// Ein Bucket im KD-Tree darf nicht mehr Punkte mit gleichem Wert auf einer
/// Achse enthalten als seine Kapazität; achsparallele Zeichnungen würden das
/// sonst sprengen. Distanzen bleiben unter der Drehung gleich.
const TREE_ROTATION: (f64, f64) = (0.877_582_561_890_372_8, 0.479_425_538_604_203);

fn tree_coords(p: Vec2) -> [f64; 2] {
    let (cos, sin) = TREE_ROTATION;
    let (x, y) = (p.x as f64, p.y as f64);
    [cos * x - sin * y, sin * x + cos * y]
}

/// Read-only Index über alle Endpunkte einer Kurvenmenge.
#[derive(Debug, Clone)]
pub struct EndpointIndex {
    tree: KdTree<f64, 2>,
    entries: Vec<(CurveId, CurveEnd, Vec2)>,
    /// Baum-Item → Indizes in `entries` (identische Positionen teilen ein Item)
    groups: Vec<Vec<usize>>,
}

impl EndpointIndex {
    /// Erstellt einen leeren Index.
    pub fn empty() -> Self {
        Self {
            tree: (&Vec::<[f64; 2]>::new()).into(),
            entries: Vec::new(),
            groups: Vec::new(),
        }
    }

    /// Baut den Index aus den übergebenen Kurven (Reihenfolge nach Kurven-ID).
    pub fn from_curves<'a>(curves: impl IntoIterator<Item = &'a Curve>) -> Self {
        let mut entries: Vec<(CurveId, CurveEnd, Vec2)> = curves
            .into_iter()
            .flat_map(|curve| {
                [CurveEnd::Start, CurveEnd::Stop]
                    .into_iter()
                    .map(move |end| (curve.id, end, curve.endpoint(end)))
            })
            .collect();
        entries.sort_by(|a, b| (a.0, a.1).cmp(&(b.0, b.1)));

        let mut coords: Vec<[f64; 2]> = Vec::new();
        let mut groups: Vec<Vec<usize>> = Vec::new();
        let mut by_position: HashMap<(u32, u32), usize> = HashMap::new();
        for (i, (_, _, p)) in entries.iter().enumerate() {
            let key = (p.x.to_bits(), p.y.to_bits());
            let slot = *by_position.entry(key).or_insert_with(|| {
                coords.push(tree_coords(*p));
                groups.push(Vec::new());
                groups.len() - 1
            });
            groups[slot].push(i);
        }
        let tree: KdTree<f64, 2> = (&coords).into();

        Self {
            tree,
            entries,
            groups,
        }
    }

    /// Anzahl indexierter Endpunkte.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Gibt `true` zurück, wenn keine Endpunkte im Index liegen.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Alle Endpunkte in Index-Reihenfolge.
    pub fn entries(&self) -> &[(CurveId, CurveEnd, Vec2)] {
        &self.entries
    }

    /// Findet alle Endpunkte innerhalb eines Radius, sortiert nach `(Kurve, Ende)`.
    pub fn within_radius(&self, query: Vec2, radius: f32) -> Vec<EndpointMatch> {
        if self.is_empty() || radius.is_sign_negative() {
            return Vec::new();
        }

        let mut results = self
            .tree
            .within::<SquaredEuclidean>(&tree_coords(query), (radius * radius) as f64)
            .into_iter()
            .filter_map(|hit| {
                let distance = (hit.distance as f32).sqrt();
                let group = self.groups.get(hit.item as usize)?;
                Some(group.iter().filter_map(move |&i| {
                    let (curve, end, _) = *self.entries.get(i)?;
                    Some(EndpointMatch {
                        curve,
                        end,
                        distance,
                    })
                }))
            })
            .flatten()
            .collect::<Vec<_>>();

        results.sort_by(|a, b| (a.curve, a.end).cmp(&(b.curve, b.end)));
        results
    }
}
