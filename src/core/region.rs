//! Geschlossene Regionen aus getrimmten Kurven einer Ebene.
//!
//! Die Fragmente einer Ebene bilden einen planaren Graphen. Pro Knoten werden
//! die ausgehenden Halbkanten nach Winkel sortiert; ein Flächenumlauf folgt
//! jeweils dem im Uhrzeigersinn nächsten Nachbarn der Gegenkante. Beschränkte
//! Flächen werden so gegen den Uhrzeigersinn umlaufen (positive Fläche), die
//! Außenfläche im Uhrzeigersinn.

use super::ids::PlaneId;
use super::record::FragmentPath;
use glam::Vec2;
use std::collections::{BTreeMap, BTreeSet, HashMap};

/// Schutz gegen Endlos-Umläufe bei inkonsistenter Topologie.
const MAX_FACE_STEPS: usize = 100_000;

/// Baut die Regionen einer Ebene neu auf.
///
/// Idempotent: zweimaliger Aufruf ohne Kurvenänderung liefert dieselbe
/// Regionsmenge. Eine Ebene ohne Fragmente leert ihre Regionen.
pub trait RegionRebuilder {
    /// Ersetzt die Regionen von `plane` durch die aus `fragments` abgeleiteten.
    fn rebuild_for_plane(&mut self, plane: PlaneId, fragments: &[FragmentPath]);
}

/// Eine geschlossene, von Fragmenten berandete Fläche.
#[derive(Debug, Clone, PartialEq)]
pub struct Region {
    /// Ebene der Region
    pub plane: PlaneId,
    /// Stabiler Schlüssel aus dem kanonischen Randumlauf
    pub key: u64,
    /// Randpolygon gegen den Uhrzeigersinn
    pub boundary: Vec<Vec2>,
    /// Flächeninhalt
    pub area: f32,
}

impl Region {
    /// Schwerpunkt des Randpolygons.
    pub fn centroid(&self) -> Vec2 {
        let n = self.boundary.len();
        let mut c = Vec2::ZERO;
        let mut a = 0.0;
        for i in 0..n {
            let p = self.boundary[i];
            let q = self.boundary[(i + 1) % n];
            let cross = p.x * q.y - q.x * p.y;
            a += cross;
            c += (p + q) * cross;
        }
        if a.abs() <= f32::EPSILON {
            return self.boundary.first().copied().unwrap_or(Vec2::ZERO);
        }
        c / (3.0 * a)
    }
}

/// Konkreter Regions-Aufbau über Halbkanten-Umläufe.
#[derive(Debug, Clone)]
pub struct PlanarRegionBuilder {
    regions: BTreeMap<PlaneId, Vec<Region>>,
    rebuild_counts: BTreeMap<PlaneId, usize>,
    /// Rasterweite zum Verschmelzen von Fragment-Endpunkten
    quantum: f32,
    /// Kleinere Flächen werden verworfen
    min_area: f32,
}

impl PlanarRegionBuilder {
    /// Erstellt einen leeren Builder.
    pub fn new(quantum: f32, min_area: f32) -> Self {
        Self {
            regions: BTreeMap::new(),
            rebuild_counts: BTreeMap::new(),
            quantum: quantum.max(1e-6),
            min_area,
        }
    }

    /// Regionen einer Ebene (nach Schlüssel sortiert).
    pub fn regions(&self, plane: PlaneId) -> &[Region] {
        self.regions.get(&plane).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Alle Regionen aller Ebenen.
    pub fn all_regions(&self) -> impl Iterator<Item = &Region> {
        self.regions.values().flatten()
    }

    /// Gesamtzahl der Regionen.
    pub fn region_count(&self) -> usize {
        self.regions.values().map(Vec::len).sum()
    }

    /// Wie oft die Ebene neu aufgebaut wurde.
    pub fn rebuild_count(&self, plane: PlaneId) -> usize {
        self.rebuild_counts.get(&plane).copied().unwrap_or(0)
    }

    fn quantize(&self, p: Vec2) -> (i64, i64) {
        (
            (p.x / self.quantum).round() as i64,
            (p.y / self.quantum).round() as i64,
        )
    }

    /// Berechnet die Regionen aus den Fragmenten einer Ebene.
    pub fn compute_regions(&self, plane: PlaneId, fragments: &[FragmentPath]) -> Vec<Region> {
        // Knoten: quantisierte Positionen
        let mut vertex_of: HashMap<(i64, i64), usize> = HashMap::new();
        let mut keys: Vec<(i64, i64)> = Vec::new();
        let mut positions: Vec<Vec2> = Vec::new();
        let mut edges: BTreeSet<(usize, usize)> = BTreeSet::new();

        for path in fragments {
            let mut prev: Option<usize> = None;
            for &p in &path.points {
                let key = self.quantize(p);
                let v = *vertex_of.entry(key).or_insert_with(|| {
                    keys.push(key);
                    positions.push(p);
                    positions.len() - 1
                });
                if let Some(u) = prev {
                    if u != v {
                        edges.insert((u.min(v), u.max(v)));
                    }
                }
                prev = Some(v);
            }
        }

        // Halbkanten: 2k = u→v, 2k+1 = v→u
        let mut half_from: Vec<usize> = Vec::with_capacity(edges.len() * 2);
        let mut half_to: Vec<usize> = Vec::with_capacity(edges.len() * 2);
        for &(u, v) in &edges {
            half_from.push(u);
            half_to.push(v);
            half_from.push(v);
            half_to.push(u);
        }

        let mut outgoing: Vec<Vec<usize>> = vec![Vec::new(); positions.len()];
        for (he, &u) in half_from.iter().enumerate() {
            outgoing[u].push(he);
        }
        let angle = |he: usize| {
            let d = positions[half_to[he]] - positions[half_from[he]];
            d.y.atan2(d.x)
        };
        for list in &mut outgoing {
            list.sort_by(|&a, &b| {
                angle(a)
                    .total_cmp(&angle(b))
                    .then(keys[half_to[a]].cmp(&keys[half_to[b]]))
            });
        }
        let mut slot = vec![0usize; half_from.len()];
        for list in &outgoing {
            for (i, &he) in list.iter().enumerate() {
                slot[he] = i;
            }
        }

        let mut used = vec![false; half_from.len()];
        let mut regions = Vec::new();
        for start in 0..half_from.len() {
            if used[start] {
                continue;
            }
            let mut cycle: Vec<usize> = Vec::new();
            let mut he = start;
            let mut steps = 0;
            loop {
                used[he] = true;
                cycle.push(half_from[he]);
                let v = half_to[he];
                let twin = he ^ 1;
                let list = &outgoing[v];
                he = list[(slot[twin] + list.len() - 1) % list.len()];
                steps += 1;
                if he == start || used[he] || steps > MAX_FACE_STEPS {
                    break;
                }
            }
            if he != start || cycle.len() < 3 {
                continue;
            }

            let boundary: Vec<Vec2> = cycle.iter().map(|&v| positions[v]).collect();
            let area = polygon_area(&boundary);
            if area <= self.min_area {
                continue;
            }
            let key = region_key(&cycle.iter().map(|&v| keys[v]).collect::<Vec<_>>());
            regions.push(Region {
                plane,
                key,
                boundary,
                area,
            });
        }

        regions.sort_by(|a, b| a.key.cmp(&b.key).then(a.area.total_cmp(&b.area)));
        regions
    }
}

impl RegionRebuilder for PlanarRegionBuilder {
    fn rebuild_for_plane(&mut self, plane: PlaneId, fragments: &[FragmentPath]) {
        let regions = self.compute_regions(plane, fragments);
        log::debug!("{}: {} Region(en) aus {} Fragment(en)", plane, regions.len(), fragments.len());
        if regions.is_empty() {
            self.regions.remove(&plane);
        } else {
            self.regions.insert(plane, regions);
        }
        *self.rebuild_counts.entry(plane).or_default() += 1;
    }
}

/// Vorzeichenbehaftete Fläche (Shoelace), positiv gegen den Uhrzeigersinn.
pub fn polygon_area(points: &[Vec2]) -> f32 {
    let n = points.len();
    let mut a = 0.0;
    for i in 0..n {
        let p = points[i];
        let q = points[(i + 1) % n];
        a += p.x * q.y - q.x * p.y;
    }
    0.5 * a
}

/// FNV-1a über die kleinste Rotation des Knotenumlaufs.
fn region_key(cycle: &[(i64, i64)]) -> u64 {
    let n = cycle.len();
    let best = (0..n)
        .map(|s| (0..n).map(|k| cycle[(s + k) % n]).collect::<Vec<_>>())
        .min()
        .unwrap_or_default();
    let mut hash: u64 = 0xcbf2_9ce4_8422_2325;
    for (x, y) in best {
        for byte in x.to_le_bytes().into_iter().chain(y.to_le_bytes()) {
            hash ^= byte as u64;
            hash = hash.wrapping_mul(0x0000_0100_0000_01b3);
        }
    }
    hash
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::CurveId;
    use approx::assert_relative_eq;

    fn path(points: &[(f32, f32)]) -> FragmentPath {
        FragmentPath {
            ancestor: CurveId::from_raw(900),
            points: points.iter().map(|&(x, y)| Vec2::new(x, y)).collect(),
        }
    }

    fn square(size: f32) -> Vec<FragmentPath> {
        vec![
            path(&[(0.0, 0.0), (size, 0.0)]),
            path(&[(size, 0.0), (size, size)]),
            path(&[(size, size), (0.0, size)]),
            path(&[(0.0, size), (0.0, 0.0)]),
        ]
    }

    #[test]
    fn square_yields_one_region() {
        let builder = PlanarRegionBuilder::new(1e-4, 1e-6);
        let regions = builder.compute_regions(PlaneId(0), &square(10.0));
        assert_eq!(regions.len(), 1);
        assert_relative_eq!(regions[0].area, 100.0);
        assert_relative_eq!(regions[0].centroid().x, 5.0);
    }

    #[test]
    fn split_square_yields_two_regions() {
        let mut fragments = vec![
            path(&[(0.0, 0.0), (5.0, 0.0)]),
            path(&[(5.0, 0.0), (10.0, 0.0)]),
            path(&[(10.0, 0.0), (10.0, 10.0)]),
            path(&[(10.0, 10.0), (5.0, 10.0)]),
            path(&[(5.0, 10.0), (0.0, 10.0)]),
            path(&[(0.0, 10.0), (0.0, 0.0)]),
        ];
        fragments.push(path(&[(5.0, 0.0), (5.0, 10.0)]));

        let builder = PlanarRegionBuilder::new(1e-4, 1e-6);
        let regions = builder.compute_regions(PlaneId(0), &fragments);
        assert_eq!(regions.len(), 2);
        for region in &regions {
            assert_relative_eq!(region.area, 50.0);
        }
    }

    #[test]
    fn open_chain_has_no_region() {
        let builder = PlanarRegionBuilder::new(1e-4, 1e-6);
        let regions =
            builder.compute_regions(PlaneId(0), &[path(&[(0.0, 0.0), (1.0, 0.0), (1.0, 1.0)])]);
        assert!(regions.is_empty());
    }

    #[test]
    fn dangling_edge_keeps_region_area() {
        let mut fragments = square(4.0);
        fragments.push(path(&[(4.0, 4.0), (6.0, 6.0)]));
        let builder = PlanarRegionBuilder::new(1e-4, 1e-6);
        let regions = builder.compute_regions(PlaneId(0), &fragments);
        assert_eq!(regions.len(), 1);
        assert_relative_eq!(regions[0].area, 16.0);
    }

    #[test]
    fn rebuild_is_idempotent_and_empty_plane_clears() {
        let mut builder = PlanarRegionBuilder::new(1e-4, 1e-6);
        let fragments = square(2.0);
        builder.rebuild_for_plane(PlaneId(3), &fragments);
        let first = builder.regions(PlaneId(3)).to_vec();
        builder.rebuild_for_plane(PlaneId(3), &fragments);
        assert_eq!(builder.regions(PlaneId(3)), first.as_slice());
        assert_eq!(builder.rebuild_count(PlaneId(3)), 2);

        builder.rebuild_for_plane(PlaneId(3), &[]);
        assert!(builder.regions(PlaneId(3)).is_empty());
        assert_eq!(builder.region_count(), 0);
    }

    #[test]
    fn region_key_ignores_start_vertex() {
        let a = region_key(&[(0, 0), (1, 0), (1, 1)]);
        let b = region_key(&[(1, 1), (0, 0), (1, 0)]);
        assert_eq!(a, b);
    }
}
