//! Integrationstests für den Transaktions-Koordinator:
//! - Joint-Symmetrie nach beliebigen Commits
//! - Atomarität abgebrochener Transaktionen
//! - Vollständigkeit der Kaskade
//! - Genau ein Regions-Aufbau pro Ebene und Transaktion
//! - Idempotenter Neuaufbau
//! - Schutz gegen verschachtelte Transaktionen

use contour_editor::core::validate_index;
use contour_editor::{
    ContourError, ContourOptions, Curve, CurveId, FragmentPath, PlanarRegionBuilder, Plane,
    PlaneCurveIndex, PlaneId, PlaneIndex, RegionRebuilder, TransactionCoordinator,
};
use glam::Vec2;
use std::collections::BTreeMap;

/// Zählt Aufrufe pro Ebene und merkt sich die zuletzt übergebenen Fragmente.
#[derive(Default)]
struct CountingRebuilder {
    calls: Vec<PlaneId>,
    last: BTreeMap<PlaneId, Vec<FragmentPath>>,
}

impl CountingRebuilder {
    fn calls_for(&self, plane: PlaneId) -> usize {
        self.calls.iter().filter(|p| **p == plane).count()
    }
}

impl RegionRebuilder for CountingRebuilder {
    fn rebuild_for_plane(&mut self, plane: PlaneId, fragments: &[FragmentPath]) {
        self.calls.push(plane);
        self.last.insert(plane, fragments.to_vec());
    }
}

type Counting = TransactionCoordinator<PlaneIndex, CountingRebuilder>;

fn counting() -> Counting {
    TransactionCoordinator::new(
        PlaneIndex::new(&ContourOptions::default()),
        CountingRebuilder::default(),
    )
}

fn line(raw: u64, a: (f32, f32), b: (f32, f32)) -> Curve {
    Curve::with_id(
        CurveId::from_raw(raw),
        Plane::xy(),
        vec![Vec2::new(a.0, a.1), Vec2::new(b.0, b.1)],
    )
}

/// Geschlossenes Quadrat aus vier Kanten mit IDs `base..base+4`.
fn square(base: u64, size: f32) -> Vec<Curve> {
    let c = [(0.0, 0.0), (size, 0.0), (size, size), (0.0, size)];
    (0..4)
        .map(|i| line(base + i as u64, c[i], c[(i + 1) % 4]))
        .collect()
}

fn add_all(coord: &mut Counting, curves: Vec<Curve>) {
    pollster::block_on(coord.transaction(async move |c| {
        for curve in curves {
            c.add_curve(curve)?;
        }
        Ok(())
    }))
    .expect("Transaktion erwartet");
}

fn xy_plane(coord: &Counting) -> PlaneId {
    coord
        .index()
        .plane_registry()
        .find(&Plane::xy())
        .expect("XY-Ebene registriert")
}

// ─── Szenario: drei Kurven, eine entfernt ────────────────────────────────────

#[test]
fn removing_jointed_curve_marks_partner_dirty_and_rebuilds_once() {
    let mut coord = counting();
    add_all(
        &mut coord,
        vec![
            line(1001, (0.0, 0.0), (2.0, 0.0)),
            line(1002, (2.0, 0.0), (2.0, 2.0)),
            line(1003, (10.0, 10.0), (12.0, 10.0)),
        ],
    );
    let plane = xy_plane(&coord);
    let before = coord.rebuilder().calls.len();

    coord.begin().expect("begin erwartet");
    coord.remove_curve(CurveId::from_raw(1002)).expect("remove erwartet");
    {
        let pending = coord.pending().expect("offene Transaktion");
        assert!(pending.is_deleted(CurveId::from_raw(1002)));
        assert!(pending.is_dirty(CurveId::from_raw(1001)));
        assert!(!pending.is_dirty(CurveId::from_raw(1003)));
    }
    let summary = coord.commit().expect("commit erwartet");

    assert_eq!(summary.deleted, vec![CurveId::from_raw(1002)]);
    assert_eq!(summary.dirty, vec![CurveId::from_raw(1001)]);
    assert!(summary.regenerated.contains(&CurveId::from_raw(1001)));
    assert!(!summary.regenerated.contains(&CurveId::from_raw(1003)));
    assert_eq!(coord.rebuilder().calls[before..], [plane]);

    let record = coord.index().lookup(CurveId::from_raw(1001)).expect("Kurve 1 erwartet");
    assert!(record.joints.start.is_none() && record.joints.stop.is_none());
    assert!(!coord.is_in_transaction());
}

// ─── Joint-Symmetrie ─────────────────────────────────────────────────────────

#[test]
fn joints_stay_symmetric_across_commits() {
    let mut coord = counting();
    let mut curves = square(1100, 4.0);
    curves.push(line(1110, (4.0, 4.0), (8.0, 4.0)));
    curves.push(line(1111, (2.0, -1.0), (2.0, 5.0)));
    add_all(&mut coord, curves);
    let result = validate_index(coord.index());
    assert!(result.valid, "{:?}", result.errors);

    pollster::block_on(coord.transaction(async |c| {
        c.remove_curve(CurveId::from_raw(1101))?;
        c.add_curve(line(1112, (4.0, 0.0), (6.0, -2.0)))?;
        Ok(())
    }))
    .expect("Transaktion erwartet");

    let result = validate_index(coord.index());
    assert!(result.valid, "{:?}", result.errors);
    for record in coord.index().records() {
        for joint in record.joints.iter() {
            let partner = coord.index().lookup(joint.other.curve).expect("Partner registriert");
            assert!(partner.joints.references(record.id()));
        }
    }
}

// ─── Atomarität ──────────────────────────────────────────────────────────────

#[test]
fn failing_body_leaves_index_and_regions_untouched() {
    let mut coord = counting();
    add_all(&mut coord, square(1200, 2.0));
    let curves_before = coord.index().curves();
    let records_before: Vec<_> = coord.index().records().cloned().collect();
    let calls_before = coord.rebuilder().calls.len();

    let result: anyhow::Result<()> = pollster::block_on(coord.transaction(async |c| {
        c.remove_curve(CurveId::from_raw(1200))?;
        c.add_curve(line(1210, (0.0, 0.0), (1.0, 1.0)))?;
        anyhow::bail!("Abbruch durch Aufrufer")
    }));

    assert!(result.is_err());
    assert!(!coord.is_in_transaction());
    assert_eq!(coord.index().curves(), curves_before);
    assert_eq!(coord.index().records().cloned().collect::<Vec<_>>(), records_before);
    assert_eq!(coord.rebuilder().calls.len(), calls_before);
}

#[test]
fn failing_operation_inside_body_aborts_whole_transaction() {
    let mut coord = counting();
    add_all(&mut coord, square(1300, 2.0));

    let result: anyhow::Result<()> = pollster::block_on(coord.transaction(async |c| {
        c.remove_curve(CurveId::from_raw(1301))?;
        c.remove_curve(CurveId::from_raw(1399))?;
        Ok(())
    }));

    let err = result.expect_err("Fehler erwartet");
    assert_eq!(
        err.downcast_ref::<ContourError>(),
        Some(&ContourError::NotFound(CurveId::from_raw(1399)))
    );
    assert!(coord.index().contains(CurveId::from_raw(1301)));
    assert_eq!(coord.index().len(), 4);
}

// ─── Kaskade ─────────────────────────────────────────────────────────────────

#[test]
fn cascade_marks_exactly_the_surviving_partners() {
    let mut coord = counting();
    add_all(&mut coord, square(1400, 3.0));

    coord.begin().expect("begin erwartet");
    coord.remove_curve(CurveId::from_raw(1400)).expect("remove erwartet");
    coord.remove_curve(CurveId::from_raw(1401)).expect("remove erwartet");
    let summary = coord.commit().expect("commit erwartet");

    let mut dirty = summary.dirty.clone();
    dirty.sort();
    assert_eq!(dirty, vec![CurveId::from_raw(1402), CurveId::from_raw(1403)]);
    let mut deleted = summary.deleted.clone();
    deleted.sort();
    assert_eq!(deleted, vec![CurveId::from_raw(1400), CurveId::from_raw(1401)]);
    assert!(summary.dirty.iter().all(|id| !summary.deleted.contains(id)));
}

#[test]
fn cascade_is_one_hop_per_removal() {
    let mut coord = counting();
    // Kette A - B - C - D
    add_all(
        &mut coord,
        vec![
            line(1500, (0.0, 0.0), (1.0, 0.0)),
            line(1501, (1.0, 0.0), (2.0, 0.0)),
            line(1502, (2.0, 0.0), (3.0, 0.0)),
            line(1503, (3.0, 0.0), (4.0, 0.0)),
        ],
    );

    coord.begin().expect("begin erwartet");
    coord.remove_curve(CurveId::from_raw(1500)).expect("remove erwartet");
    let pending = coord.pending().expect("offene Transaktion");
    assert!(pending.is_dirty(CurveId::from_raw(1501)));
    assert!(!pending.is_dirty(CurveId::from_raw(1502)));
    assert!(!pending.is_dirty(CurveId::from_raw(1503)));
    coord.abort();
}

#[test]
fn deleting_a_whole_chain_leaves_nothing_dirty() {
    let mut coord = counting();
    add_all(
        &mut coord,
        vec![
            line(3001, (0.0, 0.0), (1.0, 0.0)),
            line(3002, (1.0, 0.0), (2.0, 0.0)),
            line(3003, (2.0, 0.0), (3.0, 0.0)),
        ],
    );
    let plane = xy_plane(&coord);
    let before = coord.rebuilder().calls_for(plane);

    coord.begin().expect("begin erwartet");
    for raw in [3001, 3002, 3003] {
        coord.remove_curve(CurveId::from_raw(raw)).expect("remove erwartet");
    }
    let summary = coord.commit().expect("Commit erwartet");

    let mut deleted = summary.deleted.clone();
    deleted.sort();
    assert_eq!(
        deleted,
        vec![CurveId::from_raw(3001), CurveId::from_raw(3002), CurveId::from_raw(3003)]
    );
    assert!(summary.dirty.is_empty());
    assert!(coord.index().is_empty());
    assert_eq!(coord.rebuilder().calls_for(plane), before + 1);
}

// ─── Ein Regions-Aufbau pro Ebene ────────────────────────────────────────────

#[test]
fn each_touched_plane_is_rebuilt_exactly_once() {
    let mut coord = counting();
    let upper = Plane::xy_at(5.0);
    let mut curves = square(1600, 2.0);
    curves.extend(square(1610, 2.0).into_iter().map(|c| Curve::with_id(c.id, upper, c.points)));
    add_all(&mut coord, curves.clone());
    assert_eq!(coord.index().planes().len(), 2);

    let before = coord.rebuilder().calls.len();
    pollster::block_on(coord.transaction(async |c| {
        for curve in &curves {
            c.remove_curve(curve.id)?;
        }
        for curve in &curves {
            c.add_curve(curve.with_fresh_id())?;
        }
        Ok(())
    }))
    .expect("Transaktion erwartet");

    let calls = &coord.rebuilder().calls[before..];
    assert_eq!(calls.len(), 2);
    assert_ne!(calls[0], calls[1]);
}

#[test]
fn idle_operations_rebuild_only_their_plane() {
    let mut coord = counting();
    add_all(&mut coord, square(1700, 2.0));
    let plane = xy_plane(&coord);
    let before = coord.rebuilder().calls_for(plane);

    coord
        .add_curve(line(1710, (5.0, 5.0), (6.0, 6.0)))
        .expect("add erwartet");
    coord.remove_curve(CurveId::from_raw(1710)).expect("remove erwartet");

    assert_eq!(coord.rebuilder().calls_for(plane), before + 2);
    assert_eq!(coord.rebuilder().calls.len(), before + 2);
}

#[test]
fn empty_transaction_rebuilds_nothing() {
    let mut coord = counting();
    pollster::block_on(coord.transaction(async |_| Ok(()))).expect("Transaktion erwartet");
    assert!(coord.rebuilder().calls.is_empty());
}

#[test]
fn five_adds_on_one_plane_rebuild_it_once() {
    let mut coord = counting();
    add_all(
        &mut coord,
        (0..5)
            .map(|i| {
                let x = i as f32;
                line(3100 + i as u64, (x, 0.0), (x + 1.0, 0.0))
            })
            .collect(),
    );

    let plane = xy_plane(&coord);
    assert_eq!(coord.index().len(), 5);
    assert_eq!(coord.rebuilder().calls_for(plane), 1);
    assert_eq!(coord.rebuilder().calls.len(), 1);
}

// ─── Idempotenter Neuaufbau ──────────────────────────────────────────────────

#[test]
fn rebuild_is_idempotent() {
    let options = ContourOptions::default();
    let mut coord = TransactionCoordinator::new(
        PlaneIndex::new(&options),
        PlanarRegionBuilder::new(options.endpoint_tolerance, options.min_region_area),
    );
    pollster::block_on(coord.transaction(async |c| {
        for curve in square(1800, 4.0) {
            c.add_curve(curve)?;
        }
        c.add_curve(line(1810, (2.0, -1.0), (2.0, 5.0)))?;
        Ok(())
    }))
    .expect("Transaktion erwartet");

    let plane = coord
        .index()
        .plane_registry()
        .find(&Plane::xy())
        .expect("XY-Ebene registriert");
    let regions = coord.rebuilder().regions(plane).to_vec();
    assert_eq!(regions.len(), 2);

    coord.rebuild().expect("Neuaufbau erwartet");
    assert_eq!(coord.rebuilder().regions(plane), regions.as_slice());
    coord.rebuild().expect("Neuaufbau erwartet");
    assert_eq!(coord.rebuilder().regions(plane), regions.as_slice());
}

#[test]
fn incremental_adds_match_single_transaction() {
    let curves = {
        let mut c = square(1900, 4.0);
        c.push(line(1910, (0.0, 2.0), (4.0, 2.0)));
        c
    };

    let mut batched = counting();
    add_all(&mut batched, curves.clone());

    let mut incremental = counting();
    for curve in curves.iter().rev() {
        incremental.add_curve(curve.clone()).expect("add erwartet");
    }

    for curve in &curves {
        let a = batched.index().lookup(curve.id).expect("Record erwartet");
        let b = incremental.index().lookup(curve.id).expect("Record erwartet");
        assert_eq!(a.joints, b.joints, "Joints von {}", curve.id);
        assert_eq!(a.fragments, b.fragments, "Fragmente von {}", curve.id);
    }
}

#[test]
fn rebuild_from_clears_vanished_planes() {
    let mut coord = counting();
    let upper = Plane::xy_at(3.0);
    add_all(
        &mut coord,
        vec![
            line(2000, (0.0, 0.0), (1.0, 0.0)),
            Curve::with_id(CurveId::from_raw(2001), upper, vec![Vec2::ZERO, Vec2::Y]),
        ],
    );
    let upper_id = coord.index().plane_registry().find(&upper).expect("Ebene erwartet");

    let summary = coord
        .rebuild_from(vec![line(2000, (0.0, 0.0), (1.0, 0.0))])
        .expect("Neuaufbau erwartet");

    assert!(summary.planes.contains(&upper_id));
    assert_eq!(coord.rebuilder().last.get(&upper_id).map(Vec::len), Some(0));
    assert!(coord.index().curve_ids_on_plane(upper_id).is_empty());
}

#[test]
fn rebuild_from_rejects_duplicate_ids() {
    let mut coord = counting();
    add_all(&mut coord, square(2100, 1.0));

    let err = coord
        .rebuild_from(vec![line(2110, (0.0, 0.0), (1.0, 0.0)), line(2110, (0.0, 0.0), (0.0, 1.0))])
        .unwrap_err();
    assert_eq!(err, ContourError::AlreadyRegistered(CurveId::from_raw(2110)));
    assert_eq!(coord.index().len(), 4);
}

#[test]
fn rebuild_from_with_degenerate_curve_keeps_index_and_regions() {
    let mut coord = counting();
    add_all(&mut coord, square(3200, 1.0));
    let records_before: Vec<_> = coord.index().records().cloned().collect();
    let calls_before = coord.rebuilder().calls.len();

    let degenerate = Curve::with_id(CurveId::from_raw(3210), Plane::xy(), vec![Vec2::ZERO]);
    let err = coord
        .rebuild_from(vec![line(3211, (0.0, 0.0), (1.0, 0.0)), degenerate])
        .unwrap_err();

    assert_eq!(err, ContourError::DegenerateCurve(CurveId::from_raw(3210)));
    assert!(!coord.is_in_transaction());
    assert_eq!(coord.index().records().cloned().collect::<Vec<_>>(), records_before);
    assert_eq!(coord.rebuilder().calls.len(), calls_before);
}

// ─── Verschachtelung ─────────────────────────────────────────────────────────

#[test]
fn nested_transaction_fails_fast_and_outer_continues() {
    let mut coord = counting();

    pollster::block_on(coord.transaction(async |c| {
        c.add_curve(line(2200, (0.0, 0.0), (1.0, 0.0)))?;

        let inner = c.transaction(async |_| Ok(())).await;
        let err = inner.expect_err("verschachtelte Transaktion muss scheitern");
        assert!(matches!(
            err.downcast_ref::<ContourError>(),
            Some(ContourError::InvalidState(_))
        ));

        let pending = c.pending().expect("äußere Transaktion bleibt offen");
        assert!(pending.is_added(CurveId::from_raw(2200)));
        c.add_curve(line(2201, (1.0, 0.0), (1.0, 1.0)))?;
        Ok(())
    }))
    .expect("äußere Transaktion erwartet");

    assert_eq!(coord.index().len(), 2);
    assert_eq!(coord.rebuilder().calls.len(), 1);
}

#[test]
fn commit_without_transaction_is_invalid_state() {
    let mut coord = counting();
    assert!(matches!(coord.commit(), Err(ContourError::InvalidState(_))));
}
