use contour_editor::{
    ContourOptions, Curve, CurveId, PlanarRegionBuilder, Plane, PlaneIndex, TransactionCoordinator,
};
use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use glam::Vec2;
use std::hint::black_box;

type Coordinator = TransactionCoordinator<PlaneIndex, PlanarRegionBuilder>;

/// Raster aus `cells × cells` Quadraten; jede Kante ist eine eigene Kurve.
fn build_grid(cells: usize) -> Vec<Curve> {
    let mut curves = Vec::with_capacity(2 * cells * (cells + 1));
    for row in 0..=cells {
        for col in 0..cells {
            let (x, y) = (col as f32, row as f32);
            curves.push(Curve::line(Plane::xy(), Vec2::new(x, y), Vec2::new(x + 1.0, y)));
            curves.push(Curve::line(Plane::xy(), Vec2::new(y, x), Vec2::new(y, x + 1.0)));
        }
    }
    curves
}

fn new_coordinator() -> Coordinator {
    let options = ContourOptions::default();
    TransactionCoordinator::new(
        PlaneIndex::new(&options),
        PlanarRegionBuilder::new(options.endpoint_tolerance, options.min_region_area),
    )
}

fn load(coord: &mut Coordinator, curves: Vec<Curve>) {
    pollster::block_on(coord.transaction(async move |c| {
        for curve in curves {
            c.add_curve(curve)?;
        }
        Ok(())
    }))
    .expect("Laden fehlgeschlagen");
}

fn bench_bulk_commit(c: &mut Criterion) {
    let mut group = c.benchmark_group("bulk_commit");

    for &cells in &[8usize, 24usize] {
        let curves = build_grid(cells);
        group.bench_with_input(BenchmarkId::new("grid", cells), &curves, |b, curves| {
            b.iter(|| {
                let mut coord = new_coordinator();
                load(&mut coord, curves.iter().map(Curve::with_fresh_id).collect());
                black_box(coord.rebuilder().region_count())
            })
        });
    }

    group.finish();
}

fn bench_cascade_remove(c: &mut Criterion) {
    let mut group = c.benchmark_group("cascade_remove");

    for &cells in &[8usize, 24usize] {
        let mut coord = new_coordinator();
        let curves = build_grid(cells);
        let victims: Vec<CurveId> = curves.iter().step_by(7).map(|c| c.id).collect();
        load(&mut coord, curves);

        group.bench_with_input(BenchmarkId::new("grid", cells), &victims, |b, victims| {
            b.iter(|| {
                coord.begin().expect("begin fehlgeschlagen");
                for &id in victims {
                    coord.remove_curve(id).expect("remove fehlgeschlagen");
                }
                let dirty = coord.pending().map(|tx| tx.dirty().len());
                coord.abort();
                black_box(dirty)
            })
        });
    }

    group.finish();
}

fn bench_full_rebuild(c: &mut Criterion) {
    let mut coord = new_coordinator();
    load(&mut coord, build_grid(16));

    c.bench_function("full_rebuild_grid_16", |b| {
        b.iter(|| black_box(coord.rebuild().expect("Neuaufbau fehlgeschlagen").planes.len()))
    });
}

criterion_group!(benches, bench_bulk_commit, bench_cascade_remove, bench_full_rebuild);
criterion_main!(benches);
