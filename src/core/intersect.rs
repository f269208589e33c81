//! Schnittparameter zwischen Polylinien (Grundlage für das Trimmen).

use super::curve::{Curve, CurveEnd};
use glam::Vec2;

/// Toleranz für Parameter-Vergleiche (Segment-lokal).
const PARAM_EPS: f32 = 1e-5;

/// Schnittpunkt zweier Kurven als Parameterpaar.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Crossing {
    /// Parameter auf der ersten Kurve
    pub t_a: f32,
    /// Parameter auf der zweiten Kurve
    pub t_b: f32,
}

fn cross(a: Vec2, b: Vec2) -> f32 {
    a.x * b.y - a.y * b.x
}

/// Schnitt zweier Strecken `p0→p1` und `q0→q1`.
///
/// Liefert die lokalen Parameter `(s, u)` in `[0, 1]`. Kollineare und
/// parallele Strecken liefern `None`; Berührungen an Streckenenden zählen.
pub fn segment_intersection(p0: Vec2, p1: Vec2, q0: Vec2, q1: Vec2) -> Option<(f32, f32)> {
    let r = p1 - p0;
    let s = q1 - q0;
    let denom = cross(r, s);
    let scale = r.length() * s.length();
    if scale == 0.0 || denom.abs() <= f32::EPSILON * scale {
        return None;
    }
    let qp = q0 - p0;
    let t = cross(qp, s) / denom;
    let u = cross(qp, r) / denom;
    if (-PARAM_EPS..=1.0 + PARAM_EPS).contains(&t) && (-PARAM_EPS..=1.0 + PARAM_EPS).contains(&u) {
        Some((t.clamp(0.0, 1.0), u.clamp(0.0, 1.0)))
    } else {
        None
    }
}

fn bounds_overlap(a: &Curve, b: &Curve, tolerance: f32) -> bool {
    let (a_min, a_max) = a.bounds();
    let (b_min, b_max) = b.bounds();
    a_min.x <= b_max.x + tolerance
        && b_min.x <= a_max.x + tolerance
        && a_min.y <= b_max.y + tolerance
        && b_min.y <= a_max.y + tolerance
}

/// Alle Schnittstellen der Kurven `a` und `b`.
///
/// Endpunkt-Berührungen innerhalb `tolerance` werden ebenfalls gemeldet,
/// auch wenn die Strecken numerisch knapp verfehlen.
pub fn crossings(a: &Curve, b: &Curve, tolerance: f32) -> Vec<Crossing> {
    let mut result = Vec::new();
    if a.id == b.id || !bounds_overlap(a, b, tolerance) {
        return result;
    }

    for (i, wa) in a.points.windows(2).enumerate() {
        for (j, wb) in b.points.windows(2).enumerate() {
            if let Some((s, u)) = segment_intersection(wa[0], wa[1], wb[0], wb[1]) {
                push_unique(&mut result, Crossing {
                    t_a: i as f32 + s,
                    t_b: j as f32 + u,
                });
            }
        }
    }

    // Endpunkt-Kontakte mit Toleranz (Joints bei minimalem Versatz)
    for end_a in [CurveEnd::Start, CurveEnd::Stop] {
        for end_b in [CurveEnd::Start, CurveEnd::Stop] {
            if a.endpoint(end_a).distance(b.endpoint(end_b)) <= tolerance {
                push_unique(&mut result, Crossing {
                    t_a: a.t_at(end_a),
                    t_b: b.t_at(end_b),
                });
            }
        }
    }

    result
}

fn push_unique(list: &mut Vec<Crossing>, crossing: Crossing) {
    let duplicate = list.iter().any(|c| {
        (c.t_a - crossing.t_a).abs() <= PARAM_EPS && (c.t_b - crossing.t_b).abs() <= PARAM_EPS
    });
    if !duplicate {
        list.push(crossing);
    }
}

/// Prüft ob sich zwei Kurven irgendwo treffen.
pub fn touches(a: &Curve, b: &Curve, tolerance: f32) -> bool {
    !crossings(a, b, tolerance).is_empty()
}

/// Sortiert Trimm-Parameter und fasst numerisch gleiche zusammen.
pub fn normalize_params(mut params: Vec<f32>) -> Vec<f32> {
    params.sort_by(|a, b| a.total_cmp(b));
    params.dedup_by(|a, b| (*a - *b).abs() <= PARAM_EPS);
    params
}
