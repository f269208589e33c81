//! Planare Basiskurven (Polylinien in Ebenen-Koordinaten).

use super::error::ContourError;
use super::ids::CurveId;
use super::plane::Plane;
use glam::Vec2;
use serde::{Deserialize, Serialize};

/// Endpunkt einer Kurve.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum CurveEnd {
    /// Parameter `t_min`
    Start,
    /// Parameter `t_max`
    Stop,
}

/// Unveränderliche Basiskurve.
///
/// Geometrie ist eine Polylinie in lokalen 2D-Koordinaten der Trägerebene
/// (siehe [`Plane::basis`]).
/// Der Parameterbereich ist `[0, points.len() - 1]`; ganzzahlige Parameter
/// liegen auf den Stützpunkten. Eine geänderte Geometrie ist eine neue Kurve
/// mit neuer Identität.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Curve {
    /// Handle der Kurve
    #[serde(default = "CurveId::allocate")]
    pub id: CurveId,
    /// Trägerebene
    #[serde(default)]
    pub plane: Plane,
    /// Stützpunkte (mindestens zwei)
    pub points: Vec<Vec2>,
}

impl Curve {
    /// Erstellt eine Kurve mit neu vergebenem Handle.
    pub fn new(plane: Plane, points: Vec<Vec2>) -> Self {
        Self::with_id(CurveId::allocate(), plane, points)
    }

    /// Erstellt eine Kurve mit vorgegebenem Handle.
    pub fn with_id(id: CurveId, plane: Plane, points: Vec<Vec2>) -> Self {
        Self { id, plane, points }
    }

    /// Gerade Strecke von `start` nach `end`.
    pub fn line(plane: Plane, start: Vec2, end: Vec2) -> Self {
        Self::new(plane, vec![start, end])
    }

    /// Kopie derselben Geometrie unter neuem Handle.
    pub fn with_fresh_id(&self) -> Self {
        Self::new(self.plane, self.points.clone())
    }

    /// Dieselbe Kurve in lokalen Koordinaten von `target`.
    ///
    /// Sinnvoll nur für deckungsgleiche Ebenen; der Abstand zur Zielebene
    /// fällt weg.
    pub fn in_frame_of(&self, target: &Plane) -> Self {
        if self.plane == *target {
            return self.clone();
        }
        let points = self
            .points
            .iter()
            .map(|&p| target.to_local(self.plane.to_world(p)))
            .collect();
        Self::with_id(self.id, *target, points)
    }

    /// Stellt sicher, dass die Kurve auswertbar ist.
    pub fn validate(&self) -> Result<(), ContourError> {
        if self.points.len() < 2 {
            return Err(ContourError::DegenerateCurve(self.id));
        }
        Ok(())
    }

    /// Anzahl der Segmente.
    pub fn segment_count(&self) -> usize {
        self.points.len().saturating_sub(1)
    }

    /// Kleinster Parameter.
    pub fn t_min(&self) -> f32 {
        0.0
    }

    /// Größter Parameter.
    pub fn t_max(&self) -> f32 {
        self.segment_count() as f32
    }

    /// Parameter am angegebenen Endpunkt.
    pub fn t_at(&self, end: CurveEnd) -> f32 {
        match end {
            CurveEnd::Start => self.t_min(),
            CurveEnd::Stop => self.t_max(),
        }
    }

    /// Position am angegebenen Endpunkt.
    pub fn endpoint(&self, end: CurveEnd) -> Vec2 {
        let point = match end {
            CurveEnd::Start => self.points.first(),
            CurveEnd::Stop => self.points.last(),
        };
        point.copied().unwrap_or(Vec2::ZERO)
    }

    /// Wertet die Kurve am Parameter `t` aus (geklemmt auf den Parameterbereich).
    pub fn point_at(&self, t: f32) -> Vec2 {
        let segments = self.segment_count();
        if segments == 0 {
            return self.points.first().copied().unwrap_or(Vec2::ZERO);
        }
        let t = t.clamp(0.0, segments as f32);
        let index = (t.floor() as usize).min(segments - 1);
        let local = t - index as f32;
        self.points[index].lerp(self.points[index + 1], local)
    }

    /// Punktfolge des Teilstücks zwischen `t0` und `t1` (`t0 < t1`).
    ///
    /// Enthält beide Randpunkte und alle dazwischenliegenden Stützpunkte.
    pub fn sub_path(&self, t0: f32, t1: f32) -> Vec<Vec2> {
        let mut path = vec![self.point_at(t0)];
        let first_vertex = t0.floor() as usize + 1;
        let last_vertex = t1.ceil() as usize;
        for vertex in first_vertex..last_vertex {
            if let Some(p) = self.points.get(vertex) {
                path.push(*p);
            }
        }
        path.push(self.point_at(t1));
        path
    }

    /// Achsparallele Hüllbox (min, max).
    pub fn bounds(&self) -> (Vec2, Vec2) {
        let mut min = Vec2::splat(f32::INFINITY);
        let mut max = Vec2::splat(f32::NEG_INFINITY);
        for p in &self.points {
            min = min.min(*p);
            max = max.max(*p);
        }
        (min, max)
    }

    /// Gesamtlänge der Polylinie.
    pub fn length(&self) -> f32 {
        self.points.windows(2).map(|w| w[0].distance(w[1])).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn l_shape() -> Curve {
        Curve::new(
            Plane::xy(),
            vec![Vec2::new(0.0, 0.0), Vec2::new(10.0, 0.0), Vec2::new(10.0, 5.0)],
        )
    }

    #[test]
    fn parameter_range_follows_segment_count() {
        let curve = l_shape();
        assert_eq!(curve.t_min(), 0.0);
        assert_eq!(curve.t_max(), 2.0);
        assert_eq!(curve.endpoint(CurveEnd::Stop), Vec2::new(10.0, 5.0));
    }

    #[test]
    fn point_at_interpolates_within_segment() {
        let curve = l_shape();
        let p = curve.point_at(1.5);
        assert_relative_eq!(p.x, 10.0);
        assert_relative_eq!(p.y, 2.5);
        assert_eq!(curve.point_at(7.0), Vec2::new(10.0, 5.0));
    }

    #[test]
    fn sub_path_includes_inner_vertices() {
        let curve = l_shape();
        let path = curve.sub_path(0.5, 1.5);
        assert_eq!(path.len(), 3);
        assert_eq!(path[1], Vec2::new(10.0, 0.0));
    }

    #[test]
    fn single_point_curve_is_degenerate() {
        let curve = Curve::new(Plane::xy(), vec![Vec2::ZERO]);
        assert_eq!(curve.validate(), Err(ContourError::DegenerateCurve(curve.id)));
    }

    #[test]
    fn length_sums_segments() {
        assert_relative_eq!(l_shape().length(), 15.0);
    }
}
