//! Metadaten pro Kurve: Joints, Fragmente und der `CurveRecord`.

use super::curve::{Curve, CurveEnd};
use super::ids::{CurveId, PlaneId};
use glam::Vec2;

/// Parameterstelle auf einer Kurve.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointOnCurve {
    /// Kurve, auf der der Punkt liegt
    pub curve: CurveId,
    /// Parameter
    pub t: f32,
    /// Untere Parametergrenze der Kurve
    pub t_min: f32,
    /// Obere Parametergrenze der Kurve
    pub t_max: f32,
}

impl PointOnCurve {
    /// Punkt am Endpunkt `end` der Kurve.
    pub fn at_end(curve: &Curve, end: CurveEnd) -> Self {
        Self {
            curve: curve.id,
            t: curve.t_at(end),
            t_min: curve.t_min(),
            t_max: curve.t_max(),
        }
    }

    /// Liegt der Punkt auf `t_min`?
    pub fn is_t_min(&self) -> bool {
        self.t == self.t_min
    }

    /// Liegt der Punkt auf `t_max`?
    pub fn is_t_max(&self) -> bool {
        self.t == self.t_max
    }

    /// Endpunkt, auf dem der Punkt liegt (falls einer).
    pub fn end(&self) -> Option<CurveEnd> {
        if self.is_t_min() {
            Some(CurveEnd::Start)
        } else if self.is_t_max() {
            Some(CurveEnd::Stop)
        } else {
            None
        }
    }
}

/// Berührung zweier Kurven: eigener Parameter und Parameter der Partnerkurve.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Joint {
    /// Stelle auf der eigenen Kurve
    pub own: PointOnCurve,
    /// Stelle auf der berührenden Kurve
    pub other: PointOnCurve,
}

impl Joint {
    /// Sicht der Partnerkurve auf denselben Joint.
    pub fn mirrored(&self) -> Self {
        Self {
            own: self.other,
            other: self.own,
        }
    }
}

/// Joints an Start und Ende einer Kurve.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Joints {
    /// Joint am Startpunkt
    pub start: Option<Joint>,
    /// Joint am Endpunkt
    pub stop: Option<Joint>,
}

impl Joints {
    /// Joint am angegebenen Endpunkt.
    pub fn at(&self, end: CurveEnd) -> Option<&Joint> {
        match end {
            CurveEnd::Start => self.start.as_ref(),
            CurveEnd::Stop => self.stop.as_ref(),
        }
    }

    /// Setzt den Joint am angegebenen Endpunkt.
    pub fn set(&mut self, end: CurveEnd, joint: Option<Joint>) {
        match end {
            CurveEnd::Start => self.start = joint,
            CurveEnd::Stop => self.stop = joint,
        }
    }

    /// Iterator über vorhandene Joints (Start vor Ende).
    pub fn iter(&self) -> impl Iterator<Item = &Joint> {
        self.start.iter().chain(self.stop.iter())
    }

    /// IDs aller Partnerkurven (ohne Duplikate, Start vor Ende).
    pub fn partners(&self) -> Vec<CurveId> {
        let mut partners: Vec<CurveId> = Vec::with_capacity(2);
        for joint in self.iter() {
            if !partners.contains(&joint.other.curve) {
                partners.push(joint.other.curve);
            }
        }
        partners
    }

    /// Prüft ob ein Joint auf die angegebene Kurve verweist.
    pub fn references(&self, curve: CurveId) -> bool {
        self.iter().any(|j| j.other.curve == curve)
    }
}

/// Getrimmtes Teilstück einer Basiskurve.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Fragment {
    /// Start-Parameter auf der Basiskurve
    pub start: f32,
    /// End-Parameter auf der Basiskurve
    pub stop: f32,
    /// Ungetrimmte Basiskurve
    pub ancestor: CurveId,
}

/// Geometrie eines Fragments, wie sie der Regions-Aufbau benötigt.
#[derive(Debug, Clone, PartialEq)]
pub struct FragmentPath {
    /// Ungetrimmte Basiskurve
    pub ancestor: CurveId,
    /// Punktfolge vom Start- zum End-Parameter
    pub points: Vec<Vec2>,
}

/// Metadaten einer registrierten Kurve.
///
/// Gehört exklusiv dem `PlaneCurveIndex`; der Koordinator liest nur.
#[derive(Debug, Clone, PartialEq)]
pub struct CurveRecord {
    /// Basiskurve
    pub curve: Curve,
    /// Ebene, unter der die Kurve indexiert ist
    pub plane: PlaneId,
    /// Berührungen an den Endpunkten
    pub joints: Joints,
    /// Aus den aktuellen Joints/Schnitten abgeleitete Fragmente
    pub fragments: Vec<Fragment>,
    /// Zählt jede Neuberechnung der Fragmente
    pub revision: u64,
}

impl CurveRecord {
    /// Neuer Record ohne Joints und Fragmente.
    pub fn new(curve: Curve, plane: PlaneId) -> Self {
        Self {
            curve,
            plane,
            joints: Joints::default(),
            fragments: Vec::new(),
            revision: 0,
        }
    }

    /// Handle der Kurve.
    pub fn id(&self) -> CurveId {
        self.curve.id
    }

    /// Geometrie aller Fragmente.
    pub fn fragment_paths(&self) -> Vec<FragmentPath> {
        self.fragments
            .iter()
            .map(|f| FragmentPath {
                ancestor: f.ancestor,
                points: self.curve.sub_path(f.start, f.stop),
            })
            .collect()
    }
}
