//! Geometrische Trägerebenen und deren Identitätsvergabe.

use super::curve::Curve;
use super::ids::PlaneId;
use glam::{Vec2, Vec3};
use serde::{Deserialize, Serialize};

/// Trägerebene einer Kurve (Position + Orientierung).
///
/// Lokale 2D-Koordinaten haben ihren Nullpunkt in `origin` und die Achsen
/// aus [`Plane::basis`]. Eine umgedrehte Normale spiegelt das lokale System.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Plane {
    /// Ein Punkt auf der Ebene
    pub origin: Vec3,
    /// Normale (muss nicht normiert übergeben werden)
    pub normal: Vec3,
}

impl Plane {
    /// Erstellt eine Ebene aus Ursprung und Normale.
    pub fn new(origin: Vec3, normal: Vec3) -> Self {
        Self { origin, normal }
    }

    /// XY-Ebene durch den Ursprung.
    pub fn xy() -> Self {
        Self::new(Vec3::ZERO, Vec3::Z)
    }

    /// Zur XY-Ebene parallele Ebene auf Höhe `z`.
    pub fn xy_at(z: f32) -> Self {
        Self::new(Vec3::new(0.0, 0.0, z), Vec3::Z)
    }

    /// Orthonormale Achsen `(u, v)` in der Ebene mit `u × v` in Normalenrichtung.
    ///
    /// Hängt nur von der Normale ab; für `+Z` sind es die Weltachsen X und Y.
    pub fn basis(&self) -> (Vec3, Vec3) {
        let n = self.normal.normalize_or_zero();
        if n == Vec3::ZERO {
            return (Vec3::X, Vec3::Y);
        }
        n.any_orthonormal_pair()
    }

    /// Lokaler Punkt → Weltkoordinaten.
    pub fn to_world(&self, p: Vec2) -> Vec3 {
        let (u, v) = self.basis();
        self.origin + u * p.x + v * p.y
    }

    /// Weltpunkt → lokale Koordinaten (Anteil entlang der Normale fällt weg).
    pub fn to_local(&self, w: Vec3) -> Vec2 {
        let (u, v) = self.basis();
        let d = w - self.origin;
        Vec2::new(d.dot(u), d.dot(v))
    }

    /// Prüft ob zwei Ebenen innerhalb der Toleranzen dieselbe Ebene beschreiben.
    ///
    /// Normalen dürfen entgegengesetzt orientiert sein.
    pub fn coincides_with(&self, other: &Plane, distance_tolerance: f32, angle_tolerance: f32) -> bool {
        let n1 = self.normal.normalize_or_zero();
        let n2 = other.normal.normalize_or_zero();
        if n1 == Vec3::ZERO || n2 == Vec3::ZERO {
            return false;
        }
        if n1.dot(n2).abs() < angle_tolerance.cos() {
            return false;
        }
        (other.origin - self.origin).dot(n1).abs() <= distance_tolerance
    }
}

impl Default for Plane {
    fn default() -> Self {
        Self::xy()
    }
}

/// Vergibt `PlaneId`s: gleiche Ebenen (innerhalb Toleranz) teilen eine Identität.
///
/// Einträge werden nie entfernt, damit vergebene IDs stabil bleiben.
#[derive(Debug, Clone)]
pub struct PlaneRegistry {
    planes: Vec<Plane>,
    distance_tolerance: f32,
    angle_tolerance: f32,
}

impl PlaneRegistry {
    /// Erstellt eine leere Registry mit den angegebenen Toleranzen.
    pub fn new(distance_tolerance: f32, angle_tolerance: f32) -> Self {
        Self {
            planes: Vec::new(),
            distance_tolerance,
            angle_tolerance,
        }
    }

    /// Liefert die Identität der Ebene und legt sie bei Bedarf an.
    pub fn intern(&mut self, plane: &Plane) -> PlaneId {
        if let Some(existing) = self.find(plane) {
            return existing;
        }
        let id = PlaneId(self.planes.len() as u32);
        self.planes.push(*plane);
        log::debug!("Neue {} registriert (Normale {:?})", id, plane.normal);
        id
    }

    /// Sucht eine bereits registrierte, deckungsgleiche Ebene.
    pub fn find(&self, plane: &Plane) -> Option<PlaneId> {
        self.planes
            .iter()
            .position(|p| p.coincides_with(plane, self.distance_tolerance, self.angle_tolerance))
            .map(|idx| PlaneId(idx as u32))
    }

    /// Wie [`Self::intern`], liefert zusätzlich die Kurve im lokalen System
    /// der repräsentativen Ebene.
    ///
    /// Alle Kurven einer `PlaneId` teilen damit ein Koordinatensystem, auch
    /// wenn ihre Ebenen mit anderem Ursprung oder umgedrehter Normale
    /// angegeben wurden.
    pub fn intern_curve(&mut self, curve: &Curve) -> (PlaneId, Curve) {
        let id = self.intern(&curve.plane);
        let frame = self.planes[id.0 as usize];
        (id, curve.in_frame_of(&frame))
    }

    /// Gibt die repräsentative Ebene zu einer ID zurück.
    pub fn get(&self, id: PlaneId) -> Option<&Plane> {
        self.planes.get(id.0 as usize)
    }

    /// Anzahl bekannter Ebenen.
    pub fn len(&self) -> usize {
        self.planes.len()
    }

    /// Gibt `true` zurück, wenn noch keine Ebene registriert wurde.
    pub fn is_empty(&self) -> bool {
        self.planes.is_empty()
    }
}
