//! Szenen-Items: Volumenkörper, Kurven und fixierte Regionen.
//!
//! Nur `ItemKind::Curve` wird an den Transaktions-Koordinator weitergeleitet;
//! die anderen Varianten sind reine Daten im `ItemStore`.

use super::curve::Curve;
use super::ids::{ItemId, PlaneId};
use glam::{Vec2, Vec3};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Volumenkörper (vom CAD-Kernel verwaltet, hier nur Metadaten).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SolidItem {
    /// Untere Ecke der Hüllbox
    pub bounds_min: Vec3,
    /// Obere Ecke der Hüllbox
    pub bounds_max: Vec3,
}

/// Kopie einer berechneten Region, die als eigenes Item fixiert wurde.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegionItem {
    /// Ebene der Region zum Zeitpunkt der Fixierung
    pub plane: PlaneId,
    /// Randpolygon
    pub boundary: Vec<Vec2>,
}

/// Geschlossene Menge der Item-Arten.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemKind {
    /// Volumenkörper
    Solid(SolidItem),
    /// Planare Basiskurve
    Curve(Curve),
    /// Fixierte Region
    Region(RegionItem),
}

impl ItemKind {
    /// Kurve, falls das Item eine ist.
    pub fn as_curve(&self) -> Option<&Curve> {
        match self {
            ItemKind::Curve(curve) => Some(curve),
            ItemKind::Solid(_) | ItemKind::Region(_) => None,
        }
    }
}

/// Ein Item der Szene.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SceneItem {
    /// Identität (vom Store vergeben, in Dateien ignoriert)
    #[serde(skip)]
    pub id: ItemId,
    /// Anzeigename
    #[serde(default)]
    pub name: String,
    /// Sichtbarkeit
    #[serde(default = "default_visible")]
    pub visible: bool,
    /// Inhalt
    pub kind: ItemKind,
}

fn default_visible() -> bool {
    true
}

impl SceneItem {
    /// Neues, sichtbares Item (ID wird beim Einfügen vergeben).
    pub fn new(name: impl Into<String>, kind: ItemKind) -> Self {
        Self {
            id: ItemId::default(),
            name: name.into(),
            visible: true,
            kind,
        }
    }

    /// Kurze Form für ein Kurven-Item.
    pub fn curve(name: impl Into<String>, curve: Curve) -> Self {
        Self::new(name, ItemKind::Curve(curve))
    }

    /// Kurve, die aktuell am Koordinator registriert sein muss.
    pub fn active_curve(&self) -> Option<&Curve> {
        if self.visible {
            self.kind.as_curve()
        } else {
            None
        }
    }
}

/// Geordneter Speicher aller Items.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ItemStore {
    items: IndexMap<ItemId, SceneItem>,
    next_id: u64,
}

impl ItemStore {
    /// Erstellt einen leeren Store.
    pub fn new() -> Self {
        Self {
            items: IndexMap::new(),
            next_id: 1,
        }
    }

    /// Fügt ein Item ein und vergibt seine ID.
    pub fn insert(&mut self, mut item: SceneItem) -> ItemId {
        let id = ItemId(self.next_id.max(1));
        self.next_id = id.0 + 1;
        item.id = id;
        self.items.insert(id, item);
        id
    }

    /// Item nach ID.
    pub fn get(&self, id: ItemId) -> Option<&SceneItem> {
        self.items.get(&id)
    }

    /// Veränderbares Item nach ID.
    pub fn get_mut(&mut self, id: ItemId) -> Option<&mut SceneItem> {
        self.items.get_mut(&id)
    }

    /// Entfernt ein Item (Reihenfolge der übrigen bleibt erhalten).
    pub fn remove(&mut self, id: ItemId) -> Option<SceneItem> {
        self.items.shift_remove(&id)
    }

    /// Iterator über alle Items in Einfügereihenfolge.
    pub fn iter(&self) -> impl Iterator<Item = &SceneItem> {
        self.items.values()
    }

    /// Alle sichtbaren Kurven (in Item-Reihenfolge).
    pub fn visible_curves(&self) -> Vec<Curve> {
        self.items
            .values()
            .filter_map(SceneItem::active_curve)
            .cloned()
            .collect()
    }

    /// Anzahl der Items.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Gibt `true` zurück, wenn der Store leer ist.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}
