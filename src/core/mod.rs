//! Core-Domänentypen: Kurven, Ebenen, Kurven-Index, Regionen, Transaktionen.

pub mod coordinator;
pub mod curve;
pub mod error;
pub mod ids;
pub mod index;
pub mod intersect;
pub mod item;
pub mod plane;
/// Konkreter Kurven-Index
///
/// Hält pro Kurve einen `CurveRecord` (Joints + Fragmente) und pro Ebene
/// die Mitgliederliste. Joints werden über den Endpunkt-kd-Baum gefunden.
pub mod plane_index;
pub mod record;
pub mod region;
pub mod spatial;
pub mod transaction;
pub mod validate;

pub use coordinator::{CommitSummary, CoordinatorState, TransactionCoordinator};
pub use curve::{Curve, CurveEnd};
pub use error::ContourError;
pub use ids::{CurveId, ItemId, PlaneId};
pub use index::{CommitBatch, CommitReport, PlaneCurveIndex};
pub use intersect::Crossing;
pub use item::{ItemKind, ItemStore, RegionItem, SceneItem, SolidItem};
pub use plane::{Plane, PlaneRegistry};
pub use plane_index::PlaneIndex;
pub use record::{CurveRecord, Fragment, FragmentPath, Joint, Joints, PointOnCurve};
pub use region::{PlanarRegionBuilder, Region, RegionRebuilder};
pub use spatial::{EndpointIndex, EndpointMatch};
pub use transaction::Transaction;
pub use validate::{ValidationResult, validate_index};
