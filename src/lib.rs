//! Contour Editor Library.
//! Transaktionsbasierte Kurven-, Trim- und Regionen-Koordination als Library
//! exportiert für Tests und Wiederverwendung.

pub mod app;
pub mod core;
pub mod scene;
pub mod shared;

pub use app::{CommandLog, ContourCoordinator, Document, EditCommand, EditController};
pub use core::{
    CommitBatch, CommitReport, CommitSummary, ContourError, CoordinatorState, Curve, CurveEnd,
    CurveId, CurveRecord, Fragment, FragmentPath, ItemId, ItemKind, ItemStore, Joint, Joints,
    PlanarRegionBuilder, Plane, PlaneCurveIndex, PlaneId, PlaneIndex, PointOnCurve, Region,
    RegionItem, RegionRebuilder, SceneItem, SolidItem, Transaction, TransactionCoordinator,
};
pub use scene::{SceneFile, load_scene, load_script, save_scene};
pub use shared::ContourOptions;
