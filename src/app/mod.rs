//! Application-Layer: Dokument, Controller, Commands und Historie.

pub mod command_log;
pub mod controller;
/// Dokument mit Item-Bestand und Transaktions-Koordinator
///
/// Einzige Stelle, an der Items und registrierte Kurven gemeinsam verändert werden.
pub mod document;
pub mod events;
pub mod history;

pub use command_log::CommandLog;
pub use controller::EditController;
pub use document::{ContourCoordinator, Document};
pub use events::EditCommand;
pub use history::{EditHistory, Snapshot};
