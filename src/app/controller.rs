//! Edit Controller für zentrale Command-Verarbeitung.

use super::{Document, EditCommand};
use crate::core::ContourError;

/// Führt Edit-Commands auf einem `Document` aus.
#[derive(Default)]
pub struct EditController;

impl EditController {
    /// Erstellt einen neuen Controller.
    pub fn new() -> Self {
        Self
    }

    /// Führt einen Command aus und protokolliert ihn im Command-Log.
    ///
    /// `Batch` läuft als eine Dokument-Transaktion; scheitert ein
    /// enthaltener Command, bleibt das Dokument unverändert. `Undo`, `Redo`
    /// und `Rebuild` brauchen ein Dokument ohne offene Transaktion und werden
    /// in einem Batch vor dessen Beginn abgelehnt.
    pub async fn handle_command(
        &mut self,
        doc: &mut Document,
        command: EditCommand,
    ) -> anyhow::Result<()> {
        doc.command_log.record(&command);

        match command {
            EditCommand::Batch { commands } => {
                let commands = EditCommand::flatten(commands);
                if let Some(idle_only) = commands.iter().find(|c| requires_idle(c)) {
                    return Err(ContourError::invalid_state(format!(
                        "{} ist innerhalb eines Batches nicht erlaubt",
                        idle_only.name()
                    ))
                    .into());
                }
                let count = commands.len();
                doc.transaction(async move |doc| {
                    for command in commands {
                        apply(doc, command)?;
                    }
                    Ok(())
                })
                .await?;
                log::info!("Batch mit {count} Command(s) angewendet");
            }
            EditCommand::Undo => {
                if !doc.undo()? {
                    log::info!("Nichts zum Rückgängigmachen");
                }
            }
            EditCommand::Redo => {
                if !doc.redo()? {
                    log::info!("Nichts zum Wiederholen");
                }
            }
            EditCommand::Rebuild => doc.rebuild()?,
            other => apply(doc, other)?,
        }

        Ok(())
    }
}

/// Commands, die ein Dokument ohne offene Transaktion voraussetzen.
fn requires_idle(command: &EditCommand) -> bool {
    matches!(
        command,
        EditCommand::Undo | EditCommand::Redo | EditCommand::Rebuild | EditCommand::Batch { .. }
    )
}

/// Wendet einen einzelnen Command an (innerhalb oder außerhalb einer Transaktion).
fn apply(doc: &mut Document, command: EditCommand) -> anyhow::Result<()> {
    match command {
        // === Items ===
        EditCommand::AddItem { item } => {
            doc.add_item(item)?;
        }
        EditCommand::RemoveItem { item } => {
            doc.remove_item(item)?;
        }
        EditCommand::ReplaceItem { item, with } => doc.replace_item(item, with)?,

        // === Sichtbarkeit ===
        EditCommand::Hide { item } => doc.hide(item)?,
        EditCommand::Unhide { item } => doc.unhide(item)?,
        EditCommand::SetVisible { item, visible } => doc.set_visible(item, visible)?,

        // === Regionen ===
        EditCommand::PinRegion { plane, key } => {
            doc.pin_region(plane, key)?;
        }

        // === Nur ohne offene Transaktion ===
        other @ (EditCommand::Undo | EditCommand::Redo | EditCommand::Rebuild | EditCommand::Batch { .. }) => {
            return Err(ContourError::invalid_state(format!(
                "{} ist innerhalb eines Batches nicht erlaubt",
                other.name()
            ))
            .into());
        }
    }
    Ok(())
}
