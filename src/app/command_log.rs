//! Protokoll der Edit-Commands eines Dokuments, als Skript wieder abspielbar.

use super::EditCommand;

/// Edit-Commands in Eingangsreihenfolge, auch abgelehnte.
///
/// Batches bleiben als ein Eintrag erhalten. Der Export erzeugt dasselbe
/// JSON-Format, das `load_script` einliest.
#[derive(Default)]
pub struct CommandLog {
    entries: Vec<EditCommand>,
}

impl CommandLog {
    /// Obergrenze; beim Erreichen fällt die ältere Hälfte weg.
    const MAX_ENTRIES: usize = 1000;

    /// Leeres Protokoll.
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Hängt einen Command an, bevor er auf das Dokument wirkt.
    pub fn record(&mut self, command: &EditCommand) {
        if self.entries.len() >= Self::MAX_ENTRIES {
            self.entries.drain(..Self::MAX_ENTRIES / 2);
        }
        self.entries.push(command.clone());
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[EditCommand] {
        &self.entries
    }

    /// Exportiert das Protokoll als Command-Skript (JSON-Array).
    pub fn to_script_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(&self.entries)
    }
}
