//! Built-in status catalog and optional catalog file loading.
//!
//! The six built-in statuses are always seeded. A TOML file named by `STATUS_CATALOG`
//! may add further statuses; entries reusing a built-in name replace its descriptions
//! for seeding purposes only (existing rows are never rewritten).

use crate::errors::{Error, Result};
use serde::Deserialize;
use std::path::Path;

/// Name of the status every nightline starts in and returns to on reset.
pub const DEFAULT_STATUS: &str = "default";

/// Configuration for a single status to seed
#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
pub struct StatusConfig {
    /// Unique machine name
    pub name: String,
    /// German description for a scheduled shift
    pub description_de: String,
    /// English description for a scheduled shift
    pub description_en: String,
    /// German description while the shift is live
    pub description_now_de: String,
    /// English description while the shift is live
    pub description_now_en: String,
}

/// Structure of the optional status catalog file
#[derive(Debug, Deserialize)]
pub struct CatalogFile {
    /// Additional statuses to seed
    #[serde(default)]
    pub statuses: Vec<StatusConfig>,
}

fn status(name: &str, de: &str, en: &str, now_de: &str, now_en: &str) -> StatusConfig {
    StatusConfig {
        name: name.to_string(),
        description_de: de.to_string(),
        description_en: en.to_string(),
        description_now_de: now_de.to_string(),
        description_now_en: now_en.to_string(),
    }
}

/// Returns the built-in statuses in seeding order.
#[must_use]
pub fn builtin_statuses() -> Vec<StatusConfig> {
    vec![
        status(
            DEFAULT_STATUS,
            "Kein spezifischer Status gesetzt.",
            "No specific status set.",
            "Kein spezifischer Status gesetzt.",
            "No specific status set.",
        ),
        status(
            "german",
            "Heute sind wir nur auf Deutsch erreichbar 📞",
            "Today we're only available in German 📞",
            "Wir sind gerade auf Deutsch erreichbar 📞",
            "We're available in German right now 📞",
        ),
        status(
            "english",
            "Heute sind wir nur auf Englisch erreichbar 📞",
            "Today we're only available in English 📞",
            "Wir sind gerade auf Englisch erreichbar 📞",
            "We're available in English right now 📞",
        ),
        status(
            "german-english",
            "Heute sind wir auf Deutsch und Englisch erreichbar 📞",
            "Today we're available in German & English 📞",
            "Wir sind gerade auf Deutsch und Englisch erreichbar 📞",
            "We're available in German & English right now 📞",
        ),
        status(
            "canceled",
            "Wir sind heute Abend leider nicht erreichbar 🙁",
            "Unfortunately, we're not available tonight 🙁",
            "Wir sind heute Abend leider nicht erreichbar 🙁",
            "Unfortunately, we're not available tonight 🙁",
        ),
        status(
            "technical-issues",
            "Aufgrund technischer Probleme sind wir nicht erreichbar ⚠️",
            "Due to technical issues, we're currently unavailable ⚠️",
            "Aufgrund technischer Probleme sind wir gerade nicht erreichbar ⚠️",
            "Due to technical issues, we're unavailable right now ⚠️",
        ),
    ]
}

/// Loads additional statuses from a TOML catalog file.
///
/// # Errors
/// Returns [`Error::Config`] if the file cannot be read or parsed.
pub fn load_catalog_file<P: AsRef<Path>>(path: P) -> Result<Vec<StatusConfig>> {
    let path_ref = path.as_ref();
    tracing::debug!("Loading status catalog from: {:?}", path_ref);
    let contents = std::fs::read_to_string(path_ref).map_err(|e| Error::Config {
        message: format!("Failed to read status catalog {}: {e}", path_ref.display()),
    })?;
    let catalog: CatalogFile = toml::from_str(&contents).map_err(|e| Error::Config {
        message: format!("Failed to parse status catalog {}: {e}", path_ref.display()),
    })?;
    Ok(catalog.statuses)
}

/// Merges the built-in statuses with extra entries, later entries winning on name clashes.
#[must_use]
pub fn merge_catalog(extra: Vec<StatusConfig>) -> Vec<StatusConfig> {
    let mut merged = builtin_statuses();
    for entry in extra {
        if let Some(existing) = merged.iter_mut().find(|s| s.name == entry.name) {
            *existing = entry;
        } else {
            merged.push(entry);
        }
    }
    merged
}
