// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Plugin configuration.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::types::{PickerOptions, SelectionMode};

/// Persistent plugin settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PluginConfig {
    /// Title shown on the native contact picker.
    pub picker_title: String,
    /// Whether the picker allows one or many contacts to be selected.
    pub selection_mode: SelectionMode,
    /// Picker sessions allowed to be open at once; further picks are
    /// rejected as busy.
    pub max_concurrent_pickers: usize,
    /// Record privileged operations in the audit trail.
    pub audit_enabled: bool,
    /// Audit database location; in-memory when unset.
    pub audit_path: Option<PathBuf>,
    /// Default `tracing` filter directive when `RUST_LOG` is unset.
    pub log_filter: String,
}

impl Default for PluginConfig {
    fn default() -> Self {
        Self {
            picker_title: "Select Contacts".into(),
            selection_mode: SelectionMode::Multiple,
            max_concurrent_pickers: 1,
            audit_enabled: false,
            audit_path: None,
            log_filter: "info".into(),
        }
    }
}

impl PluginConfig {
    /// Load settings from a JSON file, or defaults when the file is absent.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            tracing::debug!(path = %path.display(), "no config file, using defaults");
            return Ok(Self::default());
        }
        let data = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&data)?;
        Ok(config.normalised())
    }

    /// Write settings as pretty-printed JSON.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    /// Clamp values that would make the plugin unusable.
    pub fn normalised(mut self) -> Self {
        if self.max_concurrent_pickers == 0 {
            tracing::warn!("max_concurrent_pickers = 0 would block every pick; using 1");
            self.max_concurrent_pickers = 1;
        }
        self
    }

    pub fn picker_options(&self) -> PickerOptions {
        PickerOptions {
            title: self.picker_title.clone(),
            selection_mode: self.selection_mode,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = PluginConfig::load(dir.path().join("multicontact.json")).unwrap();
        assert_eq!(config, PluginConfig::default());
        assert_eq!(config.picker_options(), PickerOptions::default());
    }

    #[test]
    fn save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("multicontact.json");
        let config = PluginConfig {
            picker_title: "Invite friends".into(),
            selection_mode: SelectionMode::Single,
            audit_enabled: true,
            ..Default::default()
        };
        config.save(&path).unwrap();
        assert_eq!(PluginConfig::load(&path).unwrap(), config);
    }

    #[test]
    fn partial_file_fills_in_defaults_and_clamps() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("multicontact.json");
        std::fs::write(&path, r#"{ "max_concurrent_pickers": 0 }"#).unwrap();

        let config = PluginConfig::load(&path).unwrap();
        assert_eq!(config.max_concurrent_pickers, 1);
        assert_eq!(config.picker_title, "Select Contacts");
    }

    #[test]
    fn malformed_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("multicontact.json");
        std::fs::write(&path, "{ not json").unwrap();
        assert!(PluginConfig::load(&path).is_err());
    }
}
