//! Editor settings.
//!
//! Use [`EditorSettings::builder()`] for a fluent setup, or deserialize the
//! settings a frontend sends.

use serde::{Deserialize, Serialize};

use crate::editor::{ConfigMode, normalize_output_filename};

/// Starting state of a configuration editor.
///
/// # Example
///
/// ```rust,ignore
/// use lex_prepconfig::config::EditorSettings;
/// use lex_prepconfig::editor::ConfigMode;
///
/// let settings = EditorSettings::builder()
///     .mode(ConfigMode::Advanced)
///     .ml_ready(true)
///     .output_filename("cleaned.csv")
///     .build()?;
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorSettings {
    /// Simple (per type) or advanced (per column) options.
    /// Default: Simple
    pub mode: ConfigMode,

    /// Constrain every output column to be numeric.
    /// Default: false
    pub ml_ready: bool,

    /// Name of the produced file. `.csv` is appended when missing.
    /// If None, a timestamped name is suggested from the source file.
    /// Default: None
    pub output_filename: Option<String>,
}

impl EditorSettings {
    pub fn builder() -> EditorSettingsBuilder {
        EditorSettingsBuilder::default()
    }

    /// Validate the settings and return errors if invalid.
    pub fn validate(&self) -> Result<(), SettingsValidationError> {
        if let Some(name) = &self.output_filename
            && normalize_output_filename(name).is_none()
        {
            return Err(SettingsValidationError::InvalidOutputFilename(name.clone()));
        }
        Ok(())
    }
}

/// Errors that can occur during settings validation.
#[derive(Debug, thiserror::Error)]
pub enum SettingsValidationError {
    #[error(
        "Invalid output filename '{0}' (use 1-128 letters, digits, '.', '_' or '-')"
    )]
    InvalidOutputFilename(String),
}

/// Builder for [`EditorSettings`] with fluent API.
#[derive(Debug, Default)]
pub struct EditorSettingsBuilder {
    mode: Option<ConfigMode>,
    ml_ready: Option<bool>,
    output_filename: Option<String>,
}

impl EditorSettingsBuilder {
    pub fn mode(mut self, mode: ConfigMode) -> Self {
        self.mode = Some(mode);
        self
    }

    /// Enable or disable the ML-Ready constraints.
    pub fn ml_ready(mut self, ml_ready: bool) -> Self {
        self.ml_ready = Some(ml_ready);
        self
    }

    pub fn output_filename(mut self, name: impl Into<String>) -> Self {
        self.output_filename = Some(name.into());
        self
    }

    /// Build the settings.
    ///
    /// Returns validated `EditorSettings` or an error if validation fails.
    pub fn build(self) -> Result<EditorSettings, SettingsValidationError> {
        let settings = EditorSettings {
            mode: self.mode.unwrap_or_default(),
            ml_ready: self.ml_ready.unwrap_or(false),
            output_filename: self.output_filename,
        };

        settings.validate()?;
        Ok(settings)
    }
}
