//! Aggregate configuration editor.
//!
//! Panels never write the configuration directly. They send a
//! [`ConfigEvent`] to the [`ConfigEditor`], which computes the next state as
//! a pure step and commits it only when the step succeeds, so a rejected event
//! leaves the editor untouched.

mod aggregate;
mod events;
mod filename;

pub use aggregate::{
    ConfigMode, ConfigSlice, PreprocessingConfig, PreprocessingSections, SliceTarget, TypeSection,
};
pub use events::ConfigEvent;
pub use filename::{normalize_output_filename, suggested_output_filename};

use tracing::{debug, info, warn};

use crate::catalog::{FieldState, OptionsCatalog};
use crate::config::EditorSettings;
use crate::error::{ConfigError, Result};
use crate::ml_ready::{self, MlReadyViolation, PanelMode};
use crate::options::{ColumnOptions, FeatureValue};
use crate::rules::{self, ValidationResult};
use crate::types::{ColumnDescriptor, ColumnType};

/// State the reducer steps over.
#[derive(Debug, Clone, PartialEq)]
struct EditorState {
    ml_ready: bool,
    config: PreprocessingConfig,
}

/// Owns the preprocessing configuration of one dataset.
#[derive(Debug, Clone)]
pub struct ConfigEditor {
    columns: Vec<ColumnDescriptor>,
    /// Columns with a known data type, in dataset order.
    typed_columns: Vec<(String, ColumnType)>,
    catalog: OptionsCatalog,
    state: EditorState,
}

impl ConfigEditor {
    /// Create an editor seeded with catalog defaults for `settings.mode`.
    pub fn new(
        columns: Vec<ColumnDescriptor>,
        catalog: OptionsCatalog,
        settings: &EditorSettings,
    ) -> Result<Self> {
        settings
            .validate()
            .map_err(|e| ConfigError::InvalidSettings(e.to_string()))?;

        let typed_columns = columns
            .iter()
            .filter_map(|column| match column.column_type() {
                Ok(column_type) => Some((column.name.clone(), column_type)),
                Err(e) => {
                    warn!(column = %column.name, "Column left unconfigured: {}", e);
                    None
                }
            })
            .collect();

        let mut editor = Self {
            columns,
            typed_columns,
            catalog,
            state: EditorState {
                ml_ready: settings.ml_ready,
                config: PreprocessingConfig::new(settings.mode),
            },
        };
        editor.state.config.output_filename = settings
            .output_filename
            .as_deref()
            .and_then(normalize_output_filename);
        editor.state.config.preprocessing = editor.seed(settings.mode, settings.ml_ready);

        info!(
            columns = editor.columns.len(),
            mode = %settings.mode,
            ml_ready = settings.ml_ready,
            "Configuration editor ready"
        );
        Ok(editor)
    }

    /// Load an already assembled configuration, for example one read back
    /// from disk. The options are taken as is, without gating, but every
    /// per-column entry must name a known column filed under its own type.
    pub fn with_config(
        columns: Vec<ColumnDescriptor>,
        catalog: OptionsCatalog,
        config: PreprocessingConfig,
        ml_ready: bool,
    ) -> Result<Self> {
        if !config.mode_invariant_holds() {
            return Err(ConfigError::InvalidSettings(format!(
                "{} mode configuration has sections of the other mode",
                config.mode
            )));
        }
        if let Some(name) = &config.output_filename
            && normalize_output_filename(name).as_deref() != Some(name.as_str())
        {
            return Err(ConfigError::InvalidOutputFilename(name.clone()));
        }

        let settings = EditorSettings {
            mode: config.mode,
            ml_ready,
            output_filename: None,
        };
        let mut editor = Self::new(columns, catalog, &settings)?;
        for slice in config.preprocessing.slices() {
            if let SliceTarget::Column { name, column_type } = slice.target {
                editor.check_column_options(name, column_type)?;
            }
        }
        editor.state.config = config;
        Ok(editor)
    }

    pub fn columns(&self) -> &[ColumnDescriptor] {
        &self.columns
    }

    pub fn catalog(&self) -> &OptionsCatalog {
        &self.catalog
    }

    pub fn config(&self) -> &PreprocessingConfig {
        &self.state.config
    }

    pub fn mode(&self) -> ConfigMode {
        self.state.config.mode
    }

    pub fn ml_ready(&self) -> bool {
        self.state.ml_ready
    }

    pub fn panel_mode(&self) -> PanelMode {
        PanelMode::from_flag(self.state.ml_ready)
    }

    /// Detected data type of a column.
    pub fn column_type(&self, column: &str) -> Result<ColumnType> {
        self.typed_columns
            .iter()
            .find(|(name, _)| name == column)
            .map(|(_, column_type)| *column_type)
            .ok_or_else(|| ConfigError::UnknownColumn(column.to_string()))
    }

    /// Data types present in the dataset, in type order.
    pub fn present_types(&self) -> Vec<ColumnType> {
        ColumnType::ALL
            .into_iter()
            .filter(|t| self.typed_columns.iter().any(|(_, ct)| ct == t))
            .collect()
    }

    /// Apply one event. On error the editor is unchanged.
    pub fn apply(&mut self, event: ConfigEvent) -> Result<()> {
        let name = event.name();
        let next = self
            .reduce(&self.state, event)
            .map_err(|e| e.with_context(format!("Applying {name}")))?;
        debug!(event = name, "Configuration event applied");
        self.state = next;
        Ok(())
    }

    fn reduce(&self, state: &EditorState, event: ConfigEvent) -> Result<EditorState> {
        let mut next = state.clone();

        match event {
            ConfigEvent::ModeChanged(mode) => {
                if mode != state.config.mode {
                    info!(from = %state.config.mode, to = %mode, "Switching configuration mode");
                    next.config.mode = mode;
                    next.config.preprocessing = self.seed(mode, state.ml_ready);
                }
            }
            ConfigEvent::GlobalUpdated(options) => {
                if state.config.mode != ConfigMode::Simple {
                    return Err(ConfigError::ModeMismatch {
                        mode: state.config.mode,
                        event: "GlobalUpdated",
                    });
                }
                next.config.preprocessing.set_global(gate(options, state.ml_ready));
            }
            ConfigEvent::ColumnUpdated { column, options } => {
                if state.config.mode != ConfigMode::Advanced {
                    return Err(ConfigError::ModeMismatch {
                        mode: state.config.mode,
                        event: "ColumnUpdated",
                    });
                }
                let column = self.check_column_options(column, options.column_type())?;
                next.config
                    .preprocessing
                    .set_column(column, gate(options, state.ml_ready));
            }
            ConfigEvent::MlReadyToggled(on) => {
                if on && !state.ml_ready {
                    next.config.preprocessing.map_options(ml_ready::apply_ml_ready);
                }
                if on != state.ml_ready {
                    info!(ml_ready = on, "ML-ready mode toggled");
                }
                next.ml_ready = on;
            }
            ConfigEvent::OutputFilenameChanged(name) => {
                next.config.output_filename = match name {
                    Some(name) => Some(
                        normalize_output_filename(&name)
                            .ok_or(ConfigError::InvalidOutputFilename(name))?,
                    ),
                    None => None,
                };
            }
            ConfigEvent::Reset => {
                next.config.preprocessing = self.seed(state.config.mode, state.ml_ready);
            }
        }

        Ok(next)
    }

    /// Options of type `actual` may only be filed under a known column of that type.
    fn check_column_options(&self, column: String, actual: ColumnType) -> Result<String> {
        let expected = self.column_type(&column)?;
        if actual != expected {
            return Err(ConfigError::ColumnTypeMismatch {
                column,
                expected,
                actual,
            });
        }
        Ok(column)
    }

    /// Default options for every present type (simple) or column (advanced).
    fn seed(&self, mode: ConfigMode, ml_ready: bool) -> PreprocessingSections {
        let mut sections = PreprocessingSections::default();
        match mode {
            ConfigMode::Simple => {
                for column_type in self.present_types() {
                    sections.set_global(self.catalog.default_options(column_type, ml_ready));
                }
            }
            ConfigMode::Advanced => {
                for (name, column_type) in &self.typed_columns {
                    sections.set_column(
                        name.clone(),
                        self.catalog.default_options(*column_type, ml_ready),
                    );
                }
            }
        }
        sections
    }

    /// What a panel renders for one field under the current ML-Ready flag.
    pub fn field_state(&self, column_type: ColumnType, feature: &str) -> FieldState {
        self.catalog
            .field_state(column_type, feature, self.state.ml_ready)
    }

    /// Why `value` cannot be chosen for `feature` on the given slice, if so.
    pub fn disabled_reason(
        &self,
        target: &SliceTarget,
        feature: &str,
        value: &FeatureValue,
    ) -> Option<String> {
        let (column_type, options) = self.slice_options(target);
        rules::get_disabled_reason(column_type, feature, value, &options)
    }

    /// Rule check of one slice as currently configured.
    pub fn validate_slice(&self, target: &SliceTarget) -> ValidationResult {
        let (column_type, options) = self.slice_options(target);
        rules::validate_configuration(column_type, &options)
    }

    fn slice_options(&self, target: &SliceTarget) -> (ColumnType, ColumnOptions) {
        let (column_type, configured) = match target {
            SliceTarget::Global(column_type) => (
                *column_type,
                self.state.config.preprocessing.global(*column_type),
            ),
            SliceTarget::Column { name, column_type } => (
                *column_type,
                self.state.config.preprocessing.column(name, *column_type),
            ),
        };
        (
            column_type,
            configured.unwrap_or_else(|| ColumnOptions::empty(column_type)),
        )
    }

    /// ML-Ready violations of the current configuration.
    pub fn ml_ready_violations(&self) -> Vec<MlReadyViolation> {
        ml_ready::validate_ml_ready(&self.columns, &self.state.config)
    }

    /// Every message that blocks submission.
    ///
    /// Rule errors are prefixed with the slice they belong to, ML-Ready
    /// violations (only when the flag is on) name their column.
    pub fn submission_errors(&self) -> Vec<String> {
        let mut errors: Vec<String> = self
            .state
            .config
            .preprocessing
            .slices()
            .into_iter()
            .flat_map(|slice| {
                let column_type = slice.options.column_type();
                rules::validate_configuration(column_type, &slice.options)
                    .errors
                    .into_iter()
                    .map(move |error| format!("{}: {error}", slice.target))
            })
            .collect();

        if self.state.ml_ready {
            errors.extend(self.ml_ready_violations().into_iter().map(|v| v.message));
        }
        errors
    }

    /// The configuration to send, or the messages blocking it.
    pub fn submit(&self) -> Result<PreprocessingConfig> {
        let errors = self.submission_errors();
        if !errors.is_empty() {
            warn!(errors = errors.len(), "Preprocessing submission blocked");
            return Err(ConfigError::SubmissionBlocked(errors));
        }
        info!(
            mode = %self.state.config.mode,
            ml_ready = self.state.ml_ready,
            "Configuration ready for submission"
        );
        Ok(self.state.config.clone())
    }
}

fn gate(options: ColumnOptions, ml_ready: bool) -> ColumnOptions {
    if ml_ready {
        ml_ready::apply_ml_ready(options)
    } else {
        options
    }
}
