//! Preprocessing Configuration Library
//!
//! The configuration model behind a preprocessing dashboard: which
//! preprocessing features may be combined for each column type, whether a
//! configuration is consistent, and whether it produces an all-numeric,
//! ML-ready dataset.
//!
//! # Overview
//!
//! - **Rule Table**: per column type, the features with their `conflicts`,
//!   `requires` and `applied_after` relationships ([`rules`])
//! - **Rule Evaluation**: conflict and requirement checks plus the reason an
//!   option is disabled ([`has_conflict`], [`is_required_missing`],
//!   [`get_disabled_reason`])
//! - **Validation**: a whole column configuration at once
//!   ([`validate_configuration`])
//! - **ML-Ready Gate**: forced values, narrowed options, locked fields and a
//!   submission check ([`ml_ready`])
//! - **Typed Options**: one options struct per column type with closed choice
//!   sets ([`options`])
//! - **Editor**: the aggregate configuration, updated only through events
//!   ([`ConfigEditor`], [`ConfigEvent`])
//! - **Session**: application state with a start / sign-out lifecycle
//!   ([`Session`])
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use lex_prepconfig::{
//!     ColumnDescriptor, ColumnType, ConfigEditor, ConfigEvent, EditorSettings, OptionsCatalog,
//! };
//!
//! let columns = vec![
//!     ColumnDescriptor::new("age", ColumnType::Numeric),
//!     ColumnDescriptor::new("city", ColumnType::Categorical),
//! ];
//! let settings = EditorSettings::builder().ml_ready(true).build()?;
//! let mut editor = ConfigEditor::new(columns, OptionsCatalog::builtin(), &settings)?;
//!
//! editor.apply(ConfigEvent::OutputFilenameChanged(Some("clean".into())))?;
//!
//! match editor.submit() {
//!     Ok(config) => println!("{}", serde_json::to_string_pretty(&config)?),
//!     Err(e) => {
//!         for message in e.blocking_messages() {
//!             println!("- {message}");
//!         }
//!     }
//! }
//! ```
//!
//! # Rule Evaluation
//!
//! Evaluation works on any [`FeatureSet`]: the typed options, the tagged
//! [`ColumnOptions`] union or an untyped [`FeatureMap`].
//!
//! ```rust,ignore
//! use lex_prepconfig::{ColumnType, FeatureMap, FeatureValue, validate_configuration};
//!
//! let config = FeatureMap::new()
//!     .with("merge_rare", FeatureValue::Threshold { threshold: 0.05 })
//!     .with("top_n_categories", FeatureValue::TopN { n: 10 });
//!
//! let result = validate_configuration(ColumnType::Categorical, &config);
//! assert_eq!(
//!     result.errors,
//!     vec!["merge_rare conflicts with top_n_categories. Please disable one of them."]
//! );
//! ```

pub mod catalog;
#[cfg(feature = "api")]
pub mod client;
pub mod config;
pub mod editor;
pub mod error;
pub mod ml_ready;
pub mod options;
pub mod rules;
pub mod session;
pub mod types;

// Re-exports for convenient access
pub use catalog::{FeatureCatalogEntry, FieldState, OptionsCatalog};
#[cfg(feature = "api")]
pub use client::{ApiClient, ApiConfig, ApiConfigBuilder, SubmitResponse};
pub use config::{EditorSettings, EditorSettingsBuilder, SettingsValidationError};
pub use editor::{
    ConfigEditor, ConfigEvent, ConfigMode, ConfigSlice, PreprocessingConfig,
    PreprocessingSections, SliceTarget, TypeSection, normalize_output_filename,
    suggested_output_filename,
};
pub use error::{ConfigError, Result as ConfigResult, ResultExt};
pub use ml_ready::{
    MlReadyViolation, PanelMode, apply_ml_ready, is_locked, is_option_allowed, validate_ml_ready,
};
pub use options::{ColumnOptions, FeatureMap, FeatureSet, FeatureValue};
pub use rules::{
    FeatureRule, ValidationResult, application_order, get_disabled_reason, has_conflict,
    is_required_missing, rules_for, validate_configuration,
};
pub use session::Session;
pub use types::{ColumnDescriptor, ColumnStats, ColumnType};

// Editors and sessions are handed between threads by frontends.
static_assertions::assert_impl_all!(ConfigEditor: Send, Sync);
static_assertions::assert_impl_all!(Session: Send, Sync);
static_assertions::assert_impl_all!(OptionsCatalog: Send, Sync);
static_assertions::assert_impl_all!(ConfigError: Send, Sync);
