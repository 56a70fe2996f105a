use serde::{Deserialize, Serialize};

use super::ConfigMode;
use crate::options::ColumnOptions;

/// A change reported by a panel to the editor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "payload", rename_all = "snake_case")]
pub enum ConfigEvent {
    /// Switch between shared and per-column options. Options are re-seeded.
    ModeChanged(ConfigMode),
    /// Shared options of one data type changed (simple mode).
    GlobalUpdated(ColumnOptions),
    /// Options of one column changed (advanced mode).
    ColumnUpdated {
        column: String,
        options: ColumnOptions,
    },
    MlReadyToggled(bool),
    OutputFilenameChanged(Option<String>),
    /// Back to the defaults of the current mode.
    Reset,
}

impl ConfigEvent {
    pub fn name(&self) -> &'static str {
        match self {
            Self::ModeChanged(_) => "ModeChanged",
            Self::GlobalUpdated(_) => "GlobalUpdated",
            Self::ColumnUpdated { .. } => "ColumnUpdated",
            Self::MlReadyToggled(_) => "MlReadyToggled",
            Self::OutputFilenameChanged(_) => "OutputFilenameChanged",
            Self::Reset => "Reset",
        }
    }
}
