//! Application state for one signed-in user.
//!
//! A [`Session`] is created signed out. [`Session::start`] installs the options
//! catalog, [`Session::sign_out`] drops everything. In between, at most one
//! file is open with its own [`ConfigEditor`]. The ML-Ready flag belongs to the
//! session and is handed to every editor it opens.

use tracing::{debug, info};

use crate::catalog::OptionsCatalog;
use crate::config::EditorSettings;
use crate::editor::{ConfigEditor, ConfigEvent};
use crate::error::{ConfigError, Result};
use crate::types::ColumnDescriptor;

#[derive(Debug, Clone)]
struct OpenFile {
    file_id: String,
    editor: ConfigEditor,
}

#[derive(Debug, Clone)]
struct ActiveSession {
    catalog: OptionsCatalog,
    ml_ready: bool,
    file: Option<OpenFile>,
}

/// Explicit application state with a start / sign-out lifecycle.
#[derive(Debug, Clone, Default)]
pub struct Session {
    active: Option<ActiveSession>,
}

impl Session {
    /// A signed-out session.
    pub fn new() -> Self {
        Self::default()
    }

    /// Begin a session. Any previous state is discarded.
    pub fn start(&mut self, catalog: OptionsCatalog) {
        if self.active.is_some() {
            debug!("Restarting session, previous state discarded");
        }
        self.active = Some(ActiveSession {
            catalog,
            ml_ready: false,
            file: None,
        });
        info!("Session started");
    }

    pub fn is_active(&self) -> bool {
        self.active.is_some()
    }

    fn active(&self) -> Result<&ActiveSession> {
        self.active.as_ref().ok_or(ConfigError::NoSession)
    }

    fn active_mut(&mut self) -> Result<&mut ActiveSession> {
        self.active.as_mut().ok_or(ConfigError::NoSession)
    }

    pub fn catalog(&self) -> Result<&OptionsCatalog> {
        Ok(&self.active()?.catalog)
    }

    pub fn ml_ready(&self) -> Result<bool> {
        Ok(self.active()?.ml_ready)
    }

    /// Set the session flag and pass it on to the open editor.
    pub fn set_ml_ready(&mut self, ml_ready: bool) -> Result<()> {
        let active = self.active_mut()?;
        if let Some(file) = active.file.as_mut() {
            file.editor.apply(ConfigEvent::MlReadyToggled(ml_ready))?;
        }
        active.ml_ready = ml_ready;
        Ok(())
    }

    /// Open a file, replacing the one open before.
    pub fn open_file(
        &mut self,
        file_id: impl Into<String>,
        columns: Vec<ColumnDescriptor>,
    ) -> Result<&mut ConfigEditor> {
        let active = self.active_mut()?;
        let file_id = file_id.into();
        let settings = EditorSettings {
            ml_ready: active.ml_ready,
            ..Default::default()
        };
        let editor = ConfigEditor::new(columns, active.catalog.clone(), &settings)?;

        info!(file_id = %file_id, "File opened for preprocessing");
        let file = active.file.insert(OpenFile { file_id, editor });
        Ok(&mut file.editor)
    }

    pub fn file_id(&self) -> Result<&str> {
        self.active()?
            .file
            .as_ref()
            .map(|f| f.file_id.as_str())
            .ok_or(ConfigError::NoFileOpen)
    }

    pub fn editor(&self) -> Result<&ConfigEditor> {
        self.active()?
            .file
            .as_ref()
            .map(|f| &f.editor)
            .ok_or(ConfigError::NoFileOpen)
    }

    pub fn editor_mut(&mut self) -> Result<&mut ConfigEditor> {
        self.active_mut()?
            .file
            .as_mut()
            .map(|f| &mut f.editor)
            .ok_or(ConfigError::NoFileOpen)
    }

    /// Forward an event to the open editor.
    ///
    /// `MlReadyToggled` also updates the session flag.
    pub fn apply(&mut self, event: ConfigEvent) -> Result<()> {
        match event {
            ConfigEvent::MlReadyToggled(on) => {
                self.editor()?;
                self.set_ml_ready(on)
            }
            event => self.editor_mut()?.apply(event),
        }
    }

    pub fn close_file(&mut self) -> Result<()> {
        let active = self.active_mut()?;
        if let Some(file) = active.file.take() {
            debug!(file_id = %file.file_id, "File closed");
        }
        Ok(())
    }

    /// Clear all state.
    pub fn sign_out(&mut self) {
        if self.active.take().is_some() {
            info!("Signed out, session state cleared");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::editor::ConfigMode;
    use crate::types::ColumnType;

    fn columns() -> Vec<ColumnDescriptor> {
        vec![
            ColumnDescriptor::new("id", ColumnType::Identifier),
            ColumnDescriptor::new("active", ColumnType::Boolean),
        ]
    }

    #[test]
    fn test_operations_require_session() {
        let mut session = Session::new();
        assert!(matches!(session.catalog(), Err(ConfigError::NoSession)));
        assert!(matches!(
            session.open_file("f1", columns()),
            Err(ConfigError::NoSession)
        ));
        assert!(matches!(session.set_ml_ready(true), Err(ConfigError::NoSession)));
    }

    #[test]
    fn test_editor_requires_open_file() {
        let mut session = Session::new();
        session.start(OptionsCatalog::builtin());
        assert!(matches!(session.editor(), Err(ConfigError::NoFileOpen)));
        assert!(matches!(
            session.apply(ConfigEvent::Reset),
            Err(ConfigError::NoFileOpen)
        ));
        assert!(matches!(
            session.apply(ConfigEvent::MlReadyToggled(true)),
            Err(ConfigError::NoFileOpen)
        ));
        assert!(!session.ml_ready().unwrap());
    }

    #[test]
    fn test_ml_ready_flag_follows_session() {
        let mut session = Session::new();
        session.start(OptionsCatalog::builtin());
        session.set_ml_ready(true).unwrap();

        let editor = session.open_file("f1", columns()).unwrap();
        assert!(editor.ml_ready());

        session.apply(ConfigEvent::MlReadyToggled(false)).unwrap();
        assert!(!session.ml_ready().unwrap());
        assert!(!session.editor().unwrap().ml_ready());
    }

    #[test]
    fn test_open_close_and_sign_out() {
        let mut session = Session::new();
        session.start(OptionsCatalog::builtin());
        session.open_file("f1", columns()).unwrap();
        session
            .apply(ConfigEvent::ModeChanged(ConfigMode::Advanced))
            .unwrap();
        assert_eq!(session.file_id().unwrap(), "f1");
        assert_eq!(session.editor().unwrap().mode(), ConfigMode::Advanced);

        session.close_file().unwrap();
        assert!(matches!(session.file_id(), Err(ConfigError::NoFileOpen)));

        session.open_file("f2", columns()).unwrap();
        session.sign_out();
        assert!(!session.is_active());
        assert!(matches!(session.editor(), Err(ConfigError::NoSession)));
    }
}
