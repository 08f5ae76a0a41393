//! The upload pane: file selection, its status label, and the upload cycle.

use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use tracing::{info, warn};

use crate::error::ClientError;
use crate::input::TextInput;

pub const NO_FILE_LABEL: &str = "No file selected";
pub const UPLOAD_LABEL: &str = "Upload now";
pub const UPLOADING_LABEL: &str = "Uploading...";
pub const SELECT_FIRST_PROMPT: &str = "Please select a PDF file first.";

/// The file chosen for upload, read into memory when selected.
#[derive(Debug, Clone)]
pub struct UploadSelection {
    pub name: String,
    pub path: PathBuf,
    pub bytes: Vec<u8>,
}

impl UploadSelection {
    pub async fn read(path: &Path) -> Result<Self> {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .ok_or_else(|| anyhow!("'{}' is not a file", path.display()))?;

        let bytes = tokio::fs::read(path)
            .await
            .with_context(|| format!("Could not read '{}'", path.display()))?;

        Ok(Self {
            name,
            path: path.to_path_buf(),
            bytes,
        })
    }
}

/// Modal message shown over the UI until a key is pressed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub title: String,
    pub body: String,
    pub is_error: bool,
}

impl Notice {
    pub fn info(title: &str, body: impl Into<String>) -> Self {
        Self {
            title: title.to_string(),
            body: body.into(),
            is_error: false,
        }
    }

    pub fn error(title: &str, body: impl Into<String>) -> Self {
        Self {
            title: title.to_string(),
            body: body.into(),
            is_error: true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UploadState {
    #[default]
    Idle,
    Uploading,
}

/// What the upload control asks the caller to do.
#[derive(Debug)]
pub enum UploadStart {
    Send { file_name: String, bytes: Vec<u8> },
    Rejected(Notice),
    Busy,
}

#[derive(Debug, Default)]
pub struct UploadPanel {
    pub path_input: TextInput,
    selection: Option<UploadSelection>,
    state: UploadState,
}

impl UploadPanel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn selection(&self) -> Option<&UploadSelection> {
        self.selection.as_ref()
    }

    pub fn state(&self) -> UploadState {
        self.state
    }

    /// Status label mirroring the selected file's name.
    pub fn file_label(&self) -> &str {
        self.selection
            .as_ref()
            .map(|s| s.name.as_str())
            .unwrap_or(NO_FILE_LABEL)
    }

    pub fn button_label(&self) -> &'static str {
        match self.state {
            UploadState::Idle => UPLOAD_LABEL,
            UploadState::Uploading => UPLOADING_LABEL,
        }
    }

    pub fn set_selection(&mut self, selection: Option<UploadSelection>) {
        match &selection {
            Some(s) => info!(file = %s.path.display(), "file selected"),
            None => info!("file selection cleared"),
        }
        self.selection = selection;
    }

    /// Apply whatever is typed in the path field. An empty field clears the
    /// selection; an unreadable path clears it too and returns the reason.
    pub async fn apply_path(&mut self) -> Option<Notice> {
        let raw = self.path_input.value().trim().to_string();
        if raw.is_empty() {
            self.set_selection(None);
            return None;
        }

        match UploadSelection::read(Path::new(&raw)).await {
            Ok(selection) => {
                self.set_selection(Some(selection));
                None
            }
            Err(err) => {
                warn!(path = %raw, error = %err, "could not select file");
                self.set_selection(None);
                Some(Notice::error("File not selected", format!("{err:#}")))
            }
        }
    }

    /// Start an upload cycle if there is a file and none is in flight.
    pub fn begin(&mut self) -> UploadStart {
        if self.state == UploadState::Uploading {
            return UploadStart::Busy;
        }

        let Some(selection) = &self.selection else {
            return UploadStart::Rejected(Notice::info("Upload", SELECT_FIRST_PROMPT));
        };

        self.state = UploadState::Uploading;
        info!(file = %selection.name, "upload started");
        UploadStart::Send {
            file_name: selection.name.clone(),
            bytes: selection.bytes.clone(),
        }
    }

    /// End the upload cycle. The control is idle again on every path; the
    /// selection is only cleared after a success.
    pub fn finish(&mut self, result: Result<String, ClientError>) -> Notice {
        self.state = UploadState::Idle;

        match result {
            Ok(message) => {
                info!(%message, "upload finished");
                self.set_selection(None);
                self.path_input.clear();
                Notice::info("Upload complete", message)
            }
            Err(err) => {
                warn!(error = %err, "upload failed");
                let title = if err.is_transport() { "Upload failed" } else { "Upload rejected" };
                Notice::error(title, err.to_string())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn selected(name: &str) -> UploadPanel {
        let mut panel = UploadPanel::new();
        panel.set_selection(Some(UploadSelection {
            name: name.to_string(),
            path: PathBuf::from(name),
            bytes: b"%PDF-1.7".to_vec(),
        }));
        panel
    }

    #[tokio::test]
    async fn test_apply_path_mirrors_file_name() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("handbook.pdf");
        std::fs::File::create(&path).unwrap().write_all(b"%PDF-1.4").unwrap();

        let mut panel = UploadPanel::new();
        panel.path_input.set(path.to_string_lossy());
        assert!(panel.apply_path().await.is_none());

        assert_eq!(panel.file_label(), "handbook.pdf");
        assert_eq!(panel.selection().unwrap().bytes, b"%PDF-1.4");
    }

    #[tokio::test]
    async fn test_clearing_path_resets_label() {
        let mut panel = selected("handbook.pdf");
        panel.path_input.clear();
        assert!(panel.apply_path().await.is_none());

        assert!(panel.selection().is_none());
        assert_eq!(panel.file_label(), NO_FILE_LABEL);
    }

    #[tokio::test]
    async fn test_missing_file_reports_and_clears() {
        let dir = tempfile::tempdir().unwrap();
        let mut panel = selected("old.pdf");
        panel.path_input.set(dir.path().join("missing.pdf").to_string_lossy());

        let notice = panel.apply_path().await.unwrap();
        assert!(notice.is_error);
        assert!(notice.body.contains("missing.pdf"));
        assert_eq!(panel.file_label(), NO_FILE_LABEL);
    }

    #[test]
    fn test_begin_without_file_prompts() {
        let mut panel = UploadPanel::new();
        match panel.begin() {
            UploadStart::Rejected(notice) => assert_eq!(notice.body, SELECT_FIRST_PROMPT),
            other => panic!("unexpected start: {other:?}"),
        }
        assert_eq!(panel.state(), UploadState::Idle);
        assert_eq!(panel.button_label(), UPLOAD_LABEL);
    }

    #[test]
    fn test_begin_marks_uploading_and_blocks_second_start() {
        let mut panel = selected("handbook.pdf");

        match panel.begin() {
            UploadStart::Send { file_name, bytes } => {
                assert_eq!(file_name, "handbook.pdf");
                assert_eq!(bytes, b"%PDF-1.7");
            }
            other => panic!("unexpected start: {other:?}"),
        }
        assert_eq!(panel.button_label(), UPLOADING_LABEL);
        assert!(matches!(panel.begin(), UploadStart::Busy));
    }

    #[test]
    fn test_success_clears_selection() {
        let mut panel = selected("handbook.pdf");
        panel.path_input.set("handbook.pdf");
        panel.begin();

        let notice = panel.finish(Ok("File 'handbook.pdf' received.".to_string()));

        assert!(!notice.is_error);
        assert_eq!(notice.body, "File 'handbook.pdf' received.");
        assert_eq!(panel.file_label(), NO_FILE_LABEL);
        assert!(panel.path_input.is_empty());
        assert_eq!(panel.state(), UploadState::Idle);
    }

    #[test]
    fn test_failure_keeps_selection_and_restores_control() {
        let mut panel = selected("handbook.pdf");
        panel.begin();

        let notice = panel.finish(Err(ClientError::Http {
            status: 403,
            message: "Forbidden - Admin access required".to_string(),
        }));

        assert!(notice.is_error);
        assert!(notice.body.contains("Admin access required"));
        assert_eq!(panel.file_label(), "handbook.pdf");
        assert_eq!(panel.button_label(), UPLOAD_LABEL);
    }

    #[test]
    fn test_network_failure_reports_reason() {
        let mut panel = selected("handbook.pdf");
        panel.begin();

        let notice = panel.finish(Err(ClientError::Network("Connection refused".to_string())));
        assert_eq!(notice.title, "Upload failed");
        assert!(notice.body.contains("Connection refused"));
        assert_eq!(panel.state(), UploadState::Idle);
    }
}
