use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use blake3::Hasher;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::config_directory;
use crate::domain::ticket::{EditingInfo, TicketDraft};
use crate::error::{AppError, AppResult};
use crate::services::SessionStore;

const SESSION_FILE_NAME: &str = "sessions.json";
const SESSION_LIMIT: usize = 32;

/// How the draft in a session was opened. A submit must use the same mode:
/// an edit draft carries locks that a clone draft does not.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionMode {
    Create,
    Edit,
    Clone,
}

impl SessionMode {
    pub fn as_str(self) -> &'static str {
        match self {
            SessionMode::Create => "create",
            SessionMode::Edit => "edit",
            SessionMode::Clone => "clone",
        }
    }
}

impl fmt::Display for SessionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Draft state carried from `ticket open` to `ticket submit`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EditSession {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    mode: Option<SessionMode>,
    #[serde(default)]
    ticket_data: Option<TicketDraft>,
    #[serde(default, rename = "ticket_editingInfo")]
    ticket_editing_info: EditingInfo,
}

impl EditSession {
    pub fn mode(&self) -> Option<SessionMode> {
        self.mode
    }

    pub fn set_mode(&mut self, mode: SessionMode) {
        self.mode = Some(mode);
    }

    pub fn ticket_data(&self) -> Option<&TicketDraft> {
        self.ticket_data.as_ref()
    }

    pub fn set_ticket_data(&mut self, draft: TicketDraft) {
        self.ticket_data = Some(draft);
    }

    pub fn clear_ticket_data(&mut self) {
        self.ticket_data = None;
    }

    pub fn editing_info(&self) -> &EditingInfo {
        &self.ticket_editing_info
    }

    pub fn set_editing_info(&mut self, editing_info: EditingInfo) {
        self.ticket_editing_info = editing_info;
    }

    pub fn is_empty(&self) -> bool {
        self.mode.is_none() && self.ticket_data.is_none() && self.ticket_editing_info.is_empty()
    }

    /// Session key for one user against one ticket service.
    pub fn compute_key(user: &str, api_url: &str) -> String {
        let mut hasher = Hasher::new();
        hasher.update(user.as_bytes());
        hasher.update(b"\0");
        hasher.update(api_url.trim_end_matches('/').as_bytes());
        hasher.finalize().to_hex().to_string()
    }
}

#[derive(Default, Serialize, Deserialize)]
struct SessionFile {
    entries: Vec<SessionEntry>,
}

#[derive(Serialize, Deserialize, Clone)]
struct SessionEntry {
    key: String,
    session: EditSession,
}

/// Keeps sessions in a JSON file, at most `SESSION_LIMIT` of them; the
/// least recently written entries are dropped first.
pub struct FileSessionStore {
    file_path: PathBuf,
}

impl FileSessionStore {
    pub fn new(file_path: PathBuf) -> Self {
        Self { file_path }
    }

    pub fn open_default() -> AppResult<Self> {
        Ok(Self::new(config_directory()?.join(SESSION_FILE_NAME)))
    }

    pub fn path(&self) -> &Path {
        &self.file_path
    }

    fn read(&self) -> AppResult<SessionFile> {
        match fs::read_to_string(&self.file_path) {
            Ok(contents) => serde_json::from_str::<SessionFile>(&contents)
                .map_err(|err| AppError::Session(format!("invalid session file: {err}"))),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(SessionFile::default()),
            Err(err) => Err(AppError::Io(err)),
        }
    }

    fn write(&self, file: &SessionFile) -> AppResult<()> {
        if let Some(parent) = self.file_path.parent() {
            fs::create_dir_all(parent)?;
        }
        let data = serde_json::to_string_pretty(file)
            .map_err(|err| AppError::Session(format!("failed to write session: {err}")))?;
        fs::write(&self.file_path, data)?;
        Ok(())
    }
}

impl SessionStore for FileSessionStore {
    fn load(&self, key: &str) -> AppResult<EditSession> {
        let file = self.read()?;
        let session = file
            .entries
            .into_iter()
            .find(|entry| entry.key == key)
            .map(|entry| entry.session)
            .unwrap_or_default();
        debug!(path = %self.file_path.display(), empty = session.is_empty(), "loaded edit session");
        Ok(session)
    }

    fn save(&self, key: &str, session: &EditSession) -> AppResult<()> {
        let mut file = self.read()?;
        file.entries.retain(|entry| entry.key != key);
        file.entries.push(SessionEntry {
            key: key.to_string(),
            session: session.clone(),
        });

        if file.entries.len() > SESSION_LIMIT {
            let overflow = file.entries.len() - SESSION_LIMIT;
            file.entries.drain(0..overflow);
        }

        self.write(&file)?;
        debug!(path = %self.file_path.display(), "saved edit session");
        Ok(())
    }

    fn clear(&self, key: &str) -> AppResult<()> {
        let mut file = self.read()?;
        let before = file.entries.len();
        file.entries.retain(|entry| entry.key != key);
        if file.entries.len() != before {
            self.write(&file)?;
        }
        Ok(())
    }
}

#[cfg(test)]
pub use memory::MemorySessionStore;
