// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! On-disk conversation state: `{version, messages, initial_prompt}` written
//! atomically (temp file + rename) so a crash mid-write never leaves a
//! truncated file behind.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::message::ConversationMessage;

const PERSISTED_VERSION: u32 = 1;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersistedState {
    pub version: u32,
    pub messages: Vec<ConversationMessage>,
    pub initial_prompt: String,
}

impl PersistedState {
    pub fn new(messages: Vec<ConversationMessage>, initial_prompt: String) -> Self {
        Self { version: PERSISTED_VERSION, messages, initial_prompt }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum PersistError {
    #[error("failed to read state file: {0}")]
    Read(#[source] std::io::Error),
    #[error("state file is corrupted: {0}")]
    Corrupt(#[source] serde_json::Error),
    #[error("failed to serialize state: {0}")]
    Serialize(#[source] serde_json::Error),
    #[error("failed to write state file: {0}")]
    Write(#[source] std::io::Error),
}

/// Load persisted state. Missing or empty files are tolerated and return
/// `Ok(None)` ("no prior state"); malformed JSON is an error.
pub fn load(path: &Path) -> Result<Option<PersistedState>, PersistError> {
    let contents = match std::fs::read_to_string(path) {
        Ok(c) => c,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(PersistError::Read(e)),
    };

    if contents.trim().is_empty() {
        return Ok(None);
    }

    serde_json::from_str(&contents).map(Some).map_err(PersistError::Corrupt)
}

/// Write `state` to `path` atomically: serialize to a temp file in the same
/// directory, then rename over the destination.
pub fn save(path: &Path, state: &PersistedState) -> Result<(), PersistError> {
    let dir = path.parent().filter(|p| !p.as_os_str().is_empty()).unwrap_or_else(|| Path::new("."));
    let json = serde_json::to_string_pretty(state).map_err(PersistError::Serialize)?;

    let mut tmp = tempfile::Builder::new()
        .prefix(".agentapi-state-")
        .suffix(".tmp")
        .tempfile_in(dir)
        .map_err(PersistError::Write)?;
    use std::io::Write;
    tmp.write_all(json.as_bytes()).map_err(PersistError::Write)?;
    tmp.flush().map_err(PersistError::Write)?;
    tmp.persist(path).map_err(|e| PersistError::Write(e.error))?;
    Ok(())
}

#[cfg(test)]
#[path = "persist_tests.rs"]
mod tests;
