use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Persisted session override: the operator-selected default model.
///
/// Written by the `/model` command and read once at startup; external tools
/// may rewrite the file independently of a running session.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionState {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
}

#[derive(Debug, Error)]
pub enum StateError {
    #[error("failed to read session state at {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to write session state at {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("session state at {path} is not valid JSON: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// A missing state file is not an error; it reads as the default state.
pub fn load_state(path: &Path) -> Result<SessionState, StateError> {
    let raw = match fs::read_to_string(path) {
        Ok(raw) => raw,
        Err(error) if error.kind() == io::ErrorKind::NotFound => {
            return Ok(SessionState::default())
        }
        Err(source) => {
            return Err(StateError::Read {
                path: path.to_path_buf(),
                source,
            })
        }
    };

    serde_json::from_str(&raw).map_err(|source| StateError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

pub fn save_state(path: &Path, state: &SessionState) -> Result<(), StateError> {
    let raw = serde_json::to_string_pretty(state).map_err(|source| StateError::Parse {
        path: path.to_path_buf(),
        source,
    })?;

    fs::write(path, raw).map_err(|source| StateError::Write {
        path: path.to_path_buf(),
        source,
    })
}
