use std::path::PathBuf;
use thiserror::Error;

/// Load-time failures. All of them are fatal for a session.
#[derive(Error, Debug)]
pub enum MappingError {
    #[error("failed to read mapping file {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("syntax error at line {line}, column {column}: {message}")]
    Syntax {
        line: usize,
        column: usize,
        message: String,
    },

    #[error("chord {key} at line {line} needs at least two distinct keys")]
    InvalidChord { key: String, line: usize },

    #[error("coordinate {value} at line {line} is out of range")]
    InvalidCoordinate { value: String, line: usize },
}

/// Failures reported by the touch platform.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum InjectError {
    /// The per-session handshake was refused. Fatal.
    #[error("touch injection handshake failed: {0}")]
    Begin(String),

    /// One frame was rejected. Logged and otherwise ignored.
    #[error("touch frame rejected: {0}")]
    Submit(String),
}

#[derive(Error, Debug)]
pub enum SessionError {
    #[error("session aborted: {0}")]
    Handshake(#[source] InjectError),

    #[error("keyboard listener failed: {0}")]
    Listener(String),

    #[error("session already closed")]
    Closed,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum HotkeyError {
    #[error("empty component in hotkey {0:?}")]
    EmptyPart(String),

    #[error("hotkey {0:?} has no key")]
    MissingKey(String),

    #[error("hotkey {0:?} names more than one key")]
    MultipleKeys(String),

    #[error("unknown key {0:?}")]
    UnknownKey(String),
}
