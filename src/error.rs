use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum MultiError {
    #[error("project path does not exist: {}", .0.display())]
    ProjectPathMissing(PathBuf),
    #[error("invalid session name {0:?}: must be a single path segment")]
    InvalidSessionName(String),
    #[error("config file invalid or unreadable: {0}")]
    InvalidConfig(String),
    #[error("claude binary unavailable: {0}")]
    MissingClaudeBinary(String),
    #[error("{command} finished with {issues} issue(s)")]
    CommandFailed { command: String, issues: usize },
}
