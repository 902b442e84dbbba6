//! error — классифицированные ошибки хранилища.
//!
//! Every failure surfaced by the manager maps onto one HTTP-like status class:
//! - 400 BadRequest — hidden-segment writes, root delete, bad formats;
//! - 403 Forbidden  — OS permission denied;
//! - 404 NotFound   — missing, escaped (outside the sandbox) or hidden on read;
//! - 409 Conflict   — rename/copy destination already exists;
//! - 500 Internal   — everything else (disk full, unreadable device, ...).
//!
//! `Config` is only produced while constructing the store.

use std::io;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, ContentsError>;

#[derive(Debug, Error)]
pub enum ContentsError {
    #[error("bad request: {0}")]
    BadRequest(String),

    #[error("permission denied: {0}")]
    Forbidden(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("conflict: {0}")]
    Conflict(String),

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("internal error: {0:#}")]
    Internal(#[from] anyhow::Error),
}

impl ContentsError {
    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self::BadRequest(msg.into())
    }

    pub fn forbidden(msg: impl Into<String>) -> Self {
        Self::Forbidden(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    pub fn conflict(msg: impl Into<String>) -> Self {
        Self::Conflict(msg.into())
    }

    /// HTTP-совместимый код статуса (Config считается 500: до запросов не доходит).
    pub fn status_code(&self) -> u16 {
        match self {
            Self::BadRequest(_) => 400,
            Self::Forbidden(_) => 403,
            Self::NotFound(_) => 404,
            Self::Conflict(_) => 409,
            Self::Config(_) | Self::Internal(_) => 500,
        }
    }

    /// Classify an io::Error raised while touching `what`.
    ///
    /// NotFound and PermissionDenied keep their class; anything else becomes
    /// an internal error with the operation as context.
    pub fn from_io(err: io::Error, what: impl std::fmt::Display) -> Self {
        match err.kind() {
            io::ErrorKind::NotFound => Self::NotFound(format!("{what}: no such file or directory")),
            io::ErrorKind::PermissionDenied => Self::Forbidden(format!("{what}: {err}")),
            _ => Self::Internal(anyhow::Error::new(err).context(what.to_string())),
        }
    }
}
