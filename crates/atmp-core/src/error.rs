//! Error types for `atmp-core`.
//!
//! Every failure the workflow can produce maps onto one of four kinds:
//! validation (malformed input), conflict (a uniqueness or one-shot
//! invariant), not-found (a dangling id), or storage (the backend failed).
//! Callers dispatch on [`Error::kind`] rather than on individual variants.

use thiserror::Error;
use uuid::Uuid;

/// The coarse classification of an [`Error`], used by transport layers to
/// pick a status code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
  Validation,
  Conflict,
  NotFound,
  Storage,
}

#[derive(Debug, Error)]
pub enum Error {
  #[error("dossier not found: {0}")]
  DossierNotFound(Uuid),

  #[error("audit not found: {0}")]
  AuditNotFound(Uuid),

  #[error("no audit exists for dossier {0}")]
  NoAuditForDossier(Uuid),

  #[error("dispute not found: {0}")]
  DisputeNotFound(Uuid),

  #[error("document not found: {0}")]
  DocumentNotFound(Uuid),

  #[error("user not found: {0}")]
  UserNotFound(Uuid),

  #[error("an audit already exists for dossier {0}")]
  AuditAlreadyExists(Uuid),

  #[error("audit {0} is already closed")]
  AuditAlreadyCompleted(Uuid),

  #[error("a dispute already exists for dossier {0}")]
  DisputeAlreadyExists(Uuid),

  #[error("missing required field: {0}")]
  MissingField(&'static str),

  #[error("unknown audit decision: {0:?}")]
  UnknownDecision(String),

  #[error("unknown document type: {0:?}")]
  UnknownDocumentType(String),

  #[error("uploaded file is empty")]
  EmptyFile,

  #[error("serialization error: {0}")]
  Serialization(#[from] serde_json::Error),

  #[error("storage error: {0}")]
  Storage(String),
}

impl Error {
  pub fn kind(&self) -> ErrorKind {
    match self {
      Self::DossierNotFound(_)
      | Self::AuditNotFound(_)
      | Self::NoAuditForDossier(_)
      | Self::DisputeNotFound(_)
      | Self::DocumentNotFound(_)
      | Self::UserNotFound(_) => ErrorKind::NotFound,

      Self::AuditAlreadyExists(_)
      | Self::AuditAlreadyCompleted(_)
      | Self::DisputeAlreadyExists(_) => ErrorKind::Conflict,

      Self::MissingField(_)
      | Self::UnknownDecision(_)
      | Self::UnknownDocumentType(_)
      | Self::EmptyFile => ErrorKind::Validation,

      Self::Serialization(_) | Self::Storage(_) => ErrorKind::Storage,
    }
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
