//! Audit types — the review workflow run against a dossier.
//!
//! An audit is the state machine at the heart of the system:
//! `NOT_STARTED → IN_PROGRESS → COMPLETED`, with `COMPLETED` terminal.
//! Finalisation is single-shot; the decision and `completed_at` are set
//! exactly when the status becomes `COMPLETED`, never before or after.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{Error, Result, dispute::Dispute, dossier::Dossier};

// ─── Enums ───────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AuditStatus {
  NotStarted,
  InProgress,
  Completed,
}

impl AuditStatus {
  pub fn as_str(self) -> &'static str {
    match self {
      Self::NotStarted => "NOT_STARTED",
      Self::InProgress => "IN_PROGRESS",
      Self::Completed => "COMPLETED",
    }
  }

  pub fn parse(s: &str) -> Option<Self> {
    match s {
      "NOT_STARTED" => Some(Self::NotStarted),
      "IN_PROGRESS" => Some(Self::InProgress),
      "COMPLETED" => Some(Self::Completed),
      _ => None,
    }
  }

  /// Precondition for checklist updates and finalisation: the audit must not
  /// already be closed.
  pub fn ensure_open(self, audit_id: Uuid) -> Result<()> {
    if self == Self::Completed {
      return Err(Error::AuditAlreadyCompleted(audit_id));
    }
    Ok(())
  }
}

/// The terminal classification of an audit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AuditDecision {
  Contest,
  DoNotContest,
  NeedMoreInfo,
  ReferToExpert,
}

impl AuditDecision {
  pub fn as_str(self) -> &'static str {
    match self {
      Self::Contest => "CONTEST",
      Self::DoNotContest => "DO_NOT_CONTEST",
      Self::NeedMoreInfo => "NEED_MORE_INFO",
      Self::ReferToExpert => "REFER_TO_EXPERT",
    }
  }

  pub fn parse(s: &str) -> Result<Self> {
    match s {
      "CONTEST" => Ok(Self::Contest),
      "DO_NOT_CONTEST" => Ok(Self::DoNotContest),
      "NEED_MORE_INFO" => Ok(Self::NeedMoreInfo),
      "REFER_TO_EXPERT" => Ok(Self::ReferToExpert),
      other => Err(Error::UnknownDecision(other.to_owned())),
    }
  }
}

// ─── Checklist ───────────────────────────────────────────────────────────────

/// One entry of the audit checklist. Field names are camelCase on the wire
/// for compatibility with already-persisted data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChecklistItem {
  pub question:          String,
  pub answer:            Option<bool>,
  #[serde(default)]
  pub comment:           String,
  #[serde(default)]
  pub document_required: bool,
  #[serde(default)]
  pub document_received: bool,
}

// ─── Audit ───────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Audit {
  pub audit_id:     Uuid,
  pub dossier_id:   Uuid,
  pub auditor_id:   Option<Uuid>,
  pub status:       AuditStatus,
  /// Set exactly when `status` is `Completed`.
  pub decision:     Option<AuditDecision>,
  pub comments:     Option<String>,
  pub checklist:    Vec<ChecklistItem>,
  pub started_at:   Option<DateTime<Utc>>,
  /// Set exactly when `status` is `Completed`.
  pub completed_at: Option<DateTime<Utc>>,
  pub created_at:   DateTime<Utc>,
  pub updated_at:   DateTime<Utc>,
}

/// The result of finalising an audit: the closed audit, the dossier with its
/// updated status, and — only for a `CONTEST` decision — the derived dispute.
#[derive(Debug, Clone, Serialize)]
pub struct FinalizeOutcome {
  pub audit:   Audit,
  pub dossier: Dossier,
  pub dispute: Option<Dispute>,
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn decision_parse_rejects_unknown_values() {
    assert!(matches!(
      AuditDecision::parse("MAYBE"),
      Err(Error::UnknownDecision(_))
    ));
    assert_eq!(AuditDecision::parse("CONTEST").unwrap(), AuditDecision::Contest);
  }

  #[test]
  fn ensure_open_rejects_completed_audit() {
    let id = Uuid::new_v4();
    assert!(AuditStatus::NotStarted.ensure_open(id).is_ok());
    assert!(AuditStatus::InProgress.ensure_open(id).is_ok());
    assert!(matches!(
      AuditStatus::Completed.ensure_open(id),
      Err(Error::AuditAlreadyCompleted(aid)) if aid == id
    ));
  }

  #[test]
  fn checklist_item_uses_camel_case_wire_keys() {
    let item = ChecklistItem {
      question:          "Réserves émises ?".into(),
      answer:            Some(true),
      comment:           String::new(),
      document_required: true,
      document_received: false,
    };
    let json = serde_json::to_value(&item).unwrap();
    assert!(json.get("documentRequired").is_some());
    assert!(json.get("documentReceived").is_some());
  }
}
