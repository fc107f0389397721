//! Dossier types — the workplace-accident case record that anchors the
//! audit → dispute workflow.
//!
//! A dossier owns at most one audit and at most one dispute; both
//! constraints are enforced at the store level, not here.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{Error, Result};

// ─── Status ──────────────────────────────────────────────────────────────────

/// Lifecycle status of a dossier. The set is fixed by the domain; several
/// terminal values exist only as extension points and are never produced by
/// the core workflow today.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DossierStatus {
  ToAnalyze,
  AnalysisInProgress,
  ContestRecommended,
  ContestNotRecommended,
  ClosedNoAction,
  ConvertedToDispute,
}

impl DossierStatus {
  pub fn as_str(self) -> &'static str {
    match self {
      Self::ToAnalyze => "TO_ANALYZE",
      Self::AnalysisInProgress => "ANALYSIS_IN_PROGRESS",
      Self::ContestRecommended => "CONTEST_RECOMMENDED",
      Self::ContestNotRecommended => "CONTEST_NOT_RECOMMENDED",
      Self::ClosedNoAction => "CLOSED_NO_ACTION",
      Self::ConvertedToDispute => "CONVERTED_TO_DISPUTE",
    }
  }

  pub fn parse(s: &str) -> Option<Self> {
    match s {
      "TO_ANALYZE" => Some(Self::ToAnalyze),
      "ANALYSIS_IN_PROGRESS" => Some(Self::AnalysisInProgress),
      "CONTEST_RECOMMENDED" => Some(Self::ContestRecommended),
      "CONTEST_NOT_RECOMMENDED" => Some(Self::ContestNotRecommended),
      "CLOSED_NO_ACTION" => Some(Self::ClosedNoAction),
      "CONVERTED_TO_DISPUTE" => Some(Self::ConvertedToDispute),
      _ => None,
    }
  }

  /// Status transition driven by the audit workflow. A transition to the
  /// current status is a no-op, not an error; returns `None` so the caller
  /// can skip the write.
  pub fn transition(self, next: DossierStatus) -> Option<DossierStatus> {
    if self == next { None } else { Some(next) }
  }
}

// ─── Structured sub-records ──────────────────────────────────────────────────

/// The employer involved in the accident.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompanyInfo {
  pub name:    String,
  /// French company registration number.
  pub siret:   String,
  pub address: String,
}

/// The injured employee.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmployeeInfo {
  pub first_name:             String,
  pub last_name:              String,
  pub job_title:              Option<String>,
  pub social_security_number: Option<String>,
}

/// The accident itself.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccidentInfo {
  pub date:         NaiveDate,
  pub time:         Option<String>,
  pub location:     String,
  pub description:  String,
  pub injury_nature: Option<String>,
}

/// A witness to the accident.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Witness {
  pub name:    String,
  pub contact: Option<String>,
}

/// A third party involved in the accident (another driver, a subcontractor,
/// etc.), when one exists.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ThirdParty {
  pub name:         Option<String>,
  pub address:      Option<String>,
  pub insurance:    Option<String>,
  pub registration: Option<String>,
}

// ─── Dossier ─────────────────────────────────────────────────────────────────

/// A workplace-accident case record. The `reference` is the stable external
/// identifier (`DAT-<epoch>`); the UUID is internal.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Dossier {
  pub dossier_id:     Uuid,
  pub reference:      String,
  pub status:         DossierStatus,
  pub created_by:     Uuid,
  pub company:        CompanyInfo,
  pub employee:       EmployeeInfo,
  pub accident:       AccidentInfo,
  pub witnesses:      Vec<Witness>,
  pub third_party:    Option<ThirdParty>,
  pub health_service: Option<String>,
  pub created_at:     DateTime<Utc>,
  pub updated_at:     DateTime<Utc>,
}

/// Input to [`crate::store::CaseStore::create_dossier`]. The reference,
/// status, and timestamps are assigned by the store.
#[derive(Debug, Clone, Deserialize)]
pub struct NewDossier {
  pub created_by:     Uuid,
  pub company:        CompanyInfo,
  pub employee:       EmployeeInfo,
  pub accident:       AccidentInfo,
  #[serde(default)]
  pub witnesses:      Vec<Witness>,
  pub third_party:    Option<ThirdParty>,
  pub health_service: Option<String>,
}

impl NewDossier {
  /// Reject structurally-present but empty required fields before any
  /// mutation happens.
  pub fn validate(&self) -> Result<()> {
    if self.company.name.trim().is_empty() {
      return Err(Error::MissingField("company.name"));
    }
    if self.company.siret.trim().is_empty() {
      return Err(Error::MissingField("company.siret"));
    }
    if self.employee.first_name.trim().is_empty() {
      return Err(Error::MissingField("employee.first_name"));
    }
    if self.employee.last_name.trim().is_empty() {
      return Err(Error::MissingField("employee.last_name"));
    }
    if self.accident.location.trim().is_empty() {
      return Err(Error::MissingField("accident.location"));
    }
    if self.accident.description.trim().is_empty() {
      return Err(Error::MissingField("accident.description"));
    }
    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn status_round_trips_through_strings() {
    for s in [
      DossierStatus::ToAnalyze,
      DossierStatus::AnalysisInProgress,
      DossierStatus::ContestRecommended,
      DossierStatus::ContestNotRecommended,
      DossierStatus::ClosedNoAction,
      DossierStatus::ConvertedToDispute,
    ] {
      assert_eq!(DossierStatus::parse(s.as_str()), Some(s));
    }
    assert_eq!(DossierStatus::parse("A_ANALYSER"), None);
  }

  #[test]
  fn transition_to_same_status_is_noop() {
    let s = DossierStatus::AnalysisInProgress;
    assert_eq!(s.transition(DossierStatus::AnalysisInProgress), None);
    assert_eq!(
      s.transition(DossierStatus::ClosedNoAction),
      Some(DossierStatus::ClosedNoAction)
    );
  }
}
