//! Encoding and decoding helpers between Rust domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! All timestamps are stored as RFC 3339 strings. Structured fields (company,
//! employee, accident, witnesses, checklist, jurisdiction steps) are stored
//! as compact JSON. UUIDs are stored as hyphenated lowercase strings. Enum
//! columns hold the domain's SCREAMING_SNAKE_CASE codes.

use std::collections::BTreeMap;

use atmp_core::{
  action::Action,
  audit::{Audit, AuditDecision, AuditStatus, ChecklistItem},
  dispute::{Dispute, DisputeStatus, DisputeSubject, Jurisdiction, JurisdictionStep},
  document::{BlobHandle, Document, DocumentType},
  dossier::{
    AccidentInfo, CompanyInfo, Dossier, DossierStatus, EmployeeInfo,
    ThirdParty, Witness,
  },
  user::{User, UserRole},
};
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::{Error, Result};

// ─── Uuid ─────────────────────────────────────────────────────────────────────

pub fn encode_uuid(id: Uuid) -> String { id.hyphenated().to_string() }

pub fn decode_uuid(s: &str) -> Result<Uuid> { Ok(Uuid::parse_str(s)?) }

// ─── DateTime<Utc> ───────────────────────────────────────────────────────────

pub fn encode_dt(dt: DateTime<Utc>) -> String { dt.to_rfc3339() }

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::Decode(format!("bad timestamp {s:?}: {e}")))
}

fn decode_dt_opt(s: Option<&str>) -> Result<Option<DateTime<Utc>>> {
  s.map(decode_dt).transpose()
}

// ─── Enum columns ────────────────────────────────────────────────────────────

pub fn decode_dossier_status(s: &str) -> Result<DossierStatus> {
  DossierStatus::parse(s)
    .ok_or_else(|| Error::Decode(format!("unknown dossier status: {s:?}")))
}

pub fn decode_audit_status(s: &str) -> Result<AuditStatus> {
  AuditStatus::parse(s)
    .ok_or_else(|| Error::Decode(format!("unknown audit status: {s:?}")))
}

pub fn decode_decision(s: &str) -> Result<AuditDecision> {
  AuditDecision::parse(s)
    .map_err(|_| Error::Decode(format!("unknown audit decision: {s:?}")))
}

pub fn decode_dispute_status(s: &str) -> Result<DisputeStatus> {
  DisputeStatus::parse(s)
    .ok_or_else(|| Error::Decode(format!("unknown dispute status: {s:?}")))
}

pub fn decode_document_type(s: &str) -> Result<DocumentType> {
  DocumentType::parse(s)
    .map_err(|_| Error::Decode(format!("unknown document type: {s:?}")))
}

pub fn decode_role(s: &str) -> Result<UserRole> {
  UserRole::parse(s)
    .ok_or_else(|| Error::Decode(format!("unknown user role: {s:?}")))
}

// ─── JSON columns ────────────────────────────────────────────────────────────

pub fn encode_json<T: serde::Serialize>(value: &T) -> Result<String> {
  Ok(serde_json::to_string(value)?)
}

pub fn decode_json<T: serde::de::DeserializeOwned>(s: &str) -> Result<T> {
  Ok(serde_json::from_str(s)?)
}

// ─── Row types ───────────────────────────────────────────────────────────────

/// Raw strings read directly from a `users` row.
pub struct RawUser {
  pub user_id:    String,
  pub name:       String,
  pub username:   String,
  pub email:      String,
  pub role:       String,
  pub created_at: String,
}

impl RawUser {
  pub fn into_user(self) -> Result<User> {
    Ok(User {
      user_id:    decode_uuid(&self.user_id)?,
      name:       self.name,
      username:   self.username,
      email:      self.email,
      role:       decode_role(&self.role)?,
      created_at: decode_dt(&self.created_at)?,
    })
  }
}

/// Raw strings read directly from a `dossiers` row.
pub struct RawDossier {
  pub dossier_id:       String,
  pub reference:        String,
  pub status:           String,
  pub created_by:       String,
  pub company_json:     String,
  pub employee_json:    String,
  pub accident_json:    String,
  pub witnesses_json:   String,
  pub third_party_json: Option<String>,
  pub health_service:   Option<String>,
  pub created_at:       String,
  pub updated_at:       String,
}

impl RawDossier {
  pub fn into_dossier(self) -> Result<Dossier> {
    let company: CompanyInfo = decode_json(&self.company_json)?;
    let employee: EmployeeInfo = decode_json(&self.employee_json)?;
    let accident: AccidentInfo = decode_json(&self.accident_json)?;
    let witnesses: Vec<Witness> = decode_json(&self.witnesses_json)?;
    let third_party: Option<ThirdParty> = self
      .third_party_json
      .as_deref()
      .map(decode_json)
      .transpose()?;

    Ok(Dossier {
      dossier_id: decode_uuid(&self.dossier_id)?,
      reference: self.reference,
      status: decode_dossier_status(&self.status)?,
      created_by: decode_uuid(&self.created_by)?,
      company,
      employee,
      accident,
      witnesses,
      third_party,
      health_service: self.health_service,
      created_at: decode_dt(&self.created_at)?,
      updated_at: decode_dt(&self.updated_at)?,
    })
  }
}

/// Raw strings read directly from an `audits` row.
pub struct RawAudit {
  pub audit_id:       String,
  pub dossier_id:     String,
  pub auditor_id:     Option<String>,
  pub status:         String,
  pub decision:       Option<String>,
  pub comments:       Option<String>,
  pub checklist_json: String,
  pub started_at:     Option<String>,
  pub completed_at:   Option<String>,
  pub created_at:     String,
  pub updated_at:     String,
}

impl RawAudit {
  pub fn into_audit(self) -> Result<Audit> {
    let checklist: Vec<ChecklistItem> = decode_json(&self.checklist_json)?;
    let decision = self.decision.as_deref().map(decode_decision).transpose()?;
    let auditor_id = self
      .auditor_id
      .as_deref()
      .map(decode_uuid)
      .transpose()?;

    Ok(Audit {
      audit_id: decode_uuid(&self.audit_id)?,
      dossier_id: decode_uuid(&self.dossier_id)?,
      auditor_id,
      status: decode_audit_status(&self.status)?,
      decision,
      comments: self.comments,
      checklist,
      started_at: decode_dt_opt(self.started_at.as_deref())?,
      completed_at: decode_dt_opt(self.completed_at.as_deref())?,
      created_at: decode_dt(&self.created_at)?,
      updated_at: decode_dt(&self.updated_at)?,
    })
  }
}

/// Raw strings read directly from a `disputes` row.
pub struct RawDispute {
  pub dispute_id:   String,
  pub dossier_id:   String,
  pub reference:    String,
  pub status:       String,
  pub subject_json: String,
  pub steps_json:   String,
  pub created_at:   String,
  pub updated_at:   String,
}

impl RawDispute {
  pub fn into_dispute(self) -> Result<Dispute> {
    let subject: DisputeSubject = decode_json(&self.subject_json)?;
    let steps: BTreeMap<Jurisdiction, JurisdictionStep> =
      decode_json(&self.steps_json)?;

    Ok(Dispute {
      dispute_id: decode_uuid(&self.dispute_id)?,
      dossier_id: decode_uuid(&self.dossier_id)?,
      reference: self.reference,
      status: decode_dispute_status(&self.status)?,
      subject,
      steps,
      created_at: decode_dt(&self.created_at)?,
      updated_at: decode_dt(&self.updated_at)?,
    })
  }
}

/// Raw strings read directly from an `actions` row.
pub struct RawAction {
  pub action_id:   String,
  pub name:        String,
  pub description: Option<String>,
  pub created_at:  String,
  pub updated_at:  String,
}

impl RawAction {
  pub fn into_action(self) -> Result<Action> {
    Ok(Action {
      action_id: decode_uuid(&self.action_id)?,
      name: self.name,
      description: self.description,
      created_at: decode_dt(&self.created_at)?,
      updated_at: decode_dt(&self.updated_at)?,
    })
  }
}

/// Raw strings read directly from a `documents` row.
pub struct RawDocument {
  pub document_id:   String,
  pub dispute_id:    String,
  pub uploaded_by:   String,
  pub document_type: String,
  pub original_name: String,
  pub blob_handle:   String,
  pub mime_type:     String,
  pub size_bytes:    i64,
  pub created_at:    String,
}

impl RawDocument {
  pub fn into_document(self) -> Result<Document> {
    Ok(Document {
      document_id: decode_uuid(&self.document_id)?,
      dispute_id: decode_uuid(&self.dispute_id)?,
      uploaded_by: decode_uuid(&self.uploaded_by)?,
      document_type: decode_document_type(&self.document_type)?,
      original_name: self.original_name,
      blob_handle: BlobHandle(self.blob_handle),
      mime_type: self.mime_type,
      size_bytes: self.size_bytes as u64,
      created_at: decode_dt(&self.created_at)?,
    })
  }
}
