//! Document types — uploaded files attached to a dispute.
//!
//! The core records metadata plus a blob-store handle; the bytes themselves
//! live in a [`crate::store::BlobStore`]. The recorded size is measured from
//! the uploaded content, never taken from caller claims.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{Error, Result};

// ─── Document type ───────────────────────────────────────────────────────────

/// The closed set of legal/medical document categories. Values are the
/// French-domain codes persisted by the system since its first version.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DocumentType {
  /// Déclaration d'accident du travail.
  Dat,
  CertificatMedical,
  ArretTravail,
  Temoignage,
  DecisionCpam,
  ExpertiseMedicale,
  LettreReserve,
  ContratTravail,
  FichePoste,
  RapportEnquete,
  NotificationTaux,
  Courrier,
  Autre,
}

impl DocumentType {
  pub fn as_str(self) -> &'static str {
    match self {
      Self::Dat => "DAT",
      Self::CertificatMedical => "CERTIFICAT_MEDICAL",
      Self::ArretTravail => "ARRET_TRAVAIL",
      Self::Temoignage => "TEMOIGNAGE",
      Self::DecisionCpam => "DECISION_CPAM",
      Self::ExpertiseMedicale => "EXPERTISE_MEDICALE",
      Self::LettreReserve => "LETTRE_RESERVE",
      Self::ContratTravail => "CONTRAT_TRAVAIL",
      Self::FichePoste => "FICHE_POSTE",
      Self::RapportEnquete => "RAPPORT_ENQUETE",
      Self::NotificationTaux => "NOTIFICATION_TAUX",
      Self::Courrier => "COURRIER",
      Self::Autre => "AUTRE",
    }
  }

  /// Membership check at the boundary — an unrecognised code is a
  /// validation error, not a storage fallback.
  pub fn parse(s: &str) -> Result<Self> {
    match s {
      "DAT" => Ok(Self::Dat),
      "CERTIFICAT_MEDICAL" => Ok(Self::CertificatMedical),
      "ARRET_TRAVAIL" => Ok(Self::ArretTravail),
      "TEMOIGNAGE" => Ok(Self::Temoignage),
      "DECISION_CPAM" => Ok(Self::DecisionCpam),
      "EXPERTISE_MEDICALE" => Ok(Self::ExpertiseMedicale),
      "LETTRE_RESERVE" => Ok(Self::LettreReserve),
      "CONTRAT_TRAVAIL" => Ok(Self::ContratTravail),
      "FICHE_POSTE" => Ok(Self::FichePoste),
      "RAPPORT_ENQUETE" => Ok(Self::RapportEnquete),
      "NOTIFICATION_TAUX" => Ok(Self::NotificationTaux),
      "COURRIER" => Ok(Self::Courrier),
      "AUTRE" => Ok(Self::Autre),
      other => Err(Error::UnknownDocumentType(other.to_owned())),
    }
  }
}

// ─── Blob handle ─────────────────────────────────────────────────────────────

/// Opaque key into the blob store. In practice a SHA-256 hex digest of the
/// content, which also deduplicates identical uploads.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BlobHandle(pub String);

impl BlobHandle {
  pub fn as_str(&self) -> &str { &self.0 }
}

// ─── Document ────────────────────────────────────────────────────────────────

/// Metadata for one uploaded file. Immutable after creation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
  pub document_id:   Uuid,
  pub dispute_id:    Uuid,
  pub uploaded_by:   Uuid,
  pub document_type: DocumentType,
  pub original_name: String,
  pub blob_handle:   BlobHandle,
  pub mime_type:     String,
  pub size_bytes:    u64,
  pub created_at:    DateTime<Utc>,
}

/// Input to [`crate::store::CaseStore::add_document`]. The blob must already
/// be written; `size_bytes` is the length of the stored content.
#[derive(Debug, Clone)]
pub struct NewDocument {
  pub dispute_id:    Uuid,
  pub uploaded_by:   Uuid,
  pub document_type: DocumentType,
  pub original_name: String,
  pub blob_handle:   BlobHandle,
  pub mime_type:     String,
  pub size_bytes:    u64,
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn document_type_round_trips_through_codes() {
    for t in [
      DocumentType::Dat,
      DocumentType::CertificatMedical,
      DocumentType::ArretTravail,
      DocumentType::Temoignage,
      DocumentType::DecisionCpam,
      DocumentType::ExpertiseMedicale,
      DocumentType::LettreReserve,
      DocumentType::ContratTravail,
      DocumentType::FichePoste,
      DocumentType::RapportEnquete,
      DocumentType::NotificationTaux,
      DocumentType::Courrier,
      DocumentType::Autre,
    ] {
      assert_eq!(DocumentType::parse(t.as_str()).unwrap(), t);
    }
  }

  #[test]
  fn unknown_document_type_is_a_validation_error() {
    let err = DocumentType::parse("SELFIE").unwrap_err();
    assert_eq!(err.kind(), crate::ErrorKind::Validation);
  }
}
