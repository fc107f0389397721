//! The `CaseStore` and `BlobStore` traits.
//!
//! `CaseStore` is implemented by storage backends (e.g. `atmp-store-sqlite`);
//! `BlobStore` by byte-content stores (e.g. `atmp-files`). Higher layers
//! depend on these abstractions, not on any concrete backend.
//!
//! All methods return `Send` futures so the traits can be used in
//! multi-threaded async runtimes (e.g. tokio with `axum`). Backend error
//! types must convert into [`crate::Error`] so transports can classify every
//! failure (validation / conflict / not-found / storage) uniformly.

use std::future::Future;

use bytes::Bytes;
use uuid::Uuid;

use crate::{
  action::{Action, NewAction},
  audit::{Audit, AuditDecision, ChecklistItem, FinalizeOutcome},
  document::{BlobHandle, Document, NewDocument},
  dispute::{Dispute, JurisdictionStep},
  dossier::{Dossier, NewDossier},
  user::{NewUser, User},
};

// ─── CaseStore ───────────────────────────────────────────────────────────────

/// Abstraction over a dossier/audit/dispute store backend.
///
/// Implementations must push the cross-entity uniqueness invariants (one
/// audit per dossier, one dispute per dossier, unique references) down to
/// the storage engine, and must run `finalize_audit` atomically: the audit
/// close, the dossier status transition, and the conditional dispute
/// creation all persist together or not at all.
pub trait CaseStore: Send + Sync {
  type Error: std::error::Error
    + Into<crate::Error>
    + Send
    + Sync
    + 'static;

  // ── Users ─────────────────────────────────────────────────────────────

  fn add_user(
    &self,
    input: NewUser,
  ) -> impl Future<Output = Result<User, Self::Error>> + Send + '_;

  fn get_user(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<User>, Self::Error>> + Send + '_;

  // ── Dossiers ──────────────────────────────────────────────────────────

  /// Validate `input`, assign a unique `DAT-` reference, and persist with
  /// status `TO_ANALYZE`.
  fn create_dossier(
    &self,
    input: NewDossier,
  ) -> impl Future<Output = Result<Dossier, Self::Error>> + Send + '_;

  fn get_dossier(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<Dossier>, Self::Error>> + Send + '_;

  /// All dossiers, newest first.
  fn list_dossiers(
    &self,
  ) -> impl Future<Output = Result<Vec<Dossier>, Self::Error>> + Send + '_;

  // ── Audits ────────────────────────────────────────────────────────────

  /// Open the review on a dossier: status `IN_PROGRESS`, empty checklist,
  /// `started_at = now`. Fails with a conflict if an audit already exists
  /// for the dossier.
  fn open_audit(
    &self,
    dossier_id: Uuid,
    auditor_id: Option<Uuid>,
  ) -> impl Future<Output = Result<Audit, Self::Error>> + Send + '_;

  fn get_audit(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<Audit>, Self::Error>> + Send + '_;

  fn audit_by_dossier(
    &self,
    dossier_id: Uuid,
  ) -> impl Future<Output = Result<Option<Audit>, Self::Error>> + Send + '_;

  /// Replace the checklist (and optionally the free-text comments) of an
  /// audit that is not yet completed. Replays with identical items yield
  /// identical state. No side effect on the dossier.
  fn update_checklist(
    &self,
    audit_id: Uuid,
    items: Vec<ChecklistItem>,
    comments: Option<String>,
  ) -> impl Future<Output = Result<Audit, Self::Error>> + Send + '_;

  /// The critical one-way transition. Closes the audit with `decision`,
  /// moves the owning dossier to `ANALYSIS_IN_PROGRESS`, and for a
  /// `CONTEST` decision derives the dispute — all in one transaction.
  /// A second call for the same audit fails with a conflict and changes
  /// nothing.
  fn finalize_audit(
    &self,
    audit_id: Uuid,
    decision: AuditDecision,
  ) -> impl Future<Output = Result<FinalizeOutcome, Self::Error>> + Send + '_;

  // ── Disputes ──────────────────────────────────────────────────────────

  fn get_dispute(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<Dispute>, Self::Error>> + Send + '_;

  fn dispute_by_dossier(
    &self,
    dossier_id: Uuid,
  ) -> impl Future<Output = Result<Option<Dispute>, Self::Error>> + Send + '_;

  /// All disputes, newest first.
  fn list_disputes(
    &self,
  ) -> impl Future<Output = Result<Vec<Dispute>, Self::Error>> + Send + '_;

  /// Record (or overwrite) the escalation step for one jurisdiction stage.
  fn record_jurisdiction_step(
    &self,
    dispute_id: Uuid,
    step: JurisdictionStep,
  ) -> impl Future<Output = Result<Dispute, Self::Error>> + Send + '_;

  // ── Actions ───────────────────────────────────────────────────────────

  /// Validate `input`, persist the action, and link it to the dispute.
  fn record_action(
    &self,
    dispute_id: Uuid,
    input: NewAction,
  ) -> impl Future<Output = Result<Action, Self::Error>> + Send + '_;

  /// Actions linked to a dispute, newest first.
  fn actions_for_dispute(
    &self,
    dispute_id: Uuid,
  ) -> impl Future<Output = Result<Vec<Action>, Self::Error>> + Send + '_;

  // ── Documents ─────────────────────────────────────────────────────────

  /// Record upload metadata. The blob must already be stored; the dispute
  /// and uploader ids are resolved here and produce not-found errors when
  /// dangling.
  fn add_document(
    &self,
    input: NewDocument,
  ) -> impl Future<Output = Result<Document, Self::Error>> + Send + '_;

  fn get_document(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<Document>, Self::Error>> + Send + '_;

  /// Documents of a dispute, newest first.
  fn documents_for_dispute(
    &self,
    dispute_id: Uuid,
  ) -> impl Future<Output = Result<Vec<Document>, Self::Error>> + Send + '_;
}

// ─── BlobStore ───────────────────────────────────────────────────────────────

/// Byte-content storage keyed by a generated handle.
///
/// Writes happen before (and outside) the metadata transaction, so a `put`
/// must be idempotent: storing the same content twice returns the same
/// handle and leaves one copy.
pub trait BlobStore: Send + Sync {
  type Error: std::error::Error
    + Into<crate::Error>
    + Send
    + Sync
    + 'static;

  fn put(
    &self,
    content: Bytes,
  ) -> impl Future<Output = Result<BlobHandle, Self::Error>> + Send + '_;

  fn get<'a>(
    &'a self,
    handle: &'a BlobHandle,
  ) -> impl Future<Output = Result<Option<Bytes>, Self::Error>> + Send + 'a;
}
