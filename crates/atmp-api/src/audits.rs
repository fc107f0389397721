//! Handlers for the audit workflow endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `POST` | `/dossiers/:id/audit` | Open the audit; 409 if one exists |
//! | `GET`  | `/dossiers/:id/audit` | The dossier's audit |
//! | `GET`  | `/audits/:id` | Single audit |
//! | `PUT`  | `/audits/:id/checklist` | Replace checklist (+ comments) |
//! | `POST` | `/audits/:id/finalize` | One-way close; 201 when a dispute is derived, 200 otherwise |

use axum::{
  Json,
  extract::{Path, State},
  http::StatusCode,
  response::IntoResponse,
};
use atmp_core::{
  audit::{Audit, AuditDecision, ChecklistItem},
  store::{BlobStore, CaseStore},
};
use serde::Deserialize;
use uuid::Uuid;

use crate::{ApiState, error::ApiError};

// ─── Open ────────────────────────────────────────────────────────────────────

/// Optional JSON body accepted by `POST /dossiers/:id/audit`.
#[derive(Debug, Default, Deserialize)]
pub struct OpenAuditBody {
  pub auditor_id: Option<Uuid>,
}

/// `POST /dossiers/:id/audit` — returns 201 + the opened [`Audit`].
pub async fn open<S, B>(
  State(state): State<ApiState<S, B>>,
  Path(dossier_id): Path<Uuid>,
  body: Option<Json<OpenAuditBody>>,
) -> Result<impl IntoResponse, ApiError>
where
  S: CaseStore,
  B: BlobStore,
{
  let Json(body) = body.unwrap_or_default();
  let audit = state
    .store
    .open_audit(dossier_id, body.auditor_id)
    .await
    .map_err(ApiError::backend)?;
  Ok((StatusCode::CREATED, Json(audit)))
}

// ─── Get ─────────────────────────────────────────────────────────────────────

/// `GET /dossiers/:id/audit`
pub async fn by_dossier<S, B>(
  State(state): State<ApiState<S, B>>,
  Path(dossier_id): Path<Uuid>,
) -> Result<Json<Audit>, ApiError>
where
  S: CaseStore,
  B: BlobStore,
{
  let audit = state
    .store
    .audit_by_dossier(dossier_id)
    .await
    .map_err(ApiError::backend)?
    .ok_or(atmp_core::Error::NoAuditForDossier(dossier_id))?;
  Ok(Json(audit))
}

/// `GET /audits/:id`
pub async fn get_one<S, B>(
  State(state): State<ApiState<S, B>>,
  Path(id): Path<Uuid>,
) -> Result<Json<Audit>, ApiError>
where
  S: CaseStore,
  B: BlobStore,
{
  let audit = state
    .store
    .get_audit(id)
    .await
    .map_err(ApiError::backend)?
    .ok_or(atmp_core::Error::AuditNotFound(id))?;
  Ok(Json(audit))
}

// ─── Checklist ───────────────────────────────────────────────────────────────

/// JSON body accepted by `PUT /audits/:id/checklist`.
#[derive(Debug, Deserialize)]
pub struct ChecklistBody {
  pub items:    Vec<ChecklistItem>,
  pub comments: Option<String>,
}

/// `PUT /audits/:id/checklist` — full replacement, idempotent.
pub async fn update_checklist<S, B>(
  State(state): State<ApiState<S, B>>,
  Path(id): Path<Uuid>,
  Json(body): Json<ChecklistBody>,
) -> Result<Json<Audit>, ApiError>
where
  S: CaseStore,
  B: BlobStore,
{
  let audit = state
    .store
    .update_checklist(id, body.items, body.comments)
    .await
    .map_err(ApiError::backend)?;
  Ok(Json(audit))
}

// ─── Finalize ────────────────────────────────────────────────────────────────

/// JSON body accepted by `POST /audits/:id/finalize`.
#[derive(Debug, Deserialize)]
pub struct FinalizeBody {
  /// One of `CONTEST`, `DO_NOT_CONTEST`, `NEED_MORE_INFO`, `REFER_TO_EXPERT`.
  pub decision: String,
}

/// `POST /audits/:id/finalize`
///
/// Returns the [`FinalizeOutcome`](atmp_core::audit::FinalizeOutcome):
/// the closed audit, the dossier after its status transition, and — for a
/// `CONTEST` decision — the derived dispute. Status is `201` when a dispute
/// was created, `200` otherwise. A second call yields `409` and changes
/// nothing.
pub async fn finalize<S, B>(
  State(state): State<ApiState<S, B>>,
  Path(id): Path<Uuid>,
  Json(body): Json<FinalizeBody>,
) -> Result<impl IntoResponse, ApiError>
where
  S: CaseStore,
  B: BlobStore,
{
  let decision = AuditDecision::parse(&body.decision)?;
  let outcome = state
    .store
    .finalize_audit(id, decision)
    .await
    .map_err(ApiError::backend)?;

  let status = if outcome.dispute.is_some() {
    StatusCode::CREATED
  } else {
    StatusCode::OK
  };
  Ok((status, Json(outcome)))
}
