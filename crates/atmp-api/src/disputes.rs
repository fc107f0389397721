//! Handlers for `/disputes` endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/disputes` | All disputes, newest first |
//! | `GET`  | `/disputes/:id` | Single dispute |
//! | `POST` | `/disputes/:id/steps` | Record a jurisdiction step |
//! | `POST` | `/disputes/:id/actions` | Record a follow-up action; returns 201 |
//! | `GET`  | `/disputes/:id/actions` | Actions of a dispute, newest first |
//!
//! Disputes are never created here: they exist only as the outcome of a
//! `CONTEST` finalize on an audit.

use axum::{
  Json,
  extract::{Path, State},
  http::StatusCode,
  response::IntoResponse,
};
use atmp_core::{
  action::{Action, NewAction},
  dispute::{Dispute, Jurisdiction, JurisdictionStep},
  store::{BlobStore, CaseStore},
};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use uuid::Uuid;

use crate::{ApiState, error::ApiError};

/// `GET /disputes`
pub async fn list<S, B>(
  State(state): State<ApiState<S, B>>,
) -> Result<Json<Vec<Dispute>>, ApiError>
where
  S: CaseStore,
  B: BlobStore,
{
  let disputes =
    state.store.list_disputes().await.map_err(ApiError::backend)?;
  Ok(Json(disputes))
}

/// `GET /disputes/:id`
pub async fn get_one<S, B>(
  State(state): State<ApiState<S, B>>,
  Path(id): Path<Uuid>,
) -> Result<Json<Dispute>, ApiError>
where
  S: CaseStore,
  B: BlobStore,
{
  let dispute = state
    .store
    .get_dispute(id)
    .await
    .map_err(ApiError::backend)?
    .ok_or(atmp_core::Error::DisputeNotFound(id))?;
  Ok(Json(dispute))
}

// ─── Jurisdiction steps ──────────────────────────────────────────────────────

/// JSON body accepted by `POST /disputes/:id/steps`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StepBody {
  pub jurisdiction: Jurisdiction,
  /// Defaults to now.
  pub submitted_at: Option<DateTime<Utc>>,
  pub decision:     Option<String>,
  pub decision_at:  Option<DateTime<Utc>>,
  #[serde(default)]
  pub notes:        String,
}

/// `POST /disputes/:id/steps` — records (or overwrites) the step for one
/// jurisdiction stage, and returns the updated dispute.
pub async fn record_step<S, B>(
  State(state): State<ApiState<S, B>>,
  Path(id): Path<Uuid>,
  Json(body): Json<StepBody>,
) -> Result<Json<Dispute>, ApiError>
where
  S: CaseStore,
  B: BlobStore,
{
  let step = JurisdictionStep {
    jurisdiction: body.jurisdiction,
    submitted_at: body.submitted_at.unwrap_or_else(Utc::now),
    decision:     body.decision,
    decision_at:  body.decision_at,
    notes:        body.notes,
  };
  let dispute = state
    .store
    .record_jurisdiction_step(id, step)
    .await
    .map_err(ApiError::backend)?;
  Ok(Json(dispute))
}

// ─── Actions ─────────────────────────────────────────────────────────────────

/// `POST /disputes/:id/actions` — returns 201 + the stored [`Action`].
pub async fn record_action<S, B>(
  State(state): State<ApiState<S, B>>,
  Path(id): Path<Uuid>,
  Json(body): Json<NewAction>,
) -> Result<impl IntoResponse, ApiError>
where
  S: CaseStore,
  B: BlobStore,
{
  let action = state
    .store
    .record_action(id, body)
    .await
    .map_err(ApiError::backend)?;
  Ok((StatusCode::CREATED, Json(action)))
}

/// `GET /disputes/:id/actions`
pub async fn actions<S, B>(
  State(state): State<ApiState<S, B>>,
  Path(id): Path<Uuid>,
) -> Result<Json<Vec<Action>>, ApiError>
where
  S: CaseStore,
  B: BlobStore,
{
  let actions = state
    .store
    .actions_for_dispute(id)
    .await
    .map_err(ApiError::backend)?;
  Ok(Json(actions))
}
