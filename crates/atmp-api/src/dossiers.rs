//! Handlers for `/dossiers` endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/dossiers` | All dossiers, newest first |
//! | `GET`  | `/dossiers/:id` | Single dossier |
//! | `POST` | `/dossiers` | Body: [`NewDossier`]; returns 201 + stored dossier |
//!
//! The `DAT-` reference and the initial `TO_ANALYZE` status are assigned
//! server-side; the body never carries them.

use axum::{
  Json,
  extract::{Path, State},
  http::StatusCode,
  response::IntoResponse,
};
use atmp_core::{
  dossier::{Dossier, NewDossier},
  store::{BlobStore, CaseStore},
};
use uuid::Uuid;

use crate::{ApiState, error::ApiError};

/// `GET /dossiers`
pub async fn list<S, B>(
  State(state): State<ApiState<S, B>>,
) -> Result<Json<Vec<Dossier>>, ApiError>
where
  S: CaseStore,
  B: BlobStore,
{
  let dossiers =
    state.store.list_dossiers().await.map_err(ApiError::backend)?;
  Ok(Json(dossiers))
}

/// `GET /dossiers/:id`
pub async fn get_one<S, B>(
  State(state): State<ApiState<S, B>>,
  Path(id): Path<Uuid>,
) -> Result<Json<Dossier>, ApiError>
where
  S: CaseStore,
  B: BlobStore,
{
  let dossier = state
    .store
    .get_dossier(id)
    .await
    .map_err(ApiError::backend)?
    .ok_or(atmp_core::Error::DossierNotFound(id))?;
  Ok(Json(dossier))
}

/// `POST /dossiers` — returns 201 + the stored [`Dossier`].
pub async fn create<S, B>(
  State(state): State<ApiState<S, B>>,
  Json(body): Json<NewDossier>,
) -> Result<impl IntoResponse, ApiError>
where
  S: CaseStore,
  B: BlobStore,
{
  let dossier =
    state.store.create_dossier(body).await.map_err(ApiError::backend)?;
  Ok((StatusCode::CREATED, Json(dossier)))
}
