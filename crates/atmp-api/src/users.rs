//! Handlers for `/users` endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `POST` | `/users` | Body: [`NewUser`]; returns 201 + stored user |
//! | `GET`  | `/users/:id` | Single user |

use axum::{
  Json,
  extract::{Path, State},
  http::StatusCode,
  response::IntoResponse,
};
use atmp_core::{
  store::{BlobStore, CaseStore},
  user::{NewUser, User},
};
use uuid::Uuid;

use crate::{ApiState, error::ApiError};

/// `POST /users` — returns 201 + the stored [`User`].
pub async fn create<S, B>(
  State(state): State<ApiState<S, B>>,
  Json(body): Json<NewUser>,
) -> Result<impl IntoResponse, ApiError>
where
  S: CaseStore,
  B: BlobStore,
{
  let user = state.store.add_user(body).await.map_err(ApiError::backend)?;
  Ok((StatusCode::CREATED, Json(user)))
}

/// `GET /users/:id`
pub async fn get_one<S, B>(
  State(state): State<ApiState<S, B>>,
  Path(id): Path<Uuid>,
) -> Result<Json<User>, ApiError>
where
  S: CaseStore,
  B: BlobStore,
{
  let user = state
    .store
    .get_user(id)
    .await
    .map_err(ApiError::backend)?
    .ok_or(atmp_core::Error::UserNotFound(id))?;
  Ok(Json(user))
}
