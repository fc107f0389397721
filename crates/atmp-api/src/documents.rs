//! Handlers for `/documents` endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `POST` | `/documents` | Body: [`UploadBody`] with base64 content; returns 201 |
//! | `GET`  | `/documents/:id` | Upload metadata |
//! | `GET`  | `/documents/:id/download` | Raw bytes + content headers |
//! | `GET`  | `/disputes/:id/documents` | Documents of a dispute, newest first |
//!
//! Uploads write the blob first, then record the metadata row; a metadata
//! failure leaves an orphaned (content-addressed, so harmless) blob rather
//! than a dangling handle.

use axum::{
  Json,
  extract::{Path, State},
  http::{StatusCode, header},
  response::IntoResponse,
};
use atmp_core::{
  document::{Document, DocumentType, NewDocument},
  store::{BlobStore, CaseStore},
};
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as B64;
use bytes::Bytes;
use serde::Deserialize;
use uuid::Uuid;

use crate::{ApiState, error::ApiError};

// ─── Upload ──────────────────────────────────────────────────────────────────

/// JSON body accepted by `POST /documents`.
#[derive(Debug, Deserialize)]
pub struct UploadBody {
  pub dispute_id:     Uuid,
  pub uploaded_by:    Uuid,
  /// One of the document type codes, e.g. `CERTIFICAT_MEDICAL`.
  pub document_type:  String,
  pub original_name:  String,
  pub mime_type:      Option<String>,
  /// File content, standard base64.
  pub content_base64: String,
}

/// `POST /documents` — returns 201 + the stored [`Document`] metadata.
pub async fn upload<S, B>(
  State(state): State<ApiState<S, B>>,
  Json(body): Json<UploadBody>,
) -> Result<impl IntoResponse, ApiError>
where
  S: CaseStore,
  B: BlobStore,
{
  let document_type = DocumentType::parse(&body.document_type)?;
  let content = B64
    .decode(&body.content_base64)
    .map_err(|e| ApiError::BadRequest(format!("invalid base64 content: {e}")))?;
  let content = Bytes::from(content);
  let size_bytes = content.len() as u64;

  let blob_handle =
    state.blobs.put(content).await.map_err(ApiError::backend)?;

  let document = state
    .store
    .add_document(NewDocument {
      dispute_id: body.dispute_id,
      uploaded_by: body.uploaded_by,
      document_type,
      original_name: body.original_name,
      blob_handle,
      mime_type: body
        .mime_type
        .unwrap_or_else(|| "application/octet-stream".to_string()),
      size_bytes,
    })
    .await
    .map_err(ApiError::backend)?;

  Ok((StatusCode::CREATED, Json(document)))
}

// ─── Metadata ────────────────────────────────────────────────────────────────

/// `GET /documents/:id`
pub async fn get_one<S, B>(
  State(state): State<ApiState<S, B>>,
  Path(id): Path<Uuid>,
) -> Result<Json<Document>, ApiError>
where
  S: CaseStore,
  B: BlobStore,
{
  let document = state
    .store
    .get_document(id)
    .await
    .map_err(ApiError::backend)?
    .ok_or(atmp_core::Error::DocumentNotFound(id))?;
  Ok(Json(document))
}

/// `GET /disputes/:id/documents`
pub async fn for_dispute<S, B>(
  State(state): State<ApiState<S, B>>,
  Path(dispute_id): Path<Uuid>,
) -> Result<Json<Vec<Document>>, ApiError>
where
  S: CaseStore,
  B: BlobStore,
{
  let documents = state
    .store
    .documents_for_dispute(dispute_id)
    .await
    .map_err(ApiError::backend)?;
  Ok(Json(documents))
}

// ─── Download ────────────────────────────────────────────────────────────────

/// `GET /documents/:id/download` — the original bytes, with the stored mime
/// type and an attachment disposition carrying the original filename.
pub async fn download<S, B>(
  State(state): State<ApiState<S, B>>,
  Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError>
where
  S: CaseStore,
  B: BlobStore,
{
  let document = state
    .store
    .get_document(id)
    .await
    .map_err(ApiError::backend)?
    .ok_or(atmp_core::Error::DocumentNotFound(id))?;

  let content = state
    .blobs
    .get(&document.blob_handle)
    .await
    .map_err(ApiError::backend)?
    .ok_or(atmp_core::Error::DocumentNotFound(id))?;

  // Quotes and control characters are stripped so the filename cannot break
  // out of the header value.
  let filename: String = document
    .original_name
    .chars()
    .filter(|c| !c.is_control() && *c != '"')
    .collect();

  Ok((
    [
      (header::CONTENT_TYPE, document.mime_type),
      (
        header::CONTENT_DISPOSITION,
        format!("attachment; filename=\"{filename}\""),
      ),
    ],
    content,
  ))
}
