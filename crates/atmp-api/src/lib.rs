//! JSON REST API for the AT/MP dispute tracker.
//!
//! Exposes an axum [`Router`] generic over any
//! [`atmp_core::store::CaseStore`] and [`atmp_core::store::BlobStore`].
//! Auth, TLS, and transport concerns are the caller's responsibility.
//!
//! # Mounting
//!
//! ```rust,ignore
//! .nest("/api", atmp_api::api_router(store, blobs))
//! ```

pub mod audits;
pub mod disputes;
pub mod documents;
pub mod dossiers;
pub mod error;
pub mod users;

use std::sync::Arc;

use axum::{
  Router,
  routing::{get, post, put},
};
use atmp_core::store::{BlobStore, CaseStore};

pub use error::ApiError;

/// Shared handler state: the case store plus the blob store.
pub struct ApiState<S, B> {
  pub store: Arc<S>,
  pub blobs: Arc<B>,
}

// Derived `Clone` would require `S: Clone` and `B: Clone`; the `Arc`s clone
// regardless.
impl<S, B> Clone for ApiState<S, B> {
  fn clone(&self) -> Self {
    Self {
      store: Arc::clone(&self.store),
      blobs: Arc::clone(&self.blobs),
    }
  }
}

/// Build a fully-materialised API router for `store` and `blobs`.
///
/// The returned `Router<()>` can be nested into any parent router regardless
/// of its own state type.
pub fn api_router<S, B>(store: Arc<S>, blobs: Arc<B>) -> Router<()>
where
  S: CaseStore + 'static,
  B: BlobStore + 'static,
{
  Router::new()
    // Users
    .route("/users", post(users::create::<S, B>))
    .route("/users/{id}", get(users::get_one::<S, B>))
    // Dossiers
    .route(
      "/dossiers",
      get(dossiers::list::<S, B>).post(dossiers::create::<S, B>),
    )
    .route("/dossiers/{id}", get(dossiers::get_one::<S, B>))
    // Audit workflow
    .route(
      "/dossiers/{id}/audit",
      get(audits::by_dossier::<S, B>).post(audits::open::<S, B>),
    )
    .route("/audits/{id}", get(audits::get_one::<S, B>))
    .route("/audits/{id}/checklist", put(audits::update_checklist::<S, B>))
    .route("/audits/{id}/finalize", post(audits::finalize::<S, B>))
    // Disputes
    .route("/disputes", get(disputes::list::<S, B>))
    .route("/disputes/{id}", get(disputes::get_one::<S, B>))
    .route("/disputes/{id}/steps", post(disputes::record_step::<S, B>))
    .route(
      "/disputes/{id}/actions",
      get(disputes::actions::<S, B>).post(disputes::record_action::<S, B>),
    )
    .route("/disputes/{id}/documents", get(documents::for_dispute::<S, B>))
    // Documents
    .route("/documents", post(documents::upload::<S, B>))
    .route("/documents/{id}", get(documents::get_one::<S, B>))
    .route("/documents/{id}/download", get(documents::download::<S, B>))
    .with_state(ApiState { store, blobs })
}
