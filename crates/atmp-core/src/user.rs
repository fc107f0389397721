//! User records — the actors referenced by dossiers, audits, and documents.
//!
//! Credential management and session handling live outside this system; the
//! store only keeps enough identity to resolve a caller-supplied actor id.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The role an actor holds. Authorization policy is the caller's concern;
/// the role is recorded verbatim.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum UserRole {
  Admin,
  Juriste,
  Rh,
  Manager,
}

impl UserRole {
  pub fn as_str(self) -> &'static str {
    match self {
      Self::Admin => "ADMIN",
      Self::Juriste => "JURISTE",
      Self::Rh => "RH",
      Self::Manager => "MANAGER",
    }
  }

  pub fn parse(s: &str) -> Option<Self> {
    match s {
      "ADMIN" => Some(Self::Admin),
      "JURISTE" => Some(Self::Juriste),
      "RH" => Some(Self::Rh),
      "MANAGER" => Some(Self::Manager),
      _ => None,
    }
  }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
  pub user_id:    Uuid,
  pub name:       String,
  pub username:   String,
  pub email:      String,
  pub role:       UserRole,
  pub created_at: DateTime<Utc>,
}

/// Input to [`crate::store::CaseStore::add_user`].
#[derive(Debug, Clone, Deserialize)]
pub struct NewUser {
  pub name:     String,
  pub username: String,
  pub email:    String,
  pub role:     UserRole,
}
