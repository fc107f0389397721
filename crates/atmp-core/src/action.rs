//! Action types — follow-up measures recorded against a dispute.
//!
//! An action is a free-form named measure (expert appointment, letter sent,
//! internal task) attached to the dispute it serves. Unlike documents an
//! action carries no content, only its name and an optional description.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{Error, Result};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Action {
  pub action_id:   Uuid,
  pub name:        String,
  pub description: Option<String>,
  pub created_at:  DateTime<Utc>,
  pub updated_at:  DateTime<Utc>,
}

/// Input to [`crate::store::CaseStore::record_action`].
#[derive(Debug, Clone, Deserialize)]
pub struct NewAction {
  pub name:        String,
  pub description: Option<String>,
}

impl NewAction {
  pub fn validate(&self) -> Result<()> {
    if self.name.trim().is_empty() {
      return Err(Error::MissingField("name"));
    }
    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn blank_name_is_rejected() {
    let action = NewAction { name: "  ".into(), description: None };
    assert!(matches!(
      action.validate(),
      Err(Error::MissingField("name"))
    ));

    let action = NewAction {
      name:        "Désignation d'un expert".into(),
      description: None,
    };
    assert!(action.validate().is_ok());
  }
}
