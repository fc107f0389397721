//! Reference string generation for dossiers and disputes.
//!
//! The persisted formats are `DAT-<unix-epoch-seconds>` and
//! `CONT-<unix-epoch-seconds>` and must stay bit-compatible with existing
//! data. Epoch seconds alone collide under rapid creation, so the store
//! retries a colliding insert with a random hex suffix appended; the prefix
//! convention is preserved either way.

use chrono::{DateTime, Utc};

/// Which entity a reference names; determines the prefix.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReferenceKind {
  Dossier,
  Dispute,
}

impl ReferenceKind {
  fn prefix(self) -> &'static str {
    match self {
      Self::Dossier => "DAT",
      Self::Dispute => "CONT",
    }
  }

  /// The plain, first-attempt form: `<prefix>-<epoch-seconds>`.
  pub fn generate(self, at: DateTime<Utc>) -> String {
    format!("{}-{}", self.prefix(), at.timestamp())
  }

  /// The collision-retry form: `<prefix>-<epoch-seconds>-<hex suffix>`.
  pub fn generate_with_suffix(self, at: DateTime<Utc>, suffix: &str) -> String {
    format!("{}-{}-{}", self.prefix(), at.timestamp(), suffix)
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use chrono::TimeZone;

  #[test]
  fn plain_references_match_the_persisted_format() {
    let at = Utc.timestamp_opt(1_700_000_000, 0).unwrap();
    assert_eq!(ReferenceKind::Dossier.generate(at), "DAT-1700000000");
    assert_eq!(ReferenceKind::Dispute.generate(at), "CONT-1700000000");
  }

  #[test]
  fn suffixed_references_keep_the_prefix_convention() {
    let at = Utc.timestamp_opt(1_700_000_000, 0).unwrap();
    let r = ReferenceKind::Dispute.generate_with_suffix(at, "a1b2c3d4");
    assert_eq!(r, "CONT-1700000000-a1b2c3d4");
    assert!(r.starts_with("CONT-"));
  }
}
