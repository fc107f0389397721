//! [`SqliteStore`] — the SQLite implementation of [`CaseStore`].
//!
//! Domain preconditions (audit already closed, dispute already present) are
//! checked inside the same connection call that performs the write, and the
//! finalize transition runs under an explicit transaction so the audit
//! close, the dossier status change, and the dispute creation persist
//! together or not at all.

use std::path::Path;

use chrono::Utc;
use rand_core::{OsRng, RngCore};
use rusqlite::OptionalExtension as _;
use uuid::Uuid;

use atmp_core::{
  Error as CoreError,
  action::{Action, NewAction},
  audit::{Audit, AuditDecision, AuditStatus, ChecklistItem, FinalizeOutcome},
  dispute::{Dispute, DisputeStatus, DisputeSubject, Jurisdiction, JurisdictionStep},
  document::{Document, NewDocument},
  dossier::{Dossier, DossierStatus, NewDossier},
  reference::ReferenceKind,
  store::CaseStore,
  user::{NewUser, User},
};

use crate::{
  Error, Result,
  encode::{
    RawAction, RawAudit, RawDispute, RawDocument, RawDossier, RawUser,
    decode_audit_status, decode_dossier_status, encode_dt, encode_json,
    encode_uuid,
  },
  schema::SCHEMA,
};

// ─── Row helpers ─────────────────────────────────────────────────────────────

const USER_COLS: &str = "user_id, name, username, email, role, created_at";

const DOSSIER_COLS: &str = "dossier_id, reference, status, created_by, \
   company_json, employee_json, accident_json, witnesses_json, \
   third_party_json, health_service, created_at, updated_at";

const AUDIT_COLS: &str = "audit_id, dossier_id, auditor_id, status, decision, \
   comments, checklist_json, started_at, completed_at, created_at, updated_at";

const DISPUTE_COLS: &str = "dispute_id, dossier_id, reference, status, \
   subject_json, steps_json, created_at, updated_at";

const ACTION_COLS: &str =
  "action_id, name, description, created_at, updated_at";

const DOCUMENT_COLS: &str = "document_id, dispute_id, uploaded_by, \
   document_type, original_name, blob_handle, mime_type, size_bytes, \
   created_at";

fn user_from_row(row: &rusqlite::Row) -> rusqlite::Result<RawUser> {
  Ok(RawUser {
    user_id:    row.get(0)?,
    name:       row.get(1)?,
    username:   row.get(2)?,
    email:      row.get(3)?,
    role:       row.get(4)?,
    created_at: row.get(5)?,
  })
}

fn dossier_from_row(row: &rusqlite::Row) -> rusqlite::Result<RawDossier> {
  Ok(RawDossier {
    dossier_id:       row.get(0)?,
    reference:        row.get(1)?,
    status:           row.get(2)?,
    created_by:       row.get(3)?,
    company_json:     row.get(4)?,
    employee_json:    row.get(5)?,
    accident_json:    row.get(6)?,
    witnesses_json:   row.get(7)?,
    third_party_json: row.get(8)?,
    health_service:   row.get(9)?,
    created_at:       row.get(10)?,
    updated_at:       row.get(11)?,
  })
}

fn audit_from_row(row: &rusqlite::Row) -> rusqlite::Result<RawAudit> {
  Ok(RawAudit {
    audit_id:       row.get(0)?,
    dossier_id:     row.get(1)?,
    auditor_id:     row.get(2)?,
    status:         row.get(3)?,
    decision:       row.get(4)?,
    comments:       row.get(5)?,
    checklist_json: row.get(6)?,
    started_at:     row.get(7)?,
    completed_at:   row.get(8)?,
    created_at:     row.get(9)?,
    updated_at:     row.get(10)?,
  })
}

fn dispute_from_row(row: &rusqlite::Row) -> rusqlite::Result<RawDispute> {
  Ok(RawDispute {
    dispute_id:   row.get(0)?,
    dossier_id:   row.get(1)?,
    reference:    row.get(2)?,
    status:       row.get(3)?,
    subject_json: row.get(4)?,
    steps_json:   row.get(5)?,
    created_at:   row.get(6)?,
    updated_at:   row.get(7)?,
  })
}

fn action_from_row(row: &rusqlite::Row) -> rusqlite::Result<RawAction> {
  Ok(RawAction {
    action_id:   row.get(0)?,
    name:        row.get(1)?,
    description: row.get(2)?,
    created_at:  row.get(3)?,
    updated_at:  row.get(4)?,
  })
}

fn document_from_row(row: &rusqlite::Row) -> rusqlite::Result<RawDocument> {
  Ok(RawDocument {
    document_id:   row.get(0)?,
    dispute_id:    row.get(1)?,
    uploaded_by:   row.get(2)?,
    document_type: row.get(3)?,
    original_name: row.get(4)?,
    blob_handle:   row.get(5)?,
    mime_type:     row.get(6)?,
    size_bytes:    row.get(7)?,
    created_at:    row.get(8)?,
  })
}

fn row_exists(
  conn: &rusqlite::Connection,
  sql: &str,
  id: &str,
) -> rusqlite::Result<bool> {
  Ok(
    conn
      .query_row(sql, rusqlite::params![id], |_| Ok(true))
      .optional()?
      .unwrap_or(false),
  )
}

/// True when `err` is a UNIQUE-constraint failure mentioning `needle`
/// (e.g. `"dossiers.reference"`).
fn unique_violation(err: &rusqlite::Error, needle: &str) -> bool {
  match err {
    rusqlite::Error::SqliteFailure(e, Some(msg)) => {
      e.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
        && msg.contains(needle)
    }
    _ => false,
  }
}

/// 8 hex chars from the OS RNG, used to disambiguate colliding references.
fn random_suffix() -> String {
  let mut buf = [0u8; 4];
  OsRng.fill_bytes(&mut buf);
  hex::encode(buf)
}

// ─── Store ───────────────────────────────────────────────────────────────────

/// An AT/MP case store backed by a single SQLite file.
///
/// Cloning is cheap — the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store — useful for testing.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }
}

// ─── CaseStore impl ──────────────────────────────────────────────────────────

impl CaseStore for SqliteStore {
  type Error = Error;

  // ── Users ─────────────────────────────────────────────────────────────────

  async fn add_user(&self, input: NewUser) -> Result<User> {
    let user = User {
      user_id:    Uuid::new_v4(),
      name:       input.name,
      username:   input.username,
      email:      input.email,
      role:       input.role,
      created_at: Utc::now(),
    };

    let id_str   = encode_uuid(user.user_id);
    let name     = user.name.clone();
    let username = user.username.clone();
    let email    = user.email.clone();
    let role     = user.role.as_str();
    let at_str   = encode_dt(user.created_at);

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO users (user_id, name, username, email, role, created_at)
           VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
          rusqlite::params![id_str, name, username, email, role, at_str],
        )?;
        Ok(())
      })
      .await?;

    Ok(user)
  }

  async fn get_user(&self, id: Uuid) -> Result<Option<User>> {
    let id_str = encode_uuid(id);

    let raw: Option<RawUser> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              &format!("SELECT {USER_COLS} FROM users WHERE user_id = ?1"),
              rusqlite::params![id_str],
              user_from_row,
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawUser::into_user).transpose()
  }

  // ── Dossiers ──────────────────────────────────────────────────────────────

  async fn create_dossier(&self, input: NewDossier) -> Result<Dossier> {
    input.validate().map_err(Error::Core)?;

    let now = Utc::now();
    let dossier_id = Uuid::new_v4();

    let id_str        = encode_uuid(dossier_id);
    let creator_str   = encode_uuid(input.created_by);
    let reference     = ReferenceKind::Dossier.generate(now);
    let retry_ref     = ReferenceKind::Dossier
      .generate_with_suffix(now, &random_suffix());
    let status        = DossierStatus::ToAnalyze.as_str();
    let company_json  = encode_json(&input.company)?;
    let employee_json = encode_json(&input.employee)?;
    let accident_json = encode_json(&input.accident)?;
    let witness_json  = encode_json(&input.witnesses)?;
    let third_json    = input
      .third_party
      .as_ref()
      .map(encode_json)
      .transpose()?;
    let health        = input.health_service.clone();
    let at_str        = encode_dt(now);
    let created_by    = input.created_by;

    let payload: std::result::Result<RawDossier, CoreError> = self
      .conn
      .call(move |conn| {
        if !row_exists(
          conn,
          "SELECT 1 FROM users WHERE user_id = ?1",
          &creator_str,
        )? {
          return Ok(Err(CoreError::UserNotFound(created_by)));
        }

        let insert = |reference: &str| {
          conn.execute(
            "INSERT INTO dossiers (
               dossier_id, reference, status, created_by,
               company_json, employee_json, accident_json, witnesses_json,
               third_party_json, health_service, created_at, updated_at
             ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?11)",
            rusqlite::params![
              id_str,
              reference,
              status,
              creator_str,
              company_json,
              employee_json,
              accident_json,
              witness_json,
              third_json,
              health,
              at_str,
            ],
          )
        };

        // Epoch-second references collide under rapid creation; the UNIQUE
        // index surfaces the collision and one retry with a random suffix
        // resolves it.
        match insert(&reference) {
          Ok(_) => {}
          Err(e) if unique_violation(&e, "dossiers.reference") => {
            insert(&retry_ref)?;
          }
          Err(e) => return Err(e.into()),
        }

        let raw = conn.query_row(
          &format!("SELECT {DOSSIER_COLS} FROM dossiers WHERE dossier_id = ?1"),
          rusqlite::params![id_str],
          dossier_from_row,
        )?;
        Ok(Ok(raw))
      })
      .await?;

    let raw = payload.map_err(Error::Core)?;
    let dossier = raw.into_dossier()?;
    tracing::info!(reference = %dossier.reference, "dossier created");
    Ok(dossier)
  }

  async fn get_dossier(&self, id: Uuid) -> Result<Option<Dossier>> {
    let id_str = encode_uuid(id);

    let raw: Option<RawDossier> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              &format!(
                "SELECT {DOSSIER_COLS} FROM dossiers WHERE dossier_id = ?1"
              ),
              rusqlite::params![id_str],
              dossier_from_row,
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawDossier::into_dossier).transpose()
  }

  async fn list_dossiers(&self) -> Result<Vec<Dossier>> {
    let raws: Vec<RawDossier> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {DOSSIER_COLS} FROM dossiers ORDER BY created_at DESC"
        ))?;
        let rows = stmt
          .query_map([], dossier_from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawDossier::into_dossier).collect()
  }

  // ── Audits ────────────────────────────────────────────────────────────────

  async fn open_audit(
    &self,
    dossier_id: Uuid,
    auditor_id: Option<Uuid>,
  ) -> Result<Audit> {
    let now = Utc::now();
    let audit_id = Uuid::new_v4();

    let audit_id_str   = encode_uuid(audit_id);
    let dossier_id_str = encode_uuid(dossier_id);
    let auditor_str    = auditor_id.map(encode_uuid);
    let status         = AuditStatus::InProgress.as_str();
    let at_str         = encode_dt(now);

    let payload: std::result::Result<RawAudit, CoreError> = self
      .conn
      .call(move |conn| {
        if !row_exists(
          conn,
          "SELECT 1 FROM dossiers WHERE dossier_id = ?1",
          &dossier_id_str,
        )? {
          return Ok(Err(CoreError::DossierNotFound(dossier_id)));
        }
        if let Some(a) = &auditor_str
          && !row_exists(conn, "SELECT 1 FROM users WHERE user_id = ?1", a)?
        {
          return Ok(Err(CoreError::UserNotFound(
            auditor_id.unwrap_or_default(),
          )));
        }

        // The UNIQUE constraint on audits.dossier_id is the authoritative
        // one-audit-per-dossier guard; a lost race shows up here.
        let inserted = conn.execute(
          "INSERT INTO audits (
             audit_id, dossier_id, auditor_id, status, checklist_json,
             started_at, created_at, updated_at
           ) VALUES (?1, ?2, ?3, ?4, '[]', ?5, ?5, ?5)",
          rusqlite::params![
            audit_id_str,
            dossier_id_str,
            auditor_str,
            status,
            at_str,
          ],
        );
        match inserted {
          Ok(_) => {}
          Err(e) if unique_violation(&e, "audits.dossier_id") => {
            return Ok(Err(CoreError::AuditAlreadyExists(dossier_id)));
          }
          Err(e) => return Err(e.into()),
        }

        let raw = conn.query_row(
          &format!("SELECT {AUDIT_COLS} FROM audits WHERE audit_id = ?1"),
          rusqlite::params![audit_id_str],
          audit_from_row,
        )?;
        Ok(Ok(raw))
      })
      .await?;

    let audit = payload.map_err(Error::Core)?.into_audit()?;
    tracing::info!(audit_id = %audit.audit_id, dossier_id = %dossier_id, "audit opened");
    Ok(audit)
  }

  async fn get_audit(&self, id: Uuid) -> Result<Option<Audit>> {
    let id_str = encode_uuid(id);

    let raw: Option<RawAudit> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              &format!("SELECT {AUDIT_COLS} FROM audits WHERE audit_id = ?1"),
              rusqlite::params![id_str],
              audit_from_row,
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawAudit::into_audit).transpose()
  }

  async fn audit_by_dossier(&self, dossier_id: Uuid) -> Result<Option<Audit>> {
    let id_str = encode_uuid(dossier_id);

    let raw: Option<RawAudit> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              &format!("SELECT {AUDIT_COLS} FROM audits WHERE dossier_id = ?1"),
              rusqlite::params![id_str],
              audit_from_row,
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawAudit::into_audit).transpose()
  }

  async fn update_checklist(
    &self,
    audit_id: Uuid,
    items: Vec<ChecklistItem>,
    comments: Option<String>,
  ) -> Result<Audit> {
    let id_str         = encode_uuid(audit_id);
    let checklist_json = encode_json(&items)?;
    let now_str        = encode_dt(Utc::now());

    let payload: std::result::Result<RawAudit, CoreError> = self
      .conn
      .call(move |conn| {
        let raw = conn
          .query_row(
            &format!("SELECT {AUDIT_COLS} FROM audits WHERE audit_id = ?1"),
            rusqlite::params![id_str],
            audit_from_row,
          )
          .optional()?;
        let Some(raw) = raw else {
          return Ok(Err(CoreError::AuditNotFound(audit_id)));
        };
        if let Err(e) = decode_audit_status(&raw.status)
          .map_err(atmp_core::Error::from)
          .and_then(|s| s.ensure_open(audit_id))
        {
          return Ok(Err(e));
        }

        match &comments {
          Some(c) => {
            conn.execute(
              "UPDATE audits SET checklist_json = ?1, comments = ?2,
                 updated_at = ?3 WHERE audit_id = ?4",
              rusqlite::params![checklist_json, c, now_str, id_str],
            )?;
          }
          None => {
            conn.execute(
              "UPDATE audits SET checklist_json = ?1, updated_at = ?2
                 WHERE audit_id = ?3",
              rusqlite::params![checklist_json, now_str, id_str],
            )?;
          }
        }

        let raw = conn.query_row(
          &format!("SELECT {AUDIT_COLS} FROM audits WHERE audit_id = ?1"),
          rusqlite::params![id_str],
          audit_from_row,
        )?;
        Ok(Ok(raw))
      })
      .await?;

    payload.map_err(Error::Core)?.into_audit()
  }

  async fn finalize_audit(
    &self,
    audit_id: Uuid,
    decision: AuditDecision,
  ) -> Result<FinalizeOutcome> {
    let now = Utc::now();
    let now_str      = encode_dt(now);
    let audit_id_str = encode_uuid(audit_id);
    let decision_str = decision.as_str();
    let completed    = AuditStatus::Completed.as_str();

    // Dispute identity is pre-generated so the transaction closure stays
    // free of RNG access.
    let dispute_id      = Uuid::new_v4();
    let dispute_id_str  = encode_uuid(dispute_id);
    let dispute_ref     = ReferenceKind::Dispute.generate(now);
    let dispute_retry   = ReferenceKind::Dispute
      .generate_with_suffix(now, &random_suffix());
    let dispute_status  = DisputeStatus::Draft.as_str();

    type FinalizeRows = (RawAudit, RawDossier, Option<RawDispute>);

    let payload: std::result::Result<FinalizeRows, CoreError> = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;

        let raw_audit = tx
          .query_row(
            &format!("SELECT {AUDIT_COLS} FROM audits WHERE audit_id = ?1"),
            rusqlite::params![audit_id_str],
            audit_from_row,
          )
          .optional()?;
        let Some(raw_audit) = raw_audit else {
          return Ok(Err(CoreError::AuditNotFound(audit_id)));
        };
        // Finalize is strictly single-shot.
        if let Err(e) = decode_audit_status(&raw_audit.status)
          .map_err(atmp_core::Error::from)
          .and_then(|s| s.ensure_open(audit_id))
        {
          return Ok(Err(e));
        }

        tx.execute(
          "UPDATE audits SET status = ?1, decision = ?2, completed_at = ?3,
             updated_at = ?3 WHERE audit_id = ?4",
          rusqlite::params![completed, decision_str, now_str, audit_id_str],
        )?;

        let raw_dossier = tx
          .query_row(
            &format!(
              "SELECT {DOSSIER_COLS} FROM dossiers WHERE dossier_id = ?1"
            ),
            rusqlite::params![raw_audit.dossier_id],
            dossier_from_row,
          )
          .optional()?;
        let Some(raw_dossier) = raw_dossier else {
          // FKs make this unreachable in practice.
          return Ok(Err(CoreError::Storage(format!(
            "dossier row missing for audit {audit_id}"
          ))));
        };

        // Every decision moves the dossier to ANALYSIS_IN_PROGRESS; a
        // transition to the current status is a silent no-op.
        let current = match decode_dossier_status(&raw_dossier.status) {
          Ok(s) => s,
          Err(e) => return Ok(Err(e.into())),
        };
        if let Some(next) = current.transition(DossierStatus::AnalysisInProgress)
        {
          tx.execute(
            "UPDATE dossiers SET status = ?1, updated_at = ?2
               WHERE dossier_id = ?3",
            rusqlite::params![next.as_str(), now_str, raw_dossier.dossier_id],
          )?;
        }

        let mut raw_dispute = None;
        if decision == AuditDecision::Contest {
          // One-audit-per-dossier already rules out a second finalize for
          // this dossier, but the UNIQUE dossier_id column is re-checked
          // here so a duplicate can never slip through.
          if row_exists(
            &tx,
            "SELECT 1 FROM disputes WHERE dossier_id = ?1",
            &raw_dossier.dossier_id,
          )? {
            let id = Uuid::parse_str(&raw_dossier.dossier_id)
              .unwrap_or_default();
            return Ok(Err(CoreError::DisputeAlreadyExists(id)));
          }

          let subject = DisputeSubject::for_dossier(&raw_dossier.reference);
          let subject_json = match serde_json::to_string(&subject) {
            Ok(j) => j,
            Err(e) => return Ok(Err(CoreError::Serialization(e))),
          };

          let insert = |reference: &str| {
            tx.execute(
              "INSERT INTO disputes (
                 dispute_id, dossier_id, reference, status, subject_json,
                 steps_json, created_at, updated_at
               ) VALUES (?1, ?2, ?3, ?4, ?5, '{}', ?6, ?6)",
              rusqlite::params![
                dispute_id_str,
                raw_dossier.dossier_id,
                reference,
                dispute_status,
                subject_json,
                now_str,
              ],
            )
          };
          match insert(&dispute_ref) {
            Ok(_) => {}
            Err(e) if unique_violation(&e, "disputes.reference") => {
              insert(&dispute_retry)?;
            }
            Err(e) => return Err(e.into()),
          }

          raw_dispute = Some(tx.query_row(
            &format!(
              "SELECT {DISPUTE_COLS} FROM disputes WHERE dispute_id = ?1"
            ),
            rusqlite::params![dispute_id_str],
            dispute_from_row,
          )?);
        }

        let raw_audit = tx.query_row(
          &format!("SELECT {AUDIT_COLS} FROM audits WHERE audit_id = ?1"),
          rusqlite::params![audit_id_str],
          audit_from_row,
        )?;
        let raw_dossier = tx.query_row(
          &format!(
            "SELECT {DOSSIER_COLS} FROM dossiers WHERE dossier_id = ?1"
          ),
          rusqlite::params![raw_dossier.dossier_id],
          dossier_from_row,
        )?;

        tx.commit()?;
        Ok(Ok((raw_audit, raw_dossier, raw_dispute)))
      })
      .await?;

    let (raw_audit, raw_dossier, raw_dispute) = payload.map_err(Error::Core)?;
    let outcome = FinalizeOutcome {
      audit:   raw_audit.into_audit()?,
      dossier: raw_dossier.into_dossier()?,
      dispute: raw_dispute.map(RawDispute::into_dispute).transpose()?,
    };

    match &outcome.dispute {
      Some(d) => tracing::info!(
        audit_id = %audit_id,
        dispute = %d.reference,
        "audit finalized with CONTEST, dispute created"
      ),
      None => tracing::info!(
        audit_id = %audit_id,
        decision = decision.as_str(),
        "audit finalized"
      ),
    }
    Ok(outcome)
  }

  // ── Disputes ──────────────────────────────────────────────────────────────

  async fn get_dispute(&self, id: Uuid) -> Result<Option<Dispute>> {
    let id_str = encode_uuid(id);

    let raw: Option<RawDispute> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              &format!(
                "SELECT {DISPUTE_COLS} FROM disputes WHERE dispute_id = ?1"
              ),
              rusqlite::params![id_str],
              dispute_from_row,
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawDispute::into_dispute).transpose()
  }

  async fn dispute_by_dossier(&self, dossier_id: Uuid) -> Result<Option<Dispute>> {
    let id_str = encode_uuid(dossier_id);

    let raw: Option<RawDispute> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              &format!(
                "SELECT {DISPUTE_COLS} FROM disputes WHERE dossier_id = ?1"
              ),
              rusqlite::params![id_str],
              dispute_from_row,
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawDispute::into_dispute).transpose()
  }

  async fn list_disputes(&self) -> Result<Vec<Dispute>> {
    let raws: Vec<RawDispute> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {DISPUTE_COLS} FROM disputes ORDER BY created_at DESC"
        ))?;
        let rows = stmt
          .query_map([], dispute_from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawDispute::into_dispute).collect()
  }

  async fn record_jurisdiction_step(
    &self,
    dispute_id: Uuid,
    step: JurisdictionStep,
  ) -> Result<Dispute> {
    let id_str  = encode_uuid(dispute_id);
    let now_str = encode_dt(Utc::now());

    let payload: std::result::Result<RawDispute, CoreError> = self
      .conn
      .call(move |conn| {
        let raw = conn
          .query_row(
            &format!(
              "SELECT {DISPUTE_COLS} FROM disputes WHERE dispute_id = ?1"
            ),
            rusqlite::params![id_str],
            dispute_from_row,
          )
          .optional()?;
        let Some(raw) = raw else {
          return Ok(Err(CoreError::DisputeNotFound(dispute_id)));
        };

        let mut steps: std::collections::BTreeMap<Jurisdiction, JurisdictionStep> =
          match serde_json::from_str(&raw.steps_json) {
            Ok(s) => s,
            Err(e) => return Ok(Err(CoreError::Serialization(e))),
          };
        steps.insert(step.jurisdiction, step);
        let steps_json = match serde_json::to_string(&steps) {
          Ok(j) => j,
          Err(e) => return Ok(Err(CoreError::Serialization(e))),
        };

        conn.execute(
          "UPDATE disputes SET steps_json = ?1, updated_at = ?2
             WHERE dispute_id = ?3",
          rusqlite::params![steps_json, now_str, id_str],
        )?;

        let raw = conn.query_row(
          &format!(
            "SELECT {DISPUTE_COLS} FROM disputes WHERE dispute_id = ?1"
          ),
          rusqlite::params![id_str],
          dispute_from_row,
        )?;
        Ok(Ok(raw))
      })
      .await?;

    payload.map_err(Error::Core)?.into_dispute()
  }

  // ── Actions ───────────────────────────────────────────────────────────────

  async fn record_action(
    &self,
    dispute_id: Uuid,
    input: NewAction,
  ) -> Result<Action> {
    input.validate().map_err(Error::Core)?;

    let now = Utc::now();
    let action_id = Uuid::new_v4();

    let id_str      = encode_uuid(action_id);
    let dispute_str = encode_uuid(dispute_id);
    let name        = input.name.clone();
    let description = input.description.clone();
    let at_str      = encode_dt(now);

    let payload: std::result::Result<RawAction, CoreError> = self
      .conn
      .call(move |conn| {
        if !row_exists(
          conn,
          "SELECT 1 FROM disputes WHERE dispute_id = ?1",
          &dispute_str,
        )? {
          return Ok(Err(CoreError::DisputeNotFound(dispute_id)));
        }

        let tx = conn.transaction()?;
        tx.execute(
          "INSERT INTO actions (action_id, name, description, created_at,
             updated_at) VALUES (?1, ?2, ?3, ?4, ?4)",
          rusqlite::params![id_str, name, description, at_str],
        )?;
        tx.execute(
          "INSERT INTO dispute_actions (dispute_id, action_id)
             VALUES (?1, ?2)",
          rusqlite::params![dispute_str, id_str],
        )?;

        let raw = tx.query_row(
          &format!("SELECT {ACTION_COLS} FROM actions WHERE action_id = ?1"),
          rusqlite::params![id_str],
          action_from_row,
        )?;
        tx.commit()?;
        Ok(Ok(raw))
      })
      .await?;

    payload.map_err(Error::Core)?.into_action()
  }

  async fn actions_for_dispute(&self, dispute_id: Uuid) -> Result<Vec<Action>> {
    let id_str = encode_uuid(dispute_id);

    let raws: Vec<RawAction> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {ACTION_COLS} FROM actions
           JOIN dispute_actions USING (action_id)
           WHERE dispute_actions.dispute_id = ?1
           ORDER BY created_at DESC"
        ))?;
        let rows = stmt
          .query_map(rusqlite::params![id_str], action_from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawAction::into_action).collect()
  }

  // ── Documents ─────────────────────────────────────────────────────────────

  async fn add_document(&self, input: NewDocument) -> Result<Document> {
    let now = Utc::now();
    let document_id = Uuid::new_v4();

    let id_str       = encode_uuid(document_id);
    let dispute_str  = encode_uuid(input.dispute_id);
    let uploader_str = encode_uuid(input.uploaded_by);
    let doc_type     = input.document_type.as_str();
    let name         = input.original_name.clone();
    let handle       = input.blob_handle.as_str().to_owned();
    let mime         = input.mime_type.clone();
    let size         = input.size_bytes as i64;
    let at_str       = encode_dt(now);
    let dispute_id   = input.dispute_id;
    let uploaded_by  = input.uploaded_by;

    let payload: std::result::Result<RawDocument, CoreError> = self
      .conn
      .call(move |conn| {
        if !row_exists(
          conn,
          "SELECT 1 FROM disputes WHERE dispute_id = ?1",
          &dispute_str,
        )? {
          return Ok(Err(CoreError::DisputeNotFound(dispute_id)));
        }
        if !row_exists(
          conn,
          "SELECT 1 FROM users WHERE user_id = ?1",
          &uploader_str,
        )? {
          return Ok(Err(CoreError::UserNotFound(uploaded_by)));
        }

        conn.execute(
          "INSERT INTO documents (
             document_id, dispute_id, uploaded_by, document_type,
             original_name, blob_handle, mime_type, size_bytes, created_at
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
          rusqlite::params![
            id_str,
            dispute_str,
            uploader_str,
            doc_type,
            name,
            handle,
            mime,
            size,
            at_str,
          ],
        )?;

        let raw = conn.query_row(
          &format!(
            "SELECT {DOCUMENT_COLS} FROM documents WHERE document_id = ?1"
          ),
          rusqlite::params![id_str],
          document_from_row,
        )?;
        Ok(Ok(raw))
      })
      .await?;

    payload.map_err(Error::Core)?.into_document()
  }

  async fn get_document(&self, id: Uuid) -> Result<Option<Document>> {
    let id_str = encode_uuid(id);

    let raw: Option<RawDocument> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              &format!(
                "SELECT {DOCUMENT_COLS} FROM documents WHERE document_id = ?1"
              ),
              rusqlite::params![id_str],
              document_from_row,
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawDocument::into_document).transpose()
  }

  async fn documents_for_dispute(&self, dispute_id: Uuid) -> Result<Vec<Document>> {
    let id_str = encode_uuid(dispute_id);

    let raws: Vec<RawDocument> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {DOCUMENT_COLS} FROM documents
           WHERE dispute_id = ?1 ORDER BY created_at DESC"
        ))?;
        let rows = stmt
          .query_map(rusqlite::params![id_str], document_from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawDocument::into_document).collect()
  }
}
