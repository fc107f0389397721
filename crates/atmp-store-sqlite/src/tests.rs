//! Integration tests for `SqliteStore` against an in-memory database.

use atmp_core::{
  Error as CoreError,
  action::NewAction,
  audit::{AuditDecision, AuditStatus, ChecklistItem},
  dispute::{DisputeStatus, Jurisdiction, JurisdictionStep},
  document::{BlobHandle, DocumentType, NewDocument},
  dossier::{
    AccidentInfo, CompanyInfo, DossierStatus, EmployeeInfo, NewDossier,
    Witness,
  },
  store::CaseStore,
  user::{NewUser, UserRole},
};
use chrono::{NaiveDate, Utc};
use uuid::Uuid;

use crate::{Error, SqliteStore};

async fn store() -> SqliteStore {
  SqliteStore::open_in_memory()
    .await
    .expect("in-memory store")
}

async fn juriste(s: &SqliteStore) -> Uuid {
  s.add_user(NewUser {
    name:     "Marie Curie".into(),
    username: format!("mcurie-{}", Uuid::new_v4()),
    email:    format!("{}@example.com", Uuid::new_v4()),
    role:     UserRole::Juriste,
  })
  .await
  .unwrap()
  .user_id
}

fn new_dossier(created_by: Uuid) -> NewDossier {
  NewDossier {
    created_by,
    company: CompanyInfo {
      name:    "Acme BTP".into(),
      siret:   "73282932000074".into(),
      address: "1 rue des Forges, Lyon".into(),
    },
    employee: EmployeeInfo {
      first_name:             "Jean".into(),
      last_name:              "Dupont".into(),
      job_title:              Some("Maçon".into()),
      social_security_number: None,
    },
    accident: AccidentInfo {
      date:          NaiveDate::from_ymd_opt(2024, 3, 14).unwrap(),
      time:          Some("09:30".into()),
      location:      "Chantier A, Lyon".into(),
      description:   "Chute d'échafaudage".into(),
      injury_nature: Some("Fracture du poignet".into()),
    },
    witnesses: vec![Witness {
      name:    "Paul Martin".into(),
      contact: Some("06 12 34 56 78".into()),
    }],
    third_party:    None,
    health_service: Some("Médecine du travail Rhône".into()),
  }
}

fn checklist() -> Vec<ChecklistItem> {
  vec![
    ChecklistItem {
      question:          "Réserves émises dans les délais ?".into(),
      answer:            Some(true),
      comment:           String::new(),
      document_required: true,
      document_received: false,
    },
    ChecklistItem {
      question:          "Témoins identifiés ?".into(),
      answer:            Some(true),
      comment:           "Un témoin direct".into(),
      document_required: false,
      document_received: false,
    },
  ]
}

// ─── Users ───────────────────────────────────────────────────────────────────

#[tokio::test]
async fn add_and_get_user() {
  let s = store().await;

  let user = s
    .add_user(NewUser {
      name:     "Ana Lopez".into(),
      username: "alopez".into(),
      email:    "ana@example.com".into(),
      role:     UserRole::Rh,
    })
    .await
    .unwrap();

  let fetched = s.get_user(user.user_id).await.unwrap().unwrap();
  assert_eq!(fetched.username, "alopez");
  assert_eq!(fetched.role, UserRole::Rh);
}

#[tokio::test]
async fn get_user_missing_returns_none() {
  let s = store().await;
  assert!(s.get_user(Uuid::new_v4()).await.unwrap().is_none());
}

// ─── Dossiers ────────────────────────────────────────────────────────────────

#[tokio::test]
async fn create_dossier_assigns_reference_and_initial_status() {
  let s = store().await;
  let creator = juriste(&s).await;

  let dossier = s.create_dossier(new_dossier(creator)).await.unwrap();

  assert!(dossier.reference.starts_with("DAT-"), "{}", dossier.reference);
  assert_eq!(dossier.status, DossierStatus::ToAnalyze);
  assert_eq!(dossier.created_by, creator);
  assert_eq!(dossier.witnesses.len(), 1);

  let fetched = s.get_dossier(dossier.dossier_id).await.unwrap().unwrap();
  assert_eq!(fetched.reference, dossier.reference);
  assert_eq!(fetched.company.siret, "73282932000074");
}

#[tokio::test]
async fn create_dossier_with_unknown_creator_errors() {
  let s = store().await;
  let err = s.create_dossier(new_dossier(Uuid::new_v4())).await.unwrap_err();
  assert!(matches!(err, Error::Core(CoreError::UserNotFound(_))));
}

#[tokio::test]
async fn create_dossier_rejects_blank_company_name() {
  let s = store().await;
  let creator = juriste(&s).await;

  let mut input = new_dossier(creator);
  input.company.name = "  ".into();

  let err = s.create_dossier(input).await.unwrap_err();
  assert!(matches!(
    err,
    Error::Core(CoreError::MissingField("company.name"))
  ));
  assert!(s.list_dossiers().await.unwrap().is_empty());
}

#[tokio::test]
async fn rapid_creation_yields_unique_references() {
  let s = store().await;
  let creator = juriste(&s).await;

  // Both inserts land in the same epoch second; the second one must come
  // back with a disambiguated reference instead of a constraint error.
  let a = s.create_dossier(new_dossier(creator)).await.unwrap();
  let b = s.create_dossier(new_dossier(creator)).await.unwrap();

  assert_ne!(a.reference, b.reference);
  assert!(b.reference.starts_with("DAT-"));
}

// ─── Audit workflow ──────────────────────────────────────────────────────────

#[tokio::test]
async fn open_audit_starts_in_progress() {
  let s = store().await;
  let creator = juriste(&s).await;
  let dossier = s.create_dossier(new_dossier(creator)).await.unwrap();

  let audit = s.open_audit(dossier.dossier_id, Some(creator)).await.unwrap();

  assert_eq!(audit.status, AuditStatus::InProgress);
  assert!(audit.checklist.is_empty());
  assert!(audit.started_at.is_some());
  assert!(audit.decision.is_none());
  assert!(audit.completed_at.is_none());

  let by_dossier = s
    .audit_by_dossier(dossier.dossier_id)
    .await
    .unwrap()
    .unwrap();
  assert_eq!(by_dossier.audit_id, audit.audit_id);
}

#[tokio::test]
async fn open_audit_twice_conflicts() {
  let s = store().await;
  let creator = juriste(&s).await;
  let dossier = s.create_dossier(new_dossier(creator)).await.unwrap();

  s.open_audit(dossier.dossier_id, None).await.unwrap();
  let err = s.open_audit(dossier.dossier_id, None).await.unwrap_err();
  assert!(matches!(
    err,
    Error::Core(CoreError::AuditAlreadyExists(_))
  ));
}

#[tokio::test]
async fn concurrent_open_audit_admits_exactly_one() {
  let s = store().await;
  let creator = juriste(&s).await;
  let dossier = s.create_dossier(new_dossier(creator)).await.unwrap();

  let (a, b) = tokio::join!(
    s.open_audit(dossier.dossier_id, None),
    s.open_audit(dossier.dossier_id, None),
  );
  let successes = [a.is_ok(), b.is_ok()].iter().filter(|ok| **ok).count();
  assert_eq!(successes, 1);
}

#[tokio::test]
async fn open_audit_unknown_dossier_errors() {
  let s = store().await;
  let err = s.open_audit(Uuid::new_v4(), None).await.unwrap_err();
  assert!(matches!(err, Error::Core(CoreError::DossierNotFound(_))));
}

#[tokio::test]
async fn update_checklist_replaces_and_is_idempotent() {
  let s = store().await;
  let creator = juriste(&s).await;
  let dossier = s.create_dossier(new_dossier(creator)).await.unwrap();
  let audit = s.open_audit(dossier.dossier_id, None).await.unwrap();

  let items = checklist();
  let first = s
    .update_checklist(audit.audit_id, items.clone(), Some("RAS".into()))
    .await
    .unwrap();
  assert_eq!(first.checklist, items);
  assert_eq!(first.comments.as_deref(), Some("RAS"));

  // Replaying the same update leaves the checklist unchanged — no
  // duplication.
  let second = s
    .update_checklist(audit.audit_id, items.clone(), None)
    .await
    .unwrap();
  assert_eq!(second.checklist, items);
  assert_eq!(second.comments.as_deref(), Some("RAS"));

  // The dossier is untouched by checklist updates.
  let d = s.get_dossier(dossier.dossier_id).await.unwrap().unwrap();
  assert_eq!(d.status, DossierStatus::ToAnalyze);
}

#[tokio::test]
async fn update_checklist_after_finalize_conflicts() {
  let s = store().await;
  let creator = juriste(&s).await;
  let dossier = s.create_dossier(new_dossier(creator)).await.unwrap();
  let audit = s.open_audit(dossier.dossier_id, None).await.unwrap();

  s.finalize_audit(audit.audit_id, AuditDecision::NeedMoreInfo)
    .await
    .unwrap();

  let err = s
    .update_checklist(audit.audit_id, checklist(), None)
    .await
    .unwrap_err();
  assert!(matches!(
    err,
    Error::Core(CoreError::AuditAlreadyCompleted(_))
  ));
}

// ─── Finalize ────────────────────────────────────────────────────────────────

#[tokio::test]
async fn finalize_without_contest_closes_audit_and_moves_dossier() {
  let s = store().await;
  let creator = juriste(&s).await;
  let dossier = s.create_dossier(new_dossier(creator)).await.unwrap();
  let audit = s.open_audit(dossier.dossier_id, None).await.unwrap();

  let outcome = s
    .finalize_audit(audit.audit_id, AuditDecision::DoNotContest)
    .await
    .unwrap();

  assert_eq!(outcome.audit.status, AuditStatus::Completed);
  assert_eq!(outcome.audit.decision, Some(AuditDecision::DoNotContest));
  assert!(outcome.audit.completed_at.is_some());
  assert_eq!(outcome.dossier.status, DossierStatus::AnalysisInProgress);
  assert!(outcome.dispute.is_none());

  assert!(
    s.dispute_by_dossier(dossier.dossier_id)
      .await
      .unwrap()
      .is_none()
  );
}

#[tokio::test]
async fn finalize_with_contest_derives_exactly_one_dispute() {
  let s = store().await;
  let creator = juriste(&s).await;
  let dossier = s.create_dossier(new_dossier(creator)).await.unwrap();
  let audit = s.open_audit(dossier.dossier_id, None).await.unwrap();

  let outcome = s
    .finalize_audit(audit.audit_id, AuditDecision::Contest)
    .await
    .unwrap();

  assert_eq!(outcome.audit.status, AuditStatus::Completed);
  assert_eq!(outcome.dossier.status, DossierStatus::AnalysisInProgress);

  let dispute = outcome.dispute.expect("CONTEST must derive a dispute");
  assert_eq!(dispute.dossier_id, dossier.dossier_id);
  assert_eq!(dispute.status, DisputeStatus::Draft);
  assert!(dispute.reference.starts_with("CONT-"), "{}", dispute.reference);
  assert_eq!(
    dispute.subject.title,
    format!("Contentieux pour dossier {}", dossier.reference)
  );
  assert!(dispute.steps.is_empty());

  let by_dossier = s
    .dispute_by_dossier(dossier.dossier_id)
    .await
    .unwrap()
    .unwrap();
  assert_eq!(by_dossier.dispute_id, dispute.dispute_id);
}

#[tokio::test]
async fn finalize_is_single_shot() {
  let s = store().await;
  let creator = juriste(&s).await;
  let dossier = s.create_dossier(new_dossier(creator)).await.unwrap();
  let audit = s.open_audit(dossier.dossier_id, None).await.unwrap();

  let first = s
    .finalize_audit(audit.audit_id, AuditDecision::Contest)
    .await
    .unwrap();
  let dispute = first.dispute.unwrap();

  // A second finalize — even with a different decision — is rejected and
  // changes nothing.
  let err = s
    .finalize_audit(audit.audit_id, AuditDecision::DoNotContest)
    .await
    .unwrap_err();
  assert!(matches!(
    err,
    Error::Core(CoreError::AuditAlreadyCompleted(_))
  ));

  let audit_after = s.get_audit(audit.audit_id).await.unwrap().unwrap();
  assert_eq!(audit_after.decision, Some(AuditDecision::Contest));
  assert_eq!(audit_after.completed_at, first.audit.completed_at);

  let disputes = s.list_disputes().await.unwrap();
  assert_eq!(disputes.len(), 1);
  assert_eq!(disputes[0].dispute_id, dispute.dispute_id);
}

#[tokio::test]
async fn finalize_unknown_audit_errors() {
  let s = store().await;
  let err = s
    .finalize_audit(Uuid::new_v4(), AuditDecision::Contest)
    .await
    .unwrap_err();
  assert!(matches!(err, Error::Core(CoreError::AuditNotFound(_))));
}

// ─── Jurisdiction steps ──────────────────────────────────────────────────────

#[tokio::test]
async fn record_jurisdiction_step_round_trips() {
  let s = store().await;
  let creator = juriste(&s).await;
  let dossier = s.create_dossier(new_dossier(creator)).await.unwrap();
  let audit = s.open_audit(dossier.dossier_id, None).await.unwrap();
  let dispute = s
    .finalize_audit(audit.audit_id, AuditDecision::Contest)
    .await
    .unwrap()
    .dispute
    .unwrap();

  let step = JurisdictionStep {
    jurisdiction: Jurisdiction::TribunalJudiciaire,
    submitted_at: Utc::now(),
    decision:     None,
    decision_at:  None,
    notes:        "Saisine déposée".into(),
  };
  let updated = s
    .record_jurisdiction_step(dispute.dispute_id, step)
    .await
    .unwrap();

  assert_eq!(updated.steps.len(), 1);
  let stored = &updated.steps[&Jurisdiction::TribunalJudiciaire];
  assert_eq!(stored.notes, "Saisine déposée");
}

#[tokio::test]
async fn record_step_unknown_dispute_errors() {
  let s = store().await;
  let step = JurisdictionStep {
    jurisdiction: Jurisdiction::CourAppel,
    submitted_at: Utc::now(),
    decision:     None,
    decision_at:  None,
    notes:        String::new(),
  };
  let err = s
    .record_jurisdiction_step(Uuid::new_v4(), step)
    .await
    .unwrap_err();
  assert!(matches!(err, Error::Core(CoreError::DisputeNotFound(_))));
}

// ─── Actions ─────────────────────────────────────────────────────────────────

#[tokio::test]
async fn record_action_links_it_to_the_dispute() {
  let s = store().await;
  let creator = juriste(&s).await;
  let dossier = s.create_dossier(new_dossier(creator)).await.unwrap();
  let audit = s.open_audit(dossier.dossier_id, None).await.unwrap();
  let dispute = s
    .finalize_audit(audit.audit_id, AuditDecision::Contest)
    .await
    .unwrap()
    .dispute
    .unwrap();

  let action = s
    .record_action(dispute.dispute_id, NewAction {
      name:        "Désignation d'un expert".into(),
      description: Some("Expertise médicale contradictoire".into()),
    })
    .await
    .unwrap();
  assert_eq!(action.name, "Désignation d'un expert");

  let actions = s.actions_for_dispute(dispute.dispute_id).await.unwrap();
  assert_eq!(actions.len(), 1);
  assert_eq!(actions[0].action_id, action.action_id);
}

#[tokio::test]
async fn record_action_rejects_blank_name() {
  let s = store().await;
  let creator = juriste(&s).await;
  let dossier = s.create_dossier(new_dossier(creator)).await.unwrap();
  let audit = s.open_audit(dossier.dossier_id, None).await.unwrap();
  let dispute = s
    .finalize_audit(audit.audit_id, AuditDecision::Contest)
    .await
    .unwrap()
    .dispute
    .unwrap();

  let err = s
    .record_action(dispute.dispute_id, NewAction {
      name:        "  ".into(),
      description: None,
    })
    .await
    .unwrap_err();
  assert!(matches!(err, Error::Core(CoreError::MissingField("name"))));
  assert!(s.actions_for_dispute(dispute.dispute_id).await.unwrap().is_empty());
}

#[tokio::test]
async fn record_action_unknown_dispute_errors() {
  let s = store().await;
  let err = s
    .record_action(Uuid::new_v4(), NewAction {
      name:        "Courrier CPAM".into(),
      description: None,
    })
    .await
    .unwrap_err();
  assert!(matches!(err, Error::Core(CoreError::DisputeNotFound(_))));
}

// ─── Documents ───────────────────────────────────────────────────────────────

async fn dispute_fixture(s: &SqliteStore) -> (Uuid, Uuid) {
  let creator = juriste(s).await;
  let dossier = s.create_dossier(new_dossier(creator)).await.unwrap();
  let audit = s.open_audit(dossier.dossier_id, None).await.unwrap();
  let dispute = s
    .finalize_audit(audit.audit_id, AuditDecision::Contest)
    .await
    .unwrap()
    .dispute
    .unwrap();
  (dispute.dispute_id, creator)
}

#[tokio::test]
async fn add_document_and_list_for_dispute() {
  let s = store().await;
  let (dispute_id, uploader) = dispute_fixture(&s).await;

  let doc = s
    .add_document(NewDocument {
      dispute_id,
      uploaded_by:   uploader,
      document_type: DocumentType::CertificatMedical,
      original_name: "certificat.pdf".into(),
      blob_handle:   BlobHandle("deadbeef".into()),
      mime_type:     "application/pdf".into(),
      size_bytes:    1234,
    })
    .await
    .unwrap();

  assert_eq!(doc.document_type, DocumentType::CertificatMedical);
  assert_eq!(doc.size_bytes, 1234);

  let docs = s.documents_for_dispute(dispute_id).await.unwrap();
  assert_eq!(docs.len(), 1);
  assert_eq!(docs[0].document_id, doc.document_id);

  let fetched = s.get_document(doc.document_id).await.unwrap().unwrap();
  assert_eq!(fetched.original_name, "certificat.pdf");
  assert_eq!(fetched.blob_handle, BlobHandle("deadbeef".into()));
}

#[tokio::test]
async fn add_document_unknown_dispute_errors() {
  let s = store().await;
  let creator = juriste(&s).await;

  let err = s
    .add_document(NewDocument {
      dispute_id:    Uuid::new_v4(),
      uploaded_by:   creator,
      document_type: DocumentType::Autre,
      original_name: "x.bin".into(),
      blob_handle:   BlobHandle("00".into()),
      mime_type:     "application/octet-stream".into(),
      size_bytes:    1,
    })
    .await
    .unwrap_err();
  assert!(matches!(err, Error::Core(CoreError::DisputeNotFound(_))));
}

#[tokio::test]
async fn add_document_unknown_uploader_errors() {
  let s = store().await;
  let (dispute_id, _) = dispute_fixture(&s).await;

  let err = s
    .add_document(NewDocument {
      dispute_id,
      uploaded_by:   Uuid::new_v4(),
      document_type: DocumentType::Autre,
      original_name: "x.bin".into(),
      blob_handle:   BlobHandle("00".into()),
      mime_type:     "application/octet-stream".into(),
      size_bytes:    1,
    })
    .await
    .unwrap_err();
  assert!(matches!(err, Error::Core(CoreError::UserNotFound(_))));
}
