//! Human review gate.
//!
//! Reviews are an append-only log of field verdicts and corrections. A
//! contract leaves the review queue only when every extracted field has
//! been confirmed or corrected; the extracted values themselves stay in
//! place either way.

use chrono::Utc;
use rusqlite::Connection;
use thiserror::Error;
use uuid::Uuid;

use crate::db::repository;
use crate::db::DatabaseError;
use crate::models::{Contract, ReviewRecord};

/// The scalar fields a review verdict can target.
pub const REVIEWABLE_FIELDS: &[&str] = &[
    "total_amount",
    "subject_matter",
    "sign_date",
    "effective_date",
    "expire_date",
];

#[derive(Error, Debug)]
pub enum ReviewError {
    #[error("Contract not found: {0}")]
    NotFound(Uuid),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error(transparent)]
    Database(#[from] DatabaseError),
}

pub struct ReviewSubmission {
    pub field_name: String,
    pub is_correct: Option<bool>,
    /// When set, overwrites the canonical field with this value.
    pub human_value: Option<String>,
    pub reviewer: String,
    pub notes: Option<String>,
}

/// Outcome of one review: the record that was written, and whether the
/// contract was promoted out of the review queue by it.
#[derive(Debug)]
pub struct ReviewOutcome {
    pub record: ReviewRecord,
    pub promoted: bool,
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct ReviewSummary {
    pub total_contracts: i64,
    pub pending_review: i64,
    pub review_completed: i64,
    /// Share of verdicts marked correct, over records that carry a verdict.
    pub accuracy: Option<f64>,
}

/// Record one field verdict or correction, then re-evaluate whether the
/// contract can leave the review queue.
pub fn record_review(
    conn: &Connection,
    contract_id: Uuid,
    submission: ReviewSubmission,
) -> Result<ReviewOutcome, ReviewError> {
    let field_name = submission.field_name.as_str();
    if !REVIEWABLE_FIELDS.contains(&field_name) {
        return Err(ReviewError::InvalidInput(format!(
            "unknown review field: {field_name}"
        )));
    }
    if submission.reviewer.trim().is_empty() {
        return Err(ReviewError::InvalidInput("reviewer is empty".into()));
    }
    if submission.is_correct.is_none() && submission.human_value.is_none() {
        return Err(ReviewError::InvalidInput(
            "a review needs a verdict or a corrected value".into(),
        ));
    }

    let contract = repository::get_contract(conn, &contract_id)?
        .ok_or(ReviewError::NotFound(contract_id))?;

    let record = ReviewRecord {
        id: Uuid::new_v4(),
        contract_id,
        field_name: field_name.to_string(),
        ai_value: field_value(&contract, field_name),
        human_value: submission.human_value.clone(),
        reviewer: submission.reviewer.trim().to_string(),
        review_time: Utc::now().naive_utc(),
        is_correct: submission.is_correct,
        notes: submission.notes,
    };
    repository::insert_review(conn, &record)?;

    if let Some(value) = &submission.human_value {
        repository::override_field(conn, &contract_id, field_name, value).map_err(|e| match e {
            DatabaseError::ConstraintViolation(msg) => ReviewError::InvalidInput(msg),
            other => ReviewError::Database(other),
        })?;
    }

    let promoted = try_promote(conn, &contract_id)?;
    tracing::info!(
        contract_id = %contract_id,
        field = field_name,
        reviewer = %record.reviewer,
        promoted,
        "Review recorded"
    );
    Ok(ReviewOutcome { record, promoted })
}

/// Clear the review flag once every extracted field has a confirming
/// review. A contract with nothing extracted never promotes; there is
/// nothing a reviewer could confirm.
fn try_promote(conn: &Connection, contract_id: &Uuid) -> Result<bool, ReviewError> {
    let contract = repository::get_contract(conn, contract_id)?
        .ok_or(ReviewError::NotFound(*contract_id))?;
    if !contract.requires_review {
        return Ok(false);
    }

    let extracted: Vec<&str> = REVIEWABLE_FIELDS
        .iter()
        .copied()
        .filter(|f| field_value(&contract, f).is_some())
        .collect();
    if extracted.is_empty() {
        return Ok(false);
    }

    let confirmed = repository::confirmed_field_names(conn, contract_id)?;
    if extracted.iter().all(|f| confirmed.iter().any(|c| c == f)) {
        repository::clear_requires_review(conn, contract_id)?;
        return Ok(true);
    }
    Ok(false)
}

pub fn review_summary(conn: &Connection) -> Result<ReviewSummary, ReviewError> {
    let total = repository::count_contracts(conn)?;
    let pending = repository::count_requiring_review(conn)?;
    let (correct, with_verdict) = repository::verdict_counts(conn)?;
    Ok(ReviewSummary {
        total_contracts: total,
        pending_review: pending,
        review_completed: total - pending,
        accuracy: (with_verdict > 0).then(|| correct as f64 / with_verdict as f64),
    })
}

fn field_value(contract: &Contract, field_name: &str) -> Option<String> {
    match field_name {
        "total_amount" => contract.total_amount.map(|a| a.to_string()),
        "subject_matter" => contract.subject_matter.clone(),
        "sign_date" => contract.sign_date.map(|d| d.to_string()),
        "effective_date" => contract.effective_date.map(|d| d.to_string()),
        "expire_date" => contract.expire_date.map(|d| d.to_string()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repository::ExtractedFieldsUpdate;
    use crate::db::sqlite::open_memory_database;
    use crate::models::{Contract, ContractType};

    fn verdict(field: &str, is_correct: bool) -> ReviewSubmission {
        ReviewSubmission {
            field_name: field.to_string(),
            is_correct: Some(is_correct),
            human_value: None,
            reviewer: "reviewer-1".into(),
            notes: None,
        }
    }

    fn setup_extracted(fields: ExtractedFieldsUpdate) -> (Connection, Uuid) {
        let conn = open_memory_database().unwrap();
        let contract = Contract::new("HT-2026-020", ContractType::Purchase, None);
        repository::insert_contract(&conn, &contract).unwrap();
        repository::apply_extracted_fields(&conn, &contract.id, &fields).unwrap();
        (conn, contract.id)
    }

    fn two_field_update() -> ExtractedFieldsUpdate {
        ExtractedFieldsUpdate {
            total_amount: Some(150000.0),
            subject_matter: Some("Industrial pumps".into()),
            confidence_score: 0.46,
            requires_review: true,
            ..Default::default()
        }
    }

    #[test]
    fn promotion_requires_every_extracted_field_confirmed() {
        let (conn, id) = setup_extracted(two_field_update());

        let outcome = record_review(&conn, id, verdict("total_amount", true)).unwrap();
        assert!(!outcome.promoted);
        assert!(repository::get_contract(&conn, &id).unwrap().unwrap().requires_review);

        let outcome = record_review(&conn, id, verdict("subject_matter", true)).unwrap();
        assert!(outcome.promoted);
        assert!(!repository::get_contract(&conn, &id).unwrap().unwrap().requires_review);
    }

    #[test]
    fn incorrect_verdict_without_correction_does_not_promote() {
        let (conn, id) = setup_extracted(two_field_update());
        record_review(&conn, id, verdict("total_amount", true)).unwrap();
        let outcome = record_review(&conn, id, verdict("subject_matter", false)).unwrap();
        assert!(!outcome.promoted);
    }

    #[test]
    fn correction_overrides_the_canonical_field_and_confirms_it() {
        let (conn, id) = setup_extracted(two_field_update());
        record_review(&conn, id, verdict("subject_matter", true)).unwrap();

        let outcome = record_review(
            &conn,
            id,
            ReviewSubmission {
                field_name: "total_amount".into(),
                is_correct: Some(false),
                human_value: Some("155000".into()),
                reviewer: "reviewer-1".into(),
                notes: Some("typo in OCR".into()),
            },
        )
        .unwrap();

        assert!(outcome.promoted);
        let contract = repository::get_contract(&conn, &id).unwrap().unwrap();
        assert_eq!(contract.total_amount, Some(155000.0));
        assert_eq!(outcome.record.ai_value.as_deref(), Some("150000"));
    }

    #[test]
    fn contract_with_nothing_extracted_never_promotes_on_a_verdict() {
        let (conn, id) = setup_extracted(ExtractedFieldsUpdate {
            confidence_score: 0.10,
            requires_review: true,
            ..Default::default()
        });
        let outcome = record_review(&conn, id, verdict("subject_matter", true)).unwrap();
        assert!(!outcome.promoted);
        assert!(repository::get_contract(&conn, &id).unwrap().unwrap().requires_review);
    }

    #[test]
    fn correction_on_empty_contract_creates_the_confirmable_field() {
        let (conn, id) = setup_extracted(ExtractedFieldsUpdate {
            confidence_score: 0.10,
            requires_review: true,
            ..Default::default()
        });
        let outcome = record_review(
            &conn,
            id,
            ReviewSubmission {
                field_name: "subject_matter".into(),
                is_correct: None,
                human_value: Some("Office lease".into()),
                reviewer: "reviewer-1".into(),
                notes: None,
            },
        )
        .unwrap();
        // The correction populated the only field, and the correction
        // itself confirms it.
        assert!(outcome.promoted);
        let contract = repository::get_contract(&conn, &id).unwrap().unwrap();
        assert_eq!(contract.subject_matter.as_deref(), Some("Office lease"));
    }

    #[test]
    fn unknown_field_and_empty_submission_are_refused() {
        let (conn, id) = setup_extracted(two_field_update());
        assert!(matches!(
            record_review(&conn, id, verdict("contract_number", true)),
            Err(ReviewError::InvalidInput(_))
        ));
        assert!(matches!(
            record_review(
                &conn,
                id,
                ReviewSubmission {
                    field_name: "total_amount".into(),
                    is_correct: None,
                    human_value: None,
                    reviewer: "reviewer-1".into(),
                    notes: None,
                },
            ),
            Err(ReviewError::InvalidInput(_))
        ));
    }

    #[test]
    fn invalid_correction_value_is_refused() {
        let (conn, id) = setup_extracted(two_field_update());
        let err = record_review(
            &conn,
            id,
            ReviewSubmission {
                field_name: "total_amount".into(),
                is_correct: None,
                human_value: Some("not a number".into()),
                reviewer: "reviewer-1".into(),
                notes: None,
            },
        )
        .unwrap_err();
        assert!(matches!(err, ReviewError::InvalidInput(_)));
    }

    #[test]
    fn summary_counts_and_accuracy() {
        let (conn, id) = setup_extracted(two_field_update());
        let other = Contract::new("HT-2026-021", ContractType::Sales, None);
        repository::insert_contract(&conn, &other).unwrap();

        record_review(&conn, id, verdict("total_amount", true)).unwrap();
        record_review(&conn, id, verdict("subject_matter", false)).unwrap();

        let summary = review_summary(&conn).unwrap();
        assert_eq!(summary.total_contracts, 2);
        assert_eq!(summary.pending_review, 2);
        assert_eq!(summary.review_completed, 0);
        assert_eq!(summary.accuracy, Some(0.5));
    }
}
