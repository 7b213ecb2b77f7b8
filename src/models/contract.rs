use chrono::{NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::enums::{ContractStatus, ContractType, PartyType};

/// A contract bundle: one logical document assembled from one or more files.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Contract {
    pub id: Uuid,
    pub contract_number: String,
    pub contract_type: ContractType,
    pub status: ContractStatus,
    /// Blob locator of the combined OCR text, set after the OCR stage.
    pub ocr_text_path: Option<String>,
    pub upload_time: NaiveDateTime,
    pub created_by: Option<String>,
    pub total_amount: Option<f64>,
    pub subject_matter: Option<String>,
    pub sign_date: Option<NaiveDateTime>,
    pub effective_date: Option<NaiveDateTime>,
    pub expire_date: Option<NaiveDateTime>,
    pub confidence_score: Option<f32>,
    pub requires_review: bool,
}

impl Contract {
    /// Fresh contract awaiting OCR. Fields stay null until extraction
    /// succeeds, so the record starts flagged for review.
    pub fn new(contract_number: &str, contract_type: ContractType, created_by: Option<&str>) -> Self {
        Self {
            id: Uuid::new_v4(),
            contract_number: contract_number.to_string(),
            contract_type,
            status: ContractStatus::PendingOcr,
            ocr_text_path: None,
            upload_time: Utc::now().naive_utc(),
            created_by: created_by.map(str::to_string),
            total_amount: None,
            subject_matter: None,
            sign_date: None,
            effective_date: None,
            expire_date: None,
            confidence_score: None,
            requires_review: true,
        }
    }
}

/// One attached file. `file_order` is unique per contract and defines the
/// concatenation order of extracted text.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContractFile {
    pub id: Uuid,
    pub contract_id: Uuid,
    pub file_path: String,
    pub filename: String,
    pub file_order: i64,
    pub upload_time: NaiveDateTime,
}

impl ContractFile {
    pub fn new(contract_id: Uuid, file_path: &str, filename: &str, file_order: i64) -> Self {
        Self {
            id: Uuid::new_v4(),
            contract_id,
            file_path: file_path.to_string(),
            filename: filename.to_string(),
            file_order,
            upload_time: Utc::now().naive_utc(),
        }
    }
}

/// A contracting party. Re-extraction replaces the whole set atomically.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContractParty {
    pub id: Uuid,
    pub contract_id: Uuid,
    pub party_type: PartyType,
    pub party_name: String,
    pub party_type_detail: Option<String>,
    pub tax_number: Option<String>,
    pub legal_representative: Option<String>,
    pub address: Option<String>,
    pub contact_info: Option<String>,
    pub confidence_score: Option<f32>,
}

/// Immutable audit record: one per extracted field per extraction attempt.
/// Accumulates across attempts; never mutated.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractionRecord {
    pub id: Uuid,
    pub contract_id: Uuid,
    pub field_name: String,
    pub raw_value: Option<String>,
    pub reasoning: Option<String>,
    pub confidence_score: Option<f32>,
    pub model_version: Option<String>,
    pub extract_time: NaiveDateTime,
}

impl ExtractionRecord {
    pub fn new(
        contract_id: Uuid,
        field_name: &str,
        raw_value: &str,
        confidence: f32,
        model_version: &str,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            contract_id,
            field_name: field_name.to_string(),
            raw_value: Some(raw_value.to_string()),
            reasoning: Some(r#"{"source":"ai_extraction"}"#.to_string()),
            confidence_score: Some(confidence),
            model_version: Some(model_version.to_string()),
            extract_time: Utc::now().naive_utc(),
        }
    }
}

/// Append-only log entry of a human correction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReviewRecord {
    pub id: Uuid,
    pub contract_id: Uuid,
    pub field_name: String,
    pub ai_value: Option<String>,
    pub human_value: Option<String>,
    pub reviewer: String,
    pub review_time: NaiveDateTime,
    pub is_correct: Option<bool>,
    pub notes: Option<String>,
}
