//! AI extraction stage: combined text to structured contract fields.
//!
//! All database effects of one attempt — canonical fields, audit records,
//! the party set and the final status — commit in a single transaction, so
//! a failed attempt leaves no partial write behind.

use std::sync::Arc;

use chrono::{NaiveDate, NaiveDateTime};
use rusqlite::Connection;
use uuid::Uuid;

use super::confidence::{completeness_score, requires_review};
use super::state::{transition, PipelineEvent};
use super::PipelineError;
use crate::db::repository::{self, ExtractedFieldsUpdate};
use crate::db::DatabaseError;
use crate::extract::{ExtractedFields, FieldExtraction, FieldExtractor};
use crate::models::{ContractParty, ExtractionRecord, PartyType};
use crate::storage::BlobStore;

pub struct ExtractStage {
    store: Arc<BlobStore>,
    extractor: Box<dyn FieldExtractor + Send>,
}

impl ExtractStage {
    pub fn new(store: Arc<BlobStore>, extractor: Box<dyn FieldExtractor + Send>) -> Self {
        Self { store, extractor }
    }

    /// Run extraction for one contract. On failure the status reverts to
    /// `pending_ai` and nothing else changes.
    pub fn execute(&self, conn: &mut Connection, contract_id: Uuid) -> Result<(), PipelineError> {
        let contract = repository::get_contract(conn, &contract_id)?
            .ok_or(PipelineError::NotFound(contract_id))?;

        let text_path = contract.ocr_text_path.clone().ok_or_else(|| {
            PipelineError::Precondition(format!("contract {contract_id} has no OCR text"))
        })?;

        let processing = transition(contract.status, PipelineEvent::AiStarted)?;
        repository::update_status(conn, &contract_id, &processing)?;
        tracing::info!(contract_id = %contract_id, "Extraction stage started");

        match self.extract_and_commit(conn, contract_id, &text_path) {
            Ok(score) => {
                tracing::info!(
                    contract_id = %contract_id,
                    confidence = score,
                    "Extraction stage completed"
                );
                Ok(())
            }
            Err(e) => {
                let reverted = transition(processing, PipelineEvent::AiFailed)?;
                repository::update_status(conn, &contract_id, &reverted)?;
                Err(e)
            }
        }
    }

    fn extract_and_commit(
        &self,
        conn: &mut Connection,
        contract_id: Uuid,
        text_path: &str,
    ) -> Result<f32, PipelineError> {
        let bytes = self.store.get(text_path)?;
        let text = String::from_utf8_lossy(&bytes).into_owned();

        let extraction = self.extractor.extract_fields(&text)?;
        let mut parties = convert_parties(contract_id, &extraction.fields);

        let update = ExtractedFieldsUpdate {
            total_amount: extraction.fields.total_amount,
            subject_matter: extraction
                .fields
                .subject_matter
                .as_deref()
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string),
            sign_date: extraction.fields.sign_date.as_deref().and_then(parse_extracted_date),
            effective_date: extraction
                .fields
                .effective_date
                .as_deref()
                .and_then(parse_extracted_date),
            expire_date: extraction
                .fields
                .expire_date
                .as_deref()
                .and_then(parse_extracted_date),
            confidence_score: 0.0,
            requires_review: true,
        };
        let score = completeness_score(&update, parties.len());
        let update = ExtractedFieldsUpdate {
            confidence_score: score,
            requires_review: requires_review(score),
            ..update
        };
        // Parties carry the attempt's confidence; there is no per-party
        // signal from the model to do better.
        for party in &mut parties {
            party.confidence_score = Some(score);
        }

        let tx = conn.transaction().map_err(DatabaseError::from)?;
        repository::apply_extracted_fields(&tx, &contract_id, &update)?;
        for record in audit_records(contract_id, &extraction, &update) {
            repository::insert_record(&tx, &record)?;
        }
        repository::replace_parties(&tx, &contract_id, &parties)?;
        let next = transition(
            crate::models::ContractStatus::AiProcessing,
            PipelineEvent::AiSucceeded,
        )?;
        repository::update_status(&tx, &contract_id, &next)?;
        tx.commit().map_err(DatabaseError::from)?;

        Ok(score)
    }
}

/// Dates come back from the model in whatever shape the contract used.
/// Accept RFC 3339 (with or without offset) and bare ISO dates; anything
/// else stays null rather than guessing.
fn parse_extracted_date(raw: &str) -> Option<NaiveDateTime> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    if let Ok(dt) = chrono::DateTime::parse_from_rfc3339(raw) {
        return Some(dt.naive_utc());
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S") {
        return Some(dt);
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S") {
        return Some(dt);
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
}

/// Normalize the model's free-text party roles. Parties without a name are
/// dropped; the raw role label is kept in `party_type_detail`.
fn convert_parties(contract_id: Uuid, fields: &ExtractedFields) -> Vec<ContractParty> {
    fields
        .parties
        .iter()
        .filter_map(|p| {
            let name = p.party_name.as_deref().map(str::trim).filter(|s| !s.is_empty())?;
            let label = p.party_type.as_deref().unwrap_or("");
            Some(ContractParty {
                id: Uuid::new_v4(),
                contract_id,
                party_type: PartyType::from_label(label),
                party_name: name.to_string(),
                party_type_detail: p.party_type.clone(),
                tax_number: p.tax_number.clone(),
                legal_representative: p.legal_representative.clone(),
                address: p.address.clone(),
                contact_info: None,
                confidence_score: None,
            })
        })
        .collect()
}

/// One audit record per scalar field the model actually filled in.
fn audit_records(
    contract_id: Uuid,
    extraction: &FieldExtraction,
    update: &ExtractedFieldsUpdate,
) -> Vec<ExtractionRecord> {
    let model = &extraction.model_version;
    let score = update.confidence_score;
    let mut records = Vec::new();

    if let Some(amount) = update.total_amount {
        records.push(ExtractionRecord::new(
            contract_id,
            "total_amount",
            &amount.to_string(),
            score,
            model,
        ));
    }
    if let Some(subject) = &update.subject_matter {
        records.push(ExtractionRecord::new(
            contract_id,
            "subject_matter",
            subject,
            score,
            model,
        ));
    }
    // Dates keep the model's raw answer in the trail even when it failed
    // to parse and the canonical field stayed null.
    for (name, raw) in [
        ("sign_date", &extraction.fields.sign_date),
        ("effective_date", &extraction.fields.effective_date),
        ("expire_date", &extraction.fields.expire_date),
    ] {
        if let Some(raw) = raw.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
            records.push(ExtractionRecord::new(contract_id, name, raw, score, model));
        }
    }
    records
}
