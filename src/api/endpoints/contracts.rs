//! Contract endpoints: upload, listing, detail, files and OCR resubmission.

use std::str::FromStr;

use axum::extract::{Multipart, Path, Query, State};
use axum::Json;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::api::error::ApiError;
use crate::api::types::ApiContext;
use crate::contracts::{self, IncomingFile};
use crate::db::repository;
use crate::models::{
    Contract, ContractFile, ContractParty, ContractStatus, ContractType, ExtractionRecord,
};
use crate::pipeline::{admit_ocr, Stage, SubmitReceipt};

pub(crate) const DEFAULT_PAGE_SIZE: i64 = 20;
pub(crate) const MAX_PAGE_SIZE: i64 = 100;

#[derive(Serialize)]
pub struct UploadResponse {
    pub contract: Contract,
    pub files: Vec<ContractFile>,
    pub queue: SubmitReceipt,
}

/// `POST /api/contracts` — create a contract from a multipart upload and
/// queue it for OCR immediately. Text fields: `contract_number`,
/// `contract_type`, optional `created_by`; each `files` part carries one
/// attachment in bundle order.
pub async fn upload(
    State(ctx): State<ApiContext>,
    mut multipart: Multipart,
) -> Result<Json<UploadResponse>, ApiError> {
    let mut contract_number = None;
    let mut contract_type = None;
    let mut created_by = None;
    let mut files = Vec::new();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::BadRequest(format!("Malformed multipart body: {e}")))?
    {
        match field.name().unwrap_or("") {
            "contract_number" => contract_number = Some(read_text(field).await?),
            "contract_type" => contract_type = Some(read_text(field).await?),
            "created_by" => created_by = Some(read_text(field).await?),
            "files" => {
                let filename = field
                    .file_name()
                    .map(str::to_string)
                    .ok_or_else(|| ApiError::BadRequest("File part without a filename".into()))?;
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| ApiError::BadRequest(format!("Failed to read file: {e}")))?;
                files.push(IncomingFile {
                    filename,
                    bytes: bytes.to_vec(),
                });
            }
            other => {
                return Err(ApiError::BadRequest(format!("Unexpected field: {other}")));
            }
        }
    }

    let contract_number =
        contract_number.ok_or_else(|| ApiError::BadRequest("contract_number is required".into()))?;
    let contract_type = contract_type
        .ok_or_else(|| ApiError::BadRequest("contract_type is required".into()))
        .and_then(|s| {
            ContractType::from_str(&s)
                .map_err(|_| ApiError::BadRequest(format!("unknown contract_type: {s}")))
        })?;

    let conn = ctx.open_db()?;
    let (contract, attached) = contracts::create_contract(
        &conn,
        &ctx.store,
        &contract_number,
        contract_type,
        created_by.as_deref(),
        files,
    )?;

    // A freshly created contract is always admissible, so this submission
    // skips the resubmission check.
    let receipt = ctx.queue.submit(contract.id, Stage::Ocr);

    Ok(Json(UploadResponse {
        contract,
        files: attached,
        queue: receipt,
    }))
}

#[derive(Deserialize)]
pub struct ListParams {
    pub page: Option<i64>,
    pub page_size: Option<i64>,
    pub status: Option<String>,
    pub requires_review: Option<bool>,
}

#[derive(Serialize)]
pub struct ListResponse {
    pub contracts: Vec<Contract>,
    pub page: i64,
    pub page_size: i64,
}

/// `GET /api/contracts` — newest first, with optional status and review
/// filters.
pub async fn list(
    State(ctx): State<ApiContext>,
    Query(params): Query<ListParams>,
) -> Result<Json<ListResponse>, ApiError> {
    let page = params.page.unwrap_or(1).max(1);
    let page_size = params
        .page_size
        .unwrap_or(DEFAULT_PAGE_SIZE)
        .clamp(1, MAX_PAGE_SIZE);

    let offset = (page - 1) * page_size;
    let conn = ctx.open_db()?;
    let mut contracts = match &params.status {
        Some(s) => {
            let status = ContractStatus::from_str(s)
                .map_err(|_| ApiError::BadRequest(format!("unknown status: {s}")))?;
            repository::list_contracts_by_status(&conn, &status, page_size, offset)?
        }
        None => match params.requires_review {
            Some(true) => repository::list_contracts_requiring_review(&conn, page_size, offset)?,
            _ => repository::list_contracts(&conn, page_size, offset)?,
        },
    };
    if let Some(flag) = params.requires_review {
        contracts.retain(|c| c.requires_review == flag);
    }

    Ok(Json(ListResponse {
        contracts,
        page,
        page_size,
    }))
}

#[derive(Serialize)]
pub struct ContractDetail {
    pub contract: Contract,
    pub files: Vec<ContractFile>,
    pub parties: Vec<ContractParty>,
    pub extraction_records: Vec<ExtractionRecord>,
}

/// `GET /api/contracts/:id` — the contract with everything attached to it.
pub async fn detail(
    State(ctx): State<ApiContext>,
    Path(id): Path<Uuid>,
) -> Result<Json<ContractDetail>, ApiError> {
    let conn = ctx.open_db()?;
    let contract = repository::get_contract(&conn, &id)?
        .ok_or_else(|| ApiError::NotFound(format!("Contract not found: {id}")))?;
    Ok(Json(ContractDetail {
        files: repository::list_files(&conn, &id)?,
        parties: repository::list_parties(&conn, &id)?,
        extraction_records: repository::list_records(&conn, &id)?,
        contract,
    }))
}

/// `DELETE /api/contracts/:id`
pub async fn delete(
    State(ctx): State<ApiContext>,
    Path(id): Path<Uuid>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let conn = ctx.open_db()?;
    contracts::delete_contract(&conn, &ctx.store, id)?;
    Ok(Json(serde_json::json!({ "deleted": id })))
}

/// `POST /api/contracts/:id/files` — attach one more file after the
/// contract's current files.
pub async fn add_file(
    State(ctx): State<ApiContext>,
    Path(id): Path<Uuid>,
    mut multipart: Multipart,
) -> Result<Json<ContractFile>, ApiError> {
    let mut incoming = None;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::BadRequest(format!("Malformed multipart body: {e}")))?
    {
        if field.name() == Some("file") {
            let filename = field
                .file_name()
                .map(str::to_string)
                .ok_or_else(|| ApiError::BadRequest("File part without a filename".into()))?;
            let bytes = field
                .bytes()
                .await
                .map_err(|e| ApiError::BadRequest(format!("Failed to read file: {e}")))?;
            incoming = Some(IncomingFile {
                filename,
                bytes: bytes.to_vec(),
            });
        }
    }
    let incoming = incoming.ok_or_else(|| ApiError::BadRequest("file part is required".into()))?;

    let conn = ctx.open_db()?;
    let attached = contracts::add_file(&conn, &ctx.store, id, incoming)?;
    Ok(Json(attached))
}

/// `DELETE /api/contracts/:id/files/:file_id` — removing the last file
/// resets the contract to its pre-extraction state.
pub async fn remove_file(
    State(ctx): State<ApiContext>,
    Path((id, file_id)): Path<(Uuid, Uuid)>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let conn = ctx.open_db()?;
    contracts::remove_file(&conn, &ctx.store, id, file_id)?;
    Ok(Json(serde_json::json!({ "deleted": file_id })))
}

/// `POST /api/contracts/:id/ocr` — resubmit a contract for OCR. Only a
/// contract sitting in `pending_ocr` is admissible; anything already in
/// flight or completed answers 409.
pub async fn trigger_ocr(
    State(ctx): State<ApiContext>,
    Path(id): Path<Uuid>,
) -> Result<Json<SubmitReceipt>, ApiError> {
    let conn = ctx.open_db()?;
    let contract = repository::get_contract(&conn, &id)?
        .ok_or_else(|| ApiError::NotFound(format!("Contract not found: {id}")))?;
    admit_ocr(contract.status).map_err(|_| {
        ApiError::Conflict(format!(
            "Contract {id} cannot be resubmitted from status {}",
            contract.status
        ))
    })?;

    Ok(Json(ctx.queue.submit(id, Stage::Ocr)))
}

/// `GET /api/queue` — waiting depth and the task currently running.
pub async fn queue_status(
    State(ctx): State<ApiContext>,
) -> Result<Json<crate::pipeline::QueueStatus>, ApiError> {
    Ok(Json(ctx.queue.status()))
}

async fn read_text(field: axum::extract::multipart::Field<'_>) -> Result<String, ApiError> {
    field
        .text()
        .await
        .map_err(|e| ApiError::BadRequest(format!("Malformed field: {e}")))
}
