//! Contract bundle lifecycle: creation with attached files, later file
//! additions and removals, and deletion.

use rusqlite::Connection;
use thiserror::Error;
use uuid::Uuid;

use crate::db::repository;
use crate::db::DatabaseError;
use crate::extract::FileKind;
use crate::models::{Contract, ContractFile, ContractType};
use crate::storage::{BlobArea, BlobStore, StorageError};

#[derive(Error, Debug)]
pub enum ContractError {
    #[error("Contract number already exists: {0}")]
    DuplicateNumber(String),

    #[error("Contract not found: {0}")]
    NotFound(Uuid),

    #[error("File not found: {0}")]
    FileNotFound(Uuid),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error(transparent)]
    Database(#[from] DatabaseError),

    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// One file to attach, as received from the upload.
pub struct IncomingFile {
    pub filename: String,
    pub bytes: Vec<u8>,
}

/// Create a contract with its initial files. The files land in blob storage
/// under `<contract_id>_<filename>` and keep their upload order.
pub fn create_contract(
    conn: &Connection,
    store: &BlobStore,
    contract_number: &str,
    contract_type: ContractType,
    created_by: Option<&str>,
    files: Vec<IncomingFile>,
) -> Result<(Contract, Vec<ContractFile>), ContractError> {
    let contract_number = contract_number.trim();
    if contract_number.is_empty() {
        return Err(ContractError::InvalidInput("contract number is empty".into()));
    }
    if files.is_empty() {
        return Err(ContractError::InvalidInput("at least one file is required".into()));
    }
    for file in &files {
        validate_filename(&file.filename)?;
    }
    if repository::get_contract_by_number(conn, contract_number)?.is_some() {
        return Err(ContractError::DuplicateNumber(contract_number.to_string()));
    }

    let contract = Contract::new(contract_number, contract_type, created_by);
    repository::insert_contract(conn, &contract)?;

    let mut attached = Vec::with_capacity(files.len());
    for (order, file) in files.into_iter().enumerate() {
        attached.push(store_file(conn, store, contract.id, &file, order as i64)?);
    }

    tracing::info!(
        contract_id = %contract.id,
        contract_number = contract_number,
        files = attached.len(),
        "Contract created"
    );
    Ok((contract, attached))
}

/// Attach another file to an existing contract, after its current files.
pub fn add_file(
    conn: &Connection,
    store: &BlobStore,
    contract_id: Uuid,
    file: IncomingFile,
) -> Result<ContractFile, ContractError> {
    validate_filename(&file.filename)?;
    repository::get_contract(conn, &contract_id)?.ok_or(ContractError::NotFound(contract_id))?;

    let order = repository::next_file_order(conn, &contract_id)?;
    let attached = store_file(conn, store, contract_id, &file, order)?;
    tracing::info!(contract_id = %contract_id, filename = %attached.filename, "File attached");
    Ok(attached)
}

/// Remove one attached file. Removing the last file resets the contract to
/// its pre-extraction state: extracted fields, parties, audit and review
/// records and the text artifact all go, and the status returns to
/// `pending_ocr`.
pub fn remove_file(
    conn: &Connection,
    store: &BlobStore,
    contract_id: Uuid,
    file_id: Uuid,
) -> Result<(), ContractError> {
    let contract =
        repository::get_contract(conn, &contract_id)?.ok_or(ContractError::NotFound(contract_id))?;
    let file = repository::get_file(conn, &file_id)?
        .filter(|f| f.contract_id == contract_id)
        .ok_or(ContractError::FileNotFound(file_id))?;

    store.delete(&file.file_path)?;
    repository::delete_file(conn, &file_id)?;

    if repository::count_files(conn, &contract_id)? == 0 {
        repository::delete_parties(conn, &contract_id)?;
        repository::delete_records(conn, &contract_id)?;
        repository::delete_reviews(conn, &contract_id)?;
        repository::reset_extraction_state(conn, &contract_id)?;
        if let Some(text_path) = &contract.ocr_text_path {
            store.delete(text_path)?;
        }
        tracing::info!(contract_id = %contract_id, "Last file removed, contract reset");
    } else {
        tracing::info!(contract_id = %contract_id, file_id = %file_id, "File removed");
    }
    Ok(())
}

/// Delete a contract and everything attached to it, blobs included.
pub fn delete_contract(
    conn: &Connection,
    store: &BlobStore,
    contract_id: Uuid,
) -> Result<(), ContractError> {
    let contract =
        repository::get_contract(conn, &contract_id)?.ok_or(ContractError::NotFound(contract_id))?;

    for file in repository::list_files(conn, &contract_id)? {
        store.delete(&file.file_path)?;
    }
    if let Some(text_path) = &contract.ocr_text_path {
        store.delete(text_path)?;
    }
    repository::delete_contract(conn, &contract_id)?;
    tracing::info!(contract_id = %contract_id, "Contract deleted");
    Ok(())
}

fn validate_filename(filename: &str) -> Result<(), ContractError> {
    FileKind::from_filename(filename)
        .map(|_| ())
        .map_err(|e| ContractError::InvalidInput(e.to_string()))
}

fn store_file(
    conn: &Connection,
    store: &BlobStore,
    contract_id: Uuid,
    file: &IncomingFile,
    order: i64,
) -> Result<ContractFile, ContractError> {
    let locator = store.put(
        BlobArea::Raw,
        &format!("{contract_id}_{}", file.filename),
        &file.bytes,
    )?;
    let attached = ContractFile::new(contract_id, &locator, &file.filename, order);
    repository::insert_file(conn, &attached)?;
    Ok(attached)
}
