use rusqlite::{params, Connection};
use uuid::Uuid;

use super::contract::{format_datetime, parse_datetime};
use crate::db::DatabaseError;
use crate::models::ContractFile;

pub fn insert_file(conn: &Connection, file: &ContractFile) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO contract_files (id, contract_id, file_path, filename, file_order, upload_time)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![
            file.id.to_string(),
            file.contract_id.to_string(),
            file.file_path,
            file.filename,
            file.file_order,
            format_datetime(&file.upload_time),
        ],
    )?;
    Ok(())
}

pub fn get_file(conn: &Connection, file_id: &Uuid) -> Result<Option<ContractFile>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT id, contract_id, file_path, filename, file_order, upload_time
         FROM contract_files WHERE id = ?1",
    )?;
    let result = stmt.query_row(params![file_id.to_string()], map_row);
    match result {
        Ok(file) => Ok(Some(file?)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

/// Files of a contract in deterministic concatenation order.
pub fn list_files(conn: &Connection, contract_id: &Uuid) -> Result<Vec<ContractFile>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT id, contract_id, file_path, filename, file_order, upload_time
         FROM contract_files WHERE contract_id = ?1 ORDER BY file_order ASC",
    )?;
    let rows = stmt.query_map(params![contract_id.to_string()], map_row)?;
    let mut files = Vec::new();
    for row in rows {
        files.push(row??);
    }
    Ok(files)
}

pub fn count_files(conn: &Connection, contract_id: &Uuid) -> Result<i64, DatabaseError> {
    let count = conn.query_row(
        "SELECT COUNT(*) FROM contract_files WHERE contract_id = ?1",
        params![contract_id.to_string()],
        |row| row.get(0),
    )?;
    Ok(count)
}

/// Next free file_order for a contract (max + 1, starting at 0).
pub fn next_file_order(conn: &Connection, contract_id: &Uuid) -> Result<i64, DatabaseError> {
    let max: Option<i64> = conn.query_row(
        "SELECT MAX(file_order) FROM contract_files WHERE contract_id = ?1",
        params![contract_id.to_string()],
        |row| row.get(0),
    )?;
    Ok(max.map_or(0, |m| m + 1))
}

pub fn delete_file(conn: &Connection, file_id: &Uuid) -> Result<(), DatabaseError> {
    let rows = conn.execute(
        "DELETE FROM contract_files WHERE id = ?1",
        params![file_id.to_string()],
    )?;
    if rows == 0 {
        return Err(DatabaseError::NotFound {
            entity_type: "ContractFile".into(),
            id: file_id.to_string(),
        });
    }
    Ok(())
}

fn map_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Result<ContractFile, DatabaseError>> {
    let id: String = row.get(0)?;
    let contract_id: String = row.get(1)?;
    let file_path: String = row.get(2)?;
    let filename: String = row.get(3)?;
    let file_order: i64 = row.get(4)?;
    let upload_time: String = row.get(5)?;
    Ok(file_from_parts(
        id,
        contract_id,
        file_path,
        filename,
        file_order,
        upload_time,
    ))
}

fn file_from_parts(
    id: String,
    contract_id: String,
    file_path: String,
    filename: String,
    file_order: i64,
    upload_time: String,
) -> Result<ContractFile, DatabaseError> {
    Ok(ContractFile {
        id: Uuid::parse_str(&id).map_err(|e| DatabaseError::ConstraintViolation(e.to_string()))?,
        contract_id: Uuid::parse_str(&contract_id)
            .map_err(|e| DatabaseError::ConstraintViolation(e.to_string()))?,
        file_path,
        filename,
        file_order,
        upload_time: parse_datetime(&upload_time).unwrap_or_default(),
    })
}
