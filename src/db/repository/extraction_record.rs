use rusqlite::{params, Connection};
use uuid::Uuid;

use super::contract::{format_datetime, parse_datetime};
use crate::db::DatabaseError;
use crate::models::ExtractionRecord;

pub fn insert_record(conn: &Connection, record: &ExtractionRecord) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO extraction_records (id, contract_id, field_name, raw_value, reasoning,
         confidence_score, model_version, extract_time)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        params![
            record.id.to_string(),
            record.contract_id.to_string(),
            record.field_name,
            record.raw_value,
            record.reasoning,
            record.confidence_score,
            record.model_version,
            format_datetime(&record.extract_time),
        ],
    )?;
    Ok(())
}

/// Full extraction history of a contract, oldest first.
pub fn list_records(conn: &Connection, contract_id: &Uuid) -> Result<Vec<ExtractionRecord>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT id, contract_id, field_name, raw_value, reasoning, confidence_score,
         model_version, extract_time
         FROM extraction_records WHERE contract_id = ?1 ORDER BY extract_time ASC, id ASC",
    )?;
    let rows = stmt.query_map(params![contract_id.to_string()], |row| {
        Ok((
            row.get::<_, String>(0)?,
            row.get::<_, String>(1)?,
            row.get::<_, String>(2)?,
            row.get::<_, Option<String>>(3)?,
            row.get::<_, Option<String>>(4)?,
            row.get::<_, Option<f32>>(5)?,
            row.get::<_, Option<String>>(6)?,
            row.get::<_, String>(7)?,
        ))
    })?;

    let mut records = Vec::new();
    for row in rows {
        let (id, contract_id, field_name, raw_value, reasoning, confidence, model, extract_time) =
            row?;
        records.push(ExtractionRecord {
            id: Uuid::parse_str(&id)
                .map_err(|e| DatabaseError::ConstraintViolation(e.to_string()))?,
            contract_id: Uuid::parse_str(&contract_id)
                .map_err(|e| DatabaseError::ConstraintViolation(e.to_string()))?,
            field_name,
            raw_value,
            reasoning,
            confidence_score: confidence,
            model_version: model,
            extract_time: parse_datetime(&extract_time).unwrap_or_default(),
        });
    }
    Ok(records)
}

pub fn delete_records(conn: &Connection, contract_id: &Uuid) -> Result<usize, DatabaseError> {
    let deleted = conn.execute(
        "DELETE FROM extraction_records WHERE contract_id = ?1",
        params![contract_id.to_string()],
    )?;
    Ok(deleted)
}
