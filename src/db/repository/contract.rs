use std::str::FromStr;

use chrono::NaiveDateTime;
use rusqlite::{params, Connection};
use uuid::Uuid;

use crate::db::DatabaseError;
use crate::models::enums::*;
use crate::models::Contract;

const CONTRACT_COLUMNS: &str = "id, contract_number, contract_type, status, ocr_text_path, \
     upload_time, created_by, total_amount, subject_matter, sign_date, effective_date, \
     expire_date, confidence_score, requires_review";

pub fn insert_contract(conn: &Connection, contract: &Contract) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO contracts (id, contract_number, contract_type, status, ocr_text_path,
         upload_time, created_by, total_amount, subject_matter, sign_date, effective_date,
         expire_date, confidence_score, requires_review)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)",
        params![
            contract.id.to_string(),
            contract.contract_number,
            contract.contract_type.as_str(),
            contract.status.as_str(),
            contract.ocr_text_path,
            format_datetime(&contract.upload_time),
            contract.created_by,
            contract.total_amount,
            contract.subject_matter,
            contract.sign_date.map(|d| format_datetime(&d)),
            contract.effective_date.map(|d| format_datetime(&d)),
            contract.expire_date.map(|d| format_datetime(&d)),
            contract.confidence_score,
            contract.requires_review as i32,
        ],
    )?;
    Ok(())
}

pub fn get_contract(conn: &Connection, id: &Uuid) -> Result<Option<Contract>, DatabaseError> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {CONTRACT_COLUMNS} FROM contracts WHERE id = ?1"
    ))?;
    let result = stmt.query_row(params![id.to_string()], map_row);
    match result {
        Ok(row) => Ok(Some(contract_from_row(row)?)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

pub fn get_contract_by_number(
    conn: &Connection,
    contract_number: &str,
) -> Result<Option<Contract>, DatabaseError> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {CONTRACT_COLUMNS} FROM contracts WHERE contract_number = ?1"
    ))?;
    let result = stmt.query_row(params![contract_number], map_row);
    match result {
        Ok(row) => Ok(Some(contract_from_row(row)?)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

pub fn list_contracts(
    conn: &Connection,
    limit: i64,
    offset: i64,
) -> Result<Vec<Contract>, DatabaseError> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {CONTRACT_COLUMNS} FROM contracts ORDER BY upload_time DESC LIMIT ?1 OFFSET ?2"
    ))?;
    let rows = stmt.query_map(params![limit, offset], map_row)?;
    collect_contracts(rows)
}

pub fn list_contracts_by_status(
    conn: &Connection,
    status: &ContractStatus,
    limit: i64,
    offset: i64,
) -> Result<Vec<Contract>, DatabaseError> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {CONTRACT_COLUMNS} FROM contracts WHERE status = ?1 \
         ORDER BY upload_time DESC LIMIT ?2 OFFSET ?3"
    ))?;
    let rows = stmt.query_map(params![status.as_str(), limit, offset], map_row)?;
    collect_contracts(rows)
}

/// Contracts flagged for human review, independent of pipeline status.
pub fn list_contracts_requiring_review(
    conn: &Connection,
    limit: i64,
    offset: i64,
) -> Result<Vec<Contract>, DatabaseError> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {CONTRACT_COLUMNS} FROM contracts WHERE requires_review = 1 \
         ORDER BY upload_time DESC LIMIT ?1 OFFSET ?2"
    ))?;
    let rows = stmt.query_map(params![limit, offset], map_row)?;
    collect_contracts(rows)
}

pub fn count_contracts(conn: &Connection) -> Result<i64, DatabaseError> {
    Ok(conn.query_row("SELECT COUNT(*) FROM contracts", [], |row| row.get(0))?)
}

pub fn count_requiring_review(conn: &Connection) -> Result<i64, DatabaseError> {
    Ok(conn.query_row(
        "SELECT COUNT(*) FROM contracts WHERE requires_review = 1",
        [],
        |row| row.get(0),
    )?)
}

/// Update only the pipeline status of a contract.
pub fn update_status(
    conn: &Connection,
    contract_id: &Uuid,
    status: &ContractStatus,
) -> Result<(), DatabaseError> {
    let rows = conn.execute(
        "UPDATE contracts SET status = ?2 WHERE id = ?1",
        params![contract_id.to_string(), status.as_str()],
    )?;
    if rows == 0 {
        return Err(DatabaseError::NotFound {
            entity_type: "Contract".into(),
            id: contract_id.to_string(),
        });
    }
    Ok(())
}

pub fn set_ocr_text_path(
    conn: &Connection,
    contract_id: &Uuid,
    text_path: &str,
) -> Result<(), DatabaseError> {
    let rows = conn.execute(
        "UPDATE contracts SET ocr_text_path = ?2 WHERE id = ?1",
        params![contract_id.to_string(), text_path],
    )?;
    if rows == 0 {
        return Err(DatabaseError::NotFound {
            entity_type: "Contract".into(),
            id: contract_id.to_string(),
        });
    }
    Ok(())
}

/// The scalar outcome of one extraction attempt, applied in a single UPDATE.
#[derive(Debug, Clone, Default)]
pub struct ExtractedFieldsUpdate {
    pub total_amount: Option<f64>,
    pub subject_matter: Option<String>,
    pub sign_date: Option<NaiveDateTime>,
    pub effective_date: Option<NaiveDateTime>,
    pub expire_date: Option<NaiveDateTime>,
    pub confidence_score: f32,
    pub requires_review: bool,
}

pub fn apply_extracted_fields(
    conn: &Connection,
    contract_id: &Uuid,
    update: &ExtractedFieldsUpdate,
) -> Result<(), DatabaseError> {
    let rows = conn.execute(
        "UPDATE contracts SET total_amount = ?2, subject_matter = ?3, sign_date = ?4,
         effective_date = ?5, expire_date = ?6, confidence_score = ?7, requires_review = ?8
         WHERE id = ?1",
        params![
            contract_id.to_string(),
            update.total_amount,
            update.subject_matter,
            update.sign_date.map(|d| format_datetime(&d)),
            update.effective_date.map(|d| format_datetime(&d)),
            update.expire_date.map(|d| format_datetime(&d)),
            update.confidence_score,
            update.requires_review as i32,
        ],
    )?;
    if rows == 0 {
        return Err(DatabaseError::NotFound {
            entity_type: "Contract".into(),
            id: contract_id.to_string(),
        });
    }
    Ok(())
}

/// Overwrite one canonical scalar field with a human-confirmed value.
pub fn override_field(
    conn: &Connection,
    contract_id: &Uuid,
    field_name: &str,
    value: &str,
) -> Result<(), DatabaseError> {
    let rows = match field_name {
        "total_amount" => {
            let amount: f64 = value.parse().map_err(|_| {
                DatabaseError::ConstraintViolation(format!("not a number: {value}"))
            })?;
            conn.execute(
                "UPDATE contracts SET total_amount = ?2 WHERE id = ?1",
                params![contract_id.to_string(), amount],
            )?
        }
        "subject_matter" => conn.execute(
            "UPDATE contracts SET subject_matter = ?2 WHERE id = ?1",
            params![contract_id.to_string(), value],
        )?,
        "sign_date" | "effective_date" | "expire_date" => {
            let parsed = parse_datetime(value).ok_or_else(|| {
                DatabaseError::ConstraintViolation(format!("not a date: {value}"))
            })?;
            conn.execute(
                &format!("UPDATE contracts SET {field_name} = ?2 WHERE id = ?1"),
                params![contract_id.to_string(), format_datetime(&parsed)],
            )?
        }
        other => {
            return Err(DatabaseError::ConstraintViolation(format!(
                "unknown contract field: {other}"
            )))
        }
    };
    if rows == 0 {
        return Err(DatabaseError::NotFound {
            entity_type: "Contract".into(),
            id: contract_id.to_string(),
        });
    }
    Ok(())
}

pub fn clear_requires_review(conn: &Connection, contract_id: &Uuid) -> Result<(), DatabaseError> {
    let rows = conn.execute(
        "UPDATE contracts SET requires_review = 0 WHERE id = ?1",
        params![contract_id.to_string()],
    )?;
    if rows == 0 {
        return Err(DatabaseError::NotFound {
            entity_type: "Contract".into(),
            id: contract_id.to_string(),
        });
    }
    Ok(())
}

/// Return a contract to its pre-extraction state: null scalar fields and
/// confidence, no text artifact, flagged for review, status pending_ocr.
/// Used when the last attached file is removed.
pub fn reset_extraction_state(conn: &Connection, contract_id: &Uuid) -> Result<(), DatabaseError> {
    let rows = conn.execute(
        "UPDATE contracts SET total_amount = NULL, subject_matter = NULL, sign_date = NULL,
         effective_date = NULL, expire_date = NULL, confidence_score = NULL,
         ocr_text_path = NULL, requires_review = 1, status = ?2
         WHERE id = ?1",
        params![
            contract_id.to_string(),
            ContractStatus::PendingOcr.as_str()
        ],
    )?;
    if rows == 0 {
        return Err(DatabaseError::NotFound {
            entity_type: "Contract".into(),
            id: contract_id.to_string(),
        });
    }
    Ok(())
}

pub fn delete_contract(conn: &Connection, contract_id: &Uuid) -> Result<(), DatabaseError> {
    let rows = conn.execute(
        "DELETE FROM contracts WHERE id = ?1",
        params![contract_id.to_string()],
    )?;
    if rows == 0 {
        return Err(DatabaseError::NotFound {
            entity_type: "Contract".into(),
            id: contract_id.to_string(),
        });
    }
    Ok(())
}

// Internal row type for Contract mapping
struct ContractRow {
    id: String,
    contract_number: String,
    contract_type: String,
    status: String,
    ocr_text_path: Option<String>,
    upload_time: String,
    created_by: Option<String>,
    total_amount: Option<f64>,
    subject_matter: Option<String>,
    sign_date: Option<String>,
    effective_date: Option<String>,
    expire_date: Option<String>,
    confidence_score: Option<f32>,
    requires_review: i32,
}

fn map_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<ContractRow> {
    Ok(ContractRow {
        id: row.get(0)?,
        contract_number: row.get(1)?,
        contract_type: row.get(2)?,
        status: row.get(3)?,
        ocr_text_path: row.get(4)?,
        upload_time: row.get(5)?,
        created_by: row.get(6)?,
        total_amount: row.get(7)?,
        subject_matter: row.get(8)?,
        sign_date: row.get(9)?,
        effective_date: row.get(10)?,
        expire_date: row.get(11)?,
        confidence_score: row.get(12)?,
        requires_review: row.get(13)?,
    })
}

fn collect_contracts(
    rows: impl Iterator<Item = rusqlite::Result<ContractRow>>,
) -> Result<Vec<Contract>, DatabaseError> {
    let mut contracts = Vec::new();
    for row in rows {
        contracts.push(contract_from_row(row?)?);
    }
    Ok(contracts)
}

fn contract_from_row(row: ContractRow) -> Result<Contract, DatabaseError> {
    Ok(Contract {
        id: Uuid::parse_str(&row.id)
            .map_err(|e| DatabaseError::ConstraintViolation(e.to_string()))?,
        contract_number: row.contract_number,
        contract_type: ContractType::from_str(&row.contract_type)?,
        status: ContractStatus::from_str(&row.status)?,
        ocr_text_path: row.ocr_text_path,
        upload_time: parse_datetime(&row.upload_time).unwrap_or_default(),
        created_by: row.created_by,
        total_amount: row.total_amount,
        subject_matter: row.subject_matter,
        sign_date: row.sign_date.as_deref().and_then(parse_datetime),
        effective_date: row.effective_date.as_deref().and_then(parse_datetime),
        expire_date: row.expire_date.as_deref().and_then(parse_datetime),
        confidence_score: row.confidence_score,
        requires_review: row.requires_review != 0,
    })
}

pub(crate) fn format_datetime(dt: &NaiveDateTime) -> String {
    dt.format("%Y-%m-%d %H:%M:%S").to_string()
}

pub(crate) fn parse_datetime(s: &str) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S")
        .or_else(|_| NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S"))
        .ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::sqlite::open_memory_database;
    use crate::models::Contract;

    fn sample() -> Contract {
        Contract::new("HT-2026-001", ContractType::Purchase, Some("tester"))
    }

    #[test]
    fn insert_and_get_round_trip() {
        let conn = open_memory_database().unwrap();
        let contract = sample();
        insert_contract(&conn, &contract).unwrap();

        let loaded = get_contract(&conn, &contract.id).unwrap().unwrap();
        assert_eq!(loaded.contract_number, "HT-2026-001");
        assert_eq!(loaded.contract_type, ContractType::Purchase);
        assert_eq!(loaded.status, ContractStatus::PendingOcr);
        assert!(loaded.requires_review);
        assert_eq!(loaded.upload_time, parse_datetime(&format_datetime(&contract.upload_time)).unwrap());
    }

    #[test]
    fn get_missing_returns_none() {
        let conn = open_memory_database().unwrap();
        assert!(get_contract(&conn, &Uuid::new_v4()).unwrap().is_none());
    }

    #[test]
    fn contract_number_is_unique() {
        let conn = open_memory_database().unwrap();
        insert_contract(&conn, &sample()).unwrap();
        assert!(insert_contract(&conn, &sample()).is_err());
    }

    #[test]
    fn update_status_missing_contract_errors() {
        let conn = open_memory_database().unwrap();
        let err = update_status(&conn, &Uuid::new_v4(), &ContractStatus::Completed);
        assert!(matches!(err, Err(DatabaseError::NotFound { .. })));
    }

    #[test]
    fn apply_extracted_fields_writes_all_scalars() {
        let conn = open_memory_database().unwrap();
        let contract = sample();
        insert_contract(&conn, &contract).unwrap();

        let update = ExtractedFieldsUpdate {
            total_amount: Some(150_000.0),
            subject_matter: Some("Industrial pumps".into()),
            sign_date: parse_datetime("2026-01-10 00:00:00"),
            effective_date: parse_datetime("2026-02-01 00:00:00"),
            expire_date: None,
            confidence_score: 0.82,
            requires_review: false,
        };
        apply_extracted_fields(&conn, &contract.id, &update).unwrap();

        let loaded = get_contract(&conn, &contract.id).unwrap().unwrap();
        assert_eq!(loaded.total_amount, Some(150_000.0));
        assert_eq!(loaded.subject_matter.as_deref(), Some("Industrial pumps"));
        assert!(loaded.sign_date.is_some());
        assert!(loaded.expire_date.is_none());
        assert_eq!(loaded.confidence_score, Some(0.82));
        assert!(!loaded.requires_review);
    }

    #[test]
    fn reset_extraction_state_clears_everything() {
        let conn = open_memory_database().unwrap();
        let contract = sample();
        insert_contract(&conn, &contract).unwrap();
        set_ocr_text_path(&conn, &contract.id, "text/x.txt").unwrap();
        apply_extracted_fields(
            &conn,
            &contract.id,
            &ExtractedFieldsUpdate {
                total_amount: Some(1.0),
                subject_matter: Some("x".into()),
                confidence_score: 1.0,
                requires_review: false,
                ..Default::default()
            },
        )
        .unwrap();
        update_status(&conn, &contract.id, &ContractStatus::Completed).unwrap();

        reset_extraction_state(&conn, &contract.id).unwrap();

        let loaded = get_contract(&conn, &contract.id).unwrap().unwrap();
        assert_eq!(loaded.status, ContractStatus::PendingOcr);
        assert!(loaded.total_amount.is_none());
        assert!(loaded.subject_matter.is_none());
        assert!(loaded.confidence_score.is_none());
        assert!(loaded.ocr_text_path.is_none());
        assert!(loaded.requires_review);
    }

    #[test]
    fn override_field_validates_values() {
        let conn = open_memory_database().unwrap();
        let contract = sample();
        insert_contract(&conn, &contract).unwrap();

        override_field(&conn, &contract.id, "total_amount", "99000.50").unwrap();
        override_field(&conn, &contract.id, "sign_date", "2026-03-01 00:00:00").unwrap();
        let loaded = get_contract(&conn, &contract.id).unwrap().unwrap();
        assert_eq!(loaded.total_amount, Some(99000.50));
        assert!(loaded.sign_date.is_some());

        assert!(override_field(&conn, &contract.id, "total_amount", "abc").is_err());
        assert!(override_field(&conn, &contract.id, "status", "completed").is_err());
    }

    #[test]
    fn list_requiring_review_filters_on_flag() {
        let conn = open_memory_database().unwrap();
        let flagged = sample();
        insert_contract(&conn, &flagged).unwrap();
        let mut cleared = Contract::new("HT-2026-002", ContractType::Sales, None);
        cleared.requires_review = false;
        insert_contract(&conn, &cleared).unwrap();

        let listed = list_contracts_requiring_review(&conn, 50, 0).unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].id, flagged.id);
    }

    #[test]
    fn filtered_listings_paginate() {
        let conn = open_memory_database().unwrap();
        for i in 0..5 {
            let c = Contract::new(&format!("HT-{i}"), ContractType::Lease, None);
            insert_contract(&conn, &c).unwrap();
        }
        let status = ContractStatus::PendingOcr;
        assert_eq!(list_contracts_by_status(&conn, &status, 3, 0).unwrap().len(), 3);
        assert_eq!(list_contracts_by_status(&conn, &status, 3, 3).unwrap().len(), 2);
        assert_eq!(list_contracts_requiring_review(&conn, 2, 4).unwrap().len(), 1);
    }

    #[test]
    fn list_contracts_paginates() {
        let conn = open_memory_database().unwrap();
        for i in 0..5 {
            let c = Contract::new(&format!("HT-{i}"), ContractType::Lease, None);
            insert_contract(&conn, &c).unwrap();
        }
        assert_eq!(list_contracts(&conn, 3, 0).unwrap().len(), 3);
        assert_eq!(list_contracts(&conn, 3, 3).unwrap().len(), 2);
    }
}
