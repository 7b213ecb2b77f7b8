use rusqlite::{params, Connection};
use uuid::Uuid;

use super::contract::{format_datetime, parse_datetime};
use crate::db::DatabaseError;
use crate::models::ReviewRecord;

pub fn insert_review(conn: &Connection, record: &ReviewRecord) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO review_records (id, contract_id, field_name, ai_value, human_value,
         reviewer, review_time, is_correct, notes)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
        params![
            record.id.to_string(),
            record.contract_id.to_string(),
            record.field_name,
            record.ai_value,
            record.human_value,
            record.reviewer,
            format_datetime(&record.review_time),
            record.is_correct.map(|b| b as i32),
            record.notes,
        ],
    )?;
    Ok(())
}

pub fn list_reviews(conn: &Connection, contract_id: &Uuid) -> Result<Vec<ReviewRecord>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT id, contract_id, field_name, ai_value, human_value, reviewer, review_time,
         is_correct, notes
         FROM review_records WHERE contract_id = ?1 ORDER BY review_time ASC, id ASC",
    )?;
    let rows = stmt.query_map(params![contract_id.to_string()], |row| {
        Ok((
            row.get::<_, String>(0)?,
            row.get::<_, String>(1)?,
            row.get::<_, String>(2)?,
            row.get::<_, Option<String>>(3)?,
            row.get::<_, Option<String>>(4)?,
            row.get::<_, String>(5)?,
            row.get::<_, String>(6)?,
            row.get::<_, Option<i32>>(7)?,
            row.get::<_, Option<String>>(8)?,
        ))
    })?;

    let mut records = Vec::new();
    for row in rows {
        let (id, contract_id, field_name, ai_value, human_value, reviewer, time, correct, notes) =
            row?;
        records.push(ReviewRecord {
            id: Uuid::parse_str(&id)
                .map_err(|e| DatabaseError::ConstraintViolation(e.to_string()))?,
            contract_id: Uuid::parse_str(&contract_id)
                .map_err(|e| DatabaseError::ConstraintViolation(e.to_string()))?,
            field_name,
            ai_value,
            human_value,
            reviewer,
            review_time: parse_datetime(&time).unwrap_or_default(),
            is_correct: correct.map(|i| i != 0),
            notes,
        });
    }
    Ok(records)
}

/// Distinct field names that have at least one confirming review: either an
/// explicit correct verdict or a human-supplied value.
pub fn confirmed_field_names(conn: &Connection, contract_id: &Uuid) -> Result<Vec<String>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT DISTINCT field_name FROM review_records
         WHERE contract_id = ?1 AND (is_correct = 1 OR human_value IS NOT NULL)",
    )?;
    let rows = stmt.query_map(params![contract_id.to_string()], |row| row.get::<_, String>(0))?;
    let mut names = Vec::new();
    for row in rows {
        names.push(row?);
    }
    Ok(names)
}

/// (correct verdicts, total verdicts) across all contracts. Records without
/// a verdict do not count either way.
pub fn verdict_counts(conn: &Connection) -> Result<(i64, i64), DatabaseError> {
    Ok(conn.query_row(
        "SELECT COUNT(CASE WHEN is_correct = 1 THEN 1 END), COUNT(is_correct)
         FROM review_records",
        [],
        |row| Ok((row.get(0)?, row.get(1)?)),
    )?)
}

pub fn delete_reviews(conn: &Connection, contract_id: &Uuid) -> Result<usize, DatabaseError> {
    let deleted = conn.execute(
        "DELETE FROM review_records WHERE contract_id = ?1",
        params![contract_id.to_string()],
    )?;
    Ok(deleted)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repository::contract::insert_contract;
    use crate::db::sqlite::open_memory_database;
    use crate::models::{Contract, ContractType};
    use chrono::Utc;

    fn review(contract_id: Uuid, field: &str, is_correct: Option<bool>, human: Option<&str>) -> ReviewRecord {
        ReviewRecord {
            id: Uuid::new_v4(),
            contract_id,
            field_name: field.to_string(),
            ai_value: Some("ai".into()),
            human_value: human.map(str::to_string),
            reviewer: "reviewer-1".into(),
            review_time: Utc::now().naive_utc(),
            is_correct,
            notes: None,
        }
    }

    fn setup() -> (rusqlite::Connection, Uuid) {
        let conn = open_memory_database().unwrap();
        let contract = Contract::new("HT-1", ContractType::Lease, None);
        insert_contract(&conn, &contract).unwrap();
        (conn, contract.id)
    }

    #[test]
    fn confirmed_fields_require_verdict_or_override() {
        let (conn, cid) = setup();
        insert_review(&conn, &review(cid, "total_amount", Some(true), None)).unwrap();
        insert_review(&conn, &review(cid, "sign_date", None, Some("2026-01-01 00:00:00"))).unwrap();
        // Verdict "incorrect" without a human value does not confirm.
        insert_review(&conn, &review(cid, "subject_matter", Some(false), None)).unwrap();

        let mut confirmed = confirmed_field_names(&conn, &cid).unwrap();
        confirmed.sort();
        assert_eq!(confirmed, vec!["sign_date", "total_amount"]);
    }

    #[test]
    fn reviews_are_append_only_history() {
        let (conn, cid) = setup();
        insert_review(&conn, &review(cid, "total_amount", Some(false), None)).unwrap();
        insert_review(&conn, &review(cid, "total_amount", Some(true), None)).unwrap();
        assert_eq!(list_reviews(&conn, &cid).unwrap().len(), 2);
    }
}
