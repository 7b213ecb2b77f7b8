use std::str::FromStr;

use rusqlite::{params, Connection};
use uuid::Uuid;

use crate::db::DatabaseError;
use crate::models::enums::PartyType;
use crate::models::ContractParty;

pub fn insert_party(conn: &Connection, party: &ContractParty) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO contract_parties (id, contract_id, party_type, party_name,
         party_type_detail, tax_number, legal_representative, address, contact_info,
         confidence_score)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
        params![
            party.id.to_string(),
            party.contract_id.to_string(),
            party.party_type.as_str(),
            party.party_name,
            party.party_type_detail,
            party.tax_number,
            party.legal_representative,
            party.address,
            party.contact_info,
            party.confidence_score,
        ],
    )?;
    Ok(())
}

pub fn list_parties(conn: &Connection, contract_id: &Uuid) -> Result<Vec<ContractParty>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT id, contract_id, party_type, party_name, party_type_detail, tax_number,
         legal_representative, address, contact_info, confidence_score
         FROM contract_parties WHERE contract_id = ?1 ORDER BY party_type ASC",
    )?;
    let rows = stmt.query_map(params![contract_id.to_string()], |row| {
        Ok((
            row.get::<_, String>(0)?,
            row.get::<_, String>(1)?,
            row.get::<_, String>(2)?,
            row.get::<_, String>(3)?,
            row.get::<_, Option<String>>(4)?,
            row.get::<_, Option<String>>(5)?,
            row.get::<_, Option<String>>(6)?,
            row.get::<_, Option<String>>(7)?,
            row.get::<_, Option<String>>(8)?,
            row.get::<_, Option<f32>>(9)?,
        ))
    })?;

    let mut parties = Vec::new();
    for row in rows {
        let (id, contract_id, party_type, party_name, detail, tax, legal, address, contact, conf) =
            row?;
        parties.push(ContractParty {
            id: Uuid::parse_str(&id)
                .map_err(|e| DatabaseError::ConstraintViolation(e.to_string()))?,
            contract_id: Uuid::parse_str(&contract_id)
                .map_err(|e| DatabaseError::ConstraintViolation(e.to_string()))?,
            party_type: PartyType::from_str(&party_type)?,
            party_name,
            party_type_detail: detail,
            tax_number: tax,
            legal_representative: legal,
            address,
            contact_info: contact,
            confidence_score: conf,
        });
    }
    Ok(parties)
}

pub fn delete_parties(conn: &Connection, contract_id: &Uuid) -> Result<usize, DatabaseError> {
    let deleted = conn.execute(
        "DELETE FROM contract_parties WHERE contract_id = ?1",
        params![contract_id.to_string()],
    )?;
    Ok(deleted)
}

/// Atomic swap of a contract's party set: delete existing, insert the new
/// set. Callers wanting all-or-nothing semantics pass a transaction
/// connection; this function never merges into existing rows.
pub fn replace_parties(
    conn: &Connection,
    contract_id: &Uuid,
    parties: &[ContractParty],
) -> Result<(), DatabaseError> {
    delete_parties(conn, contract_id)?;
    for party in parties {
        insert_party(conn, party)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repository::contract::insert_contract;
    use crate::db::sqlite::open_memory_database;
    use crate::models::{Contract, ContractType};

    fn party(contract_id: Uuid, party_type: PartyType, name: &str) -> ContractParty {
        ContractParty {
            id: Uuid::new_v4(),
            contract_id,
            party_type,
            party_name: name.to_string(),
            party_type_detail: None,
            tax_number: None,
            legal_representative: None,
            address: None,
            contact_info: None,
            confidence_score: Some(0.9),
        }
    }

    fn setup() -> (rusqlite::Connection, Uuid) {
        let conn = open_memory_database().unwrap();
        let contract = Contract::new("HT-1", ContractType::Purchase, None);
        insert_contract(&conn, &contract).unwrap();
        (conn, contract.id)
    }

    #[test]
    fn replace_swaps_not_merges() {
        let (conn, cid) = setup();
        replace_parties(
            &conn,
            &cid,
            &[
                party(cid, PartyType::PartyA, "Acme Manufacturing"),
                party(cid, PartyType::PartyB, "Beta Logistics"),
            ],
        )
        .unwrap();
        assert_eq!(list_parties(&conn, &cid).unwrap().len(), 2);

        // Second extraction finds only one party — the old set must vanish.
        replace_parties(&conn, &cid, &[party(cid, PartyType::PartyA, "Acme Manufacturing")])
            .unwrap();
        let parties = list_parties(&conn, &cid).unwrap();
        assert_eq!(parties.len(), 1);
        assert_eq!(parties[0].party_name, "Acme Manufacturing");
    }

    #[test]
    fn parties_cascade_with_contract() {
        let (conn, cid) = setup();
        insert_party(&conn, &party(cid, PartyType::PartyA, "Acme")).unwrap();
        crate::db::repository::contract::delete_contract(&conn, &cid).unwrap();
        assert!(list_parties(&conn, &cid).unwrap().is_empty());
    }
}
