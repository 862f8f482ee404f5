use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, Row};
use uuid::Uuid;

use super::uuid_column;
use crate::db::DatabaseError;
use crate::models::PrescriptionRecord;

/// Insert a new analysis for `owner`, stamped with the current time.
pub fn insert_prescription(
    conn: &Connection,
    owner: &str,
    raw_analysis: &str,
) -> Result<PrescriptionRecord, DatabaseError> {
    let record = PrescriptionRecord {
        id: Uuid::new_v4(),
        owner: owner.to_string(),
        raw_analysis: raw_analysis.to_string(),
        uploaded_at: Utc::now(),
    };
    conn.execute(
        "INSERT INTO prescriptions (id, owner_id, raw_analysis, uploaded_at)
         VALUES (?1, ?2, ?3, ?4)",
        params![
            record.id.to_string(),
            record.owner,
            record.raw_analysis,
            record.uploaded_at,
        ],
    )?;
    Ok(record)
}

/// Fetch a record only if it belongs to `owner`.
///
/// Returns `None` both for unknown ids and for other patients' records.
pub fn get_prescription(
    conn: &Connection,
    id: &Uuid,
    owner: &str,
) -> Result<Option<PrescriptionRecord>, DatabaseError> {
    let result = conn.query_row(
        "SELECT id, owner_id, raw_analysis, uploaded_at
         FROM prescriptions WHERE id = ?1 AND owner_id = ?2",
        params![id.to_string(), owner],
        record_from_row,
    );

    match result {
        Ok(record) => Ok(Some(record)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

/// All records of `owner`, newest first.
pub fn list_prescriptions_by_owner(
    conn: &Connection,
    owner: &str,
) -> Result<Vec<PrescriptionRecord>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT id, owner_id, raw_analysis, uploaded_at
         FROM prescriptions WHERE owner_id = ?1
         ORDER BY uploaded_at DESC",
    )?;
    let rows = stmt.query_map(params![owner], record_from_row)?;
    rows.collect::<Result<Vec<_>, _>>().map_err(DatabaseError::from)
}

/// Delete a record owned by `owner`. Returns whether a row was removed.
pub fn delete_prescription(
    conn: &Connection,
    id: &Uuid,
    owner: &str,
) -> Result<bool, DatabaseError> {
    let affected = conn.execute(
        "DELETE FROM prescriptions WHERE id = ?1 AND owner_id = ?2",
        params![id.to_string(), owner],
    )?;
    Ok(affected > 0)
}

fn record_from_row(row: &Row<'_>) -> Result<PrescriptionRecord, rusqlite::Error> {
    Ok(PrescriptionRecord {
        id: uuid_column(row.get(0)?, 0)?,
        owner: row.get(1)?,
        raw_analysis: row.get(2)?,
        uploaded_at: row.get::<_, DateTime<Utc>>(3)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::sqlite::open_memory_database;

    #[test]
    fn insert_then_get_round_trips() {
        let conn = open_memory_database().unwrap();
        let created = insert_prescription(&conn, "alice", "{\"a\":1}").unwrap();

        let fetched = get_prescription(&conn, &created.id, "alice").unwrap().unwrap();
        assert_eq!(fetched.id, created.id);
        assert_eq!(fetched.owner, "alice");
        assert_eq!(fetched.raw_analysis, "{\"a\":1}");
        assert_eq!(fetched.uploaded_at, created.uploaded_at);
    }

    #[test]
    fn get_by_other_owner_is_not_found() {
        let conn = open_memory_database().unwrap();
        let created = insert_prescription(&conn, "alice", "secret").unwrap();

        assert!(get_prescription(&conn, &created.id, "bob").unwrap().is_none());
    }

    #[test]
    fn get_unknown_id_is_not_found() {
        let conn = open_memory_database().unwrap();
        assert!(get_prescription(&conn, &Uuid::new_v4(), "alice").unwrap().is_none());
    }

    #[test]
    fn delete_by_other_owner_leaves_record() {
        let conn = open_memory_database().unwrap();
        let created = insert_prescription(&conn, "alice", "x").unwrap();

        assert!(!delete_prescription(&conn, &created.id, "bob").unwrap());
        assert!(get_prescription(&conn, &created.id, "alice").unwrap().is_some());
    }

    #[test]
    fn delete_twice_returns_false_second_time() {
        let conn = open_memory_database().unwrap();
        let created = insert_prescription(&conn, "alice", "x").unwrap();

        assert!(delete_prescription(&conn, &created.id, "alice").unwrap());
        assert!(!delete_prescription(&conn, &created.id, "alice").unwrap());
        assert!(get_prescription(&conn, &created.id, "alice").unwrap().is_none());
    }

    #[test]
    fn list_is_owner_scoped_and_newest_first() {
        let conn = open_memory_database().unwrap();
        let first = insert_prescription(&conn, "alice", "one").unwrap();
        std::thread::sleep(std::time::Duration::from_millis(5));
        let second = insert_prescription(&conn, "alice", "two").unwrap();
        insert_prescription(&conn, "bob", "other").unwrap();

        let listed = list_prescriptions_by_owner(&conn, "alice").unwrap();
        assert_eq!(listed.len(), 2);
        assert_eq!(listed[0].id, second.id);
        assert_eq!(listed[1].id, first.id);
        assert!(listed.iter().all(|r| r.owner == "alice"));
    }

    #[test]
    fn duplicate_content_is_allowed() {
        let conn = open_memory_database().unwrap();
        let a = insert_prescription(&conn, "alice", "same").unwrap();
        let b = insert_prescription(&conn, "alice", "same").unwrap();
        assert_ne!(a.id, b.id);
        assert_eq!(list_prescriptions_by_owner(&conn, "alice").unwrap().len(), 2);
    }
}
