use rusqlite::{params, Connection};

use crate::db::DatabaseError;
use crate::models::VitalRecord;

/// Insert a vital record.
pub fn insert_vital(conn: &Connection, record: &VitalRecord) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO vital (patientid, componentid, observationdate, observationtime, observationresult, observationunits)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![
            record.patient_id,
            record.component_id,
            record.observation_date,
            record.observation_time,
            record.observation_result,
            record.observation_units,
        ],
    )?;
    Ok(())
}

/// All vital records for one patient, in dataset (insertion) order.
///
/// The classifier's first-match-wins rule depends on this ordering, so it is
/// pinned to rowid rather than left to the query planner.
pub fn vitals_for_patient(
    conn: &Connection,
    patient_id: &str,
) -> Result<Vec<VitalRecord>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT patientid, componentid, observationdate, observationtime, observationresult, observationunits
         FROM vital
         WHERE patientid = ?1
         ORDER BY rowid",
    )?;
    let rows = stmt.query_map(params![patient_id], row_to_vital)?;
    rows.collect::<Result<Vec<_>, _>>().map_err(DatabaseError::from)
}

/// Whether any vital row exists for this patient.
pub fn patient_has_vitals(conn: &Connection, patient_id: &str) -> Result<bool, DatabaseError> {
    let exists: bool = conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM vital WHERE patientid = ?1)",
        params![patient_id],
        |row| row.get(0),
    )?;
    Ok(exists)
}

fn row_to_vital(row: &rusqlite::Row) -> Result<VitalRecord, rusqlite::Error> {
    Ok(VitalRecord {
        patient_id: row.get(0)?,
        component_id: row.get(1)?,
        observation_date: row.get(2)?,
        observation_time: row.get(3)?,
        observation_result: row.get(4)?,
        observation_units: row.get(5)?,
    })
}
