use rusqlite::{params, Connection};

use crate::db::DatabaseError;
use crate::models::MedicationRecord;

/// Insert a medication record.
pub fn insert_medication(conn: &Connection, med: &MedicationRecord) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO medication (patientid, medinterval, orderstartdate, description, amount, units, dosageform, providerinstructions)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        params![
            med.patient_id,
            med.med_interval,
            med.order_start_date,
            med.description,
            med.amount,
            med.units,
            med.dosage_form,
            med.provider_instructions,
        ],
    )?;
    Ok(())
}

/// All medication records for one patient, in dataset (insertion) order.
///
/// The documentation summarizer concatenates rows in this order, so it is
/// pinned to rowid rather than left to the query planner.
pub fn medications_for_patient(
    conn: &Connection,
    patient_id: &str,
) -> Result<Vec<MedicationRecord>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT patientid, medinterval, orderstartdate, description, amount, units, dosageform, providerinstructions
         FROM medication
         WHERE patientid = ?1
         ORDER BY rowid",
    )?;
    let rows = stmt.query_map(params![patient_id], row_to_medication)?;
    rows.collect::<Result<Vec<_>, _>>().map_err(DatabaseError::from)
}

fn row_to_medication(row: &rusqlite::Row) -> Result<MedicationRecord, rusqlite::Error> {
    Ok(MedicationRecord {
        patient_id: row.get(0)?,
        med_interval: row.get(1)?,
        order_start_date: row.get(2)?,
        description: row.get(3)?,
        amount: row.get(4)?,
        units: row.get(5)?,
        dosage_form: row.get(6)?,
        provider_instructions: row.get(7)?,
    })
}
