//! CSV ingestion for the two source datasets.
//!
//! The upstream export combines observation date and time into a single
//! `ObservationDate` column (`%m/%d/%Y HH:MM`); ingestion splits it back
//! into the two store columns. Rows are inserted in file order inside one
//! transaction, since classification and summarization depend on dataset
//! order.

use std::path::Path;

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use rusqlite::Connection;
use serde::Deserialize;
use thiserror::Error;

use crate::db::repository::{medication, vital};
use crate::db::DatabaseError;
use crate::models::{MedicationRecord, VitalRecord};

/// Source export date formats.
const SOURCE_DATE_FORMAT: &str = "%m/%d/%Y";
const SOURCE_DATETIME_FORMAT: &str = "%m/%d/%Y %H:%M";

#[derive(Error, Debug)]
pub enum IngestError {
    #[error("Cannot read {path}: {reason}")]
    Read { path: String, reason: String },

    #[error("CSV parse error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Invalid date '{value}' (expected {format})")]
    InvalidDate { value: String, format: &'static str },

    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),
}

/// One row of vital.csv, as exported upstream.
#[derive(Debug, Deserialize)]
struct VitalCsvRow {
    #[serde(rename = "PatientID")]
    patient_id: String,
    #[serde(rename = "ComponentID")]
    component_id: String,
    #[serde(rename = "ObservationDate")]
    observation_date: Option<String>,
    #[serde(rename = "ObservationResult")]
    observation_result: String,
    #[serde(rename = "ObservationUnits")]
    observation_units: Option<String>,
}

/// One row of medication.csv, as exported upstream.
#[derive(Debug, Deserialize)]
struct MedicationCsvRow {
    #[serde(rename = "PatientID")]
    patient_id: String,
    #[serde(rename = "MedInterval")]
    med_interval: Option<String>,
    #[serde(rename = "OrderStartDate")]
    order_start_date: Option<String>,
    #[serde(rename = "Description")]
    description: String,
    #[serde(rename = "Amount")]
    amount: Option<f64>,
    #[serde(rename = "Units")]
    units: Option<String>,
    #[serde(rename = "DosageForm")]
    dosage_form: Option<String>,
    #[serde(rename = "ProviderInstructions")]
    provider_instructions: String,
}

/// Import vital.csv into the store. Returns the number of rows inserted.
pub fn import_vitals(conn: &mut Connection, path: &Path) -> Result<usize, IngestError> {
    let mut reader = open_csv(path)?;
    let tx = conn.transaction().map_err(DatabaseError::from)?;

    let mut inserted = 0;
    for row in reader.deserialize::<VitalCsvRow>() {
        let row = row?;
        let (observation_date, observation_time) =
            split_observation_timestamp(row.observation_date.as_deref())?;
        let record = VitalRecord {
            patient_id: row.patient_id,
            component_id: row.component_id,
            observation_date,
            observation_time,
            observation_result: row.observation_result,
            observation_units: none_if_blank(row.observation_units),
        };
        vital::insert_vital(&tx, &record)?;
        inserted += 1;
    }

    tx.commit().map_err(DatabaseError::from)?;
    tracing::info!(rows = inserted, path = %path.display(), "imported vital records");
    Ok(inserted)
}

/// Import medication.csv into the store. Returns the number of rows inserted.
pub fn import_medications(conn: &mut Connection, path: &Path) -> Result<usize, IngestError> {
    let mut reader = open_csv(path)?;
    let tx = conn.transaction().map_err(DatabaseError::from)?;

    let mut inserted = 0;
    for row in reader.deserialize::<MedicationCsvRow>() {
        let row = row?;
        let record = MedicationRecord {
            patient_id: row.patient_id,
            med_interval: none_if_blank(row.med_interval),
            order_start_date: parse_optional_datetime(row.order_start_date.as_deref())?,
            description: row.description,
            amount: row.amount,
            units: none_if_blank(row.units),
            dosage_form: none_if_blank(row.dosage_form),
            provider_instructions: row.provider_instructions,
        };
        medication::insert_medication(&tx, &record)?;
        inserted += 1;
    }

    tx.commit().map_err(DatabaseError::from)?;
    tracing::info!(rows = inserted, path = %path.display(), "imported medication records");
    Ok(inserted)
}

fn open_csv(path: &Path) -> Result<csv::Reader<std::fs::File>, IngestError> {
    csv::Reader::from_path(path).map_err(|e| IngestError::Read {
        path: path.display().to_string(),
        reason: e.to_string(),
    })
}

/// Split the combined `ObservationDate` column into date and time.
///
/// Accepts `%m/%d/%Y`, `%m/%d/%Y HH:MM` and `%m/%d/%Y HH:MM:SS`; an empty
/// column yields neither.
fn split_observation_timestamp(
    raw: Option<&str>,
) -> Result<(Option<NaiveDate>, Option<NaiveTime>), IngestError> {
    let raw = match raw.map(str::trim) {
        Some(value) if !value.is_empty() => value,
        _ => return Ok((None, None)),
    };

    let mut parts = raw.splitn(2, ' ');
    let date_part = parts.next().unwrap_or(raw);
    let time_part = parts.next().map(str::trim).filter(|t| !t.is_empty());

    let date = NaiveDate::parse_from_str(date_part, SOURCE_DATE_FORMAT).map_err(|_| {
        IngestError::InvalidDate {
            value: raw.to_string(),
            format: SOURCE_DATE_FORMAT,
        }
    })?;

    let time = match time_part {
        Some(t) => Some(
            NaiveTime::parse_from_str(t, "%H:%M:%S")
                .or_else(|_| NaiveTime::parse_from_str(t, "%H:%M"))
                .map_err(|_| IngestError::InvalidDate {
                    value: raw.to_string(),
                    format: SOURCE_DATETIME_FORMAT,
                })?,
        ),
        None => None,
    };

    Ok((Some(date), time))
}

fn parse_optional_datetime(raw: Option<&str>) -> Result<Option<NaiveDateTime>, IngestError> {
    let raw = match raw.map(str::trim) {
        Some(value) if !value.is_empty() => value,
        _ => return Ok(None),
    };

    NaiveDateTime::parse_from_str(raw, SOURCE_DATETIME_FORMAT)
        .map(Some)
        .map_err(|_| IngestError::InvalidDate {
            value: raw.to_string(),
            format: SOURCE_DATETIME_FORMAT,
        })
}

fn none_if_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}
