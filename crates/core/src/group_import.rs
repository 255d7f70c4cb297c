//! Batch import of group records.
//!
//! This module has no database or HTTP dependencies. It provides:
//!
//! - [`ImportRecord`], the explicit shape of one incoming record, built from
//!   arbitrary JSON with per-field coercion rules
//! - mandatory-field validation and normalization into a [`NewGroup`]
//! - [`ImportOutcome`], the per-call accounting of every record
//! - [`run_import`], the sequential driver, generic over a
//!   [`GroupImportStore`] so it runs against Postgres or an in-memory fake
//!
//! Every input record is classified exactly once: inserted, skipped for
//! missing mandatory fields, or errored. Record-level faults are collected
//! and the batch continues; a transaction-level fault aborts the call.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::Serialize;
use serde_json::Value;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Name reported for a record whose `groupName` is missing or blank.
pub const UNNAMED_GROUP: &str = "(unnamed)";

/// Error reported when the idempotent insert affected no row.
pub const ALREADY_EXISTS_MESSAGE: &str = "already exists or not inserted";

/// Default upper bound on the number of records accepted in one call.
pub const DEFAULT_MAX_IMPORT_RECORDS: usize = 5000;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Call-level import failures. Record-level problems never surface here;
/// they are reported inside [`ImportOutcome`].
#[derive(Debug, thiserror::Error)]
pub enum ImportError {
    /// The payload is not a non-empty list of records (or is too large).
    /// Raised before the store is touched.
    #[error("Invalid payload: {0}")]
    InvalidPayload(String),

    /// A fault outside individual record processing. Nothing from the call
    /// was committed.
    #[error("Import transaction failed: {0}")]
    TransactionFailure(String),
}

/// A fault raised by a [`GroupImportStore`] while inserting one group.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreFault {
    /// The store rejected this row only. The transaction is still usable.
    #[error("{0}")]
    Record(String),

    /// The transaction or connection is gone.
    #[error("{0}")]
    Transaction(String),
}

// ---------------------------------------------------------------------------
// Record shape and coercion
// ---------------------------------------------------------------------------

/// A mandatory field of an import record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum MandatoryField {
    GroupName,
    ArrivalDate,
    DepartureDate,
}

impl MandatoryField {
    /// The JSON key of the field.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::GroupName => "groupName",
            Self::ArrivalDate => "arrivalDate",
            Self::DepartureDate => "departureDate",
        }
    }
}

impl std::fmt::Display for MandatoryField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One incoming group record after coercion, before validation.
///
/// Text fields are trimmed and blank values become `None`. Numeric fields
/// hold `None` for anything that is not an `i32`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImportRecord {
    pub group_name: Option<String>,
    pub agency: Option<String>,
    pub arrival_date: Option<String>,
    pub departure_date: Option<String>,
    pub students_allocated: Option<i32>,
    pub leaders_allocated: Option<i32>,
    pub students_booked: Option<i32>,
    pub leaders_booked: Option<i32>,
    pub centre: Option<String>,
    pub arrival_flight_time: Option<String>,
    pub departure_flight_time: Option<String>,
}

impl ImportRecord {
    /// Build a record from one element of the submitted JSON array.
    ///
    /// A non-object element yields a record with every field absent.
    pub fn from_json(value: &Value) -> Self {
        let Some(obj) = value.as_object() else {
            return Self::default();
        };
        let text = |key: &str| obj.get(key).and_then(coerce_text);
        let int = |key: &str| obj.get(key).and_then(coerce_int);

        Self {
            group_name: text("groupName"),
            agency: text("agency"),
            arrival_date: text("arrivalDate"),
            departure_date: text("departureDate"),
            students_allocated: int("studentsAllocated"),
            leaders_allocated: int("leadersAllocated"),
            students_booked: int("studentsBooked"),
            leaders_booked: int("leadersBooked"),
            centre: text("centre"),
            arrival_flight_time: text("arrivalFlightTime"),
            departure_flight_time: text("departureFlightTime"),
        }
    }

    /// Name used in the outcome report for this record.
    pub fn display_name(&self) -> &str {
        self.group_name.as_deref().unwrap_or(UNNAMED_GROUP)
    }

    /// Mandatory fields that are absent or blank, in declaration order.
    pub fn missing_fields(&self) -> Vec<MandatoryField> {
        [
            (MandatoryField::GroupName, &self.group_name),
            (MandatoryField::ArrivalDate, &self.arrival_date),
            (MandatoryField::DepartureDate, &self.departure_date),
        ]
        .into_iter()
        .filter(|(_, value)| value.is_none())
        .map(|(field, _)| field)
        .collect()
    }

    /// Convert into an insertable [`NewGroup`].
    ///
    /// Returns a human-readable message if a mandatory field is missing or
    /// a date does not parse.
    pub fn normalize(&self) -> Result<NewGroup, String> {
        let missing = self.missing_fields();
        if !missing.is_empty() {
            return Err(format!("missing mandatory fields: {}", join_fields(&missing)));
        }

        let name = self.group_name.clone().unwrap_or_default();
        let arrival = self.arrival_date.as_deref().unwrap_or_default();
        let departure = self.departure_date.as_deref().unwrap_or_default();
        let arrival_date =
            parse_date(arrival).ok_or_else(|| format!("invalid arrival date '{arrival}'"))?;
        let departure_date =
            parse_date(departure).ok_or_else(|| format!("invalid departure date '{departure}'"))?;

        Ok(NewGroup {
            name,
            agency: self.agency.clone(),
            arrival_date,
            departure_date,
            students_allocated: self.students_allocated,
            leaders_allocated: self.leaders_allocated,
            students_booked: self.students_booked,
            leaders_booked: self.leaders_booked,
            centre: self.centre.clone(),
            arrival_flight_time: self.arrival_flight_time.clone(),
            departure_flight_time: self.departure_flight_time.clone(),
        })
    }
}

/// A validated group ready for insertion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewGroup {
    pub name: String,
    pub agency: Option<String>,
    pub arrival_date: NaiveDate,
    pub departure_date: NaiveDate,
    pub students_allocated: Option<i32>,
    pub leaders_allocated: Option<i32>,
    pub students_booked: Option<i32>,
    pub leaders_booked: Option<i32>,
    pub centre: Option<String>,
    pub arrival_flight_time: Option<String>,
    pub departure_flight_time: Option<String>,
}

/// Coerce a JSON value into trimmed text. Numbers are rendered; blank
/// strings and every other type become `None`.
pub fn coerce_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => {
            let trimmed = s.trim();
            (!trimmed.is_empty()).then(|| trimmed.to_string())
        }
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Permissive integer coercion: JSON integers and numeric strings within
/// `i32` range parse, everything else becomes `None`.
pub fn coerce_int(value: &Value) -> Option<i32> {
    match value {
        Value::Number(n) => n.as_i64().and_then(|v| i32::try_from(v).ok()),
        Value::String(s) => s.trim().parse::<i32>().ok(),
        _ => None,
    }
}

/// Parse a calendar date. Accepts `YYYY-MM-DD`, RFC 3339 timestamps and
/// naive `YYYY-MM-DDTHH:MM:SS` timestamps (the time part is dropped).
pub fn parse_date(input: &str) -> Option<NaiveDate> {
    let input = input.trim();
    NaiveDate::parse_from_str(input, "%Y-%m-%d")
        .ok()
        .or_else(|| DateTime::parse_from_rfc3339(input).ok().map(|dt| dt.date_naive()))
        .or_else(|| {
            NaiveDateTime::parse_from_str(input, "%Y-%m-%dT%H:%M:%S%.f")
                .ok()
                .map(|dt| dt.date())
        })
}

fn join_fields(fields: &[MandatoryField]) -> String {
    fields
        .iter()
        .map(MandatoryField::as_str)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Validate the shape of the submitted payload and coerce every element.
///
/// Fails with [`ImportError::InvalidPayload`] unless `payload` is a
/// non-empty array of at most `max_records` elements.
pub fn parse_payload(
    payload: &Value,
    max_records: usize,
) -> Result<Vec<ImportRecord>, ImportError> {
    let items = payload
        .as_array()
        .ok_or_else(|| ImportError::InvalidPayload("expected a JSON array of groups".into()))?;

    if items.is_empty() {
        return Err(ImportError::InvalidPayload("no groups to import".into()));
    }
    if items.len() > max_records {
        return Err(ImportError::InvalidPayload(format!(
            "too many groups: {} (maximum {max_records})",
            items.len()
        )));
    }

    Ok(items.iter().map(ImportRecord::from_json).collect())
}

// ---------------------------------------------------------------------------
// Outcome report
// ---------------------------------------------------------------------------

/// Classification of a single record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordOutcome {
    Inserted,
    Skipped(Vec<MandatoryField>),
    Errored(String),
}

/// A record that reached normalization or the store and was not inserted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordError {
    pub group_name: String,
    pub error: String,
}

/// A record skipped for missing mandatory fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SkippedRecord {
    pub group_name: String,
    pub missing_fields: Vec<MandatoryField>,
}

/// Accounting of one import call. Built incrementally, never persisted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImportOutcome {
    pub imported: usize,
    pub errors: Vec<RecordError>,
    pub skipped: Vec<SkippedRecord>,
    pub total_processed: usize,
}

impl ImportOutcome {
    /// Add one record's classification to the report.
    pub fn record(&mut self, group_name: impl Into<String>, outcome: RecordOutcome) {
        let group_name = group_name.into();
        match outcome {
            RecordOutcome::Inserted => self.imported += 1,
            RecordOutcome::Skipped(missing_fields) => self.skipped.push(SkippedRecord {
                group_name,
                missing_fields,
            }),
            RecordOutcome::Errored(error) => self.errors.push(RecordError { group_name, error }),
        }
        self.total_processed += 1;
    }

    pub fn errored(&self) -> usize {
        self.errors.len()
    }

    pub fn skipped_count(&self) -> usize {
        self.skipped.len()
    }

    /// `true` when the three buckets partition the processed records.
    pub fn is_balanced(&self) -> bool {
        self.imported + self.errored() + self.skipped_count() == self.total_processed
    }

    /// Human-readable summary composed from the three counts.
    pub fn summary(&self) -> String {
        format!(
            "Imported {} of {} groups ({} skipped for missing fields, {} failed)",
            self.imported,
            self.total_processed,
            self.skipped_count(),
            self.errored()
        )
    }
}

// ---------------------------------------------------------------------------
// Store seam and driver
// ---------------------------------------------------------------------------

/// Result of an idempotent insert.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertResult {
    Inserted,
    /// A group with the same name already exists; nothing was written.
    AlreadyExists,
}

/// Destination of an import call. One instance spans one transaction.
#[async_trait]
pub trait GroupImportStore: Send {
    /// Insert `group` unless a group with the same name exists.
    async fn insert_group(&mut self, group: &NewGroup) -> Result<InsertResult, StoreFault>;
}

/// Process `records` in order against `store`.
///
/// Skipped and errored records never abort the batch. The first
/// [`StoreFault::Transaction`] aborts it with
/// [`ImportError::TransactionFailure`]; the caller must then discard the
/// store's transaction instead of committing it.
pub async fn run_import<S>(
    store: &mut S,
    records: &[ImportRecord],
) -> Result<ImportOutcome, ImportError>
where
    S: GroupImportStore + ?Sized,
{
    let mut outcome = ImportOutcome::default();

    for record in records {
        let name = record.display_name().to_string();

        let missing = record.missing_fields();
        if !missing.is_empty() {
            outcome.record(name, RecordOutcome::Skipped(missing));
            continue;
        }

        let group = match record.normalize() {
            Ok(group) => group,
            Err(message) => {
                outcome.record(name, RecordOutcome::Errored(message));
                continue;
            }
        };

        let classified = match store.insert_group(&group).await {
            Ok(InsertResult::Inserted) => RecordOutcome::Inserted,
            Ok(InsertResult::AlreadyExists) => {
                RecordOutcome::Errored(ALREADY_EXISTS_MESSAGE.to_string())
            }
            Err(StoreFault::Record(message)) => RecordOutcome::Errored(message),
            Err(StoreFault::Transaction(message)) => {
                return Err(ImportError::TransactionFailure(message));
            }
        };
        outcome.record(name, classified);
    }

    debug_assert!(outcome.is_balanced());
    Ok(outcome)
}
