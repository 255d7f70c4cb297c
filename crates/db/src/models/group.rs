//! Group entity model.

use chrono::NaiveDate;
use serde::Serialize;
use sqlx::FromRow;
use groupops_core::types::{DbId, Timestamp};

/// A group row from the `groups` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Group {
    pub id: DbId,
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
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// A group with its participant count, used by the listing endpoint.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct GroupWithCount {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub group: Group,
    pub participant_count: i64,
}
