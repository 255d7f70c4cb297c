//! Participant entity model and DTOs.

use chrono::NaiveDate;
use serde::Serialize;
use sqlx::FromRow;
use groupops_core::types::{DbId, Timestamp};

/// A participant row from the `participants` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Participant {
    pub id: DbId,
    pub group_id: DbId,
    pub first_name: String,
    pub last_name: String,
    /// `"student"` or `"leader"`.
    pub participant_type: String,
    pub date_of_birth: Option<NaiveDate>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// Fields for inserting a participant. Participants arrive from outside this
/// service; there is no endpoint that creates them.
#[derive(Debug, Clone)]
pub struct CreateParticipant {
    pub group_id: DbId,
    pub first_name: String,
    pub last_name: String,
    /// Defaults to `"student"` if omitted.
    pub participant_type: Option<String>,
    pub date_of_birth: Option<NaiveDate>,
}
