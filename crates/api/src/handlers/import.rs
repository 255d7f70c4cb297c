//! Handler for the batch group import (`POST /import/groups`).
//!
//! Record-level problems come back as data in a 200 response. Only an
//! invalid payload (400) or a failed transaction (500) is an HTTP error.

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::Json;
use serde::Serialize;
use groupops_core::group_import::{
    parse_payload, ImportError, ImportOutcome, RecordError, SkippedRecord,
};

use crate::error::AppResult;
use crate::middleware::auth::AuthUser;
use crate::state::AppState;

/// Response body for a completed import call.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportResponse {
    pub success: bool,
    pub message: String,
    pub imported: usize,
    pub total_processed: usize,
    pub skipped: usize,
    pub errored: usize,
    pub errors: Vec<RecordError>,
    pub skipped_records: Vec<SkippedRecord>,
}

impl From<ImportOutcome> for ImportResponse {
    fn from(outcome: ImportOutcome) -> Self {
        Self {
            success: true,
            message: outcome.summary(),
            imported: outcome.imported,
            total_processed: outcome.total_processed,
            skipped: outcome.skipped_count(),
            errored: outcome.errored(),
            errors: outcome.errors,
            skipped_records: outcome.skipped,
        }
    }
}

/// POST /api/v1/import/groups
///
/// Body: a JSON array of group records. Each record is inserted, skipped or
/// reported as an error; see [`ImportResponse`]. A missing or malformed
/// body is an invalid payload like any other.
pub async fn import_groups(
    auth: AuthUser,
    State(state): State<AppState>,
    payload: Result<Json<serde_json::Value>, JsonRejection>,
) -> AppResult<Json<ImportResponse>> {
    let Json(payload) =
        payload.map_err(|rejection| ImportError::InvalidPayload(rejection.body_text()))?;
    let records = parse_payload(&payload, state.config.max_import_records)?;

    let outcome = groupops_db::group_import::import_groups(&state.pool, &records).await?;

    tracing::info!(
        user_id = auth.user_id,
        imported = outcome.imported,
        skipped = outcome.skipped_count(),
        errored = outcome.errored(),
        total = outcome.total_processed,
        "Group import finished"
    );

    Ok(Json(ImportResponse::from(outcome)))
}
