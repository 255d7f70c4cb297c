//! Handlers for the `/participants` resource.

use axum::extract::State;
use axum::Json;
use groupops_db::models::participant::Participant;
use groupops_db::repositories::ParticipantRepo;

use crate::error::AppResult;
use crate::middleware::auth::AuthUser;
use crate::response::DataResponse;
use crate::state::AppState;

/// GET /api/v1/participants
pub async fn list_participants(
    _auth: AuthUser,
    State(state): State<AppState>,
) -> AppResult<Json<DataResponse<Vec<Participant>>>> {
    let participants = ParticipantRepo::list(&state.pool).await?;
    Ok(Json(DataResponse { data: participants }))
}
