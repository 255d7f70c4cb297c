//! Handlers for the `/groups` resource.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use groupops_core::error::CoreError;
use groupops_core::types::DbId;
use groupops_db::models::group::{Group, GroupWithCount};
use groupops_db::models::participant::Participant;
use groupops_db::repositories::{GroupRepo, ParticipantRepo};

use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthUser;
use crate::response::DataResponse;
use crate::state::AppState;

/// Verify that a group exists, returning the full row.
async fn ensure_group_exists(pool: &sqlx::PgPool, id: DbId) -> AppResult<Group> {
    GroupRepo::find_by_id(pool, id).await?.ok_or_else(|| {
        AppError::Core(CoreError::NotFound {
            entity: "Group",
            id,
        })
    })
}

/// GET /api/v1/groups
pub async fn list_groups(
    _auth: AuthUser,
    State(state): State<AppState>,
) -> AppResult<Json<DataResponse<Vec<GroupWithCount>>>> {
    let groups = GroupRepo::list_with_counts(&state.pool).await?;
    Ok(Json(DataResponse { data: groups }))
}

/// GET /api/v1/groups/{id}
pub async fn get_group(
    _auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<Group>>> {
    let group = ensure_group_exists(&state.pool, id).await?;
    Ok(Json(DataResponse { data: group }))
}

/// DELETE /api/v1/groups/{id}
///
/// Removes the group and, by cascade, its participants. Returns 204.
pub async fn delete_group(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<StatusCode> {
    if !GroupRepo::delete(&state.pool, id).await? {
        return Err(AppError::Core(CoreError::NotFound {
            entity: "Group",
            id,
        }));
    }
    tracing::info!(user_id = auth.user_id, group_id = id, "Group deleted");
    Ok(StatusCode::NO_CONTENT)
}

/// GET /api/v1/groups/{id}/participants
pub async fn list_group_participants(
    _auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<Vec<Participant>>>> {
    ensure_group_exists(&state.pool, id).await?;
    let participants = ParticipantRepo::list_by_group(&state.pool, id).await?;
    Ok(Json(DataResponse { data: participants }))
}
