//! Route definitions for the `/groups` resource.

use axum::routing::get;
use axum::Router;

use crate::handlers::groups;
use crate::state::AppState;

/// Routes mounted at `/groups`.
///
/// ```text
/// GET    /                    -> list_groups
/// GET    /{id}                -> get_group
/// DELETE /{id}                -> delete_group
/// GET    /{id}/participants   -> list_group_participants
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(groups::list_groups))
        .route("/{id}", get(groups::get_group).delete(groups::delete_group))
        .route("/{id}/participants", get(groups::list_group_participants))
}
