pub mod auth;
pub mod groups;
pub mod health;
pub mod import;
pub mod participants;

use axum::Router;

use crate::state::AppState;

/// Build the `/api/v1` route tree.
///
/// Route hierarchy:
///
/// ```text
/// /auth/login                          login (public)
///
/// /import/groups                       batch group import (POST)
///
/// /groups                              list
/// /groups/{id}                         get, delete
/// /groups/{id}/participants            list participants of a group
///
/// /participants                        list all participants
/// ```
///
/// Everything except `/auth/login` requires a Bearer token.
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .nest("/auth", auth::router())
        .nest("/import", import::router())
        .nest("/groups", groups::router())
        .nest("/participants", participants::router())
}
