//! Route definitions for bulk imports.
//!
//! Mounted at `/import`.

use axum::routing::post;
use axum::Router;

use crate::handlers::import;
use crate::state::AppState;

/// Routes mounted at `/import`.
///
/// ```text
/// POST   /groups          -> import_groups
/// ```
pub fn router() -> Router<AppState> {
    Router::new().route("/groups", post(import::import_groups))
}
