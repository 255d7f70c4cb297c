use std::sync::Arc;

use crate::config::ServerConfig;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// This is cheaply cloneable (inner data is behind `Arc` or is already `Clone`).
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool. Each handler acquires its own connection
    /// or transaction from it for the duration of the request.
    pub pool: groupops_db::DbPool,
    /// Server configuration.
    pub config: Arc<ServerConfig>,
}
