//! Repository for the `participants` table.

use sqlx::PgPool;
use groupops_core::types::DbId;

use crate::models::participant::{CreateParticipant, Participant};

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str = "id, group_id, first_name, last_name, participant_type, \
    date_of_birth, created_at, updated_at";

/// Provides read and create operations for participants.
pub struct ParticipantRepo;

impl ParticipantRepo {
    /// Insert a new participant, returning the created row.
    ///
    /// If `participant_type` is `None` in the input, defaults to `student`.
    /// Used to seed rosters in tests; participants are read-only over HTTP.
    pub async fn create(
        pool: &PgPool,
        input: &CreateParticipant,
    ) -> Result<Participant, sqlx::Error> {
        let query = format!(
            "INSERT INTO participants (group_id, first_name, last_name, participant_type, date_of_birth)
             VALUES ($1, $2, $3, COALESCE($4, 'student'), $5)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Participant>(&query)
            .bind(input.group_id)
            .bind(&input.first_name)
            .bind(&input.last_name)
            .bind(&input.participant_type)
            .bind(input.date_of_birth)
            .fetch_one(pool)
            .await
    }

    /// List the participants of one group, leaders first, then by name.
    pub async fn list_by_group(
        pool: &PgPool,
        group_id: DbId,
    ) -> Result<Vec<Participant>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM participants \
             WHERE group_id = $1 \
             ORDER BY participant_type = 'leader' DESC, last_name, first_name"
        );
        sqlx::query_as::<_, Participant>(&query)
            .bind(group_id)
            .fetch_all(pool)
            .await
    }

    /// List every participant ordered by group, then name.
    pub async fn list(pool: &PgPool) -> Result<Vec<Participant>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM participants ORDER BY group_id, last_name, first_name"
        );
        sqlx::query_as::<_, Participant>(&query).fetch_all(pool).await
    }
}
