//! Repository for the `groups` table.

use sqlx::{PgConnection, PgPool};
use groupops_core::group_import::NewGroup;
use groupops_core::types::DbId;

use crate::models::group::{Group, GroupWithCount};

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str = "id, name, agency, arrival_date, departure_date, \
    students_allocated, leaders_allocated, students_booked, leaders_booked, \
    centre, arrival_flight_time, departure_flight_time, created_at, updated_at";

/// Same columns qualified with the `g` alias, for joins.
const G_COLUMNS: &str = "g.id, g.name, g.agency, g.arrival_date, g.departure_date, \
    g.students_allocated, g.leaders_allocated, g.students_booked, g.leaders_booked, \
    g.centre, g.arrival_flight_time, g.departure_flight_time, g.created_at, g.updated_at";

/// Provides read, delete and idempotent-insert operations for groups.
pub struct GroupRepo;

impl GroupRepo {
    /// Insert a group unless one with the same name exists.
    ///
    /// Runs on a caller-supplied connection so it can take part in a
    /// transaction. Returns `true` if a row was written, `false` if the
    /// name already existed.
    pub async fn insert_if_absent(
        conn: &mut PgConnection,
        input: &NewGroup,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "INSERT INTO groups \
                (name, agency, arrival_date, departure_date, \
                 students_allocated, leaders_allocated, students_booked, leaders_booked, \
                 centre, arrival_flight_time, departure_flight_time) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11) \
             ON CONFLICT (name) DO NOTHING",
        )
        .bind(&input.name)
        .bind(&input.agency)
        .bind(input.arrival_date)
        .bind(input.departure_date)
        .bind(input.students_allocated)
        .bind(input.leaders_allocated)
        .bind(input.students_booked)
        .bind(input.leaders_booked)
        .bind(&input.centre)
        .bind(&input.arrival_flight_time)
        .bind(&input.departure_flight_time)
        .execute(conn)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Find a group by its internal ID.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Group>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM groups WHERE id = $1");
        sqlx::query_as::<_, Group>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Find a group by its unique name.
    pub async fn find_by_name(pool: &PgPool, name: &str) -> Result<Option<Group>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM groups WHERE name = $1");
        sqlx::query_as::<_, Group>(&query)
            .bind(name)
            .fetch_optional(pool)
            .await
    }

    /// List all groups with their participant counts, soonest arrival first.
    pub async fn list_with_counts(pool: &PgPool) -> Result<Vec<GroupWithCount>, sqlx::Error> {
        let query = format!(
            "SELECT {G_COLUMNS}, COUNT(p.id) AS participant_count \
             FROM groups g \
             LEFT JOIN participants p ON p.group_id = g.id \
             GROUP BY g.id \
             ORDER BY g.arrival_date, g.name"
        );
        sqlx::query_as::<_, GroupWithCount>(&query)
            .fetch_all(pool)
            .await
    }

    /// Count all groups.
    pub async fn count(pool: &PgPool) -> Result<i64, sqlx::Error> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM groups")
            .fetch_one(pool)
            .await?;
        Ok(count)
    }

    /// Delete a group by ID. Participants cascade. Returns `true` if a row was removed.
    pub async fn delete(pool: &PgPool, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM groups WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
