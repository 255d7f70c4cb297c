//! Database-level tests for the transaction-backed group import.

use assert_matches::assert_matches;
use async_trait::async_trait;
use serde_json::{json, Value};
use std::time::Duration;

use sqlx::{PgPool, Postgres, Transaction};
use tokio::task::JoinHandle;
use groupops_core::group_import::{
    parse_payload, run_import, GroupImportStore, ImportError, ImportRecord, InsertResult,
    NewGroup, StoreFault, ALREADY_EXISTS_MESSAGE, DEFAULT_MAX_IMPORT_RECORDS,
};
use groupops_db::group_import::{import_groups, PgGroupImportStore};
use groupops_db::repositories::GroupRepo;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn group(name: &str) -> Value {
    json!({ "groupName": name, "arrivalDate": "2024-06-01", "departureDate": "2024-06-10" })
}

fn records(payload: Value) -> Vec<ImportRecord> {
    parse_payload(&payload, DEFAULT_MAX_IMPORT_RECORDS).expect("payload should parse")
}

/// Delegates to the Postgres store and terminates its backend after the
/// first successful insert, simulating a lost connection mid-batch.
struct DropConnectionAfterFirst {
    inner: PgGroupImportStore,
    pool: PgPool,
    backend_pid: i32,
    calls: usize,
}

#[async_trait]
impl GroupImportStore for DropConnectionAfterFirst {
    async fn insert_group(&mut self, group: &NewGroup) -> Result<InsertResult, StoreFault> {
        if self.calls == 1 {
            let terminated: bool = sqlx::query_scalar("SELECT pg_terminate_backend($1, 5000)")
                .bind(self.backend_pid)
                .fetch_one(&self.pool)
                .await
                .expect("terminate query should run");
            assert!(terminated, "backend should have been terminated");
        }
        self.calls += 1;
        self.inner.insert_group(group).await
    }
}

/// Delegates to the Postgres store. Before the second insert it lets a rival
/// transaction, which already holds an uncommitted "Bravo", try to insert
/// "Alpha". Each side then waits on the other's unique key.
struct RivalOnSecond {
    inner: PgGroupImportStore,
    rival: Option<Transaction<'static, Postgres>>,
    rival_task: Option<JoinHandle<Transaction<'static, Postgres>>>,
    calls: usize,
}

#[async_trait]
impl GroupImportStore for RivalOnSecond {
    async fn insert_group(&mut self, group: &NewGroup) -> Result<InsertResult, StoreFault> {
        if self.calls == 1 {
            let mut rival = self.rival.take().expect("rival transaction should be set");
            self.rival_task = Some(tokio::spawn(async move {
                tokio::time::sleep(Duration::from_millis(300)).await;
                // Outcome ignored: this side is not the deadlock victim.
                let _ = insert_raw(&mut rival, "Alpha").await;
                rival
            }));
        }
        self.calls += 1;
        self.inner.insert_group(group).await
    }
}

async fn insert_raw(
    tx: &mut Transaction<'static, Postgres>,
    name: &str,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        "INSERT INTO groups (name, arrival_date, departure_date) \
         VALUES ($1, '2024-06-01', '2024-06-10') \
         ON CONFLICT (name) DO NOTHING",
    )
    .bind(name)
    .execute(&mut **tx)
    .await?;
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_import_valid_and_unnamed(pool: PgPool) {
    let input = records(json!([
        group("Alpha"),
        { "groupName": "", "arrivalDate": "2024-07-01", "departureDate": "2024-07-05" },
    ]));

    let outcome = import_groups(&pool, &input).await.unwrap();

    assert_eq!(outcome.imported, 1);
    assert_eq!(outcome.skipped_count(), 1);
    assert_eq!(outcome.errored(), 0);
    assert_eq!(outcome.total_processed, 2);
    assert_eq!(GroupRepo::count(&pool).await.unwrap(), 1);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_reimport_is_conflict_not_failure(pool: PgPool) {
    let input = records(json!([group("Alpha")]));

    let first = import_groups(&pool, &input).await.unwrap();
    let second = import_groups(&pool, &input).await.unwrap();

    assert_eq!(first.imported, 1);
    assert_eq!(second.imported, 0);
    assert_eq!(second.skipped_count(), 0);
    assert_eq!(second.errors.len(), 1);
    assert_eq!(second.errors[0].group_name, "Alpha");
    assert_eq!(second.errors[0].error, ALREADY_EXISTS_MESSAGE);
    assert_eq!(GroupRepo::count(&pool).await.unwrap(), 1);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_duplicate_within_one_batch(pool: PgPool) {
    let input = records(json!([group("Alpha"), group(" Alpha ")]));

    let outcome = import_groups(&pool, &input).await.unwrap();

    assert_eq!(outcome.imported, 1);
    assert_eq!(outcome.errors[0].error, ALREADY_EXISTS_MESSAGE);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_non_numeric_count_stored_as_null(pool: PgPool) {
    let input = records(json!([{
        "groupName": "Bravo",
        "agency": "Wanderlust",
        "arrivalDate": "2024-06-01",
        "departureDate": "2024-06-10",
        "studentsAllocated": "30",
        "studentsBooked": "about twenty",
        "centre": "Oxford",
    }]));

    let outcome = import_groups(&pool, &input).await.unwrap();
    assert_eq!(outcome.imported, 1);

    let stored = GroupRepo::find_by_name(&pool, "Bravo")
        .await
        .unwrap()
        .expect("group should exist");
    assert_eq!(stored.students_allocated, Some(30));
    assert_eq!(stored.students_booked, None);
    assert_eq!(stored.agency.as_deref(), Some("Wanderlust"));
    assert_eq!(stored.centre.as_deref(), Some("Oxford"));
}

/// A row rejected by a check constraint is reported and rolled back on its
/// own; the rows around it still commit.
#[sqlx::test(migrations = "../../db/migrations")]
async fn test_rejected_row_does_not_abort_batch(pool: PgPool) {
    let input = records(json!([
        group("Alpha"),
        { "groupName": "Backwards", "arrivalDate": "2024-06-10", "departureDate": "2024-06-01" },
        { "groupName": "Negative", "arrivalDate": "2024-06-01", "departureDate": "2024-06-10", "leadersBooked": -2 },
        group("Charlie"),
    ]));

    let outcome = import_groups(&pool, &input).await.unwrap();

    assert_eq!(outcome.imported, 2);
    assert_eq!(outcome.errors.len(), 2);
    assert_eq!(outcome.errors[0].group_name, "Backwards");
    assert!(outcome.errors[0].error.contains("ck_groups_dates"), "got: {}", outcome.errors[0].error);
    assert_eq!(outcome.errors[1].group_name, "Negative");
    assert!(outcome.is_balanced());

    assert_eq!(GroupRepo::count(&pool).await.unwrap(), 2);
    assert!(GroupRepo::find_by_name(&pool, "Charlie").await.unwrap().is_some());
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_lost_connection_commits_nothing(pool: PgPool) {
    let mut inner = PgGroupImportStore::begin(&pool).await.unwrap();
    let backend_pid: i32 = sqlx::query_scalar("SELECT pg_backend_pid()")
        .fetch_one(inner.connection())
        .await
        .unwrap();

    let mut store = DropConnectionAfterFirst {
        inner,
        pool: pool.clone(),
        backend_pid,
        calls: 0,
    };
    let input = records(json!([group("Alpha"), group("Bravo"), group("Charlie")]));

    let result = run_import(&mut store, &input).await;
    drop(store);

    assert_matches!(result, Err(ImportError::TransactionFailure(_)));
    assert_eq!(GroupRepo::count(&pool).await.unwrap(), 0);
}

/// A deadlock on one record rolls back that record only; the rest of the
/// batch still commits.
#[sqlx::test(migrations = "../../db/migrations")]
async fn test_deadlock_loses_only_contended_record(pool: PgPool) {
    let mut rival = pool.begin().await.unwrap();
    insert_raw(&mut rival, "Bravo").await.unwrap();

    let mut store = RivalOnSecond {
        inner: PgGroupImportStore::begin(&pool).await.unwrap(),
        rival: Some(rival),
        rival_task: None,
        calls: 0,
    };
    let input = records(json!([group("Alpha"), group("Bravo"), group("Charlie")]));

    let outcome = run_import(&mut store, &input).await.unwrap();
    let rival_task = store.rival_task.take().expect("rival should have started");
    store.inner.commit().await.unwrap();
    rival_task.await.unwrap().rollback().await.unwrap();

    assert_eq!(outcome.imported, 2);
    assert_eq!(outcome.errors.len(), 1);
    assert_eq!(outcome.errors[0].group_name, "Bravo");
    assert!(outcome.errors[0].error.contains("deadlock"), "got: {}", outcome.errors[0].error);
    assert!(outcome.is_balanced());

    assert_eq!(GroupRepo::count(&pool).await.unwrap(), 2);
    assert!(GroupRepo::find_by_name(&pool, "Alpha").await.unwrap().is_some());
    assert!(GroupRepo::find_by_name(&pool, "Bravo").await.unwrap().is_none());
}
