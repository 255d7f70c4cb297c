//! Transaction-backed store for batch group imports.
//!
//! One [`PgGroupImportStore`] owns one Postgres transaction for the whole
//! call. Each insert runs inside its own savepoint so that a rejected row
//! is rolled back on its own and the surrounding transaction stays usable.
//! A database error is a per-record fault exactly when rolling back to its
//! savepoint succeeds; this covers constraint violations as well as
//! deadlocks, serialization failures and statement timeouts. Anything else
//! means the transaction itself is gone and is reported as
//! [`StoreFault::Transaction`], which aborts the call.

use async_trait::async_trait;
use sqlx::{Connection, PgConnection, PgPool, Postgres, Transaction};
use groupops_core::group_import::{
    run_import, GroupImportStore, ImportError, ImportOutcome, ImportRecord, InsertResult,
    NewGroup, StoreFault,
};

use crate::repositories::GroupRepo;

/// [`GroupImportStore`] writing into a single Postgres transaction.
///
/// Dropping the store without calling [`commit`](Self::commit) rolls the
/// transaction back.
pub struct PgGroupImportStore {
    tx: Transaction<'static, Postgres>,
}

impl PgGroupImportStore {
    /// Open a transaction on a pooled connection.
    pub async fn begin(pool: &PgPool) -> Result<Self, sqlx::Error> {
        Ok(Self {
            tx: pool.begin().await?,
        })
    }

    /// The connection the transaction runs on.
    pub fn connection(&mut self) -> &mut PgConnection {
        &mut self.tx
    }

    /// Commit every insert made through this store.
    pub async fn commit(self) -> Result<(), sqlx::Error> {
        self.tx.commit().await
    }
}

#[async_trait]
impl GroupImportStore for PgGroupImportStore {
    async fn insert_group(&mut self, group: &NewGroup) -> Result<InsertResult, StoreFault> {
        // Nested begin on a connection already in a transaction issues SAVEPOINT.
        let mut savepoint = Connection::begin(&mut *self.tx)
            .await
            .map_err(transaction_fault)?;

        match GroupRepo::insert_if_absent(&mut savepoint, group).await {
            Ok(inserted) => {
                savepoint.commit().await.map_err(transaction_fault)?;
                Ok(if inserted {
                    InsertResult::Inserted
                } else {
                    InsertResult::AlreadyExists
                })
            }
            Err(sqlx::Error::Database(db_err)) => match savepoint.rollback().await {
                Ok(()) => Err(StoreFault::Record(db_err.message().to_string())),
                Err(rollback_err) => {
                    tracing::debug!(error = %rollback_err, "Savepoint rollback failed");
                    Err(StoreFault::Transaction(db_err.to_string()))
                }
            },
            // Io, pool and protocol errors leave the connection unusable.
            Err(other) => Err(transaction_fault(other)),
        }
    }
}

/// Import `records` in one transaction.
///
/// Commits only after every record has been classified. On
/// [`ImportError::TransactionFailure`] nothing from this call is committed.
pub async fn import_groups(
    pool: &PgPool,
    records: &[ImportRecord],
) -> Result<ImportOutcome, ImportError> {
    let mut store = PgGroupImportStore::begin(pool)
        .await
        .map_err(|e| transaction_failure("begin", e))?;

    let outcome = match run_import(&mut store, records).await {
        Ok(outcome) => outcome,
        Err(err) => {
            tracing::error!(error = %err, "Group import aborted, rolling back");
            return Err(err);
        }
    };

    store
        .commit()
        .await
        .map_err(|e| transaction_failure("commit", e))?;

    for failed in &outcome.errors {
        tracing::warn!(group_name = %failed.group_name, error = %failed.error, "Group not imported");
    }

    Ok(outcome)
}

fn transaction_fault(err: sqlx::Error) -> StoreFault {
    StoreFault::Transaction(err.to_string())
}

fn transaction_failure(stage: &str, err: sqlx::Error) -> ImportError {
    tracing::error!(stage, error = %err, "Group import transaction failed");
    ImportError::TransactionFailure(format!("{stage}: {err}"))
}
