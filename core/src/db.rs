// III-IV
// Copyright 2023 Julio Merino
//
// Licensed under the Apache License, Version 2.0 (the "License"); you may not
// use this file except in compliance with the License.  You may obtain a copy
// of the License at:
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS, WITHOUT
// WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.  See the
// License for the specific language governing permissions and limitations
// under the License.

//! Generic abstraction to access the database.
//!
//! Services persist their data in SQLite.  Domain-specific operations are free functions that
//! take a `&mut SqliteConnection`, which can be obtained either from a direct `Executor` or from
//! an open `TxExecutor`, so the same function works inside and outside of transactions.

use crate::model::ModelError;
use async_trait::async_trait;
use sqlx::pool::PoolConnection;
use sqlx::sqlite::{Sqlite, SqliteConnection};
use sqlx::Transaction;
use std::ops::{Deref, DerefMut};

pub mod sqlite;

/// Database errors.  Any unexpected errors that come from the database are classified as
/// `BackendError`, but errors we know about have more specific types.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum DbError {
    /// Catch-all error type for unexpected database errors.
    #[error("Database error: {0}")]
    BackendError(String),

    /// Indicates a failure processing the data that already exists in the database.
    #[error("Data integrity error: {0}")]
    DataIntegrityError(String),

    /// Indicates that a requested entry does not exist.
    #[error("Entity not found")]
    NotFound,

    /// Indicates that the database is not available (maybe because of too many active concurrent
    /// connections).
    #[error("Unavailable")]
    Unavailable,
}

impl From<ModelError> for DbError {
    fn from(e: ModelError) -> Self {
        DbError::DataIntegrityError(e.to_string())
    }
}

/// Result type for this module.
pub type DbResult<T> = Result<T, DbError>;

/// A database executor backed by a connection taken from the pool.
///
/// Operations issued via separate executors aren't guaranteed to happen on the same connection.
pub struct Executor(PoolConnection<Sqlite>);

impl Deref for Executor {
    type Target = SqliteConnection;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl DerefMut for Executor {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.0
    }
}

/// A wrapper for a database executor backed by an open transaction.
pub struct TxExecutor(Transaction<'static, Sqlite>);

impl TxExecutor {
    /// Returns the connection wrapped by this transaction.
    ///
    /// This would be better called `executor` but this method is used so frequently that it makes
    /// call sites too verbose.
    pub fn ex(&mut self) -> &mut SqliteConnection {
        &mut self.0
    }

    /// Commits the transaction.
    pub async fn commit(self) -> DbResult<()> {
        self.0.commit().await.map_err(sqlite::map_sqlx_error)
    }
}

/// Abstraction over the database connection.
#[async_trait]
pub trait Db {
    /// Obtains an executor for direct access to the pool.
    ///
    /// This would be better called `executor` but this method is used so frequently that it makes
    /// call sites too verbose.
    async fn ex(&self) -> DbResult<Executor>;

    /// Begins a transaction.
    ///
    /// It is the responsibility of the caller to call `commit` on the returned executor.  Otherwise
    /// the transaction is rolled back on drop.
    async fn begin(&self) -> DbResult<TxExecutor>;

    /// Closes all connections to the database.
    async fn close(&self);
}

#[cfg(test)]
mod tests {
    use super::sqlite::testutils::setup;
    use super::*;
    use sqlx::Row;

    /// Runs a `query` on `ex` and does not care about its results.
    async fn exec(ex: &mut SqliteConnection, query: &str) {
        sqlx::query(query).execute(ex).await.unwrap();
    }

    /// Runs a `query` on `ex` that fetches a single row with an `i64` value on `column` and returns
    /// that value.
    async fn query_i64(ex: &mut SqliteConnection, column: &str, query: &str) -> i64 {
        let row = sqlx::query(query).fetch_one(ex).await.unwrap();
        row.try_get(column).unwrap()
    }

    #[tokio::test]
    async fn test_direct_execution() {
        let db = setup().await;
        exec(&mut *db.ex().await.unwrap(), "CREATE TABLE test (i INTEGER)").await;
        exec(&mut *db.ex().await.unwrap(), "INSERT INTO test (i) VALUES (3)").await;
        assert_eq!(
            1,
            query_i64(&mut *db.ex().await.unwrap(), "count", "SELECT COUNT(*) AS count FROM test")
                .await
        );
    }

    #[tokio::test]
    async fn test_tx_commit() {
        let db = setup().await;
        exec(&mut *db.ex().await.unwrap(), "CREATE TABLE test (i INTEGER)").await;

        let mut tx = db.begin().await.unwrap();
        exec(tx.ex(), "INSERT INTO test (i) VALUES (3)").await;
        tx.commit().await.unwrap();

        assert_eq!(
            1,
            query_i64(&mut *db.ex().await.unwrap(), "count", "SELECT COUNT(*) AS count FROM test")
                .await
        );
    }

    #[tokio::test]
    async fn test_tx_rollback_on_drop() {
        let db = setup().await;
        exec(&mut *db.ex().await.unwrap(), "CREATE TABLE test (i INTEGER)").await;

        {
            let mut tx = db.begin().await.unwrap();
            exec(tx.ex(), "INSERT INTO test (i) VALUES (3)").await;
        }

        assert_eq!(
            0,
            query_i64(&mut *db.ex().await.unwrap(), "count", "SELECT COUNT(*) AS count FROM test")
                .await
        );
    }

    #[test]
    fn test_model_error_is_integrity_error() {
        assert_eq!(
            DbError::DataIntegrityError("bad rank".to_owned()),
            DbError::from(ModelError("bad rank".to_owned()))
        );
    }
}
