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

//! Test utilities for the business layer.

use crate::db;
use crate::driver::{Driver, FallbackOptions, FallbackPersister};
use crate::model::*;
use bookstore_core::clocks::testutils::SettableClock;
use bookstore_core::db::sqlite::testutils::setup;
use bookstore_core::db::{Db, Executor};
use bookstore_isbn::MockNumberingClient;
use bookstore_resilience::{CircuitBreakerOptions, CircuitBreakers};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use time::macros::datetime;

/// Options for the breakers used in tests: small values that tests can reason about.
pub(crate) fn test_breaker_options() -> CircuitBreakerOptions {
    CircuitBreakerOptions {
        timeout: Duration::from_secs(1),
        failure_threshold: 2,
        cooldown: Duration::from_secs(30),
    }
}

/// State of a driver under test and access to its dependencies.
pub(crate) struct TestContext {
    db: Arc<dyn Db + Send + Sync>,
    clock: Arc<SettableClock>,
    numbering: Arc<MockNumberingClient>,
    breakers: Arc<CircuitBreakers>,
    fallback_dir: TempDir,
    driver: Driver,
}

impl TestContext {
    /// Sets up a driver backed by an empty database, a numbering service that answers with fixed
    /// codes, and a temporary fallback directory.
    pub(crate) async fn setup() -> Self {
        Self::setup_with_numbering(MockNumberingClient::responding("0123456789", "0123456789012"))
            .await
    }

    /// Sets up a driver like `setup` does but using the given `numbering` client.
    pub(crate) async fn setup_with_numbering(numbering: MockNumberingClient) -> Self {
        let db = Arc::from(setup().await);
        db::init_schema(&mut *db.ex().await.unwrap()).await.unwrap();

        let clock = Arc::from(SettableClock::new(datetime!(2024-05-01 08:00:00 UTC)));
        let numbering = Arc::from(numbering);
        let breakers = Arc::from(CircuitBreakers::new(clock.clone(), test_breaker_options()));
        let fallback_dir = tempfile::tempdir().unwrap();
        let fallback = FallbackPersister::new(
            FallbackOptions { dir: fallback_dir.path().to_owned() },
            clock.clone(),
        );

        let driver =
            Driver::new(db.clone(), clock.clone(), numbering.clone(), breakers.clone(), fallback);
        Self { db, clock, numbering, breakers, fallback_dir, driver }
    }

    pub(crate) async fn ex(&self) -> Executor {
        self.db.ex().await.unwrap()
    }

    pub(crate) fn clock(&self) -> &SettableClock {
        &self.clock
    }

    pub(crate) fn numbering(&self) -> &MockNumberingClient {
        &self.numbering
    }

    pub(crate) fn breakers(&self) -> &CircuitBreakers {
        &self.breakers
    }

    pub(crate) fn fallback_dir(&self) -> &Path {
        self.fallback_dir.path()
    }

    /// Returns the sorted paths of all files in the fallback directory.
    pub(crate) fn fallback_files(&self) -> Vec<PathBuf> {
        let mut files = std::fs::read_dir(self.fallback_dir.path())
            .unwrap()
            .map(|e| e.unwrap().path())
            .collect::<Vec<PathBuf>>();
        files.sort();
        files
    }

    pub(crate) fn driver(&self) -> Driver {
        self.driver.clone()
    }

    /// Creates a new driver that shares all dependencies with this context except for the
    /// directory where fallback files are written.
    pub(crate) fn driver_with_fallback_dir(&self, dir: &Path) -> Driver {
        let fallback =
            FallbackPersister::new(FallbackOptions { dir: dir.to_owned() }, self.clock.clone());
        Driver::new(
            self.db.clone(),
            self.clock.clone(),
            self.numbering.clone(),
            self.breakers.clone(),
            fallback,
        )
    }

    /// Stores `book` directly in the database and returns it with its new identifier.
    pub(crate) async fn create_book(&self, book: Book) -> Book {
        let id = db::create_book(&mut *self.ex().await, &book).await.unwrap();
        book.with_id(id)
    }

    /// Stores a book with only a `title` and returns it with its new identifier.
    pub(crate) async fn create_titled_book(&self, title: &str) -> Book {
        self.create_book(Book::new(title).unwrap()).await
    }

    /// Gets a book directly from the database, or `None` if it does not exist.
    pub(crate) async fn get_book(&self, id: BookId) -> Option<Book> {
        match db::get_book(&mut *self.ex().await, id).await {
            Ok(book) => Some(book),
            Err(bookstore_core::db::DbError::NotFound) => None,
            Err(e) => panic!("Unexpected error: {:?}", e),
        }
    }

    pub(crate) async fn count_books(&self) -> u64 {
        db::count_books(&mut *self.ex().await).await.unwrap()
    }
}
