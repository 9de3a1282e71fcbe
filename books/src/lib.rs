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

//! REST service that manages a catalog of books.
//!
//! New books get their ISBN codes from the numbering service.  Calls to that service go through
//! a circuit breaker, and books that cannot be numbered are saved to local files instead of being
//! lost.  The service can also be put in maintenance, during which it refuses all traffic other
//! than that to the maintenance API.

// Keep these in sync with other top-level files.
#![warn(anonymous_parameters, bad_style, clippy::missing_docs_in_private_items, missing_docs)]
#![warn(unused, unused_extern_crates, unused_import_braces, unused_qualifications)]
#![warn(unsafe_code)]

use bookstore_core::clocks::SystemClock;
use bookstore_core::db::Db;
use bookstore_core::db::sqlite;
use bookstore_core::env::get_optional_var;
use bookstore_isbn::{HttpNumberingClient, HttpNumberingClientOptions};
use bookstore_resilience::{CircuitBreakerOptions, CircuitBreakers};
use log::info;
use std::error::Error;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;

mod db;
mod driver;
use driver::{Driver, FallbackPersister, NUMBERING_BREAKER};
pub use driver::FallbackOptions;
pub(crate) mod model;
mod rest;
use rest::app;

/// Default connection string for the database, which keeps all data in memory.
const DEFAULT_DB: &str = "sqlite::memory:";

/// Configuration options for the whole service.
#[derive(Clone, Debug, PartialEq)]
pub struct BooksOptions {
    /// Connection string for the SQLite database.
    pub db: String,

    /// Configuration of the fallback files for books that could not be registered.
    pub fallback: FallbackOptions,

    /// Configuration of the numbering service client.
    pub numbering: HttpNumberingClientOptions,

    /// Configuration of the circuit breaker that protects calls to the numbering service.
    pub numbering_breaker: CircuitBreakerOptions,
}

impl BooksOptions {
    /// Creates a set of options from environment variables.
    ///
    /// Service settings use the `BOOKS` prefix (`BOOKS_DB`, `BOOKS_FALLBACK_DIR`) and numbering
    /// service settings use the `NUMBERS_API` prefix (`NUMBERS_API_URL`, `NUMBERS_API_TIMEOUT`,
    /// `NUMBERS_API_FAILURE_THRESHOLD`, `NUMBERS_API_COOLDOWN`).
    pub fn from_env() -> Result<Self, String> {
        let db = get_optional_var::<String>("BOOKS", "DB")?;
        Ok(Self {
            db: db.unwrap_or_else(|| DEFAULT_DB.to_owned()),
            fallback: FallbackOptions::from_env("BOOKS")?,
            numbering: HttpNumberingClientOptions::from_env("NUMBERS_API")?,
            numbering_breaker: CircuitBreakerOptions::from_env("NUMBERS_API")?,
        })
    }
}

/// Instantiates all resources to serve the application on `bind_addr`.
///
/// While it'd be nice to push this responsibility to `main`, doing so would force us to expose many
/// crate-internal types to the public, which in turn would make dead code detection harder.
pub async fn serve(
    bind_addr: impl Into<SocketAddr>,
    opts: BooksOptions,
) -> Result<(), Box<dyn Error>> {
    let clock = Arc::from(SystemClock::default());

    let db = Arc::from(sqlite::connect(&opts.db).await?);
    db::init_schema(&mut *db.ex().await?).await?;

    let numbering = Arc::from(HttpNumberingClient::new(opts.numbering));
    let breakers = Arc::from(
        CircuitBreakers::new(clock.clone(), CircuitBreakerOptions::default())
            .with_options(NUMBERING_BREAKER, opts.numbering_breaker),
    );
    let fallback = FallbackPersister::new(opts.fallback, clock.clone());

    let driver = Driver::new(db, clock, numbering, breakers, fallback);
    let app = app(driver);

    let bind_addr = bind_addr.into();
    let listener = TcpListener::bind(bind_addr).await?;
    info!("Serving books on {}", bind_addr);
    axum::serve(listener, app).await?;
    Ok(())
}
