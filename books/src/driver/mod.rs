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

//! Business logic for the service.

use bookstore_core::clocks::Clock;
use bookstore_core::db::Db;
use bookstore_isbn::NumberingClient;
use bookstore_resilience::CircuitBreakers;
use std::sync::Arc;

mod book;
mod books;
mod fallback;
pub use fallback::FallbackOptions;
pub(crate) use fallback::FallbackPersister;
mod readiness;
pub(crate) use readiness::ReadinessCell;
mod register;
#[cfg(test)]
pub(crate) mod testutils;

/// Name of the circuit breaker that protects calls to the numbering service.
pub(crate) const NUMBERING_BREAKER: &str = "numbering";

/// Business logic.
///
/// The public operations exposed by the driver are all "one shot": they start and commit a
/// transaction, so it's incorrect for the caller to use two separate calls.  For this reason,
/// these operations consume the driver in an attempt to minimize the possibility of executing
/// two operations.
#[derive(Clone)]
pub(crate) struct Driver {
    /// The database that the driver uses for persistence.
    db: Arc<dyn Db + Send + Sync>,

    /// Clock instance to obtain the current time.
    clock: Arc<dyn Clock + Send + Sync>,

    /// Client to obtain the ISBN codes of new books.
    numbering: Arc<dyn NumberingClient + Send + Sync>,

    /// Circuit breakers for the calls to remote services.
    breakers: Arc<CircuitBreakers>,

    /// Writer of the books that could not be registered.
    fallback: Arc<FallbackPersister>,

    /// Whether the service is accepting traffic or is in maintenance.
    readiness: Arc<ReadinessCell>,
}

impl Driver {
    /// Creates a new driver backed by the given injected components.
    pub(crate) fn new(
        db: Arc<dyn Db + Send + Sync>,
        clock: Arc<dyn Clock + Send + Sync>,
        numbering: Arc<dyn NumberingClient + Send + Sync>,
        breakers: Arc<CircuitBreakers>,
        fallback: FallbackPersister,
    ) -> Self {
        let readiness = Arc::from(ReadinessCell::new(clock.now_utc()));
        Self { db, clock, numbering, breakers, fallback: Arc::from(fallback), readiness }
    }
}
