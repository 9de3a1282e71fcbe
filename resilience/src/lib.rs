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

//! Resilience primitives to wrap calls to remote services.
//!
//! `time_limit` bounds the duration of a single call.  `CircuitBreaker` combines that bound with a
//! per-operation failure counter that stops issuing calls to a dependency that keeps failing, and
//! `CircuitBreaker::attempt` routes every failure to a caller-provided fallback.  Breakers are
//! usually obtained by name from a `CircuitBreakers` registry shared by the whole service.
//!
//! All waiting happens through a `Clock` so that tests can drive timeouts and cooldowns without
//! real delays.

// Keep these in sync with other top-level files.
#![warn(anonymous_parameters, bad_style, clippy::missing_docs_in_private_items, missing_docs)]
#![warn(unused, unused_extern_crates, unused_import_braces, unused_qualifications)]
#![warn(unsafe_code)]

use bookstore_core::clocks::Clock;
use futures::future::{self, Either};
use std::future::Future;
use std::pin::pin;
use std::time::Duration;

mod breaker;
pub use breaker::{CircuitBreaker, CircuitBreakerOptions, CircuitState};
mod registry;
pub use registry::CircuitBreakers;

/// Reasons why a protected call did not produce a value.
#[derive(Debug, PartialEq, thiserror::Error)]
pub enum Failure<E> {
    /// The call did not complete within its time limit and was abandoned.
    #[error("Call timed out")]
    TimedOut,

    /// The call completed in time but returned an error.
    #[error("{0}")]
    Failed(E),

    /// The call was not issued because the circuit is open.
    #[error("Circuit is open")]
    Rejected,
}

/// Outcome of a protected call: either the call's value or the reason it did not produce one.
pub type Attempt<T, E> = Result<T, Failure<E>>;

/// Runs `op` until it completes or until `timeout` elapses on `clock`, whichever happens first.
///
/// `op` is polled before the timer so that an operation that is already complete always wins.
/// When the timer wins, `op` is dropped: any side effects it started may or may not have happened.
pub async fn time_limit<T, E, F>(
    clock: &(dyn Clock + Send + Sync),
    timeout: Duration,
    op: F,
) -> Attempt<T, E>
where
    F: Future<Output = Result<T, E>>,
{
    let op = pin!(op);
    match future::select(op, clock.sleep(timeout)).await {
        Either::Left((result, _sleep)) => result.map_err(Failure::Failed),
        Either::Right(((), _op)) => Err(Failure::TimedOut),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bookstore_core::clocks::testutils::SettableClock;
    use time::macros::datetime;

    #[tokio::test]
    async fn test_time_limit_ok() {
        let clock = SettableClock::new(datetime!(2024-05-01 08:00:00 UTC));
        let result: Attempt<u8, ()> =
            time_limit(&clock, Duration::from_secs(1), async { Ok(5) }).await;
        assert_eq!(Ok(5), result);
        assert_eq!(datetime!(2024-05-01 08:00:00 UTC), clock.now_utc());
    }

    #[tokio::test]
    async fn test_time_limit_failed() {
        let clock = SettableClock::new(datetime!(2024-05-01 08:00:00 UTC));
        let result: Attempt<u8, &str> =
            time_limit(&clock, Duration::from_secs(1), async { Err("boom") }).await;
        assert_eq!(Err(Failure::Failed("boom")), result);
    }

    #[tokio::test]
    async fn test_time_limit_timed_out() {
        let clock = SettableClock::new(datetime!(2024-05-01 08:00:00 UTC));
        let result: Attempt<u8, ()> =
            time_limit(&clock, Duration::from_secs(3), future::pending()).await;
        assert_eq!(Err(Failure::TimedOut), result);
        assert_eq!(datetime!(2024-05-01 08:00:03 UTC), clock.now_utc());
    }

    #[test]
    fn test_failure_display() {
        assert_eq!("Call timed out", Failure::<String>::TimedOut.to_string());
        assert_eq!("Circuit is open", Failure::<String>::Rejected.to_string());
        assert_eq!("Connection refused", Failure::Failed("Connection refused").to_string());
    }
}
