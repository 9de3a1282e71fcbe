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

//! Circuit breaker for a single named operation.

use crate::{Attempt, Failure, time_limit};
use bookstore_core::clocks::Clock;
use bookstore_core::env::get_optional_var;
use derivative::Derivative;
use log::{debug, info, warn};
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use time::OffsetDateTime;

/// Default value for the `TIMEOUT` setting when not specified.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(1);

/// Default value for the `FAILURE_THRESHOLD` setting when not specified.
const DEFAULT_FAILURE_THRESHOLD: u32 = 5;

/// Default value for the `COOLDOWN` setting when not specified.
const DEFAULT_COOLDOWN: Duration = Duration::from_secs(60);

/// Longest cooldown accepted from the environment.
const MAX_COOLDOWN: Duration = Duration::from_secs(7 * 24 * 60 * 60);

/// Configuration options for a circuit breaker.
#[derive(Clone, Debug, PartialEq)]
pub struct CircuitBreakerOptions {
    /// Maximum amount of time to wait for a single call.
    pub timeout: Duration,

    /// Number of consecutive failures that open the circuit.
    pub failure_threshold: u32,

    /// Amount of time the circuit stays open before letting a trial call through.
    pub cooldown: Duration,
}

impl Default for CircuitBreakerOptions {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_TIMEOUT,
            failure_threshold: DEFAULT_FAILURE_THRESHOLD,
            cooldown: DEFAULT_COOLDOWN,
        }
    }
}

impl CircuitBreakerOptions {
    /// Creates a new set of options from environment variables whose name is prefixed with
    /// `prefix`.
    ///
    /// The recognized variables are `<prefix>_TIMEOUT`, `<prefix>_FAILURE_THRESHOLD` and
    /// `<prefix>_COOLDOWN`.  Durations take human-readable values like `500ms` or `2m`.
    pub fn from_env(prefix: &str) -> Result<Self, String> {
        let failure_threshold = get_optional_var::<u32>(prefix, "FAILURE_THRESHOLD")?
            .unwrap_or(DEFAULT_FAILURE_THRESHOLD);
        if failure_threshold == 0 {
            return Err(format!("{}_FAILURE_THRESHOLD must be positive", prefix));
        }

        let cooldown =
            get_optional_var::<Duration>(prefix, "COOLDOWN")?.unwrap_or(DEFAULT_COOLDOWN);
        if cooldown > MAX_COOLDOWN {
            return Err(format!(
                "{}_COOLDOWN cannot exceed {}",
                prefix,
                humantime::format_duration(MAX_COOLDOWN)
            ));
        }

        Ok(Self {
            timeout: get_optional_var::<Duration>(prefix, "TIMEOUT")?.unwrap_or(DEFAULT_TIMEOUT),
            failure_threshold,
            cooldown,
        })
    }
}

/// Externally-visible state of a circuit breaker.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum CircuitState {
    /// Calls go through and failures are being counted.
    Closed,

    /// Calls are rejected without being issued.
    Open,

    /// The cooldown elapsed and a single trial call decides whether to close or reopen.
    HalfOpen,
}

/// Internal state machine of a circuit breaker.
#[derive(Debug, PartialEq)]
enum Inner {
    /// Calls go through.  Tracks the number of consecutive failures seen so far.
    Closed {
        /// Consecutive failures since the last success.
        failures: u32,
    },

    /// Calls are rejected until the given time.
    Open {
        /// Time at which the next call becomes a trial.
        until: OffsetDateTime,
    },

    /// A trial call is in flight and every other call is rejected until it finishes.
    HalfOpen,
}

/// Circuit breaker that protects calls to one operation of a remote dependency.
///
/// The breaker starts closed.  Once `failure_threshold` consecutive calls fail or time out, the
/// breaker opens and rejects calls for `cooldown`.  The first call after the cooldown is a trial:
/// its success closes the breaker and its failure opens it again.
#[derive(Derivative)]
#[derivative(Debug)]
pub struct CircuitBreaker {
    /// Name of the protected operation, for logging purposes.
    name: String,

    /// Configuration of this breaker.
    opts: CircuitBreakerOptions,

    /// The clock used to query the current time and to wait for timeouts.
    #[derivative(Debug = "ignore")]
    clock: Arc<dyn Clock + Send + Sync>,

    /// Current state.  Never held across an await point.
    inner: Mutex<Inner>,
}

/// Permission to issue one call through a breaker.
///
/// The outcome of the call must be reported with `succeed` or `fail`.  Dropping the permit without
/// doing so means the caller abandoned the call, which counts as a failure for trial calls.
struct Permit<'a> {
    /// The breaker that granted this permit.
    breaker: &'a CircuitBreaker,

    /// Whether this permit was granted as the half-open trial call.
    trial: bool,

    /// Whether the outcome has already been recorded.
    done: bool,
}

impl Permit<'_> {
    /// Records that the call succeeded.
    fn succeed(mut self) {
        self.done = true;
        self.breaker.record_success(self.trial);
    }

    /// Records that the call failed.
    fn fail(mut self) {
        self.done = true;
        self.breaker.record_failure(self.trial);
    }
}

impl Drop for Permit<'_> {
    fn drop(&mut self) {
        if !self.done && self.trial {
            warn!("Trial call for {} abandoned", self.breaker.name);
            self.breaker.record_failure(true);
        }
    }
}

impl CircuitBreaker {
    /// Creates a new closed breaker for the operation `name`.
    pub fn new<S: Into<String>>(
        name: S,
        opts: CircuitBreakerOptions,
        clock: Arc<dyn Clock + Send + Sync>,
    ) -> Self {
        Self { name: name.into(), opts, clock, inner: Mutex::new(Inner::Closed { failures: 0 }) }
    }

    /// Returns the name of the operation protected by this breaker.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the options this breaker was configured with.
    pub fn opts(&self) -> &CircuitBreakerOptions {
        &self.opts
    }

    /// Locks the internal state.
    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().expect("Circuit breaker state poisoned")
    }

    /// Returns the current state of the breaker.  An open breaker whose cooldown has elapsed is
    /// reported as half-open because the next call will be a trial.
    pub fn state(&self) -> CircuitState {
        let now = self.clock.now_utc();
        match *self.lock() {
            Inner::Closed { .. } => CircuitState::Closed,
            Inner::Open { until } if now >= until => CircuitState::HalfOpen,
            Inner::Open { .. } => CircuitState::Open,
            Inner::HalfOpen => CircuitState::HalfOpen,
        }
    }

    /// Asks for permission to issue a call, or returns `None` if the call must be rejected.
    fn acquire(&self) -> Option<Permit<'_>> {
        let now = self.clock.now_utc();
        let mut inner = self.lock();
        let trial = match *inner {
            Inner::Closed { .. } => false,
            Inner::Open { until } if now >= until => {
                info!("Circuit for {} is half-open; issuing trial call", self.name);
                *inner = Inner::HalfOpen;
                true
            }
            Inner::Open { .. } | Inner::HalfOpen => {
                debug!("Circuit for {} is open; rejecting call", self.name);
                return None;
            }
        };
        Some(Permit { breaker: self, trial, done: false })
    }

    /// Records a successful call.  Only trial calls can move the breaker out of half-open.
    fn record_success(&self, trial: bool) {
        let mut inner = self.lock();
        match *inner {
            Inner::HalfOpen if trial => {
                info!("Circuit for {} closed after successful trial call", self.name);
                *inner = Inner::Closed { failures: 0 };
            }
            Inner::Closed { .. } => *inner = Inner::Closed { failures: 0 },
            Inner::HalfOpen | Inner::Open { .. } => (),
        }
    }

    /// Records a failed call.  Only trial calls can move the breaker out of half-open.
    fn record_failure(&self, trial: bool) {
        let now = self.clock.now_utc();
        let mut inner = self.lock();
        match *inner {
            Inner::HalfOpen if trial => {
                warn!("Circuit for {} reopened after failed trial call", self.name);
                *inner = Inner::Open { until: now + self.opts.cooldown };
            }
            Inner::Closed { failures } => {
                let failures = failures + 1;
                if failures >= self.opts.failure_threshold {
                    warn!(
                        "Circuit for {} opened after {} consecutive failures",
                        self.name, failures
                    );
                    *inner = Inner::Open { until: now + self.opts.cooldown };
                } else {
                    *inner = Inner::Closed { failures };
                }
            }
            Inner::HalfOpen | Inner::Open { .. } => (),
        }
    }

    /// Issues the call produced by `op` with this breaker's timeout, unless the circuit is open.
    ///
    /// `op` is not invoked at all when the call is rejected.  Errors and timeouts count as
    /// failures towards opening the circuit.
    pub async fn call<T, E, F, Fut>(&self, op: F) -> Attempt<T, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        let permit = match self.acquire() {
            Some(permit) => permit,
            None => return Err(Failure::Rejected),
        };

        let result = time_limit(self.clock.as_ref(), self.opts.timeout, op()).await;
        match result {
            Ok(_) => permit.succeed(),
            Err(_) => permit.fail(),
        }
        result
    }

    /// Issues the call produced by `op` like `call` does and, if it does not produce a value,
    /// hands the reason to `fallback` and returns whatever `fallback` returns.
    ///
    /// The value of a successful call is returned unchanged and `fallback` is not invoked.
    pub async fn attempt<T, E, R, F, Fut, G, GFut>(&self, op: F, fallback: G) -> Result<T, R>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        G: FnOnce(Failure<E>) -> GFut,
        GFut: Future<Output = Result<T, R>>,
    {
        match self.call(op).await {
            Ok(value) => Ok(value),
            Err(failure) => fallback(failure).await,
        }
    }
}
