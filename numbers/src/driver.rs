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

//! Business logic for the numbering service.

use crate::model::BookNumbers;
use bookstore_core::clocks::Clock;
use bookstore_core::driver::{DriverError, DriverResult};
use bookstore_core::env::get_optional_var;
use bookstore_resilience::{Failure, time_limit};
use log::warn;
use std::sync::Arc;
use std::time::Duration;

/// Configuration options for the numbering service.
#[derive(Clone, Debug, PartialEq)]
pub struct NumbersOptions {
    /// Artificial latency added to every request, to simulate a slow dependency.
    pub delay: Duration,

    /// Maximum time to spend generating one set of numbers.
    pub timeout: Duration,

    /// Whether to hyphenate the generated ISBNs.
    pub separator: bool,
}

impl Default for NumbersOptions {
    fn default() -> Self {
        Self { delay: Duration::from_millis(15), timeout: Duration::from_secs(1), separator: false }
    }
}

impl NumbersOptions {
    /// Creates a set of options from environment variables whose name is prefixed with the given
    /// `prefix`.
    ///
    /// This will use variables such as `<prefix>_DELAY`, `<prefix>_TIMEOUT` and
    /// `<prefix>_SEPARATOR`.  Missing variables keep their default values.
    pub fn from_env(prefix: &str) -> Result<Self, String> {
        let defaults = Self::default();
        Ok(Self {
            delay: get_optional_var::<Duration>(prefix, "DELAY")?.unwrap_or(defaults.delay),
            timeout: get_optional_var::<Duration>(prefix, "TIMEOUT")?.unwrap_or(defaults.timeout),
            separator: get_optional_var::<bool>(prefix, "SEPARATOR")?
                .unwrap_or(defaults.separator),
        })
    }
}

/// Business logic.
#[derive(Clone)]
pub(crate) struct Driver {
    /// Clock used to apply the artificial delay and the timeout.
    clock: Arc<dyn Clock + Send + Sync>,

    /// Service configuration.
    opts: NumbersOptions,
}

impl Driver {
    /// Creates a new driver backed by the given injected components.
    pub(crate) fn new(clock: Arc<dyn Clock + Send + Sync>, opts: NumbersOptions) -> Self {
        Self { clock, opts }
    }

    /// Generates a new set of book numbers, failing if doing so exceeds the configured timeout.
    pub(crate) async fn generate_numbers(self) -> DriverResult<BookNumbers> {
        let op = async {
            self.clock.sleep(self.opts.delay).await;
            Ok::<_, DriverError>(BookNumbers::generate(&mut rand::rng(), self.opts.separator))
        };
        match time_limit(self.clock.as_ref(), self.opts.timeout, op).await {
            Ok(numbers) => Ok(numbers),
            Err(Failure::Failed(e)) => Err(e),
            Err(Failure::TimedOut) | Err(Failure::Rejected) => {
                warn!("Number generation exceeded {:?}", self.opts.timeout);
                Err(DriverError::Timeout("Timeout".to_owned()))
            }
        }
    }
}


#[cfg(test)]
mod tests {
    use super::testutils::*;
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_generate_numbers_ok() {
        let driver = driver(Duration::from_millis(15), Duration::from_secs(1), false);
        let numbers = driver.generate_numbers().await.unwrap();
        assert_eq!(10, numbers.isbn_10().len());
        assert_eq!(13, numbers.isbn_13().len());
    }

    #[tokio::test(start_paused = true)]
    async fn test_generate_numbers_with_separator() {
        let driver = driver(Duration::from_millis(15), Duration::from_secs(1), true);
        let numbers = driver.generate_numbers().await.unwrap();
        assert_eq!(13, numbers.isbn_10().len());
        assert_eq!(17, numbers.isbn_13().len());
    }

    #[tokio::test(start_paused = true)]
    async fn test_generate_numbers_timeout() {
        let driver = driver(Duration::from_secs(5), Duration::from_secs(1), false);
        assert_eq!(
            DriverError::Timeout("Timeout".to_owned()),
            driver.generate_numbers().await.unwrap_err()
        );
    }

    #[test]
    fn test_options_from_env_defaults() {
        temp_env::with_vars(
            [
                ("NUMBERS_DELAY", None::<&str>),
                ("NUMBERS_TIMEOUT", None),
                ("NUMBERS_SEPARATOR", None),
            ],
            || {
                assert_eq!(NumbersOptions::default(), NumbersOptions::from_env("NUMBERS").unwrap());
            },
        );
    }

    #[test]
    fn test_options_from_env_all() {
        temp_env::with_vars(
            [
                ("NUMBERS_DELAY", Some("2s")),
                ("NUMBERS_TIMEOUT", Some("500ms")),
                ("NUMBERS_SEPARATOR", Some("true")),
            ],
            || {
                let opts = NumbersOptions::from_env("NUMBERS").unwrap();
                assert_eq!(
                    NumbersOptions {
                        delay: Duration::from_secs(2),
                        timeout: Duration::from_millis(500),
                        separator: true,
                    },
                    opts
                );
            },
        );
    }

    #[test]
    fn test_options_from_env_bad_duration() {
        temp_env::with_var("NUMBERS_DELAY", Some("soon"), || {
            let err = NumbersOptions::from_env("NUMBERS").unwrap_err();
            assert!(err.contains("Invalid duration"), "Unexpected error: {}", err);
        });
    }
}
