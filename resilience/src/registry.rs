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

//! Registry of circuit breakers keyed by operation name.

use crate::{CircuitBreaker, CircuitBreakerOptions};
use bookstore_core::clocks::Clock;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

/// Collection of circuit breakers shared by a whole service.
///
/// Breakers are created on first use.  Each name gets its own independent state machine, so a
/// dependency that misbehaves for one operation does not trip the breakers of other operations.
pub struct CircuitBreakers {
    /// The clock handed to every breaker.
    clock: Arc<dyn Clock + Send + Sync>,

    /// Options for breakers without an explicit override.
    defaults: CircuitBreakerOptions,

    /// Per-name options that take precedence over `defaults`.
    overrides: HashMap<String, CircuitBreakerOptions>,

    /// Breakers created so far.
    breakers: Mutex<HashMap<String, Arc<CircuitBreaker>>>,
}

impl CircuitBreakers {
    /// Creates an empty registry whose breakers use `defaults` unless overridden.
    pub fn new(clock: Arc<dyn Clock + Send + Sync>, defaults: CircuitBreakerOptions) -> Self {
        Self { clock, defaults, overrides: HashMap::default(), breakers: Mutex::default() }
    }

    /// Configures the breaker for `name` to use `opts` instead of the defaults.
    pub fn with_options<S: Into<String>>(mut self, name: S, opts: CircuitBreakerOptions) -> Self {
        self.overrides.insert(name.into(), opts);
        self
    }

    /// Gets the breaker for the operation `name`, creating it if it does not exist yet.
    pub fn get(&self, name: &str) -> Arc<CircuitBreaker> {
        let mut breakers = self.breakers.lock().expect("Circuit breaker registry poisoned");
        breakers
            .entry(name.to_owned())
            .or_insert_with(|| {
                let opts = self.overrides.get(name).unwrap_or(&self.defaults).clone();
                Arc::from(CircuitBreaker::new(name, opts, self.clock.clone()))
            })
            .clone()
    }
}
