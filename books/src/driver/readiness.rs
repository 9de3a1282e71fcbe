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

//! Maintenance mode of the service.

use crate::driver::Driver;
use crate::model::{Readiness, ReadinessState};
use log::info;
use std::sync::Mutex;
use time::OffsetDateTime;

/// Thread-safe holder of the readiness of the service.
pub(crate) struct ReadinessCell {
    /// Current readiness.  Never locked across await points.
    current: Mutex<Readiness>,
}

impl ReadinessCell {
    /// Creates a cell that accepts traffic since `now`.
    pub(crate) fn new(now: OffsetDateTime) -> Self {
        Self { current: Mutex::new(Readiness::new(ReadinessState::AcceptingTraffic, now)) }
    }

    /// Returns a snapshot of the current readiness.
    pub(crate) fn get(&self) -> Readiness {
        self.current.lock().expect("Readiness state poisoned").clone()
    }

    /// Moves to `state` as of `now`.  Setting the current state again refreshes its timestamp.
    pub(crate) fn set(&self, state: ReadinessState, now: OffsetDateTime) -> Readiness {
        let mut current = self.current.lock().expect("Readiness state poisoned");
        if *current.state() != state {
            info!("Readiness changed to {:?}", state);
        }
        *current = Readiness::new(state, now);
        current.clone()
    }
}

impl Driver {
    /// Returns the current readiness of the service.
    ///
    /// Unlike other operations, this does not consume the driver because it is queried on every
    /// request before dispatching it.
    pub(crate) fn readiness(&self) -> Readiness {
        self.readiness.get()
    }

    /// Enters maintenance mode if `in_maintenance` is true, or leaves it otherwise.
    pub(crate) fn set_maintenance(self, in_maintenance: bool) -> Readiness {
        let state = if in_maintenance {
            ReadinessState::RefusingTraffic
        } else {
            ReadinessState::AcceptingTraffic
        };
        self.readiness.set(state, self.clock.now_utc())
    }
}
