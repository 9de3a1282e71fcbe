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

//! Numbering client with scripted behavior for testing purposes.

use crate::{IsbnNumbers, NumberingClient, NumberingError, NumberingResult};
use async_trait::async_trait;
use futures::future;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

/// What the mock does when asked for numbers.
#[derive(Clone)]
enum Behavior {
    /// Answers immediately with the given numbers.
    Respond(IsbnNumbers),

    /// Fails immediately with a transport error carrying the given message.
    Fail(String),

    /// Never answers.
    Hang,
}

/// Numbering client whose behavior is configured by the test and that counts its calls.
pub struct MockNumberingClient {
    /// Current behavior.
    behavior: Mutex<Behavior>,

    /// Number of times `fetch_numbers` has been called.
    calls: AtomicUsize,
}

impl MockNumberingClient {
    /// Creates a mock with the given initial `behavior`.
    fn new(behavior: Behavior) -> Self {
        Self { behavior: Mutex::new(behavior), calls: AtomicUsize::new(0) }
    }

    /// Creates a mock that always answers with `isbn_10` and `isbn_13`.
    pub fn responding(isbn_10: &str, isbn_13: &str) -> Self {
        Self::new(Behavior::Respond(IsbnNumbers::new(isbn_10, isbn_13)))
    }

    /// Creates a mock that always fails with a transport error.
    pub fn failing(message: &str) -> Self {
        Self::new(Behavior::Fail(message.to_owned()))
    }

    /// Creates a mock that never answers.
    pub fn hanging() -> Self {
        Self::new(Behavior::Hang)
    }

    /// Makes subsequent calls answer with `isbn_10` and `isbn_13`.
    pub fn respond_with(&self, isbn_10: &str, isbn_13: &str) {
        *self.behavior.lock().unwrap() = Behavior::Respond(IsbnNumbers::new(isbn_10, isbn_13));
    }

    /// Makes subsequent calls hang forever.
    pub fn hang(&self) {
        *self.behavior.lock().unwrap() = Behavior::Hang;
    }

    /// Returns the number of calls received so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl NumberingClient for MockNumberingClient {
    async fn fetch_numbers(&self) -> NumberingResult<IsbnNumbers> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let behavior = self.behavior.lock().unwrap().clone();
        match behavior {
            Behavior::Respond(numbers) => Ok(numbers),
            Behavior::Fail(message) => Err(NumberingError::Transport(message)),
            Behavior::Hang => future::pending().await,
        }
    }
}
