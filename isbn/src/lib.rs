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

//! APIs to obtain ISBN numbers for new books from the numbering service.

// Keep these in sync with other top-level files.
#![warn(anonymous_parameters, bad_style, clippy::missing_docs_in_private_items, missing_docs)]
#![warn(unused, unused_extern_crates, unused_import_braces, unused_qualifications)]
#![warn(unsafe_code)]

use async_trait::async_trait;
use derive_getters::Getters;
use serde::{Deserialize, Serialize};

mod remote;
pub use remote::{HttpNumberingClient, HttpNumberingClientOptions};
#[cfg(any(test, feature = "testutils"))]
mod mock;
#[cfg(any(test, feature = "testutils"))]
pub use mock::MockNumberingClient;

/// Errors that can happen while talking to the numbering service.
#[derive(Debug, PartialEq, thiserror::Error)]
pub enum NumberingError {
    /// The response could not be decoded.
    #[error("Invalid response from numbering service: {0}")]
    Parse(String),

    /// The service answered with a status other than 200.
    #[error("Numbering service returned status {0}: {1}")]
    Status(u16, String),

    /// The request could not be sent or its response could not be read.
    #[error("Cannot reach numbering service: {0}")]
    Transport(String),
}

/// Result type for this module.
pub type NumberingResult<T> = Result<T, NumberingError>;

/// Pair of codes returned by the numbering service for a new book.
#[derive(Clone, Debug, Deserialize, Eq, Getters, PartialEq, Serialize)]
pub struct IsbnNumbers {
    /// The 10-digit ISBN.
    isbn_10: String,

    /// The 13-digit ISBN.
    isbn_13: String,
}

impl IsbnNumbers {
    /// Creates a new pair of codes.
    pub fn new<S1: Into<String>, S2: Into<String>>(isbn_10: S1, isbn_13: S2) -> Self {
        Self { isbn_10: isbn_10.into(), isbn_13: isbn_13.into() }
    }
}

/// Interface to obtain ISBN numbers.
///
/// Implementations issue exactly one request per call and never retry: timeouts and retries are
/// the responsibility of the caller.
#[async_trait]
pub trait NumberingClient {
    /// Obtains a fresh pair of codes.
    async fn fetch_numbers(&self) -> NumberingResult<IsbnNumbers>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_test::{Token, assert_de_tokens, assert_tokens};

    #[test]
    fn test_isbn_numbers_ser_de() {
        let numbers = IsbnNumbers::new("0123456789", "0123456789012");
        assert_tokens(
            &numbers,
            &[
                Token::Struct { name: "IsbnNumbers", len: 2 },
                Token::Str("isbn_10"),
                Token::Str("0123456789"),
                Token::Str("isbn_13"),
                Token::Str("0123456789012"),
                Token::StructEnd,
            ],
        );
    }

    #[test]
    fn test_isbn_numbers_de_ignores_other_codes() {
        let numbers = IsbnNumbers::new("0123456789", "0123456789012");
        assert_de_tokens(
            &numbers,
            &[
                Token::Struct { name: "IsbnNumbers", len: 3 },
                Token::Str("asin"),
                Token::Str("B000000000"),
                Token::Str("isbn_10"),
                Token::Str("0123456789"),
                Token::Str("isbn_13"),
                Token::Str("0123456789012"),
                Token::StructEnd,
            ],
        );
    }
}
