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

//! High-level data types.

use bookstore_core::model::{ModelError, ModelResult};
use derive_getters::Getters;
use derive_more::Display;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use url::Url;

/// Maximum number of characters in a book description.
const MAX_DESCRIPTION_LENGTH: usize = 10000;

/// Identifier of a stored book.  Always positive.
#[derive(Clone, Copy, Debug, Deserialize, Display, Eq, Ord, PartialEq, PartialOrd, Serialize)]
#[serde(try_from = "i64", into = "i64")]
pub(crate) struct BookId(i64);

impl BookId {
    /// Creates a book identifier from an `i64` with range validation.
    pub(crate) fn new(id: i64) -> ModelResult<Self> {
        if id <= 0 {
            return Err(ModelError(format!("Book id must be positive but got {}", id)));
        }
        Ok(Self(id))
    }

    /// Returns the identifier as an `i64`.
    pub(crate) fn as_i64(self) -> i64 {
        self.0
    }
}

impl TryFrom<i64> for BookId {
    type Error = ModelError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<BookId> for i64 {
    fn from(value: BookId) -> Self {
        value.0
    }
}

/// A book as exposed by the API, stored in the database and written to fallback files.
///
/// The identifier and the ISBN codes are owned by the service: they are assigned when the book is
/// registered and any values provided by clients at that point are discarded.
#[derive(Clone, Debug, Deserialize, Getters, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct Book {
    /// Identifier assigned once the book has been stored.
    #[serde(default)]
    id: Option<BookId>,

    /// Title of the book.  Required, but missing values are rejected by `validate`.
    #[serde(default)]
    title: String,

    /// The 13-digit ISBN assigned by the numbering service.
    #[serde(default)]
    isbn_13: Option<String>,

    /// The 10-digit ISBN assigned by the numbering service.
    #[serde(default)]
    isbn_10: Option<String>,

    /// Name of the author.
    #[serde(default)]
    author: Option<String>,

    /// Year in which the book was first published.
    #[serde(default)]
    year_of_publication: Option<i32>,

    /// Number of pages.
    #[serde(default)]
    nb_of_pages: Option<i32>,

    /// Score given to the book, between 1 and 10.
    #[serde(default)]
    rank: Option<i32>,

    /// Price of the book, in no particular currency.
    #[serde(default)]
    price: Option<f64>,

    /// Location of the thumbnail of the cover.
    #[serde(default)]
    small_image_url: Option<Url>,

    /// Location of a medium-sized picture of the cover.
    #[serde(default)]
    medium_image_url: Option<Url>,

    /// Free-form description of the book, up to `MAX_DESCRIPTION_LENGTH` characters.
    #[serde(default)]
    description: Option<String>,
}

impl Book {
    /// Creates a new book with only a `title` and no other details.
    pub(crate) fn new<S: Into<String>>(title: S) -> ModelResult<Self> {
        let book = Self {
            id: None,
            title: title.into(),
            isbn_13: None,
            isbn_10: None,
            author: None,
            year_of_publication: None,
            nb_of_pages: None,
            rank: None,
            price: None,
            small_image_url: None,
            medium_image_url: None,
            description: None,
        };
        book.validate()?;
        Ok(book)
    }

    /// Checks that the fields of the book hold acceptable values.
    ///
    /// This is necessary because books are usually built by deserializing client requests, which
    /// bypasses the constructor.
    pub(crate) fn validate(&self) -> ModelResult<()> {
        if self.title.trim().is_empty() {
            return Err(ModelError("Book title cannot be empty".to_owned()));
        }
        if self.isbn_10.is_some() != self.isbn_13.is_some() {
            return Err(ModelError("Book must have both ISBN codes or none".to_owned()));
        }
        if let Some(rank) = self.rank {
            if !(1..=10).contains(&rank) {
                return Err(ModelError(format!("Book rank must be in [1, 10] but got {}", rank)));
            }
        }
        if let Some(nb_of_pages) = self.nb_of_pages {
            if nb_of_pages < 0 {
                return Err(ModelError("Number of pages cannot be negative".to_owned()));
            }
        }
        if let Some(price) = self.price {
            if !price.is_finite() || price < 0.0 {
                return Err(ModelError(format!("Invalid book price {}", price)));
            }
        }
        if let Some(description) = self.description.as_ref() {
            if description.chars().count() > MAX_DESCRIPTION_LENGTH {
                return Err(ModelError(format!(
                    "Book description cannot exceed {} characters",
                    MAX_DESCRIPTION_LENGTH
                )));
            }
        }
        Ok(())
    }

    /// Discards the fields that are assigned by the service, keeping only the client's details.
    pub(crate) fn without_assigned_fields(self) -> Self {
        Self { id: None, isbn_13: None, isbn_10: None, ..self }
    }

    /// Sets the identifier of the book.
    pub(crate) fn with_id(self, id: BookId) -> Self {
        Self { id: Some(id), ..self }
    }

    /// Sets the ISBN codes of the book.
    pub(crate) fn with_isbns<S1: Into<String>, S2: Into<String>>(
        self,
        isbn_10: S1,
        isbn_13: S2,
    ) -> Self {
        Self { isbn_10: Some(isbn_10.into()), isbn_13: Some(isbn_13.into()), ..self }
    }

    /// Sets the author of the book.
    pub(crate) fn with_author<S: Into<String>>(self, author: S) -> Self {
        Self { author: Some(author.into()), ..self }
    }

    /// Sets the year of publication of the book.
    pub(crate) fn with_year_of_publication(self, year: i32) -> Self {
        Self { year_of_publication: Some(year), ..self }
    }

    /// Sets the number of pages of the book.
    pub(crate) fn with_nb_of_pages(self, nb_of_pages: i32) -> Self {
        Self { nb_of_pages: Some(nb_of_pages), ..self }
    }

    /// Sets the rank of the book.
    pub(crate) fn with_rank(self, rank: i32) -> Self {
        Self { rank: Some(rank), ..self }
    }

    /// Sets the price of the book.
    pub(crate) fn with_price(self, price: f64) -> Self {
        Self { price: Some(price), ..self }
    }

    /// Sets the cover picture locations of the book.
    pub(crate) fn with_image_urls(self, small: Option<Url>, medium: Option<Url>) -> Self {
        Self { small_image_url: small, medium_image_url: medium, ..self }
    }

    /// Sets the description of the book.
    pub(crate) fn with_description<S: Into<String>>(self, description: S) -> Self {
        Self { description: Some(description.into()), ..self }
    }
}

/// Whether the service accepts requests or is in maintenance.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub(crate) enum ReadinessState {
    /// Requests are served normally.
    AcceptingTraffic,

    /// Requests other than those to the maintenance API are refused.
    RefusingTraffic,
}

/// Current readiness of the service and when it last changed.
#[derive(Clone, Debug, Getters, PartialEq)]
pub(crate) struct Readiness {
    /// The readiness state.
    state: ReadinessState,

    /// When `state` was last set.
    since: OffsetDateTime,
}

impl Readiness {
    /// Creates a new readiness value.
    pub(crate) fn new(state: ReadinessState, since: OffsetDateTime) -> Self {
        Self { state, since }
    }

    /// Returns true if the service is in maintenance.
    pub(crate) fn in_maintenance(&self) -> bool {
        self.state == ReadinessState::RefusingTraffic
    }
}
