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

//! Registration of new books.

use crate::db;
use crate::driver::{Driver, NUMBERING_BREAKER};
use crate::model::*;
use bookstore_core::driver::DriverResult;
use bookstore_isbn::NumberingError;
use log::{info, warn};

impl Driver {
    /// Registers a new `book` after obtaining its ISBN codes from the numbering service.
    ///
    /// Any identifier or ISBN codes present in `book` are discarded.  If the numbering service
    /// fails, times out, or its circuit is open, the book is not stored: it is written to a
    /// fallback file instead and the caller gets a timeout error.
    pub(crate) async fn register_book(self, book: Book) -> DriverResult<Book> {
        let book = &book.without_assigned_fields();
        book.validate()?;

        let numbering = self.numbering.as_ref();
        let fallback = self.fallback.as_ref();
        let breaker = self.breakers.get(NUMBERING_BREAKER);
        let book = breaker
            .attempt(
                || async move {
                    let numbers = numbering.fetch_numbers().await?;
                    Ok::<_, NumberingError>(
                        book.clone().with_isbns(numbers.isbn_10(), numbers.isbn_13()),
                    )
                },
                |failure| async move {
                    warn!("Cannot get numbers for book {}: {}", book.title(), failure);
                    fallback.persist_degraded(book).await
                },
            )
            .await?;

        let id = db::create_book(&mut *self.db.ex().await?, &book).await?;
        info!("Registered book {} with id {}", book.title(), id);
        Ok(book.with_id(id))
    }
}
