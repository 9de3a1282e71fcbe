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

//! Operations on the collection of books.

use crate::db;
use crate::driver::Driver;
use crate::model::*;
use bookstore_core::driver::{DriverError, DriverResult};
use rand::Rng;

impl Driver {
    /// Counts all books.
    pub(crate) async fn count_books(self) -> DriverResult<u64> {
        let count = db::count_books(&mut *self.db.ex().await?).await?;
        Ok(count)
    }

    /// Gets all books ordered by identifier.
    pub(crate) async fn get_books(self) -> DriverResult<Vec<Book>> {
        let books = db::get_books(&mut *self.db.ex().await?).await?;
        Ok(books)
    }

    /// Gets one of the existing books chosen at random.
    pub(crate) async fn get_random_book(self) -> DriverResult<Book> {
        let mut tx = self.db.begin().await?;
        let ids = db::get_book_ids(tx.ex()).await?;
        if ids.is_empty() {
            return Err(DriverError::NotFound("No books available".to_owned()));
        }
        let id = ids[rand::rng().random_range(0..ids.len())];
        let book = db::get_book(tx.ex(), id).await?;
        tx.commit().await?;
        Ok(book)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::driver::testutils::*;
    use std::collections::HashSet;

    #[tokio::test]
    async fn test_count_books() {
        let context = TestContext::setup().await;

        assert_eq!(0, context.driver().count_books().await.unwrap());
        context.create_titled_book("First").await;
        context.create_titled_book("Second").await;
        assert_eq!(2, context.driver().count_books().await.unwrap());
    }

    #[tokio::test]
    async fn test_get_books_empty() {
        let context = TestContext::setup().await;

        assert!(context.driver().get_books().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_get_books_some() {
        let context = TestContext::setup().await;

        let book1 = context.create_titled_book("First").await;
        let book2 = context.create_book(Book::new("Second").unwrap().with_price(3.5)).await;

        assert_eq!(vec![book1, book2], context.driver().get_books().await.unwrap());
    }

    #[tokio::test]
    async fn test_get_random_book_empty() {
        let context = TestContext::setup().await;

        assert_eq!(
            DriverError::NotFound("No books available".to_owned()),
            context.driver().get_random_book().await.unwrap_err()
        );
    }

    #[tokio::test]
    async fn test_get_random_book_one() {
        let context = TestContext::setup().await;

        let book = context.create_titled_book("Only").await;
        assert_eq!(book, context.driver().get_random_book().await.unwrap());
    }

    #[tokio::test]
    async fn test_get_random_book_covers_all() {
        let context = TestContext::setup().await;

        let mut titles = HashSet::new();
        for title in ["First", "Second", "Third"] {
            context.create_titled_book(title).await;
            titles.insert(title.to_owned());
        }

        let mut seen = HashSet::new();
        for _ in 0..200 {
            let book = context.driver().get_random_book().await.unwrap();
            assert!(titles.contains(book.title()));
            seen.insert(book.title().clone());
        }
        assert_eq!(titles, seen);
    }
}
