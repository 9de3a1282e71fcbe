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

//! API to update an existing book.

use crate::driver::Driver;
use crate::model::{Book, BookId};
use axum::Json;
use axum::extract::{Path, State};
use axum::response::IntoResponse;
use bookstore_core::rest::RestError;

/// API handler.
pub(crate) async fn handler(
    State(driver): State<Driver>,
    Path(id): Path<BookId>,
    Json(book): Json<Book>,
) -> Result<impl IntoResponse, RestError> {
    let book = driver.update_book(id, book).await?;
    Ok(Json(book))
}

#[cfg(test)]
mod tests {
    use crate::model::*;
    use crate::rest::testutils::*;
    use axum::http;
    use bookstore_core::rest::testutils::*;

    fn route(id: impl std::fmt::Display) -> (http::Method, String) {
        (http::Method::PUT, format!("/books/{}", id))
    }

    #[tokio::test]
    async fn test_ok() {
        let context = TestContext::setup().await;

        let book = context.create_titled_book("Old title").await;
        let id = book.id().unwrap();

        let response = OneShotBuilder::new(context.app(), route(id))
            .send_json(serde_json::json!({
                "title": "New title",
                "author": "Someone",
                "nbOfPages": 120,
            }))
            .await
            .expect_json::<Book>()
            .await;

        let exp_book = Book::new("New title")
            .unwrap()
            .with_author("Someone")
            .with_nb_of_pages(120)
            .with_id(id);
        assert_eq!(exp_book, response);
        assert_eq!(Some(exp_book), context.get_book(id).await);
    }

    #[tokio::test]
    async fn test_not_found() {
        let context = TestContext::setup().await;

        OneShotBuilder::new(context.app(), route(8))
            .send_json(serde_json::json!({"title": "Title"}))
            .await
            .expect_status(http::StatusCode::NOT_FOUND)
            .expect_error("not found")
            .await;
        assert_eq!(0, context.count_books().await);
    }

    #[tokio::test]
    async fn test_invalid_book() {
        let context = TestContext::setup().await;

        let book = context.create_titled_book("Title").await;
        let id = book.id().unwrap();

        OneShotBuilder::new(context.app(), route(id))
            .send_json(serde_json::json!({"title": ""}))
            .await
            .expect_status(http::StatusCode::BAD_REQUEST)
            .expect_error("title cannot be empty")
            .await;
        assert_eq!(Some(book), context.get_book(id).await);
    }

    #[tokio::test]
    async fn test_only_one_isbn() {
        let context = TestContext::setup().await;

        let book = context
            .create_book(Book::new("Title").unwrap().with_isbns("0123456789", "0123456789012"))
            .await;
        let id = book.id().unwrap();

        OneShotBuilder::new(context.app(), route(id))
            .send_json(serde_json::json!({"title": "T", "isbn10": "0123456789"}))
            .await
            .expect_status(http::StatusCode::BAD_REQUEST)
            .expect_error("both ISBN codes or none")
            .await;
        assert_eq!(Some(book), context.get_book(id).await);
    }

    test_payload_must_be_json!(TestContext::setup().await.app(), route(1));
}
