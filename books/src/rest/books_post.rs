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

//! API to register a new book.

use crate::driver::Driver;
use crate::model::Book;
use axum::Json;
use axum::extract::{OriginalUri, State};
use axum::http::{self, header};
use axum::response::IntoResponse;
use bookstore_core::rest::RestError;

/// API handler.
///
/// The response carries no body: the location of the new book is returned in the `Location`
/// header, built from the request path so that it is valid behind any path prefix.
pub(crate) async fn handler(
    State(driver): State<Driver>,
    OriginalUri(uri): OriginalUri,
    Json(book): Json<Book>,
) -> Result<impl IntoResponse, RestError> {
    let book = driver.register_book(book).await?;
    let id = book.id().ok_or_else(|| {
        RestError::InternalError("Registered book does not have an id".to_owned())
    })?;
    let location = format!("{}/{}", uri.path().trim_end_matches('/'), id);
    Ok((http::StatusCode::CREATED, [(header::LOCATION, location)]))
}
