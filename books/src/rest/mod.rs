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

//! Entry point to the REST server.

use crate::driver::Driver;
use axum::Router;
use axum::middleware;

mod book_delete;
mod book_get;
mod book_put;
mod book_random_get;
mod books_count_get;
mod books_get;
mod books_post;
mod maintenance_gate;
mod maintenance_get;
mod maintenance_put;
#[cfg(test)]
mod testutils;

/// Path of the maintenance API, which is always reachable.
const MAINTENANCE_PATH: &str = "/maintenance";

/// Creates the router for the application.
pub(crate) fn app(driver: Driver) -> Router {
    use axum::routing::get;
    Router::new()
        .route("/books", get(books_get::handler).post(books_post::handler))
        .route("/books/count", get(books_count_get::handler))
        .route("/books/random", get(book_random_get::handler))
        .route(
            "/books/:id",
            get(book_get::handler).put(book_put::handler).delete(book_delete::handler),
        )
        .route(MAINTENANCE_PATH, get(maintenance_get::handler).put(maintenance_put::handler))
        .layer(middleware::from_fn_with_state(driver.clone(), maintenance_gate::gate))
        .with_state(driver)
}
