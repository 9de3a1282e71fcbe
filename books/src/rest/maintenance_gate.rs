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

//! Filter that refuses traffic while the service is in maintenance.

use crate::driver::Driver;
use crate::rest::MAINTENANCE_PATH;
use axum::extract::{Request, State};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use bookstore_core::rest::RestError;
use log::warn;

/// Answers every request with an error while in maintenance, except for those to the maintenance
/// API itself.  The wrapped handlers are not invoked for refused requests.
pub(crate) async fn gate(State(driver): State<Driver>, request: Request, next: Next) -> Response {
    if request.uri().path() != MAINTENANCE_PATH && driver.readiness().in_maintenance() {
        warn!("Refusing {} {} while in maintenance", request.method(), request.uri());
        return RestError::InMaintenance.into_response();
    }
    next.run(request).await
}
