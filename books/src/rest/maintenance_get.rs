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

//! API to query whether the service is in maintenance.

use crate::driver::Driver;
use axum::Json;
use axum::extract::State;
use axum::response::IntoResponse;
use bookstore_core::rest::{EmptyBody, RestError};
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

/// Message returned by the server when querying the maintenance status.
#[derive(Deserialize, Serialize)]
#[cfg_attr(test, derive(Debug, PartialEq))]
#[serde(rename_all = "camelCase")]
pub(crate) struct MaintenanceResponse {
    /// Whether the service is refusing traffic.
    pub(crate) in_maintenance: bool,

    /// When the maintenance status last changed.
    #[serde(with = "time::serde::rfc3339")]
    pub(crate) from: OffsetDateTime,
}

/// API handler.
pub(crate) async fn handler(
    State(driver): State<Driver>,
    _: EmptyBody,
) -> Result<impl IntoResponse, RestError> {
    let readiness = driver.readiness();
    Ok(Json(MaintenanceResponse {
        in_maintenance: readiness.in_maintenance(),
        from: *readiness.since(),
    }))
}
