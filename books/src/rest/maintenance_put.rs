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

//! API to enter or leave maintenance.

use crate::driver::Driver;
use axum::extract::State;
use axum::http;
use bookstore_core::rest::RestError;

/// Parses the body of a maintenance request, which must be `true` or `false`.
fn parse_flag(body: &str) -> Result<bool, RestError> {
    match body.trim().to_ascii_lowercase().as_str() {
        "true" => Ok(true),
        "false" => Ok(false),
        _ => Err(RestError::InvalidRequest(format!(
            "Maintenance flag must be true or false but got '{}'",
            body
        ))),
    }
}

/// API handler.
pub(crate) async fn handler(
    State(driver): State<Driver>,
    body: String,
) -> Result<http::StatusCode, RestError> {
    let in_maintenance = parse_flag(&body)?;
    driver.set_maintenance(in_maintenance);
    Ok(http::StatusCode::NO_CONTENT)
}
