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

//! Numbering client backed by the HTTP numbering service.

use crate::{IsbnNumbers, NumberingClient, NumberingError, NumberingResult};
use async_trait::async_trait;
use bookstore_core::env::get_required_var;
use log::debug;
use reqwest::{Client, Response, StatusCode};
use url::Url;

/// Converts a `reqwest::Error` to a `NumberingError`.
fn reqwest_error_to_numbering_error(e: reqwest::Error) -> NumberingError {
    NumberingError::Transport(e.to_string())
}

/// Converts a `reqwest::Response` to a `NumberingError`.  The response should have a non-OK status.
async fn http_response_to_numbering_error(response: Response) -> NumberingError {
    let status = response.status();
    match response.text().await {
        Ok(text) => NumberingError::Status(status.as_u16(), text),
        Err(e) => NumberingError::Status(status.as_u16(), format!("Failed to get text: {}", e)),
    }
}

/// Options to configure an `HttpNumberingClient`.
#[derive(Clone, Debug, PartialEq)]
pub struct HttpNumberingClientOptions {
    /// Address of the API that hands out new numbers.
    pub url: Url,
}

impl HttpNumberingClientOptions {
    /// Creates a set of options from environment variables whose name is prefixed with the given
    /// `prefix`.
    ///
    /// This will use variables such as `<prefix>_URL`.
    pub fn from_env(prefix: &str) -> Result<Self, String> {
        let url = get_required_var::<String>(prefix, "URL")?;
        let url = Url::parse(&url)
            .map_err(|e| format!("Invalid URL in environment variable {}_URL: {}", prefix, e))?;
        Ok(Self { url })
    }
}

/// Numbering client that issues one GET request per call against the numbering service.
#[derive(Clone)]
pub struct HttpNumberingClient {
    /// Asynchronous HTTP client with which to issue the service requests.
    client: Client,

    /// Address of the API that hands out new numbers.
    url: Url,
}

impl HttpNumberingClient {
    /// Creates a new client using `opts` for configuration.
    pub fn new(opts: HttpNumberingClientOptions) -> Self {
        Self { client: Client::default(), url: opts.url }
    }
}

#[async_trait]
impl NumberingClient for HttpNumberingClient {
    async fn fetch_numbers(&self) -> NumberingResult<IsbnNumbers> {
        debug!("Requesting new numbers from {}", self.url);
        let response = self
            .client
            .get(self.url.clone())
            .send()
            .await
            .map_err(reqwest_error_to_numbering_error)?;
        match response.status() {
            StatusCode::OK => {
                let bytes = response.bytes().await.map_err(reqwest_error_to_numbering_error)?;
                serde_json::from_slice::<IsbnNumbers>(&bytes)
                    .map_err(|e| NumberingError::Parse(e.to_string()))
            }
            _ => Err(http_response_to_numbering_error(response).await),
        }
    }
}
