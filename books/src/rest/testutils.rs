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

//! Test utilities for the REST API.

use crate::driver::testutils::TestContext as DriverTestContext;
use crate::rest::app;
use axum::Router;
use bookstore_isbn::MockNumberingClient;
use std::ops::Deref;

/// State of an app under test, which also gives access to the driver's test context.
pub(crate) struct TestContext {
    inner: DriverTestContext,
    app: Router,
}

impl TestContext {
    pub(crate) async fn setup() -> Self {
        Self::from_driver_context(DriverTestContext::setup().await)
    }

    pub(crate) async fn setup_with_numbering(numbering: MockNumberingClient) -> Self {
        Self::from_driver_context(DriverTestContext::setup_with_numbering(numbering).await)
    }

    fn from_driver_context(inner: DriverTestContext) -> Self {
        let app = app(inner.driver());
        Self { inner, app }
    }

    pub(crate) fn app(&self) -> Router {
        self.app.clone()
    }
}

impl Deref for TestContext {
    type Target = DriverTestContext;

    fn deref(&self) -> &Self::Target {
        &self.inner
    }
}
