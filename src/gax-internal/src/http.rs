// Copyright 2025 Google LLC
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     https://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! The HTTP transport used to fetch operations.

use crate::config::Config;
use gax::Result;
use gax::error::Error;
use std::sync::Arc;

const USER_PROJECT_HEADER: &str = "x-goog-user-project";
const REQUEST_REASON_HEADER: &str = "x-goog-request-reason";

/// Sends `GET` requests for operations, with the headers required by the
/// provider configuration.
#[derive(Clone, Debug)]
pub struct ReqwestClient {
    inner: reqwest::Client,
    config: Arc<Config>,
}

impl ReqwestClient {
    /// Creates the client and its connection pool.
    ///
    /// Build one client when the provider is configured, and share it (it is
    /// cheap to clone) across all the waits.
    pub fn new(config: Arc<Config>) -> Result<Self> {
        let inner = reqwest::Client::builder().build().map_err(Error::io)?;
        Ok(Self { inner, config })
    }

    pub fn config(&self) -> &Arc<Config> {
        &self.config
    }

    /// Fetches `url` and decodes the JSON response.
    pub async fn get<O: serde::de::DeserializeOwned>(
        &self,
        url: &str,
        query: &[(&str, &str)],
    ) -> Result<O> {
        let builder = self
            .inner
            .get(url)
            .query(query)
            .timeout(self.config.request_timeout());
        let builder = self.add_headers(builder)?;
        tracing::debug!(method = "GET", url, "fetching operation");
        let response = builder.send().await.map_err(Self::map_send_error)?;
        if !response.status().is_success() {
            return self::to_http_error(response).await;
        }
        self::to_http_response(response).await
    }

    fn add_headers(&self, mut builder: reqwest::RequestBuilder) -> Result<reqwest::RequestBuilder> {
        use reqwest::header::{AUTHORIZATION, HeaderValue, USER_AGENT};
        builder = builder.header(
            USER_AGENT,
            HeaderValue::from_str(self.config.user_agent()).map_err(Error::other)?,
        );
        if let Some(token) = self.config.access_token() {
            let mut value = HeaderValue::from_str(&format!("Bearer {token}")).map_err(Error::other)?;
            value.set_sensitive(true);
            builder = builder.header(AUTHORIZATION, value);
        }
        if let Some(project) = self.config.user_project() {
            builder = builder.header(
                USER_PROJECT_HEADER,
                HeaderValue::from_str(project).map_err(Error::other)?,
            );
        }
        if let Some(reason) = self.config.request_reason() {
            builder = builder.header(
                REQUEST_REASON_HEADER,
                HeaderValue::from_str(reason).map_err(Error::other)?,
            );
        }
        Ok(builder)
    }

    // A request that exceeds its own timeout is a transport failure. Only the
    // waiter's deadline produces timeout errors.
    fn map_send_error(err: reqwest::Error) -> Error {
        Error::io(err)
    }
}

pub async fn to_http_error<O>(response: reqwest::Response) -> Result<O> {
    let status_code = response.status().as_u16();
    let headers = response.headers().clone();
    let body = response.bytes().await.map_err(Error::io)?;

    let error = match gax::error::rpc::Status::try_from(&body) {
        Ok(status) => Error::service_with_http_metadata(status, Some(status_code), Some(headers))
            .with_http_payload(body),
        Err(_) => Error::http(status_code, headers, body),
    };
    tracing::debug!(status_code, "the service returned an error: {error}");
    Err(error)
}

async fn to_http_response<O: serde::de::DeserializeOwned>(response: reqwest::Response) -> Result<O> {
    let body = response.bytes().await.map_err(Error::io)?;
    serde_json::from_slice::<O>(&body).map_err(Error::deser)
}
