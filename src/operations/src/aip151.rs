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

//! Operations in the [AIP-151] format.
//!
//! Most Google Cloud APIs return operations with a `done` flag, and either an
//! `error` status or a `response` payload once they complete.
//!
//! [AIP-151]: https://google.aip.dev/151

use gax::error::OperationErrorEntry;
use gax::error::rpc::{Status, StatusDetails};
use gax::polling_error_policy::{OperationGetRetryable, PollingErrorPolicy};
use gaxi::config::Service;
use gaxi::http::ReqwestClient;
use gaxi::path;
use lro::{Error, Operation, OperationSource, OperationState, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;

/// An operation in the AIP-151 format.
#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize)]
#[serde(default, rename_all = "camelCase")]
#[non_exhaustive]
pub struct CommonOperation {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Value>,
    pub done: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<Status>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response: Option<Value>,
}

impl Operation for CommonOperation {
    fn name(&self) -> Option<&str> {
        Some(self.name.as_str()).filter(|n| !n.is_empty())
    }

    fn state(&self) -> OperationState {
        match (self.done, &self.error) {
            (false, _) => OperationState::Pending,
            (true, None) => OperationState::Succeeded,
            (true, Some(status)) => OperationState::Failed(to_entry(status).into()),
        }
    }

    fn response(&self) -> Option<&Value> {
        self.response.as_ref()
    }

    fn status_text(&self) -> String {
        match self.state() {
            OperationState::Pending => "NOT DONE".to_string(),
            s => s.to_string(),
        }
    }
}

fn to_entry(status: &Status) -> OperationErrorEntry {
    OperationErrorEntry::new(&status.message)
        .set_code(status.code.value().to_string())
        .set_details(status.details.iter().filter_map(StatusDetails::summary))
}

/// Fetches [CommonOperation]s for one of the AIP-151 services.
///
/// The operation name is appended to the service base path. For regional
/// services the location in the base path is taken from the operation name.
#[derive(Clone, Debug)]
pub struct CommonSource {
    client: ReqwestClient,
    service: Service,
}

impl CommonSource {
    pub fn new(client: ReqwestClient, service: Service) -> Self {
        Self { client, service }
    }

    /// The URL to fetch the operation called `name`.
    pub fn operation_url(&self, name: &str) -> Result<String> {
        let base_path = self.client.config().base_path(self.service);
        if !path::has_location_template(&base_path) {
            return Ok(format!("{base_path}{name}"));
        }
        let location = path::location_from_name(name)
            .or_else(|| match self.service {
                Service::TagsLocation => path::location_from_tag_binding_operation(name),
                _ => None,
            })
            .ok_or_else(|| {
                Error::malformed_operation(format!(
                    "cannot find the location in operation {name} for the {} service",
                    self.service
                ))
            })?;
        Ok(format!("{}{name}", path::fill_location(&base_path, location)))
    }
}

impl OperationSource for CommonSource {
    type Operation = CommonOperation;

    async fn fetch(&self, name: &str) -> Result<CommonOperation> {
        let url = self.operation_url(name)?;
        self.client.get(&url, &[]).await
    }

    /// The regional services return an unnamed operation when the request
    /// completes synchronously.
    fn completes_synchronously_without_name(&self) -> bool {
        self.service.is_regional()
    }

    fn polling_error_policy(&self) -> Option<Arc<dyn PollingErrorPolicy>> {
        Some(Arc::new(OperationGetRetryable))
    }
}
