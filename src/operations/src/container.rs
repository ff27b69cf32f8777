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

//! Google Kubernetes Engine operations.

use gax::error::OperationErrorEntry;
use gax::error::rpc::{Status, StatusDetails};
use gax::polling_error_policy::{OperationGetRetryable, PollingErrorPolicy};
use gaxi::config::Service;
use gaxi::http::ReqwestClient;
use lro::{Operation, OperationSource, OperationState, Result};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// A GKE operation.
///
/// A `DONE` operation failed if it has an `error` or a `statusMessage`.
#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize)]
#[serde(default, rename_all = "camelCase")]
#[non_exhaustive]
pub struct ContainerOperation {
    pub name: String,
    pub operation_type: String,
    /// One of `PENDING`, `RUNNING`, `DONE` or `ABORTING`.
    pub status: String,
    pub status_message: String,
    pub detail: String,
    pub self_link: String,
    pub target_link: String,
    pub location: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<Status>,
}

impl Operation for ContainerOperation {
    fn name(&self) -> Option<&str> {
        Some(self.name.as_str()).filter(|n| !n.is_empty())
    }

    fn state(&self) -> OperationState {
        if self.status != "DONE" {
            return OperationState::Pending;
        }
        if let Some(status) = &self.error {
            let entry = OperationErrorEntry::new(&status.message)
                .set_details(status.details.iter().filter_map(StatusDetails::summary));
            return OperationState::Failed(entry.into());
        }
        if !self.status_message.is_empty() {
            return OperationState::Failed(OperationErrorEntry::new(&self.status_message).into());
        }
        OperationState::Succeeded
    }

    fn status_text(&self) -> String {
        self.status.clone()
    }
}

/// Fetches [ContainerOperation]s in a project and location.
#[derive(Clone, Debug)]
pub struct ContainerSource {
    client: ReqwestClient,
    project: String,
    location: String,
}

impl ContainerSource {
    pub fn new<P, L>(client: ReqwestClient, project: P, location: L) -> Self
    where
        P: Into<String>,
        L: Into<String>,
    {
        Self {
            client,
            project: project.into(),
            location: location.into(),
        }
    }

    pub fn operation_url(&self, name: &str) -> String {
        format!(
            "{}projects/{}/locations/{}/operations/{name}",
            self.client.config().base_path(Service::Container),
            self.project,
            self.location
        )
    }
}

impl OperationSource for ContainerSource {
    type Operation = ContainerOperation;

    async fn fetch(&self, name: &str) -> Result<ContainerOperation> {
        self.client.get(&self.operation_url(name), &[]).await
    }

    fn polling_error_policy(&self) -> Option<Arc<dyn PollingErrorPolicy>> {
        Some(Arc::new(OperationGetRetryable))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gaxi::config::Config;
    use serde_json::json;

    type TestResult = std::result::Result<(), Box<dyn std::error::Error>>;

    #[test]
    fn state() -> TestResult {
        let op = serde_json::from_value::<ContainerOperation>(json!({
            "name": "operation-123",
            "status": "RUNNING",
            "statusMessage": "still going"
        }))?;
        assert_eq!(op.state(), OperationState::Pending);
        assert_eq!(op.status_text(), "RUNNING");

        let op = serde_json::from_value::<ContainerOperation>(json!({
            "name": "operation-123",
            "status": "DONE"
        }))?;
        assert_eq!(op.state(), OperationState::Succeeded);
        Ok(())
    }

    #[test]
    fn failed_with_status_message() -> TestResult {
        let op = serde_json::from_value::<ContainerOperation>(json!({
            "name": "operation-123",
            "status": "DONE",
            "statusMessage": "Insufficient regional quota to satisfy request"
        }))?;
        let OperationState::Failed(error) = op.state() else {
            panic!("expected a failure in {op:?}");
        };
        assert_eq!(error.to_string(), "Insufficient regional quota to satisfy request");
        Ok(())
    }

    #[test]
    fn failed_with_error() -> TestResult {
        let op = serde_json::from_value::<ContainerOperation>(json!({
            "name": "operation-123",
            "status": "DONE",
            "statusMessage": "ignored",
            "error": {"code": 8, "message": "out of IP addresses"}
        }))?;
        let OperationState::Failed(error) = op.state() else {
            panic!("expected a failure in {op:?}");
        };
        assert_eq!(error.to_string(), "out of IP addresses");
        Ok(())
    }

    #[test]
    fn operation_url() -> TestResult {
        let config = Config::builder().build()?;
        let source = ContainerSource::new(ReqwestClient::new(config)?, "my-project", "us-central1");
        assert_eq!(
            source.operation_url("operation-123"),
            "https://container.googleapis.com/v1/projects/my-project/locations/us-central1/operations/operation-123"
        );
        assert!(source.polling_error_policy().is_some());
        Ok(())
    }
}
