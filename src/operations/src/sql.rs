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

//! Cloud SQL Admin operations.

use gax::error::{OperationError, OperationErrorEntry};
use gax::polling_error_policy::{OperationGetRetryable, PollingErrorPolicy};
use gaxi::config::Service;
use gaxi::http::ReqwestClient;
use lro::{Operation, OperationSource, OperationState, Result};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// A Cloud SQL Admin operation.
#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize)]
#[serde(default, rename_all = "camelCase")]
#[non_exhaustive]
pub struct SqlOperation {
    pub name: String,
    pub operation_type: String,
    /// One of `PENDING`, `RUNNING` or `DONE`.
    pub status: String,
    pub target_id: String,
    pub target_project: String,
    pub target_link: String,
    pub self_link: String,
    pub insert_time: String,
    pub start_time: String,
    pub end_time: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<SqlErrors>,
}

#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize)]
#[serde(default, rename_all = "camelCase")]
#[non_exhaustive]
pub struct SqlErrors {
    pub kind: String,
    pub errors: Vec<SqlError>,
}

#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize)]
#[serde(default, rename_all = "camelCase")]
#[non_exhaustive]
pub struct SqlError {
    pub kind: String,
    pub code: String,
    pub message: String,
}

impl Operation for SqlOperation {
    fn name(&self) -> Option<&str> {
        Some(self.name.as_str()).filter(|n| !n.is_empty())
    }

    fn state(&self) -> OperationState {
        if self.status != "DONE" {
            return OperationState::Pending;
        }
        let errors = self.error.as_ref().map(|e| e.errors.as_slice());
        match errors.unwrap_or_default() {
            [] => OperationState::Succeeded,
            errors => OperationState::Failed(
                errors
                    .iter()
                    .map(|e| match e.code.as_str() {
                        "" => OperationErrorEntry::new(&e.message),
                        code => OperationErrorEntry::new(&e.message).set_code(code),
                    })
                    .collect::<OperationError>(),
            ),
        }
    }

    fn status_text(&self) -> String {
        self.status.clone()
    }
}

/// Fetches [SqlOperation]s in a project.
#[derive(Clone, Debug)]
pub struct SqlSource {
    client: ReqwestClient,
    project: String,
}

impl SqlSource {
    pub fn new<P: Into<String>>(client: ReqwestClient, project: P) -> Self {
        Self {
            client,
            project: project.into(),
        }
    }

    pub fn operation_url(&self, name: &str) -> String {
        format!(
            "{}projects/{}/operations/{name}",
            self.client.config().base_path(Service::Sql),
            self.project
        )
    }
}

impl OperationSource for SqlSource {
    type Operation = SqlOperation;

    async fn fetch(&self, name: &str) -> Result<SqlOperation> {
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
        let op = serde_json::from_value::<SqlOperation>(json!({
            "name": "6f5ae5e4-0000",
            "status": "PENDING",
            "operationType": "CREATE"
        }))?;
        assert_eq!(op.state(), OperationState::Pending);
        assert_eq!(op.status_text(), "PENDING");

        let op = serde_json::from_value::<SqlOperation>(json!({
            "name": "6f5ae5e4-0000",
            "status": "DONE",
            "error": {"kind": "sql#operationErrors", "errors": []}
        }))?;
        assert_eq!(op.state(), OperationState::Succeeded);
        Ok(())
    }

    #[test]
    fn failed() -> TestResult {
        let op = serde_json::from_value::<SqlOperation>(json!({
            "name": "6f5ae5e4-0000",
            "status": "DONE",
            "error": {"kind": "sql#operationErrors", "errors": [
                {"kind": "sql#operationError", "code": "INTERNAL_ERROR", "message": "first"},
                {"kind": "sql#operationError", "message": "second"}
            ]}
        }))?;
        let OperationState::Failed(error) = op.state() else {
            panic!("expected a failure in {op:?}");
        };
        assert_eq!(
            error.to_string(),
            "Error code INTERNAL_ERROR, message: first\nsecond"
        );
        Ok(())
    }

    #[test]
    fn operation_url() -> TestResult {
        let config = Config::builder().build()?;
        let source = SqlSource::new(ReqwestClient::new(config)?, "my-project");
        assert_eq!(
            source.operation_url("6f5ae5e4-0000"),
            "https://sqladmin.googleapis.com/sql/v1beta4/projects/my-project/operations/6f5ae5e4-0000"
        );
        assert!(source.polling_error_policy().is_some());
        Ok(())
    }
}
