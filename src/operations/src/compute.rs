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

//! Compute Engine operations.
//!
//! Compute operations report their progress in a `status` field. Failed
//! operations contain a list of errors, each with optional details such as a
//! localized message, help links, or information about exceeded quotas.

use gax::error::rpc::{Help, LocalizedMessage};
use gax::error::{OperationError, OperationErrorEntry};
use gax::polling_error_policy::{OperationGetRetryable, PollingErrorPolicy};
use gaxi::config::Service;
use gaxi::http::ReqwestClient;
use gaxi::path;
use lro::{Operation, OperationSource, OperationState, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;

const QUOTA_EXCEEDED: &str = "QUOTA_EXCEEDED";

/// A Compute Engine operation.
#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize)]
#[serde(default, rename_all = "camelCase")]
#[non_exhaustive]
pub struct ComputeOperation {
    pub name: String,
    pub operation_type: String,
    /// One of `PENDING`, `RUNNING` or `DONE`.
    pub status: String,
    pub status_message: String,
    pub target_link: String,
    pub self_link: String,
    /// The zone self link, for zonal operations.
    pub zone: String,
    /// The region self link, for regional operations.
    pub region: String,
    pub progress: i32,
    pub http_error_status_code: i32,
    pub http_error_message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ComputeErrors>,
}

/// The errors in a failed [ComputeOperation].
#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize)]
#[serde(default, rename_all = "camelCase")]
#[non_exhaustive]
pub struct ComputeErrors {
    pub errors: Vec<ComputeError>,
}

#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize)]
#[serde(default, rename_all = "camelCase")]
#[non_exhaustive]
pub struct ComputeError {
    pub code: String,
    pub location: String,
    pub message: String,
    pub error_details: Vec<ComputeErrorDetail>,
}

#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize)]
#[serde(default, rename_all = "camelCase")]
#[non_exhaustive]
pub struct ComputeErrorDetail {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub localized_message: Option<LocalizedMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub help: Option<Help>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quota_info: Option<QuotaExceededInfo>,
}

#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize)]
#[serde(default, rename_all = "camelCase")]
#[non_exhaustive]
pub struct QuotaExceededInfo {
    pub metric_name: String,
    pub limit_name: String,
    pub dimensions: BTreeMap<String, String>,
    pub limit: f64,
}

impl ComputeOperation {
    fn errors(&self) -> &[ComputeError] {
        self.error.as_ref().map(|e| e.errors.as_slice()).unwrap_or_default()
    }
}

impl Operation for ComputeOperation {
    fn name(&self) -> Option<&str> {
        Some(self.name.as_str()).filter(|n| !n.is_empty())
    }

    fn state(&self) -> OperationState {
        if self.status != "DONE" {
            return OperationState::Pending;
        }
        match self.errors() {
            [] => OperationState::Succeeded,
            errors => OperationState::Failed(errors.iter().map(to_entry).collect::<OperationError>()),
        }
    }

    fn status_text(&self) -> String {
        self.status.clone()
    }
}

fn to_entry(error: &ComputeError) -> OperationErrorEntry {
    let entry = OperationErrorEntry::new(&error.message);
    let entry = match error.code.as_str() {
        "" => entry,
        code => entry.set_code(code),
    };
    entry.set_details(details(error))
}

// Quota information replaces any other details. Otherwise use the first
// localized message and the first help link.
fn details(error: &ComputeError) -> Vec<String> {
    if error.code == QUOTA_EXCEEDED {
        if let Some(quota) = error.error_details.iter().find_map(|d| d.quota_info.as_ref()) {
            return quota_lines(quota);
        }
    }
    let mut lines = Vec::new();
    if let Some(m) = error
        .error_details
        .iter()
        .find_map(|d| d.localized_message.as_ref())
        .filter(|m| !m.message.is_empty())
    {
        lines.push(m.message.clone());
    }
    if let Some(link) = error
        .error_details
        .iter()
        .find_map(|d| d.help.as_ref().and_then(|h| h.links.first()))
    {
        lines.extend(
            [&link.description, &link.url]
                .into_iter()
                .filter(|s| !s.is_empty())
                .cloned(),
        );
    }
    lines
}

fn quota_lines(quota: &QuotaExceededInfo) -> Vec<String> {
    let mut lines = vec![
        format!("\tmetric name = {}", quota.metric_name),
        format!("\tlimit name = {}", quota.limit_name),
    ];
    if !quota.dimensions.is_empty() {
        let dimensions = quota
            .dimensions
            .iter()
            .map(|(k, v)| format!("{k}:{v}"))
            .collect::<Vec<_>>()
            .join(" ");
        lines.push(format!("\tdimensions = [{dimensions}]"));
    }
    lines
}

/// Where a Compute operation lives, which determines the URL to fetch it.
#[derive(Clone, Debug, PartialEq)]
pub enum ComputeScope {
    Zone(String),
    Region(String),
    /// Operations on organization resources, such as firewall policies.
    Organization(String),
    Global,
}

impl ComputeScope {
    /// Determines the scope from the operation returned by the starting call.
    ///
    /// `parent` is the organization (`organizations/123`) for operations on
    /// organization resources.
    pub fn for_operation(op: &ComputeOperation, parent: Option<&str>) -> Self {
        if !op.zone.is_empty() {
            return Self::Zone(path::last_segment(&op.zone).to_string());
        }
        if !op.region.is_empty() {
            return Self::Region(path::last_segment(&op.region).to_string());
        }
        match parent {
            Some(p) if !p.is_empty() => Self::Organization(p.to_string()),
            _ => Self::Global,
        }
    }
}

/// Fetches [ComputeOperation]s.
#[derive(Clone, Debug)]
pub struct ComputeSource {
    client: ReqwestClient,
    project: String,
    scope: ComputeScope,
}

impl ComputeSource {
    pub fn new<P: Into<String>>(client: ReqwestClient, project: P, scope: ComputeScope) -> Self {
        Self {
            client,
            project: project.into(),
            scope,
        }
    }

    /// The URL and query parameters to fetch the operation called `name`.
    pub fn operation_url(&self, name: &str) -> (String, Vec<(&'static str, String)>) {
        let base_path = self.client.config().base_path(Service::Compute);
        let project = &self.project;
        match &self.scope {
            ComputeScope::Zone(zone) => (
                format!("{base_path}projects/{project}/zones/{zone}/operations/{name}"),
                Vec::new(),
            ),
            ComputeScope::Region(region) => (
                format!("{base_path}projects/{project}/regions/{region}/operations/{name}"),
                Vec::new(),
            ),
            ComputeScope::Organization(parent) => (
                format!("{base_path}locations/global/operations/{name}"),
                vec![("parentId", parent.clone())],
            ),
            ComputeScope::Global => (
                format!("{base_path}projects/{project}/global/operations/{name}"),
                Vec::new(),
            ),
        }
    }
}

impl OperationSource for ComputeSource {
    type Operation = ComputeOperation;

    async fn fetch(&self, name: &str) -> Result<ComputeOperation> {
        let (url, query) = self.operation_url(name);
        let query = query
            .iter()
            .map(|(k, v)| (*k, v.as_str()))
            .collect::<Vec<_>>();
        self.client.get(&url, &query).await
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
    use test_case::test_case;

    type TestResult = std::result::Result<(), Box<dyn std::error::Error>>;

    fn source(scope: ComputeScope) -> std::result::Result<ComputeSource, Box<dyn std::error::Error>> {
        let config = Config::builder().build()?;
        Ok(ComputeSource::new(ReqwestClient::new(config)?, "my-project", scope))
    }

    #[test_case(json!({"status": "PENDING"}), "PENDING", false)]
    #[test_case(json!({"status": "RUNNING"}), "RUNNING", false)]
    #[test_case(json!({"status": "DONE"}), "DONE", true)]
    #[test_case(json!({"status": "DONE", "error": {"errors": []}}), "DONE", true)]
    fn state(input: serde_json::Value, status: &str, terminal: bool) -> TestResult {
        let op = serde_json::from_value::<ComputeOperation>(input)?;
        assert_eq!(op.status_text(), status);
        assert_eq!(op.state().is_terminal(), terminal, "{op:?}");
        assert!(!matches!(op.state(), OperationState::Failed(_)), "{op:?}");
        Ok(())
    }

    #[test]
    fn failed_with_details() -> TestResult {
        let op = serde_json::from_value::<ComputeOperation>(json!({
            "name": "operation-123",
            "status": "DONE",
            "error": {"errors": [
                {
                    "code": "RESOURCE_NOT_FOUND",
                    "message": "The resource 'projects/p/global/networks/n' was not found",
                    "errorDetails": [
                        {"localizedMessage": {"locale": "en-US", "message": "network not found"}},
                        {"help": {"links": [
                            {"description": "Learn more", "url": "https://cloud.google.com/compute"},
                            {"description": "ignored", "url": "https://example.com"}
                        ]}}
                    ]
                },
                {"message": "a second problem"}
            ]}
        }))?;
        let OperationState::Failed(error) = op.state() else {
            panic!("expected a failure in {op:?}");
        };
        pretty_assertions::assert_eq!(
            error.to_string(),
            "Error code RESOURCE_NOT_FOUND, message: The resource 'projects/p/global/networks/n' was not found\n\
             network not found\n\
             Learn more\n\
             https://cloud.google.com/compute\n\
             a second problem"
        );
        Ok(())
    }

    #[test]
    fn failed_with_quota() -> TestResult {
        let op = serde_json::from_value::<ComputeOperation>(json!({
            "name": "operation-123",
            "status": "DONE",
            "error": {"errors": [{
                "code": "QUOTA_EXCEEDED",
                "message": "Quota 'CPUS' exceeded.  Limit: 24.0 in region us-central1.",
                "errorDetails": [
                    {"localizedMessage": {"locale": "en-US", "message": "ignored with quota info"}},
                    {"quotaInfo": {
                        "metricName": "compute.googleapis.com/cpus",
                        "limitName": "CPUS-per-project-region",
                        "dimensions": {"region": "us-central1"},
                        "limit": 24.0
                    }}
                ]
            }]}
        }))?;
        let OperationState::Failed(error) = op.state() else {
            panic!("expected a failure in {op:?}");
        };
        let entry = &error.entries()[0];
        assert_eq!(entry.code.as_deref(), Some("QUOTA_EXCEEDED"));
        pretty_assertions::assert_eq!(
            entry.details,
            vec![
                "\tmetric name = compute.googleapis.com/cpus".to_string(),
                "\tlimit name = CPUS-per-project-region".to_string(),
                "\tdimensions = [region:us-central1]".to_string(),
            ]
        );
        Ok(())
    }

    #[test_case(json!({"zone": "https://www.googleapis.com/compute/v1/projects/p/zones/us-central1-a"}), None, ComputeScope::Zone("us-central1-a".into()))]
    #[test_case(json!({"region": "https://www.googleapis.com/compute/v1/projects/p/regions/us-east1"}), None, ComputeScope::Region("us-east1".into()))]
    #[test_case(json!({"region": "us-east1"}), Some("organizations/123"), ComputeScope::Region("us-east1".into()))]
    #[test_case(json!({}), Some("organizations/123"), ComputeScope::Organization("organizations/123".into()))]
    #[test_case(json!({}), Some(""), ComputeScope::Global)]
    #[test_case(json!({}), None, ComputeScope::Global)]
    fn scope(input: serde_json::Value, parent: Option<&str>, want: ComputeScope) -> TestResult {
        let op = serde_json::from_value::<ComputeOperation>(input)?;
        assert_eq!(ComputeScope::for_operation(&op, parent), want);
        Ok(())
    }

    #[test_case(ComputeScope::Zone("us-central1-a".into()), "https://compute.googleapis.com/compute/v1/projects/my-project/zones/us-central1-a/operations/op-1", &[])]
    #[test_case(ComputeScope::Region("us-east1".into()), "https://compute.googleapis.com/compute/v1/projects/my-project/regions/us-east1/operations/op-1", &[])]
    #[test_case(ComputeScope::Organization("organizations/123".into()), "https://compute.googleapis.com/compute/v1/locations/global/operations/op-1", &[("parentId", "organizations/123")])]
    #[test_case(ComputeScope::Global, "https://compute.googleapis.com/compute/v1/projects/my-project/global/operations/op-1", &[])]
    fn operation_url(scope: ComputeScope, want: &str, want_query: &[(&str, &str)]) -> TestResult {
        let source = source(scope)?;
        let (url, query) = source.operation_url("op-1");
        assert_eq!(url, want);
        let query = query
            .iter()
            .map(|(k, v)| (*k, v.as_str()))
            .collect::<Vec<_>>();
        assert_eq!(query, want_query);
        assert!(source.polling_error_policy().is_some());
        assert!(!source.completes_synchronously_without_name());
        Ok(())
    }
}
