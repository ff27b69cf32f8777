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

//! Waits for the operations returned by the Google Cloud APIs.
//!
//! Each API family formats its operations differently, and uses different
//! URLs to fetch them. This crate provides one [OperationSource] per family,
//! and convenience functions to wait for the operations returned by the
//! starting call.
//!
//! The functions take the operation as raw JSON, as returned by the starting
//! call, and use the poll interval from the provider [Config]. They share the
//! [ReqwestClient] created when the provider is configured.
//!
//! # Example
//! ```
//! # use tpg_operations::*;
//! # use gaxi::http::ReqwestClient;
//! # use std::time::Duration;
//! async fn sample(client: &ReqwestClient, op: serde_json::Value) -> lro::Result<()> {
//!     let done = compute_operation_wait_time(
//!         client, op, "my-project", "creating Instance", Duration::from_secs(20 * 60),
//!     ).await?;
//!     println!("{} finished", done.target_link);
//!     Ok(())
//! }
//! ```
//!
//! [OperationSource]: lro::OperationSource

use gaxi::config::{Config, Service};
use gaxi::http::ReqwestClient;
use lro::{Error, OperationSource, Result, Waiter};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::time::Duration;

pub mod aip151;
pub mod compute;
pub mod container;
pub mod sql;

pub use aip151::{CommonOperation, CommonSource};
pub use compute::{ComputeOperation, ComputeScope, ComputeSource};
pub use container::{ContainerOperation, ContainerSource};
pub use sql::{SqlOperation, SqlSource};

/// Waits for an operation from one of the AIP-151 services.
#[tracing::instrument(level = "debug", skip(client, op))]
pub async fn operation_wait_time(
    client: &ReqwestClient,
    service: Service,
    op: Value,
    activity: &str,
    timeout: Duration,
) -> Result<CommonOperation> {
    let op = decode_handle(op)?;
    let source = CommonSource::new(client.clone(), service);
    waiter(client.config(), source, timeout).wait(op, activity).await
}

/// Waits for an operation from one of the AIP-151 services, and decodes its
/// response.
#[tracing::instrument(level = "debug", skip(client, op))]
pub async fn operation_wait_time_with_response<T>(
    client: &ReqwestClient,
    service: Service,
    op: Value,
    activity: &str,
    timeout: Duration,
) -> Result<T>
where
    T: DeserializeOwned,
{
    let op = decode_handle(op)?;
    let source = CommonSource::new(client.clone(), service);
    waiter(client.config(), source, timeout)
        .wait_with_response(op, activity)
        .await
}

/// Waits for a Compute Engine operation in `project`.
///
/// Zonal and regional operations are fetched from their zone or region.
#[tracing::instrument(level = "debug", skip(client, op))]
pub async fn compute_operation_wait_time(
    client: &ReqwestClient,
    op: Value,
    project: &str,
    activity: &str,
    timeout: Duration,
) -> Result<ComputeOperation> {
    let op = decode_handle::<ComputeOperation>(op)?;
    let scope = ComputeScope::for_operation(&op, None);
    let source = ComputeSource::new(client.clone(), project, scope);
    waiter(client.config(), source, timeout).wait(op, activity).await
}

/// Waits for a Compute Engine operation on an organization resource.
///
/// `parent` is the organization, e.g. `organizations/123`.
#[tracing::instrument(level = "debug", skip(client, op))]
pub async fn compute_org_operation_wait_time(
    client: &ReqwestClient,
    op: Value,
    parent: &str,
    activity: &str,
    timeout: Duration,
) -> Result<ComputeOperation> {
    let op = decode_handle::<ComputeOperation>(op)?;
    let scope = ComputeScope::for_operation(&op, Some(parent));
    let source = ComputeSource::new(client.clone(), "", scope);
    waiter(client.config(), source, timeout).wait(op, activity).await
}

/// Waits for a GKE operation.
#[tracing::instrument(level = "debug", skip(client, op))]
pub async fn container_operation_wait(
    client: &ReqwestClient,
    op: Value,
    project: &str,
    location: &str,
    activity: &str,
    timeout: Duration,
) -> Result<ContainerOperation> {
    let op = decode_handle(op)?;
    let source = ContainerSource::new(client.clone(), project, location);
    waiter(client.config(), source, timeout).wait(op, activity).await
}

/// Waits for a Cloud SQL Admin operation.
#[tracing::instrument(level = "debug", skip(client, op))]
pub async fn sql_admin_operation_wait_time(
    client: &ReqwestClient,
    op: Value,
    project: &str,
    activity: &str,
    timeout: Duration,
) -> Result<SqlOperation> {
    let op = decode_handle(op)?;
    let source = SqlSource::new(client.clone(), project);
    waiter(client.config(), source, timeout).wait(op, activity).await
}

fn waiter<S>(config: &Config, source: S, timeout: Duration) -> Waiter<S>
where
    S: OperationSource,
{
    Waiter::new(source, timeout).with_poll_interval(config.poll_interval())
}

fn decode_handle<O>(op: Value) -> Result<O>
where
    O: DeserializeOwned,
{
    if op.is_null() {
        return Err(Error::malformed_operation("the operation is null"));
    }
    serde_json::from_value(op).map_err(Error::deser)
}
