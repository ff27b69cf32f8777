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

//! Waits for long-running operations started by the Terraform provider.
//!
//! Many Google Cloud APIs start an asynchronous action and return an
//! "Operation" handle. The caller must poll the handle until the operation
//! reaches a terminal state. This crate implements that polling loop once,
//! generic over an [OperationSource] that knows how to re-fetch the
//! operations of one API family.
//!
//! The main entry point is [Waiter]: it adds a deadline, cancellation, and
//! decoding of the final response to the basic [Poller].
//!
//! # Example
//! ```
//! # use tpg_lro::{Operation, OperationState, Result, Waiter, source::from_fn};
//! # use std::time::Duration;
//! #[derive(Debug)]
//! struct Snapshot {
//!     name: String,
//!     done: bool,
//! }
//! impl Operation for Snapshot {
//!     fn name(&self) -> Option<&str> { Some(&self.name) }
//!     fn state(&self) -> OperationState {
//!         if self.done { OperationState::Succeeded } else { OperationState::Pending }
//!     }
//! }
//!
//! async fn sample() -> Result<()> {
//!     let source = from_fn(|name: String| async move { Ok(Snapshot { name, done: true }) });
//!     let waiter = Waiter::new(source, Duration::from_secs(600))
//!         .with_poll_interval(Duration::from_secs(10));
//!     let start = Snapshot { name: "operations/123".into(), done: false };
//!     let done = waiter.wait(start, "creating Instance").await?;
//!     println!("{done:?}");
//!     Ok(())
//! }
//! ```

pub use gax::Result;
pub use gax::error::Error;
pub use gax::polling_backoff_policy::PollingBackoffPolicy;
pub use gax::polling_error_policy::PollingErrorPolicy;

pub mod error;
mod operation;
pub use operation::*;
mod poller;
pub use poller::OperationPoller;
pub mod source;
pub use source::OperationSource;
mod waiter;
pub use waiter::Waiter;

/// The result of polling a long-running operation (LRO).
///
/// # Parameters
/// * `O` - the operation type, as returned by the [OperationSource].
#[derive(Debug)]
pub enum PollingResult<O> {
    /// The operation is still in progress.
    InProgress(Option<O>),
    /// The operation completed. This includes the result.
    Completed(Result<O>),
    /// An error trying to poll the LRO.
    ///
    /// Not all errors indicate that the operation failed. For example, this
    /// may fail because it was not possible to connect to Google Cloud. Such
    /// transient errors may disappear in the next polling attempt.
    ///
    /// The polling error policy decides which errors are returned here, and
    /// which ones complete the loop.
    PollingError(Error),
}

/// The trait implemented by LRO helpers.
///
/// # Parameters
/// * `O` - the operation type, as returned by the [OperationSource].
pub trait Poller<O>: Send + sealed::Poller {
    /// Query the current status of the long-running operation.
    ///
    /// The first call classifies the operation handle without any network
    /// requests. Returns `None` once a [Completed][PollingResult::Completed]
    /// result has been produced.
    fn poll(&mut self) -> impl Future<Output = Option<PollingResult<O>>> + Send;

    /// Poll the long-running operation until it completes.
    ///
    /// There is no deadline. Use a [Waiter] to bound the wait.
    fn until_done(self) -> impl Future<Output = Result<O>> + Send;

    /// Convert a poller to a [Stream][futures::stream::Stream].
    #[cfg(feature = "unstable-stream")]
    fn into_stream(self) -> impl futures::Stream<Item = PollingResult<O>> + Unpin;
}

pub(crate) mod sealed {
    pub trait Poller {}
}
