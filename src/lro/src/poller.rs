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

//! Implements the polling loop over any [OperationSource].
//!
//! The poller never sleeps inside [poll()][crate::Poller::poll]. The first
//! call classifies the operation handle returned by the starting request.
//! Each subsequent call re-fetches the operation once.

use crate::{
    Error, Operation, OperationSource, OperationState, Poller, PollingBackoffPolicy,
    PollingErrorPolicy, PollingResult, Result, error::MissingName,
};
use gax::loop_state::LoopState;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;

/// A [Poller] for the operations of a single [OperationSource].
///
/// Created by [Waiter::poller][crate::Waiter::poller].
pub struct OperationPoller<S>
where
    S: OperationSource,
{
    source: Arc<S>,
    activity: String,
    error_policy: Arc<dyn PollingErrorPolicy>,
    backoff_policy: Arc<dyn PollingBackoffPolicy>,
    start: Option<S::Operation>,
    operation: Option<String>,
    loop_start: Instant,
    attempt_count: u32,
    last_state: String,
}

impl<S> OperationPoller<S>
where
    S: OperationSource,
{
    pub(crate) fn new(
        source: Arc<S>,
        activity: &str,
        error_policy: Arc<dyn PollingErrorPolicy>,
        backoff_policy: Arc<dyn PollingBackoffPolicy>,
        start: S::Operation,
    ) -> Self {
        Self {
            source,
            activity: activity.to_string(),
            error_policy,
            backoff_policy,
            last_state: start.status_text(),
            start: Some(start),
            operation: None,
            loop_start: Instant::now(),
            attempt_count: 0,
        }
    }

    /// The number of times the operation was fetched.
    pub fn attempt_count(&self) -> u32 {
        self.attempt_count
    }

    /// The state reported by the most recent successful fetch.
    pub fn last_state(&self) -> &str {
        &self.last_state
    }

    /// The activity label.
    pub fn activity(&self) -> &str {
        &self.activity
    }

    /// How long to wait before the next fetch.
    pub fn next_wait(&self) -> Duration {
        if self.attempt_count == 0 {
            return Duration::ZERO;
        }
        self.backoff_policy
            .wait_period(self.loop_start, self.attempt_count)
    }
}

impl<S> std::fmt::Debug for OperationPoller<S>
where
    S: OperationSource,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OperationPoller")
            .field("activity", &self.activity)
            .field("error_policy", &self.error_policy)
            .field("backoff_policy", &self.backoff_policy)
            .field("operation", &self.operation)
            .field("attempt_count", &self.attempt_count)
            .field("last_state", &self.last_state)
            .finish()
    }
}

impl<S> crate::sealed::Poller for OperationPoller<S> where S: OperationSource {}

impl<S> Poller<S::Operation> for OperationPoller<S>
where
    S: OperationSource,
{
    async fn poll(&mut self) -> Option<PollingResult<S::Operation>> {
        if let Some(start) = self.start.take() {
            let synchronous = self.source.completes_synchronously_without_name();
            let (op, poll) = self::handle_start(synchronous, &self.activity, start);
            self.operation = op;
            return Some(poll);
        }
        if let Some(name) = self.operation.take() {
            self.attempt_count += 1;
            let result = self.source.fetch(&name).await;
            match &result {
                Ok(o) => {
                    self.last_state = o.status_text();
                    tracing::debug!(
                        operation = %name,
                        attempt = self.attempt_count,
                        state = %self.last_state,
                        "polled operation"
                    );
                }
                Err(e) => tracing::debug!(
                    operation = %name,
                    attempt = self.attempt_count,
                    "error polling operation: {e}"
                ),
            }
            let (op, poll) = self::handle_poll(
                self.error_policy.as_ref(),
                self.loop_start,
                self.attempt_count,
                &self.activity,
                name,
                result,
            );
            self.operation = op;
            return Some(poll);
        }
        None
    }

    async fn until_done(mut self) -> Result<S::Operation> {
        while let Some(p) = self.poll().await {
            match p {
                // Return, the operation completed or the polling policy is
                // exhausted.
                PollingResult::Completed(r) => return r,
                // Continue, the operation was successfully polled and the
                // polling policy was queried.
                PollingResult::InProgress(_) => (),
                // Continue, the polling policy was queried and decided the
                // error is recoverable.
                PollingResult::PollingError(_) => (),
            }
            // The handle is classified without a request, fetch it right away.
            if self.attempt_count > 0 {
                tokio::time::sleep(self.next_wait()).await;
            }
        }
        // We can only get here if `poll()` returns `None`, but it only returns
        // `None` after it returned `Polling::Completed` and therefore this is
        // never reached.
        unreachable!("loop should exit via the `Completed` branch vs. this line");
    }

    #[cfg(feature = "unstable-stream")]
    fn into_stream(self) -> impl futures::Stream<Item = PollingResult<S::Operation>> + Unpin {
        use futures::stream::unfold;
        Box::pin(unfold(Some(self), move |state| async move {
            if let Some(mut poller) = state {
                if let Some(pr) = poller.poll().await {
                    return Some((pr, Some(poller)));
                }
            };
            None
        }))
    }
}

fn handle_start<O>(
    synchronous: bool,
    activity: &str,
    op: O,
) -> (Option<String>, PollingResult<O>)
where
    O: Operation,
{
    match op.state() {
        OperationState::Pending => {}
        state => return (None, handle_polling_done(activity, state, op)),
    };
    match op.name().filter(|n| !n.is_empty()).map(str::to_string) {
        Some(name) => (Some(name), PollingResult::InProgress(Some(op))),
        None if synchronous => (None, PollingResult::Completed(Ok(op))),
        None => {
            let e = Error::malformed_operation(MissingName::new(activity));
            (None, PollingResult::Completed(Err(e)))
        }
    }
}

fn handle_poll<O>(
    error_policy: &dyn PollingErrorPolicy,
    loop_start: Instant,
    attempt_count: u32,
    activity: &str,
    operation_name: String,
    result: Result<O>,
) -> (Option<String>, PollingResult<O>)
where
    O: Operation,
{
    match result {
        Err(e) => {
            let state = error_policy.on_error(loop_start, attempt_count, e);
            self::handle_polling_error(state, operation_name)
        }
        Ok(o) => match o.state() {
            OperationState::Pending => self::handle_polling_success(
                error_policy,
                loop_start,
                attempt_count,
                operation_name,
                o,
            ),
            state => (None, handle_polling_done(activity, state, o)),
        },
    }
}

fn handle_polling_error<O>(
    state: LoopState,
    operation_name: String,
) -> (Option<String>, PollingResult<O>)
where
    O: Operation,
{
    match state {
        LoopState::Continue(e) => {
            tracing::debug!(operation = %operation_name, "polling error is retryable: {e}");
            (Some(operation_name), PollingResult::PollingError(e))
        }
        LoopState::Exhausted(e) => (None, PollingResult::Completed(Err(Error::exhausted(e)))),
        LoopState::Permanent(e) => (None, PollingResult::Completed(Err(e))),
    }
}

fn handle_polling_done<O>(activity: &str, state: OperationState, o: O) -> PollingResult<O>
where
    O: Operation,
{
    match state {
        OperationState::Failed(e) => PollingResult::Completed(Err(Error::operation(activity, e))),
        OperationState::Succeeded | OperationState::Pending => PollingResult::Completed(Ok(o)),
    }
}

fn handle_polling_success<O>(
    error_policy: &dyn PollingErrorPolicy,
    loop_start: Instant,
    attempt_count: u32,
    operation_name: String,
    o: O,
) -> (Option<String>, PollingResult<O>)
where
    O: Operation,
{
    if let Some(e) = error_policy.on_in_progress(loop_start, attempt_count, &operation_name) {
        return (None, PollingResult::Completed(Err(e)));
    }
    let name = o
        .name()
        .filter(|n| !n.is_empty())
        .map(str::to_string)
        .unwrap_or(operation_name);
    (Some(name), PollingResult::InProgress(Some(o)))
}
