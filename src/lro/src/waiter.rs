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

use crate::error::{WaitCancelled, WaitTimeout};
use crate::{
    Error, Operation, OperationPoller, OperationSource, Poller, PollingBackoffPolicy,
    PollingErrorPolicy, PollingResult, Result,
};
use gax::polling_backoff_policy::{FixedInterval, PollingBackoffPolicyArg};
use gax::polling_error_policy::{FailFast, PollingErrorPolicyArg};
use serde::de::DeserializeOwned;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::Instrument;

/// Waits for operations to reach a terminal state.
///
/// A waiter polls the operation until it completes, the deadline expires, or
/// the wait is cancelled. Polls are sequential. No poll starts after the
/// deadline, and a poll still in flight at the deadline is abandoned.
///
/// # Example
/// ```
/// # use tpg_lro::{OperationSource, Result, Waiter};
/// # use std::time::Duration;
/// use tokio_util::sync::CancellationToken;
/// async fn sample<S: OperationSource>(source: S, op: S::Operation) -> Result<S::Operation> {
///     let token = CancellationToken::new();
///     let waiter = Waiter::new(source, Duration::from_secs(20 * 60))
///         .with_poll_interval(Duration::from_secs(5))
///         .with_cancellation_token(token.clone());
///     waiter.wait(op, "creating Instance").await
/// }
/// ```
pub struct Waiter<S>
where
    S: OperationSource,
{
    source: Arc<S>,
    timeout: Duration,
    backoff_policy: Arc<dyn PollingBackoffPolicy>,
    error_policy: Option<Arc<dyn PollingErrorPolicy>>,
    cancellation: Option<CancellationToken>,
}

impl<S> Waiter<S>
where
    S: OperationSource,
{
    /// Creates a waiter that gives up after `timeout`.
    pub fn new(source: S, timeout: Duration) -> Self {
        Self {
            source: Arc::new(source),
            timeout,
            backoff_policy: Arc::new(FixedInterval::default()),
            error_policy: None,
            cancellation: None,
        }
    }

    /// Waits the same `period` between all polls.
    pub fn with_poll_interval(self, period: Duration) -> Self {
        self.with_polling_backoff_policy(FixedInterval::new(period))
    }

    /// Sets the backoff policy between polls.
    pub fn with_polling_backoff_policy<V: Into<PollingBackoffPolicyArg>>(mut self, v: V) -> Self {
        self.backoff_policy = v.into().into();
        self
    }

    /// Sets the policy to handle errors fetching the operation.
    ///
    /// By default the waiter uses the policy recommended by the
    /// [OperationSource], or [FailFast] if the source has no recommendation.
    pub fn with_polling_error_policy<V: Into<PollingErrorPolicyArg>>(mut self, v: V) -> Self {
        self.error_policy = Some(v.into().into());
        self
    }

    /// Stops the wait when `token` is cancelled.
    pub fn with_cancellation_token(mut self, token: CancellationToken) -> Self {
        self.cancellation = Some(token);
        self
    }

    /// The maximum wait duration.
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Creates a [Poller] for `op`, without any deadline.
    pub fn poller(&self, op: S::Operation, activity: &str) -> OperationPoller<S> {
        let error_policy = self
            .error_policy
            .clone()
            .or_else(|| self.source.polling_error_policy())
            .unwrap_or_else(|| Arc::new(FailFast));
        OperationPoller::new(
            self.source.clone(),
            activity,
            error_policy,
            self.backoff_policy.clone(),
            op,
        )
    }

    /// Waits until `op` completes and returns its final snapshot.
    ///
    /// `activity` describes the action in errors and logs, for example
    /// `"creating Instance"`.
    pub async fn wait(&self, op: S::Operation, activity: &str) -> Result<S::Operation> {
        let span = tracing::info_span!(
            "operation_wait",
            activity,
            operation = op.name().unwrap_or_default()
        );
        self.wait_impl(op, activity).instrument(span).await
    }

    /// Waits until `op` completes and decodes its response payload.
    ///
    /// Operations that completed without a payload decode from JSON `null`.
    /// Use `Option<T>` or `()` when the payload may be missing.
    pub async fn wait_with_response<T>(&self, op: S::Operation, activity: &str) -> Result<T>
    where
        T: DeserializeOwned,
    {
        let done = self.wait(op, activity).await?;
        decode_response(&done)
    }

    async fn wait_impl(&self, op: S::Operation, activity: &str) -> Result<S::Operation> {
        let deadline = Instant::now() + self.timeout;
        let mut poller = self.poller(op, activity);
        // The first step classifies the handle without any requests.
        if let Some(PollingResult::Completed(r)) = poller.poll().await {
            return r;
        }
        loop {
            if Instant::now() >= deadline {
                return Err(self.timeout_error(&poller));
            }
            let step = tokio::select! {
                biased;
                _ = cancelled(self.cancellation.as_ref()) => return Err(cancel_error(activity)),
                r = tokio::time::timeout_at(deadline, poller.poll()) => r,
            };
            match step {
                Err(_) => return Err(self.timeout_error(&poller)),
                Ok(Some(PollingResult::Completed(r))) => return r,
                Ok(Some(PollingResult::InProgress(_) | PollingResult::PollingError(_))) => {}
                Ok(None) => unreachable!("the poller stops after `Completed`"),
            }
            let wait = poller
                .next_wait()
                .min(deadline.saturating_duration_since(Instant::now()));
            tokio::select! {
                biased;
                _ = cancelled(self.cancellation.as_ref()) => return Err(cancel_error(activity)),
                _ = tokio::time::sleep(wait) => {},
            }
        }
    }

    fn timeout_error(&self, poller: &OperationPoller<S>) -> Error {
        tracing::warn!(
            attempts = poller.attempt_count(),
            state = poller.last_state(),
            "timeout after {:?} waiting for {}",
            self.timeout,
            poller.activity()
        );
        Error::timeout(WaitTimeout::new(
            poller.activity(),
            poller.last_state().to_string(),
            self.timeout,
        ))
    }
}

impl<S> std::fmt::Debug for Waiter<S>
where
    S: OperationSource,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Waiter")
            .field("timeout", &self.timeout)
            .field("backoff_policy", &self.backoff_policy)
            .field("error_policy", &self.error_policy)
            .field("cancellation", &self.cancellation)
            .finish()
    }
}

async fn cancelled(token: Option<&CancellationToken>) {
    match token {
        Some(t) => t.cancelled().await,
        None => std::future::pending().await,
    }
}

fn cancel_error(activity: &str) -> Error {
    tracing::warn!("cancelled while waiting for {activity}");
    Error::cancelled(WaitCancelled::new(activity))
}

fn decode_response<O, T>(op: &O) -> Result<T>
where
    O: Operation,
    T: DeserializeOwned,
{
    static NULL: serde_json::Value = serde_json::Value::Null;
    let value = op.response().unwrap_or(&NULL);
    T::deserialize(value).map_err(Error::deser)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::OperationState;
    use crate::source::from_fn;
    use gax::polling_error_policy::AlwaysContinue;
    use serde_json::{Value, json};

    #[derive(Debug)]
    struct Done(Option<Value>);

    impl Operation for Done {
        fn name(&self) -> Option<&str> {
            Some("operations/done")
        }
        fn state(&self) -> OperationState {
            OperationState::Succeeded
        }
        fn response(&self) -> Option<&Value> {
            self.0.as_ref()
        }
    }

    #[derive(Debug, serde::Deserialize, PartialEq)]
    struct Instance {
        name: String,
    }

    #[test]
    fn decode() -> anyhow::Result<()> {
        let got = decode_response::<_, Instance>(&Done(Some(json!({"name": "i-1"}))))?;
        assert_eq!(got, Instance { name: "i-1".into() });

        let got = decode_response::<_, Option<Instance>>(&Done(None))?;
        assert!(got.is_none(), "{got:?}");

        let got = decode_response::<_, Instance>(&Done(None));
        assert!(matches!(&got, Err(e) if e.is_deserialization()), "{got:?}");

        let got = decode_response::<_, Instance>(&Done(Some(json!({"name": 42}))));
        assert!(matches!(&got, Err(e) if e.is_deserialization()), "{got:?}");
        Ok(())
    }

    #[test]
    fn defaults() {
        let source = from_fn(|_name: String| async move { Ok(Done(None)) });
        let waiter = Waiter::new(source, Duration::from_secs(60));
        assert_eq!(waiter.timeout(), Duration::from_secs(60));
        let fmt = format!("{waiter:?}");
        assert!(fmt.contains(&format!("{:?}", gax::polling_backoff_policy::DEFAULT_POLL_INTERVAL)), "{fmt}");
        assert!(fmt.contains("error_policy: None"), "{fmt}");

        let poller = waiter.poller(Done(None), "creating Instance");
        let fmt = format!("{poller:?}");
        assert!(fmt.contains("FailFast"), "{fmt}");
    }

    #[test]
    fn builder() {
        let source = from_fn(|_name: String| async move { Ok(Done(None)) });
        let waiter = Waiter::new(source, Duration::from_secs(60))
            .with_poll_interval(Duration::from_millis(1234))
            .with_polling_error_policy(AlwaysContinue)
            .with_cancellation_token(CancellationToken::new());
        let fmt = format!("{waiter:?}");
        assert!(fmt.contains("1.234s"), "{fmt}");
        assert!(fmt.contains("AlwaysContinue"), "{fmt}");
        assert!(fmt.contains("CancellationToken"), "{fmt}");
    }
}
