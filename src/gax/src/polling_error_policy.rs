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

//! Defines the types for polling error policies.
//!
//! # Example
//! ```
//! # use tpg_gax::polling_error_policy::*;
//! use std::time::Duration;
//! // Keep polling through transient errors for at most 15 minutes or at most
//! // 50 attempts: whichever limit is reached first stops the polling loop.
//! let policy = OperationGetRetryable
//!     .with_time_limit(Duration::from_secs(15 * 60))
//!     .with_attempt_limit(50);
//! ```
//!
//! The waiters fetch the operation repeatedly until it completes, and need to
//! (1) distinguish between transient and permanent errors while fetching it,
//! and (2) provide a mechanism to limit how long they tolerate such errors.
//!
//! We provide a trait that applications may implement to customize the behavior
//! of the polling loop, and some common implementations that should meet most
//! needs. The generic waiter uses [FailFast] by default, the waiters for the
//! Google Cloud APIs use [OperationGetRetryable].

use crate::error::Error;
use crate::loop_state::LoopState;
use std::sync::{Arc, LazyLock};
use tokio::time::Instant;

/// Determines how errors are handled in the polling loop.
///
/// Implementations of this trait determine if polling errors may resolve in
/// future attempts, and for how long the polling loop may continue.
pub trait PollingErrorPolicy: Send + Sync + std::fmt::Debug {
    /// Query the polling policy after an error.
    ///
    /// # Parameters
    /// * `loop_start` - when the polling loop started.
    /// * `attempt_count` - the number of attempts. This includes the failed
    ///   attempt, so it is always non-zero.
    /// * `error` - the last error when fetching the operation.
    fn on_error(&self, loop_start: Instant, attempt_count: u32, error: Error) -> LoopState;

    /// Called when the operation is successfully fetched, but it is still in
    /// progress.
    ///
    /// Returning an error stops the polling loop.
    fn on_in_progress(
        &self,
        _loop_start: Instant,
        _attempt_count: u32,
        _operation_name: &str,
    ) -> Option<Error> {
        None
    }
}

/// A helper type to accept any [PollingErrorPolicy] in builders.
#[derive(Clone, Debug)]
pub struct PollingErrorPolicyArg(Arc<dyn PollingErrorPolicy>);

impl<T> std::convert::From<T> for PollingErrorPolicyArg
where
    T: PollingErrorPolicy + 'static,
{
    fn from(value: T) -> Self {
        Self(Arc::new(value))
    }
}

impl std::convert::From<Arc<dyn PollingErrorPolicy>> for PollingErrorPolicyArg {
    fn from(value: Arc<dyn PollingErrorPolicy>) -> Self {
        Self(value)
    }
}

impl std::convert::From<PollingErrorPolicyArg> for Arc<dyn PollingErrorPolicy> {
    fn from(value: PollingErrorPolicyArg) -> Self {
        value.0
    }
}

/// Extension trait for [PollingErrorPolicy]
pub trait PollingErrorPolicyExt: PollingErrorPolicy + Sized {
    /// Decorate a [PollingErrorPolicy] to limit the total elapsed time in the
    /// polling loop.
    ///
    /// While the time spent in the polling loop (including time in backoff) is
    /// less than the prescribed duration the `on_error()` method returns the
    /// results of the inner policy. After that time it returns
    /// [Exhausted][LoopState::Exhausted] if the inner policy returns
    /// [Continue][LoopState::Continue].
    fn with_time_limit(self, maximum_duration: std::time::Duration) -> LimitedElapsedTime<Self> {
        LimitedElapsedTime::custom(self, maximum_duration)
    }

    /// Decorate a [PollingErrorPolicy] to limit the number of poll attempts.
    ///
    /// The policy passes through the results from the inner policy as long as
    /// `attempt_count < maximum_attempts`. Once the maximum number of attempts
    /// is reached, the policy returns [Exhausted][LoopState::Exhausted] if the
    /// inner policy returns [Continue][LoopState::Continue], and passes the
    /// inner policy result otherwise.
    ///
    /// # Example
    /// ```
    /// # use tpg_gax::polling_error_policy::*;
    /// use tokio::time::Instant;
    /// let policy = AlwaysContinue.with_attempt_limit(3);
    /// assert!(policy.on_error(Instant::now(), 1, transient_error()).is_continue());
    /// assert!(policy.on_error(Instant::now(), 2, transient_error()).is_continue());
    /// assert!(policy.on_error(Instant::now(), 3, transient_error()).is_exhausted());
    ///
    /// use tpg_gax::error::Error;
    /// fn transient_error() -> Error { Error::io("connection reset") }
    /// ```
    fn with_attempt_limit(self, maximum_attempts: u32) -> LimitedAttemptCount<Self> {
        LimitedAttemptCount::custom(self, maximum_attempts)
    }
}

impl<T: PollingErrorPolicy> PollingErrorPolicyExt for T {}

/// A polling policy that stops on the first error.
///
/// Any error fetching the operation is returned to the caller.
#[derive(Clone, Debug)]
pub struct FailFast;

impl PollingErrorPolicy for FailFast {
    fn on_error(&self, _loop_start: Instant, _attempt_count: u32, error: Error) -> LoopState {
        LoopState::Permanent(error)
    }
}

/// A polling policy that strictly follows [AIP-194].
///
/// This policy must be decorated to limit the number of polling attempts or the
/// duration of the polling loop.
///
/// The policy interprets AIP-194 **strictly**. It examines the status code to
/// determine if the polling loop may continue.
///
/// [AIP-194]: https://google.aip.dev/194
#[derive(Clone, Debug)]
pub struct Aip194Strict;

impl PollingErrorPolicy for Aip194Strict {
    fn on_error(&self, _loop_start: Instant, _attempt_count: u32, error: Error) -> LoopState {
        if error.is_io() {
            return LoopState::Continue(error);
        }
        if let Some(status) = error.status() {
            return if status.code == crate::error::rpc::Code::Unavailable {
                LoopState::Continue(error)
            } else {
                LoopState::Permanent(error)
            };
        }

        match error.http_status_code() {
            Some(code) if code == http::StatusCode::SERVICE_UNAVAILABLE.as_u16() => {
                LoopState::Continue(error)
            }
            _ => LoopState::Permanent(error),
        }
    }
}

/// The polling policy used by the waiters for the Google Cloud APIs.
///
/// Fetching an operation right after it is created may return `NOT FOUND`
/// until the operation propagates through the service. The policy keeps
/// polling on such errors, on the HTTP status codes that Google Cloud APIs
/// use for transient failures (429, 500, 502 and 503), and on broken
/// connections, including requests that exceeded their own timeout.
///
/// Two more errors are transient in practice. Cloud SQL returns `409` with
/// the `operationInProgress` reason while another operation holds the
/// instance, and Compute returns `403` when a per-minute read quota is
/// exceeded. Any other error is permanent.
///
/// This policy must be decorated to limit the number of polling attempts, or
/// used with a waiter that has a deadline.
///
/// # Example
/// ```
/// # use tpg_gax::polling_error_policy::*;
/// # use tpg_gax::error::Error;
/// use tokio::time::Instant;
/// let policy = OperationGetRetryable;
/// let not_found = Error::http(404, http::HeaderMap::new(), bytes::Bytes::from_static(b"NOT FOUND"));
/// assert!(policy.on_error(Instant::now(), 1, not_found).is_continue());
/// let forbidden = Error::http(403, http::HeaderMap::new(), bytes::Bytes::from_static(b"FORBIDDEN"));
/// assert!(policy.on_error(Instant::now(), 1, forbidden).is_permanent());
/// ```
#[derive(Clone, Debug)]
pub struct OperationGetRetryable;

impl OperationGetRetryable {
    const RETRYABLE_HTTP_CODES: [u16; 5] = [404, 429, 500, 502, 503];

    fn is_retryable(error: &Error) -> bool {
        use crate::error::rpc::Code;
        if error.is_io() {
            return true;
        }
        if let Some(code) = error.http_status_code() {
            return Self::RETRYABLE_HTTP_CODES.contains(&code)
                || Self::is_operation_in_progress(code, error.http_payload())
                || Self::is_quota_exceeded_per_minute(code, error.http_payload());
        }
        matches!(
            error.status().map(|s| s.code),
            Some(Code::NotFound | Code::ResourceExhausted | Code::Internal | Code::Unavailable)
        )
    }

    // Cloud SQL rejects concurrent operations on an instance with this reason.
    fn is_operation_in_progress(code: u16, payload: Option<&bytes::Bytes>) -> bool {
        code == 409
            && payload.is_some_and(|p| String::from_utf8_lossy(p).contains("operationInProgress"))
    }

    // Compute enforces per-minute read quotas with a 403 instead of a 429.
    fn is_quota_exceeded_per_minute(code: u16, payload: Option<&bytes::Bytes>) -> bool {
        static QUOTA_PER_MINUTE: LazyLock<Option<regex::bytes::Regex>> = LazyLock::new(|| {
            regex::bytes::Regex::new(
                r"Quota exceeded for quota metric '.*' and limit '.* per minute' of service",
            )
            .ok()
        });
        code == 403
            && payload
                .zip(QUOTA_PER_MINUTE.as_ref())
                .is_some_and(|(p, re)| re.is_match(p))
    }
}

impl PollingErrorPolicy for OperationGetRetryable {
    fn on_error(&self, _loop_start: Instant, _attempt_count: u32, error: Error) -> LoopState {
        if Self::is_retryable(&error) {
            LoopState::Continue(error)
        } else {
            LoopState::Permanent(error)
        }
    }
}

/// A polling policy that continues on any error.
///
/// This policy must be decorated to limit the number of polling attempts or the
/// duration of the polling loop.
#[derive(Clone, Debug)]
pub struct AlwaysContinue;

impl PollingErrorPolicy for AlwaysContinue {
    fn on_error(&self, _loop_start: Instant, _attempt_count: u32, error: Error) -> LoopState {
        LoopState::Continue(error)
    }
}

/// A polling policy decorator that limits the total time in the polling loop.
///
/// This policy decorates an inner policy and limits the duration of polling
/// loops. While the time spent in the polling loop (including time in backoff)
/// is less than the prescribed duration the `on_error()` method returns the
/// results of the inner policy. After that time it returns
/// [Exhausted][LoopState::Exhausted] if the inner policy returns
/// [Continue][LoopState::Continue].
///
/// # Parameters
/// * `P` - the inner polling policy, defaults to [OperationGetRetryable].
#[derive(Debug)]
pub struct LimitedElapsedTime<P = OperationGetRetryable>
where
    P: PollingErrorPolicy,
{
    inner: P,
    maximum_duration: std::time::Duration,
}

impl LimitedElapsedTime {
    /// Creates a new instance, with the default inner policy.
    pub fn new(maximum_duration: std::time::Duration) -> Self {
        Self {
            inner: OperationGetRetryable,
            maximum_duration,
        }
    }
}

impl<P> LimitedElapsedTime<P>
where
    P: PollingErrorPolicy,
{
    /// Creates a new instance with a custom inner policy.
    pub fn custom(inner: P, maximum_duration: std::time::Duration) -> Self {
        Self {
            inner,
            maximum_duration,
        }
    }

    fn in_progress_impl(&self, start: Instant, operation_name: &str) -> Option<Error> {
        let elapsed = Instant::now().saturating_duration_since(start);
        if elapsed < self.maximum_duration {
            return None;
        }
        Some(Error::exhausted(Exhausted::new(
            operation_name,
            "elapsed time",
            format!("{elapsed:?}"),
            format!("{:?}", self.maximum_duration),
        )))
    }
}

impl<P> PollingErrorPolicy for LimitedElapsedTime<P>
where
    P: PollingErrorPolicy + 'static,
{
    fn on_error(&self, start: Instant, count: u32, error: Error) -> LoopState {
        match self.inner.on_error(start, count, error) {
            LoopState::Continue(e) if Instant::now() >= start + self.maximum_duration => {
                LoopState::Exhausted(e)
            }
            flow => flow,
        }
    }

    fn on_in_progress(&self, start: Instant, count: u32, operation_name: &str) -> Option<Error> {
        self.inner
            .on_in_progress(start, count, operation_name)
            .or_else(|| self.in_progress_impl(start, operation_name))
    }
}

/// A polling policy decorator that limits the number of attempts.
///
/// This policy decorates an inner policy and limits polling total number of
/// attempts.
///
/// The policy passes through the results from the inner policy as long as
/// `attempt_count < maximum_attempts`. However, once the maximum number of
/// attempts is reached, the policy replaces any [Continue][LoopState::Continue]
/// result with [Exhausted][LoopState::Exhausted].
///
/// # Parameters
/// * `P` - the inner polling policy, defaults to [OperationGetRetryable].
#[derive(Debug)]
pub struct LimitedAttemptCount<P = OperationGetRetryable>
where
    P: PollingErrorPolicy,
{
    inner: P,
    maximum_attempts: u32,
}

impl LimitedAttemptCount {
    /// Creates a new instance, with the default inner policy.
    pub fn new(maximum_attempts: u32) -> Self {
        Self {
            inner: OperationGetRetryable,
            maximum_attempts,
        }
    }
}

impl<P> LimitedAttemptCount<P>
where
    P: PollingErrorPolicy,
{
    /// Creates a new instance with a custom inner policy.
    pub fn custom(inner: P, maximum_attempts: u32) -> Self {
        Self {
            inner,
            maximum_attempts,
        }
    }

    fn in_progress_impl(&self, count: u32, operation_name: &str) -> Option<Error> {
        if count < self.maximum_attempts {
            return None;
        }
        Some(Error::exhausted(Exhausted::new(
            operation_name,
            "attempt count",
            count.to_string(),
            self.maximum_attempts.to_string(),
        )))
    }
}

impl<P> PollingErrorPolicy for LimitedAttemptCount<P>
where
    P: PollingErrorPolicy,
{
    fn on_error(&self, start: Instant, count: u32, error: Error) -> LoopState {
        match self.inner.on_error(start, count, error) {
            LoopState::Continue(e) if count >= self.maximum_attempts => LoopState::Exhausted(e),
            flow => flow,
        }
    }

    fn on_in_progress(&self, start: Instant, count: u32, operation_name: &str) -> Option<Error> {
        self.inner
            .on_in_progress(start, count, operation_name)
            .or_else(|| self.in_progress_impl(count, operation_name))
    }
}

/// Indicates that a polling loop has been exhausted.
#[derive(Debug)]
pub struct Exhausted {
    operation_name: String,
    limit_name: &'static str,
    value: String,
    limit: String,
}

impl Exhausted {
    pub fn new(
        operation_name: &str,
        limit_name: &'static str,
        value: String,
        limit: String,
    ) -> Self {
        Self {
            operation_name: operation_name.to_string(),
            limit_name,
            value,
            limit,
        }
    }
}

impl std::fmt::Display for Exhausted {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "polling loop for {} exhausted, {} value ({}) exceeds limit ({})",
            self.operation_name, self.limit_name, self.value, self.limit
        )
    }
}

impl std::error::Error for Exhausted {}
