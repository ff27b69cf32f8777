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

//! Defines the trait for polling backoff policies and common implementations.
//!
//! The waiters poll long-running operations until completion. When doing so
//! they backoff between polls to avoid overloading the service.
//!
//! Polling backoff policies do not use jitter: the goal is to notice the
//! operation completion promptly, not to spread load after a failure.
//!
//! The provider polls all operations at a fixed interval, see [FixedInterval].
//! Applications that wait on operations of unknown duration may prefer
//! truncated [exponential backoff].
//!
//! # Example
//! ```
//! # use tpg_gax::polling_backoff_policy::*;
//! use std::time::Duration;
//! use tokio::time::Instant;
//!
//! let policy = FixedInterval::new(Duration::from_secs(10));
//! assert_eq!(policy.wait_period(Instant::now(), 1), Duration::from_secs(10));
//! assert_eq!(policy.wait_period(Instant::now(), 7), Duration::from_secs(10));
//! ```
//!
//! [exponential backoff]: crate::exponential_backoff

use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;

/// The interval between polls used by the provider, and by the waiters when
/// the application does not configure one.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(10);

/// Defines the trait implemented by all backoff strategies.
pub trait PollingBackoffPolicy: Send + Sync + std::fmt::Debug {
    /// Returns the time to wait before the next poll.
    ///
    /// # Parameters
    /// * `loop_start` - when the polling loop started.
    /// * `attempt_count` - the number of poll queries. This method is always
    ///   called after the first attempt.
    fn wait_period(&self, loop_start: Instant, attempt_count: u32) -> Duration;
}

/// A helper type to accept any [PollingBackoffPolicy] in builders.
#[derive(Clone, Debug)]
pub struct PollingBackoffPolicyArg(Arc<dyn PollingBackoffPolicy>);

impl<T: PollingBackoffPolicy + 'static> std::convert::From<T> for PollingBackoffPolicyArg {
    fn from(value: T) -> Self {
        Self(Arc::new(value))
    }
}

impl std::convert::From<Arc<dyn PollingBackoffPolicy>> for PollingBackoffPolicyArg {
    fn from(value: Arc<dyn PollingBackoffPolicy>) -> Self {
        Self(value)
    }
}

impl std::convert::From<PollingBackoffPolicyArg> for Arc<dyn PollingBackoffPolicy> {
    fn from(value: PollingBackoffPolicyArg) -> Self {
        value.0
    }
}

/// Waits the same period between all polls.
#[derive(Clone, Debug)]
pub struct FixedInterval {
    period: Duration,
}

impl FixedInterval {
    pub fn new(period: Duration) -> Self {
        Self { period }
    }

    pub fn period(&self) -> Duration {
        self.period
    }
}

impl Default for FixedInterval {
    fn default() -> Self {
        Self::new(DEFAULT_POLL_INTERVAL)
    }
}

impl PollingBackoffPolicy for FixedInterval {
    fn wait_period(&self, _loop_start: Instant, _attempt_count: u32) -> Duration {
        self.period
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::exponential_backoff::ExponentialBackoffBuilder;

    #[test]
    fn fixed_interval_default() {
        let policy = FixedInterval::default();
        assert_eq!(policy.period(), DEFAULT_POLL_INTERVAL);
        assert_eq!(policy.wait_period(Instant::now(), 3), Duration::from_secs(10));
    }

    #[test]
    fn backoff_policy_arg() {
        let policy = ExponentialBackoffBuilder::default().clamp();
        let _ = PollingBackoffPolicyArg::from(policy);

        let policy: Arc<dyn PollingBackoffPolicy> = Arc::new(FixedInterval::new(Duration::from_secs(1)));
        let arg = PollingBackoffPolicyArg::from(policy);
        let policy: Arc<dyn PollingBackoffPolicy> = arg.into();
        assert_eq!(policy.wait_period(Instant::now(), 1), Duration::from_secs(1));
    }

    #[test]
    fn fixed_interval() {
        let policy = FixedInterval::new(Duration::from_millis(250));
        assert_eq!(policy.period(), Duration::from_millis(250));
        let start = Instant::now();
        for attempt in 1..10 {
            assert_eq!(policy.wait_period(start, attempt), Duration::from_millis(250));
        }
    }
}
