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

//! Error details produced by the waiter.
//!
//! These types are the `source()` of the [Error][crate::Error] returned by a
//! [Waiter][crate::Waiter]. Applications can downcast to them to recover the
//! details.

use std::time::Duration;

/// The wait did not complete before its deadline.
#[derive(thiserror::Error, Debug)]
#[error("timeout after {timeout:?} waiting for {activity}, last observed state: {last_state}")]
pub struct WaitTimeout {
    activity: String,
    last_state: String,
    timeout: Duration,
}

impl WaitTimeout {
    pub(crate) fn new(activity: &str, last_state: String, timeout: Duration) -> Self {
        Self {
            activity: activity.to_string(),
            last_state,
            timeout,
        }
    }

    /// The activity label given to the waiter.
    pub fn activity(&self) -> &str {
        &self.activity
    }

    /// The state of the operation in the last successful poll.
    pub fn last_state(&self) -> &str {
        &self.last_state
    }

    /// The maximum wait duration.
    pub fn timeout(&self) -> Duration {
        self.timeout
    }
}

/// The caller cancelled the wait.
#[derive(thiserror::Error, Debug)]
#[error("cancelled while waiting for {activity}")]
pub struct WaitCancelled {
    activity: String,
}

impl WaitCancelled {
    pub(crate) fn new(activity: &str) -> Self {
        Self {
            activity: activity.to_string(),
        }
    }

    pub fn activity(&self) -> &str {
        &self.activity
    }
}

/// The operation is not done, and it has no name to poll.
#[derive(thiserror::Error, Debug)]
#[error("the operation for {activity} is not done and has no name")]
pub struct MissingName {
    activity: String,
}

impl MissingName {
    pub(crate) fn new(activity: &str) -> Self {
        Self {
            activity: activity.to_string(),
        }
    }

    pub fn activity(&self) -> &str {
        &self.activity
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Error;

    #[test]
    fn timeout() {
        let got = WaitTimeout::new("creating Disk", "RUNNING".into(), Duration::from_secs(5));
        assert_eq!(got.activity(), "creating Disk");
        assert_eq!(got.last_state(), "RUNNING");
        assert_eq!(got.timeout(), Duration::from_secs(5));
        let fmt = Error::timeout(got).to_string();
        assert!(fmt.contains("deadline exceeded"), "{fmt}");
        assert!(fmt.contains("creating Disk"), "{fmt}");
        assert!(fmt.contains("RUNNING"), "{fmt}");
        assert!(fmt.contains("5s"), "{fmt}");
    }

    #[test]
    fn cancelled() {
        let got = WaitCancelled::new("deleting Disk");
        assert_eq!(got.activity(), "deleting Disk");
        let fmt = Error::cancelled(got).to_string();
        assert!(fmt.contains("cancelled while waiting for deleting Disk"), "{fmt}");
    }

    #[test]
    fn missing_name() {
        let got = MissingName::new("updating Network");
        assert_eq!(got.activity(), "updating Network");
        let fmt = Error::malformed_operation(got).to_string();
        assert!(fmt.contains("malformed operation"), "{fmt}");
        assert!(fmt.contains("updating Network"), "{fmt}");
    }
}
