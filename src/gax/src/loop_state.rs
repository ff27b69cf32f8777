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

//! Polling loop control types.
//!
//! The waiters consult a [PollingErrorPolicy] each time fetching an operation
//! fails. The policy answers with one of these values. Applications only need
//! these types when implementing their own polling error policies.
//!
//! [PollingErrorPolicy]: crate::polling_error_policy::PollingErrorPolicy

use crate::error::Error;

/// The decision of a polling error policy.
#[derive(Debug)]
pub enum LoopState {
    /// The error is permanent, stop polling and return the error.
    Permanent(Error),

    /// The error is transient, but the policy is stopping the loop.
    ///
    /// Policies may stop the loop on transient errors, for example, because
    /// the policy only allows a limited number of attempts.
    Exhausted(Error),

    /// The error is transient, poll again after the backoff period.
    Continue(Error),
}

impl LoopState {
    pub fn is_permanent(&self) -> bool {
        matches!(self, Self::Permanent(_))
    }

    pub fn is_exhausted(&self) -> bool {
        matches!(self, Self::Exhausted(_))
    }

    pub fn is_continue(&self) -> bool {
        matches!(self, Self::Continue(_))
    }

    /// The error that triggered the decision.
    pub fn into_error(self) -> Error {
        match self {
            Self::Permanent(e) | Self::Exhausted(e) | Self::Continue(e) => e,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::rpc::{Code, Status};

    #[test]
    fn predicates() {
        let flow = LoopState::Permanent(not_found());
        assert!(flow.is_permanent(), "{flow:?}");
        assert!(!flow.is_exhausted(), "{flow:?}");
        assert!(!flow.is_continue(), "{flow:?}");

        let flow = LoopState::Exhausted(unavailable());
        assert!(!flow.is_permanent(), "{flow:?}");
        assert!(flow.is_exhausted(), "{flow:?}");
        assert!(!flow.is_continue(), "{flow:?}");

        let flow = LoopState::Continue(unavailable());
        assert!(!flow.is_permanent(), "{flow:?}");
        assert!(!flow.is_exhausted(), "{flow:?}");
        assert!(flow.is_continue(), "{flow:?}");
    }

    #[test]
    fn into_error() {
        for flow in [
            LoopState::Permanent(unavailable()),
            LoopState::Exhausted(unavailable()),
            LoopState::Continue(unavailable()),
        ] {
            let error = flow.into_error();
            assert_eq!(
                error.status().map(|s| s.code),
                Some(Code::Unavailable),
                "{error:?}"
            );
        }
    }

    fn not_found() -> Error {
        Error::service(Status::default().set_code(Code::NotFound))
    }

    fn unavailable() -> Error {
        Error::service(Status::default().set_code(Code::Unavailable))
    }
}
