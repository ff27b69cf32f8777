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

//! Strategies to re-fetch operations.

use crate::{Operation, Result};
use gax::polling_error_policy::PollingErrorPolicy;
use std::future::Future;
use std::marker::PhantomData;
use std::sync::Arc;

/// Re-fetches the operations of one API family.
///
/// The waiter is generic over this trait. Each family provides one
/// implementation, which knows how to build the request for an operation
/// given its name, and returns the family's [Operation] type.
pub trait OperationSource: Send + Sync {
    /// The snapshot type returned by [fetch][Self::fetch].
    type Operation: Operation;

    /// Fetches the current snapshot of the operation called `name`.
    fn fetch(&self, name: &str) -> impl Future<Output = Result<Self::Operation>> + Send;

    /// If true, an operation without a name is treated as a call that already
    /// completed synchronously.
    ///
    /// Some regional APIs return an empty operation when the request completes
    /// immediately. The waiter returns the operation as-is, without polling.
    fn completes_synchronously_without_name(&self) -> bool {
        false
    }

    /// The polling error policy to use when the caller does not set one.
    ///
    /// `None` selects [FailFast][gax::polling_error_policy::FailFast].
    fn polling_error_policy(&self) -> Option<Arc<dyn PollingErrorPolicy>> {
        None
    }
}

/// Creates an [OperationSource] from a closure.
///
/// # Example
/// ```
/// # use tpg_lro::{Operation, OperationState, source::from_fn};
/// # #[derive(Debug)]
/// # struct Snapshot(String);
/// # impl Operation for Snapshot {
/// #     fn name(&self) -> Option<&str> { Some(&self.0) }
/// #     fn state(&self) -> OperationState { OperationState::Succeeded }
/// # }
/// let source = from_fn(|name: String| async move {
///     // Issue the request here.
///     Ok(Snapshot(name))
/// });
/// ```
pub fn from_fn<F, Fut, O>(f: F) -> FnSource<F, O>
where
    F: Fn(String) -> Fut + Send + Sync,
    Fut: Future<Output = Result<O>> + Send,
    O: Operation,
{
    FnSource {
        f,
        synchronous: false,
        _operation: PhantomData,
    }
}

/// An [OperationSource] wrapping a closure. See [from_fn].
pub struct FnSource<F, O> {
    f: F,
    synchronous: bool,
    _operation: PhantomData<fn() -> O>,
}

impl<F, O> FnSource<F, O> {
    /// Treat unnamed operations as completed synchronously.
    pub fn with_synchronous_completion(mut self, v: bool) -> Self {
        self.synchronous = v;
        self
    }
}

impl<F, O> std::fmt::Debug for FnSource<F, O> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FnSource")
            .field("synchronous", &self.synchronous)
            .finish()
    }
}

impl<F, Fut, O> OperationSource for FnSource<F, O>
where
    F: Fn(String) -> Fut + Send + Sync,
    Fut: Future<Output = Result<O>> + Send,
    O: Operation,
{
    type Operation = O;

    fn fetch(&self, name: &str) -> impl Future<Output = Result<O>> + Send {
        (self.f)(name.to_string())
    }

    fn completes_synchronously_without_name(&self) -> bool {
        self.synchronous
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::OperationState;

    #[derive(Debug)]
    struct Snapshot(String);

    impl Operation for Snapshot {
        fn name(&self) -> Option<&str> {
            Some(&self.0)
        }
        fn state(&self) -> OperationState {
            OperationState::Pending
        }
    }

    #[tokio::test]
    async fn fn_source() -> Result<()> {
        let source = from_fn(|name: String| async move { Ok(Snapshot(name)) });
        assert!(!source.completes_synchronously_without_name());
        assert!(source.polling_error_policy().is_none());
        let got = source.fetch("operations/123").await?;
        assert_eq!(got.name(), Some("operations/123"));

        let source = source.with_synchronous_completion(true);
        assert!(source.completes_synchronously_without_name());
        let fmt = format!("{source:?}");
        assert!(fmt.contains("synchronous: true"), "{fmt}");
        Ok(())
    }
}
