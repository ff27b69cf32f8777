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

use gax::error::OperationError;

/// The state of an operation, as observed in a single snapshot.
#[derive(Clone, Debug, PartialEq)]
pub enum OperationState {
    /// The operation has not reached a terminal state.
    Pending,
    /// The operation completed successfully.
    Succeeded,
    /// The operation completed with one or more errors.
    Failed(OperationError),
}

impl OperationState {
    /// Returns true for [Succeeded][Self::Succeeded] and [Failed][Self::Failed].
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Pending)
    }
}

impl std::fmt::Display for OperationState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Pending => write!(f, "PENDING"),
            Self::Succeeded => write!(f, "SUCCEEDED"),
            Self::Failed(_) => write!(f, "FAILED"),
        }
    }
}

/// Defines the trait for an "Operation" type handled by the waiter.
///
/// Each API family represents its operations with a different wire type. The
/// families implement this trait to tell the waiter how to re-fetch the
/// operation and how to classify each snapshot.
///
/// # Example
/// ```
/// # use tpg_lro::{Operation, OperationState};
/// #[derive(Debug)]
/// struct Snapshot {
///     name: String,
///     done: bool,
/// }
///
/// impl Operation for Snapshot {
///     fn name(&self) -> Option<&str> {
///         Some(self.name.as_str()).filter(|n| !n.is_empty())
///     }
///     fn state(&self) -> OperationState {
///         if self.done { OperationState::Succeeded } else { OperationState::Pending }
///     }
/// }
///
/// let op = Snapshot { name: "operations/123".into(), done: false };
/// assert_eq!(op.state(), OperationState::Pending);
/// ```
pub trait Operation: Send + Sync + std::fmt::Debug {
    /// Returns the name used to re-fetch the operation.
    ///
    /// Implementations should return `None` when the name is missing or empty.
    fn name(&self) -> Option<&str>;

    /// Classifies the snapshot.
    fn state(&self) -> OperationState;

    /// The success payload, if the family includes one in the operation.
    fn response(&self) -> Option<&serde_json::Value> {
        None
    }

    /// A short description of the state as reported by the service.
    ///
    /// Used in log messages and timeout errors. Families with a richer status
    /// field (e.g. `RUNNING` vs. `PENDING`) should override it.
    fn status_text(&self) -> String {
        self.state().to_string()
    }
}
