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

//! Error model and polling policies shared by the operation waiters.
//!
//! This crate contains the types used to report errors from the operation
//! waiters, and the policies used to control the polling loops. Applications
//! only need the types in [polling_error_policy] and [polling_backoff_policy]
//! when they want to customize how a wait reacts to errors, or how long it
//! waits between polls.

/// An alias of [std::result::Result] where the error is always [crate::error::Error].
///
/// This is the result type used by all the waiters and operation sources.
pub type Result<T> = std::result::Result<T, crate::error::Error>;

/// The core error types used by the waiters.
pub mod error;

/// Types to control the polling loops.
pub mod loop_state;

/// Policies that decide if a polling error stops the loop.
pub mod polling_error_policy;

/// Policies that decide how long to wait between polls.
pub mod polling_backoff_policy;

/// Truncated exponential backoff for polling loops.
pub mod exponential_backoff;
