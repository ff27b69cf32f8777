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

/// The error details of an operation that completed with an error.
///
/// Each API family reports failures in its own format. Compute and Cloud SQL
/// return a list of errors, the AIP-151 APIs return a single `Status`, and
/// Kubernetes Engine returns a status message. The operation sources convert
/// all of them to this type, preserving the order reported by the service.
///
/// # Example
/// ```
/// # use tpg_gax::error::{OperationError, OperationErrorEntry};
/// let error = OperationError::from_iter([
///     OperationErrorEntry::new("disk quota exceeded"),
///     OperationErrorEntry::new("zone is busy").set_code("ZONE_BUSY"),
/// ]);
/// assert_eq!(
///     error.to_string(),
///     "disk quota exceeded\nError code ZONE_BUSY, message: zone is busy"
/// );
/// ```
#[derive(Clone, Debug, Default, PartialEq)]
pub struct OperationError {
    entries: Vec<OperationErrorEntry>,
}

impl OperationError {
    /// Creates an empty error.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends an entry.
    pub fn push(&mut self, entry: OperationErrorEntry) {
        self.entries.push(entry);
    }

    /// The entries, in the order reported by the service.
    pub fn entries(&self) -> &[OperationErrorEntry] {
        &self.entries
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl From<OperationErrorEntry> for OperationError {
    fn from(value: OperationErrorEntry) -> Self {
        Self {
            entries: vec![value],
        }
    }
}

impl FromIterator<OperationErrorEntry> for OperationError {
    fn from_iter<T: IntoIterator<Item = OperationErrorEntry>>(iter: T) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}

impl std::fmt::Display for OperationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut sep = "";
        for entry in &self.entries {
            write!(f, "{sep}{entry}")?;
            sep = "\n";
        }
        Ok(())
    }
}

/// One error reported by a failed operation.
#[derive(Clone, Debug, Default, PartialEq)]
#[non_exhaustive]
pub struct OperationErrorEntry {
    /// The error code, in whatever format the service uses.
    ///
    /// Compute uses strings such as `QUOTA_EXCEEDED`, the AIP-151 APIs use
    /// the numeric `google.rpc.Code` value.
    pub code: Option<String>,

    /// The developer-facing error message.
    pub message: String,

    /// Additional lines describing the error, such as localized messages,
    /// help links, or quota information.
    pub details: Vec<String>,
}

impl OperationErrorEntry {
    /// Creates an entry with the given message.
    pub fn new<T: Into<String>>(message: T) -> Self {
        Self {
            message: message.into(),
            ..Default::default()
        }
    }

    /// Sets the value for [code][OperationErrorEntry::code].
    pub fn set_code<T: Into<String>>(mut self, v: T) -> Self {
        self.code = Some(v.into());
        self
    }

    /// Sets the value for [details][OperationErrorEntry::details].
    pub fn set_details<T, I>(mut self, v: T) -> Self
    where
        T: IntoIterator<Item = I>,
        I: Into<String>,
    {
        self.details = v.into_iter().map(|v| v.into()).collect();
        self
    }
}

impl std::fmt::Display for OperationErrorEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.code {
            Some(code) => write!(f, "Error code {code}, message: {}", self.message)?,
            None => f.write_str(&self.message)?,
        }
        for line in &self.details {
            write!(f, "\n{line}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case(OperationErrorEntry::new("disk quota exceeded"), "disk quota exceeded")]
    #[test_case(OperationErrorEntry::new("not found").set_code("5"), "Error code 5, message: not found")]
    #[test_case(
        OperationErrorEntry::new("quota").set_code("QUOTA_EXCEEDED").set_details(["metric: CPUS", "limit: 24"]),
        "Error code QUOTA_EXCEEDED, message: quota\nmetric: CPUS\nlimit: 24"
    )]
    fn entry_display(input: OperationErrorEntry, want: &str) {
        assert_eq!(input.to_string(), want);
    }

    #[test]
    fn display_joins_in_order() {
        let error = OperationError::from_iter(["first", "second", "third"].map(OperationErrorEntry::new));
        assert_eq!(error.to_string(), "first\nsecond\nthird");
        assert_eq!(error.entries().len(), 3);
    }

    #[test]
    fn push() {
        let mut error = OperationError::new();
        assert!(error.is_empty(), "{error:?}");
        assert_eq!(error.to_string(), "");
        error.push(OperationErrorEntry::new("boom"));
        assert!(!error.is_empty(), "{error:?}");
        assert_eq!(error, OperationError::from(OperationErrorEntry::new("boom")));
    }
}
