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

#[cfg(test)]
mod tests {
    use std::error::Error as _;
    use tpg_gax::error::{Error, OperationError, OperationErrorEntry};

    #[derive(Debug, thiserror::Error)]
    #[error("leaf error")]
    struct LeafError;

    #[derive(Debug, thiserror::Error)]
    #[error("middle error")]
    struct MiddleError {
        #[source]
        source: Option<LeafError>,
    }

    fn find_leaf(e: &Error) -> Option<&LeafError> {
        let mut current = e.source();
        while let Some(e) = current {
            if let Some(leaf) = e.downcast_ref::<LeafError>() {
                return Some(leaf);
            }
            current = e.source();
        }
        None
    }

    #[test]
    fn source_chain() {
        let err = Error::other(MiddleError {
            source: Some(LeafError),
        });
        assert!(find_leaf(&err).is_some(), "{err:?}");

        let err = Error::timeout(MiddleError { source: None });
        assert!(find_leaf(&err).is_none(), "{err:?}");
        assert!(err.is_timeout(), "{err:?}");
    }

    #[test]
    fn exhausted_wraps_the_last_error() {
        let err = Error::exhausted(Error::io(LeafError));
        assert!(err.is_exhausted(), "{err:?}");
        assert!(find_leaf(&err).is_some(), "{err:?}");
        let inner = err.source().and_then(|e| e.downcast_ref::<Error>());
        assert!(matches!(inner, Some(e) if e.is_io()), "{err:?}");
    }

    #[test]
    fn operation_errors_keep_order() {
        let error = ["disk quota exceeded", "zone resources exhausted"]
            .map(OperationErrorEntry::new)
            .into_iter()
            .collect::<OperationError>();
        let err = Error::operation("creating Disk", error);
        assert_eq!(
            err.to_string(),
            "error waiting for creating Disk: disk quota exceeded\nzone resources exhausted"
        );
        assert_eq!(err.operation_error().map(|e| e.entries().len()), Some(2));
    }
}
