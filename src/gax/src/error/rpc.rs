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

use crate::error::Error;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// The [Status] type defines a logical error model that is suitable for
/// different programming environments, including REST APIs and RPC APIs. Each
/// [Status] message contains three pieces of data: error code, error message,
/// and error details.
///
/// The AIP-151 operations use the same type to report operation failures.
///
/// You can find out more about this error model and how to work with it in the
/// [API Design Guide](https://cloud.google.com/apis/design/errors).
#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize)]
#[serde(default, rename_all = "camelCase")]
#[non_exhaustive]
pub struct Status {
    /// The status code.
    pub code: Code,

    /// A developer-facing error message, which should be in English. Any
    /// user-facing error message should be localized and sent in the
    /// [Status] `details` field.
    pub message: String,

    /// A list of messages that carry the error details. There is a common set
    /// of message types for APIs to use.
    pub details: Vec<StatusDetails>,
}

impl Status {
    /// Sets the value for [code][Status::code].
    pub fn set_code<T: Into<Code>>(mut self, v: T) -> Self {
        self.code = v.into();
        self
    }

    /// Sets the value for [message][Status::message].
    pub fn set_message<T: Into<String>>(mut self, v: T) -> Self {
        self.message = v.into();
        self
    }

    /// Sets the value for [details][Status::details].
    pub fn set_details<T, I>(mut self, v: T) -> Self
    where
        T: IntoIterator<Item = I>,
        I: Into<StatusDetails>,
    {
        self.details = v.into_iter().map(|v| v.into()).collect();
        self
    }
}

/// The canonical error codes for APIs.
///
/// Sometimes multiple error codes may apply.  Services should return
/// the most specific error code that applies.  For example, prefer
/// `OUT_OF_RANGE` over `FAILED_PRECONDITION` if both codes apply.
/// Similarly prefer `NOT_FOUND` or `ALREADY_EXISTS` over `FAILED_PRECONDITION`.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
#[non_exhaustive]
pub enum Code {
    /// Not an error; returned on success.
    ///
    /// HTTP Mapping: 200 OK
    Ok = 0,

    /// The operation was cancelled, typically by the caller.
    ///
    /// HTTP Mapping: 499 Client Closed Request
    Cancelled = 1,

    /// Unknown error.
    ///
    /// HTTP Mapping: 500 Internal Server Error
    #[default]
    Unknown = 2,

    /// The client specified an invalid argument.
    ///
    /// HTTP Mapping: 400 Bad Request
    InvalidArgument = 3,

    /// The deadline expired before the operation could complete.
    ///
    /// HTTP Mapping: 504 Gateway Timeout
    DeadlineExceeded = 4,

    /// Some requested entity was not found.
    ///
    /// HTTP Mapping: 404 Not Found
    NotFound = 5,

    /// The entity that a client attempted to create already exists.
    ///
    /// HTTP Mapping: 409 Conflict
    AlreadyExists = 6,

    /// The caller does not have permission to execute the specified
    /// operation.
    ///
    /// HTTP Mapping: 403 Forbidden
    PermissionDenied = 7,

    /// Some resource has been exhausted, perhaps a per-user quota.
    ///
    /// HTTP Mapping: 429 Too Many Requests
    ResourceExhausted = 8,

    /// The operation was rejected because the system is not in a state
    /// required for the operation's execution.
    ///
    /// HTTP Mapping: 400 Bad Request
    FailedPrecondition = 9,

    /// The operation was aborted, typically due to a concurrency issue.
    ///
    /// HTTP Mapping: 409 Conflict
    Aborted = 10,

    /// The operation was attempted past the valid range.
    ///
    /// HTTP Mapping: 400 Bad Request
    OutOfRange = 11,

    /// The operation is not implemented or is not supported/enabled in this
    /// service.
    ///
    /// HTTP Mapping: 501 Not Implemented
    Unimplemented = 12,

    /// Internal errors.
    ///
    /// HTTP Mapping: 500 Internal Server Error
    Internal = 13,

    /// The service is currently unavailable.  This is most likely a
    /// transient condition, which can be corrected by retrying with
    /// a backoff.
    ///
    /// HTTP Mapping: 503 Service Unavailable
    Unavailable = 14,

    /// Unrecoverable data loss or corruption.
    ///
    /// HTTP Mapping: 500 Internal Server Error
    DataLoss = 15,

    /// The request does not have valid authentication credentials for the
    /// operation.
    ///
    /// HTTP Mapping: 401 Unauthorized
    Unauthenticated = 16,
}

impl Code {
    pub fn name(&self) -> &str {
        match self {
            Code::Ok => "OK",
            Code::Cancelled => "CANCELLED",
            Code::Unknown => "UNKNOWN",
            Code::InvalidArgument => "INVALID_ARGUMENT",
            Code::DeadlineExceeded => "DEADLINE_EXCEEDED",
            Code::NotFound => "NOT_FOUND",
            Code::AlreadyExists => "ALREADY_EXISTS",
            Code::PermissionDenied => "PERMISSION_DENIED",
            Code::ResourceExhausted => "RESOURCE_EXHAUSTED",
            Code::FailedPrecondition => "FAILED_PRECONDITION",
            Code::Aborted => "ABORTED",
            Code::OutOfRange => "OUT_OF_RANGE",
            Code::Unimplemented => "UNIMPLEMENTED",
            Code::Internal => "INTERNAL",
            Code::Unavailable => "UNAVAILABLE",
            Code::DataLoss => "DATA_LOSS",
            Code::Unauthenticated => "UNAUTHENTICATED",
        }
    }

    /// The numeric value used on the wire.
    pub fn value(&self) -> i32 {
        *self as i32
    }
}

impl std::convert::From<i32> for Code {
    fn from(value: i32) -> Self {
        match value {
            0 => Code::Ok,
            1 => Code::Cancelled,
            2 => Code::Unknown,
            3 => Code::InvalidArgument,
            4 => Code::DeadlineExceeded,
            5 => Code::NotFound,
            6 => Code::AlreadyExists,
            7 => Code::PermissionDenied,
            8 => Code::ResourceExhausted,
            9 => Code::FailedPrecondition,
            10 => Code::Aborted,
            11 => Code::OutOfRange,
            12 => Code::Unimplemented,
            13 => Code::Internal,
            14 => Code::Unavailable,
            15 => Code::DataLoss,
            16 => Code::Unauthenticated,
            _ => Code::default(),
        }
    }
}

impl std::fmt::Display for Code {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

impl std::convert::TryFrom<&str> for Code {
    type Error = String;
    fn try_from(value: &str) -> std::result::Result<Code, Self::Error> {
        match value {
            "OK" => Ok(Code::Ok),
            "CANCELLED" => Ok(Code::Cancelled),
            "UNKNOWN" => Ok(Code::Unknown),
            "INVALID_ARGUMENT" => Ok(Code::InvalidArgument),
            "DEADLINE_EXCEEDED" => Ok(Code::DeadlineExceeded),
            "NOT_FOUND" => Ok(Code::NotFound),
            "ALREADY_EXISTS" => Ok(Code::AlreadyExists),
            "PERMISSION_DENIED" => Ok(Code::PermissionDenied),
            "RESOURCE_EXHAUSTED" => Ok(Code::ResourceExhausted),
            "FAILED_PRECONDITION" => Ok(Code::FailedPrecondition),
            "ABORTED" => Ok(Code::Aborted),
            "OUT_OF_RANGE" => Ok(Code::OutOfRange),
            "UNIMPLEMENTED" => Ok(Code::Unimplemented),
            "INTERNAL" => Ok(Code::Internal),
            "UNAVAILABLE" => Ok(Code::Unavailable),
            "DATA_LOSS" => Ok(Code::DataLoss),
            "UNAUTHENTICATED" => Ok(Code::Unauthenticated),
            _ => Err(format!("unknown status code value {value}")),
        }
    }
}

impl Serialize for Code {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_i32(self.value())
    }
}

impl<'de> Deserialize<'de> for Code {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        i32::deserialize(deserializer).map(Code::from)
    }
}

/// A helper class to deserialized wrapped Status messages.
#[derive(Clone, Debug, Deserialize)]
struct ErrorWrapper {
    error: WrapperStatus,
}

#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(default)]
struct WrapperStatus {
    pub code: i32,
    pub message: String,
    pub status: Option<String>,
    pub details: Vec<StatusDetails>,
}

impl TryFrom<&bytes::Bytes> for Status {
    type Error = Error;

    fn try_from(value: &bytes::Bytes) -> Result<Self, Self::Error> {
        let wrapper = serde_json::from_slice::<ErrorWrapper>(value)
            .map(|w| w.error)
            .map_err(Error::deser)?;
        let code = match wrapper.status.as_deref().map(Code::try_from) {
            Some(Ok(code)) => code,
            Some(Err(_)) | None => Code::Unknown,
        };
        Ok(Status {
            code,
            message: wrapper.message,
            details: wrapper.details,
        })
    }
}

/// The type of details associated with [Status].
///
/// Google Cloud services often return a detailed error description. These
/// details can be used to better understand the root cause of the problem.
/// Only the detail types used to describe operation failures are decoded,
/// any other detail is preserved as JSON.
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
#[non_exhaustive]
#[serde(tag = "@type")]
pub enum StatusDetails {
    #[serde(rename = "type.googleapis.com/google.rpc.ErrorInfo")]
    ErrorInfo(ErrorInfo),
    #[serde(rename = "type.googleapis.com/google.rpc.Help")]
    Help(Help),
    #[serde(rename = "type.googleapis.com/google.rpc.LocalizedMessage")]
    LocalizedMessage(LocalizedMessage),
    #[serde(rename = "type.googleapis.com/google.rpc.QuotaFailure")]
    QuotaFailure(QuotaFailure),
    #[serde(untagged)]
    Other(serde_json::Value),
}

impl StatusDetails {
    /// A human-readable line describing this detail, if it has one.
    pub fn summary(&self) -> Option<String> {
        match self {
            Self::ErrorInfo(i) => Some(format!("reason: {}, domain: {}", i.reason, i.domain)),
            Self::Help(h) => h
                .links
                .first()
                .map(|l| format!("{}: {}", l.description, l.url)),
            Self::LocalizedMessage(m) => Some(m.message.clone()),
            Self::QuotaFailure(q) => q
                .violations
                .first()
                .map(|v| format!("{}: {}", v.subject, v.description)),
            Self::Other(_) => None,
        }
    }
}

/// Describes the cause of the error with structured details.
#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize)]
#[serde(default, rename_all = "camelCase")]
#[non_exhaustive]
pub struct ErrorInfo {
    pub reason: String,
    pub domain: String,
    pub metadata: HashMap<String, String>,
}

/// Provides links to documentation or for performing an out of band action.
#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize)]
#[serde(default, rename_all = "camelCase")]
#[non_exhaustive]
pub struct Help {
    pub links: Vec<HelpLink>,
}

/// A single help link.
#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize)]
#[serde(default, rename_all = "camelCase")]
#[non_exhaustive]
pub struct HelpLink {
    pub description: String,
    pub url: String,
}

/// An error message that is safe to return to the user.
#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize)]
#[serde(default, rename_all = "camelCase")]
#[non_exhaustive]
pub struct LocalizedMessage {
    pub locale: String,
    pub message: String,
}

/// Describes how a quota check failed.
#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize)]
#[serde(default, rename_all = "camelCase")]
#[non_exhaustive]
pub struct QuotaFailure {
    pub violations: Vec<QuotaViolation>,
}

/// A single quota violation.
#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize)]
#[serde(default, rename_all = "camelCase")]
#[non_exhaustive]
pub struct QuotaViolation {
    pub subject: String,
    pub description: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use test_case::test_case;

    type TestResult = std::result::Result<(), Box<dyn std::error::Error>>;

    #[test_case(Code::Ok, 0, "OK")]
    #[test_case(Code::NotFound, 5, "NOT_FOUND")]
    #[test_case(Code::FailedPrecondition, 9, "FAILED_PRECONDITION")]
    #[test_case(Code::Unavailable, 14, "UNAVAILABLE")]
    #[test_case(Code::Unauthenticated, 16, "UNAUTHENTICATED")]
    fn code_conversions(code: Code, value: i32, name: &str) {
        assert_eq!(code.value(), value);
        assert_eq!(Code::from(value), code);
        assert_eq!(code.name(), name);
        assert_eq!(code.to_string(), name);
        assert_eq!(Code::try_from(name), Ok(code));
    }

    #[test]
    fn code_unknown_values() {
        assert_eq!(Code::from(42), Code::Unknown);
        assert_eq!(Code::from(-1), Code::Unknown);
        let got = Code::try_from("NOT-A-CODE");
        assert!(got.is_err(), "{got:?}");
    }

    #[test]
    fn status_from_operation_error() -> TestResult {
        let input = json!({
            "code": 9,
            "message": "the instance is not ready",
            "details": [
                {
                    "@type": "type.googleapis.com/google.rpc.LocalizedMessage",
                    "locale": "en-US",
                    "message": "The instance is not ready yet.",
                },
                {
                    "@type": "type.googleapis.com/google.rpc.Help",
                    "links": [{"description": "Troubleshooting", "url": "https://cloud.google.com/help"}],
                },
                {
                    "@type": "type.googleapis.com/google.example.Unknown",
                    "value": 7,
                },
            ]
        });
        let got = serde_json::from_value::<Status>(input)?;
        assert_eq!(got.code, Code::FailedPrecondition);
        assert_eq!(got.message, "the instance is not ready");
        assert_eq!(got.details.len(), 3, "{got:?}");
        assert!(
            matches!(&got.details[0], StatusDetails::LocalizedMessage(m) if m.locale == "en-US"),
            "{got:?}"
        );
        assert!(
            matches!(&got.details[2], StatusDetails::Other(_)),
            "{got:?}"
        );
        let summaries = got
            .details
            .iter()
            .filter_map(StatusDetails::summary)
            .collect::<Vec<_>>();
        assert_eq!(
            summaries,
            vec![
                "The instance is not ready yet.",
                "Troubleshooting: https://cloud.google.com/help"
            ]
        );
        Ok(())
    }

    #[test]
    fn status_from_error_payload() -> TestResult {
        let payload = json!({"error": {
            "code": 404,
            "message": "operation not found",
            "status": "NOT_FOUND",
            "details": [{
                "@type": "type.googleapis.com/google.rpc.ErrorInfo",
                "reason": "OPERATION_NOT_FOUND",
                "domain": "compute.googleapis.com",
                "metadata": {"operation": "operation-123"},
            }],
        }});
        let payload = bytes::Bytes::from(serde_json::to_vec(&payload)?);
        let got = Status::try_from(&payload)?;
        assert_eq!(got.code, Code::NotFound);
        assert_eq!(got.message, "operation not found");
        let info = match &got.details[..] {
            [StatusDetails::ErrorInfo(info)] => info,
            _ => panic!("unexpected details {got:?}"),
        };
        assert_eq!(info.reason, "OPERATION_NOT_FOUND");
        assert_eq!(
            info.metadata.get("operation").map(String::as_str),
            Some("operation-123")
        );
        Ok(())
    }

    #[test]
    fn status_from_error_payload_unknown_status() -> TestResult {
        let payload = json!({"error": {"code": 599, "message": "odd", "status": "NOT-A-STATUS"}});
        let payload = bytes::Bytes::from(serde_json::to_vec(&payload)?);
        let got = Status::try_from(&payload)?;
        assert_eq!(got.code, Code::Unknown);
        assert_eq!(got.message, "odd");
        Ok(())
    }

    #[test]
    fn status_from_bad_payload() {
        let payload = bytes::Bytes::from_static(b"<html>Bad Gateway</html>");
        let got = Status::try_from(&payload);
        assert!(
            matches!(&got, Err(e) if e.is_deserialization()),
            "{got:?}"
        );
    }

    #[test]
    fn status_builders() {
        let status = Status::default()
            .set_code(Code::Aborted)
            .set_message("try again")
            .set_details([StatusDetails::LocalizedMessage(LocalizedMessage {
                locale: "en-US".into(),
                message: "Please try again".into(),
            })]);
        assert_eq!(status.code, Code::Aborted);
        assert_eq!(status.message, "try again");
        assert_eq!(status.details.len(), 1);
    }
}
