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

//! Helpers to build the URLs used to fetch operations.

const LOCATION_PLACEHOLDERS: [&str; 2] = ["{{location}}", "{{region}}"];

/// Returns true if `base_path` needs a location to be usable.
pub fn has_location_template(base_path: &str) -> bool {
    LOCATION_PLACEHOLDERS.iter().any(|p| base_path.contains(p))
}

/// Replaces the `{{location}}` and `{{region}}` placeholders in `base_path`.
///
/// # Example
/// ```
/// # use tpg_gax_internal::path::fill_location;
/// assert_eq!(
///     fill_location("https://{{region}}-aiplatform.googleapis.com/v1/", "us-east1"),
///     "https://us-east1-aiplatform.googleapis.com/v1/");
/// ```
pub fn fill_location(base_path: &str, location: &str) -> String {
    LOCATION_PLACEHOLDERS
        .iter()
        .fold(base_path.to_string(), |path, p| path.replace(p, location))
}

/// Extracts the location from a resource name.
///
/// Resource names in the regional services follow the
/// `projects/{project}/locations/{location}/...` pattern.
///
/// # Example
/// ```
/// # use tpg_gax_internal::path::location_from_name;
/// let name = "projects/p/locations/us-central1/operations/op-123";
/// assert_eq!(location_from_name(name), Some("us-central1"));
/// assert_eq!(location_from_name("operations/op-123"), None);
/// ```
pub fn location_from_name(name: &str) -> Option<&str> {
    let mut segments = name.split('/');
    while let Some(s) = segments.next() {
        if s != "locations" {
            continue;
        }
        return match (segments.next(), segments.next()) {
            (Some(location), Some(_)) if !location.is_empty() => Some(location),
            _ => None,
        };
    }
    None
}

/// Extracts the location from a tag binding operation name.
///
/// Tag binding operations do not follow the resource name pattern. They are
/// named `operations/rctb.{location}.{id}` for creates and
/// `operations/rdtb.{location}.{id}` for deletes.
///
/// # Example
/// ```
/// # use tpg_gax_internal::path::location_from_tag_binding_operation;
/// let name = "operations/rctb.us-central1.6243390151262478336";
/// assert_eq!(location_from_tag_binding_operation(name), Some("us-central1"));
/// assert_eq!(location_from_tag_binding_operation("operations/op-123"), None);
/// ```
pub fn location_from_tag_binding_operation(name: &str) -> Option<&str> {
    let id = name.strip_prefix("operations/")?;
    let rest = id
        .strip_prefix("rctb.")
        .or_else(|| id.strip_prefix("rdtb."))?;
    let (location, number) = rest.split_once('.')?;
    let valid_location = !location.is_empty()
        && location
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-');
    let valid_number = !number.is_empty() && number.chars().all(|c| c.is_ascii_digit());
    (valid_location && valid_number).then_some(location)
}

/// Returns the last segment of a self link, or the input if it has no `/`.
///
/// Compute returns zones and regions as self links, e.g.
/// `https://www.googleapis.com/compute/v1/projects/p/zones/us-central1-a`.
pub fn last_segment(self_link: &str) -> &str {
    let trimmed = self_link.trim_end_matches('/');
    trimmed.rsplit('/').next().unwrap_or(trimmed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case("projects/p/locations/us-central1/operations/op", Some("us-central1"))]
    #[test_case("projects/p/locations/global/operations/op", Some("global"))]
    #[test_case("locations/europe-west4/operations/op", Some("europe-west4"))]
    #[test_case("projects/p/locations/us-central1", None; "no trailing segment")]
    #[test_case("projects/p/locations//operations/op", None; "empty location")]
    #[test_case("operations/op", None)]
    #[test_case("", None)]
    fn location(input: &str, want: Option<&str>) {
        assert_eq!(location_from_name(input), want);
    }

    #[test_case("operations/rctb.us-central1.6243390151262478336", Some("us-central1"))]
    #[test_case("operations/rdtb.europe-west1-b.42", Some("europe-west1-b"))]
    #[test_case("operations/rctb.us-central1.", None; "missing id")]
    #[test_case("operations/rctb..42", None; "missing location")]
    #[test_case("operations/rctb.us-central1.abc", None; "non numeric id")]
    #[test_case("operations/abc.us-central1.42", None; "other prefix")]
    #[test_case("rctb.us-central1.42", None; "not an operation")]
    fn tag_binding_location(input: &str, want: Option<&str>) {
        assert_eq!(location_from_tag_binding_operation(input), want);
    }

    #[test_case("https://{{location}}-dialogflow.googleapis.com/v3/", "https://us-west1-dialogflow.googleapis.com/v3/")]
    #[test_case("https://{{region}}-aiplatform.googleapis.com/v1/", "https://us-west1-aiplatform.googleapis.com/v1/")]
    #[test_case("https://redis.googleapis.com/v1/", "https://redis.googleapis.com/v1/")]
    fn fill(input: &str, want: &str) {
        assert_eq!(fill_location(input, "us-west1"), want);
    }

    #[test_case("https://{{location}}-gkemulticloud.googleapis.com/v1/", true)]
    #[test_case("https://{{region}}-aiplatform.googleapis.com/v1/", true)]
    #[test_case("https://spanner.googleapis.com/v1/", false)]
    fn location_template(input: &str, want: bool) {
        assert_eq!(has_location_template(input), want);
    }

    #[test_case("https://www.googleapis.com/compute/v1/projects/p/zones/us-central1-a", "us-central1-a")]
    #[test_case("projects/p/regions/us-central1/", "us-central1")]
    #[test_case("us-central1-b", "us-central1-b")]
    fn self_link(input: &str, want: &str) {
        assert_eq!(last_segment(input), want);
    }
}
