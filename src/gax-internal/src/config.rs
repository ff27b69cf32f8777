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

//! The provider configuration used by the operation waiters.
//!
//! A [Config] is built once, validated, and then shared read-only by all the
//! waiters, typically as an `Arc<Config>`.

pub use gax::polling_backoff_policy::DEFAULT_POLL_INTERVAL;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

/// The default timeout for each request fetching an operation.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

/// The default universe domain.
pub const DEFAULT_UNIVERSE_DOMAIN: &str = "googleapis.com";

const DEFAULT_USER_AGENT: &str = concat!("terraform-provider-google/", env!("CARGO_PKG_VERSION"));

/// The Google Cloud services with long-running operations.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum Service {
    AppEngine,
    CloudFunctions,
    Compute,
    Container,
    ContainerAttached,
    Dataproc,
    DialogflowCX,
    Eventarc,
    Redis,
    ResourceManager,
    RunAdminV3,
    ServiceManagement,
    ServiceNetworking,
    ServiceUsage,
    Spanner,
    Sql,
    TagsLocation,
    VertexAI,
}

impl Service {
    pub const ALL: [Service; 18] = [
        Service::AppEngine,
        Service::CloudFunctions,
        Service::Compute,
        Service::Container,
        Service::ContainerAttached,
        Service::Dataproc,
        Service::DialogflowCX,
        Service::Eventarc,
        Service::Redis,
        Service::ResourceManager,
        Service::RunAdminV3,
        Service::ServiceManagement,
        Service::ServiceNetworking,
        Service::ServiceUsage,
        Service::Spanner,
        Service::Sql,
        Service::TagsLocation,
        Service::VertexAI,
    ];

    /// The default base path, before applying the universe domain.
    ///
    /// Regional services contain a `{{location}}` or `{{region}}` placeholder,
    /// filled from the operation name.
    pub fn default_base_path(&self) -> &'static str {
        match self {
            Service::AppEngine => "https://appengine.googleapis.com/v1/",
            Service::CloudFunctions => "https://cloudfunctions.googleapis.com/v1/",
            Service::Compute => "https://compute.googleapis.com/compute/v1/",
            Service::Container => "https://container.googleapis.com/v1/",
            Service::ContainerAttached => "https://{{location}}-gkemulticloud.googleapis.com/v1/",
            Service::Dataproc => "https://dataproc.googleapis.com/v1/",
            Service::DialogflowCX => "https://{{location}}-dialogflow.googleapis.com/v3/",
            Service::Eventarc => "https://eventarc.googleapis.com/v1/",
            Service::Redis => "https://redis.googleapis.com/v1/",
            Service::ResourceManager => "https://cloudresourcemanager.googleapis.com/v1/",
            Service::RunAdminV3 => "https://run.googleapis.com/v2/",
            Service::ServiceManagement => "https://servicemanagement.googleapis.com/v1/",
            Service::ServiceNetworking => "https://servicenetworking.googleapis.com/v1/",
            Service::ServiceUsage => "https://serviceusage.googleapis.com/v1/",
            Service::Spanner => "https://spanner.googleapis.com/v1/",
            Service::Sql => "https://sqladmin.googleapis.com/sql/v1beta4/",
            Service::TagsLocation => "https://{{location}}-cloudresourcemanager.googleapis.com/v3/",
            Service::VertexAI => "https://{{region}}-aiplatform.googleapis.com/v1/",
        }
    }

    /// The environment variable used to override the base path.
    pub fn custom_endpoint_variable(&self) -> &'static str {
        match self {
            Service::AppEngine => "GOOGLE_APP_ENGINE_CUSTOM_ENDPOINT",
            Service::CloudFunctions => "GOOGLE_CLOUD_FUNCTIONS_CUSTOM_ENDPOINT",
            Service::Compute => "GOOGLE_COMPUTE_CUSTOM_ENDPOINT",
            Service::Container => "GOOGLE_CONTAINER_CUSTOM_ENDPOINT",
            Service::ContainerAttached => "GOOGLE_CONTAINER_ATTACHED_CUSTOM_ENDPOINT",
            Service::Dataproc => "GOOGLE_DATAPROC_CUSTOM_ENDPOINT",
            Service::DialogflowCX => "GOOGLE_DIALOGFLOW_CX_CUSTOM_ENDPOINT",
            Service::Eventarc => "GOOGLE_EVENTARC_CUSTOM_ENDPOINT",
            Service::Redis => "GOOGLE_REDIS_CUSTOM_ENDPOINT",
            Service::ResourceManager => "GOOGLE_RESOURCE_MANAGER_CUSTOM_ENDPOINT",
            Service::RunAdminV3 => "GOOGLE_CLOUD_RUN_V2_CUSTOM_ENDPOINT",
            Service::ServiceManagement => "GOOGLE_SERVICE_MANAGEMENT_CUSTOM_ENDPOINT",
            Service::ServiceNetworking => "GOOGLE_SERVICE_NETWORKING_CUSTOM_ENDPOINT",
            Service::ServiceUsage => "GOOGLE_SERVICE_USAGE_CUSTOM_ENDPOINT",
            Service::Spanner => "GOOGLE_SPANNER_CUSTOM_ENDPOINT",
            Service::Sql => "GOOGLE_SQL_CUSTOM_ENDPOINT",
            Service::TagsLocation => "GOOGLE_TAGS_LOCATION_CUSTOM_ENDPOINT",
            Service::VertexAI => "GOOGLE_VERTEX_AI_CUSTOM_ENDPOINT",
        }
    }

    /// Returns true if the base path depends on the operation location.
    pub fn is_regional(&self) -> bool {
        crate::path::has_location_template(self.default_base_path())
    }
}

impl std::fmt::Display for Service {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        std::fmt::Debug::fmt(self, f)
    }
}

/// The errors returned by [ConfigBuilder::build].
#[derive(thiserror::Error, Debug)]
#[non_exhaustive]
pub enum Error {
    #[error("the poll interval must be greater than zero")]
    InvalidPollInterval,
    #[error("the request timeout must be greater than zero")]
    InvalidRequestTimeout,
    #[error("the universe domain cannot be empty")]
    EmptyUniverseDomain,
    #[error("the base path for {service} ({path}) must end with a `/`")]
    MissingTrailingSlash { service: Service, path: String },
    #[error("the base path for {service} ({path}) is not a valid URL: {source}")]
    InvalidBasePath {
        service: Service,
        path: String,
        #[source]
        source: url::ParseError,
    },
    #[error("the {name} header value is not valid: {value}")]
    InvalidHeaderValue { name: &'static str, value: String },
}

/// The configuration shared by all the operation waiters.
///
/// # Example
/// ```
/// # use tpg_gax_internal::config::*;
/// use std::time::Duration;
/// let config = Config::builder()
///     .with_poll_interval(Duration::from_secs(5))
///     .with_billing_project("my-billing-project")
///     .with_user_project_override(true)
///     .build()?;
/// assert_eq!(config.poll_interval(), Duration::from_secs(5));
/// assert_eq!(config.user_project(), Some("my-billing-project"));
/// # Ok::<(), Error>(())
/// ```
#[derive(Clone, Debug)]
pub struct Config {
    user_agent: String,
    poll_interval: Duration,
    request_timeout: Duration,
    access_token: Option<String>,
    billing_project: Option<String>,
    user_project_override: bool,
    request_reason: Option<String>,
    universe_domain: String,
    base_paths: HashMap<Service, String>,
}

impl Config {
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }

    pub fn user_agent(&self) -> &str {
        &self.user_agent
    }

    /// The interval between polls used by the waiters.
    pub fn poll_interval(&self) -> Duration {
        self.poll_interval
    }

    /// The timeout for each request fetching an operation.
    pub fn request_timeout(&self) -> Duration {
        self.request_timeout
    }

    pub fn access_token(&self) -> Option<&str> {
        self.access_token.as_deref()
    }

    pub fn billing_project(&self) -> Option<&str> {
        self.billing_project.as_deref()
    }

    pub fn request_reason(&self) -> Option<&str> {
        self.request_reason.as_deref()
    }

    pub fn universe_domain(&self) -> &str {
        &self.universe_domain
    }

    /// The project billed for the requests, if the configuration overrides it.
    ///
    /// This is only set when `user_project_override` is enabled and a billing
    /// project is configured.
    pub fn user_project(&self) -> Option<&str> {
        if self.user_project_override {
            self.billing_project()
        } else {
            None
        }
    }

    /// The base path for `service`, possibly with a location placeholder.
    pub fn base_path(&self, service: Service) -> String {
        if let Some(path) = self.base_paths.get(&service) {
            return path.clone();
        }
        let path = service.default_base_path();
        if self.universe_domain == DEFAULT_UNIVERSE_DOMAIN {
            return path.to_string();
        }
        path.replace(DEFAULT_UNIVERSE_DOMAIN, &self.universe_domain)
    }
}

/// Builds a [Config].
#[derive(Clone, Debug)]
pub struct ConfigBuilder {
    config: Config,
}

impl Default for ConfigBuilder {
    fn default() -> Self {
        Self {
            config: Config {
                user_agent: DEFAULT_USER_AGENT.to_string(),
                poll_interval: DEFAULT_POLL_INTERVAL,
                request_timeout: DEFAULT_REQUEST_TIMEOUT,
                access_token: None,
                billing_project: None,
                user_project_override: false,
                request_reason: None,
                universe_domain: DEFAULT_UNIVERSE_DOMAIN.to_string(),
                base_paths: HashMap::new(),
            },
        }
    }
}

impl ConfigBuilder {
    /// Validates the configuration and returns it, ready to share.
    pub fn build(self) -> Result<Arc<Config>, Error> {
        let config = self.config;
        if config.poll_interval.is_zero() {
            return Err(Error::InvalidPollInterval);
        }
        if config.request_timeout.is_zero() {
            return Err(Error::InvalidRequestTimeout);
        }
        if config.universe_domain.is_empty() {
            return Err(Error::EmptyUniverseDomain);
        }
        check_header("User-Agent", &config.user_agent)?;
        if let Some(v) = config.access_token.as_deref() {
            check_header("Authorization", v)?;
        }
        if let Some(v) = config.billing_project.as_deref() {
            check_header("X-Goog-User-Project", v)?;
        }
        if let Some(v) = config.request_reason.as_deref() {
            check_header("X-Goog-Request-Reason", v)?;
        }
        for service in Service::ALL {
            validate_base_path(service, &config.base_path(service))?;
        }
        Ok(Arc::new(config))
    }

    /// Sets the `User-Agent` header sent with each request.
    pub fn with_user_agent<V: Into<String>>(mut self, v: V) -> Self {
        self.config.user_agent = v.into();
        self
    }

    /// Sets the interval between polls, defaults to 10 seconds.
    pub fn with_poll_interval<V: Into<Duration>>(mut self, v: V) -> Self {
        self.config.poll_interval = v.into();
        self
    }

    /// Sets the timeout for each request fetching an operation.
    pub fn with_request_timeout<V: Into<Duration>>(mut self, v: V) -> Self {
        self.config.request_timeout = v.into();
        self
    }

    /// Sets an OAuth2 access token, sent as a `Bearer` token.
    pub fn with_access_token<V: Into<String>>(mut self, v: V) -> Self {
        self.config.access_token = Some(v.into());
        self
    }

    /// Sets the project used for billing and quota.
    pub fn with_billing_project<V: Into<String>>(mut self, v: V) -> Self {
        self.config.billing_project = Some(v.into());
        self
    }

    /// If true, send the billing project in the `X-Goog-User-Project` header.
    pub fn with_user_project_override(mut self, v: bool) -> Self {
        self.config.user_project_override = v;
        self
    }

    /// Sets the `X-Goog-Request-Reason` header sent with each request.
    pub fn with_request_reason<V: Into<String>>(mut self, v: V) -> Self {
        self.config.request_reason = Some(v.into());
        self
    }

    /// Sets the universe domain, replacing `googleapis.com` in the default
    /// base paths.
    pub fn with_universe_domain<V: Into<String>>(mut self, v: V) -> Self {
        self.config.universe_domain = v.into();
        self
    }

    /// Overrides the base path for one service.
    ///
    /// The path must end with `/`. It may contain a `{{location}}` or
    /// `{{region}}` placeholder.
    pub fn with_base_path<V: Into<String>>(mut self, service: Service, v: V) -> Self {
        self.config.base_paths.insert(service, v.into());
        self
    }

    /// Overrides base paths from the `GOOGLE_*_CUSTOM_ENDPOINT` variables.
    ///
    /// The `lookup` function returns the value of a variable, if set. Empty
    /// values are ignored.
    ///
    /// # Example
    /// ```
    /// # use tpg_gax_internal::config::*;
    /// let config = Config::builder()
    ///     .with_endpoints_from_env(|name| match name {
    ///         "GOOGLE_COMPUTE_CUSTOM_ENDPOINT" => Some("https://compute.example.com/v1/".to_string()),
    ///         _ => None,
    ///     })
    ///     .build()?;
    /// assert_eq!(config.base_path(Service::Compute), "https://compute.example.com/v1/");
    /// # Ok::<(), Error>(())
    /// ```
    pub fn with_endpoints_from_env<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        for service in Service::ALL {
            match lookup(service.custom_endpoint_variable()) {
                Some(v) if !v.is_empty() => {
                    self.config.base_paths.insert(service, v);
                }
                _ => {}
            }
        }
        self
    }

    /// Overrides base paths from the process environment.
    pub fn with_endpoints_from_process_env(self) -> Self {
        self.with_endpoints_from_env(|name| std::env::var(name).ok())
    }
}

fn check_header(name: &'static str, value: &str) -> Result<(), Error> {
    http::HeaderValue::from_str(value)
        .map(|_| ())
        .map_err(|_| Error::InvalidHeaderValue {
            name,
            value: value.to_string(),
        })
}

fn validate_base_path(service: Service, path: &str) -> Result<(), Error> {
    if !path.ends_with('/') {
        return Err(Error::MissingTrailingSlash {
            service,
            path: path.to_string(),
        });
    }
    let sample = crate::path::fill_location(path, "us-central1");
    url::Url::parse(&sample)
        .map(|_| ())
        .map_err(|source| Error::InvalidBasePath {
            service,
            path: path.to_string(),
            source,
        })
}
