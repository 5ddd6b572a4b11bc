//! Service configuration.
//!
//! Provides [`S3LinkConfig`], loaded once at startup from environment
//! variables. The four storage settings (bucket, region, access key, secret
//! key) have no defaults; a missing one is a fatal startup error.

use std::collections::HashMap;
use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};
use typed_builder::TypedBuilder;

use crate::error::ConfigError;

/// s3link configuration.
///
/// # Examples
///
/// ```
/// use s3link_core::config::S3LinkConfig;
///
/// let config = S3LinkConfig::builder()
///     .bucket("testbucket")
///     .region("us-test-1")
///     .access_key("TESTACCESSKEY")
///     .secret_key("TESTSECRETKEY")
///     .build();
/// assert_eq!(config.listen_addr(), "0.0.0.0:8080");
/// assert!(config.endpoint_url.is_none());
/// ```
#[derive(Clone, Serialize, Deserialize, TypedBuilder)]
#[serde(rename_all = "camelCase")]
pub struct S3LinkConfig {
    /// Host part of the bind address.
    #[builder(default = String::from("0.0.0.0"))]
    pub listen_host: String,

    /// Port the HTTP front door listens on.
    #[builder(default = 8080)]
    pub server_port: u16,

    /// Target bucket name.
    #[builder(setter(into))]
    pub bucket: String,

    /// Region of the bucket.
    #[builder(setter(into))]
    pub region: String,

    /// Access key ID used to sign requests.
    #[builder(setter(into))]
    pub access_key: String,

    /// Secret access key used to sign requests.
    #[serde(skip_serializing)]
    #[builder(setter(into))]
    pub secret_key: String,

    /// Custom endpoint (e.g. `http://localhost:4566`). When set, requests use
    /// path-style addressing against it instead of the regional AWS host.
    #[builder(default, setter(strip_option, into))]
    pub endpoint_url: Option<String>,

    /// Timeout for the upload request, in seconds.
    #[builder(default, setter(strip_option))]
    pub request_timeout_secs: Option<u64>,

    /// Log level filter string (e.g. `"info"`, `"debug"`).
    #[builder(default = String::from("info"))]
    pub log_level: String,
}

impl fmt::Debug for S3LinkConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("S3LinkConfig")
            .field("listen_host", &self.listen_host)
            .field("server_port", &self.server_port)
            .field("bucket", &self.bucket)
            .field("region", &self.region)
            .field("access_key", &self.access_key)
            .field("secret_key", &"***")
            .field("endpoint_url", &self.endpoint_url)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .field("log_level", &self.log_level)
            .finish()
    }
}

impl S3LinkConfig {
    /// Load configuration from environment variables.
    ///
    /// | Variable | Default |
    /// |----------|---------|
    /// | `S3_BUCKET` | *(required)* |
    /// | `S3_REGION` | *(required)* |
    /// | `S3_ACCESS_KEY` | *(required)* |
    /// | `S3_SECRET_KEY` | *(required)* |
    /// | `GATEWAY_LISTEN` | `0.0.0.0` |
    /// | `SERVER_PORT` | `8080` |
    /// | `S3_ENDPOINT_URL` | *(unset)* |
    /// | `S3_REQUEST_TIMEOUT_SECS` | *(unset)* |
    /// | `LOG_LEVEL` | `info` |
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Missing`] if a required variable is unset or empty,
    /// or [`ConfigError::Invalid`] if a numeric variable does not parse.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load configuration from environment variables, filling unset ones
    /// from the dotenv file at `path`.
    ///
    /// Variables already present in the process environment win over the
    /// file. A missing file is not an error. The process environment is
    /// never modified.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Dotenv`] if the file exists but cannot be read
    /// or parsed, otherwise the same as [`S3LinkConfig::from_env`].
    pub fn from_env_and_dotenv(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        Self::from_lookup_and_dotenv(|name| std::env::var(name).ok(), path)
    }

    /// Like [`S3LinkConfig::from_env_and_dotenv`] with an arbitrary lookup in
    /// place of the process environment.
    ///
    /// # Errors
    ///
    /// Same as [`S3LinkConfig::from_env_and_dotenv`].
    pub fn from_lookup_and_dotenv(
        lookup: impl Fn(&str) -> Option<String>,
        path: impl AsRef<Path>,
    ) -> Result<Self, ConfigError> {
        let file = read_dotenv(path.as_ref())?;
        Self::from_lookup(|name| lookup(name).or_else(|| file.get(name).cloned()))
    }

    /// Load configuration through an arbitrary variable lookup.
    ///
    /// # Errors
    ///
    /// Same as [`S3LinkConfig::from_env`].
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |name: &str| lookup(name).filter(|v| !v.is_empty());
        let require = |name: &'static str| get(name).ok_or(ConfigError::Missing(name));

        let mut config = Self::builder()
            .bucket(require("S3_BUCKET")?)
            .region(require("S3_REGION")?)
            .access_key(require("S3_ACCESS_KEY")?)
            .secret_key(require("S3_SECRET_KEY")?)
            .build();

        if let Some(v) = get("GATEWAY_LISTEN") {
            config.listen_host = v;
        }
        if let Some(v) = get("SERVER_PORT") {
            config.server_port = parse_number("SERVER_PORT", &v)?;
        }
        if let Some(v) = get("S3_ENDPOINT_URL") {
            config.endpoint_url = Some(v.trim_end_matches('/').to_owned());
        }
        if let Some(v) = get("S3_REQUEST_TIMEOUT_SECS") {
            config.request_timeout_secs = Some(parse_number("S3_REQUEST_TIMEOUT_SECS", &v)?);
        }
        if let Some(v) = get("LOG_LEVEL") {
            config.log_level = v;
        }

        Ok(config)
    }

    /// The socket address string the server binds to.
    #[must_use]
    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.listen_host, self.server_port)
    }
}

fn read_dotenv(path: &Path) -> Result<HashMap<String, String>, ConfigError> {
    match dotenvy::from_path_iter(path) {
        Ok(iter) => iter
            .collect::<Result<_, _>>()
            .map_err(ConfigError::Dotenv),
        Err(err) if err.not_found() => Ok(HashMap::new()),
        Err(err) => Err(ConfigError::Dotenv(err)),
    }
}

fn parse_number<T: std::str::FromStr>(name: &'static str, value: &str) -> Result<T, ConfigError> {
    value.parse().map_err(|_| ConfigError::Invalid {
        name,
        value: value.to_owned(),
    })
}
