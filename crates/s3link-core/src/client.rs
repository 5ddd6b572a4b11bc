//! The object storage client.
//!
//! [`StorageClient`] uploads payloads under generated object keys and
//! presigns download URLs. Outbound requests are signed by
//! [`RequestSigner`] and sent with `reqwest`; the current instant and the
//! object key prefix come from the injected [`Clock`] and [`IdGenerator`].

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use s3link_sigv4::{Credentials, RequestSigner, SigningTarget, SigningTime};
use tracing::{debug, info, warn};

use crate::capability::{Clock, IdGenerator, SystemClock, UuidGenerator};
use crate::config::S3LinkConfig;
use crate::error::{ConfigError, StorageError};

/// Filename used when an upload carries none.
pub const DEFAULT_FILENAME: &str = "default_filename";

/// Storage operations the HTTP front door depends on.
///
/// Boxed futures keep the trait object safe so the service can hold an
/// `Arc<dyn ObjectStore>` or a test double.
pub trait ObjectStore: Send + Sync + 'static {
    /// Store `data` under a fresh object key derived from `filename` and
    /// return that key.
    fn upload(
        &self,
        data: Bytes,
        filename: Option<String>,
    ) -> Pin<Box<dyn Future<Output = Result<String, StorageError>> + Send + '_>>;

    /// Produce a presigned GET URL for `object_key` valid for `expires` seconds.
    fn presign_url(&self, object_key: &str, expires: i64) -> String;
}

/// How object URLs are addressed.
#[derive(Debug, Clone)]
enum Endpoint {
    /// `https://<bucket>.s3.<region>.amazonaws.com/<key>`
    VirtualHosted { region: String },
    /// `<scheme>://<host>/<bucket>/<key>`
    PathStyle { scheme: String, host: String },
}

/// Client for a single bucket.
///
/// Cheap to clone; clones share the connection pool and capabilities.
#[derive(Clone)]
pub struct StorageClient {
    bucket: String,
    endpoint: Endpoint,
    signer: RequestSigner,
    clock: Arc<dyn Clock>,
    ids: Arc<dyn IdGenerator>,
    http: reqwest::Client,
}

impl std::fmt::Debug for StorageClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StorageClient")
            .field("bucket", &self.bucket)
            .field("endpoint", &self.endpoint)
            .field("signer", &self.signer)
            .finish_non_exhaustive()
    }
}

impl StorageClient {
    /// Create a client from configuration with explicit capabilities.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidEndpoint`] if `endpoint_url` lacks a
    /// scheme or host, or [`ConfigError::HttpClient`] if the HTTP client
    /// cannot be built.
    pub fn new(
        config: &S3LinkConfig,
        clock: Arc<dyn Clock>,
        ids: Arc<dyn IdGenerator>,
    ) -> Result<Self, ConfigError> {
        let endpoint = match &config.endpoint_url {
            Some(url) => parse_endpoint(url)?,
            None => Endpoint::VirtualHosted {
                region: config.region.clone(),
            },
        };

        let mut builder = reqwest::Client::builder();
        if let Some(secs) = config.request_timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }
        let http = builder.build().map_err(ConfigError::HttpClient)?;

        let credentials = Credentials::new(&config.access_key, &config.secret_key);

        Ok(Self {
            bucket: config.bucket.clone(),
            endpoint,
            signer: RequestSigner::new(credentials, &config.region),
            clock,
            ids,
            http,
        })
    }

    /// Create a client using the system clock and random UUIDs.
    ///
    /// # Errors
    ///
    /// See [`StorageClient::new`].
    pub fn from_config(config: &S3LinkConfig) -> Result<Self, ConfigError> {
        Self::new(config, Arc::new(SystemClock), Arc::new(UuidGenerator))
    }

    /// Upload `data` under `<id>_<filename>` and return the object key.
    ///
    /// A missing or empty filename becomes [`DEFAULT_FILENAME`]. Any 2xx
    /// response counts as success.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use bytes::Bytes;
    /// use s3link_core::{S3LinkConfig, StorageClient};
    ///
    /// # tokio_test::block_on(async {
    /// let config = S3LinkConfig::builder()
    ///     .bucket("my-bucket")
    ///     .region("us-east-1")
    ///     .access_key("AKIDEXAMPLE")
    ///     .secret_key("SECRET")
    ///     .endpoint_url("http://localhost:4566")
    ///     .build();
    /// let client = StorageClient::from_config(&config).unwrap();
    /// let key = client
    ///     .upload(Bytes::from("hello"), Some("hello.txt"))
    ///     .await
    ///     .unwrap();
    /// assert!(key.ends_with("_hello.txt"));
    /// # });
    /// ```
    pub async fn upload(
        &self,
        data: Bytes,
        filename: Option<&str>,
    ) -> Result<String, StorageError> {
        let filename = filename.filter(|f| !f.is_empty()).unwrap_or(DEFAULT_FILENAME);
        let object_key = format!("{}_{filename}", self.ids.generate());
        let size = data.len();

        let time = SigningTime::new(self.clock.now());
        let target = self.target(&object_key);
        let request = self.signer.sign_put(&time, &target, data)?;
        let request = into_outbound(request)?;

        debug!(bucket = %self.bucket, object_key = %object_key, size, "Uploading object");

        let response = self.http.execute(request).await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(bucket = %self.bucket, object_key = %object_key, %status, "Upload rejected");
            return Err(StorageError::Rejected {
                status: status.as_u16(),
                body,
            });
        }

        info!(bucket = %self.bucket, object_key = %object_key, size, "Uploaded object");
        Ok(object_key)
    }

    /// Presign a GET URL for `object_key` valid for `expires` seconds.
    ///
    /// Performs no I/O. The key is not checked for existence and the expiry
    /// is passed through unvalidated.
    #[must_use]
    pub fn presign_url(&self, object_key: &str, expires: i64) -> String {
        let time = SigningTime::new(self.clock.now());
        let target = self.target(object_key);
        let url = self.signer.presign_url(&time, &target, expires);
        debug!(bucket = %self.bucket, object_key = %object_key, expires, "Presigned URL");
        url
    }

    fn target(&self, object_key: &str) -> SigningTarget {
        match &self.endpoint {
            Endpoint::VirtualHosted { region } => {
                SigningTarget::virtual_hosted(&self.bucket, region, object_key)
            }
            Endpoint::PathStyle { scheme, host } => {
                SigningTarget::path_style(scheme, host, &self.bucket, object_key)
            }
        }
    }
}

impl ObjectStore for StorageClient {
    fn upload(
        &self,
        data: Bytes,
        filename: Option<String>,
    ) -> Pin<Box<dyn Future<Output = Result<String, StorageError>> + Send + '_>> {
        Box::pin(async move { StorageClient::upload(self, data, filename.as_deref()).await })
    }

    fn presign_url(&self, object_key: &str, expires: i64) -> String {
        StorageClient::presign_url(self, object_key, expires)
    }
}

fn into_outbound(request: http::Request<Bytes>) -> Result<reqwest::Request, StorageError> {
    reqwest::Request::try_from(request).map_err(StorageError::InvalidRequest)
}

fn parse_endpoint(url: &str) -> Result<Endpoint, ConfigError> {
    let uri: http::Uri = url
        .parse()
        .map_err(|_| ConfigError::InvalidEndpoint(url.to_owned()))?;
    match (uri.scheme_str(), uri.authority()) {
        (Some(scheme), Some(authority)) => Ok(Endpoint::PathStyle {
            scheme: scheme.to_owned(),
            host: authority.as_str().to_owned(),
        }),
        _ => Err(ConfigError::InvalidEndpoint(url.to_owned())),
    }
}
