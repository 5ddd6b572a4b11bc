//! AWS Signature Version 4 signing.
//!
//! Both signing modes share the same chain:
//!
//! 1. Build the canonical request.
//! 2. Build the string to sign from the timestamp, credential scope, and the
//!    SHA-256 of the canonical request.
//! 3. Derive the signing key from the secret key and the credential scope.
//! 4. The signature is the hex HMAC-SHA256 of the string to sign.
//!
//! [`RequestSigner::presign_url`] carries the authentication in the query string
//! and signs `UNSIGNED-PAYLOAD`, since a download link cannot commit to a body.
//! [`RequestSigner::sign_put`] carries it in the `Authorization` header and signs
//! the real payload hash.

use bytes::Bytes;
use chrono::{DateTime, Utc};
use tracing::debug;

use crate::canonical::{
    build_canonical_query_string, build_canonical_request, build_signed_headers_string,
    encode_object_key,
};
use crate::credentials::Credentials;
use crate::crypto::{hash_payload, hmac_sha256};
use crate::error::SigningError;

/// The only algorithm supported by this implementation.
pub const ALGORITHM: &str = "AWS4-HMAC-SHA256";

/// The payload hash placeholder signed by presigned URLs.
pub const UNSIGNED_PAYLOAD: &str = "UNSIGNED-PAYLOAD";

/// Terminator of every credential scope.
const SCOPE_TERMINATOR: &str = "aws4_request";

/// Default service name for object storage.
const DEFAULT_SERVICE: &str = "s3";

/// The pair of timestamps every signing operation needs.
///
/// Built once per call from an explicit instant so that signing never reads a
/// global clock.
///
/// # Examples
///
/// ```
/// use chrono::{TimeZone, Utc};
/// use s3link_sigv4::SigningTime;
///
/// let time = SigningTime::new(Utc.with_ymd_and_hms(2025, 2, 24, 15, 4, 5).unwrap());
/// assert_eq!(time.timestamp(), "20250224T150405Z");
/// assert_eq!(time.date(), "20250224");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SigningTime {
    timestamp: String,
    date: String,
}

impl SigningTime {
    /// Format the given UTC instant.
    #[must_use]
    pub fn new(instant: DateTime<Utc>) -> Self {
        Self {
            timestamp: instant.format("%Y%m%dT%H%M%SZ").to_string(),
            date: instant.format("%Y%m%d").to_string(),
        }
    }

    /// ISO 8601 basic timestamp (`YYYYMMDDThhmmssZ`).
    #[must_use]
    pub fn timestamp(&self) -> &str {
        &self.timestamp
    }

    /// Date stamp (`YYYYMMDD`).
    #[must_use]
    pub fn date(&self) -> &str {
        &self.date
    }
}

impl From<DateTime<Utc>> for SigningTime {
    fn from(instant: DateTime<Utc>) -> Self {
        Self::new(instant)
    }
}

/// Where a signed request is addressed.
///
/// `host` is the value of the signed `host` header and `path` is the already
/// encoded canonical URI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SigningTarget {
    /// URL scheme, `https` for the real service.
    pub scheme: String,
    /// Host (and optional port) the request is sent to.
    pub host: String,
    /// Encoded absolute path, starting with `/`.
    pub path: String,
}

impl SigningTarget {
    /// Virtual-hosted-style target: `https://<bucket>.s3.<region>.amazonaws.com/<key>`.
    ///
    /// # Examples
    ///
    /// ```
    /// use s3link_sigv4::SigningTarget;
    ///
    /// let target = SigningTarget::virtual_hosted("testbucket", "us-test-1", "test.txt");
    /// assert_eq!(target.url(), "https://testbucket.s3.us-test-1.amazonaws.com/test.txt");
    /// ```
    #[must_use]
    pub fn virtual_hosted(bucket: &str, region: &str, object_key: &str) -> Self {
        Self {
            scheme: "https".to_owned(),
            host: format!("{bucket}.s3.{region}.amazonaws.com"),
            path: encode_object_key(object_key),
        }
    }

    /// Path-style target against a custom endpoint: `<scheme>://<host>/<bucket>/<key>`.
    ///
    /// # Examples
    ///
    /// ```
    /// use s3link_sigv4::SigningTarget;
    ///
    /// let target = SigningTarget::path_style("http", "localhost:4566", "bucket", "a b.txt");
    /// assert_eq!(target.url(), "http://localhost:4566/bucket/a%20b.txt");
    /// ```
    #[must_use]
    pub fn path_style(scheme: &str, host: &str, bucket: &str, object_key: &str) -> Self {
        Self {
            scheme: scheme.to_owned(),
            host: host.to_owned(),
            path: format!("{}{}", encode_object_key(bucket), encode_object_key(object_key)),
        }
    }

    /// The full URL without a query string.
    #[must_use]
    pub fn url(&self) -> String {
        format!("{}://{}{}", self.scheme, self.host, self.path)
    }
}

/// Headers produced by signing an upload.
///
/// All four values must be sent with the request exactly as returned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadSignature {
    /// Value for the `Host` header.
    pub host: String,
    /// Value for the `x-amz-date` header.
    pub amz_date: String,
    /// Value for the `x-amz-content-sha256` header (hex SHA-256 of the payload).
    pub content_sha256: String,
    /// Value for the `Authorization` header.
    pub authorization: String,
}

/// Signs object storage requests with a fixed set of credentials.
///
/// The signer holds no mutable state; it is safe to share across threads and
/// every call derives its inputs from the arguments only.
#[derive(Debug, Clone)]
pub struct RequestSigner {
    credentials: Credentials,
    region: String,
    service: String,
}

impl RequestSigner {
    /// Create a signer for the `s3` service in the given region.
    pub fn new(credentials: Credentials, region: impl Into<String>) -> Self {
        Self {
            credentials,
            region: region.into(),
            service: DEFAULT_SERVICE.to_owned(),
        }
    }

    /// The credential scope for a date: `date/region/service/aws4_request`.
    #[must_use]
    pub fn credential_scope(&self, date: &str) -> String {
        format!("{date}/{}/{}/{SCOPE_TERMINATOR}", self.region, self.service)
    }

    /// Build a presigned GET URL for the target, valid for `expires` seconds.
    ///
    /// Neither the object's existence nor the expiry range is checked; the
    /// storage service enforces both when the URL is used.
    #[must_use]
    pub fn presign_url(&self, time: &SigningTime, target: &SigningTarget, expires: i64) -> String {
        let scope = self.credential_scope(time.date());
        let credential = format!("{}/{scope}", self.credentials.access_key_id());
        let expires = expires.to_string();

        let canonical_query = build_canonical_query_string(&[
            ("X-Amz-Algorithm", ALGORITHM),
            ("X-Amz-Content-Sha256", UNSIGNED_PAYLOAD),
            ("X-Amz-Credential", credential.as_str()),
            ("X-Amz-Date", time.timestamp()),
            ("X-Amz-Expires", expires.as_str()),
            ("X-Amz-SignedHeaders", "host"),
        ]);

        let canonical_request = build_canonical_request(
            "GET",
            &target.path,
            &canonical_query,
            &[("host", target.host.as_str())],
            "host",
            UNSIGNED_PAYLOAD,
        );

        let signature = self.sign_canonical_request(time, &canonical_request);

        format!("{}?{canonical_query}&X-Amz-Signature={signature}", target.url())
    }

    /// Compute the upload headers for a PUT of `payload` to the target.
    #[must_use]
    pub fn sign_upload(
        &self,
        time: &SigningTime,
        target: &SigningTarget,
        payload: &[u8],
    ) -> UploadSignature {
        let content_sha256 = hash_payload(payload);
        let headers = [
            ("host", target.host.as_str()),
            ("x-amz-content-sha256", content_sha256.as_str()),
            ("x-amz-date", time.timestamp()),
        ];
        let signed_headers =
            build_signed_headers_string(&headers.iter().map(|(name, _)| *name).collect::<Vec<_>>());

        let canonical_request = build_canonical_request(
            "PUT",
            &target.path,
            "",
            &headers,
            &signed_headers,
            &content_sha256,
        );

        let signature = self.sign_canonical_request(time, &canonical_request);
        let authorization = format!(
            "{ALGORITHM} Credential={}/{}, SignedHeaders={signed_headers}, Signature={signature}",
            self.credentials.access_key_id(),
            self.credential_scope(time.date()),
        );

        UploadSignature {
            host: target.host.clone(),
            amz_date: time.timestamp().to_owned(),
            content_sha256,
            authorization,
        }
    }

    /// Build a signed PUT request carrying `payload` as its body.
    ///
    /// # Errors
    ///
    /// Returns [`SigningError::InvalidRequest`] if the target cannot be expressed
    /// as a URI or a header value.
    pub fn sign_put(
        &self,
        time: &SigningTime,
        target: &SigningTarget,
        payload: Bytes,
    ) -> Result<http::Request<Bytes>, SigningError> {
        let signature = self.sign_upload(time, target, &payload);

        let request = http::Request::builder()
            .method(http::Method::PUT)
            .uri(target.url())
            .header(http::header::HOST, signature.host)
            .header("x-amz-date", signature.amz_date)
            .header("x-amz-content-sha256", signature.content_sha256)
            .header(http::header::AUTHORIZATION, signature.authorization)
            .body(payload)?;

        Ok(request)
    }

    /// Hash the canonical request, build the string to sign, and sign it.
    fn sign_canonical_request(&self, time: &SigningTime, canonical_request: &str) -> String {
        debug!(canonical_request, "Built canonical request");

        let canonical_hash = hash_payload(canonical_request.as_bytes());
        let scope = self.credential_scope(time.date());
        let string_to_sign = build_string_to_sign(time.timestamp(), &scope, &canonical_hash);

        debug!(string_to_sign, "Built string to sign");

        let signing_key = derive_signing_key(
            self.credentials.secret_access_key(),
            time.date(),
            &self.region,
            &self.service,
        );
        compute_signature(&signing_key, &string_to_sign)
    }
}

/// Build the SigV4 string to sign.
///
/// Format:
/// ```text
/// AWS4-HMAC-SHA256\n
/// <ISO8601 timestamp>\n
/// <credential_scope>\n
/// <hex(SHA256(canonical_request))>
/// ```
///
/// # Examples
///
/// ```
/// use s3link_sigv4::signer::build_string_to_sign;
///
/// let sts = build_string_to_sign(
///     "20130524T000000Z",
///     "20130524/us-east-1/s3/aws4_request",
///     "7344ae5b7ee6c3e7e6b0fe0640412a37625d1fbfff95c48bbb2dc43964946972",
/// );
/// assert!(sts.starts_with("AWS4-HMAC-SHA256\n20130524T000000Z\n"));
/// ```
#[must_use]
pub fn build_string_to_sign(
    timestamp: &str,
    credential_scope: &str,
    canonical_request_hash: &str,
) -> String {
    format!("{ALGORITHM}\n{timestamp}\n{credential_scope}\n{canonical_request_hash}")
}

/// Derive the SigV4 signing key using HMAC-SHA256 chain.
///
/// ```text
/// DateKey              = HMAC-SHA256("AWS4" + secret_key, date)
/// DateRegionKey        = HMAC-SHA256(DateKey, region)
/// DateRegionServiceKey = HMAC-SHA256(DateRegionKey, service)
/// SigningKey           = HMAC-SHA256(DateRegionServiceKey, "aws4_request")
/// ```
#[must_use]
pub fn derive_signing_key(secret_key: &str, date: &str, region: &str, service: &str) -> Vec<u8> {
    let date_key = hmac_sha256(format!("AWS4{secret_key}").as_bytes(), date.as_bytes());
    let date_region_key = hmac_sha256(&date_key, region.as_bytes());
    let date_region_service_key = hmac_sha256(&date_region_key, service.as_bytes());
    hmac_sha256(&date_region_service_key, SCOPE_TERMINATOR.as_bytes())
}

/// Compute the hex-encoded HMAC-SHA256 signature of `data` using `signing_key`.
#[must_use]
pub fn compute_signature(signing_key: &[u8], data: &str) -> String {
    hex::encode(hmac_sha256(signing_key, data.as_bytes()))
}
