//! Integration tests for the s3link server.
//!
//! These tests require a running s3link server (default `http://localhost:8080`)
//! configured against a real or emulated S3 bucket. They are marked `#[ignore]`
//! so they don't run during normal `cargo test`.
//!
//! Run them with:
//! ```text
//! S3LINK_SERVER_URL=http://localhost:8080 cargo test -p s3link-integration -- --ignored
//! ```

use std::sync::Once;

use bytes::Bytes;

static INIT: Once = Once::new();

/// Initialize tracing (once).
fn init_tracing() {
    INIT.call_once(|| {
        tracing_subscriber::fmt()
            .with_env_filter(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
            )
            .with_test_writer()
            .init();
    });
}

/// Base URL of the server under test.
#[must_use]
pub fn server_url() -> String {
    std::env::var("S3LINK_SERVER_URL").unwrap_or_else(|_| "http://localhost:8080".to_owned())
}

/// Build a server URL for `path` with URL-encoded query parameters.
#[must_use]
pub fn endpoint(path: &str, params: &[(&str, &str)]) -> reqwest::Url {
    reqwest::Url::parse_with_params(&format!("{}{path}", server_url()), params)
        .expect("valid server URL")
}

/// Create an HTTP client for talking to the server and to presigned URLs.
#[must_use]
pub fn http_client() -> reqwest::Client {
    init_tracing();
    reqwest::Client::new()
}

/// Generate a unique filename for a test.
#[must_use]
pub fn test_filename(prefix: &str) -> String {
    let id = uuid::Uuid::new_v4().to_string()[..8].to_owned();
    format!("{prefix}-{id}.txt")
}

/// Upload `body` through the server and return the object key.
pub async fn upload(client: &reqwest::Client, filename: &str, body: Bytes) -> String {
    let resp = client
        .post(endpoint("/upload-to-s3", &[("filename", filename)]))
        .header("content-type", "application/octet-stream")
        .body(body)
        .send()
        .await
        .expect("upload request");

    let status = resp.status();
    let text = resp.text().await.expect("upload response body");
    assert!(status.is_success(), "upload failed with {status}: {text}");

    let json: serde_json::Value = serde_json::from_str(&text).expect("upload response json");
    let key = json["objectKey"]
        .as_str()
        .unwrap_or_else(|| panic!("objectKey not found in upload response: {text}"));
    tracing::info!(object_key = %key, "uploaded test object");
    key.to_owned()
}

/// Ask the server for a presigned download URL.
pub async fn presign(client: &reqwest::Client, object_key: &str, expires: i64) -> String {
    let expires = expires.to_string();
    let resp = client
        .get(endpoint(
            "/get-presigned-s3-url",
            &[("objectKey", object_key), ("expires", &expires)],
        ))
        .send()
        .await
        .expect("presign request");

    let status = resp.status();
    let text = resp.text().await.expect("presign response body");
    assert!(status.is_success(), "presign failed with {status}: {text}");

    let json: serde_json::Value = serde_json::from_str(&text).expect("presign response json");
    json["presignedURL"]
        .as_str()
        .unwrap_or_else(|| panic!("presignedURL not found in presign response: {text}"))
        .to_owned()
}

mod test_front_door;
mod test_roundtrip;
