//! Endpoint handlers for upload and presign.
//!
//! Handlers receive the already collected body and the raw query string,
//! validate their parameters, and call into the [`ObjectStore`]. Validation
//! failures never reach the store.

use bytes::Bytes;
use http_body_util::Full;
use s3link_core::ObjectStore;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

/// Body of every front door response: a JSON document or a short message,
/// always fully buffered.
pub type ResponseBody = Full<Bytes>;

/// Body of a successful upload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadResponse {
    /// Key the payload was stored under.
    #[serde(rename = "objectKey")]
    pub object_key: String,
}

/// Body of a successful presign request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PresignResponse {
    /// Time-limited download URL.
    #[serde(rename = "presignedURL")]
    pub presigned_url: String,
}

/// Store the request body and answer with its object key.
///
/// The optional `filename` query parameter becomes the key suffix.
pub async fn handle_upload<S: ObjectStore + ?Sized>(
    store: &S,
    query: Option<&str>,
    body: Bytes,
) -> http::Response<ResponseBody> {
    let filename = query_param(query, "filename");
    let size = body.len();

    match store.upload(body, filename).await {
        Ok(object_key) => {
            info!(object_key = %object_key, size, "Upload completed");
            json_response(&UploadResponse { object_key })
        }
        Err(err) => {
            warn!(error = %err, "Upload failed");
            text_response(http::StatusCode::INTERNAL_SERVER_ERROR, err.to_string())
        }
    }
}

/// Answer with a presigned download URL.
///
/// Requires `objectKey` and a signed 64-bit integer `expires`.
pub fn handle_presign<S: ObjectStore + ?Sized>(
    store: &S,
    query: Option<&str>,
) -> http::Response<ResponseBody> {
    let Some(object_key) = query_param(query, "objectKey") else {
        return bad_request("Missing objectKey parameter");
    };
    let Some(expires) = query_param(query, "expires") else {
        return bad_request("Missing expires parameter");
    };
    let Ok(expires) = expires.parse::<i64>() else {
        return bad_request("Invalid expires parameter");
    };

    let presigned_url = store.presign_url(&object_key, expires);
    json_response(&PresignResponse { presigned_url })
}

/// First non-empty value of `name` in a URL-encoded query string.
fn query_param(query: Option<&str>, name: &str) -> Option<String> {
    form_urlencoded::parse(query?.as_bytes())
        .find(|(k, _)| k == name)
        .map(|(_, v)| v.into_owned())
        .filter(|v| !v.is_empty())
}

fn bad_request(message: &'static str) -> http::Response<ResponseBody> {
    warn!(message, "Rejected presign request");
    text_response(http::StatusCode::BAD_REQUEST, message)
}

/// Serialize `value` into a `200 OK` JSON response.
pub(crate) fn json_response<T: Serialize>(value: &T) -> http::Response<ResponseBody> {
    match serde_json::to_vec(value) {
        Ok(json) => http::Response::builder()
            .status(http::StatusCode::OK)
            .header(http::header::CONTENT_TYPE, "application/json")
            .body(Full::new(Bytes::from(json)))
            .expect("static JSON response should be valid"),
        Err(err) => text_response(http::StatusCode::INTERNAL_SERVER_ERROR, err.to_string()),
    }
}

/// Plain-text response with the given status.
pub(crate) fn text_response(
    status: http::StatusCode,
    message: impl Into<String>,
) -> http::Response<ResponseBody> {
    http::Response::builder()
        .status(status)
        .header(http::header::CONTENT_TYPE, "text/plain; charset=utf-8")
        .body(Full::new(Bytes::from(message.into())))
        .expect("static text response should be valid")
}

#[cfg(test)]
pub(crate) mod tests {
    use std::future::Future;
    use std::pin::Pin;

    use http_body_util::BodyExt;
    use parking_lot::Mutex;
    use s3link_core::StorageError;

    use super::*;

    /// In-memory store that records calls and returns canned answers.
    #[derive(Debug, Default)]
    pub(crate) struct FakeStore {
        pub(crate) fail_upload: bool,
        pub(crate) uploads: Mutex<Vec<(Bytes, Option<String>)>>,
        pub(crate) presigns: Mutex<Vec<(String, i64)>>,
    }

    impl ObjectStore for FakeStore {
        fn upload(
            &self,
            data: Bytes,
            filename: Option<String>,
        ) -> Pin<Box<dyn Future<Output = Result<String, StorageError>> + Send + '_>> {
            Box::pin(async move {
                let key = format!(
                    "uploaded-{}",
                    filename.as_deref().unwrap_or("default_filename")
                );
                self.uploads.lock().push((data, filename));
                if self.fail_upload {
                    return Err(StorageError::Rejected {
                        status: 403,
                        body: "AccessDenied".to_owned(),
                    });
                }
                Ok(key)
            })
        }

        fn presign_url(&self, object_key: &str, expires: i64) -> String {
            self.presigns.lock().push((object_key.to_owned(), expires));
            format!("http://example.com/{object_key}?expires={expires}")
        }
    }

    pub(crate) async fn body_string(response: http::Response<ResponseBody>) -> String {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[tokio::test]
    async fn test_should_upload_and_return_object_key() {
        let store = FakeStore::default();
        let response = handle_upload(
            &store,
            Some("filename=test.txt"),
            Bytes::from_static(b"file content"),
        )
        .await;

        assert_eq!(response.status(), http::StatusCode::OK);
        assert_eq!(
            response.headers()[http::header::CONTENT_TYPE],
            "application/json"
        );
        let parsed: UploadResponse = serde_json::from_str(&body_string(response).await).unwrap();
        assert_eq!(parsed.object_key, "uploaded-test.txt");

        let uploads = store.uploads.lock();
        assert_eq!(uploads.len(), 1);
        assert_eq!(uploads[0].0.as_ref(), b"file content");
        assert_eq!(uploads[0].1.as_deref(), Some("test.txt"));
    }

    #[tokio::test]
    async fn test_should_pass_missing_filename_as_none() {
        let store = FakeStore::default();
        let _ = handle_upload(&store, None, Bytes::new()).await;
        let _ = handle_upload(&store, Some("filename="), Bytes::new()).await;

        let uploads = store.uploads.lock();
        assert!(uploads.iter().all(|(_, name)| name.is_none()));
    }

    #[tokio::test]
    async fn test_should_decode_filename_parameter() {
        let store = FakeStore::default();
        let _ = handle_upload(&store, Some("filename=my%20file.txt"), Bytes::new()).await;
        assert_eq!(store.uploads.lock()[0].1.as_deref(), Some("my file.txt"));
    }

    #[tokio::test]
    async fn test_should_map_storage_failure_to_internal_error() {
        let store = FakeStore {
            fail_upload: true,
            ..FakeStore::default()
        };
        let response = handle_upload(&store, Some("filename=a.txt"), Bytes::new()).await;
        assert_eq!(response.status(), http::StatusCode::INTERNAL_SERVER_ERROR);
        assert!(body_string(response).await.contains("403"));
    }

    #[tokio::test]
    async fn test_should_presign_with_valid_parameters() {
        let store = FakeStore::default();
        let response = handle_presign(&store, Some("objectKey=test.txt&expires=3600"));

        assert_eq!(response.status(), http::StatusCode::OK);
        let json: serde_json::Value = serde_json::from_str(&body_string(response).await).unwrap();
        assert_eq!(
            json["presignedURL"],
            "http://example.com/test.txt?expires=3600"
        );
        assert_eq!(store.presigns.lock()[0], ("test.txt".to_owned(), 3600));
    }

    #[tokio::test]
    async fn test_should_reject_missing_object_key() {
        let store = FakeStore::default();
        for query in [None, Some("expires=3600"), Some("objectKey=&expires=3600")] {
            let response = handle_presign(&store, query);
            assert_eq!(response.status(), http::StatusCode::BAD_REQUEST);
            assert_eq!(body_string(response).await, "Missing objectKey parameter");
        }
        assert!(store.presigns.lock().is_empty());
    }

    #[tokio::test]
    async fn test_should_reject_missing_expires() {
        let store = FakeStore::default();
        let response = handle_presign(&store, Some("objectKey=test.txt"));
        assert_eq!(response.status(), http::StatusCode::BAD_REQUEST);
        assert_eq!(body_string(response).await, "Missing expires parameter");
    }

    #[tokio::test]
    async fn test_should_reject_non_integer_expires() {
        let store = FakeStore::default();
        for expires in ["notanumber", "1.5", "99999999999999999999"] {
            let query = format!("objectKey=test.txt&expires={expires}");
            let response = handle_presign(&store, Some(&query));
            assert_eq!(response.status(), http::StatusCode::BAD_REQUEST);
            assert_eq!(body_string(response).await, "Invalid expires parameter");
        }
        assert!(store.presigns.lock().is_empty());
    }

    #[tokio::test]
    async fn test_should_pass_negative_expires_through() {
        let store = FakeStore::default();
        let response = handle_presign(&store, Some("objectKey=k&expires=-5"));
        assert_eq!(response.status(), http::StatusCode::OK);
        assert_eq!(store.presigns.lock()[0].1, -5);
    }
}
