//! The front door hyper service.
//!
//! [`S3LinkHttpService`] routes requests by path and method:
//!
//! | Path | Methods | Handler |
//! |------|---------|---------|
//! | `/upload-to-s3` | `POST`, `PUT` | [`handle_upload`] |
//! | `/get-presigned-s3-url` | `GET` | [`handle_presign`] |
//! | `/health` | `GET` | health check |
//!
//! A known path with another method gets `405`, anything else `404`. Every
//! response carries `x-request-id` and `Server` headers.

use std::convert::Infallible;
use std::fmt::Display;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use bytes::Bytes;
use http_body_util::{BodyExt, Full};
use hyper::body::Incoming;
use hyper::service::Service;
use s3link_core::ObjectStore;
use tracing::{debug, error};
use uuid::Uuid;

use crate::handler::{ResponseBody, handle_presign, handle_upload, text_response};

/// Upload endpoint path.
pub const UPLOAD_PATH: &str = "/upload-to-s3";
/// Presign endpoint path.
pub const PRESIGN_PATH: &str = "/get-presigned-s3-url";
/// Health check path.
pub const HEALTH_PATH: &str = "/health";

const SERVER_NAME: &str = "s3link";

/// The front door service implementing hyper's `Service` trait.
///
/// # Type Parameters
///
/// - `S`: The storage backend implementing [`ObjectStore`].
#[derive(Debug)]
pub struct S3LinkHttpService<S: ObjectStore> {
    store: Arc<S>,
}

impl<S: ObjectStore> S3LinkHttpService<S> {
    /// Create a service owning `store`.
    #[must_use]
    pub fn new(store: S) -> Self {
        Self {
            store: Arc::new(store),
        }
    }
}

impl<S: ObjectStore> Clone for S3LinkHttpService<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
        }
    }
}

impl<S: ObjectStore> Service<http::Request<Incoming>> for S3LinkHttpService<S> {
    type Response = http::Response<ResponseBody>;
    type Error = Infallible;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn call(&self, req: http::Request<Incoming>) -> Self::Future {
        let store = Arc::clone(&self.store);

        Box::pin(async move {
            let request_id = Uuid::new_v4().to_string();
            let response = process_request(req, store.as_ref(), &request_id).await;
            Ok(add_common_headers(response, &request_id))
        })
    }
}

/// Route a request and produce its response.
///
/// The body is only collected for uploads.
pub async fn process_request<S, B>(
    req: http::Request<B>,
    store: &S,
    request_id: &str,
) -> http::Response<ResponseBody>
where
    S: ObjectStore + ?Sized,
    B: http_body::Body<Data = Bytes>,
    B::Error: Display,
{
    let method = req.method().clone();
    let uri = req.uri().clone();
    debug!(%method, %uri, request_id, "Processing request");

    match uri.path() {
        UPLOAD_PATH => {
            if method != http::Method::POST && method != http::Method::PUT {
                return method_not_allowed();
            }
            let body = match req.into_body().collect().await {
                Ok(collected) => collected.to_bytes(),
                Err(err) => {
                    error!(error = %err, request_id, "Failed to read request body");
                    return text_response(
                        http::StatusCode::BAD_REQUEST,
                        "Failed to read request body",
                    );
                }
            };
            handle_upload(store, uri.query(), body).await
        }
        PRESIGN_PATH => {
            if method != http::Method::GET {
                return method_not_allowed();
            }
            handle_presign(store, uri.query())
        }
        HEALTH_PATH => {
            if method != http::Method::GET {
                return method_not_allowed();
            }
            health_check_response()
        }
        _ => text_response(http::StatusCode::NOT_FOUND, "Not Found"),
    }
}

fn method_not_allowed() -> http::Response<ResponseBody> {
    text_response(http::StatusCode::METHOD_NOT_ALLOWED, "Method Not Allowed")
}

fn health_check_response() -> http::Response<ResponseBody> {
    http::Response::builder()
        .status(http::StatusCode::OK)
        .header(http::header::CONTENT_TYPE, "application/json")
        .body(Full::new(Bytes::from_static(br#"{"status":"running"}"#)))
        .expect("static health response should be valid")
}

/// Add `x-request-id` and `Server` to every response.
fn add_common_headers(
    mut response: http::Response<ResponseBody>,
    request_id: &str,
) -> http::Response<ResponseBody> {
    let headers = response.headers_mut();
    if let Ok(hv) = http::header::HeaderValue::from_str(request_id) {
        headers.insert("x-request-id", hv);
    }
    headers.insert(
        http::header::SERVER,
        http::header::HeaderValue::from_static(SERVER_NAME),
    );
    response
}
