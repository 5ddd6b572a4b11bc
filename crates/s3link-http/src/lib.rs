//! HTTP front door for s3link.
//!
//! - **Handlers** ([`handler`]): the upload and presign endpoints, their
//!   parameter validation, JSON response types and the buffered
//!   [`ResponseBody`](handler::ResponseBody).
//! - **Service** ([`service`]): [`S3LinkHttpService`](service::S3LinkHttpService),
//!   the hyper `Service` that routes by path and method and stamps common
//!   response headers.
//!
//! # Usage
//!
//! ```rust,no_run
//! use s3link_core::{S3LinkConfig, StorageClient};
//! use s3link_http::service::S3LinkHttpService;
//!
//! let config = S3LinkConfig::from_env().unwrap();
//! let client = StorageClient::from_config(&config).unwrap();
//! let service = S3LinkHttpService::new(client);
//! // Use `service` with hyper server.
//! ```

pub mod handler;
pub mod service;
