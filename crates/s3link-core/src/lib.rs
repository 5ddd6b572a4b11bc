//! Configuration, injected capabilities, and the object storage client for s3link.
//!
//! # Modules
//!
//! - [`capability`] - Clock and identifier sources, with fixed test doubles
//! - [`client`] - [`StorageClient`] and the [`ObjectStore`] trait
//! - [`config`] - Environment-driven configuration
//! - [`error`] - Configuration and storage error types

pub mod capability;
pub mod client;
pub mod config;
pub mod error;

pub use capability::{
    Clock, FixedClock, FixedIdGenerator, IdGenerator, SystemClock, UuidGenerator,
};
pub use client::{DEFAULT_FILENAME, ObjectStore, StorageClient};
pub use config::S3LinkConfig;
pub use error::{ConfigError, StorageError};
