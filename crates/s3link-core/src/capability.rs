//! Replaceable capabilities injected into the storage client.
//!
//! Signing needs the current instant and uploads need a unique identifier.
//! Both are taken from these traits rather than read globally, so tests can
//! pin them with [`FixedClock`] and [`FixedIdGenerator`].

use chrono::{DateTime, Utc};
use uuid::Uuid;

/// Source of the current UTC instant.
pub trait Clock: Send + Sync {
    /// The current instant.
    fn now(&self) -> DateTime<Utc>;
}

/// Source of unique identifiers used to name uploaded objects.
pub trait IdGenerator: Send + Sync {
    /// Produce a fresh identifier.
    fn generate(&self) -> String;
}

/// Wall-clock time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Random version 4 UUIDs.
#[derive(Debug, Clone, Copy, Default)]
pub struct UuidGenerator;

impl IdGenerator for UuidGenerator {
    fn generate(&self) -> String {
        Uuid::new_v4().to_string()
    }
}

/// A clock that always returns the same instant.
///
/// # Examples
///
/// ```
/// use chrono::{TimeZone, Utc};
/// use s3link_core::capability::{Clock, FixedClock};
///
/// let instant = Utc.with_ymd_and_hms(2025, 2, 24, 15, 4, 5).unwrap();
/// assert_eq!(FixedClock::new(instant).now(), instant);
/// ```
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(DateTime<Utc>);

impl FixedClock {
    /// Create a clock pinned to `instant`.
    #[must_use]
    pub fn new(instant: DateTime<Utc>) -> Self {
        Self(instant)
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}

/// An identifier generator that always returns the same value.
#[derive(Debug, Clone)]
pub struct FixedIdGenerator(String);

impl FixedIdGenerator {
    /// Create a generator that always yields `id`.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }
}

impl IdGenerator for FixedIdGenerator {
    fn generate(&self) -> String {
        self.0.clone()
    }
}
