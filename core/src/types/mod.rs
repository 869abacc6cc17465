//! Request and response shapes for the lakehouse service.
//!
//! # Design
//! Response types accept unknown fields and default every member the service
//! may omit, so older clients keep working against newer services. Request
//! types skip `None` members, so an absent option never reaches the wire.
//! `*Patch` types describe partial updates and convert into JSON Patch
//! documents.

pub mod buckets;
pub mod catalog;
pub mod databases;
pub mod engines;

use serde::{Deserialize, Serialize};

pub use buckets::*;
pub use catalog::*;
pub use databases::*;
pub use engines::*;

/// Acknowledgement returned by action endpoints.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SuccessResponse {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub message_code: Option<String>,
}

/// Body of operations documented to return nothing. Any JSON object is
/// accepted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
pub struct Empty {}
