//! Request builders for every remote call, one `const` [`Operation`] each.
//!
//! These functions do no I/O. Hand the returned builder to
//! [`LakehouseClient::execute`] or, to run the exchange yourself, to
//! [`LakehouseClient::prepare`].
//!
//! [`Operation`]: crate::operation::Operation
//! [`LakehouseClient::execute`]: crate::LakehouseClient::execute
//! [`LakehouseClient::prepare`]: crate::LakehouseClient::prepare

pub mod buckets;
pub mod catalog;
pub mod databases;
pub mod engines;

/// Query parameter scoping catalog calls to the engine that runs them.
pub const ENGINE_ID: &str = "engine_id";
