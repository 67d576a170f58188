//! Service layer for grouped item storage.
//! - `fingerprint`: content-derived item ids.
//! - `storage`: the per-group hash store abstraction and its backends.
//! - `items`: request validation and the upsert/delete/list operations.

pub mod errors;
pub mod fingerprint;
pub mod items;
pub mod storage;
