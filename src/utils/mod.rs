//! Internal utility helpers for storage paths, query escaping, and serde helpers.

pub(crate) mod query;
pub(crate) mod serde;
pub(crate) mod storage;
