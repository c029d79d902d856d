//! Reports are computed fresh on every request: pick a window, pull the matching
//! records out of storage, fold them into a [summary::Summary]. Nothing here is cached
//! or persisted.

pub mod aggregate;
pub mod service;
pub mod summary;
