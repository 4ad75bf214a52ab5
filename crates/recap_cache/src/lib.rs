//! Request fingerprinting and the disk-backed response store.
//!
//! A fingerprint is an MD5 hex digest over the request path and its
//! parameters; the store keeps one immutable file per fingerprint holding
//! the raw recorded response bytes.

mod key;
mod store;

pub use key::{CacheKey, Fingerprint, KeyParams};
pub use store::{DiskStore, StoreError};
