//! Record/replay proxy handler.
//!
//! The request path embeds a real upstream URL as a token. On the first
//! request the proxy performs the real call and records the raw response
//! body under a fingerprint of the request; every later identical request
//! is answered from disk without touching the network.

mod classify;
mod proxy;
mod token;
mod upstream;

pub use classify::{RequestKind, classify};
pub use proxy::Proxy;
pub use token::{pack_url, unpack_url};
pub use upstream::UpstreamClient;
