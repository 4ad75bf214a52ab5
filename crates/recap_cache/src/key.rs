use std::fmt;

/// The logical (path, parameters) pair hashed into a [`Fingerprint`].
#[derive(Debug)]
pub struct CacheKey<'a> {
    pub path: &'a str,
    pub params: KeyParams<'a>,
}

/// Parameter component of a cache key, one variant per request kind.
///
/// The variant tag is fed into the hash ahead of the path, so GET-derived
/// and POST-derived keys can never share a fingerprint file even when their
/// parameter bytes coincide.
#[derive(Debug)]
pub enum KeyParams<'a> {
    /// Raw POST body, hashed verbatim.
    RawBody(&'a [u8]),
    /// JSON POST body, hashed verbatim.
    Json(&'a [u8]),
    /// Form-encoded POST fields, in wire order.
    Form(&'a [(String, String)]),
    /// Query-string parameters, in wire order.
    Query(&'a [(String, String)]),
}

impl KeyParams<'_> {
    // No tag is a prefix of another, which keeps the key spaces disjoint
    // under plain byte concatenation.
    fn tag(&self) -> &'static [u8] {
        match self {
            KeyParams::RawBody(_) => b"raw",
            KeyParams::Json(_) => b"json",
            KeyParams::Form(_) => b"form",
            KeyParams::Query(_) => b"query",
        }
    }
}

impl CacheKey<'_> {
    /// Hash the key components in a fixed order: kind tag, path, then the
    /// parameters exactly as they arrived on the wire.
    ///
    /// Parameter insertion order is deliberately significant: `?a=1&b=2`
    /// and `?b=2&a=1` may fingerprint differently. Callers relying on hits
    /// must replay requests byte-identically, which is how the recorded
    /// test suites use this proxy.
    pub fn fingerprint(&self) -> Fingerprint {
        let mut ctx = md5::Context::new();
        ctx.consume(self.params.tag());
        ctx.consume(self.path.as_bytes());

        match &self.params {
            KeyParams::RawBody(body) | KeyParams::Json(body) => ctx.consume(body),
            KeyParams::Form(pairs) | KeyParams::Query(pairs) => {
                for (k, v) in pairs.iter() {
                    ctx.consume(k.as_bytes());
                    ctx.consume(v.as_bytes());
                }
            }
        }

        Fingerprint(format!("{:x}", ctx.compute()))
    }
}

/// Lowercase hex MD5 digest; doubles as the cache entry's filename.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Fingerprint(String);

impl Fingerprint {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
