//! =======================================================
//! URL TOKEN CODEC: upstream URL <-> path segment
//! =======================================================
//!
//! The path after the proxy's own host must embed the target upstream URL,
//! so the scheme separator is folded away:
//!
//!   http://example.com/data  ->  http%3A/example.com/data
//!
//! Only the scheme part is percent-encoded (it can then never contain '/'),
//! the rest of the URL is carried verbatim. URLs with extra unescaped "//"
//! sequences in the path are outside the contract.

use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, percent_decode_str, utf8_percent_encode};

// Mirrors the urllib quote() default set: alphanumerics plus `_.-~` stay.
const SCHEME_SET: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'_')
    .remove(b'.')
    .remove(b'-')
    .remove(b'~');

/// Encode an absolute URL into a path-safe token.
pub fn pack_url(url: &str) -> anyhow::Result<String> {
    let Some((scheme, rest)) = url.split_once("//") else {
        anyhow::bail!("URL '{url}' has no scheme separator");
    };

    let quoted = utf8_percent_encode(scheme, SCHEME_SET);
    Ok(format!("{quoted}/{rest}"))
}

/// Decode a path token back into the absolute upstream URL.
pub fn unpack_url(token: &str) -> anyhow::Result<String> {
    let (quoted_scheme, rest) = token.split_once('/').unwrap_or((token, ""));

    let scheme = percent_decode_str(quoted_scheme)
        .decode_utf8()
        .map_err(|e| anyhow::anyhow!("URL token '{token}' has a malformed scheme: {e}"))?;

    Ok(format!("{scheme}//{rest}"))
}

#[cfg(test)]
mod tests {
    use super::{pack_url, unpack_url};

    #[test]
    fn pack_encodes_the_scheme_only() {
        let token = pack_url("http://example.com/data?id=5").expect("pack");
        assert_eq!(token, "http%3A/example.com/data?id=5");
    }

    #[test]
    fn round_trip_preserves_the_url() {
        for url in [
            "http://example.com/data?id=5",
            "https://simbad.u-strasbg.fr/simbad/sim-script",
            "ftp://archive.example.org/fits/image.fits",
            "http://vizier.u-strasbg.fr/viz-bin/votable?-source=II/246",
        ] {
            let token = pack_url(url).expect("pack");
            assert_eq!(unpack_url(&token).expect("unpack"), url);
        }
    }

    #[test]
    fn unpack_accepts_a_bare_scheme() {
        assert_eq!(unpack_url("http%3A").expect("unpack"), "http://");
    }

    #[test]
    fn pack_rejects_urls_without_scheme_separator() {
        assert!(pack_url("example.com/data").is_err());
    }
}
