use recap_cache::KeyParams;

/// The four mutually exclusive request kinds, resolved once per request.
/// First match wins, in this priority order.
#[derive(Debug)]
pub enum RequestKind {
    /// POST body that is neither a form nor valid JSON.
    RawBody(Vec<u8>),
    /// POST body with a JSON content type that parses.
    Json(Vec<u8>),
    /// Form-encoded POST fields, decoded in wire order.
    Form(Vec<(String, String)>),
    /// No usable body; parameters come from the query string, in wire order.
    Query(Vec<(String, String)>),
}

impl RequestKind {
    /// View of this kind as the parameter component of a cache key.
    pub fn key_params(&self) -> KeyParams<'_> {
        match self {
            RequestKind::RawBody(body) => KeyParams::RawBody(body),
            RequestKind::Json(body) => KeyParams::Json(body),
            RequestKind::Form(pairs) => KeyParams::Form(pairs),
            RequestKind::Query(pairs) => KeyParams::Query(pairs),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            RequestKind::RawBody(_) => "raw-body",
            RequestKind::Json(_) => "json",
            RequestKind::Form(_) => "form",
            RequestKind::Query(_) => "query",
        }
    }
}

fn content_type_is(content_type: Option<&str>, needle: &str) -> bool {
    content_type
        .map(|ct| {
            ct.split(';')
                .next()
                .unwrap_or("")
                .trim()
                .eq_ignore_ascii_case(needle)
        })
        .unwrap_or(false)
}

fn decode_pairs(input: &[u8]) -> Vec<(String, String)> {
    url::form_urlencoded::parse(input)
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect()
}

/// Classify a request into its [`RequestKind`].
///
/// An empty body always falls through to `Query`; a form content type wins
/// over JSON sniffing; a JSON content type whose body does not parse is
/// treated as a raw body.
pub fn classify(content_type: Option<&str>, body: &[u8], query: &str) -> RequestKind {
    if !body.is_empty() {
        if content_type_is(content_type, "application/x-www-form-urlencoded") {
            return RequestKind::Form(decode_pairs(body));
        }
        if content_type_is(content_type, "application/json")
            && serde_json::from_slice::<serde_json::Value>(body).is_ok()
        {
            return RequestKind::Json(body.to_vec());
        }
        return RequestKind::RawBody(body.to_vec());
    }

    RequestKind::Query(decode_pairs(query.as_bytes()))
}
