//! URL canonicalization
//!
//! Annotations are attached to pages, and the same page is reachable through
//! many URL spellings (tracking parameters, fragments, protocol variants).
//! Both services key page identity on a standardized form of the URL:
//! `standardize_url` keeps the scheme (display form), `standardize_url_id`
//! drops it (identity key stored in the `url_id` columns).

use url::form_urlencoded;

/// Query parameters dropped during standardization
const OMITTED_QUERY_VARS: &[&str] = &[
    // Universal Tracking Module convention names
    "utm_campaign",
    "utm_medium",
    "utm_term",
    "utm_name",
    "utm_source",
    // General convention for references
    "ref",
];

/// Standardize a URL, keeping the scheme when one is present.
///
/// - drops the fragment (anchor)
/// - drops denylisted tracking query parameters
/// - defaults an empty path to `/`
/// - drops `?` when no query parameters survive
/// - empty input yields empty output
pub fn standardize_url(data: &str) -> String {
    standardize(data, true)
}

/// Standardize a URL into a scheme-less identity key.
///
/// Same transformation as [`standardize_url`], additionally ignoring the
/// protocol so `http://` and `https://` spellings collapse to one key.
pub fn standardize_url_id(data: &str) -> String {
    standardize(data, false)
}

fn standardize(data: &str, keep_scheme: bool) -> String {
    if data.is_empty() {
        return String::new();
    }

    let parts = split_url(data);
    let query = filter_query(parts.query);

    let mut out = String::new();
    if keep_scheme {
        if let Some(scheme) = parts.scheme {
            out.push_str(&scheme.to_ascii_lowercase());
            out.push_str("://");
        }
    }
    out.push_str(parts.netloc);
    if parts.path.is_empty() {
        out.push('/');
    } else {
        out.push_str(parts.path);
    }
    if !query.is_empty() {
        out.push('?');
        out.push_str(&query);
    }
    out
}

/// Re-encode the query string without denylisted or blank-valued pairs,
/// preserving the order of the survivors.
fn filter_query(query: &str) -> String {
    let mut serializer = form_urlencoded::Serializer::new(String::new());
    let mut any = false;
    for (name, value) in form_urlencoded::parse(query.as_bytes()) {
        if value.is_empty() || OMITTED_QUERY_VARS.contains(&name.as_ref()) {
            continue;
        }
        serializer.append_pair(&name, &value);
        any = true;
    }
    if any {
        serializer.finish()
    } else {
        String::new()
    }
}

struct SplitUrl<'a> {
    scheme: Option<&'a str>,
    netloc: &'a str,
    path: &'a str,
    query: &'a str,
}

/// Split a URL string into scheme / netloc / path / query, discarding the
/// fragment. Lenient: scheme-less and netloc-less inputs are legal, the
/// pieces simply come back empty.
fn split_url(data: &str) -> SplitUrl<'_> {
    let without_fragment = match data.find('#') {
        Some(i) => &data[..i],
        None => data,
    };
    let (rest, query) = match without_fragment.find('?') {
        Some(i) => (&without_fragment[..i], &without_fragment[i + 1..]),
        None => (without_fragment, ""),
    };
    let (scheme, rest) = match rest.find(':') {
        Some(i) if is_scheme(&rest[..i]) => (Some(&rest[..i]), &rest[i + 1..]),
        _ => (None, rest),
    };
    let (netloc, path) = match rest.strip_prefix("//") {
        Some(r) => match r.find('/') {
            Some(i) => (&r[..i], &r[i..]),
            None => (r, ""),
        },
        None => ("", rest),
    };
    SplitUrl {
        scheme,
        netloc,
        path,
        query,
    }
}

/// A scheme is a letter followed by letters, digits, `+`, `-` or `.`
fn is_scheme(s: &str) -> bool {
    let mut chars = s.chars();
    matches!(chars.next(), Some(c) if c.is_ascii_alphabetic())
        && chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
}
