//! List filtering helpers for the annotations endpoint
//!
//! The page URL can arrive either as a `url` query parameter or through the
//! `PP-SITE-URL` header (browsing history is sensitive, so the extension
//! prefers the header). Sending both with different values is an error.

use axum::http::HeaderMap;

use pp_common::consts::CheckStatus;
use pp_common::urlnorm::standardize_url_id;

use crate::jsonapi::ApiError;

/// Header carrying the page URL
pub const SITE_URL_HEADER: &str = "PP-SITE-URL";

/// Resolve the URL filter into a standardized `url_id` key, if any was sent
pub fn resolve_url_filter(
    headers: &HeaderMap,
    query_url: Option<&str>,
) -> Result<Option<String>, ApiError> {
    let header_url = headers
        .get(SITE_URL_HEADER)
        .and_then(|value| value.to_str().ok())
        .filter(|value| !value.is_empty());

    let filter_value = match (header_url, query_url.filter(|v| !v.is_empty())) {
        (Some(header), Some(param)) if header != param => {
            return Err(ApiError::validation(
                "url",
                "Different URLs specified via header and via params; please use only one of these",
            ));
        }
        (header, param) => header.or(param),
    };

    Ok(filter_value.map(standardize_url_id))
}

/// Parse the comma-separated `check_status` OR-filter, validating each code
pub fn parse_check_statuses(raw: Option<&str>) -> Result<Vec<String>, ApiError> {
    let Some(raw) = raw.filter(|v| !v.is_empty()) else {
        return Ok(Vec::new());
    };

    let mut statuses = Vec::new();
    for code in raw.split(',') {
        match CheckStatus::from_str(code) {
            Some(status) => statuses.push(status.as_str().to_string()),
            None => {
                return Err(ApiError::validation(
                    "check_status",
                    &format!("'{}' is not a valid check status", code),
                ));
            }
        }
    }
    Ok(statuses)
}

/// Whitelisted orderings for the annotations list
pub fn parse_ordering(raw: Option<&str>) -> Result<&'static str, ApiError> {
    match raw.unwrap_or("-create_date") {
        "create_date" => Ok("create_date ASC"),
        "-create_date" => Ok("create_date DESC"),
        "id" => Ok("guid ASC"),
        "-id" => Ok("guid DESC"),
        other => Err(ApiError::validation(
            "ordering",
            &format!("'{}' is not a valid ordering", other),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers_with(url: Option<&str>) -> HeaderMap {
        let mut headers = HeaderMap::new();
        if let Some(url) = url {
            headers.insert(SITE_URL_HEADER, HeaderValue::from_str(url).unwrap());
        }
        headers
    }

    #[test]
    fn test_url_filter_from_query_param() {
        let filter = resolve_url_filter(&headers_with(None), Some("http://example.com/a")).unwrap();
        assert_eq!(filter.as_deref(), Some("example.com/a"));
    }

    #[test]
    fn test_url_filter_from_header() {
        let filter =
            resolve_url_filter(&headers_with(Some("https://example.com/a#x")), None).unwrap();
        assert_eq!(filter.as_deref(), Some("example.com/a"));
    }

    #[test]
    fn test_conflicting_url_sources_rejected() {
        let result = resolve_url_filter(
            &headers_with(Some("http://example.com/a")),
            Some("http://example.com/b"),
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_identical_url_in_both_sources_accepted() {
        let filter = resolve_url_filter(
            &headers_with(Some("http://example.com/a")),
            Some("http://example.com/a"),
        )
        .unwrap();
        assert_eq!(filter.as_deref(), Some("example.com/a"));
    }

    #[test]
    fn test_no_url_filter() {
        assert_eq!(resolve_url_filter(&headers_with(None), None).unwrap(), None);
    }

    #[test]
    fn test_check_status_list() {
        let statuses = parse_check_statuses(Some("UNVERIFIED,CONFIRMED")).unwrap();
        assert_eq!(statuses, vec!["UNVERIFIED", "CONFIRMED"]);
    }

    #[test]
    fn test_check_status_invalid_code() {
        assert!(parse_check_statuses(Some("NOT_A_STATUS")).is_err());
    }

    #[test]
    fn test_ordering_default_and_whitelist() {
        assert_eq!(parse_ordering(None).unwrap(), "create_date DESC");
        assert_eq!(parse_ordering(Some("id")).unwrap(), "guid ASC");
        assert!(parse_ordering(Some("comment")).is_err());
    }
}
