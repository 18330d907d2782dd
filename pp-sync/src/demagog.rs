//! Demagog API client
//!
//! Three endpoints are consumed: the paginated full statement feed, the
//! per-source statement list, and the sources list. Payloads are JSON:API
//! flavored: statements are `{id, attributes}` objects.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer};
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

/// Identifies this consumer to the Demagog API
const CLIENT_PARAM: &str = "pp";

const REQUEST_TIMEOUT_SECS: u64 = 10;

/// Demagog client errors
#[derive(Debug, Error)]
pub enum DemagogError {
    #[error("Demagog API request error: {0}")]
    Network(String),

    #[error("Demagog API request to {url} unexpected status {status}. Response: {body}")]
    UnexpectedStatus {
        url: String,
        status: u16,
        body: String,
    },

    /// Response parsed but its content is unusable
    #[error("Demagog API data error: {0}")]
    Data(String),
}

/// One fact-checked statement
#[derive(Debug, Clone, Deserialize)]
pub struct Statement {
    /// Integer or alphanumeric hash, normalized to a string
    #[serde(deserialize_with = "id_to_string")]
    pub id: String,
    pub attributes: StatementAttributes,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StatementAttributes {
    /// URL of the checked article
    pub source: String,
    /// The checked claim
    pub text: String,
    /// Fact-check date
    pub date: DateTime<Utc>,
    /// Rating code, lowercase on the wire
    pub rating: String,
    #[serde(default)]
    pub rating_text: Option<String>,
    #[serde(default)]
    pub explanation: Option<String>,
    /// URL of the fact-check article
    pub factchecker_uri: String,
}

/// Accept both integer and string statement ids
fn id_to_string<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawId {
        Int(i64),
        Str(String),
    }

    match RawId::deserialize(deserializer)? {
        RawId::Int(value) => Ok(value.to_string()),
        RawId::Str(value) => Ok(value),
    }
}

/// One page of the full statement feed
#[derive(Debug)]
pub struct StatementsPage {
    pub total_pages: u32,
    pub current_page: u32,
    pub statements: Vec<Statement>,
}

#[derive(Debug, Deserialize)]
struct FeedResponse {
    total_pages: Option<u32>,
    current_page: Option<u32>,
    #[serde(default)]
    data: Vec<Statement>,
}

#[derive(Debug, Deserialize)]
struct StatementsResponse {
    #[serde(default)]
    data: Vec<Statement>,
}

#[derive(Debug, Deserialize)]
struct SourcesResponse {
    data: Option<SourcesData>,
}

#[derive(Debug, Deserialize)]
struct SourcesData {
    attributes: Option<SourcesAttributes>,
}

#[derive(Debug, Deserialize)]
struct SourcesAttributes {
    sources: Option<Vec<String>>,
}

/// Demagog API client
pub struct DemagogClient {
    http_client: reqwest::Client,
    base_url: String,
}

impl DemagogClient {
    pub fn new(base_url: &str) -> Result<Self, DemagogError> {
        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .map_err(|e| DemagogError::Network(e.to_string()))?;

        Ok(Self {
            http_client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    /// One page of the full statement feed: GET `{base}/?page=N&q=all&client=pp`
    pub async fn get_all_statements(&self, page: u32) -> Result<StatementsPage, DemagogError> {
        let url = format!("{}/", self.base_url);
        debug!(url = %url, page, "Querying Demagog statement feed");

        let response: FeedResponse = self
            .get_json(
                &url,
                &[
                    ("page", page.to_string()),
                    ("q", "all".to_string()),
                    ("client", CLIENT_PARAM.to_string()),
                ],
            )
            .await?;

        let (total_pages, current_page) = match (response.total_pages, response.current_page) {
            (Some(total), Some(current)) => (total, current),
            _ => {
                return Err(DemagogError::Data(
                    "no total_pages/current_page".to_string(),
                ))
            }
        };

        validate_statements(&response.data)?;
        Ok(StatementsPage {
            total_pages,
            current_page,
            statements: response.data,
        })
    }

    /// Statements for one source URL: GET `{base}/statements?uri=...&client=pp`
    pub async fn get_statements(&self, source_url: &str) -> Result<Vec<Statement>, DemagogError> {
        let url = format!("{}/statements", self.base_url);
        debug!(url = %url, source = %source_url, "Querying Demagog statements");

        let response: StatementsResponse = self
            .get_json(
                &url,
                &[
                    ("uri", source_url.to_string()),
                    ("client", CLIENT_PARAM.to_string()),
                ],
            )
            .await?;

        validate_statements(&response.data)?;
        Ok(response.data)
    }

    /// All source URLs with fact-checks: GET `{base}/sources_list?client=pp`
    pub async fn get_sources_list(&self) -> Result<Vec<String>, DemagogError> {
        let url = format!("{}/sources_list", self.base_url);
        debug!(url = %url, "Querying Demagog sources list");

        let response: SourcesResponse = self
            .get_json(&url, &[("client", CLIENT_PARAM.to_string())])
            .await?;

        response
            .data
            .and_then(|data| data.attributes)
            .and_then(|attributes| attributes.sources)
            .ok_or_else(|| DemagogError::Data("malformed sources list".to_string()))
    }

    async fn get_json<T: serde::de::DeserializeOwned>(
        &self,
        url: &str,
        params: &[(&str, String)],
    ) -> Result<T, DemagogError> {
        let response = self
            .http_client
            .get(url)
            .query(params)
            .send()
            .await
            .map_err(|e| DemagogError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(DemagogError::UnexpectedStatus {
                url: url.to_string(),
                status: status.as_u16(),
                body,
            });
        }

        response
            .json::<T>()
            .await
            .map_err(|e| DemagogError::Data(format!("malformed response: {}", e)))
    }
}

/// Page-level validation: any bad statement rejects the whole batch
fn validate_statements(statements: &[Statement]) -> Result<(), DemagogError> {
    use pp_common::consts::DemagogCategory;

    for statement in statements {
        if !is_valid_id(&statement.id) {
            return Err(DemagogError::Data(format!(
                "invalid statement id '{}'",
                statement.id
            )));
        }
        if statement.attributes.source.is_empty() {
            return Err(DemagogError::Data(format!(
                "statement {} has an empty source",
                statement.id
            )));
        }
        if statement.attributes.text.is_empty() {
            return Err(DemagogError::Data(format!(
                "statement {} has an empty text",
                statement.id
            )));
        }
        if DemagogCategory::from_str(&statement.attributes.rating).is_none() {
            return Err(DemagogError::Data(format!(
                "statement {} has unknown rating '{}'",
                statement.id, statement.attributes.rating
            )));
        }
        if statement.attributes.factchecker_uri.is_empty() {
            return Err(DemagogError::Data(format!(
                "statement {} has an empty factchecker_uri",
                statement.id
            )));
        }
    }
    Ok(())
}

/// Ids are non-zero integers or alphanumeric/underscore hashes
fn is_valid_id(id: &str) -> bool {
    !id.is_empty()
        && id != "0"
        && id.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_statement_accepts_integer_and_hash_ids() {
        let int_id: Statement = serde_json::from_value(serde_json::json!({
            "id": 1,
            "attributes": {
                "source": "http://i-am-article-you-check.org",
                "text": "it's an interesting article",
                "date": "2018-06-01T12:00:00Z",
                "rating": "true",
                "rating_text": "true statement",
                "factchecker_uri": "http://i-check-you-all.org"
            }
        }))
        .unwrap();
        assert_eq!(int_id.id, "1");

        let hash_id: Statement = serde_json::from_value(serde_json::json!({
            "id": "hash_1fa43de44",
            "attributes": {
                "source": "http://i-am-article-you-check.org",
                "text": "x",
                "date": "2018-06-01T12:00:00+02:00",
                "rating": "ptrue",
                "factchecker_uri": "http://i-check-you-all.org"
            }
        }))
        .unwrap();
        assert_eq!(hash_id.id, "hash_1fa43de44");
    }

    #[test]
    fn test_id_validation() {
        assert!(is_valid_id("1"));
        assert!(is_valid_id("hash_1fa43de44"));
        assert!(!is_valid_id("0"));
        assert!(!is_valid_id(""));
        assert!(!is_valid_id("with space"));
    }

    #[test]
    fn test_unknown_rating_rejects_batch() {
        let statement: Statement = serde_json::from_value(serde_json::json!({
            "id": 7,
            "attributes": {
                "source": "http://a/",
                "text": "x",
                "date": "2018-06-01T12:00:00Z",
                "rating": "not-in-choices",
                "factchecker_uri": "http://b/"
            }
        }))
        .unwrap();
        assert!(matches!(
            validate_statements(&[statement]),
            Err(DemagogError::Data(_))
        ));
    }
}
