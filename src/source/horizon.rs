//! HTTP record source for Horizon-style REST APIs
//!
//! Operations are served under `/operations`, `/accounts/{id}/operations` and
//! `/transactions/{hash}/operations`, wrapped in a HAL envelope:
//! `{"_embedded": {"records": [...]}}`.

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, warn};

use super::{OperationQuery, Page, RecordSource, Scope};
use crate::error::{OpTableError, Result};
use crate::record::Record;

#[derive(Debug, Deserialize)]
struct HalPage {
    #[serde(rename = "_embedded")]
    embedded: Embedded,
}

#[derive(Debug, Deserialize)]
struct Embedded {
    #[serde(default)]
    records: Vec<Record>,
}

/// Problem document returned with non-2xx responses.
#[derive(Debug, Deserialize)]
struct Problem {
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    detail: Option<String>,
}

pub struct HorizonSource {
    base_url: String,
    client: reqwest::Client,
}

impl HorizonSource {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Endpoint URL for a query, without query-string parameters.
    pub fn endpoint(&self, query: &OperationQuery) -> String {
        match &query.scope {
            Scope::All => format!("{}/operations", self.base_url),
            Scope::Account(id) => format!("{}/accounts/{}/operations", self.base_url, id),
            Scope::Transaction(hash) => {
                format!("{}/transactions/{}/operations", self.base_url, hash)
            }
        }
    }

    fn query_params(query: &OperationQuery) -> Vec<(&'static str, String)> {
        let mut params = vec![("order", query.order.as_str().to_string())];
        if let Some(limit) = query.limit {
            params.push(("limit", limit.to_string()));
        }
        if let Some(cursor) = query.cursor.as_ref().filter(|c| !c.is_start()) {
            params.push(("cursor", cursor.to_string()));
        }
        params
    }
}

/// Decode a HAL page body into a [`Page`].
pub fn parse_page(body: &str) -> Result<Page> {
    let hal: HalPage = serde_json::from_str(body)?;
    Ok(Page::new(hal.embedded.records))
}

#[async_trait]
impl RecordSource for HorizonSource {
    async fn call(&self, query: &OperationQuery) -> Result<Page> {
        let url = self.endpoint(query);
        let params = Self::query_params(query);
        debug!(url = %url, ?params, "horizon.request");

        let response = self.client.get(&url).query(&params).send().await?;
        let status = response.status();
        let body = response.text().await?;

        match status {
            StatusCode::OK => parse_page(&body),
            code => {
                let problem = serde_json::from_str::<Problem>(&body).ok();
                let reason = problem
                    .and_then(|p| p.detail.or(p.title))
                    .unwrap_or_else(|| body.chars().take(200).collect());
                warn!(status = %code, url = %url, "horizon request rejected");
                Err(OpTableError::SourceError(format!("{} from {}: {}", code, url, reason)))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::Cursor;
    use crate::source::Order;

    #[test]
    fn test_endpoint_per_scope() {
        let source = HorizonSource::new("https://horizon.example/", Duration::from_secs(5)).unwrap();
        assert_eq!(source.base_url(), "https://horizon.example");
        assert_eq!(
            source.endpoint(&OperationQuery::new()),
            "https://horizon.example/operations"
        );
        assert_eq!(
            source.endpoint(&OperationQuery::new().for_account("GABC")),
            "https://horizon.example/accounts/GABC/operations"
        );
        assert_eq!(
            source.endpoint(&OperationQuery::new().for_transaction("ff00")),
            "https://horizon.example/transactions/ff00/operations"
        );
    }

    #[test]
    fn test_start_cursor_is_not_sent() {
        let q = OperationQuery::new()
            .order(Order::Desc)
            .limit(10)
            .cursor(Cursor::start());
        let params = HorizonSource::query_params(&q);
        assert_eq!(
            params,
            vec![("order", "desc".to_string()), ("limit", "10".to_string())]
        );

        let params = HorizonSource::query_params(&q.cursor(Cursor::new("42")));
        assert!(params.contains(&("cursor", "42".to_string())));
    }

    #[test]
    fn test_parse_hal_page() {
        let body = r#"{
            "_links": {"next": {"href": "/operations?cursor=2"}},
            "_embedded": {"records": [
                {"id": "3", "paging_token": "3", "type": "payment", "amount": "1.5"},
                {"id": "2", "paging_token": "2", "type": "create_account"}
            ]}
        }"#;
        let page = parse_page(body).unwrap();
        assert_eq!(page.len(), 2);
        assert_eq!(page.records[0].extra["amount"], "1.5");
        assert_eq!(page.last_paging_token(), Some(&Cursor::new("2")));
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(matches!(
            parse_page("not json"),
            Err(OpTableError::DecodeError(_))
        ));
    }
}
