//! Wikipedia REST summary and MediaWiki search APIs.

use async_trait::async_trait;
use serde_json::{json, Value};
use sfmcp_core::monitoring::SourceItem;

use super::{json_str, opt, strip_html};
use crate::error::UpstreamError;
use crate::http::{join_segments, HttpSource};
use crate::source::{DataSource, MonitorQuery, Operation, Params};

pub const NAME: &str = "wikipedia";
pub const DEFAULT_BASE_URL: &str = "https://en.wikipedia.org";

const MONITOR_LIMIT: u32 = 10;

const OPERATIONS: &[Operation] = &[
    Operation {
        name: "summary",
        description: "Lead-section summary of an article",
        required: &["title"],
        optional: &[],
    },
    Operation {
        name: "search",
        description: "Full-text article search",
        required: &["query"],
        optional: &["limit"],
    },
];

pub struct WikipediaSource {
    http: HttpSource,
}

fn article_url(title: &str) -> Option<String> {
    join_segments(DEFAULT_BASE_URL, &["wiki", &title.replace(' ', "_")])
        .ok()
        .map(String::from)
}

impl WikipediaSource {
    pub fn new(client: reqwest::Client, base_url: impl Into<String>) -> Self {
        Self {
            http: HttpSource::new(NAME, client, base_url),
        }
    }

    async fn summary(&self, title: &str) -> Result<Value, UpstreamError> {
        let url = self.http.endpoint(&[
            "api",
            "rest_v1",
            "page",
            "summary",
            &title.replace(' ', "_"),
        ])?;
        let body = self
            .http
            .get_json(url, &[], &format!("article '{title}'"))
            .await?;
        Ok(normalize_summary(&body, title))
    }

    async fn search(&self, query: &str, limit: u32) -> Result<Value, UpstreamError> {
        let q = [
            ("action", "query".to_string()),
            ("list", "search".to_string()),
            ("srsearch", query.to_string()),
            ("srlimit", limit.to_string()),
            ("format", "json".to_string()),
        ];
        let url = self.http.endpoint(&["w", "api.php"])?;
        let body = self.http.get_json(url, &q, "search").await?;
        normalize_search(&body)
    }
}

fn normalize_summary(body: &Value, requested: &str) -> Value {
    let title = json_str(body, "title").unwrap_or_else(|| requested.to_string());
    let url = body
        .pointer("/content_urls/desktop/page")
        .and_then(Value::as_str)
        .map(str::to_string)
        .or_else(|| article_url(&title));
    json!({
        "title": title,
        "summary": opt(json_str(body, "extract")),
        "description": opt(json_str(body, "description")),
        "page_type": opt(json_str(body, "type")),
        "page_id": body.get("pageid").cloned().unwrap_or(Value::Null),
        "thumbnail": body.pointer("/thumbnail/source").cloned().unwrap_or(Value::Null),
        "url": url,
        "exists": true,
    })
}

fn normalize_search(body: &Value) -> Result<Value, UpstreamError> {
    let query = body
        .get("query")
        .ok_or_else(|| UpstreamError::protocol(NAME, "search response has no 'query' object"))?;
    let hits = query.get("search").and_then(Value::as_array).cloned().unwrap_or_default();
    let results: Vec<Value> = hits
        .iter()
        .filter_map(|hit| {
            let title = json_str(hit, "title")?;
            Some(json!({
                "title": title,
                "page_id": hit.get("pageid").cloned().unwrap_or(Value::Null),
                "snippet": json_str(hit, "snippet").map(|s| strip_html(&s)),
                "word_count": hit.get("wordcount").cloned().unwrap_or(Value::Null),
                "url": article_url(&title),
            }))
        })
        .collect();
    Ok(json!({
        "total": query.pointer("/searchinfo/totalhits").and_then(Value::as_u64).unwrap_or(results.len() as u64),
        "results": results,
    }))
}

#[async_trait]
impl DataSource for WikipediaSource {
    fn name(&self) -> &'static str {
        NAME
    }

    fn description(&self) -> &'static str {
        "English Wikipedia"
    }

    fn operations(&self) -> &'static [Operation] {
        OPERATIONS
    }

    async fn fetch(&self, operation: &str, params: &Value) -> Result<Value, UpstreamError> {
        let p = Params::new(params);
        match operation {
            "summary" => self.summary(&p.required("title")?).await,
            "search" => self.search(&p.required("query")?, p.limit(5, 50)?).await,
            other => Err(self.unsupported(other)),
        }
    }

    async fn find_items(&self, query: &MonitorQuery) -> Result<Vec<SourceItem>, UpstreamError> {
        let MonitorQuery::Keyword(keyword) = query else {
            return Ok(Vec::new());
        };
        let normalized = self.search(keyword, MONITOR_LIMIT).await?;
        let items = normalized["results"]
            .as_array()
            .map(|results| {
                results
                    .iter()
                    .filter_map(|r| {
                        let title = json_str(r, "title")?;
                        let id = r["page_id"]
                            .as_i64()
                            .map(|id| id.to_string())
                            .unwrap_or_else(|| title.clone());
                        Some(SourceItem {
                            source: NAME.to_string(),
                            id,
                            title: Some(title),
                            author: None,
                            description: json_str(r, "snippet"),
                            url: json_str(r, "url"),
                        })
                    })
                    .collect()
            })
            .unwrap_or_default();
        Ok(items)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::build_client;
    use assert_matches::assert_matches;
    use std::time::Duration;

    fn source(url: &str) -> WikipediaSource {
        WikipediaSource::new(build_client(Duration::from_secs(5)), url)
    }

    #[tokio::test]
    async fn summary_uses_underscored_title() {
        let mut server = mockito::Server::new_async().await;
        let _m = server
            .mock("GET", "/api/rest_v1/page/summary/Dune_(novel)")
            .with_status(200)
            .with_body(
                json!({"type": "standard", "title": "Dune (novel)", "pageid": 8790,
                       "extract": "Dune is a 1965 epic science fiction novel."})
                .to_string(),
            )
            .create_async()
            .await;

        let out = source(&server.url())
            .fetch("summary", &json!({"title": "Dune (novel)"}))
            .await
            .unwrap();
        assert_eq!(out["exists"], true);
        assert_eq!(out["page_id"], 8790);
        assert_eq!(out["thumbnail"], Value::Null);
        assert_eq!(out["url"], "https://en.wikipedia.org/wiki/Dune_(novel)");
    }

    #[tokio::test]
    async fn missing_article_is_not_found() {
        let mut server = mockito::Server::new_async().await;
        let _m = server
            .mock("GET", "/api/rest_v1/page/summary/No_such_page")
            .with_status(404)
            .create_async()
            .await;

        let err = source(&server.url())
            .fetch("summary", &json!({"title": "No such page"}))
            .await
            .unwrap_err();
        assert_matches!(err, UpstreamError::NotFound { .. });
    }

    #[tokio::test]
    async fn keyword_monitoring_returns_items() {
        let mut server = mockito::Server::new_async().await;
        let _m = server
            .mock("GET", "/w/api.php")
            .match_query(mockito::Matcher::UrlEncoded("srsearch".into(), "cyberpunk".into()))
            .with_status(200)
            .with_body(
                json!({"query": {"searchinfo": {"totalhits": 1}, "search": [
                    {"title": "Cyberpunk", "pageid": 6712,
                     "snippet": "<span class=\"searchmatch\">Cyberpunk</span> is a subgenre"}
                ]}})
                .to_string(),
            )
            .create_async()
            .await;

        let items = source(&server.url())
            .find_items(&MonitorQuery::Keyword("cyberpunk".into()))
            .await
            .unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].id, "6712");
        assert_eq!(items[0].description.as_deref(), Some("Cyberpunk is a subgenre"));
    }

    #[tokio::test]
    async fn author_monitoring_is_not_supported() {
        let items = source("http://unused.invalid")
            .find_items(&MonitorQuery::Author("William Gibson".into()))
            .await
            .unwrap();
        assert!(items.is_empty());
    }

    #[test]
    fn search_without_query_object_is_protocol_error() {
        assert_matches!(normalize_search(&json!({})), Err(UpstreamError::Protocol { .. }));
    }
}
