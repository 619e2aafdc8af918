//! Grand Comics Database (comics.org) REST API.

use async_trait::async_trait;
use serde_json::{json, Value};
use sfmcp_core::monitoring::SourceItem;

use super::{json_str, opt};
use crate::error::UpstreamError;
use crate::http::HttpSource;
use crate::source::{DataSource, MonitorQuery, Operation, Params};

pub const NAME: &str = "gcd";
pub const DEFAULT_BASE_URL: &str = "https://www.comics.org";

const OPERATIONS: &[Operation] = &[
    Operation {
        name: "series",
        description: "Series whose name matches",
        required: &["name"],
        optional: &[],
    },
    Operation {
        name: "issue",
        description: "A single issue by GCD id",
        required: &["id"],
        optional: &[],
    },
];

pub struct GcdSource {
    http: HttpSource,
}

impl GcdSource {
    pub fn new(client: reqwest::Client, base_url: impl Into<String>) -> Self {
        Self {
            http: HttpSource::new(NAME, client, base_url),
        }
    }

    async fn series(&self, name: &str) -> Result<Value, UpstreamError> {
        let url = self.http.endpoint(&["api", "series", "name", name, ""])?;
        let what = format!("series '{name}'");
        let body = self
            .http
            .get_json(url, &[("format", "json".to_string())], &what)
            .await?;
        let out = normalize_series_list(&body);
        if out["count"] == 0 {
            return Err(UpstreamError::not_found(NAME, what));
        }
        Ok(out)
    }

    async fn issue(&self, id: &str) -> Result<Value, UpstreamError> {
        if !id.chars().all(|c| c.is_ascii_digit()) {
            return Err(UpstreamError::InvalidParameter(format!(
                "'{id}' is not a numeric GCD issue id"
            )));
        }
        let body = self
            .http
            .get_json(
                self.http.endpoint(&["api", "issue", id, ""])?,
                &[("format", "json".to_string())],
                &format!("issue {id}"),
            )
            .await?;
        Ok(normalize_issue(&body, id))
    }
}

/// The numeric id at the end of a GCD resource URL such as
/// `https://www.comics.org/api/series/1570/?format=json`.
fn id_from_api_url(url: &str) -> Option<String> {
    let path = url.split('?').next()?;
    path.trim_end_matches('/')
        .rsplit('/')
        .next()
        .filter(|s| !s.is_empty() && s.chars().all(|c| c.is_ascii_digit()))
        .map(str::to_string)
}

fn normalize_series_list(body: &Value) -> Value {
    let results = body.get("results").and_then(Value::as_array).cloned().unwrap_or_default();
    let series: Vec<Value> = results
        .iter()
        .map(|s| {
            let id = json_str(s, "api_url").and_then(|u| id_from_api_url(&u));
            json!({
                "id": opt(id.clone()),
                "name": opt(json_str(s, "name")),
                "year_began": s.get("year_began").cloned().unwrap_or(Value::Null),
                "year_ended": s.get("year_ended").cloned().unwrap_or(Value::Null),
                "issue_count": s.get("issue_descriptors")
                    .and_then(Value::as_array)
                    .map(|a| Value::from(a.len()))
                    .unwrap_or(Value::Null),
                "publisher_id": opt(json_str(s, "publisher").and_then(|u| id_from_api_url(&u))),
                "url": opt(id.map(|id| format!("{DEFAULT_BASE_URL}/series/{id}/"))),
            })
        })
        .collect();
    json!({
        "count": body.get("count").and_then(Value::as_u64).unwrap_or(series.len() as u64),
        "series": series,
    })
}

fn normalize_issue(body: &Value, id: &str) -> Value {
    let stories: Vec<Value> = body
        .get("story_set")
        .and_then(Value::as_array)
        .map(|set| {
            set.iter()
                .filter_map(|s| {
                    let title = json_str(s, "title");
                    let kind = json_str(s, "type");
                    if title.is_none() && kind.is_none() {
                        return None;
                    }
                    Some(json!({
                        "title": opt(title),
                        "type": opt(kind),
                        "script": opt(json_str(s, "script")),
                        "pencils": opt(json_str(s, "pencils")),
                    }))
                })
                .collect()
        })
        .unwrap_or_default();
    json!({
        "id": id,
        "series_name": opt(json_str(body, "series_name")),
        "number": opt(json_str(body, "descriptor")),
        "publication_date": opt(json_str(body, "publication_date")),
        "price": opt(json_str(body, "price")),
        "page_count": body.get("page_count").cloned().unwrap_or(Value::Null),
        "cover_url": opt(json_str(body, "cover")),
        "stories": stories,
        "url": format!("{DEFAULT_BASE_URL}/issue/{id}/"),
    })
}

#[async_trait]
impl DataSource for GcdSource {
    fn name(&self) -> &'static str {
        NAME
    }

    fn description(&self) -> &'static str {
        "Grand Comics Database"
    }

    fn operations(&self) -> &'static [Operation] {
        OPERATIONS
    }

    async fn fetch(&self, operation: &str, params: &Value) -> Result<Value, UpstreamError> {
        let p = Params::new(params);
        match operation {
            "series" => self.series(&p.required("name")?).await,
            "issue" => self.issue(&p.required("id")?).await,
            other => Err(self.unsupported(other)),
        }
    }

    async fn find_items(&self, query: &MonitorQuery) -> Result<Vec<SourceItem>, UpstreamError> {
        let MonitorQuery::Keyword(keyword) = query else {
            return Ok(Vec::new());
        };
        let normalized = match self.series(keyword).await {
            Ok(v) => v,
            Err(UpstreamError::NotFound { .. }) => return Ok(Vec::new()),
            Err(e) => return Err(e),
        };
        let items = normalized["series"]
            .as_array()
            .map(|series| {
                series
                    .iter()
                    .filter_map(|s| {
                        Some(SourceItem {
                            source: NAME.to_string(),
                            id: json_str(s, "id")?,
                            title: json_str(s, "name"),
                            author: None,
                            description: s["year_began"].as_i64().map(|y| format!("Began {y}")),
                            url: json_str(s, "url"),
                        })
                    })
                    .collect()
            })
            .unwrap_or_default();
        Ok(items)
    }
}
