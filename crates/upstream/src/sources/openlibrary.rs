//! Open Library (openlibrary.org) JSON API.

use async_trait::async_trait;
use serde_json::{json, Value};
use sfmcp_core::monitoring::SourceItem;

use super::{json_str, normalize_isbn, opt};
use crate::error::UpstreamError;
use crate::http::{join_segments, HttpSource};
use crate::source::{DataSource, MonitorQuery, Operation, Params};

pub const NAME: &str = "openlibrary";
pub const DEFAULT_BASE_URL: &str = "https://openlibrary.org";

const COVERS_URL: &str = "https://covers.openlibrary.org/b/id";
const MONITOR_LIMIT: u32 = 10;

const OPERATIONS: &[Operation] = &[
    Operation {
        name: "search",
        description: "Search books by free text, title or author",
        required: &[],
        optional: &["query", "title", "author", "limit"],
    },
    Operation {
        name: "book",
        description: "Look up an edition by ISBN",
        required: &["isbn"],
        optional: &[],
    },
    Operation {
        name: "author",
        description: "Find an author by name",
        required: &["name"],
        optional: &[],
    },
];

pub struct OpenLibrarySource {
    http: HttpSource,
}

impl OpenLibrarySource {
    pub fn new(client: reqwest::Client, base_url: impl Into<String>) -> Self {
        Self {
            http: HttpSource::new(NAME, client, base_url),
        }
    }

    async fn search(
        &self,
        query: Option<String>,
        title: Option<String>,
        author: Option<String>,
        limit: u32,
    ) -> Result<Value, UpstreamError> {
        let mut q: Vec<(&str, String)> = Vec::new();
        if let Some(v) = query {
            q.push(("q", v));
        }
        if let Some(v) = title {
            q.push(("title", v));
        }
        if let Some(v) = author {
            q.push(("author", v));
        }
        if q.is_empty() {
            return Err(UpstreamError::InvalidParameter(
                "one of 'query', 'title' or 'author' is required".into(),
            ));
        }
        q.push(("limit", limit.to_string()));
        let url = self.http.endpoint(&["search.json"])?;
        let body = self.http.get_json(url, &q, "search").await?;
        Ok(normalize_search(&body))
    }

    async fn book(&self, isbn: &str) -> Result<Value, UpstreamError> {
        let isbn = normalize_isbn(isbn)?;
        let body = self
            .http
            .get_json(
                self.http.endpoint(&["isbn", &format!("{isbn}.json")])?,
                &[],
                &format!("ISBN {isbn}"),
            )
            .await?;
        Ok(normalize_book(&body, &isbn))
    }

    async fn author(&self, name: &str) -> Result<Value, UpstreamError> {
        let body = self
            .http
            .get_json(
                self.http.endpoint(&["search", "authors.json"])?,
                &[("q", name.to_string())],
                "author",
            )
            .await?;
        normalize_author(&body)
            .ok_or_else(|| UpstreamError::not_found(NAME, format!("author '{name}'")))
    }
}

fn cover_url(cover_id: Option<i64>) -> Value {
    cover_id
        .filter(|id| *id > 0)
        .map(|id| Value::String(format!("{COVERS_URL}/{id}-M.jpg")))
        .unwrap_or(Value::Null)
}

fn normalize_search(body: &Value) -> Value {
    let docs = body.get("docs").and_then(Value::as_array).cloned().unwrap_or_default();
    let results: Vec<Value> = docs
        .iter()
        .map(|doc| {
            let key = json_str(doc, "key");
            json!({
                "id": opt(key.clone()),
                "title": opt(json_str(doc, "title")),
                "authors": doc.get("author_name").cloned().unwrap_or_else(|| json!([])),
                "first_publish_year": doc.get("first_publish_year").cloned().unwrap_or(Value::Null),
                "isbn": doc.get("isbn").and_then(|i| i.get(0)).cloned().unwrap_or(Value::Null),
                "cover_url": cover_url(doc.get("cover_i").and_then(Value::as_i64)),
                "url": opt(key.map(|k| format!("{DEFAULT_BASE_URL}{k}"))),
            })
        })
        .collect();
    json!({
        "total": body.get("numFound").and_then(Value::as_u64).unwrap_or(results.len() as u64),
        "results": results,
    })
}

fn normalize_book(body: &Value, isbn: &str) -> Value {
    let key = json_str(body, "key");
    json!({
        "id": opt(key.clone()),
        "isbn": isbn,
        "title": opt(json_str(body, "title")),
        "subtitle": opt(json_str(body, "subtitle")),
        "publishers": body.get("publishers").cloned().unwrap_or_else(|| json!([])),
        "publish_date": opt(json_str(body, "publish_date")),
        "number_of_pages": body.get("number_of_pages").cloned().unwrap_or(Value::Null),
        "cover_url": cover_url(body.get("covers").and_then(|c| c.get(0)).and_then(Value::as_i64)),
        "url": opt(key.map(|k| format!("{DEFAULT_BASE_URL}{k}"))),
    })
}

fn normalize_author(body: &Value) -> Option<Value> {
    let doc = body.get("docs")?.as_array()?.first()?;
    let key = json_str(doc, "key")?;
    Some(json!({
        "id": key,
        "name": opt(json_str(doc, "name")),
        "birth_date": opt(json_str(doc, "birth_date")),
        "top_work": opt(json_str(doc, "top_work")),
        "work_count": doc.get("work_count").cloned().unwrap_or(Value::Null),
        "url": join_segments(DEFAULT_BASE_URL, &["authors", &key]).ok().map(String::from),
    }))
}

fn search_items(normalized: &Value) -> Vec<SourceItem> {
    normalized["results"]
        .as_array()
        .map(|results| {
            results
                .iter()
                .filter_map(|r| {
                    Some(SourceItem {
                        source: NAME.to_string(),
                        id: json_str(r, "id")?,
                        title: json_str(r, "title"),
                        author: r["authors"].get(0).and_then(Value::as_str).map(str::to_string),
                        description: None,
                        url: json_str(r, "url"),
                    })
                })
                .collect()
        })
        .unwrap_or_default()
}

#[async_trait]
impl DataSource for OpenLibrarySource {
    fn name(&self) -> &'static str {
        NAME
    }

    fn description(&self) -> &'static str {
        "Open Library book catalog"
    }

    fn operations(&self) -> &'static [Operation] {
        OPERATIONS
    }

    async fn fetch(&self, operation: &str, params: &Value) -> Result<Value, UpstreamError> {
        let p = Params::new(params);
        match operation {
            "search" => {
                self.search(p.str("query"), p.str("title"), p.str("author"), p.limit(10, 100)?)
                    .await
            }
            "book" => self.book(&p.required("isbn")?).await,
            "author" => self.author(&p.required("name")?).await,
            other => Err(self.unsupported(other)),
        }
    }

    async fn find_items(&self, query: &MonitorQuery) -> Result<Vec<SourceItem>, UpstreamError> {
        let normalized = match query {
            MonitorQuery::Keyword(k) => self.search(Some(k.clone()), None, None, MONITOR_LIMIT).await?,
            MonitorQuery::Author(a) => self.search(None, None, Some(a.clone()), MONITOR_LIMIT).await?,
        };
        Ok(search_items(&normalized))
    }
}
