//! RPGGeek via the BoardGameGeek XML API v2.
//!
//! The API answers `202 Accepted` while it prepares a response; that is
//! reported as transient so callers retry.

use async_trait::async_trait;
use serde_json::{json, Value};
use sfmcp_core::monitoring::SourceItem;

use super::{opt, parse_xml, strip_html};
use crate::error::UpstreamError;
use crate::http::HttpSource;
use crate::source::{DataSource, MonitorQuery, Operation, Params};
use crate::xml::XmlNode;

pub const NAME: &str = "rpggeek";
pub const DEFAULT_BASE_URL: &str = "https://rpggeek.com";

const ITEM_TYPE: &str = "rpgitem";

const OPERATIONS: &[Operation] = &[
    Operation {
        name: "search",
        description: "Search RPG items by name",
        required: &["query"],
        optional: &[],
    },
    Operation {
        name: "item",
        description: "Details of an RPG item by id",
        required: &["id"],
        optional: &[],
    },
];

pub struct RpgGeekSource {
    http: HttpSource,
}

impl RpgGeekSource {
    pub fn new(client: reqwest::Client, base_url: impl Into<String>) -> Self {
        Self {
            http: HttpSource::new(NAME, client, base_url),
        }
    }

    async fn get_items(
        &self,
        endpoint: &str,
        query: &[(&str, String)],
        what: &str,
    ) -> Result<XmlNode, UpstreamError> {
        let url = self.http.endpoint(&["xmlapi2", endpoint])?;
        let body = self.http.get_text(url, query, what).await?;
        let root = parse_xml(NAME, &body)?;
        if matches!(root.name.as_str(), "errors" | "error") {
            let message = root
                .text_at("error/message")
                .or_else(|| root.text_at("message"))
                .unwrap_or_else(|| "unspecified error".to_string());
            return Err(UpstreamError::protocol(NAME, message));
        }
        Ok(root)
    }

    async fn search(&self, query: &str) -> Result<Value, UpstreamError> {
        let q = [("query", query.to_string()), ("type", ITEM_TYPE.to_string())];
        let root = self.get_items("search", &q, "search").await?;
        let results: Vec<Value> = root.children_named("item").map(normalize_search_hit).collect();
        Ok(json!({
            "total": root.attr("total").and_then(|t| t.parse::<u64>().ok()).unwrap_or(results.len() as u64),
            "results": results,
        }))
    }

    async fn item(&self, id: &str) -> Result<Value, UpstreamError> {
        let what = format!("item {id}");
        let root = self
            .get_items("thing", &[("id", id.to_string())], &what)
            .await?;
        let item = root
            .child("item")
            .ok_or_else(|| UpstreamError::not_found(NAME, what))?;
        Ok(normalize_item(item))
    }
}

fn primary_name(item: &XmlNode) -> Option<String> {
    item.children_named("name")
        .find(|n| n.attr("type") == Some("primary"))
        .or_else(|| item.child("name"))
        .and_then(|n| n.attr("value"))
        .map(str::to_string)
}

fn value_attr(item: &XmlNode, child: &str) -> Option<String> {
    item.child(child)?.attr("value").map(str::to_string)
}

fn year(item: &XmlNode) -> Value {
    value_attr(item, "yearpublished")
        .and_then(|y| y.parse::<i64>().ok())
        .filter(|y| *y != 0)
        .map(Value::from)
        .unwrap_or(Value::Null)
}

fn links(item: &XmlNode, kind: &str) -> Vec<String> {
    item.children_named("link")
        .filter(|l| l.attr("type") == Some(kind))
        .filter_map(|l| l.attr("value").map(str::to_string))
        .collect()
}

fn item_url(id: &str) -> String {
    format!("{DEFAULT_BASE_URL}/{ITEM_TYPE}/{id}")
}

fn normalize_search_hit(item: &XmlNode) -> Value {
    let id = item.attr("id").map(str::to_string);
    json!({
        "id": opt(id.clone()),
        "name": opt(primary_name(item)),
        "year_published": year(item),
        "url": opt(id.map(|id| item_url(&id))),
    })
}

fn normalize_item(item: &XmlNode) -> Value {
    let id = item.attr("id").unwrap_or_default();
    json!({
        "id": id,
        "name": opt(primary_name(item)),
        "description": opt(item.text_at("description").map(|d| strip_html(&d))),
        "year_published": year(item),
        "publishers": links(item, "rpgpublisher"),
        "designers": links(item, "rpgdesigner"),
        "systems": links(item, "rpg"),
        "thumbnail": opt(item.text_at("thumbnail")),
        "image": opt(item.text_at("image")),
        "url": item_url(id),
    })
}

#[async_trait]
impl DataSource for RpgGeekSource {
    fn name(&self) -> &'static str {
        NAME
    }

    fn description(&self) -> &'static str {
        "RPGGeek tabletop RPG database"
    }

    fn operations(&self) -> &'static [Operation] {
        OPERATIONS
    }

    async fn fetch(&self, operation: &str, params: &Value) -> Result<Value, UpstreamError> {
        let p = Params::new(params);
        match operation {
            "search" => self.search(&p.required("query")?).await,
            "item" => self.item(&p.required("id")?).await,
            other => Err(self.unsupported(other)),
        }
    }

    async fn find_items(&self, query: &MonitorQuery) -> Result<Vec<SourceItem>, UpstreamError> {
        let MonitorQuery::Keyword(keyword) = query else {
            return Ok(Vec::new());
        };
        let normalized = self.search(keyword).await?;
        let items = normalized["results"]
            .as_array()
            .map(|results| {
                results
                    .iter()
                    .filter_map(|r| {
                        Some(SourceItem {
                            source: NAME.to_string(),
                            id: r["id"].as_str()?.to_string(),
                            title: r["name"].as_str().map(str::to_string),
                            author: None,
                            description: None,
                            url: r["url"].as_str().map(str::to_string),
                        })
                    })
                    .collect()
            })
            .unwrap_or_default();
        Ok(items)
    }
}
