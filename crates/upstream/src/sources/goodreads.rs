//! Goodreads XML API. Every call needs a developer key.

use async_trait::async_trait;
use serde_json::{json, Value};
use sfmcp_core::monitoring::SourceItem;

use super::{leading_year, opt, parse_xml};
use crate::error::UpstreamError;
use crate::http::HttpSource;
use crate::source::{DataSource, MonitorQuery, Operation, Params};
use crate::xml::XmlNode;

pub const NAME: &str = "goodreads";
pub const DEFAULT_BASE_URL: &str = "https://www.goodreads.com";

const OPERATIONS: &[Operation] = &[
    Operation {
        name: "book",
        description: "Look up a book by title, optionally narrowed by author",
        required: &["title"],
        optional: &["author"],
    },
    Operation {
        name: "author",
        description: "Find an author by name",
        required: &["name"],
        optional: &[],
    },
];

pub struct GoodreadsSource {
    http: HttpSource,
    api_key: Option<String>,
}

impl GoodreadsSource {
    pub fn new(client: reqwest::Client, base_url: impl Into<String>, api_key: Option<String>) -> Self {
        Self {
            http: HttpSource::new(NAME, client, base_url),
            api_key: api_key.filter(|k| !k.is_empty()),
        }
    }

    fn key(&self) -> Result<String, UpstreamError> {
        self.api_key
            .clone()
            .ok_or(UpstreamError::NotConfigured("goodreads API key"))
    }

    async fn book(&self, title: &str, author: Option<String>) -> Result<Value, UpstreamError> {
        let mut q = vec![("key", self.key()?), ("title", title.to_string())];
        if let Some(a) = author {
            q.push(("author", a));
        }
        let body = self
            .http
            .get_text(self.http.endpoint(&["book", "title.xml"])?, &q, &format!("book '{title}'"))
            .await?;
        let root = parse_xml(NAME, &body)?;
        let book = root
            .child("book")
            .ok_or_else(|| UpstreamError::not_found(NAME, format!("book '{title}'")))?;
        Ok(normalize_book(book))
    }

    async fn author(&self, name: &str) -> Result<(String, Value), UpstreamError> {
        let url = self.http.endpoint(&["api", "author_url", name])?;
        let body = self
            .http
            .get_text(url, &[("key", self.key()?)], &format!("author '{name}'"))
            .await?;
        let root = parse_xml(NAME, &body)?;
        let author = root
            .child("author")
            .filter(|a| a.attr("id").is_some())
            .ok_or_else(|| UpstreamError::not_found(NAME, format!("author '{name}'")))?;
        let id = author.attr("id").unwrap_or_default().to_string();
        let value = json!({
            "id": id,
            "name": opt(author.text_at("name")),
            "url": opt(author.text_at("link")),
        });
        Ok((id, value))
    }

    async fn author_books(&self, author_id: &str) -> Result<Vec<SourceItem>, UpstreamError> {
        let q = [("key", self.key()?), ("format", "xml".to_string())];
        let body = self
            .http
            .get_text(
                self.http.endpoint(&["author", "list", author_id])?,
                &q,
                &format!("books of author {author_id}"),
            )
            .await?;
        let root = parse_xml(NAME, &body)?;
        let Some(author) = root.child("author") else {
            return Ok(Vec::new());
        };
        let author_name = author.text_at("name");
        let items = author
            .find("books")
            .map(|books| {
                books
                    .children_named("book")
                    .filter_map(|b| {
                        Some(SourceItem {
                            source: NAME.to_string(),
                            id: b.text_at("id")?,
                            title: b.text_at("title"),
                            author: author_name.clone(),
                            description: None,
                            url: b.text_at("link"),
                        })
                    })
                    .collect()
            })
            .unwrap_or_default();
        Ok(items)
    }
}

fn normalize_book(book: &XmlNode) -> Value {
    let authors: Vec<Value> = book
        .find("authors")
        .map(|a| {
            a.children_named("author")
                .filter_map(|author| author.text_at("name"))
                .map(Value::String)
                .collect()
        })
        .unwrap_or_default();
    json!({
        "id": opt(book.text_at("id")),
        "title": opt(book.text_at("title")),
        "authors": authors,
        "isbn": opt(book.text_at("isbn")),
        "isbn13": opt(book.text_at("isbn13")),
        "publication_year": leading_year(book.text_at("publication_year")),
        "publisher": opt(book.text_at("publisher")),
        "description": opt(book.text_at("description").map(|d| super::strip_html(&d))),
        "average_rating": book.text_at("average_rating").and_then(|r| r.parse::<f64>().ok()),
        "ratings_count": book.text_at("ratings_count").and_then(|r| r.parse::<u64>().ok()),
        "image_url": opt(book.text_at("image_url")),
        "url": opt(book.text_at("url")),
    })
}

#[async_trait]
impl DataSource for GoodreadsSource {
    fn name(&self) -> &'static str {
        NAME
    }

    fn description(&self) -> &'static str {
        "Goodreads book and author catalog"
    }

    fn operations(&self) -> &'static [Operation] {
        OPERATIONS
    }

    async fn fetch(&self, operation: &str, params: &Value) -> Result<Value, UpstreamError> {
        let p = Params::new(params);
        match operation {
            "book" => self.book(&p.required("title")?, p.str("author")).await,
            "author" => Ok(self.author(&p.required("name")?).await?.1),
            other => Err(self.unsupported(other)),
        }
    }

    async fn find_items(&self, query: &MonitorQuery) -> Result<Vec<SourceItem>, UpstreamError> {
        let MonitorQuery::Author(name) = query else {
            return Ok(Vec::new());
        };
        let (id, _) = self.author(name).await?;
        self.author_books(&id).await
    }
}
