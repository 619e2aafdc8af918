//! LibraryThing thingISBN: every known edition of a work, by ISBN.

use async_trait::async_trait;
use serde_json::{json, Value};

use super::{normalize_isbn, parse_xml};
use crate::error::UpstreamError;
use crate::http::HttpSource;
use crate::source::{DataSource, Operation, Params};

pub const NAME: &str = "librarything";
pub const DEFAULT_BASE_URL: &str = "https://www.librarything.com";

const OPERATIONS: &[Operation] = &[Operation {
    name: "editions",
    description: "ISBNs of every edition of the same work",
    required: &["isbn"],
    optional: &[],
}];

pub struct LibraryThingSource {
    http: HttpSource,
}

impl LibraryThingSource {
    pub fn new(client: reqwest::Client, base_url: impl Into<String>) -> Self {
        Self {
            http: HttpSource::new(NAME, client, base_url),
        }
    }

    async fn editions(&self, isbn: &str) -> Result<Value, UpstreamError> {
        let isbn = normalize_isbn(isbn)?;
        let what = format!("ISBN {isbn}");
        let body = self
            .http
            .get_text(self.http.endpoint(&["api", "thingISBN", &isbn])?, &[], &what)
            .await?;
        let root = parse_xml(NAME, &body)?;
        if root.name != "idlist" {
            return Err(UpstreamError::not_found(NAME, what));
        }
        let editions: Vec<String> = root
            .children_named("isbn")
            .map(|n| n.text.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();
        if editions.is_empty() {
            return Err(UpstreamError::not_found(NAME, what));
        }
        Ok(json!({
            "isbn": isbn,
            "count": editions.len(),
            "editions": editions,
        }))
    }
}

#[async_trait]
impl DataSource for LibraryThingSource {
    fn name(&self) -> &'static str {
        NAME
    }

    fn description(&self) -> &'static str {
        "LibraryThing edition lookup"
    }

    fn operations(&self) -> &'static [Operation] {
        OPERATIONS
    }

    async fn fetch(&self, operation: &str, params: &Value) -> Result<Value, UpstreamError> {
        let p = Params::new(params);
        match operation {
            "editions" => self.editions(&p.required("isbn")?).await,
            other => Err(self.unsupported(other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::build_client;
    use assert_matches::assert_matches;
    use std::time::Duration;

    fn source(url: &str) -> LibraryThingSource {
        LibraryThingSource::new(build_client(Duration::from_secs(5)), url)
    }

    #[tokio::test]
    async fn editions_are_listed() {
        let mut server = mockito::Server::new_async().await;
        let _m = server
            .mock("GET", "/api/thingISBN/0441172717")
            .with_status(200)
            .with_body("<?xml version=\"1.0\"?><idlist><isbn>0441172717</isbn><isbn>0340960191</isbn></idlist>")
            .create_async()
            .await;

        let out = source(&server.url())
            .fetch("editions", &json!({"isbn": "0441172717"}))
            .await
            .unwrap();
        assert_eq!(out["count"], 2);
        assert_eq!(out["editions"][1], "0340960191");
    }

    #[tokio::test]
    async fn unknown_isbn_is_not_found() {
        let mut server = mockito::Server::new_async().await;
        let _m = server
            .mock("GET", "/api/thingISBN/0000000000")
            .with_status(200)
            .with_body("<?xml version=\"1.0\"?><error>unknown ID</error>")
            .create_async()
            .await;

        let err = source(&server.url())
            .fetch("editions", &json!({"isbn": "0000000000"}))
            .await
            .unwrap_err();
        assert_matches!(err, UpstreamError::NotFound { .. });
    }

    #[tokio::test]
    async fn unsupported_operation_is_rejected() {
        let err = source("http://unused.invalid")
            .fetch("reviews", &json!({}))
            .await
            .unwrap_err();
        assert_matches!(err, UpstreamError::UnsupportedOperation { .. });
    }
}
