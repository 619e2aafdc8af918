//! Internet Speculative Fiction Database REST API.

use async_trait::async_trait;
use serde_json::{json, Value};

use super::{leading_year, normalize_isbn, opt, parse_xml};
use crate::error::UpstreamError;
use crate::http::HttpSource;
use crate::source::{DataSource, Operation, Params};
use crate::xml::XmlNode;

pub const NAME: &str = "isfdb";
pub const DEFAULT_BASE_URL: &str = "https://www.isfdb.org";

const OPERATIONS: &[Operation] = &[Operation {
    name: "publication",
    description: "Publications matching an ISBN",
    required: &["isbn"],
    optional: &[],
}];

pub struct IsfdbSource {
    http: HttpSource,
}

impl IsfdbSource {
    pub fn new(client: reqwest::Client, base_url: impl Into<String>) -> Self {
        Self {
            http: HttpSource::new(NAME, client, base_url),
        }
    }

    async fn publication(&self, isbn: &str) -> Result<Value, UpstreamError> {
        let isbn = normalize_isbn(isbn)?;
        let what = format!("ISBN {isbn}");
        // The ISBN is the bare query string, not a key=value pair.
        let mut url = self.http.endpoint(&["cgi-bin", "rest", "getpub.cgi"])?;
        url.set_query(Some(&isbn));
        let body = self
            .http
            .get_text(url, &[], &what)
            .await?;
        let root = parse_xml(NAME, &body)?;
        let publications: Vec<Value> = root
            .find("Publications")
            .map(|p| p.children_named("Publication").map(normalize_publication).collect())
            .unwrap_or_default();
        if publications.is_empty() {
            return Err(UpstreamError::not_found(NAME, what));
        }
        Ok(json!({
            "isbn": isbn,
            "count": publications.len(),
            "publications": publications,
        }))
    }
}

fn normalize_publication(p: &XmlNode) -> Value {
    let record = p.text_at("Record");
    let authors: Vec<Value> = p
        .find("Authors")
        .map(|a| {
            a.children_named("Author")
                .map(|n| n.text.trim().to_string())
                .filter(|s| !s.is_empty())
                .map(Value::String)
                .collect()
        })
        .unwrap_or_default();
    json!({
        "id": opt(record.clone()),
        "title": opt(p.text_at("Title")),
        "authors": authors,
        "year": leading_year(p.text_at("Year")),
        "publisher": opt(p.text_at("Publisher")),
        "format": opt(p.text_at("PubFormat")),
        "type": opt(p.text_at("PubType")),
        "pages": opt(p.text_at("Pages")),
        "price": opt(p.text_at("Price")),
        "cover_url": opt(p.text_at("Image")),
        "url": opt(record.map(|r| format!("{DEFAULT_BASE_URL}/cgi-bin/pl.cgi?{r}"))),
    })
}

#[async_trait]
impl DataSource for IsfdbSource {
    fn name(&self) -> &'static str {
        NAME
    }

    fn description(&self) -> &'static str {
        "Internet Speculative Fiction Database"
    }

    fn operations(&self) -> &'static [Operation] {
        OPERATIONS
    }

    async fn fetch(&self, operation: &str, params: &Value) -> Result<Value, UpstreamError> {
        let p = Params::new(params);
        match operation {
            "publication" => self.publication(&p.required("isbn")?).await,
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

    const PUB_XML: &str = r#"<?xml version="1.0" encoding="iso-8859-1" ?>
<ISFDB>
  <Records>1</Records>
  <Publications>
    <Publication>
      <Record>293439</Record>
      <Title>Dune</Title>
      <Authors><Author>Frank Herbert</Author></Authors>
      <Year>1990-09-00</Year>
      <Isbn>0441172717</Isbn>
      <Publisher>Ace Books</Publisher>
      <PubFormat>pb</PubFormat>
      <PubType>NOVEL</PubType>
      <Pages>535</Pages>
    </Publication>
  </Publications>
</ISFDB>"#;

    fn source(url: &str) -> IsfdbSource {
        IsfdbSource::new(build_client(Duration::from_secs(5)), url)
    }

    #[tokio::test]
    async fn publication_is_normalized() {
        let mut server = mockito::Server::new_async().await;
        let _m = server
            .mock("GET", mockito::Matcher::Regex("^/cgi-bin/rest/getpub.cgi".into()))
            .with_status(200)
            .with_body(PUB_XML)
            .create_async()
            .await;

        let out = source(&server.url())
            .fetch("publication", &json!({"isbn": "0441172717"}))
            .await
            .unwrap();
        let p = &out["publications"][0];
        assert_eq!(p["title"], "Dune");
        assert_eq!(p["year"], 1990);
        assert_eq!(p["authors"], json!(["Frank Herbert"]));
        assert_eq!(p["cover_url"], Value::Null);
        assert_eq!(p["url"], "https://www.isfdb.org/cgi-bin/pl.cgi?293439");
    }

    #[tokio::test]
    async fn zero_records_is_not_found() {
        let mut server = mockito::Server::new_async().await;
        let _m = server
            .mock("GET", mockito::Matcher::Regex("^/cgi-bin/rest/getpub.cgi".into()))
            .with_status(200)
            .with_body("<ISFDB><Records>0</Records><Publications></Publications></ISFDB>")
            .create_async()
            .await;

        let err = source(&server.url())
            .fetch("publication", &json!({"isbn": "0000000000"}))
            .await
            .unwrap_err();
        assert_matches!(err, UpstreamError::NotFound { .. });
    }

    #[tokio::test]
    async fn invalid_isbn_never_reaches_network() {
        let err = source("http://unused.invalid")
            .fetch("publication", &json!({"isbn": "dune"}))
            .await
            .unwrap_err();
        assert_matches!(err, UpstreamError::InvalidParameter(_));
    }
}
