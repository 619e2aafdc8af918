//! Name-indexed collection of data sources.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use serde_json::Value;

use crate::error::UpstreamError;
use crate::http::{build_client, DEFAULT_TIMEOUT};
use crate::source::{check_required, DataSource, Operation};
use crate::sources::{
    gcd, goodreads, isfdb, librarything, openlibrary, rpggeek, wikipedia, GcdSource,
    GoodreadsSource, IsfdbSource, LibraryThingSource, OpenLibrarySource, RpgGeekSource,
    WikipediaSource,
};

/// Settings for the built-in sources.
#[derive(Debug, Clone)]
pub struct SourcesConfig {
    pub timeout: Duration,
    pub goodreads_api_key: Option<String>,
}

impl Default for SourcesConfig {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_TIMEOUT,
            goodreads_api_key: None,
        }
    }
}

/// One entry of `GET /sources`.
#[derive(Debug, Clone, Serialize)]
pub struct SourceDescription {
    pub name: &'static str,
    pub description: &'static str,
    pub operations: &'static [Operation],
}

#[derive(Default, Clone)]
pub struct SourceRegistry {
    sources: BTreeMap<&'static str, Arc<dyn DataSource>>,
}

impl SourceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// All seven built-in sources sharing one HTTP client.
    pub fn with_defaults(config: SourcesConfig) -> Self {
        let client = build_client(config.timeout);
        let mut registry = Self::new();
        registry.register(Arc::new(OpenLibrarySource::new(
            client.clone(),
            openlibrary::DEFAULT_BASE_URL,
        )));
        registry.register(Arc::new(WikipediaSource::new(
            client.clone(),
            wikipedia::DEFAULT_BASE_URL,
        )));
        registry.register(Arc::new(GoodreadsSource::new(
            client.clone(),
            goodreads::DEFAULT_BASE_URL,
            config.goodreads_api_key,
        )));
        registry.register(Arc::new(LibraryThingSource::new(
            client.clone(),
            librarything::DEFAULT_BASE_URL,
        )));
        registry.register(Arc::new(IsfdbSource::new(
            client.clone(),
            isfdb::DEFAULT_BASE_URL,
        )));
        registry.register(Arc::new(GcdSource::new(client.clone(), gcd::DEFAULT_BASE_URL)));
        registry.register(Arc::new(RpgGeekSource::new(client, rpggeek::DEFAULT_BASE_URL)));
        registry
    }

    /// Add a source, replacing any existing one with the same name.
    pub fn register(&mut self, source: Arc<dyn DataSource>) {
        self.sources.insert(source.name(), source);
    }

    pub fn get(&self, name: &str) -> Result<Arc<dyn DataSource>, UpstreamError> {
        self.sources
            .get(name)
            .cloned()
            .ok_or_else(|| UpstreamError::UnknownSource(name.to_string()))
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.sources.keys().copied().collect()
    }

    pub fn describe(&self) -> Vec<SourceDescription> {
        self.sources
            .values()
            .map(|s| SourceDescription {
                name: s.name(),
                description: s.description(),
                operations: s.operations(),
            })
            .collect()
    }

    /// Validate the operation and its required parameters, then run it.
    pub async fn fetch(
        &self,
        source: &str,
        operation: &str,
        params: &Value,
    ) -> Result<Value, UpstreamError> {
        let src = self.get(source)?;
        let op = src.operation(operation).ok_or_else(|| src.unsupported(operation))?;
        check_required(op, params)?;
        src.fetch(operation, params).await
    }
}
