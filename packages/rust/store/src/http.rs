//! HTTP client for a remote knowledge-graph store.
//!
//! Endpoints (relative to the configured base URL):
//! - `DELETE /entities`: drop the whole dataset
//! - `PUT /entities?id=<uri>`: create-or-update one JSON-LD document
//! - `POST /vector-search/queries`: similarity query seeded by a page URL

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderValue};
use reqwest::{Client, Response};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};
use url::Url;

use shopgraph_entities::EntityDocument;
use shopgraph_shared::{Result, ShopGraphError, StoreConfig};

use crate::{EntityStore, SimilarEntity};

/// User-Agent string for store requests.
const USER_AGENT: &str = concat!("shopgraph/", env!("CARGO_PKG_VERSION"));

/// Media type of submitted entity documents.
const JSON_LD: &str = "application/ld+json";

/// Store client speaking JSON-LD over HTTP.
pub struct HttpEntityStore {
    client: Client,
    endpoint: String,
    closed: AtomicBool,
}

impl HttpEntityStore {
    /// Build a client for `config.endpoint`.
    ///
    /// `api_key`, when given, is sent as `Authorization: Key <api_key>`.
    pub fn connect(config: &StoreConfig, api_key: Option<&str>) -> Result<Self> {
        let endpoint = config.endpoint.trim_end_matches('/').to_string();
        if !(endpoint.starts_with("http://") || endpoint.starts_with("https://")) {
            return Err(ShopGraphError::config(format!(
                "store endpoint must be an http(s) URL, got '{endpoint}'"
            )));
        }

        let mut headers = HeaderMap::new();
        if let Some(key) = api_key {
            let value = HeaderValue::from_str(&format!("Key {key}"))
                .map_err(|e| ShopGraphError::config(format!("invalid store API key: {e}")))?;
            headers.insert(AUTHORIZATION, value);
        }

        let client = Client::builder()
            .user_agent(USER_AGENT)
            .default_headers(headers)
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| ShopGraphError::Network(format!("failed to build HTTP client: {e}")))?;

        info!(%endpoint, "store client ready");

        Ok(Self {
            client,
            endpoint,
            closed: AtomicBool::new(false),
        })
    }

    /// Fail fast once the handle has been closed.
    fn check_open(&self) -> Result<()> {
        if self.closed.load(Ordering::Acquire) {
            return Err(ShopGraphError::Store("store handle is closed".into()));
        }
        Ok(())
    }

    fn entities_url(&self) -> String {
        format!("{}/entities", self.endpoint)
    }
}

impl EntityStore for HttpEntityStore {
    #[instrument(skip_all)]
    async fn delete_all_entities(&self) -> Result<()> {
        self.check_open()?;
        let url = self.entities_url();

        let response = self
            .client
            .delete(&url)
            .send()
            .await
            .map_err(|e| ShopGraphError::Network(format!("{url}: {e}")))?;
        ensure_success(&url, response).await?;

        info!("all entities deleted");
        Ok(())
    }

    #[instrument(skip_all, fields(uri = %document.id()))]
    async fn create_or_update_entity(&self, document: &EntityDocument) -> Result<()> {
        self.check_open()?;
        let url = Url::parse_with_params(&self.entities_url(), &[("id", document.id().as_str())])
            .map_err(|e| ShopGraphError::validation(format!("bad store URL: {e}")))?;
        let body = serde_json::to_vec(document)
            .map_err(|e| ShopGraphError::Store(format!("failed to encode document: {e}")))?;

        let response = self
            .client
            .put(url.clone())
            .header(CONTENT_TYPE, JSON_LD)
            .body(body)
            .send()
            .await
            .map_err(|e| ShopGraphError::Network(format!("{url}: {e}")))?;
        ensure_success(url.as_str(), response).await?;

        debug!("entity stored");
        Ok(())
    }

    #[instrument(skip(self))]
    async fn similar_entities(&self, seed_url: &str, top_k: usize) -> Result<Vec<SimilarEntity>> {
        self.check_open()?;
        let url = format!("{}/vector-search/queries", self.endpoint);
        let request = VectorQueryRequest {
            query_url: seed_url,
            similarity_top_k: top_k,
        };

        let response = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| ShopGraphError::Network(format!("{url}: {e}")))?;
        let response = ensure_success(&url, response).await?;

        let payload: VectorQueryResponse = response
            .json()
            .await
            .map_err(|e| ShopGraphError::parse(format!("{url}: invalid query response: {e}")))?;

        debug!(hits = payload.items.len(), "vector query complete");
        Ok(payload.items)
    }

    async fn close(&self) -> Result<()> {
        if !self.closed.swap(true, Ordering::AcqRel) {
            debug!(endpoint = %self.endpoint, "store handle closed");
        }
        Ok(())
    }
}

/// Turn a non-2xx response into a [`ShopGraphError::Store`], keeping the body for context.
async fn ensure_success(url: &str, response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response
        .text()
        .await
        .unwrap_or_else(|_| "<body unavailable>".to_string());
    Err(ShopGraphError::Store(format!("{url}: HTTP {status}: {body}")))
}

#[derive(Serialize)]
struct VectorQueryRequest<'a> {
    query_url: &'a str,
    similarity_top_k: usize,
}

#[derive(Debug, Deserialize)]
struct VectorQueryResponse {
    #[serde(default)]
    items: Vec<SimilarEntity>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use shopgraph_entities::EntityBuilder;
    use shopgraph_extract::normalize;
    use shopgraph_shared::{FieldValue, MappingConfig, PageType, RawPageRecord};
    use wiremock::matchers::{body_partial_json, header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn store_for(server: &MockServer, api_key: Option<&str>) -> HttpEntityStore {
        let config = StoreConfig {
            endpoint: format!("{}/", server.uri()),
            ..StoreConfig::default()
        };
        HttpEntityStore::connect(&config, api_key).expect("connect")
    }

    fn red_bag() -> EntityDocument {
        let raw = RawPageRecord {
            url: "https://shop.example/product/red-bag/".into(),
            title: Some("Red Bag".into()),
            product_price: Some(FieldValue::from("£45")),
            ..RawPageRecord::default()
        };
        let config = MappingConfig {
            base_uri: "https://data.example.org/shop".into(),
            ..MappingConfig::default()
        };
        EntityBuilder::new(&config)
            .build(&normalize(&raw, PageType::ProductDetail))
            .expect("product")
    }

    #[test]
    fn rejects_non_http_endpoint() {
        let config = StoreConfig {
            endpoint: "ftp://store.example".into(),
            ..StoreConfig::default()
        };
        assert!(HttpEntityStore::connect(&config, None).is_err());
    }

    #[tokio::test]
    async fn delete_all_hits_entities_endpoint() {
        let server = MockServer::start().await;
        Mock::given(method("DELETE"))
            .and(path("/entities"))
            .and(header("authorization", "Key secret-key"))
            .respond_with(ResponseTemplate::new(204))
            .expect(1)
            .mount(&server)
            .await;

        let store = store_for(&server, Some("secret-key"));
        store.delete_all_entities().await.expect("delete all");
    }

    #[tokio::test]
    async fn delete_all_surfaces_server_errors() {
        let server = MockServer::start().await;
        Mock::given(method("DELETE"))
            .and(path("/entities"))
            .respond_with(ResponseTemplate::new(503).set_body_string("maintenance"))
            .mount(&server)
            .await;

        let store = store_for(&server, None);
        let err = store.delete_all_entities().await.unwrap_err();
        assert!(matches!(err, ShopGraphError::Store(_)));
        assert!(err.to_string().contains("503"));
        assert!(err.to_string().contains("maintenance"));
    }

    #[tokio::test]
    async fn create_or_update_puts_json_ld_keyed_by_id() {
        let server = MockServer::start().await;
        Mock::given(method("PUT"))
            .and(path("/entities"))
            .and(query_param("id", "https://data.example.org/shop/product_red-bag"))
            .and(header("content-type", "application/ld+json"))
            .and(body_partial_json(serde_json::json!({
                "@id": "https://data.example.org/shop/product_red-bag",
                "@type": "Product",
                "name": "Red Bag",
                "offers": {"price": "45.0", "priceCurrency": "GBP"}
            })))
            .respond_with(ResponseTemplate::new(200))
            .expect(2)
            .mount(&server)
            .await;

        let store = store_for(&server, None);
        let doc = red_bag();
        // Same document twice targets the same key.
        store.create_or_update_entity(&doc).await.expect("first put");
        store.create_or_update_entity(&doc).await.expect("second put");
    }

    #[tokio::test]
    async fn similar_entities_parses_ranked_hits() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/vector-search/queries"))
            .and(body_partial_json(serde_json::json!({
                "query_url": "https://shop.example/product/red-bag/",
                "similarity_top_k": 2
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "items": [
                    {"id": "https://data.example.org/shop/product_blue-bag", "text": "Blue Bag", "score": 0.91},
                    {"id": "https://data.example.org/shop/product_tote", "text": "Tote", "score": 0.72}
                ]
            })))
            .mount(&server)
            .await;

        let store = store_for(&server, None);
        let hits = store
            .similar_entities("https://shop.example/product/red-bag/", 2)
            .await
            .expect("query");
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].text, "Blue Bag");
        assert!(hits[0].score > hits[1].score);
    }

    #[tokio::test]
    async fn similar_entities_rejects_garbled_response() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/vector-search/queries"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
            .mount(&server)
            .await;

        let store = store_for(&server, None);
        let err = store
            .similar_entities("https://shop.example/product/red-bag/", 3)
            .await
            .unwrap_err();
        assert!(matches!(err, ShopGraphError::Parse { .. }));
        assert!(err.to_string().contains("invalid query response"));
    }

    #[tokio::test]
    async fn closed_handle_rejects_calls() {
        let server = MockServer::start().await;
        let store = store_for(&server, None);
        store.close().await.expect("close");
        store.close().await.expect("close twice");

        let err = store.create_or_update_entity(&red_bag()).await.unwrap_err();
        assert!(err.to_string().contains("closed"));
    }
}
