//! Zotero Web API v3 client

use async_trait::async_trait;
use refcat_common::config::ZoteroCredentials;
use refcat_common::model::{CollectionInfo, RawItem};
use reqwest::header::{HeaderMap, HeaderValue};
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::time::Duration;

use super::{fetch_paged, CatalogSource, ZoteroError, PAGE_SIZE};

const USER_AGENT: &str = concat!("refcat/", env!("CARGO_PKG_VERSION"));
const API_VERSION: &str = "3";
const VERSION_HEADER: &str = "last-modified-version";

/// Collection entry as returned by `GET /collections`
#[derive(Debug, Deserialize)]
struct ApiCollection {
    key: String,
    data: ApiCollectionData,
    #[serde(default)]
    meta: ApiCollectionMeta,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ApiCollectionData {
    name: String,
    /// Parent key, or `false` for top-level collections
    #[serde(default)]
    parent_collection: serde_json::Value,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ApiCollectionMeta {
    #[serde(default)]
    num_items: u64,
}

impl From<ApiCollection> for CollectionInfo {
    fn from(api: ApiCollection) -> Self {
        let parent_collection = match api.data.parent_collection {
            serde_json::Value::String(key) if !key.is_empty() => Some(key),
            _ => None,
        };
        CollectionInfo {
            key: api.key,
            name: api.data.name,
            parent_collection,
            num_items: api.meta.num_items,
        }
    }
}

/// Client for one user or group library
pub struct ZoteroClient {
    http_client: reqwest::Client,
    library_url: String,
}

impl ZoteroClient {
    pub fn new(
        credentials: &ZoteroCredentials,
        base_url: &str,
        timeout: Duration,
    ) -> Result<Self, ZoteroError> {
        let mut headers = HeaderMap::new();
        headers.insert("Zotero-API-Version", HeaderValue::from_static(API_VERSION));
        let api_key = HeaderValue::from_str(&credentials.api_key)
            .map_err(|_| ZoteroError::InvalidConfig("API key is not a valid header value".into()))?;
        headers.insert("Zotero-API-Key", api_key);

        let http_client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .default_headers(headers)
            .timeout(timeout)
            .build()
            .map_err(|e| ZoteroError::Network(e.to_string()))?;

        let library_url = format!(
            "{}/{}/{}",
            base_url.trim_end_matches('/'),
            credentials.library_type.path_segment(),
            credentials.library_id
        );

        Ok(Self {
            http_client,
            library_url,
        })
    }

    /// Library root, e.g. `https://api.zotero.org/groups/12345`
    pub fn library_url(&self) -> &str {
        &self.library_url
    }

    /// GET a library-relative path, mapping error statuses
    async fn get(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<reqwest::Response, ZoteroError> {
        let url = format!("{}{}", self.library_url, path);
        tracing::debug!(url = %url, ?query, "Querying Zotero API");

        let response = self
            .http_client
            .get(&url)
            .query(query)
            .send()
            .await
            .map_err(|e| ZoteroError::Network(e.to_string()))?;

        let status = response.status();
        match status {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Err(ZoteroError::Unauthorized),
            StatusCode::NOT_FOUND => Err(ZoteroError::NotFound(path.to_string())),
            StatusCode::TOO_MANY_REQUESTS => Err(ZoteroError::RateLimited),
            s if !s.is_success() => {
                let error_text = response.text().await.unwrap_or_default();
                Err(ZoteroError::Api(s.as_u16(), error_text))
            }
            _ => Ok(response),
        }
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T, ZoteroError> {
        self.get(path, query)
            .await?
            .json()
            .await
            .map_err(|e| ZoteroError::Parse(e.to_string()))
    }
}

#[async_trait]
impl CatalogSource for ZoteroClient {
    async fn fetch_collections(&self) -> Result<Vec<CollectionInfo>, ZoteroError> {
        let collections: Vec<ApiCollection> = fetch_paged(usize::MAX, |start| {
            let query = [("start", start.to_string()), ("limit", PAGE_SIZE.to_string())];
            async move { self.get_json("/collections", &query).await }
        })
        .await
        .map_err(|e| e.context("Failed to fetch collections"))?;

        Ok(collections.into_iter().map(CollectionInfo::from).collect())
    }

    async fn fetch_items_from_collection(
        &self,
        collection_key: &str,
        limit: usize,
    ) -> Result<Vec<RawItem>, ZoteroError> {
        let path = format!("/collections/{}/items/top", collection_key);

        let items: Vec<RawItem> = fetch_paged(limit, |start| {
            let path = path.as_str();
            let query = [("start", start.to_string()), ("limit", PAGE_SIZE.to_string())];
            async move { self.get_json(path, &query).await }
        })
        .await
        .map_err(|e| e.context(format!("Failed to fetch items from collection {}", collection_key)))?;

        tracing::debug!(collection = %collection_key, count = items.len(), "Fetched collection items");
        Ok(items)
    }

    async fn fetch_item(&self, item_key: &str) -> Result<RawItem, ZoteroError> {
        self.get_json(&format!("/items/{}", item_key), &[])
            .await
            .map_err(|e| e.context(format!("Failed to fetch item {}", item_key)))
    }

    async fn search_items(&self, query: &str, limit: usize) -> Result<Vec<RawItem>, ZoteroError> {
        let params = [("q", query.to_string()), ("limit", limit.to_string())];
        self.get_json("/items/top", &params)
            .await
            .map_err(|e| e.context("Failed to search items"))
    }

    async fn collection_version(
        &self,
        collection_key: &str,
    ) -> Result<Option<String>, ZoteroError> {
        let path = format!("/collections/{}/items/top", collection_key);
        let response = self
            .get(&path, &[("limit", "1".to_string())])
            .await
            .map_err(|e| e.context(format!("Failed to check version of {}", collection_key)))?;

        let version = response
            .headers()
            .get(VERSION_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty());

        Ok(version)
    }
}
