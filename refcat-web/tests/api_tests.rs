//! Integration tests for refcat-web API endpoints
//!
//! The router runs against an in-memory library fake, so every test is
//! hermetic. Version stores are real (in-memory SQLite or a temp file).

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    Router,
};
use refcat_common::config::TomlConfig;
use refcat_common::model::{CollectionInfo, RawItem};
use refcat_common::versions::{FileVersionStore, SqliteVersionStore, VersionStore};
use refcat_web::zotero::{CatalogSource, ZoteroError};
use refcat_web::{build_router, AppState};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::Notify;
use tower::util::ServiceExt; // for `oneshot` method

const PART_1: &str = "F9DNTXQA";
const PART_2: &str = "ZD2RV8H9";

/// Holds the next collection fetch after it has read its items
#[derive(Default)]
struct FetchGate {
    entered: Notify,
    release: Notify,
}

/// In-memory stand-in for the upstream library
#[derive(Default)]
struct FakeLibrary {
    collections: Vec<CollectionInfo>,
    items: HashMap<String, Vec<RawItem>>,
    versions: Mutex<HashMap<String, String>>,
    item_fetches: AtomicUsize,
    /// Number of upcoming collection-list requests that fail
    collection_failures: AtomicUsize,
    /// Item key → title replacing the stored one
    retitled: Mutex<HashMap<String, String>>,
    gate: Mutex<Option<Arc<FetchGate>>>,
}

impl FakeLibrary {
    fn set_version(&self, key: &str, version: &str) {
        self.versions
            .lock()
            .unwrap()
            .insert(key.to_string(), version.to_string());
    }

    fn retitle(&self, item_key: &str, title: &str) {
        self.retitled
            .lock()
            .unwrap()
            .insert(item_key.to_string(), title.to_string());
    }

    fn gate_next_fetch(&self) -> Arc<FetchGate> {
        let gate = Arc::new(FetchGate::default());
        *self.gate.lock().unwrap() = Some(gate.clone());
        gate
    }
}

#[async_trait]
impl CatalogSource for FakeLibrary {
    async fn fetch_collections(&self) -> Result<Vec<CollectionInfo>, ZoteroError> {
        let failing = self
            .collection_failures
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if failing {
            return Err(ZoteroError::Network("connection reset".to_string())
                .context("Failed to fetch collections"));
        }
        Ok(self.collections.clone())
    }

    async fn fetch_items_from_collection(
        &self,
        collection_key: &str,
        limit: usize,
    ) -> Result<Vec<RawItem>, ZoteroError> {
        self.item_fetches.fetch_add(1, Ordering::SeqCst);
        let items: Vec<RawItem> = match self.items.get(collection_key) {
            Some(items) => {
                let retitled = self.retitled.lock().unwrap();
                items
                    .iter()
                    .take(limit)
                    .cloned()
                    .map(|mut item| {
                        if let Some(title) = retitled.get(&item.key) {
                            item.data.title = Some(title.clone());
                        }
                        item
                    })
                    .collect()
            }
            None => {
                return Err(ZoteroError::Api(500, "boom".to_string())
                    .context(format!("Failed to fetch items from collection {}", collection_key)))
            }
        };

        let gate = self.gate.lock().unwrap().take();
        if let Some(gate) = gate {
            gate.entered.notify_one();
            gate.release.notified().await;
        }
        Ok(items)
    }

    async fn fetch_item(&self, item_key: &str) -> Result<RawItem, ZoteroError> {
        self.items
            .values()
            .flatten()
            .find(|item| item.key == item_key)
            .cloned()
            .ok_or_else(|| ZoteroError::NotFound(format!("/items/{}", item_key)))
    }

    async fn search_items(&self, query: &str, limit: usize) -> Result<Vec<RawItem>, ZoteroError> {
        let query = query.to_lowercase();
        let mut seen = Vec::new();
        for item in self.items.values().flatten() {
            let title = item.data.title.clone().unwrap_or_default().to_lowercase();
            if title.contains(&query) && !seen.iter().any(|s: &RawItem| s.key == item.key) {
                seen.push(item.clone());
            }
        }
        seen.truncate(limit);
        Ok(seen)
    }

    async fn collection_version(
        &self,
        collection_key: &str,
    ) -> Result<Option<String>, ZoteroError> {
        Ok(self.versions.lock().unwrap().get(collection_key).cloned())
    }
}

fn item(value: Value) -> RawItem {
    serde_json::from_value(value).expect("valid raw item")
}

fn collection(key: &str, name: &str) -> CollectionInfo {
    CollectionInfo {
        key: key.to_string(),
        name: name.to_string(),
        parent_collection: None,
        num_items: 0,
    }
}

/// Two collections sharing the item "SHARED"
fn sample_library() -> FakeLibrary {
    let shared = item(json!({
        "key": "SHARED",
        "version": 3,
        "data": {
            "itemType": "journalArticle",
            "title": "Brain waves",
            "creators": [{"creatorType": "author", "firstName": "Jane", "lastName": "Doe"}],
            "date": "2021-03-01",
            "publicationTitle": "NeuroJournal",
            "volume": "12",
            "DOI": "10.1000/xyz",
            "language": "en",
            "tags": [{"tag": "EEG"}]
        }
    }));

    let mut items = HashMap::new();
    items.insert(
        PART_1.to_string(),
        vec![
            shared.clone(),
            item(json!({
                "key": "BOOK1",
                "data": {"itemType": "book", "title": "Signals", "publisher": "MIT Press", "language": "fr"}
            })),
            item(json!({
                "key": "SOFT1",
                "data": {"itemType": "software", "title": "OpenBCI GUI", "programmingLanguage": "Python"}
            })),
        ],
    );
    items.insert(
        PART_2.to_string(),
        vec![
            shared,
            item(json!({
                "key": "VID1",
                "data": {
                    "itemType": "videoRecording",
                    "title": "Workshop recording",
                    "runningTime": "1:02:00",
                    "tags": ["Workshop"]
                }
            })),
        ],
    );

    FakeLibrary {
        collections: vec![collection(PART_1, "Part 1: Validity"), collection(PART_2, "Part 2: Ethics")],
        items,
        ..Default::default()
    }
}

async fn setup_app_with(
    library: Arc<FakeLibrary>,
    store: Arc<dyn VersionStore>,
    config: TomlConfig,
) -> Router {
    let state = AppState::new(config, library, store);
    build_router(state)
}

async fn setup_app(library: Arc<FakeLibrary>) -> Router {
    let store = SqliteVersionStore::in_memory().await.unwrap();
    let config = TomlConfig {
        watched_collections: vec![PART_1.to_string(), PART_2.to_string()],
        ..Default::default()
    };
    setup_app_with(library, Arc::new(store), config).await
}

fn test_request(method: &str, uri: &str) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

async fn extract_json(body: Body) -> Value {
    let bytes = axum::body::to_bytes(body, usize::MAX)
        .await
        .expect("Should read body");
    serde_json::from_slice(&bytes).expect("Should parse JSON")
}

async fn get_json(app: &Router, uri: &str) -> (StatusCode, Value) {
    let response = app.clone().oneshot(test_request("GET", uri)).await.unwrap();
    let status = response.status();
    (status, extract_json(response.into_body()).await)
}

// =============================================================================
// Health
// =============================================================================

#[tokio::test]
async fn test_health_endpoint() {
    let app = setup_app(Arc::new(FakeLibrary::default())).await;

    let (status, body) = get_json(&app, "/health").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["module"], "refcat-web");
    assert!(body["version"].is_string());
    assert!(body["uptimeSeconds"].is_u64());
}

// =============================================================================
// Resource listing
// =============================================================================

#[tokio::test]
async fn test_resources_parameter_validation() {
    let app = setup_app(Arc::new(sample_library())).await;

    let cases = [
        ("/resources", "Missing required parameter: collection"),
        ("/resources?collection=%20,%20", "Missing required parameter: collection"),
        (
            "/resources?collection=F9DNTXQA&family=podcasts",
            "Invalid family. Must be: bibliographic, multimedia, technical, or webpage",
        ),
        ("/resources?collection=F9DNTXQA&format=table", "Invalid format 'table'. Must be: card or detail"),
        ("/resources?collection=F9DNTXQA&page=two", "Invalid page: 'two' is not a number"),
        ("/resources?collection=F9DNTXQA&perPage=lots", "Invalid perPage: 'lots' is not a number"),
    ];

    for (uri, message) in cases {
        let (status, body) = get_json(&app, uri).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{}", uri);
        assert_eq!(body["success"], false);
        assert_eq!(body["message"], message, "{}", uri);
    }
}

#[tokio::test]
async fn test_resources_merge_collections() {
    let app = setup_app(Arc::new(sample_library())).await;

    let (status, body) = get_json(&app, "/resources?collection=F9DNTXQA,ZD2RV8H9").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);

    let data = body["data"].as_array().unwrap();
    let ids: Vec<&str> = data.iter().map(|r| r["id"].as_str().unwrap()).collect();
    assert_eq!(ids, vec!["SHARED", "BOOK1", "SOFT1", "VID1"]);
    assert_eq!(data[0]["manifestoPart"], json!(["Part 1: Validity", "Part 2: Ethics"]));
    assert_eq!(data[0]["family"], "bibliographic");
    assert_eq!(data[0]["year"], "2021");
    assert_eq!(data[0]["language"], "English");

    let meta = &body["meta"];
    assert_eq!(meta["total"], 4);
    assert_eq!(meta["page"], 1);
    assert_eq!(meta["perPage"], 20);
    assert_eq!(meta["totalPages"], 1);
    assert_eq!(meta["format"], "card");
    assert_eq!(meta["familyFilter"], Value::Null);
    assert_eq!(
        meta["collections"],
        json!([
            {"key": PART_1, "name": "Part 1: Validity"},
            {"key": PART_2, "name": "Part 2: Ethics"}
        ])
    );
    assert_eq!(
        meta["countByFamily"],
        json!({"bibliographic": 2, "multimedia": 1, "technical": 1, "webpage": 0})
    );
    assert_eq!(meta["stats"]["total"], 4);
    assert_eq!(meta["stats"]["byType"]["book"], 1);
    assert_eq!(meta["filterOptions"]["sections"], json!(["Part 1: Validity", "Part 2: Ethics"]));
}

#[tokio::test]
async fn test_resources_card_omits_detail_fields() {
    let app = setup_app(Arc::new(sample_library())).await;

    let (_, card) = get_json(&app, "/resources?collection=F9DNTXQA&perPage=1").await;
    let (_, detail) = get_json(&app, "/resources?collection=F9DNTXQA&perPage=1&format=detail").await;

    let card = &card["data"][0];
    let detail = &detail["data"][0];
    assert!(card.get("citation").is_none());
    assert!(card.get("doi").is_none());
    assert_eq!(detail["doi"], "10.1000/xyz");
    assert!(detail["citation"]
        .as_str()
        .unwrap()
        .starts_with("Doe, J. (2021) Brain waves. *NeuroJournal*, 12"));
    for (field, value) in card.as_object().unwrap() {
        assert_eq!(&detail[field], value, "{} differs", field);
    }
}

#[tokio::test]
async fn test_resources_pagination() {
    let app = setup_app(Arc::new(sample_library())).await;

    let (_, body) = get_json(&app, "/resources?collection=F9DNTXQA,ZD2RV8H9&perPage=3&page=2").await;
    assert_eq!(body["meta"]["totalPages"], 2);
    assert_eq!(body["data"].as_array().unwrap().len(), 1);
    assert_eq!(body["data"][0]["id"], "VID1");

    let (_, body) = get_json(&app, "/resources?collection=F9DNTXQA&perPage=500&page=0").await;
    assert_eq!(body["meta"]["perPage"], 100);
    assert_eq!(body["meta"]["page"], 1);

    // pages past the end are empty, not clamped
    let (status, body) = get_json(&app, "/resources?collection=F9DNTXQA&page=7").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["meta"]["page"], 7);
    assert!(body["data"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_resources_filters() {
    let app = setup_app(Arc::new(sample_library())).await;

    let (_, body) = get_json(&app, "/resources?collection=F9DNTXQA,ZD2RV8H9&family=technical").await;
    assert_eq!(body["meta"]["total"], 1);
    assert_eq!(body["meta"]["familyFilter"], "technical");
    assert_eq!(body["data"][0]["id"], "SOFT1");
    assert_eq!(body["meta"]["countByFamily"]["bibliographic"], 0);

    let (_, body) = get_json(&app, "/resources?collection=F9DNTXQA,ZD2RV8H9&language=French,Unknown").await;
    let ids: Vec<&str> = body["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|r| r["id"].as_str().unwrap())
        .collect();
    assert_eq!(ids, vec!["BOOK1", "SOFT1", "VID1"]);

    let (_, body) = get_json(
        &app,
        "/resources?collection=F9DNTXQA,ZD2RV8H9&section=Part%202%3A%20Ethics&tag=Workshop",
    )
    .await;
    assert_eq!(body["meta"]["total"], 1);
    assert_eq!(body["data"][0]["id"], "VID1");

    let (_, body) = get_json(&app, "/resources?collection=F9DNTXQA,ZD2RV8H9&q=DOE").await;
    assert_eq!(body["meta"]["total"], 1);
    assert_eq!(body["data"][0]["id"], "SHARED");
}

#[tokio::test]
async fn test_empty_collection() {
    let mut library = FakeLibrary::default();
    library.items.insert("EMPTY".to_string(), Vec::new());
    let app = setup_app(Arc::new(library)).await;

    let (status, body) = get_json(&app, "/resources?collection=EMPTY").await;

    assert_eq!(status, StatusCode::OK);
    assert!(body["data"].as_array().unwrap().is_empty());
    assert_eq!(body["meta"]["total"], 0);
    assert_eq!(body["meta"]["totalPages"], 1);
    assert_eq!(body["meta"]["stats"]["total"], 0);
    assert_eq!(
        body["meta"]["countByFamily"],
        json!({"bibliographic": 0, "multimedia": 0, "technical": 0, "webpage": 0})
    );
    assert_eq!(body["meta"]["collections"][0]["name"], "");
}

#[tokio::test]
async fn test_upstream_failure_is_500() {
    let app = setup_app(Arc::new(sample_library())).await;

    let (status, body) = get_json(&app, "/resources?collection=F9DNTXQA,NOPE").await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["success"], false);
    assert!(body["message"].as_str().unwrap().contains("NOPE"));
}

// =============================================================================
// Caching and revalidation
// =============================================================================

#[tokio::test]
async fn test_listing_is_cached_until_revalidated() {
    let library = Arc::new(sample_library());
    let app = setup_app(library.clone()).await;

    get_json(&app, "/resources?collection=F9DNTXQA").await;
    get_json(&app, "/resources?collection=F9DNTXQA").await;
    assert_eq!(library.item_fetches.load(Ordering::SeqCst), 1);

    let response = app
        .clone()
        .oneshot(test_request("POST", "/revalidate"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = extract_json(response.into_body()).await;
    assert_eq!(body["success"], true);
    assert_eq!(body["message"], "Cache revalidated successfully");
    assert!(body["revalidatedAt"].as_str().unwrap().ends_with('Z'));

    get_json(&app, "/resources?collection=F9DNTXQA").await;
    assert_eq!(library.item_fetches.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_listing_not_cached_without_collection_names() {
    let library = Arc::new(sample_library());
    library.collection_failures.store(1, Ordering::SeqCst);
    let app = setup_app(library.clone()).await;

    let (status, body) = get_json(&app, "/resources?collection=F9DNTXQA").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["meta"]["collections"][0]["name"], "");
    assert_eq!(body["data"][0]["manifestoPart"], json!([]));

    let (_, body) = get_json(&app, "/resources?collection=F9DNTXQA").await;
    assert_eq!(body["meta"]["collections"][0]["name"], "Part 1: Validity");
    assert_eq!(body["data"][0]["manifestoPart"], json!(["Part 1: Validity"]));
    assert_eq!(library.item_fetches.load(Ordering::SeqCst), 2);

    let (_, body) =
        get_json(&app, "/resources?collection=F9DNTXQA&section=Part%201%3A%20Validity").await;
    assert_eq!(body["meta"]["total"], 3);

    // names recovered, so this listing was cached
    get_json(&app, "/resources?collection=F9DNTXQA").await;
    assert_eq!(library.item_fetches.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_revalidate_during_fetch_discards_stale_listing() {
    let library = Arc::new(sample_library());
    let app = setup_app(library.clone()).await;
    let uri = "/resources?collection=F9DNTXQA&format=detail";

    let gate = library.gate_next_fetch();

    let in_flight = tokio::spawn({
        let app = app.clone();
        async move { get_json(&app, uri).await }
    });
    gate.entered.notified().await;

    library.retitle("BOOK1", "Signals, 2nd edition");
    let response = app
        .clone()
        .oneshot(test_request("POST", "/revalidate"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    gate.release.notify_one();
    let (status, stale) = in_flight.await.unwrap();
    assert_eq!(status, StatusCode::OK);
    assert_eq!(stale["data"][1]["title"], "Signals");

    let (_, fresh) = get_json(&app, uri).await;
    assert_eq!(fresh["data"][1]["id"], "BOOK1");
    assert_eq!(fresh["data"][1]["title"], "Signals, 2nd edition");
    assert_eq!(library.item_fetches.load(Ordering::SeqCst), 2);
}

// =============================================================================
// Poll
// =============================================================================

#[tokio::test]
async fn test_poll_detects_and_persists_changes() {
    let library = Arc::new(sample_library());
    library.set_version(PART_1, "1234");
    library.set_version(PART_2, "88");

    let dir = tempfile::tempdir().unwrap();
    let versions_path = dir.path().join(".zotero-versions.json");
    let store = FileVersionStore::new(&versions_path);
    store.set(PART_2, "88").await.unwrap();

    let config = TomlConfig {
        watched_collections: vec![PART_1.to_string(), PART_2.to_string()],
        ..Default::default()
    };
    let app = setup_app_with(library.clone(), Arc::new(store), config).await;

    // warm the cache so the poll has something to invalidate
    get_json(&app, "/resources?collection=F9DNTXQA").await;

    let (status, body) = get_json(&app, "/poll").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["checked"], 2);
    assert_eq!(body["changed"], 1);
    assert!(body["timestamp"].is_string());
    assert_eq!(
        body["collections"],
        json!([{
            "key": PART_1,
            "name": "Part 1: Validity",
            "hasChanged": true,
            "lastVersion": "0",
            "currentVersion": "1234"
        }])
    );

    let stored: Value =
        serde_json::from_str(&std::fs::read_to_string(&versions_path).unwrap()).unwrap();
    assert_eq!(stored[PART_1], "1234");

    get_json(&app, "/resources?collection=F9DNTXQA").await;
    assert_eq!(library.item_fetches.load(Ordering::SeqCst), 2);

    let (_, body) = get_json(&app, "/poll").await;
    assert_eq!(body["changed"], 0);
    assert!(body["collections"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_poll_fails_open_without_version() {
    let library = Arc::new(sample_library());
    let app = setup_app(library).await;

    let (status, body) = get_json(&app, "/poll").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["changed"], 2);
    assert_eq!(body["collections"][0]["currentVersion"], "unknown");
}

#[tokio::test]
async fn test_poll_requires_bearer_token_when_configured() {
    let store = SqliteVersionStore::in_memory().await.unwrap();
    let config = TomlConfig {
        cron_secret: Some("s3cret".to_string()),
        ..Default::default()
    };
    let app = setup_app_with(Arc::new(sample_library()), Arc::new(store), config).await;

    let (status, body) = get_json(&app, "/poll").await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body, json!({"success": false, "error": "Unauthorized"}));

    let wrong = Request::builder()
        .uri("/poll")
        .header(header::AUTHORIZATION, "Bearer nope")
        .body(Body::empty())
        .unwrap();
    let response = app.clone().oneshot(wrong).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let right = Request::builder()
        .uri("/poll")
        .header(header::AUTHORIZATION, "Bearer s3cret")
        .body(Body::empty())
        .unwrap();
    let response = app.clone().oneshot(right).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = extract_json(response.into_body()).await;
    assert_eq!(body["checked"], 0);

    let head = app.clone().oneshot(test_request("HEAD", "/poll")).await.unwrap();
    assert_eq!(head.status(), StatusCode::OK);
}

// =============================================================================
// Detail, search, collections
// =============================================================================

#[tokio::test]
async fn test_resource_detail() {
    let mut library = sample_library();
    for items in library.items.values_mut() {
        for item in items.iter_mut().filter(|i| i.key == "SHARED") {
            item.data.collections = vec![PART_1.to_string(), PART_2.to_string()];
        }
    }
    let app = setup_app(Arc::new(library)).await;

    let (status, body) = get_json(&app, "/resources/SHARED").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["id"], "SHARED");
    assert_eq!(body["data"]["manifestoPart"], json!(["Part 1: Validity", "Part 2: Ethics"]));
    assert_eq!(body["data"]["collectionKey"], PART_1);
    assert!(body["data"]["citation"].is_string());

    let (status, body) = get_json(&app, "/resources/MISSING").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["success"], false);
}

#[tokio::test]
async fn test_search() {
    let app = setup_app(Arc::new(sample_library())).await;

    let (status, _) = get_json(&app, "/search").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = get_json(&app, "/search?q=brain&limit=x").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = get_json(&app, "/search?q=BRAIN").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["meta"]["total"], 1);
    assert_eq!(body["data"][0]["id"], "SHARED");
    assert_eq!(body["data"][0]["manifestoPart"], json!([]));
}

#[tokio::test]
async fn test_collections() {
    let app = setup_app(Arc::new(sample_library())).await;

    let (status, body) = get_json(&app, "/collections").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"].as_array().unwrap().len(), 2);
    assert_eq!(body["data"][0]["key"], PART_1);
    assert_eq!(body["data"][0]["parentCollection"], Value::Null);
}
