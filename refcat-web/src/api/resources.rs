//! Catalog endpoints: resource listing, item detail, search, collections

use axum::{
    extract::{Path, Query, State},
    routing::get,
    Json, Router,
};
use futures::future::try_join_all;
use refcat_common::catalog::{
    count_by_family, deduplicate_resources, prepare_for_card, prepare_for_detail, resource_stats,
    CardView, DetailView, ResourceStats,
};
use refcat_common::filters::{
    filter_options, matches_filters, matches_query, ActiveFilters, FilterOptions,
};
use refcat_common::model::CollectionInfo;
use refcat_common::transform::{transform_item, transform_items, CollectionContext};
use refcat_common::{Family, Resource};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::str::FromStr;
use tracing::debug;

use crate::library::{collection_names, load_collection};
use crate::pagination::{calculate_pagination, DEFAULT_PER_PAGE, MAX_PER_PAGE};
use crate::zotero::fetch_item_collections;
use crate::{ApiError, ApiResult, AppState};

/// Default number of search results
pub const DEFAULT_SEARCH_LIMIT: usize = 50;

/// Output shape of listed resources
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ViewFormat {
    #[default]
    Card,
    Detail,
}

impl ViewFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            ViewFormat::Card => "card",
            ViewFormat::Detail => "detail",
        }
    }
}

impl FromStr for ViewFormat {
    type Err = ApiError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "card" => Ok(ViewFormat::Card),
            "detail" => Ok(ViewFormat::Detail),
            other => Err(ApiError::BadRequest(format!(
                "Invalid format '{}'. Must be: card or detail",
                other
            ))),
        }
    }
}

/// Query parameters of `GET /resources`
///
/// Kept as strings so malformed values produce JSON 400 responses.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceQuery {
    /// Comma-separated collection keys
    pub collection: Option<String>,
    pub family: Option<String>,
    pub page: Option<String>,
    pub per_page: Option<String>,
    pub format: Option<String>,
    /// Comma-separated collection names
    pub section: Option<String>,
    pub tag: Option<String>,
    #[serde(rename = "type")]
    pub item_type: Option<String>,
    pub language: Option<String>,
    /// Free text matched against title, creators and abstract
    pub q: Option<String>,
}

impl ResourceQuery {
    fn active_filters(&self) -> ActiveFilters {
        ActiveFilters {
            sections: split_list(self.section.as_deref()),
            tags: split_list(self.tag.as_deref()),
            types: split_list(self.item_type.as_deref()),
            languages: split_list(self.language.as_deref()),
        }
    }
}

/// Comma-separated values, trimmed, blanks dropped
fn split_list(value: Option<&str>) -> Vec<String> {
    value
        .unwrap_or_default()
        .split(',')
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
        .collect()
}

/// Parse an integer parameter, `default` when absent or blank
fn parse_number(name: &str, value: Option<&str>, default: i64) -> ApiResult<i64> {
    match value.map(str::trim).filter(|v| !v.is_empty()) {
        None => Ok(default),
        Some(v) => v.parse::<i64>().map_err(|_| {
            ApiError::BadRequest(format!("Invalid {}: '{}' is not a number", name, v))
        }),
    }
}

fn clamp_to_usize(value: i64, min: usize, max: usize) -> usize {
    usize::try_from(value.max(0)).unwrap_or(max).clamp(min, max)
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum ResourceViews {
    Card(Vec<CardView>),
    Detail(Vec<DetailView>),
}

#[derive(Debug, Serialize)]
pub struct CollectionRef {
    pub key: String,
    pub name: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceListMeta {
    pub total: usize,
    pub page: usize,
    pub per_page: usize,
    pub total_pages: usize,
    pub collections: Vec<CollectionRef>,
    pub family_filter: Option<Family>,
    pub format: &'static str,
    pub stats: ResourceStats,
    pub count_by_family: BTreeMap<Family, usize>,
    /// Facets of the listed collections before any filtering
    pub filter_options: FilterOptions,
}

#[derive(Debug, Serialize)]
pub struct ResourceListResponse {
    pub success: bool,
    pub data: ResourceViews,
    pub meta: ResourceListMeta,
}

/// GET /resources
///
/// Fetches every requested collection concurrently (through the cache),
/// merges duplicates, applies the family, facet and free-text filters and
/// returns one page. Stats and family counts cover the filtered list.
pub async fn list_resources(
    State(state): State<AppState>,
    Query(query): Query<ResourceQuery>,
) -> ApiResult<Json<ResourceListResponse>> {
    let collection_keys = split_list(query.collection.as_deref());
    if collection_keys.is_empty() {
        return Err(ApiError::BadRequest(
            "Missing required parameter: collection".to_string(),
        ));
    }

    let family_filter = match query.family.as_deref().filter(|f| !f.is_empty()) {
        Some(f) => Some(Family::from_str(f).map_err(|_| {
            ApiError::BadRequest(
                "Invalid family. Must be: bibliographic, multimedia, technical, or webpage"
                    .to_string(),
            )
        })?),
        None => None,
    };

    let format = match query.format.as_deref().filter(|f| !f.is_empty()) {
        Some(f) => f.parse::<ViewFormat>()?,
        None => ViewFormat::default(),
    };

    let page = parse_number("page", query.page.as_deref(), 1)?;
    let per_page = parse_number("perPage", query.per_page.as_deref(), DEFAULT_PER_PAGE as i64)?;
    let page = clamp_to_usize(page, 1, usize::MAX);
    let per_page = clamp_to_usize(per_page, 1, MAX_PER_PAGE);

    let names = collection_names(&state).await;
    let per_collection = try_join_all(
        collection_keys
            .iter()
            .map(|key| load_collection(&state, key, &names)),
    )
    .await?;

    let all: Vec<Resource> = per_collection
        .iter()
        .flat_map(|resources| resources.iter().cloned())
        .collect();
    let merged = deduplicate_resources(all);
    let options = filter_options(&merged);

    let filters = query.active_filters();
    let resources: Vec<Resource> = merged
        .into_iter()
        .filter(|r| family_filter.map_or(true, |f| r.family() == f))
        .filter(|r| matches_filters(r, &filters))
        .filter(|r| matches_query(r, query.q.as_deref().unwrap_or_default()))
        .collect();

    let pagination = calculate_pagination(resources.len(), page, per_page);
    let page_items = pagination.slice(&resources);
    let data = match format {
        ViewFormat::Card => ResourceViews::Card(page_items.iter().map(prepare_for_card).collect()),
        ViewFormat::Detail => {
            ResourceViews::Detail(page_items.iter().map(prepare_for_detail).collect())
        }
    };

    debug!(
        collections = collection_keys.len(),
        total = resources.len(),
        page = pagination.page,
        "Listing resources"
    );

    let meta = ResourceListMeta {
        total: resources.len(),
        page: pagination.page,
        per_page: pagination.per_page,
        total_pages: pagination.total_pages,
        collections: collection_keys
            .iter()
            .map(|key| CollectionRef {
                key: key.clone(),
                name: names.get(key).unwrap_or_default().to_string(),
            })
            .collect(),
        family_filter,
        format: format.as_str(),
        stats: resource_stats(&resources),
        count_by_family: count_by_family(&resources),
        filter_options: options,
    };

    Ok(Json(ResourceListResponse {
        success: true,
        data,
        meta,
    }))
}

#[derive(Debug, Serialize)]
pub struct ResourceDetailResponse {
    pub success: bool,
    pub data: DetailView,
}

/// GET /resources/:id
///
/// `manifestoPart` lists every collection the item belongs to.
pub async fn get_resource(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<ResourceDetailResponse>> {
    let raw = state.source.fetch_item(&id).await.map_err(|e| {
        if e.is_not_found() {
            ApiError::NotFound(format!("Resource '{}' not found", id))
        } else {
            ApiError::Upstream(e)
        }
    })?;

    let collections = fetch_item_collections(state.source.as_ref(), &raw).await;
    let context = collections
        .first()
        .map(|c| CollectionContext::new(c.name.clone(), c.key.clone()))
        .unwrap_or_default();

    let mut resource = transform_item(&raw, &context);
    resource.manifesto_part = collections
        .iter()
        .map(|c| c.name.clone())
        .filter(|name| !name.is_empty())
        .collect();

    Ok(Json(ResourceDetailResponse {
        success: true,
        data: prepare_for_detail(&resource),
    }))
}

#[derive(Debug, Default, Deserialize)]
pub struct SearchQuery {
    pub q: Option<String>,
    pub limit: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct SearchMeta {
    pub query: String,
    pub total: usize,
}

#[derive(Debug, Serialize)]
pub struct SearchResponse {
    pub success: bool,
    pub data: Vec<CardView>,
    pub meta: SearchMeta,
}

/// GET /search?q=&limit=
pub async fn search_resources(
    State(state): State<AppState>,
    Query(query): Query<SearchQuery>,
) -> ApiResult<Json<SearchResponse>> {
    let q = query
        .q
        .as_deref()
        .map(str::trim)
        .filter(|q| !q.is_empty())
        .ok_or_else(|| ApiError::BadRequest("Missing required parameter: q".to_string()))?;

    let limit = parse_number("limit", query.limit.as_deref(), DEFAULT_SEARCH_LIMIT as i64)?;
    let limit = clamp_to_usize(limit, 1, MAX_PER_PAGE);

    let raws = state.source.search_items(q, limit).await?;
    let resources = transform_items(&raws, &CollectionContext::default());

    Ok(Json(SearchResponse {
        success: true,
        meta: SearchMeta {
            query: q.to_string(),
            total: resources.len(),
        },
        data: resources.iter().map(prepare_for_card).collect(),
    }))
}

#[derive(Debug, Serialize)]
pub struct CollectionsResponse {
    pub success: bool,
    pub data: Vec<CollectionInfo>,
}

/// GET /collections
pub async fn list_collections(State(state): State<AppState>) -> ApiResult<Json<CollectionsResponse>> {
    let collections = state.source.fetch_collections().await?;
    Ok(Json(CollectionsResponse {
        success: true,
        data: collections,
    }))
}

pub fn resource_routes() -> Router<AppState> {
    Router::new()
        .route("/resources", get(list_resources))
        .route("/resources/:id", get(get_resource))
        .route("/search", get(search_resources))
        .route("/collections", get(list_collections))
}
