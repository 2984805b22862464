use axum::{
    extract::{Path, Query, State},
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use serde::Deserialize;

use super::error::ApiError;
use crate::catalog::{DetailResult, ListCategory, ListResult, MediaKind, SearchKind, SearchResult};
use crate::server::AppContext;
use reelgate_core::Error;

type ApiResult<T> = Result<Json<T>, ApiError>;

pub fn api_routes() -> Router<AppContext> {
    Router::new()
        .route("/list/:category", get(list))
        .route("/details/:kind/:id", get(details))
        .route("/search", get(search))
        .route("/suggest", get(suggest))
        .route("/stats", get(stats))
}

#[derive(Deserialize)]
struct PageQuery {
    page: Option<u32>,
}

async fn list(
    State(ctx): State<AppContext>,
    Path(category): Path<String>,
    Query(params): Query<PageQuery>,
) -> ApiResult<ListResult> {
    let category: ListCategory = category.parse()?;
    let page = ctx
        .catalog
        .fetch_list(category, params.page.unwrap_or(1))
        .await?;
    Ok(Json(page))
}

async fn details(
    State(ctx): State<AppContext>,
    Path((kind, id)): Path<(String, String)>,
) -> ApiResult<DetailResult> {
    let kind: MediaKind = kind.parse()?;
    let id: u64 = id
        .parse()
        .map_err(|_| Error::validation(format!("invalid title id '{id}'")))?;
    Ok(Json(ctx.catalog.fetch_details(kind, id).await?))
}

#[derive(Deserialize)]
struct SearchQuery {
    #[serde(default)]
    query: String,
    page: Option<u32>,
    kind: Option<String>,
}

async fn search(
    State(ctx): State<AppContext>,
    Query(params): Query<SearchQuery>,
) -> ApiResult<SearchResult> {
    let kind = match params.kind.as_deref() {
        Some(kind) => kind.parse()?,
        None => SearchKind::default(),
    };
    let page = ctx
        .catalog
        .search(&params.query, params.page.unwrap_or(1), kind)
        .await?;
    Ok(Json(page))
}

#[derive(Deserialize)]
struct SuggestQuery {
    #[serde(default)]
    query: String,
}

async fn suggest(
    State(ctx): State<AppContext>,
    Query(params): Query<SuggestQuery>,
) -> ApiResult<Vec<serde_json::Value>> {
    Ok(Json(ctx.catalog.suggest(&params.query).await?))
}

async fn stats(State(ctx): State<AppContext>) -> impl IntoResponse {
    Json(ctx.catalog.gateway().stats())
}
