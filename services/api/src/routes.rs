//! API service routes

use axum::{
    Extension, Json, Router,
    extract::{Path, Query, State},
    http::{StatusCode, header},
    middleware,
    response::IntoResponse,
    routing::{get, put},
};
use base64::{Engine, engine::general_purpose::STANDARD};
use common::models::{FileKind, Parent};
use serde_json::json;
use tracing::info;
use uuid::Uuid;

use crate::{
    AppState,
    error::{ApiError, ApiResult},
    middleware::{AuthUser, auth_middleware, optional_auth_middleware},
    models::{DataQuery, ListQuery, NodeResponse, StatsResponse, StatusResponse, UploadRequest},
};

/// Create the router for the API service
pub fn create_router(state: AppState) -> Router {
    let protected_routes = Router::new()
        .route("/files", get(list_files).post(upload_file))
        .route("/files/:id", get(get_file))
        .route("/files/:id/publish", put(publish_file))
        .route("/files/:id/unpublish", put(unpublish_file))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    let content_routes = Router::new()
        .route("/files/:id/data", get(get_file_data))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            optional_auth_middleware,
        ));

    Router::new()
        .route("/health", get(health_check))
        .route("/status", get(get_status))
        .route("/stats", get(get_stats))
        .merge(protected_routes)
        .merge(content_routes)
        .with_state(state)
}

/// Unknown and malformed ids are both "not found"
fn parse_id(raw: &str) -> ApiResult<Uuid> {
    Uuid::parse_str(raw).map_err(|_| ApiError::NotFound)
}

/// Health check endpoint
pub async fn health_check() -> impl IntoResponse {
    Json(json!({
        "status": "ok",
        "service": "api-service"
    }))
}

/// Liveness of the cache and the database
pub async fn get_status(State(state): State<AppState>) -> impl IntoResponse {
    let redis = state.sessions.health_check().await.unwrap_or(false);
    let db = state
        .user_repository
        .health_check()
        .await
        .unwrap_or(false);

    Json(StatusResponse { redis, db })
}

/// Number of users and files
pub async fn get_stats(State(state): State<AppState>) -> ApiResult<impl IntoResponse> {
    let users = state.user_repository.count().await?;
    let files = state.tree.node_count().await?;

    Ok(Json(StatsResponse { users, files }))
}

/// Upload a folder, file or image
pub async fn upload_file(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Json(payload): Json<UploadRequest>,
) -> ApiResult<impl IntoResponse> {
    let name = payload
        .name
        .filter(|name| !name.trim().is_empty())
        .ok_or_else(|| ApiError::BadRequest("Missing name".to_string()))?;

    let kind = payload
        .kind
        .and_then(|kind| kind.parse::<FileKind>().ok())
        .ok_or_else(|| ApiError::BadRequest("Missing type".to_string()))?;

    let data = match payload.data.filter(|data| !data.trim().is_empty()) {
        Some(data) => Some(data),
        None if kind.has_content() => {
            return Err(ApiError::BadRequest("Missing data".to_string()));
        }
        None => None,
    };

    let parent = match payload.parent_id {
        None => Parent::Root,
        Some(raw) => serde_json::from_value::<Parent>(raw)
            .map_err(|_| ApiError::BadRequest("Parent not found".to_string()))?,
    };
    let is_public = payload.is_public.unwrap_or(false);

    let node = if kind.has_content() {
        let bytes = STANDARD
            .decode(data.unwrap_or_default())
            .map_err(|_| ApiError::BadRequest("Invalid data".to_string()))?;
        state
            .tree
            .create_file(user.id, &name, kind, parent, is_public, &bytes)
            .await?
    } else {
        state
            .tree
            .create_folder(user.id, &name, parent, is_public)
            .await?
    };

    info!("User {} uploaded {} {}", user.id, kind, node.id);
    Ok((StatusCode::CREATED, Json(NodeResponse::from(node))))
}

/// Show one node
pub async fn get_file(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
) -> ApiResult<impl IntoResponse> {
    let node = state.tree.get(parse_id(&id)?, user.id).await?;
    Ok(Json(NodeResponse::from(node)))
}

/// List one page of the user's nodes under a parent
pub async fn list_files(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Query(query): Query<ListQuery>,
) -> ApiResult<impl IntoResponse> {
    let parent = match query.parent_id.as_deref() {
        None => Parent::Root,
        Some(raw) => raw
            .parse::<Parent>()
            .map_err(|_| ApiError::BadRequest("Invalid parentId".to_string()))?,
    };
    let page = query
        .page
        .and_then(|page| page.trim().parse::<u64>().ok())
        .unwrap_or(0);

    let nodes = state.tree.list(user.id, parent, page).await?;
    let nodes: Vec<NodeResponse> = nodes.into_iter().map(NodeResponse::from).collect();

    Ok(Json(nodes))
}

/// Make a node public
pub async fn publish_file(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
) -> ApiResult<impl IntoResponse> {
    let node = state
        .tree
        .set_visibility(parse_id(&id)?, user.id, true)
        .await?;
    Ok(Json(NodeResponse::from(node)))
}

/// Make a node private
pub async fn unpublish_file(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
) -> ApiResult<impl IntoResponse> {
    let node = state
        .tree
        .set_visibility(parse_id(&id)?, user.id, false)
        .await?;
    Ok(Json(NodeResponse::from(node)))
}

/// Download the content of a node, or one of its thumbnails
pub async fn get_file_data(
    State(state): State<AppState>,
    user: Option<Extension<AuthUser>>,
    Path(id): Path<String>,
    Query(query): Query<DataQuery>,
) -> ApiResult<impl IntoResponse> {
    let requester = user.map(|Extension(user)| user.id);
    let variant = state.tree.variant_for(query.size.as_deref());

    let (node, bytes) = state
        .tree
        .read_content(parse_id(&id)?, requester, variant)
        .await?;

    let mime = mime_guess::from_path(&node.name).first_or_octet_stream();
    Ok(([(header::CONTENT_TYPE, mime.to_string())], bytes))
}
