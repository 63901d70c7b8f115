use axum::{
    body::Bytes,
    extract::{Json, Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde::{Deserialize, Serialize};

use crate::{
    error::Result,
    handlers::AppState,
    models::{BookFields, Filter, Projection, ResourceType, SortOrder},
};

/// Query string of a list request
#[derive(Debug, Default, Deserialize)]
pub struct ListParams {
    /// Comma separated column names
    pub columns: Option<String>,
    /// `column:asc|desc` terms, comma separated
    pub sort: Option<String>,
    /// JSON encoded [`Filter`]
    pub filter: Option<String>,
}

/// Body of a modify request
#[derive(Debug, Deserialize)]
pub struct ModifyRequest {
    pub values: BookFields,
    #[serde(default)]
    pub filter: Option<Filter>,
}

/// Body of a remove request
#[derive(Debug, Default, Deserialize)]
pub struct RemoveRequest {
    #[serde(default)]
    pub filter: Option<Filter>,
}

#[derive(Debug, Serialize)]
pub struct CreatedResponse {
    pub id: u64,
    pub address: String,
}

#[derive(Debug, Serialize)]
pub struct RowsAffectedResponse {
    pub rows_affected: u64,
}

#[derive(Debug, Serialize)]
pub struct TypeResponse {
    #[serde(rename = "type")]
    pub type_: ResourceType,
    pub mime_type: String,
}

/// List/query handler
pub async fn list(
    State(state): State<AppState>,
    Path(address): Path<String>,
    Query(params): Query<ListParams>,
) -> Result<impl IntoResponse> {
    let projection = match params.columns.as_deref() {
        Some(list) => Projection::parse_list(list)?,
        None => Projection::All,
    };
    let sort = params.sort.as_deref().map(str::parse::<SortOrder>).transpose()?;
    let filter = params
        .filter
        .as_deref()
        .map(serde_json::from_str::<Filter>)
        .transpose()?;

    let records = state
        .service
        .query(&address, &projection, filter.as_ref(), sort.as_ref())
        .await?;

    Ok((StatusCode::OK, Json(records)))
}

/// Create handler
pub async fn create(
    State(state): State<AppState>,
    Path(address): Path<String>,
    body: Bytes,
) -> Result<impl IntoResponse> {
    let fields: BookFields = serde_json::from_slice(&body)?;
    let id = state.service.insert(&address, &fields).await?;
    let response = CreatedResponse {
        id,
        address: state.service.scheme().item_address(id),
    };

    Ok((StatusCode::CREATED, Json(response)))
}

/// Modify handler
pub async fn modify(
    State(state): State<AppState>,
    Path(address): Path<String>,
    body: Bytes,
) -> Result<impl IntoResponse> {
    let request: ModifyRequest = serde_json::from_slice(&body)?;
    let rows_affected = state
        .service
        .update(&address, &request.values, request.filter.as_ref())
        .await?;

    Ok((StatusCode::OK, Json(RowsAffectedResponse { rows_affected })))
}

/// Remove handler; the body is optional
pub async fn remove(
    State(state): State<AppState>,
    Path(address): Path<String>,
    body: Bytes,
) -> Result<impl IntoResponse> {
    let request = if body.is_empty() {
        RemoveRequest::default()
    } else {
        serde_json::from_slice::<RemoveRequest>(&body)?
    };

    let rows_affected = state
        .service
        .delete(&address, request.filter.as_ref())
        .await?;

    Ok((StatusCode::OK, Json(RowsAffectedResponse { rows_affected })))
}

/// Describe-type handler
pub async fn describe(
    State(state): State<AppState>,
    Path(address): Path<String>,
) -> Result<impl IntoResponse> {
    let type_ = state.service.type_of(&address)?;
    let response = TypeResponse {
        type_,
        mime_type: type_.mime_type(state.service.scheme()),
    };

    Ok((StatusCode::OK, Json(response)))
}
