// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};

use crate::{
    auth::Operator,
    error::ApiError,
    models::{RoleListResponse, RoleResponse, WarningsResponse, WriteRoleRequest},
    state::AppState,
};

#[utoipa::path(
    get,
    path = "/v1/roles",
    tag = "Roles",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, body = RoleListResponse),
        (status = 401, description = "Operator token missing or invalid")
    )
)]
pub async fn list_roles(
    _: Operator,
    State(state): State<AppState>,
) -> Result<Json<RoleListResponse>, ApiError> {
    let keys = state.backend.list_roles()?;
    Ok(Json(RoleListResponse { keys }))
}

#[utoipa::path(
    get,
    path = "/v1/roles/{name}",
    params(
        ("name" = String, Path, description = "Role name (case-insensitive)")
    ),
    tag = "Roles",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, body = RoleResponse),
        (status = 401, description = "Operator token missing or invalid"),
        (status = 404, description = "Role not found")
    )
)]
pub async fn read_role(
    _: Operator,
    Path(name): Path<String>,
    State(state): State<AppState>,
) -> Result<Json<RoleResponse>, ApiError> {
    let role = state
        .backend
        .read_role(&name)?
        .ok_or_else(|| ApiError::not_found("role not found"))?;
    Ok(Json(role.into()))
}

#[utoipa::path(
    post,
    path = "/v1/roles/{name}",
    params(
        ("name" = String, Path, description = "Role name (case-insensitive)")
    ),
    request_body = WriteRoleRequest,
    tag = "Roles",
    security(("bearer_auth" = [])),
    responses(
        (status = 204, description = "Role written"),
        (status = 200, description = "Role written with warnings", body = WarningsResponse),
        (status = 400, description = "Invalid role values"),
        (status = 401, description = "Operator token missing or invalid")
    )
)]
pub async fn write_role(
    _: Operator,
    Path(name): Path<String>,
    State(state): State<AppState>,
    Json(request): Json<WriteRoleRequest>,
) -> Result<Response, ApiError> {
    let write = state.backend.write_role(&name, request.into())?;
    if write.warnings.is_empty() {
        return Ok(StatusCode::NO_CONTENT.into_response());
    }
    Ok(Json(WarningsResponse {
        warnings: write.warnings,
    })
    .into_response())
}

#[utoipa::path(
    delete,
    path = "/v1/roles/{name}",
    params(
        ("name" = String, Path, description = "Role name (case-insensitive)")
    ),
    tag = "Roles",
    security(("bearer_auth" = [])),
    responses(
        (status = 204),
        (status = 401, description = "Operator token missing or invalid")
    )
)]
pub async fn delete_role(
    _: Operator,
    Path(name): Path<String>,
    State(state): State<AppState>,
) -> Result<StatusCode, ApiError> {
    state.backend.delete_role(&name)?;
    Ok(StatusCode::NO_CONTENT)
}
