// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use axum::{extract::State, http::StatusCode, Json};

use crate::{auth::Operator, backend::BackendConfig, error::ApiError, state::AppState};

#[utoipa::path(
    get,
    path = "/v1/config",
    tag = "Config",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, body = BackendConfig),
        (status = 401, description = "Operator token missing or invalid"),
        (status = 404, description = "Backend not configured")
    )
)]
pub async fn read_config(
    _: Operator,
    State(state): State<AppState>,
) -> Result<Json<BackendConfig>, ApiError> {
    let config = state
        .backend
        .config()?
        .ok_or_else(|| ApiError::not_found("backend not configured"))?;
    Ok(Json(config))
}

#[utoipa::path(
    post,
    path = "/v1/config",
    request_body = BackendConfig,
    tag = "Config",
    security(("bearer_auth" = [])),
    responses(
        (status = 204, description = "Configuration written"),
        (status = 400, description = "Invalid configuration"),
        (status = 401, description = "Operator token missing or invalid")
    )
)]
pub async fn write_config(
    _: Operator,
    State(state): State<AppState>,
    Json(config): Json<BackendConfig>,
) -> Result<StatusCode, ApiError> {
    state.backend.write_config(&config)?;
    Ok(StatusCode::NO_CONTENT)
}
