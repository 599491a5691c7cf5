// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use axum::{extract::State, Json};

use crate::{
    backend::{LoginRequest, RenewRequest},
    error::ApiError,
    models::{AliasResponse, AuthResponse},
    state::AppState,
};

#[utoipa::path(
    post,
    path = "/v1/auth/login",
    request_body = LoginRequest,
    tag = "Auth",
    responses(
        (status = 200, description = "Authentication issued", body = AuthResponse),
        (status = 400, description = "Missing field, unknown role or unconfigured backend"),
        (status = 401, description = "Token rejected")
    )
)]
pub async fn login(
    State(state): State<AppState>,
    Json(request): Json<LoginRequest>,
) -> Result<Json<AuthResponse>, ApiError> {
    let issued = state.backend.login_lease(&request).await?;
    Ok(Json(issued.into()))
}

/// Resolve the caller's alias from a login request without issuing anything.
#[utoipa::path(
    post,
    path = "/v1/auth/login/alias",
    request_body = LoginRequest,
    tag = "Auth",
    responses(
        (status = 200, description = "Alias resolved", body = AliasResponse),
        (status = 400, description = "Missing field, unknown role or unconfigured backend"),
        (status = 401, description = "Token rejected")
    )
)]
pub async fn alias_lookahead(
    State(state): State<AppState>,
    Json(request): Json<LoginRequest>,
) -> Result<Json<AliasResponse>, ApiError> {
    let alias = state.backend.lookahead(&request).await?;
    Ok(Json(AliasResponse { alias }))
}

#[utoipa::path(
    post,
    path = "/v1/auth/renew",
    request_body = RenewRequest,
    tag = "Auth",
    responses(
        (status = 200, description = "Lease renewed", body = AuthResponse),
        (status = 403, description = "Unknown or lapsed lease, role deleted or max TTL reached")
    )
)]
pub async fn renew(
    State(state): State<AppState>,
    Json(request): Json<RenewRequest>,
) -> Result<Json<AuthResponse>, ApiError> {
    let increment = Some(request.increment).filter(|i| !i.is_zero());
    let issued = state.backend.renew_lease(request.lease_id, increment)?;
    Ok(Json(issued.into()))
}
