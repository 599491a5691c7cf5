// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use axum::{
    http::HeaderName,
    routing::{get, post},
    Router,
};
use tower_http::{
    cors::CorsLayer,
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::{
    auth::{Alias, Authentication},
    backend::{BackendConfig, LoginRequest, RenewRequest},
    lease::LeaseOptions,
    models::{
        AliasResponse, AuthResponse, PolicyList, RoleListResponse, RoleResponse, WarningsResponse,
        WriteRoleRequest,
    },
    state::AppState,
};

pub mod config;
pub mod health;
pub mod login;
pub mod roles;

const REQUEST_ID_HEADER: &str = "x-request-id";

pub fn router(state: AppState) -> Router {
    let v1_routes = Router::new()
        .route("/auth/login", post(login::login))
        .route("/auth/login/alias", post(login::alias_lookahead))
        .route("/auth/renew", post(login::renew))
        .route("/roles", get(roles::list_roles))
        .route(
            "/roles/{name}",
            get(roles::read_role)
                .post(roles::write_role)
                .delete(roles::delete_role),
        )
        .route(
            "/config",
            get(config::read_config).post(config::write_config),
        )
        .with_state(state.clone());

    let health_routes = Router::new()
        .route("/health", get(health::health))
        .route("/health/live", get(health::liveness))
        .route("/health/ready", get(health::readiness))
        .with_state(state);

    let request_id = HeaderName::from_static(REQUEST_ID_HEADER);

    Router::new()
        .nest("/v1", v1_routes)
        .merge(health_routes)
        .merge(SwaggerUi::new("/docs").url("/api-doc/openapi.json", ApiDoc::openapi()))
        .layer(PropagateRequestIdLayer::new(request_id.clone()))
        .layer(TraceLayer::new_for_http())
        .layer(SetRequestIdLayer::new(request_id, MakeRequestUuid))
        .layer(CorsLayer::permissive())
}

#[derive(OpenApi)]
#[openapi(
    paths(
        login::login,
        login::alias_lookahead,
        login::renew,
        roles::list_roles,
        roles::read_role,
        roles::write_role,
        roles::delete_role,
        config::read_config,
        config::write_config,
        health::health,
        health::liveness,
        health::readiness
    ),
    components(
        schemas(
            LoginRequest,
            RenewRequest,
            AuthResponse,
            AliasResponse,
            Authentication,
            Alias,
            LeaseOptions,
            WriteRoleRequest,
            PolicyList,
            RoleResponse,
            RoleListResponse,
            WarningsResponse,
            BackendConfig,
            health::ReadyResponse,
            health::HealthChecks,
            health::HealthResponse
        )
    ),
    tags(
        (name = "Auth", description = "Login and lease renewal"),
        (name = "Roles", description = "Role management (operator token)"),
        (name = "Config", description = "Issuer trust configuration (operator token)"),
        (name = "Health", description = "Liveness and readiness probes")
    )
)]
struct ApiDoc;
