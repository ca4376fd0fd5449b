use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use axum::response::{IntoResponse, Response};
use base64::Engine;
use http::StatusCode;
use serde::{Deserialize, Serialize};
use tracing::error;
use utoipa::ToSchema;
use utoipa_axum::{router::OpenApiRouter, routes};

use crate::access::AccessControlLike;
use crate::error::WardenError;
use crate::logic::cipher::KeyCipherLike;
use crate::logic::hierarchy::{AccessRequest, unwrap_data_key, wrap_data_key};
use crate::logic::master_key::{PlainDataKey, WrappedDataKey};
use crate::repository::KeyRegistryLike;
use crate::rootkey::RootKeySourceLike;

pub const PATH_PREFIX: &str = "/api";
pub const API_VERSION_1: &str = "v1";
pub const SERVICE_ROUTE_KEY: &str = "warden";

/// Request-handling state: the four collaborators of the key hierarchy.
#[derive(Clone)]
pub struct WardenService {
    access: Arc<dyn AccessControlLike>,
    root_source: Arc<dyn RootKeySourceLike>,
    registry: Arc<dyn KeyRegistryLike>,
    cipher: Arc<dyn KeyCipherLike>,
}

impl WardenService {
    pub fn new(
        access: Arc<dyn AccessControlLike>,
        root_source: Arc<dyn RootKeySourceLike>,
        registry: Arc<dyn KeyRegistryLike>,
        cipher: Arc<dyn KeyCipherLike>,
    ) -> Self {
        Self {
            access,
            root_source,
            registry,
            cipher,
        }
    }

    pub fn access(&self) -> &dyn AccessControlLike {
        self.access.as_ref()
    }

    pub fn root_source(&self) -> &dyn RootKeySourceLike {
        self.root_source.as_ref()
    }

    pub fn registry(&self) -> &dyn KeyRegistryLike {
        self.registry.as_ref()
    }

    pub fn cipher(&self) -> &dyn KeyCipherLike {
        self.cipher.as_ref()
    }
}

pub fn create_router() -> OpenApiRouter<WardenService> {
    OpenApiRouter::new()
        .routes(routes!(route_wrap_key))
        .routes(routes!(route_unwrap_key))
}

#[derive(Serialize, Deserialize, ToSchema)]
pub struct WrapKeyParams {
    pub token: String,
    pub table: String,
    pub column: String,
    /// Base64-encoded plaintext data key.
    pub plain_key: String,
}

#[derive(Serialize, Deserialize, ToSchema)]
pub struct WrapKeyResponse {
    pub code: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub wrapped_key: Option<WrappedDataKey>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl WrapKeyResponse {
    fn ok(wrapped_key: WrappedDataKey) -> Self {
        Self {
            code: 0,
            wrapped_key: Some(wrapped_key),
            error: None,
        }
    }

    fn failure(error: String) -> Self {
        Self {
            code: -1,
            wrapped_key: None,
            error: Some(error),
        }
    }
}

#[derive(Serialize, Deserialize, ToSchema)]
pub struct UnwrapKeyParams {
    pub token: String,
    pub table: String,
    pub column: String,
    pub wrapped_key: WrappedDataKey,
}

#[derive(Serialize, Deserialize, ToSchema)]
pub struct UnwrapKeyResponse {
    pub code: i32,
    /// Base64-encoded plaintext data key.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub plain_key: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl UnwrapKeyResponse {
    fn ok(plain_key: String) -> Self {
        Self {
            code: 0,
            plain_key: Some(plain_key),
            error: None,
        }
    }

    fn failure(error: String) -> Self {
        Self {
            code: -1,
            plain_key: None,
            error: Some(error),
        }
    }
}

#[utoipa::path(
    post,
    path = format!("{}/{}/{}/wrap", PATH_PREFIX, SERVICE_ROUTE_KEY, API_VERSION_1),
    tags = [SERVICE_ROUTE_KEY],
    request_body = WrapKeyParams,
    responses(
        (status = 200, description = "Wrapped data key, or a business failure with code -1", body = WrapKeyResponse),
        (status = 400, description = "Bad Request"),
        (status = 500, description = "Internal Server Error"),
    ),
    summary = "Wrap a data key",
    description = "Encrypt a caller-supplied data key under the master key of the given table, registering a master key on the table's first use",
    operation_id = "wrap-data-key",
)]
async fn route_wrap_key(
    State(ctx): State<WardenService>,
    Json(params): Json<WrapKeyParams>,
) -> Response {
    let plain_key = match base64::engine::general_purpose::STANDARD.decode(&params.plain_key) {
        Ok(bytes) => PlainDataKey::new(bytes),
        Err(_) => {
            return WardenError::InvalidRequest {
                msg: "plain_key must be base64".to_string(),
                source: None,
            }
            .into_response();
        }
    };
    let request = AccessRequest {
        token: params.token,
        table: params.table,
        column: params.column,
    };

    match wrap_data_key(
        ctx.access(),
        ctx.root_source(),
        ctx.registry(),
        ctx.cipher(),
        &request,
        &plain_key,
    )
    .await
    {
        Ok(wrapped) => (StatusCode::OK, Json(WrapKeyResponse::ok(wrapped))).into_response(),
        Err(err) if err.is_business() => {
            (StatusCode::OK, Json(WrapKeyResponse::failure(err.to_string()))).into_response()
        }
        Err(err) => {
            error!(error = %err, table = %request.table, "wrap data key failed");
            err.into_response()
        }
    }
}

#[utoipa::path(
    post,
    path = format!("{}/{}/{}/unwrap", PATH_PREFIX, SERVICE_ROUTE_KEY, API_VERSION_1),
    tags = [SERVICE_ROUTE_KEY],
    request_body = UnwrapKeyParams,
    responses(
        (status = 200, description = "Plaintext data key, or a business failure with code -1", body = UnwrapKeyResponse),
        (status = 400, description = "Bad Request"),
        (status = 500, description = "Internal Server Error"),
    ),
    summary = "Unwrap a data key",
    description = "Decrypt a previously wrapped data key under the master key of the given table",
    operation_id = "unwrap-data-key",
)]
async fn route_unwrap_key(
    State(ctx): State<WardenService>,
    Json(params): Json<UnwrapKeyParams>,
) -> Response {
    let request = AccessRequest {
        token: params.token,
        table: params.table,
        column: params.column,
    };

    match unwrap_data_key(
        ctx.access(),
        ctx.root_source(),
        ctx.registry(),
        ctx.cipher(),
        &request,
        &params.wrapped_key,
    )
    .await
    {
        Ok(plain) => {
            let encoded = base64::engine::general_purpose::STANDARD.encode(plain.expose());
            (StatusCode::OK, Json(UnwrapKeyResponse::ok(encoded))).into_response()
        }
        Err(err) if err.is_business() => {
            (StatusCode::OK, Json(UnwrapKeyResponse::failure(err.to_string()))).into_response()
        }
        Err(err) => {
            error!(error = %err, table = %request.table, "unwrap data key failed");
            err.into_response()
        }
    }
}
