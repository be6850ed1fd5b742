// src/handlers/clients.rs

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use uuid::Uuid;
use validator::Validate;

use crate::{
    common::error::{ApiError, AppError},
    config::AppState,
    middleware::i18n::Locale,
    models::{
        client::{Client, ClientPayload, CredentialUpdate, ReplaceNumbersPayload},
        subscription::Subscription,
    },
};

#[utoipa::path(
    get,
    path = "/api/clients",
    tag = "Clients",
    responses(
        (status = 200, description = "Clientes em ordem alfabética", body = Vec<Client>)
    ),
    security(("api_jwt" = []))
)]
pub async fn list_clients(
    State(app_state): State<AppState>,
    locale: Locale,
) -> Result<impl IntoResponse, ApiError> {
    let clients = app_state
        .client_service
        .list_clients()
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    Ok((StatusCode::OK, Json(clients)))
}

#[utoipa::path(
    post,
    path = "/api/clients",
    tag = "Clients",
    request_body = ClientPayload,
    responses(
        (status = 201, description = "Cliente criado", body = Client),
        (status = 400, description = "Dados inválidos")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_client(
    State(app_state): State<AppState>,
    locale: Locale,
    Json(payload): Json<ClientPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale))?;

    let client = app_state
        .client_service
        .create_client(&payload)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    Ok((StatusCode::CREATED, Json(client)))
}

#[utoipa::path(
    get,
    path = "/api/clients/{id}",
    tag = "Clients",
    responses(
        (status = 200, description = "Cliente", body = Client),
        (status = 404, description = "Cliente não encontrado")
    ),
    params(("id" = Uuid, Path, description = "ID do Cliente")),
    security(("api_jwt" = []))
)]
pub async fn get_client(
    State(app_state): State<AppState>,
    locale: Locale,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let client = app_state
        .client_service
        .get_client(id)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    Ok((StatusCode::OK, Json(client)))
}

#[utoipa::path(
    put,
    path = "/api/clients/{id}",
    tag = "Clients",
    request_body = ClientPayload,
    responses(
        (status = 200, description = "Cliente atualizado", body = Client),
        (status = 404, description = "Cliente não encontrado")
    ),
    params(("id" = Uuid, Path, description = "ID do Cliente")),
    security(("api_jwt" = []))
)]
pub async fn update_client(
    State(app_state): State<AppState>,
    locale: Locale,
    Path(id): Path<Uuid>,
    Json(payload): Json<ClientPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale))?;

    let client = app_state
        .client_service
        .update_client(id, &payload)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    Ok((StatusCode::OK, Json(client)))
}

#[utoipa::path(
    delete,
    path = "/api/clients/{id}",
    tag = "Clients",
    responses(
        (status = 204, description = "Cliente e assinaturas removidos"),
        (status = 404, description = "Cliente não encontrado")
    ),
    params(("id" = Uuid, Path, description = "ID do Cliente")),
    security(("api_jwt" = []))
)]
pub async fn delete_client(
    State(app_state): State<AppState>,
    locale: Locale,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    app_state
        .client_service
        .delete_client(id)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    Ok(StatusCode::NO_CONTENT)
}

// =============================================================================
//  NÚMEROS E CREDENCIAIS
// =============================================================================

#[utoipa::path(
    put,
    path = "/api/clients/{id}/numbers",
    tag = "Clients",
    request_body = ReplaceNumbersPayload,
    responses(
        (status = 200, description = "Números substituídos", body = Client),
        (status = 404, description = "Cliente não encontrado")
    ),
    params(("id" = Uuid, Path, description = "ID do Cliente")),
    security(("api_jwt" = []))
)]
pub async fn replace_numbers(
    State(app_state): State<AppState>,
    locale: Locale,
    Path(id): Path<Uuid>,
    Json(payload): Json<ReplaceNumbersPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale))?;

    let client = app_state
        .client_service
        .replace_numbers(id, &payload.numbers)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    Ok((StatusCode::OK, Json(client)))
}

#[utoipa::path(
    patch,
    path = "/api/clients/{id}/numbers/{index}/credentials",
    tag = "Clients",
    request_body = CredentialUpdate,
    responses(
        (status = 200, description = "Credencial atualizada", body = Client),
        (status = 400, description = "Índice de número inválido"),
        (status = 404, description = "Cliente não encontrado")
    ),
    params(
        ("id" = Uuid, Path, description = "ID do Cliente"),
        ("index" = usize, Path, description = "Posição do número na lista")
    ),
    security(("api_jwt" = []))
)]
pub async fn update_credential(
    State(app_state): State<AppState>,
    locale: Locale,
    Path((id, index)): Path<(Uuid, usize)>,
    Json(update): Json<CredentialUpdate>,
) -> Result<impl IntoResponse, ApiError> {
    let client = app_state
        .client_service
        .update_credential(id, index, update)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    Ok((StatusCode::OK, Json(client)))
}

#[utoipa::path(
    get,
    path = "/api/clients/{id}/subscriptions",
    tag = "Clients",
    responses(
        (status = 200, description = "Assinaturas do cliente", body = Vec<Subscription>),
        (status = 404, description = "Cliente não encontrado")
    ),
    params(("id" = Uuid, Path, description = "ID do Cliente")),
    security(("api_jwt" = []))
)]
pub async fn list_client_subscriptions(
    State(app_state): State<AppState>,
    locale: Locale,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    // 404 explícito para cliente inexistente (em vez de lista vazia)
    app_state
        .client_service
        .get_client(id)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    let subscriptions = app_state
        .subscription_service
        .list_by_client(id)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    Ok((StatusCode::OK, Json(subscriptions)))
}
