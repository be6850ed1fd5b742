// src/handlers/subscriptions.rs

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::{
    common::error::{ApiError, AppError},
    config::AppState,
    middleware::i18n::Locale,
    models::subscription::{
        BillingBreakdown, ContractConfig, CreateSubscriptionPayload, MarkPaidPayload, PaymentHistory,
        PaymentOutcome, Subscription, UpdateSubscriptionPayload,
    },
};

// --- PAYLOADS ---

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PreviewPayload {
    #[validate(nested)]
    pub contract: ContractConfig,
    /// Padrão: hoje.
    #[schema(value_type = Option<String>, format = Date)]
    pub start_date: Option<NaiveDate>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct OverdueCheckResponse {
    pub updated: u64,
}

// =============================================================================
//  CRUD
// =============================================================================

#[utoipa::path(
    get,
    path = "/api/subscriptions",
    tag = "Subscriptions",
    responses(
        (status = 200, description = "Assinaturas, vencimento mais distante primeiro", body = Vec<Subscription>)
    ),
    security(("api_jwt" = []))
)]
pub async fn list_subscriptions(
    State(app_state): State<AppState>,
    locale: Locale,
) -> Result<impl IntoResponse, ApiError> {
    let subscriptions = app_state
        .subscription_service
        .list_subscriptions()
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    Ok((StatusCode::OK, Json(subscriptions)))
}

#[utoipa::path(
    post,
    path = "/api/subscriptions",
    tag = "Subscriptions",
    request_body = CreateSubscriptionPayload,
    responses(
        (status = 201, description = "Assinatura criada", body = Subscription),
        (status = 400, description = "Dados inválidos"),
        (status = 404, description = "Cliente não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_subscription(
    State(app_state): State<AppState>,
    locale: Locale,
    Json(payload): Json<CreateSubscriptionPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale))?;

    let subscription = app_state
        .subscription_service
        .create_subscription(&payload)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    Ok((StatusCode::CREATED, Json(subscription)))
}

#[utoipa::path(
    post,
    path = "/api/subscriptions/preview",
    tag = "Subscriptions",
    request_body = PreviewPayload,
    responses(
        (status = 200, description = "Composição da mensalidade (nada é gravado)", body = BillingBreakdown)
    ),
    security(("api_jwt" = []))
)]
pub async fn preview_subscription(
    State(app_state): State<AppState>,
    locale: Locale,
    Json(payload): Json<PreviewPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale))?;

    let breakdown = app_state
        .subscription_service
        .preview(&payload.contract, payload.start_date)
        .map_err(|e| e.to_api_error(&locale))?;

    Ok((StatusCode::OK, Json(breakdown)))
}

#[utoipa::path(
    get,
    path = "/api/subscriptions/{id}",
    tag = "Subscriptions",
    responses(
        (status = 200, description = "Assinatura", body = Subscription),
        (status = 404, description = "Assinatura não encontrada")
    ),
    params(("id" = Uuid, Path, description = "ID da Assinatura")),
    security(("api_jwt" = []))
)]
pub async fn get_subscription(
    State(app_state): State<AppState>,
    locale: Locale,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let subscription = app_state
        .subscription_service
        .get_subscription(id)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    Ok((StatusCode::OK, Json(subscription)))
}

#[utoipa::path(
    put,
    path = "/api/subscriptions/{id}",
    tag = "Subscriptions",
    request_body = UpdateSubscriptionPayload,
    responses(
        (status = 200, description = "Assinatura atualizada", body = Subscription),
        (status = 404, description = "Assinatura não encontrada")
    ),
    params(("id" = Uuid, Path, description = "ID da Assinatura")),
    security(("api_jwt" = []))
)]
pub async fn update_subscription(
    State(app_state): State<AppState>,
    locale: Locale,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateSubscriptionPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale))?;

    let subscription = app_state
        .subscription_service
        .update_subscription(id, &payload)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    Ok((StatusCode::OK, Json(subscription)))
}

#[utoipa::path(
    delete,
    path = "/api/subscriptions/{id}",
    tag = "Subscriptions",
    responses(
        (status = 204, description = "Assinatura removida"),
        (status = 404, description = "Assinatura não encontrada")
    ),
    params(("id" = Uuid, Path, description = "ID da Assinatura")),
    security(("api_jwt" = []))
)]
pub async fn delete_subscription(
    State(app_state): State<AppState>,
    locale: Locale,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    app_state
        .subscription_service
        .delete_subscription(id)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    Ok(StatusCode::NO_CONTENT)
}

// =============================================================================
//  TRANSIÇÕES
// =============================================================================

#[utoipa::path(
    post,
    path = "/api/subscriptions/{id}/pay",
    tag = "Subscriptions",
    request_body = MarkPaidPayload,
    responses(
        (status = 200, description = "Pago; inclui o próximo período quando gerado", body = PaymentOutcome),
        (status = 404, description = "Assinatura não encontrada"),
        (status = 409, description = "Assinatura já paga ou cancelada")
    ),
    params(("id" = Uuid, Path, description = "ID da Assinatura")),
    security(("api_jwt" = []))
)]
pub async fn mark_as_paid(
    State(app_state): State<AppState>,
    locale: Locale,
    Path(id): Path<Uuid>,
    Json(payload): Json<MarkPaidPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale))?;

    let outcome = app_state
        .subscription_service
        .mark_as_paid(id, payload)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    Ok((StatusCode::OK, Json(outcome)))
}

#[utoipa::path(
    post,
    path = "/api/subscriptions/{id}/pause",
    tag = "Subscriptions",
    responses(
        (status = 200, description = "Assinatura pausada", body = Subscription),
        (status = 409, description = "Transição não permitida")
    ),
    params(("id" = Uuid, Path, description = "ID da Assinatura")),
    security(("api_jwt" = []))
)]
pub async fn pause_subscription(
    State(app_state): State<AppState>,
    locale: Locale,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let subscription = app_state
        .subscription_service
        .pause(id)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    Ok((StatusCode::OK, Json(subscription)))
}

#[utoipa::path(
    post,
    path = "/api/subscriptions/{id}/resume",
    tag = "Subscriptions",
    responses(
        (status = 200, description = "Assinatura retomada com novo vencimento", body = Subscription),
        (status = 409, description = "A assinatura não está pausada")
    ),
    params(("id" = Uuid, Path, description = "ID da Assinatura")),
    security(("api_jwt" = []))
)]
pub async fn resume_subscription(
    State(app_state): State<AppState>,
    locale: Locale,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let subscription = app_state
        .subscription_service
        .resume(id)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    Ok((StatusCode::OK, Json(subscription)))
}

#[utoipa::path(
    post,
    path = "/api/subscriptions/{id}/cancel",
    tag = "Subscriptions",
    responses(
        (status = 200, description = "Assinatura cancelada", body = Subscription),
        (status = 409, description = "Transição não permitida")
    ),
    params(("id" = Uuid, Path, description = "ID da Assinatura")),
    security(("api_jwt" = []))
)]
pub async fn cancel_subscription(
    State(app_state): State<AppState>,
    locale: Locale,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let subscription = app_state
        .subscription_service
        .cancel(id)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    Ok((StatusCode::OK, Json(subscription)))
}

#[utoipa::path(
    post,
    path = "/api/subscriptions/overdue-check",
    tag = "Subscriptions",
    responses(
        (status = 200, description = "Pendentes vencidos marcados como atrasados", body = OverdueCheckResponse)
    ),
    security(("api_jwt" = []))
)]
pub async fn overdue_check(
    State(app_state): State<AppState>,
    locale: Locale,
) -> Result<impl IntoResponse, ApiError> {
    let updated = app_state
        .subscription_service
        .run_overdue_check()
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    Ok((StatusCode::OK, Json(OverdueCheckResponse { updated })))
}

// =============================================================================
//  HISTÓRICO DE PAGAMENTOS
// =============================================================================

#[utoipa::path(
    get,
    path = "/api/subscriptions/{id}/payments",
    tag = "Subscriptions",
    responses(
        (status = 200, description = "Histórico de pagamentos", body = Vec<PaymentHistory>),
        (status = 404, description = "Assinatura não encontrada")
    ),
    params(("id" = Uuid, Path, description = "ID da Assinatura")),
    security(("api_jwt" = []))
)]
pub async fn list_payments(
    State(app_state): State<AppState>,
    locale: Locale,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let payments = app_state
        .subscription_service
        .list_payments(id)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    Ok((StatusCode::OK, Json(payments)))
}

#[utoipa::path(
    delete,
    path = "/api/payments/{id}",
    tag = "Subscriptions",
    responses(
        (status = 204, description = "Pagamento removido do histórico"),
        (status = 404, description = "Pagamento não encontrado")
    ),
    params(("id" = Uuid, Path, description = "ID do Pagamento")),
    security(("api_jwt" = []))
)]
pub async fn delete_payment(
    State(app_state): State<AppState>,
    locale: Locale,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    app_state
        .subscription_service
        .delete_payment(id)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    Ok(StatusCode::NO_CONTENT)
}
