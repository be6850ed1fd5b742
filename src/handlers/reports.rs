// src/handlers/reports.rs

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::Deserialize;
use utoipa::IntoParams;

use crate::{
    common::error::ApiError,
    config::AppState,
    middleware::i18n::Locale,
    models::report::{CalendarDay, FinancialReport},
};

#[derive(Debug, Deserialize, IntoParams)]
pub struct MonthQuery {
    /// Mês de referência no formato YYYY-MM (padrão: mês corrente)
    #[param(example = "2025-01")]
    pub month: Option<String>,
}

#[utoipa::path(
    get,
    path = "/api/reports/financial",
    tag = "Reports",
    params(MonthQuery),
    responses(
        (status = 200, description = "Relatório financeiro do mês", body = FinancialReport),
        (status = 400, description = "Mês inválido")
    ),
    security(("api_jwt" = []))
)]
pub async fn financial_report(
    State(app_state): State<AppState>,
    locale: Locale,
    Query(query): Query<MonthQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let report = app_state
        .report_service
        .financial_report(query.month.as_deref())
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    Ok((StatusCode::OK, Json(report)))
}

#[utoipa::path(
    get,
    path = "/api/calendar",
    tag = "Reports",
    params(MonthQuery),
    responses(
        (status = 200, description = "Vencimentos agrupados por dia", body = Vec<CalendarDay>),
        (status = 400, description = "Mês inválido")
    ),
    security(("api_jwt" = []))
)]
pub async fn calendar(
    State(app_state): State<AppState>,
    locale: Locale,
    Query(query): Query<MonthQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let days = app_state
        .subscription_service
        .calendar(query.month.as_deref())
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    Ok((StatusCode::OK, Json(days)))
}
