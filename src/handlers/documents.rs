// src/handlers/documents.rs

use axum::{
    extract::{Path, Query, State},
    http::header,
    response::{IntoResponse, Response},
};
use uuid::Uuid;

use crate::{
    common::error::ApiError,
    config::AppState,
    handlers::reports::MonthQuery,
    middleware::i18n::Locale,
};

fn pdf_response(bytes: Vec<u8>, filename: String) -> Response {
    // Configura os Headers para o navegador baixar ou mostrar o PDF
    let headers = [
        (header::CONTENT_TYPE, "application/pdf".to_string()),
        (header::CONTENT_DISPOSITION, format!("attachment; filename=\"{}\"", filename)),
    ];

    (headers, bytes).into_response()
}

#[utoipa::path(
    get,
    path = "/api/reports/financial.pdf",
    tag = "Documents",
    params(MonthQuery),
    responses(
        (status = 200, description = "Relatório financeiro em PDF (application/pdf)")
    ),
    security(("api_jwt" = []))
)]
pub async fn financial_report_pdf(
    State(app_state): State<AppState>,
    locale: Locale,
    Query(query): Query<MonthQuery>,
) -> Result<Response, ApiError> {
    let pdf_bytes = app_state
        .document_service
        .financial_report_pdf(query.month.as_deref())
        .await
        .map_err(|app_err| app_err.to_api_error(&locale))?;

    let suffix = query.month.unwrap_or_else(|| "atual".to_string());
    Ok(pdf_response(pdf_bytes, format!("relatorio_{}.pdf", suffix)))
}

#[utoipa::path(
    get,
    path = "/api/subscriptions/{id}/charge.pdf",
    tag = "Documents",
    responses(
        (status = 200, description = "Cobrança em PDF com QR Code PIX (application/pdf)"),
        (status = 404, description = "Assinatura não encontrada")
    ),
    params(("id" = Uuid, Path, description = "ID da Assinatura")),
    security(("api_jwt" = []))
)]
pub async fn charge_pdf(
    State(app_state): State<AppState>,
    locale: Locale,
    Path(id): Path<Uuid>,
) -> Result<Response, ApiError> {
    let pdf_bytes = app_state
        .document_service
        .charge_pdf(id)
        .await
        .map_err(|app_err| app_err.to_api_error(&locale))?;

    Ok(pdf_response(pdf_bytes, format!("cobranca_{}.pdf", id)))
}
