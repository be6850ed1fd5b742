// src/handlers/notifications.rs

use axum::{extract::State, http::StatusCode, Json};

use crate::{config::AppState, models::notification::PaymentReminder};

#[utoipa::path(
    get,
    path = "/api/notifications",
    tag = "Notifications",
    responses(
        (status = 200, description = "Lembretes de pagamento pendentes", body = Vec<PaymentReminder>)
    ),
    security(("api_jwt" = []))
)]
pub async fn list_reminders(State(app_state): State<AppState>) -> Json<Vec<PaymentReminder>> {
    Json(app_state.notifier.pending().await)
}

#[utoipa::path(
    delete,
    path = "/api/notifications",
    tag = "Notifications",
    responses(
        (status = 204, description = "Lembretes descartados")
    ),
    security(("api_jwt" = []))
)]
pub async fn clear_reminders(State(app_state): State<AppState>) -> StatusCode {
    app_state.notifier.clear_all().await;
    StatusCode::NO_CONTENT
}
