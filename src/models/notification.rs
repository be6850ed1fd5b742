// src/models/notification.rs

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

/// Lembrete de pagamento entregue à camada de notificações do PWA.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PaymentReminder {
    pub subscription_id: Uuid,
    pub client_id: Uuid,
    #[schema(example = "Clínica Sorriso")]
    pub client_name: String,
    pub amount: Decimal,
    #[schema(value_type = String, format = Date)]
    pub due_date: NaiveDate,
    #[schema(example = "Pagamento vence em 3 dias")]
    pub title: String,
    pub body: String,
    pub scheduled_at: DateTime<Utc>,
}
