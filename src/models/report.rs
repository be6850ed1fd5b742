// src/models/report.rs

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::models::subscription::SubscriptionStatus;

/// As três fontes de "pago no mês". A soma é aditiva, sem deduplicação.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PaidBreakdown {
    pub paid_subscriptions: Decimal,
    pub initial_payments: Decimal,
    pub payment_history: Decimal,
}

/// Assinatura a vencer, para as listas de 7 e 30 dias.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpcomingPayment {
    pub subscription_id: Uuid,
    pub client_id: Uuid,
    pub description: Option<String>,
    pub amount: Decimal,
    #[schema(value_type = String, format = Date)]
    pub due_date: NaiveDate,
    pub status: SubscriptionStatus,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MonthlyRevenueEntry {
    #[schema(example = "2025-01")]
    pub month: String,
    pub total: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct FinancialReport {
    #[schema(value_type = String, format = Date)]
    pub reference_date: NaiveDate,
    #[schema(example = "2025-01")]
    pub month: String,

    pub total_paid_this_month: Decimal,
    pub paid_breakdown: PaidBreakdown,
    pub total_pending: Decimal,
    pub total_overdue: Decimal,
    pub next_month_expected: Decimal,

    pub due_next_7_days: Vec<UpcomingPayment>,
    pub due_next_30_days: Vec<UpcomingPayment>,

    pub monthly_revenue: Vec<MonthlyRevenueEntry>,

    pub clients: ClientStatusCount,
}

/// Um dia do calendário com as cobranças que vencem nele.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CalendarDay {
    #[schema(value_type = String, format = Date)]
    pub date: NaiveDate,
    pub total: Decimal,
    pub payments: Vec<UpcomingPayment>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ClientStatusCount {
    pub lead: i64,
    pub ativo: i64,
    pub pausado: i64,
    pub encerrado: i64,
}
