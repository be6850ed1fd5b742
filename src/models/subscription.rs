// src/models/subscription.rs

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

// --- Enums (Mapeando o Postgres) ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "subscription_status")]
pub enum SubscriptionStatus {
    Pendente,
    Pago,
    Atrasado,
    Cancelado,
    Pausado,
}

impl SubscriptionStatus {
    /// Pago e Cancelado encerram o período: nunca geram sucessor.
    pub fn is_closed(self) -> bool {
        matches!(self, SubscriptionStatus::Pago | SubscriptionStatus::Cancelado)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "payment_type", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum PaymentType {
    Vista,     // À vista, fora da recorrência
    Parcelado, // Implantação diluída nas mensalidades
}

// --- Structs ---

/// Um período de cobrança. Cada linha é o retrato de um mês do contrato.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Subscription {
    pub id: Uuid,
    pub client_id: Uuid,

    #[schema(example = "Plano de manutenção - 3 números")]
    pub description: Option<String>,

    #[schema(example = 1300.0)]
    pub amount: Decimal,

    #[schema(value_type = String, format = Date, example = "2025-01-10")]
    pub due_date: NaiveDate,
    #[schema(value_type = Option<String>, format = Date)]
    pub payment_date: Option<NaiveDate>,

    pub status: SubscriptionStatus,

    // Recorrência
    pub is_recurring: bool,
    #[schema(example = 10)]
    pub recurrence_day: Option<i32>,
    pub current_installment: i32,
    pub total_installments: Option<i32>,
    pub is_paused: bool,

    // Composição do contrato (exibição e cálculo inicial)
    pub implementation_value: Option<Decimal>,
    pub payment_type: Option<PaymentType>,
    pub installments: Option<i32>,
    pub maintenance_value_per_number: Option<Decimal>,
    pub number_of_numbers: Option<i32>,
    pub contract_duration: Option<i32>,
    pub payment_day: Option<i32>,

    // Pagamento inicial (implantação à vista)
    pub initial_payment_paid: bool,
    pub initial_payment_amount: Option<Decimal>,

    pub notes: Option<String>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Dados para inserir um período novo (criação manual ou sucessor gerado).
#[derive(Debug, Clone, PartialEq)]
pub struct NewSubscription {
    pub client_id: Uuid,
    pub description: Option<String>,
    pub amount: Decimal,
    pub due_date: NaiveDate,
    pub status: SubscriptionStatus,
    pub is_recurring: bool,
    pub recurrence_day: Option<i32>,
    pub current_installment: i32,
    pub total_installments: Option<i32>,
    pub is_paused: bool,
    pub implementation_value: Option<Decimal>,
    pub payment_type: Option<PaymentType>,
    pub installments: Option<i32>,
    pub maintenance_value_per_number: Option<Decimal>,
    pub number_of_numbers: Option<i32>,
    pub contract_duration: Option<i32>,
    pub payment_day: Option<i32>,
    pub initial_payment_paid: bool,
    pub initial_payment_amount: Option<Decimal>,
    pub notes: Option<String>,
}

/// Linha do histórico de pagamentos. Só cresce.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PaymentHistory {
    pub id: Uuid,
    pub subscription_id: Uuid,
    #[schema(example = 1300.0)]
    pub amount: Decimal,
    #[schema(value_type = String, format = Date, example = "2025-01-10")]
    pub payment_date: NaiveDate,
    #[schema(example = "pix")]
    pub payment_method: Option<String>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewPaymentHistory {
    pub subscription_id: Uuid,
    pub amount: Decimal,
    pub payment_date: NaiveDate,
    pub payment_method: Option<String>,
    pub notes: Option<String>,
}

/// Entrada da calculadora de cobrança.
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ContractConfig {
    #[schema(example = 2500.0)]
    pub implementation_value: Decimal,
    pub payment_type: PaymentType,
    #[serde(default)]
    #[validate(range(min = 0, max = 120, message = "invalid_installments"))]
    #[schema(example = 10)]
    pub installments: i32,
    #[schema(example = 350.0)]
    pub maintenance_value_per_number: Decimal,
    #[validate(range(min = 0, max = 1000, message = "invalid_number_of_numbers"))]
    #[schema(example = 3)]
    pub number_of_numbers: i32,
    #[validate(range(min = 0, max = 600, message = "invalid_contract_duration"))]
    #[schema(example = 12)]
    pub contract_duration: i32,
    #[validate(range(min = 1, max = 31, message = "invalid_payment_day"))]
    #[schema(example = 10)]
    pub payment_day: i32,
}

// --- Payloads ---

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateSubscriptionPayload {
    pub client_id: Uuid,

    #[schema(example = "Manutenção mensal")]
    pub description: Option<String>,

    /// Sem valor explícito, usa a mensalidade calculada do contrato.
    #[schema(example = 1300.0)]
    pub amount: Option<Decimal>,

    /// Sem data explícita, usa o primeiro vencimento do contrato.
    #[schema(value_type = Option<String>, format = Date)]
    pub due_date: Option<NaiveDate>,

    /// Data de início do contrato (padrão: hoje).
    #[schema(value_type = Option<String>, format = Date)]
    pub start_date: Option<NaiveDate>,

    #[serde(default)]
    pub is_recurring: bool,

    #[validate(range(min = 1, max = 31, message = "invalid_recurrence_day"))]
    pub recurrence_day: Option<i32>,

    #[validate(range(min = 1, message = "invalid_total_installments"))]
    pub total_installments: Option<i32>,

    #[validate(nested)]
    pub contract: Option<ContractConfig>,

    #[serde(default)]
    pub initial_payment_paid: bool,

    pub notes: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateSubscriptionPayload {
    pub description: Option<String>,
    pub amount: Option<Decimal>,
    #[schema(value_type = Option<String>, format = Date)]
    pub due_date: Option<NaiveDate>,
    pub is_recurring: Option<bool>,
    #[validate(range(min = 1, max = 31, message = "invalid_recurrence_day"))]
    pub recurrence_day: Option<i32>,
    #[validate(range(min = 1, message = "invalid_total_installments"))]
    pub total_installments: Option<i32>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MarkPaidPayload {
    /// Padrão: hoje.
    #[schema(value_type = Option<String>, format = Date)]
    pub payment_date: Option<NaiveDate>,
    #[validate(length(max = 40, message = "invalid_payment_method"))]
    #[schema(example = "pix")]
    pub payment_method: Option<String>,
    pub notes: Option<String>,
}

/// Resultado de "marcar como pago".
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PaymentOutcome {
    pub paid: Subscription,
    pub payment: PaymentHistory,
    pub successor: Option<Subscription>,
}

/// Saída da calculadora de cobrança.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BillingBreakdown {
    pub monthly_maintenance_amount: Decimal,
    pub monthly_implementation_amount: Decimal,
    pub total_monthly_amount: Decimal,
    pub total_contract_value: Decimal,
    #[schema(value_type = Option<String>, format = Date)]
    pub first_due_date: Option<NaiveDate>,
}

#[cfg(test)]
impl Subscription {
    /// Período pendente, recorrente, sem composição de contrato.
    pub fn fixture(amount: Decimal, due_date: NaiveDate) -> Self {
        let now = Utc::now();
        Subscription {
            id: Uuid::new_v4(),
            client_id: Uuid::new_v4(),
            description: None,
            amount,
            due_date,
            payment_date: None,
            status: SubscriptionStatus::Pendente,
            is_recurring: true,
            recurrence_day: Some(chrono::Datelike::day(&due_date) as i32),
            current_installment: 1,
            total_installments: None,
            is_paused: false,
            implementation_value: None,
            payment_type: None,
            installments: None,
            maintenance_value_per_number: None,
            number_of_numbers: None,
            contract_duration: None,
            payment_day: None,
            initial_payment_paid: false,
            initial_payment_amount: None,
            notes: None,
            created_at: now,
            updated_at: now,
        }
    }
}
