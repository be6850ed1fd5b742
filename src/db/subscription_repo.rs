// src/db/subscription_repo.rs

use chrono::NaiveDate;
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    models::subscription::{NewSubscription, Subscription, UpdateSubscriptionPayload},
};

/// Assinatura com o nome do cliente (lembretes e documentos).
#[derive(Debug, FromRow)]
pub struct SubscriptionWithClient {
    #[sqlx(flatten)]
    pub subscription: Subscription,
    pub client_name: String,
}

#[derive(Clone)]
pub struct SubscriptionRepository {
    pool: PgPool,
}

impl SubscriptionRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    // =========================================================================
    //  CONSULTAS
    // =========================================================================

    /// Todas as assinaturas, do vencimento mais distante para o mais próximo.
    pub async fn list_all(&self) -> Result<Vec<Subscription>, AppError> {
        let subscriptions = sqlx::query_as::<_, Subscription>(
            "SELECT * FROM subscriptions ORDER BY due_date DESC",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(subscriptions)
    }

    pub async fn list_by_client(&self, client_id: Uuid) -> Result<Vec<Subscription>, AppError> {
        let subscriptions = sqlx::query_as::<_, Subscription>(
            "SELECT * FROM subscriptions WHERE client_id = $1 ORDER BY due_date DESC",
        )
        .bind(client_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(subscriptions)
    }

    /// Vencimentos no intervalo fechado [from, to].
    pub async fn list_due_between(
        &self,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<SubscriptionWithClient>, AppError> {
        let rows = sqlx::query_as::<_, SubscriptionWithClient>(
            r#"
            SELECT s.*, c.name AS client_name
            FROM subscriptions s
            JOIN clients c ON c.id = s.client_id
            WHERE s.due_date BETWEEN $1 AND $2
            ORDER BY s.due_date DESC
            "#,
        )
        .bind(from)
        .bind(to)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<Subscription>, AppError> {
        let subscription = sqlx::query_as::<_, Subscription>("SELECT * FROM subscriptions WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(subscription)
    }

    pub async fn find_with_client(&self, id: Uuid) -> Result<Option<SubscriptionWithClient>, AppError> {
        let row = sqlx::query_as::<_, SubscriptionWithClient>(
            r#"
            SELECT s.*, c.name AS client_name
            FROM subscriptions s
            JOIN clients c ON c.id = s.client_id
            WHERE s.id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row)
    }

    // =========================================================================
    //  ESCRITAS (cada uma é atômica por si só)
    // =========================================================================

    pub async fn insert(&self, new: &NewSubscription) -> Result<Subscription, AppError> {
        let subscription = sqlx::query_as::<_, Subscription>(
            r#"
            INSERT INTO subscriptions (
                client_id, description, amount, due_date, status,
                is_recurring, recurrence_day, current_installment, total_installments, is_paused,
                implementation_value, payment_type, installments,
                maintenance_value_per_number, number_of_numbers, contract_duration, payment_day,
                initial_payment_paid, initial_payment_amount, notes
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17, $18, $19, $20)
            RETURNING *
            "#,
        )
        .bind(new.client_id)
        .bind(&new.description)
        .bind(new.amount)
        .bind(new.due_date)
        .bind(new.status)
        .bind(new.is_recurring)
        .bind(new.recurrence_day)
        .bind(new.current_installment)
        .bind(new.total_installments)
        .bind(new.is_paused)
        .bind(new.implementation_value)
        .bind(new.payment_type)
        .bind(new.installments)
        .bind(new.maintenance_value_per_number)
        .bind(new.number_of_numbers)
        .bind(new.contract_duration)
        .bind(new.payment_day)
        .bind(new.initial_payment_paid)
        .bind(new.initial_payment_amount)
        .bind(&new.notes)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            // Cliente inexistente vira 404 em vez de 500
            if let Some(db_err) = e.as_database_error() {
                if db_err.is_foreign_key_violation() {
                    return AppError::ClientNotFound;
                }
            }
            e.into()
        })?;

        Ok(subscription)
    }

    /// `None` quando o id não existe ou o novo total ficaria abaixo da parcela atual.
    pub async fn update(
        &self,
        id: Uuid,
        input: &UpdateSubscriptionPayload,
    ) -> Result<Option<Subscription>, AppError> {
        let subscription = sqlx::query_as::<_, Subscription>(
            r#"
            UPDATE subscriptions SET
                description = COALESCE($2, description),
                amount = COALESCE($3, amount),
                due_date = COALESCE($4, due_date),
                is_recurring = COALESCE($5, is_recurring),
                recurrence_day = COALESCE($6, recurrence_day),
                total_installments = COALESCE($7, total_installments),
                notes = COALESCE($8, notes),
                updated_at = NOW()
            WHERE id = $1
              AND COALESCE($7, total_installments, current_installment) >= current_installment
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(&input.description)
        .bind(input.amount)
        .bind(input.due_date)
        .bind(input.is_recurring)
        .bind(input.recurrence_day)
        .bind(input.total_installments)
        .bind(&input.notes)
        .fetch_optional(&self.pool)
        .await?;

        Ok(subscription)
    }

    /// Só paga quem ainda está em aberto. `None` = já estava Pago/Cancelado (ou não existe).
    pub async fn mark_paid(&self, id: Uuid, payment_date: NaiveDate) -> Result<Option<Subscription>, AppError> {
        let subscription = sqlx::query_as::<_, Subscription>(
            r#"
            UPDATE subscriptions
            SET status = 'Pago', payment_date = $2, updated_at = NOW()
            WHERE id = $1 AND status NOT IN ('Pago', 'Cancelado')
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(payment_date)
        .fetch_optional(&self.pool)
        .await?;

        Ok(subscription)
    }

    pub async fn pause(&self, id: Uuid) -> Result<Option<Subscription>, AppError> {
        let subscription = sqlx::query_as::<_, Subscription>(
            r#"
            UPDATE subscriptions
            SET is_paused = TRUE, status = 'Pausado', updated_at = NOW()
            WHERE id = $1 AND status NOT IN ('Pago', 'Cancelado')
            RETURNING *
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(subscription)
    }

    pub async fn resume(&self, id: Uuid, due_date: NaiveDate) -> Result<Option<Subscription>, AppError> {
        let subscription = sqlx::query_as::<_, Subscription>(
            r#"
            UPDATE subscriptions
            SET is_paused = FALSE, status = 'Pendente', due_date = $2, updated_at = NOW()
            WHERE id = $1 AND (is_paused OR status = 'Pausado')
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(due_date)
        .fetch_optional(&self.pool)
        .await?;

        Ok(subscription)
    }

    pub async fn cancel(&self, id: Uuid) -> Result<Option<Subscription>, AppError> {
        let subscription = sqlx::query_as::<_, Subscription>(
            r#"
            UPDATE subscriptions
            SET status = 'Cancelado', is_paused = FALSE, updated_at = NOW()
            WHERE id = $1 AND status NOT IN ('Pago', 'Cancelado')
            RETURNING *
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(subscription)
    }

    /// Verificação em lote: todo Pendente vencido vira Atrasado.
    pub async fn mark_overdue(&self, today: NaiveDate) -> Result<u64, AppError> {
        let result = sqlx::query(
            r#"
            UPDATE subscriptions
            SET status = 'Atrasado', updated_at = NOW()
            WHERE status = 'Pendente' AND due_date < $1
            "#,
        )
        .bind(today)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected())
    }

    pub async fn delete(&self, id: Uuid) -> Result<u64, AppError> {
        let result = sqlx::query("DELETE FROM subscriptions WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected())
    }
}
