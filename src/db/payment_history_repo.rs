// src/db/payment_history_repo.rs

use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    models::subscription::{NewPaymentHistory, PaymentHistory},
};

#[derive(Clone)]
pub struct PaymentHistoryRepository {
    pool: PgPool,
}

impl PaymentHistoryRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn insert(&self, new: &NewPaymentHistory) -> Result<PaymentHistory, AppError> {
        let payment = sqlx::query_as::<_, PaymentHistory>(
            r#"
            INSERT INTO payment_history (subscription_id, amount, payment_date, payment_method, notes)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *
            "#,
        )
        .bind(new.subscription_id)
        .bind(new.amount)
        .bind(new.payment_date)
        .bind(&new.payment_method)
        .bind(&new.notes)
        .fetch_one(&self.pool)
        .await?;

        Ok(payment)
    }

    pub async fn list_all(&self) -> Result<Vec<PaymentHistory>, AppError> {
        let payments = sqlx::query_as::<_, PaymentHistory>(
            "SELECT * FROM payment_history ORDER BY payment_date DESC",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(payments)
    }

    pub async fn list_by_subscription(&self, subscription_id: Uuid) -> Result<Vec<PaymentHistory>, AppError> {
        let payments = sqlx::query_as::<_, PaymentHistory>(
            "SELECT * FROM payment_history WHERE subscription_id = $1 ORDER BY payment_date DESC",
        )
        .bind(subscription_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(payments)
    }

    // Existe para correções manuais; os fluxos normais nunca apagam histórico
    pub async fn delete(&self, id: Uuid) -> Result<u64, AppError> {
        let result = sqlx::query("DELETE FROM payment_history WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected())
    }
}
