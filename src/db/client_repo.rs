// src/db/client_repo.rs

use serde_json::Value;
use sqlx::{types::Json, FromRow, PgPool};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    models::client::{Client, ClientPayload, ClientStatus, NumberCredentials},
};

/// Linha ainda no formato antigo de credenciais (um único pacote).
#[derive(Debug, FromRow)]
pub struct LegacyCredentialRow {
    pub id: Uuid,
    pub phone: Option<String>,
    pub credentials: Option<Json<Value>>,
    pub numbers: Json<Vec<NumberCredentials>>,
}

// O repositório de clientes, responsável pela tabela 'clients'
#[derive(Clone)]
pub struct ClientRepository {
    pool: PgPool,
}

impl ClientRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn list_clients(&self) -> Result<Vec<Client>, AppError> {
        let clients = sqlx::query_as::<_, Client>("SELECT * FROM clients ORDER BY name ASC")
            .fetch_all(&self.pool)
            .await?;

        Ok(clients)
    }

    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<Client>, AppError> {
        let client = sqlx::query_as::<_, Client>("SELECT * FROM clients WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(client)
    }

    pub async fn create_client(&self, input: &ClientPayload) -> Result<Client, AppError> {
        // Clientes novos já nascem no formato de credenciais por número
        let client = sqlx::query_as::<_, Client>(
            r#"
            INSERT INTO clients (
                name, email, phone, company_name, document, segment, notes, status,
                numbers, credentials_version
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, '[]'::jsonb, 2)
            RETURNING *
            "#,
        )
        .bind(&input.name)
        .bind(&input.email)
        .bind(&input.phone)
        .bind(&input.company_name)
        .bind(&input.document)
        .bind(&input.segment)
        .bind(&input.notes)
        .bind(input.status.unwrap_or(ClientStatus::Lead))
        .fetch_one(&self.pool)
        .await?;

        Ok(client)
    }

    pub async fn update_client(&self, id: Uuid, input: &ClientPayload) -> Result<Option<Client>, AppError> {
        let client = sqlx::query_as::<_, Client>(
            r#"
            UPDATE clients SET
                name = $2,
                email = $3,
                phone = $4,
                company_name = $5,
                document = $6,
                segment = $7,
                notes = $8,
                status = COALESCE($9, status),
                updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(&input.name)
        .bind(&input.email)
        .bind(&input.phone)
        .bind(&input.company_name)
        .bind(&input.document)
        .bind(&input.segment)
        .bind(&input.notes)
        .bind(input.status)
        .fetch_optional(&self.pool)
        .await?;

        Ok(client)
    }

    pub async fn update_numbers(
        &self,
        id: Uuid,
        numbers: &[NumberCredentials],
    ) -> Result<Option<Client>, AppError> {
        let client = sqlx::query_as::<_, Client>(
            "UPDATE clients SET numbers = $2, updated_at = NOW() WHERE id = $1 RETURNING *",
        )
        .bind(id)
        .bind(Json(numbers))
        .fetch_optional(&self.pool)
        .await?;

        Ok(client)
    }

    /// Retorna quantas linhas foram apagadas (0 ou 1).
    pub async fn delete_client(&self, id: Uuid) -> Result<u64, AppError> {
        let result = sqlx::query("DELETE FROM clients WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected())
    }

    pub async fn list_statuses(&self) -> Result<Vec<ClientStatus>, AppError> {
        let statuses = sqlx::query_scalar::<_, ClientStatus>("SELECT status FROM clients")
            .fetch_all(&self.pool)
            .await?;

        Ok(statuses)
    }

    // =========================================================================
    //  MIGRAÇÃO DE CREDENCIAIS
    // =========================================================================

    pub async fn list_pending_credential_migrations(
        &self,
        target_version: i32,
    ) -> Result<Vec<LegacyCredentialRow>, AppError> {
        let rows = sqlx::query_as::<_, LegacyCredentialRow>(
            r#"
            SELECT id, phone, credentials, numbers
            FROM clients
            WHERE credentials_version < $1
            ORDER BY created_at ASC
            "#,
        )
        .bind(target_version)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    pub async fn complete_credential_migration(
        &self,
        id: Uuid,
        numbers: &[NumberCredentials],
        target_version: i32,
    ) -> Result<(), AppError> {
        sqlx::query(
            r#"
            UPDATE clients
            SET numbers = $2, credentials = NULL, credentials_version = $3, updated_at = NOW()
            WHERE id = $1 AND credentials_version < $3
            "#,
        )
        .bind(id)
        .bind(Json(numbers))
        .bind(target_version)
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}
