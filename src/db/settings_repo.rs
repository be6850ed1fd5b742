// src/db/settings_repo.rs

use sqlx::PgPool;

use crate::{
    common::error::AppError,
    models::settings::{AgencySettings, UpdateSettingsRequest},
};

#[derive(Clone)]
pub struct SettingsRepository {
    pool: PgPool,
}

impl SettingsRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn get_settings(&self) -> Result<AgencySettings, AppError> {
        // Linha única. Se ainda não foi configurada, devolvemos tudo vazio.
        let settings = sqlx::query_as::<_, AgencySettings>("SELECT * FROM agency_settings WHERE id")
            .fetch_optional(&self.pool)
            .await?;

        Ok(settings.unwrap_or_default())
    }

    pub async fn update_settings(&self, input: &UpdateSettingsRequest) -> Result<AgencySettings, AppError> {
        // UPSERT (Insert or Update)
        let settings = sqlx::query_as::<_, AgencySettings>(
            r#"
            INSERT INTO agency_settings (id, company_name, document, pix_key, address, email, phone)
            VALUES (TRUE, $1, $2, $3, $4, $5, $6)
            ON CONFLICT (id)
            DO UPDATE SET
                company_name = EXCLUDED.company_name,
                document = EXCLUDED.document,
                pix_key = EXCLUDED.pix_key,
                address = EXCLUDED.address,
                email = EXCLUDED.email,
                phone = EXCLUDED.phone,
                updated_at = NOW()
            RETURNING *
            "#,
        )
        .bind(&input.company_name)
        .bind(&input.document)
        .bind(&input.pix_key)
        .bind(&input.address)
        .bind(&input.email)
        .bind(&input.phone)
        .fetch_one(&self.pool)
        .await?;

        Ok(settings)
    }
}
