// src/models/settings.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use validator::Validate;

#[derive(Debug, Clone, Default, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AgencySettings {
    #[schema(example = "FlowTech Systems")]
    pub company_name: Option<String>,

    #[schema(example = "12.345.678/0001-99")]
    pub document: Option<String>,

    #[schema(example = "financeiro@flowtech.dev")]
    pub pix_key: Option<String>,

    #[schema(example = "Av. Paulista, 1000 - São Paulo")]
    pub address: Option<String>,

    pub email: Option<String>,
    pub phone: Option<String>,

    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateSettingsRequest {
    #[schema(example = "FlowTech Systems")]
    pub company_name: Option<String>,

    pub document: Option<String>,

    #[schema(example = "financeiro@flowtech.dev")]
    pub pix_key: Option<String>,

    pub address: Option<String>,

    #[validate(email(message = "invalid_email"))]
    pub email: Option<String>,

    pub phone: Option<String>,
}
