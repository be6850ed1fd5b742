// src/config.rs

use std::{env, sync::Arc, time::Duration};

use anyhow::Context;
use sqlx::{postgres::PgPoolOptions, PgPool};

use crate::{
    db::{ClientRepository, PaymentHistoryRepository, SettingsRepository, SubscriptionRepository},
    services::{
        auth::AuthService,
        client_service::ClientService,
        document_service::DocumentService,
        notifications::{InMemoryReminderFeed, ReminderNotifier},
        report_service::ReportService,
        subscription_service::SubscriptionService,
    },
};

/// Configuração lida do ambiente (e do `.env`, se existir).
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub jwt_secret: String,
    pub admin_email: String,
    pub admin_password_hash: String,
    pub bind_addr: String,
    pub reminder_interval: Duration,
    pub reminder_lookahead_days: i64,
    pub fonts_dir: String,
}

fn required(key: &str) -> anyhow::Result<String> {
    env::var(key).with_context(|| format!("{} deve ser definida", key))
}

/// Teto da antecedência dos lembretes, em dias.
pub const MAX_REMINDER_LOOKAHEAD_DAYS: i64 = 365;

fn check_lookahead(days: i64) -> anyhow::Result<i64> {
    anyhow::ensure!(days >= 0, "REMINDER_LOOKAHEAD_DAYS não pode ser negativa");
    anyhow::ensure!(
        days <= MAX_REMINDER_LOOKAHEAD_DAYS,
        "REMINDER_LOOKAHEAD_DAYS não pode passar de {} dias",
        MAX_REMINDER_LOOKAHEAD_DAYS
    );
    Ok(days)
}

fn optional_parsed<T>(key: &str, default: T) -> anyhow::Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match env::var(key) {
        Ok(value) => value.trim().parse().with_context(|| format!("{} inválida: '{}'", key, value)),
        Err(_) => Ok(default),
    }
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let reminder_lookahead_days = check_lookahead(optional_parsed("REMINDER_LOOKAHEAD_DAYS", 3)?)?;

        let interval_secs: u64 = optional_parsed("REMINDER_INTERVAL_SECS", 3600)?;
        anyhow::ensure!(interval_secs > 0, "REMINDER_INTERVAL_SECS deve ser maior que zero");

        Ok(Self {
            database_url: required("DATABASE_URL")?,
            jwt_secret: required("JWT_SECRET")?,
            admin_email: required("ADMIN_EMAIL")?,
            admin_password_hash: required("ADMIN_PASSWORD_HASH")?,
            bind_addr: env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".to_string()),
            reminder_interval: Duration::from_secs(interval_secs),
            reminder_lookahead_days,
            fonts_dir: env::var("FONTS_DIR").unwrap_or_else(|_| "./fonts".to_string()),
        })
    }
}

#[derive(Clone)]
pub struct AppState {
    pub db_pool: PgPool,
    pub auth_service: AuthService,
    pub client_service: ClientService,
    pub subscription_service: SubscriptionService,
    pub report_service: ReportService,
    pub document_service: DocumentService,
    pub settings_repo: SettingsRepository,
    pub notifier: Arc<dyn ReminderNotifier>,
}

impl AppState {
    pub async fn new(config: &Config) -> anyhow::Result<Self> {
        // Conecta ao banco de dados, usando '?' para propagar erros
        let db_pool = PgPoolOptions::new()
            .max_connections(5)
            .acquire_timeout(Duration::from_secs(3))
            .connect(&config.database_url)
            .await
            .context("Falha ao conectar ao banco de dados")?;

        tracing::info!("✅ Conexão com o banco de dados estabelecida com sucesso!");

        // --- Monta o gráfico de dependências ---
        let client_repo = ClientRepository::new(db_pool.clone());
        let subscription_repo = SubscriptionRepository::new(db_pool.clone());
        let history_repo = PaymentHistoryRepository::new(db_pool.clone());
        let settings_repo = SettingsRepository::new(db_pool.clone());

        let auth_service = AuthService::new(
            config.admin_email.clone(),
            config.admin_password_hash.clone(),
            config.jwt_secret.clone(),
        );
        let client_service = ClientService::new(client_repo.clone());
        let subscription_service = SubscriptionService::new(subscription_repo.clone(), history_repo.clone());
        let report_service = ReportService::new(client_repo, subscription_repo, history_repo);
        let document_service = DocumentService::new(
            report_service.clone(),
            subscription_service.clone(),
            settings_repo.clone(),
            config.fonts_dir.clone(),
        );

        Ok(Self {
            db_pool,
            auth_service,
            client_service,
            subscription_service,
            report_service,
            document_service,
            settings_repo,
            notifier: Arc::new(InMemoryReminderFeed::new()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookahead_must_fit_within_a_year() {
        assert_eq!(check_lookahead(0).unwrap(), 0);
        assert_eq!(check_lookahead(MAX_REMINDER_LOOKAHEAD_DAYS).unwrap(), MAX_REMINDER_LOOKAHEAD_DAYS);
        assert!(check_lookahead(-1).is_err());
        assert!(check_lookahead(MAX_REMINDER_LOOKAHEAD_DAYS + 1).is_err());
        assert!(check_lookahead(i64::MAX).is_err());
    }
}
