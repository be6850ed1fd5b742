// src/main.rs

use std::sync::Arc;

use anyhow::Context;
use axum::{
    middleware as axum_middleware,
    routing::{get, patch, post, put},
    Json, Router,
};
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;
use utoipa::OpenApi;

// Declaração dos nossos módulos
mod common;
mod config;
mod db;
mod docs;
mod handlers;
mod middleware;
mod models;
mod services;

use crate::config::{AppState, Config};
use crate::docs::ApiDoc;
use crate::middleware::auth::auth_guard;
use crate::services::{credential_migration::CredentialMigration, notifications::ReminderScheduler};
use crate::db::ClientRepository;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    // Inicializa o logger (RUST_LOG, padrão "info")
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .compact()
        .init();

    // Se a configuração falhar, a aplicação não deve iniciar.
    let config = Config::from_env().context("Falha ao carregar a configuração")?;
    let app_state = AppState::new(&config)
        .await
        .context("Falha ao inicializar o estado da aplicação")?;

    // Faz o app rodar as migrações do SQLx na inicialização
    sqlx::migrate!()
        .run(&app_state.db_pool)
        .await
        .context("Falha ao rodar as migrações do banco de dados")?;
    tracing::info!("✅ Migrações do banco de dados executadas com sucesso!");

    CredentialMigration::new(ClientRepository::new(app_state.db_pool.clone()))
        .run()
        .await
        .context("Falha na migração de credenciais")?;

    // Agendador de lembretes em segundo plano
    let reminders = ReminderScheduler::new(
        Arc::new(app_state.subscription_service.clone()),
        app_state.notifier.clone(),
        config.reminder_interval,
        config.reminder_lookahead_days,
    )
    .spawn();

    // Define as rotas de autenticação (públicas)
    let public_routes = Router::new()
        .route("/api/auth/login", post(handlers::auth::login))
        .route("/api/health", get(|| async { "OK" }))
        .route("/api/openapi.json", get(|| async { Json(ApiDoc::openapi()) }));

    // Todo o resto exige o token do administrador
    let protected_routes = Router::new()
        .route("/api/auth/me", get(handlers::auth::get_me))
        // Clientes
        .route(
            "/api/clients",
            get(handlers::clients::list_clients).post(handlers::clients::create_client),
        )
        .route(
            "/api/clients/{id}",
            get(handlers::clients::get_client)
                .put(handlers::clients::update_client)
                .delete(handlers::clients::delete_client),
        )
        .route("/api/clients/{id}/numbers", put(handlers::clients::replace_numbers))
        .route(
            "/api/clients/{id}/numbers/{index}/credentials",
            patch(handlers::clients::update_credential),
        )
        .route(
            "/api/clients/{id}/subscriptions",
            get(handlers::clients::list_client_subscriptions),
        )
        // Assinaturas
        .route(
            "/api/subscriptions",
            get(handlers::subscriptions::list_subscriptions).post(handlers::subscriptions::create_subscription),
        )
        .route("/api/subscriptions/preview", post(handlers::subscriptions::preview_subscription))
        .route("/api/subscriptions/overdue-check", post(handlers::subscriptions::overdue_check))
        .route(
            "/api/subscriptions/{id}",
            get(handlers::subscriptions::get_subscription)
                .put(handlers::subscriptions::update_subscription)
                .delete(handlers::subscriptions::delete_subscription),
        )
        .route("/api/subscriptions/{id}/pay", post(handlers::subscriptions::mark_as_paid))
        .route("/api/subscriptions/{id}/pause", post(handlers::subscriptions::pause_subscription))
        .route("/api/subscriptions/{id}/resume", post(handlers::subscriptions::resume_subscription))
        .route("/api/subscriptions/{id}/cancel", post(handlers::subscriptions::cancel_subscription))
        .route("/api/subscriptions/{id}/payments", get(handlers::subscriptions::list_payments))
        .route("/api/subscriptions/{id}/charge.pdf", get(handlers::documents::charge_pdf))
        .route("/api/payments/{id}", axum::routing::delete(handlers::subscriptions::delete_payment))
        // Relatórios
        .route("/api/calendar", get(handlers::reports::calendar))
        .route("/api/reports/financial", get(handlers::reports::financial_report))
        .route("/api/reports/financial.pdf", get(handlers::documents::financial_report_pdf))
        // Notificações e configurações
        .route(
            "/api/notifications",
            get(handlers::notifications::list_reminders).delete(handlers::notifications::clear_reminders),
        )
        .route(
            "/api/settings",
            get(handlers::settings::get_settings).put(handlers::settings::update_settings),
        )
        .layer(axum_middleware::from_fn_with_state(app_state.clone(), auth_guard));

    // Combina tudo no router principal
    let app = Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .with_state(app_state);

    // Inicia o servidor
    let listener = TcpListener::bind(&config.bind_addr)
        .await
        .with_context(|| format!("Falha ao iniciar o listener TCP em {}", config.bind_addr))?;
    tracing::info!("🚀 Servidor escutando em {}", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!("🔥 Falha ao escutar Ctrl-C: {}", e);
            }
            tracing::info!("🛑 Encerrando...");
            // O agendador para antes do servidor terminar as requisições em andamento
            reminders.shutdown().await;
        })
        .await
        .context("Erro no servidor Axum")?;

    Ok(())
}
