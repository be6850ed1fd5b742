// src/docs.rs

use utoipa::OpenApi;
use utoipa::openapi::security::{Http, HttpAuthScheme, SecurityScheme};
use crate::handlers;
use crate::models;

#[derive(OpenApi)]
#[openapi(
    paths(
        // --- Auth ---
        handlers::auth::login,
        handlers::auth::get_me,

        // --- Clients ---
        handlers::clients::list_clients,
        handlers::clients::create_client,
        handlers::clients::get_client,
        handlers::clients::update_client,
        handlers::clients::delete_client,
        handlers::clients::replace_numbers,
        handlers::clients::update_credential,
        handlers::clients::list_client_subscriptions,

        // --- Subscriptions ---
        handlers::subscriptions::list_subscriptions,
        handlers::subscriptions::create_subscription,
        handlers::subscriptions::preview_subscription,
        handlers::subscriptions::get_subscription,
        handlers::subscriptions::update_subscription,
        handlers::subscriptions::delete_subscription,
        handlers::subscriptions::mark_as_paid,
        handlers::subscriptions::pause_subscription,
        handlers::subscriptions::resume_subscription,
        handlers::subscriptions::cancel_subscription,
        handlers::subscriptions::overdue_check,
        handlers::subscriptions::list_payments,
        handlers::subscriptions::delete_payment,

        // --- Reports ---
        handlers::reports::financial_report,
        handlers::reports::calendar,

        // --- Documents ---
        handlers::documents::financial_report_pdf,
        handlers::documents::charge_pdf,

        // --- Notifications ---
        handlers::notifications::list_reminders,
        handlers::notifications::clear_reminders,

        // --- Settings ---
        handlers::settings::get_settings,
        handlers::settings::update_settings,
    ),
    components(
        schemas(
            // --- Auth ---
            models::auth::AdminUser,
            models::auth::LoginPayload,
            models::auth::AuthResponse,

            // --- Clients ---
            models::client::ClientStatus,
            models::client::Client,
            models::client::NumberCredentials,
            models::client::CredentialSection,
            models::client::CredentialUpdate,
            models::client::MetaBusinessField,
            models::client::HostingField,
            models::client::PlatformField,
            models::client::EmailField,
            models::client::ClientPayload,
            models::client::ReplaceNumbersPayload,

            // --- Subscriptions ---
            models::subscription::SubscriptionStatus,
            models::subscription::PaymentType,
            models::subscription::Subscription,
            models::subscription::PaymentHistory,
            models::subscription::ContractConfig,
            models::subscription::BillingBreakdown,
            models::subscription::CreateSubscriptionPayload,
            models::subscription::UpdateSubscriptionPayload,
            models::subscription::MarkPaidPayload,
            models::subscription::PaymentOutcome,
            handlers::subscriptions::PreviewPayload,
            handlers::subscriptions::OverdueCheckResponse,

            // --- Reports ---
            models::report::FinancialReport,
            models::report::PaidBreakdown,
            models::report::UpcomingPayment,
            models::report::MonthlyRevenueEntry,
            models::report::CalendarDay,
            models::report::ClientStatusCount,

            // --- Notifications ---
            models::notification::PaymentReminder,

            // --- Settings ---
            models::settings::AgencySettings,
            models::settings::UpdateSettingsRequest,
        )
    ),
    tags(
        (name = "Auth", description = "Login do administrador"),
        (name = "Clients", description = "Clientes, números e credenciais"),
        (name = "Subscriptions", description = "Assinaturas, recorrência e pagamentos"),
        (name = "Reports", description = "Relatório financeiro e calendário"),
        (name = "Documents", description = "PDFs de relatório e cobrança"),
        (name = "Notifications", description = "Lembretes de pagamento do PWA"),
        (name = "Settings", description = "Dados da agência")
    ),
    modifiers(&SecurityAddon)
)]
pub struct ApiDoc;

struct SecurityAddon;

impl utoipa::Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "api_jwt",
            SecurityScheme::Http(
                Http::new(HttpAuthScheme::Bearer)
            ),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn document_lists_every_route_group() {
        let doc = ApiDoc::openapi();

        for path in [
            "/api/auth/login",
            "/api/clients/{id}/numbers/{index}/credentials",
            "/api/subscriptions/{id}/pay",
            "/api/reports/financial",
            "/api/notifications",
            "/api/settings",
        ] {
            assert!(doc.paths.paths.contains_key(path), "rota ausente: {}", path);
        }
    }
}
