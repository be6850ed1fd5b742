// src/services/report_service.rs

use chrono::Utc;

use crate::{
    common::error::AppError,
    db::{ClientRepository, PaymentHistoryRepository, SubscriptionRepository},
    models::report::FinancialReport,
    services::reports::{build_report, MonthWindow},
};

#[derive(Clone)]
pub struct ReportService {
    client_repo: ClientRepository,
    subscription_repo: SubscriptionRepository,
    history_repo: PaymentHistoryRepository,
}

impl ReportService {
    pub fn new(
        client_repo: ClientRepository,
        subscription_repo: SubscriptionRepository,
        history_repo: PaymentHistoryRepository,
    ) -> Self {
        Self { client_repo, subscription_repo, history_repo }
    }

    /// Relatório financeiro do mês (padrão: mês corrente).
    pub async fn financial_report(&self, month: Option<&str>) -> Result<FinancialReport, AppError> {
        let today = Utc::now().date_naive();
        let window = match month {
            Some(m) => MonthWindow::parse(m)?,
            None => MonthWindow::containing(today)
                .ok_or_else(|| AppError::BadRequest("invalid reference month".into()))?,
        };

        // Busca as três listas em paralelo
        let (subscriptions, history, statuses) = tokio::try_join!(
            self.subscription_repo.list_all(),
            self.history_repo.list_all(),
            self.client_repo.list_statuses(),
        )?;

        Ok(build_report(&subscriptions, &history, &statuses, today, window))
    }
}
