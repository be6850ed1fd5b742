// src/services/subscription_service.rs

use async_trait::async_trait;
use chrono::{Datelike, NaiveDate, Utc};
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::{PaymentHistoryRepository, SubscriptionRepository},
    models::{
        report::CalendarDay,
        subscription::{
            BillingBreakdown, ContractConfig, CreateSubscriptionPayload, MarkPaidPayload, NewPaymentHistory,
            NewSubscription, PaymentHistory, PaymentOutcome, PaymentType, Subscription, SubscriptionStatus,
            UpdateSubscriptionPayload,
        },
    },
    services::{
        billing,
        notifications::ReminderSource,
        recurrence::{self, PaymentPlan},
        reports::{build_calendar, MonthWindow},
    },
};

#[derive(Clone)]
pub struct SubscriptionService {
    repo: SubscriptionRepository,
    history_repo: PaymentHistoryRepository,
}

/// Monta o primeiro período a partir do payload. Não toca no banco.
pub fn new_subscription_from(
    payload: &CreateSubscriptionPayload,
    today: NaiveDate,
) -> Result<NewSubscription, AppError> {
    let start = payload.start_date.unwrap_or(today);
    let breakdown = payload.contract.as_ref().map(|c| billing::calculate(c, start)).transpose()?;
    let contract = payload.contract.as_ref();

    let amount = match (payload.amount, &breakdown) {
        (Some(amount), _) => amount,
        (None, Some(b)) => b.total_monthly_amount.round_dp(2),
        (None, None) => return Err(AppError::BadRequest("amount_required".into())),
    };
    if amount < Decimal::ZERO {
        return Err(AppError::BadRequest("negative_amount".into()));
    }
    if let Some(c) = contract {
        if c.implementation_value < Decimal::ZERO || c.maintenance_value_per_number < Decimal::ZERO {
            return Err(AppError::BadRequest("negative_amount".into()));
        }
    }

    let due_date = payload
        .due_date
        .or_else(|| breakdown.as_ref().and_then(|b| b.first_due_date))
        .ok_or_else(|| AppError::BadRequest("due_date_required".into()))?;

    let recurrence_day = payload
        .recurrence_day
        .or_else(|| contract.map(|c| c.payment_day))
        .or_else(|| Some(due_date.day() as i32));

    let total_installments = payload
        .total_installments
        .or_else(|| contract.map(|c| c.contract_duration).filter(|d| *d > 0));

    // Implantação à vista fica fora da recorrência, registrada como pagamento inicial
    let initial_payment_amount = contract
        .filter(|c| c.payment_type == PaymentType::Vista)
        .map(|c| c.implementation_value);

    Ok(NewSubscription {
        client_id: payload.client_id,
        description: payload.description.clone(),
        amount,
        due_date,
        status: SubscriptionStatus::Pendente,
        is_recurring: payload.is_recurring || contract.is_some(),
        recurrence_day,
        current_installment: 1,
        total_installments,
        is_paused: false,
        implementation_value: contract.map(|c| c.implementation_value),
        payment_type: contract.map(|c| c.payment_type),
        installments: contract.map(|c| c.installments),
        maintenance_value_per_number: contract.map(|c| c.maintenance_value_per_number),
        number_of_numbers: contract.map(|c| c.number_of_numbers),
        contract_duration: contract.map(|c| c.contract_duration),
        payment_day: contract.map(|c| c.payment_day),
        initial_payment_paid: initial_payment_amount.is_some() && payload.initial_payment_paid,
        initial_payment_amount,
        notes: payload.notes.clone(),
    })
}

/// As três escritas de "marcar como pago", cada uma atômica por si só.
#[async_trait]
pub trait PaymentWrites: Send + Sync {
    /// `None` quando o período já não está em aberto.
    async fn mark_paid(&self, id: Uuid, payment_date: NaiveDate) -> Result<Option<Subscription>, AppError>;
    async fn append_history(&self, entry: &NewPaymentHistory) -> Result<PaymentHistory, AppError>;
    async fn insert_successor(&self, next: &NewSubscription) -> Result<Subscription, AppError>;
}

/// Aplica o plano em ordem: pago, histórico, sucessor. Não há transação entre
/// as escritas; se o sucessor falhar, o período continua pago.
pub async fn apply_payment_plan(
    writes: &dyn PaymentWrites,
    id: Uuid,
    plan: PaymentPlan,
) -> Result<PaymentOutcome, AppError> {
    // Outra requisição pode ter pago no meio do caminho
    let paid = writes
        .mark_paid(id, plan.payment_date)
        .await?
        .ok_or_else(|| AppError::InvalidTransition("subscription is no longer open".into()))?;

    let payment = writes.append_history(&plan.history).await?;

    let successor = match plan.successor {
        Some(next) => match writes.insert_successor(&next).await {
            Ok(created) => Some(created),
            Err(e) => {
                tracing::error!(
                    "🔥 Assinatura {} paga, mas o próximo período não foi criado: {}",
                    paid.id,
                    e
                );
                return Err(e);
            }
        },
        None => None,
    };

    tracing::info!(
        "💰 Assinatura {} paga em {} (parcela {}){}",
        paid.id,
        plan.payment_date,
        paid.current_installment,
        successor.as_ref().map(|s| format!(", próximo vencimento {}", s.due_date)).unwrap_or_default()
    );

    Ok(PaymentOutcome { paid, payment, successor })
}

impl SubscriptionService {
    pub fn new(repo: SubscriptionRepository, history_repo: PaymentHistoryRepository) -> Self {
        Self { repo, history_repo }
    }

    fn today() -> NaiveDate {
        Utc::now().date_naive()
    }

    async fn find(&self, id: Uuid) -> Result<Subscription, AppError> {
        self.repo.find_by_id(id).await?.ok_or(AppError::SubscriptionNotFound)
    }

    // =========================================================================
    //  CRUD
    // =========================================================================

    pub async fn list_subscriptions(&self) -> Result<Vec<Subscription>, AppError> {
        self.repo.list_all().await
    }

    pub async fn list_by_client(&self, client_id: Uuid) -> Result<Vec<Subscription>, AppError> {
        self.repo.list_by_client(client_id).await
    }

    pub async fn get_subscription(&self, id: Uuid) -> Result<Subscription, AppError> {
        self.find(id).await
    }

    pub fn preview(&self, config: &ContractConfig, start: Option<NaiveDate>) -> Result<BillingBreakdown, AppError> {
        billing::calculate(config, start.unwrap_or_else(Self::today))
    }

    pub async fn create_subscription(&self, payload: &CreateSubscriptionPayload) -> Result<Subscription, AppError> {
        let new = new_subscription_from(payload, Self::today())?;
        let subscription = self.repo.insert(&new).await?;
        tracing::info!(
            "🧾 Assinatura {} criada para o cliente {} (R$ {}, vence {})",
            subscription.id,
            subscription.client_id,
            subscription.amount,
            subscription.due_date
        );
        Ok(subscription)
    }

    pub async fn update_subscription(
        &self,
        id: Uuid,
        payload: &UpdateSubscriptionPayload,
    ) -> Result<Subscription, AppError> {
        if payload.amount.is_some_and(|a| a < Decimal::ZERO) {
            return Err(AppError::BadRequest("negative_amount".into()));
        }
        let current = self.find(id).await?;
        recurrence::check_installment_cap(&current, payload.total_installments)?;

        // O UPDATE repete a checagem da parcela; `None` aqui é registro removido no meio do caminho
        self.repo.update(id, payload).await?.ok_or(AppError::SubscriptionNotFound)
    }

    pub async fn delete_subscription(&self, id: Uuid) -> Result<(), AppError> {
        if self.repo.delete(id).await? == 0 {
            return Err(AppError::SubscriptionNotFound);
        }
        Ok(())
    }

    // =========================================================================
    //  TRANSIÇÕES
    // =========================================================================

    /// Marca como pago, grava o histórico e gera o próximo período quando couber.
    pub async fn mark_as_paid(&self, id: Uuid, payload: MarkPaidPayload) -> Result<PaymentOutcome, AppError> {
        let current = self.find(id).await?;
        let payment_date = payload.payment_date.unwrap_or_else(Self::today);
        let plan = recurrence::plan_payment(&current, payment_date, payload.payment_method, payload.notes)?;

        apply_payment_plan(self, id, plan).await
    }

    pub async fn pause(&self, id: Uuid) -> Result<Subscription, AppError> {
        let current = self.find(id).await?;
        recurrence::check_pause(&current)?;

        let paused = self
            .repo
            .pause(id)
            .await?
            .ok_or_else(|| AppError::InvalidTransition("subscription is no longer open".into()))?;
        tracing::info!("⏸️ Assinatura {} pausada", id);
        Ok(paused)
    }

    pub async fn resume(&self, id: Uuid) -> Result<Subscription, AppError> {
        let current = self.find(id).await?;
        let due_date = recurrence::resume_due_date(&current, Self::today())?;

        let resumed = self
            .repo
            .resume(id, due_date)
            .await?
            .ok_or_else(|| AppError::InvalidTransition("subscription is not paused".into()))?;
        tracing::info!("▶️ Assinatura {} retomada, vence em {}", id, due_date);
        Ok(resumed)
    }

    pub async fn cancel(&self, id: Uuid) -> Result<Subscription, AppError> {
        let current = self.find(id).await?;
        recurrence::check_cancel(&current)?;

        let cancelled = self
            .repo
            .cancel(id)
            .await?
            .ok_or_else(|| AppError::InvalidTransition("subscription is no longer open".into()))?;
        tracing::info!("❌ Assinatura {} cancelada", id);
        Ok(cancelled)
    }

    pub async fn run_overdue_check(&self) -> Result<u64, AppError> {
        let updated = self.repo.mark_overdue(Self::today()).await?;
        tracing::info!("⏰ Verificação de atrasos: {} assinaturas atualizadas", updated);
        Ok(updated)
    }

    // =========================================================================
    //  HISTÓRICO E CALENDÁRIO
    // =========================================================================

    pub async fn list_payments(&self, subscription_id: Uuid) -> Result<Vec<PaymentHistory>, AppError> {
        self.find(subscription_id).await?;
        self.history_repo.list_by_subscription(subscription_id).await
    }

    pub async fn delete_payment(&self, payment_id: Uuid) -> Result<(), AppError> {
        if self.history_repo.delete(payment_id).await? == 0 {
            return Err(AppError::PaymentNotFound);
        }
        tracing::info!("🗑️ Pagamento {} removido do histórico", payment_id);
        Ok(())
    }

    pub async fn calendar(&self, month: Option<&str>) -> Result<Vec<CalendarDay>, AppError> {
        let today = Self::today();
        let window = match month {
            Some(m) => MonthWindow::parse(m)?,
            None => MonthWindow::containing(today)
                .ok_or_else(|| AppError::BadRequest("invalid reference month".into()))?,
        };
        let subscriptions = self.repo.list_all().await?;
        Ok(build_calendar(&subscriptions, &window, today))
    }

    /// Assinatura com o nome do cliente, para a cobrança em PDF.
    pub async fn get_with_client(&self, id: Uuid) -> Result<(Subscription, String), AppError> {
        self.repo
            .find_with_client(id)
            .await?
            .map(|row| (row.subscription, row.client_name))
            .ok_or(AppError::SubscriptionNotFound)
    }
}

#[async_trait]
impl PaymentWrites for SubscriptionService {
    async fn mark_paid(&self, id: Uuid, payment_date: NaiveDate) -> Result<Option<Subscription>, AppError> {
        self.repo.mark_paid(id, payment_date).await
    }

    async fn append_history(&self, entry: &NewPaymentHistory) -> Result<PaymentHistory, AppError> {
        self.history_repo.insert(entry).await
    }

    async fn insert_successor(&self, next: &NewSubscription) -> Result<Subscription, AppError> {
        self.repo.insert(next).await
    }
}

#[async_trait]
impl ReminderSource for SubscriptionService {
    async fn mark_overdue(&self, today: NaiveDate) -> Result<u64, AppError> {
        self.repo.mark_overdue(today).await
    }

    async fn due_between(&self, from: NaiveDate, to: NaiveDate) -> Result<Vec<(Subscription, String)>, AppError> {
        let rows = self.repo.list_due_between(from, to).await?;
        Ok(rows.into_iter().map(|row| (row.subscription, row.client_name)).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;
    use rust_decimal_macros::dec;
    use std::{collections::HashMap, sync::Mutex};

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn payload(contract: Option<ContractConfig>) -> CreateSubscriptionPayload {
        CreateSubscriptionPayload {
            client_id: Uuid::new_v4(),
            description: Some("Manutenção mensal".into()),
            amount: None,
            due_date: None,
            start_date: Some(date(2025, 1, 5)),
            is_recurring: false,
            recurrence_day: None,
            total_installments: None,
            contract,
            initial_payment_paid: false,
            notes: None,
        }
    }

    fn contract(payment_type: PaymentType) -> ContractConfig {
        ContractConfig {
            implementation_value: dec!(2500),
            payment_type,
            installments: 10,
            maintenance_value_per_number: dec!(350),
            number_of_numbers: 3,
            contract_duration: 12,
            payment_day: 10,
        }
    }

    #[test]
    fn contract_fills_amount_due_date_and_counters() {
        let new = new_subscription_from(&payload(Some(contract(PaymentType::Parcelado))), date(2025, 1, 1)).unwrap();

        assert_eq!(new.amount, dec!(1300));
        assert_eq!(new.due_date, date(2025, 1, 10));
        assert_eq!(new.recurrence_day, Some(10));
        assert_eq!(new.total_installments, Some(12));
        assert_eq!(new.current_installment, 1);
        assert!(new.is_recurring);
        assert_eq!(new.initial_payment_amount, None);
    }

    #[test]
    fn vista_records_the_initial_payment_outside_the_monthly_amount() {
        let mut input = payload(Some(contract(PaymentType::Vista)));
        input.initial_payment_paid = true;

        let new = new_subscription_from(&input, date(2025, 1, 1)).unwrap();

        assert_eq!(new.amount, dec!(1050));
        assert_eq!(new.initial_payment_amount, Some(dec!(2500)));
        assert!(new.initial_payment_paid);
    }

    #[test]
    fn explicit_values_win_over_the_contract() {
        let mut input = payload(Some(contract(PaymentType::Parcelado)));
        input.amount = Some(dec!(999.90));
        input.due_date = Some(date(2025, 2, 20));
        input.recurrence_day = Some(20);

        let new = new_subscription_from(&input, date(2025, 1, 1)).unwrap();

        assert_eq!(new.amount, dec!(999.90));
        assert_eq!(new.due_date, date(2025, 2, 20));
        assert_eq!(new.recurrence_day, Some(20));
    }

    #[test]
    fn manual_subscription_needs_amount_and_due_date() {
        assert!(matches!(
            new_subscription_from(&payload(None), date(2025, 1, 1)),
            Err(AppError::BadRequest(_))
        ));

        let mut input = payload(None);
        input.amount = Some(dec!(500));
        input.due_date = Some(date(2025, 1, 31));
        let new = new_subscription_from(&input, date(2025, 1, 1)).unwrap();

        assert!(!new.is_recurring);
        assert_eq!(new.recurrence_day, Some(31));
        assert_eq!(new.total_installments, None);
    }

    #[test]
    fn negative_amounts_are_rejected() {
        let mut input = payload(None);
        input.amount = Some(dec!(-1));
        input.due_date = Some(date(2025, 1, 10));

        assert!(matches!(new_subscription_from(&input, date(2025, 1, 1)), Err(AppError::BadRequest(_))));
    }

    /// Armazenamento em memória para as escritas do pagamento.
    #[derive(Default)]
    struct MemoryWrites {
        rows: Mutex<HashMap<Uuid, Subscription>>,
        calls: Mutex<Vec<&'static str>>,
        fail_successor: bool,
    }

    impl MemoryWrites {
        fn with(rows: &[Subscription]) -> Self {
            let store = Self::default();
            store.rows.lock().unwrap().extend(rows.iter().map(|r| (r.id, r.clone())));
            store
        }

        fn get(&self, id: Uuid) -> Subscription {
            self.rows.lock().unwrap()[&id].clone()
        }

        fn calls(&self) -> Vec<&'static str> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl PaymentWrites for MemoryWrites {
        async fn mark_paid(&self, id: Uuid, payment_date: NaiveDate) -> Result<Option<Subscription>, AppError> {
            self.calls.lock().unwrap().push("mark_paid");
            let mut rows = self.rows.lock().unwrap();
            let paid = rows.get_mut(&id).filter(|row| !row.status.is_closed()).map(|row| {
                row.status = SubscriptionStatus::Pago;
                row.payment_date = Some(payment_date);
                row.clone()
            });
            Ok(paid)
        }

        async fn append_history(&self, entry: &NewPaymentHistory) -> Result<PaymentHistory, AppError> {
            self.calls.lock().unwrap().push("append_history");
            Ok(PaymentHistory {
                id: Uuid::new_v4(),
                subscription_id: entry.subscription_id,
                amount: entry.amount,
                payment_date: entry.payment_date,
                payment_method: entry.payment_method.clone(),
                notes: entry.notes.clone(),
                created_at: Utc::now(),
            })
        }

        async fn insert_successor(&self, next: &NewSubscription) -> Result<Subscription, AppError> {
            self.calls.lock().unwrap().push("insert_successor");
            if self.fail_successor {
                return Err(AppError::DatabaseError(sqlx::Error::PoolTimedOut));
            }
            let mut row = Subscription::fixture(next.amount, next.due_date);
            row.client_id = next.client_id;
            row.current_installment = next.current_installment;
            row.total_installments = next.total_installments;
            row.recurrence_day = next.recurrence_day;
            row.is_paused = next.is_paused;
            row.status = next.status;
            self.rows.lock().unwrap().insert(row.id, row.clone());
            Ok(row)
        }
    }

    #[tokio::test]
    async fn payment_writes_happen_in_order() {
        let sub = Subscription::fixture(dec!(1300), date(2025, 1, 10));
        let store = MemoryWrites::with(&[sub.clone()]);
        let plan = recurrence::plan_payment(&sub, date(2025, 1, 9), Some("pix".into()), None).unwrap();

        let outcome = apply_payment_plan(&store, sub.id, plan).await.unwrap();

        assert_eq!(store.calls(), vec!["mark_paid", "append_history", "insert_successor"]);
        assert_eq!(outcome.paid.status, SubscriptionStatus::Pago);
        assert_eq!(outcome.payment.amount, dec!(1300));
        let next = outcome.successor.expect("successor");
        assert_eq!(next.due_date, date(2025, 2, 10));
        assert_eq!(next.current_installment, 2);
    }

    #[tokio::test]
    async fn failed_successor_keeps_the_payment_and_reports_500() {
        let sub = Subscription::fixture(dec!(1300), date(2025, 1, 10));
        let store = MemoryWrites { fail_successor: true, ..MemoryWrites::with(&[sub.clone()]) };
        let plan = recurrence::plan_payment(&sub, date(2025, 1, 10), None, None).unwrap();

        let err = apply_payment_plan(&store, sub.id, plan).await.unwrap_err();

        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(store.calls(), vec!["mark_paid", "append_history", "insert_successor"]);
        let stored = store.get(sub.id);
        assert_eq!(stored.status, SubscriptionStatus::Pago);
        assert_eq!(stored.payment_date, Some(date(2025, 1, 10)));
        assert_eq!(store.rows.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn period_paid_elsewhere_is_not_paid_twice() {
        let sub = Subscription::fixture(dec!(1300), date(2025, 1, 10));
        let store = MemoryWrites::with(&[sub.clone()]);
        // O plano foi montado antes do outro pagamento
        let plan = recurrence::plan_payment(&sub, date(2025, 1, 10), None, None).unwrap();
        store.rows.lock().unwrap().get_mut(&sub.id).unwrap().status = SubscriptionStatus::Pago;

        let err = apply_payment_plan(&store, sub.id, plan).await.unwrap_err();

        assert!(matches!(err, AppError::InvalidTransition(_)));
        assert_eq!(store.calls(), vec!["mark_paid"]);
    }

    #[tokio::test]
    async fn paying_one_period_leaves_a_paused_sibling_alone() {
        let mut paused = Subscription::fixture(dec!(900), date(2025, 1, 5));
        recurrence::check_pause(&paused).unwrap();
        paused.is_paused = true;
        paused.status = SubscriptionStatus::Pausado;

        let mut open = Subscription::fixture(dec!(1300), date(2025, 1, 10));
        open.client_id = paused.client_id;
        let store = MemoryWrites::with(&[paused.clone(), open.clone()]);

        let plan = recurrence::plan_payment(&store.get(open.id), date(2025, 1, 10), None, None).unwrap();
        let outcome = apply_payment_plan(&store, open.id, plan).await.unwrap();

        let still_paused = store.get(paused.id);
        assert!(still_paused.is_paused);
        assert_eq!(still_paused.status, SubscriptionStatus::Pausado);
        assert_eq!(still_paused.due_date, date(2025, 1, 5));
        assert_eq!(store.get(open.id).status, SubscriptionStatus::Pago);

        let next = outcome.successor.expect("successor");
        assert!(!next.is_paused);
        assert_eq!(next.status, SubscriptionStatus::Pendente);
        assert_eq!(store.rows.lock().unwrap().len(), 3);
    }
}
