// src/services/notifications.rs

//! Lembretes de pagamento para a camada de notificações do PWA.
//!
//! O notificador é injetado no `AppState` como `Arc<dyn ReminderNotifier>`.
//! O `ReminderScheduler` roda em segundo plano: marca os atrasados e
//! reconstrói a lista de lembretes a cada intervalo.

use std::{sync::Arc, time::Duration};

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use tokio::{
    sync::{watch, RwLock},
    task::JoinHandle,
};

use crate::{
    common::error::AppError,
    models::{notification::PaymentReminder, subscription::Subscription},
};

/// Destino dos lembretes. Entrega best-effort, sem confirmação.
#[async_trait]
pub trait ReminderNotifier: Send + Sync {
    async fn schedule_payment_reminder(&self, reminder: PaymentReminder);
    async fn clear_all(&self);
    async fn pending(&self) -> Vec<PaymentReminder>;
}

/// De onde o agendador lê as cobranças.
#[async_trait]
pub trait ReminderSource: Send + Sync {
    /// Grava `Atrasado` em todo Pendente vencido. Retorna quantos mudaram.
    async fn mark_overdue(&self, today: NaiveDate) -> Result<u64, AppError>;

    /// Cobranças com vencimento no intervalo, junto do nome do cliente.
    async fn due_between(
        &self,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<(Subscription, String)>, AppError>;
}

/// Feed em memória que o PWA consulta (`GET /api/notifications`).
#[derive(Default)]
pub struct InMemoryReminderFeed {
    reminders: RwLock<Vec<PaymentReminder>>,
}

impl InMemoryReminderFeed {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ReminderNotifier for InMemoryReminderFeed {
    async fn schedule_payment_reminder(&self, reminder: PaymentReminder) {
        let mut reminders = self.reminders.write().await;
        // Um lembrete por cobrança: o mais recente substitui o anterior
        reminders.retain(|r| r.subscription_id != reminder.subscription_id);
        reminders.push(reminder);
    }

    async fn clear_all(&self) {
        self.reminders.write().await.clear();
    }

    async fn pending(&self) -> Vec<PaymentReminder> {
        self.reminders.read().await.clone()
    }
}

fn reminder_title(days_left: i64) -> String {
    match days_left {
        0 => "Pagamento vence hoje".to_string(),
        1 => "Pagamento vence amanhã".to_string(),
        n => format!("Pagamento vence em {} dias", n),
    }
}

pub fn build_reminders(
    entries: &[(Subscription, String)],
    today: NaiveDate,
    lookahead_days: i64,
    now: DateTime<Utc>,
) -> Vec<PaymentReminder> {
    let mut reminders: Vec<PaymentReminder> = entries
        .iter()
        .filter(|(s, _)| !s.status.is_closed() && !s.is_paused)
        .filter_map(|(s, client_name)| {
            let days_left = (s.due_date - today).num_days();
            if !(0..=lookahead_days).contains(&days_left) {
                return None;
            }
            Some(PaymentReminder {
                subscription_id: s.id,
                client_id: s.client_id,
                client_name: client_name.clone(),
                amount: s.amount,
                due_date: s.due_date,
                title: reminder_title(days_left),
                body: format!("{} - R$ {:.2} em {}", client_name, s.amount, s.due_date.format("%d/%m/%Y")),
                scheduled_at: now,
            })
        })
        .collect();

    reminders.sort_by_key(|r| r.due_date);
    reminders
}

pub struct ReminderScheduler {
    source: Arc<dyn ReminderSource>,
    notifier: Arc<dyn ReminderNotifier>,
    interval: Duration,
    lookahead_days: i64,
}

/// Controle da tarefa em segundo plano.
pub struct ReminderHandle {
    shutdown_tx: watch::Sender<bool>,
    join: JoinHandle<()>,
}

impl ReminderHandle {
    pub async fn shutdown(self) {
        let _ = self.shutdown_tx.send(true);
        if let Err(e) = self.join.await {
            tracing::error!("🔥 Agendador de lembretes terminou com erro: {}", e);
        }
    }
}

impl ReminderScheduler {
    pub fn new(
        source: Arc<dyn ReminderSource>,
        notifier: Arc<dyn ReminderNotifier>,
        interval: Duration,
        lookahead_days: i64,
    ) -> Self {
        Self { source, notifier, interval, lookahead_days }
    }

    /// Uma rodada: atrasados, depois limpa e reagenda os lembretes.
    pub async fn tick(&self, today: NaiveDate) -> Result<usize, AppError> {
        let overdue = self.source.mark_overdue(today).await?;
        if overdue > 0 {
            tracing::info!("⏰ {} assinaturas marcadas como atrasadas.", overdue);
        }

        let until = today + chrono::Duration::days(self.lookahead_days);
        let entries = self.source.due_between(today, until).await?;
        let reminders = build_reminders(&entries, today, self.lookahead_days, Utc::now());

        self.notifier.clear_all().await;
        let count = reminders.len();
        for reminder in reminders {
            self.notifier.schedule_payment_reminder(reminder).await;
        }

        Ok(count)
    }

    pub fn spawn(self) -> ReminderHandle {
        let (shutdown_tx, mut shutdown_rx) = watch::channel(false);

        let join = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(self.interval);
            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        let today = Utc::now().date_naive();
                        match self.tick(today).await {
                            Ok(count) => tracing::info!("🔔 {} lembretes de pagamento agendados.", count),
                            Err(e) => tracing::error!("🔥 Falha na rodada de lembretes: {}", e),
                        }
                    }
                    _ = shutdown_rx.changed() => {
                        tracing::info!("Agendador de lembretes encerrado.");
                        break;
                    }
                }
            }
        });

        ReminderHandle { shutdown_tx, join }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::subscription::SubscriptionStatus;
    use rust_decimal_macros::dec;
    use std::sync::Mutex;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[derive(Default)]
    struct RecordingNotifier {
        calls: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl ReminderNotifier for RecordingNotifier {
        async fn schedule_payment_reminder(&self, reminder: PaymentReminder) {
            self.calls.lock().unwrap().push(format!("schedule:{}", reminder.due_date));
        }

        async fn clear_all(&self) {
            self.calls.lock().unwrap().push("clear".into());
        }

        async fn pending(&self) -> Vec<PaymentReminder> {
            Vec::new()
        }
    }

    struct FakeSource {
        entries: Vec<(Subscription, String)>,
        overdue_calls: Mutex<Vec<NaiveDate>>,
    }

    #[async_trait]
    impl ReminderSource for FakeSource {
        async fn mark_overdue(&self, today: NaiveDate) -> Result<u64, AppError> {
            self.overdue_calls.lock().unwrap().push(today);
            Ok(0)
        }

        async fn due_between(
            &self,
            from: NaiveDate,
            to: NaiveDate,
        ) -> Result<Vec<(Subscription, String)>, AppError> {
            Ok(self
                .entries
                .iter()
                .filter(|(s, _)| s.due_date >= from && s.due_date <= to)
                .cloned()
                .collect())
        }
    }

    fn entries() -> Vec<(Subscription, String)> {
        let tomorrow = Subscription::fixture(dec!(1300), date(2025, 1, 11));
        let today = Subscription::fixture(dec!(500), date(2025, 1, 10));
        let mut paused = Subscription::fixture(dec!(700), date(2025, 1, 12));
        paused.is_paused = true;
        paused.status = SubscriptionStatus::Pausado;
        let mut paid = Subscription::fixture(dec!(900), date(2025, 1, 12));
        paid.status = SubscriptionStatus::Pago;
        let far = Subscription::fixture(dec!(100), date(2025, 2, 1));

        vec![
            (tomorrow, "Clínica Sorriso".into()),
            (today, "Pet Shop Amigo".into()),
            (paused, "Academia Forte".into()),
            (paid, "Padaria Central".into()),
            (far, "Escola Futuro".into()),
        ]
    }

    #[test]
    fn reminders_only_for_open_unpaused_within_lookahead() {
        let reminders = build_reminders(&entries(), date(2025, 1, 10), 3, Utc::now());

        assert_eq!(reminders.len(), 2);
        assert_eq!(reminders[0].title, "Pagamento vence hoje");
        assert_eq!(reminders[0].client_name, "Pet Shop Amigo");
        assert_eq!(reminders[1].title, "Pagamento vence amanhã");
        assert_eq!(reminders[1].body, "Clínica Sorriso - R$ 1300.00 em 11/01/2025");
    }

    #[tokio::test]
    async fn tick_marks_overdue_then_clears_and_schedules() {
        let source = Arc::new(FakeSource { entries: entries(), overdue_calls: Mutex::new(Vec::new()) });
        let notifier = Arc::new(RecordingNotifier::default());
        let scheduler = ReminderScheduler::new(source.clone(), notifier.clone(), Duration::from_secs(3600), 3);

        let count = scheduler.tick(date(2025, 1, 10)).await.unwrap();

        assert_eq!(count, 2);
        assert_eq!(*source.overdue_calls.lock().unwrap(), vec![date(2025, 1, 10)]);
        assert_eq!(
            *notifier.calls.lock().unwrap(),
            vec!["clear".to_string(), "schedule:2025-01-10".into(), "schedule:2025-01-11".into()]
        );
    }

    #[tokio::test]
    async fn in_memory_feed_replaces_and_clears() {
        let feed = InMemoryReminderFeed::new();
        let reminders = build_reminders(&entries(), date(2025, 1, 10), 3, Utc::now());

        for r in reminders.iter().cloned() {
            feed.schedule_payment_reminder(r).await;
        }
        // Reagendar a mesma cobrança não duplica
        feed.schedule_payment_reminder(reminders[0].clone()).await;
        assert_eq!(feed.pending().await.len(), 2);

        feed.clear_all().await;
        assert!(feed.pending().await.is_empty());
    }

    #[tokio::test]
    async fn spawned_scheduler_runs_and_shuts_down() {
        let source = Arc::new(FakeSource { entries: Vec::new(), overdue_calls: Mutex::new(Vec::new()) });
        let notifier = Arc::new(RecordingNotifier::default());
        let handle =
            ReminderScheduler::new(source.clone(), notifier.clone(), Duration::from_secs(3600), 3).spawn();

        // O primeiro tick do intervalo é imediato
        tokio::time::sleep(Duration::from_millis(50)).await;
        handle.shutdown().await;

        assert_eq!(source.overdue_calls.lock().unwrap().len(), 1);
        assert_eq!(*notifier.calls.lock().unwrap(), vec!["clear".to_string()]);
    }
}
