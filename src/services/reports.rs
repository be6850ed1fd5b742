// src/services/reports.rs

//! Agregador de relatórios: funções puras sobre as listas completas de
//! assinaturas e histórico, para uma data de referência.

use std::collections::BTreeMap;

use chrono::{Datelike, Duration, Months, NaiveDate};
use rust_decimal::Decimal;

use crate::{
    common::error::AppError,
    models::{
        client::ClientStatus,
        report::{
            CalendarDay, ClientStatusCount, FinancialReport, MonthlyRevenueEntry, PaidBreakdown,
            UpcomingPayment,
        },
        subscription::{PaymentHistory, Subscription, SubscriptionStatus},
    },
    services::recurrence::effective_status,
};

const REVENUE_MONTHS: u32 = 6;

/// Um mês civil, como intervalo semiaberto [start, end).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MonthWindow {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl MonthWindow {
    pub fn containing(date: NaiveDate) -> Option<Self> {
        let start = date.with_day(1)?;
        let end = start.checked_add_months(Months::new(1))?;
        Some(Self { start, end })
    }

    /// Aceita "YYYY-MM".
    pub fn parse(value: &str) -> Result<Self, AppError> {
        NaiveDate::parse_from_str(&format!("{}-01", value.trim()), "%Y-%m-%d")
            .ok()
            .and_then(Self::containing)
            .ok_or_else(|| AppError::BadRequest(format!("invalid month '{}', expected YYYY-MM", value)))
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        date >= self.start && date < self.end
    }

    pub fn next(&self) -> Option<Self> {
        Self::containing(self.end)
    }

    pub fn previous(&self) -> Option<Self> {
        Self::containing(self.start.pred_opt()?)
    }

    pub fn label(&self) -> String {
        self.start.format("%Y-%m").to_string()
    }
}

fn upcoming(subscription: &Subscription, today: NaiveDate) -> UpcomingPayment {
    UpcomingPayment {
        subscription_id: subscription.id,
        client_id: subscription.client_id,
        description: subscription.description.clone(),
        amount: subscription.amount,
        due_date: subscription.due_date,
        status: effective_status(subscription, today),
    }
}

pub fn paid_breakdown(
    subscriptions: &[Subscription],
    history: &[PaymentHistory],
    month: &MonthWindow,
) -> PaidBreakdown {
    let paid_subscriptions = subscriptions
        .iter()
        .filter(|s| s.status == SubscriptionStatus::Pago)
        .filter(|s| s.payment_date.is_some_and(|d| month.contains(d)))
        .map(|s| s.amount)
        .sum();

    let initial_payments = subscriptions
        .iter()
        .filter(|s| s.initial_payment_paid && month.contains(s.created_at.date_naive()))
        .map(|s| s.initial_payment_amount.unwrap_or(Decimal::ZERO))
        .sum();

    let payment_history = history
        .iter()
        .filter(|h| month.contains(h.payment_date))
        .map(|h| h.amount)
        .sum();

    PaidBreakdown { paid_subscriptions, initial_payments, payment_history }
}

/// Assinaturas em aberto que vencem entre hoje e hoje + `days`, por vencimento.
pub fn due_within(subscriptions: &[Subscription], today: NaiveDate, days: i64) -> Vec<UpcomingPayment> {
    let limit = today + Duration::days(days);
    let mut due: Vec<UpcomingPayment> = subscriptions
        .iter()
        .filter(|s| !s.status.is_closed())
        .filter(|s| s.due_date >= today && s.due_date <= limit)
        .map(|s| upcoming(s, today))
        .collect();

    // sort_by_key é estável: empates mantêm a ordem de busca
    due.sort_by_key(|p| p.due_date);
    due
}

pub fn monthly_revenue(history: &[PaymentHistory], month: &MonthWindow) -> Vec<MonthlyRevenueEntry> {
    let mut windows = vec![*month];
    while windows.len() < REVENUE_MONTHS as usize {
        match windows.last().and_then(MonthWindow::previous) {
            Some(prev) => windows.push(prev),
            None => break,
        }
    }
    windows.reverse();

    windows
        .iter()
        .map(|w| MonthlyRevenueEntry {
            month: w.label(),
            total: history.iter().filter(|h| w.contains(h.payment_date)).map(|h| h.amount).sum(),
        })
        .collect()
}

pub fn count_clients(statuses: &[ClientStatus]) -> ClientStatusCount {
    statuses.iter().fold(ClientStatusCount::default(), |mut acc, status| {
        match status {
            ClientStatus::Lead => acc.lead += 1,
            ClientStatus::Ativo => acc.ativo += 1,
            ClientStatus::Pausado => acc.pausado += 1,
            ClientStatus::Encerrado => acc.encerrado += 1,
        }
        acc
    })
}

pub fn build_report(
    subscriptions: &[Subscription],
    history: &[PaymentHistory],
    client_statuses: &[ClientStatus],
    today: NaiveDate,
    month: MonthWindow,
) -> FinancialReport {
    let paid = paid_breakdown(subscriptions, history, &month);
    let total_paid_this_month = paid.paid_subscriptions + paid.initial_payments + paid.payment_history;

    let mut total_pending = Decimal::ZERO;
    let mut total_overdue = Decimal::ZERO;
    for subscription in subscriptions {
        match effective_status(subscription, today) {
            SubscriptionStatus::Pendente => total_pending += subscription.amount,
            SubscriptionStatus::Atrasado => {
                total_pending += subscription.amount;
                total_overdue += subscription.amount;
            }
            _ => {}
        }
    }

    let next_month_expected = match month.next() {
        Some(next) => subscriptions
            .iter()
            .filter(|s| !s.status.is_closed() && next.contains(s.due_date))
            .map(|s| s.amount)
            .sum(),
        None => Decimal::ZERO,
    };

    FinancialReport {
        reference_date: today,
        month: month.label(),
        total_paid_this_month,
        paid_breakdown: paid,
        total_pending,
        total_overdue,
        next_month_expected,
        due_next_7_days: due_within(subscriptions, today, 7),
        due_next_30_days: due_within(subscriptions, today, 30),
        monthly_revenue: monthly_revenue(history, &month),
        clients: count_clients(client_statuses),
    }
}

/// Calendário do mês: cobranças agrupadas por dia de vencimento (canceladas ficam de fora).
pub fn build_calendar(subscriptions: &[Subscription], month: &MonthWindow, today: NaiveDate) -> Vec<CalendarDay> {
    let mut days: BTreeMap<NaiveDate, Vec<UpcomingPayment>> = BTreeMap::new();
    for subscription in subscriptions
        .iter()
        .filter(|s| s.status != SubscriptionStatus::Cancelado && month.contains(s.due_date))
    {
        days.entry(subscription.due_date).or_default().push(upcoming(subscription, today));
    }

    days.into_iter()
        .map(|(date, payments)| CalendarDay {
            date,
            total: payments.iter().map(|p| p.amount).sum(),
            payments,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use rust_decimal_macros::dec;
    use uuid::Uuid;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn history(subscription_id: Uuid, amount: Decimal, on: NaiveDate) -> PaymentHistory {
        PaymentHistory {
            id: Uuid::new_v4(),
            subscription_id,
            amount,
            payment_date: on,
            payment_method: Some("pix".into()),
            notes: None,
            created_at: Utc::now(),
        }
    }

    fn january() -> MonthWindow {
        MonthWindow::parse("2025-01").unwrap()
    }

    #[test]
    fn month_window_parsing() {
        let w = january();
        assert_eq!(w.start, date(2025, 1, 1));
        assert_eq!(w.end, date(2025, 2, 1));
        assert!(w.contains(date(2025, 1, 31)));
        assert!(!w.contains(date(2025, 2, 1)));
        assert_eq!(w.next().unwrap().label(), "2025-02");
        assert_eq!(w.previous().unwrap().label(), "2024-12");
        assert!(MonthWindow::parse("2025-13").is_err());
        assert!(MonthWindow::parse("janeiro").is_err());
    }

    #[test]
    fn paid_total_adds_the_three_sources_without_dedup() {
        let mut paid = Subscription::fixture(dec!(1300), date(2025, 1, 10));
        paid.status = SubscriptionStatus::Pago;
        paid.payment_date = Some(date(2025, 1, 10));

        let mut with_initial = Subscription::fixture(dec!(1050), date(2025, 2, 10));
        with_initial.initial_payment_paid = true;
        with_initial.initial_payment_amount = Some(dec!(2500));
        with_initial.created_at = Utc.with_ymd_and_hms(2025, 1, 5, 12, 0, 0).unwrap();

        // O mesmo pagamento aparece no histórico: conta duas vezes
        let rows = vec![
            history(paid.id, dec!(1300), date(2025, 1, 10)),
            history(paid.id, dec!(999), date(2024, 12, 10)),
        ];

        let report = build_report(&[paid, with_initial], &rows, &[], date(2025, 1, 15), january());

        assert_eq!(report.paid_breakdown.paid_subscriptions, dec!(1300));
        assert_eq!(report.paid_breakdown.initial_payments, dec!(2500));
        assert_eq!(report.paid_breakdown.payment_history, dec!(1300));
        assert_eq!(report.total_paid_this_month, dec!(5100));
    }

    #[test]
    fn pending_overdue_and_next_month_totals() {
        let today = date(2025, 1, 15);
        let overdue = Subscription::fixture(dec!(100), date(2025, 1, 10)); // Pendente vencido
        let mut flagged = Subscription::fixture(dec!(50), date(2025, 1, 5));
        flagged.status = SubscriptionStatus::Atrasado;
        let pending = Subscription::fixture(dec!(200), date(2025, 1, 20));
        let next_month = Subscription::fixture(dec!(300), date(2025, 2, 10));
        let mut cancelled_next = Subscription::fixture(dec!(400), date(2025, 2, 12));
        cancelled_next.status = SubscriptionStatus::Cancelado;
        let mut paused = Subscription::fixture(dec!(70), date(2025, 2, 20));
        paused.status = SubscriptionStatus::Pausado;
        paused.is_paused = true;

        let subs = vec![overdue, flagged, pending, next_month, cancelled_next, paused];
        let report = build_report(&subs, &[], &[], today, january());

        assert_eq!(report.total_pending, dec!(650)); // 100 + 50 + 200 + 300
        assert_eq!(report.total_overdue, dec!(150));
        assert_eq!(report.next_month_expected, dec!(370)); // 300 + pausado 70
    }

    #[test]
    fn look_ahead_lists_skip_closed_and_sort_ascending() {
        let today = date(2025, 1, 1);
        let later = Subscription::fixture(dec!(10), date(2025, 1, 25));
        let soon = Subscription::fixture(dec!(20), date(2025, 1, 3));
        let mut paid_soon = Subscription::fixture(dec!(30), date(2025, 1, 2));
        paid_soon.status = SubscriptionStatus::Pago;
        let far = Subscription::fixture(dec!(40), date(2025, 3, 1));
        let past = Subscription::fixture(dec!(50), date(2024, 12, 28));

        let subs = vec![later.clone(), soon.clone(), paid_soon, far, past];

        let week = due_within(&subs, today, 7);
        assert_eq!(week.iter().map(|p| p.subscription_id).collect::<Vec<_>>(), vec![soon.id]);

        let month = due_within(&subs, today, 30);
        assert_eq!(
            month.iter().map(|p| p.subscription_id).collect::<Vec<_>>(),
            vec![soon.id, later.id]
        );
    }

    #[test]
    fn ties_keep_fetch_order() {
        let a = Subscription::fixture(dec!(1), date(2025, 1, 5));
        let b = Subscription::fixture(dec!(2), date(2025, 1, 5));

        let due = due_within(&[a.clone(), b.clone()], date(2025, 1, 1), 7);
        assert_eq!(due[0].subscription_id, a.id);
        assert_eq!(due[1].subscription_id, b.id);
    }

    #[test]
    fn revenue_covers_six_months_ending_at_window() {
        let id = Uuid::new_v4();
        let rows = vec![
            history(id, dec!(100), date(2025, 1, 3)),
            history(id, dec!(50), date(2025, 1, 20)),
            history(id, dec!(70), date(2024, 8, 1)),
            history(id, dec!(999), date(2024, 7, 31)),
        ];

        let revenue = monthly_revenue(&rows, &january());
        assert_eq!(revenue.len(), 6);
        assert_eq!(revenue[0].month, "2024-08");
        assert_eq!(revenue[0].total, dec!(70));
        assert_eq!(revenue[5].month, "2025-01");
        assert_eq!(revenue[5].total, dec!(150));
    }

    #[test]
    fn calendar_groups_by_due_date() {
        let a = Subscription::fixture(dec!(100), date(2025, 1, 10));
        let b = Subscription::fixture(dec!(200), date(2025, 1, 10));
        let c = Subscription::fixture(dec!(300), date(2025, 1, 3));
        let mut cancelled = Subscription::fixture(dec!(400), date(2025, 1, 3));
        cancelled.status = SubscriptionStatus::Cancelado;
        let outside = Subscription::fixture(dec!(500), date(2025, 2, 3));

        let days = build_calendar(&[a, b, c, cancelled, outside], &january(), date(2025, 1, 1));

        assert_eq!(days.len(), 2);
        assert_eq!(days[0].date, date(2025, 1, 3));
        assert_eq!(days[0].total, dec!(300));
        assert_eq!(days[1].payments.len(), 2);
        assert_eq!(days[1].total, dec!(300));
    }

    #[test]
    fn client_counts_per_status() {
        let counts = count_clients(&[ClientStatus::Ativo, ClientStatus::Ativo, ClientStatus::Lead]);
        assert_eq!(counts.ativo, 2);
        assert_eq!(counts.lead, 1);
        assert_eq!(counts.encerrado, 0);
    }
}
