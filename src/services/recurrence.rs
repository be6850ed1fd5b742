// src/services/recurrence.rs

//! Motor de recorrência: decide o que cada transição grava.
//!
//! As funções daqui não tocam no banco. `subscription_service::apply_payment_plan` grava o plano
//! registro a registro.

use chrono::{Datelike, NaiveDate};

use crate::{
    common::error::AppError,
    models::subscription::{NewPaymentHistory, NewSubscription, Subscription, SubscriptionStatus},
    services::billing::next_due_date,
};

/// O que "marcar como pago" precisa gravar.
#[derive(Debug, Clone, PartialEq)]
pub struct PaymentPlan {
    pub payment_date: NaiveDate,
    pub history: NewPaymentHistory,
    pub successor: Option<NewSubscription>,
}

/// Status exibido: um Pendente vencido conta como Atrasado.
pub fn effective_status(subscription: &Subscription, today: NaiveDate) -> SubscriptionStatus {
    match subscription.status {
        SubscriptionStatus::Pendente if subscription.due_date < today => SubscriptionStatus::Atrasado,
        status => status,
    }
}

/// Dia âncora da recorrência. Sem `recurrence_day`, vale o dia do vencimento atual.
fn anchor_day(subscription: &Subscription) -> u32 {
    subscription
        .recurrence_day
        .and_then(|day| u32::try_from(day).ok())
        .filter(|day| (1..=31).contains(day))
        .unwrap_or_else(|| subscription.due_date.day())
}

fn installment_cap_reached(subscription: &Subscription) -> bool {
    subscription
        .total_installments
        .is_some_and(|total| subscription.current_installment >= total)
}

fn ensure_open(subscription: &Subscription, action: &str) -> Result<(), AppError> {
    if subscription.status.is_closed() {
        return Err(AppError::InvalidTransition(format!(
            "cannot {} a subscription with status {:?}",
            action, subscription.status
        )));
    }
    Ok(())
}

pub fn plan_payment(
    subscription: &Subscription,
    payment_date: NaiveDate,
    payment_method: Option<String>,
    notes: Option<String>,
) -> Result<PaymentPlan, AppError> {
    ensure_open(subscription, "pay")?;

    let history = NewPaymentHistory {
        subscription_id: subscription.id,
        amount: subscription.amount,
        payment_date,
        payment_method,
        notes,
    };

    let successor = if subscription.is_recurring && !subscription.is_paused && !installment_cap_reached(subscription) {
        Some(successor_of(subscription)?)
    } else {
        None
    };

    Ok(PaymentPlan { payment_date, history, successor })
}

/// O período seguinte da mesma linhagem.
pub fn successor_of(subscription: &Subscription) -> Result<NewSubscription, AppError> {
    let day = anchor_day(subscription);
    let due_date = next_due_date(subscription.due_date, day)
        .ok_or_else(|| AppError::BadRequest("due_date_out_of_range".into()))?;

    Ok(NewSubscription {
        client_id: subscription.client_id,
        description: subscription.description.clone(),
        amount: subscription.amount,
        due_date,
        status: SubscriptionStatus::Pendente,
        is_recurring: true,
        recurrence_day: Some(day as i32),
        current_installment: subscription.current_installment + 1,
        total_installments: subscription.total_installments,
        is_paused: false,
        implementation_value: subscription.implementation_value,
        payment_type: subscription.payment_type,
        installments: subscription.installments,
        maintenance_value_per_number: subscription.maintenance_value_per_number,
        number_of_numbers: subscription.number_of_numbers,
        contract_duration: subscription.contract_duration,
        payment_day: subscription.payment_day,
        // O pagamento inicial pertence só ao primeiro período
        initial_payment_paid: false,
        initial_payment_amount: None,
        notes: None,
    })
}

pub fn check_pause(subscription: &Subscription) -> Result<(), AppError> {
    ensure_open(subscription, "pause")?;
    if subscription.is_paused {
        return Err(AppError::InvalidTransition("subscription is already paused".into()));
    }
    Ok(())
}

/// Uma edição não pode deixar o total de parcelas abaixo da parcela atual.
pub fn check_installment_cap(subscription: &Subscription, new_total: Option<i32>) -> Result<(), AppError> {
    match new_total {
        Some(total) if total < subscription.current_installment => Err(AppError::BadRequest(format!(
            "total_installments {} is below current installment {}",
            total, subscription.current_installment
        ))),
        _ => Ok(()),
    }
}

pub fn check_cancel(subscription: &Subscription) -> Result<(), AppError> {
    ensure_open(subscription, "cancel")
}

/// Novo vencimento ao retomar: próxima ocorrência do dia âncora depois de hoje.
pub fn resume_due_date(subscription: &Subscription, today: NaiveDate) -> Result<NaiveDate, AppError> {
    if !subscription.is_paused && subscription.status != SubscriptionStatus::Pausado {
        return Err(AppError::InvalidTransition("subscription is not paused".into()));
    }

    next_due_date(today, anchor_day(subscription))
        .ok_or_else(|| AppError::BadRequest("due_date_out_of_range".into()))
}
