// src/services/billing.rs

//! Calculadora de cobrança: composição da mensalidade e datas de vencimento.

use chrono::{Datelike, Months, NaiveDate};
use rust_decimal::Decimal;

use crate::{
    common::error::AppError,
    models::subscription::{BillingBreakdown, ContractConfig, PaymentType},
};

/// Data do dia `day` no mês informado. Dias além do fim do mês caem no último dia.
pub fn day_in_month(year: i32, month: u32, day: u32) -> Option<NaiveDate> {
    let day = day.clamp(1, 31);
    (1..=day).rev().find_map(|d| NaiveDate::from_ymd_opt(year, month, d))
}

/// Próxima ocorrência do dia `day` estritamente depois de `after`.
///
/// Usada para o primeiro vencimento (a partir da data de início), para o
/// vencimento do período seguinte e para a retomada de uma assinatura pausada.
pub fn next_due_date(after: NaiveDate, day: u32) -> Option<NaiveDate> {
    let anchor = day_in_month(after.year(), after.month(), day)?;
    if anchor > after {
        return Some(anchor);
    }

    let next_month = after.with_day(1)?.checked_add_months(Months::new(1))?;
    day_in_month(next_month.year(), next_month.month(), day)
}

fn out_of_range() -> AppError {
    AppError::BadRequest("amount_out_of_range".into())
}

/// Parcela mensal da implantação. À vista (ou sem parcelas) não entra na recorrência.
pub fn monthly_implementation_amount(
    implementation_value: Decimal,
    payment_type: PaymentType,
    installments: i32,
) -> Result<Decimal, AppError> {
    match payment_type {
        PaymentType::Parcelado if installments > 0 => implementation_value
            .checked_div(Decimal::from(installments))
            .ok_or_else(out_of_range),
        _ => Ok(Decimal::ZERO),
    }
}

pub fn monthly_maintenance_amount(value_per_number: Decimal, number_of_numbers: i32) -> Result<Decimal, AppError> {
    value_per_number
        .checked_mul(Decimal::from(number_of_numbers))
        .ok_or_else(out_of_range)
}

/// Composição da mensalidade. Valores que estouram o `Decimal` viram 400.
pub fn calculate(config: &ContractConfig, start: NaiveDate) -> Result<BillingBreakdown, AppError> {
    let maintenance = monthly_maintenance_amount(config.maintenance_value_per_number, config.number_of_numbers)?;
    let implementation = monthly_implementation_amount(
        config.implementation_value,
        config.payment_type,
        config.installments,
    )?;

    let total_monthly_amount = maintenance.checked_add(implementation).ok_or_else(out_of_range)?;
    let total_contract_value = maintenance
        .checked_mul(Decimal::from(config.contract_duration))
        .and_then(|m| m.checked_add(config.implementation_value))
        .ok_or_else(out_of_range)?;

    let first_due_date = u32::try_from(config.payment_day)
        .ok()
        .filter(|day| (1..=31).contains(day))
        .and_then(|day| next_due_date(start, day));

    Ok(BillingBreakdown {
        monthly_maintenance_amount: maintenance,
        monthly_implementation_amount: implementation,
        total_monthly_amount,
        total_contract_value,
        first_due_date,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn config(payment_type: PaymentType, installments: i32) -> ContractConfig {
        ContractConfig {
            implementation_value: dec!(2500),
            payment_type,
            installments,
            maintenance_value_per_number: dec!(350),
            number_of_numbers: 3,
            contract_duration: 12,
            payment_day: 10,
        }
    }

    #[test]
    fn parcelado_contract_breakdown() {
        let breakdown = calculate(&config(PaymentType::Parcelado, 10), date(2025, 1, 5)).unwrap();

        assert_eq!(breakdown.monthly_implementation_amount, dec!(250));
        assert_eq!(breakdown.monthly_maintenance_amount, dec!(1050));
        assert_eq!(breakdown.total_monthly_amount, dec!(1300));
        assert_eq!(breakdown.total_contract_value, dec!(15100));
        assert_eq!(breakdown.first_due_date, Some(date(2025, 1, 10)));
    }

    #[test]
    fn vista_or_zero_installments_fold_implementation_to_zero() {
        for cfg in [config(PaymentType::Vista, 10), config(PaymentType::Parcelado, 0), config(PaymentType::Parcelado, -2)] {
            let breakdown = calculate(&cfg, date(2025, 1, 5)).unwrap();
            assert_eq!(breakdown.monthly_implementation_amount, Decimal::ZERO);
            assert_eq!(breakdown.total_monthly_amount, breakdown.monthly_maintenance_amount);
        }
    }

    #[test]
    fn total_is_always_the_sum_of_parts() {
        for installments in [1, 3, 7, 12] {
            let breakdown = calculate(&config(PaymentType::Parcelado, installments), date(2025, 3, 1)).unwrap();
            assert_eq!(
                breakdown.total_monthly_amount,
                breakdown.monthly_maintenance_amount + breakdown.monthly_implementation_amount
            );
            assert_eq!(
                breakdown.monthly_implementation_amount,
                dec!(2500) / Decimal::from(installments)
            );
        }
    }

    #[test]
    fn first_due_date_rolls_forward_when_anchor_is_not_after_start() {
        // Mesmo dia: não é estritamente depois
        assert_eq!(next_due_date(date(2025, 1, 10), 10), Some(date(2025, 2, 10)));
        // Já passou no mês
        assert_eq!(next_due_date(date(2025, 1, 20), 10), Some(date(2025, 2, 10)));
        // Virada de ano
        assert_eq!(next_due_date(date(2025, 12, 15), 5), Some(date(2026, 1, 5)));
    }

    #[test]
    fn day_31_clamps_to_month_end_and_comes_back() {
        assert_eq!(next_due_date(date(2025, 1, 31), 31), Some(date(2025, 2, 28)));
        assert_eq!(next_due_date(date(2024, 1, 31), 31), Some(date(2024, 2, 29)));
        assert_eq!(next_due_date(date(2025, 2, 28), 31), Some(date(2025, 3, 31)));
        assert_eq!(next_due_date(date(2025, 4, 1), 31), Some(date(2025, 4, 30)));
    }

    #[test]
    fn invalid_payment_day_has_no_first_due_date() {
        let mut cfg = config(PaymentType::Parcelado, 10);
        cfg.payment_day = 0;
        assert_eq!(calculate(&cfg, date(2025, 1, 1)).unwrap().first_due_date, None);
    }

    #[test]
    fn huge_values_are_rejected_instead_of_overflowing() {
        let mut cfg = config(PaymentType::Parcelado, 10);
        cfg.maintenance_value_per_number = dec!(100000000000000000000);
        cfg.number_of_numbers = i32::MAX;
        assert!(matches!(calculate(&cfg, date(2025, 1, 1)), Err(AppError::BadRequest(_))));

        // A mensalidade cabe, mas o valor total do contrato não
        let mut cfg = config(PaymentType::Parcelado, 10);
        cfg.maintenance_value_per_number = Decimal::MAX;
        cfg.number_of_numbers = 1;
        cfg.implementation_value = Decimal::ZERO;
        assert!(matches!(calculate(&cfg, date(2025, 1, 1)), Err(AppError::BadRequest(_))));
    }
}
