use super::method::PaymentMethod;
use super::money::{Amount, Money};
use crate::error::PaymentError;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

/// Rates applied on top of a donation. All rates are fractions (`0.02` = 2%).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FeeSchedule {
    pub platform_rate: Decimal,
    /// GST is levied on the sum of platform and processing fees.
    pub gst_rate: Decimal,
    pub upi_rate: Decimal,
    pub netbanking_rate: Decimal,
    pub card_rate: Decimal,
    pub wallet_rate: Decimal,
}

impl Default for FeeSchedule {
    fn default() -> Self {
        Self {
            platform_rate: dec!(0.02),
            gst_rate: dec!(0.18),
            upi_rate: Decimal::ZERO,
            netbanking_rate: dec!(0.019),
            card_rate: dec!(0.024),
            wallet_rate: dec!(0.019),
        }
    }
}

impl FeeSchedule {
    pub fn processing_rate(&self, method: PaymentMethod) -> Decimal {
        match method {
            PaymentMethod::Upi => self.upi_rate,
            PaymentMethod::NetBanking => self.netbanking_rate,
            PaymentMethod::Card => self.card_rate,
            PaymentMethod::Wallet => self.wallet_rate,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeeBreakdown {
    pub donation_amount: Money,
    pub platform_fee: Money,
    pub processing_fee: Money,
    pub gst: Money,
    pub total_payable: Money,
}

impl FeeBreakdown {
    /// Whether `total_payable` is exactly the sum of its parts.
    pub fn is_consistent(&self) -> bool {
        let total = [self.platform_fee, self.processing_fee, self.gst]
            .into_iter()
            .try_fold(self.donation_amount, Money::checked_add);
        total == Some(self.total_payable)
    }
}

/// Stateless fee computation.
#[derive(Debug, Clone, Default)]
pub struct FeeCalculator {
    schedule: FeeSchedule,
}

impl FeeCalculator {
    pub fn new(schedule: FeeSchedule) -> Self {
        Self { schedule }
    }

    /// Computes the breakdown for a raw amount, rejecting anything below one unit.
    pub fn compute(
        &self,
        amount: Decimal,
        method: PaymentMethod,
    ) -> Result<FeeBreakdown, PaymentError> {
        self.compute_for(Amount::new(amount)?, method)
    }

    /// Fails with `AmountOverflow` when a fee or the total does not fit a `Decimal`.
    pub fn compute_for(
        &self,
        amount: Amount,
        method: PaymentMethod,
    ) -> Result<FeeBreakdown, PaymentError> {
        let overflow = || PaymentError::AmountOverflow(amount.value());
        let donation_amount = Money::from(amount);
        let platform_fee = Money::percent_of(amount.value(), self.schedule.platform_rate)
            .ok_or_else(overflow)?;
        let processing_fee =
            Money::percent_of(amount.value(), self.schedule.processing_rate(method))
                .ok_or_else(overflow)?;
        let taxable = platform_fee
            .checked_add(processing_fee)
            .ok_or_else(overflow)?;
        let gst = Money::percent_of(taxable.value(), self.schedule.gst_rate)
            .ok_or_else(overflow)?;
        let total_payable = [platform_fee, processing_fee, gst]
            .into_iter()
            .try_fold(donation_amount, Money::checked_add)
            .ok_or_else(overflow)?;

        Ok(FeeBreakdown {
            donation_amount,
            platform_fee,
            processing_fee,
            gst,
            total_payable,
        })
    }
}
