use crate::error::PaymentError;
use chrono::{Datelike, NaiveDate};

/// Card-entry form state. Card data stays in the form and is never written to a record.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CardDetails {
    pub holder_name: String,
    pub number: String,
    /// `MM/YY`
    pub expiry: String,
    pub cvv: String,
}

impl CardDetails {
    pub fn digits(&self) -> String {
        self.number.chars().filter(|c| c.is_ascii_digit()).collect()
    }

    pub fn last4(&self) -> Option<String> {
        let digits = self.digits();
        (digits.len() >= 4).then(|| digits[digits.len() - 4..].to_string())
    }

    /// Checks every field against `today`; the first problem found is reported.
    pub fn validate(&self, today: NaiveDate) -> Result<(), PaymentError> {
        if self.holder_name.trim().is_empty() {
            return Err(invalid("cardholder name is required"));
        }

        if self
            .number
            .chars()
            .any(|c| !(c.is_ascii_digit() || c == ' ' || c == '-'))
        {
            return Err(invalid("card number may only contain digits"));
        }
        let digits = self.digits();
        if !(13..=19).contains(&digits.len()) {
            return Err(invalid("card number must have 13 to 19 digits"));
        }
        if !luhn_valid(&digits) {
            return Err(invalid("card number failed checksum"));
        }

        let (month, year) = parse_expiry(&self.expiry)?;
        if (year, month) < (today.year(), today.month()) {
            return Err(invalid("card has expired"));
        }

        if !(3..=4).contains(&self.cvv.len()) || !self.cvv.chars().all(|c| c.is_ascii_digit()) {
            return Err(invalid("CVV must be 3 or 4 digits"));
        }
        Ok(())
    }
}

fn invalid(reason: &str) -> PaymentError {
    PaymentError::InvalidCardDetails(reason.to_string())
}

fn parse_expiry(expiry: &str) -> Result<(u32, i32), PaymentError> {
    let (mm, yy) = expiry
        .trim()
        .split_once('/')
        .ok_or_else(|| invalid("expiry must be MM/YY"))?;
    let month: u32 = mm.trim().parse().map_err(|_| invalid("expiry must be MM/YY"))?;
    let year: i32 = yy.trim().parse().map_err(|_| invalid("expiry must be MM/YY"))?;
    if !(1..=12).contains(&month) || yy.trim().len() != 2 {
        return Err(invalid("expiry must be MM/YY"));
    }
    Ok((month, 2000 + year))
}

fn luhn_valid(digits: &str) -> bool {
    let sum: u32 = digits
        .chars()
        .rev()
        .filter_map(|c| c.to_digit(10))
        .enumerate()
        .map(|(i, d)| {
            if i % 2 == 1 {
                let doubled = d * 2;
                if doubled > 9 { doubled - 9 } else { doubled }
            } else {
                d
            }
        })
        .sum();
    sum % 10 == 0
}
