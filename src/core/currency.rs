use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Supported currencies with their decimal precision rules
///
/// The gateway only settles GCash payments in Philippine Pesos, so this is a
/// closed single-variant enum rather than a free-form string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "VARCHAR(3)", rename_all = "UPPERCASE")]
#[serde(rename_all = "UPPERCASE")]
pub enum Currency {
    /// Philippine Peso (2 decimal places, minor unit = centavo)
    PHP,
}

impl Currency {
    /// Returns the decimal scale for this currency
    pub fn scale(&self) -> u32 {
        match self {
            Currency::PHP => 2,
        }
    }

    /// Validates that a decimal value is positive with the correct scale
    pub fn validate_amount(&self, amount: Decimal) -> Result<(), String> {
        if amount <= Decimal::ZERO {
            return Err(format!("{} amount must be positive", self));
        }

        if amount.normalize().scale() > self.scale() {
            return Err(format!(
                "{} amounts must have at most {} decimal places, got {}",
                self,
                self.scale(),
                amount.scale()
            ));
        }

        Ok(())
    }

    /// Converts a major-unit amount into the gateway's integer minor unit
    /// (centavos for PHP). Fails on fractional minor units, non-positive
    /// amounts, and values that do not fit an i64.
    pub fn to_minor_units(&self, amount: Decimal) -> Result<i64, String> {
        self.validate_amount(amount)?;

        let factor = Decimal::from(10_i64.pow(self.scale()));
        let minor = amount
            .checked_mul(factor)
            .ok_or_else(|| format!("{} amount {} overflows minor units", self, amount))?;

        if minor.normalize().scale() != 0 {
            return Err(format!(
                "{} amount {} has fractional minor units",
                self, amount
            ));
        }

        minor
            .to_i64()
            .ok_or_else(|| format!("{} amount {} exceeds i64 minor units", self, amount))
    }

    /// Converts an integer minor-unit amount back to the major unit
    pub fn from_minor_units(&self, minor: i64) -> Decimal {
        Decimal::new(minor, self.scale())
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Currency::PHP => write!(f, "PHP"),
        }
    }
}

impl std::str::FromStr for Currency {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "PHP" => Ok(Currency::PHP),
            _ => Err(format!("Invalid currency: {}", s)),
        }
    }
}

impl TryFrom<&str> for Currency {
    type Error = String;

    fn try_from(s: &str) -> Result<Self, Self::Error> {
        s.parse()
    }
}
