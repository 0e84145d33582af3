//! Breaking an amount down into nickels and pennies.
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AmountError {
    #[error("invalid amount: {0:?}")]
    Invalid(String),
    #[error("negative amount")]
    Negative,
}

/// The change for an amount.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Change {
    pub amount_cents: u64,
    pub nickels: u64,
    pub pennies: u64,
}

impl Change {
    pub fn from_cents(amount_cents: u64) -> Self {
        Self { amount_cents, nickels: amount_cents / 5, pennies: amount_cents % 5 }
    }
    /// Parse `text` as an amount and break it down. Fractions of a cent are dropped.
    pub fn calculate(text: &str) -> Result<Self, AmountError> {
        parse_cents(text).map(Self::from_cents)
    }
    /// The result line shown to the user.
    ///
    /// The amount shown is the one the change was made for, so input with sub-cent digits is
    /// shown truncated (`1.239` reads `$1.23`) rather than rounded to the nearest cent.
    pub fn message(&self) -> String {
        format!(
            "We can make change for {} with {} nickels and {} pennies!",
            format_currency(self.amount_cents),
            self.nickels,
            self.pennies
        )
    }
}

/// Parse a decimal amount (`12`, `12.5`, `.5`, `12.`) into whole cents, rounding down.
pub fn parse_cents(text: &str) -> Result<u64, AmountError> {
    let invalid = || AmountError::Invalid(text.to_string());
    let (negative, unsigned) = match text.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, text.strip_prefix('+').unwrap_or(text)),
    };
    let (units, fraction) = unsigned.split_once('.').unwrap_or((unsigned, ""));
    if units.is_empty() && fraction.is_empty() {
        return Err(invalid());
    }
    if !units.bytes().chain(fraction.bytes()).all(|b| b.is_ascii_digit()) {
        return Err(invalid());
    }
    let units = units.trim_start_matches('0');
    let units = if units.is_empty() { 0 } else { units.parse::<u64>().map_err(|_| invalid())? };
    let cents = format!("{:0<2}", fraction.get(..2).unwrap_or(fraction))
        .parse::<u64>()
        .map_err(|_| invalid())?;
    let total = units.checked_mul(100).and_then(|u| u.checked_add(cents)).ok_or_else(invalid)?;
    if negative && (total > 0 || fraction.bytes().any(|b| b != b'0')) {
        return Err(AmountError::Negative);
    }
    Ok(total)
}

/// Format cents as US dollars, e.g. `$1,234.56`.
pub fn format_currency(cents: u64) -> String {
    let units = (cents / 100).to_string();
    let mut grouped = String::with_capacity(units.len() + units.len() / 3);
    for (i, c) in units.chars().enumerate() {
        if i > 0 && (units.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }
    format!("${grouped}.{:02}", cents % 100)
}
